//! Typed configuration errors and their envelope mapping.

use s3_source_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;
use url::Url;

/// Field name used when the input itself (not a field) is malformed.
pub const ROOT_FIELD: &str = "$root";

/// Errors raised while parsing, validating, or shaping the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field could not be coerced to its declared type, or is missing.
    FieldParse {
        /// Dotted field path (e.g. `streams[0].format.delimiter`).
        field: String,
        /// Human readable reason.
        reason: String,
    },
    /// Exactly one of the two AWS credential fields is set.
    CredentialPairIncomplete,
    /// `customer_role_arn` is set without `role_arn`.
    RoleChainMissingParent,
    /// A plain-HTTP endpoint was supplied in the restricted deployment mode.
    InsecureEndpointInRestrictedMode {
        /// Endpoint with any embedded credentials stripped.
        endpoint: String,
    },
    /// The generated schema does not have the expected shape.
    SchemaShapeMismatch {
        /// Slash-separated path that failed to resolve.
        path: String,
        /// Human readable reason.
        reason: String,
    },
}

impl ConfigError {
    /// Build a field parse error.
    pub fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FieldParse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build an insecure-endpoint error, sanitizing the endpoint first.
    pub fn insecure_endpoint(endpoint: &str) -> Self {
        Self::InsecureEndpointInRestrictedMode {
            endpoint: sanitize_endpoint(endpoint),
        }
    }

    /// Build a schema shape error.
    pub fn schema_shape(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaShapeMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code for this error.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::FieldParse { .. } => ErrorCode::new("config", "invalid_field"),
            Self::CredentialPairIncomplete => {
                ErrorCode::new("config", "credential_pair_incomplete")
            },
            Self::RoleChainMissingParent => ErrorCode::new("config", "role_chain_missing_parent"),
            Self::InsecureEndpointInRestrictedMode { .. } => {
                ErrorCode::new("config", "insecure_endpoint")
            },
            Self::SchemaShapeMismatch { .. } => ErrorCode::new("config", "schema_shape_mismatch"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldParse { field, reason } => write!(formatter, "{field}: {reason}"),
            Self::CredentialPairIncomplete => formatter.write_str(
                "`aws_access_key_id` and `aws_secret_access_key` are both required to authenticate with AWS.",
            ),
            Self::RoleChainMissingParent => formatter.write_str(
                "`customer_role_arn` requires `role_arn` to be provided for role chaining.",
            ),
            Self::InsecureEndpointInRestrictedMode { .. } => {
                formatter.write_str("The endpoint must be a secure HTTPS endpoint.")
            },
            Self::SchemaShapeMismatch { path, reason } => {
                write!(formatter, "unexpected config schema shape at `{path}`: {reason}")
            },
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for ErrorEnvelope {
    fn from(error: ConfigError) -> Self {
        let code = error.error_code();
        let message = error.to_string();

        match error {
            ConfigError::FieldParse { field, .. } => {
                Self::expected(code, message).with_metadata("field", field)
            },
            ConfigError::CredentialPairIncomplete => Self::expected(code, message)
                .with_metadata("fields", "aws_access_key_id,aws_secret_access_key"),
            ConfigError::RoleChainMissingParent => Self::expected(code, message)
                .with_metadata("fields", "customer_role_arn,role_arn"),
            ConfigError::InsecureEndpointInRestrictedMode { endpoint } => {
                Self::expected(code, message)
                    .with_metadata("field", "endpoint")
                    .with_metadata("endpoint", endpoint)
            },
            ConfigError::SchemaShapeMismatch { path, .. } => {
                Self::invariant(code, message).with_metadata("path", path)
            },
        }
    }
}

/// Strip userinfo from an endpoint before it reaches logs or error metadata.
///
/// Bare hostnames do not parse as URLs and are returned unchanged.
fn sanitize_endpoint(endpoint: &str) -> String {
    match Url::parse(endpoint) {
        Ok(mut parsed) => {
            if parsed.password().is_some() || !parsed.username().is_empty() {
                if parsed.set_username("").is_err() {
                    return "[invalid endpoint: invalid username]".to_string();
                }
                if parsed.set_password(None).is_err() {
                    return "[invalid endpoint: invalid password]".to_string();
                }
            }
            parsed.to_string()
        },
        Err(_) => endpoint.to_string(),
    }
}
