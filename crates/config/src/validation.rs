//! Cross-field validation.
//!
//! Checks run in a fixed order and the first failing check wins, so a
//! config that violates several rules always reports the same error.

use crate::deployment::DeploymentProbe;
use crate::error::ConfigError;
use crate::spec::S3SourceConfig;
use s3_source_shared::{SecretString, Validated};
use serde_json::Value;

/// A parsed config that passed every cross-field check.
pub type ValidatedS3SourceConfig = Validated<S3SourceConfig>;

const INSECURE_SCHEME_PREFIX: &str = "http://";

struct CrossFieldCheck {
    name: &'static str,
    violated: fn(&S3SourceConfig, bool) -> bool,
    error: fn(&S3SourceConfig) -> ConfigError,
}

const CROSS_FIELD_CHECKS: [CrossFieldCheck; 3] = [
    CrossFieldCheck {
        name: "credential_pair",
        violated: credential_pair_incomplete,
        error: credential_pair_error,
    },
    CrossFieldCheck {
        name: "role_chain",
        violated: role_chain_missing_parent,
        error: role_chain_error,
    },
    CrossFieldCheck {
        name: "secure_endpoint",
        violated: insecure_endpoint_in_restricted_mode,
        error: insecure_endpoint_error,
    },
];

/// Run every cross-field check against `config`.
///
/// `is_restricted_mode` enables the rules that only apply to the restricted
/// deployment mode.
pub fn validate(config: &S3SourceConfig, is_restricted_mode: bool) -> Result<(), ConfigError> {
    for check in &CROSS_FIELD_CHECKS {
        if (check.violated)(config, is_restricted_mode) {
            let error = (check.error)(config);
            tracing::warn!(
                check = check.name,
                code = %error.error_code(),
                restricted = is_restricted_mode,
                "configuration rejected"
            );
            return Err(error);
        }
        tracing::debug!(check = check.name, "cross-field check passed");
    }
    Ok(())
}

/// Validate with the deployment mode read from `probe`.
///
/// The probe is queried exactly once per call.
pub fn validate_with_probe(
    config: &S3SourceConfig,
    probe: &dyn DeploymentProbe,
) -> Result<(), ConfigError> {
    validate(config, probe.is_restricted())
}

/// Parse and validate a raw config mapping.
pub fn load_config(
    value: Value,
    probe: &dyn DeploymentProbe,
) -> Result<ValidatedS3SourceConfig, ConfigError> {
    let config = S3SourceConfig::from_value(value)?;
    validate_with_probe(&config, probe)?;

    tracing::info!(
        bucket = config.bucket(),
        region = config.region_name().unwrap_or("auto"),
        delivery_type = config.delivery_method().delivery_type(),
        streams = config.streams().len(),
        role_chaining = config.customer_role_arn().is_some(),
        "configuration accepted"
    );
    Ok(Validated::new(config))
}

fn is_set(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.is_empty())
}

fn is_secret_set(value: Option<&SecretString>) -> bool {
    value.is_some_and(|secret| !secret.is_empty())
}

fn credential_pair_incomplete(config: &S3SourceConfig, _: bool) -> bool {
    is_secret_set(config.aws_access_key_id()) != is_secret_set(config.aws_secret_access_key())
}

fn role_chain_missing_parent(config: &S3SourceConfig, _: bool) -> bool {
    is_set(config.customer_role_arn()) && !is_set(config.role_arn())
}

fn insecure_endpoint_in_restricted_mode(config: &S3SourceConfig, is_restricted_mode: bool) -> bool {
    is_restricted_mode && config.endpoint().starts_with(INSECURE_SCHEME_PREFIX)
}

const fn credential_pair_error(_: &S3SourceConfig) -> ConfigError {
    ConfigError::CredentialPairIncomplete
}

const fn role_chain_error(_: &S3SourceConfig) -> ConfigError {
    ConfigError::RoleChainMissingParent
}

fn insecure_endpoint_error(config: &S3SourceConfig) -> ConfigError {
    ConfigError::insecure_endpoint(config.endpoint())
}
