//! Delivery method: how synced files reach the destination.

use crate::error::ConfigError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Config field holding the delivery method.
pub const DELIVERY_METHOD_FIELD: &str = "delivery_method";
/// Discriminator key inside the delivery method object.
pub const DELIVERY_TYPE_KEY: &str = "delivery_type";
/// Discriminator value for record delivery.
pub const USE_RECORDS_TRANSFER: &str = "use_records_transfer";
/// Discriminator value for raw file delivery.
pub const USE_FILE_TRANSFER: &str = "use_file_transfer";

const fn default_true() -> bool {
    true
}

/// Tagged union selected by `delivery_type`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "delivery_type")]
#[schemars(description = "")]
pub enum DeliveryMethod {
    /// Structured records.
    #[default]
    #[serde(rename = "use_records_transfer")]
    #[schemars(
        title = "Replicate Records",
        description = "Recommended - Extract and load structured records into your destination of choice. This is the classic method of moving data in Airbyte. It allows for blocking and hashing individual fields or files from a structured schema. Data can be flattened, typed and deduped depending on the destination."
    )]
    Records,
    /// Opaque file copies.
    #[serde(rename = "use_file_transfer")]
    #[schemars(
        title = "Copy Raw Files",
        description = "Copy raw files without parsing their contents. Bits are copied into the destination exactly as they appeared in the source. Recommended for use with unstructured text data, non-text and compressed files."
    )]
    RawFiles {
        /// Keep the source directory layout in destination paths.
        #[serde(default = "default_true")]
        #[schemars(
            title = "Preserve Sub-Directories in File Paths",
            description = "If enabled, sends subdirectory folder structure along with source file names to the destination. Otherwise, files will be synced by their names only. This option is ignored when file-based replication is not enabled."
        )]
        preserve_directory_structure: bool,
    },
}

impl DeliveryMethod {
    /// Discriminator values in declaration order.
    pub const DISCRIMINATORS: [&'static str; 2] = [USE_RECORDS_TRANSFER, USE_FILE_TRANSFER];

    /// Resolve the delivery method from its raw config value.
    ///
    /// An absent or `null` value selects the default variant. The
    /// discriminator is read before the variant fields so an unknown
    /// `delivery_type` is reported as such rather than as a shape error.
    pub fn from_field(value: Option<Value>) -> Result<Self, ConfigError> {
        let object = match value {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(object)) => object,
            Some(other) => {
                return Err(ConfigError::field(
                    DELIVERY_METHOD_FIELD,
                    format!("expected an object, got {}", json_type_name(&other)),
                ));
            },
        };

        match object.get(DELIVERY_TYPE_KEY) {
            Some(Value::String(tag)) if Self::DISCRIMINATORS.contains(&tag.as_str()) => {},
            Some(Value::String(tag)) => {
                return Err(ConfigError::field(
                    DELIVERY_METHOD_FIELD,
                    format!(
                        "unknown {DELIVERY_TYPE_KEY} `{tag}` (expected one of: {})",
                        Self::DISCRIMINATORS.join(", ")
                    ),
                ));
            },
            Some(other) => {
                return Err(ConfigError::field(
                    DELIVERY_METHOD_FIELD,
                    format!(
                        "{DELIVERY_TYPE_KEY} must be a string, got {}",
                        json_type_name(other)
                    ),
                ));
            },
            None => {
                return Err(ConfigError::field(
                    DELIVERY_METHOD_FIELD,
                    format!("missing discriminator `{DELIVERY_TYPE_KEY}`"),
                ));
            },
        }

        serde_json::from_value(Value::Object(object))
            .map_err(|error| ConfigError::field(DELIVERY_METHOD_FIELD, error.to_string()))
    }

    /// Discriminator value of this variant.
    #[must_use]
    pub const fn delivery_type(&self) -> &'static str {
        match self {
            Self::Records => USE_RECORDS_TRANSFER,
            Self::RawFiles { .. } => USE_FILE_TRANSFER,
        }
    }

    /// Returns true when files are copied without parsing.
    #[must_use]
    pub const fn is_raw_files(&self) -> bool {
        matches!(self, Self::RawFiles { .. })
    }
}

pub(crate) const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
