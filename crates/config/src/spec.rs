//! The S3 source configuration model.
//!
//! [`S3SourceConfig`] is built once per invocation from a raw JSON mapping
//! and is read-only afterwards: fields are private and exposed through
//! accessors. Parsing here is field-level only; cross-field rules live in
//! [`crate::validation`].

use crate::delivery::{DELIVERY_METHOD_FIELD, DeliveryMethod, json_type_name};
use crate::error::{ConfigError, ROOT_FIELD};
use crate::file_based::{FileFormat, ProcessingConfig, StreamConfig};
use schemars::JsonSchema;
use s3_source_shared::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property names whose values are secrets anywhere in the config tree.
pub const SECRET_FIELDS: [&str; 3] = ["aws_access_key_id", "aws_secret_access_key", "api_key"];
/// Placeholder written over secrets in the redacted projection.
pub const SECRET_MASK: &str = "**********";

/// Layout of `start_date`; `.` matches any character and `9` any ASCII digit.
const START_DATE_LAYOUT: &str = "9999-99-99T99:99:99.999999Z";

/// Configuration for a source reading files from an S3-compatible store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[schemars(title = "S3 Source Spec", description = "")]
pub struct S3SourceConfig {
    #[schemars(
        title = "The list of streams to sync",
        description = "Each instance of this configuration defines a <a href=\"https://docs.airbyte.com/cloud/core-concepts#stream\">stream</a>. Use this to define which files belong in the stream, their format, and how they should be parsed and validated. When sending data to warehouse destination such as Snowflake or BigQuery, each stream is a separate table.",
        extend("order" = 10)
    )]
    streams: Vec<StreamConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        title = "Start Date",
        description = "UTC date and time in the format 2017-01-25T00:00:00.000000Z. Any file modified before this date will not be replicated.",
        extend(
            "order" = 1,
            "format" = "date-time",
            "pattern" = "^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}.[0-9]{6}Z$",
            "pattern_descriptor" = "YYYY-MM-DDTHH:mm:ss.SSSSSSZ",
            "examples" = ["2021-01-01T00:00:00.000000Z"]
        )
    )]
    start_date: Option<String>,
    #[schemars(
        title = "Bucket",
        description = "Name of the S3 bucket where the file(s) exist.",
        extend("order" = 0)
    )]
    bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        title = "AWS Access Key ID",
        description = "In order to access private Buckets stored on AWS S3, this connector requires credentials with the proper permissions. If accessing publicly available data, this field is not necessary. When used with Role ARN, these credentials will be used to assume the specified role.",
        with = "Option<String>",
        extend("airbyte_secret" = true, "order" = 2)
    )]
    aws_access_key_id: Option<SecretString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        title = "AWS Role ARN",
        description = "Specifies the Amazon Resource Name (ARN) of an IAM role that you want to assume to access the S3 bucket. When provided along with AWS Access Key ID and Secret, the connector will use those credentials to call AWS STS AssumeRole and obtain temporary credentials for the specified role. This enables cross-account access where the provided credentials belong to an account that has permission to assume a role in another account that has S3 access. For cross-account role chaining, also provide the Customer Role ARN field.",
        extend("order" = 6)
    )]
    role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        title = "Customer Role ARN",
        description = "For cross-account role chaining: The customer's IAM role ARN with S3 read permissions. When provided, the connector first assumes the Role ARN above, then uses those credentials to assume this customer role. The Role ARN's trust policy must allow assuming this customer role.",
        extend("order" = 7)
    )]
    customer_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        title = "AWS Secret Access Key",
        description = "In order to access private Buckets stored on AWS S3, this connector requires credentials with the proper permissions. If accessing publicly available data, this field is not necessary. When used with Role ARN, these credentials will be used to assume the specified role.",
        with = "Option<String>",
        extend("airbyte_secret" = true, "order" = 3)
    )]
    aws_secret_access_key: Option<SecretString>,
    #[serde(default)]
    #[schemars(
        title = "Endpoint",
        description = "Endpoint to an S3 compatible service. Leave empty to use AWS.",
        extend(
            "examples" = ["my-s3-endpoint.com", "https://my-s3-endpoint.com"],
            "order" = 4
        )
    )]
    endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        title = "AWS Region",
        description = "AWS region where the S3 bucket is located. If not provided, the region will be determined automatically.",
        extend("order" = 5)
    )]
    region_name: Option<String>,
    #[serde(default)]
    #[schemars(
        title = "Delivery Method",
        extend("order" = 8, "display_type" = "radio", "group" = "advanced")
    )]
    delivery_method: DeliveryMethod,
}

impl S3SourceConfig {
    /// Parse a raw key/value mapping into a typed configuration.
    ///
    /// Every declared field is decoded on its own so failures name the
    /// offending field. Unrecognized keys are ignored.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(ConfigError::field(
                    ROOT_FIELD,
                    format!("expected an object, got {}", json_type_name(&other)),
                ));
            },
        };

        let bucket: String = take_required(&mut map, "bucket")?;
        let start_date: Option<String> = take_optional(&mut map, "start_date")?;
        if start_date
            .as_deref()
            .is_some_and(|start_date| !matches_start_date_layout(start_date))
        {
            return Err(ConfigError::field(
                "start_date",
                "expected format YYYY-MM-DDTHH:mm:ss.SSSSSSZ",
            ));
        }
        let aws_access_key_id = take_secret(&mut map, "aws_access_key_id")?;
        let aws_secret_access_key = take_secret(&mut map, "aws_secret_access_key")?;
        let endpoint: Option<String> = take_optional(&mut map, "endpoint")?;
        let region_name = take_optional(&mut map, "region_name")?;
        let role_arn = take_optional(&mut map, "role_arn")?;
        let customer_role_arn = take_optional(&mut map, "customer_role_arn")?;
        let delivery_method = DeliveryMethod::from_field(map.remove(DELIVERY_METHOD_FIELD))?;

        let streams = take_required::<Vec<Value>>(&mut map, "streams")?
            .into_iter()
            .enumerate()
            .map(|(index, stream)| decode_stream(index, &stream))
            .collect::<Result<Vec<_>, _>>()?;

        for key in map.keys() {
            tracing::debug!(field = %key, "ignoring unrecognized config field");
        }

        Ok(Self {
            streams,
            start_date,
            bucket,
            aws_access_key_id,
            role_arn,
            customer_role_arn,
            aws_secret_access_key,
            endpoint: endpoint.unwrap_or_default(),
            region_name,
            delivery_method,
        })
    }

    /// Target bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Files modified before this instant are skipped.
    #[must_use]
    pub fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    /// Static access key id, if configured.
    #[must_use]
    pub const fn aws_access_key_id(&self) -> Option<&SecretString> {
        self.aws_access_key_id.as_ref()
    }

    /// Static secret access key, if configured.
    #[must_use]
    pub const fn aws_secret_access_key(&self) -> Option<&SecretString> {
        self.aws_secret_access_key.as_ref()
    }

    /// Role assumed for temporary credentials.
    #[must_use]
    pub fn role_arn(&self) -> Option<&str> {
        self.role_arn.as_deref()
    }

    /// Second role assumed after `role_arn` (role chaining).
    #[must_use]
    pub fn customer_role_arn(&self) -> Option<&str> {
        self.customer_role_arn.as_deref()
    }

    /// Alternate service endpoint; empty means AWS.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Bucket region; `None` means auto-detect.
    #[must_use]
    pub fn region_name(&self) -> Option<&str> {
        self.region_name.as_deref()
    }

    /// How files are delivered downstream.
    #[must_use]
    pub const fn delivery_method(&self) -> &DeliveryMethod {
        &self.delivery_method
    }

    /// Stream definitions.
    #[must_use]
    pub fn streams(&self) -> &[StreamConfig] {
        &self.streams
    }

    /// Serialize to the key/value form accepted by [`Self::from_value`].
    ///
    /// The output carries raw secrets; use [`Self::redacted_json`] for logs.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Serialize with every secret replaced by [`SECRET_MASK`].
    pub fn redacted_json(&self) -> Result<Value, serde_json::Error> {
        let mut value = self.to_value()?;
        mask_secrets(&mut value);
        Ok(value)
    }
}

fn take_required<T>(map: &mut Map<String, Value>, field: &'static str) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    match map.remove(field) {
        None | Some(Value::Null) => Err(ConfigError::field(field, "field required")),
        Some(value) => decode(field, value),
    }
}

fn take_optional<T>(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: DeserializeOwned,
{
    match map.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decode(field, value).map(Some),
    }
}

fn decode<T>(field: &'static str, value: Value) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(value).map_err(|error| ConfigError::field(field, error.to_string()))
}

/// Secrets never reach the error text, whatever their type.
fn take_secret(
    map: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<SecretString>, ConfigError> {
    take_optional(map, field).map_err(|_| ConfigError::field(field, "expected a string"))
}

fn decode_stream(index: usize, stream: &Value) -> Result<StreamConfig, ConfigError> {
    let config = StreamConfig::deserialize(stream).map_err(|error| {
        let (path, error) = narrow_stream_error(stream).unwrap_or((String::new(), error));
        ConfigError::field(
            format!("streams[{index}]{path}"),
            scrub_secrets(stream, error.to_string()),
        )
    })?;
    config.check(index)?;
    Ok(config)
}

/// Re-decode the nested format sections to find the deepest one that fails.
fn narrow_stream_error(stream: &Value) -> Option<(String, serde_json::Error)> {
    let format = stream.get("format")?;
    let error = FileFormat::deserialize(format).err()?;

    let processing = format
        .get("processing")
        .filter(|_| format.get("filetype").and_then(Value::as_str) == Some("unstructured"));
    match processing.map(|processing| ProcessingConfig::deserialize(processing)) {
        Some(Err(inner)) => Some((".format.processing".to_string(), inner)),
        _ => Some((".format".to_string(), error)),
    }
}

/// Mask every secret literal found under `value` that appears in `reason`.
fn scrub_secrets(value: &Value, reason: String) -> String {
    let mut secrets = Vec::new();
    collect_secret_literals(value, &mut secrets);
    secrets
        .iter()
        .filter(|secret| !secret.is_empty())
        .fold(reason, |reason, secret| reason.replace(secret.as_str(), SECRET_MASK))
}

fn collect_secret_literals(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map {
                match entry {
                    Value::Object(_) | Value::Array(_) => collect_secret_literals(entry, found),
                    Value::Null => {},
                    Value::String(secret) if SECRET_FIELDS.contains(&key.as_str()) => {
                        found.push(secret.clone());
                    },
                    other if SECRET_FIELDS.contains(&key.as_str()) => found.push(other.to_string()),
                    _ => {},
                }
            }
        },
        Value::Array(items) => items.iter().for_each(|item| collect_secret_literals(item, found)),
        _ => {},
    }
}

fn matches_start_date_layout(value: &str) -> bool {
    value.len() == START_DATE_LAYOUT.len()
        && value
            .bytes()
            .zip(START_DATE_LAYOUT.bytes())
            .all(|(byte, expected)| match expected {
                b'9' => byte.is_ascii_digit(),
                b'.' => true,
                other => byte == other,
            })
}

fn mask_secrets(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if SECRET_FIELDS.contains(&key.as_str())
                    && entry.as_str().is_some_and(|secret| !secret.is_empty())
                {
                    *entry = Value::String(SECRET_MASK.to_string());
                } else {
                    mask_secrets(entry);
                }
            }
        },
        Value::Array(items) => items.iter_mut().for_each(mask_secrets),
        _ => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::USE_FILE_TRANSFER;
    use crate::file_based::FileFormat;
    use serde_json::json;
    use std::error::Error;

    fn minimal() -> Value {
        json!({
            "bucket": "analytics",
            "streams": [{ "name": "events", "format": { "filetype": "jsonl" } }]
        })
    }

    #[test]
    fn minimal_config_applies_defaults() -> Result<(), Box<dyn Error>> {
        let config = S3SourceConfig::from_value(minimal())?;

        assert_eq!(config.bucket(), "analytics");
        assert_eq!(config.endpoint(), "");
        assert_eq!(config.region_name(), None);
        assert_eq!(config.delivery_method(), &DeliveryMethod::Records);
        assert!(config.aws_access_key_id().is_none());
        assert_eq!(config.streams().len(), 1);
        assert_eq!(
            config.streams().first().map(|stream| &stream.format),
            Some(&FileFormat::Jsonl)
        );
        Ok(())
    }

    #[test]
    fn missing_bucket_is_a_field_error() {
        let mut value = minimal();
        if let Some(map) = value.as_object_mut() {
            map.remove("bucket");
        }

        assert_eq!(
            S3SourceConfig::from_value(value),
            Err(ConfigError::field("bucket", "field required"))
        );
    }

    #[test]
    fn wrong_type_names_the_field() -> Result<(), Box<dyn Error>> {
        let mut value = minimal();
        value["region_name"] = json!(42);

        let error = S3SourceConfig::from_value(value)
            .err()
            .ok_or_else(|| std::io::Error::other("expected type error"))?;
        assert!(matches!(error, ConfigError::FieldParse { ref field, .. } if field == "region_name"));
        Ok(())
    }

    #[test]
    fn non_object_input_is_rejected() {
        assert!(matches!(
            S3SourceConfig::from_value(json!(["bucket"])),
            Err(ConfigError::FieldParse { ref field, .. }) if field == ROOT_FIELD
        ));
    }

    #[test]
    fn null_endpoint_falls_back_to_empty() -> Result<(), Box<dyn Error>> {
        let mut value = minimal();
        value["endpoint"] = Value::Null;

        let config = S3SourceConfig::from_value(value)?;
        assert_eq!(config.endpoint(), "");
        Ok(())
    }

    #[test]
    fn unknown_keys_are_ignored() -> Result<(), Box<dyn Error>> {
        let mut value = minimal();
        value["unexpected"] = json!(true);

        assert!(S3SourceConfig::from_value(value).is_ok());
        Ok(())
    }

    #[test]
    fn start_date_layout_is_enforced() -> Result<(), Box<dyn Error>> {
        let mut value = minimal();
        value["start_date"] = json!("2021-01-01T00:00:00.000000Z");
        let config = S3SourceConfig::from_value(value.clone())?;
        assert_eq!(config.start_date(), Some("2021-01-01T00:00:00.000000Z"));

        value["start_date"] = json!("2021-01-01");
        assert!(matches!(
            S3SourceConfig::from_value(value),
            Err(ConfigError::FieldParse { ref field, .. }) if field == "start_date"
        ));
        Ok(())
    }

    #[test]
    fn unknown_delivery_type_is_a_field_error() {
        let mut value = minimal();
        value["delivery_method"] = json!({ "delivery_type": "use_carrier_pigeon" });

        assert!(matches!(
            S3SourceConfig::from_value(value),
            Err(ConfigError::FieldParse { ref field, ref reason })
                if field == DELIVERY_METHOD_FIELD && reason.contains("use_carrier_pigeon")
        ));
    }

    #[test]
    fn stream_errors_are_indexed() {
        let mut value = minimal();
        value["streams"] = json!([
            { "name": "ok", "format": { "filetype": "jsonl" } },
            { "name": "", "format": { "filetype": "jsonl" } }
        ]);

        assert_eq!(
            S3SourceConfig::from_value(value),
            Err(ConfigError::field("streams[1].name", "must not be empty"))
        );
    }

    #[test]
    fn mistyped_secret_value_stays_out_of_the_error() -> Result<(), Box<dyn Error>> {
        let mut value = minimal();
        value["aws_access_key_id"] = json!("AKIAEXAMPLE");
        value["aws_secret_access_key"] = json!(987_654_321);

        let error = S3SourceConfig::from_value(value)
            .err()
            .ok_or_else(|| std::io::Error::other("expected type error"))?;
        assert_eq!(
            error,
            ConfigError::field("aws_secret_access_key", "expected a string")
        );
        assert!(!error.to_string().contains("987654321"));
        Ok(())
    }

    #[test]
    fn nested_type_error_keeps_its_path_and_hides_the_api_key() -> Result<(), Box<dyn Error>> {
        let mut value = minimal();
        value["streams"] = json!([
            { "name": "events", "format": { "filetype": "jsonl" } },
            {
                "name": "docs",
                "format": {
                    "filetype": "unstructured",
                    "processing": { "mode": "api", "api_key": 55_551_234 }
                }
            }
        ]);

        let error = S3SourceConfig::from_value(value)
            .err()
            .ok_or_else(|| std::io::Error::other("expected type error"))?;
        assert!(matches!(
            error,
            ConfigError::FieldParse { ref field, .. } if field == "streams[1].format.processing"
        ));
        assert!(!error.to_string().contains("55551234"));
        Ok(())
    }

    #[test]
    fn bad_csv_option_names_the_format() {
        let mut value = minimal();
        value["streams"] = json!([{
            "name": "orders",
            "format": { "filetype": "csv", "double_quote": "sometimes" }
        }]);

        assert!(matches!(
            S3SourceConfig::from_value(value),
            Err(ConfigError::FieldParse { ref field, .. }) if field == "streams[0].format"
        ));
    }

    #[test]
    fn redacted_json_masks_every_secret() -> Result<(), Box<dyn Error>> {
        let mut value = minimal();
        value["aws_access_key_id"] = json!("AKIAEXAMPLE");
        value["aws_secret_access_key"] = json!("wJalrXUtnFEMI");
        value["streams"] = json!([{
            "name": "docs",
            "format": {
                "filetype": "unstructured",
                "processing": { "mode": "api", "api_key": "unstructured-key" }
            }
        }]);
        value["delivery_method"] = json!({ "delivery_type": USE_FILE_TRANSFER });

        let config = S3SourceConfig::from_value(value)?;
        let redacted = config.redacted_json()?.to_string();

        assert!(!redacted.contains("AKIAEXAMPLE"));
        assert!(!redacted.contains("wJalrXUtnFEMI"));
        assert!(!redacted.contains("unstructured-key"));
        assert!(redacted.contains(SECRET_MASK));
        assert!(!format!("{config:?}").contains("AKIAEXAMPLE"));
        Ok(())
    }
}
