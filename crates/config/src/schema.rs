//! Published connector schema.
//!
//! The JSON Schema is derived from [`S3SourceConfig`] and then shaped: the
//! processing option list of the unstructured document format is cut down to
//! its first entry, so only local processing is offered.

use crate::delivery::json_type_name;
use crate::error::ConfigError;
use crate::spec::S3SourceConfig;
use schemars::generate::SchemaSettings;
use serde::Serialize;
use serde_json::Value;

/// Documentation link published with the connector specification.
pub const DOCUMENTATION_URL: &str = "https://docs.airbyte.com/integrations/sources/s3";

/// Slash-separated location of the processing options list.
///
/// Numeric segments index arrays; `4` is the unstructured format's
/// position in the file format `oneOf`.
pub const PROCESSING_OPTIONS_PATH: &str =
    "properties/streams/items/properties/format/oneOf/4/properties/processing/oneOf";

/// Connector specification document handed to the hosting framework.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSpecification {
    /// Link to the connector documentation.
    pub documentation_url: String,
    /// Shaped JSON Schema of the configuration.
    pub connection_specification: Value,
}

/// Derive the unshaped draft-07 JSON Schema of the configuration.
///
/// Subschemas are inlined so the shaping path can walk plain nesting
/// without resolving `$ref`s.
pub fn raw_config_schema() -> Result<Value, ConfigError> {
    let mut settings = SchemaSettings::draft07();
    settings.inline_subschemas = true;
    let mut generator = settings.into_generator();
    let schema = generator.root_schema_for::<S3SourceConfig>();

    serde_json::to_value(&schema).map_err(|error| ConfigError::schema_shape("", error.to_string()))
}

/// Keep only the first processing option in `schema`.
///
/// Fails with [`ConfigError::SchemaShapeMismatch`] when the path does not
/// resolve or does not end in a non-empty list. Everything outside the
/// truncated list is left untouched.
pub fn shape_schema(mut schema: Value) -> Result<Value, ConfigError> {
    let options = lookup(&schema, PROCESSING_OPTIONS_PATH)?;
    let first = match options {
        Value::Array(items) => items.first().cloned().ok_or_else(|| {
            ConfigError::schema_shape(PROCESSING_OPTIONS_PATH, "processing options list is empty")
        })?,
        other => {
            return Err(ConfigError::schema_shape(
                PROCESSING_OPTIONS_PATH,
                format!("expected an array, got {}", json_type_name(other)),
            ));
        },
    };

    *lookup_mut(&mut schema, PROCESSING_OPTIONS_PATH)? = Value::Array(vec![first]);
    Ok(schema)
}

/// Build the connector specification with the shaped schema.
pub fn connector_spec() -> Result<ConnectorSpecification, ConfigError> {
    let connection_specification = shape_schema(raw_config_schema()?)?;
    tracing::debug!(path = PROCESSING_OPTIONS_PATH, "config schema shaped");

    Ok(ConnectorSpecification {
        documentation_url: DOCUMENTATION_URL.to_string(),
        connection_specification,
    })
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get_mut(index)),
        _ => None,
    }
}

fn lookup<'a>(document: &'a Value, path: &str) -> Result<&'a Value, ConfigError> {
    let mut node = document;
    for (depth, segment) in path.split('/').enumerate() {
        node = child(node, segment).ok_or_else(|| {
            ConfigError::schema_shape(
                prefix(path, depth),
                format!("cannot resolve `{segment}` in {}", json_type_name(node)),
            )
        })?;
    }
    Ok(node)
}

fn lookup_mut<'a>(document: &'a mut Value, path: &str) -> Result<&'a mut Value, ConfigError> {
    let mut node = document;
    for (depth, segment) in path.split('/').enumerate() {
        node = child_mut(node, segment).ok_or_else(|| {
            ConfigError::schema_shape(prefix(path, depth), format!("cannot resolve `{segment}`"))
        })?;
    }
    Ok(node)
}

fn prefix(path: &str, depth: usize) -> String {
    path.split('/').take(depth + 1).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SECRET_FIELDS;
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::error::Error;

    fn collect_secret_properties(node: &Value, found: &mut BTreeSet<String>) {
        match node {
            Value::Object(map) => {
                if let Some(Value::Object(properties)) = map.get("properties") {
                    for (name, property) in properties {
                        if property.get("airbyte_secret") == Some(&Value::Bool(true)) {
                            found.insert(name.clone());
                        }
                    }
                }
                map.values().for_each(|value| collect_secret_properties(value, found));
            },
            Value::Array(items) => items.iter().for_each(|value| collect_secret_properties(value, found)),
            _ => {},
        }
    }

    fn tag_value(property: Option<&Value>) -> Option<&Value> {
        let property = property?;
        property
            .get("const")
            .or_else(|| property.get("enum").and_then(|values| values.get(0)))
    }

    #[test]
    fn raw_schema_lists_every_processing_mode() -> Result<(), Box<dyn Error>> {
        let schema = raw_config_schema()?;
        let options = lookup(&schema, PROCESSING_OPTIONS_PATH)?;

        assert_eq!(options.as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[test]
    fn connector_spec_keeps_only_local_processing() -> Result<(), Box<dyn Error>> {
        let spec = connector_spec()?;
        let options = lookup(&spec.connection_specification, PROCESSING_OPTIONS_PATH)?;

        let options = options
            .as_array()
            .ok_or_else(|| std::io::Error::other("processing options must be a list"))?;
        assert_eq!(options.len(), 1);
        assert_eq!(
            tag_value(options.first().and_then(|option| option.pointer("/properties/mode"))),
            Some(&json!("local"))
        );
        assert_eq!(spec.documentation_url, DOCUMENTATION_URL);
        Ok(())
    }

    #[test]
    fn unstructured_format_sits_at_index_four() -> Result<(), Box<dyn Error>> {
        let schema = raw_config_schema()?;
        let unstructured = lookup(
            &schema,
            "properties/streams/items/properties/format/oneOf/4/properties/filetype",
        )?;

        assert_eq!(tag_value(Some(unstructured)), Some(&json!("unstructured")));
        Ok(())
    }

    #[test]
    fn schema_carries_presentation_metadata() -> Result<(), Box<dyn Error>> {
        let schema = raw_config_schema()?;

        assert_eq!(schema.pointer("/title"), Some(&json!("S3 Source Spec")));
        assert_eq!(schema.pointer("/properties/bucket/order"), Some(&json!(0)));
        assert_eq!(schema.pointer("/properties/endpoint/default"), Some(&json!("")));
        assert_eq!(
            schema.pointer("/properties/delivery_method/group"),
            Some(&json!("advanced"))
        );
        assert_eq!(
            schema.pointer("/properties/aws_secret_access_key/airbyte_secret"),
            Some(&json!(true))
        );
        Ok(())
    }

    fn collect_descriptions<'a>(node: &'a Value, found: &mut Vec<&'a str>) {
        match node {
            Value::Object(map) => {
                if let Some(Value::String(description)) = map.get("description") {
                    found.push(description);
                }
                map.values().for_each(|value| collect_descriptions(value, found));
            },
            Value::Array(items) => items.iter().for_each(|value| collect_descriptions(value, found)),
            _ => {},
        }
    }

    #[test]
    fn descriptions_are_single_line_field_help() -> Result<(), Box<dyn Error>> {
        let schema = raw_config_schema()?;
        let mut descriptions = Vec::new();
        collect_descriptions(&schema, &mut descriptions);

        assert!(!descriptions.is_empty());
        assert!(descriptions.iter().all(|description| !description.contains('\n')));
        assert_eq!(
            schema.pointer("/properties/aws_access_key_id/description"),
            Some(&json!(
                "In order to access private Buckets stored on AWS S3, this connector requires credentials with the proper permissions. If accessing publicly available data, this field is not necessary. When used with Role ARN, these credentials will be used to assume the specified role."
            ))
        );
        assert_eq!(schema.pointer("/description"), None);
        assert_eq!(schema.pointer("/properties/delivery_method/description"), None);
        assert_eq!(schema.pointer("/properties/streams/items/description"), None);
        Ok(())
    }

    #[test]
    fn unit_enums_publish_plain_values() -> Result<(), Box<dyn Error>> {
        let schema = raw_config_schema()?;

        assert_eq!(
            schema.pointer("/properties/streams/items/properties/validation_policy/enum"),
            Some(&json!(["Emit Record", "Skip Record", "Wait for Discover"]))
        );
        Ok(())
    }

    #[test]
    fn secret_marked_properties_match_redaction_list() -> Result<(), Box<dyn Error>> {
        let mut found = BTreeSet::new();
        collect_secret_properties(&raw_config_schema()?, &mut found);

        let expected: BTreeSet<String> = SECRET_FIELDS.iter().map(ToString::to_string).collect();
        assert_eq!(found, expected);
        Ok(())
    }

    #[test]
    fn shaping_leaves_everything_else_untouched() -> Result<(), Box<dyn Error>> {
        let raw = raw_config_schema()?;
        let mut shaped = shape_schema(raw.clone())?;
        let mut expected = raw;

        *lookup_mut(&mut shaped, PROCESSING_OPTIONS_PATH)? = Value::Null;
        *lookup_mut(&mut expected, PROCESSING_OPTIONS_PATH)? = Value::Null;
        assert_eq!(shaped, expected);
        Ok(())
    }

    #[test]
    fn missing_path_segment_is_reported() {
        let error = shape_schema(json!({ "properties": {} }));

        assert_eq!(
            error,
            Err(ConfigError::schema_shape(
                "properties/streams",
                "cannot resolve `streams` in object"
            ))
        );
    }

    #[test]
    fn empty_or_non_list_options_are_rejected() {
        let with_options = |options: Value| {
            json!({ "properties": { "streams": { "items": { "properties": { "format": {
                "oneOf": [{}, {}, {}, {}, { "properties": { "processing": { "oneOf": options } } }]
            } } } } } })
        };

        assert!(matches!(
            shape_schema(with_options(json!([]))),
            Err(ConfigError::SchemaShapeMismatch { .. })
        ));
        assert!(matches!(
            shape_schema(with_options(json!({ "mode": "local" }))),
            Err(ConfigError::SchemaShapeMismatch { .. })
        ));
    }

    #[test]
    fn single_option_list_is_unchanged() -> Result<(), Box<dyn Error>> {
        let schema = json!({ "properties": { "streams": { "items": { "properties": { "format": {
            "oneOf": [{}, {}, {}, {}, { "properties": { "processing": { "oneOf": [{ "title": "Local" }] } } }]
        } } } } } });

        assert_eq!(shape_schema(schema.clone())?, schema);
        Ok(())
    }
}
