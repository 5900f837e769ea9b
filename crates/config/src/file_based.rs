//! Stream and file-format settings shared by file-based sources.
//!
//! These fields belong to the generic file-based framework. They are modeled
//! here because the connector schema embeds them, and because the schema
//! shaping step reaches into the unstructured format's `processing` options.
//! Variant order in [`FileFormat`] is part of the schema contract.

use crate::error::ConfigError;
use schemars::JsonSchema;
use s3_source_shared::SecretString;
use serde::{Deserialize, Serialize};

const fn default_true() -> bool {
    true
}

const fn default_days_to_sync() -> u32 {
    3
}

fn default_globs() -> Vec<String> {
    vec!["**".to_string()]
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_quote_char() -> String {
    "\"".to_string()
}

fn default_encoding() -> Option<String> {
    Some("utf8".to_string())
}

fn default_true_values() -> Vec<String> {
    ["y", "yes", "t", "true", "on", "1"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_false_values() -> Vec<String> {
    ["n", "no", "f", "false", "off", "0"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_api_url() -> String {
    "https://api.unstructured.io".to_string()
}

/// A single stream: a named set of files sharing one format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "FileBasedStreamConfig", description = "")]
pub struct StreamConfig {
    /// The name of the stream.
    #[schemars(title = "Name")]
    pub name: String,
    /// Glob patterns selecting the stream's files.
    #[serde(default = "default_globs")]
    #[schemars(
        title = "Globs",
        description = "The pattern used to specify which files should be selected from the file system. For more information on glob pattern matching look <a href=\"https://en.wikipedia.org/wiki/Glob_(programming)\">here</a>.",
        extend("order" = 1)
    )]
    pub globs: Vec<String>,
    /// Deprecated path prefix from older connector versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        title = "Legacy Prefix",
        description = "The path prefix configured in v3 versions of the S3 connector. This option is deprecated in favor of a single glob.",
        extend("airbyte_hidden" = true)
    )]
    pub legacy_prefix: Option<String>,
    /// Handling of records that do not match the schema.
    #[serde(default)]
    #[schemars(
        title = "Validation Policy",
        description = "The name of the validation policy that dictates sync behavior when a record does not adhere to the stream schema."
    )]
    pub validation_policy: ValidationPolicy,
    /// User-supplied schema overriding discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        title = "Input Schema",
        description = "The schema that will be used to validate records extracted from the file. This will override the stream schema that is auto-detected from incoming files."
    )]
    pub input_schema: Option<String>,
    /// Record identifier column(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        title = "Primary Key",
        description = "The column or columns (for a composite key) that serves as the unique identifier of a record. If empty, the primary key will default to the parser's default primary key.",
        extend("airbyte_hidden" = true)
    )]
    pub primary_key: Option<String>,
    /// Day window read once the state history is full.
    #[serde(default = "default_days_to_sync")]
    #[schemars(
        title = "Days To Sync If History Is Full",
        description = "When the state history of the file store is full, syncs will only read files that were last modified in the provided day range."
    )]
    pub days_to_sync_if_history_is_full: u32,
    /// File format and its parsing options.
    #[schemars(
        title = "Format",
        description = "The configuration options that are used to alter how to read incoming files that deviate from the standard formatting."
    )]
    pub format: FileFormat,
    /// Skip schema validation entirely.
    #[serde(default)]
    #[schemars(
        title = "Schemaless",
        description = "When enabled, syncs will not validate or structure records against the stream's schema."
    )]
    pub schemaless: bool,
    /// How many recent files feed schema discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        title = "Files To Read For Schema Discover",
        description = "The number of resent files which will be used to discover the schema for this stream.",
        extend("exclusiveMinimum" = 0)
    )]
    pub recent_n_files_to_read_for_schema_discovery: Option<u32>,
}

impl StreamConfig {
    /// Check field-level constraints serde cannot express.
    ///
    /// `index` is the stream's position in the `streams` list and is only
    /// used to name the offending field.
    pub fn check(&self, index: usize) -> Result<(), ConfigError> {
        let field = |name: &str| format!("streams[{index}].{name}");

        if self.name.trim().is_empty() {
            return Err(ConfigError::field(field("name"), "must not be empty"));
        }
        if self.recent_n_files_to_read_for_schema_discovery == Some(0) {
            return Err(ConfigError::field(
                field("recent_n_files_to_read_for_schema_discovery"),
                "must be greater than 0",
            ));
        }
        if let FileFormat::Csv(csv) = &self.format {
            csv.check(&field("format"))?;
        }
        Ok(())
    }
}

/// How records that do not match the stream schema are handled.
///
/// Variants carry no docs: documented unit variants would be published as a
/// `oneOf` instead of a plain `enum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "")]
#[allow(missing_docs, reason = "variant docs would change the published enum shape")]
pub enum ValidationPolicy {
    #[default]
    #[serde(rename = "Emit Record")]
    EmitRecord,
    #[serde(rename = "Skip Record")]
    SkipRecord,
    #[serde(rename = "Wait for Discover")]
    WaitForDiscover,
}

/// File format, selected by `filetype`.
///
/// The declaration order is the `oneOf` order in the published schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "filetype", rename_all = "lowercase")]
#[schemars(description = "")]
pub enum FileFormat {
    /// Avro files.
    #[schemars(title = "Avro Format", description = "")]
    Avro(AvroFormat),
    /// Delimited text files.
    #[schemars(title = "CSV Format", description = "")]
    Csv(CsvFormat),
    /// Newline-delimited JSON files.
    #[schemars(title = "Jsonl Format", description = "")]
    Jsonl,
    /// Parquet files.
    #[schemars(title = "Parquet Format", description = "")]
    Parquet(ParquetFormat),
    /// Text extracted from documents, one record per file.
    #[schemars(
        title = "Unstructured Document Format",
        description = "Extract text from document formats (.pdf, .docx, .md, .pptx) and emit as one record per file."
    )]
    Unstructured(UnstructuredFormat),
    /// Excel workbooks.
    #[schemars(title = "Excel Format", description = "")]
    Excel,
}

impl FileFormat {
    /// The `filetype` discriminator value.
    #[must_use]
    pub const fn filetype(&self) -> &'static str {
        match self {
            Self::Avro(_) => "avro",
            Self::Csv(_) => "csv",
            Self::Jsonl => "jsonl",
            Self::Parquet(_) => "parquet",
            Self::Unstructured(_) => "unstructured",
            Self::Excel => "excel",
        }
    }
}

/// Avro parsing options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "")]
pub struct AvroFormat {
    /// Emit doubles as strings.
    #[serde(default)]
    #[schemars(
        title = "Convert Double Fields to Strings",
        description = "Whether to convert double fields to strings. This is recommended if you have decimal numbers with a high degree of precision because there can be a loss precision when handling floating point numbers."
    )]
    pub double_as_string: bool,
}

/// Parquet parsing options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "")]
pub struct ParquetFormat {
    /// Emit decimals as floats.
    #[serde(default)]
    #[schemars(
        title = "Convert Decimal Fields to Floats",
        description = "Whether to convert decimal fields to floats. There is a loss of precision when converting decimals to floats, so this is not recommended."
    )]
    pub decimal_as_float: bool,
}

/// CSV parsing options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "")]
pub struct CsvFormat {
    /// Cell delimiter; one character or the literal `\t`.
    #[serde(default = "default_delimiter")]
    #[schemars(
        title = "Delimiter",
        description = "The character delimiting individual cells in the CSV data. This may only be a 1-character string. For tab-delimited data enter '\\t'."
    )]
    pub delimiter: String,
    /// Quote character.
    #[serde(default = "default_quote_char")]
    #[schemars(
        title = "Quote Character",
        description = "The character used for quoting CSV values. To disallow quoting, make this field blank."
    )]
    pub quote_char: String,
    /// Escape character.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        title = "Escape Character",
        description = "The character used for escaping special characters. To disallow escaping, leave this field blank."
    )]
    pub escape_char: Option<String>,
    /// The character encoding of the CSV data. Leave blank to default to <strong>UTF8</strong>.
    #[serde(default = "default_encoding")]
    #[schemars(title = "Encoding")]
    pub encoding: Option<String>,
    /// Whether two quotes in a quoted CSV value denote a single quote in the data.
    #[serde(default = "default_true")]
    #[schemars(title = "Double Quote")]
    pub double_quote: bool,
    /// A set of case-sensitive strings that should be interpreted as null values.
    #[serde(default)]
    #[schemars(title = "Null Values")]
    pub null_values: Vec<String>,
    /// Whether `null_values` matches turn into nulls.
    #[serde(default = "default_true")]
    #[schemars(
        title = "Strings Can Be Null",
        description = "Whether strings can be interpreted as null values. If true, strings that match the null_values set will be interpreted as null. If false, strings that match the null_values set will be interpreted as the string itself."
    )]
    pub strings_can_be_null: bool,
    /// The number of rows to skip before the header row.
    #[serde(default)]
    #[schemars(title = "Skip Rows Before Header")]
    pub skip_rows_before_header: u32,
    /// The number of rows to skip after the header row.
    #[serde(default)]
    #[schemars(title = "Skip Rows After Header")]
    pub skip_rows_after_header: u32,
    /// Where column names come from.
    #[serde(default)]
    #[schemars(
        title = "CSV Header Definition",
        description = "How headers will be defined. `User Provided` assumes the CSV does not have a header row and uses the headers provided and `Autogenerated` assumes the CSV does not have a header row and the CDK will generate headers using for `f{i}` where `i` is the index starting from 0. Else, the default behavior is to use the header from the CSV file."
    )]
    pub header_definition: CsvHeaderDefinition,
    /// A set of case-sensitive strings that should be interpreted as true values.
    #[serde(default = "default_true_values")]
    #[schemars(title = "True Values")]
    pub true_values: Vec<String>,
    /// A set of case-sensitive strings that should be interpreted as false values.
    #[serde(default = "default_false_values")]
    #[schemars(title = "False Values")]
    pub false_values: Vec<String>,
    /// Tolerate rows whose field count differs from the schema.
    #[serde(default)]
    #[schemars(
        title = "Ignore errors on field mismatch",
        description = "Whether to ignore errors that occur when the number of fields in the CSV does not match the number of columns in the schema."
    )]
    pub ignore_errors_on_fields_mismatch: bool,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            quote_char: default_quote_char(),
            escape_char: None,
            encoding: default_encoding(),
            double_quote: true,
            null_values: Vec::new(),
            strings_can_be_null: true,
            skip_rows_before_header: 0,
            skip_rows_after_header: 0,
            header_definition: CsvHeaderDefinition::default(),
            true_values: default_true_values(),
            false_values: default_false_values(),
            ignore_errors_on_fields_mismatch: false,
        }
    }
}

impl CsvFormat {
    /// Literal accepted in place of an actual tab character.
    pub const TAB_ESCAPE: &'static str = "\\t";

    fn check(&self, prefix: &str) -> Result<(), ConfigError> {
        if self.delimiter != Self::TAB_ESCAPE && self.delimiter.chars().count() != 1 {
            return Err(ConfigError::field(
                format!("{prefix}.delimiter"),
                "delimiter should only be one character",
            ));
        }
        if self.quote_char.chars().count() != 1 {
            return Err(ConfigError::field(
                format!("{prefix}.quote_char"),
                "quote_char should only be one character",
            ));
        }
        if self
            .escape_char
            .as_ref()
            .is_some_and(|escape_char| escape_char.chars().count() != 1)
        {
            return Err(ConfigError::field(
                format!("{prefix}.escape_char"),
                "escape_char should only be one character",
            ));
        }
        if matches!(
            &self.header_definition,
            CsvHeaderDefinition::UserProvided { column_names } if column_names.is_empty()
        ) {
            return Err(ConfigError::field(
                format!("{prefix}.header_definition.column_names"),
                "at least one column name is required",
            ));
        }
        Ok(())
    }
}

/// Where CSV column names come from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "header_definition_type")]
#[schemars(description = "")]
pub enum CsvHeaderDefinition {
    /// Use the first row of the file as headers.
    #[default]
    #[serde(rename = "From CSV")]
    #[schemars(title = "From CSV", description = "")]
    FromCsv,
    /// Generate `f0`, `f1`, ... headers.
    #[serde(rename = "Autogenerated")]
    #[schemars(title = "Autogenerated", description = "")]
    Autogenerated,
    /// Use the provided column names.
    #[serde(rename = "User Provided")]
    #[schemars(title = "User Provided", description = "")]
    UserProvided {
        /// The column names that will be used while emitting the CSV records
        #[schemars(title = "Column Names")]
        column_names: Vec<String>,
    },
}

/// Options for extracting text from documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "")]
pub struct UnstructuredFormat {
    /// Skip unparseable files instead of failing the sync.
    #[serde(default = "default_true")]
    #[schemars(
        title = "Skip Unprocessable Files",
        description = "If true, skip files that cannot be parsed and pass the error message along as the _ab_source_file_parse_error field. If false, fail the sync.",
        extend("always_show" = true)
    )]
    pub skip_unprocessable_files: bool,
    /// Document parsing strategy.
    #[serde(default)]
    #[schemars(
        title = "Parsing Strategy",
        description = "The strategy used to parse documents. `fast` extracts text directly from the document which doesn't work for all files. `ocr_only` is more reliable, but slower. `hi_res` is the most reliable, but requires an API key and a hosted instance of unstructured and can't be used with local mode. See the unstructured.io documentation for more details: https://unstructured-io.github.io/unstructured/core/partition.html#partition-pdf",
        extend("always_show" = true, "order" = 0)
    )]
    pub strategy: UnstructuredStrategy,
    /// Processing configuration
    #[serde(default)]
    #[schemars(title = "Processing", description = "Processing configuration")]
    pub processing: ProcessingConfig,
}

impl Default for UnstructuredFormat {
    fn default() -> Self {
        Self {
            skip_unprocessable_files: true,
            strategy: UnstructuredStrategy::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

/// Document parsing strategy; `hi_res` needs API processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[schemars(description = "")]
#[allow(missing_docs, reason = "variant docs would change the published enum shape")]
pub enum UnstructuredStrategy {
    #[default]
    Auto,
    Fast,
    OcrOnly,
    HiRes,
}

/// Where document processing happens, selected by `mode`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode")]
#[schemars(description = "")]
pub enum ProcessingConfig {
    /// In-process parsing.
    #[default]
    #[serde(rename = "local")]
    #[schemars(
        title = "Local",
        description = "Process files locally, supporting `fast` and `ocr` modes. This is the default option."
    )]
    Local,
    /// Hosted parsing API.
    #[serde(rename = "api")]
    #[schemars(
        title = "via API",
        description = "Process files via an API, using the `hi_res` mode. This option is useful for increased performance and accuracy, but requires an API key and a hosted instance of unstructured."
    )]
    Api {
        /// The API key to use matching the environment
        #[serde(default)]
        #[schemars(
            title = "API Key",
            with = "String",
            extend("airbyte_secret" = true, "always_show" = true)
        )]
        api_key: SecretString,
        /// The URL of the unstructured API to use
        #[serde(default = "default_api_url")]
        #[schemars(title = "API URL", extend("always_show" = true))]
        api_url: String,
        /// List of parameters send to the API
        #[serde(default)]
        #[schemars(title = "Additional URL Parameters", extend("always_show" = true))]
        parameters: Vec<ApiParameter>,
    },
}

/// A single query parameter forwarded to the processing API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "")]
pub struct ApiParameter {
    /// The name of the unstructured API parameter to use
    #[schemars(title = "Parameter name")]
    pub name: String,
    /// The value of the parameter
    #[schemars(title = "Value")]
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::error::Error;

    fn stream(format: serde_json::Value) -> Result<StreamConfig, serde_json::Error> {
        serde_json::from_value(json!({ "name": "orders", "format": format }))
    }

    #[test]
    fn stream_defaults_are_applied() -> Result<(), Box<dyn Error>> {
        let config = stream(json!({ "filetype": "jsonl" }))?;

        assert_eq!(config.globs, vec!["**".to_string()]);
        assert_eq!(config.validation_policy, ValidationPolicy::EmitRecord);
        assert_eq!(config.days_to_sync_if_history_is_full, 3);
        assert_eq!(config.format, FileFormat::Jsonl);
        assert!(!config.schemaless);
        config.check(0)?;
        Ok(())
    }

    #[test]
    fn csv_defaults_match_declared_defaults() -> Result<(), Box<dyn Error>> {
        let config = stream(json!({ "filetype": "csv" }))?;
        assert_eq!(config.format, FileFormat::Csv(CsvFormat::default()));
        Ok(())
    }

    #[test]
    fn csv_accepts_tab_escape_and_rejects_long_delimiter() -> Result<(), Box<dyn Error>> {
        let tab = stream(json!({ "filetype": "csv", "delimiter": "\\t" }))?;
        tab.check(0)?;

        let wide = stream(json!({ "filetype": "csv", "delimiter": ";;" }))?;
        let error = wide
            .check(2)
            .err()
            .ok_or_else(|| std::io::Error::other("expected delimiter error"))?;
        assert_eq!(
            error,
            ConfigError::field(
                "streams[2].format.delimiter",
                "delimiter should only be one character"
            )
        );
        Ok(())
    }

    #[test]
    fn csv_user_provided_header_requires_columns() -> Result<(), Box<dyn Error>> {
        let config = stream(json!({
            "filetype": "csv",
            "header_definition": { "header_definition_type": "User Provided", "column_names": [] }
        }))?;
        assert!(matches!(
            config.check(0),
            Err(ConfigError::FieldParse { ref field, .. })
                if field == "streams[0].format.header_definition.column_names"
        ));
        Ok(())
    }

    #[test]
    fn blank_stream_name_is_rejected() -> Result<(), Box<dyn Error>> {
        let mut config = stream(json!({ "filetype": "avro" }))?;
        config.name = "  ".to_string();
        assert!(config.check(0).is_err());
        Ok(())
    }

    #[test]
    fn unstructured_api_processing_keeps_secret_out_of_debug() -> Result<(), Box<dyn Error>> {
        let config = stream(json!({
            "filetype": "unstructured",
            "processing": { "mode": "api", "api_key": "sk-live" }
        }))?;

        let FileFormat::Unstructured(format) = &config.format else {
            return Err(std::io::Error::other("expected unstructured format").into());
        };
        assert_eq!(format.strategy, UnstructuredStrategy::Auto);
        let ProcessingConfig::Api {
            api_key, api_url, ..
        } = &format.processing
        else {
            return Err(std::io::Error::other("expected api processing").into());
        };
        assert_eq!(api_key.expose(), "sk-live");
        assert_eq!(api_url, "https://api.unstructured.io");
        assert!(!format!("{config:?}").contains("sk-live"));
        Ok(())
    }

    #[test]
    fn filetype_matches_serialized_tag() -> Result<(), Box<dyn Error>> {
        let format = FileFormat::Parquet(ParquetFormat::default());
        let value = serde_json::to_value(&format)?;
        assert_eq!(value["filetype"], format.filetype());
        Ok(())
    }
}
