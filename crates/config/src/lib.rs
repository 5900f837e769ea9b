//! # s3-source-config
//!
//! Configuration model, cross-field validation, and published schema for the
//! S3 file source. This crate depends on `shared` only.

/// Delivery method settings.
pub mod delivery;
/// Deployment-mode detection.
pub mod deployment;
/// Typed configuration errors.
pub mod error;
/// Stream and file-format settings.
pub mod file_based;
/// Config loading helpers (file + JSON text).
pub mod load;
/// Connector schema generation and shaping.
pub mod schema;
/// The configuration model.
pub mod spec;
/// Cross-field validation.
pub mod validation;

pub use delivery::DeliveryMethod;
pub use deployment::{
    DeploymentProbe, ENV_DEPLOYMENT_MODE, EnvDeploymentProbe, is_restricted_deployment_mode,
};
pub use error::ConfigError;
pub use file_based::{
    ApiParameter, AvroFormat, CsvFormat, CsvHeaderDefinition, FileFormat, ParquetFormat,
    ProcessingConfig, StreamConfig, UnstructuredFormat, UnstructuredStrategy, ValidationPolicy,
};
pub use load::{
    load_config_from_path, load_config_from_str, parse_config_json, to_pretty_json,
    to_redacted_pretty_json,
};
pub use schema::{
    ConnectorSpecification, DOCUMENTATION_URL, PROCESSING_OPTIONS_PATH, connector_spec,
    raw_config_schema, shape_schema,
};
pub use spec::{S3SourceConfig, SECRET_FIELDS, SECRET_MASK};
pub use validation::{ValidatedS3SourceConfig, load_config, validate, validate_with_probe};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
