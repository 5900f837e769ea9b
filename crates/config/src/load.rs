//! Config loading helpers (file + JSON text).
//!
//! The loader surfaces user-facing errors as typed `ErrorEnvelope`s; the
//! parsing and validation layers below it speak [`ConfigError`].

use crate::deployment::DeploymentProbe;
use crate::error::{ConfigError, ROOT_FIELD};
use crate::spec::S3SourceConfig;
use crate::validation::{ValidatedS3SourceConfig, load_config};
use s3_source_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde_json::Value;
use std::path::Path;

/// Parse JSON text into a config without running cross-field checks.
pub fn parse_config_json(input: &str) -> Result<S3SourceConfig, ConfigError> {
    S3SourceConfig::from_value(parse_json(input)?)
}

/// Parse and validate JSON text.
pub fn load_config_from_str(
    input: &str,
    probe: &dyn DeploymentProbe,
) -> Result<ValidatedS3SourceConfig, ConfigError> {
    load_config(parse_json(input)?, probe)
}

/// Read, parse, and validate a config file.
pub fn load_config_from_path(
    path: &Path,
    probe: &dyn DeploymentProbe,
) -> s3_source_shared::Result<ValidatedS3SourceConfig> {
    ensure_json_extension(path)?;
    let input = read_config_file(path)?;
    tracing::debug!(path = %path.display(), "loading config file");

    load_config_from_str(&input, probe).map_err(|error| {
        ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy().to_string())
    })
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
///
/// Secrets are written raw; see [`to_redacted_pretty_json`] for display.
pub fn to_pretty_json(config: &S3SourceConfig) -> s3_source_shared::Result<String> {
    let value = config.to_value().map_err(serialize_error)?;
    render(&value)
}

/// Serialize the config as pretty JSON with secrets masked.
pub fn to_redacted_pretty_json(config: &S3SourceConfig) -> s3_source_shared::Result<String> {
    let value = config.redacted_json().map_err(serialize_error)?;
    render(&value)
}

fn parse_json(input: &str) -> Result<Value, ConfigError> {
    serde_json::from_str(input)
        .map_err(|error| ConfigError::field(ROOT_FIELD, format!("invalid config JSON: {error}")))
}

fn render(value: &Value) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(value).map_err(serialize_error)?;
    output.push('\n');
    Ok(output)
}

fn serialize_error(error: serde_json::Error) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::internal(),
        format!("failed to serialize config: {error}"),
        ErrorClass::NonRetriable,
    )
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let (code, class) = classify_read_error(error.kind());
        ErrorEnvelope::expected_with_class(
            code,
            format!("failed to read config file: {error}"),
            class,
        )
        .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn classify_read_error(kind: std::io::ErrorKind) -> (ErrorCode, ErrorClass) {
    match kind {
        std::io::ErrorKind::NotFound => (
            ErrorCode::new("config", "config_file_not_found"),
            ErrorClass::NonRetriable,
        ),
        std::io::ErrorKind::PermissionDenied => (
            ErrorCode::new("config", "config_file_permission_denied"),
            ErrorClass::NonRetriable,
        ),
        std::io::ErrorKind::Interrupted
        | std::io::ErrorKind::TimedOut
        | std::io::ErrorKind::WouldBlock => {
            (ErrorCode::new("config", "config_file_io"), ErrorClass::Retriable)
        },
        _ => (ErrorCode::new("config", "config_file_io"), ErrorClass::NonRetriable),
    }
}

fn ensure_json_extension(path: &Path) -> Result<(), ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(()),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json",
        )
        .with_metadata("extension", other.to_string())),
    }
}
