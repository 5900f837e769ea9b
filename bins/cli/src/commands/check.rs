//! Check command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::output::format_error_output;
use s3_source_config::{EnvDeploymentProbe, ValidatedS3SourceConfig, load_config_from_path};
use std::path::Path;

/// Validate a config file and print its redacted form.
///
/// `restricted` forces the restricted deployment mode; otherwise the mode
/// is read from the environment.
pub fn run_check(mode: OutputMode, path: &Path, restricted: bool) -> Result<CliOutput, CliError> {
    tracing::debug!(path = %path.display(), forced_restricted = restricted, "checking config");
    let loaded = if restricted {
        load_config_from_path(path, &|| true)
    } else {
        load_config_from_path(path, &EnvDeploymentProbe::from_std_env())
    };
    let config = match loaded {
        Ok(config) => config,
        Err(envelope) => return Ok(format_error_output(mode, envelope)),
    };

    let stdout = if mode.is_json() {
        format_check_json(path, &config)?
    } else {
        format_check_text(path, &config)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_check_json(path: &Path, config: &ValidatedS3SourceConfig) -> Result<String, CliError> {
    let redacted = config.redacted_json()?;
    let payload = serde_json::json!({
        "status": "ok",
        "configPath": path.to_string_lossy(),
        "config": redacted,
    });
    let mut output = serde_json::to_string_pretty(&payload)?;
    output.push('\n');
    Ok(output)
}

fn format_check_text(path: &Path, config: &ValidatedS3SourceConfig) -> String {
    let streams: Vec<&str> = config
        .streams()
        .iter()
        .map(|stream| stream.name.as_str())
        .collect();
    format!(
        "status: ok\npath: {}\nbucket: {}\nregion: {}\ndelivery: {}\nstreams: {}\n",
        path.to_string_lossy(),
        config.bucket(),
        config.region_name().unwrap_or("auto"),
        config.delivery_method().delivery_type(),
        streams.join(", ")
    )
}
