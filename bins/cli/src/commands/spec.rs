//! Spec command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::output::format_error_output;
use s3_source_config::connector_spec;
use s3_source_shared::ErrorEnvelope;

/// Print the connector specification with the shaped schema.
///
/// The specification is a JSON document, so it is written as JSON in
/// every output mode.
pub fn run_spec(mode: OutputMode) -> Result<CliOutput, CliError> {
    let spec = match connector_spec() {
        Ok(spec) => spec,
        Err(error) => return Ok(format_error_output(mode, ErrorEnvelope::from(error))),
    };

    let mut stdout = serde_json::to_string_pretty(&spec)?;
    stdout.push('\n');

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
