//! Error rendering for failed commands.

use crate::CliOutput;
use crate::error::ExitCode;
use crate::format::OutputMode;
use s3_source_shared::{ErrorEnvelope, REDACTED_VALUE, is_secret_key};

/// Render a failure envelope and pick the exit code for it.
pub fn format_error_output(mode: OutputMode, envelope: ErrorEnvelope) -> CliOutput {
    let envelope = sanitize_envelope(envelope);
    let exit_code = ExitCode::for_envelope(&envelope);

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": envelope,
        });

        // This is a CLI boundary, so JSON serialization errors are internal.
        let mut output = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\"}}".to_string()
        });
        output.push('\n');
        output
    } else {
        format_error_text(&envelope)
    };

    CliOutput {
        stdout,
        stderr: String::new(),
        exit_code,
    }
}

fn sanitize_envelope(mut envelope: ErrorEnvelope) -> ErrorEnvelope {
    for (key, value) in &mut envelope.metadata {
        if is_secret_key(key) {
            *value = REDACTED_VALUE.to_string();
        }
    }
    envelope
}

fn format_error_text(envelope: &ErrorEnvelope) -> String {
    let mut out = String::new();
    out.push_str("status: error\n");
    out.push_str("code: ");
    out.push_str(&envelope.code.to_string());
    out.push('\n');
    out.push_str("message: ");
    out.push_str(&envelope.message);
    out.push('\n');
    out.push_str("kind: ");
    out.push_str(&envelope.kind.to_string());
    out.push('\n');

    if !envelope.metadata.is_empty() {
        out.push_str("meta:\n");
        for (key, value) in &envelope.metadata {
            out.push_str("  ");
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }
    out
}
