//! Exit codes and failures of the CLI itself.

use s3_source_shared::{ErrorEnvelope, ErrorKind};
use std::fmt;

/// Code prefix of errors raised while reading a config file.
const CONFIG_FILE_CODE_PREFIX: &str = "config_file_";

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// The command succeeded (a config passed every check).
    Ok = 0,
    /// The config was rejected.
    InvalidInput = 2,
    /// The config file could not be read.
    Io = 3,
    /// Schema drift or a serialization failure.
    Internal = 1,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Pick the exit status for a failed command.
    ///
    /// Read failures on the config file are `Io`; any other expected error
    /// means the config itself was rejected.
    #[must_use]
    pub fn for_envelope(envelope: &ErrorEnvelope) -> Self {
        match envelope.kind {
            ErrorKind::Expected if envelope.code.code().starts_with(CONFIG_FILE_CODE_PREFIX) => {
                Self::Io
            },
            ErrorKind::Expected => Self::InvalidInput,
            ErrorKind::Invariant | ErrorKind::Unexpected => Self::Internal,
        }
    }
}

/// Failures while emitting a command's result.
///
/// Rejected configurations are not `CliError`s: they are rendered as an
/// error envelope on stdout.
#[derive(Debug)]
pub enum CliError {
    /// Writing to stdout or stderr failed.
    WriteOutput(std::io::Error),
    /// A result document could not be rendered as JSON.
    RenderOutput(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::WriteOutput(_) => ExitCode::Io,
            Self::RenderOutput(_) => ExitCode::Internal,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteOutput(error) => write!(formatter, "failed to write output: {error}"),
            Self::RenderOutput(error) => write!(formatter, "failed to render output: {error}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WriteOutput(error) => Some(error),
            Self::RenderOutput(error) => Some(error),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::WriteOutput(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::RenderOutput(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3_source_config::ConfigError;
    use s3_source_shared::{ErrorClass, ErrorCode};

    #[test]
    fn config_file_errors_map_to_io() {
        for code in ["config_file_not_found", "config_file_permission_denied", "config_file_io"] {
            let envelope = ErrorEnvelope::expected(ErrorCode::new("config", code), "unreadable");
            assert_eq!(ExitCode::for_envelope(&envelope), ExitCode::Io, "{code}");
        }
    }

    #[test]
    fn rejected_configs_map_to_invalid_input() {
        let envelope = ErrorEnvelope::from(ConfigError::RoleChainMissingParent);
        assert_eq!(ExitCode::for_envelope(&envelope), ExitCode::InvalidInput);

        let envelope = ErrorEnvelope::from(ConfigError::field("bucket", "field required"));
        assert_eq!(ExitCode::for_envelope(&envelope), ExitCode::InvalidInput);
    }

    #[test]
    fn schema_drift_and_serialization_map_to_internal() {
        let drift = ErrorEnvelope::from(ConfigError::schema_shape("properties", "missing"));
        assert_eq!(ExitCode::for_envelope(&drift), ExitCode::Internal);

        let serialization = ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            "failed to serialize config",
            ErrorClass::NonRetriable,
        );
        assert_eq!(ExitCode::for_envelope(&serialization), ExitCode::Internal);
    }

    #[test]
    fn write_failures_exit_with_io() {
        let error = CliError::from(std::io::Error::other("broken pipe"));
        assert_eq!(error.exit_code(), ExitCode::Io);
        assert_eq!(error.to_string(), "failed to write output: broken pipe");
    }
}
