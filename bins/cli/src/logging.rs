//! Diagnostic log setup.

use crate::format::LogFormat;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber writing to stderr.
///
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_logging(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.compact().try_init(),
    };
    if let Err(error) = installed {
        let _ = writeln!(io::stderr(), "warn: logging disabled: {error}");
    }
}
