//! CLI binary entrypoint.

mod commands;
mod error;
mod format;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use commands::{run_check, run_spec};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "s3-source",
    version,
    about = "S3 file source configuration tool",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the connector specification (documentation URL + config schema).
    Spec,
    /// Validate a JSON config file.
    Check {
        /// Config file path (JSON).
        #[arg(long)]
        config: PathBuf,
        /// Apply restricted deployment rules regardless of `DEPLOYMENT_MODE`.
        #[arg(long)]
        restricted: bool,
    },
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.output.log_format);
    let mode = OutputMode::from_args(&cli.output);

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    match command {
        Commands::Spec => run_spec(mode),
        Commands::Check { config, restricted } => run_check(mode, config, *restricted),
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn check_requires_config_path() {
        assert!(Cli::try_parse_from(["s3-source", "check"]).is_err());
        assert!(Cli::try_parse_from(["s3-source", "check", "--config", "source.json"]).is_ok());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let parsed = Cli::try_parse_from([
            "s3-source",
            "check",
            "--config",
            "source.json",
            "--restricted",
            "--output",
            "text",
            "--log-format",
            "json",
        ]);
        assert!(matches!(
            parsed,
            Ok(Cli {
                command: Commands::Check {
                    restricted: true,
                    ..
                },
                ..
            })
        ));
    }
}
