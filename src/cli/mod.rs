//! CLI layer: argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod error;

use std::ffi::OsString;
use std::io::Read;

use clap::Parser;

pub use args::{Cli, Commands};
pub use commands::execute_command;
pub use error::{CliError, CliResult};

use crate::config::Settings;

/// Parse `args` (program name first), load settings and run the command.
pub fn run_from<I, T>(args: I, stdin: &mut dyn Read) -> CliResult<String>
where
  I: IntoIterator<Item = T>,
  T: Into<OsString> + Clone,
{
  let cli =
    Cli::try_parse_from(args).map_err(|e| CliError::Usage(e.to_string()))?;
  let settings = Settings::load(cli.config.as_deref())?;
  execute_command(&cli, &settings, stdin)
}
