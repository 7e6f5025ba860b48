//! CLI-level errors (wraps engine and configuration errors)

use thiserror::Error;

use crate::config::ConfigError;
use crate::exitcode;
use crate::SymcalcError;

/// Top-level error type; these are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
  #[error("{0}")]
  Engine(#[from] SymcalcError),

  #[error("{0}")]
  Config(#[from] ConfigError),

  #[error("failed to read standard input: {0}")]
  Stdin(#[from] std::io::Error),

  #[error("{0}")]
  Usage(String),
}

pub type CliResult<T> = Result<T, CliError>;

impl CliError {
  /// Exit code for this error.
  pub fn exit_code(&self) -> i32 {
    match self {
      CliError::Usage(_) => exitcode::USAGE,
      CliError::Config(_) => exitcode::CONFIG,
      CliError::Stdin(_) => exitcode::IOERR,
      CliError::Engine(e) => match e {
        SymcalcError::EmptyInput | SymcalcError::InvalidArgument(_) => {
          exitcode::USAGE
        }
        SymcalcError::ParseError { .. } | SymcalcError::EvaluationError(_) => {
          exitcode::DATAERR
        }
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exit_codes_follow_sysexits() {
    assert_eq!(CliError::Engine(SymcalcError::EmptyInput).exit_code(), 64);
    let parse = SymcalcError::ParseError {
      input: "(".to_string(),
      reason: "expected Expression".to_string(),
    };
    assert_eq!(CliError::Engine(parse).exit_code(), 65);
    let config = ConfigError::Invalid {
      key: "digits",
      reason: "0".to_string(),
    };
    assert_eq!(CliError::Config(config).exit_code(), 78);
  }
}
