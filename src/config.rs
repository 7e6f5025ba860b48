//! Layered settings.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `$XDG_CONFIG_HOME/symcalc/symcalc.toml`, or the file
//!    passed with `--config`
//! 3. Environment variables: `SYMCALC_FORMAT`, `SYMCALC_DIGITS`
//! 4. Command-line flags, applied by the CLI layer

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::format::{FormatOptions, Notation, DEFAULT_DIGITS};

/// Floats carry at most this many meaningful significant digits.
pub const MAX_DIGITS: usize = 17;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  NotFound(PathBuf),
  #[error("failed to load configuration: {0}")]
  Load(#[from] config::ConfigError),
  #[error("invalid setting '{key}': {reason}")]
  Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Output notation when no flag selects one
  pub format: Notation,
  /// Significant digits of printed floats
  pub digits: usize,
}

impl Default for Settings {
  fn default() -> Self {
    Settings {
      format: Notation::Ascii,
      digits: DEFAULT_DIGITS,
    }
  }
}

/// `$XDG_CONFIG_HOME/symcalc/symcalc.toml` (or the platform equivalent).
pub fn global_config_path() -> Option<PathBuf> {
  ProjectDirs::from("", "", "symcalc")
    .map(|dirs| dirs.config_dir().join("symcalc.toml"))
}

impl Settings {
  /// Load defaults, then the config file, then `SYMCALC_*` variables.
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    Self::load_with_env(explicit, Environment::with_prefix("SYMCALC"))
  }

  fn load_with_env(
    explicit: Option<&Path>,
    env: Environment,
  ) -> Result<Self, ConfigError> {
    let defaults = Settings::default();
    let mut builder = Config::builder()
      .set_default("format", "ascii")?
      .set_default("digits", defaults.digits as i64)?;

    match explicit {
      Some(path) => {
        if !path.exists() {
          return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        debug!(path = %path.display(), "loading config file");
        builder = builder
          .add_source(File::from(path.to_path_buf()).format(FileFormat::Toml));
      }
      None => {
        if let Some(path) = global_config_path() {
          if path.exists() {
            debug!(path = %path.display(), "loading global config file");
          }
          builder = builder.add_source(
            File::from(path).format(FileFormat::Toml).required(false),
          );
        }
      }
    }

    let settings: Settings =
      builder.add_source(env).build()?.try_deserialize()?;
    settings.validate()
  }

  fn validate(self) -> Result<Self, ConfigError> {
    if self.digits == 0 || self.digits > MAX_DIGITS {
      return Err(ConfigError::Invalid {
        key: "digits",
        reason: format!(
          "{} is outside 1..={MAX_DIGITS}",
          self.digits
        ),
      });
    }
    Ok(self)
  }

  /// Flags override whatever the layers produced.
  pub fn format_options(
    &self,
    notation: Option<Notation>,
    digits: Option<usize>,
  ) -> FormatOptions {
    FormatOptions {
      notation: notation.unwrap_or(self.format),
      digits: digits.unwrap_or(self.digits),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;
  use std::io::Write;

  use tempfile::NamedTempFile;

  fn env(vars: &[(&str, &str)]) -> Environment {
    let map: HashMap<String, String> = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    Environment::with_prefix("SYMCALC").source(Some(map))
  }

  fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
      .suffix(".toml")
      .tempfile()
      .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
  }

  #[test]
  fn defaults_without_sources() {
    let file = config_file("");
    let settings = Settings::load_with_env(Some(file.path()), env(&[])).unwrap();
    assert_eq!(settings, Settings::default());
  }

  #[test]
  fn file_overrides_defaults() {
    let file = config_file("format = \"unicode\"\ndigits = 6\n");
    let settings = Settings::load_with_env(Some(file.path()), env(&[])).unwrap();
    assert_eq!(settings.format, Notation::Unicode);
    assert_eq!(settings.digits, 6);
  }

  #[test]
  fn environment_overrides_file() {
    let file = config_file("format = \"unicode\"\n");
    let settings = Settings::load_with_env(
      Some(file.path()),
      env(&[("SYMCALC_FORMAT", "latex")]),
    )
    .unwrap();
    assert_eq!(settings.format, Notation::Latex);
  }

  #[test]
  fn missing_explicit_file_is_an_error() {
    let result = Settings::load_with_env(
      Some(Path::new("/nonexistent/symcalc.toml")),
      env(&[]),
    );
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
  }

  #[test]
  fn digits_out_of_range() {
    let file = config_file("digits = 40\n");
    let result = Settings::load_with_env(Some(file.path()), env(&[]));
    assert!(matches!(
      result,
      Err(ConfigError::Invalid { key: "digits", .. })
    ));
  }

  #[test]
  fn flags_win() {
    let options =
      Settings::default().format_options(Some(Notation::Latex), Some(4));
    assert_eq!(options.notation, Notation::Latex);
    assert_eq!(options.digits, 4);
  }
}
