//! Command-line argument definitions

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use clap_complete::Shell;

use crate::config::MAX_DIGITS;
use crate::format::Notation;

/// Symbolic mathematics from the command line
#[derive(Parser, Debug)]
#[command(name = "symcalc")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
  /// Output notation
  #[arg(long, global = true, value_enum, value_name = "NOTATION")]
  pub format: Option<Notation>,

  /// Shorthand for `--format ascii`
  #[arg(
    long,
    global = true,
    conflicts_with_all = ["format", "unicode", "latex_out"]
  )]
  pub ascii: bool,

  /// Shorthand for `--format unicode`
  #[arg(long, global = true, conflicts_with_all = ["format", "latex_out"])]
  pub unicode: bool,

  /// Shorthand for `--format latex`
  #[arg(long = "latex-out", global = true, conflicts_with = "format")]
  pub latex_out: bool,

  /// Significant digits of printed floats
  #[arg(long, global = true, value_parser = parse_digits)]
  pub digits: Option<usize>,

  /// Config file (default: $XDG_CONFIG_HOME/symcalc/symcalc.toml)
  #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
  pub config: Option<PathBuf>,

  /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
  #[arg(short, long, global = true, action = ArgAction::Count)]
  pub debug: u8,

  #[command(subcommand)]
  pub command: Commands,
}

impl Cli {
  /// Notation chosen on the command line, if any.
  pub fn notation(&self) -> Option<Notation> {
    if self.ascii {
      Some(Notation::Ascii)
    } else if self.unicode {
      Some(Notation::Unicode)
    } else if self.latex_out {
      Some(Notation::Latex)
    } else {
      self.format
    }
  }
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
  /// Simplify an expression
  Simplify(ExprArgs),

  /// Expand products and powers
  Expand(ExprArgs),

  /// Factor over the rationals
  Factor(ExprArgs),

  /// Differentiate
  Diff(DiffArgs),

  /// Integrate, definite when both bounds are given
  Integrate(IntegrateArgs),

  /// Solve an equation over the complex numbers
  Solve(SolveArgs),

  /// Substitute values and optionally evaluate numerically
  Eval(EvalArgs),

  /// Print the LaTeX form of an expression
  Latex(ExprArgs),

  /// Generate a shell completion script
  Completion {
    #[arg(value_enum)]
    shell: Shell,
  },
}

#[derive(Args, Debug, PartialEq)]
pub struct ExprArgs {
  /// Expression; read from standard input when omitted
  #[arg(allow_hyphen_values = true)]
  pub expr: Option<String>,
}

#[derive(Args, Debug, PartialEq)]
pub struct DiffArgs {
  /// Expression; read from standard input when omitted
  #[arg(allow_hyphen_values = true)]
  pub expr: Option<String>,

  /// Variable (default: first free symbol)
  #[arg(value_name = "VAR", conflicts_with = "var")]
  pub variable: Option<String>,

  /// Variable, as an option
  #[arg(short, long)]
  pub var: Option<String>,

  /// Order of the derivative
  #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
  pub order: i64,
}

#[derive(Args, Debug, PartialEq)]
pub struct IntegrateArgs {
  /// Expression; read from standard input when omitted
  #[arg(allow_hyphen_values = true)]
  pub expr: Option<String>,

  /// Variable (default: first free symbol, else x)
  #[arg(value_name = "VAR", conflicts_with = "var")]
  pub variable: Option<String>,

  /// Variable, as an option
  #[arg(short, long)]
  pub var: Option<String>,

  /// Lower bound
  #[arg(
    long = "a",
    visible_alias = "lower",
    value_name = "LOWER",
    allow_hyphen_values = true
  )]
  pub lower: Option<String>,

  /// Upper bound
  #[arg(
    long = "b",
    visible_alias = "upper",
    value_name = "UPPER",
    allow_hyphen_values = true
  )]
  pub upper: Option<String>,
}

#[derive(Args, Debug, PartialEq)]
pub struct SolveArgs {
  /// Equation `lhs = rhs`, or an expression equal to zero
  #[arg(allow_hyphen_values = true)]
  pub expr: Option<String>,

  /// Variable (default: first free symbol)
  #[arg(value_name = "VAR", conflicts_with = "var")]
  pub variable: Option<String>,

  /// Variable, as an option
  #[arg(short, long)]
  pub var: Option<String>,
}

#[derive(Args, Debug, PartialEq)]
pub struct EvalArgs {
  /// Expression; read from standard input when omitted
  #[arg(allow_hyphen_values = true)]
  pub expr: Option<String>,

  /// Substitution, applied in the order given
  #[arg(long = "subs", value_name = "NAME=VALUE", value_parser = parse_substitution)]
  pub subs: Vec<(String, String)>,

  /// Evaluate to floating point
  #[arg(short, long)]
  pub numeric: bool,
}

impl DiffArgs {
  pub fn var(&self) -> Option<&str> {
    self.var.as_deref().or(self.variable.as_deref())
  }
}

impl IntegrateArgs {
  pub fn var(&self) -> Option<&str> {
    self.var.as_deref().or(self.variable.as_deref())
  }
}

impl SolveArgs {
  pub fn var(&self) -> Option<&str> {
    self.var.as_deref().or(self.variable.as_deref())
  }
}

/// `name=value`, where the name is an identifier and the value non-empty.
pub fn parse_substitution(s: &str) -> Result<(String, String), String> {
  let (name, value) = s
    .split_once('=')
    .ok_or_else(|| format!("invalid substitution '{s}': expected NAME=VALUE"))?;
  let name = name.trim();
  let value = value.trim();
  let valid_name = name
    .chars()
    .next()
    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
  if !valid_name {
    return Err(format!("invalid substitution '{s}': bad name '{name}'"));
  }
  if value.is_empty() {
    return Err(format!("invalid substitution '{s}': missing value"));
  }
  Ok((name.to_string(), value.to_string()))
}

fn parse_digits(s: &str) -> Result<usize, String> {
  let digits: usize = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
  if (1..=MAX_DIGITS).contains(&digits) {
    Ok(digits)
  } else {
    Err(format!("digits must be in 1..={MAX_DIGITS}"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn verify_cli() {
    Cli::command().debug_assert();
  }

  #[test]
  fn substitutions_parse() {
    assert_eq!(
      parse_substitution("x=3"),
      Ok(("x".to_string(), "3".to_string()))
    );
    assert_eq!(
      parse_substitution("y = z + 1"),
      Ok(("y".to_string(), "z + 1".to_string()))
    );
    assert!(parse_substitution("x").is_err());
    assert!(parse_substitution("=3").is_err());
    assert!(parse_substitution("x=").is_err());
    assert!(parse_substitution("2x=1").is_err());
  }

  #[test]
  fn shorthand_flags_select_notation() {
    let cli = Cli::try_parse_from(["symcalc", "--unicode", "simplify", "x"])
      .unwrap();
    assert_eq!(cli.notation(), Some(Notation::Unicode));
    let cli =
      Cli::try_parse_from(["symcalc", "expand", "x", "--format", "latex"])
        .unwrap();
    assert_eq!(cli.notation(), Some(Notation::Latex));
  }

  #[test]
  fn shorthand_flags_conflict() {
    assert!(Cli::try_parse_from([
      "symcalc", "--ascii", "--unicode", "simplify", "x"
    ])
    .is_err());
  }

  #[test]
  fn positional_and_option_variable() {
    let cli = Cli::try_parse_from(["symcalc", "diff", "x^3", "-v", "x", "-o", "2"])
      .unwrap();
    let Commands::Diff(args) = cli.command else {
      panic!("expected diff");
    };
    assert_eq!(args.var(), Some("x"));
    assert_eq!(args.order, 2);
  }

  #[test]
  fn expression_may_start_with_minus() {
    let cli = Cli::try_parse_from(["symcalc", "simplify", "-x + y"]).unwrap();
    assert_eq!(
      cli.command,
      Commands::Simplify(ExprArgs {
        expr: Some("-x + y".to_string())
      })
    );
    let cli =
      Cli::try_parse_from(["symcalc", "solve", "-x**2 + 4", "-v", "x"])
        .unwrap();
    let Commands::Solve(args) = cli.command else {
      panic!("expected solve");
    };
    assert_eq!(args.expr.as_deref(), Some("-x**2 + 4"));
    assert_eq!(args.var(), Some("x"));
  }

  #[test]
  fn integration_bounds_accept_aliases() {
    let cli = Cli::try_parse_from([
      "symcalc", "integrate", "x", "--lower", "-1", "--b", "1",
    ])
    .unwrap();
    let Commands::Integrate(args) = cli.command else {
      panic!("expected integrate");
    };
    assert_eq!(args.lower.as_deref(), Some("-1"));
    assert_eq!(args.upper.as_deref(), Some("1"));
  }
}
