//! Dispatch from subcommand to engine call and renderer

use std::io::Read;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::config::Settings;
use crate::format::Render;
use crate::{
  diff_expr, eval_expr, expand_expr, factor_expr, integrate_expr, latex_expr,
  simplify_expr, solve_expr, SymcalcError,
};

use super::args::{Cli, Commands};
use super::error::{CliError, CliResult};

/// Run the parsed command and return what should be printed.
pub fn execute_command(
  cli: &Cli,
  settings: &Settings,
  stdin: &mut dyn Read,
) -> CliResult<String> {
  let options = settings.format_options(cli.notation(), cli.digits);
  debug!(command = ?cli.command, ?options, "dispatching");
  match &cli.command {
    Commands::Simplify(args) => {
      let expr = read_expression(args.expr.as_deref(), stdin)?;
      Ok(simplify_expr(&expr)?.render(&options))
    }
    Commands::Expand(args) => {
      let expr = read_expression(args.expr.as_deref(), stdin)?;
      Ok(expand_expr(&expr)?.render(&options))
    }
    Commands::Factor(args) => {
      let expr = read_expression(args.expr.as_deref(), stdin)?;
      Ok(factor_expr(&expr)?.render(&options))
    }
    Commands::Diff(args) => {
      let expr = read_expression(args.expr.as_deref(), stdin)?;
      Ok(diff_expr(&expr, args.var(), args.order)?.render(&options))
    }
    Commands::Integrate(args) => {
      let expr = read_expression(args.expr.as_deref(), stdin)?;
      let result = integrate_expr(
        &expr,
        args.var(),
        args.lower.as_deref(),
        args.upper.as_deref(),
      )?;
      Ok(result.render(&options))
    }
    Commands::Solve(args) => {
      let expr = read_expression(args.expr.as_deref(), stdin)?;
      Ok(solve_expr(&expr, args.var())?.render(&options))
    }
    Commands::Eval(args) => {
      let expr = read_expression(args.expr.as_deref(), stdin)?;
      Ok(eval_expr(&expr, &args.subs, args.numeric)?.render(&options))
    }
    Commands::Latex(args) => {
      let expr = read_expression(args.expr.as_deref(), stdin)?;
      Ok(latex_expr(&expr)?)
    }
    Commands::Completion { shell } => completion(*shell),
  }
}

/// The argument if given, otherwise all of standard input, trimmed.
#[instrument(level = "debug", skip(stdin))]
pub fn read_expression(
  arg: Option<&str>,
  stdin: &mut dyn Read,
) -> CliResult<String> {
  let text = match arg {
    Some(text) => text.to_string(),
    None => {
      let mut buffer = String::new();
      stdin.read_to_string(&mut buffer)?;
      buffer
    }
  };
  let text = text.trim();
  if text.is_empty() {
    return Err(SymcalcError::EmptyInput.into());
  }
  Ok(text.to_string())
}

fn completion(shell: clap_complete::Shell) -> CliResult<String> {
  let mut cmd = Cli::command();
  let name = cmd.get_name().to_string();
  let mut script = Vec::new();
  generate(shell, &mut cmd, name, &mut script);
  String::from_utf8(script)
    .map(|s| s.trim_end().to_string())
    .map_err(|e| CliError::Usage(format!("invalid completion script: {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn argument_wins_over_stdin() {
    let mut stdin = "y".as_bytes();
    let text = read_expression(Some(" x + 1 "), &mut stdin).unwrap();
    assert_eq!(text, "x + 1");
  }

  #[test]
  fn stdin_is_read_when_argument_missing() {
    let mut stdin = "x**2\n".as_bytes();
    assert_eq!(read_expression(None, &mut stdin).unwrap(), "x**2");
  }

  #[test]
  fn empty_stdin_is_rejected() {
    let mut stdin = "  \n".as_bytes();
    let err = read_expression(None, &mut stdin).unwrap_err();
    assert_eq!(err.to_string(), "No expression provided");
  }
}
