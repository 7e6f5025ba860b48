use pest::error::LineColLocation;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;
use tracing::{debug, warn};

pub mod cli;
pub mod config;
pub mod evaluator;
pub mod exitcode;
pub mod format;
pub mod functions;
pub mod syntax;

use evaluator::{evalf, sub, substitute_all};
use format::{LatexPrinter, DEFAULT_DIGITS};
use functions::calculus_ast::{diff, integrate, integrate_definite};
use functions::polynomial_ast::{expand, factor, simplify, solve, SolutionSet};
use syntax::{pair_to_expr, split_eq_call, Expr};

#[derive(Parser)]
#[grammar = "symcalc.pest"]
pub struct SymcalcParser;

#[derive(Error, Debug)]
pub enum SymcalcError {
  #[error("Error parsing expression '{input}': {reason}")]
  ParseError { input: String, reason: String },
  #[error("No expression provided")]
  EmptyInput,
  #[error("Evaluation error: {0}")]
  EvaluationError(String),
  #[error("Invalid argument: {0}")]
  InvalidArgument(String),
}

impl SymcalcParser {
  pub fn parse_program(
    input: &str,
  ) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>>
  {
    Self::parse(Rule::Program, input).map_err(Box::new)
  }
}

fn parse_failure(input: &str, error: &pest::error::Error<Rule>) -> SymcalcError {
  let column = match error.line_col {
    LineColLocation::Pos((_, col)) | LineColLocation::Span((_, col), _) => col,
  };
  SymcalcError::ParseError {
    input: input.to_string(),
    reason: format!("{} at column {column}", error.variant.message()),
  }
}

// ─── Parsing ────────────────────────────────────────────────────────

/// Parse a single expression into canonical form.
pub fn parse_expression(input: &str) -> Result<Expr, SymcalcError> {
  let input = input.trim();
  if input.is_empty() {
    return Err(SymcalcError::EmptyInput);
  }
  let mut pairs = SymcalcParser::parse_program(input)
    .map_err(|e| parse_failure(input, &e))?;
  let program = pairs.next().ok_or(SymcalcError::EmptyInput)?;
  pair_to_expr(program)
}

/// Parse `lhs = rhs`, `lhs == rhs`, `Eq(lhs, rhs)` or a plain expression.
pub fn parse_equation(
  input: &str,
) -> Result<(Expr, Option<Expr>), SymcalcError> {
  let input = input.trim();
  if input.is_empty() {
    return Err(SymcalcError::EmptyInput);
  }
  match SymcalcParser::parse_program(input) {
    Ok(mut pairs) => {
      let program = pairs.next().ok_or(SymcalcError::EmptyInput)?;
      if let Some((lhs, rhs)) = split_eq_call(program.clone()) {
        return Ok((pair_to_expr(lhs)?, Some(pair_to_expr(rhs)?)));
      }
      Ok((pair_to_expr(program)?, None))
    }
    Err(program_error) => {
      let mut pairs = SymcalcParser::parse(Rule::Equation, input)
        .map_err(|_| parse_failure(input, &program_error))?;
      let equation = pairs.next().ok_or(SymcalcError::EmptyInput)?;
      let mut sides = equation
        .into_inner()
        .filter(|p| p.as_rule() == Rule::Expression);
      let lhs = sides.next().ok_or(SymcalcError::EmptyInput)?;
      let rhs = sides.next().ok_or(SymcalcError::EmptyInput)?;
      Ok((pair_to_expr(lhs)?, Some(pair_to_expr(rhs)?)))
    }
  }
}

/// Alphabetically first free symbol, the variable used when none is given.
pub fn default_variable(expr: &Expr) -> Option<String> {
  expr.free_symbols().into_iter().next()
}

fn pick_variable(expr: &Expr, var: Option<&str>) -> Option<String> {
  var.map(str::to_string).or_else(|| default_variable(expr))
}

// ─── Operations ─────────────────────────────────────────────────────

pub fn simplify_expr(input: &str) -> Result<Expr, SymcalcError> {
  Ok(simplify(&parse_expression(input)?))
}

pub fn expand_expr(input: &str) -> Result<Expr, SymcalcError> {
  Ok(expand(&parse_expression(input)?))
}

pub fn factor_expr(input: &str) -> Result<Expr, SymcalcError> {
  Ok(factor(&parse_expression(input)?))
}

/// Derivative of the given order. Without a variable and without free
/// symbols the input is a constant, so any positive order yields zero.
pub fn diff_expr(
  input: &str,
  var: Option<&str>,
  order: i64,
) -> Result<Expr, SymcalcError> {
  let expr = parse_expression(input)?;
  let var = pick_variable(&expr, var).unwrap_or_else(|| "x".to_string());
  debug!(%var, order, "differentiating");
  diff(&expr, &var, order)
}

/// Antiderivative, or the definite integral when both bounds are given.
pub fn integrate_expr(
  input: &str,
  var: Option<&str>,
  lower: Option<&str>,
  upper: Option<&str>,
) -> Result<Expr, SymcalcError> {
  let expr = parse_expression(input)?;
  let var = pick_variable(&expr, var).unwrap_or_else(|| "x".to_string());
  match (lower, upper) {
    (Some(a), Some(b)) => {
      let a = parse_expression(a)?;
      let b = parse_expression(b)?;
      debug!(%var, lower = %a, upper = %b, "definite integral");
      Ok(integrate_definite(&expr, &var, &a, &b))
    }
    (None, None) => {
      debug!(%var, "indefinite integral");
      Ok(integrate(&expr, &var))
    }
    _ => {
      warn!("only one integration bound given, computing the antiderivative");
      Ok(integrate(&expr, &var))
    }
  }
}

/// Solve `input = 0` (or `lhs = rhs`) over the complex numbers.
pub fn solve_expr(
  input: &str,
  var: Option<&str>,
) -> Result<SolutionSet, SymcalcError> {
  let (lhs, rhs) = parse_equation(input)?;
  let f = match rhs {
    Some(rhs) => sub(lhs, rhs),
    None => lhs,
  };
  let Some(var) = pick_variable(&f, var) else {
    return Ok(SolutionSet::Empty);
  };
  debug!(%var, equation = %f, "solving");
  Ok(solve(&f, &var))
}

/// Apply `name=value` substitutions in order, then optionally evaluate
/// numerically.
pub fn eval_expr(
  input: &str,
  subs: &[(String, String)],
  numeric: bool,
) -> Result<Expr, SymcalcError> {
  let expr = parse_expression(input)?;
  let values = subs
    .iter()
    .map(|(name, value)| Ok((name.clone(), parse_expression(value)?)))
    .collect::<Result<Vec<_>, SymcalcError>>()?;
  let substituted = substitute_all(&expr, &values);
  if numeric {
    Ok(evalf(&substituted, DEFAULT_DIGITS))
  } else {
    Ok(substituted)
  }
}

/// LaTeX source for the parsed expression, without simplification.
pub fn latex_expr(input: &str) -> Result<String, SymcalcError> {
  let expr = parse_expression(input)?;
  Ok(LatexPrinter::new(DEFAULT_DIGITS).expr(&expr))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equations_in_every_spelling() {
    let expected = (Expr::symbol("x"), Some(Expr::int(1)));
    assert_eq!(parse_equation("x = 1").unwrap(), expected);
    assert_eq!(parse_equation("x == 1").unwrap(), expected);
    assert_eq!(parse_equation("Eq(x, 1)").unwrap(), expected);
    assert_eq!(parse_equation("x - 1").unwrap().1, None);
  }

  #[test]
  fn parse_errors_quote_the_input() {
    let err = parse_expression("2 +* x").unwrap_err();
    assert!(err
      .to_string()
      .starts_with("Error parsing expression '2 +* x': "));
  }

  #[test]
  fn blank_input_is_rejected() {
    assert!(matches!(
      parse_expression("   "),
      Err(SymcalcError::EmptyInput)
    ));
  }

  #[test]
  fn default_variable_is_alphabetical() {
    let expr = parse_expression("y*z + b").unwrap();
    assert_eq!(default_variable(&expr), Some("b".to_string()));
  }

  #[test]
  fn diff_of_constant_is_zero() {
    assert_eq!(diff_expr("5", None, 1).unwrap(), Expr::zero());
  }

  #[test]
  fn solve_without_symbols_is_empty() {
    assert_eq!(solve_expr("3 = 4", None).unwrap(), SolutionSet::Empty);
  }
}
