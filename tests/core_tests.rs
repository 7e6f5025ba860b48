use symcalc::format::{FormatOptions, Notation, Render};
use symcalc::functions::polynomial_ast::SolutionSet;
use symcalc::syntax::Expr;
use symcalc::*;

fn ascii(value: &impl Render) -> String {
  value.render(&FormatOptions::default())
}

fn in_notation(value: &impl Render, notation: Notation) -> String {
  value.render(&FormatOptions {
    notation,
    ..FormatOptions::default()
  })
}

fn p(input: &str) -> Expr {
  parse_expression(input).unwrap()
}

mod core_tests {
  use super::*;

  mod algebra;
  mod calculus;
  mod evaluation;
  mod notation;
  mod parsing;
  mod solving;
}
