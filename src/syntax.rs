use std::collections::BTreeSet;
use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use pest::iterators::Pair;

use crate::evaluator::{add, apply_function, div, mul, neg, pow};
use crate::{Rule, SymcalcError};

pub type Rational = BigRational;

/// Named constants with exact symbolic meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Constant {
  I,
  E,
  Pi,
  Infinity,
  ComplexInfinity,
  NaN,
}

impl Constant {
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "I" => Some(Constant::I),
      "E" => Some(Constant::E),
      "pi" => Some(Constant::Pi),
      "oo" => Some(Constant::Infinity),
      "zoo" => Some(Constant::ComplexInfinity),
      "nan" => Some(Constant::NaN),
      _ => None,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Constant::I => "I",
      Constant::E => "E",
      Constant::Pi => "pi",
      Constant::Infinity => "oo",
      Constant::ComplexInfinity => "zoo",
      Constant::NaN => "nan",
    }
  }
}

/// Unary elementary functions known to the engine.
///
/// Declaration order is the canonical order of function factors and terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Func {
  Sin,
  Cos,
  Tan,
  Cot,
  Sec,
  Csc,
  Asin,
  Acos,
  Atan,
  Acot,
  Sinh,
  Cosh,
  Tanh,
  Asinh,
  Acosh,
  Atanh,
  Exp,
  Log,
  Abs,
  Sign,
}

impl Func {
  pub fn from_name(name: &str) -> Option<Self> {
    let func = match name {
      "sin" => Func::Sin,
      "cos" => Func::Cos,
      "tan" => Func::Tan,
      "cot" => Func::Cot,
      "sec" => Func::Sec,
      "csc" => Func::Csc,
      "asin" | "arcsin" => Func::Asin,
      "acos" | "arccos" => Func::Acos,
      "atan" | "arctan" => Func::Atan,
      "acot" | "arccot" => Func::Acot,
      "sinh" => Func::Sinh,
      "cosh" => Func::Cosh,
      "tanh" => Func::Tanh,
      "asinh" | "arcsinh" => Func::Asinh,
      "acosh" | "arccosh" => Func::Acosh,
      "atanh" | "arctanh" => Func::Atanh,
      "exp" => Func::Exp,
      "log" | "ln" => Func::Log,
      "Abs" | "abs" => Func::Abs,
      "sign" => Func::Sign,
      _ => return None,
    };
    Some(func)
  }

  pub fn name(self) -> &'static str {
    match self {
      Func::Sin => "sin",
      Func::Cos => "cos",
      Func::Tan => "tan",
      Func::Cot => "cot",
      Func::Sec => "sec",
      Func::Csc => "csc",
      Func::Asin => "asin",
      Func::Acos => "acos",
      Func::Atan => "atan",
      Func::Acot => "acot",
      Func::Sinh => "sinh",
      Func::Cosh => "cosh",
      Func::Tanh => "tanh",
      Func::Asinh => "asinh",
      Func::Acosh => "acosh",
      Func::Atanh => "atanh",
      Func::Exp => "exp",
      Func::Log => "log",
      Func::Abs => "Abs",
      Func::Sign => "sign",
    }
  }
}

/// Names that act as functions when written without parentheses (`sin x`).
pub fn is_function_name(name: &str) -> bool {
  Func::from_name(name).is_some() || matches!(name, "sqrt" | "cbrt")
}

/// A symbolic expression in canonical form.
///
/// Values are built through the constructors in [`crate::evaluator`], which
/// keep sums and products flattened, sorted and folded. Constructing the
/// variants directly is reserved for display-only forms such as factored
/// products.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Number(Rational),
  Real(f64),
  Identifier(String),
  Constant(Constant),
  Plus(Vec<Expr>),
  Times(Vec<Expr>),
  Power(Box<Expr>, Box<Expr>),
  Function(Func, Box<Expr>),
  FunctionCall { name: String, args: Vec<Expr> },
}

impl Expr {
  pub fn int(value: i64) -> Self {
    Expr::Number(Rational::from_integer(BigInt::from(value)))
  }

  pub fn rational(numer: i64, denom: i64) -> Self {
    Expr::Number(Rational::new(BigInt::from(numer), BigInt::from(denom)))
  }

  pub fn symbol(name: impl Into<String>) -> Self {
    Expr::Identifier(name.into())
  }

  pub fn zero() -> Self {
    Expr::int(0)
  }

  pub fn one() -> Self {
    Expr::int(1)
  }

  pub fn pi() -> Self {
    Expr::Constant(Constant::Pi)
  }

  pub fn imaginary_unit() -> Self {
    Expr::Constant(Constant::I)
  }

  pub fn infinity() -> Self {
    Expr::Constant(Constant::Infinity)
  }

  pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
    Expr::FunctionCall {
      name: name.into(),
      args,
    }
  }

  pub fn is_zero(&self) -> bool {
    match self {
      Expr::Number(r) => r.is_zero(),
      Expr::Real(f) => *f == 0.0,
      _ => false,
    }
  }

  pub fn is_one(&self) -> bool {
    match self {
      Expr::Number(r) => r.is_one(),
      Expr::Real(f) => *f == 1.0,
      _ => false,
    }
  }

  pub fn is_number(&self) -> bool {
    matches!(self, Expr::Number(_) | Expr::Real(_))
  }

  pub fn as_rational(&self) -> Option<&Rational> {
    match self {
      Expr::Number(r) => Some(r),
      _ => None,
    }
  }

  pub fn as_integer(&self) -> Option<BigInt> {
    match self {
      Expr::Number(r) if r.is_integer() => Some(r.to_integer()),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    self.as_integer().and_then(|n| n.to_i64())
  }

  pub fn as_symbol(&self) -> Option<&str> {
    match self {
      Expr::Identifier(name) => Some(name),
      _ => None,
    }
  }

  /// True for numbers whose sign is negative.
  pub fn is_negative_number(&self) -> bool {
    match self {
      Expr::Number(r) => r.is_negative(),
      Expr::Real(f) => *f < 0.0,
      _ => false,
    }
  }

  /// True when the expression prints with a leading minus sign.
  pub fn has_negative_sign(&self) -> bool {
    match self {
      Expr::Times(factors) => {
        factors.first().is_some_and(|f| f.is_negative_number())
      }
      other => other.is_negative_number(),
    }
  }

  pub fn free_symbols(&self) -> BTreeSet<String> {
    let mut symbols = BTreeSet::new();
    collect_symbols(self, &mut symbols);
    symbols
  }

  pub fn contains_symbol(&self, name: &str) -> bool {
    match self {
      Expr::Identifier(s) => s == name,
      Expr::Number(_) | Expr::Real(_) | Expr::Constant(_) => false,
      Expr::Plus(items) | Expr::Times(items) => {
        items.iter().any(|e| e.contains_symbol(name))
      }
      Expr::Power(base, exp) => {
        base.contains_symbol(name) || exp.contains_symbol(name)
      }
      Expr::Function(_, arg) => arg.contains_symbol(name),
      Expr::FunctionCall { args, .. } => {
        args.iter().any(|e| e.contains_symbol(name))
      }
    }
  }

  /// True when no free symbol occurs anywhere in the expression.
  pub fn is_constant(&self) -> bool {
    self.free_symbols().is_empty()
  }

  pub fn contains_constant(&self, constant: Constant) -> bool {
    match self {
      Expr::Constant(c) => *c == constant,
      Expr::Number(_) | Expr::Real(_) | Expr::Identifier(_) => false,
      Expr::Plus(items) | Expr::Times(items) => {
        items.iter().any(|e| e.contains_constant(constant))
      }
      Expr::Power(base, exp) => {
        base.contains_constant(constant) || exp.contains_constant(constant)
      }
      Expr::Function(_, arg) => arg.contains_constant(constant),
      Expr::FunctionCall { args, .. } => {
        args.iter().any(|e| e.contains_constant(constant))
      }
    }
  }

  pub fn contains_real(&self) -> bool {
    match self {
      Expr::Real(_) => true,
      Expr::Number(_) | Expr::Identifier(_) | Expr::Constant(_) => false,
      Expr::Plus(items) | Expr::Times(items) => {
        items.iter().any(|e| e.contains_real())
      }
      Expr::Power(base, exp) => base.contains_real() || exp.contains_real(),
      Expr::Function(_, arg) => arg.contains_real(),
      Expr::FunctionCall { args, .. } => args.iter().any(|e| e.contains_real()),
    }
  }

  /// Direct children, in order.
  pub fn children(&self) -> Vec<&Expr> {
    match self {
      Expr::Plus(items) | Expr::Times(items) => items.iter().collect(),
      Expr::Power(base, exp) => vec![base.as_ref(), exp.as_ref()],
      Expr::Function(_, arg) => vec![arg.as_ref()],
      Expr::FunctionCall { args, .. } => args.iter().collect(),
      _ => Vec::new(),
    }
  }

  /// Number of nodes in the tree.
  pub fn node_count(&self) -> usize {
    1 + self
      .children()
      .into_iter()
      .map(Expr::node_count)
      .sum::<usize>()
  }
}

fn collect_symbols(expr: &Expr, out: &mut BTreeSet<String>) {
  match expr {
    Expr::Identifier(name) => {
      out.insert(name.clone());
    }
    // The bound variable of an unevaluated integral is not free
    Expr::FunctionCall { name, args } if name == "Integral" => {
      let mut inner = BTreeSet::new();
      if let Some(body) = args.first() {
        collect_symbols(body, &mut inner);
      }
      let bound = args.get(1).and_then(integral_variable);
      if let Some(bound) = &bound {
        inner.remove(bound);
      }
      for limit in args.iter().skip(1) {
        if let Expr::FunctionCall { name, args } = limit {
          if name == "Tuple" {
            for a in args.iter().skip(1) {
              collect_symbols(a, &mut inner);
            }
          }
        }
      }
      out.extend(inner);
    }
    other => {
      for child in other.children() {
        collect_symbols(child, out);
      }
    }
  }
}

fn integral_variable(limits: &Expr) -> Option<String> {
  match limits {
    Expr::Identifier(name) => Some(name.clone()),
    Expr::FunctionCall { name, args } if name == "Tuple" => {
      args.first().and_then(|a| a.as_symbol().map(str::to_string))
    }
    _ => None,
  }
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", crate::format::to_ascii(self))
  }
}

// ─── Parsing ────────────────────────────────────────────────────────

/// Convert a pest `Expression` pair (or anything below it) to a canonical
/// expression.
pub fn pair_to_expr(pair: Pair<Rule>) -> Result<Expr, SymcalcError> {
  match pair.as_rule() {
    Rule::Program => {
      let inner = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::Expression)
        .ok_or(SymcalcError::EmptyInput)?;
      pair_to_expr(inner)
    }
    Rule::Expression => {
      let mut terms = Vec::new();
      let mut negate_next = false;
      for child in pair.into_inner() {
        match child.as_rule() {
          Rule::AddOp => negate_next = child.as_str() == "-",
          _ => {
            let term = pair_to_expr(child)?;
            terms.push(if negate_next { neg(term) } else { term });
            negate_next = false;
          }
        }
      }
      Ok(add(terms))
    }
    Rule::Term => build_term(pair),
    Rule::Factor => {
      let mut negative = false;
      let mut value = None;
      for child in pair.into_inner() {
        match child.as_rule() {
          Rule::Sign => negative ^= child.as_str() == "-",
          _ => value = Some(pair_to_expr(child)?),
        }
      }
      let value = value.ok_or(SymcalcError::EmptyInput)?;
      Ok(if negative { neg(value) } else { value })
    }
    Rule::ImplicitFactor | Rule::Group => {
      let inner = pair.into_inner().next().ok_or(SymcalcError::EmptyInput)?;
      pair_to_expr(inner)
    }
    Rule::Power => {
      let mut inner = pair.into_inner();
      let base = pair_to_expr(inner.next().ok_or(SymcalcError::EmptyInput)?)?;
      match inner.next() {
        Some(exponent) => Ok(pow(base, pair_to_expr(exponent)?)),
        None => Ok(base),
      }
    }
    Rule::Number => parse_number(pair.as_str()),
    Rule::Identifier => Ok(identifier_to_expr(pair.as_str())),
    Rule::Call => {
      let mut inner = pair.into_inner();
      let name = inner
        .next()
        .ok_or(SymcalcError::EmptyInput)?
        .as_str()
        .to_string();
      let args = inner.map(pair_to_expr).collect::<Result<Vec<_>, _>>()?;
      call_to_expr(&name, args)
    }
    other => Err(SymcalcError::EvaluationError(format!(
      "unexpected syntax element {other:?}"
    ))),
  }
}

/// Products and quotients, left to right. A bare function name followed by
/// an implicit factor is a function application.
fn build_term(pair: Pair<Rule>) -> Result<Expr, SymcalcError> {
  let mut acc: Option<Expr> = None;
  let mut pending_fn: Option<String> = None;
  let mut divide_next = false;

  for child in pair.into_inner() {
    if child.as_rule() == Rule::MulOp {
      if let Some(name) = pending_fn.take() {
        acc = Some(combine(acc, Expr::symbol(name), false));
      }
      divide_next = child.as_str().trim() == "/";
      continue;
    }

    let implicit = child.as_rule() == Rule::ImplicitFactor;
    let mut operand = pair_to_expr(child)?;
    if let Some(name) = pending_fn.take() {
      if implicit {
        operand = call_to_expr(&name, vec![operand])?;
      } else {
        acc = Some(combine(acc, Expr::symbol(name), false));
      }
    } else if let Expr::Identifier(name) = &operand {
      if !divide_next && is_function_name(name) {
        pending_fn = Some(name.clone());
        continue;
      }
    }
    acc = Some(combine(acc, operand, divide_next));
    divide_next = false;
  }
  if let Some(name) = pending_fn {
    acc = Some(combine(acc, Expr::symbol(name), false));
  }
  acc.ok_or(SymcalcError::EmptyInput)
}

fn combine(acc: Option<Expr>, operand: Expr, divide: bool) -> Expr {
  match (acc, divide) {
    (None, false) => operand,
    (None, true) => div(Expr::one(), operand),
    (Some(left), false) => mul(vec![left, operand]),
    (Some(left), true) => div(left, operand),
  }
}

fn parse_number(text: &str) -> Result<Expr, SymcalcError> {
  if text.chars().all(|c| c.is_ascii_digit()) {
    let value: BigInt = text.parse().map_err(|_| {
      SymcalcError::EvaluationError(format!("invalid integer '{text}'"))
    })?;
    return Ok(Expr::Number(Rational::from_integer(value)));
  }
  text
    .parse::<f64>()
    .map(Expr::Real)
    .map_err(|_| SymcalcError::EvaluationError(format!("invalid number '{text}'")))
}

fn identifier_to_expr(name: &str) -> Expr {
  match Constant::from_name(name) {
    Some(constant) => Expr::Constant(constant),
    None => Expr::symbol(name),
  }
}

fn expect_args(
  name: &str,
  args: &[Expr],
  counts: &[usize],
) -> Result<(), SymcalcError> {
  if counts.contains(&args.len()) {
    return Ok(());
  }
  let expected = counts
    .iter()
    .map(|c| c.to_string())
    .collect::<Vec<_>>()
    .join(" or ");
  let plural = if counts == [1] { "argument" } else { "arguments" };
  Err(SymcalcError::EvaluationError(format!(
    "{name} expects {expected} {plural}, got {}",
    args.len()
  )))
}

/// Resolve a call by name: elementary functions, root helpers, or an
/// undefined function kept symbolic.
pub fn call_to_expr(name: &str, mut args: Vec<Expr>) -> Result<Expr, SymcalcError> {
  if name == "log" && args.len() == 2 {
    let base = args.pop().unwrap_or_else(Expr::one);
    let value = args.pop().unwrap_or_else(Expr::one);
    return Ok(div(
      apply_function(Func::Log, value),
      apply_function(Func::Log, base),
    ));
  }
  if let Some(func) = Func::from_name(name) {
    expect_args(name, &args, &[1])?;
    let arg = args.remove(0);
    return Ok(apply_function(func, arg));
  }
  match name {
    "sqrt" => {
      expect_args(name, &args, &[1])?;
      Ok(pow(args.remove(0), Expr::rational(1, 2)))
    }
    "cbrt" => {
      expect_args(name, &args, &[1])?;
      Ok(pow(args.remove(0), Expr::rational(1, 3)))
    }
    "root" => {
      expect_args(name, &args, &[2])?;
      let index = args.pop().unwrap_or_else(Expr::one);
      let radicand = args.remove(0);
      Ok(pow(radicand, div(Expr::one(), index)))
    }
    "Eq" => Err(SymcalcError::EvaluationError(
      "Eq is only allowed as the whole input".into(),
    )),
    _ => Ok(Expr::call(name, args)),
  }
}

/// Split `Eq(lhs, rhs)` written as a call into its sides.
pub fn split_eq_call(pair: Pair<Rule>) -> Option<(Pair<Rule>, Pair<Rule>)> {
  // Program > Expression > Term > Factor > Power > Call
  let mut node = pair;
  loop {
    let rule = node.as_rule();
    if rule == Rule::Call {
      break;
    }
    let mut children = node.into_inner().filter(|p| p.as_rule() != Rule::EOI);
    let only = children.next()?;
    if children.next().is_some() {
      return None;
    }
    node = only;
  }
  let mut inner = node.into_inner();
  let name = inner.next()?;
  if name.as_str() != "Eq" {
    return None;
  }
  let lhs = inner.next()?;
  let rhs = inner.next()?;
  if inner.next().is_some() {
    return None;
  }
  Some((lhs, rhs))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_expression;

  #[test]
  fn free_symbols_are_sorted() {
    let expr = parse_expression("z + a*y + sin(b)").unwrap();
    let names: Vec<String> = expr.free_symbols().into_iter().collect();
    assert_eq!(names, vec!["a", "b", "y", "z"]);
  }

  #[test]
  fn integral_variable_is_bound() {
    let expr = Expr::call(
      "Integral",
      vec![parse_expression("exp(x**2)*y").unwrap(), Expr::symbol("x")],
    );
    let names: Vec<String> = expr.free_symbols().into_iter().collect();
    assert_eq!(names, vec!["y"]);
  }

  #[test]
  fn constants_are_recognised() {
    assert_eq!(identifier_to_expr("pi"), Expr::pi());
    assert_eq!(identifier_to_expr("e"), Expr::symbol("e"));
  }

  #[test]
  fn decimal_numbers_are_reals() {
    assert_eq!(parse_number("2.5").unwrap(), Expr::Real(2.5));
    assert_eq!(parse_number("1e3").unwrap(), Expr::Real(1000.0));
    assert_eq!(parse_number("42").unwrap(), Expr::int(42));
  }
}
