use std::cmp::Ordering;
use std::collections::BTreeMap;

use num_traits::{ToPrimitive, Zero};

use crate::syntax::{Expr, Rational};

use super::split_coefficient;

fn variant_rank(expr: &Expr) -> u8 {
  match expr {
    Expr::Number(_) | Expr::Real(_) => 0,
    Expr::Identifier(_) => 1,
    Expr::Constant(_) => 2,
    Expr::Function(..) => 3,
    Expr::FunctionCall { .. } => 4,
    Expr::Power(..) => 5,
    Expr::Times(_) => 6,
    Expr::Plus(_) => 7,
  }
}

fn numeric_value(expr: &Expr) -> f64 {
  match expr {
    Expr::Number(r) => r.to_f64().unwrap_or(0.0),
    Expr::Real(f) => *f,
    _ => 0.0,
  }
}

/// Structural total order used as the final tie-breaker everywhere.
pub fn compare_exprs(a: &Expr, b: &Expr) -> Ordering {
  let rank = variant_rank(a).cmp(&variant_rank(b));
  if rank != Ordering::Equal {
    return rank;
  }
  match (a, b) {
    (Expr::Number(x), Expr::Number(y)) => x.cmp(y),
    (Expr::Number(_) | Expr::Real(_), Expr::Number(_) | Expr::Real(_)) => {
      numeric_value(a).total_cmp(&numeric_value(b))
    }
    (Expr::Identifier(x), Expr::Identifier(y)) => x.cmp(y),
    (Expr::Constant(x), Expr::Constant(y)) => x.cmp(y),
    (Expr::Function(f, x), Expr::Function(g, y)) => {
      f.cmp(g).then_with(|| compare_exprs(x, y))
    }
    (
      Expr::FunctionCall { name: n1, args: a1 },
      Expr::FunctionCall { name: n2, args: a2 },
    ) => n1.cmp(n2).then_with(|| compare_lists(a1, a2)),
    (Expr::Power(b1, e1), Expr::Power(b2, e2)) => {
      compare_exprs(b1, b2).then_with(|| compare_exprs(e1, e2))
    }
    (Expr::Times(x), Expr::Times(y)) => compare_lists(x, y),
    (Expr::Plus(x), Expr::Plus(y)) => compare_sums(x, y),
    _ => Ordering::Equal,
  }
}

fn compare_lists(a: &[Expr], b: &[Expr]) -> Ordering {
  for (x, y) in a.iter().zip(b.iter()) {
    let ord = compare_exprs(x, y);
    if ord != Ordering::Equal {
      return ord;
    }
  }
  a.len().cmp(&b.len())
}

/// Sums compare term by term, each term by its body before its coefficient,
/// so `x - y` sorts before `x + y`.
fn compare_sums(a: &[Expr], b: &[Expr]) -> Ordering {
  for (x, y) in a.iter().zip(b.iter()) {
    let (cx, bx) = split_coefficient(x.clone());
    let (cy, by) = split_coefficient(y.clone());
    let ord = compare_exprs(&bx, &by).then_with(|| compare_exprs(&cx, &cy));
    if ord != Ordering::Equal {
      return ord;
    }
  }
  a.len().cmp(&b.len())
}

/// Split a factor into base and exponent (`x` is `x**1`).
pub fn as_base_exp(expr: &Expr) -> (Expr, Expr) {
  match expr {
    Expr::Power(base, exp) => (base.as_ref().clone(), exp.as_ref().clone()),
    other => (other.clone(), Expr::one()),
  }
}

fn factor_rank(base: &Expr) -> u8 {
  match base {
    Expr::Number(_) | Expr::Real(_) => 0,
    Expr::Identifier(_) => 1,
    Expr::Constant(_) => 2,
    Expr::Function(..) => 3,
    Expr::FunctionCall { .. } => 4,
    Expr::Plus(_) => 5,
    _ => 6,
  }
}

/// Order of factors inside a product: numbers, symbols, constants,
/// functions, sums.
pub fn compare_factors(a: &Expr, b: &Expr) -> Ordering {
  let (base_a, exp_a) = as_base_exp(a);
  let (base_b, exp_b) = as_base_exp(b);
  factor_rank(&base_a)
    .cmp(&factor_rank(&base_b))
    .then_with(|| compare_exprs(&base_a, &base_b))
    .then_with(|| compare_exprs(&exp_a, &exp_b))
}

/// Exponents of plain symbols in a monomial-like term.
fn symbol_exponents(body: &Expr) -> BTreeMap<String, Rational> {
  let mut out = BTreeMap::new();
  let factors: Vec<&Expr> = match body {
    Expr::Times(fs) => fs.iter().collect(),
    other => vec![other],
  };
  for factor in factors {
    let (base, exp) = as_base_exp(factor);
    if let (Expr::Identifier(name), Expr::Number(e)) = (&base, &exp) {
      *out.entry(name.clone()).or_insert_with(Rational::zero) += e.clone();
    }
  }
  out
}

fn term_group(term: &Expr) -> u8 {
  if term.is_number() {
    2
  } else if term.is_constant() {
    1
  } else {
    0
  }
}

/// Order of terms inside a sum: terms with symbols by descending degree
/// (ties broken lexicographically on the exponents), then symbol-free terms,
/// then the numeric term.
pub fn compare_terms(a: &Expr, b: &Expr) -> Ordering {
  let group = term_group(a).cmp(&term_group(b));
  if group != Ordering::Equal {
    return group;
  }
  let (coeff_a, body_a) = split_coefficient(a.clone());
  let (coeff_b, body_b) = split_coefficient(b.clone());
  if term_group(a) == 0 {
    let exps_a = symbol_exponents(&body_a);
    let exps_b = symbol_exponents(&body_b);
    let degree_a: Rational = exps_a.values().cloned().sum();
    let degree_b: Rational = exps_b.values().cloned().sum();
    let by_degree = degree_b.cmp(&degree_a);
    if by_degree != Ordering::Equal {
      return by_degree;
    }
    let mut names: Vec<&String> = exps_a.keys().chain(exps_b.keys()).collect();
    names.sort();
    names.dedup();
    let zero = Rational::zero();
    for name in names {
      let ea = exps_a.get(name).unwrap_or(&zero);
      let eb = exps_b.get(name).unwrap_or(&zero);
      let ord = eb.cmp(ea);
      if ord != Ordering::Equal {
        return ord;
      }
    }
  }
  compare_exprs(&body_a, &body_b).then_with(|| compare_exprs(&coeff_a, &coeff_b))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_expression;

  fn p(s: &str) -> Expr {
    parse_expression(s).unwrap()
  }

  #[test]
  fn higher_degree_terms_come_first() {
    assert_eq!(compare_terms(&p("x**2"), &p("x")), Ordering::Less);
    assert_eq!(compare_terms(&p("x"), &p("5")), Ordering::Less);
    assert_eq!(compare_terms(&p("x*y"), &p("y**2")), Ordering::Less);
  }

  #[test]
  fn symbols_precede_functions_in_products() {
    assert_eq!(compare_factors(&p("x"), &p("sin(x)")), Ordering::Less);
    assert_eq!(compare_factors(&p("sin(x)"), &p("x + 1")), Ordering::Less);
  }
}
