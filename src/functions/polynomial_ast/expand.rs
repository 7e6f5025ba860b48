use tracing::trace;

use crate::evaluator::{
  add, apply_function, compare_factors, map_children, mul, pow,
};
use crate::syntax::{Expr, Func};

/// Largest integer power of a sum multiplied out term by term.
const MAX_EXPANSION_EXPONENT: i64 = 200;

// ─── Expand ─────────────────────────────────────────────────────────

/// Distribute products over sums and multiply out integer powers of sums,
/// recursively, including inside function arguments.
pub fn expand(expr: &Expr) -> Expr {
  let distributed = expand_products(expr);
  match distributed {
    Expr::Plus(terms) => {
      add(terms.iter().map(split_exponent_sums).collect::<Vec<_>>())
    }
    other => split_exponent_sums(&other),
  }
}

/// Expand without splitting `x**(a + b)` into `x**a*x**b`.
pub fn expand_products(expr: &Expr) -> Expr {
  let inner = map_children(expr, expand_products);
  match &inner {
    Expr::Times(factors) => distribute(factors),
    Expr::Power(base, exp) => match (base.as_ref(), exp.as_i64()) {
      (Expr::Plus(terms), Some(n)) if n > 1 && n <= MAX_EXPANSION_EXPONENT => {
        trace!(exponent = n, "multiplying out a power of a sum");
        expand_power(terms, n)
      }
      (Expr::Plus(terms), Some(n)) if n < -1 && -n <= MAX_EXPANSION_EXPONENT => {
        pow(expand_power(terms, -n), Expr::int(-1))
      }
      _ => inner,
    },
    _ => inner,
  }
}

fn terms_of(expr: Expr) -> Vec<Expr> {
  match expr {
    Expr::Plus(terms) => terms,
    other => vec![other],
  }
}

/// Multiply the factors of a product out over every sum among them.
fn distribute(factors: &[Expr]) -> Expr {
  if !factors.iter().any(|f| matches!(f, Expr::Plus(_))) {
    return mul(factors.to_vec());
  }
  let mut terms = vec![Expr::one()];
  for factor in factors {
    let next: Vec<Expr> = match factor {
      Expr::Plus(items) => terms
        .iter()
        .flat_map(|t| items.iter().map(move |i| mul(vec![t.clone(), i.clone()])))
        .collect(),
      other => terms
        .iter()
        .map(|t| mul(vec![t.clone(), other.clone()]))
        .collect(),
    };
    terms = terms_of(add(next));
  }
  // distributing can produce new products of sums, e.g. (x+1)*(x+1)**-1
  add(terms.into_iter().map(|t| expand_products_shallow(&t)).collect())
}

fn expand_products_shallow(expr: &Expr) -> Expr {
  match expr {
    Expr::Times(factors) if factors.iter().any(|f| matches!(f, Expr::Plus(_))) => {
      distribute(factors)
    }
    other => other.clone(),
  }
}

fn expand_power(terms: &[Expr], n: i64) -> Expr {
  let base = terms.to_vec();
  let mut acc = base.clone();
  for _ in 1..n {
    let next: Vec<Expr> = acc
      .iter()
      .flat_map(|a| base.iter().map(move |b| mul(vec![a.clone(), b.clone()])))
      .collect();
    acc = terms_of(add(next));
  }
  add(acc)
}

/// `x**(a + b) -> x**a*x**b` and `exp(a + b) -> exp(a)*exp(b)` for one term.
///
/// The result is assembled without re-canonicalizing, which would merge the
/// split factors again.
fn split_exponent_sums(term: &Expr) -> Expr {
  let factors = match term {
    Expr::Times(items) => items.clone(),
    other => vec![other.clone()],
  };
  let mut split = false;
  let mut out = Vec::with_capacity(factors.len());
  for factor in factors {
    match &factor {
      Expr::Power(base, exp) => match exp.as_ref() {
        Expr::Plus(parts) => {
          split = true;
          out.extend(parts.iter().map(|p| pow(base.as_ref().clone(), p.clone())));
        }
        _ => out.push(factor),
      },
      Expr::Function(Func::Exp, arg) => match arg.as_ref() {
        Expr::Plus(parts) => {
          split = true;
          out.extend(parts.iter().map(|p| apply_function(Func::Exp, p.clone())));
        }
        _ => out.push(factor),
      },
      _ => out.push(factor),
    }
  }
  if !split {
    return term.clone();
  }
  let mut coeff = Expr::one();
  let mut rest = Vec::new();
  for factor in out {
    if factor.is_number() {
      coeff = mul(vec![coeff, factor]);
    } else {
      rest.push(factor);
    }
  }
  rest.sort_by(compare_factors);
  if !coeff.is_one() {
    rest.insert(0, coeff);
  }
  match rest.len() {
    0 => Expr::one(),
    1 => rest.remove(0),
    _ => Expr::Times(rest),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_expression;

  fn p(s: &str) -> Expr {
    parse_expression(s).unwrap()
  }

  #[test]
  fn binomial_square() {
    assert_eq!(expand(&p("(x + 1)**2")), p("x**2 + 2*x + 1"));
  }

  #[test]
  fn products_of_sums() {
    assert_eq!(expand(&p("(x + 2)*(x - 2)")), p("x**2 - 4"));
    assert_eq!(expand(&p("(a + b)*(c + d)")), p("a*c + a*d + b*c + b*d"));
  }

  #[test]
  fn expansion_reaches_function_arguments() {
    assert_eq!(expand(&p("sin((x + 1)**2)")), p("sin(x**2 + 2*x + 1)"));
  }

  #[test]
  fn exponent_sums_are_split() {
    let expanded = expand(&p("exp(x + 1)"));
    assert_eq!(
      expanded,
      Expr::Times(vec![
        Expr::Constant(crate::syntax::Constant::E),
        p("exp(x)")
      ])
    );
  }
}
