use num_traits::{One, Signed, Zero};
use tracing::debug;

use crate::evaluator::{compare_factors, mul, pow};
use crate::syntax::{Expr, Rational};

use super::{factor_multivariate, fraction, generators, together, MPoly};

// ─── Factor ─────────────────────────────────────────────────────────

/// Factor a polynomial into a rational content and irreducible factors over
/// ℚ with multiplicities. Non-numeric atoms (`pi`, `sin(x)`, `sqrt(2)`) act
/// as further variables. `None` if `expr` is not a polynomial.
pub fn factor_list(expr: &Expr) -> Option<(Rational, Vec<(Expr, usize)>)> {
  let gens = generators(expr)?;
  let p = MPoly::from_expr(expr, &gens)?;
  if p.is_zero() {
    return Some((Rational::zero(), Vec::new()));
  }
  if let Some(c) = p.as_constant() {
    return Some((c, Vec::new()));
  }

  let (mut content, prim) = p.primitive();
  let monomial = prim.monomial_content();
  let prim = prim.divide_monomial(&monomial);
  let mut factors: Vec<(Expr, usize)> = gens
    .iter()
    .zip(&monomial)
    .filter(|(_, &k)| k > 0)
    .map(|(g, &k)| (g.clone(), k as usize))
    .collect();

  let used = prim.used_vars();
  match used.len() {
    0 => {}
    1 => {
      let var = &gens[used[0]];
      let (c, parts) = prim.to_univariate_in(used[0]).factor();
      content *= c;
      for (f, m) in parts {
        factors.push((f.to_expr(var), m));
      }
    }
    _ => match factor_multivariate(&prim) {
      Some((unit, parts)) => {
        content *= unit;
        for part in parts {
          let e = part.to_expr(&gens);
          match factors.iter_mut().find(|(b, _)| *b == e) {
            Some(entry) => entry.1 += 1,
            None => factors.push((e, 1)),
          }
        }
      }
      None => {
        debug!(generators = gens.len(), "multivariate factoring gave up");
        factors.push((prim.to_expr(&gens), 1));
      }
    },
  }
  factors.sort_by(|a, b| compare_factors(&a.0, &b.0));
  Some((content, factors))
}

/// Factor an expression, rational functions as numerator over denominator.
/// The product is kept unexpanded: `2*(x + 1)`, `(x + 1)**2`.
pub fn factor(expr: &Expr) -> Expr {
  let combined = together(expr);
  let (numer, denom) = fraction(&combined);
  let (Some((nc, nf)), Some((dc, df))) =
    (factor_list(&numer), factor_list(&denom))
  else {
    return combined;
  };
  if dc.is_zero() {
    return combined;
  }
  let coefficient = nc / dc;
  if coefficient.is_zero() {
    return Expr::zero();
  }

  let mut parts: Vec<Expr> = Vec::new();
  for (base, m) in nf {
    parts.push(pow(base, Expr::int(m as i64)));
  }
  for (base, m) in df {
    parts.push(pow(base, Expr::int(-(m as i64))));
  }
  parts.sort_by(compare_factors);

  let unit = coefficient.abs().is_one();
  match parts.len() {
    0 => Expr::Number(coefficient),
    1 if unit => mul(vec![Expr::Number(coefficient), parts.remove(0)]),
    _ => {
      if !coefficient.is_one() {
        parts.insert(0, Expr::Number(coefficient));
      }
      if parts.len() == 1 {
        parts.remove(0)
      } else {
        Expr::Times(parts)
      }
    }
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
  fn perfect_square() {
    assert_eq!(factor(&p("x**2 + 2*x + 1")).to_string(), "(x + 1)**2");
  }

  #[test]
  fn content_stays_outside() {
    assert_eq!(factor(&p("2*x + 2")).to_string(), "2*(x + 1)");
    assert_eq!(factor(&p("-x**2 + 1")).to_string(), "-(x - 1)*(x + 1)");
  }

  #[test]
  fn common_monomial() {
    assert_eq!(factor(&p("x**3 + x**2")).to_string(), "x**2*(x + 1)");
  }

  #[test]
  fn several_variables() {
    assert_eq!(factor(&p("x**2 - y**2")).to_string(), "(x - y)*(x + y)");
  }

  #[test]
  fn rational_functions() {
    assert_eq!(
      factor(&p("(x**2 - 1)/(x + 2)")).to_string(),
      "(x - 1)*(x + 1)/(x + 2)"
    );
  }
}
