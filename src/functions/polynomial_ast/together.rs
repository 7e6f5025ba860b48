use num_traits::{One, Signed};

use crate::evaluator::{
  add, apply_function, as_base_exp, compare_factors, div, map_children, mul,
  neg, pow,
};
use crate::syntax::{Expr, Func, Rational};

use super::{expand, factor_list, generators, MPoly, Poly};

// ─── Numerator and denominator ──────────────────────────────────────

/// Split a term into numerator and denominator: factors with a negative
/// exponent go below the line.
pub fn fraction(expr: &Expr) -> (Expr, Expr) {
  let factors = match expr {
    Expr::Times(items) => items.clone(),
    other => vec![other.clone()],
  };
  let mut numer = Vec::new();
  let mut denom = Vec::new();
  for factor in factors {
    match &factor {
      Expr::Number(r) if !r.is_integer() => {
        numer.push(Expr::Number(Rational::from_integer(r.numer().clone())));
        denom.push(Expr::Number(Rational::from_integer(r.denom().clone())));
      }
      Expr::Function(Func::Exp, arg) if arg.has_negative_sign() => {
        denom.push(apply_function(Func::Exp, neg(arg.as_ref().clone())));
      }
      _ => {
        let (base, exp) = as_base_exp(&factor);
        if exp.has_negative_sign() {
          denom.push(pow(base, neg(exp)));
        } else {
          numer.push(factor);
        }
      }
    }
  }
  (mul(numer), mul(denom))
}

// ─── Together ───────────────────────────────────────────────────────

/// Combine a sum of fractions over a common denominator.
pub fn together(expr: &Expr) -> Expr {
  let inner = map_children(expr, together);
  let Expr::Plus(terms) = &inner else {
    return inner;
  };
  let parts: Vec<(Expr, Expr)> = terms.iter().map(fraction).collect();
  if parts.iter().all(|(_, d)| d.is_one()) {
    return inner;
  }

  // Least common multiple of the denominators, factor by factor
  let mut common: Vec<(Expr, Expr)> = Vec::new();
  for (_, d) in &parts {
    for factor in factors_of(d) {
      let (base, exp) = as_base_exp(&factor);
      match common.iter_mut().find(|(b, _)| *b == base) {
        Some(entry) => {
          if larger_exponent(&exp, &entry.1) {
            entry.1 = exp;
          }
        }
        None => common.push((base, exp)),
      }
    }
  }
  let common_denom =
    mul(common.iter().map(|(b, e)| pow(b.clone(), e.clone())).collect());

  let numerators: Vec<Expr> = parts
    .into_iter()
    .map(|(n, d)| mul(vec![n, div(common_denom.clone(), d)]))
    .collect();
  let numer = expand(&add(numerators));
  raw_quotient(numer, common_denom)
}

fn factors_of(expr: &Expr) -> Vec<Expr> {
  match expr {
    Expr::Times(items) => items.clone(),
    other if other.is_one() => Vec::new(),
    other => vec![other.clone()],
  }
}

fn larger_exponent(a: &Expr, b: &Expr) -> bool {
  match (a, b) {
    (Expr::Number(x), Expr::Number(y)) => x > y,
    _ => false,
  }
}

/// `numer/denom` kept as a single fraction: a numeric denominator is folded
/// into the numerator, otherwise the sum in the numerator is not
/// distributed.
pub fn raw_quotient(numer: Expr, denom: Expr) -> Expr {
  if denom.is_one() {
    return numer;
  }
  let inverse = pow(denom, Expr::int(-1));
  match (&numer, &inverse) {
    (Expr::Plus(_), Expr::Number(_)) => mul(vec![inverse, numer]),
    (Expr::Plus(_), _) => {
      let mut factors = match inverse {
        Expr::Times(items) => items,
        other => vec![other],
      };
      let coeff = match factors.first() {
        Some(f) if f.is_number() => Some(factors.remove(0)),
        _ => None,
      };
      factors.push(numer);
      factors.sort_by(compare_factors);
      if let Some(c) = coeff {
        factors.insert(0, c);
      }
      Expr::Times(factors)
    }
    _ => mul(vec![numer, inverse]),
  }
}

// ─── Cancel ─────────────────────────────────────────────────────────

/// Bring to a single fraction and remove common factors of numerator and
/// denominator. Both are returned expanded.
pub fn cancel(expr: &Expr) -> Expr {
  let combined = together(expr);
  let (numer, denom) = fraction(&combined);
  if denom.is_one() {
    return expand(&numer);
  }
  let numer = expand(&numer);
  let denom = expand(&denom);

  if let Some(result) = cancel_univariate(&numer, &denom) {
    return result;
  }
  if let Some(result) = cancel_by_factors(&numer, &denom) {
    return result;
  }
  raw_quotient(numer, denom)
}

fn cancel_univariate(numer: &Expr, denom: &Expr) -> Option<Expr> {
  let mut symbols = numer.free_symbols();
  symbols.extend(denom.free_symbols());
  if symbols.len() != 1 {
    return None;
  }
  let var = Expr::symbol(symbols.into_iter().next()?);
  let n = Poly::from_expr(numer, &var)?;
  let d = Poly::from_expr(denom, &var)?;
  let g = n.gcd(&d);
  let n = n.exact_div(&g)?;
  let d = d.exact_div(&g)?;
  // keep a monic-ish, integer denominator with positive leading coefficient
  let (dc, dp) = d.primitive();
  let n = n.scale(&dc.recip());
  let (nc, np) = n.primitive();
  if dp.degree() == 0 {
    return Some(n.scale(&dp.coeff(0).recip()).to_expr(&var));
  }
  let numer = mul(vec![Expr::Number(nc), np.to_expr(&var)]);
  Some(raw_quotient(expand(&numer), dp.to_expr(&var)))
}

fn cancel_by_factors(numer: &Expr, denom: &Expr) -> Option<Expr> {
  let (nc, mut nf) = factor_list(numer)?;
  let (dc, mut df) = factor_list(denom)?;
  let mut changed = false;
  for (base, m) in nf.iter_mut() {
    if let Some(entry) = df.iter_mut().find(|(b, _)| b == base) {
      let common = (*m).min(entry.1);
      if common > 0 {
        *m -= common;
        entry.1 -= common;
        changed = true;
      }
    }
  }
  if !changed {
    return None;
  }
  let rebuild = |c: Rational, factors: Vec<(Expr, usize)>| {
    let mut parts = vec![Expr::Number(c)];
    for (base, m) in factors {
      if m > 0 {
        parts.push(pow(base, Expr::int(m as i64)));
      }
    }
    expand(&mul(parts))
  };
  let coefficient = nc / dc;
  let (sign, coefficient) = if coefficient.is_negative() {
    (Expr::int(-1), -coefficient)
  } else {
    (Expr::one(), coefficient)
  };
  let numer = rebuild(coefficient, nf);
  let denom = rebuild(Rational::one(), df);
  Some(mul(vec![sign, raw_quotient(numer, denom)]))
}

/// Whether `expr` is a polynomial in its generators.
pub fn is_polynomial(expr: &Expr) -> bool {
  generators(expr)
    .and_then(|gens| MPoly::from_expr(expr, &gens))
    .is_some()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_expression;

  fn p(s: &str) -> Expr {
    parse_expression(s).unwrap()
  }

  #[test]
  fn fraction_splits_negative_powers() {
    let (n, d) = fraction(&p("3*x/(2*y**2)"));
    assert_eq!(n, p("3*x"));
    assert_eq!(d, p("2*y**2"));
  }

  #[test]
  fn cancel_removes_common_factors() {
    assert_eq!(cancel(&p("(x**2 - 1)/(x - 1)")), p("x + 1"));
  }

  #[test]
  fn together_uses_common_denominator() {
    let combined = together(&p("1/x + 1/y"));
    let (n, d) = fraction(&combined);
    assert_eq!(n, p("x + y"));
    assert_eq!(d, p("x*y"));
  }

  #[test]
  fn cancel_with_several_variables() {
    assert_eq!(cancel(&p("(x**2 - y**2)/(x - y)")), p("x + y"));
  }
}
