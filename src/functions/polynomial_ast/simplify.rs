use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed};
use tracing::{debug, trace};

use crate::evaluator::{
  add, apply_function, as_base_exp, div, factor_integer, map_children, mul,
  pow, sub,
};
use crate::format::to_ascii;
use crate::syntax::{Expr, Func, Rational};

use super::{cancel, expand, together};

// ─── Simplify ───────────────────────────────────────────────────────

/// Size used to rank equivalent forms: node count, then printed length.
pub fn complexity(expr: &Expr) -> (usize, usize) {
  (expr.node_count(), to_ascii(expr).len())
}

fn shortest(candidates: Vec<Expr>) -> Expr {
  let mut best: Option<(Expr, (usize, usize))> = None;
  for candidate in candidates {
    let measure = complexity(&candidate);
    match &best {
      Some((_, m)) if *m <= measure => {}
      _ => best = Some((candidate, measure)),
    }
  }
  best.map(|(e, _)| e).unwrap_or_else(Expr::zero)
}

fn has_function(expr: &Expr, funcs: &[Func]) -> bool {
  match expr {
    Expr::Function(f, _) if funcs.contains(f) => true,
    other => other.children().into_iter().any(|c| has_function(c, funcs)),
  }
}

const TRIG: [Func; 6] =
  [Func::Sin, Func::Cos, Func::Tan, Func::Cot, Func::Sinh, Func::Cosh];

/// Pick the least complex of several equivalent forms of `expr`.
pub fn simplify(expr: &Expr) -> Expr {
  // arguments of functions first
  let expr = match expr {
    Expr::Function(func, arg) => apply_function(*func, simplify(arg)),
    other => map_children(other, |child| match child {
      Expr::Function(..) => simplify(child),
      _ => child.clone(),
    }),
  };
  let mut candidates = vec![expr.clone(), cancel(&expr), expand(&expr)];
  let combined = together(&expr);
  if combined != expr {
    candidates.push(combined);
  }
  if has_function(&expr, &[Func::Log]) {
    candidates.push(log_powers(&expr));
  }
  if has_function(&expr, &TRIG) {
    let trig: Vec<Expr> = candidates.iter().map(trigsimp).collect();
    candidates.extend(trig);
  }
  let best = shortest(candidates);
  debug!(
    before = expr.node_count(),
    after = best.node_count(),
    "simplified"
  );
  best
}

/// `log(8) -> 3*log(2)`: perfect powers leave logarithms of rationals.
fn log_powers(expr: &Expr) -> Expr {
  let expr = map_children(expr, log_powers);
  let Expr::Function(Func::Log, arg) = &expr else {
    return expr;
  };
  let Some(r) = arg.as_rational() else {
    return expr;
  };
  if !r.is_positive() || r.is_one() {
    return expr;
  }
  let numer = factor_integer(r.numer());
  let denom = factor_integer(r.denom());
  let k = numer.iter().chain(&denom).fold(0u32, |g, (_, e)| g.gcd(e));
  if k < 2 {
    return expr;
  }
  let root = |factors: &[(BigInt, u32)]| {
    factors
      .iter()
      .fold(BigInt::one(), |acc, (p, e)| acc * p.pow(e / k))
  };
  let base = Rational::new(root(&numer), root(&denom));
  mul(vec![
    Expr::int(i64::from(k)),
    apply_function(Func::Log, Expr::Number(base)),
  ])
}

// ─── Trigonometric simplification ───────────────────────────────────

/// Apply Pythagorean identities, quotient identities and the double-angle
/// formula wherever they shorten the expression.
pub fn trigsimp(expr: &Expr) -> Expr {
  let expr = map_children(expr, trigsimp);
  let mut candidates = vec![expr.clone()];
  let identities: [(Func, Func, i64, i64); 4] = [
    // f(u)**2 -> constant + sign*g(u)**2
    (Func::Sin, Func::Cos, 1, -1),
    (Func::Cos, Func::Sin, 1, -1),
    (Func::Cosh, Func::Sinh, 1, 1),
    (Func::Sinh, Func::Cosh, -1, 1),
  ];
  for (from, to, constant, sign) in identities {
    if has_function(&expr, &[from]) {
      let rewritten = rewrite_squares(&expr, from, &|u: &Expr| {
        let square = pow(apply_function(to, u.clone()), Expr::int(2));
        add(vec![Expr::int(constant), mul(vec![Expr::int(sign), square])])
      });
      candidates.push(expand(&rewritten));
    }
  }
  if has_function(&expr, &[Func::Tan, Func::Cot]) {
    candidates.push(cancel(&tan_to_sin_cos(&expr)));
  }
  candidates.push(quotients_to_tan(&expr));
  candidates.push(double_angle(&expr));
  let best = shortest(candidates);
  if best != expr {
    trace!(result = %best, "trigonometric rewrite");
  }
  best
}

/// Replace `f(u)**(2k)` by `square(u)**k`.
fn rewrite_squares(
  expr: &Expr,
  func: Func,
  square: &dyn Fn(&Expr) -> Expr,
) -> Expr {
  if let Expr::Power(base, exp) = expr {
    if let (Expr::Function(f, u), Some(n)) = (base.as_ref(), exp.as_i64()) {
      if *f == func && n > 0 && n % 2 == 0 {
        return pow(square(u), Expr::int(n / 2));
      }
    }
  }
  map_children(expr, |child| rewrite_squares(child, func, square))
}

fn tan_to_sin_cos(expr: &Expr) -> Expr {
  match expr {
    Expr::Function(Func::Tan, u) => {
      let u = tan_to_sin_cos(u);
      div(apply_function(Func::Sin, u.clone()), apply_function(Func::Cos, u))
    }
    Expr::Function(Func::Cot, u) => {
      let u = tan_to_sin_cos(u);
      div(apply_function(Func::Cos, u.clone()), apply_function(Func::Sin, u))
    }
    other => map_children(other, tan_to_sin_cos),
  }
}

/// `sin(u)**a*cos(u)**-a -> tan(u)**a` and the cotangent counterpart.
fn quotients_to_tan(expr: &Expr) -> Expr {
  let expr = map_children(expr, quotients_to_tan);
  let Expr::Times(factors) = &expr else {
    return expr;
  };
  let mut factors = factors.clone();
  let mut changed = false;
  let mut i = 0;
  while i < factors.len() {
    let (base, exp) = as_base_exp(&factors[i]);
    if let Expr::Function(Func::Sin, u) = &base {
      let cos = apply_function(Func::Cos, u.as_ref().clone());
      let partner = factors.iter().position(|f| {
        let (b, e) = as_base_exp(f);
        b == cos && add(vec![e, exp.clone()]).is_zero()
      });
      if let Some(j) = partner {
        let u = u.as_ref().clone();
        let replacement = if exp.is_negative_number() {
          pow(apply_function(Func::Cot, u), sub(Expr::zero(), exp))
        } else {
          pow(apply_function(Func::Tan, u), exp)
        };
        let (first, second) = if i < j { (i, j) } else { (j, i) };
        factors.remove(second);
        factors.remove(first);
        factors.push(replacement);
        changed = true;
        i = 0;
        continue;
      }
    }
    i += 1;
  }
  if changed {
    mul(factors)
  } else {
    expr
  }
}

/// `c*sin(u)*cos(u) -> c/2*sin(2*u)`.
fn double_angle(expr: &Expr) -> Expr {
  let expr = map_children(expr, double_angle);
  let Expr::Times(factors) = &expr else {
    return expr;
  };
  for (i, f) in factors.iter().enumerate() {
    let Expr::Function(Func::Sin, u) = f else {
      continue;
    };
    let cos = apply_function(Func::Cos, u.as_ref().clone());
    if let Some(j) = factors.iter().position(|g| *g == cos) {
      let mut rest: Vec<Expr> = factors
        .iter()
        .enumerate()
        .filter(|(k, _)| *k != i && *k != j)
        .map(|(_, g)| g.clone())
        .collect();
      rest.push(Expr::rational(1, 2));
      rest.push(apply_function(
        Func::Sin,
        mul(vec![Expr::int(2), u.as_ref().clone()]),
      ));
      return mul(rest);
    }
  }
  expr
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_expression;

  fn p(s: &str) -> Expr {
    parse_expression(s).unwrap()
  }

  #[test]
  fn like_terms_stay_expanded() {
    assert_eq!(simplify(&p("2*x + 3*x - 5")).to_string(), "5*x - 5");
  }

  #[test]
  fn pythagorean_identity() {
    assert_eq!(simplify(&p("sin(x)**2 + cos(x)**2")), Expr::one());
    assert_eq!(simplify(&p("cosh(x)**2 - sinh(x)**2")), Expr::one());
  }

  #[test]
  fn quotient_becomes_tangent() {
    assert_eq!(simplify(&p("sin(x)/cos(x)")), p("tan(x)"));
  }

  #[test]
  fn rational_functions_cancel() {
    assert_eq!(simplify(&p("(x**2 - 1)/(x - 1)")), p("x + 1"));
  }

  #[test]
  fn logarithms_of_perfect_powers() {
    assert_eq!(simplify(&p("log(8, 2)")), Expr::int(3));
    assert_eq!(simplify(&p("log(27)/log(3)")), Expr::int(3));
    assert_eq!(simplify(&p("log(1/4)/log(2)")), Expr::int(-2));
  }

  #[test]
  fn double_angle_identity() {
    assert_eq!(simplify(&p("2*sin(x)*cos(x)")), p("sin(2*x)"));
  }
}
