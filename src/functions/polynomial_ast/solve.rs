use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use tracing::debug;

use crate::evaluator::{
  add, apply_function, compare_exprs, div, mul, neg, pi_coefficient, pow,
  substitute, sub, to_complex,
};
use crate::syntax::{Constant, Expr, Func, Rational};

use super::{
  cancel, coefficients, expand, factor_list, fraction, together, Poly,
};

/// Name of the integer parameter of periodic solution families.
pub const IMAGE_PARAMETER: &str = "_n";

/// Placeholder standing for a transcendental kernel while solving for it.
const KERNEL_SYMBOL: &str = "_y";

/// The set of solutions of an equation over ℂ.
#[derive(Debug, Clone, PartialEq)]
pub enum SolutionSet {
  Finite(Vec<Expr>),
  Empty,
  Complexes,
  /// `{ expr : _n ∈ ℤ }`
  ImageSet { parameter: String, expr: Expr },
  /// Solutions of `equation = 0` that could not be made explicit.
  ConditionSet { var: String, equation: Expr },
  Union(Vec<SolutionSet>),
}

impl SolutionSet {
  /// Sorted, deduplicated finite set; empty becomes `Empty`.
  pub fn finite(mut items: Vec<Expr>) -> Self {
    items.sort_by(compare_solutions);
    items.dedup();
    if items.is_empty() {
      SolutionSet::Empty
    } else {
      SolutionSet::Finite(items)
    }
  }

  fn image(expr: Expr) -> Self {
    if expr.contains_symbol(IMAGE_PARAMETER) {
      SolutionSet::ImageSet {
        parameter: IMAGE_PARAMETER.to_string(),
        expr,
      }
    } else {
      SolutionSet::finite(vec![expr])
    }
  }

  /// Union with finite parts merged and empty parts dropped.
  pub fn union(sets: Vec<SolutionSet>) -> Self {
    let mut finite = Vec::new();
    let mut others: Vec<SolutionSet> = Vec::new();
    for set in sets {
      match set {
        SolutionSet::Empty => {}
        SolutionSet::Complexes => return SolutionSet::Complexes,
        SolutionSet::Finite(items) => finite.extend(items),
        SolutionSet::Union(parts) => match SolutionSet::union(parts) {
          SolutionSet::Union(inner) => others.extend(inner),
          SolutionSet::Finite(items) => finite.extend(items),
          SolutionSet::Empty => {}
          other => others.push(other),
        },
        other => {
          if !others.contains(&other) {
            others.push(other);
          }
        }
      }
    }
    let mut parts = Vec::new();
    if !finite.is_empty() {
      parts.push(SolutionSet::finite(finite));
    }
    parts.extend(others);
    match parts.len() {
      0 => SolutionSet::Empty,
      1 => parts.remove(0),
      _ => SolutionSet::Union(parts),
    }
  }
}

/// Numeric solutions by real part then imaginary part; symbolic ones after,
/// in structural order.
fn compare_solutions(a: &Expr, b: &Expr) -> Ordering {
  let key = |e: &Expr| {
    if e.is_constant() {
      to_complex(e)
    } else {
      None
    }
  };
  match (key(a), key(b)) {
    (Some(x), Some(y)) => x
      .re
      .total_cmp(&y.re)
      .then_with(|| x.im.total_cmp(&y.im))
      .then_with(|| compare_exprs(a, b)),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => compare_exprs(a, b),
  }
}

fn condition_set(expr: &Expr, var: &str) -> SolutionSet {
  SolutionSet::ConditionSet {
    var: var.to_string(),
    equation: expr.clone(),
  }
}

// ─── Solve ──────────────────────────────────────────────────────────

/// Solve `expr = 0` for `var` over the complex numbers.
pub fn solve(expr: &Expr, var: &str) -> SolutionSet {
  let combined = together(expr);
  let (numer, denom) = fraction(&combined);
  if !numer.contains_symbol(var) {
    let numer = cancel(&numer);
    return if numer.is_zero() {
      SolutionSet::Complexes
    } else if numer.is_constant() {
      SolutionSet::Empty
    } else {
      condition_set(expr, var)
    };
  }

  let solutions = solve_numerator(&numer, var, expr);
  if !denom.contains_symbol(var) {
    return solutions;
  }
  exclude_poles(solutions, &denom, var)
}

fn exclude_poles(set: SolutionSet, denom: &Expr, var: &str) -> SolutionSet {
  match set {
    SolutionSet::Finite(items) => SolutionSet::finite(
      items
        .into_iter()
        .filter(|s| {
          let value = cancel(&substitute(denom, var, s));
          let pole = value.is_zero()
            || matches!(
              value,
              Expr::Constant(Constant::ComplexInfinity | Constant::NaN)
            );
          if pole {
            debug!(solution = %s, "dropping a zero of the denominator");
          }
          !pole
        })
        .collect(),
    ),
    SolutionSet::Union(parts) => SolutionSet::union(
      parts
        .into_iter()
        .map(|p| exclude_poles(p, denom, var))
        .collect(),
    ),
    other => other,
  }
}

fn solve_numerator(numer: &Expr, var: &str, original: &Expr) -> SolutionSet {
  let factors: Vec<Expr> = match factor_list(numer) {
    Some((_, factors)) if factors.len() > 1 => factors
      .into_iter()
      .filter(|(f, _)| f.contains_symbol(var))
      .map(|(f, _)| f)
      .collect(),
    _ => vec![numer.clone()],
  };
  let sets: Vec<SolutionSet> = factors
    .iter()
    .map(|f| solve_factor(f, var))
    .collect();
  if sets
    .iter()
    .any(|s| matches!(s, SolutionSet::ConditionSet { .. }))
    && factors.len() > 1
  {
    let explicit: Vec<SolutionSet> = sets
      .into_iter()
      .filter(|s| !matches!(s, SolutionSet::ConditionSet { .. }))
      .collect();
    let mut parts = explicit;
    parts.push(condition_set(original, var));
    return SolutionSet::union(parts);
  }
  SolutionSet::union(sets)
}

fn solve_factor(f: &Expr, var: &str) -> SolutionSet {
  if let Some(coeffs) = coefficients(f, var) {
    if coeffs.len() > 1 {
      return solve_polynomial(f, &coeffs, var);
    }
  }
  solve_kernel(f, var)
}

// ─── Polynomials ────────────────────────────────────────────────────

fn solve_polynomial(f: &Expr, coeffs: &[Expr], var: &str) -> SolutionSet {
  let degree = coeffs.len() - 1;
  let rational: Option<Vec<Rational>> = coeffs
    .iter()
    .map(|c| c.as_rational().cloned())
    .collect();
  if let Some(rational) = rational {
    return solve_rational_polynomial(&Poly::new(rational), f, var);
  }
  match degree {
    1 => SolutionSet::finite(vec![cancel(&neg(div(
      coeffs[0].clone(),
      coeffs[1].clone(),
    )))]),
    2 => SolutionSet::finite(quadratic_roots(
      &coeffs[2], &coeffs[1], &coeffs[0],
    )),
    _ => {
      debug!(degree, "no closed form for a symbolic polynomial");
      condition_set(f, var)
    }
  }
}

fn solve_rational_polynomial(p: &Poly, f: &Expr, var: &str) -> SolutionSet {
  let (_, factors) = p.factor();
  let mut roots = Vec::new();
  let mut unsolved = false;
  for (factor, _) in factors {
    let c: Vec<Expr> = factor
      .coeffs()
      .iter()
      .map(|r| Expr::Number(r.clone()))
      .collect();
    match factor.degree() {
      1 => roots.push(neg(div(c[0].clone(), c[1].clone()))),
      2 => roots.extend(quadratic_roots(&c[2], &c[1], &c[0])),
      n => match binomial_roots(&factor) {
        Some(found) => roots.extend(found),
        None => {
          debug!(degree = n, "irreducible factor without closed form");
          unsolved = true;
        }
      },
    }
  }
  let finite = SolutionSet::finite(roots);
  if unsolved {
    SolutionSet::union(vec![finite, condition_set(f, var)])
  } else {
    finite
  }
}

/// Roots of `a*x**2 + b*x + c` by the quadratic formula.
fn quadratic_roots(a: &Expr, b: &Expr, c: &Expr) -> Vec<Expr> {
  let discriminant = expand(&sub(
    pow(b.clone(), Expr::int(2)),
    mul(vec![Expr::int(4), a.clone(), c.clone()]),
  ));
  let root = pow(discriminant, Expr::rational(1, 2));
  let denom = mul(vec![Expr::int(2), a.clone()]);
  [Expr::int(-1), Expr::one()]
    .into_iter()
    .map(|sign| {
      let numer = add(vec![neg(b.clone()), mul(vec![sign, root.clone()])]);
      expand(&div(numer, denom.clone()))
    })
    .collect()
}

/// Roots of `a*x**n + b` for `n` in 3, 4, 6 as `r*(cos(t) + I*sin(t))`.
fn binomial_roots(p: &Poly) -> Option<Vec<Expr>> {
  let n = p.degree();
  if !matches!(n, 3 | 4 | 6) || (1..n).any(|i| !p.coeff(i).is_zero()) {
    return None;
  }
  let c = -(p.coeff(0) / p.leading());
  let negative = c.is_negative();
  let modulus = pow(Expr::Number(c.abs()), Expr::rational(1, n as i64));
  let roots = (0..n)
    .map(|k| {
      // angle/pi: 2k/n, or (2k + 1)/n for a negative right-hand side
      let numer = 2 * k as i64 + i64::from(negative);
      let angle = mul(vec![Expr::rational(numer, n as i64), Expr::pi()]);
      let unit = add(vec![
        apply_function(Func::Cos, angle.clone()),
        mul(vec![Expr::imaginary_unit(), apply_function(Func::Sin, angle)]),
      ]);
      expand(&mul(vec![modulus.clone(), unit]))
    })
    .collect();
  Some(roots)
}

// ─── Transcendental equations ───────────────────────────────────────

/// Maximal subexpressions through which `var` enters `expr` non-polynomially.
fn kernels(expr: &Expr, var: &str, out: &mut Vec<Expr>) {
  if !expr.contains_symbol(var) {
    return;
  }
  let push = |out: &mut Vec<Expr>| {
    if !out.contains(expr) {
      out.push(expr.clone());
    }
  };
  match expr {
    Expr::Identifier(_) => push(out),
    Expr::Plus(items) | Expr::Times(items) => {
      for item in items {
        kernels(item, var, out);
      }
    }
    Expr::Power(base, exp) if exp.as_integer().is_some() => {
      kernels(base, var, out);
    }
    _ => push(out),
  }
}

fn solve_kernel(f: &Expr, var: &str) -> SolutionSet {
  let mut found = Vec::new();
  kernels(f, var, &mut found);
  let [kernel] = found.as_slice() else {
    debug!(kernels = found.len(), "equation mixes several kernels");
    return condition_set(f, var);
  };
  if kernel.as_symbol() == Some(var) {
    return condition_set(f, var);
  }
  let placeholder = Expr::symbol(KERNEL_SYMBOL);
  let reduced = crate::evaluator::replace(f, kernel, &placeholder);
  if reduced.contains_symbol(var) {
    return condition_set(f, var);
  }
  let values = match solve(&reduced, KERNEL_SYMBOL) {
    SolutionSet::Finite(values) => values,
    SolutionSet::Empty => return SolutionSet::Empty,
    _ => return condition_set(f, var),
  };
  let sets: Vec<SolutionSet> = values
    .iter()
    .map(|value| invert(kernel, value, var))
    .collect();
  if sets
    .iter()
    .any(|s| matches!(s, SolutionSet::ConditionSet { .. }))
  {
    return condition_set(f, var);
  }
  SolutionSet::union(sets)
}

fn period_term(multiple: Expr) -> Expr {
  mul(vec![multiple, Expr::symbol(IMAGE_PARAMETER)])
}

/// Reduce an angle `c*pi` into `[0, 2*pi)`.
fn normalize_angle(angle: Expr) -> Expr {
  match pi_coefficient(&angle) {
    Some(c) => {
      let two = Rational::from_integer(BigInt::from(2));
      let reduced = &c - (&c / &two).floor() * &two;
      mul(vec![Expr::Number(reduced), Expr::pi()])
    }
    None => angle,
  }
}

/// Solve `kernel = value` for `var`.
fn invert(kernel: &Expr, value: &Expr, var: &str) -> SolutionSet {
  let two_pi = mul(vec![Expr::int(2), Expr::pi()]);
  let two_pi_i = mul(vec![Expr::int(2), Expr::imaginary_unit(), Expr::pi()]);
  let (inner, branches): (Expr, Vec<Expr>) = match kernel {
    Expr::Function(Func::Exp, u) => {
      if value.is_zero() {
        return SolutionSet::Empty;
      }
      let base = apply_function(Func::Log, value.clone());
      (u.as_ref().clone(), vec![add(vec![period_term(two_pi_i), base])])
    }
    Expr::Power(b, u) if !b.contains_symbol(var) => {
      if value.is_zero() {
        return SolutionSet::Empty;
      }
      let base = apply_function(Func::Log, value.clone());
      let log_b = apply_function(Func::Log, b.as_ref().clone());
      let branch = div(add(vec![period_term(two_pi_i), base]), log_b);
      (u.as_ref().clone(), vec![branch])
    }
    Expr::Function(Func::Log, u) => {
      (u.as_ref().clone(), vec![apply_function(Func::Exp, value.clone())])
    }
    Expr::Function(Func::Sin, u) => {
      let a = apply_function(Func::Asin, value.clone());
      let first = normalize_angle(a.clone());
      let second = normalize_angle(sub(Expr::pi(), a));
      (
        u.as_ref().clone(),
        vec![
          add(vec![period_term(two_pi.clone()), first]),
          add(vec![period_term(two_pi), second]),
        ],
      )
    }
    Expr::Function(Func::Cos, u) => {
      let a = apply_function(Func::Acos, value.clone());
      let first = normalize_angle(a.clone());
      let second = normalize_angle(neg(a));
      let mut branches = vec![add(vec![period_term(two_pi.clone()), first])];
      let other = add(vec![period_term(two_pi), second]);
      if !branches.contains(&other) {
        branches.push(other);
      }
      (u.as_ref().clone(), branches)
    }
    Expr::Function(func @ (Func::Tan | Func::Cot), u) => {
      let inverse = if *func == Func::Tan { Func::Atan } else { Func::Acot };
      let a = apply_function(inverse, value.clone());
      (u.as_ref().clone(), vec![add(vec![period_term(Expr::pi()), a])])
    }
    Expr::Power(base, exp) => {
      // base**r = value -> base = value**(1/r), kept only if it checks out
      let Some(r) = exp.as_rational() else {
        return SolutionSet::ConditionSet {
          var: var.to_string(),
          equation: sub(kernel.clone(), value.clone()),
        };
      };
      let candidate = pow(value.clone(), Expr::Number(r.recip()));
      let back = pow(candidate.clone(), exp.as_ref().clone());
      if !same_value(&back, value) {
        return SolutionSet::Empty;
      }
      (base.as_ref().clone(), vec![candidate])
    }
    _ => {
      return SolutionSet::ConditionSet {
        var: var.to_string(),
        equation: sub(kernel.clone(), value.clone()),
      };
    }
  };
  let sets = branches
    .into_iter()
    .map(|branch| solve_linear_inner(&inner, branch, var))
    .collect();
  SolutionSet::union(sets)
}

fn same_value(a: &Expr, b: &Expr) -> bool {
  match (to_complex(a), to_complex(b)) {
    (Some(x), Some(y)) => (x - y).norm() <= 1e-10 * (1.0 + y.norm()),
    _ => cancel(&sub(a.clone(), b.clone())).is_zero(),
  }
}

/// Solve `inner = target` where the target may carry the image parameter.
fn solve_linear_inner(inner: &Expr, target: Expr, var: &str) -> SolutionSet {
  let equation = sub(inner.clone(), target.clone());
  if !target.contains_symbol(IMAGE_PARAMETER) {
    return solve(&equation, var);
  }
  match coefficients(inner, var) {
    Some(c) if c.len() == 2 => {
      let solution = expand(&div(sub(target, c[0].clone()), c[1].clone()));
      SolutionSet::image(solution)
    }
    _ => SolutionSet::ConditionSet {
      var: var.to_string(),
      equation,
    },
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
  fn quadratic_with_rational_roots() {
    assert_eq!(
      solve(&p("x**2 - 9"), "x"),
      SolutionSet::Finite(vec![Expr::int(-3), Expr::int(3)])
    );
  }

  #[test]
  fn complex_roots() {
    assert_eq!(
      solve(&p("x**2 + 1"), "x"),
      SolutionSet::Finite(vec![p("-I"), p("I")])
    );
  }

  #[test]
  fn constant_equations() {
    assert_eq!(solve(&p("x - x"), "x"), SolutionSet::Complexes);
    assert_eq!(solve(&p("3"), "x"), SolutionSet::Empty);
  }

  #[test]
  fn poles_are_excluded() {
    assert_eq!(
      solve(&p("(x**2 - 1)/(x - 1)"), "x"),
      SolutionSet::Finite(vec![Expr::int(-1)])
    );
  }

  #[test]
  fn symbolic_linear() {
    assert_eq!(
      solve(&p("a*x + b"), "x"),
      SolutionSet::Finite(vec![p("-b/a")])
    );
  }

  #[test]
  fn exponential_family() {
    assert_eq!(
      solve(&p("exp(x) - 1"), "x"),
      SolutionSet::ImageSet {
        parameter: "_n".into(),
        expr: p("2*_n*I*pi"),
      }
    );
  }

  #[test]
  fn sine_zeros() {
    assert_eq!(
      solve(&p("sin(x)"), "x"),
      SolutionSet::Union(vec![
        SolutionSet::ImageSet {
          parameter: "_n".into(),
          expr: p("2*_n*pi"),
        },
        SolutionSet::ImageSet {
          parameter: "_n".into(),
          expr: p("2*_n*pi + pi"),
        },
      ])
    );
  }

  #[test]
  fn irreducible_quintic_is_a_condition_set() {
    assert!(matches!(
      solve(&p("x**5 - x + 1"), "x"),
      SolutionSet::ConditionSet { .. }
    ));
  }
}
