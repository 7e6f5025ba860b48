//! Symbolic differentiation and integration.
//!
//! Integration tries, in order: linearity, polynomials, a table of
//! elementary antiderivatives with linear inner arguments, partial fractions,
//! trigonometric power reduction, integration by parts and substitution.
//! When every strategy fails the result is the unevaluated
//! `Integral(expr, x)`.

use num_traits::{One, Signed, Zero};
use tracing::{debug, trace};

use crate::evaluator::{
  add, apply_function, div, infinity_sign, mul, neg, pow, replace, sub,
  substitute, to_complex,
};
use crate::functions::polynomial_ast::{
  cancel, coefficients, expand, fraction, solve, together, Poly, SolutionSet,
};
use crate::syntax::{Constant, Expr, Func, Rational};
use crate::SymcalcError;

/// Nesting limit for strategies that call back into `integrate`.
const MAX_DEPTH: usize = 10;

/// Placeholder variable of u-substitution.
const SUBSTITUTION_SYMBOL: &str = "_u";

// ─── Differentiation ────────────────────────────────────────────────

/// `d(expr)/d(var)`.
pub fn differentiate(expr: &Expr, var: &str) -> Expr {
  if !expr.contains_symbol(var) {
    return Expr::zero();
  }
  match expr {
    Expr::Identifier(_) => Expr::one(),
    Expr::Plus(terms) => {
      add(terms.iter().map(|t| differentiate(t, var)).collect())
    }
    // Product rule: sum over i of f_i' * prod_{j != i} f_j
    Expr::Times(factors) => add(
      (0..factors.len())
        .filter(|&i| factors[i].contains_symbol(var))
        .map(|i| {
          let mut parts: Vec<Expr> = factors
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, f)| f.clone())
            .collect();
          parts.push(differentiate(&factors[i], var));
          mul(parts)
        })
        .collect(),
    ),
    Expr::Power(base, exp) => {
      let (base, exp) = (base.as_ref(), exp.as_ref());
      if !exp.contains_symbol(var) {
        // n*u**(n - 1)*u'
        mul(vec![
          exp.clone(),
          pow(base.clone(), sub(exp.clone(), Expr::one())),
          differentiate(base, var),
        ])
      } else {
        // u**v*(v'*log(u) + v*u'/u)
        let log_base = apply_function(Func::Log, base.clone());
        mul(vec![
          expr.clone(),
          add(vec![
            mul(vec![differentiate(exp, var), log_base]),
            mul(vec![
              exp.clone(),
              differentiate(base, var),
              pow(base.clone(), Expr::int(-1)),
            ]),
          ]),
        ])
      }
    }
    Expr::Function(func, arg) => mul(vec![
      function_derivative(*func, arg),
      differentiate(arg, var),
    ]),
    Expr::FunctionCall { name, args } => call_derivative(name, args, var),
    _ => Expr::zero(),
  }
}

/// `f'(u)` for the elementary functions.
fn function_derivative(func: Func, u: &Expr) -> Expr {
  let f = |g: Func| apply_function(g, u.clone());
  let square = |e: Expr| pow(e, Expr::int(2));
  let u_squared = square(u.clone());
  match func {
    Func::Sin => f(Func::Cos),
    Func::Cos => neg(f(Func::Sin)),
    Func::Tan => add(vec![square(f(Func::Tan)), Expr::one()]),
    Func::Cot => neg(add(vec![square(f(Func::Cot)), Expr::one()])),
    Func::Sec => mul(vec![f(Func::Tan), f(Func::Sec)]),
    Func::Csc => neg(mul(vec![f(Func::Cot), f(Func::Csc)])),
    Func::Asin => pow(sub(Expr::one(), u_squared), Expr::rational(-1, 2)),
    Func::Acos => {
      neg(pow(sub(Expr::one(), u_squared), Expr::rational(-1, 2)))
    }
    Func::Atan => pow(add(vec![u_squared, Expr::one()]), Expr::int(-1)),
    Func::Acot => neg(pow(add(vec![u_squared, Expr::one()]), Expr::int(-1))),
    Func::Sinh => f(Func::Cosh),
    Func::Cosh => f(Func::Sinh),
    Func::Tanh => sub(Expr::one(), square(f(Func::Tanh))),
    Func::Asinh => {
      pow(add(vec![u_squared, Expr::one()]), Expr::rational(-1, 2))
    }
    Func::Acosh => {
      pow(sub(u_squared, Expr::one()), Expr::rational(-1, 2))
    }
    Func::Atanh => pow(sub(Expr::one(), u_squared), Expr::int(-1)),
    Func::Exp => f(Func::Exp),
    Func::Log => pow(u.clone(), Expr::int(-1)),
    Func::Abs => f(Func::Sign),
    Func::Sign => Expr::zero(),
  }
}

fn call_derivative(name: &str, args: &[Expr], var: &str) -> Expr {
  let x = Expr::symbol(var);
  let unevaluated = || {
    Expr::call("Derivative", vec![Expr::call(name, args.to_vec()), x.clone()])
  };
  match name {
    // d/dx Integral(f, x) = f
    "Integral" if args.len() == 2 && args[1] == x => args[0].clone(),
    "Derivative" if args.len() >= 2 => {
      let mut variables = args[1..].to_vec();
      let bumped = match variables.last() {
        Some(Expr::Identifier(v)) if v == var => {
          Some(Expr::call("Tuple", vec![x.clone(), Expr::int(2)]))
        }
        Some(Expr::FunctionCall { name, args: pair })
          if name == "Tuple" && pair.len() == 2 && pair[0] == x =>
        {
          let order = add(vec![pair[1].clone(), Expr::one()]);
          Some(Expr::call("Tuple", vec![x.clone(), order]))
        }
        _ => None,
      };
      match bumped {
        Some(entry) => {
          variables.pop();
          variables.push(entry);
        }
        None => variables.push(x.clone()),
      }
      let mut all = vec![args[0].clone()];
      all.extend(variables);
      Expr::call("Derivative", all)
    }
    _ => unevaluated(),
  }
}

/// Derivative of order `order`; order 0 returns `expr` itself.
pub fn diff(expr: &Expr, var: &str, order: i64) -> Result<Expr, SymcalcError> {
  if order < 0 {
    return Err(SymcalcError::InvalidArgument(format!(
      "Derivative order must be non-negative, got {order}"
    )));
  }
  let mut result = expr.clone();
  for _ in 0..order {
    result = differentiate(&result, var);
  }
  debug!(order, var, "differentiated");
  Ok(result)
}

// ─── Integration ────────────────────────────────────────────────────

/// Indefinite integral without a constant of integration.
pub fn integrate(expr: &Expr, var: &str) -> Expr {
  match antiderivative(expr, var, 0) {
    Some(result) => result,
    None => {
      debug!(integrand = %expr, "no antiderivative found");
      Expr::call("Integral", vec![expr.clone(), Expr::symbol(var)])
    }
  }
}

/// `F(upper) - F(lower)`; infinite bounds go through infinity arithmetic.
/// A rational integrand with a real pole in `[lower, upper]` diverges.
pub fn integrate_definite(
  expr: &Expr,
  var: &str,
  lower: &Expr,
  upper: &Expr,
) -> Expr {
  let unevaluated = || {
    let limits = Expr::call(
      "Tuple",
      vec![Expr::symbol(var), lower.clone(), upper.clone()],
    );
    Expr::call("Integral", vec![expr.clone(), limits])
  };
  match divergence(expr, var, lower, upper) {
    Divergence::None => {}
    Divergence::Unknown => {
      debug!(integrand = %expr, "cannot locate the poles");
      return unevaluated();
    }
    Divergence::Diverges(value) => {
      debug!(integrand = %expr, result = %value, "pole inside the interval");
      return value;
    }
  }
  let Some(primitive) = antiderivative(expr, var, 0) else {
    debug!(integrand = %expr, "no antiderivative found");
    return unevaluated();
  };
  let result = sub(
    value_at(&primitive, var, upper),
    value_at(&primitive, var, lower),
  );
  if matches!(result, Expr::Constant(Constant::NaN))
    || has_function_of_infinity(&result)
  {
    debug!(primitive = %primitive, "bounds give an undefined value");
    return unevaluated();
  }
  result
}

enum Divergence {
  None,
  Unknown,
  Diverges(Expr),
}

/// Real number for a bound, with infinities as `f64` infinities.
fn bound_value(bound: &Expr) -> Option<f64> {
  if let Some(sign) = infinity_sign(bound) {
    return Some(f64::from(sign) * f64::INFINITY);
  }
  let z = to_complex(bound)?;
  (z.im.abs() < 1e-12).then_some(z.re)
}

/// Sign of `f` just beside `at`, on the side given by `direction`.
fn side_sign(f: &Expr, var: &str, at: f64, direction: f64) -> Option<f64> {
  let step = 1e-6 * at.abs().max(1.0);
  let point = Expr::Real(at + direction * step);
  let z = to_complex(&substitute(f, var, &point))?;
  if !z.re.is_finite() || z.im.abs() > 1e-9 * z.norm().max(1.0) {
    return None;
  }
  Some(z.re.signum())
}

/// Poles of a rational integrand inside the closed interval. The integral
/// is `±oo` when the integrand keeps one sign beside every pole, else `nan`.
fn divergence(f: &Expr, var: &str, lower: &Expr, upper: &Expr) -> Divergence {
  let (_, denom) = fraction(&cancel(f));
  // exp never vanishes
  let never_zero = |g: &Expr| matches!(g, Expr::Function(Func::Exp, _));
  let denom = match denom {
    Expr::Times(factors) => {
      mul(factors.into_iter().filter(|g| !never_zero(g)).collect())
    }
    g if never_zero(&g) => Expr::one(),
    other => other,
  };
  if !denom.contains_symbol(var) {
    return Divergence::None;
  }
  if coefficients(&denom, var).is_none() {
    return match solve(&denom, var) {
      SolutionSet::Empty => Divergence::None,
      _ => Divergence::Unknown,
    };
  }
  let (Some(a), Some(b)) = (bound_value(lower), bound_value(upper)) else {
    return Divergence::Unknown;
  };
  let (a, b) = if a <= b { (a, b) } else { (b, a) };
  let roots = match solve(&denom, var) {
    SolutionSet::Finite(roots) => roots,
    SolutionSet::Empty => return Divergence::None,
    _ => return Divergence::Unknown,
  };
  let mut signs = Vec::new();
  for root in &roots {
    let Some(r) = bound_value(root) else {
      continue;
    };
    if r < a || r > b {
      continue;
    }
    for direction in [-1.0, 1.0] {
      let inside = if direction < 0.0 { r > a } else { r < b };
      if inside {
        signs.push(side_sign(f, var, r, direction));
      }
    }
  }
  if signs.is_empty() {
    return Divergence::None;
  }
  let value = match signs.first().copied().flatten() {
    Some(s) if signs.iter().all(|t| *t == Some(s)) => {
      mul(vec![Expr::int(s as i64), Expr::infinity()])
    }
    _ => Expr::Constant(Constant::NaN),
  };
  Divergence::Diverges(value)
}

/// `cos(oo)` and the like: a bound that left the primitive undefined.
fn has_function_of_infinity(expr: &Expr) -> bool {
  match expr {
    Expr::Function(_, arg) => {
      arg.contains_constant(Constant::Infinity)
        || arg.contains_constant(Constant::ComplexInfinity)
        || has_function_of_infinity(arg)
    }
    other => other.children().into_iter().any(has_function_of_infinity),
  }
}

fn value_at(primitive: &Expr, var: &str, bound: &Expr) -> Expr {
  let value = substitute(primitive, var, bound);
  let Some(sign) = infinity_sign(bound) else {
    return value;
  };
  if !matches!(value, Expr::Constant(Constant::NaN)) {
    return value;
  }
  // oo - oo from a polynomial: its leading term decides
  match coefficients(primitive, var) {
    Some(c) if c.iter().all(Expr::is_number) => {
      let n = c.len() - 1;
      let direction = if sign < 0 && n % 2 == 1 { -1 } else { 1 };
      mul(vec![
        c[n].clone(),
        Expr::int(direction),
        Expr::infinity(),
      ])
    }
    _ => value,
  }
}

fn antiderivative(f: &Expr, x: &str, depth: usize) -> Option<Expr> {
  if depth > MAX_DEPTH {
    return None;
  }
  if !f.contains_symbol(x) {
    return Some(mul(vec![f.clone(), Expr::symbol(x)]));
  }
  if let Expr::Plus(terms) = f {
    let parts: Option<Vec<Expr>> =
      terms.iter().map(|t| antiderivative(t, x, depth)).collect();
    return parts.map(add);
  }
  if let Expr::Times(factors) = f {
    let (constant, dependent): (Vec<Expr>, Vec<Expr>) =
      factors.iter().cloned().partition(|g| !g.contains_symbol(x));
    if !constant.is_empty() {
      let inner = antiderivative(&mul(dependent), x, depth)?;
      return Some(mul(vec![mul(constant), inner]));
    }
  }
  if let Some(result) = integrate_polynomial(f, x) {
    return Some(result);
  }
  let strategies: [fn(&Expr, &str, usize) -> Option<Expr>; 6] = [
    table,
    partial_fractions,
    trig_power,
    by_parts,
    substitution,
    expanded,
  ];
  strategies.iter().find_map(|strategy| strategy(f, x, depth))
}

fn integrate_polynomial(f: &Expr, x: &str) -> Option<Expr> {
  let c = coefficients(f, x)?;
  let var = Expr::symbol(x);
  Some(add(
    c.into_iter()
      .enumerate()
      .map(|(k, ck)| {
        let n = k as i64 + 1;
        mul(vec![
          ck,
          Expr::rational(1, n),
          pow(var.clone(), Expr::int(n)),
        ])
      })
      .collect(),
  ))
}

/// Slope of `u` when it is linear in `x`.
fn linear_slope(u: &Expr, x: &str) -> Option<Expr> {
  match coefficients(u, x)?.as_slice() {
    [_, a] if !a.is_zero() => Some(a.clone()),
    _ => None,
  }
}

// ─── Table ──────────────────────────────────────────────────────────

fn table(f: &Expr, x: &str, _depth: usize) -> Option<Expr> {
  let var = Expr::symbol(x);
  match f {
    Expr::Function(func, u) => {
      let a = linear_slope(u, x)?;
      let primitive = function_antiderivative(*func, u)?;
      trace!(function = func.name(), "table antiderivative");
      Some(div(primitive, a))
    }
    Expr::Power(base, exp) if !exp.contains_symbol(x) => {
      if let Expr::Function(func, u) = base.as_ref() {
        return trig_square(*func, u, exp, x);
      }
      let a = linear_slope(base, x)?;
      if exp.as_i64() == Some(-1) {
        return Some(div(apply_function(Func::Log, (**base).clone()), a));
      }
      let n = add(vec![(**exp).clone(), Expr::one()]);
      Some(div(pow((**base).clone(), n.clone()), mul(vec![n, a])))
    }
    Expr::Power(base, exp) if !base.contains_symbol(x) => {
      let a = linear_slope(exp, x)?;
      let log_base = apply_function(Func::Log, (**base).clone());
      Some(div(f.clone(), mul(vec![a, log_base])))
    }
    Expr::Times(factors) if factors.len() == 2 => {
      exp_times_trig(&factors[0], &factors[1], x)
        .or_else(|| exp_times_trig(&factors[1], &factors[0], x))
    }
    Expr::FunctionCall { name, args }
      if name == "Derivative"
        && args.len() == 2
        && args[1] == var =>
    {
      Some(args[0].clone())
    }
    _ => None,
  }
}

/// `F(u)` with `F' = func`.
fn function_antiderivative(func: Func, u: &Expr) -> Option<Expr> {
  let f = |g: Func| apply_function(g, u.clone());
  let log = |e: Expr| apply_function(Func::Log, e);
  let u_squared = pow(u.clone(), Expr::int(2));
  let result = match func {
    Func::Sin => neg(f(Func::Cos)),
    Func::Cos => f(Func::Sin),
    Func::Tan => neg(log(f(Func::Cos))),
    Func::Cot => log(f(Func::Sin)),
    Func::Sec => log(add(vec![f(Func::Tan), f(Func::Sec)])),
    Func::Csc => neg(log(add(vec![f(Func::Cot), f(Func::Csc)]))),
    Func::Exp => f(Func::Exp),
    Func::Log => sub(mul(vec![u.clone(), f(Func::Log)]), u.clone()),
    Func::Sinh => f(Func::Cosh),
    Func::Cosh => f(Func::Sinh),
    Func::Tanh => log(f(Func::Cosh)),
    Func::Asin => add(vec![
      mul(vec![u.clone(), f(Func::Asin)]),
      pow(sub(Expr::one(), u_squared), Expr::rational(1, 2)),
    ]),
    Func::Acos => sub(
      mul(vec![u.clone(), f(Func::Acos)]),
      pow(sub(Expr::one(), u_squared), Expr::rational(1, 2)),
    ),
    Func::Atan => sub(
      mul(vec![u.clone(), f(Func::Atan)]),
      mul(vec![
        Expr::rational(1, 2),
        log(add(vec![u_squared, Expr::one()])),
      ]),
    ),
    _ => return None,
  };
  Some(result)
}

/// Squares of trigonometric functions with a one-line antiderivative.
fn trig_square(func: Func, u: &Expr, exp: &Expr, x: &str) -> Option<Expr> {
  let a = linear_slope(u, x)?;
  let f = |g: Func| apply_function(g, u.clone());
  let var = Expr::symbol(x);
  let primitive = match (func, exp.as_i64()?) {
    (Func::Sec, 2) | (Func::Cos, -2) => div(f(Func::Tan), a),
    (Func::Csc, 2) | (Func::Sin, -2) => neg(div(f(Func::Cot), a)),
    (Func::Tan, 2) => sub(div(f(Func::Tan), a), var),
    (Func::Cot, 2) => neg(add(vec![div(f(Func::Cot), a), var])),
    (Func::Cosh, -2) => div(f(Func::Tanh), a),
    _ => return None,
  };
  Some(primitive)
}

/// `exp(u)*sin(v)` and `exp(u)*cos(v)` for linear `u`, `v`.
fn exp_times_trig(e: &Expr, t: &Expr, x: &str) -> Option<Expr> {
  let Expr::Function(Func::Exp, u) = e else {
    return None;
  };
  let Expr::Function(func @ (Func::Sin | Func::Cos), v) = t else {
    return None;
  };
  let alpha = linear_slope(u, x)?;
  let beta = linear_slope(v, x)?;
  let sin = apply_function(Func::Sin, (**v).clone());
  let cos = apply_function(Func::Cos, (**v).clone());
  let combination = if *func == Func::Sin {
    sub(mul(vec![alpha.clone(), sin]), mul(vec![beta.clone(), cos]))
  } else {
    add(vec![mul(vec![alpha.clone(), cos]), mul(vec![beta.clone(), sin])])
  };
  let norm = add(vec![
    pow(alpha, Expr::int(2)),
    pow(beta, Expr::int(2)),
  ]);
  Some(expand(&div(mul(vec![e.clone(), combination]), norm)))
}

// ─── Rational functions ─────────────────────────────────────────────

/// `(g, s, t)` with `s*a + t*b = g`.
fn extended_gcd(a: &Poly, b: &Poly) -> Option<(Poly, Poly, Poly)> {
  let one = Poly::constant(Rational::one());
  let (mut r0, mut r1) = (a.clone(), b.clone());
  let (mut s0, mut s1) = (one.clone(), Poly::zero());
  let (mut t0, mut t1) = (Poly::zero(), one);
  while !r1.is_zero() {
    let (q, r) = r0.divrem(&r1)?;
    let s = s0.sub(&q.mul(&s1));
    let t = t0.sub(&q.mul(&t1));
    r0 = std::mem::replace(&mut r1, r);
    s0 = std::mem::replace(&mut s1, s);
    t0 = std::mem::replace(&mut t1, t);
  }
  Some((r0, s0, t0))
}

fn partial_fractions(f: &Expr, x: &str, _depth: usize) -> Option<Expr> {
  let var = Expr::symbol(x);
  let (numer, denom) = fraction(&together(f));
  let n = Poly::from_expr(&numer, &var)?;
  let d = Poly::from_expr(&denom, &var)?;
  if d.degree() == 0 {
    return None;
  }
  let (quotient, remainder) = n.divrem(&d)?;
  let mut parts = vec![integrate_polynomial(&quotient.to_expr(&var), x)?];

  let (_, factors) = d.factor();
  for (p, m) in factors {
    let power = p.pow(m);
    let cofactor = d.exact_div(&power)?;
    // A = remainder / cofactor mod p**m
    let (g, s, _) = extended_gcd(&cofactor, &power)?;
    if g.degree() != 0 {
      return None;
    }
    let inverse = s.scale(&g.coeff(0).recip());
    let (_, mut a) = remainder.mul(&inverse).divrem(&power)?;
    match p.degree() {
      1 => {
        // A = sum a_k p**k, giving a_k/p**(m - k)
        for k in 0..m {
          let (rest, a_k) = a.divrem(&p)?;
          a = rest;
          parts.push(linear_term(&a_k.coeff(0), &p, m - k, &var));
        }
      }
      2 if m == 1 => parts.push(quadratic_term(&a, &p, &var)),
      _ => {
        debug!(degree = p.degree(), multiplicity = m, "unsupported factor");
        return None;
      }
    }
  }
  trace!(denominator = %denom, "partial fractions");
  Some(add(parts))
}

/// Antiderivative of `c/p**k` for linear `p`.
fn linear_term(c: &Rational, p: &Poly, k: usize, var: &Expr) -> Expr {
  if c.is_zero() {
    return Expr::zero();
  }
  let slope = Expr::Number(p.leading());
  let c = Expr::Number(c.clone());
  let base = p.to_expr(var);
  if k == 1 {
    return mul(vec![
      div(c, slope),
      apply_function(Func::Log, base),
    ]);
  }
  let m = k as i64 - 1;
  mul(vec![
    neg(div(c, mul(vec![slope, Expr::int(m)]))),
    pow(base, Expr::int(-m)),
  ])
}

/// Antiderivative of `(B*x + C)/(a*x**2 + b*x + c)` for irreducible
/// denominators.
fn quadratic_term(numer: &Poly, p: &Poly, var: &Expr) -> Expr {
  let (a, b, c) = (p.coeff(2), p.coeff(1), p.coeff(0));
  let (big_b, big_c) = (numer.coeff(1), numer.coeff(0));
  let two = Rational::from_integer(2.into());
  let four = Rational::from_integer(4.into());
  let quad = p.to_expr(var);
  let log_part = mul(vec![
    Expr::Number(&big_b / (&two * &a)),
    apply_function(Func::Log, quad),
  ]);
  let rest = &big_c - &big_b * &b / (&two * &a);
  if rest.is_zero() {
    return log_part;
  }
  let delta = &four * &a * &c - &b * &b;
  let linear = add(vec![
    mul(vec![Expr::Number(&two * &a), var.clone()]),
    Expr::Number(b.clone()),
  ]);
  let rest = Expr::Number(rest);
  let other = if delta.is_positive() {
    let root = pow(Expr::Number(delta), Expr::rational(1, 2));
    mul(vec![
      Expr::int(2),
      rest,
      pow(root.clone(), Expr::int(-1)),
      apply_function(Func::Atan, div(linear, root)),
    ])
  } else {
    // roots r1 > r2 real: log(x - r1) - log(x - r2) over a*(r1 - r2)
    let root = pow(Expr::Number(-delta), Expr::rational(1, 2));
    let two_a = Expr::Number(&two * &a);
    let r1 = div(sub(root.clone(), Expr::Number(b.clone())), two_a.clone());
    let r2 = div(neg(add(vec![root.clone(), Expr::Number(b)])), two_a);
    let logs = sub(
      apply_function(Func::Log, sub(var.clone(), r1)),
      apply_function(Func::Log, sub(var.clone(), r2)),
    );
    expand(&mul(vec![rest, pow(root, Expr::int(-1)), logs]))
  };
  add(vec![log_part, other])
}

// ─── Trigonometric powers ───────────────────────────────────────────

/// `sin(u)**n` and `cos(u)**n` by the reduction formula.
fn trig_power(f: &Expr, x: &str, depth: usize) -> Option<Expr> {
  let Expr::Power(base, exp) = f else {
    return None;
  };
  let Expr::Function(func @ (Func::Sin | Func::Cos), u) = base.as_ref() else {
    return None;
  };
  let n = exp.as_i64().filter(|n| *n >= 2)?;
  let a = linear_slope(u, x)?;
  let sin = apply_function(Func::Sin, (**u).clone());
  let cos = apply_function(Func::Cos, (**u).clone());
  let lower = pow((**base).clone(), Expr::int(n - 2));
  let head = if *func == Func::Sin {
    neg(mul(vec![pow(sin, Expr::int(n - 1)), cos]))
  } else {
    mul(vec![pow(cos, Expr::int(n - 1)), sin])
  };
  let rest = antiderivative(&lower, x, depth + 1)?;
  Some(add(vec![
    div(head, mul(vec![Expr::int(n), a])),
    mul(vec![Expr::rational(n - 1, n), rest]),
  ]))
}

// ─── Integration by parts ───────────────────────────────────────────

fn by_parts(f: &Expr, x: &str, depth: usize) -> Option<Expr> {
  let factors = match f {
    Expr::Times(items) => items.clone(),
    other => vec![other.clone()],
  };
  let (poly, rest): (Vec<Expr>, Vec<Expr>) = factors
    .into_iter()
    .partition(|g| coefficients(g, x).is_some());
  let [g] = rest.as_slice() else {
    return None;
  };
  let p = mul(poly);
  let inner = match g {
    Expr::Function(_, u) => u.as_ref(),
    Expr::Power(base, exp) if !base.contains_symbol(x) => exp.as_ref(),
    _ => return None,
  };
  match g {
    Expr::Function(Func::Log | Func::Atan | Func::Asinh | Func::Atanh, _) => {
      // Q*g - int(Q*g'), Q = int(P)
      let q = integrate_polynomial(&p, x)?;
      let remaining = mul(vec![q.clone(), differentiate(g, x)]);
      let rest = antiderivative(&remaining, x, depth + 1)?;
      trace!("by parts on an inverse function");
      Some(sub(mul(vec![q, g.clone()]), rest))
    }
    _ if p.contains_symbol(x) => {
      linear_slope(inner, x)?;
      let big_g = table(g, x, depth)?;
      // P*G - int(P'*G)
      let remaining = mul(vec![differentiate(&p, x), big_g.clone()]);
      let rest = antiderivative(&remaining, x, depth + 1)?;
      trace!("by parts on a polynomial factor");
      Some(sub(mul(vec![p, big_g]), rest))
    }
    _ => None,
  }
}

// ─── Substitution ───────────────────────────────────────────────────

fn substitution_candidates(expr: &Expr, x: &str, out: &mut Vec<Expr>) {
  let push = |e: &Expr, out: &mut Vec<Expr>| {
    if e.contains_symbol(x) && e.as_symbol() != Some(x) && !out.contains(e) {
      out.push(e.clone());
    }
  };
  match expr {
    Expr::Function(_, arg) => {
      push(expr, out);
      push(arg, out);
    }
    Expr::Power(base, exp) => {
      push(base, out);
      push(exp, out);
    }
    _ => {}
  }
  for child in expr.children() {
    substitution_candidates(child, x, out);
  }
}

/// `int(f(g(x))*g'(x)) = int(f(u))` with `u = g(x)`.
fn substitution(f: &Expr, x: &str, depth: usize) -> Option<Expr> {
  let mut candidates = Vec::new();
  substitution_candidates(f, x, &mut candidates);
  let u = Expr::symbol(SUBSTITUTION_SYMBOL);
  for g in candidates {
    let dg = differentiate(&g, x);
    if dg.is_zero() {
      continue;
    }
    let quotient = div(f.clone(), dg);
    let reduced = replace(&quotient, &g, &u);
    if reduced.contains_symbol(x) {
      continue;
    }
    let Some(result) = antiderivative(&reduced, SUBSTITUTION_SYMBOL, depth + 1)
    else {
      continue;
    };
    trace!(substitution = %g, "u-substitution");
    return Some(replace(&result, &u, &g));
  }
  None
}

fn expanded(f: &Expr, x: &str, depth: usize) -> Option<Expr> {
  let e = expand(f);
  if e == *f {
    return None;
  }
  antiderivative(&e, x, depth + 1)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_expression;

  fn p(s: &str) -> Expr {
    parse_expression(s).unwrap()
  }

  #[test]
  fn chain_rule() {
    assert_eq!(differentiate(&p("sin(x**2)"), "x"), p("2*x*cos(x**2)"));
  }

  #[test]
  fn product_rule() {
    assert_eq!(
      differentiate(&p("x*exp(x)"), "x"),
      p("x*exp(x) + exp(x)")
    );
  }

  #[test]
  fn higher_order() {
    assert_eq!(diff(&p("x**3"), "x", 2).unwrap(), p("6*x"));
    assert_eq!(diff(&p("x**3"), "x", 0).unwrap(), p("x**3"));
    assert!(diff(&p("x"), "x", -1).is_err());
  }

  #[test]
  fn undefined_functions_stay_unevaluated() {
    assert_eq!(
      differentiate(&p("f(x)"), "x"),
      Expr::call("Derivative", vec![p("f(x)"), p("x")])
    );
  }

  #[test]
  fn power_rule() {
    assert_eq!(integrate(&p("x**2"), "x"), p("x**3/3"));
    assert_eq!(integrate(&p("1/x"), "x"), p("log(x)"));
  }

  #[test]
  fn linear_arguments() {
    assert_eq!(integrate(&p("cos(2*x)"), "x"), p("sin(2*x)/2"));
    assert_eq!(integrate(&p("exp(3*x)"), "x"), p("exp(3*x)/3"));
  }

  #[test]
  fn rational_functions() {
    assert_eq!(integrate(&p("1/(x**2 + 1)"), "x"), p("atan(x)"));
    assert_eq!(
      integrate(&p("1/(x**2 - 1)"), "x"),
      p("log(x - 1)/2 - log(x + 1)/2")
    );
  }

  #[test]
  fn substitution_with_derivative_factor() {
    assert_eq!(integrate(&p("2*x*exp(x**2)"), "x"), p("exp(x**2)"));
    assert_eq!(integrate(&p("cos(x)/sin(x)"), "x"), p("log(sin(x))"));
  }

  #[test]
  fn parts_with_polynomial() {
    assert_eq!(integrate(&p("x*exp(x)"), "x"), p("x*exp(x) - exp(x)"));
    assert_eq!(integrate(&p("log(x)"), "x"), p("x*log(x) - x"));
  }

  #[test]
  fn definite_integrals() {
    let x = "x";
    assert_eq!(
      integrate_definite(&p("x"), x, &p("0"), &p("1")),
      Expr::rational(1, 2)
    );
    assert_eq!(
      integrate_definite(&p("exp(-x)"), x, &p("0"), &p("oo")),
      Expr::one()
    );
    assert_eq!(
      integrate_definite(&p("sin(x)"), x, &p("0"), &p("pi")),
      Expr::int(2)
    );
  }

  #[test]
  fn poles_inside_the_interval_diverge() {
    let x = "x";
    let nan = Expr::Constant(Constant::NaN);
    assert_eq!(
      integrate_definite(&p("1/x**2"), x, &p("-1"), &p("1")),
      Expr::infinity()
    );
    assert_eq!(integrate_definite(&p("1/x"), x, &p("-1"), &p("1")), nan);
    assert_eq!(
      integrate_definite(&p("1/x"), x, &p("0"), &p("1")),
      Expr::infinity()
    );
    assert_eq!(
      integrate_definite(&p("1/(x**2 + 1)"), x, &p("0"), &p("1")),
      p("pi/4")
    );
  }

  #[test]
  fn oscillating_bound_stays_unevaluated() {
    let limits = Expr::call("Tuple", vec![p("x"), p("0"), p("oo")]);
    assert_eq!(
      integrate_definite(&p("sin(x)"), "x", &p("0"), &p("oo")),
      Expr::call("Integral", vec![p("sin(x)"), limits])
    );
  }

  #[test]
  fn failure_is_unevaluated() {
    assert_eq!(
      integrate(&p("exp(x**2)"), "x"),
      Expr::call("Integral", vec![p("exp(x**2)"), p("x")])
    );
  }
}
