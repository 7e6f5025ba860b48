use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::syntax::{Constant, Expr, Func, Rational};

use super::{apply_function, as_base_exp, compare_factors, compare_terms};

/// Largest exponent evaluated exactly; beyond it powers stay symbolic.
const MAX_EXACT_EXPONENT: u64 = 10_000;

/// Trial division bound used when extracting perfect powers from radicands.
const TRIAL_DIVISION_LIMIT: u64 = 100_000;

// ─── Numbers ────────────────────────────────────────────────────────

fn to_f64(expr: &Expr) -> f64 {
  match expr {
    Expr::Number(r) => r.to_f64().unwrap_or(f64::NAN),
    Expr::Real(f) => *f,
    _ => f64::NAN,
  }
}

fn number_add(a: &Expr, b: &Expr) -> Expr {
  match (a, b) {
    (Expr::Number(x), Expr::Number(y)) => Expr::Number(x + y),
    _ => Expr::Real(to_f64(a) + to_f64(b)),
  }
}

fn number_mul(a: &Expr, b: &Expr) -> Expr {
  match (a, b) {
    (Expr::Number(x), Expr::Number(y)) => Expr::Number(x * y),
    _ => Expr::Real(to_f64(a) * to_f64(b)),
  }
}

fn is_exact_one(expr: &Expr) -> bool {
  matches!(expr, Expr::Number(r) if r.is_one())
}

fn nan() -> Expr {
  Expr::Constant(Constant::NaN)
}

fn complex_infinity() -> Expr {
  Expr::Constant(Constant::ComplexInfinity)
}

/// `Some(1)` for `oo`, `Some(-1)` for `-oo`.
pub fn infinity_sign(expr: &Expr) -> Option<i8> {
  match expr {
    Expr::Constant(Constant::Infinity) => Some(1),
    Expr::Times(factors) if factors.len() == 2 => {
      match (&factors[0], &factors[1]) {
        (c, Expr::Constant(Constant::Infinity)) if c.is_number() => {
          if c.is_negative_number() {
            Some(-1)
          } else {
            Some(1)
          }
        }
        _ => None,
      }
    }
    _ => None,
  }
}

/// Split a term into its numeric coefficient and the remaining body.
pub fn split_coefficient(term: Expr) -> (Expr, Expr) {
  match term {
    Expr::Number(_) | Expr::Real(_) => (term, Expr::one()),
    Expr::Times(mut factors)
      if factors.first().is_some_and(|f| f.is_number()) =>
    {
      let coeff = factors.remove(0);
      let body = if factors.len() == 1 {
        factors.remove(0)
      } else {
        Expr::Times(factors)
      };
      (coeff, body)
    }
    other => (Expr::one(), other),
  }
}

fn with_coefficient(coeff: Expr, body: Expr) -> Expr {
  if is_exact_one(&coeff) {
    return body;
  }
  if body.is_one() {
    return coeff;
  }
  match body {
    Expr::Times(mut factors) => {
      factors.insert(0, coeff);
      Expr::Times(factors)
    }
    other => Expr::Times(vec![coeff, other]),
  }
}

// ─── Sums ───────────────────────────────────────────────────────────

/// Canonical sum: flattens, folds numbers and collects like terms.
pub fn add(terms: Vec<Expr>) -> Expr {
  let mut flat = Vec::with_capacity(terms.len());
  for term in terms {
    match term {
      Expr::Plus(items) => flat.extend(items),
      other => flat.push(other),
    }
  }

  let mut numeric: Option<Expr> = None;
  let mut groups: Vec<(Expr, Expr)> = Vec::new();
  let mut positive_infinity = false;
  let mut negative_infinity = false;
  let mut complex_inf = false;

  for term in flat {
    match &term {
      Expr::Constant(Constant::NaN) => return nan(),
      Expr::Constant(Constant::ComplexInfinity) => {
        complex_inf = true;
        continue;
      }
      Expr::Number(_) | Expr::Real(_) => {
        numeric = Some(match numeric {
          Some(acc) => number_add(&acc, &term),
          None => term,
        });
        continue;
      }
      _ => {}
    }
    match infinity_sign(&term) {
      Some(1) => positive_infinity = true,
      Some(_) => negative_infinity = true,
      None => {
        let (coeff, body) = split_coefficient(term);
        match groups.iter_mut().find(|(_, b)| *b == body) {
          Some(entry) => entry.0 = number_add(&entry.0, &coeff),
          None => groups.push((coeff, body)),
        }
      }
    }
  }

  if complex_inf {
    return if positive_infinity || negative_infinity {
      nan()
    } else {
      complex_infinity()
    };
  }
  if positive_infinity && negative_infinity {
    return nan();
  }

  let mut out: Vec<Expr> = groups
    .into_iter()
    .filter(|(coeff, _)| !coeff.is_zero() || matches!(coeff, Expr::Real(_)))
    .map(|(coeff, body)| {
      if coeff.is_zero() {
        coeff
      } else {
        with_coefficient(coeff, body)
      }
    })
    .filter(|t| !matches!(t, Expr::Real(f) if *f == 0.0))
    .collect();

  if positive_infinity {
    out.push(Expr::infinity());
  } else if negative_infinity {
    out.push(Expr::Times(vec![Expr::int(-1), Expr::infinity()]));
  } else if let Some(n) = numeric {
    if !n.is_zero() {
      out.push(n);
    }
  }

  out.sort_by(compare_terms);
  // Purely numeric sums lead with the rational part: `-1 + sqrt(2)`
  if out.len() > 1
    && out.iter().all(|t| t.is_constant())
    && out.last().is_some_and(|t| t.is_number())
  {
    if let Some(number) = out.pop() {
      out.insert(0, number);
    }
  }

  match out.len() {
    0 => Expr::zero(),
    1 => out.remove(0),
    _ => Expr::Plus(out),
  }
}

pub fn sub(a: Expr, b: Expr) -> Expr {
  add(vec![a, neg(b)])
}

pub fn neg(a: Expr) -> Expr {
  mul(vec![Expr::int(-1), a])
}

// ─── Products ───────────────────────────────────────────────────────

/// Canonical product: flattens, folds numbers, adds exponents of equal
/// bases and distributes a numeric coefficient over a single sum.
pub fn mul(factors: Vec<Expr>) -> Expr {
  let mut pending = factors;
  // A regrouping pass is needed when a power evaluates to a product
  // (`I**3 = -I`, `8**(1/2) = 2*sqrt(2)`); this converges quickly.
  for _ in 0..4 {
    match mul_pass(pending) {
      Ok(done) => return done,
      Err(again) => pending = again,
    }
  }
  Expr::Times(pending)
}

fn mul_pass(factors: Vec<Expr>) -> Result<Expr, Vec<Expr>> {
  let mut flat = Vec::with_capacity(factors.len());
  for factor in factors {
    match factor {
      Expr::Times(items) => flat.extend(items),
      other => flat.push(other),
    }
  }

  let mut coeff = Expr::one();
  let mut bases: Vec<(Expr, Vec<Expr>)> = Vec::new();
  let mut exp_args: Vec<Expr> = Vec::new();
  let mut infinities = 0usize;
  let mut complex_inf = false;

  for factor in flat {
    match factor {
      Expr::Number(_) | Expr::Real(_) => coeff = number_mul(&coeff, &factor),
      Expr::Constant(Constant::NaN) => return Ok(nan()),
      Expr::Constant(Constant::Infinity) => infinities += 1,
      Expr::Constant(Constant::ComplexInfinity) => complex_inf = true,
      Expr::Function(Func::Exp, arg) => exp_args.push(*arg),
      other => {
        let (base, exp) = as_base_exp(&other);
        match bases.iter_mut().find(|(b, _)| *b == base) {
          Some(entry) => entry.1.push(exp),
          None => bases.push((base, vec![exp])),
        }
      }
    }
  }

  if coeff.is_zero() {
    return Ok(if infinities > 0 || complex_inf {
      nan()
    } else {
      coeff
    });
  }
  if complex_inf {
    return Ok(complex_infinity());
  }

  let mut regroup = false;
  let mut out: Vec<Expr> = Vec::new();
  let mut absorb = |value: Expr, coeff: &mut Expr, out: &mut Vec<Expr>| {
    match value {
      Expr::Number(_) | Expr::Real(_) => *coeff = number_mul(coeff, &value),
      Expr::Times(items) => {
        regroup = true;
        out.extend(items);
      }
      other => out.push(other),
    }
  };

  if !exp_args.is_empty() {
    let value = if exp_args.len() == 1 {
      Expr::Function(Func::Exp, Box::new(exp_args.remove(0)))
    } else {
      apply_function(Func::Exp, add(exp_args))
    };
    absorb(value, &mut coeff, &mut out);
  }

  let mut radicals: Vec<(Rational, Rational)> = Vec::new();
  for (base, exps) in bases {
    let value = if exps.len() == 1 {
      let exp = exps.into_iter().next().unwrap_or_else(Expr::one);
      // Positive rational radicals with equal exponents merge below
      if let (Expr::Number(b), Expr::Number(e)) = (&base, &exp) {
        if b.is_positive() && !e.is_integer() {
          radicals.push((b.clone(), e.clone()));
          continue;
        }
      }
      if exp.is_one() {
        base
      } else {
        Expr::Power(Box::new(base), Box::new(exp))
      }
    } else {
      pow(base, add(exps))
    };
    absorb(value, &mut coeff, &mut out);
  }

  // sqrt(2)*sqrt(3) = sqrt(6)
  radicals.sort_by(|a, b| a.1.cmp(&b.1));
  let mut i = 0;
  while i < radicals.len() {
    let exp = radicals[i].1.clone();
    let mut product = Rational::one();
    let mut count = 0;
    while i < radicals.len() && radicals[i].1 == exp {
      product *= radicals[i].0.clone();
      i += 1;
      count += 1;
    }
    let value = if count == 1 {
      Expr::Power(Box::new(Expr::Number(product)), Box::new(Expr::Number(exp)))
    } else {
      pow(Expr::Number(product), Expr::Number(exp))
    };
    absorb(value, &mut coeff, &mut out);
  }

  if regroup {
    let mut again = vec![coeff];
    again.extend(out);
    for _ in 0..infinities {
      again.push(Expr::infinity());
    }
    return Err(again);
  }

  if coeff.is_zero() {
    return Ok(coeff);
  }

  if infinities > 0 {
    let sign = if coeff.is_negative_number() { -1 } else { 1 };
    coeff = Expr::int(sign);
    out.push(Expr::infinity());
  }

  out.sort_by(compare_factors);

  if out.is_empty() {
    return Ok(coeff);
  }
  if is_exact_one(&coeff) {
    return Ok(if out.len() == 1 {
      out.remove(0)
    } else {
      Expr::Times(out)
    });
  }
  if out.len() == 1 {
    if let Expr::Plus(terms) = &out[0] {
      let distributed = terms
        .iter()
        .map(|t| mul(vec![coeff.clone(), t.clone()]))
        .collect();
      return Ok(add(distributed));
    }
  }
  out.insert(0, coeff);
  Ok(Expr::Times(out))
}

pub fn div(a: Expr, b: Expr) -> Expr {
  mul(vec![a, pow(b, Expr::int(-1))])
}

// ─── Powers ─────────────────────────────────────────────────────────

/// Canonical power with exact rational evaluation and radical extraction.
pub fn pow(base: Expr, exp: Expr) -> Expr {
  if matches!(base, Expr::Constant(Constant::NaN))
    || matches!(exp, Expr::Constant(Constant::NaN))
  {
    return nan();
  }
  if exp.is_zero() {
    return if matches!(exp, Expr::Real(_)) {
      Expr::Real(1.0)
    } else {
      Expr::one()
    };
  }
  if is_exact_one(&exp) {
    return base;
  }
  if is_exact_one(&base) {
    return if infinity_sign(&exp).is_some() {
      nan()
    } else {
      Expr::one()
    };
  }

  if let Some(sign) = infinity_sign(&exp) {
    if let Some(b) = numeric_f64(&base) {
      let grows = (b.abs() > 1.0) == (sign > 0);
      return match (grows, b > 0.0) {
        (false, _) => Expr::zero(),
        (true, true) => Expr::infinity(),
        (true, false) => complex_infinity(),
      };
    }
    if matches!(base, Expr::Constant(Constant::E)) {
      return apply_function(Func::Exp, exp);
    }
  }

  match (&base, &exp) {
    (Expr::Number(b), Expr::Number(e)) => rational_power(b, e),
    (Expr::Real(b), Expr::Number(e)) => real_power(*b, e),
    (Expr::Number(_) | Expr::Real(_), Expr::Real(e)) => {
      let b = to_f64(&base);
      if b >= 0.0 {
        Expr::Real(b.powf(*e))
      } else {
        Expr::Power(Box::new(base), Box::new(exp))
      }
    }
    (Expr::Constant(Constant::E), _) => apply_function(Func::Exp, exp),
    (Expr::Constant(Constant::I), Expr::Number(e)) if e.is_integer() => {
      imaginary_power(&e.to_integer())
    }
    (
      Expr::Constant(Constant::Infinity | Constant::ComplexInfinity),
      Expr::Number(_) | Expr::Real(_),
    ) => {
      if exp.is_negative_number() {
        Expr::zero()
      } else {
        base
      }
    }
    (Expr::Power(inner_base, inner_exp), _) => {
      let combine = match (inner_exp.as_ref(), &exp) {
        (_, Expr::Number(e)) if e.is_integer() => true,
        (Expr::Number(e1), Expr::Number(_)) => {
          e1 > &Rational::from_integer((-1).into()) && e1 <= &Rational::one()
        }
        _ => false,
      };
      if combine {
        pow(
          inner_base.as_ref().clone(),
          mul(vec![inner_exp.as_ref().clone(), exp]),
        )
      } else {
        Expr::Power(Box::new(base), Box::new(exp))
      }
    }
    (Expr::Times(factors), Expr::Number(e)) if e.is_integer() => {
      mul(factors.iter().map(|f| pow(f.clone(), exp.clone())).collect())
    }
    (Expr::Times(factors), Expr::Number(_))
      if factors.first().is_some_and(|f| {
        matches!(f, Expr::Number(c) if c.is_positive() && !c.is_one())
      }) =>
    {
      let mut rest = factors.clone();
      let coeff = rest.remove(0);
      let rest = if rest.len() == 1 {
        rest.remove(0)
      } else {
        Expr::Times(rest)
      };
      mul(vec![pow(coeff, exp.clone()), pow(rest, exp)])
    }
    (Expr::Function(Func::Exp, arg), Expr::Number(e)) if e.is_integer() => {
      apply_function(Func::Exp, mul(vec![arg.as_ref().clone(), exp.clone()]))
    }
    _ => Expr::Power(Box::new(base), Box::new(exp)),
  }
}

fn numeric_f64(expr: &Expr) -> Option<f64> {
  match expr {
    Expr::Number(_) | Expr::Real(_) => Some(to_f64(expr)),
    _ => None,
  }
}

fn imaginary_power(n: &BigInt) -> Expr {
  let r = n.mod_floor(&BigInt::from(4)).to_u8().unwrap_or(0);
  match r {
    0 => Expr::one(),
    1 => Expr::imaginary_unit(),
    2 => Expr::int(-1),
    _ => Expr::Times(vec![Expr::int(-1), Expr::imaginary_unit()]),
  }
}

fn real_power(base: f64, exp: &Rational) -> Expr {
  if exp.is_integer() {
    if let Some(n) = exp.to_integer().to_i32() {
      return Expr::Real(base.powi(n));
    }
  }
  let e = exp.to_f64().unwrap_or(f64::NAN);
  if base >= 0.0 {
    return Expr::Real(base.powf(e));
  }
  if exp.denom() == &BigInt::from(2) {
    let magnitude = Expr::Real((-base).powf(e));
    return mul(vec![magnitude, imaginary_power(exp.numer())]);
  }
  Expr::Power(Box::new(Expr::Real(base)), Box::new(Expr::Number(exp.clone())))
}

fn rational_power(base: &Rational, exp: &Rational) -> Expr {
  if base.is_zero() {
    return if exp.is_positive() {
      Expr::zero()
    } else {
      complex_infinity()
    };
  }
  if exp.is_integer() {
    let n = exp.to_integer();
    return match n.abs().to_u64() {
      Some(k) if k <= MAX_EXACT_EXPONENT => {
        let value = num_traits::pow::pow(base.clone(), k as usize);
        if n.is_negative() {
          Expr::Number(value.recip())
        } else {
          Expr::Number(value)
        }
      }
      _ => Expr::Power(
        Box::new(Expr::Number(base.clone())),
        Box::new(Expr::Number(exp.clone())),
      ),
    };
  }

  if base.is_negative() {
    let minus_one = Rational::from_integer((-1).into());
    if *base == minus_one {
      if exp.denom() == &BigInt::from(2) {
        return imaginary_power(exp.numer());
      }
      return Expr::Power(
        Box::new(Expr::Number(minus_one)),
        Box::new(Expr::Number(exp.clone())),
      );
    }
    return mul(vec![
      rational_power(&minus_one, exp),
      rational_power(&-base, exp),
    ]);
  }

  // base > 0: split off the integer part of the exponent
  let whole = exp.floor();
  let frac = exp - &whole;
  let mut factors = Vec::new();
  if !whole.is_zero() {
    factors.push(rational_power(base, &whole));
  }
  let numer = base.numer();
  let denom = base.denom();
  if denom.is_one() {
    factors.push(integer_root(numer, &frac));
  } else {
    // (n/d)**r = n**r * d**(1 - r) / d
    factors.push(integer_root(numer, &frac));
    factors.push(Expr::Number(Rational::new(BigInt::one(), denom.clone())));
    factors.push(integer_root(denom, &(Rational::one() - &frac)));
  }
  if factors.len() == 1 {
    factors.remove(0)
  } else {
    mul(factors)
  }
}

/// `n**r` for a positive integer `n` and `0 < r < 1`, pulling out perfect
/// powers: `12**(1/2) = 2*sqrt(3)`.
fn integer_root(n: &BigInt, r: &Rational) -> Expr {
  if n.is_one() || r.is_zero() {
    return Expr::one();
  }
  let s = r.numer().clone();
  let q = r.denom().clone();

  let mut outside = BigInt::one();
  // remaining exponent numerator (over q) → product of primes
  let mut inside: Vec<(BigInt, BigInt)> = Vec::new();
  for (prime, multiplicity) in factor_integer(n) {
    let total = BigInt::from(multiplicity) * &s;
    let (quot, rem) = total.div_rem(&q);
    if let Some(k) = quot.to_u32() {
      outside *= num_traits::pow::pow(prime.clone(), k as usize);
    }
    if !rem.is_zero() {
      match inside.iter_mut().find(|(e, _)| *e == rem) {
        Some(entry) => entry.1 *= &prime,
        None => inside.push((rem, prime)),
      }
    }
  }

  let mut factors = Vec::new();
  if !outside.is_one() {
    factors.push(Expr::Number(Rational::from_integer(outside)));
  }
  for (rem, product) in inside {
    factors.push(Expr::Power(
      Box::new(Expr::Number(Rational::from_integer(product))),
      Box::new(Expr::Number(Rational::new(rem, q.clone()))),
    ));
  }
  match factors.len() {
    0 => Expr::one(),
    1 => factors.remove(0),
    _ => {
      factors.sort_by(compare_factors);
      Expr::Times(factors)
    }
  }
}

/// Prime factorisation by trial division; an unfactored remainder is
/// reported as if it were prime.
pub fn factor_integer(n: &BigInt) -> Vec<(BigInt, u32)> {
  let mut out = Vec::new();
  let mut rest = n.abs();
  let mut p = BigInt::from(2);
  let limit = BigInt::from(TRIAL_DIVISION_LIMIT);
  while &p * &p <= rest && p <= limit {
    let mut count = 0;
    while (&rest % &p).is_zero() {
      rest /= &p;
      count += 1;
    }
    if count > 0 {
      out.push((p.clone(), count));
    }
    p += if p == BigInt::from(2) { 1 } else { 2 };
  }
  if rest > BigInt::one() {
    out.push((rest, 1));
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn x() -> Expr {
    Expr::symbol("x")
  }

  #[test]
  fn like_terms_are_collected() {
    let sum = add(vec![
      mul(vec![Expr::int(2), x()]),
      mul(vec![Expr::int(3), x()]),
      Expr::int(-5),
    ]);
    assert_eq!(
      sum,
      Expr::Plus(vec![Expr::Times(vec![Expr::int(5), x()]), Expr::int(-5)])
    );
  }

  #[test]
  fn equal_bases_combine() {
    let product = mul(vec![x(), pow(x(), Expr::int(2))]);
    assert_eq!(product, Expr::Power(Box::new(x()), Box::new(Expr::int(3))));
  }

  #[test]
  fn cancelling_terms_vanish() {
    assert_eq!(sub(x(), x()), Expr::zero());
  }

  #[test]
  fn square_roots_extract_perfect_squares() {
    let root = pow(Expr::int(8), Expr::rational(1, 2));
    assert_eq!(
      root,
      Expr::Times(vec![
        Expr::int(2),
        Expr::Power(Box::new(Expr::int(2)), Box::new(Expr::rational(1, 2)))
      ])
    );
    assert_eq!(pow(Expr::int(9), Expr::rational(1, 2)), Expr::int(3));
  }

  #[test]
  fn negative_radicands_give_imaginary_results() {
    let root = pow(Expr::int(-4), Expr::rational(1, 2));
    assert_eq!(
      root,
      Expr::Times(vec![Expr::int(2), Expr::imaginary_unit()])
    );
  }

  #[test]
  fn imaginary_unit_squares_to_minus_one() {
    let i = Expr::imaginary_unit();
    assert_eq!(mul(vec![i.clone(), i]), Expr::int(-1));
  }

  #[test]
  fn coefficient_distributes_over_single_sum() {
    let sum = add(vec![x(), Expr::one()]);
    let product = mul(vec![Expr::int(2), sum]);
    assert_eq!(
      product,
      Expr::Plus(vec![Expr::Times(vec![Expr::int(2), x()]), Expr::int(2)])
    );
  }

  #[test]
  fn infinity_absorbs_finite_terms() {
    assert_eq!(add(vec![Expr::infinity(), Expr::int(3)]), Expr::infinity());
    assert_eq!(
      pow(Expr::infinity(), Expr::int(-1)),
      Expr::zero(),
    );
  }

  #[test]
  fn factor_integer_finds_multiplicities() {
    let factors = factor_integer(&BigInt::from(360));
    let expected: Vec<(BigInt, u32)> =
      vec![(2.into(), 3), (3.into(), 2), (5.into(), 1)];
    assert_eq!(factors, expected);
  }
}
