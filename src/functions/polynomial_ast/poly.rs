use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::evaluator::{
  add, compare_exprs, factor_integer, mul, pow, split_coefficient,
};
use crate::syntax::{Expr, Rational};

use super::expand;

/// Upper bound on candidate factors tried by Kronecker's method.
const MAX_KRONECKER_CANDIDATES: usize = 50_000;

/// Largest number whose divisors are enumerated for root and factor search.
const MAX_DIVISOR_COUNT: usize = 4_096;

// ─── Univariate ─────────────────────────────────────────────────────

/// Dense univariate polynomial over ℚ; `coeffs[i]` multiplies `x**i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly {
  coeffs: Vec<Rational>,
}

fn rat(n: i64) -> Rational {
  Rational::from_integer(BigInt::from(n))
}

impl Poly {
  pub fn new(mut coeffs: Vec<Rational>) -> Self {
    while coeffs.last().is_some_and(|c| c.is_zero()) {
      coeffs.pop();
    }
    Poly { coeffs }
  }

  pub fn from_ints(coeffs: &[i64]) -> Self {
    Poly::new(coeffs.iter().map(|&c| rat(c)).collect())
  }

  pub fn zero() -> Self {
    Poly { coeffs: Vec::new() }
  }

  pub fn constant(c: Rational) -> Self {
    Poly::new(vec![c])
  }

  pub fn monomial(c: Rational, n: usize) -> Self {
    let mut coeffs = vec![Rational::zero(); n + 1];
    coeffs[n] = c;
    Poly::new(coeffs)
  }

  pub fn is_zero(&self) -> bool {
    self.coeffs.is_empty()
  }

  /// Degree; the zero polynomial reports 0.
  pub fn degree(&self) -> usize {
    self.coeffs.len().saturating_sub(1)
  }

  pub fn coeffs(&self) -> &[Rational] {
    &self.coeffs
  }

  pub fn coeff(&self, i: usize) -> Rational {
    self.coeffs.get(i).cloned().unwrap_or_else(Rational::zero)
  }

  pub fn leading(&self) -> Rational {
    self.coeffs.last().cloned().unwrap_or_else(Rational::zero)
  }

  pub fn add(&self, other: &Poly) -> Poly {
    let n = self.coeffs.len().max(other.coeffs.len());
    Poly::new((0..n).map(|i| self.coeff(i) + other.coeff(i)).collect())
  }

  pub fn sub(&self, other: &Poly) -> Poly {
    let n = self.coeffs.len().max(other.coeffs.len());
    Poly::new((0..n).map(|i| self.coeff(i) - other.coeff(i)).collect())
  }

  pub fn mul(&self, other: &Poly) -> Poly {
    if self.is_zero() || other.is_zero() {
      return Poly::zero();
    }
    let len = self.coeffs.len() + other.coeffs.len() - 1;
    let mut out = vec![Rational::zero(); len];
    for (i, a) in self.coeffs.iter().enumerate() {
      if a.is_zero() {
        continue;
      }
      for (j, b) in other.coeffs.iter().enumerate() {
        out[i + j] += a * b;
      }
    }
    Poly::new(out)
  }

  pub fn scale(&self, c: &Rational) -> Poly {
    Poly::new(self.coeffs.iter().map(|a| a * c).collect())
  }

  pub fn pow(&self, n: usize) -> Poly {
    (0..n).fold(Poly::constant(Rational::one()), |acc, _| acc.mul(self))
  }

  /// Euclidean division; `None` when dividing by zero.
  pub fn divrem(&self, divisor: &Poly) -> Option<(Poly, Poly)> {
    if divisor.is_zero() {
      return None;
    }
    let mut rem = self.coeffs.clone();
    let dd = divisor.degree();
    let lead = divisor.leading();
    if rem.len() <= dd {
      return Some((Poly::zero(), self.clone()));
    }
    let mut quot = vec![Rational::zero(); rem.len() - dd];
    for k in (0..quot.len()).rev() {
      let c = &rem[k + dd] / &lead;
      if c.is_zero() {
        continue;
      }
      for (j, d) in divisor.coeffs.iter().enumerate() {
        rem[k + j] -= &c * d;
      }
      quot[k] = c;
    }
    Some((Poly::new(quot), Poly::new(rem)))
  }

  pub fn exact_div(&self, divisor: &Poly) -> Option<Poly> {
    let (q, r) = self.divrem(divisor)?;
    r.is_zero().then_some(q)
  }

  pub fn monic(&self) -> Poly {
    if self.is_zero() {
      return Poly::zero();
    }
    self.scale(&self.leading().recip())
  }

  /// Monic greatest common divisor.
  pub fn gcd(&self, other: &Poly) -> Poly {
    let mut a = self.clone();
    let mut b = other.clone();
    while !b.is_zero() {
      let r = match a.divrem(&b) {
        Some((_, r)) => r,
        None => break,
      };
      a = b;
      b = r;
    }
    a.monic()
  }

  pub fn derivative(&self) -> Poly {
    Poly::new(
      self
        .coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, c)| c * rat(i as i64))
        .collect(),
    )
  }

  pub fn eval(&self, x: &Rational) -> Rational {
    self
      .coeffs
      .iter()
      .rev()
      .fold(Rational::zero(), |acc, c| acc * x + c)
  }

  /// Split into a rational content and a primitive integer polynomial with
  /// positive leading coefficient.
  pub fn primitive(&self) -> (Rational, Poly) {
    if self.is_zero() {
      return (Rational::zero(), Poly::zero());
    }
    let mut content = rational_content(self.coeffs.iter());
    if self.leading().is_negative() {
      content = -content;
    }
    (content.clone(), self.scale(&content.recip()))
  }

  fn integer_coeffs(&self) -> Vec<BigInt> {
    self.coeffs.iter().map(|c| c.to_integer()).collect()
  }

  /// Yun's square-free decomposition of the monic part.
  pub fn square_free(&self) -> Vec<(Poly, usize)> {
    let f = self.monic();
    if f.degree() == 0 {
      return Vec::new();
    }
    let df = f.derivative();
    let a0 = f.gcd(&df);
    let mut b = f.exact_div(&a0).unwrap_or_else(|| f.clone());
    let c = df.exact_div(&a0).unwrap_or_else(|| df.clone());
    let mut d = c.sub(&b.derivative());
    let mut out = Vec::new();
    let mut i = 1;
    while b.degree() > 0 {
      let a = b.gcd(&d);
      let next_b = b.exact_div(&a).unwrap_or_else(|| b.clone());
      let next_c = d.exact_div(&a).unwrap_or_else(|| d.clone());
      if a.degree() > 0 {
        out.push((a, i));
      }
      d = next_c.sub(&next_b.derivative());
      b = next_b;
      i += 1;
    }
    out
  }

  /// Distinct rational roots, ascending.
  pub fn rational_roots(&self) -> Vec<Rational> {
    let mut roots = Vec::new();
    if self.degree() == 0 {
      return roots;
    }
    let (_, mut p) = self.primitive();
    if p.coeff(0).is_zero() {
      roots.push(Rational::zero());
      let shift = p.coeffs.iter().take_while(|c| c.is_zero()).count();
      p = Poly::new(p.coeffs[shift..].to_vec());
    }
    if p.degree() == 0 {
      return roots;
    }
    let ints = p.integer_coeffs();
    let (Some(numers), Some(denoms)) = (
      divisors(&ints[0]),
      divisors(&ints[ints.len() - 1]),
    ) else {
      return roots;
    };
    for n in &numers {
      for d in &denoms {
        for sign in [1, -1] {
          let candidate = Rational::new(n * BigInt::from(sign), d.clone());
          if !roots.contains(&candidate) && p.eval(&candidate).is_zero() {
            roots.push(candidate);
          }
        }
      }
    }
    roots.sort();
    roots
  }

  /// Factor over ℤ: a rational content and irreducible primitive factors
  /// with multiplicities.
  pub fn factor(&self) -> (Rational, Vec<(Poly, usize)>) {
    let (content, p) = self.primitive();
    if p.degree() == 0 {
      return (content * p.coeff(0), Vec::new());
    }
    let mut factors: Vec<(Poly, usize)> = Vec::new();
    let shift = p.coeffs.iter().take_while(|c| c.is_zero()).count();
    if shift > 0 {
      factors.push((Poly::from_ints(&[0, 1]), shift));
    }
    let p = Poly::new(p.coeffs[shift..].to_vec());
    for (part, multiplicity) in p.square_free() {
      let (_, part) = part.primitive();
      for factor in irreducible_factors(&part) {
        factors.push((factor, multiplicity));
      }
    }
    factors.sort_by(|a, b| {
      a.0
        .degree()
        .cmp(&b.0.degree())
        .then_with(|| a.0.coeffs.cmp(&b.0.coeffs))
    });
    (content, factors)
  }

  pub fn to_expr(&self, x: &Expr) -> Expr {
    add(
      self
        .coeffs
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_zero())
        .map(|(i, c)| {
          mul(vec![Expr::Number(c.clone()), pow(x.clone(), Expr::int(i as i64))])
        })
        .collect(),
    )
  }

  /// Coefficients of `expr` as a polynomial in `var`, if it is one with
  /// rational coefficients.
  pub fn from_expr(expr: &Expr, var: &Expr) -> Option<Poly> {
    let gens = vec![var.clone()];
    let mp = MPoly::from_expr(expr, &gens)?;
    Some(mp.to_univariate())
  }
}

fn rational_content<'a>(coeffs: impl Iterator<Item = &'a Rational>) -> Rational {
  let mut numer = BigInt::zero();
  let mut denom = BigInt::one();
  for c in coeffs {
    numer = numer.gcd(c.numer());
    denom = denom.lcm(c.denom());
  }
  if numer.is_zero() {
    return Rational::one();
  }
  Rational::new(numer, denom)
}

/// Positive divisors of `n`; `None` when there are too many to try.
fn divisors(n: &BigInt) -> Option<Vec<BigInt>> {
  let n = n.abs();
  if n.is_zero() {
    return Some(vec![BigInt::one()]);
  }
  let mut out = vec![BigInt::one()];
  for (prime, multiplicity) in factor_integer(&n) {
    let mut next = Vec::with_capacity(out.len() * (multiplicity as usize + 1));
    for d in &out {
      let mut power = BigInt::one();
      for _ in 0..=multiplicity {
        next.push(d * &power);
        power *= &prime;
      }
    }
    out = next;
    if out.len() > MAX_DIVISOR_COUNT {
      return None;
    }
  }
  out.sort();
  Some(out)
}

/// Irreducible factors of a primitive square-free integer polynomial:
/// rational roots first, then Kronecker's search for higher degrees.
fn irreducible_factors(p: &Poly) -> Vec<Poly> {
  let mut out = Vec::new();
  let mut rest = p.clone();
  for root in p.rational_roots() {
    let linear = Poly::new(vec![
      Rational::from_integer(-root.numer().clone()),
      Rational::from_integer(root.denom().clone()),
    ]);
    if let Some(q) = rest.exact_div(&linear) {
      rest = q;
      out.push(linear);
    }
  }
  let mut d = 2;
  while 2 * d <= rest.degree() {
    match kronecker_factor(&rest, d) {
      Some(factor) => {
        if let Some(q) = rest.exact_div(&factor) {
          rest = q;
          out.push(factor);
          continue;
        }
        d += 1;
      }
      None => d += 1,
    }
  }
  if rest.degree() > 0 {
    out.push(rest.primitive().1);
  }
  out
}

fn lagrange_basis(points: &[BigInt]) -> Vec<Poly> {
  points
    .iter()
    .enumerate()
    .map(|(i, ai)| {
      let mut basis = Poly::constant(Rational::one());
      for (j, aj) in points.iter().enumerate() {
        if i == j {
          continue;
        }
        let denom = Rational::from_integer(ai - aj);
        let factor = Poly::new(vec![
          Rational::from_integer(-aj.clone()) / &denom,
          denom.recip(),
        ]);
        basis = basis.mul(&factor);
      }
      basis
    })
    .collect()
}

/// A factor of degree `d` by interpolation through divisors of values.
fn kronecker_factor(p: &Poly, d: usize) -> Option<Poly> {
  let mut points = Vec::with_capacity(d + 1);
  let mut choices: Vec<Vec<BigInt>> = Vec::with_capacity(d + 1);
  let mut k: i64 = 0;
  while points.len() < d + 1 {
    let a = BigInt::from(if k % 2 == 0 { k / 2 } else { -(k + 1) / 2 });
    k += 1;
    let value = p.eval(&Rational::from_integer(a.clone()));
    if value.is_zero() {
      continue;
    }
    let positive = divisors(&value.to_integer())?;
    let options = if points.is_empty() {
      positive
    } else {
      positive.iter().flat_map(|v| [v.clone(), -v.clone()]).collect()
    };
    points.push(a);
    choices.push(options);
  }

  let total = choices
    .iter()
    .try_fold(1usize, |acc, c| acc.checked_mul(c.len()))?;
  if total > MAX_KRONECKER_CANDIDATES {
    return None;
  }
  let basis = lagrange_basis(&points);
  let mut index = vec![0usize; choices.len()];
  for _ in 0..total {
    let candidate = basis
      .iter()
      .zip(index.iter().zip(choices.iter()))
      .fold(Poly::zero(), |acc, (b, (&i, c))| {
        acc.add(&b.scale(&Rational::from_integer(c[i].clone())))
      });
    if candidate.degree() == d
      && candidate.coeffs.iter().all(|c| c.is_integer())
      && p.exact_div(&candidate).is_some()
    {
      return Some(candidate.primitive().1);
    }
    for (slot, options) in index.iter_mut().zip(choices.iter()) {
      *slot += 1;
      if *slot < options.len() {
        break;
      }
      *slot = 0;
    }
  }
  None
}

// ─── Multivariate ───────────────────────────────────────────────────

/// Sparse polynomial over ℚ in `nvars` generators, keyed by exponent
/// vectors in lexicographic order.
#[derive(Debug, Clone, PartialEq)]
pub struct MPoly {
  nvars: usize,
  terms: BTreeMap<Vec<u32>, Rational>,
}

impl MPoly {
  pub fn zero(nvars: usize) -> Self {
    MPoly {
      nvars,
      terms: BTreeMap::new(),
    }
  }

  pub fn is_zero(&self) -> bool {
    self.terms.is_empty()
  }

  pub fn nvars(&self) -> usize {
    self.nvars
  }

  fn add_term(&mut self, exps: Vec<u32>, c: Rational) {
    let entry = self.terms.entry(exps).or_insert_with(Rational::zero);
    *entry += c;
    if entry.is_zero() {
      self.terms.retain(|_, v| !v.is_zero());
    }
  }

  pub fn sub(&self, other: &MPoly) -> MPoly {
    let mut out = self.clone();
    for (e, c) in &other.terms {
      out.add_term(e.clone(), -c.clone());
    }
    out
  }

  pub fn mul(&self, other: &MPoly) -> MPoly {
    let mut out = MPoly::zero(self.nvars);
    for (ea, ca) in &self.terms {
      for (eb, cb) in &other.terms {
        let e = ea.iter().zip(eb).map(|(a, b)| a + b).collect();
        out.add_term(e, ca * cb);
      }
    }
    out
  }

  fn leading(&self) -> Option<(&Vec<u32>, &Rational)> {
    self.terms.iter().next_back()
  }

  /// Exact quotient, or `None` when `divisor` does not divide `self`.
  pub fn exact_div(&self, divisor: &MPoly) -> Option<MPoly> {
    let (lead_e, lead_c) = divisor.leading()?;
    let mut rem = self.clone();
    let mut quot = MPoly::zero(self.nvars);
    while let Some((e, c)) = rem.leading() {
      if e.iter().zip(lead_e).any(|(a, b)| a < b) {
        return None;
      }
      let qe: Vec<u32> = e.iter().zip(lead_e).map(|(a, b)| a - b).collect();
      let qc = c / lead_c;
      let mut term = MPoly::zero(self.nvars);
      term.add_term(qe.clone(), qc.clone());
      rem = rem.sub(&divisor.mul(&term));
      quot.add_term(qe, qc);
    }
    Some(quot)
  }

  pub fn degree_in(&self, var: usize) -> u32 {
    self.terms.keys().map(|e| e[var]).max().unwrap_or(0)
  }

  /// Largest monomial dividing every term.
  pub fn monomial_content(&self) -> Vec<u32> {
    (0..self.nvars)
      .map(|v| self.terms.keys().map(|e| e[v]).min().unwrap_or(0))
      .collect()
  }

  pub fn divide_monomial(&self, exps: &[u32]) -> MPoly {
    let mut out = MPoly::zero(self.nvars);
    for (e, c) in &self.terms {
      let ne = e.iter().zip(exps).map(|(a, b)| a - b).collect();
      out.add_term(ne, c.clone());
    }
    out
  }

  /// Rational content, signed so the remaining leading coefficient is
  /// positive, and the primitive integer part.
  pub fn primitive(&self) -> (Rational, MPoly) {
    let mut content = rational_content(self.terms.values());
    if self.leading().is_some_and(|(_, c)| c.is_negative()) {
      content = -content;
    }
    let inv = content.recip();
    let mut out = MPoly::zero(self.nvars);
    for (e, c) in &self.terms {
      out.add_term(e.clone(), c * &inv);
    }
    (content, out)
  }

  pub fn to_univariate(&self) -> Poly {
    self.to_univariate_in(0)
  }

  /// Coefficients along one generator; the others must not occur.
  pub fn to_univariate_in(&self, var: usize) -> Poly {
    let degree = self.degree_in(var) as usize;
    let mut coeffs = vec![Rational::zero(); degree + 1];
    for (e, c) in &self.terms {
      coeffs[e[var] as usize] += c;
    }
    Poly::new(coeffs)
  }

  /// Indices of the generators that actually occur.
  pub fn used_vars(&self) -> Vec<usize> {
    (0..self.nvars).filter(|&v| self.degree_in(v) > 0).collect()
  }

  /// The constant term when no generator occurs.
  pub fn as_constant(&self) -> Option<Rational> {
    if !self.used_vars().is_empty() {
      return None;
    }
    Some(self.terms.values().next().cloned().unwrap_or_else(Rational::zero))
  }

  /// Kronecker substitution `x_i -> t**(base**i)`.
  fn kronecker(&self, base: u32) -> Poly {
    let mut coeffs: Vec<Rational> = Vec::new();
    for (e, c) in &self.terms {
      let mut k = 0usize;
      let mut scale = 1usize;
      for &ei in e {
        k += ei as usize * scale;
        scale *= base as usize;
      }
      if coeffs.len() <= k {
        coeffs.resize(k + 1, Rational::zero());
      }
      coeffs[k] += c;
    }
    Poly::new(coeffs)
  }

  fn from_kronecker(p: &Poly, nvars: usize, base: u32) -> MPoly {
    let mut out = MPoly::zero(nvars);
    for (k, c) in p.coeffs().iter().enumerate() {
      if c.is_zero() {
        continue;
      }
      let mut rest = k;
      let exps = (0..nvars)
        .map(|_| {
          let e = rest % base as usize;
          rest /= base as usize;
          e as u32
        })
        .collect();
      out.add_term(exps, c.clone());
    }
    out
  }

  pub fn from_expr(expr: &Expr, gens: &[Expr]) -> Option<MPoly> {
    let expanded = expand(expr);
    let terms = match expanded {
      Expr::Plus(items) => items,
      other => vec![other],
    };
    let mut out = MPoly::zero(gens.len());
    for term in terms {
      let (coeff, body) = split_coefficient(term);
      let Expr::Number(c) = coeff else {
        return None;
      };
      let factors = match body {
        Expr::Times(items) => items,
        other => vec![other],
      };
      let mut exps = vec![0u32; gens.len()];
      for factor in factors {
        if factor.is_one() {
          continue;
        }
        let (base, n) = match &factor {
          Expr::Power(b, e) => match e.as_i64() {
            Some(n) if n > 0 && gens.contains(b) => (b.as_ref().clone(), n),
            _ => (factor.clone(), 1),
          },
          _ => (factor.clone(), 1),
        };
        let i = gens.iter().position(|g| *g == base)?;
        exps[i] += u32::try_from(n).ok()?;
      }
      out.add_term(exps, c);
    }
    Some(out)
  }

  pub fn to_expr(&self, gens: &[Expr]) -> Expr {
    add(
      self
        .terms
        .iter()
        .map(|(e, c)| {
          let mut factors = vec![Expr::Number(c.clone())];
          for (g, &k) in gens.iter().zip(e) {
            if k > 0 {
              factors.push(pow(g.clone(), Expr::int(k as i64)));
            }
          }
          mul(factors)
        })
        .collect(),
    )
  }
}

/// Polynomial generators of `expr`: the non-numeric bases of its monomials.
/// `None` when a generator occurs with a negative integer power.
pub fn generators(expr: &Expr) -> Option<Vec<Expr>> {
  let expanded = expand(expr);
  let terms = match &expanded {
    Expr::Plus(items) => items.clone(),
    other => vec![other.clone()],
  };
  let mut gens: Vec<Expr> = Vec::new();
  for term in terms {
    let (coeff, body) = split_coefficient(term);
    if matches!(coeff, Expr::Real(_)) {
      return None;
    }
    let factors = match body {
      Expr::Times(items) => items,
      other => vec![other],
    };
    for factor in factors {
      let gen = match &factor {
        Expr::Number(_) => continue,
        Expr::Real(_) => return None,
        Expr::Power(b, e) => match e.as_rational() {
          Some(r) if r.is_integer() && r.is_positive() => b.as_ref().clone(),
          Some(r) if r.is_integer() => return None,
          _ => factor.clone(),
        },
        _ => factor.clone(),
      };
      if !gens.contains(&gen) {
        gens.push(gen);
      }
    }
  }
  gens.sort_by(compare_exprs);
  Some(gens)
}

/// Factor a multivariate polynomial without monomial content by Kronecker
/// substitution into one variable. Returns a rational unit and primitive
/// irreducible factors (with repetition).
pub fn factor_multivariate(p: &MPoly) -> Option<(Rational, Vec<MPoly>)> {
  let nvars = p.nvars();
  let base = (0..nvars).map(|v| p.degree_in(v)).max().unwrap_or(0) + 1;
  let image_degree = (base as u64).checked_pow(nvars as u32)?;
  if image_degree > 64 {
    return None;
  }
  let (_, image_factors) = p.kronecker(base).factor();
  let mut pieces: Vec<Poly> = Vec::new();
  for (f, m) in image_factors {
    pieces.extend(std::iter::repeat(f).take(m));
  }
  if pieces.len() > 14 {
    return None;
  }

  let mut unit = Rational::one();
  let mut found = Vec::new();
  let mut rest = p.clone();
  'search: loop {
    let n = pieces.len();
    for size in 1..=n / 2 {
      for subset in subsets(n, size) {
        let product = subset
          .iter()
          .fold(Poly::constant(Rational::one()), |acc, &i| acc.mul(&pieces[i]));
        let candidate = MPoly::from_kronecker(&product, nvars, base);
        if let Some(q) = rest.exact_div(&candidate) {
          let (k, candidate) = candidate.primitive();
          unit *= k;
          found.push(candidate);
          rest = q;
          pieces = pieces
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !subset.contains(i))
            .map(|(_, piece)| piece)
            .collect();
          continue 'search;
        }
      }
    }
    break;
  }
  if rest.terms.keys().any(|e| e.iter().any(|&k| k > 0)) {
    let (k, rest) = rest.primitive();
    unit *= k;
    found.push(rest);
  } else if let Some((_, c)) = rest.leading() {
    unit *= c.clone();
  }
  Some((unit, found))
}

fn subsets(n: usize, size: usize) -> Vec<Vec<usize>> {
  fn go(
    start: usize,
    n: usize,
    size: usize,
    cur: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
  ) {
    if cur.len() == size {
      out.push(cur.clone());
      return;
    }
    for i in start..n {
      cur.push(i);
      go(i + 1, n, size, cur, out);
      cur.pop();
    }
  }
  let mut out = Vec::new();
  go(0, n, size, &mut Vec::new(), &mut out);
  out
}

/// Coefficients of `expr` in powers of `var`, lowest first; coefficients may
/// contain other symbols. `None` if `expr` is not polynomial in `var`.
pub fn coefficients(expr: &Expr, var: &str) -> Option<Vec<Expr>> {
  let expanded = expand(expr);
  let terms = match expanded {
    Expr::Plus(items) => items,
    other => vec![other],
  };
  let mut coeffs: Vec<Vec<Expr>> = Vec::new();
  for term in terms {
    let factors = match term {
      Expr::Times(items) => items,
      other => vec![other],
    };
    let mut degree = 0usize;
    let mut rest = Vec::new();
    for factor in factors {
      match &factor {
        Expr::Identifier(name) if name == var => degree += 1,
        Expr::Power(b, e) if b.as_symbol() == Some(var) => {
          let n = e.as_i64().filter(|n| *n > 0)?;
          degree += n.to_usize()?;
        }
        other if other.contains_symbol(var) => return None,
        _ => rest.push(factor),
      }
    }
    if coeffs.len() <= degree {
      coeffs.resize(degree + 1, Vec::new());
    }
    coeffs[degree].push(mul(rest));
  }
  Some(coeffs.into_iter().map(add).collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_expression;

  #[test]
  fn division_with_remainder() {
    let p = Poly::from_ints(&[-1, 0, 1]);
    let d = Poly::from_ints(&[-1, 1]);
    let (q, r) = p.divrem(&d).unwrap();
    assert_eq!(q, Poly::from_ints(&[1, 1]));
    assert!(r.is_zero());
  }

  #[test]
  fn gcd_is_monic() {
    let a = Poly::from_ints(&[-2, 0, 2]);
    let b = Poly::from_ints(&[2, 2]);
    assert_eq!(a.gcd(&b), Poly::from_ints(&[1, 1]));
  }

  #[test]
  fn square_free_decomposition() {
    // (x + 1)**2 * (x - 2)
    let p = Poly::from_ints(&[-2, -3, 0, 1]);
    let parts = p.square_free();
    assert_eq!(
      parts,
      vec![(Poly::from_ints(&[-2, 1]), 1), (Poly::from_ints(&[1, 1]), 2)]
    );
  }

  #[test]
  fn rational_roots_are_found() {
    // 2x**2 - x - 1 = (2x + 1)(x - 1)
    let p = Poly::from_ints(&[-1, -1, 2]);
    assert_eq!(p.rational_roots(), vec![Rational::new((-1).into(), 2.into()), rat(1)]);
  }

  #[test]
  fn kronecker_finds_quadratic_factors() {
    // x**4 + 4 = (x**2 - 2x + 2)(x**2 + 2x + 2)
    let (_, factors) = Poly::from_ints(&[4, 0, 0, 0, 1]).factor();
    let polys: Vec<Poly> = factors.into_iter().map(|(f, _)| f).collect();
    assert_eq!(
      polys,
      vec![Poly::from_ints(&[2, -2, 1]), Poly::from_ints(&[2, 2, 1])]
    );
  }

  #[test]
  fn symbolic_coefficients() {
    let expr = parse_expression("a*x**2 + b*x + c").unwrap();
    let coeffs = coefficients(&expr, "x").unwrap();
    assert_eq!(
      coeffs,
      vec![Expr::symbol("c"), Expr::symbol("b"), Expr::symbol("a")]
    );
  }

  #[test]
  fn multivariate_difference_of_squares() {
    let expr = parse_expression("x**2 - y**2").unwrap();
    let gens = generators(&expr).unwrap();
    let p = MPoly::from_expr(&expr, &gens).unwrap();
    let (unit, factors) = factor_multivariate(&p).unwrap();
    assert_eq!(unit, rat(1));
    assert_eq!(factors.len(), 2);
  }
}
