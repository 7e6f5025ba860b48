//! Rendering of expressions and solution sets in the three output
//! notations.

mod latex;
mod text;

pub use latex::*;
pub use text::*;

use num_bigint::BigInt;
use num_traits::{One, Signed};
use serde::Deserialize;

use crate::functions::polynomial_ast::SolutionSet;
use crate::syntax::{Expr, Rational};

/// Significant digits of printed floats unless configured otherwise.
pub const DEFAULT_DIGITS: usize = 15;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Deserialize,
  clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
  #[default]
  Ascii,
  Unicode,
  Latex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
  pub notation: Notation,
  pub digits: usize,
}

impl Default for FormatOptions {
  fn default() -> Self {
    FormatOptions {
      notation: Notation::Ascii,
      digits: DEFAULT_DIGITS,
    }
  }
}

/// Anything the CLI prints.
pub trait Render {
  fn render(&self, options: &FormatOptions) -> String;
}

impl Render for Expr {
  fn render(&self, options: &FormatOptions) -> String {
    match options.notation {
      Notation::Ascii => TextPrinter::ascii(options.digits).expr(self),
      Notation::Unicode => TextPrinter::unicode(options.digits).expr(self),
      Notation::Latex => LatexPrinter::new(options.digits).expr(self),
    }
  }
}

impl Render for SolutionSet {
  fn render(&self, options: &FormatOptions) -> String {
    match options.notation {
      Notation::Ascii => TextPrinter::ascii(options.digits).set(self),
      Notation::Unicode => TextPrinter::unicode(options.digits).set(self),
      Notation::Latex => LatexPrinter::new(options.digits).set(self),
    }
  }
}

/// ASCII rendering with default digits; used by `Display` for `Expr`.
pub fn to_ascii(expr: &Expr) -> String {
  TextPrinter::ascii(DEFAULT_DIGITS).expr(expr)
}

// ─── Shared helpers ─────────────────────────────────────────────────

/// Binding strength of the printed form; higher binds tighter.
pub(crate) const PREC_ADD: u8 = 40;
pub(crate) const PREC_MUL: u8 = 50;
pub(crate) const PREC_POW: u8 = 60;
pub(crate) const PREC_ATOM: u8 = 100;

pub(crate) fn precedence(expr: &Expr) -> u8 {
  match expr {
    Expr::Plus(_) => PREC_ADD,
    e if e.has_negative_sign() => PREC_ADD,
    Expr::Number(r) if !r.is_integer() => PREC_MUL,
    Expr::Times(_) => PREC_MUL,
    Expr::Power(_, exp) if exp.is_negative_number() => PREC_MUL,
    Expr::Power(..) => PREC_POW,
    _ => PREC_ATOM,
  }
}

/// Terms in printed order: a positive constant moves ahead of a single
/// negative term, so `-x + 1` prints as `1 - x`.
pub(crate) fn printed_terms(terms: &[Expr]) -> Vec<&Expr> {
  let positive_constant = |e: &Expr| match e {
    Expr::Number(r) => r.is_positive(),
    Expr::Real(f) => *f > 0.0,
    _ => false,
  };
  match terms {
    [lead, constant] if split_sign(lead).0 && positive_constant(constant) => {
      vec![constant, lead]
    }
    _ => terms.iter().collect(),
  }
}

/// Sign and magnitude of a term, without re-canonicalizing.
pub(crate) fn split_sign(expr: &Expr) -> (bool, Expr) {
  match expr {
    Expr::Number(r) if r.is_negative() => (true, Expr::Number(-r)),
    Expr::Real(f) if *f < 0.0 => (true, Expr::Real(-f)),
    Expr::Times(factors) if expr.has_negative_sign() => {
      let mut rest: Vec<Expr> = factors[1..].to_vec();
      match &factors[0] {
        Expr::Number(r) if (-r).is_one() => {}
        Expr::Number(r) => rest.insert(0, Expr::Number(-r)),
        Expr::Real(f) => rest.insert(0, Expr::Real(-f)),
        _ => {}
      }
      let magnitude = match rest.len() {
        0 => Expr::one(),
        1 => rest.remove(0),
        _ => Expr::Times(rest),
      };
      (true, magnitude)
    }
    other => (false, other.clone()),
  }
}

/// A product laid out as `numerator/denominator`.
pub(crate) struct Fraction {
  pub numer: Vec<Expr>,
  pub denom: Vec<Expr>,
}

/// Split the factors of a sign-free product: rational coefficients into
/// their two integers, factors with negative numeric exponents below the
/// line.
pub(crate) fn fraction_parts(expr: &Expr) -> Fraction {
  let factors = match expr {
    Expr::Times(items) => items.clone(),
    other => vec![other.clone()],
  };
  let mut numer = Vec::new();
  let mut denom = Vec::new();
  for factor in factors {
    match &factor {
      Expr::Number(r) if !r.is_integer() => {
        if !r.numer().is_one() {
          numer.push(Expr::Number(Rational::from_integer(r.numer().clone())));
        }
        denom.push(Expr::Number(Rational::from_integer(r.denom().clone())));
      }
      Expr::Power(base, exp) if exp.is_negative_number() => {
        let flipped = match exp.as_ref() {
          Expr::Number(r) => Expr::Number(-r),
          Expr::Real(f) => Expr::Real(-f),
          other => other.clone(),
        };
        if flipped.is_one() {
          denom.push(base.as_ref().clone());
        } else {
          denom.push(Expr::Power(base.clone(), Box::new(flipped)));
        }
      }
      _ => numer.push(factor),
    }
  }
  Fraction { numer, denom }
}

/// `p/q` with `q > 1`.
pub(crate) fn as_fraction(r: &Rational) -> Option<(BigInt, BigInt)> {
  if r.is_integer() {
    None
  } else {
    Some((r.numer().clone(), r.denom().clone()))
  }
}

/// Float with `digits` significant digits, trailing zeros trimmed.
pub fn format_float(value: f64, digits: usize) -> String {
  if value.is_nan() {
    return "nan".to_string();
  }
  if value.is_infinite() {
    return if value > 0.0 { "oo" } else { "-oo" }.to_string();
  }
  if value == 0.0 {
    return "0".to_string();
  }
  let digits = digits.clamp(1, 17);
  let scientific = format!("{:.*e}", digits - 1, value);
  let Some((mantissa, exponent)) = scientific.split_once('e') else {
    return scientific;
  };
  let exponent: i32 = exponent.parse().unwrap_or(0);
  if (-5..digits as i32).contains(&exponent) {
    let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
    trim_zeros(&format!("{:.*}", decimals, value))
  } else {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}e{}{}", trim_zeros(mantissa), sign, exponent.abs())
  }
}

fn trim_zeros(s: &str) -> String {
  if !s.contains('.') {
    return s.to_string();
  }
  s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn floats_are_trimmed() {
    assert_eq!(format_float(25.0, 15), "25");
    assert_eq!(format_float(std::f64::consts::PI, 15), "3.14159265358979");
    assert_eq!(format_float(0.5, 15), "0.5");
    assert_eq!(format_float(1.5e20, 15), "1.5e+20");
    assert_eq!(format_float(-2.0e-7, 3), "-2e-7");
  }

  #[test]
  fn notation_names() {
    use clap::ValueEnum;
    assert_eq!(Notation::from_str("LaTeX", true), Ok(Notation::Latex));
    assert!(Notation::from_str("braille", true).is_err());
  }
}
