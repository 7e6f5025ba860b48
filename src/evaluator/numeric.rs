use std::f64::consts;

use num_complex::Complex64;
use num_traits::ToPrimitive;

use crate::syntax::{Constant, Expr, Func};

use super::{add, map_children, mul};

/// Relative threshold below which a real or imaginary part is dropped.
const CHOP_TOLERANCE: f64 = 1e-13;

/// Evaluate a symbol-free expression to a complex float.
pub fn to_complex(expr: &Expr) -> Option<Complex64> {
  match expr {
    Expr::Number(r) => r.to_f64().map(|v| Complex64::new(v, 0.0)),
    Expr::Real(f) => Some(Complex64::new(*f, 0.0)),
    Expr::Identifier(_) | Expr::FunctionCall { .. } => None,
    Expr::Constant(c) => match c {
      Constant::I => Some(Complex64::i()),
      Constant::E => Some(Complex64::new(consts::E, 0.0)),
      Constant::Pi => Some(Complex64::new(consts::PI, 0.0)),
      Constant::Infinity => Some(Complex64::new(f64::INFINITY, 0.0)),
      Constant::ComplexInfinity | Constant::NaN => None,
    },
    Expr::Plus(terms) => {
      terms.iter().try_fold(Complex64::new(0.0, 0.0), |acc, t| {
        to_complex(t).map(|v| acc + v)
      })
    }
    Expr::Times(factors) => {
      factors.iter().try_fold(Complex64::new(1.0, 0.0), |acc, f| {
        to_complex(f).map(|v| acc * v)
      })
    }
    Expr::Power(base, exp) => {
      let b = to_complex(base)?;
      let e = to_complex(exp)?;
      Some(complex_pow(b, e))
    }
    Expr::Function(func, arg) => to_complex(arg).map(|z| eval_function(*func, z)),
  }
}

fn complex_pow(b: Complex64, e: Complex64) -> Complex64 {
  if b.im == 0.0 && e.im == 0.0 {
    if e.re.fract() == 0.0 && e.re.abs() < i32::MAX as f64 {
      return Complex64::new(b.re.powi(e.re as i32), 0.0);
    }
    if b.re >= 0.0 {
      return Complex64::new(b.re.powf(e.re), 0.0);
    }
  }
  if b == Complex64::new(0.0, 0.0) {
    return b;
  }
  b.powc(e)
}

/// Elementary functions, staying on the real line whenever the real-valued
/// function is defined there.
pub fn eval_function(func: Func, z: Complex64) -> Complex64 {
  if z.im == 0.0 {
    if let Some(v) = eval_real(func, z.re) {
      return Complex64::new(v, 0.0);
    }
  }
  let one = Complex64::new(1.0, 0.0);
  match func {
    Func::Sin => z.sin(),
    Func::Cos => z.cos(),
    Func::Tan => z.tan(),
    Func::Cot => one / z.tan(),
    Func::Sec => one / z.cos(),
    Func::Csc => one / z.sin(),
    Func::Asin => z.asin(),
    Func::Acos => z.acos(),
    Func::Atan => z.atan(),
    Func::Acot => (one / z).atan(),
    Func::Sinh => z.sinh(),
    Func::Cosh => z.cosh(),
    Func::Tanh => z.tanh(),
    Func::Asinh => z.asinh(),
    Func::Acosh => z.acosh(),
    Func::Atanh => z.atanh(),
    Func::Exp => z.exp(),
    Func::Log => z.ln(),
    Func::Abs => Complex64::new(z.norm(), 0.0),
    Func::Sign => {
      if z.norm() == 0.0 {
        z
      } else {
        z / z.norm()
      }
    }
  }
}

fn eval_real(func: Func, x: f64) -> Option<f64> {
  let v = match func {
    Func::Sin => x.sin(),
    Func::Cos => x.cos(),
    Func::Tan => x.tan(),
    Func::Cot => 1.0 / x.tan(),
    Func::Sec => 1.0 / x.cos(),
    Func::Csc => 1.0 / x.sin(),
    Func::Asin if x.abs() <= 1.0 => x.asin(),
    Func::Acos if x.abs() <= 1.0 => x.acos(),
    Func::Atan => x.atan(),
    Func::Acot if x == 0.0 => consts::FRAC_PI_2,
    Func::Acot => (1.0 / x).atan(),
    Func::Sinh => x.sinh(),
    Func::Cosh => x.cosh(),
    Func::Tanh => x.tanh(),
    Func::Asinh => x.asinh(),
    Func::Acosh if x >= 1.0 => x.acosh(),
    Func::Atanh if x.abs() < 1.0 => x.atanh(),
    Func::Exp => x.exp(),
    Func::Log if x > 0.0 => x.ln(),
    Func::Abs => x.abs(),
    Func::Sign if x == 0.0 => 0.0,
    Func::Sign => x.signum(),
    _ => return None,
  };
  Some(v)
}

/// Round to `digits` significant digits.
fn round_significant(value: f64, digits: usize) -> f64 {
  if !value.is_finite() || value == 0.0 {
    return value;
  }
  let text = format!("{:.*e}", digits.saturating_sub(1), value);
  text.parse().unwrap_or(value)
}

/// Convert a complex float back to an expression, chopping negligible parts.
pub fn complex_to_expr(z: Complex64, digits: usize) -> Expr {
  if z.re.is_nan() || z.im.is_nan() {
    return Expr::Constant(Constant::NaN);
  }
  if z.im == 0.0 && z.re.is_infinite() {
    return if z.re > 0.0 {
      Expr::infinity()
    } else {
      Expr::Times(vec![Expr::int(-1), Expr::infinity()])
    };
  }
  if z.re.is_infinite() || z.im.is_infinite() {
    return Expr::Constant(Constant::ComplexInfinity);
  }
  let scale = z.norm().max(1.0);
  let re = if z.re.abs() < CHOP_TOLERANCE * scale { 0.0 } else { z.re };
  let im = if z.im.abs() < CHOP_TOLERANCE * scale { 0.0 } else { z.im };
  let re = round_significant(re, digits);
  let im = round_significant(im, digits);
  if im == 0.0 {
    return Expr::Real(re);
  }
  let imaginary = mul(vec![Expr::Real(im), Expr::imaginary_unit()]);
  if re == 0.0 {
    imaginary
  } else {
    add(vec![Expr::Real(re), imaginary])
  }
}

/// Numerically evaluate every symbol-free subtree; subtrees containing
/// symbols or undefined functions stay symbolic.
pub fn evalf(expr: &Expr, digits: usize) -> Expr {
  if let Expr::FunctionCall { .. } = expr {
    return map_children(expr, |child| evalf(child, digits));
  }
  if expr.is_constant() {
    if let Some(z) = to_complex(expr) {
      return complex_to_expr(z, digits);
    }
  }
  match expr {
    Expr::Number(_) | Expr::Real(_) => to_complex(expr)
      .map(|z| complex_to_expr(z, digits))
      .unwrap_or_else(|| expr.clone()),
    Expr::Power(base, exp) => {
      // keep integer exponents exact: x**2.0 reads badly
      let exp = match exp.as_ref() {
        Expr::Number(r) if r.is_integer() => exp.as_ref().clone(),
        other => evalf(other, digits),
      };
      super::pow(evalf(base, digits), exp)
    }
    other => map_children(other, |child| evalf(child, digits)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_expression;

  #[test]
  fn constants_evaluate_to_floats() {
    let value = evalf(&parse_expression("pi").unwrap(), 15);
    assert_eq!(value, Expr::Real(3.14159265358979));
  }

  #[test]
  fn symbols_stay_symbolic() {
    let value = evalf(&parse_expression("x + sqrt(4)/3").unwrap(), 15);
    assert_eq!(
      value,
      Expr::Plus(vec![Expr::symbol("x"), Expr::Real(0.666666666666667)])
    );
  }

  #[test]
  fn complex_results_keep_imaginary_part() {
    let value = to_complex(&parse_expression("sqrt(-1.0)").unwrap());
    assert_eq!(value, Some(Complex64::new(0.0, 1.0)));
  }
}
