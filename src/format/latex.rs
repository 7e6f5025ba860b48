use num_traits::Signed;

use crate::functions::polynomial_ast::SolutionSet;
use crate::syntax::{Constant, Expr, Func};

use super::{
  as_fraction, format_float, fraction_parts, precedence, printed_terms,
  split_sign, PREC_ADD, PREC_MUL, PREC_POW,
};

const GREEK: [&str; 24] = [
  "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta",
  "iota", "kappa", "lambda", "mu", "nu", "xi", "omicron", "rho", "sigma",
  "tau", "upsilon", "phi", "chi", "psi", "omega", "Omega",
];

/// LaTeX printer: `\frac` quotients and `\left( \right)` delimiters.
pub struct LatexPrinter {
  digits: usize,
}

impl LatexPrinter {
  pub fn new(digits: usize) -> Self {
    LatexPrinter { digits }
  }

  fn parenthesize(&self, expr: &Expr, level: u8) -> String {
    let s = self.expr(expr);
    if precedence(expr) <= level {
      format!("\\left({s}\\right)")
    } else {
      s
    }
  }

  pub fn expr(&self, expr: &Expr) -> String {
    match expr {
      Expr::Number(r) => match as_fraction(r) {
        Some((p, q)) if p.is_negative() => format!("- \\frac{{{}}}{{{q}}}", -p),
        Some((p, q)) => format!("\\frac{{{p}}}{{{q}}}"),
        None => r.to_string(),
      },
      Expr::Real(f) => self.real(*f),
      Expr::Identifier(name) => symbol(name),
      Expr::Constant(c) => constant(*c).to_string(),
      Expr::Plus(terms) => self.sum(terms),
      Expr::Times(_) => self.product(expr),
      Expr::Power(base, exp) => self.power(base, exp),
      Expr::Function(func, arg) => self.function(*func, arg, None),
      Expr::FunctionCall { name, args } => self.call(name, args),
    }
  }

  fn real(&self, value: f64) -> String {
    let s = format_float(value, self.digits);
    match s.split_once('e') {
      Some((mantissa, exponent)) => {
        let exponent = exponent.trim_start_matches('+');
        format!("{mantissa} \\cdot 10^{{{exponent}}}")
      }
      None => s,
    }
  }

  fn sum(&self, terms: &[Expr]) -> String {
    let mut out = String::new();
    for (i, term) in printed_terms(terms).into_iter().enumerate() {
      let (negative, magnitude) = split_sign(term);
      match (i, negative) {
        (0, true) => out.push_str("- "),
        (0, false) => {}
        (_, true) => out.push_str(" - "),
        (_, false) => out.push_str(" + "),
      }
      if negative && precedence(&magnitude) <= PREC_ADD {
        out.push_str(&format!("\\left({}\\right)", self.expr(&magnitude)));
      } else {
        out.push_str(&self.expr(&magnitude));
      }
    }
    out
  }

  fn product(&self, expr: &Expr) -> String {
    let (negative, magnitude) = split_sign(expr);
    let sign = if negative { "- " } else { "" };
    let parts = fraction_parts(&magnitude);
    let in_fraction = !parts.denom.is_empty();
    let numer = if parts.numer.is_empty() {
      "1".to_string()
    } else {
      self.juxtapose(&parts.numer, in_fraction)
    };
    if !in_fraction {
      return format!("{sign}{numer}");
    }
    let denom = self.juxtapose(&parts.denom, true);
    format!("{sign}\\frac{{{numer}}}{{{denom}}}")
  }

  /// Factors side by side; adjacent numbers are separated by `\cdot`.
  /// A lone sum inside `\frac` braces needs no parentheses.
  fn juxtapose(&self, factors: &[Expr], in_fraction: bool) -> String {
    let bare = in_fraction && factors.len() == 1;
    let mut out = String::new();
    for (i, factor) in factors.iter().enumerate() {
      if i > 0 {
        let numeric = |e: &Expr| matches!(e, Expr::Number(_) | Expr::Real(_));
        if numeric(factor) && numeric(&factors[i - 1]) {
          out.push_str(" \\cdot ");
        } else {
          out.push(' ');
        }
      }
      if precedence(factor) < PREC_MUL && !bare {
        out.push_str(&format!("\\left({}\\right)", self.expr(factor)));
      } else {
        out.push_str(&self.expr(factor));
      }
    }
    out
  }

  fn power(&self, base: &Expr, exp: &Expr) -> String {
    if let Some(r) = exp.as_rational() {
      if r.is_negative() {
        let flipped = Expr::Number(-r);
        let denominator = if flipped.is_one() {
          self.expr(base)
        } else {
          self.power(base, &flipped)
        };
        return format!("\\frac{{1}}{{{denominator}}}");
      }
      if let Some((p, q)) = as_fraction(r) {
        if p == 1.into() {
          return if q == 2.into() {
            format!("\\sqrt{{{}}}", self.expr(base))
          } else {
            format!("\\sqrt[{q}]{{{}}}", self.expr(base))
          };
        }
      }
    }
    if let Expr::Function(func, arg) = base {
      if exp.as_integer().is_some_and(|n| n.is_positive())
        && *func != Func::Exp
        && *func != Func::Abs
      {
        return self.function(*func, arg, Some(exp));
      }
    }
    let exponent = match exp.as_rational().and_then(as_fraction) {
      Some((p, q)) => format!("\\frac{{{p}}}{{{q}}}"),
      None => self.expr(exp),
    };
    format!("{}^{{{exponent}}}", self.parenthesize(base, PREC_POW))
  }

  fn function(&self, func: Func, arg: &Expr, power: Option<&Expr>) -> String {
    let inner = self.expr(arg);
    let name = match func {
      Func::Exp => return format!("e^{{{inner}}}"),
      Func::Abs => return format!("\\left|{{{inner}}}\\right|"),
      Func::Sin | Func::Cos | Func::Tan | Func::Cot | Func::Sec | Func::Csc
      | Func::Sinh | Func::Cosh | Func::Tanh | Func::Log => {
        format!("\\{}", func.name())
      }
      other => format!("\\operatorname{{{}}}", other.name()),
    };
    match power {
      Some(p) => {
        format!("{name}^{{{}}}{{\\left({inner} \\right)}}", self.expr(p))
      }
      None => format!("{name}{{\\left({inner} \\right)}}"),
    }
  }

  fn call(&self, name: &str, args: &[Expr]) -> String {
    match (name, args) {
      ("Tuple", _) => {
        let inner: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        format!("\\left( {}\\right)", inner.join(", "))
      }
      ("Integral", [body, Expr::Identifier(x)]) => {
        format!("\\int {}\\, d{}", self.integrand(body), symbol(x))
      }
      ("Integral", [body, Expr::FunctionCall { name, args: limits }])
        if name == "Tuple" && limits.len() == 3 =>
      {
        format!(
          "\\int\\limits_{{{}}}^{{{}}} {}\\, d{}",
          self.expr(&limits[1]),
          self.expr(&limits[2]),
          self.integrand(body),
          self.expr(&limits[0])
        )
      }
      ("Derivative", [body, Expr::Identifier(x)]) => {
        format!("\\frac{{d}}{{d {}}} {}", symbol(x), self.expr(body))
      }
      ("Derivative", [body, Expr::FunctionCall { name, args: limits }])
        if name == "Tuple" && limits.len() == 2 =>
      {
        let order = self.expr(&limits[1]);
        format!(
          "\\frac{{d^{{{order}}}}}{{d {}^{{{order}}}}} {}",
          self.expr(&limits[0]),
          self.expr(body)
        )
      }
      _ => {
        let inner: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
        let head = if name.chars().count() == 1 {
          name.to_string()
        } else {
          format!("\\operatorname{{{name}}}")
        };
        format!("{head}{{\\left({} \\right)}}", inner.join(", "))
      }
    }
  }

  fn integrand(&self, body: &Expr) -> String {
    if precedence(body) <= PREC_ADD {
      format!("\\left({}\\right)", self.expr(body))
    } else {
      self.expr(body)
    }
  }

  pub fn set(&self, set: &SolutionSet) -> String {
    match set {
      SolutionSet::Finite(items) => {
        let inner: Vec<String> = items.iter().map(|e| self.expr(e)).collect();
        format!("\\left\\{{{}\\right\\}}", inner.join(", "))
      }
      SolutionSet::Empty => "\\emptyset".to_string(),
      SolutionSet::Complexes => "\\mathbb{C}".to_string(),
      SolutionSet::ImageSet { parameter, expr } => format!(
        "\\left\\{{{}\\; \\middle|\\; {} \\in \\mathbb{{Z}}\\right\\}}",
        self.expr(expr),
        symbol(parameter)
      ),
      SolutionSet::ConditionSet { var, equation } => format!(
        "\\left\\{{{x}\\; \\middle|\\; {x} \\in \\mathbb{{C}} \\wedge {} = 0 \
         \\right\\}}",
        self.expr(equation),
        x = symbol(var)
      ),
      SolutionSet::Union(parts) => {
        let rendered: Vec<String> = parts.iter().map(|p| self.set(p)).collect();
        rendered.join(" \\cup ")
      }
    }
  }
}

fn symbol(name: &str) -> String {
  let name = name.trim_start_matches('_');
  if GREEK.contains(&name) {
    format!("\\{name}")
  } else {
    name.to_string()
  }
}

fn constant(c: Constant) -> &'static str {
  match c {
    Constant::I => "i",
    Constant::E => "e",
    Constant::Pi => "\\pi",
    Constant::Infinity => "\\infty",
    Constant::ComplexInfinity => "\\tilde{\\infty}",
    Constant::NaN => "\\text{NaN}",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_expression;

  fn latex(s: &str) -> String {
    LatexPrinter::new(15).expr(&parse_expression(s).unwrap())
  }

  #[test]
  fn fractions() {
    assert_eq!(latex("x**3/3"), "\\frac{x^{3}}{3}");
    assert_eq!(latex("1/2"), "\\frac{1}{2}");
    assert_eq!(latex("sqrt(2)/2"), "\\frac{\\sqrt{2}}{2}");
  }

  #[test]
  fn functions_use_left_right() {
    assert_eq!(latex("sin(x)"), "\\sin{\\left(x \\right)}");
    let identity = latex("sin(x)**2 + cos(x)**2");
    assert!(identity.contains("\\sin^{2}{\\left(x \\right)}"));
    assert!(identity.contains("\\cos^{2}{\\left(x \\right)}"));
    assert_eq!(latex("exp(x)"), "e^{x}");
    assert_eq!(latex("asin(x)"), "\\operatorname{asin}{\\left(x \\right)}");
  }

  #[test]
  fn products_and_powers() {
    assert_eq!(latex("2*x"), "2 x");
    assert_eq!(latex("(x + 1)**2"), "\\left(x + 1\\right)^{2}");
    assert_eq!(latex("x**(1/3)"), "\\sqrt[3]{x}");
    assert_eq!(latex("-x"), "- x");
  }

  #[test]
  fn lone_sums_in_fractions_are_bare() {
    assert_eq!(latex("sqrt(x)/(x + 1)"), "\\frac{\\sqrt{x}}{x + 1}");
    assert_eq!(latex("(x + 1)/y"), "\\frac{x + 1}{y}");
    assert_eq!(
      latex("(x - 1)*(x + 1)/(x + 2)"),
      "\\frac{\\left(x - 1\\right) \\left(x + 1\\right)}{x + 2}"
    );
  }

  #[test]
  fn sets() {
    let printer = LatexPrinter::new(15);
    let set = SolutionSet::Finite(vec![Expr::int(-3), Expr::int(3)]);
    assert_eq!(printer.set(&set), "\\left\\{-3, 3\\right\\}");
    assert_eq!(printer.set(&SolutionSet::Empty), "\\emptyset");
  }
}
