use num_traits::Signed;

use crate::functions::polynomial_ast::SolutionSet;
use crate::syntax::{Constant, Expr, Func};

use super::{
  format_float, fraction_parts, precedence, printed_terms, split_sign,
  PREC_ADD, PREC_ATOM, PREC_MUL, PREC_POW,
};

/// Single-line printer for the ASCII (`**` powers) and Unicode notations.
pub struct TextPrinter {
  unicode: bool,
  digits: usize,
}

impl TextPrinter {
  pub fn ascii(digits: usize) -> Self {
    TextPrinter {
      unicode: false,
      digits,
    }
  }

  pub fn unicode(digits: usize) -> Self {
    TextPrinter {
      unicode: true,
      digits,
    }
  }

  fn times_sign(&self) -> &'static str {
    if self.unicode {
      "⋅"
    } else {
      "*"
    }
  }

  fn parenthesize(&self, expr: &Expr, level: u8) -> String {
    let s = self.expr(expr);
    if precedence(expr) <= level {
      format!("({s})")
    } else {
      s
    }
  }

  pub fn expr(&self, expr: &Expr) -> String {
    match expr {
      Expr::Number(r) => r.to_string(),
      Expr::Real(f) => format_float(*f, self.digits),
      Expr::Identifier(name) => self.symbol(name),
      Expr::Constant(c) => self.constant(*c),
      Expr::Plus(terms) => self.sum(terms),
      Expr::Times(_) => self.product(expr),
      Expr::Power(base, exp) => self.power(base, exp),
      Expr::Function(func, arg) => self.function(*func, arg),
      Expr::FunctionCall { name, args } => self.call(name, args),
    }
  }

  fn symbol(&self, name: &str) -> String {
    if self.unicode {
      name.trim_start_matches('_').to_string()
    } else {
      name.to_string()
    }
  }

  fn constant(&self, c: Constant) -> String {
    if !self.unicode {
      return c.name().to_string();
    }
    match c {
      Constant::I => "ⅈ",
      Constant::E => "ℯ",
      Constant::Pi => "π",
      Constant::Infinity => "∞",
      Constant::ComplexInfinity => "∞̃",
      Constant::NaN => "nan",
    }
    .to_string()
  }

  fn sum(&self, terms: &[Expr]) -> String {
    let mut out = String::new();
    for (i, term) in printed_terms(terms).into_iter().enumerate() {
      let (negative, magnitude) = split_sign(term);
      let body = self.expr(&magnitude);
      match (i, negative) {
        (0, true) => out.push('-'),
        (0, false) => {}
        (_, true) => out.push_str(" - "),
        (_, false) => out.push_str(" + "),
      }
      if negative && precedence(&magnitude) <= PREC_ADD {
        out.push_str(&format!("({body})"));
      } else {
        out.push_str(&body);
      }
    }
    out
  }

  fn product(&self, expr: &Expr) -> String {
    let (negative, magnitude) = split_sign(expr);
    let sign = if negative { "-" } else { "" };
    let reciprocal = matches!(
      &magnitude,
      Expr::Power(_, exp) if exp.is_negative_number()
    );
    if !matches!(magnitude, Expr::Times(_)) && !reciprocal {
      let body = self.parenthesize_factor(&magnitude);
      return format!("{sign}{body}");
    }
    let parts = fraction_parts(&magnitude);
    let join = |factors: &[Expr]| {
      factors
        .iter()
        .map(|f| self.parenthesize_factor(f))
        .collect::<Vec<_>>()
        .join(self.times_sign())
    };
    let numer = if parts.numer.is_empty() {
      "1".to_string()
    } else {
      join(&parts.numer)
    };
    match parts.denom.len() {
      0 => format!("{sign}{numer}"),
      1 => format!("{sign}{numer}/{}", join(&parts.denom)),
      _ => format!("{sign}{numer}/({})", join(&parts.denom)),
    }
  }

  fn parenthesize_factor(&self, factor: &Expr) -> String {
    let s = self.expr(factor);
    if precedence(factor) < PREC_MUL {
      format!("({s})")
    } else {
      s
    }
  }

  fn power(&self, base: &Expr, exp: &Expr) -> String {
    if let Some((p, q)) = exp.as_rational().map(|r| (r.numer(), r.denom())) {
      let (p, q) = (p.to_string(), q.to_string());
      match (p.as_str(), q.as_str()) {
        ("1", "2") => return self.root(base, "sqrt", "√"),
        ("1", "3") if self.unicode => return self.root(base, "", "∛"),
        ("-1", "1") => {
          return format!("1/{}", self.parenthesize(base, PREC_MUL));
        }
        ("-1", "2") => {
          return format!("1/{}", self.root(base, "sqrt", "√"));
        }
        _ => {}
      }
    }
    if self.unicode {
      if let Some(n) = exp.as_integer() {
        let digits = superscript(&n.to_string());
        if let Expr::Function(func, arg) = base {
          if n.is_positive() {
            return format!("{}{digits}({})", func.name(), self.expr(arg));
          }
        }
        return format!("{}{digits}", self.parenthesize(base, PREC_POW));
      }
      return format!(
        "{}^{}",
        self.parenthesize(base, PREC_POW),
        self.parenthesize(exp, PREC_POW)
      );
    }
    format!(
      "{}**{}",
      self.parenthesize(base, PREC_POW),
      self.parenthesize(exp, PREC_POW)
    )
  }

  fn root(&self, base: &Expr, ascii: &str, glyph: &str) -> String {
    if !self.unicode {
      return format!("{ascii}({})", self.expr(base));
    }
    let inner = self.expr(base);
    if precedence(base) >= PREC_ATOM {
      format!("{glyph}{inner}")
    } else {
      format!("{glyph}({inner})")
    }
  }

  fn function(&self, func: Func, arg: &Expr) -> String {
    if self.unicode && func == Func::Abs {
      return format!("│{}│", self.expr(arg));
    }
    format!("{}({})", func.name(), self.expr(arg))
  }

  fn call(&self, name: &str, args: &[Expr]) -> String {
    let inner = args
      .iter()
      .map(|a| self.expr(a))
      .collect::<Vec<_>>()
      .join(", ");
    if name == "Tuple" {
      format!("({inner})")
    } else {
      format!("{name}({inner})")
    }
  }

  pub fn set(&self, set: &SolutionSet) -> String {
    match set {
      SolutionSet::Finite(items) => {
        let inner = items
          .iter()
          .map(|e| self.expr(e))
          .collect::<Vec<_>>()
          .join(", ");
        format!("{{{inner}}}")
      }
      SolutionSet::Empty if self.unicode => "∅".to_string(),
      SolutionSet::Empty => "EmptySet".to_string(),
      SolutionSet::Complexes if self.unicode => "ℂ".to_string(),
      SolutionSet::Complexes => "Complexes".to_string(),
      SolutionSet::ImageSet { parameter, expr } => {
        if self.unicode {
          format!(
            "{{{} │ {} ∊ ℤ}}",
            self.expr(expr),
            self.symbol(parameter)
          )
        } else {
          format!(
            "ImageSet(Lambda({parameter}, {}), Integers)",
            self.expr(expr)
          )
        }
      }
      SolutionSet::ConditionSet { var, equation } => {
        if self.unicode {
          format!(
            "{{{var} │ {var} ∊ ℂ ∧ ({} = 0)}}",
            self.expr(equation)
          )
        } else {
          format!(
            "ConditionSet({var}, Eq({}, 0), Complexes)",
            self.expr(equation)
          )
        }
      }
      SolutionSet::Union(parts) => {
        let rendered: Vec<String> = parts.iter().map(|p| self.set(p)).collect();
        if self.unicode {
          rendered.join(" ∪ ")
        } else {
          format!("Union({})", rendered.join(", "))
        }
      }
    }
  }
}

fn superscript(digits: &str) -> String {
  digits
    .chars()
    .map(|c| match c {
      '0' => '⁰',
      '1' => '¹',
      '2' => '²',
      '3' => '³',
      '4' => '⁴',
      '5' => '⁵',
      '6' => '⁶',
      '7' => '⁷',
      '8' => '⁸',
      '9' => '⁹',
      '-' => '⁻',
      other => other,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_expression;

  fn ascii(s: &str) -> String {
    TextPrinter::ascii(15).expr(&parse_expression(s).unwrap())
  }

  fn unicode(s: &str) -> String {
    TextPrinter::unicode(15).expr(&parse_expression(s).unwrap())
  }

  #[test]
  fn sums_use_binary_minus() {
    assert_eq!(ascii("2*x + 3*x - 5"), "5*x - 5");
    assert_eq!(ascii("x**2 - 4"), "x**2 - 4");
    assert_eq!(ascii("1 - x"), "1 - x");
    assert_eq!(ascii("sqrt(1 - x**2)"), "sqrt(1 - x**2)");
    assert_eq!(ascii("-x - 1"), "-x - 1");
  }

  #[test]
  fn quotients() {
    assert_eq!(ascii("x**3/3"), "x**3/3");
    assert_eq!(ascii("sqrt(2)/2"), "sqrt(2)/2");
    assert_eq!(ascii("1/x"), "1/x");
    assert_eq!(ascii("3*x/(2*y)"), "3*x/(2*y)");
    assert_eq!(ascii("-b/a"), "-b/a");
  }

  #[test]
  fn negated_reciprocals() {
    assert_eq!(ascii("-1/x**2"), "-1/x**2");
    assert_eq!(ascii("-1/x"), "-1/x");
    assert_eq!(ascii("-2/x**3"), "-2/x**3");
  }

  #[test]
  fn powers_parenthesize() {
    assert_eq!(ascii("(x + 1)**2"), "(x + 1)**2");
    assert_eq!(ascii("x**(1/3)"), "x**(1/3)");
    assert_eq!(ascii("2**x"), "2**x");
  }

  #[test]
  fn unicode_glyphs() {
    assert_eq!(unicode("x**2 + 2*x"), "x² + 2⋅x");
    assert_eq!(unicode("sqrt(x)"), "√x");
    assert_eq!(unicode("cbrt(x + 1)"), "∛(x + 1)");
    assert_eq!(unicode("sin(x)**2"), "sin²(x)");
    assert_eq!(unicode("pi*I"), "ⅈ⋅π");
  }

  #[test]
  fn sets() {
    let printer = TextPrinter::ascii(15);
    let set = SolutionSet::Finite(vec![Expr::int(-3), Expr::int(3)]);
    assert_eq!(printer.set(&set), "{-3, 3}");
    assert_eq!(printer.set(&SolutionSet::Empty), "EmptySet");
    assert_eq!(TextPrinter::unicode(15).set(&SolutionSet::Complexes), "ℂ");
  }
}
