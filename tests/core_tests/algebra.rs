use super::*;
use rstest::rstest;

mod simplify {
  use super::*;

  #[rstest]
  #[case("2*x+3*x-5", "5*x - 5")]
  #[case("sin(x)^2 + cos(x)^2", "1")]
  #[case("(x**2 - 1)/(x - 1)", "x + 1")]
  #[case("sin(x)/cos(x)", "tan(x)")]
  #[case("x - x", "0")]
  #[case("log(8, 2)", "3")]
  fn simplifies(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(ascii(&simplify_expr(input).unwrap()), expected);
  }
}

mod expand {
  use super::*;

  #[rstest]
  #[case("(x+2)*(x-2)", "x**2 - 4")]
  #[case("(x+1)^3", "x**3 + 3*x**2 + 3*x + 1")]
  #[case("x*(x + 1)", "x**2 + x")]
  fn expands(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(ascii(&expand_expr(input).unwrap()), expected);
  }
}

mod factor {
  use super::*;

  #[rstest]
  #[case("x^2 + 2*x + 1", "(x + 1)**2")]
  #[case("x**2 - 1", "(x - 1)*(x + 1)")]
  #[case("2*x + 2", "2*(x + 1)")]
  fn factors(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(ascii(&factor_expr(input).unwrap()), expected);
  }

  #[test]
  fn factor_then_expand_is_identity() {
    let input = "x**3 - 6*x**2 + 11*x - 6";
    let factored = factor_expr(input).unwrap();
    assert_eq!(expand_expr(&factored.to_string()).unwrap(), p(input));
  }
}
