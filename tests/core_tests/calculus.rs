use super::*;
use rstest::rstest;

mod differentiation {
  use super::*;

  #[rstest]
  #[case("sin(x)", "cos(x)")]
  #[case("x**2", "2*x")]
  #[case("exp(2*x)", "2*exp(2*x)")]
  #[case("5", "0")]
  fn first_derivative(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(ascii(&diff_expr(input, Some("x"), 1).unwrap()), expected);
  }

  #[test]
  fn second_order() {
    assert_eq!(ascii(&diff_expr("x^3", Some("x"), 2).unwrap()), "6*x");
  }

  #[test]
  fn order_zero_is_identity() {
    assert_eq!(diff_expr("x**3", Some("x"), 0).unwrap(), p("x**3"));
  }

  #[test]
  fn negative_order_is_rejected() {
    assert!(matches!(
      diff_expr("x", Some("x"), -1),
      Err(SymcalcError::InvalidArgument(_))
    ));
  }

  #[test]
  fn default_variable() {
    assert_eq!(ascii(&diff_expr("t**2", None, 1).unwrap()), "2*t");
  }
}

mod integration {
  use super::*;

  #[rstest]
  #[case("x**2", "x**3/3")]
  #[case("cos(x)", "sin(x)")]
  #[case("sin(x)", "-cos(x)")]
  #[case("exp(x)", "exp(x)")]
  #[case("1/(x**2 + 1)", "atan(x)")]
  fn antiderivatives(#[case] input: &str, #[case] expected: &str) {
    let result = integrate_expr(input, Some("x"), None, None).unwrap();
    assert_eq!(ascii(&result), expected);
  }

  #[test]
  fn derivative_of_antiderivative() {
    for input in ["x**3 + 2*x", "x*exp(x)", "cos(3*x)"] {
      let antiderivative = integrate_expr(input, Some("x"), None, None).unwrap();
      let back = diff_expr(&antiderivative.to_string(), Some("x"), 1).unwrap();
      let difference = simplify_expr(&format!("({back}) - ({input})")).unwrap();
      assert_eq!(difference, Expr::zero(), "{input}");
    }
  }

  #[rstest]
  #[case("x", "0", "1", "1/2")]
  #[case("exp(-x)", "0", "oo", "1")]
  #[case("sin(x)", "0", "pi", "2")]
  #[case("1/x**2", "-1", "1", "oo")]
  #[case("1/x", "-1", "1", "nan")]
  #[case("1/x", "0", "1", "oo")]
  #[case("-1/x**2", "-1", "1", "-oo")]
  #[case("sin(x)", "0", "oo", "Integral(sin(x), (x, 0, oo))")]
  fn definite(
    #[case] input: &str,
    #[case] a: &str,
    #[case] b: &str,
    #[case] expected: &str,
  ) {
    let result = integrate_expr(input, Some("x"), Some(a), Some(b)).unwrap();
    assert_eq!(ascii(&result), expected);
  }

  #[test]
  fn single_bound_is_indefinite() {
    let result = integrate_expr("x", Some("x"), Some("0"), None).unwrap();
    assert_eq!(ascii(&result), "x**2/2");
  }

  #[test]
  fn constant_integrates_in_x() {
    assert_eq!(ascii(&integrate_expr("3", None, None, None).unwrap()), "3*x");
  }
}
