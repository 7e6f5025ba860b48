use super::*;

mod implicit_forms {
  use super::*;

  #[test]
  fn implicit_multiplication() {
    assert_eq!(p("2x"), p("2*x"));
    assert_eq!(p("2(x + 1)"), p("2*(x + 1)"));
    assert_eq!(p("(x + 1)(x - 1)"), p("(x + 1)*(x - 1)"));
    assert_eq!(p("x y"), p("x*y"));
  }

  #[test]
  fn implicit_application() {
    assert_eq!(p("sin x"), p("sin(x)"));
  }

  #[test]
  fn caret_is_power() {
    assert_eq!(p("x^2"), p("x**2"));
    assert_eq!(p("-x^2"), p("-(x**2)"));
    assert_eq!(p("2^3^2"), Expr::int(512));
  }

  #[test]
  fn multi_letter_names_stay_whole() {
    assert_eq!(p("alpha").as_symbol(), Some("alpha"));
  }
}

mod functions {
  use super::*;

  #[test]
  fn aliases() {
    assert_eq!(p("ln(x)"), p("log(x)"));
    assert_eq!(p("abs(x)"), p("Abs(x)"));
    assert_eq!(p("root(x, 2)"), p("sqrt(x)"));
  }

  #[test]
  fn two_argument_log() {
    assert_eq!(p("log(8, 2)"), p("log(8)/log(2)"));
  }

  #[test]
  fn undefined_functions_stay_calls() {
    assert_eq!(ascii(&p("f(x) + 1")), "f(x) + 1");
  }
}

mod errors {
  use super::*;

  #[test]
  fn dangling_operator() {
    let err = parse_expression("x +").unwrap_err();
    assert!(matches!(err, SymcalcError::ParseError { .. }));
    assert!(err.to_string().contains("'x +'"));
  }

  #[test]
  fn unbalanced_parenthesis() {
    assert!(parse_expression("(x + 1").is_err());
  }

  #[test]
  fn empty() {
    assert!(matches!(parse_expression(""), Err(SymcalcError::EmptyInput)));
  }
}
