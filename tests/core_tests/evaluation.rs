use super::*;

fn subs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
  pairs
    .iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

#[test]
fn numeric_substitution() {
  let value =
    eval_expr("x**2+y**2", &subs(&[("x", "3"), ("y", "4")]), true).unwrap();
  assert_eq!(ascii(&value), "25");
}

#[test]
fn exact_substitution() {
  let value = eval_expr("x**2+y**2", &subs(&[("x", "3"), ("y", "4")]), false)
    .unwrap();
  assert_eq!(value, Expr::int(25));
}

#[test]
fn partial_substitution_keeps_symbols() {
  let value = eval_expr("x + y", &subs(&[("x", "1")]), false).unwrap();
  assert_eq!(ascii(&value), "y + 1");
}

#[test]
fn substitutions_apply_in_order() {
  let value =
    eval_expr("x", &subs(&[("x", "y + 1"), ("y", "2")]), false).unwrap();
  assert_eq!(value, Expr::int(3));
}

#[test]
fn numeric_constants() {
  assert_eq!(ascii(&eval_expr("pi", &[], true).unwrap()), "3.14159265358979");
  assert_eq!(ascii(&eval_expr("sqrt(2)", &[], true).unwrap()), "1.4142135623731");
}

#[test]
fn invalid_substitution_value() {
  assert!(eval_expr("x", &subs(&[("x", "2 +")]), false).is_err());
}
