use super::*;

#[test]
fn quadratic_equation() {
  let solutions = solve_expr("x^2 = 9", Some("x")).unwrap();
  assert_eq!(ascii(&solutions), "{-3, 3}");
}

#[test]
fn complex_roots() {
  let solutions = solve_expr("x**2 + 1", Some("x")).unwrap();
  assert_eq!(ascii(&solutions), "{-I, I}");
}

#[test]
fn linear_equation_with_default_variable() {
  assert_eq!(ascii(&solve_expr("2*x - 4", None).unwrap()), "{2}");
}

#[test]
fn eq_call_form() {
  let solutions = solve_expr("Eq(x**2, 9)", None).unwrap();
  assert_eq!(ascii(&solutions), "{-3, 3}");
}

#[test]
fn constant_equations() {
  assert_eq!(solve_expr("1 = 2", None).unwrap(), SolutionSet::Empty);
  assert_eq!(solve_expr("y = y + 1", Some("x")).unwrap(), SolutionSet::Empty);
  assert_eq!(solve_expr("x - x", Some("x")).unwrap(), SolutionSet::Complexes);
}

#[test]
fn solutions_satisfy_the_equation() {
  let equation = "x**3 - 6*x**2 + 11*x - 6";
  let SolutionSet::Finite(roots) = solve_expr(equation, Some("x")).unwrap()
  else {
    panic!("expected finitely many roots");
  };
  assert_eq!(roots.len(), 3);
  for root in roots {
    let value = eval_expr(equation, &[("x".to_string(), root.to_string())], false)
      .unwrap();
    assert_eq!(value, Expr::zero());
  }
}

#[test]
fn periodic_families() {
  let solutions = solve_expr("exp(x) = 1", Some("x")).unwrap();
  assert!(matches!(solutions, SolutionSet::ImageSet { .. }));
}
