use super::*;

#[test]
fn latex_uses_commands() {
  let latex = latex_expr("sin(x)^2 + cos(x)^2").unwrap();
  assert!(latex.contains("\\sin"));
  assert!(latex.contains("\\cos"));
}

#[test]
fn latex_fraction() {
  assert_eq!(latex_expr("x**3/3").unwrap(), "\\frac{x^{3}}{3}");
}

#[test]
fn latex_sum_in_denominator() {
  assert_eq!(
    latex_expr("sqrt(x)/(x+1)").unwrap(),
    "\\frac{\\sqrt{x}}{x + 1}"
  );
}

#[test]
fn unicode_output() {
  assert_eq!(in_notation(&p("x**2 + 2*x"), Notation::Unicode), "x² + 2⋅x");
  assert_eq!(in_notation(&p("sqrt(x)"), Notation::Unicode), "√x");
}

#[test]
fn unicode_sets() {
  let solutions = solve_expr("x^2 = 9", Some("x")).unwrap();
  assert_eq!(in_notation(&solutions, Notation::Unicode), "{-3, 3}");
  assert_eq!(in_notation(&SolutionSet::Empty, Notation::Unicode), "∅");
}

#[test]
fn latex_sets() {
  let solutions = solve_expr("x^2 = 9", Some("x")).unwrap();
  assert_eq!(
    in_notation(&solutions, Notation::Latex),
    "\\left\\{-3, 3\\right\\}"
  );
}

#[test]
fn float_digits_are_configurable() {
  let options = FormatOptions {
    notation: Notation::Ascii,
    digits: 4,
  };
  let value = eval_expr("pi", &[], true).unwrap();
  assert_eq!(value.render(&options), "3.142");
}
