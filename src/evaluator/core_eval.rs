use crate::syntax::Expr;

use super::{add, apply_function, mul, pow};

/// Rebuild `expr` with every direct child mapped through `f`, restoring
/// canonical form on the way up.
pub fn map_children<F>(expr: &Expr, mut f: F) -> Expr
where
  F: FnMut(&Expr) -> Expr,
{
  match expr {
    Expr::Plus(terms) => add(terms.iter().map(&mut f).collect()),
    Expr::Times(factors) => mul(factors.iter().map(&mut f).collect()),
    Expr::Power(base, exp) => pow(f(base), f(exp)),
    Expr::Function(func, arg) => apply_function(*func, f(arg)),
    Expr::FunctionCall { name, args } => {
      Expr::call(name.clone(), args.iter().map(&mut f).collect())
    }
    leaf => leaf.clone(),
  }
}

/// Canonicalize a tree built from raw variants.
pub fn rebuild(expr: &Expr) -> Expr {
  map_children(expr, rebuild)
}

/// Replace every occurrence of `target` by `replacement`.
///
/// Bound variables of unevaluated integrals and derivatives are left alone.
pub fn replace(expr: &Expr, target: &Expr, replacement: &Expr) -> Expr {
  if expr == target {
    return replacement.clone();
  }
  if let Expr::FunctionCall { name, args } = expr {
    if binds(name, args, target) {
      return expr.clone();
    }
  }
  map_children(expr, |child| replace(child, target, replacement))
}

fn binds(name: &str, args: &[Expr], target: &Expr) -> bool {
  if !matches!(name, "Integral" | "Derivative") {
    return false;
  }
  args.iter().skip(1).any(|limits| match limits {
    Expr::FunctionCall { name, args } if name == "Tuple" => {
      args.first() == Some(target)
    }
    other => other == target,
  })
}

pub fn substitute(expr: &Expr, name: &str, value: &Expr) -> Expr {
  replace(expr, &Expr::symbol(name), value)
}

/// Apply substitutions one after the other, in the order given.
pub fn substitute_all(expr: &Expr, subs: &[(String, Expr)]) -> Expr {
  subs
    .iter()
    .fold(expr.clone(), |acc, (name, value)| substitute(&acc, name, value))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_expression;

  #[test]
  fn substitution_restores_canonical_form() {
    let expr = parse_expression("x**2 + 2*x + 1").unwrap();
    assert_eq!(substitute(&expr, "x", &Expr::int(3)), Expr::int(16));
  }

  #[test]
  fn substitutions_apply_in_order() {
    let expr = parse_expression("x + y").unwrap();
    let subs = vec![
      ("x".to_string(), Expr::symbol("y")),
      ("y".to_string(), Expr::int(2)),
    ];
    assert_eq!(substitute_all(&expr, &subs), Expr::int(4));
  }
}
