// Functions are organized by categories
pub mod calculus_ast;
pub mod polynomial_ast;
