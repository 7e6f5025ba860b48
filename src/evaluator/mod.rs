//! Canonical construction of expressions.
//!
//! Every `Expr` handed around by the engine is built through these
//! constructors, which perform the automatic simplifications users expect
//! from a CAS: flattening, numeric folding, collecting like terms, combining
//! equal bases and evaluating elementary functions at special points.

mod arithmetic;
mod core_eval;
mod elementary;
mod numeric;
mod ordering;

pub use arithmetic::*;
pub use core_eval::*;
pub use elementary::*;
pub use numeric::*;
pub use ordering::*;
