//! Polynomial and rational-function algebra over ℚ.
//!
//! Expand, Factor, Cancel, Together, Simplify and Solve.

mod expand;
mod factor;
mod poly;
mod simplify;
mod solve;
mod together;

pub use expand::*;
pub use factor::*;
pub use poly::*;
pub use simplify::*;
pub use solve::*;
pub use together::*;
