//! Mathematical utilities: least squares, pressure grids, quadratic roots.

pub mod grid;
pub mod ols;
pub mod quadratic;

pub use grid::*;
pub use ols::*;
pub use quadratic::*;
