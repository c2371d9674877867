//! IPR model implementations.
//!
//! Models are plain parameter sets with a pure `pressure -> rate` rule so that the
//! gas and oil fitting code can share one curve driver.

pub mod model;

pub use model::*;
