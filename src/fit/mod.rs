//! Fitting and curve construction.
//!
//! Responsibilities:
//!
//! - linearize gas test data and regress each deliverability method
//! - classify the oil reservoir regime and invert the single-test oil methods
//! - evaluate every fitted model over its pressure grid

pub mod curve;
pub mod gas;
pub mod oil;
pub mod regime;

pub use curve::*;
pub use gas::*;
pub use oil::*;
pub use regime::*;
