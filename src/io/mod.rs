//! Input/output helpers.
//!
//! - CSV ingest + row validation (`ingest`)
//! - comparison table CSV export (`export`)
//! - run JSON read/write (`curve`)

pub mod curve;
pub mod export;
pub mod ingest;

pub use curve::*;
pub use export::*;
pub use ingest::*;
