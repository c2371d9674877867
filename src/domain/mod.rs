//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input records (`GasTestPoint`, `GasDataset`, `OilInput`, `ReservoirState`)
//! - method tags (`Method`) and run configuration (`GasConfig`, `OilConfig`)
//! - fit outputs (`CurvePrediction`, `ComparisonTable`, `ErrorReport`, `RunFile`)

pub mod types;

pub use types::*;
