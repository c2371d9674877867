//! `ipr-curves` library crate.
//!
//! The binary (`ipr`) is a thin wrapper around this library so that:
//!
//! - the fitting core is testable without spawning processes
//! - gas and oil runs can be driven from other tools
//!
//! Layout: `math` (regression, grids, roots) and `models` (closed-form IPR laws) are the
//! core; `fit` turns test data into fitted models and curves; `report`, `plot` and `io`
//! present and persist them; `app` and `cli` make up the binary shell.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
