//! Terminal plotting.

mod ascii;

pub use ascii::*;
