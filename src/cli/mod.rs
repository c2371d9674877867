//! Command-line parsing for the IPR curve tool.
//!
//! Argument parsing stays here; `app` turns the parsed args into plain `GasConfig` /
//! `OilConfig` values before any computation runs. Every flag can also come from an
//! `IPR_*` environment variable (or a `.env` file).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Method, MpProjection};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ipr", version, about = "Inflow Performance Relationship curves for gas and oil wells")]
pub struct Cli {
    /// Log filter used when `RUST_LOG` is not set (error, warn, info, debug, trace).
    #[arg(long, global = true, env = "IPR_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the gas deliverability methods to multi-rate test data.
    Gas(GasArgs),
    /// Build oil IPR curves from one (or two) well tests.
    Oil(OilArgs),
    /// Plot a previously exported run JSON.
    Plot(PlotArgs),
}

#[derive(Debug, Args, Clone)]
pub struct GasArgs {
    /// Test data CSV: `Pwf, m(p), Qg` per row (header optional).
    #[arg(long, value_name = "FILE", env = "IPR_GAS_CSV", conflicts_with = "sample")]
    pub csv: Option<PathBuf>,

    /// Use a seeded synthetic backpressure sample instead of the built-in field test.
    #[arg(long)]
    pub sample: bool,

    /// Random seed for the synthetic sample.
    #[arg(long, env = "IPR_SEED", default_value_t = 42)]
    pub seed: u64,

    /// Number of synthetic test points (including the shut-in point).
    #[arg(long, default_value_t = 6)]
    pub sample_points: usize,

    /// Backpressure coefficient C of the synthetic sample.
    #[arg(long, default_value_t = 0.01)]
    pub sample_c: f64,

    /// Backpressure exponent n of the synthetic sample.
    #[arg(long, default_value_t = 0.8)]
    pub sample_n: f64,

    /// Reservoir pressure of the synthetic sample.
    #[arg(long, default_value_t = 3000.0)]
    pub sample_pr: f64,

    /// Relative log-normal noise on synthetic rates (0 = exact).
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,

    /// Number of points on the prediction grid (Pr down to 0).
    #[arg(long, env = "IPR_GRID_POINTS", default_value_t = 20)]
    pub grid_points: usize,

    /// Method the others are compared against.
    #[arg(long, value_enum, default_value_t = Method::LitPseudopressure)]
    pub baseline: Method,

    /// How m(p) is projected onto the prediction grid.
    #[arg(long, value_enum, env = "IPR_MP_PROJECTION", default_value_t = MpProjection::Quadratic)]
    pub mp_projection: MpProjection,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct OilArgs {
    /// Input CSV with a single row: `Pb, Pws, Pwf, Qwf[, Pwf1, Qwf1]`.
    #[arg(long, value_name = "FILE", env = "IPR_OIL_CSV", conflicts_with_all = ["pb", "pws", "pwf", "qwf", "pwf2", "qwf2"])]
    pub csv: Option<PathBuf>,

    /// Bubble point pressure (omit for a saturated reservoir).
    #[arg(long, env = "IPR_PB")]
    pub pb: Option<f64>,

    /// Stabilized reservoir pressure.
    #[arg(long, env = "IPR_PWS", required_unless_present = "csv")]
    pub pws: Option<f64>,

    /// Flowing bottom-hole pressure of the test.
    #[arg(long, env = "IPR_PWF", required_unless_present = "csv")]
    pub pwf: Option<f64>,

    /// Oil rate measured at `--pwf`.
    #[arg(long, env = "IPR_QWF", required_unless_present = "csv")]
    pub qwf: Option<f64>,

    /// Flowing pressure of a second test (Fetkovich, saturated reservoirs).
    #[arg(long, requires = "qwf2")]
    pub pwf2: Option<f64>,

    /// Oil rate of the second test.
    #[arg(long, requires = "pwf2")]
    pub qwf2: Option<f64>,

    /// Grid points per pressure segment.
    #[arg(long, env = "IPR_SEGMENT_POINTS", default_value_t = 10)]
    pub segment_points: usize,

    /// Method the others are compared against.
    #[arg(long, value_enum, default_value_t = Method::Vogel)]
    pub baseline: Method,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Plot and export options shared by `gas` and `oil`.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, env = "IPR_PLOT_WIDTH", default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, env = "IPR_PLOT_HEIGHT", default_value_t = 24)]
    pub height: usize,

    /// Export the comparison table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the full run (parameters, curves, deviations) to JSON.
    #[arg(long = "export-curves", value_name = "JSON")]
    pub export_curves: Option<PathBuf>,
}

/// Options for plotting a saved run.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Run JSON file produced by `--export-curves`.
    #[arg(long, value_name = "JSON")]
    pub curves: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 24)]
    pub height: usize,
}
