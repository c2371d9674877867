//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{IprError, IprResult};

/// Deliverability method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Simplified backpressure: `Qg = C (Pr² - Pwf²)^n`.
    Backpressure,
    /// LIT with pressure-squared drawdown.
    LitPressureSquared,
    /// LIT with the pressure-approximation drawdown `Pr - Pwf`.
    LitPressureApprox,
    /// LIT with pseudopressure drawdown `ψr - m(Pwf)`.
    #[value(alias = "pseudo")]
    LitPseudopressure,
    Vogel,
    ConstantJ,
    Fetkovich,
}

impl Method {
    /// Gas methods in report order.
    pub const GAS: [Method; 4] = [
        Method::Backpressure,
        Method::LitPressureSquared,
        Method::LitPressureApprox,
        Method::LitPseudopressure,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Method::Backpressure => "Simplified Backpressure",
            Method::LitPressureSquared => "LIT Pressure-Squared",
            Method::LitPressureApprox => "LIT Pressure-Approximation",
            Method::LitPseudopressure => "LIT Pseudopressure",
            Method::Vogel => "Vogel",
            Method::ConstantJ => "Constant-J",
            Method::Fetkovich => "Fetkovich",
        }
    }

    /// Short label used for table columns and CSV headers.
    pub fn column_label(self) -> &'static str {
        match self {
            Method::Backpressure => "backpressure",
            Method::LitPressureSquared => "lit_p2",
            Method::LitPressureApprox => "lit_p",
            Method::LitPseudopressure => "lit_mp",
            Method::Vogel => "vogel",
            Method::ConstantJ => "constant_j",
            Method::Fetkovich => "fetkovich",
        }
    }

    pub fn fluid(self) -> Fluid {
        match self {
            Method::Backpressure
            | Method::LitPressureSquared
            | Method::LitPressureApprox
            | Method::LitPseudopressure => Fluid::Gas,
            Method::Vogel | Method::ConstantJ | Method::Fetkovich => Fluid::Oil,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fluid {
    Gas,
    Oil,
}

/// How `m(p)` is projected onto the pressure grid for the pseudopressure method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MpProjection {
    /// `m(p) = k p²` with `k = ψr / max(Pwf)²`.
    Quadratic,
    /// Piecewise-linear interpolation in the measured `(Pwf, m)` pairs, anchored at `m(0) = 0`.
    Tabulated,
}

/// One measured gas test point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasTestPoint {
    pub pwf: f64,
    pub rate: f64,
    pub pseudopressure: Option<f64>,
}

/// A validated set of gas test points.
#[derive(Debug, Clone)]
pub struct GasDataset {
    points: Vec<GasTestPoint>,
}

impl GasDataset {
    /// Validate and wrap test points.
    ///
    /// Pressures and rates must be finite and non-negative. Zero-rate points are kept;
    /// they are masked later by each method.
    pub fn new(points: Vec<GasTestPoint>) -> IprResult<Self> {
        if points.is_empty() {
            return Err(IprError::validation("gas dataset has no test points"));
        }
        for (i, p) in points.iter().enumerate() {
            if !(p.pwf.is_finite() && p.pwf >= 0.0) {
                return Err(IprError::validation(format!(
                    "point {}: flowing pressure must be finite and >= 0 (got {})",
                    i + 1,
                    p.pwf
                )));
            }
            if !(p.rate.is_finite() && p.rate >= 0.0) {
                return Err(IprError::validation(format!(
                    "point {}: gas rate must be finite and >= 0 (got {})",
                    i + 1,
                    p.rate
                )));
            }
            if let Some(m) = p.pseudopressure {
                if !(m.is_finite() && m >= 0.0) {
                    return Err(IprError::validation(format!(
                        "point {}: pseudopressure must be finite and >= 0 (got {m})",
                        i + 1
                    )));
                }
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[GasTestPoint] {
        &self.points
    }

    /// Maximum observed flowing pressure, used as the reservoir pressure proxy.
    pub fn reservoir_pressure(&self) -> f64 {
        self.points.iter().map(|p| p.pwf).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Largest measured rate.
    pub fn max_rate(&self) -> f64 {
        self.points.iter().map(|p| p.rate).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Absolute open flow: the rate at the final grid point (pressure 0).
    pub fn aof(&self) -> f64 {
        self.points.last().map(|p| p.rate).unwrap_or(f64::NAN)
    }

    pub fn pressures(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.pressure).collect()
    }

    pub fn rates(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.rate).collect()
    }

    /// Rate never drops as pressure decreases (within a small relative tolerance).
    pub fn is_rate_monotone(&self) -> bool {
        self.points.windows(2).all(|w| {
            let tol = 1e-9 * w[0].rate.abs().max(1.0);
            w[1].rate >= w[0].rate - tol
        })
    }
}

/// Curves sharing one pressure grid, aligned row by row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub pressures: Vec<f64>,
    pub columns: Vec<ComparisonColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonColumn {
    pub method: Method,
    pub rates: Vec<f64>,
}

/// Mean absolute percentage deviation of one method against a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub method: Method,
    pub baseline: Method,
    pub mean_absolute_percent_error: f64,
    /// Grid points where the baseline is non-zero (the rest are excluded).
    pub points_used: usize,
}

/// A named fitted parameter (for equation display and exports).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

/// Per-method summary stored in the run file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSummary {
    pub method: Method,
    pub equation: String,
    pub parameters: Vec<NamedValue>,
    pub aof: f64,
    pub bubble_point_rate: Option<f64>,
}

/// A saved run (JSON), re-plottable with `ipr plot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub fluid: Fluid,
    pub reservoir_pressure: f64,
    pub bubble_point: Option<f64>,
    pub methods: Vec<MethodSummary>,
    pub curves: Vec<CurvePrediction>,
    pub errors: Vec<ErrorReport>,
}

/// Parameters for synthetic gas data generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSpec {
    pub seed: u64,
    pub n_points: usize,
    pub c: f64,
    pub n: f64,
    pub reservoir_pressure: f64,
    /// Relative standard deviation of multiplicative rate noise (0 = exact).
    pub noise: f64,
}

/// Where gas test points come from.
#[derive(Debug, Clone, PartialEq)]
pub enum GasSource {
    Csv(PathBuf),
    /// The built-in four-point dataset.
    BuiltIn,
    Synthetic(SampleSpec),
}

/// Where the oil input record comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum OilSource {
    Csv(PathBuf),
    Inline(OilInput),
}

/// Output options shared by the gas and oil commands.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_table: Option<PathBuf>,
    pub export_curves: Option<PathBuf>,
}

/// A gas run's configuration as understood by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct GasConfig {
    pub source: GasSource,
    pub grid_points: usize,
    pub baseline: Method,
    pub mp_projection: MpProjection,
    pub output: OutputConfig,
}

/// An oil run's configuration as understood by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct OilConfig {
    pub source: OilSource,
    pub segment_points: usize,
    pub baseline: Method,
    pub output: OutputConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(pressure: f64, rate: f64) -> CurvePoint {
        CurvePoint { pressure, rate }
    }

    #[test]
    fn curve_rejects_grid_not_ending_at_zero() {
        let err = CurvePrediction::new(Method::Vogel, vec![pt(10.0, 0.0), pt(5.0, 1.0)]).unwrap_err();
        assert!(matches!(err, IprError::Validation(_)));
    }

    #[test]
    fn curve_rejects_repeated_pressure() {
        let pts = vec![pt(10.0, 0.0), pt(10.0, 1.0), pt(0.0, 2.0)];
        assert!(CurvePrediction::new(Method::Vogel, pts).is_err());
    }

    #[test]
    fn aof_is_last_rate() {
        let c = CurvePrediction::new(Method::ConstantJ, vec![pt(10.0, 0.0), pt(0.0, 7.5)]).unwrap();
        assert_eq!(c.aof(), 7.5);
        assert!(c.is_rate_monotone());
    }

    #[test]
    fn saturated_without_bubble_point() {
        assert!(ReservoirState { pws: 2000.0, pb: None }.is_saturated());
        assert!(ReservoirState { pws: 2000.0, pb: Some(2500.0) }.is_saturated());
        assert!(!ReservoirState { pws: 2500.0, pb: Some(2500.0) }.is_saturated());
    }

    #[test]
    fn oil_validation_rejects_pwf_above_pws() {
        let input = OilInput {
            reservoir: ReservoirState { pws: 2000.0, pb: Some(2500.0) },
            test: RateTest { pwf: 2100.0, rate: 300.0 },
            second_test: None,
        };
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("cannot exceed"));
    }

    #[test]
    fn gas_dataset_rejects_negative_rate() {
        let err = GasDataset::new(vec![GasTestPoint { pwf: 100.0, rate: -1.0, pseudopressure: None }]);
        assert!(err.is_err());
    }
}
