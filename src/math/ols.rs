//! Least-squares line fitting.
//!
//! Every gas method reduces to a straight-line fit `y = slope·x + intercept` after a
//! method-specific transform. We solve it as a two-column least-squares problem
//! (`[1, x]` design matrix) with SVD, the same way for every caller.

use nalgebra::{DMatrix, DVector};

use crate::domain::RegressionDiagnostics;
use crate::error::{IprError, IprResult};

/// Label used in errors raised before a caller attaches its method name.
const ENGINE: &str = "linear regression";

/// Relative threshold below which the x spread is treated as zero.
const MIN_REL_VARIANCE: f64 = 1e-24;

/// Result of a straight-line fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub n: usize,
    pub r_squared: f64,
    pub sse: f64,
}

impl LinearFit {
    /// Diagnostics for reporting, given how many points were masked before the fit.
    pub fn diagnostics(&self, n_masked: usize) -> RegressionDiagnostics {
        RegressionDiagnostics {
            n_used: self.n,
            n_masked,
            r_squared: self.r_squared,
            sse: self.sse,
        }
    }
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y = slope·x + intercept` by ordinary least squares.
///
/// Pairs where either value is non-finite are dropped first.
///
/// # Errors
/// `IprError::Numerical` when the inputs differ in length, fewer than two usable pairs
/// remain, or `x` has zero variance.
pub fn fit_line(x: &[f64], y: &[f64]) -> IprResult<LinearFit> {
    if x.len() != y.len() {
        return Err(IprError::numerical(
            ENGINE,
            format!("x and y lengths differ ({} vs {})", x.len(), y.len()),
        ));
    }

    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    let n = pairs.len();
    if n < 2 {
        return Err(IprError::numerical(
            ENGINE,
            format!("need at least 2 valid points, got {n}"),
        ));
    }

    let x_mean = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let sxx: f64 = pairs.iter().map(|p| (p.0 - x_mean).powi(2)).sum();
    let scale = pairs.iter().map(|p| p.0 * p.0).sum::<f64>().max(f64::MIN_POSITIVE);
    if sxx <= MIN_REL_VARIANCE * scale {
        return Err(IprError::numerical(
            ENGINE,
            format!("x values have zero variance (all ≈ {x_mean})"),
        ));
    }

    // Center x so the design matrix stays well conditioned for log-scale inputs.
    let mut design = DMatrix::<f64>::zeros(n, 2);
    let mut obs = DVector::<f64>::zeros(n);
    for (i, &(xi, yi)) in pairs.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = xi - x_mean;
        obs[i] = yi;
    }

    let beta = solve_least_squares(&design, &obs)
        .ok_or_else(|| IprError::numerical(ENGINE, "least-squares system is singular"))?;
    let slope = beta[1];
    let intercept = beta[0] - slope * x_mean;

    let y_mean = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;
    let mut sse = 0.0;
    let mut sst = 0.0;
    for &(xi, yi) in &pairs {
        let r = yi - (slope * xi + intercept);
        sse += r * r;
        sst += (yi - y_mean).powi(2);
    }
    let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { 1.0 };

    Ok(LinearFit {
        slope,
        intercept,
        n,
        r_squared,
        sse,
    })
}
