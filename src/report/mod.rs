//! Reporting utilities: comparison table, deviation against a baseline, plot bounds.

pub mod format;

use crate::domain::{ComparisonColumn, ComparisonTable, CurvePrediction, ErrorReport, Method};
use crate::error::{IprError, IprResult};

/// Align curves that share one pressure grid into a single table.
pub fn build_comparison(curves: &[CurvePrediction]) -> IprResult<ComparisonTable> {
    let Some(first) = curves.first() else {
        return Err(IprError::validation("no curves to compare"));
    };
    let pressures = first.pressures();
    for c in &curves[1..] {
        if c.pressures() != pressures {
            return Err(IprError::validation(format!(
                "{} and {} were evaluated on different pressure grids",
                first.method, c.method
            )));
        }
    }

    Ok(ComparisonTable {
        pressures,
        columns: curves
            .iter()
            .map(|c| ComparisonColumn {
                method: c.method,
                rates: c.rates(),
            })
            .collect(),
    })
}

impl ComparisonTable {
    pub fn column(&self, method: Method) -> Option<&ComparisonColumn> {
        self.columns.iter().find(|c| c.method == method)
    }
}

/// Mean absolute percentage deviation of `rates` from `baseline`.
///
/// Points where the baseline is zero are excluded.
pub fn error_report(
    method: Method,
    rates: &[f64],
    baseline_method: Method,
    baseline: &[f64],
) -> IprResult<ErrorReport> {
    if rates.len() != baseline.len() {
        return Err(IprError::validation(format!(
            "{method} has {} rates but baseline {baseline_method} has {}",
            rates.len(),
            baseline.len()
        )));
    }
    let deviations: Vec<f64> = rates
        .iter()
        .zip(baseline)
        .filter(|&(_, &b)| b != 0.0)
        .map(|(&q, &b)| ((q - b) / b).abs())
        .collect();
    if deviations.is_empty() {
        return Err(IprError::numerical(
            method,
            format!("baseline {baseline_method} is zero at every grid point"),
        ));
    }

    let mape = deviations.iter().sum::<f64>() / deviations.len() as f64 * 100.0;
    Ok(ErrorReport {
        method,
        baseline: baseline_method,
        mean_absolute_percent_error: mape,
        points_used: deviations.len(),
    })
}

/// Deviation of every non-baseline column against the baseline column.
pub fn error_reports(table: &ComparisonTable, baseline: Method) -> IprResult<Vec<ErrorReport>> {
    let Some(base) = table.column(baseline) else {
        return Err(IprError::validation(format!(
            "baseline {baseline} is not among the computed curves"
        )));
    };
    table
        .columns
        .iter()
        .filter(|c| c.method != baseline)
        .map(|c| error_report(c.method, &c.rates, baseline, &base.rates))
        .collect()
}

/// Axis extents for plotting: data maxima plus a margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotBounds {
    pub rate_max: f64,
    pub pressure_max: f64,
}

impl PlotBounds {
    /// Compute bounds over all curves; `margin` is a fraction of each maximum.
    ///
    /// Empty or all-zero input still yields positive extents.
    pub fn from_curves(curves: &[CurvePrediction], margin: f64) -> Self {
        let mut rate_max: f64 = 0.0;
        let mut pressure_max: f64 = 0.0;
        for c in curves {
            for p in &c.points {
                if p.rate.is_finite() {
                    rate_max = rate_max.max(p.rate);
                }
                if p.pressure.is_finite() {
                    pressure_max = pressure_max.max(p.pressure);
                }
            }
        }
        Self {
            rate_max: with_margin(rate_max, margin),
            pressure_max: with_margin(pressure_max, margin),
        }
    }
}

fn with_margin(max: f64, margin: f64) -> f64 {
    if max > 0.0 { max * (1.0 + margin.max(0.0)) } else { 1.0 }
}
