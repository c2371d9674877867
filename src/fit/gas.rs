//! Gas deliverability methods.
//!
//! All four methods share one shape:
//!
//! 1. mask points with non-positive rate or drawdown
//! 2. transform the survivors to a straight line
//! 3. fit the line (least squares)
//! 4. invert the fit into an [`IprModel`]
//! 5. evaluate it over `Pr .. 0`
//!
//! `Pr` is the largest observed flowing pressure.

use tracing::{debug, warn};

use crate::domain::{CurvePrediction, GasDataset, Method, MpProjection};
use crate::error::{IprError, IprResult};
use crate::fit::curve::evaluate_curve;
use crate::math::{PressureGrid, fit_line};
use crate::models::{Drawdown, FittedModel, IprModel, MpCurve};

/// Range of backpressure exponents considered physical (Darcy to fully turbulent).
const BACKPRESSURE_N_RANGE: (f64, f64) = (0.5, 1.0);

/// Options for the gas methods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasFitOptions {
    /// Number of grid points from `Pr` down to 0.
    pub grid_points: usize,
    pub mp_projection: MpProjection,
}

impl Default for GasFitOptions {
    fn default() -> Self {
        Self {
            grid_points: 20,
            mp_projection: MpProjection::Quadratic,
        }
    }
}

/// A fitted gas method and its predicted curve.
#[derive(Debug, Clone)]
pub struct GasMethodResult {
    pub fitted: FittedModel,
    pub curve: CurvePrediction,
}

impl GasMethodResult {
    pub fn aof(&self) -> f64 {
        self.curve.aof()
    }
}

/// Outcome of running every gas method on one dataset.
#[derive(Debug, Clone)]
pub struct GasFitSet {
    pub results: Vec<GasMethodResult>,
    /// Methods that failed, with the error that stopped them.
    pub failed: Vec<(Method, IprError)>,
}

impl GasFitSet {
    pub fn get(&self, method: Method) -> Option<&GasMethodResult> {
        self.results.iter().find(|r| r.fitted.method == method)
    }

    pub fn curves(&self) -> Vec<CurvePrediction> {
        self.results.iter().map(|r| r.curve.clone()).collect()
    }
}

/// Run all four gas methods.
///
/// A failing method does not stop the others; it is recorded in `failed`. The call only
/// fails when no method succeeds.
pub fn fit_all_gas(dataset: &GasDataset, opts: &GasFitOptions) -> IprResult<GasFitSet> {
    let mut results = Vec::new();
    let mut failed = Vec::new();

    for method in Method::GAS {
        match fit_gas_method(method, dataset, opts) {
            Ok(r) => results.push(r),
            Err(e) => {
                warn!(method = %method, error = %e, "gas method failed");
                failed.push((method, e));
            }
        }
    }

    if results.is_empty() {
        if let Some((_, first)) = failed.into_iter().next() {
            return Err(first);
        }
        return Err(IprError::validation("no gas methods were run"));
    }

    Ok(GasFitSet { results, failed })
}

/// Fit one gas method and evaluate its curve.
pub fn fit_gas_method(
    method: Method,
    dataset: &GasDataset,
    opts: &GasFitOptions,
) -> IprResult<GasMethodResult> {
    let pr = dataset.reservoir_pressure();
    if !(pr.is_finite() && pr > 0.0) {
        return Err(IprError::validation(format!(
            "maximum flowing pressure must be > 0 to act as reservoir pressure (got {pr})"
        )));
    }

    let fitted = fit_gas_model(method, dataset, pr, opts.mp_projection)?;
    let grid = PressureGrid::single(pr, opts.grid_points)?;
    let curve = evaluate_curve(&fitted, &grid)?;

    debug!(
        method = %method,
        aof = curve.aof(),
        params = ?fitted.parameters(),
        "gas method fitted"
    );
    Ok(GasMethodResult { fitted, curve })
}

/// Masked, linearized regression inputs.
struct Linearized {
    x: Vec<f64>,
    y: Vec<f64>,
    n_masked: usize,
}

impl Linearized {
    fn collect(pairs: impl Iterator<Item = Option<(f64, f64)>>) -> Self {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut n_masked = 0;
        for pair in pairs {
            match pair {
                Some((xi, yi)) => {
                    x.push(xi);
                    y.push(yi);
                }
                None => n_masked += 1,
            }
        }
        Self { x, y, n_masked }
    }
}

fn fit_gas_model(
    method: Method,
    dataset: &GasDataset,
    pr: f64,
    projection: MpProjection,
) -> IprResult<FittedModel> {
    let points = dataset.points();

    match method {
        Method::Backpressure => {
            let lin = Linearized::collect(points.iter().map(|p| {
                let dp2 = pr * pr - p.pwf * p.pwf;
                (p.rate > 0.0 && dp2 > 0.0).then(|| (dp2.ln(), p.rate.ln()))
            }));
            let (fit, diagnostics) = regress(method, &lin, points.len())?;
            let n = fit.slope;
            let c = fit.intercept.exp();
            if !(BACKPRESSURE_N_RANGE.0..=BACKPRESSURE_N_RANGE.1).contains(&n) {
                warn!(
                    n,
                    "backpressure exponent outside the physical range [{}, {}]",
                    BACKPRESSURE_N_RANGE.0,
                    BACKPRESSURE_N_RANGE.1
                );
            }
            Ok(FittedModel::new(method, IprModel::Backpressure { c, n, pr }).with_diagnostics(diagnostics))
        }
        Method::LitPressureSquared => {
            let drawdown = Drawdown::PressureSquared { pr };
            fit_lit(method, dataset, drawdown, |p| pr * pr - p.pwf * p.pwf)
        }
        Method::LitPressureApprox => {
            let drawdown = Drawdown::Pressure { pr };
            fit_lit(method, dataset, drawdown, |p| pr - p.pwf)
        }
        Method::LitPseudopressure => {
            let mut mp = Vec::with_capacity(points.len());
            for (i, p) in points.iter().enumerate() {
                let Some(m) = p.pseudopressure else {
                    return Err(IprError::validation(format!(
                        "{method} requires a pseudopressure value for every test point (missing at point {})",
                        i + 1
                    )));
                };
                mp.push((p.pwf, m));
            }
            let psi_r = mp.iter().map(|&(_, m)| m).fold(f64::NEG_INFINITY, f64::max);
            let curve = match projection {
                MpProjection::Quadratic => MpCurve::Quadratic { k: psi_r / (pr * pr) },
                MpProjection::Tabulated => MpCurve::Tabulated { knots: tabulate(&mp, pr, psi_r) },
            };
            let drawdown = Drawdown::Pseudo { psi_r, mp: curve };
            fit_lit(method, dataset, drawdown, |p| psi_r - p.pseudopressure.unwrap_or(f64::NAN))
        }
        other => Err(IprError::validation(format!("{other} is not a gas method"))),
    }
}

/// LIT fit: regress `Δ/q` on `q`, giving `a` (intercept) and `b` (slope).
fn fit_lit(
    method: Method,
    dataset: &GasDataset,
    drawdown: Drawdown,
    delta: impl Fn(&crate::domain::GasTestPoint) -> f64,
) -> IprResult<FittedModel> {
    let points = dataset.points();
    let lin = Linearized::collect(points.iter().map(|p| {
        let d = delta(p);
        (p.rate > 0.0 && d > 0.0).then(|| (p.rate, d / p.rate))
    }));
    let (fit, diagnostics) = regress(method, &lin, points.len())?;
    let (a, b) = (fit.intercept, fit.slope);
    if b == 0.0 {
        return Err(IprError::invalid_model(
            method,
            format!("fitted turbulence coefficient b is zero (a={a})"),
        ));
    }
    Ok(FittedModel::new(method, IprModel::Lit { a, b, drawdown }).with_diagnostics(diagnostics))
}

fn regress(
    method: Method,
    lin: &Linearized,
    total: usize,
) -> IprResult<(crate::math::LinearFit, crate::domain::RegressionDiagnostics)> {
    if lin.x.len() < 2 {
        return Err(IprError::numerical(
            method,
            format!(
                "only {} of {total} test points survive masking (need >= 2 with rate > 0 and positive drawdown)",
                lin.x.len()
            ),
        ));
    }
    if lin.n_masked > 0 {
        debug!(method = %method, masked = lin.n_masked, "masked test points");
    }
    let fit = fit_line(&lin.x, &lin.y).map_err(|e| e.for_method(method))?;
    Ok((fit, fit.diagnostics(lin.n_masked)))
}

/// Sorted `(pressure, m)` knots anchored at `(0, 0)` and `(Pr, ψr)`; the larger value
/// wins on tied pressures.
fn tabulate(mp: &[(f64, f64)], pr: f64, psi_r: f64) -> Vec<(f64, f64)> {
    let mut knots: Vec<(f64, f64)> = mp.to_vec();
    knots.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let mut out: Vec<(f64, f64)> = Vec::with_capacity(knots.len() + 1);
    if knots.first().is_none_or(|k| k.0 > 0.0) {
        out.push((0.0, 0.0));
    }
    for k in knots {
        match out.last_mut() {
            Some(last) if last.0 == k.0 => last.1 = last.1.max(k.1),
            _ => out.push(k),
        }
    }
    // Zero drawdown at Pr even when the top row does not carry the largest m(p).
    out.retain(|k| k.0 < pr);
    out.push((pr, psi_r));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GasTestPoint;

    fn dataset(pwf: &[f64], mp: &[f64], qg: &[f64]) -> GasDataset {
        let points = pwf
            .iter()
            .zip(mp)
            .zip(qg)
            .map(|((&pwf, &m), &rate)| GasTestPoint { pwf, rate, pseudopressure: Some(m) })
            .collect();
        GasDataset::new(points).unwrap()
    }

    /// Four-point test with a shut-in reading at 3000 psia.
    fn field_dataset() -> GasDataset {
        dataset(
            &[3000.0, 2500.0, 2000.0, 1500.0],
            &[6.0e8, 4.3e8, 2.8e8, 1.6e8],
            &[0.0, 1200.0, 2600.0, 4200.0],
        )
    }

    /// Points obeying `Pr² - Pwf² = a q + b q²` exactly, with `m(p) = k p²`.
    fn lit_dataset() -> GasDataset {
        let (a, b, pr, k) = (200.0, 0.05, 3000.0, 6.0e8 / 9.0e6);
        let mut pwf = vec![pr];
        let mut qg = vec![0.0];
        for q in [500.0, 1500.0, 3000.0, 5000.0] {
            pwf.push((pr * pr - (a * q + b * q * q)).sqrt());
            qg.push(q);
        }
        let mp: Vec<f64> = pwf.iter().map(|p| k * p * p).collect();
        dataset(&pwf, &mp, &qg)
    }

    #[test]
    fn backpressure_masks_zero_rate_point() {
        let r = fit_gas_method(Method::Backpressure, &field_dataset(), &GasFitOptions::default()).unwrap();
        let d = r.fitted.diagnostics.unwrap();
        assert_eq!(d.n_used, 3);
        assert_eq!(d.n_masked, 1);
        assert_eq!(r.curve.points.len(), 20);
        assert_eq!(r.curve.points[0].pressure, 3000.0);
        assert_eq!(r.curve.points[0].rate, 0.0);
    }

    #[test]
    fn backpressure_field_fit_has_positive_parameters() {
        let ds = field_dataset();
        let r = fit_gas_method(Method::Backpressure, &ds, &GasFitOptions::default()).unwrap();
        match r.fitted.model {
            IprModel::Backpressure { c, n, pr } => {
                assert!(n > 0.0, "n={n}");
                assert!(c > 0.0, "c={c}");
                assert!((n - 1.3807).abs() < 1e-3, "n={n}");
                assert_eq!(pr, 3000.0);
            }
            ref other => panic!("unexpected model {other:?}"),
        }
        assert!(r.aof() > ds.max_rate(), "aof={}", r.aof());
    }

    #[test]
    fn backpressure_recovers_generating_law() {
        let (c0, n0, pr) = (2.5e-3, 0.78, 2500.0);
        let pwf = [2500.0, 2200.0, 1900.0, 1500.0, 1000.0];
        let qg: Vec<f64> = pwf.iter().map(|p: &f64| c0 * (pr * pr - p * p).max(0.0).powf(n0)).collect();
        let mp = [0.0; 5];
        let r = fit_gas_method(Method::Backpressure, &dataset(&pwf, &mp, &qg), &GasFitOptions::default()).unwrap();
        match r.fitted.model {
            IprModel::Backpressure { c, n, .. } => {
                assert!((n - n0).abs() < 1e-9, "n={n}");
                assert!((c - c0).abs() / c0 < 1e-8, "c={c}");
            }
            ref other => panic!("unexpected model {other:?}"),
        }
        let aof0 = c0 * (pr * pr).powf(n0);
        assert!((r.aof() - aof0).abs() / aof0 < 1e-8);
    }

    #[test]
    fn lit_pressure_squared_recovers_coefficients() {
        let r = fit_gas_method(Method::LitPressureSquared, &lit_dataset(), &GasFitOptions::default()).unwrap();
        match &r.fitted.model {
            IprModel::Lit { a, b, .. } => {
                assert!((a - 200.0).abs() / 200.0 < 1e-8, "a={a}");
                assert!((b - 0.05).abs() / 0.05 < 1e-8, "b={b}");
            }
            other => panic!("unexpected model {other:?}"),
        }
        // At the tested drawdowns the curve reproduces the data.
        for p in lit_dataset().points().iter().filter(|p| p.rate > 0.0) {
            let q = r.fitted.rate_at(p.pwf).unwrap();
            assert!((q - p.rate).abs() / p.rate < 1e-8, "{q} vs {}", p.rate);
        }
    }

    #[test]
    fn pseudopressure_with_quadratic_mp_scales_lit_coefficients() {
        let r = fit_gas_method(Method::LitPseudopressure, &lit_dataset(), &GasFitOptions::default()).unwrap();
        let k = 6.0e8 / 9.0e6;
        match &r.fitted.model {
            IprModel::Lit { a, b, .. } => {
                assert!((a - 200.0 * k).abs() / (200.0 * k) < 1e-8, "a={a}");
                assert!((b - 0.05 * k).abs() / (0.05 * k) < 1e-8, "b={b}");
            }
            other => panic!("unexpected model {other:?}"),
        }
        let p2 = fit_gas_method(Method::LitPressureSquared, &lit_dataset(), &GasFitOptions::default()).unwrap();
        assert!((r.aof() - p2.aof()).abs() / p2.aof() < 1e-8);
    }

    #[test]
    fn all_methods_produce_monotone_curves() {
        let set = fit_all_gas(&lit_dataset(), &GasFitOptions::default()).unwrap();
        assert!(set.failed.is_empty(), "{:?}", set.failed);
        assert_eq!(set.results.len(), 4);
        for r in &set.results {
            assert!(r.curve.is_rate_monotone(), "{}", r.fitted.method);
            assert!(r.curve.pressures().windows(2).all(|w| w[1] < w[0]));
            assert_eq!(r.aof(), r.fitted.rate_at(0.0).unwrap());
            assert!(r.aof() > 5000.0, "{}: {}", r.fitted.method, r.aof());
        }
    }

    #[test]
    fn lit_methods_reject_field_data_with_falling_delta_over_q() {
        // Δ/q falls with q on this data, so every LIT fit has b < 0 and the
        // quadratic runs out of real roots before Pwf reaches 0.
        let set = fit_all_gas(&field_dataset(), &GasFitOptions::default()).unwrap();
        assert_eq!(set.results.len(), 1);
        assert_eq!(set.results[0].fitted.method, Method::Backpressure);
        assert_eq!(set.failed.len(), 3);
        for (method, err) in &set.failed {
            assert!(matches!(err, IprError::InvalidModel { .. }), "{method}: {err}");
            assert!(err.to_string().contains(method.display_name()));
        }
    }

    #[test]
    fn pseudopressure_requires_column() {
        let points = vec![
            GasTestPoint { pwf: 3000.0, rate: 0.0, pseudopressure: None },
            GasTestPoint { pwf: 2000.0, rate: 100.0, pseudopressure: None },
            GasTestPoint { pwf: 1000.0, rate: 200.0, pseudopressure: None },
        ];
        let ds = GasDataset::new(points).unwrap();
        let err = fit_gas_method(Method::LitPseudopressure, &ds, &GasFitOptions::default()).unwrap_err();
        assert!(matches!(err, IprError::Validation(_)));
    }

    #[test]
    fn fully_masked_data_is_numerical_error() {
        let ds = dataset(&[1000.0, 900.0], &[1.0, 1.0], &[0.0, 0.0]);
        let err = fit_gas_method(Method::LitPressureApprox, &ds, &GasFitOptions::default()).unwrap_err();
        match err {
            IprError::Numerical { method, .. } => assert_eq!(method, "LIT Pressure-Approximation"),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(fit_all_gas(&ds, &GasFitOptions::default()).is_err());
    }

    #[test]
    fn tabulated_projection_passes_through_measured_pairs() {
        let opts = GasFitOptions { grid_points: 20, mp_projection: MpProjection::Tabulated };
        let ds = lit_dataset();
        let r = fit_gas_method(Method::LitPseudopressure, &ds, &opts).unwrap();
        match &r.fitted.model {
            IprModel::Lit { drawdown: Drawdown::Pseudo { psi_r, mp }, .. } => {
                assert!((psi_r - 6.0e8).abs() < 1e-3);
                assert_eq!(mp.at(0.0), 0.0);
                for p in ds.points() {
                    let m = p.pseudopressure.unwrap();
                    assert!((mp.at(p.pwf) - m).abs() <= 1e-9 * m.max(1.0));
                }
            }
            other => panic!("unexpected model {other:?}"),
        }
        assert!(r.curve.is_rate_monotone());
    }

    #[test]
    fn tabulate_sorts_and_anchors() {
        let knots = tabulate(&[(2000.0, 25.0), (1000.0, 10.0), (2000.0, 20.0)], 2000.0, 25.0);
        assert_eq!(knots, vec![(0.0, 0.0), (1000.0, 10.0), (2000.0, 25.0)]);
    }

    #[test]
    fn tabulated_projection_has_zero_drawdown_at_reservoir_pressure() {
        // The top row does not carry the largest m(p).
        let ds = dataset(
            &[3000.0, 2500.0, 2000.0, 1500.0],
            &[5.0e8, 6.0e8, 3.0e8, 1.0e8],
            &[0.0, 1000.0, 2000.0, 3500.0],
        );
        let opts = GasFitOptions { grid_points: 20, mp_projection: MpProjection::Tabulated };
        let r = fit_gas_method(Method::LitPseudopressure, &ds, &opts).unwrap();
        match &r.fitted.model {
            IprModel::Lit { drawdown, .. } => {
                assert_eq!(drawdown.at(3000.0), 0.0);
                assert!(drawdown.at(2000.0) > 0.0);
            }
            other => panic!("unexpected model {other:?}"),
        }
        assert_eq!(r.curve.points[0].pressure, 3000.0);
        assert_eq!(r.curve.points[0].rate, 0.0);
    }
}
