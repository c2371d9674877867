//! Oil IPR curve construction (Vogel, Constant-J, Fetkovich).
//!
//! The regime decides the grid and which curves are built:
//!
//! - saturated: one segment `Pws .. 0`; Vogel, Constant-J and (with a second test)
//!   Fetkovich
//! - undersaturated: two segments `Pws .. Pb .. 0`; a Vogel-style and a Fetkovich-style
//!   composite, linear above `Pb`
//!
//! Vogel, Constant-J and the composites fail the whole run. A bad optional second test
//! only costs the Fetkovich curve, which is then listed as skipped.

use tracing::{debug, warn};

use crate::domain::{CurvePrediction, Method, OilInput, RateTest};
use crate::error::{IprError, IprResult};
use crate::fit::curve::evaluate_curve;
use crate::fit::regime::{Regime, TestPosition, classify};
use crate::math::PressureGrid;
use crate::models::{BelowBubble, FittedModel, IprModel, vogel_shape};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OilFitOptions {
    /// Grid points per segment.
    pub segment_points: usize,
}

impl Default for OilFitOptions {
    fn default() -> Self {
        Self { segment_points: 10 }
    }
}

#[derive(Debug, Clone)]
pub struct OilCurveResult {
    pub fitted: FittedModel,
    pub curve: CurvePrediction,
}

impl OilCurveResult {
    pub fn aof(&self) -> f64 {
        self.curve.aof()
    }
}

/// All curves built for one oil input.
#[derive(Debug, Clone)]
pub struct OilFit {
    pub regime: Regime,
    pub results: Vec<OilCurveResult>,
    /// Methods not built, with the reason.
    pub skipped: Vec<(Method, String)>,
}

impl OilFit {
    pub fn get(&self, method: Method) -> Option<&OilCurveResult> {
        self.results.iter().find(|r| r.fitted.method == method)
    }

    pub fn curves(&self) -> Vec<CurvePrediction> {
        self.results.iter().map(|r| r.curve.clone()).collect()
    }
}

/// Validate the input, pick the regime and build every applicable curve.
pub fn fit_oil(input: &OilInput, opts: &OilFitOptions) -> IprResult<OilFit> {
    input.validate()?;

    let pws = input.reservoir.pws;
    let test = input.test;
    let regime = classify(&input.reservoir, test.pwf);
    debug!(regime = regime.label(), pws, pwf = test.pwf, qwf = test.rate, "oil regime");

    let mut skipped = Vec::new();
    let (models, grid) = match regime {
        Regime::Saturated => {
            let mut models = vec![vogel(pws, test)?, constant_j(pws, test)?];
            match input.second_test.map(|second| fetkovich(pws, test, second)) {
                Some(Ok(model)) => models.push(model),
                Some(Err(e)) => {
                    warn!(method = %Method::Fetkovich, error = %e, "oil method failed");
                    skipped.push((Method::Fetkovich, e.to_string()));
                }
                None => skipped.push((
                    Method::Fetkovich,
                    "needs a second test point in a saturated reservoir".to_string(),
                )),
            }
            (models, PressureGrid::single(pws, opts.segment_points)?)
        }
        Regime::Undersaturated { bubble_point: pb, test: position } => {
            if input.second_test.is_some() {
                warn!("second test point is only used for saturated reservoirs; ignoring it");
            }
            if !(pb > 0.0) {
                return Err(IprError::invalid_model(
                    Method::Vogel,
                    format!("bubble point pressure must be > 0 for the composite curve (Pb={pb})"),
                ));
            }
            let (j_vogel, j_fetkovich) = match position {
                TestPosition::AboveBubble => {
                    let j = productivity_index(Method::Vogel, pws, test)?;
                    (j, j)
                }
                TestPosition::AtOrBelowBubble => (
                    vogel_composite_index(pws, pb, test)?,
                    productivity_index(Method::Fetkovich, pws, test)?,
                ),
            };
            debug!(j_vogel, j_fetkovich, qb = j_vogel * (pws - pb), "productivity indices");
            let models = vec![
                composite(Method::Vogel, j_vogel, pws, pb, BelowBubble::Vogel),
                composite(Method::Fetkovich, j_fetkovich, pws, pb, BelowBubble::Fetkovich),
            ];
            (models, PressureGrid::two_segment(pws, pb, opts.segment_points)?)
        }
    };

    let results = models
        .into_iter()
        .map(|fitted| {
            let curve = evaluate_curve(&fitted, &grid)?;
            debug!(method = %fitted.method, aof = curve.aof(), "oil curve built");
            Ok(OilCurveResult { fitted, curve })
        })
        .collect::<IprResult<Vec<_>>>()?;

    Ok(OilFit {
        regime,
        results,
        skipped,
    })
}

/// `Qmax = Qwf / vogel_shape(Pwf/Pws)`.
fn vogel(pws: f64, test: RateTest) -> IprResult<FittedModel> {
    let shape = vogel_shape(test.pwf / pws);
    if !(shape > 0.0) {
        return Err(IprError::invalid_model(
            Method::Vogel,
            format!(
                "Vogel denominator 1 - 0.2(Pwf/Pws) - 0.8(Pwf/Pws)² is {shape} (Pwf={}, Pws={pws})",
                test.pwf
            ),
        ));
    }
    let qmax = test.rate / shape;
    Ok(FittedModel::new(Method::Vogel, IprModel::Vogel { qmax, pws }))
}

fn constant_j(pws: f64, test: RateTest) -> IprResult<FittedModel> {
    let j = productivity_index(Method::ConstantJ, pws, test)?;
    Ok(FittedModel::new(Method::ConstantJ, IprModel::ConstantJ { j, pws }))
}

/// `J = Qwf / (Pws - Pwf)`.
fn productivity_index(method: Method, pws: f64, test: RateTest) -> IprResult<f64> {
    let drawdown = pws - test.pwf;
    if !(drawdown > 0.0) {
        return Err(IprError::invalid_model(
            method,
            format!("zero drawdown: Pws - Pwf = {drawdown} (Pws={pws}, Pwf={})", test.pwf),
        ));
    }
    Ok(test.rate / drawdown)
}

/// `J` consistent with the Vogel composite passing through a test at or below `Pb`.
fn vogel_composite_index(pws: f64, pb: f64, test: RateTest) -> IprResult<f64> {
    let denom = (pws - pb) + (pb / 1.8) * vogel_shape(test.pwf / pb);
    if !(denom > 0.0) {
        return Err(IprError::invalid_model(
            Method::Vogel,
            format!(
                "composite denominator (Pws - Pb) + (Pb/1.8)·shape is {denom} (Pws={pws}, Pb={pb}, Pwf={})",
                test.pwf
            ),
        ));
    }
    Ok(test.rate / denom)
}

/// Two-point Fetkovich: `n = ln(q1/q) / ln[(Pws² - Pwf1²)/(Pws² - Pwf²)]`, `C = q/(Pws² - Pwf²)^n`.
fn fetkovich(pws: f64, test: RateTest, second: RateTest) -> IprResult<FittedModel> {
    let method = Method::Fetkovich;
    let d1 = pws * pws - test.pwf * test.pwf;
    let d2 = pws * pws - second.pwf * second.pwf;
    if !(d1 > 0.0 && d2 > 0.0) {
        return Err(IprError::invalid_model(
            method,
            format!("Pws² - Pwf² must be > 0 for both tests (got {d1} and {d2})"),
        ));
    }
    let log_dp = (d2 / d1).ln();
    if log_dp == 0.0 {
        return Err(IprError::invalid_model(
            method,
            format!("both tests share the same flowing pressure ({}), exponent is undefined", test.pwf),
        ));
    }
    let n = (second.rate / test.rate).ln() / log_dp;
    let c = test.rate / d1.powf(n);
    if !(n.is_finite() && c.is_finite()) {
        return Err(IprError::invalid_model(
            method,
            format!("non-finite coefficients (n={n}, C={c})"),
        ));
    }
    if !(n > 0.0 && n <= 1.0) {
        warn!(n, "Fetkovich exponent outside (0, 1]");
    }
    Ok(FittedModel::new(method, IprModel::Fetkovich { c, n, pws }))
}

fn composite(method: Method, j: f64, pws: f64, pb: f64, below: BelowBubble) -> FittedModel {
    FittedModel::new(method, IprModel::Composite { j, pws, pb, below })
}
