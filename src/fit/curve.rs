//! Common curve-generation driver.
//!
//! Evaluates any fitted model over a pressure grid. This is the only way curves (and
//! therefore AOF values) are produced.

use tracing::warn;

use crate::domain::{CurvePoint, CurvePrediction};
use crate::error::IprResult;
use crate::math::PressureGrid;
use crate::models::FittedModel;

/// Evaluate `model` at every grid pressure.
pub fn evaluate_curve(model: &FittedModel, grid: &PressureGrid) -> IprResult<CurvePrediction> {
    let points = grid
        .pressures()
        .iter()
        .map(|&pressure| {
            model
                .rate_at(pressure)
                .map(|rate| CurvePoint { pressure, rate })
        })
        .collect::<IprResult<Vec<_>>>()?;

    let curve = CurvePrediction::new(model.method, points)?;
    if !curve.is_rate_monotone() {
        warn!(
            method = %model.method,
            "predicted rate decreases with drawdown; fitted parameters are not physical"
        );
    }
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Method;
    use crate::models::IprModel;

    #[test]
    fn aof_equals_rate_at_zero() {
        let model = FittedModel::new(
            Method::Fetkovich,
            IprModel::Fetkovich { c: 1e-3, n: 0.8, pws: 2000.0 },
        );
        let grid = PressureGrid::single(2000.0, 10).unwrap();
        let curve = evaluate_curve(&model, &grid).unwrap();
        assert_eq!(curve.aof(), model.rate_at(0.0).unwrap());
        assert_eq!(curve.points.len(), 10);
        assert!(curve.is_rate_monotone());
    }

    #[test]
    fn inversion_failure_propagates() {
        let model = FittedModel::new(
            Method::LitPressureSquared,
            IprModel::Lit {
                a: 0.0,
                b: 0.0,
                drawdown: crate::models::Drawdown::PressureSquared { pr: 10.0 },
            },
        );
        let grid = PressureGrid::single(10.0, 5).unwrap();
        assert!(evaluate_curve(&model, &grid).is_err());
    }
}
