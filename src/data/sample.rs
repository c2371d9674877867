//! Sample gas test data.
//!
//! Two sources for runs without a CSV:
//! - the built-in four-point field test
//! - a seeded synthetic generator that draws rates from a backpressure law with
//!   multiplicative log-normal noise

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::debug;

use crate::domain::{GasDataset, GasTestPoint, SampleSpec};
use crate::error::{IprError, IprResult};

/// Pseudopressure per psi² for synthetic data (`m(p) = k·p²`).
const SYNTHETIC_MP_K: f64 = 100.0;

/// Lowest synthetic flowing pressure as a fraction of `Pr`.
const MIN_PRESSURE_FRACTION: f64 = 0.3;

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            seed: 42,
            n_points: 6,
            c: 0.01,
            n: 0.8,
            reservoir_pressure: 3000.0,
            noise: 0.02,
        }
    }
}

/// The built-in field test: shut-in point at 3000 psia plus three flow periods.
pub fn builtin_gas_dataset() -> IprResult<GasDataset> {
    let rows = [
        (3000.0, 6.0e8, 0.0),
        (2500.0, 4.3e8, 1200.0),
        (2000.0, 2.8e8, 2600.0),
        (1500.0, 1.6e8, 4200.0),
    ];
    GasDataset::new(
        rows.iter()
            .map(|&(pwf, m, rate)| GasTestPoint { pwf, rate, pseudopressure: Some(m) })
            .collect(),
    )
}

/// Generate test points from `Qg = C·(Pr² - Pwf²)^n`.
///
/// The first point is the shut-in point at `Pr` (rate 0); the others are evenly spaced
/// down to `0.3·Pr`. Each flowing rate is scaled by `exp(noise·z)`, `z ~ N(0, 1)`.
pub fn generate_gas_sample(spec: &SampleSpec) -> IprResult<GasDataset> {
    validate(spec)?;

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| IprError::validation(format!("noise distribution error: {e}")))?;

    let pr = spec.reservoir_pressure;
    let step = pr * (1.0 - MIN_PRESSURE_FRACTION) / (spec.n_points as f64 - 1.0);
    let points: Vec<GasTestPoint> = (0..spec.n_points)
        .map(|i| {
            let pwf = pr - step * i as f64;
            let exact = spec.c * (pr * pr - pwf * pwf).powf(spec.n);
            let z: f64 = normal.sample(&mut rng);
            GasTestPoint {
                pwf,
                rate: exact * (spec.noise * z).exp(),
                pseudopressure: Some(SYNTHETIC_MP_K * pwf * pwf),
            }
        })
        .collect();

    debug!(seed = spec.seed, n_points = points.len(), "synthetic gas sample generated");
    GasDataset::new(points)
}

fn validate(spec: &SampleSpec) -> IprResult<()> {
    if spec.n_points < 3 {
        return Err(IprError::validation("sample needs at least 3 points"));
    }
    if !(spec.c.is_finite() && spec.c > 0.0) {
        return Err(IprError::validation(format!("sample C must be > 0 (got {})", spec.c)));
    }
    if !(spec.n.is_finite() && spec.n > 0.0 && spec.n <= 2.0) {
        return Err(IprError::validation(format!("sample n must be in (0, 2] (got {})", spec.n)));
    }
    if !(spec.reservoir_pressure.is_finite() && spec.reservoir_pressure > 0.0) {
        return Err(IprError::validation(format!(
            "sample reservoir pressure must be > 0 (got {})",
            spec.reservoir_pressure
        )));
    }
    if !(spec.noise.is_finite() && spec.noise >= 0.0) {
        return Err(IprError::validation(format!("sample noise must be >= 0 (got {})", spec.noise)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Method;
    use crate::fit::{GasFitOptions, fit_gas_method};
    use crate::models::IprModel;

    #[test]
    fn builtin_dataset_matches_field_test() {
        let d = builtin_gas_dataset().unwrap();
        assert_eq!(d.points().len(), 4);
        assert_eq!(d.reservoir_pressure(), 3000.0);
        assert_eq!(d.max_rate(), 4200.0);
    }

    #[test]
    fn same_seed_same_sample() {
        let spec = SampleSpec::default();
        let a = generate_gas_sample(&spec).unwrap();
        let b = generate_gas_sample(&spec).unwrap();
        assert_eq!(a.points(), b.points());

        let c = generate_gas_sample(&SampleSpec { seed: 7, ..spec }).unwrap();
        assert_ne!(a.points(), c.points());
    }

    #[test]
    fn noise_free_sample_is_recovered_by_backpressure() {
        let spec = SampleSpec { noise: 0.0, c: 2.5e-3, n: 0.75, ..SampleSpec::default() };
        let data = generate_gas_sample(&spec).unwrap();
        assert_eq!(data.points()[0].rate, 0.0);
        assert!((data.points().last().unwrap().pwf - 900.0).abs() < 1e-9);

        let r = fit_gas_method(Method::Backpressure, &data, &GasFitOptions::default()).unwrap();
        match r.fitted.model {
            IprModel::Backpressure { c, n, .. } => {
                assert!((n - 0.75).abs() < 1e-9, "n={n}");
                assert!((c / 2.5e-3 - 1.0).abs() < 1e-6, "c={c}");
            }
            ref other => panic!("unexpected model {other:?}"),
        }
    }

    #[test]
    fn rejects_degenerate_sample_settings() {
        let spec = SampleSpec { n_points: 2, ..SampleSpec::default() };
        assert!(matches!(generate_gas_sample(&spec), Err(IprError::Validation(_))));
        let spec = SampleSpec { noise: -0.1, ..SampleSpec::default() };
        assert!(generate_gas_sample(&spec).is_err());
    }
}
