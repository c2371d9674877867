//! Root selection for the LIT deliverability quadratic.
//!
//! LIT methods fit `Δ = a·q + b·q²`. Given a drawdown `Δ` the rate is the root
//!
//! ```text
//! q = (-a + sqrt(a² + 4·b·Δ)) / (2·b)
//! ```
//!
//! which is the positive root whenever `a, b, Δ > 0`.

/// Why the quadratic could not be inverted.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RootError {
    #[error("quadratic coefficient b is zero")]
    ZeroCoefficient,
    #[error("negative discriminant {discriminant:.6e} (a={a:.6e}, b={b:.6e}, drawdown={delta:.6e})")]
    NegativeDiscriminant {
        discriminant: f64,
        a: f64,
        b: f64,
        delta: f64,
    },
}

/// Rate satisfying `b·q² + a·q − delta = 0`, taking the `+sqrt` branch.
pub fn lit_rate(a: f64, b: f64, delta: f64) -> Result<f64, RootError> {
    if b == 0.0 || !b.is_finite() {
        return Err(RootError::ZeroCoefficient);
    }
    let discriminant = a * a + 4.0 * b * delta;
    if discriminant < 0.0 || !discriminant.is_finite() {
        return Err(RootError::NegativeDiscriminant {
            discriminant,
            a,
            b,
            delta,
        });
    }
    Ok((-a + discriminant.sqrt()) / (2.0 * b))
}
