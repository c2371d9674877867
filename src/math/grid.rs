//! Pressure grid generation.
//!
//! Every curve is evaluated on a deterministic, strictly decreasing pressure grid that
//! ends at exactly `0.0`, so the last grid value of any curve is its AOF.

use crate::error::{IprError, IprResult};

/// Generate `steps` evenly spaced points from `start` to `end` (both inclusive).
///
/// The final point is set to `end` exactly.
pub fn lin_space(start: f64, end: f64, steps: usize) -> IprResult<Vec<f64>> {
    if !(start.is_finite() && end.is_finite()) {
        return Err(IprError::validation(format!(
            "invalid grid range: start={start}, end={end} (must be finite)"
        )));
    }
    if steps < 2 {
        return Err(IprError::validation("grid steps must be >= 2"));
    }

    let step = (end - start) / (steps as f64 - 1.0);
    let mut out = Vec::with_capacity(steps);
    for i in 0..steps - 1 {
        out.push(start + step * i as f64);
    }
    out.push(end);
    Ok(out)
}

/// Strictly decreasing pressure grid ending at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureGrid {
    pressures: Vec<f64>,
}

impl PressureGrid {
    /// `steps` evenly spaced pressures from `top` down to 0.
    pub fn single(top: f64, steps: usize) -> IprResult<Self> {
        if !(top.is_finite() && top > 0.0) {
            return Err(IprError::validation(format!(
                "grid top pressure must be finite and > 0 (got {top})"
            )));
        }
        Ok(Self {
            pressures: lin_space(top, 0.0, steps)?,
        })
    }

    /// Two segments: `[pws, pb]` then `(pb, 0]`, `steps` points each.
    ///
    /// The lower segment drops its first point so `pb` appears once. When `pws == pb`
    /// the upper segment collapses to the single point `pb`.
    pub fn two_segment(pws: f64, pb: f64, steps: usize) -> IprResult<Self> {
        if !(pb.is_finite() && pb > 0.0) {
            return Err(IprError::validation(format!(
                "bubble point must be finite and > 0 to split the grid (got {pb})"
            )));
        }
        if !(pws.is_finite() && pws >= pb) {
            return Err(IprError::validation(format!(
                "two-segment grid needs Pws >= Pb (Pws={pws}, Pb={pb})"
            )));
        }

        let mut pressures = if pws > pb {
            lin_space(pws, pb, steps)?
        } else {
            vec![pb]
        };
        pressures.extend(lin_space(pb, 0.0, steps)?.into_iter().skip(1));
        Ok(Self { pressures })
    }

    pub fn pressures(&self) -> &[f64] {
        &self.pressures
    }

    pub fn len(&self) -> usize {
        self.pressures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressures.is_empty()
    }
}
