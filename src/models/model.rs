//! Closed-form IPR models.
//!
//! Every method, gas or oil, ends up as one [`IprModel`] variant: a set of fitted
//! parameters plus a rule that maps a flowing pressure to a rate. Fitting code builds
//! these; the curve driver only ever calls [`FittedModel::rate_at`].

use serde::{Deserialize, Serialize};

use crate::domain::{Method, NamedValue, RegressionDiagnostics};
use crate::error::{IprError, IprResult};
use crate::math::lit_rate;

/// Vogel's dimensionless two-phase inflow shape `1 - 0.2·r - 0.8·r²`.
pub fn vogel_shape(ratio: f64) -> f64 {
    1.0 - 0.2 * ratio - 0.8 * ratio * ratio
}

/// Drawdown term on the left-hand side of the LIT equation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Drawdown {
    /// `Pr² - p²`.
    PressureSquared { pr: f64 },
    /// `Pr - p`.
    Pressure { pr: f64 },
    /// `ψr - m(p)`.
    Pseudo { psi_r: f64, mp: MpCurve },
}

impl Drawdown {
    pub fn at(&self, p: f64) -> f64 {
        match self {
            Drawdown::PressureSquared { pr } => pr * pr - p * p,
            Drawdown::Pressure { pr } => pr - p,
            Drawdown::Pseudo { psi_r, mp } => psi_r - mp.at(p),
        }
    }
}

/// Pseudopressure as a function of pressure over the prediction grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MpCurve {
    /// `m(p) = k·p²`.
    Quadratic { k: f64 },
    /// Linear interpolation in `(pressure, m)` knots sorted by pressure, from `(0, 0)` up
    /// to `(Pr, ψr)`. Values above the last knot are clamped to it.
    Tabulated { knots: Vec<(f64, f64)> },
}

impl MpCurve {
    pub fn at(&self, p: f64) -> f64 {
        match self {
            MpCurve::Quadratic { k } => k * p * p,
            MpCurve::Tabulated { knots } => interpolate(knots, p),
        }
    }
}

fn interpolate(knots: &[(f64, f64)], p: f64) -> f64 {
    let Some(&(p_last, m_last)) = knots.last() else {
        return f64::NAN;
    };
    if p >= p_last {
        return m_last;
    }
    if p <= knots[0].0 {
        return knots[0].1;
    }
    for w in knots.windows(2) {
        let ((p0, m0), (p1, m1)) = (w[0], w[1]);
        if p <= p1 {
            let u = (p - p0) / (p1 - p0);
            return m0 + u * (m1 - m0);
        }
    }
    m_last
}

/// What happens below the bubble point in an undersaturated composite curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BelowBubble {
    /// `Qb + (J·Pb/1.8)·vogel_shape(p/Pb)`.
    Vogel,
    /// `J·[(Pws - Pb) + (Pb² - p²)/(2·Pb)]`.
    Fetkovich,
}

/// Fitted parameters of one IPR method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum IprModel {
    /// `q = C·(Pr² - p²)^n`.
    Backpressure { c: f64, n: f64, pr: f64 },
    /// Positive root of `b·q² + a·q = Δ(p)`.
    Lit { a: f64, b: f64, drawdown: Drawdown },
    /// `q = Qmax·vogel_shape(p/Pws)`.
    Vogel { qmax: f64, pws: f64 },
    /// `q = J·(Pws - p)`.
    ConstantJ { j: f64, pws: f64 },
    /// `q = C·(Pws² - p²)^n`.
    Fetkovich { c: f64, n: f64, pws: f64 },
    /// Linear above `Pb`, two-phase composite below.
    Composite {
        j: f64,
        pws: f64,
        pb: f64,
        below: BelowBubble,
    },
}

impl IprModel {
    /// Rate at flowing pressure `p`.
    ///
    /// Only the LIT inversion can fail; the caller attaches the method name.
    fn rate(&self, p: f64) -> Result<f64, crate::math::RootError> {
        let q = match self {
            IprModel::Backpressure { c, n, pr } => c * (pr * pr - p * p).max(0.0).powf(*n),
            IprModel::Lit { a, b, drawdown } => lit_rate(*a, *b, drawdown.at(p))?,
            IprModel::Vogel { qmax, pws } => qmax * vogel_shape(p / pws),
            IprModel::ConstantJ { j, pws } => j * (pws - p),
            IprModel::Fetkovich { c, n, pws } => c * (pws * pws - p * p).max(0.0).powf(*n),
            IprModel::Composite { j, pws, pb, below } => {
                if p >= *pb {
                    j * (pws - p)
                } else {
                    let qb = j * (pws - pb);
                    match below {
                        BelowBubble::Vogel => qb + (j * pb / 1.8) * vogel_shape(p / pb),
                        BelowBubble::Fetkovich => j * ((pws - pb) + (pb * pb - p * p) / (2.0 * pb)),
                    }
                }
            }
        };
        Ok(q)
    }
}

/// A fitted method: tag, parameters and (for regressions) diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub method: Method,
    pub model: IprModel,
    pub diagnostics: Option<RegressionDiagnostics>,
}

impl FittedModel {
    pub fn new(method: Method, model: IprModel) -> Self {
        Self {
            method,
            model,
            diagnostics: None,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: RegressionDiagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Predicted rate at flowing pressure `p`.
    pub fn rate_at(&self, p: f64) -> IprResult<f64> {
        let q = self
            .model
            .rate(p)
            .map_err(|e| IprError::invalid_model(self.method, format!("at Pwf={p}: {e}")))?;
        if !q.is_finite() {
            return Err(IprError::invalid_model(
                self.method,
                format!("non-finite rate at Pwf={p}"),
            ));
        }
        Ok(q)
    }

    /// Rate at the bubble point, for composite curves.
    pub fn bubble_point_rate(&self) -> Option<f64> {
        match self.model {
            IprModel::Composite { j, pws, pb, .. } => Some(j * (pws - pb)),
            _ => None,
        }
    }

    /// Fitted scalars, in display order.
    pub fn parameters(&self) -> Vec<NamedValue> {
        let named = |name: &str, value: f64| NamedValue {
            name: name.to_string(),
            value,
        };
        match &self.model {
            IprModel::Backpressure { c, n, pr } => vec![named("C", *c), named("n", *n), named("Pr", *pr)],
            IprModel::Lit { a, b, drawdown } => {
                let mut out = vec![named("a", *a), named("b", *b)];
                match drawdown {
                    Drawdown::PressureSquared { pr } | Drawdown::Pressure { pr } => out.push(named("Pr", *pr)),
                    Drawdown::Pseudo { psi_r, mp } => {
                        out.push(named("psi_r", *psi_r));
                        if let MpCurve::Quadratic { k } = mp {
                            out.push(named("k", *k));
                        }
                    }
                }
                out
            }
            IprModel::Vogel { qmax, pws } => vec![named("Qmax", *qmax), named("Pws", *pws)],
            IprModel::ConstantJ { j, pws } => vec![named("J", *j), named("Pws", *pws)],
            IprModel::Fetkovich { c, n, pws } => vec![named("C", *c), named("n", *n), named("Pws", *pws)],
            IprModel::Composite { j, pws, pb, .. } => vec![
                named("J", *j),
                named("Pws", *pws),
                named("Pb", *pb),
                named("Qb", j * (pws - pb)),
            ],
        }
    }

    /// Equation text with the fitted parameters substituted.
    pub fn equation(&self) -> String {
        match &self.model {
            IprModel::Backpressure { c, n, .. } => format!("Qg = {c:.3e} · (Pr² - Pwf²)^{n:.3}"),
            IprModel::Lit { a, b, drawdown } => match drawdown {
                Drawdown::PressureSquared { .. } => format!("(Pr² - Pwf²) = {a:.2} Qg + {b:.5} Qg²"),
                Drawdown::Pressure { .. } => format!("(Pr - Pwf) = {a:.4} Qg + {b:.5} Qg²"),
                Drawdown::Pseudo { .. } => format!("(ψr - ψwf) = {a:.2} Qg + {b:.4} Qg²"),
            },
            IprModel::Vogel { qmax, pws } => {
                format!("Q = {qmax:.2} · [1 - 0.2 (Pwf/{pws}) - 0.8 (Pwf/{pws})²]")
            }
            IprModel::ConstantJ { j, pws } => format!("Q = {j:.4} · ({pws} - Pwf)"),
            IprModel::Fetkovich { c, n, pws } => format!("Q = {c:.4e} · ({pws}² - Pwf²)^{n:.3}"),
            IprModel::Composite { j, pws, pb, below } => {
                let qb = j * (pws - pb);
                let lower = match below {
                    BelowBubble::Vogel => format!(
                        "{qb:.2} + {:.2} · [1 - 0.2 (Pwf/{pb}) - 0.8 (Pwf/{pb})²]",
                        j * pb / 1.8
                    ),
                    BelowBubble::Fetkovich => {
                        format!("{j:.4} · [({pws} - {pb}) + ({pb}² - Pwf²)/{}]", 2.0 * pb)
                    }
                };
                format!("Q = {j:.4} · ({pws} - Pwf) for Pwf >= {pb}; Q = {lower} below")
            }
        }
    }
}
