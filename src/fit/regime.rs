//! Reservoir regime decision.
//!
//! A small state machine over `{Pws, Pb, Pwf}`: exactly one regime is returned and the
//! saturated/undersaturated split depends only on `Pws < Pb`.

use serde::{Deserialize, Serialize};

use crate::domain::ReservoirState;

/// Position of the reference test point relative to the bubble point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestPosition {
    /// `Pwf > Pb`: the test saw single-phase inflow.
    AboveBubble,
    /// `Pwf <= Pb`.
    AtOrBelowBubble,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// `Pws < Pb` (or no bubble point supplied): two-phase flow everywhere.
    Saturated,
    /// `Pws >= Pb`: linear above the bubble point, two-phase below.
    Undersaturated { bubble_point: f64, test: TestPosition },
}

impl Regime {
    pub fn label(&self) -> &'static str {
        match self {
            Regime::Saturated => "saturated",
            Regime::Undersaturated { test: TestPosition::AboveBubble, .. } => {
                "undersaturated (test above Pb)"
            }
            Regime::Undersaturated { test: TestPosition::AtOrBelowBubble, .. } => {
                "undersaturated (test at or below Pb)"
            }
        }
    }
}

/// Classify the reservoir given the reference test pressure.
pub fn classify(state: &ReservoirState, pwf: f64) -> Regime {
    match state.pb {
        Some(pb) if state.pws >= pb => Regime::Undersaturated {
            bubble_point: pb,
            test: if pwf > pb {
                TestPosition::AboveBubble
            } else {
                TestPosition::AtOrBelowBubble
            },
        },
        _ => Regime::Saturated,
    }
}
