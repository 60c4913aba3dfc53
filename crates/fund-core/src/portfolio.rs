//! Portfolio positions and weight normalization.

use serde::{Deserialize, Serialize};

use crate::alpha::AlphaId;

/// Capital allocated to one alpha, as a fraction of AUM.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub alpha_id: AlphaId,
    pub weight: f64,
}

impl Position {
    pub fn new(alpha_id: AlphaId, weight: f64) -> Self {
        Self { alpha_id, weight }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Portfolio {
    pub positions: Vec<Position>,
}

impl Portfolio {
    pub fn total_weight(&self) -> f64 {
        self.positions.iter().map(|p| p.weight).sum()
    }
}

/// Scale weights proportionally so they sum to 1.0 when they overshoot.
/// Totals at or below 1.0 are left untouched; the remainder stays in cash.
pub fn normalize_weights(positions: &mut [Position]) {
    let total: f64 = positions.iter().map(|p| p.weight).sum();
    if total > 1.0 {
        for p in positions.iter_mut() {
            p.weight /= total;
        }
    }
}
