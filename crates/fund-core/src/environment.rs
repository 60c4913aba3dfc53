//! Market regime state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete market condition driving return distributions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    #[default]
    Trendy,
    MeanReverting,
    HighVol,
    LowVol,
    /// Any regime name this build does not know; sampled with neutral parameters.
    #[serde(other)]
    Unknown,
}

impl Regime {
    /// Regimes the market can transition into.
    pub const ALL: [Regime; 4] = [
        Regime::Trendy,
        Regime::MeanReverting,
        Regime::HighVol,
        Regime::LowVol,
    ];
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Regime::Trendy => "Trendy",
            Regime::MeanReverting => "MeanReverting",
            Regime::HighVol => "HighVol",
            Regime::LowVol => "LowVol",
            Regime::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Current regime and how long it has persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    pub regime: Regime,
    pub weeks_in_regime: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_regime_names_deserialize() {
        let env: Environment =
            serde_json::from_str(r#"{"regime": "Sideways", "weeks_in_regime": 3}"#).unwrap();
        assert_eq!(env.regime, Regime::Unknown);
        assert_eq!(env.weeks_in_regime, 3);
    }

    #[test]
    fn regime_names_are_stable() {
        assert_eq!(serde_json::to_string(&Regime::HighVol).unwrap(), "\"HighVol\"");
        assert_eq!(Regime::MeanReverting.to_string(), "MeanReverting");
    }
}
