//! Game configuration.

use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Tunable parameters of a session. Every field has a default, so partial
/// YAML or JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the session's deterministic RNG stream.
    pub rng_seed: u64,
    pub starting_cash: f64,
    pub starting_aum: f64,
    /// Weeks of lighter management scrutiny at the start of a game.
    pub startup_grace_weeks: u32,
    /// AUM above which the game is won.
    pub win_aum: f64,
    /// AUM below which the fund is shut down.
    pub shutdown_aum: f64,
    /// Weekly probability of a regime change.
    pub regime_change_prob: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            starting_cash: 1_000_000.0,
            starting_aum: 50_000_000.0,
            startup_grace_weeks: 4,
            win_aum: 1_000_000_000.0,
            shutdown_aum: 10_000_000.0,
            regime_change_prob: 0.05,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let money = [
            self.starting_cash,
            self.starting_aum,
            self.win_aum,
            self.shutdown_aum,
        ];
        if money.iter().any(|m| !m.is_finite()) {
            return Err(ValidationError::NonFinite);
        }
        if money.iter().any(|m| *m <= 0.0) {
            return Err(ValidationError::NegativeMoney);
        }
        if self.shutdown_aum >= self.win_aum {
            return Err(ValidationError::InvalidThresholds);
        }
        if !(0.0..=1.0).contains(&self.regime_change_prob) {
            return Err(ValidationError::InvalidProbability(self.regime_change_prob));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: GameConfig = serde_yaml::from_str("rng_seed: 7\nstarting_cash: 2000000\n").unwrap();
        assert_eq!(cfg.rng_seed, 7);
        assert_eq!(cfg.starting_cash, 2_000_000.0);
        assert_eq!(cfg.starting_aum, 50_000_000.0);
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = GameConfig {
            regime_change_prob: 1.5,
            ..GameConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ValidationError::InvalidProbability(1.5)));
        let cfg = GameConfig {
            starting_aum: -1.0,
            ..GameConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ValidationError::NegativeMoney));
    }
}
