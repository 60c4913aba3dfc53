#![deny(warnings)]

//! Market model: regime-dependent weekly returns for the index and for alphas.
//!
//! All sampling goes through the caller's RNG so a seeded stream reproduces a
//! run exactly. Returns are never clamped; a bad draw can wipe out a position.

use fund_core::{AlphaStrategy, Regime, WEEKS_PER_YEAR};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::warn;

/// Mean and standard deviation of a weekly Normal return.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReturnParams {
    pub mean: f64,
    pub stdev: f64,
}

impl ReturnParams {
    pub const fn new(mean: f64, stdev: f64) -> Self {
        Self { mean, stdev }
    }

    /// Draw one return. Degenerate parameters collapse to the mean.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match Normal::new(self.mean, self.stdev) {
            Ok(dist) => dist.sample(rng),
            Err(e) => {
                warn!(mean = self.mean, stdev = self.stdev, error = %e, "invalid return distribution");
                self.mean
            }
        }
    }
}

/// Weekly index return parameters for a regime.
pub fn regime_params(regime: Regime) -> ReturnParams {
    match regime {
        Regime::Trendy => ReturnParams::new(0.002, 0.01),
        Regime::MeanReverting => ReturnParams::new(0.0, 0.015),
        Regime::HighVol => ReturnParams::new(-0.001, 0.03),
        Regime::LowVol => ReturnParams::new(0.001, 0.005),
        Regime::Unknown => ReturnParams::new(0.0, 0.01),
    }
}

/// One weekly market index return.
pub fn regime_return<R: Rng + ?Sized>(regime: Regime, rng: &mut R) -> f64 {
    regime_params(regime).sample(rng)
}

/// Weekly return parameters for an alpha, including the regime/style tilt.
pub fn alpha_params(alpha: &AlphaStrategy, regime: Regime) -> ReturnParams {
    let weeks = f64::from(WEEKS_PER_YEAR);
    let mut mean = alpha.current_expected_return / weeks;
    let stdev = alpha.volatility / weeks.sqrt();
    if alpha.style == "Trend" {
        match regime {
            Regime::Trendy => mean *= 1.2,
            Regime::MeanReverting => mean *= 0.5,
            _ => {}
        }
    }
    ReturnParams::new(mean, stdev)
}

/// One weekly return for an alpha, before market beta.
pub fn alpha_return<R: Rng + ?Sized>(alpha: &AlphaStrategy, regime: Regime, rng: &mut R) -> f64 {
    alpha_params(alpha, regime).sample(rng)
}

/// Uniform draw of the next regime.
pub fn roll_regime<R: Rng + ?Sized>(rng: &mut R) -> Regime {
    *Regime::ALL.choose(rng).unwrap_or(&Regime::Trendy)
}

/// Annualized Sharpe of weekly values: mean / population stdev * sqrt(52).
/// Zero when fewer than two samples or no dispersion.
pub fn annualized_sharpe(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let sd = var.sqrt();
    if !(sd.is_finite() && sd > 0.0) {
        return 0.0;
    }
    mean / sd * f64::from(WEEKS_PER_YEAR).sqrt()
}
