//! Validation of domain invariants.

use std::collections::BTreeSet;
use thiserror::Error;

use crate::alpha::{AlphaBuckets, AlphaStatus};
use crate::player::Player;
use crate::snapshot::GameSnapshot;

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
    /// Money amounts must be positive where required.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Shutdown threshold must sit below the win threshold.
    #[error("shutdown AUM must be below win AUM")]
    InvalidThresholds,
    /// Probability outside [0, 1].
    #[error("probability {0} is outside [0,1]")]
    InvalidProbability(f64),
    /// A 0..=100 score escaped its range.
    #[error("{field} = {value} is outside [0,100]")]
    ScoreOutOfRange { field: &'static str, value: f64 },
    /// Difficulty handicap must be at least 1.0.
    #[error("alpha difficulty {0} is below 1.0")]
    InvalidHandicap(f64),
    /// An alpha id occurs more than once across buckets.
    #[error("alpha {0} appears in more than one bucket")]
    DuplicateAlpha(String),
    /// An alpha sits in a bucket that disagrees with its status.
    #[error("alpha {0} is stored in the wrong bucket")]
    MisplacedAlpha(String),
    /// Staff name is empty or duplicated within a roster.
    #[error("invalid staff roster: {0}")]
    InvalidRoster(String),
    #[error("unknown staff kind: {0}")]
    UnknownStaffKind(String),
    #[error("unknown infrastructure: {0}")]
    UnknownInfra(String),
    #[error("unknown choice: {0}")]
    UnknownChoice(String),
}

fn check_score(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite);
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::ScoreOutOfRange { field, value });
    }
    Ok(())
}

/// Validate player money and reputation fields.
pub fn validate_player(p: &Player) -> Result<(), ValidationError> {
    for v in [p.cash, p.aum, p.peak_aum, p.yearly_pnl, p.current_drawdown] {
        if !v.is_finite() {
            return Err(ValidationError::NonFinite);
        }
    }
    check_score("reputation_management", p.reputation_management)?;
    check_score("reputation_quants", p.reputation_quants)?;
    check_score("reputation_infra", p.reputation_infra)?;
    if !(p.alpha_difficulty >= 1.0) {
        return Err(ValidationError::InvalidHandicap(p.alpha_difficulty));
    }
    Ok(())
}

/// Every alpha id appears once, in the bucket matching its status.
pub fn validate_alphas(alphas: &AlphaBuckets) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for status in [
        AlphaStatus::InResearch,
        AlphaStatus::StoredForEnsemble,
        AlphaStatus::Live,
        AlphaStatus::Ensemble,
    ] {
        for a in alphas.bucket(status) {
            if a.status != status {
                return Err(ValidationError::MisplacedAlpha(a.id.0.clone()));
            }
            if !seen.insert(&a.id) {
                return Err(ValidationError::DuplicateAlpha(a.id.0.clone()));
            }
        }
    }
    Ok(())
}

fn check_roster<'a>(roster: &str, names: impl Iterator<Item = &'a str>) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if name.trim().is_empty() || !seen.insert(name) {
            return Err(ValidationError::InvalidRoster(format!("{roster}: {name:?}")));
        }
    }
    Ok(())
}

/// Validate a whole snapshot, including cross-bucket alpha invariants.
pub fn validate_snapshot(s: &GameSnapshot) -> Result<(), ValidationError> {
    validate_player(&s.player)?;
    validate_alphas(&s.alphas)?;
    check_roster("team", s.team.iter().map(|q| q.name.as_str()))?;
    check_roster("infra_team", s.infra_team.iter().map(|m| m.name.as_str()))?;
    for q in s.team.iter().chain(&s.pending_hires) {
        check_score("happiness", f64::from(q.happiness))?;
        check_score("loyalty", f64::from(q.loyalty))?;
        check_score("skill", f64::from(q.skill))?;
    }
    for p in &s.portfolio.positions {
        if !p.weight.is_finite() || p.weight < 0.0 {
            return Err(ValidationError::NonFinite);
        }
    }
    Ok(())
}
