//! Alpha strategies and the four lifecycle buckets they live in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identity of an alpha across buckets.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlphaId(pub String);

impl AlphaId {
    pub fn from_seq(seq: u64) -> Self {
        AlphaId(format!("alpha_{seq:04}"))
    }

    /// Sequence number encoded in an id produced by [`AlphaId::from_seq`].
    pub fn seq(&self) -> Option<u64> {
        self.0.strip_prefix("alpha_")?.parse().ok()
    }
}

impl fmt::Display for AlphaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle stage. `Ensemble` is reserved and never assigned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaStatus {
    #[default]
    InResearch,
    StoredForEnsemble,
    Live,
    Ensemble,
}

/// A synthetic trading signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaStrategy {
    pub id: AlphaId,
    pub name: String,
    /// Style tag, e.g. "Trend" or "MeanReversion".
    pub style: String,
    pub status: AlphaStatus,
    /// Effective research duration in weeks.
    pub research_duration: u32,
    /// Duration requested before team/infra adjustments.
    pub base_research_duration: u32,
    pub weeks_remaining: i32,
    /// Annualized expected return at discovery.
    pub base_expected_return: f64,
    /// Annualized expected return after weekly decay.
    pub current_expected_return: f64,
    /// Annualized volatility.
    pub volatility: f64,
    /// Not modelled by the simulation; kept so saves carry the field
    /// through load and save unchanged.
    pub factor_exposures: BTreeMap<String, f64>,
    /// Not modelled by the simulation; carried through saves like
    /// `factor_exposures`.
    pub capacity: f64,
    /// Fractional decay of expected return per week.
    pub decay_rate: f64,
    /// Market beta.
    pub beta: f64,
    /// Frozen at research start.
    pub success_prob: f64,
    /// Frozen at research start.
    pub potential_super: f64,
    /// Frozen at research start; lowers decay on success.
    pub resilience: f64,
}

impl Default for AlphaStrategy {
    fn default() -> Self {
        Self::new(AlphaId::default(), "", "", 0)
    }
}

impl AlphaStrategy {
    pub fn new(id: AlphaId, name: impl Into<String>, style: impl Into<String>, duration: u32) -> Self {
        Self {
            id,
            name: name.into(),
            style: style.into(),
            status: AlphaStatus::InResearch,
            research_duration: duration,
            base_research_duration: duration,
            weeks_remaining: duration as i32,
            base_expected_return: 0.0,
            current_expected_return: 0.0,
            volatility: 0.0,
            factor_exposures: BTreeMap::new(),
            capacity: 0.0,
            decay_rate: 0.01,
            beta: 1.0,
            success_prob: 0.55,
            potential_super: 0.02,
            resilience: 0.3,
        }
    }

    /// One week of expected-return decay.
    pub fn decay(&mut self) {
        self.current_expected_return *= 1.0 - self.decay_rate;
    }

    /// Scale returns down and decay up by the difficulty handicap.
    pub fn apply_handicap(&mut self, handicap: f64) {
        self.base_expected_return /= handicap;
        self.current_expected_return /= handicap;
        self.decay_rate *= handicap;
    }
}

/// The four lifecycle buckets. An alpha id appears in exactly one of them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaBuckets {
    pub live: Vec<AlphaStrategy>,
    pub in_research: Vec<AlphaStrategy>,
    pub stored_for_ensemble: Vec<AlphaStrategy>,
    pub ensembles: Vec<AlphaStrategy>,
}

impl AlphaBuckets {
    pub fn bucket(&self, status: AlphaStatus) -> &Vec<AlphaStrategy> {
        match status {
            AlphaStatus::InResearch => &self.in_research,
            AlphaStatus::StoredForEnsemble => &self.stored_for_ensemble,
            AlphaStatus::Live => &self.live,
            AlphaStatus::Ensemble => &self.ensembles,
        }
    }

    pub fn bucket_mut(&mut self, status: AlphaStatus) -> &mut Vec<AlphaStrategy> {
        match status {
            AlphaStatus::InResearch => &mut self.in_research,
            AlphaStatus::StoredForEnsemble => &mut self.stored_for_ensemble,
            AlphaStatus::Live => &mut self.live,
            AlphaStatus::Ensemble => &mut self.ensembles,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlphaStrategy> {
        self.live
            .iter()
            .chain(&self.in_research)
            .chain(&self.stored_for_ensemble)
            .chain(&self.ensembles)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AlphaStrategy> {
        self.live
            .iter_mut()
            .chain(self.in_research.iter_mut())
            .chain(self.stored_for_ensemble.iter_mut())
            .chain(self.ensembles.iter_mut())
    }

    /// Look an alpha up across all buckets.
    pub fn get(&self, id: &AlphaId) -> Option<&AlphaStrategy> {
        self.iter().find(|a| &a.id == id)
    }

    /// Move an alpha between buckets, updating its status.
    /// Returns false if it was not in `from`.
    pub fn transfer(&mut self, id: &AlphaId, from: AlphaStatus, to: AlphaStatus) -> bool {
        let source = self.bucket_mut(from);
        let Some(pos) = source.iter().position(|a| &a.id == id) else {
            return false;
        };
        let mut alpha = source.remove(pos);
        alpha.status = to;
        self.bucket_mut(to).push(alpha);
        true
    }

    pub fn len(&self) -> usize {
        self.live.len() + self.in_research.len() + self.stored_for_ensemble.len() + self.ensembles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(seq: u64, status: AlphaStatus) -> AlphaStrategy {
        let mut a = AlphaStrategy::new(AlphaId::from_seq(seq), format!("Alpha {seq}"), "Trend", 4);
        a.status = status;
        a
    }

    #[test]
    fn ids_round_trip_sequence() {
        let id = AlphaId::from_seq(7);
        assert_eq!(id.0, "alpha_0007");
        assert_eq!(id.seq(), Some(7));
        assert_eq!(AlphaId("alpha_4821".into()).seq(), Some(4821));
        assert_eq!(AlphaId("custom".into()).seq(), None);
    }

    #[test]
    fn transfer_moves_exactly_once() {
        let mut buckets = AlphaBuckets::default();
        buckets.stored_for_ensemble.push(alpha(1, AlphaStatus::StoredForEnsemble));
        let id = AlphaId::from_seq(1);
        assert!(buckets.transfer(&id, AlphaStatus::StoredForEnsemble, AlphaStatus::Live));
        assert!(!buckets.transfer(&id, AlphaStatus::StoredForEnsemble, AlphaStatus::Live));
        assert_eq!(buckets.live.len(), 1);
        assert!(buckets.stored_for_ensemble.is_empty());
        assert_eq!(buckets.get(&id).unwrap().status, AlphaStatus::Live);
    }

    #[test]
    fn decay_and_handicap() {
        let mut a = alpha(1, AlphaStatus::Live);
        a.base_expected_return = 0.135;
        a.current_expected_return = 0.135;
        a.decay_rate = 0.01;
        a.decay();
        assert!((a.current_expected_return - 0.13365).abs() < 1e-12);
        a.apply_handicap(1.35);
        assert!((a.base_expected_return - 0.1).abs() < 1e-12);
        assert!((a.decay_rate - 0.0135).abs() < 1e-12);
    }

    #[test]
    fn status_serializes_snake_case() {
        let s = serde_json::to_string(&AlphaStatus::StoredForEnsemble).unwrap();
        assert_eq!(s, "\"stored_for_ensemble\"");
    }

    #[test]
    fn unmodelled_fields_survive_reload() {
        let doc = r#"{"id": "alpha_0003", "factor_exposures": {"momentum": 0.4}, "capacity": 2500000.0}"#;
        let a: AlphaStrategy = serde_json::from_str(doc).unwrap();
        let back: AlphaStrategy = serde_json::from_str(&serde_json::to_string(&a).unwrap()).unwrap();
        assert_eq!(back.factor_exposures.get("momentum"), Some(&0.4));
        assert_eq!(back.capacity, 2_500_000.0);
    }
}
