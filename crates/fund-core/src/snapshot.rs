//! Full-state snapshot. Field names are the wire contract.

use serde::{Deserialize, Serialize};

use crate::alpha::AlphaBuckets;
use crate::environment::Environment;
use crate::event::Event;
use crate::infra::{Infrastructure, RiskModel, RiskResearch};
use crate::player::Player;
use crate::portfolio::Portfolio;
use crate::staff::{InfraSpecialist, Quant};

/// Version of the snapshot layout written by this build.
///
/// 0: unversioned saves (bare state, no envelope).
/// 1: versioned envelope; `next_alpha_seq` tracked explicitly.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Every entity of a session. `resilience_score` and `avg_team_happiness`
/// are derived on write and ignored on restore.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSnapshot {
    pub week: u32,
    pub year: u32,
    pub player: Player,
    pub team: Vec<Quant>,
    pub pending_hires: Vec<Quant>,
    pub infra_team: Vec<InfraSpecialist>,
    pub pending_infra: Vec<InfraSpecialist>,
    pub portfolio: Portfolio,
    pub infrastructure: Infrastructure,
    pub risk_model: RiskModel,
    pub risk_research: Vec<RiskResearch>,
    pub resilience_score: i32,
    pub alphas: AlphaBuckets,
    pub events_queue: Vec<Event>,
    pub message_log: Vec<String>,
    pub environment: Environment,
    pub avg_team_happiness: Option<f64>,
    /// Next sequence number for alpha ids; 0 means "derive from existing ids".
    pub next_alpha_seq: u64,
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            week: 1,
            year: 1,
            player: Player::default(),
            team: Vec::new(),
            pending_hires: Vec::new(),
            infra_team: Vec::new(),
            pending_infra: Vec::new(),
            portfolio: Portfolio::default(),
            infrastructure: Infrastructure::default(),
            risk_model: RiskModel::default(),
            risk_research: Vec::new(),
            resilience_score: 0,
            alphas: AlphaBuckets::default(),
            events_queue: Vec::new(),
            message_log: Vec::new(),
            environment: Environment::default(),
            avg_team_happiness: None,
            next_alpha_seq: 0,
        }
    }
}

impl GameSnapshot {
    /// First alpha sequence number not used by any stored alpha.
    pub fn derived_alpha_seq(&self) -> u64 {
        let max_seen = self.alphas.iter().filter_map(|a| a.id.seq()).max().unwrap_or(0);
        self.next_alpha_seq.max(max_seen + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alpha::{AlphaId, AlphaStrategy};

    #[test]
    fn empty_document_restores_fresh_defaults() {
        let snap: GameSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snap.week, 1);
        assert_eq!(snap.year, 1);
        assert_eq!(snap.infrastructure.compute_level, 1);
        assert!(snap.alphas.is_empty());
    }

    #[test]
    fn top_level_keys_are_stable() {
        let v = serde_json::to_value(GameSnapshot::default()).unwrap();
        for key in [
            "week",
            "year",
            "player",
            "team",
            "pending_hires",
            "infra_team",
            "pending_infra",
            "portfolio",
            "infrastructure",
            "risk_model",
            "risk_research",
            "resilience_score",
            "alphas",
            "events_queue",
            "message_log",
            "environment",
        ] {
            assert!(v.get(key).is_some(), "missing key {key}");
        }
        for bucket in ["live", "in_research", "stored_for_ensemble", "ensembles"] {
            assert!(v["alphas"].get(bucket).is_some(), "missing bucket {bucket}");
        }
    }

    #[test]
    fn alpha_seq_is_derived_from_ids() {
        let mut snap = GameSnapshot::default();
        snap.alphas
            .live
            .push(AlphaStrategy::new(AlphaId("alpha_4821".into()), "Alpha 1", "Trend", 4));
        assert_eq!(snap.derived_alpha_seq(), 4822);
        snap.next_alpha_seq = 9000;
        assert_eq!(snap.derived_alpha_seq(), 9000);
    }
}
