//! Full-state snapshot and restore.

use fund_core::{validate_snapshot, GameConfig, GameSnapshot, ValidationError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::{Session, MESSAGE_LOG_CAP};

impl Session {
    /// Serializable copy of every entity in the game.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            week: self.week,
            year: self.year,
            player: self.player.clone(),
            team: self.team.clone(),
            pending_hires: self.pending_hires.clone(),
            infra_team: self.infra_team.clone(),
            pending_infra: self.pending_infra.clone(),
            portfolio: self.portfolio.clone(),
            infrastructure: self.infrastructure.clone(),
            risk_model: self.risk_model.clone(),
            risk_research: self.risk_research.clone(),
            resilience_score: self.resilience_score(),
            alphas: self.alphas.clone(),
            events_queue: self.events_queue.iter().cloned().collect(),
            message_log: self.message_log.iter().cloned().collect(),
            environment: self.environment.clone(),
            avg_team_happiness: self.avg_team_happiness(),
            next_alpha_seq: self.next_alpha_seq,
        }
    }

    /// Rebuild a session from a snapshot. Derived fields in the snapshot are
    /// ignored and recomputed; the random stream is reseeded from the config
    /// seed and the snapshot's calendar position.
    pub fn restore(snapshot: GameSnapshot, config: GameConfig) -> Result<Self, ValidationError> {
        validate_snapshot(&snapshot)?;
        let next_alpha_seq = snapshot.derived_alpha_seq();
        let seed = config.rng_seed ^ (u64::from(snapshot.year) << 16 | u64::from(snapshot.week));
        let skip = snapshot.message_log.len().saturating_sub(MESSAGE_LOG_CAP);
        info!(week = snapshot.week, year = snapshot.year, "session restored");
        Ok(Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            week: snapshot.week,
            year: snapshot.year,
            player: snapshot.player,
            team: snapshot.team,
            pending_hires: snapshot.pending_hires,
            infra_team: snapshot.infra_team,
            pending_infra: snapshot.pending_infra,
            portfolio: snapshot.portfolio,
            infrastructure: snapshot.infrastructure,
            risk_model: snapshot.risk_model,
            risk_research: snapshot.risk_research,
            alphas: snapshot.alphas,
            events_queue: snapshot.events_queue.into(),
            message_log: snapshot.message_log.into_iter().skip(skip).collect(),
            environment: snapshot.environment,
            next_alpha_seq,
            active_minigame: None,
        })
    }

    /// Check the live state against the domain invariants.
    pub fn check_invariants(&self) -> Result<(), ValidationError> {
        validate_snapshot(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fund_core::{AlphaId, AlphaStatus, AlphaStrategy};

    #[test]
    fn restore_reproduces_snapshot() {
        let mut s = Session::begin(GameConfig::default());
        s.hire_quant("Bob", 50, 120_000.0).unwrap();
        s.start_research("Trend", 6).unwrap();
        for _ in 0..3 {
            s.advance_week();
        }
        let snap = s.snapshot();
        let restored = Session::restore(snap.clone(), GameConfig::default()).unwrap();
        assert_eq!(restored.snapshot(), snap);

        let json = serde_json::to_string(&snap).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.week, snap.week);
        assert_eq!(back.team.len() + back.pending_hires.len(), 1);
    }

    #[test]
    fn restored_ids_do_not_collide() {
        let mut snap = GameSnapshot::default();
        let mut a = AlphaStrategy::new(AlphaId::from_seq(7), "Alpha 1", "Value", 2);
        a.status = AlphaStatus::InResearch;
        snap.alphas.in_research.push(a);
        let mut s = Session::restore(snap, GameConfig::default()).unwrap();
        s.start_research("Value", 2).unwrap();
        assert_eq!(s.alphas.in_research[1].id, AlphaId::from_seq(8));
        s.check_invariants().unwrap();
    }

    #[test]
    fn restore_trims_long_logs() {
        let mut snap = GameSnapshot::default();
        snap.message_log = (0..70).map(|i| format!("[W1] {i}")).collect();
        let s = Session::restore(snap, GameConfig::default()).unwrap();
        assert_eq!(s.message_log.len(), MESSAGE_LOG_CAP);
        assert_eq!(s.message_log.front().map(String::as_str), Some("[W1] 20"));
    }

    #[test]
    fn invalid_snapshot_is_rejected() {
        let mut snap = GameSnapshot::default();
        snap.player.reputation_management = 140.0;
        assert!(matches!(
            Session::restore(snap, GameConfig::default()),
            Err(ValidationError::ScoreOutOfRange { .. })
        ));
    }
}
