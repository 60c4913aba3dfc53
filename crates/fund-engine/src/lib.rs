#![deny(warnings)]

//! Weekly simulation engine.
//!
//! A [`Session`] owns one game: the player, staff rosters, alphas, portfolio,
//! infrastructure, the event queue and a seeded RNG. Player actions are
//! methods returning `Result<_, ActionError>`; [`Session::advance_week`] runs
//! the end-of-week and start-of-week phases as one unit.

mod error;
pub mod events;
pub mod minigame;
pub mod portfolio;
pub mod research;
pub mod scheduler;
pub mod snapshot;
pub mod staff;

pub use error::ActionError;
pub use research::{ResearchStarted, RISK_MODEL_TRACK};
pub use scheduler::{GameOutcome, WeekReport};

use std::collections::VecDeque;

use fund_core::{
    AlphaBuckets, AlphaId, AlphaStrategy, Environment, Event, GameConfig, InfraSpecialist,
    Infrastructure, Player, Portfolio, Quant, RiskModel, RiskResearch,
};
use minigames::ActiveMiniGame;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Most recent narrative lines kept in the message log.
pub const MESSAGE_LOG_CAP: usize = 50;

/// One game in progress.
#[derive(Clone, Debug)]
pub struct Session {
    config: GameConfig,
    rng: ChaCha8Rng,
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
    pub alphas: AlphaBuckets,
    pub events_queue: VecDeque<Event>,
    pub message_log: VecDeque<String>,
    pub environment: Environment,
    next_alpha_seq: u64,
    active_minigame: Option<ActiveMiniGame>,
}

impl Session {
    /// Fresh state without running the first start-of-week.
    pub fn new(config: GameConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let player = Player::new(config.starting_cash, config.starting_aum, config.startup_grace_weeks);
        let mut session = Self {
            config,
            rng,
            week: 1,
            year: 1,
            player,
            team: Vec::new(),
            pending_hires: Vec::new(),
            infra_team: Vec::new(),
            pending_infra: Vec::new(),
            portfolio: Portfolio::default(),
            infrastructure: Infrastructure::default(),
            risk_model: RiskModel::default(),
            risk_research: Vec::new(),
            alphas: AlphaBuckets::default(),
            events_queue: VecDeque::new(),
            message_log: VecDeque::new(),
            environment: Environment::default(),
            next_alpha_seq: 1,
            active_minigame: None,
        };
        session.log("Welcome to the desk. Management expects steady returns.");
        session.log("Hire quants, fund research and deploy alphas to grow AUM.");
        session.log("Keep the team happy and drawdowns small or you will be shown the door.");
        session
    }

    /// A new game, ready for the first week of play.
    pub fn begin(config: GameConfig) -> Self {
        let mut session = Self::new(config);
        session.process_start_of_week();
        session
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Append a narrative line tagged with the current week.
    pub fn log(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        debug!(week = self.week, year = self.year, "{message}");
        self.message_log.push_back(format!("[W{}] {}", self.week, message));
        while self.message_log.len() > MESSAGE_LOG_CAP {
            self.message_log.pop_front();
        }
    }

    pub(crate) fn push_event(&mut self, event: Event) {
        debug!(title = %event.title, "event queued");
        self.events_queue.push_back(event);
    }

    /// The only actionable event.
    pub fn head_event(&self) -> Option<&Event> {
        self.events_queue.front()
    }

    pub fn avg_team_happiness(&self) -> Option<f64> {
        average(self.team.iter().map(|q| f64::from(q.happiness)))
    }

    pub fn avg_team_skill(&self) -> Option<f64> {
        average(self.team.iter().map(|q| f64::from(q.skill)))
    }

    pub(crate) fn avg_infra_skill(&self) -> Option<f64> {
        average(self.infra_team.iter().map(|m| f64::from(m.skill)))
    }

    pub(crate) fn avg_infra_happiness(&self) -> Option<f64> {
        average(self.infra_team.iter().map(|m| f64::from(m.happiness)))
    }

    /// Move every active quant's morale by `delta`.
    pub fn bump_team_happiness(&mut self, delta: i32, reason: &str) {
        if self.team.is_empty() || delta == 0 {
            return;
        }
        for q in &mut self.team {
            q.nudge_morale(delta);
        }
        if !reason.is_empty() {
            let sign = if delta > 0 { "+" } else { "" };
            self.log(format!("Team morale {sign}{delta}: {reason}"));
        }
    }

    /// Look an alpha up in any bucket.
    pub fn get_alpha(&self, id: &AlphaId) -> Option<&AlphaStrategy> {
        self.alphas.get(id)
    }

    pub(crate) fn next_alpha_id(&mut self) -> AlphaId {
        let id = AlphaId::from_seq(self.next_alpha_seq);
        self.next_alpha_seq += 1;
        id
    }
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Whole dollars with thousands separators.
pub(crate) fn money(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_has_welcome_lines() {
        let s = Session::new(GameConfig::default());
        assert_eq!(s.message_log.len(), 3);
        assert!(s.message_log.iter().all(|l| l.starts_with("[W1] ")));
        assert_eq!(s.player.cash, 1_000_000.0);
        assert!(s.events_queue.is_empty());
    }

    #[test]
    fn message_log_is_capped() {
        let mut s = Session::new(GameConfig::default());
        for i in 0..80 {
            s.log(format!("line {i}"));
        }
        assert_eq!(s.message_log.len(), MESSAGE_LOG_CAP);
        assert_eq!(s.message_log.back().map(String::as_str), Some("[W1] line 79"));
    }

    #[test]
    fn averages_are_none_without_staff() {
        let s = Session::new(GameConfig::default());
        assert_eq!(s.avg_team_happiness(), None);
        assert_eq!(s.avg_team_skill(), None);
    }

    #[test]
    fn team_bump_clamps_and_moves_loyalty() {
        let mut s = Session::new(GameConfig::default());
        let mut q = Quant::new("Ada", 60, 120_000.0);
        q.happiness = 98;
        s.team.push(q);
        s.bump_team_happiness(5, "test");
        assert_eq!(s.team[0].happiness, 100);
        assert_eq!(s.team[0].loyalty, 52);
        s.bump_team_happiness(-4, "");
        assert_eq!(s.team[0].happiness, 96);
        assert_eq!(s.team[0].loyalty, 48);
    }

    #[test]
    fn money_formatting() {
        assert_eq!(money(0.0), "0");
        assert_eq!(money(1_234_567.4), "1,234,567");
        assert_eq!(money(-52_000.0), "-52,000");
        assert_eq!(money(999.0), "999");
    }
}
