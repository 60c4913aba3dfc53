//! The portfolio manager: capital, reputation, progression and reset-offer state.

use serde::{Deserialize, Serialize};

/// Clamp a 0..=100 score after applying `delta`.
pub fn clamp_score(value: f64, delta: f64) -> f64 {
    (value + delta).clamp(0.0, 100.0)
}

/// One finished "guess the Sharpe" session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuessSharpeEntry {
    pub score: i64,
    pub avg_error: f64,
    pub week: u32,
    pub year: u32,
}

/// Persistent mini-game statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinigameStats {
    /// Top five sessions by score, best first.
    pub guess_sharpe_leaderboard: Vec<GuessSharpeEntry>,
}

/// Player state. Missing fields in older saves take the values of
/// [`Player::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub cash: f64,
    pub aum: f64,
    pub pnl_history: Vec<f64>,
    /// Peak-to-current decline as a fraction of peak AUM.
    pub current_drawdown: f64,
    pub max_drawdown: f64,
    pub peak_aum: f64,
    /// Annualized Sharpe of the most recent weekly P&L values.
    pub rolling_sharpe: f64,
    pub reputation_management: f64,
    pub reputation_risk: f64,
    pub relationship_quants: f64,
    /// 0..=100; the player is fired once this reaches zero.
    pub job_security: i32,

    pub level: u32,
    pub xp: u64,
    pub xp_to_next_level: u64,
    pub ability_points: u32,
    pub abilities: Vec<String>,
    pub reputation_infra: f64,
    pub reputation_quants: f64,
    pub minigame_stats: MinigameStats,
    pub yearly_pnl: f64,
    pub startup_grace_weeks: u32,
    pub starting_aum: f64,

    /// Handicap >= 1.0 applied to alpha research after a hard-mode reset.
    pub alpha_difficulty: f64,
    pub reset_offer_used: bool,
    pub reset_offer_active: bool,
    pub reset_offer_cooldown: u32,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(1_000_000.0, 50_000_000.0, 4)
    }
}

impl Player {
    pub fn new(cash: f64, aum: f64, startup_grace_weeks: u32) -> Self {
        Self {
            cash,
            aum,
            pnl_history: Vec::new(),
            current_drawdown: 0.0,
            max_drawdown: 0.0,
            peak_aum: aum,
            rolling_sharpe: 0.0,
            reputation_management: 50.0,
            reputation_risk: 50.0,
            relationship_quants: 50.0,
            job_security: 100,
            level: 1,
            xp: 0,
            xp_to_next_level: 1000,
            ability_points: 0,
            abilities: Vec::new(),
            reputation_infra: 50.0,
            reputation_quants: 50.0,
            minigame_stats: MinigameStats::default(),
            yearly_pnl: 0.0,
            startup_grace_weeks,
            starting_aum: aum,
            alpha_difficulty: 1.0,
            reset_offer_used: false,
            reset_offer_active: false,
            reset_offer_cooldown: 0,
        }
    }

    /// Add XP, levelling up as many times as the total allows.
    /// Returns the number of levels gained.
    pub fn gain_xp(&mut self, amount: u64) -> u32 {
        self.xp += amount;
        let mut gained = 0;
        while self.xp_to_next_level > 0 && self.xp >= self.xp_to_next_level {
            self.level_up();
            gained += 1;
        }
        gained
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.xp -= self.xp_to_next_level;
        self.xp_to_next_level = (self.xp_to_next_level as f64 * 1.2) as u64;
        self.ability_points += 1;
    }

    /// Handicap applied to research; never below 1.0.
    pub fn alpha_handicap(&self) -> f64 {
        self.alpha_difficulty.max(1.0)
    }

    /// Record a finished guess-the-Sharpe session, keeping the top five.
    pub fn record_guess_sharpe_score(&mut self, score: i64, avg_error: f64, week: u32, year: u32) {
        let board = &mut self.minigame_stats.guess_sharpe_leaderboard;
        board.push(GuessSharpeEntry {
            score,
            avg_error,
            week,
            year,
        });
        // stable sort keeps the earlier entry ahead on ties
        board.sort_by(|a, b| b.score.cmp(&a.score));
        board.truncate(5);
    }

    pub fn adjust_management(&mut self, delta: f64) {
        self.reputation_management = clamp_score(self.reputation_management, delta);
    }

    pub fn adjust_quants(&mut self, delta: f64) {
        self.reputation_quants = clamp_score(self.reputation_quants, delta);
    }

    pub fn adjust_infra(&mut self, delta: f64) {
        self.reputation_infra = clamp_score(self.reputation_infra, delta);
    }

    /// Refresh peak AUM and drawdowns from the current AUM.
    pub fn update_drawdowns(&mut self) {
        self.peak_aum = self.peak_aum.max(self.aum);
        if self.peak_aum > 0.0 {
            let dd = (self.peak_aum - self.aum) / self.peak_aum;
            self.current_drawdown = dd;
            self.max_drawdown = self.max_drawdown.max(dd);
        }
    }
}
