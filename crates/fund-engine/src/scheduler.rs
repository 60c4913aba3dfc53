//! Week scheduler: the start-of-week and end-of-week phases.

use fund_core::{Event, EventChoice, EventEffect, WEEKS_PER_YEAR};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::events::INFRA_REQUEST_CHANCE;
use crate::{money, Session};

/// Terminal or milestone state detected at the end of a week.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Fired,
    ShutDown,
    Won,
}

/// Summary of one processed week.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeekReport {
    /// Week and year that were processed.
    pub week: u32,
    pub year: u32,
    pub market_return: f64,
    pub pnl: f64,
    pub payroll: f64,
    pub bonuses: f64,
    pub outcome: Option<GameOutcome>,
}

impl Session {
    /// Hints, regime evolution, alpha decay, research countdowns and the
    /// random events that fire before the player acts.
    pub fn process_start_of_week(&mut self) {
        if self.week == 1 && self.year == 1 {
            self.log("Hint: Hire a quant and start research immediately.");
        }
        if self.player.cash < 100_000.0 {
            self.log("WARNING: Cash reserves critical.");
        }

        self.evolve_regime();

        for alpha in self
            .alphas
            .live
            .iter_mut()
            .chain(self.alphas.stored_for_ensemble.iter_mut())
        {
            alpha.decay();
        }

        self.advance_research();
        self.maybe_market_news();
        self.maybe_infra_outage();
        if !self.team.is_empty() && self.rng.gen::<f64>() < INFRA_REQUEST_CHANCE {
            self.enqueue_infra_request();
        }
    }

    fn evolve_regime(&mut self) {
        if self.rng.gen::<f64>() < self.config.regime_change_prob {
            let regime = fund_market::roll_regime(&mut self.rng);
            self.environment.regime = regime;
            self.environment.weeks_in_regime = 0;
            info!(%regime, "regime change");
            self.push_event(Event::notice(
                "Regime Change",
                format!("Markets have shifted into a {regime} regime."),
            ));
            self.log(format!("MARKET REGIME CHANGE DETECTED: Now {regime}"));
        } else {
            self.environment.weeks_in_regime += 1;
        }
    }

    /// Book the week's P&L, pay staff, run the hiring pipeline, apply
    /// management and morale consequences, roll the calendar and check for
    /// a terminal state.
    pub fn process_end_of_week(&mut self) -> WeekReport {
        let (week, year) = (self.week, self.year);
        let market_return = fund_market::regime_return(self.environment.regime, &mut self.rng);
        let pnl = self.weekly_pnl(market_return);
        self.book_pnl(pnl);
        self.react_to_pnl(pnl);

        let payroll = self.pay_weekly_salaries();
        let bonuses = self.pay_year_end_bonuses();
        self.process_hiring_pipeline();
        self.process_infra_hiring();
        self.mentor_quants();
        self.management_reaction(pnl);
        self.log_week_story(pnl, payroll, bonuses, market_return);

        self.roll_calendar();

        self.apply_team_morale_effects();
        self.maybe_team_meeting();
        self.check_reset_offer();
        let outcome = self.check_outcome();

        info!(week, year, pnl, aum = self.player.aum, "week closed");
        WeekReport {
            week,
            year,
            market_return,
            pnl,
            payroll,
            bonuses,
            outcome,
        }
    }

    /// Close the current week and open the next one.
    pub fn advance_week(&mut self) -> WeekReport {
        let report = self.process_end_of_week();
        self.process_start_of_week();
        report
    }

    fn react_to_pnl(&mut self, pnl: f64) {
        if pnl > 0.0 {
            self.player.gain_xp((pnl / 10_000.0) as u64);
            let boost = (1 + (pnl / 100_000.0) as i32).min(4);
            self.bump_team_happiness(boost, "Strong signals boosted team confidence.");
            self.player.adjust_quants(1.0);
        } else if pnl < 0.0 && pnl > -50_000.0 {
            self.bump_team_happiness(1, "Team appreciated steady leadership in a tough week.");
            self.player.adjust_management(1.0);
        }
    }

    fn roll_calendar(&mut self) {
        self.week += 1;
        if self.week > WEEKS_PER_YEAR {
            self.week = 1;
            self.year += 1;
            self.player.yearly_pnl = 0.0;
            info!(year = self.year, "new year");
        }
        self.player.startup_grace_weeks = self.player.startup_grace_weeks.saturating_sub(1);
    }

    fn check_outcome(&mut self) -> Option<GameOutcome> {
        let restart = || vec![EventChoice::new("Restart", EventEffect::Restart)];
        let outcome = if self.player.job_security <= 0 {
            self.push_event(Event::with_choices(
                "GAME OVER",
                "You have been fired. Your fund collapsed.",
                restart(),
            ));
            GameOutcome::Fired
        } else if self.player.aum < self.config.shutdown_aum && !self.player.reset_offer_active {
            self.push_event(Event::with_choices(
                "GAME OVER",
                "AUM dropped too low. The fund has been shut down.",
                restart(),
            ));
            GameOutcome::ShutDown
        } else if self.player.aum > self.config.win_aum {
            self.push_event(Event::with_choices(
                "YOU WIN!",
                format!("You reached ${} AUM! You are a legend.", money(self.config.win_aum)),
                vec![EventChoice::new("Continue", EventEffect::Continue)],
            ));
            GameOutcome::Won
        } else {
            return None;
        };
        warn!(?outcome, aum = self.player.aum, job_security = self.player.job_security, "game outcome");
        Some(outcome)
    }

    fn log_week_story(&mut self, pnl: f64, payroll: f64, bonuses: f64, market_return: f64) {
        let mut bits = vec![
            format!("Regime {}", self.environment.regime),
            format!("Resilience {}", self.resilience_score()),
            format!("PnL {}", money(pnl)),
            format!("Payroll {}", money(payroll)),
            format!("RepQ {:.0}", self.player.reputation_quants),
            format!("RepM {:.0}", self.player.reputation_management),
        ];
        if bonuses != 0.0 {
            bits.push(format!("Bonuses {}", money(bonuses)));
        }
        if let Some(morale) = self.avg_team_happiness() {
            bits.push(format!("Avg morale {morale:.0}"));
        }
        bits.push(format!("Market move {market_return:.3}"));
        self.log(format!("Story: {}", bits.join(" | ")));
    }

    /// Throw the current game away and start over with the same config. The
    /// random stream carries on rather than replaying the first game.
    pub fn restart(&mut self) {
        let rng = self.rng.clone();
        let mut fresh = Session::new(self.config.clone());
        fresh.rng = rng;
        *self = fresh;
        info!("game restarted");
        self.process_start_of_week();
    }
}
