//! Event queue producers and the decisions that resolve them.

use fund_core::{Event, EventChoice, EventEffect, InfraKind, InfraResponse, ResetDecision};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::{money, ActionError, Session};

pub const MARKET_NEWS_CHANCE: f64 = 0.1;
pub const INFRA_REQUEST_CHANCE: f64 = 0.1;
pub const TEAM_MEETING_CHANCE: f64 = 0.25;
/// Difficulty floor after accepting the rival fund's reset offer.
pub const HARD_MODE_HANDICAP: f64 = 1.35;
/// Weeks before a declined reset offer may come back.
pub const RESET_OFFER_COOLDOWN: u32 = 6;

impl Session {
    /// Drop the head event without acting on it.
    pub fn clear_event(&mut self) -> Option<Event> {
        self.events_queue.pop_front()
    }

    /// Act on choice `choice` of the head event. Events without choices are
    /// dismissed with `clear_event`.
    pub fn resolve_event(&mut self, choice: usize) -> Result<String, ActionError> {
        let head = self
            .events_queue
            .front()
            .ok_or_else(|| ActionError::NotFound("No pending event.".into()))?;
        let effect = head
            .choices
            .get(choice)
            .map(|c| c.effect.clone())
            .ok_or_else(|| {
                ActionError::InvalidInput(format!(
                    "Event '{}' has no choice {choice}.",
                    head.title
                ))
            })?;

        match effect {
            EventEffect::Restart => {
                self.restart();
                Ok("New game started.".into())
            }
            EventEffect::Continue => {
                self.clear_event();
                Ok("Continuing.".into())
            }
            EventEffect::ApproveInfra { infra } => {
                self.clear_event();
                Ok(self.handle_infra_request(InfraResponse::Approve, infra))
            }
            EventEffect::DelayInfra { infra } => {
                self.clear_event();
                Ok(self.handle_infra_request(InfraResponse::Delay, infra))
            }
            EventEffect::RejectInfra { infra } => {
                self.clear_event();
                Ok(self.handle_infra_request(InfraResponse::Reject, infra))
            }
            EventEffect::ResetOffer { decision } => self.handle_reset_offer(decision),
        }
    }

    pub(crate) fn maybe_market_news(&mut self) {
        if self.rng.gen::<f64>() < MARKET_NEWS_CHANCE {
            self.push_event(Event::notice("Market News", "Something happened in the market."));
        }
    }

    /// Weekly outage probability given current resilience and infra reputation.
    pub fn outage_chance(&self) -> f64 {
        let res = f64::from(self.resilience_score());
        let base = 0.18 + (60.0 - self.player.reputation_infra).max(0.0) * 0.002;
        (base - res / 400.0).max(0.02)
    }

    /// Outages push every alpha in research back a week.
    pub(crate) fn maybe_infra_outage(&mut self) {
        let chance = self.outage_chance();
        if self.rng.gen::<f64>() >= chance {
            return;
        }
        for alpha in &mut self.alphas.in_research {
            alpha.weeks_remaining += 1;
        }
        for m in &mut self.infra_team {
            m.happiness = (m.happiness - 1).max(0);
        }
        let res = self.resilience_score();
        warn!(resilience = res, "infra outage");
        self.push_event(Event::notice(
            "Infra Outage",
            "A systems outage slowed research by a week. Stronger infra and a happy infra team reduce this risk.",
        ));
        self.log(format!("Infra outage hit (resilience {res}). Research delayed."));
    }

    pub(crate) fn enqueue_infra_request(&mut self) {
        if self.team.is_empty() {
            return;
        }
        let k = (self.team.len() / 2).max(1).min(self.team.len());
        let askers: Vec<&str> = self
            .team
            .choose_multiple(&mut self.rng, k)
            .map(|q| q.name.as_str())
            .collect();
        let Some(&requested) = InfraKind::REQUESTABLE.choose(&mut self.rng) else {
            return;
        };
        let description = format!(
            "{} pushing for a {requested} upgrade to clear blockers.",
            match askers.as_slice() {
                [one] => format!("{one} is"),
                many => format!("{} are", many.join(", ")),
            }
        );
        let choices = vec![
            EventChoice::new(
                "Approve upgrade",
                EventEffect::infra(InfraResponse::Approve, requested),
            ),
            EventChoice::new("Delay", EventEffect::infra(InfraResponse::Delay, requested)),
            EventChoice::new("Reject", EventEffect::infra(InfraResponse::Reject, requested)),
        ];
        self.push_event(Event::with_choices("Infrastructure Ask", description, choices));
    }

    /// Apply the player's answer to an infrastructure ask.
    pub fn handle_infra_request(&mut self, response: InfraResponse, infra: InfraKind) -> String {
        match response {
            InfraResponse::Approve => match self.upgrade_infra(infra) {
                Ok(_) => {
                    self.bump_team_happiness(4, "Team thrilled at fast infra approval.");
                    "Upgrade approved".into()
                }
                Err(e) => {
                    info!(error = %e, "infra approval failed");
                    self.bump_team_happiness(-2, "Approval failed due to cash limits.");
                    "Not enough cash for upgrade".into()
                }
            },
            InfraResponse::Delay => {
                self.bump_team_happiness(-1, "Team frustrated by delay.");
                "Upgrade delayed".into()
            }
            InfraResponse::Reject => {
                self.bump_team_happiness(-4, "Rejection angered the team.");
                "Upgrade rejected".into()
            }
        }
    }

    pub(crate) fn maybe_team_meeting(&mut self) {
        let Some(avg) = self.avg_team_happiness() else {
            return;
        };
        if self.rng.gen::<f64>() > TEAM_MEETING_CHANCE {
            return;
        }

        if avg >= 70.0 {
            self.player.gain_xp(60);
            self.push_event(Event::notice(
                "Strategy Council",
                "The desk jammed on new ideas, infra and quant leads aligned, and you walked away with sharper plans. XP gained.",
            ));
            self.log("Team harmony unlocked fresh ideas. +60 XP.");
        } else if avg >= 45.0 {
            self.push_event(Event::notice(
                "Planning Session",
                "Mixed feedback and a pile of asks for infra and data. No crisis, but expectations are rising.",
            ));
            self.log("Planning session surfaced competing priorities. Keep morale healthy to gain momentum.");
        } else {
            let hit = 10;
            self.player.job_security -= hit;
            for q in &mut self.team {
                q.loyalty = (q.loyalty - 2).max(0);
            }
            self.player.adjust_management(-2.0);
            warn!(avg_happiness = avg, "contentious town hall");
            self.push_event(Event::notice(
                "Contentious Town Hall",
                "Frustrated quants and infra leads argued over priorities. Management noticed the chaos. Job security fell.",
            ));
            self.log(format!("Team discord spilled into a meeting. Job security -{hit}. Fix morale fast."));
        }
    }

    /// Management scrutiny of drawdowns and bad weeks; lighter during the
    /// startup grace period.
    pub(crate) fn management_reaction(&mut self, weekly_pnl: f64) {
        let dd = self.player.current_drawdown;
        if self.player.startup_grace_weeks > 0 {
            if dd > 0.3 {
                self.player.adjust_management(-1.0);
            }
            return;
        }

        if dd > 0.25 {
            let penalty = 5;
            self.player.job_security -= penalty;
            self.player.adjust_management(-4.0);
            self.bump_team_happiness(-3, "Management alarm spooked the desk.");
            warn!(drawdown = dd, "management alarm");
            self.push_event(Event::notice(
                "Management Alarm",
                "Severe drawdown triggered scrutiny. Fix risk or face termination.",
            ));
            self.log(format!(
                "Management Alarm: drawdown {:.1}%, job security -{penalty}.",
                dd * 100.0
            ));
        } else if dd > 0.15 {
            self.player.adjust_management(-2.0);
        }

        if weekly_pnl < -100_000.0 {
            let drop = 3;
            self.player.job_security -= drop;
            self.player.adjust_management(-2.0);
            self.bump_team_happiness(-2, "Weekly loss eroded confidence.");
            self.log(format!(
                "Management unhappy with weekly loss {}. Job security -{drop}.",
                money(weekly_pnl)
            ));
        }
    }

    /// Offer a hard-mode reset when the fund is badly hurt. Fires at most once
    /// per cooldown and never again after an accept.
    pub(crate) fn check_reset_offer(&mut self) {
        let p = &mut self.player;
        if p.reset_offer_used || p.reset_offer_active {
            return;
        }
        if p.reset_offer_cooldown > 0 {
            p.reset_offer_cooldown -= 1;
            return;
        }
        let severe_drawdown = p.current_drawdown >= 0.35;
        let capital_crushed = p.aum <= p.starting_aum * 0.1;
        if !(severe_drawdown || capital_crushed) {
            return;
        }

        p.reset_offer_active = true;
        let stake = money(self.config.starting_aum);
        info!(drawdown = p.current_drawdown, aum = p.aum, "reset offer extended");
        let description = format!(
            "Competing hedge fund offers you ${stake} to walk away from this drawdown and reboot. \
             Accepting resets PnL/AUM but unlocks a tougher market where alpha generation is harder."
        );
        let choices = vec![
            EventChoice::new(
                format!("Take the offer, reboot with ${stake}"),
                EventEffect::ResetOffer {
                    decision: ResetDecision::Accept,
                },
            ),
            EventChoice::new(
                "Stay and grind it out",
                EventEffect::ResetOffer {
                    decision: ResetDecision::Decline,
                },
            ),
        ];
        self.push_event(Event::with_choices("Competing Hedge Fund Call", description, choices));
    }

    /// Answer the reset offer. Fails when no offer is pending.
    pub fn handle_reset_offer(&mut self, decision: ResetDecision) -> Result<String, ActionError> {
        if !self.player.reset_offer_active {
            return Err(ActionError::NotFound("No reset offer is pending.".into()));
        }
        self.clear_event();
        self.player.reset_offer_active = false;

        match decision {
            ResetDecision::Accept => {
                self.apply_reset_hard_mode();
                Ok(format!(
                    "Offer accepted. Fresh ${}, but alpha discovery got tougher.",
                    money(self.config.starting_aum)
                ))
            }
            ResetDecision::Decline => {
                self.player.reset_offer_cooldown = self.player.reset_offer_cooldown.max(RESET_OFFER_COOLDOWN);
                info!("reset offer declined");
                self.log("You declined the rival fund lifeline. Pressure remains high.");
                Ok("Offer declined.".into())
            }
        }
    }

    fn apply_reset_hard_mode(&mut self) {
        let (cash, aum) = (self.config.starting_cash, self.config.starting_aum);
        let p = &mut self.player;
        p.reset_offer_used = true;
        p.reset_offer_cooldown = 0;
        p.alpha_difficulty = p.alpha_difficulty.max(HARD_MODE_HANDICAP);

        p.cash = cash;
        p.aum = aum;
        p.pnl_history.clear();
        p.yearly_pnl = 0.0;
        p.current_drawdown = 0.0;
        p.max_drawdown = 0.0;
        p.peak_aum = aum;
        p.rolling_sharpe = 0.0;
        p.starting_aum = aum;

        p.job_security = p.job_security.max(70);
        p.adjust_management(-6.0);
        p.adjust_quants(-3.0);

        self.portfolio.positions.clear();
        let handicap = self.player.alpha_handicap();
        for alpha in self.alphas.iter_mut() {
            alpha.apply_handicap(handicap);
        }
        warn!(handicap, "hard mode reset applied");

        self.bump_team_happiness(-4, "Desk rattled by wholesale reboot. Confidence shaken.");
        let stake = money(aum);
        self.push_event(Event::with_choices(
            "Fresh Start: Hard Mode",
            format!(
                "You took the rival fund's ${stake} reboot. PnL reset; alpha research now faces headwinds and decay hits harder."
            ),
            vec![EventChoice::new("Continue", EventEffect::Continue)],
        ));
        self.log(format!(
            "You accepted the ${stake} rival offer. PnL reset; alpha discovery handicap applied."
        ));
    }
}
