//! Research pipeline: alpha discovery and risk-model projects.
//!
//! Probabilities are computed once when research starts and frozen on the
//! alpha; only the countdown moves afterwards.

use fund_core::{AlphaId, AlphaStatus, AlphaStrategy, Event, RiskResearch};
use rand::Rng;
use tracing::info;

use crate::{ActionError, Session};

/// Style name that routes research to the risk-model track.
pub const RISK_MODEL_TRACK: &str = "RiskModel";

/// Baseline for team averages when nobody is on the desk.
const NEUTRAL_TEAM_SCORE: f64 = 50.0;

#[derive(Clone, Debug, PartialEq)]
pub enum ResearchStarted {
    Alpha { id: AlphaId, weeks: u32 },
    RiskModel { name: String, weeks: u32 },
}

impl ResearchStarted {
    pub fn weeks(&self) -> u32 {
        match self {
            ResearchStarted::Alpha { weeks, .. } | ResearchStarted::RiskModel { weeks, .. } => *weeks,
        }
    }
}

impl Session {
    /// Weeks a project of `base_weeks` takes with the current team and infra.
    pub fn calculate_research_duration(&self, base_weeks: u32) -> u32 {
        let infra = &self.infrastructure;
        let reduction = (0.05 * self.team.len() as f64
            + 0.05 * f64::from(infra.data_quality - 1)
            + 0.03 * f64::from(infra.compute_level - 1))
            .min(0.5);
        let mut multiplier = 1.0 - reduction;

        if !self.team.is_empty() {
            let load = (self.alphas.in_research.len() + self.risk_research.len()) as f64
                / self.team.len() as f64;
            if load > 1.0 {
                multiplier *= 1.0 + 0.15 * (load - 1.0);
            }
        }

        match self.avg_team_happiness() {
            Some(h) if h >= 75.0 => multiplier *= 0.9,
            Some(h) if h <= 40.0 => multiplier *= 1.1,
            _ => {}
        }

        // ties round to even
        let weeks = (f64::from(base_weeks) * multiplier).round_ties_even();
        weeks.max(1.0) as u32
    }

    fn team_baseline(&self) -> (f64, f64) {
        (
            self.avg_team_skill().unwrap_or(NEUTRAL_TEAM_SCORE),
            self.avg_team_happiness().unwrap_or(NEUTRAL_TEAM_SCORE),
        )
    }

    /// Chance a new alpha project succeeds, after the difficulty handicap.
    pub fn research_success_probability(&self, avg_skill: f64, avg_happy: f64) -> f64 {
        let infra = &self.infrastructure;
        let raw = (0.5
            + 0.05 * f64::from(infra.data_quality)
            + 0.02 * f64::from(infra.compute_level - 1)
            + (0.002 * avg_skill).min(0.2)
            + (0.002 * (avg_happy - 50.0)).max(0.0))
        .min(0.95);
        (raw / self.player.alpha_handicap()).clamp(0.05, 0.95)
    }

    /// Chance a successful project turns out to be a breakthrough.
    pub fn super_alpha_chance(&self, avg_skill: f64, avg_happy: f64) -> f64 {
        let base = (0.02
            + 0.0002 * avg_skill
            + 0.0001 * (avg_happy - 50.0).max(0.0)
            + 0.01 * f64::from((self.infrastructure.data_quality - 1).max(0))
            + 0.005 * self.infra_team.len() as f64)
            .min(0.2);
        (base / self.player.alpha_handicap()).max(0.0)
    }

    /// Resilience baked into an alpha; lowers its decay rate on success.
    pub fn alpha_resilience(&self, avg_skill: f64, avg_happy: f64) -> f64 {
        let infra = &self.infrastructure;
        let mut base = 0.2
            + 0.002 * avg_skill
            + 0.002 * (avg_happy - 50.0).max(0.0)
            + 0.05 * f64::from((infra.devops_tooling - 1).max(0))
            + 0.05 * f64::from((infra.risk_tools_level - 1).max(0));
        if !self.infra_team.is_empty() {
            base += 0.05;
        }
        (base / self.player.alpha_handicap()).clamp(0.05, 0.9)
    }

    fn risk_research_success_probability(&self) -> f64 {
        let (avg_skill, avg_happy) = self.team_baseline();
        (0.6 + 0.1 * f64::from(self.infrastructure.data_quality - 1)
            + 0.002 * avg_skill
            + (0.002 * (avg_happy - 50.0)).max(0.0))
        .min(0.95)
    }

    /// Commit the desk to a research project of `duration` nominal weeks.
    pub fn start_research(&mut self, style: &str, duration: u32) -> Result<ResearchStarted, ActionError> {
        let style = style.trim();
        if style.is_empty() {
            return Err(ActionError::InvalidInput("Please choose a research style.".into()));
        }
        if duration == 0 {
            return Err(ActionError::InvalidInput("Research needs at least one week.".into()));
        }
        if style == RISK_MODEL_TRACK {
            return Ok(self.start_risk_model_research(duration));
        }

        let weeks = self.calculate_research_duration(duration);
        let (avg_skill, avg_happy) = self.team_baseline();
        let name = format!(
            "Alpha {}",
            self.alphas.in_research.len() + self.alphas.live.len() + 1
        );
        let id = self.next_alpha_id();
        let mut alpha = AlphaStrategy::new(id.clone(), name, style, weeks);
        alpha.base_research_duration = duration;
        alpha.success_prob = self.research_success_probability(avg_skill, avg_happy);
        alpha.potential_super = self.super_alpha_chance(avg_skill, avg_happy);
        alpha.resilience = self.alpha_resilience(avg_skill, avg_happy);
        info!(alpha = %id, style, weeks, success_prob = alpha.success_prob, "research started");
        self.alphas.in_research.push(alpha);

        if weeks < duration {
            self.log(format!("Research acceleration applied ({duration} -> {weeks} weeks)."));
        }
        Ok(ResearchStarted::Alpha { id, weeks })
    }

    fn start_risk_model_research(&mut self, duration: u32) -> ResearchStarted {
        let weeks = self.calculate_research_duration(duration);
        let mut project = RiskResearch::new(
            format!("Risk Model Upgrade {}", self.risk_research.len() + 1),
            weeks,
        );
        project.base_duration = duration;
        let name = project.name.clone();
        self.risk_research.push(project);
        info!(project = %name, weeks, "risk research started");
        self.log(format!("Risk research started: {name} ({weeks} weeks)."));
        ResearchStarted::RiskModel { name, weeks }
    }

    /// Tick every countdown and resolve whatever reached zero.
    pub(crate) fn advance_research(&mut self) {
        let (done, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.alphas.in_research)
            .into_iter()
            .map(|mut a| {
                a.weeks_remaining -= 1;
                a
            })
            .partition(|a| a.weeks_remaining <= 0);
        self.alphas.in_research = running;
        for alpha in done {
            self.complete_alpha_research(alpha);
        }

        let (done, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.risk_research)
            .into_iter()
            .map(|mut p| {
                p.weeks_remaining -= 1;
                p
            })
            .partition(|p| p.weeks_remaining <= 0);
        self.risk_research = running;
        for project in done {
            self.complete_risk_research(project);
        }
    }

    fn complete_alpha_research(&mut self, mut alpha: AlphaStrategy) {
        if self.rng.gen::<f64>() >= alpha.success_prob {
            info!(alpha = %alpha.id, "research failed");
            self.push_event(Event::notice(
                "Research Failed",
                format!("Alpha {} failed to produce results.", alpha.name),
            ));
            self.log(format!("Research FAILURE: {} yielded no signal.", alpha.name));
            return;
        }

        let breakthrough = self.rng.gen::<f64>() < alpha.potential_super;
        if breakthrough {
            alpha.base_expected_return = self.rng.gen_range(0.18..=0.35);
            alpha.volatility = self.rng.gen_range(0.08..=0.18);
            alpha.decay_rate = (0.01 * (1.0 - alpha.resilience)).max(0.003);
        } else {
            alpha.base_expected_return = self.rng.gen_range(0.05..=0.18);
            alpha.volatility = self.rng.gen_range(0.05..=0.15);
            alpha.decay_rate = (0.015 * (1.0 - alpha.resilience)).max(0.005);
        }
        alpha.current_expected_return = alpha.base_expected_return;
        alpha.apply_handicap(self.player.alpha_handicap());
        alpha.status = AlphaStatus::StoredForEnsemble;

        let name = alpha.name.clone();
        let expected = alpha.base_expected_return * 100.0;
        info!(alpha = %alpha.id, breakthrough, expected_return = alpha.base_expected_return, "research succeeded");
        self.alphas.stored_for_ensemble.push(alpha);

        if breakthrough {
            self.push_event(Event::notice(
                "Breakthrough Alpha",
                format!("{name} looks extraordinary. Guard it well."),
            ));
            self.log(format!("Breakthrough: {name} discovered (Exp Ret: {expected:.1}%)"));
            self.player.gain_xp(150);
            self.bump_team_happiness(6, "Breakthrough research lit up the desk.");
        } else {
            self.push_event(Event::notice(
                "Research Complete",
                format!("Alpha {name} finished research successfully!"),
            ));
            self.log(format!("Research SUCCESS: {name} discovered (Exp Ret: {expected:.1}%)"));
            self.bump_team_happiness(3, "Research win energized the team.");
            self.player.gain_xp(100);
        }
    }

    fn complete_risk_research(&mut self, project: RiskResearch) {
        let p_success = self.risk_research_success_probability();
        if self.rng.gen::<f64>() < p_success {
            self.risk_model.level += 1;
            self.player.gain_xp(120);
            let level = self.risk_model.level;
            info!(project = %project.name, level, "risk research succeeded");
            self.push_event(Event::notice(
                "Risk Model Upgrade",
                format!("{} completed. Risk model level is now {level}.", project.name),
            ));
            self.log(format!("Risk research success: {}. Risk level {level}.", project.name));
            self.player.adjust_infra(2.0);
        } else {
            info!(project = %project.name, "risk research failed");
            self.push_event(Event::notice(
                "Risk Research Failed",
                format!("{} stalled; revisit later.", project.name),
            ));
            self.log(format!("Risk research failed: {}.", project.name));
        }
    }
}
