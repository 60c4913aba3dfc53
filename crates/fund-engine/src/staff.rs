//! Staff model: hiring pipeline, firing, morale, mentoring and payroll.

use fund_core::{
    minimum_salary_for_skill, Event, InfraSpecialist, Quant, StaffKind, StaffStatus, WEEKS_PER_YEAR,
};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::{money, ActionError, Session};

/// Share of the offered salary paid up front to a new quant.
pub const SIGNING_BONUS_RATE: f64 = 0.2;

const AVATARS: [&str; 4] = ["wizard", "robot", "cat", "alien"];

/// Cash cost of bringing on an infra specialist of `skill`.
pub fn infra_hire_cost(skill: i32) -> f64 {
    30_000.0 + f64::from(skill * 1_500)
}

/// Onboarding tiers: below `tiers.0` one week, below `tiers.1` two, else four.
fn onboarding_weeks(skill: i32, tiers: (i32, i32), management_rep: f64) -> i32 {
    let base = if skill < tiers.0 {
        1
    } else if skill < tiers.1 {
        2
    } else {
        4
    };
    if management_rep >= 70.0 {
        (base - 1).max(1)
    } else if management_rep <= 30.0 {
        base + 1
    } else {
        base
    }
}

/// Tick onboarding countdowns and split off the members that finished.
fn advance_onboarding<T>(pending: &mut Vec<T>, countdown: impl Fn(&mut T) -> &mut i32) -> Vec<T> {
    let mut joined = Vec::new();
    let mut waiting = Vec::with_capacity(pending.len());
    for mut member in pending.drain(..) {
        let weeks = countdown(&mut member);
        *weeks -= 1;
        if *weeks <= 0 {
            joined.push(member);
        } else {
            waiting.push(member);
        }
    }
    *pending = waiting;
    joined
}

fn bonus_rate(happiness: i32, rates: (f64, f64)) -> f64 {
    if happiness >= 80 {
        rates.0
    } else if happiness >= 50 {
        rates.1
    } else {
        0.0
    }
}

impl Session {
    fn name_taken(&self, name: &str) -> bool {
        self.team
            .iter()
            .chain(&self.pending_hires)
            .any(|q| q.name == name)
            || self
                .infra_team
                .iter()
                .chain(&self.pending_infra)
                .any(|m| m.name == name)
    }

    fn check_new_name(&self, name: &str) -> Result<(), ActionError> {
        if name.trim().is_empty() {
            return Err(ActionError::InvalidInput("Please provide a name.".into()));
        }
        if self.name_taken(name) {
            return Err(ActionError::InvalidInput(format!("{name} is already on the payroll.")));
        }
        Ok(())
    }

    /// Make an offer to a quant. The signing bonus is paid immediately and the
    /// hire joins the team once onboarding finishes.
    pub fn hire_quant(&mut self, name: &str, skill: i32, salary: f64) -> Result<String, ActionError> {
        self.check_new_name(name)?;
        if !(0..=100).contains(&skill) {
            return Err(ActionError::InvalidInput(format!("Skill {skill} is outside 0-100.")));
        }
        let min_salary = minimum_salary_for_skill(skill);
        if !salary.is_finite() || salary < min_salary {
            return Err(ActionError::InvalidOffer(format!(
                "Salary too low for skill {skill}. Offer at least ${}.",
                money(min_salary)
            )));
        }
        let signing_bonus = (salary * SIGNING_BONUS_RATE).trunc();
        if self.player.cash < signing_bonus {
            return Err(ActionError::InsufficientFunds {
                what: "signing bonus",
                needed: signing_bonus,
                available: self.player.cash,
            });
        }

        let mut quant = Quant::new(name, skill, salary);
        quant.avatar = AVATARS.choose(&mut self.rng).unwrap_or(&"robot").to_string();
        quant.happiness = (65 + ((salary - min_salary) / 3_000.0) as i32).min(100);
        quant.onboarding_weeks = onboarding_weeks(skill, (40, 70), self.player.reputation_management);
        quant.status = StaffStatus::Onboarding;
        let eta = quant.onboarding_weeks;
        self.pending_hires.push(quant);
        self.player.cash -= signing_bonus;

        info!(name, skill, salary, eta, "quant hire started");
        self.log(format!(
            "Hiring {name} (Skill {skill}) started. ETA {eta} weeks. Signing bonus ${}.",
            money(signing_bonus)
        ));
        Ok("Quant search started".into())
    }

    /// Bring on an infra specialist on the standard salary.
    pub fn hire_infra_specialist(&mut self, name: &str, skill: i32) -> Result<String, ActionError> {
        self.check_new_name(name)?;
        if !(0..=100).contains(&skill) {
            return Err(ActionError::InvalidInput(format!("Skill {skill} is outside 0-100.")));
        }
        let cost = infra_hire_cost(skill);
        if self.player.cash < cost {
            return Err(ActionError::InsufficientFunds {
                what: "infra hire",
                needed: cost,
                available: self.player.cash,
            });
        }

        let mut member = InfraSpecialist::new(name, skill);
        member.onboarding_weeks = onboarding_weeks(skill, (50, 75), self.player.reputation_management);
        member.status = StaffStatus::Onboarding;
        let eta = member.onboarding_weeks;
        self.pending_infra.push(member);
        self.player.cash -= cost;

        info!(name, skill, cost, eta, "infra hire started");
        self.log(format!(
            "Infra hire started: {name} (Skill {skill}) cost ${}, ETA {eta} weeks.",
            money(cost)
        ));
        Ok("Infra hire started".into())
    }

    /// Let an active staff member go. Pending hires cannot be fired.
    pub fn fire_staff(&mut self, kind: StaffKind, name: &str) -> Result<String, ActionError> {
        let removed = match kind {
            StaffKind::Quant => remove_named(&mut self.team, name, |q| &q.name),
            StaffKind::Infra => remove_named(&mut self.infra_team, name, |m| &m.name),
        };
        if !removed {
            return Err(ActionError::NotFound("Staff not found".into()));
        }

        info!(name, %kind, "staff fired");
        self.bump_team_happiness(-5, &format!("Fired {name} ({kind}). Team morale dropped."));
        self.player.adjust_management(-3.0);
        self.log(format!("Fired {name} ({kind})."));
        Ok("Staff fired".into())
    }

    pub(crate) fn process_hiring_pipeline(&mut self) {
        let joined = advance_onboarding(&mut self.pending_hires, |q| &mut q.onboarding_weeks);
        for mut q in joined {
            q.status = StaffStatus::Active;
            info!(name = %q.name, "quant joined");
            self.log(format!("{} joined the team. Skill {}.", q.name, q.skill));
            self.team.push(q);
        }
    }

    pub(crate) fn process_infra_hiring(&mut self) {
        let joined = advance_onboarding(&mut self.pending_infra, |m| &mut m.onboarding_weeks);
        for mut m in joined {
            m.status = StaffStatus::Active;
            info!(name = %m.name, "infra specialist joined");
            self.log(format!("{} joined the infra team. Skill {}.", m.name, m.skill));
            self.infra_team.push(m);
        }
    }

    /// Weekly pay check against market rates, then desk-wide consequences of
    /// the average mood: job security hits, revolts and attrition.
    pub(crate) fn apply_team_morale_effects(&mut self) {
        if self.team.is_empty() {
            return;
        }

        let mut total = 0.0;
        for q in &mut self.team {
            let min_salary = minimum_salary_for_skill(q.skill);
            if q.salary < min_salary {
                let drop = (3 + ((min_salary - q.salary) / 5_000.0) as i32).min(15);
                q.happiness = (q.happiness - drop).max(0);
                q.loyalty = (q.loyalty - drop / 2).max(0);
            } else {
                let bump = i32::from(q.happiness < 95);
                q.happiness = (q.happiness + bump).min(100);
                q.loyalty = (q.loyalty + bump).min(100);
            }
            if q.happiness < 25 {
                q.loyalty = (q.loyalty - 2).max(0);
            }
            total += f64::from(q.happiness);
            self.player.adjust_quants(if q.happiness < 40 { -1.0 } else { 0.2 });
        }

        let avg = total / self.team.len() as f64;
        if avg < 35.0 {
            let penalty = (((35.0 - avg) * 0.8) as i32).max(5);
            self.player.job_security -= penalty;
            warn!(avg_happiness = avg, penalty, "team morale hitting job security");
            self.log(format!(
                "Team morale warning: avg happiness {avg:.0}. Management trust -{penalty}."
            ));
            if avg < 20.0 && self.rng.gen::<f64>() < 0.35 {
                self.player.job_security -= 20;
                self.player.adjust_management(-3.0);
                warn!("desk revolt");
                self.push_event(Event::notice(
                    "Desk Revolt",
                    "Unhappy quants escalated to management. You were reprimanded hard. Fix morale or risk termination.",
                ));
            }
        }

        if avg < 30.0 && self.rng.gen::<f64>() < 0.2 {
            let flight_risks: Vec<usize> = self
                .team
                .iter()
                .enumerate()
                .filter(|(_, q)| q.happiness < 30)
                .map(|(i, _)| i)
                .collect();
            if let Some(&idx) = flight_risks.choose(&mut self.rng) {
                let departed = self.team.remove(idx);
                for q in &mut self.team {
                    q.happiness = (q.happiness - 5).max(0);
                    q.loyalty = (q.loyalty - 3).max(0);
                }
                warn!(name = %departed.name, "quant poached");
                self.push_event(Event::notice(
                    "Talent Poached",
                    format!(
                        "{} was hired away by a competing fund after prolonged unhappiness. Remaining team is unsettled.",
                        departed.name
                    ),
                ));
                self.log(format!(
                    "Attrition hit: {} left for a competitor. Team morale dipped.",
                    departed.name
                ));
                self.player.adjust_management(-2.0);
            }
        }
    }

    /// Happy desks teach each other: small random skill gains.
    pub(crate) fn mentor_quants(&mut self) {
        match self.avg_team_happiness() {
            Some(avg) if avg >= 60.0 => {}
            _ => return,
        }
        for q in &mut self.team {
            // two in three quants improve
            if self.rng.gen_range(0..3) == 0 {
                continue;
            }
            q.skill = (q.skill + 1).min(100);
            if self.rng.gen::<f64>() < 0.4 {
                q.happiness = (q.happiness + 1).min(100);
            }
        }
    }

    /// Weekly salaries, debited from both cash and AUM.
    pub fn pay_weekly_salaries(&mut self) -> f64 {
        let annual: f64 = self.team.iter().map(|q| q.salary).sum::<f64>()
            + self.infra_team.iter().map(|m| m.salary).sum::<f64>();
        let total = annual / f64::from(WEEKS_PER_YEAR);
        if total > 0.0 {
            self.player.cash -= total;
            self.player.aum -= total;
            self.log(format!("Payroll: Paid ${} in salaries.", money(total)));
        }
        total
    }

    /// Year-end bonuses, paid in week 52 only when the year made money.
    pub fn pay_year_end_bonuses(&mut self) -> f64 {
        if self.week != WEEKS_PER_YEAR {
            return 0.0;
        }
        if self.player.yearly_pnl <= 0.0 {
            self.log("No bonuses paid due to negative or zero yearly PnL.");
            return 0.0;
        }
        let bonuses: f64 = self
            .team
            .iter()
            .map(|q| q.salary * bonus_rate(q.happiness, (0.10, 0.05)))
            .chain(
                self.infra_team
                    .iter()
                    .map(|m| m.salary * bonus_rate(m.happiness, (0.06, 0.03))),
            )
            .sum();
        if bonuses > 0.0 {
            self.player.cash -= bonuses;
            self.player.aum -= bonuses;
            info!(bonuses, "year-end bonuses paid");
            self.log(format!("Year-end bonuses paid: ${}.", money(bonuses)));
        }
        bonuses
    }
}

fn remove_named<T>(roster: &mut Vec<T>, name: &str, key: impl Fn(&T) -> &String) -> bool {
    match roster.iter().position(|m| key(m) == name) {
        Some(idx) => {
            roster.remove(idx);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fund_core::GameConfig;

    fn session() -> Session {
        Session::new(GameConfig::default())
    }

    fn active_quant(name: &str, skill: i32, salary: f64, happiness: i32) -> Quant {
        let mut q = Quant::new(name, skill, salary);
        q.happiness = happiness;
        q
    }

    #[test]
    fn hire_quant_pays_signing_bonus_and_queues() {
        let mut s = session();
        let offer = minimum_salary_for_skill(50) + 20_000.0;
        assert_eq!(offer, 120_000.0);
        s.hire_quant("Bob", 50, offer).unwrap();
        assert_eq!(s.pending_hires.len(), 1);
        let q = &s.pending_hires[0];
        assert_eq!(q.onboarding_weeks, 2);
        assert_eq!(q.status, StaffStatus::Onboarding);
        assert_eq!(q.happiness, 71);
        assert!(AVATARS.contains(&q.avatar.as_str()));
        assert_eq!(s.player.cash, 1_000_000.0 - 24_000.0);
        assert!(s.team.is_empty());
    }

    #[test]
    fn lowball_offer_changes_nothing() {
        let mut s = session();
        let err = s.hire_quant("Bob", 50, 99_999.0).unwrap_err();
        assert!(matches!(err, ActionError::InvalidOffer(_)));
        assert!(s.pending_hires.is_empty());
        assert_eq!(s.player.cash, 1_000_000.0);
    }

    #[test]
    fn hire_validation() {
        let mut s = session();
        assert!(matches!(s.hire_quant("", 50, 200_000.0), Err(ActionError::InvalidInput(_))));
        assert!(matches!(s.hire_quant("X", 150, 900_000.0), Err(ActionError::InvalidInput(_))));
        s.hire_quant("Bob", 10, 60_000.0).unwrap();
        assert!(matches!(s.hire_quant("Bob", 10, 60_000.0), Err(ActionError::InvalidInput(_))));
        s.player.cash = 1_000.0;
        assert!(matches!(
            s.hire_quant("Cy", 10, 60_000.0),
            Err(ActionError::InsufficientFunds { needed, .. }) if needed == 12_000.0
        ));
        assert_eq!(s.pending_hires.len(), 1);
    }

    #[test]
    fn onboarding_depends_on_reputation() {
        assert_eq!(onboarding_weeks(80, (40, 70), 50.0), 4);
        assert_eq!(onboarding_weeks(80, (40, 70), 75.0), 3);
        assert_eq!(onboarding_weeks(10, (40, 70), 75.0), 1);
        assert_eq!(onboarding_weeks(10, (40, 70), 20.0), 2);
        assert_eq!(onboarding_weeks(60, (50, 75), 50.0), 2);
    }

    #[test]
    fn infra_hire_costs_and_queues() {
        let mut s = session();
        s.hire_infra_specialist("Ivy", 60).unwrap();
        assert_eq!(s.player.cash, 1_000_000.0 - 120_000.0);
        assert_eq!(s.pending_infra[0].onboarding_weeks, 2);
        assert_eq!(s.pending_infra[0].salary, InfraSpecialist::DEFAULT_SALARY);
        s.player.cash = 10.0;
        assert!(matches!(
            s.hire_infra_specialist("Jo", 60),
            Err(ActionError::InsufficientFunds { .. })
        ));
        assert_eq!(s.pending_infra.len(), 1);
    }

    #[test]
    fn pipeline_promotes_after_countdown() {
        let mut s = session();
        s.hire_quant("Bob", 50, 120_000.0).unwrap();
        s.process_hiring_pipeline();
        assert_eq!(s.pending_hires.len(), 1);
        s.process_hiring_pipeline();
        assert!(s.pending_hires.is_empty());
        assert_eq!(s.team.len(), 1);
        assert_eq!(s.team[0].status, StaffStatus::Active);

        s.hire_infra_specialist("Ivy", 10).unwrap();
        s.process_infra_hiring();
        assert_eq!(s.infra_team.len(), 1);
    }

    #[test]
    fn firing_hurts_morale_and_reputation() {
        let mut s = session();
        s.team.push(active_quant("A", 50, 120_000.0, 70));
        s.team.push(active_quant("B", 50, 120_000.0, 70));
        s.fire_staff(StaffKind::Quant, "A").unwrap();
        assert_eq!(s.team.len(), 1);
        assert_eq!(s.team[0].happiness, 65);
        assert_eq!(s.player.reputation_management, 47.0);
        assert!(matches!(
            s.fire_staff(StaffKind::Infra, "A"),
            Err(ActionError::NotFound(_))
        ));
    }

    #[test]
    fn pending_hires_cannot_be_fired() {
        let mut s = session();
        s.hire_quant("Bob", 50, 120_000.0).unwrap();
        assert!(matches!(s.fire_staff(StaffKind::Quant, "Bob"), Err(ActionError::NotFound(_))));
        assert_eq!(s.pending_hires.len(), 1);
    }

    #[test]
    fn payroll_hits_cash_and_aum() {
        let mut s = session();
        s.team.push(active_quant("A", 10, 52_000.0, 70));
        let mut infra = InfraSpecialist::new("I", 50);
        infra.salary = 52_000.0;
        s.infra_team.push(infra);
        let paid = s.pay_weekly_salaries();
        assert!((paid - 2_000.0).abs() < 1e-9);
        assert!((s.player.cash - 998_000.0).abs() < 1e-6);
        assert!((s.player.aum - 49_998_000.0).abs() < 1e-6);
    }

    #[test]
    fn bonuses_follow_happiness_tiers() {
        let mut s = session();
        s.week = 52;
        s.player.yearly_pnl = 1.0;
        s.team.push(active_quant("A", 50, 100_000.0, 80));
        let mut infra = InfraSpecialist::new("I", 50);
        infra.happiness = 50;
        s.infra_team.push(infra);
        let paid = s.pay_year_end_bonuses();
        assert!((paid - 12_400.0).abs() < 1e-9);
        assert!((s.player.cash - (1_000_000.0 - 12_400.0)).abs() < 1e-6);
    }

    #[test]
    fn no_bonus_in_losing_year_or_off_week() {
        let mut s = session();
        s.team.push(active_quant("A", 50, 100_000.0, 100));
        s.week = 52;
        s.player.yearly_pnl = 0.0;
        assert_eq!(s.pay_year_end_bonuses(), 0.0);
        s.player.yearly_pnl = 1e6;
        s.week = 51;
        assert_eq!(s.pay_year_end_bonuses(), 0.0);
        assert_eq!(s.player.cash, 1_000_000.0);
    }

    #[test]
    fn underpaid_quants_sour() {
        let mut s = session();
        // minimum for skill 50 is 100k; 20k short
        s.team.push(active_quant("A", 50, 80_000.0, 70));
        s.team.push(active_quant("B", 10, 52_000.0, 70));
        s.apply_team_morale_effects();
        assert_eq!(s.team[0].happiness, 63);
        assert_eq!(s.team[0].loyalty, 47);
        assert_eq!(s.team[1].happiness, 71);
        assert_eq!(s.team[1].loyalty, 51);
        assert!((s.player.reputation_quants - 50.4).abs() < 1e-9);
    }

    #[test]
    fn miserable_desk_costs_job_security() {
        let mut s = session();
        s.team.push(active_quant("A", 10, 52_000.0, 9));
        s.team.push(active_quant("B", 10, 52_000.0, 9));
        s.apply_team_morale_effects();
        // avg 10 -> penalty int(25 * 0.8) = 20, plus a possible revolt
        assert!(s.player.job_security == 80 || s.player.job_security == 60);
        assert!(s.player.reputation_quants < 50.0);
    }

    #[test]
    fn mentoring_needs_a_happy_desk() {
        let mut s = session();
        s.team.push(active_quant("A", 50, 120_000.0, 59));
        s.mentor_quants();
        assert_eq!(s.team[0].skill, 50);

        s.team[0].happiness = 90;
        for _ in 0..30 {
            s.mentor_quants();
        }
        assert!(s.team[0].skill > 50);
        assert!(s.team[0].skill <= 80);
    }
}
