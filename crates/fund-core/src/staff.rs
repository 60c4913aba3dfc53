//! Quants and infrastructure specialists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validate::ValidationError;

/// Minimum annual salary a quant of `skill` accepts.
pub fn minimum_salary_for_skill(skill: i32) -> f64 {
    40_000.0 + f64::from(skill * 1_200)
}

/// Lifecycle of a hire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    Onboarding,
    #[default]
    Active,
}

/// Which roster a staff operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffKind {
    Quant,
    Infra,
}

impl fmt::Display for StaffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaffKind::Quant => write!(f, "quant"),
            StaffKind::Infra => write!(f, "infra"),
        }
    }
}

impl FromStr for StaffKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quant" => Ok(StaffKind::Quant),
            "infra" => Ok(StaffKind::Infra),
            other => Err(ValidationError::UnknownStaffKind(other.to_string())),
        }
    }
}

/// A researcher on the quant desk. `name` is unique within its roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quant {
    pub name: String,
    /// 0..=100.
    pub skill: i32,
    /// 0..=100.
    pub happiness: i32,
    pub salary: f64,
    pub workload: i32,
    /// 0..=100.
    pub loyalty: i32,
    pub avatar: String,
    pub onboarding_weeks: i32,
    pub status: StaffStatus,
}

impl Default for Quant {
    fn default() -> Self {
        Self::new("", 50, 0.0)
    }
}

impl Quant {
    pub fn new(name: impl Into<String>, skill: i32, salary: f64) -> Self {
        Self {
            name: name.into(),
            skill,
            happiness: 70,
            salary,
            workload: 0,
            loyalty: 50,
            avatar: "robot".to_string(),
            onboarding_weeks: 0,
            status: StaffStatus::Active,
        }
    }

    /// Apply a morale delta: happiness moves by `delta`, loyalty by half of a
    /// gain or the full amount of a loss.
    pub fn nudge_morale(&mut self, delta: i32) {
        self.happiness = (self.happiness + delta).clamp(0, 100);
        let loyalty_delta = if delta > 0 { delta.div_euclid(2) } else { delta };
        self.loyalty = (self.loyalty + loyalty_delta).clamp(0, 100);
    }
}

/// Infrastructure engineer; improves resilience and infra spend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfraSpecialist {
    pub name: String,
    pub skill: i32,
    pub happiness: i32,
    pub loyalty: i32,
    pub role: String,
    pub salary: f64,
    pub onboarding_weeks: i32,
    pub status: StaffStatus,
}

impl Default for InfraSpecialist {
    fn default() -> Self {
        Self::new("", 50)
    }
}

impl InfraSpecialist {
    pub const DEFAULT_SALARY: f64 = 80_000.0;

    pub fn new(name: impl Into<String>, skill: i32) -> Self {
        Self {
            name: name.into(),
            skill,
            happiness: 70,
            loyalty: 50,
            role: "Infra".to_string(),
            salary: Self::DEFAULT_SALARY,
            onboarding_weeks: 0,
            status: StaffStatus::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn minimum_salary_examples() {
        assert_eq!(minimum_salary_for_skill(0), 40_000.0);
        assert_eq!(minimum_salary_for_skill(50), 100_000.0);
        assert_eq!(minimum_salary_for_skill(100), 160_000.0);
    }

    #[test]
    fn morale_gain_moves_loyalty_by_half() {
        let mut q = Quant::new("Ann", 60, 120_000.0);
        q.nudge_morale(5);
        assert_eq!(q.happiness, 75);
        assert_eq!(q.loyalty, 52);
        q.nudge_morale(-5);
        assert_eq!(q.happiness, 70);
        assert_eq!(q.loyalty, 47);
    }

    #[test]
    fn morale_is_clamped() {
        let mut q = Quant::new("Ann", 60, 120_000.0);
        q.nudge_morale(-500);
        assert_eq!((q.happiness, q.loyalty), (0, 0));
        q.nudge_morale(500);
        assert_eq!((q.happiness, q.loyalty), (100, 100));
    }

    #[test]
    fn staff_kind_parses() {
        assert_eq!("quant".parse::<StaffKind>().unwrap(), StaffKind::Quant);
        assert_eq!("infra".parse::<StaffKind>().unwrap(), StaffKind::Infra);
        assert!("intern".parse::<StaffKind>().is_err());
    }

    #[test]
    fn infra_specialist_restores_with_defaults() {
        let m: InfraSpecialist = serde_json::from_str(r#"{"name": "Ops"}"#).unwrap();
        assert_eq!(m.skill, 50);
        assert_eq!(m.salary, InfraSpecialist::DEFAULT_SALARY);
        assert_eq!(m.status, StaffStatus::Active);
    }

    proptest! {
        #[test]
        fn minimum_salary_monotonic(s1 in 0i32..=100, bump in 0i32..=100) {
            let s2 = (s1 + bump).min(100);
            prop_assert!(minimum_salary_for_skill(s2) >= minimum_salary_for_skill(s1));
        }
    }
}
