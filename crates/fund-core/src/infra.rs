//! Infrastructure levels, risk model and risk-model research projects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validate::ValidationError;

/// One of the five independently upgradable infrastructure tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfraKind {
    #[serde(rename = "compute_level")]
    Compute,
    #[serde(rename = "data_quality")]
    DataQuality,
    #[serde(rename = "devops_tooling")]
    DevopsTooling,
    #[serde(rename = "risk_tools_level")]
    RiskTools,
    #[serde(rename = "optimization_tool_level")]
    OptimizationTools,
}

impl InfraKind {
    pub const ALL: [InfraKind; 5] = [
        InfraKind::Compute,
        InfraKind::DataQuality,
        InfraKind::DevopsTooling,
        InfraKind::RiskTools,
        InfraKind::OptimizationTools,
    ];

    /// Tracks the quant desk asks for in budget requests.
    pub const REQUESTABLE: [InfraKind; 4] = [
        InfraKind::Compute,
        InfraKind::DataQuality,
        InfraKind::DevopsTooling,
        InfraKind::RiskTools,
    ];

    pub fn key(self) -> &'static str {
        match self {
            InfraKind::Compute => "compute_level",
            InfraKind::DataQuality => "data_quality",
            InfraKind::DevopsTooling => "devops_tooling",
            InfraKind::RiskTools => "risk_tools_level",
            InfraKind::OptimizationTools => "optimization_tool_level",
        }
    }
}

impl fmt::Display for InfraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key().replace('_', " "))
    }
}

impl FromStr for InfraKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InfraKind::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| ValidationError::UnknownInfra(s.to_string()))
    }
}

/// Infrastructure levels, each starting at 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Infrastructure {
    pub compute_level: i32,
    pub data_quality: i32,
    pub devops_tooling: i32,
    pub risk_tools_level: i32,
    pub optimization_tool_level: i32,
}

impl Default for Infrastructure {
    fn default() -> Self {
        Self {
            compute_level: 1,
            data_quality: 1,
            devops_tooling: 1,
            risk_tools_level: 1,
            optimization_tool_level: 1,
        }
    }
}

impl Infrastructure {
    pub fn level(&self, kind: InfraKind) -> i32 {
        match kind {
            InfraKind::Compute => self.compute_level,
            InfraKind::DataQuality => self.data_quality,
            InfraKind::DevopsTooling => self.devops_tooling,
            InfraKind::RiskTools => self.risk_tools_level,
            InfraKind::OptimizationTools => self.optimization_tool_level,
        }
    }

    pub fn level_mut(&mut self, kind: InfraKind) -> &mut i32 {
        match kind {
            InfraKind::Compute => &mut self.compute_level,
            InfraKind::DataQuality => &mut self.data_quality,
            InfraKind::DevopsTooling => &mut self.devops_tooling,
            InfraKind::RiskTools => &mut self.risk_tools_level,
            InfraKind::OptimizationTools => &mut self.optimization_tool_level,
        }
    }

    pub fn total_levels(&self) -> i32 {
        InfraKind::ALL.iter().map(|k| self.level(*k)).sum()
    }
}

/// Risk model sophistication. Neutrality flags shield P&L from market beta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskModel {
    pub level: u32,
    pub market_neutral: bool,
    pub factor_neutral: bool,
}

impl Default for RiskModel {
    fn default() -> Self {
        Self {
            level: 1,
            market_neutral: false,
            factor_neutral: false,
        }
    }
}

/// A risk-model upgrade project in flight.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskResearch {
    pub name: String,
    /// Effective duration in weeks.
    pub duration: u32,
    pub base_duration: u32,
    pub weeks_remaining: i32,
}

impl RiskResearch {
    pub fn new(name: impl Into<String>, duration: u32) -> Self {
        Self {
            name: name.into(),
            duration,
            base_duration: duration,
            weeks_remaining: duration as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_use_field_names_on_the_wire() {
        for kind in InfraKind::ALL {
            let s = serde_json::to_string(&kind).unwrap();
            assert_eq!(s, format!("\"{}\"", kind.key()));
            assert_eq!(kind.key().parse::<InfraKind>().unwrap(), kind);
        }
        assert!("quantum_level".parse::<InfraKind>().is_err());
    }

    #[test]
    fn levels_are_independent() {
        let mut infra = Infrastructure::default();
        *infra.level_mut(InfraKind::DevopsTooling) += 2;
        assert_eq!(infra.level(InfraKind::DevopsTooling), 3);
        assert_eq!(infra.level(InfraKind::Compute), 1);
        assert_eq!(infra.total_levels(), 7);
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(InfraKind::RiskTools.to_string(), "risk tools level");
    }
}
