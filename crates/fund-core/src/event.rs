//! Narrative events and the typed effects behind their choices.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::infra::InfraKind;
use crate::validate::ValidationError;

/// Player decision on the rival fund's reset offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetDecision {
    Accept,
    Decline,
}

impl FromStr for ResetDecision {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(ResetDecision::Accept),
            "decline" => Ok(ResetDecision::Decline),
            other => Err(ValidationError::UnknownChoice(other.to_string())),
        }
    }
}

/// Player answer to an infrastructure budget request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfraResponse {
    Approve,
    Delay,
    Reject,
}

/// What picking a choice does. Closed set, dispatched exhaustively by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEffect {
    Restart,
    Continue,
    ApproveInfra { infra: InfraKind },
    DelayInfra { infra: InfraKind },
    RejectInfra { infra: InfraKind },
    ResetOffer { decision: ResetDecision },
}

impl EventEffect {
    /// Build the effect for a response to an infra request.
    pub fn infra(response: InfraResponse, infra: InfraKind) -> Self {
        match response {
            InfraResponse::Approve => EventEffect::ApproveInfra { infra },
            InfraResponse::Delay => EventEffect::DelayInfra { infra },
            InfraResponse::Reject => EventEffect::RejectInfra { infra },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventChoice {
    pub text: String,
    pub effect: EventEffect,
}

impl EventChoice {
    pub fn new(text: impl Into<String>, effect: EventEffect) -> Self {
        Self {
            text: text.into(),
            effect,
        }
    }
}

/// A queued narrative event. Only the head of the queue is actionable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub title: String,
    pub description: String,
    pub choices: Vec<EventChoice>,
}

impl Event {
    /// An informational event with no decision attached.
    pub fn notice(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choices(
        title: impl Into<String>,
        description: impl Into<String>,
        choices: Vec<EventChoice>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            choices,
        }
    }

    pub fn is_decision(&self) -> bool {
        !self.choices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_are_tagged() {
        let e = EventEffect::ApproveInfra {
            infra: InfraKind::DataQuality,
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["type"], "approve_infra");
        assert_eq!(v["infra"], "data_quality");

        let r: EventEffect =
            serde_json::from_str(r#"{"type": "reset_offer", "decision": "decline"}"#).unwrap();
        assert_eq!(
            r,
            EventEffect::ResetOffer {
                decision: ResetDecision::Decline
            }
        );
        let restart = serde_json::to_value(&EventEffect::Restart).unwrap();
        assert_eq!(restart["type"], "restart");
    }

    #[test]
    fn notice_has_no_choices() {
        let e = Event::notice("Market News", "Something happened in the market.");
        assert!(!e.is_decision());
    }

    #[test]
    fn infra_effect_builder() {
        assert_eq!(
            EventEffect::infra(InfraResponse::Reject, InfraKind::Compute),
            EventEffect::RejectInfra {
                infra: InfraKind::Compute
            }
        );
        assert!("maybe".parse::<ResetDecision>().is_err());
    }
}
