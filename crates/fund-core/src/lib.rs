#![deny(warnings)]

//! Core domain models and invariants for the fund desk simulation.
//!
//! This crate defines the serializable types shared by the market model, the
//! weekly engine and persistence, together with validation helpers that
//! guarantee the basic invariants of a game state.

pub mod alpha;
pub mod config;
pub mod environment;
pub mod event;
pub mod infra;
pub mod player;
pub mod portfolio;
pub mod snapshot;
pub mod staff;
pub mod validate;

pub use alpha::{AlphaBuckets, AlphaId, AlphaStatus, AlphaStrategy};
pub use config::GameConfig;
pub use environment::{Environment, Regime};
pub use event::{Event, EventChoice, EventEffect, InfraResponse, ResetDecision};
pub use infra::{InfraKind, Infrastructure, RiskModel, RiskResearch};
pub use player::{clamp_score, GuessSharpeEntry, MinigameStats, Player};
pub use portfolio::{normalize_weights, Portfolio, Position};
pub use snapshot::{GameSnapshot, SNAPSHOT_SCHEMA_VERSION};
pub use staff::{minimum_salary_for_skill, InfraSpecialist, Quant, StaffKind, StaffStatus};
pub use validate::{validate_alphas, validate_player, validate_snapshot, ValidationError};

/// Weeks in one simulated year.
pub const WEEKS_PER_YEAR: u32 = 52;
