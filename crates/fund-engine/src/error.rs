use minigames::MiniGameError;
use thiserror::Error;

/// Rejection of a player action. A failed action leaves the session untouched.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    InvalidOffer(String),
    #[error("not enough cash for {what}: need ${needed:.0}, have ${available:.0}")]
    InsufficientFunds {
        what: &'static str,
        needed: f64,
        available: f64,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("no active mini-game")]
    NoActiveMiniGame,
    #[error(transparent)]
    MiniGame(#[from] MiniGameError),
}
