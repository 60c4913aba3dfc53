#![deny(warnings)]

//! Self-contained training mini-games.
//!
//! Each game implements [`MiniGame`]: `start` produces a snapshot for the
//! player, `submit` scores one answer and, once the game is over, reports the
//! XP to award. The engine selects a game through [`MiniGameKind`] and holds
//! it as an [`ActiveMiniGame`], so dispatch is a plain `match`.

pub mod guess_sharpe;
pub mod market_making;
pub mod trivia;

pub use guess_sharpe::GuessSharpeGame;
pub use market_making::MarketMakingGame;
pub use trivia::MarketTriviaGame;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiniGameKind {
    GuessSharpe,
    MarketMaking,
    MarketTrivia,
}

/// A player answer. Each game accepts exactly one variant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiniGameInput {
    /// Guessed annualized Sharpe ratio.
    Guess(f64),
    /// Quoted half-spread around the mid.
    Spread(f64),
    /// Index of the chosen answer.
    Choice(usize),
}

/// Result of one submission.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundResult {
    pub game_over: bool,
    /// XP earned; non-zero only when `game_over` is set.
    pub xp_award: u32,
    pub payload: Value,
}

#[derive(Debug, Error)]
pub enum MiniGameError {
    #[error("{0:?} does not accept this input")]
    WrongInput(MiniGameKind),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("game has not been started")]
    NotStarted,
    #[error("game is already over")]
    Finished,
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Capability shared by all mini-games.
pub trait MiniGame {
    fn kind(&self) -> MiniGameKind;

    /// Reset and produce the first snapshot.
    fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Value, MiniGameError>;

    /// Score one answer.
    fn submit<R: Rng + ?Sized>(
        &mut self,
        input: MiniGameInput,
        rng: &mut R,
    ) -> Result<RoundResult, MiniGameError>;
}

/// The single in-flight mini-game of a session.
#[derive(Clone, Debug)]
pub enum ActiveMiniGame {
    GuessSharpe(GuessSharpeGame),
    MarketMaking(MarketMakingGame),
    MarketTrivia(MarketTriviaGame),
}

impl ActiveMiniGame {
    pub fn new(kind: MiniGameKind) -> Self {
        match kind {
            MiniGameKind::GuessSharpe => ActiveMiniGame::GuessSharpe(GuessSharpeGame::new(5)),
            MiniGameKind::MarketMaking => ActiveMiniGame::MarketMaking(MarketMakingGame::new()),
            MiniGameKind::MarketTrivia => ActiveMiniGame::MarketTrivia(MarketTriviaGame::new(3)),
        }
    }
}

impl MiniGame for ActiveMiniGame {
    fn kind(&self) -> MiniGameKind {
        match self {
            ActiveMiniGame::GuessSharpe(g) => g.kind(),
            ActiveMiniGame::MarketMaking(g) => g.kind(),
            ActiveMiniGame::MarketTrivia(g) => g.kind(),
        }
    }

    fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Value, MiniGameError> {
        match self {
            ActiveMiniGame::GuessSharpe(g) => g.start(rng),
            ActiveMiniGame::MarketMaking(g) => g.start(rng),
            ActiveMiniGame::MarketTrivia(g) => g.start(rng),
        }
    }

    fn submit<R: Rng + ?Sized>(
        &mut self,
        input: MiniGameInput,
        rng: &mut R,
    ) -> Result<RoundResult, MiniGameError> {
        let result = match self {
            ActiveMiniGame::GuessSharpe(g) => g.submit(input, rng),
            ActiveMiniGame::MarketMaking(g) => g.submit(input, rng),
            ActiveMiniGame::MarketTrivia(g) => g.submit(input, rng),
        };
        if let Ok(r) = &result {
            debug!(kind = ?self.kind(), game_over = r.game_over, xp = r.xp_award, "mini-game round scored");
        }
        result
    }
}
