//! The session's single mini-game slot.

use minigames::{ActiveMiniGame, MiniGame, MiniGameInput, MiniGameKind, RoundResult};
use serde_json::Value;
use tracing::info;

use crate::{ActionError, Session};

impl Session {
    pub fn active_minigame(&self) -> Option<MiniGameKind> {
        self.active_minigame.as_ref().map(|g| g.kind())
    }

    /// Start `kind`, replacing any game already in progress.
    pub fn start_minigame(&mut self, kind: MiniGameKind) -> Result<Value, ActionError> {
        let mut game = ActiveMiniGame::new(kind);
        let mut payload = game.start(&mut self.rng)?;
        self.active_minigame = Some(game);
        if kind == MiniGameKind::GuessSharpe {
            if let Value::Object(map) = &mut payload {
                map.insert("leaderboard".into(), self.leaderboard_json()?);
            }
        }
        info!(?kind, "mini-game started");
        Ok(payload)
    }

    /// Score one answer. When the game reports completion its XP is awarded
    /// and the slot is cleared.
    pub fn submit_minigame(&mut self, input: MiniGameInput) -> Result<RoundResult, ActionError> {
        let game = self.active_minigame.as_mut().ok_or(ActionError::NoActiveMiniGame)?;
        let mut result = game.submit(input, &mut self.rng)?;
        if !result.game_over {
            return Ok(result);
        }

        let kind = game.kind();
        let guess_sharpe = match game {
            ActiveMiniGame::GuessSharpe(g) => Some((g.score(), g.average_error())),
            _ => None,
        };
        self.active_minigame = None;

        if result.xp_award > 0 {
            let levels = self.player.gain_xp(u64::from(result.xp_award));
            info!(?kind, xp = result.xp_award, levels, "mini-game finished");
        }
        match guess_sharpe {
            Some((score, avg_error)) => {
                self.player
                    .record_guess_sharpe_score(score, avg_error, self.week, self.year);
                self.log(format!(
                    "Guess the Sharpe complete: {score} pts (avg error {avg_error:.2}). +{} XP.",
                    result.xp_award
                ));
                if let Value::Object(map) = &mut result.payload {
                    map.insert("leaderboard".into(), self.leaderboard_json()?);
                }
            }
            None => self.log(format!("{kind:?} complete. +{} XP.", result.xp_award)),
        }
        Ok(result)
    }

    fn leaderboard_json(&self) -> Result<Value, ActionError> {
        serde_json::to_value(&self.player.minigame_stats.guess_sharpe_leaderboard)
            .map_err(|e| ActionError::MiniGame(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fund_core::GameConfig;

    #[test]
    fn submit_without_game_fails() {
        let mut s = Session::new(GameConfig::default());
        assert!(matches!(
            s.submit_minigame(MiniGameInput::Guess(1.0)),
            Err(ActionError::NoActiveMiniGame)
        ));
    }

    #[test]
    fn guess_sharpe_records_leaderboard_and_clears_slot() {
        let mut s = Session::new(GameConfig::default());
        let start = s.start_minigame(MiniGameKind::GuessSharpe).unwrap();
        assert!(start["leaderboard"].as_array().unwrap().is_empty());
        assert_eq!(s.active_minigame(), Some(MiniGameKind::GuessSharpe));

        let mut last = None;
        for _ in 0..5 {
            last = Some(s.submit_minigame(MiniGameInput::Guess(0.8)).unwrap());
        }
        let last = last.unwrap();
        assert!(last.game_over);
        assert!(last.xp_award >= 25);
        assert_eq!(s.player.xp, u64::from(last.xp_award));
        assert_eq!(s.active_minigame(), None);
        let board = &s.player.minigame_stats.guess_sharpe_leaderboard;
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].week, 1);
        assert_eq!(last.payload["leaderboard"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn wrong_input_keeps_game_running() {
        let mut s = Session::new(GameConfig::default());
        s.start_minigame(MiniGameKind::MarketMaking).unwrap();
        assert!(matches!(
            s.submit_minigame(MiniGameInput::Choice(1)),
            Err(ActionError::MiniGame(_))
        ));
        assert_eq!(s.active_minigame(), Some(MiniGameKind::MarketMaking));
    }

    #[test]
    fn starting_replaces_current_game() {
        let mut s = Session::new(GameConfig::default());
        s.start_minigame(MiniGameKind::MarketMaking).unwrap();
        s.start_minigame(MiniGameKind::MarketTrivia).unwrap();
        assert_eq!(s.active_minigame(), Some(MiniGameKind::MarketTrivia));
        for _ in 0..3 {
            s.submit_minigame(MiniGameInput::Choice(0)).unwrap();
        }
        assert_eq!(s.active_minigame(), None);
    }
}
