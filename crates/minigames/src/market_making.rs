//! Quote a two-sided market around a drifting mid and manage inventory.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use serde_json::Value;

use crate::{MiniGame, MiniGameError, MiniGameInput, MiniGameKind, RoundResult};

#[derive(Clone, Debug, Serialize)]
pub struct LastAction {
    pub bid: f64,
    pub ask: f64,
    pub buy_filled: bool,
    pub sell_filled: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct BookState {
    pub round: u32,
    pub max_rounds: u32,
    pub mid_price: f64,
    pub inventory: i64,
    pub cash: f64,
    pub pnl: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_action: Option<LastAction>,
}

#[derive(Serialize)]
struct StatePayload<'a> {
    #[serde(flatten)]
    state: &'a BookState,
    history: &'a [BookState],
}

#[derive(Clone, Debug)]
pub struct MarketMakingGame {
    rounds: u32,
    current_round: u32,
    mid_price: f64,
    inventory: i64,
    cash: f64,
    volatility: f64,
    history: Vec<BookState>,
    started: bool,
}

impl Default for MarketMakingGame {
    fn default() -> Self {
        Self::new()
    }
}

/// Chance one side of the quote is hit at `half_spread`.
pub fn fill_probability(half_spread: f64) -> f64 {
    (-0.5 * half_spread).exp()
}

/// XP for finishing with `pnl`.
pub fn xp_for_pnl(pnl: f64) -> (u32, String) {
    if pnl >= 10.0 {
        let xp = ((pnl / 2.0) as u32).max(25);
        (xp, format!("XP +{xp} for solid PnL"))
    } else if pnl >= 0.0 {
        (15, "XP +15 for breakeven grind".to_string())
    } else {
        (5, "XP +5 for lessons learned".to_string())
    }
}

impl MarketMakingGame {
    pub fn new() -> Self {
        Self {
            rounds: 10,
            current_round: 0,
            mid_price: 100.0,
            inventory: 0,
            cash: 0.0,
            volatility: 1.0,
            history: Vec::new(),
            started: false,
        }
    }

    fn book_state(&self) -> BookState {
        BookState {
            round: self.current_round,
            max_rounds: self.rounds,
            mid_price: self.mid_price,
            inventory: self.inventory,
            cash: self.cash,
            pnl: self.cash + self.inventory as f64 * self.mid_price,
            last_action: None,
        }
    }

    fn payload(&self, state: &BookState) -> Result<Value, MiniGameError> {
        Ok(serde_json::to_value(StatePayload {
            state,
            history: &self.history,
        })?)
    }
}

impl MiniGame for MarketMakingGame {
    fn kind(&self) -> MiniGameKind {
        MiniGameKind::MarketMaking
    }

    fn start<R: Rng + ?Sized>(&mut self, _rng: &mut R) -> Result<Value, MiniGameError> {
        self.current_round = 1;
        self.mid_price = 100.0;
        self.inventory = 0;
        self.cash = 0.0;
        self.started = true;
        self.history = vec![BookState {
            round: 0,
            ..self.book_state()
        }];
        let state = self.book_state();
        self.payload(&state)
    }

    fn submit<R: Rng + ?Sized>(
        &mut self,
        input: MiniGameInput,
        rng: &mut R,
    ) -> Result<RoundResult, MiniGameError> {
        let MiniGameInput::Spread(half_spread) = input else {
            return Err(MiniGameError::WrongInput(self.kind()));
        };
        if !half_spread.is_finite() || half_spread < 0.0 {
            return Err(MiniGameError::InvalidInput(format!("half spread {half_spread}")));
        }
        if !self.started {
            return Err(MiniGameError::NotStarted);
        }
        if self.current_round > self.rounds {
            return Err(MiniGameError::Finished);
        }

        let bid = self.mid_price - half_spread;
        let ask = self.mid_price + half_spread;
        let step = Normal::new(0.0, self.volatility)
            .map(|d| d.sample(rng))
            .unwrap_or(0.0);
        let fill_prob = fill_probability(half_spread);

        let buy_filled = rng.gen::<f64>() < fill_prob;
        if buy_filled {
            self.inventory += 1;
            self.cash -= bid;
        }
        let sell_filled = rng.gen::<f64>() < fill_prob;
        if sell_filled {
            self.inventory -= 1;
            self.cash += ask;
        }

        self.mid_price += step;
        self.current_round += 1;

        let mut state = self.book_state();
        state.last_action = Some(LastAction {
            bid,
            ask,
            buy_filled,
            sell_filled,
        });
        self.history.push(state.clone());

        let game_over = self.current_round > self.rounds;
        let (xp_award, reward) = if game_over {
            xp_for_pnl(state.pnl)
        } else {
            (0, "None".to_string())
        };
        let payload = serde_json::json!({
            "game_over": game_over,
            "state": self.payload(&state)?,
            "reward": reward,
            "xp_gain": xp_award,
        });
        Ok(RoundResult {
            game_over,
            xp_award,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn fill_probability_decays_with_spread() {
        assert_eq!(fill_probability(0.0), 1.0);
        assert!(fill_probability(1.0) > fill_probability(2.0));
    }

    #[test]
    fn xp_tiers() {
        assert_eq!(xp_for_pnl(100.0).0, 50);
        assert_eq!(xp_for_pnl(12.0).0, 25);
        assert_eq!(xp_for_pnl(3.0).0, 15);
        assert_eq!(xp_for_pnl(-3.0).0, 5);
    }

    #[test]
    fn zero_spread_always_fills_both_sides() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut game = MarketMakingGame::new();
        game.start(&mut rng).unwrap();
        let res = game.submit(MiniGameInput::Spread(0.0), &mut rng).unwrap();
        let action = &res.payload["state"]["last_action"];
        assert_eq!(action["buy_filled"], true);
        assert_eq!(action["sell_filled"], true);
        assert_eq!(res.payload["state"]["inventory"], 0);
    }

    #[test]
    fn ten_rounds_then_over() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut game = MarketMakingGame::new();
        let snap = game.start(&mut rng).unwrap();
        assert_eq!(snap["round"], 1);
        assert_eq!(snap["history"].as_array().unwrap().len(), 1);
        for i in 1..=10 {
            let res = game.submit(MiniGameInput::Spread(0.5), &mut rng).unwrap();
            assert_eq!(res.game_over, i == 10);
            if i == 10 {
                assert!(res.xp_award >= 5);
            }
        }
        assert!(matches!(
            game.submit(MiniGameInput::Spread(0.5), &mut rng),
            Err(MiniGameError::Finished)
        ));
    }

    #[test]
    fn negative_spread_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut game = MarketMakingGame::new();
        game.start(&mut rng).unwrap();
        assert!(matches!(
            game.submit(MiniGameInput::Spread(-1.0), &mut rng),
            Err(MiniGameError::InvalidInput(_))
        ));
    }
}
