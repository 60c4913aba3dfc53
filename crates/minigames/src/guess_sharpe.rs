//! Guess the Sharpe ratio of a synthetic one-year return path.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use serde_json::Value;

use crate::{MiniGame, MiniGameError, MiniGameInput, MiniGameKind, RoundResult};

const WEEKS: usize = 52;

#[derive(Clone, Debug, Default)]
struct RoundData {
    cumulative: Vec<f64>,
    true_sharpe: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct GuessRecord {
    pub round: u32,
    pub true_sharpe: f64,
    pub guess: f64,
    pub error: f64,
    pub points: i64,
}

#[derive(Serialize)]
struct RoundPayload<'a> {
    round: u32,
    total_rounds: u32,
    score: i64,
    cumulative: &'a [f64],
}

#[derive(Serialize)]
struct SubmitPayload<'a> {
    success: bool,
    true_sharpe: f64,
    error: f64,
    points: i64,
    cumulative_score: i64,
    round_finished: u32,
    game_over: bool,
    next_round: Option<Value>,
    history: &'a [GuessRecord],
    reward: &'static str,
}

#[derive(Clone, Debug)]
pub struct GuessSharpeGame {
    total_rounds: u32,
    current_round: u32,
    score: i64,
    history: Vec<GuessRecord>,
    data: Option<RoundData>,
    finished: bool,
}

fn cumulative(returns: &[f64]) -> Vec<f64> {
    let mut acc = 1.0;
    returns
        .iter()
        .map(|r| {
            acc *= 1.0 + r;
            acc - 1.0
        })
        .collect()
}

/// Points for a guess `error` away from the true Sharpe.
pub fn score_points(error: f64) -> i64 {
    match error {
        e if e <= 0.05 => 150,
        e if e <= 0.15 => 120,
        e if e <= 0.30 => 80,
        e if e <= 0.50 => 40,
        _ => 15,
    }
}

impl GuessSharpeGame {
    pub fn new(rounds: u32) -> Self {
        Self {
            total_rounds: rounds.max(1),
            current_round: 0,
            score: 0,
            history: Vec::new(),
            data: None,
            finished: false,
        }
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn history(&self) -> &[GuessRecord] {
        &self.history
    }

    pub fn average_error(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().map(|h| h.error).sum::<f64>() / self.history.len() as f64
    }

    fn generate_round<R: Rng + ?Sized>(rng: &mut R) -> RoundData {
        let pick: f64 = rng.gen();
        let mut vol = rng.gen_range(0.10..0.22);
        let annual = (WEEKS as f64).sqrt();
        let (true_sharpe, mean_ret, flat, negative) = if pick < 0.6 {
            let s = rng.gen_range(0.35..2.5);
            (s, s * vol / annual, false, false)
        } else if pick < 0.85 {
            let s = rng.gen_range(-1.5..-0.25);
            (s, s * vol / annual, false, true)
        } else {
            vol = rng.gen_range(0.04..0.12);
            (0.0, rng.gen_range(-0.0005..0.0005), true, false)
        };

        let mut returns: Vec<f64> = match Normal::new(mean_ret, vol / annual) {
            Ok(dist) => (0..WEEKS).map(|_| dist.sample(rng)).collect(),
            Err(_) => vec![mean_ret; WEEKS],
        };
        let mut cum = cumulative(&returns);

        // nudge the path so its end agrees with the scenario
        let last = cum.last().copied().unwrap_or(0.0);
        if negative && last > 0.0 {
            let bias = ((last + 0.02) / WEEKS as f64).abs();
            returns.iter_mut().for_each(|r| *r -= bias);
            cum = cumulative(&returns);
        } else if flat {
            let bias = last / WEEKS as f64;
            returns.iter_mut().for_each(|r| *r -= bias);
            cum = cumulative(&returns);
        }

        RoundData {
            cumulative: cum,
            true_sharpe,
        }
    }

    fn round_payload(&self) -> Result<Value, MiniGameError> {
        let cumulative = self.data.as_ref().map(|d| d.cumulative.as_slice()).unwrap_or(&[]);
        Ok(serde_json::to_value(RoundPayload {
            round: self.current_round,
            total_rounds: self.total_rounds,
            score: self.score,
            cumulative,
        })?)
    }
}

impl MiniGame for GuessSharpeGame {
    fn kind(&self) -> MiniGameKind {
        MiniGameKind::GuessSharpe
    }

    fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Value, MiniGameError> {
        self.current_round = 1;
        self.score = 0;
        self.history.clear();
        self.finished = false;
        self.data = Some(Self::generate_round(rng));
        self.round_payload()
    }

    fn submit<R: Rng + ?Sized>(
        &mut self,
        input: MiniGameInput,
        rng: &mut R,
    ) -> Result<RoundResult, MiniGameError> {
        let MiniGameInput::Guess(guess) = input else {
            return Err(MiniGameError::WrongInput(self.kind()));
        };
        if !guess.is_finite() {
            return Err(MiniGameError::InvalidInput(format!("guess {guess}")));
        }
        if self.finished {
            return Err(MiniGameError::Finished);
        }
        let true_sharpe = self.data.as_ref().ok_or(MiniGameError::NotStarted)?.true_sharpe;

        let error = (guess - true_sharpe).abs();
        let points = score_points(error);
        self.score += points;
        self.history.push(GuessRecord {
            round: self.current_round,
            true_sharpe,
            guess,
            error,
            points,
        });

        let finished_round = self.current_round;
        let game_over = self.current_round >= self.total_rounds;
        let next_round = if game_over {
            self.finished = true;
            None
        } else {
            self.current_round += 1;
            self.data = Some(Self::generate_round(rng));
            Some(self.round_payload()?)
        };

        let tolerance = (true_sharpe.abs() * 0.05).max(0.05);
        let success = error <= tolerance;
        let payload = serde_json::to_value(SubmitPayload {
            success,
            true_sharpe,
            error,
            points,
            cumulative_score: self.score,
            round_finished: finished_round,
            game_over,
            next_round,
            history: &self.history,
            reward: if success {
                "Precision Bonus"
            } else {
                "Practice Makes Perfect"
            },
        })?;
        let xp_award = if game_over {
            (self.score / 20).max(25) as u32
        } else {
            0
        };
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
    fn scoring_tiers() {
        assert_eq!(score_points(0.0), 150);
        assert_eq!(score_points(0.1), 120);
        assert_eq!(score_points(0.3), 80);
        assert_eq!(score_points(0.45), 40);
        assert_eq!(score_points(3.0), 15);
    }

    #[test]
    fn path_has_one_point_per_week() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut game = GuessSharpeGame::new(5);
        let snap = game.start(&mut rng).unwrap();
        assert_eq!(snap["round"], 1);
        assert_eq!(snap["total_rounds"], 5);
        assert_eq!(snap["cumulative"].as_array().unwrap().len(), WEEKS);
    }

    #[test]
    fn five_rounds_then_over() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut game = GuessSharpeGame::new(5);
        game.start(&mut rng).unwrap();
        for round in 1..=5 {
            let res = game.submit(MiniGameInput::Guess(1.0), &mut rng).unwrap();
            assert_eq!(res.game_over, round == 5);
            if round < 5 {
                assert_eq!(res.xp_award, 0);
                assert_eq!(res.payload["next_round"]["round"], round + 1);
            } else {
                assert!(res.xp_award >= 25);
                assert!(res.payload["next_round"].is_null());
            }
        }
        assert_eq!(game.history().len(), 5);
        assert!(game.score() >= 75);
        assert!(matches!(
            game.submit(MiniGameInput::Guess(1.0), &mut rng),
            Err(MiniGameError::Finished)
        ));
    }

    #[test]
    fn submit_before_start_fails() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut game = GuessSharpeGame::new(3);
        assert!(matches!(
            game.submit(MiniGameInput::Guess(0.5), &mut rng),
            Err(MiniGameError::NotStarted)
        ));
    }
}
