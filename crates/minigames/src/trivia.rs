//! Multiple-choice market trivia drawn from a built-in question bank.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::{MiniGame, MiniGameError, MiniGameInput, MiniGameKind, RoundResult};

/// One bank entry; `answer` indexes into `options`.
#[derive(Clone, Debug, Serialize)]
pub struct TriviaQuestion {
    pub prompt: &'static str,
    pub options: [&'static str; 4],
    pub answer: usize,
}

const fn q(prompt: &'static str, options: [&'static str; 4], answer: usize) -> TriviaQuestion {
    TriviaQuestion {
        prompt,
        options,
        answer,
    }
}

/// The built-in question bank.
pub fn question_bank() -> Vec<TriviaQuestion> {
    vec![
        q(
            "What is the annualization factor for a Sharpe measured on daily returns (252 trading days)?",
            ["sqrt(252)", "252", "12", "sqrt(12)"],
            0,
        ),
        q(
            "What does CVaR (Conditional VaR) measure?",
            [
                "Expected loss in the tail beyond VaR",
                "Average daily loss",
                "Sharpe ratio threshold",
                "Expected return plus variance",
            ],
            0,
        ),
        q(
            "Kelly sizing is used to:",
            [
                "Lock leverage at max margin",
                "Optimize bet size given edge and odds",
                "Equal weight all assets",
                "Minimize volatility at any return",
            ],
            1,
        ),
        q(
            "Which signal is most associated with carry trades?",
            ["Price momentum", "Earnings growth", "Yield or funding differential", "Seasonality"],
            2,
        ),
        q(
            "A market-neutral book primarily aims to have:",
            ["Zero gross exposure", "Near-zero beta to the index", "Only long positions", "Maximum leverage"],
            1,
        ),
        q(
            "Alpha decay refers to:",
            [
                "A signal's edge fading as it gets crowded or the regime shifts",
                "Options losing time value",
                "Bond prices falling as rates rise",
                "Slippage on large orders",
            ],
            0,
        ),
        q(
            "Maximum drawdown is measured as:",
            [
                "Worst single-day loss",
                "Average loss over a year",
                "Largest peak-to-trough decline",
                "Standard deviation of returns",
            ],
            2,
        ),
        q(
            "Which ratio penalizes only downside volatility?",
            ["Sharpe", "Treynor", "Information", "Sortino"],
            3,
        ),
        q(
            "Mean-reversion strategies tend to struggle most in:",
            ["Strongly trending markets", "Range-bound markets", "Low-volatility markets", "Quiet holiday sessions"],
            0,
        ),
        q(
            "The information ratio divides active return by:",
            ["Total volatility", "Tracking error", "Beta", "Maximum drawdown"],
            1,
        ),
        q(
            "Overfitting a backtest typically shows up as:",
            [
                "Lower in-sample Sharpe",
                "Fewer parameters",
                "Strong in-sample results that fail out of sample",
                "Higher turnover costs only",
            ],
            2,
        ),
        q(
            "A bid-ask spread compensates a market maker mainly for:",
            ["Exchange fees only", "Regulatory capital", "Dividend risk", "Inventory and adverse selection risk"],
            3,
        ),
    ]
}

#[derive(Serialize)]
struct QuestionPayload {
    index: usize,
    total: usize,
    prompt: &'static str,
    options: [&'static str; 4],
    score: u32,
}

#[derive(Clone, Debug)]
pub struct MarketTriviaGame {
    question_count: usize,
    current_index: usize,
    score: u32,
    questions: Vec<TriviaQuestion>,
}

/// XP and reward text for a final trivia score.
pub fn xp_for_score(score: u32) -> (u32, &'static str) {
    if score >= 80 {
        (50, "XP +50 and Research Insight")
    } else if score >= 20 {
        (30, "XP +30")
    } else {
        (0, "No XP this run. Get 1+ correct to start scoring.")
    }
}

impl MarketTriviaGame {
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            current_index: 0,
            score: 0,
            questions: Vec::new(),
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    fn current_payload(&self) -> Result<Option<Value>, MiniGameError> {
        let Some(q) = self.questions.get(self.current_index) else {
            return Ok(None);
        };
        Ok(Some(serde_json::to_value(QuestionPayload {
            index: self.current_index + 1,
            total: self.questions.len(),
            prompt: q.prompt,
            options: q.options,
            score: self.score,
        })?))
    }
}

impl MiniGame for MarketTriviaGame {
    fn kind(&self) -> MiniGameKind {
        MiniGameKind::MarketTrivia
    }

    fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Value, MiniGameError> {
        let mut bank = question_bank();
        bank.shuffle(rng);
        bank.truncate(self.question_count);
        self.questions = bank;
        self.current_index = 0;
        self.score = 0;
        Ok(self.current_payload()?.unwrap_or(Value::Null))
    }

    fn submit<R: Rng + ?Sized>(
        &mut self,
        input: MiniGameInput,
        _rng: &mut R,
    ) -> Result<RoundResult, MiniGameError> {
        let MiniGameInput::Choice(choice) = input else {
            return Err(MiniGameError::WrongInput(self.kind()));
        };
        let Some(question) = self.questions.get(self.current_index) else {
            return Err(if self.questions.is_empty() {
                MiniGameError::NotStarted
            } else {
                MiniGameError::Finished
            });
        };

        let answer_index = question.answer;
        let correct = choice == answer_index;
        if correct {
            self.score += 20;
        }
        self.current_index += 1;

        let next_question = self.current_payload()?;
        let game_over = next_question.is_none();
        let (xp_award, reward) = if game_over {
            let (xp, text) = xp_for_score(self.score);
            (xp, Some(text))
        } else {
            (0, None)
        };
        let payload = serde_json::json!({
            "correct": correct,
            "answer_index": answer_index,
            "score": self.score,
            "next_question": next_question,
            "game_over": game_over,
            "reward": reward,
        });
        Ok(RoundResult {
            game_over,
            xp_award,
            payload,
        })
    }
}
