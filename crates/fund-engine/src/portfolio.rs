//! Portfolio updates, weekly P&L and infrastructure spend.

use fund_core::{normalize_weights, AlphaStatus, InfraKind, Position};
use tracing::info;

use crate::{money, ActionError, Session};

/// Cash cost of one infrastructure level.
pub const INFRA_UPGRADE_COST: f64 = 50_000.0;

/// Weekly P&L values feeding the rolling Sharpe.
pub const SHARPE_WINDOW: usize = 26;

impl Session {
    /// Replace the book. Overweight books are scaled down to a total of 1.0;
    /// stored alphas referenced by a position go live.
    pub fn update_portfolio(&mut self, mut positions: Vec<Position>) -> Result<(), ActionError> {
        for p in &positions {
            if !p.weight.is_finite() || p.weight < 0.0 {
                return Err(ActionError::InvalidInput(format!(
                    "Invalid weight {} for {}.",
                    p.weight, p.alpha_id
                )));
            }
            if self.alphas.get(&p.alpha_id).is_none() {
                return Err(ActionError::NotFound(format!("Unknown alpha {}.", p.alpha_id)));
            }
        }
        normalize_weights(&mut positions);

        let mut promoted = Vec::new();
        for p in &positions {
            if self
                .alphas
                .transfer(&p.alpha_id, AlphaStatus::StoredForEnsemble, AlphaStatus::Live)
            {
                promoted.push(p.alpha_id.clone());
            }
        }
        self.portfolio.positions = positions;

        info!(
            positions = self.portfolio.positions.len(),
            invested = self.portfolio.total_weight(),
            promoted = promoted.len(),
            "portfolio updated"
        );
        for id in promoted {
            let name = self.alphas.get(&id).map(|a| a.name.clone()).unwrap_or_default();
            self.log(format!("{name} deployed live."));
        }
        Ok(())
    }

    pub fn is_market_neutral_enabled(&self) -> bool {
        self.risk_model.market_neutral || self.infrastructure.risk_tools_level >= 2
    }

    pub fn is_factor_neutral_enabled(&self) -> bool {
        self.risk_model.factor_neutral || self.infrastructure.risk_tools_level >= 3
    }

    /// True when market beta is hedged out of P&L.
    pub fn is_market_shielded(&self) -> bool {
        self.is_market_neutral_enabled() || self.is_factor_neutral_enabled()
    }

    /// Book-wide P&L for one week given the index return. Pure sampling;
    /// the caller books the result.
    pub(crate) fn weekly_pnl(&mut self, market_return: f64) -> f64 {
        let regime = self.environment.regime;
        let beta_exposure = if self.is_market_shielded() { 0.0 } else { 1.0 };
        let aum = self.player.aum;
        let mut total = 0.0;
        for position in &self.portfolio.positions {
            let Some(alpha) = self.alphas.get(&position.alpha_id) else {
                continue;
            };
            let ret = fund_market::alpha_return(alpha, regime, &mut self.rng)
                + market_return * alpha.beta * beta_exposure;
            total += aum * position.weight * ret;
        }
        total
    }

    /// Credit a week's P&L to cash and AUM and refresh the risk stats.
    pub(crate) fn book_pnl(&mut self, pnl: f64) {
        let p = &mut self.player;
        p.cash += pnl;
        p.aum += pnl;
        p.pnl_history.push(pnl);
        p.yearly_pnl += pnl;
        p.update_drawdowns();
        let start = p.pnl_history.len().saturating_sub(SHARPE_WINDOW);
        p.rolling_sharpe = fund_market::annualized_sharpe(&p.pnl_history[start..]);
    }

    /// Aggregate infra quality, 0..=100.
    pub fn resilience_score(&self) -> i32 {
        let mut base = 30.0 + 6.0 * f64::from(self.infrastructure.total_levels());
        if let (Some(skill), Some(happy)) = (self.avg_infra_skill(), self.avg_infra_happiness()) {
            base += 0.1 * skill;
            base += (0.1 * (happy - 50.0)).max(0.0);
        }
        (base as i32).clamp(0, 100)
    }

    /// Buy one level of `kind`. An infra team claws back part of the spend.
    /// Returns the refund.
    pub fn upgrade_infra(&mut self, kind: InfraKind) -> Result<f64, ActionError> {
        if self.player.cash < INFRA_UPGRADE_COST {
            return Err(ActionError::InsufficientFunds {
                what: "infrastructure upgrade",
                needed: INFRA_UPGRADE_COST,
                available: self.player.cash,
            });
        }
        self.player.cash -= INFRA_UPGRADE_COST;
        *self.infrastructure.level_mut(kind) += 1;
        let level = self.infrastructure.level(kind);
        info!(%kind, level, "infrastructure upgraded");
        self.log(format!("Upgraded {kind} to level {level}."));

        let Some(avg_skill) = self.avg_infra_skill() else {
            return Ok(0.0);
        };
        let refund = (INFRA_UPGRADE_COST * (avg_skill / 500.0).min(0.2)).trunc();
        self.player.cash += refund;
        for m in &mut self.infra_team {
            m.happiness = (m.happiness + 2).min(100);
        }
        self.log(format!(
            "Infrastructure squad optimized the spend. Saved ${}.",
            money(refund)
        ));
        Ok(refund)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fund_core::{AlphaId, AlphaStrategy, GameConfig, InfraSpecialist};

    fn session_with_stored(n: u64) -> Session {
        let mut s = Session::new(GameConfig::default());
        for _ in 0..n {
            let id = s.next_alpha_id();
            let mut a = AlphaStrategy::new(id, "Alpha", "Value", 1);
            a.status = AlphaStatus::StoredForEnsemble;
            a.current_expected_return = 0.1;
            a.volatility = 0.1;
            s.alphas.stored_for_ensemble.push(a);
        }
        s
    }

    #[test]
    fn deploy_promotes_stored_alpha_once() {
        let mut s = session_with_stored(2);
        let id = AlphaId::from_seq(1);
        s.update_portfolio(vec![Position::new(id.clone(), 0.5)]).unwrap();
        assert_eq!(s.alphas.live.len(), 1);
        assert_eq!(s.alphas.stored_for_ensemble.len(), 1);
        assert_eq!(s.alphas.live[0].status, AlphaStatus::Live);

        s.update_portfolio(vec![Position::new(id.clone(), 0.3), Position::new(id, 0.3)])
            .unwrap();
        assert_eq!(s.alphas.live.len(), 1);
        assert_eq!(s.alphas.len(), 2);
    }

    #[test]
    fn overweight_book_is_normalized() {
        let mut s = session_with_stored(2);
        s.update_portfolio(vec![
            Position::new(AlphaId::from_seq(1), 1.5),
            Position::new(AlphaId::from_seq(2), 0.5),
        ])
        .unwrap();
        let w: Vec<f64> = s.portfolio.positions.iter().map(|p| p.weight).collect();
        assert!((w[0] - 0.75).abs() < 1e-12);
        assert!((w[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn bad_positions_are_rejected_without_change() {
        let mut s = session_with_stored(1);
        let id = AlphaId::from_seq(1);
        assert!(matches!(
            s.update_portfolio(vec![Position::new(id.clone(), -0.1)]),
            Err(ActionError::InvalidInput(_))
        ));
        assert!(matches!(
            s.update_portfolio(vec![Position::new(id, f64::NAN)]),
            Err(ActionError::InvalidInput(_))
        ));
        assert!(matches!(
            s.update_portfolio(vec![Position::new(AlphaId::from_seq(9), 0.1)]),
            Err(ActionError::NotFound(_))
        ));
        assert!(s.portfolio.positions.is_empty());
        assert_eq!(s.alphas.stored_for_ensemble.len(), 1);
    }

    #[test]
    fn shielding_follows_risk_tools() {
        let mut s = Session::new(GameConfig::default());
        assert!(!s.is_market_shielded());
        s.infrastructure.risk_tools_level = 2;
        assert!(s.is_market_neutral_enabled());
        assert!(!s.is_factor_neutral_enabled());
        s.infrastructure.risk_tools_level = 1;
        s.risk_model.factor_neutral = true;
        assert!(s.is_market_shielded());
    }

    #[test]
    fn zero_vol_pnl_is_deterministic() {
        let mut s = session_with_stored(1);
        s.alphas.stored_for_ensemble[0].volatility = 0.0;
        s.alphas.stored_for_ensemble[0].current_expected_return = 0.052;
        s.alphas.stored_for_ensemble[0].beta = 0.0;
        s.update_portfolio(vec![Position::new(AlphaId::from_seq(1), 0.5)]).unwrap();
        // 50M * 0.5 * 0.001
        assert!((s.weekly_pnl(0.5) - 25_000.0).abs() < 1e-6);
    }

    #[test]
    fn market_beta_is_hedged_when_shielded() {
        let mut s = session_with_stored(1);
        s.alphas.stored_for_ensemble[0].volatility = 0.0;
        s.alphas.stored_for_ensemble[0].current_expected_return = 0.0;
        s.update_portfolio(vec![Position::new(AlphaId::from_seq(1), 1.0)]).unwrap();
        assert!((s.weekly_pnl(0.01) - 500_000.0).abs() < 1e-6);
        s.infrastructure.risk_tools_level = 3;
        assert_eq!(s.weekly_pnl(0.01), 0.0);
    }

    #[test]
    fn booking_updates_drawdown_and_sharpe() {
        let mut s = Session::new(GameConfig::default());
        s.book_pnl(1_000_000.0);
        s.book_pnl(-5_100_000.0);
        let p = &s.player;
        assert_eq!(p.pnl_history.len(), 2);
        assert_eq!(p.peak_aum, 51_000_000.0);
        assert!((p.current_drawdown - 0.1).abs() < 1e-9);
        assert!(p.rolling_sharpe < 0.0);
        assert_eq!(p.cash, 1_000_000.0 - 4_100_000.0);
    }

    #[test]
    fn sharpe_uses_recent_window_only() {
        let mut s = Session::new(GameConfig::default());
        for _ in 0..40 {
            s.book_pnl(-1_000.0);
        }
        for i in 0..SHARPE_WINDOW {
            s.book_pnl(if i % 2 == 0 { 3_000.0 } else { 1_000.0 });
        }
        assert!(s.player.rolling_sharpe > 0.0);
    }

    #[test]
    fn resilience_score_counts_levels_and_team() {
        let mut s = Session::new(GameConfig::default());
        assert_eq!(s.resilience_score(), 60);
        let mut m = InfraSpecialist::new("I", 80);
        m.happiness = 90;
        s.infra_team.push(m);
        // 60 + 8 + 4
        assert_eq!(s.resilience_score(), 72);
        s.infrastructure.compute_level = 10;
        assert_eq!(s.resilience_score(), 100);
    }

    #[test]
    fn infra_team_refunds_upgrades() {
        let mut s = Session::new(GameConfig::default());
        let mut m = InfraSpecialist::new("I", 100);
        m.happiness = 70;
        s.infra_team.push(m);
        let refund = s.upgrade_infra(InfraKind::Compute).unwrap();
        assert_eq!(refund, 10_000.0);
        assert_eq!(s.player.cash, 960_000.0);
        assert_eq!(s.infrastructure.compute_level, 2);
        assert_eq!(s.infra_team[0].happiness, 72);
    }

    #[test]
    fn upgrade_needs_cash() {
        let mut s = Session::new(GameConfig::default());
        s.player.cash = 49_999.0;
        assert!(matches!(
            s.upgrade_infra(InfraKind::DataQuality),
            Err(ActionError::InsufficientFunds { .. })
        ));
        assert_eq!(s.infrastructure.data_quality, 1);
        assert_eq!(s.player.cash, 49_999.0);
    }
}
