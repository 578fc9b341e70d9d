//! Portfolio-management strategies
//!
//! A run selects its strategy once: a rebalancing policy (off, proportional
//! liquidating, or non-liquidating) plus optional threshold rules for
//! profit-taking and lump-sum buying. The scenario loop asks the strategy what
//! to do on each day; the policies mutate a `Portfolio` in place.

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::ledger::Portfolio;
use crate::model::{AssetIndex, CASH};

/// Rounding slack per unit of portfolio value when checking cash
const CASH_TOLERANCE: f64 = 1e-9;

/// Rebalancing mode as configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceMode {
    /// Income is split by target weight, holdings are never traded
    Off,
    /// Holdings are traded back to target weights on a fixed schedule
    #[default]
    Proportional,
    /// Income buys the underweight assets first; nothing is ever sold
    NonLiquidating,
}

/// Runtime form of the rebalancing choice
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RebalancePolicy {
    Off,
    Proportional {
        interval_days: usize,
        cash_draw_limit: Option<f64>,
    },
    NonLiquidating,
}

/// Optional price-triggered rules evaluated daily before income
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThresholdRules {
    pub profit_taking_pct: Option<f64>,
    pub lump_sum_pct: Option<f64>,
    pub capital_gains_rate: f64,
}

impl ThresholdRules {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.profit_taking_pct.is_some() || self.lump_sum_pct.is_some()
    }
}

/// Why a proportional rebalance was abandoned
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// Funding the risk-asset purchases would leave cash negative
    InsufficientCash { shortfall: f64 },
    /// Funding the purchases would consume more cash than allowed
    CashDrawLimit { draw: f64, limit: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RebalanceOutcome {
    /// Total absolute value traded
    Applied { turnover: f64 },
    Skipped(SkipReason),
    /// Nothing to do under this policy
    NotApplicable,
}

/// A full position closed by profit-taking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitTaken {
    pub asset: AssetIndex,
    pub proceeds: f64,
    pub tax: f64,
}

/// Cash moved into a risk asset by a lump-sum buy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumpSumBought {
    pub asset: AssetIndex,
    pub amount: f64,
}

/// Everything the threshold rules did on one day
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdEffects {
    pub profits: Vec<ProfitTaken>,
    pub lump_sums: Vec<LumpSumBought>,
}

impl ThresholdEffects {
    #[must_use]
    pub fn tax_paid(&self) -> f64 {
        self.profits.iter().map(|p| p.tax).sum()
    }
}

/// The strategy of one run, selected once from the config
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub rebalance: RebalancePolicy,
    pub thresholds: ThresholdRules,
    /// Target weights normalised to sum to one
    shares: Vec<f64>,
}

impl Strategy {
    /// Derive the strategy from an already validated config
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        let rebalance = match config.rebalance_mode {
            RebalanceMode::Off => RebalancePolicy::Off,
            RebalanceMode::Proportional => RebalancePolicy::Proportional {
                interval_days: config.rebalance_interval_days,
                cash_draw_limit: config.cash_draw_limit,
            },
            RebalanceMode::NonLiquidating => RebalancePolicy::NonLiquidating,
        };
        Self {
            rebalance,
            thresholds: ThresholdRules {
                profit_taking_pct: config.profit_taking_pct,
                lump_sum_pct: config.lump_sum_pct,
                capital_gains_rate: config.capital_gains_rate,
            },
            shares: config.weight_shares(),
        }
    }

    /// Per-asset purchase amounts for one income payment
    #[must_use]
    pub fn income_purchases(&self, portfolio: &Portfolio, income: f64) -> Vec<f64> {
        match self.rebalance {
            RebalancePolicy::NonLiquidating => {
                non_liquidating_allocation(portfolio, &self.shares, income)
            }
            RebalancePolicy::Off | RebalancePolicy::Proportional { .. } => {
                proportional_allocation(&self.shares, income)
            }
        }
    }

    /// Whether the scheduled rebalance fires on `day` (1-based) of a `horizon`-day lifetime
    #[must_use]
    pub fn rebalance_due(&self, day: usize, horizon: usize) -> bool {
        match self.rebalance {
            RebalancePolicy::Proportional { interval_days, .. } => {
                day % interval_days == 0 || day == horizon
            }
            RebalancePolicy::Off | RebalancePolicy::NonLiquidating => false,
        }
    }

    pub fn rebalance(&self, portfolio: &mut Portfolio) -> RebalanceOutcome {
        match self.rebalance {
            RebalancePolicy::Proportional {
                cash_draw_limit, ..
            } => proportional_rebalance(portfolio, &self.shares, cash_draw_limit),
            RebalancePolicy::Off | RebalancePolicy::NonLiquidating => {
                RebalanceOutcome::NotApplicable
            }
        }
    }

    /// Run profit-taking over every risk asset, then lump-sum buying
    pub fn apply_thresholds(&self, portfolio: &mut Portfolio) -> ThresholdEffects {
        let mut effects = ThresholdEffects::default();
        if let Some(pct) = self.thresholds.profit_taking_pct {
            for asset in portfolio.risk_indices() {
                if let Some(taken) =
                    take_profit(portfolio, asset, pct, self.thresholds.capital_gains_rate)
                {
                    effects.profits.push(taken);
                }
            }
        }
        if let Some(pct) = self.thresholds.lump_sum_pct {
            for asset in portfolio.risk_indices() {
                if let Some(bought) = lump_sum_buy(portfolio, asset, pct) {
                    effects.lump_sums.push(bought);
                }
            }
        }
        effects
    }
}

/// Split `income` by target share
#[must_use]
pub fn proportional_allocation(shares: &[f64], income: f64) -> Vec<f64> {
    shares.iter().map(|share| income * share).collect()
}

/// Buy-the-underweight allocation of `income`.
///
/// Targets are computed over the portfolio value after the income lands. Each
/// underweight asset, in slot order, receives up to its deficit until the
/// income runs out; whatever is left over is split by target share. The
/// result never contains a negative amount and sums to `income`.
#[must_use]
pub fn non_liquidating_allocation(portfolio: &Portfolio, shares: &[f64], income: f64) -> Vec<f64> {
    let total_after = portfolio.total_value() + income;
    let mut remaining = income;
    let mut purchases: Vec<f64> = portfolio
        .assets()
        .iter()
        .zip(shares)
        .map(|(asset, share)| {
            let deficit = (total_after * share - asset.market_value).max(0.0);
            let amount = deficit.min(remaining);
            remaining -= amount;
            amount
        })
        .collect();

    if remaining > 0.0 {
        for (purchase, share) in purchases.iter_mut().zip(shares) {
            *purchase += remaining * share;
        }
    }
    purchases
}

/// Buy each asset's amount at its current price
pub fn inject_purchases(portfolio: &mut Portfolio, purchases: &[f64]) {
    for (asset, amount) in portfolio.assets_mut().iter_mut().zip(purchases) {
        asset.buy(*amount);
    }
}

/// Liquidating rebalance back to target shares.
///
/// Cash funds the net purchases of the risk assets, so after the trades it
/// holds exactly its own target. If that target is negative, or reaching it
/// would draw more than `cash_draw_limit`, the whole rebalance is skipped and
/// the portfolio is left untouched.
pub fn proportional_rebalance(
    portfolio: &mut Portfolio,
    shares: &[f64],
    cash_draw_limit: Option<f64>,
) -> RebalanceOutcome {
    let total = portfolio.total_value();
    let targets: Vec<f64> = shares.iter().map(|share| total * share).collect();
    let tolerance = CASH_TOLERANCE * total.abs().max(1.0);

    let cash_target = targets[CASH.0];
    if cash_target < -tolerance {
        return RebalanceOutcome::Skipped(SkipReason::InsufficientCash {
            shortfall: -cash_target,
        });
    }
    if let Some(limit) = cash_draw_limit {
        let draw = portfolio.cash().market_value - cash_target;
        if draw > limit + tolerance {
            return RebalanceOutcome::Skipped(SkipReason::CashDrawLimit { draw, limit });
        }
    }

    let mut turnover = 0.0;
    for (asset, target) in portfolio.assets_mut().iter_mut().zip(&targets) {
        turnover += asset.trade_to(target.max(0.0)).abs();
    }
    RebalanceOutcome::Applied { turnover }
}

/// Close the whole position in `asset` once its price has risen more than
/// `threshold_pct` above the first purchase price.
///
/// Gains are taxed at `tax_rate`; the after-tax proceeds go to cash and the
/// reference price moves to today's price.
pub fn take_profit(
    portfolio: &mut Portfolio,
    asset: AssetIndex,
    threshold_pct: f64,
    tax_rate: f64,
) -> Option<ProfitTaken> {
    if asset == CASH {
        return None;
    }
    let state = &mut portfolio[asset];
    let reference = state.first_buy_price?;
    if !state.has_position() || state.price <= reference * (1.0 + threshold_pct / 100.0) {
        return None;
    }

    let price = state.price;
    let liquidation = state.liquidate();
    state.first_buy_price = Some(price);

    let tax = tax_rate * liquidation.gain().max(0.0);
    let proceeds = liquidation.proceeds - tax;
    portfolio.cash_mut().deposit(proceeds);

    tracing::trace!(
        asset = asset.0,
        price,
        proceeds,
        tax,
        "profit taken"
    );
    Some(ProfitTaken {
        asset,
        proceeds,
        tax,
    })
}

/// Move the entire cash balance into `asset` once its price has fallen to
/// `threshold_pct` (negative) below the last lump-sum price
pub fn lump_sum_buy(
    portfolio: &mut Portfolio,
    asset: AssetIndex,
    threshold_pct: f64,
) -> Option<LumpSumBought> {
    if asset == CASH || portfolio.cash().market_value <= 0.0 {
        return None;
    }
    let state = &portfolio[asset];
    if state.price > state.last_lump_sum_price * (1.0 + threshold_pct / 100.0) {
        return None;
    }

    let amount = portfolio.cash_mut().withdraw_all();
    let state = &mut portfolio[asset];
    state.buy(amount);
    state.last_lump_sum_price = state.price;

    tracing::trace!(asset = asset.0, price = state.price, amount, "lump sum bought");
    Some(LumpSumBought { asset, amount })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssetSpec;

    fn three_assets(shares_tenths: [f64; 3]) -> SimulationConfig {
        SimulationConfig {
            assets: vec![
                AssetSpec::cash("Cash").weight(shares_tenths[0]),
                AssetSpec::risk("Stock", 5.0, 5.0).weight(shares_tenths[1]),
                AssetSpec::risk("Bond", 1.0, -1.0).weight(shares_tenths[2]),
            ],
            ..Default::default()
        }
    }

    fn portfolio_with(values: &[f64], prices: &[f64]) -> Portfolio {
        let mut portfolio = Portfolio::new(values.len(), 0);
        for (i, (value, price)) in values.iter().zip(prices).enumerate() {
            let asset = &mut portfolio[AssetIndex(i)];
            asset.price = *price;
            asset.buy(*value);
        }
        portfolio
    }

    #[test]
    fn test_proportional_rebalance_conserves_value() {
        let shares = three_assets([2.0, 5.0, 3.0]).weight_shares();
        let mut portfolio = portfolio_with(&[10.0, 150.0, 40.0], &[1.0, 1.5, 0.8]);
        let before = portfolio.total_value();

        let outcome = proportional_rebalance(&mut portfolio, &shares, None);
        assert!(matches!(outcome, RebalanceOutcome::Applied { .. }));

        let after = portfolio.total_value();
        assert!((after - before).abs() < 1e-9, "before={before} after={after}");
        assert!((portfolio[AssetIndex(0)].market_value - 40.0).abs() < 1e-9);
        assert!((portfolio[AssetIndex(1)].market_value - 100.0).abs() < 1e-9);
        assert!((portfolio[AssetIndex(2)].market_value - 60.0).abs() < 1e-9);

        // stock sold 50 at 1.5, bond bought 20 at 0.8
        let stock = &portfolio[AssetIndex(1)];
        assert!((stock.sold_value - 50.0).abs() < 1e-9);
        assert!((stock.sold_units - 50.0 / 1.5).abs() < 1e-9);
        let bond = &portfolio[AssetIndex(2)];
        assert!((bond.bought_value - 60.0).abs() < 1e-9);
        assert!((bond.unit_count - 60.0 / 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_cash_draw_limit_skips_whole_rebalance() {
        let shares = three_assets([0.0, 5.0, 5.0]).weight_shares();
        let mut portfolio = portfolio_with(&[100.0, 0.0, 0.0], &[1.0, 1.0, 1.0]);
        let snapshot = portfolio.clone();

        let outcome = proportional_rebalance(&mut portfolio, &shares, Some(30.0));
        assert_eq!(
            outcome,
            RebalanceOutcome::Skipped(SkipReason::CashDrawLimit {
                draw: 100.0,
                limit: 30.0
            })
        );
        assert_eq!(portfolio, snapshot);
    }

    #[test]
    fn test_large_balances_without_cash_target_always_apply() {
        let shares = three_assets([0.0, 5.0, 5.0]).weight_shares();
        for k in 0..200 {
            let k = f64::from(k);
            let stock = 1e8 + k * 3.7e6 + 0.123;
            let bond = 9e8 - k * 1.3e6 + 0.77;
            let mut portfolio = portfolio_with(&[0.0, stock, bond], &[1.0, 1.37, 0.91]);
            let before = portfolio.total_value();

            let outcome = proportional_rebalance(&mut portfolio, &shares, None);
            assert!(matches!(outcome, RebalanceOutcome::Applied { .. }), "k={k}: {outcome:?}");
            assert_eq!(portfolio.cash().market_value, 0.0);
            let after = portfolio.total_value();
            assert!((after - before).abs() <= 1e-12 * before, "k={k}");
        }
    }

    #[test]
    fn test_negative_cash_target_skips_rebalance() {
        let shares = three_assets([5.0, 5.0, 0.0]).weight_shares();
        let mut portfolio = portfolio_with(&[0.0, 40.0, 0.0], &[1.0, 1.0, 1.0]);
        // overdrawn cash drags the whole portfolio below zero
        portfolio.assets_mut()[0].market_value = -100.0;
        let snapshot = portfolio.clone();

        let outcome = proportional_rebalance(&mut portfolio, &shares, None);
        assert_eq!(
            outcome,
            RebalanceOutcome::Skipped(SkipReason::InsufficientCash { shortfall: 30.0 })
        );
        assert_eq!(portfolio, snapshot);
    }

    #[test]
    fn test_thresholds_report_lump_sums() {
        let mut config = three_assets([2.0, 4.0, 4.0]);
        config.lump_sum_pct = Some(-10.0);
        let strategy = Strategy::from_config(&config);
        let mut portfolio = portfolio_with(&[80.0, 20.0, 20.0], &[1.0, 1.0, 1.0]);
        portfolio = portfolio.advance_day(&[1.0, 0.85, 1.0]);

        let effects = strategy.apply_thresholds(&mut portfolio);
        assert!(effects.profits.is_empty());
        assert_eq!(effects.tax_paid(), 0.0);
        assert_eq!(
            effects.lump_sums,
            vec![LumpSumBought {
                asset: AssetIndex(1),
                amount: 80.0
            }]
        );
        // the second risk asset finds no cash left
        assert_eq!(portfolio.cash().market_value, 0.0);
    }

    #[test]
    fn test_non_liquidating_fills_deficits_in_order() {
        let shares = three_assets([0.0, 5.0, 5.0]).weight_shares();
        let portfolio = portfolio_with(&[0.0, 100.0, 40.0], &[1.0, 1.0, 1.0]);

        // total after income 200, target 100/100: bond needs 60, only 60 arrives
        let purchases = non_liquidating_allocation(&portfolio, &shares, 60.0);
        assert_eq!(purchases, vec![0.0, 0.0, 60.0]);

        // targets 120/120: stock short 20, bond short 80
        let purchases = non_liquidating_allocation(&portfolio, &shares, 100.0);
        assert_eq!(purchases, vec![0.0, 20.0, 80.0]);
    }

    #[test]
    fn test_non_liquidating_never_sells_and_spends_all_income() {
        let shares = three_assets([1.0, 6.0, 3.0]).weight_shares();
        let portfolio = portfolio_with(&[5.0, 10.0, 500.0], &[1.0, 1.2, 0.9]);
        let purchases = non_liquidating_allocation(&portfolio, &shares, 25.0);
        assert!(purchases.iter().all(|p| *p >= 0.0));
        let spent: f64 = purchases.iter().sum();
        assert!((spent - 25.0).abs() < 1e-9);
        // the overweight bond gets nothing
        assert_eq!(purchases[2], 0.0);
    }

    #[test]
    fn test_profit_taking_at_zero_threshold() {
        let mut portfolio = portfolio_with(&[0.0, 100.0], &[1.0, 1.0]);
        portfolio = portfolio.advance_day(&[1.0, 1.001]);

        let taken = take_profit(&mut portfolio, AssetIndex(1), 0.0, 0.2).unwrap();
        let gain = 100.0 * 1.001 - 100.0;
        assert!((taken.tax - 0.2 * gain).abs() < 1e-9);
        assert!((taken.proceeds - (100.1 - 0.2 * gain)).abs() < 1e-9);

        let stock = &portfolio[AssetIndex(1)];
        assert_eq!(stock.market_value, 0.0);
        assert_eq!(stock.unit_count, 0.0);
        assert_eq!(stock.cost_basis, 0.0);
        assert_eq!(stock.first_buy_price, Some(stock.price));
        assert!((portfolio.cash().market_value - taken.proceeds).abs() < 1e-12);
        assert!((portfolio.cash().cost_basis - taken.proceeds).abs() < 1e-12);
    }

    #[test]
    fn test_profit_taking_waits_for_threshold() {
        let mut portfolio = portfolio_with(&[0.0, 100.0], &[1.0, 1.0]);
        portfolio = portfolio.advance_day(&[1.0, 1.05]);
        assert_eq!(take_profit(&mut portfolio, AssetIndex(1), 10.0, 0.2), None);
        portfolio = portfolio.advance_day(&[1.0, 1.05]);
        assert!(take_profit(&mut portfolio, AssetIndex(1), 10.0, 0.2).is_some());
    }

    #[test]
    fn test_profit_taking_ignores_empty_positions() {
        let mut portfolio = Portfolio::new(2, 1);
        portfolio = portfolio.advance_day(&[1.0, 2.0]);
        assert_eq!(take_profit(&mut portfolio, AssetIndex(1), 0.0, 0.2), None);
    }

    #[test]
    fn test_lump_sum_moves_all_cash() {
        let mut portfolio = portfolio_with(&[80.0, 20.0], &[1.0, 1.0]);
        portfolio = portfolio.advance_day(&[1.0, 0.95]);
        assert_eq!(lump_sum_buy(&mut portfolio, AssetIndex(1), -10.0), None);

        portfolio = portfolio.advance_day(&[1.0, 0.9]);
        let bought = lump_sum_buy(&mut portfolio, AssetIndex(1), -10.0).unwrap();
        assert_eq!(bought.amount, 80.0);
        assert_eq!(portfolio.cash().market_value, 0.0);
        assert_eq!(portfolio.cash().unit_count, 0.0);

        let stock = &portfolio[AssetIndex(1)];
        assert!((stock.last_lump_sum_price - 0.855).abs() < 1e-12);
        assert!((stock.market_value - (20.0 * 0.855 + 80.0)).abs() < 1e-9);

        // no cash left, nothing further happens
        portfolio = portfolio.advance_day(&[1.0, 0.5]);
        assert_eq!(lump_sum_buy(&mut portfolio, AssetIndex(1), -10.0), None);
    }

    #[test]
    fn test_rebalance_schedule() {
        let mut config = three_assets([0.0, 5.0, 5.0]);
        config.rebalance_interval_days = 360;
        let strategy = Strategy::from_config(&config);
        assert!(!strategy.rebalance_due(30, 1000));
        assert!(strategy.rebalance_due(360, 1000));
        assert!(strategy.rebalance_due(1000, 1000));

        config.rebalance_mode = RebalanceMode::NonLiquidating;
        let strategy = Strategy::from_config(&config);
        assert!(!strategy.rebalance_due(360, 1000));
        let mut portfolio = Portfolio::new(3, 0);
        assert_eq!(
            strategy.rebalance(&mut portfolio),
            RebalanceOutcome::NotApplicable
        );
    }

    #[test]
    fn test_income_split_by_mode() {
        let mut config = three_assets([0.0, 5.0, 5.0]);
        config.rebalance_mode = RebalanceMode::Off;
        let portfolio = portfolio_with(&[0.0, 100.0, 0.0], &[1.0, 1.0, 1.0]);

        let strategy = Strategy::from_config(&config);
        assert_eq!(strategy.income_purchases(&portfolio, 50.0), vec![0.0, 25.0, 25.0]);

        config.rebalance_mode = RebalanceMode::NonLiquidating;
        let strategy = Strategy::from_config(&config);
        assert_eq!(strategy.income_purchases(&portfolio, 50.0), vec![0.0, 0.0, 50.0]);
    }
}
