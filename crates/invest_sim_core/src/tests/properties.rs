//! Randomized invariant checks over many seeded portfolios

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::ledger::Portfolio;
use crate::model::AssetIndex;
use crate::strategy::{
    RebalanceOutcome, non_liquidating_allocation, proportional_allocation, proportional_rebalance,
};

const CASES: u64 = 500;

fn random_portfolio(rng: &mut SmallRng, slots: usize) -> Portfolio {
    random_portfolio_up_to(rng, slots, 1_000.0)
}

fn random_portfolio_up_to(rng: &mut SmallRng, slots: usize, max_value: f64) -> Portfolio {
    let mut portfolio = Portfolio::new(slots, 0);
    for i in 0..slots {
        let asset = &mut portfolio[AssetIndex(i)];
        if i > 0 {
            asset.price = rng.random_range(0.2..5.0);
        }
        if rng.random_bool(0.8) {
            asset.buy(rng.random_range(0.0..max_value));
        }
    }
    portfolio
}

fn random_shares(rng: &mut SmallRng, slots: usize) -> Vec<f64> {
    let weights: Vec<f64> = (0..slots).map(|_| rng.random_range(0.0..10.0)).collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|w| w / sum).collect()
}

fn assert_rebalance_conserves_value(seed: u64, max_value: f64) {
    let mut rng = SmallRng::seed_from_u64(seed);
    for case in 0..CASES {
        let slots = rng.random_range(2..6);
        let mut shares = random_shares(&mut rng, slots);
        if rng.random_bool(0.3) {
            // no cash target: the cash slot ends exactly empty
            shares[0] = 0.0;
            let sum: f64 = shares.iter().sum();
            shares.iter_mut().for_each(|s| *s /= sum);
        }
        let mut portfolio = random_portfolio_up_to(&mut rng, slots, max_value);
        let before = portfolio.total_value();
        let slack = 1e-9 * before.max(1.0);

        let outcome = proportional_rebalance(&mut portfolio, &shares, None);
        assert!(
            matches!(outcome, RebalanceOutcome::Applied { .. }),
            "case {case}: {outcome:?}"
        );
        let after = portfolio.total_value();
        assert!(
            (after - before).abs() <= slack,
            "case {case}: before={before} after={after}"
        );
        for (asset, share) in portfolio.assets().iter().zip(&shares) {
            assert!((asset.market_value - before * share).abs() <= slack);
            assert!(asset.market_value >= 0.0);
        }
    }
}

#[test]
fn test_proportional_rebalance_conserves_value() {
    assert_rebalance_conserves_value(0xC0FFEE, 1_000.0);
}

#[test]
fn test_proportional_rebalance_conserves_value_at_large_balances() {
    assert_rebalance_conserves_value(0xBEEF, 1e9);
}

#[test]
fn test_skipped_rebalance_leaves_portfolio_untouched() {
    let mut rng = SmallRng::seed_from_u64(42);
    for _ in 0..CASES {
        let slots = rng.random_range(2..5);
        let shares = random_shares(&mut rng, slots);
        let mut portfolio = random_portfolio(&mut rng, slots);
        let snapshot = portfolio.clone();
        let limit = rng.random_range(0.0..50.0);

        if let RebalanceOutcome::Skipped(_) =
            proportional_rebalance(&mut portfolio, &shares, Some(limit))
        {
            assert_eq!(portfolio, snapshot);
        }
    }
}

#[test]
fn test_non_liquidating_purchases_are_non_negative_and_exhaust_income() {
    let mut rng = SmallRng::seed_from_u64(7);
    for case in 0..CASES {
        let slots = rng.random_range(2..6);
        let shares = random_shares(&mut rng, slots);
        let portfolio = random_portfolio(&mut rng, slots);
        let income = rng.random_range(0.0..500.0);

        let purchases = non_liquidating_allocation(&portfolio, &shares, income);
        assert_eq!(purchases.len(), slots);
        assert!(
            purchases.iter().all(|p| *p >= 0.0),
            "case {case}: {purchases:?}"
        );
        let spent: f64 = purchases.iter().sum();
        assert!((spent - income).abs() < 1e-9, "case {case}: {spent} vs {income}");
    }
}

#[test]
fn test_proportional_allocation_exhausts_income() {
    let mut rng = SmallRng::seed_from_u64(3);
    for _ in 0..CASES {
        let slots = rng.random_range(1..6);
        let shares = random_shares(&mut rng, slots);
        let income = rng.random_range(0.0..500.0);
        let spent: f64 = proportional_allocation(&shares, income).iter().sum();
        assert!((spent - income).abs() < 1e-9);
    }
}
