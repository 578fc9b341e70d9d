//! One simulated lifetime
//!
//! A lifetime walks the regime sequence period by period. Every day, in order:
//! prices move, threshold rules fire, income arrives on every 30th day, and a
//! scheduled proportional rebalance runs on its interval and on the final day.
//! Days are counted from 1 across the whole horizon.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::SimulationConfig;
use crate::error::{ConfigError, Result, StatsError};
use crate::ledger::Portfolio;
use crate::model::{AssetIndex, CASH, INCOME_INTERVAL_DAYS, IterationResult, RegimeSequence};
use crate::returns::ReturnGenerator;
use crate::stats::pearson_correlation;
use crate::strategy::{RebalanceOutcome, SkipReason, Strategy, inject_purchases};

/// Final state of a lifetime, before it is reduced to an `IterationResult`
#[derive(Debug, Clone)]
pub struct Lifetime {
    pub portfolio: Portfolio,
    pub days: usize,
    pub contributed: f64,
    pub tax_paid: f64,
    pub skipped_rebalances: u32,
}

/// A validated configuration, ready to run lifetimes.
///
/// Holds one prebuilt return generator per asset and the strategy selected
/// for the run. Read-only once built, so iterations can share it freely.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulationConfig,
    generators: Vec<ReturnGenerator>,
    strategy: Strategy,
    correlation_pair: Option<[AssetIndex; 2]>,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let generators = config
            .assets
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let index = AssetIndex(i);
                if index == CASH {
                    Ok(ReturnGenerator::flat())
                } else {
                    ReturnGenerator::from_spec(index, spec)
                }
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let strategy = Strategy::from_config(&config);
        let correlation_pair = config.resolved_correlation_pair();

        tracing::debug!(
            assets = config.assets.len(),
            horizon_days = config.horizon_days(),
            rebalance = ?strategy.rebalance,
            "simulator ready"
        );

        Ok(Self {
            config,
            generators,
            strategy,
            correlation_pair,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run one lifetime from its own seed and reduce it to a result record
    pub fn run_iteration(&self, regime: &RegimeSequence, seed: u64) -> Result<IterationResult> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let lifetime = self.simulate_lifetime(regime, &mut rng)?;
        self.summarize(&lifetime)
    }

    /// Run one lifetime and return its full final state, price logs included
    pub fn simulate_lifetime<R: Rng + ?Sized>(
        &self,
        regime: &RegimeSequence,
        rng: &mut R,
    ) -> Result<Lifetime> {
        self.config.validate_regime(regime)?;

        let period_length = self.config.period_length_days;
        let horizon = period_length * regime.periods();
        let income = self.config.monthly_income;

        let mut portfolio = Portfolio::new(self.generators.len(), horizon);
        let mut rates = vec![1.0; self.generators.len()];
        let mut contributed = 0.0;
        let mut tax_paid = 0.0;
        let mut skipped_rebalances = 0;
        let mut day = 0;

        for &bias in &regime.biases {
            for _ in 0..period_length {
                day += 1;

                for (rate, generator) in rates.iter_mut().zip(&self.generators) {
                    *rate = generator.sample_rate(rng, bias);
                }
                portfolio = portfolio.advance_day(&rates);

                if self.strategy.thresholds.is_active() {
                    let effects = self.strategy.apply_thresholds(&mut portfolio);
                    if !effects.profits.is_empty() || !effects.lump_sums.is_empty() {
                        tracing::trace!(
                            day,
                            profits = effects.profits.len(),
                            lump_sums = effects.lump_sums.len(),
                            "thresholds fired"
                        );
                    }
                    tax_paid += effects.tax_paid();
                }

                if day % INCOME_INTERVAL_DAYS == 0 {
                    let purchases = self.strategy.income_purchases(&portfolio, income);
                    inject_purchases(&mut portfolio, &purchases);
                    contributed += income;
                }

                if self.strategy.rebalance_due(day, horizon) {
                    match self.strategy.rebalance(&mut portfolio) {
                        RebalanceOutcome::Skipped(SkipReason::InsufficientCash { shortfall }) => {
                            tracing::debug!(day, shortfall, "rebalance skipped: insufficient cash");
                            skipped_rebalances += 1;
                        }
                        RebalanceOutcome::Skipped(SkipReason::CashDrawLimit { draw, limit }) => {
                            tracing::debug!(day, draw, limit, "rebalance skipped: cash draw limit");
                            skipped_rebalances += 1;
                        }
                        RebalanceOutcome::Applied { turnover } => {
                            tracing::trace!(day, turnover, "rebalanced");
                        }
                        RebalanceOutcome::NotApplicable => {}
                    }
                }
            }
        }

        Ok(Lifetime {
            portfolio,
            days: day,
            contributed,
            tax_paid,
            skipped_rebalances,
        })
    }

    /// Reduce a finished lifetime to the record the aggregator folds
    pub fn summarize(&self, lifetime: &Lifetime) -> Result<IterationResult> {
        let correlation = match self.correlation_pair {
            Some([a, b]) => {
                let portfolio = &lifetime.portfolio;
                match pearson_correlation(&portfolio[a].price_log, &portfolio[b].price_log) {
                    Ok(r) => Some(r),
                    Err(StatsError::InsufficientData(_)) => None,
                    Err(e) => return Err(e.into()),
                }
            }
            None => None,
        };

        Ok(IterationResult {
            ending_value: lifetime.portfolio.total_value(),
            contributed: lifetime.contributed,
            tax_paid: lifetime.tax_paid,
            correlation,
            skipped_rebalances: lifetime.skipped_rebalances,
            assets: lifetime.portfolio.outcomes(),
        })
    }
}
