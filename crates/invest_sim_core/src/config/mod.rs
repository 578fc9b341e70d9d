//! Simulation configuration
//!
//! `SimulationConfig` carries everything one batch needs: Monte Carlo sizing,
//! the income schedule, the horizon shape, the strategy knobs and the static
//! asset definitions. It is plain serde data; `validate` checks it before any
//! iteration runs, since every iteration of the batch depends on it.
//!
//! # Builder DSL
//!
//! ```ignore
//! use invest_sim_core::config::SimulationBuilder;
//! use invest_sim_core::model::AssetSpec;
//!
//! let config = SimulationBuilder::new()
//!     .iterations(10_000)
//!     .monthly_income(25.0)
//!     .years_per_period(5)
//!     .periods(3)
//!     .rebalance_every(360)
//!     .asset(AssetSpec::cash("Cash"))
//!     .asset(AssetSpec::risk("Stock", 6.0, 6.0).weight(5.0))
//!     .asset(AssetSpec::risk("Inverse", 6.0, -6.0).weight(5.0))
//!     .build();
//! ```

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{AssetIndex, AssetRole, AssetSpec, CASH, INCOME_INTERVAL_DAYS, RegimeSequence};
use crate::returns::MAX_DAILY_VOLATILITY;
use crate::strategy::RebalanceMode;

pub mod builder;

pub use builder::SimulationBuilder;

/// Days in one simulated year (twelve 30-day months)
pub const DAYS_PER_YEAR: usize = 360;

fn default_iterations() -> usize {
    10_000
}

fn default_monthly_income() -> f64 {
    25.0
}

fn default_period_length_days() -> usize {
    5 * DAYS_PER_YEAR
}

fn default_periods() -> usize {
    3
}

fn default_rebalance_interval_days() -> usize {
    DAYS_PER_YEAR
}

fn default_capital_gains_rate() -> f64 {
    0.20
}

fn default_assets() -> Vec<AssetSpec> {
    vec![
        AssetSpec::cash("Cash"),
        AssetSpec::risk("Stock", 6.0, 6.0).weight(5.0),
        AssetSpec::risk("Inverse", 6.0, -6.0).weight(5.0),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    // === Monte Carlo ===
    /// Independent lifetimes simulated per regime sequence
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    // === Horizon ===
    /// Days each regime bias holds
    #[serde(default = "default_period_length_days")]
    pub period_length_days: usize,
    /// Number of regime periods in one lifetime; every sequence must match
    #[serde(default = "default_periods")]
    pub periods: usize,

    // === Cash flows ===
    /// Paid in every 30 days
    #[serde(default = "default_monthly_income")]
    pub monthly_income: f64,

    // === Strategy ===
    #[serde(default)]
    pub rebalance_mode: RebalanceMode,
    #[serde(default = "default_rebalance_interval_days")]
    pub rebalance_interval_days: usize,
    /// Liquidate a position once its price has risen this many percent above
    /// the first purchase price
    #[serde(default)]
    pub profit_taking_pct: Option<f64>,
    /// Move all cash into an asset once its price has fallen this many percent
    /// (negative) below the last lump-sum price
    #[serde(default)]
    pub lump_sum_pct: Option<f64>,
    /// Flat tax on realized gains from profit-taking
    #[serde(default = "default_capital_gains_rate")]
    pub capital_gains_rate: f64,
    /// Most cash a single proportional rebalance may consume
    #[serde(default)]
    pub cash_draw_limit: Option<f64>,

    // === Assets ===
    /// Pair of risk assets whose daily prices are correlated per iteration.
    /// Defaults to the first two risk assets.
    #[serde(default)]
    pub correlation_pair: Option<[AssetIndex; 2]>,
    #[serde(default = "default_assets")]
    pub assets: Vec<AssetSpec>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            period_length_days: default_period_length_days(),
            periods: default_periods(),
            monthly_income: default_monthly_income(),
            rebalance_mode: RebalanceMode::default(),
            rebalance_interval_days: default_rebalance_interval_days(),
            profit_taking_pct: None,
            lump_sum_pct: None,
            capital_gains_rate: default_capital_gains_rate(),
            cash_draw_limit: None,
            correlation_pair: None,
            assets: default_assets(),
        }
    }
}

impl SimulationConfig {
    /// Length of one lifetime in days
    #[must_use]
    pub fn horizon_days(&self) -> usize {
        self.period_length_days * self.periods
    }

    /// Number of income injections over one lifetime
    #[must_use]
    pub fn income_injections(&self) -> usize {
        self.horizon_days() / INCOME_INTERVAL_DAYS
    }

    /// Income paid in over one lifetime
    #[must_use]
    pub fn total_income(&self) -> f64 {
        self.monthly_income * self.income_injections() as f64
    }

    #[must_use]
    pub fn weight_sum(&self) -> f64 {
        self.assets.iter().map(|a| a.target_weight).sum()
    }

    /// Target weights normalised to sum to one
    #[must_use]
    pub fn weight_shares(&self) -> Vec<f64> {
        let sum = self.weight_sum();
        self.assets.iter().map(|a| a.target_weight / sum).collect()
    }

    #[must_use]
    pub fn asset_labels(&self) -> Vec<&str> {
        self.assets.iter().map(|a| a.label.as_str()).collect()
    }

    /// Copy of this config with target weights replaced in slot order.
    /// Slots beyond `weights` keep their current weight.
    #[must_use]
    pub fn with_weights(&self, weights: &[f64]) -> Self {
        let mut config = self.clone();
        for (asset, weight) in config.assets.iter_mut().zip(weights) {
            asset.target_weight = *weight;
        }
        config
    }

    /// The configured correlation pair, or the first two risk assets
    #[must_use]
    pub fn resolved_correlation_pair(&self) -> Option<[AssetIndex; 2]> {
        if self.correlation_pair.is_some() {
            return self.correlation_pair;
        }
        let mut risk = (0..self.assets.len())
            .filter(|&i| self.assets[i].role == AssetRole::Risk)
            .map(AssetIndex);
        Some([risk.next()?, risk.next()?])
    }

    /// Check every batch-wide invariant.
    ///
    /// Smoothing-trial counts of zero are not an error: they are coerced to one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.period_length_days == 0 {
            return Err(ConfigError::ZeroPeriodLength);
        }
        if self.periods == 0 {
            return Err(ConfigError::ZeroPeriods);
        }
        if self.rebalance_mode == RebalanceMode::Proportional && self.rebalance_interval_days == 0
        {
            return Err(ConfigError::ZeroRebalanceInterval);
        }
        if !self.monthly_income.is_finite() || self.monthly_income < 0.0 {
            return Err(ConfigError::InvalidIncome(self.monthly_income));
        }
        if let Some(pct) = self.profit_taking_pct
            && (!pct.is_finite() || pct < 0.0)
        {
            return Err(ConfigError::InvalidProfitTakingThreshold(pct));
        }
        if let Some(pct) = self.lump_sum_pct
            && (!pct.is_finite() || pct > 0.0 || pct <= -100.0)
        {
            return Err(ConfigError::InvalidLumpSumThreshold(pct));
        }
        if !(0.0..=1.0).contains(&self.capital_gains_rate) {
            return Err(ConfigError::InvalidCapitalGainsRate(self.capital_gains_rate));
        }
        if let Some(limit) = self.cash_draw_limit
            && (!limit.is_finite() || limit < 0.0)
        {
            return Err(ConfigError::InvalidCashDrawLimit(limit));
        }

        self.validate_assets()?;

        if let Some(pair @ [a, b]) = self.correlation_pair {
            let is_risk = |idx: AssetIndex| {
                self.assets
                    .get(idx.0)
                    .is_some_and(|spec| spec.role == AssetRole::Risk)
            };
            if a == b || !is_risk(a) || !is_risk(b) {
                return Err(ConfigError::InvalidCorrelationPair(pair));
            }
        }
        Ok(())
    }

    fn validate_assets(&self) -> Result<(), ConfigError> {
        let cash = self.assets.first().ok_or(ConfigError::NoAssets)?;
        if !cash.is_cash() {
            return Err(ConfigError::MissingCashAsset);
        }
        if cash.daily_volatility != 0.0 || cash.regime_sensitivity != 0.0 {
            return Err(ConfigError::VolatileCash {
                volatility: cash.daily_volatility,
                sensitivity: cash.regime_sensitivity,
            });
        }

        let mut labels = FxHashSet::default();
        for (i, spec) in self.assets.iter().enumerate() {
            let idx = AssetIndex(i);
            if idx != CASH && spec.is_cash() {
                return Err(ConfigError::MisplacedCashAsset(idx));
            }
            if !labels.insert(spec.label.as_str()) {
                return Err(ConfigError::DuplicateLabel(spec.label.clone()));
            }
            if !spec.target_weight.is_finite() || spec.target_weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    asset: idx,
                    weight: spec.target_weight,
                });
            }
            if !(0.0..MAX_DAILY_VOLATILITY).contains(&spec.daily_volatility) {
                return Err(ConfigError::InvalidVolatility {
                    asset: idx,
                    volatility: spec.daily_volatility,
                });
            }
            if !spec.regime_sensitivity.is_finite() {
                return Err(ConfigError::InvalidSensitivity {
                    asset: idx,
                    sensitivity: spec.regime_sensitivity,
                });
            }
            if spec.smoothing_trials == 0 {
                tracing::warn!(
                    "asset {:?} has 0 smoothing trials, using 1 instead",
                    spec.label
                );
            }
        }

        if self.weight_sum() <= 0.0 {
            return Err(ConfigError::ZeroWeightSum);
        }
        Ok(())
    }

    /// Check that a regime sequence fits this config's horizon
    pub fn validate_regime(&self, regime: &RegimeSequence) -> Result<(), ConfigError> {
        if regime.periods() != self.periods {
            return Err(ConfigError::RegimeLength {
                label: regime.label.clone(),
                expected: self.periods,
                actual: regime.periods(),
            });
        }
        if let Some(&bias) = regime.biases.iter().find(|b| !b.is_finite()) {
            return Err(ConfigError::InvalidRegimeBias {
                label: regime.label.clone(),
                bias,
            });
        }
        // the worst draw must still leave a positive rate
        for (i, spec) in self.assets.iter().enumerate().skip(1) {
            for &bias in &regime.biases {
                let worst = spec.daily_volatility + (bias * spec.regime_sensitivity).abs();
                if worst >= MAX_DAILY_VOLATILITY {
                    return Err(ConfigError::RegimeOutOfRange {
                        label: regime.label.clone(),
                        asset: AssetIndex(i),
                        bias,
                    });
                }
            }
        }
        Ok(())
    }
}
