//! Fluent construction of a `SimulationConfig`
//!
//! Unlike `SimulationConfig::default()`, a fresh builder starts with no
//! assets; add the cash asset first.

use super::{DAYS_PER_YEAR, SimulationConfig};
use crate::error::ConfigError;
use crate::model::{AssetIndex, AssetSpec};
use crate::scenario::Simulator;
use crate::strategy::RebalanceMode;

#[derive(Debug, Clone)]
pub struct SimulationBuilder {
    config: SimulationConfig,
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SimulationConfig {
                assets: Vec::new(),
                ..Default::default()
            },
        }
    }

    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.iterations = iterations;
        self
    }

    #[must_use]
    pub fn monthly_income(mut self, amount: f64) -> Self {
        self.config.monthly_income = amount;
        self
    }

    #[must_use]
    pub fn period_length_days(mut self, days: usize) -> Self {
        self.config.period_length_days = days;
        self
    }

    /// Period length in 360-day years
    #[must_use]
    pub fn years_per_period(mut self, years: usize) -> Self {
        self.config.period_length_days = years * DAYS_PER_YEAR;
        self
    }

    #[must_use]
    pub fn periods(mut self, periods: usize) -> Self {
        self.config.periods = periods;
        self
    }

    /// Proportional (liquidating) rebalance every `days` days and on the final day
    #[must_use]
    pub fn rebalance_every(mut self, days: usize) -> Self {
        self.config.rebalance_mode = RebalanceMode::Proportional;
        self.config.rebalance_interval_days = days;
        self
    }

    /// Route income through the buy-the-underweight allocation
    #[must_use]
    pub fn non_liquidating(mut self) -> Self {
        self.config.rebalance_mode = RebalanceMode::NonLiquidating;
        self
    }

    #[must_use]
    pub fn no_rebalance(mut self) -> Self {
        self.config.rebalance_mode = RebalanceMode::Off;
        self
    }

    #[must_use]
    pub fn profit_taking(mut self, pct: f64) -> Self {
        self.config.profit_taking_pct = Some(pct);
        self
    }

    #[must_use]
    pub fn lump_sum(mut self, pct: f64) -> Self {
        self.config.lump_sum_pct = Some(pct);
        self
    }

    #[must_use]
    pub fn capital_gains_rate(mut self, rate: f64) -> Self {
        self.config.capital_gains_rate = rate;
        self
    }

    #[must_use]
    pub fn cash_draw_limit(mut self, limit: f64) -> Self {
        self.config.cash_draw_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn correlate(mut self, a: usize, b: usize) -> Self {
        self.config.correlation_pair = Some([AssetIndex(a), AssetIndex(b)]);
        self
    }

    #[must_use]
    pub fn asset(mut self, spec: AssetSpec) -> Self {
        self.config.assets.push(spec);
        self
    }

    #[must_use]
    pub fn build(self) -> SimulationConfig {
        self.config
    }

    /// Build and validate in one step
    pub fn simulator(self) -> Result<Simulator, ConfigError> {
        Simulator::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let config = SimulationBuilder::new()
            .iterations(5)
            .monthly_income(100.0)
            .years_per_period(2)
            .periods(4)
            .rebalance_every(90)
            .profit_taking(20.0)
            .lump_sum(-10.0)
            .asset(AssetSpec::cash("Cash").weight(2.0))
            .asset(AssetSpec::risk("Stock", 3.0, 1.0).weight(8.0))
            .build();

        assert_eq!(config.iterations, 5);
        assert_eq!(config.period_length_days, 720);
        assert_eq!(config.horizon_days(), 2880);
        assert_eq!(config.rebalance_mode, RebalanceMode::Proportional);
        assert_eq!(config.rebalance_interval_days, 90);
        assert_eq!(config.profit_taking_pct, Some(20.0));
        assert_eq!(config.lump_sum_pct, Some(-10.0));
        assert_eq!(config.asset_labels(), vec!["Cash", "Stock"]);
        assert_eq!(config.weight_shares(), vec![0.2, 0.8]);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_builder_starts_without_assets() {
        let result = SimulationBuilder::new().simulator();
        assert!(matches!(result, Err(ConfigError::NoAssets)));
    }
}
