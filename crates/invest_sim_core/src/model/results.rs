//! Simulation results and summaries
//!
//! A single lifetime produces an immutable `IterationResult`. Results are
//! folded into a `RunSummary` per regime sequence, and the summaries of a
//! batch are pooled into a `PooledSummary` for the headline figures.

use serde::{Deserialize, Serialize};

use super::INITIAL_PRICE;
use super::ids::AssetIndex;
use crate::stats::{average_price, growth_pct, yield_pct};

/// Final state of one asset at the end of a lifetime
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AssetOutcome {
    pub end_price: f64,
    pub end_value: f64,
    pub bought_value: f64,
    pub bought_units: f64,
    pub sold_value: f64,
    pub sold_units: f64,
}

/// Everything the aggregator needs from one simulated lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationResult {
    pub ending_value: f64,
    /// Total income injected over the horizon
    pub contributed: f64,
    /// Capital gains tax withheld by profit-taking
    pub tax_paid: f64,
    /// Pearson correlation of the designated pair's daily prices
    pub correlation: Option<f64>,
    /// Proportional rebalances abandoned for lack of cash
    pub skipped_rebalances: u32,
    pub assets: Vec<AssetOutcome>,
}

/// Per-asset sums across iterations
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssetTotals {
    pub label: String,
    pub end_price: f64,
    pub end_value: f64,
    pub bought_value: f64,
    pub bought_units: f64,
    pub sold_value: f64,
    pub sold_units: f64,
}

impl AssetTotals {
    fn absorb(&mut self, outcome: &AssetOutcome) {
        self.end_price += outcome.end_price;
        self.end_value += outcome.end_value;
        self.bought_value += outcome.bought_value;
        self.bought_units += outcome.bought_units;
        self.sold_value += outcome.sold_value;
        self.sold_units += outcome.sold_units;
    }

    fn merge(&mut self, other: &AssetTotals) {
        self.end_price += other.end_price;
        self.end_value += other.end_value;
        self.bought_value += other.bought_value;
        self.bought_units += other.bought_units;
        self.sold_value += other.sold_value;
        self.sold_units += other.sold_units;
    }
}

/// Accumulated outcomes of all iterations run over one regime sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub label: String,
    pub iterations: usize,
    pub total_ending_value: f64,
    pub total_contributed: f64,
    pub total_tax_paid: f64,
    pub correlation_sum: f64,
    pub correlation_samples: usize,
    pub skipped_rebalances: u64,
    pub assets: Vec<AssetTotals>,
}

impl RunSummary {
    /// Create an empty summary with one slot per asset label
    #[must_use]
    pub fn new<S: AsRef<str>>(label: impl Into<String>, asset_labels: &[S]) -> Self {
        Self {
            label: label.into(),
            iterations: 0,
            total_ending_value: 0.0,
            total_contributed: 0.0,
            total_tax_paid: 0.0,
            correlation_sum: 0.0,
            correlation_samples: 0,
            skipped_rebalances: 0,
            assets: asset_labels
                .iter()
                .map(|label| AssetTotals {
                    label: label.as_ref().to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    /// Fold one iteration into the summary
    pub fn record(&mut self, result: &IterationResult) {
        debug_assert_eq!(result.assets.len(), self.assets.len());
        self.iterations += 1;
        self.total_ending_value += result.ending_value;
        self.total_contributed += result.contributed;
        self.total_tax_paid += result.tax_paid;
        if let Some(c) = result.correlation {
            self.correlation_sum += c;
            self.correlation_samples += 1;
        }
        self.skipped_rebalances += u64::from(result.skipped_rebalances);
        for (totals, outcome) in self.assets.iter_mut().zip(&result.assets) {
            totals.absorb(outcome);
        }
    }

    /// Element-wise sum of another summary into this one. The label is kept.
    pub fn merge(&mut self, other: &RunSummary) {
        debug_assert_eq!(other.assets.len(), self.assets.len());
        self.iterations += other.iterations;
        self.total_ending_value += other.total_ending_value;
        self.total_contributed += other.total_contributed;
        self.total_tax_paid += other.total_tax_paid;
        self.correlation_sum += other.correlation_sum;
        self.correlation_samples += other.correlation_samples;
        self.skipped_rebalances += other.skipped_rebalances;
        for (mine, theirs) in self.assets.iter_mut().zip(&other.assets) {
            mine.merge(theirs);
        }
    }

    #[must_use]
    pub fn merged(mut self, other: &RunSummary) -> Self {
        self.merge(other);
        self
    }

    fn per_iteration(&self, total: f64) -> f64 {
        if self.iterations == 0 {
            0.0
        } else {
            total / self.iterations as f64
        }
    }

    #[must_use]
    pub fn average_ending_value(&self) -> f64 {
        self.per_iteration(self.total_ending_value)
    }

    #[must_use]
    pub fn average_contributed(&self) -> f64 {
        self.per_iteration(self.total_contributed)
    }

    #[must_use]
    pub fn average_tax_paid(&self) -> f64 {
        self.per_iteration(self.total_tax_paid)
    }

    /// Rounded percentage gain of the average ending value over contributions.
    /// `None` when nothing was contributed.
    #[must_use]
    pub fn yield_pct(&self) -> Option<f64> {
        yield_pct(self.average_ending_value(), self.average_contributed())
    }

    #[must_use]
    pub fn average_end_price(&self, asset: AssetIndex) -> Option<f64> {
        self.assets
            .get(asset.0)
            .map(|totals| self.per_iteration(totals.end_price))
    }

    /// Rounded percentage growth of the asset's average ending price
    #[must_use]
    pub fn growth_pct(&self, asset: AssetIndex) -> Option<f64> {
        self.average_end_price(asset)
            .map(|price| growth_pct(price, INITIAL_PRICE))
    }

    /// Growth percentages for every asset, in slot order
    #[must_use]
    pub fn growth_pcts(&self) -> Vec<f64> {
        (0..self.assets.len())
            .filter_map(|i| self.growth_pct(AssetIndex(i)))
            .collect()
    }

    #[must_use]
    pub fn average_correlation(&self) -> Option<f64> {
        if self.correlation_samples == 0 {
            None
        } else {
            Some(self.correlation_sum / self.correlation_samples as f64)
        }
    }

    #[must_use]
    pub fn average_buy_price(&self, asset: AssetIndex) -> Option<f64> {
        let totals = self.assets.get(asset.0)?;
        average_price(totals.bought_value, totals.bought_units)
    }

    #[must_use]
    pub fn average_sell_price(&self, asset: AssetIndex) -> Option<f64> {
        let totals = self.assets.get(asset.0)?;
        average_price(totals.sold_value, totals.sold_units)
    }

    #[must_use]
    pub fn average_bought_units(&self, asset: AssetIndex) -> Option<f64> {
        self.assets
            .get(asset.0)
            .map(|totals| self.per_iteration(totals.bought_units))
    }

    #[must_use]
    pub fn average_sold_units(&self, asset: AssetIndex) -> Option<f64> {
        self.assets
            .get(asset.0)
            .map(|totals| self.per_iteration(totals.sold_units))
    }
}

/// Element-wise sum of the run summaries of a whole batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PooledSummary {
    /// Number of regime sequences pooled
    pub sequences: usize,
    pub summary: RunSummary,
}

impl PooledSummary {
    #[must_use]
    pub fn new<S: AsRef<str>>(label: impl Into<String>, asset_labels: &[S]) -> Self {
        Self {
            sequences: 0,
            summary: RunSummary::new(label, asset_labels),
        }
    }

    pub fn absorb(&mut self, run: &RunSummary) {
        self.sequences += 1;
        self.summary.merge(run);
    }

    /// Averages over every iteration of every pooled sequence
    #[must_use]
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }
}

/// Results of one reporting batch: one summary per regime sequence plus the pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub runs: Vec<RunSummary>,
    pub pooled: PooledSummary,
}
