//! Scenario files and built-in presets
//!
//! A scenario bundles one `SimulationConfig` with the regime sequences to run
//! and the weight patterns to compare. Without a file, the classic preset is
//! used: eight up/down sequences over three periods and three ways of
//! splitting income between a stock and an inversely-correlated asset.

use std::path::Path;

use color_eyre::eyre::{bail, eyre};
use invest_sim_core::aggregate::RunAggregator;
use invest_sim_core::config::{DAYS_PER_YEAR, SimulationConfig};
use invest_sim_core::model::RegimeSequence;
use invest_sim_core::scenario::Simulator;
use invest_sim_core::strategy::RebalanceMode;
use serde::{Deserialize, Serialize};

use crate::report::PatternReport;

/// Regime bias of the preset "up" and "down" periods
pub const PRESET_BIAS: f64 = 0.0024;

/// Target weights for every asset slot, cash first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightPattern {
    pub label: String,
    pub weights: Vec<f64>,
}

impl WeightPattern {
    #[must_use]
    pub fn new(label: impl Into<String>, weights: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            weights,
        }
    }

    /// Weights joined with `/`, e.g. `0/5/5`
    #[must_use]
    pub fn weights_label(&self) -> String {
        self.weights
            .iter()
            .map(|w| format!("{w}"))
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// The eight three-period combinations of an up and a down regime
#[must_use]
pub fn preset_regimes() -> Vec<RegimeSequence> {
    let up = PRESET_BIAS;
    let down = -PRESET_BIAS;
    vec![
        RegimeSequence::new("up-up-up", vec![up, up, up]),
        RegimeSequence::new("down-up-up", vec![down, up, up]),
        RegimeSequence::new("up-down-up", vec![up, down, up]),
        RegimeSequence::new("up-up-down", vec![up, up, down]),
        RegimeSequence::new("down-down-up", vec![down, down, up]),
        RegimeSequence::new("down-up-down", vec![down, up, down]),
        RegimeSequence::new("up-down-down", vec![up, down, down]),
        RegimeSequence::new("down-down-down", vec![down, down, down]),
    ]
}

/// Stock only, half and half, inverse only
#[must_use]
pub fn preset_weight_patterns() -> Vec<WeightPattern> {
    vec![
        WeightPattern::new("stock only", vec![0.0, 10.0, 0.0]),
        WeightPattern::new("half and half", vec![0.0, 5.0, 5.0]),
        WeightPattern::new("inverse only", vec![0.0, 0.0, 10.0]),
    ]
}

/// Everything one invocation runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default = "preset_regimes")]
    pub regimes: Vec<RegimeSequence>,
    #[serde(default = "preset_weight_patterns")]
    pub weight_patterns: Vec<WeightPattern>,
}

impl Default for ScenarioFile {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            regimes: preset_regimes(),
            weight_patterns: preset_weight_patterns(),
        }
    }
}

impl ScenarioFile {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    /// Read and parse a scenario file
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre!("failed to read scenario file {}: {e}", path.display()))?;
        let scenario = Self::from_yaml(&content)
            .map_err(|e| eyre!("invalid scenario file {}: {e}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            regimes = scenario.regimes.len(),
            patterns = scenario.weight_patterns.len(),
            "scenario file loaded"
        );
        Ok(scenario)
    }

    /// Apply command-line overrides to the simulation config
    pub fn apply(&mut self, overrides: &Overrides) {
        let config = &mut self.simulation;
        if let Some(iterations) = overrides.iterations {
            config.iterations = iterations;
        }
        if let Some(income) = overrides.monthly_income {
            config.monthly_income = income;
        }
        if let Some(years) = overrides.years_per_period {
            config.period_length_days = years * DAYS_PER_YEAR;
        }
        if let Some(days) = overrides.rebalance_interval_days {
            config.rebalance_interval_days = days;
        }
        if let Some(mode) = overrides.rebalance_mode {
            config.rebalance_mode = mode;
        }
        if let Some(pct) = overrides.profit_taking_pct {
            config.profit_taking_pct = Some(pct);
        }
        if let Some(pct) = overrides.lump_sum_pct {
            config.lump_sum_pct = Some(pct);
        }
    }
}

/// Values given on the command line take precedence over the scenario file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub iterations: Option<usize>,
    pub monthly_income: Option<f64>,
    pub years_per_period: Option<usize>,
    pub rebalance_interval_days: Option<usize>,
    pub rebalance_mode: Option<RebalanceMode>,
    pub profit_taking_pct: Option<f64>,
    pub lump_sum_pct: Option<f64>,
}

/// Run every regime sequence under every weight pattern.
///
/// Each pattern is a separate batch seeded with the same master seed, so
/// patterns are compared over identical random draws.
pub fn run_scenarios(scenario: &ScenarioFile, seed: u64) -> color_eyre::Result<Vec<PatternReport>> {
    if scenario.regimes.is_empty() {
        bail!("scenario has no regime sequences");
    }
    if scenario.weight_patterns.is_empty() {
        bail!("scenario has no weight patterns");
    }

    let asset_count = scenario.simulation.assets.len();
    let mut reports = Vec::with_capacity(scenario.weight_patterns.len());

    for pattern in &scenario.weight_patterns {
        if pattern.weights.len() != asset_count {
            bail!(
                "weight pattern {:?} has {} weights but there are {} assets",
                pattern.label,
                pattern.weights.len(),
                asset_count
            );
        }

        let config = scenario.simulation.with_weights(&pattern.weights);
        let simulator = Simulator::new(config)
            .map_err(|e| eyre!("weight pattern {:?}: {e}", pattern.label))?;

        tracing::info!(pattern = %pattern.label, weights = %pattern.weights_label(), "running pattern");
        let batch = RunAggregator::new(&simulator, seed).run_batch(&scenario.regimes)?;

        reports.push(PatternReport {
            pattern: pattern.label.clone(),
            weights: pattern.weights.clone(),
            batch,
        });
    }
    Ok(reports)
}
