//! Static asset definitions
//!
//! An `AssetSpec` describes how one portfolio slot behaves: how wildly its
//! price swings, how strongly it follows the macro regime, and what share of
//! the portfolio it should hold. Runtime state lives in `ledger::AssetState`.
//!
//! ```ignore
//! let assets = vec![
//!     AssetSpec::cash("Cash"),
//!     AssetSpec::risk("Stock", 6.0, 6.0).weight(5.0),
//!     AssetSpec::risk("Inverse", 6.0, -6.0).weight(5.0),
//! ];
//! ```

use serde::{Deserialize, Serialize};

fn default_trials() -> u32 {
    10
}

/// Whether a slot holds the risk-free cash asset or a priced risk asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetRole {
    Cash,
    #[default]
    Risk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub label: String,
    #[serde(default)]
    pub role: AssetRole,
    /// Maximum magnitude of a single uniform draw, in percent per day
    #[serde(default)]
    pub daily_volatility: f64,
    /// Coupling of daily drift to the regime bias; negative means inverse correlation
    #[serde(default)]
    pub regime_sensitivity: f64,
    /// Number of uniform draws averaged into one daily return
    #[serde(default = "default_trials")]
    pub smoothing_trials: u32,
    /// Target share in tenths by convention
    #[serde(default)]
    pub target_weight: f64,
}

impl AssetSpec {
    /// The risk-free cash asset: never moves, price pinned to 1.0
    #[must_use]
    pub fn cash(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            role: AssetRole::Cash,
            daily_volatility: 0.0,
            regime_sensitivity: 0.0,
            smoothing_trials: 1,
            target_weight: 0.0,
        }
    }

    #[must_use]
    pub fn risk(label: impl Into<String>, daily_volatility: f64, regime_sensitivity: f64) -> Self {
        Self {
            label: label.into(),
            role: AssetRole::Risk,
            daily_volatility,
            regime_sensitivity,
            smoothing_trials: default_trials(),
            target_weight: 0.0,
        }
    }

    #[must_use]
    pub fn weight(mut self, target_weight: f64) -> Self {
        self.target_weight = target_weight;
        self
    }

    #[must_use]
    pub fn trials(mut self, smoothing_trials: u32) -> Self {
        self.smoothing_trials = smoothing_trials;
        self
    }

    #[must_use]
    pub fn is_cash(&self) -> bool {
        self.role == AssetRole::Cash
    }
}
