//! Stochastic daily returns
//!
//! A daily return is the average of several uniform draws from
//! `[-volatility, +volatility]` plus a systematic term `bias × sensitivity`
//! that ties the asset to the macro regime. Averaging more draws narrows the
//! spread towards a bounded, near-normal shape.

use rand::Rng;
use rand::distr::{Distribution, Uniform};

use crate::error::ConfigError;
use crate::model::{AssetIndex, AssetSpec};

/// Daily swing, in percent, at which a single draw could wipe out an asset
pub const MAX_DAILY_VOLATILITY: f64 = 100.0;

/// One-shot form of the generator for callers without a prebuilt `ReturnGenerator`.
/// A non-positive volatility contributes no noise.
///
/// Returns a percentage, e.g. `-1.5` for a 1.5% drop.
pub fn daily_return<R: Rng + ?Sized>(
    rng: &mut R,
    volatility: f64,
    regime_bias: f64,
    regime_sensitivity: f64,
    smoothing_trials: u32,
) -> f64 {
    let trials = smoothing_trials.max(1);
    let noise = if volatility > 0.0 {
        let mut sum = 0.0;
        for _ in 0..trials {
            sum += rng.random_range(-volatility..=volatility);
        }
        sum / f64::from(trials)
    } else {
        0.0
    };
    noise + regime_bias * regime_sensitivity
}

/// Convert a percentage return into a multiplicative daily rate
#[must_use]
#[inline]
pub fn rate_from_pct(pct: f64) -> f64 {
    pct / 100.0 + 1.0
}

/// Per-asset return source with its uniform distribution built once
#[derive(Debug, Clone)]
pub struct ReturnGenerator {
    noise: Option<Uniform<f64>>,
    sensitivity: f64,
    trials: u32,
}

impl ReturnGenerator {
    pub fn new(volatility: f64, sensitivity: f64, trials: u32) -> Result<Self, ConfigError> {
        Self::for_asset(AssetIndex(0), volatility, sensitivity, trials)
    }

    pub fn from_spec(index: AssetIndex, spec: &AssetSpec) -> Result<Self, ConfigError> {
        Self::for_asset(
            index,
            spec.daily_volatility,
            spec.regime_sensitivity,
            spec.smoothing_trials,
        )
    }

    fn for_asset(
        asset: AssetIndex,
        volatility: f64,
        sensitivity: f64,
        trials: u32,
    ) -> Result<Self, ConfigError> {
        if !(0.0..MAX_DAILY_VOLATILITY).contains(&volatility) {
            return Err(ConfigError::InvalidVolatility { asset, volatility });
        }
        if !sensitivity.is_finite() {
            return Err(ConfigError::InvalidSensitivity { asset, sensitivity });
        }
        let noise = if volatility > 0.0 {
            Some(
                Uniform::new_inclusive(-volatility, volatility)
                    .map_err(|_| ConfigError::InvalidVolatility { asset, volatility })?,
            )
        } else {
            None
        };
        Ok(Self {
            noise,
            sensitivity,
            trials: trials.max(1),
        })
    }

    /// A generator that always returns exactly zero (the cash asset)
    #[must_use]
    pub fn flat() -> Self {
        Self {
            noise: None,
            sensitivity: 0.0,
            trials: 1,
        }
    }

    #[must_use]
    pub fn trials(&self) -> u32 {
        self.trials
    }

    /// Draw one day's percentage return under the given regime bias
    pub fn sample_pct<R: Rng + ?Sized>(&self, rng: &mut R, regime_bias: f64) -> f64 {
        let noise = match &self.noise {
            Some(dist) => {
                let sum: f64 = (0..self.trials).map(|_| dist.sample(rng)).sum();
                sum / f64::from(self.trials)
            }
            None => 0.0,
        };
        noise + regime_bias * self.sensitivity
    }

    /// Draw one day's multiplicative rate (`pct / 100 + 1`)
    pub fn sample_rate<R: Rng + ?Sized>(&self, rng: &mut R, regime_bias: f64) -> f64 {
        rate_from_pct(self.sample_pct(rng, regime_bias))
    }
}
