use std::fmt;

use crate::model::AssetIndex;

/// Errors found while validating a simulation configuration.
///
/// These are fatal setup errors: they are reported before any iteration runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NoAssets,
    /// Asset index 0 must be the cash asset
    MissingCashAsset,
    /// Cash appears somewhere other than index 0
    MisplacedCashAsset(AssetIndex),
    /// Cash must have zero volatility and zero regime sensitivity
    VolatileCash {
        volatility: f64,
        sensitivity: f64,
    },
    DuplicateLabel(String),
    InvalidWeight {
        asset: AssetIndex,
        weight: f64,
    },
    ZeroWeightSum,
    InvalidVolatility {
        asset: AssetIndex,
        volatility: f64,
    },
    InvalidSensitivity {
        asset: AssetIndex,
        sensitivity: f64,
    },
    ZeroIterations,
    ZeroPeriodLength,
    ZeroPeriods,
    ZeroRebalanceInterval,
    InvalidIncome(f64),
    InvalidProfitTakingThreshold(f64),
    /// Lump-sum thresholds express a drawdown and must not be positive
    InvalidLumpSumThreshold(f64),
    InvalidCapitalGainsRate(f64),
    InvalidCashDrawLimit(f64),
    InvalidCorrelationPair([AssetIndex; 2]),
    RegimeLength {
        label: String,
        expected: usize,
        actual: usize,
    },
    InvalidRegimeBias {
        label: String,
        bias: f64,
    },
    /// Volatility plus `bias × sensitivity` could wipe out an asset in one day
    RegimeOutOfRange {
        label: String,
        asset: AssetIndex,
        bias: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoAssets => write!(f, "no assets configured"),
            ConfigError::MissingCashAsset => {
                write!(f, "asset at index 0 must be the cash asset")
            }
            ConfigError::MisplacedCashAsset(idx) => {
                write!(f, "cash asset found at index {}, only index 0 may hold cash", idx.0)
            }
            ConfigError::VolatileCash {
                volatility,
                sensitivity,
            } => write!(
                f,
                "cash asset must have zero volatility and sensitivity (volatility={volatility}, sensitivity={sensitivity})"
            ),
            ConfigError::DuplicateLabel(label) => write!(f, "duplicate asset label {label:?}"),
            ConfigError::InvalidWeight { asset, weight } => {
                write!(f, "invalid target weight {weight} for asset {}", asset.0)
            }
            ConfigError::ZeroWeightSum => write!(f, "target weights sum to zero"),
            ConfigError::InvalidVolatility { asset, volatility } => {
                write!(f, "invalid daily volatility {volatility} for asset {}", asset.0)
            }
            ConfigError::InvalidSensitivity { asset, sensitivity } => {
                write!(f, "invalid regime sensitivity {sensitivity} for asset {}", asset.0)
            }
            ConfigError::ZeroIterations => write!(f, "iteration count must be at least 1"),
            ConfigError::ZeroPeriodLength => write!(f, "period length must be at least 1 day"),
            ConfigError::ZeroPeriods => write!(f, "number of periods must be at least 1"),
            ConfigError::ZeroRebalanceInterval => {
                write!(f, "rebalance interval must be at least 1 day")
            }
            ConfigError::InvalidIncome(income) => write!(f, "invalid monthly income {income}"),
            ConfigError::InvalidProfitTakingThreshold(pct) => {
                write!(f, "invalid profit-taking threshold {pct}%")
            }
            ConfigError::InvalidLumpSumThreshold(pct) => {
                write!(f, "lump-sum threshold must be zero or negative, got {pct}%")
            }
            ConfigError::InvalidCapitalGainsRate(rate) => {
                write!(f, "capital gains rate must lie in [0, 1], got {rate}")
            }
            ConfigError::InvalidCashDrawLimit(limit) => {
                write!(f, "invalid cash draw limit {limit}")
            }
            ConfigError::InvalidCorrelationPair([a, b]) => write!(
                f,
                "correlation pair ({}, {}) must name two distinct risk assets",
                a.0, b.0
            ),
            ConfigError::RegimeLength {
                label,
                expected,
                actual,
            } => write!(
                f,
                "regime sequence {label:?} has {actual} periods, expected {expected}"
            ),
            ConfigError::InvalidRegimeBias { label, bias } => {
                write!(f, "regime sequence {label:?} contains invalid bias {bias}")
            }
            ConfigError::RegimeOutOfRange { label, asset, bias } => write!(
                f,
                "bias {bias} in regime sequence {label:?} can move asset {} by 100% or more in a day",
                asset.0
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors raised by the statistics helpers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    LengthMismatch { left: usize, right: usize },
    InsufficientData(usize),
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsError::LengthMismatch { left, right } => {
                write!(f, "sequences have different lengths ({left} vs {right})")
            }
            StatsError::InsufficientData(n) => {
                write!(f, "need at least 2 samples, got {n}")
            }
        }
    }
}

impl std::error::Error for StatsError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    Config(ConfigError),
    Stats(StatsError),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Config(e) => write!(f, "configuration error: {e}"),
            SimError::Stats(e) => write!(f, "statistics error: {e}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Config(e) => Some(e),
            SimError::Stats(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(err: ConfigError) -> Self {
        SimError::Config(err)
    }
}

impl From<StatsError> for SimError {
    fn from(err: StatsError) -> Self {
        SimError::Stats(err)
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
