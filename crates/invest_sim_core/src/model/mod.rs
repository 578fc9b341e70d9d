mod asset;
mod ids;
mod regime;
mod results;

pub use asset::{AssetRole, AssetSpec};
pub use ids::{AssetIndex, CASH};
pub use regime::RegimeSequence;
pub use results::{
    AssetOutcome, AssetTotals, BatchResult, IterationResult, PooledSummary, RunSummary,
};

/// Every asset starts each iteration at this price
pub const INITIAL_PRICE: f64 = 1.0;

/// Monthly income is injected on every day divisible by this
pub const INCOME_INTERVAL_DAYS: usize = 30;
