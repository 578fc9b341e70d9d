//! Monte Carlo simulator for periodically funded portfolios
//!
//! This crate estimates the long-run outcome of a portfolio that receives a
//! fixed monthly income while its assets follow stochastic, regime-correlated
//! daily returns. It supports:
//! - Smoothed uniform daily returns tied to a macro-regime bias
//! - A risk-free cash asset plus any number of risk assets
//! - Proportional (liquidating) and non-liquidating rebalancing
//! - Threshold profit-taking with a flat capital-gains tax
//! - Threshold lump-sum reinvestment of idle cash
//! - Per-sequence and pooled summaries with average price correlation
//!
//! ```ignore
//! use invest_sim_core::aggregate::RunAggregator;
//! use invest_sim_core::config::SimulationBuilder;
//! use invest_sim_core::model::{AssetSpec, RegimeSequence};
//!
//! let simulator = SimulationBuilder::new()
//!     .iterations(1_000)
//!     .years_per_period(5)
//!     .periods(3)
//!     .rebalance_every(360)
//!     .asset(AssetSpec::cash("Cash"))
//!     .asset(AssetSpec::risk("Stock", 6.0, 6.0).weight(10.0))
//!     .simulator()?;
//!
//! let regimes = vec![
//!     RegimeSequence::new("up-up-up", vec![0.0024; 3]),
//!     RegimeSequence::new("down-down-down", vec![-0.0024; 3]),
//! ];
//! let batch = RunAggregator::new(&simulator, 42).run_batch(&regimes)?;
//! println!("{:.0}", batch.pooled.summary().average_ending_value());
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod aggregate;
pub mod error;
pub mod ledger;
pub mod returns;
pub mod scenario;
pub mod stats;
pub mod strategy;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use aggregate::RunAggregator;
pub use config::{SimulationBuilder, SimulationConfig};
pub use error::{ConfigError, SimError, StatsError};
pub use scenario::Simulator;
