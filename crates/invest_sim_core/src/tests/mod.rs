//! Integration tests for the simulation engine
//!
//! Tests are organized by topic:
//! - `scenario` - Single-lifetime mechanics: day ordering, income, thresholds
//! - `aggregate` - Monte Carlo folding, pooling, correlation, determinism
//! - `properties` - Randomized invariants of the strategy mutators

mod properties;
