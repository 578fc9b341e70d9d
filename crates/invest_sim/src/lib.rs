//! Command-line front end for the portfolio simulator
//!
//! Loads a scenario (a YAML file or the built-in presets), runs every weight
//! pattern over every regime sequence and renders the summaries.

pub mod logging;
pub mod report;
pub mod scenarios;

pub use logging::init_logging;
pub use report::{PatternReport, Report};
pub use scenarios::{Overrides, ScenarioFile, WeightPattern, run_scenarios};
