//! Macro-regime bias sequences

use serde::{Deserialize, Serialize};

/// An ordered series of macro-regime biases, one per period.
///
/// One simulated lifetime consumes the whole sequence, each bias holding for
/// `period_length_days` days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSequence {
    pub label: String,
    pub biases: Vec<f64>,
}

impl RegimeSequence {
    #[must_use]
    pub fn new(label: impl Into<String>, biases: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            biases,
        }
    }

    /// A sequence holding the same bias for `periods` periods
    #[must_use]
    pub fn constant(label: impl Into<String>, bias: f64, periods: usize) -> Self {
        Self::new(label, vec![bias; periods])
    }

    #[must_use]
    pub fn periods(&self) -> usize {
        self.biases.len()
    }
}
