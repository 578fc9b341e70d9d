//! Positional identifiers for portfolio slots

use serde::{Deserialize, Serialize};

/// Position of an asset within the portfolio.
///
/// Index 0 is always the cash asset once a config has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetIndex(pub usize);

/// Slot reserved for the risk-free cash asset
pub const CASH: AssetIndex = AssetIndex(0);

impl AssetIndex {
    #[must_use]
    pub fn is_cash(self) -> bool {
        self == CASH
    }
}
