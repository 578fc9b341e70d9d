//! Per-asset positions and their daily evolution
//!
//! `AssetState` holds the mutable side of one portfolio slot: price, holdings,
//! cost basis and the cumulative trade flows. `Portfolio` owns one state per
//! slot (cash at index 0) and exposes the daily price update as a by-value
//! transformation so a day can be tested in isolation.

use std::ops::{Index, IndexMut};

use crate::model::{AssetIndex, AssetOutcome, CASH, INITIAL_PRICE};

/// Proceeds of closing a whole position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Liquidation {
    pub proceeds: f64,
    pub cost_basis: f64,
    pub units: f64,
}

impl Liquidation {
    #[must_use]
    pub fn gain(&self) -> f64 {
        self.proceeds - self.cost_basis
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetState {
    pub price: f64,
    pub market_value: f64,
    pub cost_basis: f64,
    pub unit_count: f64,
    /// One price per simulated day, appended by `advance_day`
    pub price_log: Vec<f64>,
    pub bought_value: f64,
    pub bought_units: f64,
    pub sold_value: f64,
    pub sold_units: f64,
    /// Reference price for profit-taking; unset until the first purchase
    pub first_buy_price: Option<f64>,
    /// Reference price for lump-sum buys
    pub last_lump_sum_price: f64,
}

impl AssetState {
    /// A zeroed position at the initial price, with room for `horizon_days` log entries
    #[must_use]
    pub fn new(horizon_days: usize) -> Self {
        Self {
            price: INITIAL_PRICE,
            market_value: 0.0,
            cost_basis: 0.0,
            unit_count: 0.0,
            price_log: Vec::with_capacity(horizon_days),
            bought_value: 0.0,
            bought_units: 0.0,
            sold_value: 0.0,
            sold_units: 0.0,
            first_buy_price: None,
            last_lump_sum_price: INITIAL_PRICE,
        }
    }

    /// Apply one day's multiplicative return to price and holdings
    pub fn advance_day(&mut self, rate: f64) {
        self.price *= rate;
        self.market_value *= rate;
        self.price_log.push(self.price);
    }

    #[must_use]
    pub fn has_position(&self) -> bool {
        self.unit_count > 0.0 && self.market_value > 0.0
    }

    fn units_for(&self, amount: f64) -> f64 {
        if self.price > 0.0 {
            amount / self.price
        } else {
            0.0
        }
    }

    /// Buy `amount` worth at the current price; returns the units acquired
    pub fn buy(&mut self, amount: f64) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let units = self.units_for(amount);
        self.market_value += amount;
        self.cost_basis += amount;
        self.unit_count += units;
        self.bought_value += amount;
        self.bought_units += units;
        if self.first_buy_price.is_none() {
            self.first_buy_price = Some(self.price);
        }
        units
    }

    /// Sell `amount` worth at the current price; returns the units disposed.
    ///
    /// Cost basis is reduced by the average cost of the units sold.
    pub fn sell(&mut self, amount: f64) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let units = self.units_for(amount);
        if self.unit_count > 0.0 {
            let fraction = (units / self.unit_count).min(1.0);
            self.cost_basis -= self.cost_basis * fraction;
        }
        self.market_value -= amount;
        self.unit_count -= units;
        self.sold_value += amount;
        self.sold_units += units;
        units
    }

    /// Trade until the position is worth exactly `target`; returns the signed diff
    pub fn trade_to(&mut self, target: f64) -> f64 {
        let diff = target - self.market_value;
        if diff > 0.0 {
            self.buy(diff);
        } else if diff < 0.0 {
            self.sell(-diff);
        }
        self.market_value = target;
        diff
    }

    /// Credit money without recording a trade (cash receiving sale proceeds)
    pub fn deposit(&mut self, amount: f64) {
        self.market_value += amount;
        self.cost_basis += amount;
        self.unit_count += self.units_for(amount);
    }

    /// Take out the whole balance without recording a trade; returns the amount
    pub fn withdraw_all(&mut self) -> f64 {
        let amount = self.market_value;
        self.market_value = 0.0;
        self.cost_basis = 0.0;
        self.unit_count = 0.0;
        amount
    }

    /// Sell the entire position, leaving value, cost and units at zero
    pub fn liquidate(&mut self) -> Liquidation {
        let liquidation = Liquidation {
            proceeds: self.market_value,
            cost_basis: self.cost_basis,
            units: self.unit_count,
        };
        self.sold_value += liquidation.proceeds;
        self.sold_units += liquidation.units;
        self.market_value = 0.0;
        self.cost_basis = 0.0;
        self.unit_count = 0.0;
        liquidation
    }

    #[must_use]
    pub fn outcome(&self) -> AssetOutcome {
        AssetOutcome {
            end_price: self.price,
            end_value: self.market_value,
            bought_value: self.bought_value,
            bought_units: self.bought_units,
            sold_value: self.sold_value,
            sold_units: self.sold_units,
        }
    }
}

/// All positions of one simulated lifetime, cash at index 0
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    assets: Vec<AssetState>,
}

impl Portfolio {
    /// Fresh, zeroed state for `num_assets` slots
    #[must_use]
    pub fn new(num_assets: usize, horizon_days: usize) -> Self {
        Self {
            assets: (0..num_assets).map(|_| AssetState::new(horizon_days)).collect(),
        }
    }

    /// Advance every asset by its daily rate, then pin cash back to 1.0.
    ///
    /// `rates` is indexed like the portfolio.
    #[must_use]
    pub fn advance_day(mut self, rates: &[f64]) -> Self {
        debug_assert_eq!(rates.len(), self.assets.len());
        for (asset, rate) in self.assets.iter_mut().zip(rates) {
            asset.advance_day(*rate);
        }
        self.pin_cash();
        self
    }

    fn pin_cash(&mut self) {
        let Some(cash) = self.assets.first_mut() else {
            return;
        };
        cash.price = INITIAL_PRICE;
        cash.market_value = cash.unit_count;
        if let Some(last) = cash.price_log.last_mut() {
            *last = INITIAL_PRICE;
        }
    }

    #[must_use]
    pub fn assets(&self) -> &[AssetState] {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut [AssetState] {
        &mut self.assets
    }

    #[must_use]
    pub fn cash(&self) -> &AssetState {
        &self[CASH]
    }

    pub fn cash_mut(&mut self) -> &mut AssetState {
        &mut self[CASH]
    }

    /// Indices of every non-cash slot, ascending
    pub fn risk_indices(&self) -> impl Iterator<Item = AssetIndex> + use<> {
        (1..self.assets.len()).map(AssetIndex)
    }

    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.assets.iter().map(|a| a.market_value).sum()
    }

    #[must_use]
    pub fn outcomes(&self) -> Vec<AssetOutcome> {
        self.assets.iter().map(AssetState::outcome).collect()
    }
}

impl Index<AssetIndex> for Portfolio {
    type Output = AssetState;

    fn index(&self, index: AssetIndex) -> &Self::Output {
        &self.assets[index.0]
    }
}

impl IndexMut<AssetIndex> for Portfolio {
    fn index_mut(&mut self, index: AssetIndex) -> &mut Self::Output {
        &mut self.assets[index.0]
    }
}
