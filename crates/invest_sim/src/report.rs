//! Rendering batch results as a text table or JSON

use std::fmt;

use invest_sim_core::config::{DAYS_PER_YEAR, SimulationConfig};
use invest_sim_core::model::{AssetIndex, BatchResult, RunSummary};
use invest_sim_core::strategy::RebalanceMode;
use serde::Serialize;

/// Results of one weight pattern across every regime sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternReport {
    pub pattern: String,
    pub weights: Vec<f64>,
    pub batch: BatchResult,
}

/// Everything one invocation produced
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub seed: u64,
    pub config: SimulationConfig,
    pub patterns: Vec<PatternReport>,
}

impl Report {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Borrow as a `Display`-able text table
    #[must_use]
    pub fn text(&self) -> TextReport<'_> {
        TextReport(self)
    }
}

pub struct TextReport<'a>(&'a Report);

fn rebalance_label(config: &SimulationConfig) -> String {
    match config.rebalance_mode {
        RebalanceMode::Off => "no rebalancing".to_string(),
        RebalanceMode::Proportional => {
            format!("rebalance every {} days", config.rebalance_interval_days)
        }
        RebalanceMode::NonLiquidating => "non-liquidating rebalancing".to_string(),
    }
}

fn signed_pct(pct: Option<f64>) -> String {
    match pct {
        Some(p) => format!("{p:+.0}%"),
        None => "n/a".to_string(),
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, weights: &str, run: &RunSummary) -> fmt::Result {
    let growth = run
        .growth_pcts()
        .into_iter()
        .skip(1)
        .map(|pct| signed_pct(Some(pct)))
        .collect::<Vec<_>>()
        .join("/");
    let correlation = run
        .average_correlation()
        .map_or_else(|| "-".to_string(), |c| format!("{c:+.2}"));
    writeln!(
        f,
        "{:<16} {:<10} {:>12.0} {:>7} {:>10.2} {:>6}  {}",
        run.label,
        weights,
        run.average_ending_value(),
        signed_pct(run.yield_pct()),
        run.average_tax_paid(),
        correlation,
        growth
    )
}

fn price_label(price: Option<f64>) -> String {
    price.map_or_else(|| "-".to_string(), |p| format!("{p:.3}"))
}

/// Average units traded per lifetime and their average realized price
fn write_trades(f: &mut fmt::Formatter<'_>, run: &RunSummary) -> fmt::Result {
    for (i, totals) in run.assets.iter().enumerate().skip(1) {
        let asset = AssetIndex(i);
        writeln!(
            f,
            "  {:<14} bought {:>12.2} units at {:>7}, sold {:>12.2} units at {:>7}",
            totals.label,
            run.average_bought_units(asset).unwrap_or(0.0),
            price_label(run.average_buy_price(asset)),
            run.average_sold_units(asset).unwrap_or(0.0),
            price_label(run.average_sell_price(asset)),
        )?;
    }
    Ok(())
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let config = &report.config;
        let years = config.horizon_days() as f64 / DAYS_PER_YEAR as f64;
        writeln!(
            f,
            "Monthly income {}, {years} years, {}, {} iterations (seed {})",
            config.monthly_income,
            rebalance_label(config),
            config.iterations,
            report.seed
        )?;
        if let Some(pct) = config.profit_taking_pct {
            writeln!(f, "Profit taking above {pct}% (tax {}%)", config.capital_gains_rate * 100.0)?;
        }
        if let Some(pct) = config.lump_sum_pct {
            writeln!(f, "Lump-sum buying at {pct}%")?;
        }

        let risk_labels = config
            .assets
            .iter()
            .skip(1)
            .map(|a| a.label.as_str())
            .collect::<Vec<_>>()
            .join("/");

        for pattern in &report.patterns {
            writeln!(f)?;
            writeln!(
                f,
                "{:<16} {:<10} {:>12} {:>7} {:>10} {:>6}  growth {}",
                "sequence", "weights", "avg total", "yield", "avg tax", "corr", risk_labels
            )?;
            let weights = pattern
                .weights
                .iter()
                .map(|w| format!("{w}"))
                .collect::<Vec<_>>()
                .join("/");
            for run in &pattern.batch.runs {
                write_row(f, &weights, run)?;
            }
            write_row(f, &weights, pattern.batch.pooled.summary())?;
            write_trades(f, pattern.batch.pooled.summary())?;

            let skipped = pattern.batch.pooled.summary().skipped_rebalances;
            if skipped > 0 {
                writeln!(f, "{skipped} rebalances skipped for lack of cash")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::{ScenarioFile, WeightPattern, run_scenarios};
    use invest_sim_core::model::{AssetSpec, RegimeSequence};

    fn small_report() -> Report {
        let mut scenario = ScenarioFile::default();
        scenario.simulation.iterations = 10;
        scenario.simulation.period_length_days = 90;
        scenario.simulation.periods = 1;
        scenario.simulation.assets = vec![
            AssetSpec::cash("Cash"),
            AssetSpec::risk("Stock", 6.0, 6.0),
            AssetSpec::risk("Inverse", 6.0, -6.0),
        ];
        scenario.regimes = vec![
            RegimeSequence::constant("up", 0.0024, 1),
            RegimeSequence::constant("down", -0.0024, 1),
        ];
        scenario.weight_patterns = vec![WeightPattern::new("half and half", vec![0.0, 5.0, 5.0])];
        let patterns = run_scenarios(&scenario, 3).unwrap();
        Report {
            seed: 3,
            config: scenario.simulation,
            patterns,
        }
    }

    #[test]
    fn test_text_has_one_row_per_sequence_plus_pool() {
        let text = small_report().text().to_string();
        assert!(text.starts_with("Monthly income 25, 0.25 years, rebalance every 360 days, 10 iterations (seed 3)"));
        assert!(text.contains("growth Stock/Inverse"));
        let rows: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("up ") || l.starts_with("down ") || l.starts_with("All sequences"))
            .collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.contains("0/5/5")));
    }

    #[test]
    fn test_json_round_trips_through_value() {
        let report = small_report();
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["seed"], 3);
        assert_eq!(value["patterns"][0]["pattern"], "half and half");
        assert_eq!(value["patterns"][0]["batch"]["runs"].as_array().unwrap().len(), 2);
        assert_eq!(value["patterns"][0]["batch"]["pooled"]["sequences"], 2);
        assert_eq!(value["patterns"][0]["batch"]["pooled"]["summary"]["iterations"], 20);
    }

    #[test]
    fn test_text_lists_average_trades_per_risk_asset() {
        let report = small_report();
        let text = report.text().to_string();
        let pooled = report.patterns[0].batch.pooled.summary();

        let stock_line = text
            .lines()
            .find(|l| l.trim_start().starts_with("Stock"))
            .unwrap();
        let bought = pooled.average_bought_units(AssetIndex(1)).unwrap();
        assert!(bought > 0.0);
        assert!(stock_line.contains(&format!("bought {bought:>12.2} units")));
        assert!(stock_line.contains(&price_label(pooled.average_buy_price(AssetIndex(1)))));
        assert!(text.lines().any(|l| l.trim_start().starts_with("Inverse")));
        assert!(!text.lines().any(|l| l.trim_start().starts_with("Cash")));
    }

    #[test]
    fn test_price_placeholder_without_trades() {
        assert_eq!(price_label(None), "-");
        assert_eq!(price_label(Some(1.23456)), "1.235");
    }

    #[test]
    fn test_percentages_are_signed() {
        assert_eq!(signed_pct(Some(12.0)), "+12%");
        assert_eq!(signed_pct(Some(-3.0)), "-3%");
        assert_eq!(signed_pct(None), "n/a");
    }
}
