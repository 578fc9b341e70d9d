use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use invest_sim::{Overrides, Report, ScenarioFile, init_logging, run_scenarios};
use invest_sim_core::strategy::RebalanceMode;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RebalanceArg {
    Off,
    Proportional,
    NonLiquidating,
}

impl From<RebalanceArg> for RebalanceMode {
    fn from(arg: RebalanceArg) -> Self {
        match arg {
            RebalanceArg::Off => RebalanceMode::Off,
            RebalanceArg::Proportional => RebalanceMode::Proportional,
            RebalanceArg::NonLiquidating => RebalanceMode::NonLiquidating,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "invest_sim")]
#[command(about = "Monte Carlo simulator for a monthly funded portfolio")]
struct Args {
    /// Scenario file (YAML); the built-in presets are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lifetimes simulated per regime sequence
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    /// Income paid in every 30 days
    #[arg(long)]
    income: Option<f64>,

    /// Length of each regime period in 360-day years
    #[arg(long)]
    years: Option<usize>,

    /// Days between proportional rebalances
    #[arg(long)]
    rebalance_interval: Option<usize>,

    #[arg(long, value_enum)]
    rebalance_mode: Option<RebalanceArg>,

    /// Sell a position once it is this many percent above its first purchase price
    #[arg(long, allow_negative_numbers = true)]
    profit_take: Option<f64>,

    /// Move all cash into an asset once it falls this many percent (negative)
    #[arg(long, allow_negative_numbers = true)]
    lump_sum: Option<f64>,

    /// Master seed; drawn at random when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            iterations: self.iterations,
            monthly_income: self.income,
            years_per_period: self.years,
            rebalance_interval_days: self.rebalance_interval,
            rebalance_mode: self.rebalance_mode.map(RebalanceMode::from),
            profit_taking_pct: self.profit_take,
            lump_sum_pct: self.lump_sum,
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let _guard = init_logging(&args.log_level, args.log_file.as_deref())?;

    let mut scenario = match &args.config {
        Some(path) => ScenarioFile::load(path)?,
        None => ScenarioFile::default(),
    };
    scenario.apply(&args.overrides());

    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, iterations = scenario.simulation.iterations, "starting simulation");

    let patterns = run_scenarios(&scenario, seed)?;
    let report = Report {
        seed,
        config: scenario.simulation,
        patterns,
    };

    match args.format {
        OutputFormat::Text => print!("{}", report.text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    tracing::info!("simulation finished");
    Ok(())
}
