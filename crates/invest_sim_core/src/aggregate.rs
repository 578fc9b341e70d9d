//! Monte Carlo aggregation across iterations and regime sequences
//!
//! Each regime sequence gets `iterations` independent lifetimes, each from its
//! own seed. Iterations are grouped into fixed-size chunks with their own
//! seeded RNG so the result does not depend on how chunks are scheduled; with
//! the `parallel` feature the chunks run on rayon's pool. Partial summaries are
//! merged in chunk order.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

use crate::error::Result;
use crate::model::{BatchResult, PooledSummary, RegimeSequence, RunSummary};
use crate::scenario::Simulator;

const MAX_CHUNK_SIZE: usize = 100;

/// Label of the pooled row of a batch
pub const POOLED_LABEL: &str = "All sequences";

/// Draw `count` seeds from a master seed
#[must_use]
pub fn derive_seeds(master: u64, count: usize) -> Vec<u64> {
    let mut rng = SmallRng::seed_from_u64(master);
    (0..count).map(|_| rng.next_u64()).collect()
}

/// Runs batches of regime sequences through one `Simulator`.
///
/// Holds no accumulated state: every call starts from fresh summaries.
#[derive(Debug, Clone, Copy)]
pub struct RunAggregator<'a> {
    simulator: &'a Simulator,
    seed: u64,
}

impl<'a> RunAggregator<'a> {
    #[must_use]
    pub fn new(simulator: &'a Simulator, seed: u64) -> Self {
        Self { simulator, seed }
    }

    fn empty_summary(&self, label: &str) -> RunSummary {
        RunSummary::new(label, &self.simulator.config().asset_labels())
    }

    fn run_chunk(&self, regime: &RegimeSequence, chunk_seed: u64, size: usize) -> Result<RunSummary> {
        let mut rng = SmallRng::seed_from_u64(chunk_seed);
        let mut summary = self.empty_summary(&regime.label);
        for _ in 0..size {
            let result = self.simulator.run_iteration(regime, rng.next_u64())?;
            summary.record(&result);
        }
        Ok(summary)
    }

    /// Run every iteration for one regime sequence from `seed`
    pub fn run_sequence_with_seed(&self, regime: &RegimeSequence, seed: u64) -> Result<RunSummary> {
        self.simulator.config().validate_regime(regime)?;

        let iterations = self.simulator.config().iterations;
        let num_chunks = iterations.div_ceil(MAX_CHUNK_SIZE);
        let chunk_size = |i: usize| {
            if i == num_chunks - 1 {
                iterations - i * MAX_CHUNK_SIZE
            } else {
                MAX_CHUNK_SIZE
            }
        };
        let chunk_seeds = derive_seeds(seed, num_chunks);

        #[cfg(feature = "parallel")]
        let partials = chunk_seeds
            .into_par_iter()
            .enumerate()
            .map(|(i, chunk_seed)| self.run_chunk(regime, chunk_seed, chunk_size(i)))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(not(feature = "parallel"))]
        let partials = chunk_seeds
            .into_iter()
            .enumerate()
            .map(|(i, chunk_seed)| self.run_chunk(regime, chunk_seed, chunk_size(i)))
            .collect::<Result<Vec<_>>>()?;

        let summary = partials
            .iter()
            .fold(self.empty_summary(&regime.label), |acc, partial| {
                acc.merged(partial)
            });

        tracing::info!(
            sequence = %regime.label,
            iterations = summary.iterations,
            average_ending_value = summary.average_ending_value(),
            "regime sequence complete"
        );
        Ok(summary)
    }

    /// Run one regime sequence on its own, seeded by the aggregator's seed
    pub fn run_sequence(&self, regime: &RegimeSequence) -> Result<RunSummary> {
        self.run_sequence_with_seed(regime, self.seed)
    }

    /// Run every sequence of a batch independently, then pool them.
    ///
    /// All sequences are validated before the first iteration runs.
    pub fn run_batch(&self, regimes: &[RegimeSequence]) -> Result<BatchResult> {
        for regime in regimes {
            self.simulator.config().validate_regime(regime)?;
        }

        let seeds = derive_seeds(self.seed, regimes.len());
        let mut pooled =
            PooledSummary::new(POOLED_LABEL, &self.simulator.config().asset_labels());
        let mut runs = Vec::with_capacity(regimes.len());

        for (regime, seed) in regimes.iter().zip(seeds) {
            let run = self.run_sequence_with_seed(regime, seed)?;
            pooled.absorb(&run);
            runs.push(run);
        }

        Ok(BatchResult { runs, pooled })
    }
}
