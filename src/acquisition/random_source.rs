//! Uniform random sample source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{SampleSource, SourceError, SourceEvent};
use crate::types::SamplePair;

/// Uniformly distributed random byte pairs.
///
/// Unbounded unless a pair limit is set. A seed makes the sequence
/// reproducible; without one the generator is seeded from OS entropy.
pub struct RandomSource {
    rng: StdRng,
    limit: Option<u64>,
    produced: u64,
}

impl RandomSource {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            limit: None,
            produced: 0,
        }
    }

    /// Stop after `limit` pairs.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }
}

impl SampleSource for RandomSource {
    fn next_pair(&mut self) -> Result<SourceEvent, SourceError> {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            debug!(pairs = self.produced, "Random source reached its pair limit");
            return Ok(SourceEvent::Exhausted);
        }
        self.produced += 1;
        Ok(SourceEvent::Pair(SamplePair::new(self.rng.gen(), self.rng.gen())))
    }

    fn source_name(&self) -> &str {
        "random"
    }
}
