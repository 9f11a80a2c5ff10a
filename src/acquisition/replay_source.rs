//! In-memory replay source.

use super::{SampleSource, SourceError, SourceEvent};
use crate::types::SamplePair;

/// Replays pre-loaded pairs in order, then reports exhaustion.
pub struct ReplaySource {
    pairs: std::vec::IntoIter<SamplePair>,
}

impl ReplaySource {
    pub fn new(pairs: Vec<SamplePair>) -> Self {
        Self {
            pairs: pairs.into_iter(),
        }
    }

    /// Pair up a flat sample sequence; an odd trailing sample is dropped.
    pub fn from_samples(samples: &[u8]) -> Self {
        Self::new(
            samples
                .chunks_exact(2)
                .map(|c| SamplePair::new(c[0], c[1]))
                .collect(),
        )
    }
}

impl SampleSource for ReplaySource {
    fn next_pair(&mut self) -> Result<SourceEvent, SourceError> {
        Ok(self
            .pairs
            .next()
            .map_or(SourceEvent::Exhausted, SourceEvent::Pair))
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}
