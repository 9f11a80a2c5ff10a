//! Sample acquisition module
//!
//! Provides a unified trait for pulling sample pairs from different sources:
//! uniform random generation, a comma-separated table file, and in-memory
//! replay.

mod random_source;
mod replay_source;
mod table_source;

pub use random_source::RandomSource;
pub use replay_source::ReplaySource;
pub use table_source::{TableSource, TableStats};

use crate::types::SamplePair;
use std::path::PathBuf;
use thiserror::Error;

/// Events produced by a sample source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    /// A complete pair was read.
    Pair(SamplePair),
    /// No more samples will be produced.
    Exhausted,
}

/// Source errors. The producer treats every one of them as exhaustion.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source unavailable ({}): {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Read error at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Trait abstracting where sample pairs come from.
///
/// Called once per producer cycle, from the producer thread only.
pub trait SampleSource: Send {
    /// Read the next pair.
    ///
    /// Returns `SourceEvent::Exhausted` when no more data is available and
    /// `Err` on unrecoverable failures.
    fn next_pair(&mut self) -> Result<SourceEvent, SourceError>;

    /// Human-readable name for logging (e.g. "random", "table").
    fn source_name(&self) -> &str;

    /// Release any held resource. Called once by the producer before it exits.
    fn close(&mut self) {}
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_pair(&mut self) -> Result<SourceEvent, SourceError> {
        (**self).next_pair()
    }

    fn source_name(&self) -> &str {
        (**self).source_name()
    }

    fn close(&mut self) {
        (**self).close();
    }
}
