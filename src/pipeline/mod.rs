//! Inspection Pipeline Module
//!
//! ## Two-Stage Architecture
//!
//! ```text
//! STAGE 1: Producer thread   source.next_pair() -> channel.push()      (paced, >= T)
//! STAGE 2: Consumer thread   channel.poll()     -> filter.ingest() x2  (paced, >= T)
//!          Coordinator       join producer -> publish finished -> join consumer
//!                            -> drain filter -> report residual
//! ```
//!
//! CRITICAL GUARANTEE: the finished signal is published only after the
//! producer thread has joined, so a consumer that sees it set and finds
//! the channel empty has seen every pair ever produced.

mod channel;
mod coordinator;
pub mod filter;
mod pacing;
mod signal;
pub mod sink;

pub use channel::HandoffChannel;
pub use coordinator::PipelineCoordinator;
pub use filter::{
    SlidingWindowFilter, CENTER_OFFSET, KERNEL, KERNEL_GAIN, MAX_FILTERED, WINDOW_SIZE,
};
pub use pacing::PacedWorker;
pub use signal::FinishedSignal;
pub use sink::{CollectingSink, DecisionSink, JsonLinesSink, LogSink};

use thiserror::Error;

/// Errors that stop a run before it reaches `Stopped` cleanly.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to spawn {worker} thread: {source}")]
    Spawn {
        worker: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{worker} thread panicked")]
    WorkerPanicked { worker: &'static str },
}
