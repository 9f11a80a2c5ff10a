//! Shared data structures for the two-stage inspection pipeline
//!
//! - Stage 1: SamplePair (producer output, channel payload)
//! - Stage 2: Decision / Verdict (filter + threshold output)
//! - Run summary: PipelinePhase, ProducerExit, RunReport

mod sample;
mod decision;
mod report;

pub use sample::*;
pub use decision::*;
pub use report::*;
