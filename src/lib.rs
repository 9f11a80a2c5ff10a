//! Sample Inspector: two-stage streaming defect inspection
//!
//! A producer thread pulls byte pairs from a source (uniform random or a
//! comma-separated table) and hands them to a consumer thread, which runs
//! every sample through a 9-tap sliding-window filter and classifies the
//! window center against a threshold.
//!
//! ## Architecture
//!
//! - **Acquisition**: `SampleSource` implementations (random, table, replay)
//! - **Pipeline**: handoff channel, sliding-window filter, paced workers and
//!   the coordinator that owns the termination handshake
//! - **Config**: TOML configuration, validation and interactive prompts
//! - **Types**: sample pairs, decisions and the end-of-run report

pub mod acquisition;
pub mod config;
pub mod pipeline;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, ConsumerStrategy, InspectionConfig, OutputFormat, SourceMode};

// Re-export commonly used types
pub use types::{Decision, PipelinePhase, ProducerExit, RunReport, SamplePair, Verdict};

// Re-export sources
pub use acquisition::{RandomSource, ReplaySource, SampleSource, SourceError, SourceEvent, TableSource};

// Re-export pipeline components
pub use pipeline::{
    CollectingSink, DecisionSink, HandoffChannel, JsonLinesSink, LogSink, PipelineCoordinator,
    PipelineError, SlidingWindowFilter,
};
