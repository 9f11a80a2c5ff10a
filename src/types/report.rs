//! Run lifecycle and summary types: PipelinePhase, ProducerExit, PacingStats, RunReport

use serde::{Deserialize, Serialize};

// ============================================================================
// Pipeline Lifecycle
// ============================================================================

/// Coordinator state machine.
///
/// Transitions only move forward:
/// `Running -> ProducerDraining -> ConsumerDraining -> Stopped`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PipelinePhase {
    /// Producer and consumer both active against the channel
    #[default]
    Running,
    /// Producer joined and finished signal published; consumer emptying the channel
    ProducerDraining,
    /// Consumer joined; coordinator flushing the remaining full windows
    ConsumerDraining,
    /// Both workers joined, decisions emitted, residual reported
    Stopped,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Running => write!(f, "Running"),
            PipelinePhase::ProducerDraining => write!(f, "Producer Draining"),
            PipelinePhase::ConsumerDraining => write!(f, "Consumer Draining"),
            PipelinePhase::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Why the producer loop ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProducerExit {
    /// Source reported no more samples
    #[default]
    Exhausted,
    /// Source could not be opened or read; treated as exhaustion
    SourceFailed { reason: String },
    /// External stop request
    Cancelled,
}

impl std::fmt::Display for ProducerExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProducerExit::Exhausted => write!(f, "source exhausted"),
            ProducerExit::SourceFailed { reason } => write!(f, "source failed: {reason}"),
            ProducerExit::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Cycle accounting for one paced worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PacingStats {
    /// Completed cycles (including the final, stopping one)
    pub cycles: u64,
    /// Cycles whose unit of work alone took longer than the interval
    pub overruns: u64,
    /// Longest observed unit of work (ns)
    pub max_work_ns: u64,
}

/// Final summary returned by `PipelineCoordinator::run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub elapsed_secs: f64,
    pub final_phase: PipelinePhase,
    pub producer_exit: ProducerExit,
    pub pairs_produced: u64,
    pub pairs_consumed: u64,
    pub samples_ingested: u64,
    pub decisions_emitted: u64,
    pub defects: u64,
    /// Trailing samples that never gained a full window (0-8 bytes)
    pub residual: Vec<u8>,
    pub producer_pacing: PacingStats,
    pub consumer_pacing: PacingStats,
}

impl RunReport {
    /// Fraction of emitted decisions classified as defects.
    pub fn defect_rate(&self) -> f64 {
        if self.decisions_emitted == 0 {
            0.0
        } else {
            self.defects as f64 / self.decisions_emitted as f64
        }
    }
}
