//! Pipeline Coordinator - producer/consumer lifecycle and termination handshake
//!
//! ```text
//! Running           producer + consumer threads active against the channel
//!   | join producer (source closed), publish finished, close channel
//! ProducerDraining  consumer empties the channel
//!   | join consumer (filter handed back)
//! ConsumerDraining  coordinator drains remaining full windows
//!   | report residual
//! Stopped
//! ```
//!
//! CRITICAL GUARANTEE: the finished signal is published strictly after the
//! producer thread has been joined. Publishing earlier would let the
//! consumer observe "finished + empty" while a final push is still pending.

use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    DecisionSink, FinishedSignal, HandoffChannel, PacedWorker, PipelineError, SlidingWindowFilter,
};
use crate::acquisition::{SampleSource, SourceEvent};
use crate::config::{ConsumerStrategy, InspectionConfig};
use crate::types::{PacingStats, PipelinePhase, ProducerExit, RunReport, SamplePair};

/// Owns the channel and the finished signal, runs both workers to completion.
pub struct PipelineCoordinator {
    threshold: f64,
    interval: Duration,
    strategy: ConsumerStrategy,
    progress_interval: u64,
    cancel: CancellationToken,
    channel: HandoffChannel<SamplePair>,
    finished: FinishedSignal,
}

struct ProducerOutcome {
    exit: ProducerExit,
    pairs: u64,
    pacing: PacingStats,
}

struct ConsumerOutcome {
    filter: SlidingWindowFilter,
    pairs: u64,
    pacing: PacingStats,
}

/// Everything the consumer thread borrows from the coordinator.
#[derive(Clone, Copy)]
struct ConsumerContext<'a> {
    channel: &'a HandoffChannel<SamplePair>,
    finished: &'a FinishedSignal,
    strategy: ConsumerStrategy,
    interval: Duration,
    progress_interval: u64,
}

impl PipelineCoordinator {
    /// `interval` is T, already clamped by config loading.
    pub fn new(threshold: f64, interval: Duration) -> Self {
        Self {
            threshold,
            interval,
            strategy: ConsumerStrategy::default(),
            progress_interval: 0,
            cancel: CancellationToken::new(),
            channel: HandoffChannel::new(),
            finished: FinishedSignal::new(),
        }
    }

    pub fn from_config(config: &InspectionConfig) -> Self {
        Self::new(config.pipeline.threshold_value, config.cycle_time())
            .with_consumer_strategy(config.pipeline.consumer)
            .with_progress_interval(config.output.progress_interval)
    }

    pub fn with_consumer_strategy(mut self, strategy: ConsumerStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Log a progress line every `pairs` consumed pairs (0 = never).
    pub fn with_progress_interval(mut self, pairs: u64) -> Self {
        self.progress_interval = pairs;
        self
    }

    /// Use an externally owned stop token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the producer at its next cycle.
    ///
    /// Cancelling does not skip the handshake: queued pairs are still
    /// consumed, the filter drained and the residual reported.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the pipeline until the source is exhausted, fails, or the run is
    /// cancelled. Blocks the calling thread, which acts as coordinator.
    pub fn run<S, K>(self, source: &mut S, sink: &mut K) -> Result<RunReport, PipelineError>
    where
        S: SampleSource,
        K: DecisionSink,
    {
        let started_at = chrono::Utc::now();
        let clock = Instant::now();
        let Self {
            threshold,
            interval,
            strategy,
            progress_interval,
            cancel,
            channel,
            finished,
        } = self;
        let mut phase = PipelinePhase::Running;

        info!(
            source = source.source_name(),
            threshold,
            interval_ns = interval.as_nanos() as u64,
            consumer = ?strategy,
            "🚀 Starting inspection pipeline"
        );

        let channel = &channel;
        let finished = &finished;
        let cancel = &cancel;
        let ctx = ConsumerContext {
            channel,
            finished,
            strategy,
            interval,
            progress_interval,
        };
        let filter = SlidingWindowFilter::new(threshold);
        let consumer_sink = &mut *sink;

        let (producer_result, consumer_result) = thread::scope(|scope| {
            let producer = thread::Builder::new()
                .name("producer".to_string())
                .spawn_scoped(scope, move || run_producer(source, channel, interval, cancel))
                .map_err(|source| PipelineError::Spawn {
                    worker: "producer",
                    source,
                })?;

            let consumer = match thread::Builder::new()
                .name("consumer".to_string())
                .spawn_scoped(scope, move || run_consumer(consumer_sink, filter, ctx))
            {
                Ok(handle) => handle,
                Err(source) => {
                    cancel.cancel();
                    let _ = producer.join();
                    return Err(PipelineError::Spawn {
                        worker: "consumer",
                        source,
                    });
                }
            };

            let producer_result = producer.join();
            finished.publish();
            channel.close();
            advance(&mut phase, PipelinePhase::ProducerDraining);

            let consumer_result = consumer.join();
            Ok((producer_result, consumer_result))
        })?;

        let producer = producer_result.map_err(|_| PipelineError::WorkerPanicked {
            worker: "producer",
        })?;
        let ConsumerOutcome {
            mut filter,
            pairs: pairs_consumed,
            pacing: consumer_pacing,
        } = consumer_result.map_err(|_| PipelineError::WorkerPanicked { worker: "consumer" })?;
        advance(&mut phase, PipelinePhase::ConsumerDraining);

        let drained = filter.drain();
        if !drained.is_empty() {
            debug!(count = drained.len(), "Drained remaining full windows");
        }
        for decision in &drained {
            sink.record(decision);
        }
        let residual = filter.residual();
        sink.finish(&residual);
        advance(&mut phase, PipelinePhase::Stopped);

        if pairs_consumed != producer.pairs {
            warn!(
                produced = producer.pairs,
                consumed = pairs_consumed,
                "Consumer stopped with pairs unaccounted for"
            );
        }

        let report = RunReport {
            started_at,
            elapsed_secs: clock.elapsed().as_secs_f64(),
            final_phase: phase,
            producer_exit: producer.exit,
            pairs_produced: producer.pairs,
            pairs_consumed,
            samples_ingested: filter.ingested(),
            decisions_emitted: filter.decisions_emitted(),
            defects: filter.defects(),
            residual,
            producer_pacing: producer.pacing,
            consumer_pacing,
        };
        log_report(&report);
        Ok(report)
    }
}

// ============================================================================
// Workers
// ============================================================================

fn run_producer<S: SampleSource>(
    source: &mut S,
    channel: &HandoffChannel<SamplePair>,
    interval: Duration,
    cancel: &CancellationToken,
) -> ProducerOutcome {
    let mut pacer = PacedWorker::new("producer", interval);
    let mut pairs: u64 = 0;
    info!(source = source.source_name(), "Producer started");

    let exit = pacer.run(|| {
        if cancel.is_cancelled() {
            return ControlFlow::Break(ProducerExit::Cancelled);
        }
        match source.next_pair() {
            Ok(SourceEvent::Pair(pair)) => {
                channel.push(pair);
                pairs += 1;
                ControlFlow::Continue(())
            }
            Ok(SourceEvent::Exhausted) => ControlFlow::Break(ProducerExit::Exhausted),
            Err(e) => {
                warn!(
                    source = source.source_name(),
                    error = %e,
                    "Producer: source failed, treating as end of data"
                );
                ControlFlow::Break(ProducerExit::SourceFailed {
                    reason: e.to_string(),
                })
            }
        }
    });

    source.close();
    info!(pairs, reason = %exit, "Producer: exiting loop");

    ProducerOutcome {
        exit,
        pairs,
        pacing: pacer.stats(),
    }
}

fn run_consumer<K: DecisionSink>(
    sink: &mut K,
    mut filter: SlidingWindowFilter,
    ctx: ConsumerContext<'_>,
) -> ConsumerOutcome {
    let mut pacer = PacedWorker::new("consumer", ctx.interval);
    let mut pairs: u64 = 0;
    info!(strategy = ?ctx.strategy, "Consumer started");

    pacer.run(|| {
        let pair = match ctx.strategy {
            ConsumerStrategy::Polling => match ctx.channel.poll() {
                Some(pair) => pair,
                None if ctx.finished.is_set() && ctx.channel.is_empty() => {
                    return ControlFlow::Break(());
                }
                None => return ControlFlow::Continue(()),
            },
            ConsumerStrategy::Blocking => match ctx.channel.take() {
                Some(pair) => pair,
                None => return ControlFlow::Break(()),
            },
        };

        pairs += 1;
        for sample in pair.samples() {
            if let Some(decision) = filter.ingest(sample) {
                sink.record(&decision);
            }
        }

        if ctx.progress_interval > 0 && pairs % ctx.progress_interval == 0 {
            info!(
                "📈 Progress: {} pairs | Decisions: {} | Defects: {} | Queued: {}",
                pairs,
                filter.decisions_emitted(),
                filter.defects(),
                ctx.channel.len()
            );
        }
        ControlFlow::Continue(())
    });

    info!(
        pairs,
        decisions = filter.decisions_emitted(),
        buffered = filter.buffered(),
        "Consumer: producer finished and channel empty, exiting loop"
    );

    ConsumerOutcome {
        filter,
        pairs,
        pacing: pacer.stats(),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn advance(phase: &mut PipelinePhase, next: PipelinePhase) {
    debug_assert!(next > *phase, "pipeline phases only move forward");
    info!(from = %phase, to = %next, "Pipeline phase transition");
    *phase = next;
}

fn log_report(report: &RunReport) {
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📊 FINAL STATISTICS");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("   Producer Exit:        {}", report.producer_exit);
    info!("   Pairs Produced:       {}", report.pairs_produced);
    info!("   Pairs Consumed:       {}", report.pairs_consumed);
    info!("   Samples Ingested:     {}", report.samples_ingested);
    info!("   Decisions Emitted:    {}", report.decisions_emitted);
    info!(
        "   Defects:              {} ({:.1}%)",
        report.defects,
        report.defect_rate() * 100.0
    );
    info!("   Residual Samples:     {:?}", report.residual);
    info!(
        "   Cycle Overruns:       producer {} / consumer {}",
        report.producer_pacing.overruns, report.consumer_pacing.overruns
    );
    info!("   Elapsed:              {:.3}s", report.elapsed_secs);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

// ============================================================================
// Tests
// ============================================================================
