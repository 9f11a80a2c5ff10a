//! Pipeline Integration Tests
//!
//! End-to-end runs through the public API: source -> producer thread ->
//! handoff channel -> consumer thread -> filter -> sink, with the
//! coordinator's handshake and drain. Every finite run is compared against
//! offline filtering of the same sample sequence.

use sample_inspector::acquisition::{RandomSource, ReplaySource, TableSource};
use sample_inspector::config::{ConsumerStrategy, InspectionConfig, SourceMode};
use sample_inspector::pipeline::{CollectingSink, JsonLinesSink, PipelineCoordinator, SlidingWindowFilter};
use sample_inspector::types::{Decision, PipelinePhase, ProducerExit, Verdict};
use std::io::Write;
use std::time::Duration;

const FAST: Duration = Duration::from_nanos(500);

fn table_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Single-threaded reference: ingest everything, then drain.
fn offline(samples: &[u8], threshold: f64) -> (Vec<Decision>, Vec<u8>) {
    let mut filter = SlidingWindowFilter::new(threshold);
    let mut decisions: Vec<Decision> = samples.iter().filter_map(|&s| filter.ingest(s)).collect();
    decisions.extend(filter.drain());
    (decisions, filter.residual())
}

// ============================================================================
// Table Source
// ============================================================================

#[test]
fn table_run_matches_offline_filtering() {
    let rows: Vec<String> = (0..25u32)
        .map(|r| {
            (0..6u32)
                .map(|c| ((r * 31 + c * 17) % 256).to_string())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();
    let file = table_file(&(rows.join("\n") + "\n"));
    let samples: Vec<u8> = (0..25u32)
        .flat_map(|r| (0..6u32).map(move |c| ((r * 31 + c * 17) % 256) as u8))
        .collect();

    let mut source = TableSource::new(file.path(), 6);
    let mut sink = CollectingSink::new();
    let report = PipelineCoordinator::new(128.0, FAST)
        .run(&mut source, &mut sink)
        .unwrap();

    let (expected, residual) = offline(&samples, 128.0);
    assert_eq!(report.final_phase, PipelinePhase::Stopped);
    assert_eq!(report.producer_exit, ProducerExit::Exhausted);
    assert_eq!(report.samples_ingested, 150);
    assert_eq!(report.decisions_emitted, 142);
    assert_eq!(sink.decisions, expected);
    assert_eq!(report.residual, residual);
    assert_eq!(source.stats().rows_read, 25);
}

#[test]
fn seven_value_row_delivers_three_pairs() {
    let file = table_file("1,2,3,4,5,6,7\n");
    let mut source = TableSource::new(file.path(), 7);
    let mut sink = CollectingSink::new();

    let report = PipelineCoordinator::new(10.0, FAST)
        .run(&mut source, &mut sink)
        .unwrap();

    assert_eq!(report.pairs_produced, 3);
    assert_eq!(report.samples_ingested, 6);
    assert_eq!(report.decisions_emitted, 0);
    assert_eq!(report.residual, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(source.stats().discarded_trailing, 1);
    assert_eq!(sink.residual, Some(vec![1, 2, 3, 4, 5, 6]));
}

#[test]
fn missing_table_still_reaches_stopped() {
    let mut source = TableSource::new("/nonexistent/inspection/rows.csv", 4);
    let mut sink = CollectingSink::new();

    let report = PipelineCoordinator::new(10.0, FAST)
        .run(&mut source, &mut sink)
        .unwrap();

    assert_eq!(report.final_phase, PipelinePhase::Stopped);
    assert!(matches!(report.producer_exit, ProducerExit::SourceFailed { .. }));
    assert_eq!(report.decisions_emitted, 0);
    assert!(report.residual.is_empty());
    assert_eq!(sink.residual, Some(Vec::new()));
}

#[test]
fn constant_table_verdicts_follow_threshold() {
    let file = table_file("100,100,100\n100,100,100\n100,100,100\n100\n");
    // 10 values -> 5 pairs -> 2 full windows
    for (threshold, verdict) in [(1275.0, Verdict::NoDefect), (50.0, Verdict::Defect)] {
        let mut sink = CollectingSink::new();
        PipelineCoordinator::new(threshold, FAST)
            .run(&mut TableSource::new(file.path(), 3), &mut sink)
            .unwrap();
        assert_eq!(sink.decisions.len(), 2);
        for d in &sink.decisions {
            assert!((d.filtered - 125.0).abs() < 1e-9);
            assert_eq!(d.verdict, verdict);
        }
    }
}

// ============================================================================
// Random Source
// ============================================================================

#[test]
fn seeded_random_run_is_reproducible_and_counts_hold() {
    let run = || {
        let mut sink = CollectingSink::new();
        let report = PipelineCoordinator::new(127.5, FAST)
            .run(&mut RandomSource::new(Some(42)).with_limit(300), &mut sink)
            .unwrap();
        (report, sink)
    };

    let (report, first) = run();
    let (_, second) = run();

    assert_eq!(report.pairs_produced, 300);
    assert_eq!(report.pairs_consumed, 300);
    assert_eq!(report.decisions_emitted, 600 - 8);
    assert_eq!(report.residual.len(), 8);
    assert_eq!(first.decisions, second.decisions);
    assert_eq!(
        report.defects,
        first.decisions.iter().filter(|d| d.verdict.is_defect()).count() as u64
    );
}

#[test]
fn cancelled_unbounded_run_drains_gracefully() {
    let coordinator = PipelineCoordinator::new(128.0, Duration::from_micros(20));
    let token = coordinator.cancellation_token();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        token.cancel();
    });

    let mut sink = CollectingSink::new();
    let report = coordinator
        .run(&mut RandomSource::new(None), &mut sink)
        .unwrap();
    stopper.join().unwrap();

    assert_eq!(report.producer_exit, ProducerExit::Cancelled);
    assert_eq!(report.final_phase, PipelinePhase::Stopped);
    assert!(report.pairs_produced > 0);
    assert_eq!(report.pairs_consumed, report.pairs_produced);
    assert_eq!(
        report.residual.len() as u64,
        report.samples_ingested.min(8)
    );
}

// ============================================================================
// Consumer Strategies and Configuration
// ============================================================================

#[test]
fn blocking_consumer_produces_identical_decisions() {
    let samples: Vec<u8> = (0..200u32).map(|i| (i * i % 251) as u8).collect();

    let mut polling = CollectingSink::new();
    PipelineCoordinator::new(90.0, FAST)
        .with_consumer_strategy(ConsumerStrategy::Polling)
        .run(&mut ReplaySource::from_samples(&samples), &mut polling)
        .unwrap();

    let mut blocking = CollectingSink::new();
    let report = PipelineCoordinator::new(90.0, FAST)
        .with_consumer_strategy(ConsumerStrategy::Blocking)
        .run(&mut ReplaySource::from_samples(&samples), &mut blocking)
        .unwrap();

    let (expected, residual) = offline(&samples, 90.0);
    assert_eq!(report.final_phase, PipelinePhase::Stopped);
    assert_eq!(polling.decisions, expected);
    assert_eq!(blocking.decisions, expected);
    assert_eq!(blocking.residual, Some(residual));
}

#[test]
fn coordinator_from_config_uses_configured_threshold() {
    let mut config = InspectionConfig::default();
    config.pipeline.threshold_value = 0.0;
    config.pipeline.cycle_time_ns = 500;
    config.source.mode = SourceMode::Random;
    config.output.progress_interval = 4;

    let mut sink = CollectingSink::new();
    let report = PipelineCoordinator::from_config(&config)
        .run(&mut ReplaySource::from_samples(&[7; 20]), &mut sink)
        .unwrap();

    assert_eq!(report.decisions_emitted, 12);
    assert_eq!(report.defects, 12, "every window reaches a zero threshold");
}

#[test]
fn json_sink_end_to_end() {
    let samples = [0u8, 0, 0, 0, 255, 0, 0, 0, 0, 0];
    let mut sink = JsonLinesSink::new(Vec::new());
    PipelineCoordinator::new(60.0, FAST)
        .run(&mut ReplaySource::from_samples(&samples), &mut sink)
        .unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines.len(), 3, "two decisions then the residual");
    assert_eq!(lines[0]["index"], 4);
    assert_eq!(lines[0]["verdict"], "DEFECT");
    assert_eq!(lines[1]["index"], 5);
    assert_eq!(lines[1]["verdict"], "NO_DEFECT");
    assert_eq!(lines[2]["type"], "residual");
    assert_eq!(lines[2]["samples"].as_array().unwrap().len(), 8);
}
