//! Decision sinks: where filtered decisions and the final residual go.
//!
//! The consumer thread owns the sink while the pipeline runs; the
//! coordinator gets it back for the drain and the residual report.

use serde::Serialize;
use std::io::Write;
use tracing::{info, warn};

use crate::types::Decision;

/// Receives decisions in ingestion order, then the residual once.
pub trait DecisionSink: Send {
    fn record(&mut self, decision: &Decision);

    /// Called once after the filter has been drained.
    fn finish(&mut self, _residual: &[u8]) {}
}

impl<K: DecisionSink + ?Sized> DecisionSink for Box<K> {
    fn record(&mut self, decision: &Decision) {
        (**self).record(decision);
    }

    fn finish(&mut self, residual: &[u8]) {
        (**self).finish(residual);
    }
}

// ============================================================================
// Log Sink
// ============================================================================

/// One tracing line per decision.
#[derive(Debug, Default)]
pub struct LogSink;

impl DecisionSink for LogSink {
    fn record(&mut self, decision: &Decision) {
        info!("Filtered output for {}", decision);
    }

    fn finish(&mut self, residual: &[u8]) {
        if residual.is_empty() {
            info!("No residual samples (every sample had a full window)");
        } else {
            info!(
                count = residual.len(),
                "Residual samples without a full window: {:?}", residual
            );
        }
    }
}

// ============================================================================
// JSON Lines Sink
// ============================================================================

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record<'a> {
    Decision(&'a Decision),
    Residual { samples: &'a [u8] },
}

/// One JSON object per line: `{"type":"decision",...}` for every decision,
/// then a single `{"type":"residual","samples":[...]}`.
///
/// Write failures are logged once and counted; the pipeline keeps running.
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    write_errors: u64,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            write_errors: 0,
        }
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, record: &Record<'_>) {
        let result = serde_json::to_writer(&mut self.writer, record)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(e) = result {
            self.write_errors += 1;
            if self.write_errors == 1 {
                warn!(error = %e, "Decision output write failed, further failures are counted only");
            }
        }
    }
}

impl<W: Write + Send> DecisionSink for JsonLinesSink<W> {
    fn record(&mut self, decision: &Decision) {
        self.emit(&Record::Decision(decision));
    }

    fn finish(&mut self, residual: &[u8]) {
        self.emit(&Record::Residual { samples: residual });
        if let Err(e) = self.writer.flush() {
            warn!(error = %e, "Decision output flush failed");
        }
        if self.write_errors > 0 {
            warn!(failures = self.write_errors, "Some decision records were not written");
        }
    }
}

// ============================================================================
// Collecting Sink
// ============================================================================

/// Keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub decisions: Vec<Decision>,
    pub residual: Option<Vec<u8>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecisionSink for CollectingSink {
    fn record(&mut self, decision: &Decision) {
        self.decisions.push(*decision);
    }

    fn finish(&mut self, residual: &[u8]) {
        self.residual = Some(residual.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Verdict;

    fn decision(index: u64) -> Decision {
        Decision {
            index,
            subject: 42,
            filtered: 12.5,
            verdict: Verdict::NoDefect,
        }
    }

    #[test]
    fn test_json_lines_layout() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.record(&decision(4));
        sink.record(&decision(5));
        sink.finish(&[1, 2, 3]);
        assert_eq!(sink.write_errors(), 0);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "decision");
        assert_eq!(lines[0]["index"], 4);
        assert_eq!(lines[0]["verdict"], "NO_DEFECT");
        assert_eq!(lines[1]["index"], 5);
        assert_eq!(lines[2]["type"], "residual");
        assert_eq!(lines[2]["samples"], serde_json::json!([1, 2, 3]));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_write_failures_are_counted_not_fatal() {
        let mut sink = JsonLinesSink::new(FailingWriter);
        sink.record(&decision(4));
        sink.record(&decision(5));
        sink.finish(&[]);
        assert_eq!(sink.write_errors(), 3);
    }

    #[test]
    fn test_boxed_sink_forwards_both_calls() {
        let mut sink = Box::new(CollectingSink::new());
        <Box<CollectingSink> as DecisionSink>::record(&mut sink, &decision(9));
        <Box<CollectingSink> as DecisionSink>::finish(&mut sink, &[7]);
        assert_eq!(sink.decisions, vec![decision(9)]);
        assert_eq!(sink.residual, Some(vec![7]));
    }
}
