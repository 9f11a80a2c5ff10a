//! Sliding-window convolution filter with threshold.
//!
//! Each sample is judged once it sits at the center of a full 9-sample
//! window (4 past, the subject, 4 future):
//!
//! ```text
//! buffer:  [ p4 p3 p2 p1 | S | f1 f2 f3 f4 ]   S = buffer[CENTER_OFFSET]
//! kernel:  [.05 .10 .15 .20 .25 .20 .15 .10 .05]
//! filtered = Σ buffer[i] * KERNEL[i]          verdict = filtered >= TV
//! ```
//!
//! After a window is evaluated the head is popped, so the buffer never
//! holds more than `WINDOW_SIZE - 1` samples between ingests. The final
//! samples of a finite stream never gain four successors and are reported
//! as residual, never judged.

use std::collections::VecDeque;

use crate::types::{Decision, Verdict};

/// Samples per window.
pub const WINDOW_SIZE: usize = 9;

/// Position of the judged sample inside the window.
pub const CENTER_OFFSET: usize = 4;

/// Convolution weights: symmetric, not normalized.
pub const KERNEL: [f64; WINDOW_SIZE] = [0.05, 0.10, 0.15, 0.20, 0.25, 0.20, 0.15, 0.10, 0.05];

/// Sum of the kernel weights. A constant window of `v` filters to `v * 1.25`.
pub const KERNEL_GAIN: f64 = 1.25;

/// Largest filtered value (every sample 255).
pub const MAX_FILTERED: f64 = u8::MAX as f64 * KERNEL_GAIN;

/// Weighted sum of one full window.
pub fn convolve(window: &[u8; WINDOW_SIZE]) -> f64 {
    window
        .iter()
        .zip(KERNEL.iter())
        .map(|(&v, &w)| f64::from(v) * w)
        .sum()
}

/// Filter state owned by the consumer.
#[derive(Debug, Clone)]
pub struct SlidingWindowFilter {
    buffer: VecDeque<u8>,
    threshold: f64,
    /// Stream index of `buffer[0]`
    head_index: u64,
    ingested: u64,
    decisions: u64,
    defects: u64,
}

impl SlidingWindowFilter {
    pub fn new(threshold: f64) -> Self {
        Self {
            buffer: VecDeque::with_capacity(WINDOW_SIZE + 1),
            threshold,
            head_index: 0,
            ingested: 0,
            decisions: 0,
            defects: 0,
        }
    }

    /// Append one sample; evaluate and pop at most one window.
    pub fn ingest(&mut self, value: u8) -> Option<Decision> {
        self.buffer.push_back(value);
        self.ingested += 1;
        self.step()
    }

    /// Judge the current head-aligned window without changing state.
    ///
    /// `None` while fewer than `WINDOW_SIZE` samples are buffered.
    pub fn evaluate(&self) -> Option<Decision> {
        if self.buffer.len() < WINDOW_SIZE {
            return None;
        }

        let mut window = [0u8; WINDOW_SIZE];
        for (slot, &v) in window.iter_mut().zip(self.buffer.iter()) {
            *slot = v;
        }
        let filtered = convolve(&window);

        Some(Decision {
            index: self.head_index + CENTER_OFFSET as u64,
            subject: window[CENTER_OFFSET],
            filtered,
            verdict: Verdict::classify(filtered, self.threshold),
        })
    }

    /// Evaluate then pop the head, if a full window is buffered.
    fn step(&mut self) -> Option<Decision> {
        let decision = self.evaluate()?;
        self.buffer.pop_front();
        self.head_index += 1;
        self.decisions += 1;
        if decision.verdict.is_defect() {
            self.defects += 1;
        }
        Some(decision)
    }

    /// Flush every fully determined window still buffered.
    pub fn drain(&mut self) -> Vec<Decision> {
        std::iter::from_fn(|| self.step()).collect()
    }

    /// Samples that cannot (yet) be the center of a full window.
    ///
    /// After `drain` this is the final 0-8 samples of the stream.
    pub fn residual(&self) -> Vec<u8> {
        self.buffer.iter().copied().collect()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn ingested(&self) -> u64 {
        self.ingested
    }

    pub fn decisions_emitted(&self) -> u64 {
        self.decisions
    }

    pub fn defects(&self) -> u64 {
        self.defects
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn run(samples: &[u8], threshold: f64) -> (Vec<Decision>, SlidingWindowFilter) {
        let mut filter = SlidingWindowFilter::new(threshold);
        let mut decisions: Vec<Decision> = samples.iter().filter_map(|&s| filter.ingest(s)).collect();
        decisions.extend(filter.drain());
        (decisions, filter)
    }

    /// Direct evaluation of Σ seq[i+k] * kernel[k+4] for one center.
    fn reference(seq: &[u8], i: usize) -> f64 {
        (0..WINDOW_SIZE)
            .map(|k| f64::from(seq[i + k - CENTER_OFFSET]) * KERNEL[k])
            .sum()
    }

    #[test]
    fn test_kernel_is_symmetric_with_known_gain() {
        let sum: f64 = KERNEL.iter().sum();
        assert!((sum - KERNEL_GAIN).abs() < 1e-12);
        assert!((sum - 1.25).abs() < 1e-12);
        for i in 0..WINDOW_SIZE {
            assert_eq!(KERNEL[i], KERNEL[WINDOW_SIZE - 1 - i]);
        }
    }

    #[test]
    fn test_constant_window_below_threshold() {
        let (decisions, _) = run(&[100; 9], 1275.0);
        assert_eq!(decisions.len(), 1);
        let d = decisions[0];
        assert!((d.filtered - 125.0).abs() < 1e-9);
        assert_eq!(d.subject, 100);
        assert_eq!(d.index, 4);
        assert_eq!(d.verdict, Verdict::NoDefect);
    }

    #[test]
    fn test_constant_window_above_threshold() {
        let (decisions, _) = run(&[100; 9], 50.0);
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].verdict, Verdict::Defect);
    }

    #[test]
    fn test_center_sample_is_the_subject() {
        let seq = [0, 0, 0, 0, 200, 0, 0, 0, 0];
        let (decisions, _) = run(&seq, 50.0);
        assert_eq!(decisions[0].subject, 200);
        assert!((decisions[0].filtered - 50.0).abs() < 1e-9);
        assert_eq!(decisions[0].verdict, Verdict::Defect, "threshold is inclusive");
    }

    #[test]
    fn test_no_decision_before_ninth_sample() {
        let mut filter = SlidingWindowFilter::new(0.0);
        for v in 0..8u8 {
            assert!(filter.ingest(v).is_none());
            assert!(filter.evaluate().is_none());
        }
        assert!(filter.ingest(8).is_some());
        assert_eq!(filter.buffered(), WINDOW_SIZE - 1);
    }

    #[test]
    fn test_window_matches_reference_sum() {
        let mut rng = StdRng::seed_from_u64(2024);
        let seq: Vec<u8> = (0..500).map(|_| rng.gen()).collect();
        let tv = 127.5;
        let (decisions, _) = run(&seq, tv);

        assert_eq!(decisions.len(), seq.len() - 8);
        for (n, d) in decisions.iter().enumerate() {
            let i = n + CENTER_OFFSET;
            assert_eq!(d.index, i as u64);
            assert_eq!(d.subject, seq[i]);
            let expected = reference(&seq, i);
            assert!((d.filtered - expected).abs() < 1e-9, "index {i}");
            assert_eq!(d.verdict, Verdict::classify(expected, tv));
        }
    }

    #[test]
    fn test_decision_count_and_residual_for_every_length() {
        for len in 0..40usize {
            let seq: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
            let (decisions, filter) = run(&seq, 100.0);
            assert_eq!(decisions.len(), len.saturating_sub(8), "len {len}");
            assert_eq!(filter.residual().len(), len.min(8), "len {len}");
            assert_eq!(filter.residual(), seq[len.saturating_sub(8)..].to_vec());
            assert_eq!(filter.ingested(), len as u64);
            assert_eq!(filter.decisions_emitted(), decisions.len() as u64);
        }
    }

    #[test]
    fn test_drain_is_empty_after_streaming_ingest() {
        let (_, mut filter) = run(&[1; 20], 0.5);
        assert!(filter.drain().is_empty());
        assert_eq!(filter.residual(), vec![1; 8]);
    }

    #[test]
    fn test_defect_counter() {
        let mut seq = vec![0u8; 30];
        seq[15] = 255;
        let (decisions, filter) = run(&seq, 20.0);
        let defects = decisions.iter().filter(|d| d.verdict.is_defect()).count() as u64;
        assert_eq!(filter.defects(), defects);
        // 255 * 0.10 = 25.5 reaches the threshold within ±3 of the spike
        assert_eq!(defects, 7);
    }

    #[test]
    fn test_convolve_extremes() {
        assert_eq!(convolve(&[0; WINDOW_SIZE]), 0.0);
        assert!((convolve(&[255; WINDOW_SIZE]) - 318.75).abs() < 1e-9);
        assert!((convolve(&[255; WINDOW_SIZE]) - MAX_FILTERED).abs() < 1e-9);
    }
}
