//! Decision types: Verdict, Decision

use serde::{Deserialize, Serialize};

// ============================================================================
// Stage 2: Filter + Threshold Output
// ============================================================================

/// Threshold classification of one filtered sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Defect,
    NoDefect,
}

impl Verdict {
    /// `Defect` iff `filtered >= threshold`.
    pub fn classify(filtered: f64, threshold: f64) -> Self {
        if filtered >= threshold {
            Verdict::Defect
        } else {
            Verdict::NoDefect
        }
    }

    pub fn is_defect(self) -> bool {
        matches!(self, Verdict::Defect)
    }

    /// Binary flag used in the log output (1 = defect).
    pub fn flag(self) -> u8 {
        u8::from(self.is_defect())
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Defect => write!(f, "Defect"),
            Verdict::NoDefect => write!(f, "No Defect"),
        }
    }
}

/// One filtered and thresholded sample.
///
/// `subject` is the raw value at the window center, `index` its zero-based
/// position in the ingested stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub index: u64,
    pub subject: u8,
    pub filtered: f64,
    pub verdict: Verdict,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sample #{} value {} (window center): filtered = {:.4}, thresholded = {} ({})",
            self.index,
            self.subject,
            self.filtered,
            self.verdict.flag(),
            self.verdict
        )
    }
}
