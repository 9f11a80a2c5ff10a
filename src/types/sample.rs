//! Sample types: SamplePair

use serde::{Deserialize, Serialize};

// ============================================================================
// Stage 1: Sample Production
// ============================================================================

/// Two 8-bit samples produced together in one producer cycle.
///
/// Ownership moves producer -> channel -> consumer; the pair is never
/// mutated along the way.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SamplePair {
    pub first: u8,
    pub second: u8,
}

impl SamplePair {
    pub const fn new(first: u8, second: u8) -> Self {
        Self { first, second }
    }

    /// Samples in ingestion order (first, then second).
    pub const fn samples(self) -> [u8; 2] {
        [self.first, self.second]
    }
}

impl From<(u8, u8)> for SamplePair {
    fn from((first, second): (u8, u8)) -> Self {
        Self { first, second }
    }
}

impl std::fmt::Display for SamplePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}
