//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Configuration Discovery
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "INSPECTOR_CONFIG";

/// Config file looked up in the working directory when the env var is unset.
pub const LOCAL_CONFIG_FILE: &str = "inspector.toml";

// ============================================================================
// Pipeline
// ============================================================================

/// Floor for the per-cycle interval T (ns). Lower values are clamped at load.
pub const MIN_CYCLE_TIME_NS: u64 = 500;

/// Default per-cycle interval T (ns). 1 000 000 ns = 1 ms.
pub const DEFAULT_CYCLE_TIME_NS: u64 = 1_000_000;

/// Default threshold value TV.
///
/// The kernel sums to 1.25, so filtered values span 0.0..=318.75; a window
/// averaging about 102 reaches 128.
pub const DEFAULT_THRESHOLD_VALUE: f64 = 128.0;

/// Cycle time above which the config loader warns (ns). 10 s per cycle.
pub const SLOW_CYCLE_WARNING_NS: u64 = 10_000_000_000;

// ============================================================================
// Output
// ============================================================================

/// Pairs consumed between progress log lines (0 disables progress output).
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000;

// ============================================================================
// Filtered Value Range
// ============================================================================

/// Smallest filtered value the kernel can produce (all samples 0).
pub const FILTERED_MIN: f64 = 0.0;

/// Largest filtered value the kernel can produce (all samples 255).
pub const FILTERED_MAX: f64 = crate::pipeline::MAX_FILTERED;
