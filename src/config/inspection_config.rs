//! Inspection Configuration - threshold, pacing, source and output as TOML values
//!
//! Each section implements `Default`, so an empty or partial file is always
//! a complete configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults::{
    CONFIG_ENV_VAR, DEFAULT_CYCLE_TIME_NS, DEFAULT_PROGRESS_INTERVAL, DEFAULT_THRESHOLD_VALUE,
    LOCAL_CONFIG_FILE, MIN_CYCLE_TIME_NS,
};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one inspection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectionConfig {
    /// Filter threshold and pacing
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Sample source selection
    #[serde(default)]
    pub source: SourceConfig,

    /// Decision presentation
    #[serde(default)]
    pub output: OutputConfig,
}

impl InspectionConfig {
    /// Load configuration using the standard search order:
    /// 1. `$INSPECTOR_CONFIG` environment variable
    /// 2. `./inspector.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded inspection config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded inspection config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    ///
    /// Unknown keys are reported as warnings, the cycle time is clamped to
    /// its floor, then the result is validated.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::parse(&contents, path)
    }

    fn parse(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let mut config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(origin.to_path_buf(), e))?;
        config.clamp_cycle_time();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document that did not come from a file.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Self::parse(contents, Path::new("<inline>"))
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Write the config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Inspection config saved");
        Ok(())
    }

    /// Raise T to the floor if it is below it. Returns `true` if clamped.
    pub fn clamp_cycle_time(&mut self) -> bool {
        if self.pipeline.cycle_time_ns < MIN_CYCLE_TIME_NS {
            warn!(
                requested_ns = self.pipeline.cycle_time_ns,
                floor_ns = MIN_CYCLE_TIME_NS,
                "Cycle time T below floor, clamping"
            );
            self.pipeline.cycle_time_ns = MIN_CYCLE_TIME_NS;
            true
        } else {
            false
        }
    }

    /// The per-cycle interval T.
    pub fn cycle_time(&self) -> Duration {
        Duration::from_nanos(self.pipeline.cycle_time_ns)
    }

    /// Validate the configuration.
    ///
    /// Rules:
    /// - TV must be finite
    /// - T must be at or above the floor (call `clamp_cycle_time` first)
    /// - Table mode needs a path
    /// - A pair limit, when present, must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if !self.pipeline.threshold_value.is_finite() {
            errors.push(format!(
                "pipeline.threshold_value must be finite (got {})",
                self.pipeline.threshold_value
            ));
        }

        if self.source.mode == SourceMode::Table {
            match &self.source.path {
                None => errors.push("source.path is required when source.mode = \"table\"".to_string()),
                Some(p) if p.as_os_str().is_empty() => {
                    errors.push("source.path cannot be empty".to_string());
                }
                Some(_) => {}
            }
        }

        if self.source.limit == Some(0) {
            errors.push("source.limit must be > 0 (omit it for an unbounded run)".to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Pipeline
// ============================================================================

/// How the consumer reads from the handoff channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerStrategy {
    /// Non-blocking poll each cycle; exits on the producer-finished signal
    #[default]
    Polling,
    /// Blocking take each cycle; exits when the channel is closed and empty
    Blocking,
}

/// Threshold and pacing for both workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Threshold value TV: filtered >= TV is a defect
    pub threshold_value: f64,

    /// Minimum cycle time T in nanoseconds (floor 500)
    pub cycle_time_ns: u64,

    /// Consumer read strategy
    pub consumer: ConsumerStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold_value: DEFAULT_THRESHOLD_VALUE,
            cycle_time_ns: DEFAULT_CYCLE_TIME_NS,
            consumer: ConsumerStrategy::default(),
        }
    }
}

// ============================================================================
// Source
// ============================================================================

/// Which sample source feeds the producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Uniform random byte pairs
    #[default]
    Random,
    /// Comma-separated table of byte values
    Table,
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceMode::Random => write!(f, "random"),
            SourceMode::Table => write!(f, "table"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub mode: SourceMode,

    /// Table file (table mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Declared columns per row (m); 0 reads every cell
    pub columns: usize,

    /// RNG seed for reproducible random runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Stop the random source after this many pairs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One tracing line per decision
    #[default]
    Log,
    /// One JSON object per decision on stdout
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,

    /// Pairs consumed between progress lines (0 = off)
    pub progress_interval: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
