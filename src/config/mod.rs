//! Inspection Configuration Module
//!
//! Provides the run configuration (threshold TV, cycle time T, source
//! selection, output format) loaded from TOML, overridden from the command
//! line, or collected interactively.
//!
//! ## Loading Order
//!
//! 1. `INSPECTOR_CONFIG` environment variable (path to TOML file)
//! 2. `inspector.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The cycle time is clamped to [`defaults::MIN_CYCLE_TIME_NS`] during every
//! load path, before any paced worker is constructed.

mod inspection_config;
pub mod defaults;
pub mod prompt;
pub mod validation;

pub use inspection_config::*;
