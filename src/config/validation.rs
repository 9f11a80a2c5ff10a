//! Config validation: unknown-key detection with "did you mean?" suggestions
//! and range checks on the threshold and pacing values.
//!
//! Unknown keys are found by parsing the raw TOML into `toml::Value` and
//! comparing every dotted path against the known set. They only warn; serde
//! then deserializes the document normally.

use std::collections::HashSet;

use super::defaults::{FILTERED_MAX, FILTERED_MIN, MIN_CYCLE_TIME_NS, SLOW_CYCLE_WARNING_NS};
use super::{InspectionConfig, SourceMode};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `InspectionConfig`.
///
/// Kept by hand in step with the structs in inspection_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    [
        // [pipeline]
        "pipeline",
        "pipeline.threshold_value",
        "pipeline.cycle_time_ns",
        "pipeline.consumer",
        // [source]
        "source",
        "source.mode",
        "source.path",
        "source.columns",
        "source.seed",
        "source.limit",
        // [output]
        "output",
        "output.format",
        "output.progress_interval",
    ]
    .into_iter()
    .collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Collect the dotted path of every key in a TOML tree, tables included.
///
/// `{ a = { b = 1 } }` yields `["a", "a.b"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let Some(table) = value.as_table() else {
        return Vec::new();
    };

    let mut keys = Vec::with_capacity(table.len());
    for (k, v) in table {
        let path = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}.{k}")
        };
        if v.is_table() {
            let nested = walk_toml_keys(v, &path);
            keys.push(path);
            keys.extend(nested);
        } else {
            keys.push(path);
        }
    }
    keys
}

// ============================================================================
// Edit Distance
// ============================================================================

/// Levenshtein distance over chars, single rolling row.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let substitution = diagonal + usize::from(ca != cb);
            row[j + 1] = substitution.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }

    row[b.len()]
}

/// Maximum edit distance for a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Closest known key within [`MAX_SUGGESTION_DISTANCE`] edits, if any.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= MAX_SUGGESTION_DISTANCE)
        .min_by(|(ka, da), (kb, db)| da.cmp(db).then_with(|| ka.cmp(kb)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Warnings for every unknown key in a raw TOML document.
///
/// Parse errors yield no warnings here; serde reports them afterwards.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Range checks on a parsed config.
///
/// Returns (errors, warnings). Errors block startup; warnings flag values
/// that are legal but make the run meaningless or very slow.
pub fn validate_ranges(config: &InspectionConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let tv = config.pipeline.threshold_value;
    if tv.is_finite() {
        if tv > FILTERED_MAX {
            warnings.push(ValidationWarning {
                field: "pipeline.threshold_value".to_string(),
                message: format!(
                    "threshold_value = {tv:.2} is above the largest filtered value ({FILTERED_MAX:.2}); no sample can be a defect"
                ),
                suggestion: None,
            });
        } else if tv <= FILTERED_MIN {
            warnings.push(ValidationWarning {
                field: "pipeline.threshold_value".to_string(),
                message: format!(
                    "threshold_value = {tv:.2} is at or below the smallest filtered value ({FILTERED_MIN:.0}); every sample is a defect"
                ),
                suggestion: None,
            });
        }
    }

    if config.pipeline.cycle_time_ns < MIN_CYCLE_TIME_NS {
        errors.push(format!(
            "pipeline.cycle_time_ns = {} is below the {} ns floor",
            config.pipeline.cycle_time_ns, MIN_CYCLE_TIME_NS
        ));
    } else if config.pipeline.cycle_time_ns > SLOW_CYCLE_WARNING_NS {
        warnings.push(ValidationWarning {
            field: "pipeline.cycle_time_ns".to_string(),
            message: format!(
                "cycle_time_ns = {} is more than {} s per cycle",
                config.pipeline.cycle_time_ns,
                SLOW_CYCLE_WARNING_NS / 1_000_000_000
            ),
            suggestion: None,
        });
    }

    if config.source.mode == SourceMode::Random {
        if config.source.path.is_some() {
            warnings.push(ValidationWarning {
                field: "source.path".to_string(),
                message: "source.path is ignored in random mode".to_string(),
                suggestion: None,
            });
        }
    } else if config.source.seed.is_some() || config.source.limit.is_some() {
        warnings.push(ValidationWarning {
            field: "source.seed".to_string(),
            message: "source.seed and source.limit are ignored in table mode".to_string(),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
