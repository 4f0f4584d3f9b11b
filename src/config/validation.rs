//! Config validation: unknown-key detection with Levenshtein suggestions
//! and value range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::EngineConfig;

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

/// Returns the complete set of valid dotted key paths for EngineConfig.
///
/// Any new field added to EngineConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [model]
        "model",
        "model.n_estimators",
        "model.learning_rate",
        "model.num_leaves",
        "model.max_depth",
        "model.min_child_samples",
        "model.subsample",
        "model.subsample_freq",
        "model.colsample_bytree",
        "model.reg_lambda",
        "model.seed",
        // [selection]
        "selection",
        "selection.decay_candidates",
        "selection.folds",
        "selection.shuffle_seed",
        // [search]
        "search",
        "search.alpha",
        "search.beta",
        "search.exploration_margin",
        "search.xatol",
        "search.max_iterations",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the alphabetically first key so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|&(dist, _)| dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are reported by serde later
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

/// Validate value ranges on a parsed EngineConfig.
///
/// Returns (errors, warnings): errors are values the engine cannot run
/// with; warnings are legal but suspicious.
pub fn validate_ranges(config: &EngineConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let m = &config.model;
    if m.n_estimators == 0 {
        errors.push("model.n_estimators must be > 0".to_string());
    }
    if !(m.learning_rate > 0.0 && m.learning_rate.is_finite()) {
        errors.push(format!("model.learning_rate = {} must be > 0", m.learning_rate));
    }
    if m.num_leaves < 2 {
        errors.push(format!("model.num_leaves = {} must be >= 2", m.num_leaves));
    }
    if m.max_depth == Some(0) {
        errors.push("model.max_depth must be >= 1 when set".to_string());
    }
    if m.min_child_samples == 0 {
        errors.push("model.min_child_samples must be >= 1".to_string());
    }
    for (name, value) in [("model.subsample", m.subsample), ("model.colsample_bytree", m.colsample_bytree)] {
        if !(value > 0.0 && value <= 1.0) {
            errors.push(format!("{name} = {value} must be in (0, 1]"));
        }
    }
    if !(m.reg_lambda >= 0.0 && m.reg_lambda.is_finite()) {
        errors.push(format!("model.reg_lambda = {} must be >= 0", m.reg_lambda));
    }

    let s = &config.selection;
    if s.decay_candidates.is_empty() {
        errors.push("selection.decay_candidates must not be empty".to_string());
    }
    for &lambda in &s.decay_candidates {
        if !(lambda >= 0.0 && lambda.is_finite()) {
            errors.push(format!("selection.decay_candidates contains {lambda}; decay rates must be >= 0"));
        }
    }
    if s.folds < 2 {
        errors.push(format!("selection.folds = {} must be >= 2", s.folds));
    }
    let mut seen = HashSet::new();
    for &lambda in &s.decay_candidates {
        if !seen.insert(lambda.to_bits()) {
            warnings.push(ValidationWarning {
                field: "selection.decay_candidates".to_string(),
                message: format!("Duplicate decay candidate {lambda}; only the first can win"),
                suggestion: None,
            });
        }
    }

    let q = &config.search;
    if !(q.alpha >= 0.0 && q.alpha.is_finite()) || !(q.beta >= 0.0 && q.beta.is_finite()) {
        errors.push(format!("search.alpha ({}) and search.beta ({}) must be >= 0", q.alpha, q.beta));
    } else if q.alpha == 0.0 {
        warnings.push(ValidationWarning {
            field: "search.alpha".to_string(),
            message: "search.alpha = 0 ignores the attendance target entirely".to_string(),
            suggestion: None,
        });
    }
    if !(q.exploration_margin >= 0.0 && q.exploration_margin.is_finite()) {
        errors.push(format!(
            "search.exploration_margin = {} must be >= 0",
            q.exploration_margin
        ));
    }
    if !(q.xatol > 0.0 && q.xatol.is_finite()) {
        errors.push(format!("search.xatol = {} must be > 0", q.xatol));
    }
    if q.max_iterations == 0 {
        errors.push("search.max_iterations must be > 0".to_string());
    }

    (errors, warnings)
}
