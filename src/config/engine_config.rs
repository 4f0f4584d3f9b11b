//! Engine configuration - ensemble, decay selection and search tunables
//!
//! Each struct implements `Default` with the values in [`super::defaults`],
//! so a missing file or a partial file behaves exactly like the built-in
//! engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the reward optimizer.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$REWARD_OPTIMIZER_CONFIG` env var
/// 2. `./reward_optimizer.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tree-ensemble hyper-parameters
    #[serde(default)]
    pub model: ModelConfig,

    /// Decay-rate cross-validation
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Reward search loss and minimizer limits
    #[serde(default)]
    pub search: SearchConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load engine config, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        // 2. Check the working directory
        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(path = %local.display(), "Loaded engine config");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load {}, using defaults", defaults::CONFIG_FILE_NAME);
                }
            }
        }

        // 3. Defaults
        info!("No engine config found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are logged as
    /// warnings; range violations are errors.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Write the config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Engine config saved");
        Ok(())
    }

    /// Validate all values for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
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

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Model (tree ensemble)
// ============================================================================

/// Gradient-boosted tree ensemble hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Leaf-wise growth stops at this many leaves
    #[serde(default = "default_num_leaves")]
    pub num_leaves: usize,

    /// Depth limit; unset means unlimited (leaf count still applies)
    #[serde(default)]
    pub max_depth: Option<usize>,

    #[serde(default = "default_min_child_samples")]
    pub min_child_samples: usize,

    /// Row fraction per bag, in (0, 1]
    #[serde(default = "default_subsample")]
    pub subsample: f64,

    /// Rounds between bag redraws; 0 trains every tree on all rows
    #[serde(default = "default_subsample_freq")]
    pub subsample_freq: usize,

    /// Column fraction per tree, in (0, 1]
    #[serde(default = "default_colsample_bytree")]
    pub colsample_bytree: f64,

    #[serde(default = "default_reg_lambda")]
    pub reg_lambda: f64,

    #[serde(default = "default_model_seed")]
    pub seed: u64,
}

fn default_n_estimators() -> usize { defaults::N_ESTIMATORS }
fn default_learning_rate() -> f64 { defaults::LEARNING_RATE }
fn default_num_leaves() -> usize { defaults::NUM_LEAVES }
fn default_min_child_samples() -> usize { defaults::MIN_CHILD_SAMPLES }
fn default_subsample() -> f64 { defaults::SUBSAMPLE }
fn default_subsample_freq() -> usize { defaults::SUBSAMPLE_FREQ }
fn default_colsample_bytree() -> f64 { defaults::COLSAMPLE_BYTREE }
fn default_reg_lambda() -> f64 { defaults::REG_LAMBDA }
fn default_model_seed() -> u64 { defaults::MODEL_SEED }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            learning_rate: default_learning_rate(),
            num_leaves: default_num_leaves(),
            max_depth: None,
            min_child_samples: default_min_child_samples(),
            subsample: default_subsample(),
            subsample_freq: default_subsample_freq(),
            colsample_bytree: default_colsample_bytree(),
            reg_lambda: default_reg_lambda(),
            seed: default_model_seed(),
        }
    }
}

// ============================================================================
// Decay Selection
// ============================================================================

/// Cross-validated decay-rate selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Candidate decay rates, evaluated in order
    #[serde(default = "default_decay_candidates")]
    pub decay_candidates: Vec<f64>,

    /// K for K-fold cross-validation
    #[serde(default = "default_cv_folds")]
    pub folds: usize,

    /// Shuffle seed for fold assignment
    #[serde(default = "default_cv_seed")]
    pub shuffle_seed: u64,
}

fn default_decay_candidates() -> Vec<f64> { defaults::DECAY_CANDIDATES.to_vec() }
fn default_cv_folds() -> usize { defaults::CV_FOLDS }
fn default_cv_seed() -> u64 { defaults::CV_SEED }

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            decay_candidates: default_decay_candidates(),
            folds: default_cv_folds(),
            shuffle_seed: default_cv_seed(),
        }
    }
}

// ============================================================================
// Reward Search
// ============================================================================

/// Reward search loss weights and minimizer limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Weight of |predicted - target| / max(target, 1)
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Weight of predicted * reward / (high * max(target, 1))
    #[serde(default = "default_beta")]
    pub beta: f64,

    /// Default upper bound is `reward_max * (1 + exploration_margin)`
    #[serde(default = "default_exploration_margin")]
    pub exploration_margin: f64,

    /// Absolute reward tolerance
    #[serde(default = "default_xatol")]
    pub xatol: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_alpha() -> f64 { defaults::ALPHA }
fn default_beta() -> f64 { defaults::BETA }
fn default_exploration_margin() -> f64 { defaults::EXPLORATION_MARGIN }
fn default_xatol() -> f64 { defaults::SEARCH_XATOL }
fn default_max_iterations() -> usize { defaults::SEARCH_MAX_ITERATIONS }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            beta: default_beta(),
            exploration_margin: default_exploration_margin(),
            xatol: default_xatol(),
            max_iterations: default_max_iterations(),
        }
    }
}
