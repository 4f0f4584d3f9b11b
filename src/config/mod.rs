//! Engine Configuration Module
//!
//! Tree-ensemble hyper-parameters, decay-rate candidates and reward-search
//! weights, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `REWARD_OPTIMIZER_CONFIG` environment variable (path to TOML file)
//! 2. `reward_optimizer.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The config is a plain value: load it once and pass it (or the relevant
//! section) to the components that need it.

mod engine_config;
pub mod defaults;
pub mod validation;

pub use engine_config::*;
