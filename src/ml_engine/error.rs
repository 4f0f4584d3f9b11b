//! Error taxonomy for fitting, prediction and search.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A component was used before its parameters were learned
    /// (e.g. encoding before the encoder was fitted).
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model is not fitted; call fit() before predicting or searching")]
    ModelNotFitted,

    /// Missing or malformed training data. Aborts `fit`; the previously
    /// published model stays in service.
    #[error("Data validation error: {0}")]
    DataValidation(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Invalid search bounds: low {low} exceeds high {high}")]
    InvalidBounds { low: f64, high: f64 },
}
