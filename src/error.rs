//! Error types for the analysis pipeline.
//!
//! Every stage returns `Result<_, AnalysisError>`. Malformed input rows are
//! not errors: the loader drops them and counts them instead.

use thiserror::Error;

/// Errors that can occur while loading data, fitting or evaluating a model.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Reading the input or config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader rejected the input (not a per-row value problem).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The TOML config could not be parsed or failed validation.
    #[error("invalid config: {0}")]
    Config(String),

    /// The input has fewer columns than the schema needs.
    #[error("expected at least {expected} columns, found {found}")]
    MissingColumns { expected: usize, found: usize },

    /// No complete observation survived cleaning, or a subset is too small.
    #[error("dataset is empty: {0}")]
    EmptyDataset(String),

    /// Exact linear dependency among the chosen predictors.
    #[error("unidentifiable model: {} is an exact linear combination of the other terms", .terms.join(", "))]
    Unidentifiable { terms: Vec<String> },

    /// Log or Box-Cox transform applied to a value that is not strictly positive.
    #[error("cannot apply {transform} to non-positive value {value} of '{attribute}'")]
    NonPositive {
        transform: &'static str,
        attribute: String,
        value: f64,
    },

    /// The model specification is inconsistent (empty predictors, bad hyperparameter, ...).
    #[error("invalid model spec: {0}")]
    InvalidSpec(String),

    /// The underlying smartcore routine failed.
    #[error("model fit failed: {0}")]
    Fit(#[from] smartcore::error::Failed),

    /// A statrs distribution could not be constructed.
    #[error("statistics error: {0}")]
    Statistics(String),

    /// The JSON report could not be written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No preset with this name exists.
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

impl AnalysisError {
    /// Returns `true` if the failure is caused by the predictor choice rather
    /// than the data or the environment.
    pub fn is_modeling_decision(&self) -> bool {
        matches!(
            self,
            AnalysisError::Unidentifiable { .. } | AnalysisError::NonPositive { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unidentifiable_message_names_terms() {
        let err = AnalysisError::Unidentifiable {
            terms: vec!["ra".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unidentifiable model: ra is an exact linear combination of the other terms"
        );
        assert!(err.is_modeling_decision());
    }

    #[test]
    fn io_is_not_modeling_decision() {
        let err = AnalysisError::EmptyDataset("no rows".into());
        assert!(!err.is_modeling_decision());
    }
}
