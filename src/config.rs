//! Analysis configuration.
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file) reproduces the reference analysis.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Tunables shared by every stage of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Seed for the train/test partition, CV folds and the forest.
    pub seed: u64,
    /// Share of rows assigned to the training subset.
    pub train_fraction: f64,
    /// Leading CSV columns that are row indices and get discarded.
    pub index_columns: usize,
    /// Folds for LASSO and tree-depth cross-validation.
    pub cv_folds: usize,
    /// Trees in the random forest.
    pub forest_trees: usize,
    /// Depth of the unpruned tree, and upper bound for the CV depth search.
    pub tree_max_depth: u16,
    /// Largest subset size considered by best-subset selection.
    pub best_subset_max_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            train_fraction: 0.75,
            index_columns: 2,
            cv_folds: 10,
            forest_trees: 500,
            tree_max_depth: 10,
            best_subset_max_size: 7,
        }
    }
}

impl AnalysisConfig {
    /// Parses a TOML document and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(text).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the config from `path`, or returns the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                tracing::debug!(path = %p.display(), "loading analysis config");
                Self::from_toml_str(&text)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(AnalysisError::Config(format!(
                "train_fraction must be in (0, 1), got {}",
                self.train_fraction
            )));
        }
        if self.cv_folds < 2 {
            return Err(AnalysisError::Config(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.forest_trees == 0 {
            return Err(AnalysisError::Config("forest_trees must be at least 1".into()));
        }
        if self.tree_max_depth == 0 {
            return Err(AnalysisError::Config("tree_max_depth must be at least 1".into()));
        }
        if self.best_subset_max_size == 0 {
            return Err(AnalysisError::Config(
                "best_subset_max_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.train_fraction, 0.75);
        assert_eq!(config.index_columns, 2);
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = AnalysisConfig::from_toml_str("seed = 42\nforest_trees = 50\n").unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.forest_trees, 50);
        assert_eq!(config.cv_folds, 10);
    }

    #[test]
    fn rejects_bad_fraction() {
        let err = AnalysisConfig::from_toml_str("train_fraction = 1.0").unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn rejects_single_fold() {
        assert!(AnalysisConfig::from_toml_str("cv_folds = 1").is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(AnalysisConfig::from_toml_str("sed = 3").is_err());
    }

    #[test]
    fn load_without_path_is_default() {
        assert_eq!(AnalysisConfig::load(None).unwrap(), AnalysisConfig::default());
    }
}
