//! Fitting methods behind one fit/predict capability.
//!
//! A [`Regressor`] is a configured, unfitted method. `fit` never mutates it
//! and returns a boxed [`FittedRegressor`] that can only predict and describe
//! itself.

use std::fmt;

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{AnalysisError, Result};
use crate::processing::Design;

pub mod cv;
pub mod factory;
pub mod forest;
pub mod lasso;
pub mod linreg;
pub mod ridge;
pub mod tree;

pub use factory::ModelFactory;
pub use forest::ForestWrapper;
pub use lasso::LassoWrapper;
pub use linreg::LinRegWrapper;
pub use ridge::RidgeWrapper;
pub use tree::TreeWrapper;

pub trait Regressor {
    fn get_name(&self) -> &str;

    /// Whether an exact linear dependency in the design makes the fit undefined.
    fn requires_full_rank(&self) -> bool {
        false
    }

    fn fit(&self, x: &Design, y: &[f64]) -> Result<Box<dyn FittedRegressor>>;
}

pub trait FittedRegressor: fmt::Debug {
    /// Predictions on the scale the model was fitted on.
    fn predict(&self, x: &Design) -> Result<Vec<f64>>;

    fn summary(&self) -> ModelSummary;
}

// ============= Fit method configuration =============

/// Selection rule applied to a cross-validation curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvRule {
    /// Parameter with the smallest mean CV error.
    Min,
    /// Most regularized parameter within one standard error of the minimum.
    OneStandardError,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Penalty {
    Fixed { alpha: f64 },
    CrossValidated { folds: usize, rule: CvRule, seed: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Pick the depth in `1..=max_depth` by k-fold CV instead of growing to `max_depth`.
    pub cv_folds: Option<usize>,
    pub seed: u64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            cv_folds: None,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<u16>,
    /// Candidate predictors per split; `None` means max(1, p / 3).
    pub features_per_split: Option<usize>,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 500,
            max_depth: None,
            features_per_split: None,
            min_samples_leaf: 5,
            seed: 1,
        }
    }
}

/// Fitting method of a model spec with its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum FitMethod {
    Ols,
    Lasso { penalty: Penalty },
    Ridge { alpha: f64 },
    Tree(TreeParams),
    Forest(ForestParams),
}

fn parse_param<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AnalysisError::InvalidSpec(format!("invalid value '{}' for '{}'", value, key)))
}

impl FitMethod {
    pub fn name(&self) -> &'static str {
        match self {
            FitMethod::Ols => "ols",
            FitMethod::Lasso { .. } => "lasso",
            FitMethod::Ridge { .. } => "ridge",
            FitMethod::Tree(_) => "tree",
            FitMethod::Forest(_) => "forest",
        }
    }

    pub fn get_supported_params(&self) -> Vec<&'static str> {
        match self {
            FitMethod::Ols => vec![],
            FitMethod::Lasso { .. } => vec!["alpha", "folds", "rule", "seed"],
            FitMethod::Ridge { .. } => vec!["alpha"],
            FitMethod::Tree(_) => vec![
                "max_depth",
                "min_samples_split",
                "min_samples_leaf",
                "cv_folds",
                "seed",
            ],
            FitMethod::Forest(_) => vec![
                "n_trees",
                "max_depth",
                "features_per_split",
                "min_samples_leaf",
                "seed",
            ],
        }
    }

    /// Sets one hyperparameter from its textual form.
    ///
    /// For LASSO, `alpha` switches to a fixed penalty and `folds`/`rule`/`seed`
    /// switch to cross-validation.
    pub fn set_param(&mut self, key: &str, value: &str) -> Result<()> {
        match self {
            FitMethod::Lasso { penalty } => {
                let (mut folds, mut rule, mut seed) = match *penalty {
                    Penalty::CrossValidated { folds, rule, seed } => (folds, rule, seed),
                    Penalty::Fixed { .. } => (10, CvRule::OneStandardError, 1),
                };
                match key {
                    "alpha" => {
                        *penalty = Penalty::Fixed {
                            alpha: parse_param(key, value)?,
                        };
                        return Ok(());
                    }
                    "folds" => folds = parse_param(key, value)?,
                    "seed" => seed = parse_param(key, value)?,
                    "rule" => {
                        rule = match value.trim() {
                            "min" => CvRule::Min,
                            "1se" | "one_se" => CvRule::OneStandardError,
                            other => {
                                return Err(AnalysisError::InvalidSpec(format!(
                                    "unknown CV rule '{}' (expected min or 1se)",
                                    other
                                )))
                            }
                        }
                    }
                    _ => return Err(unknown_param(key, "lasso")),
                }
                *penalty = Penalty::CrossValidated { folds, rule, seed };
            }
            FitMethod::Ridge { alpha } => match key {
                "alpha" => *alpha = parse_param(key, value)?,
                _ => return Err(unknown_param(key, "ridge")),
            },
            FitMethod::Tree(p) => match key {
                "max_depth" => p.max_depth = parse_param(key, value)?,
                "min_samples_split" => p.min_samples_split = parse_param(key, value)?,
                "min_samples_leaf" => p.min_samples_leaf = parse_param(key, value)?,
                "cv_folds" => {
                    p.cv_folds = match value.trim() {
                        "none" | "0" => None,
                        v => Some(parse_param(key, v)?),
                    }
                }
                "seed" => p.seed = parse_param(key, value)?,
                _ => return Err(unknown_param(key, "tree")),
            },
            FitMethod::Forest(p) => match key {
                "n_trees" => p.n_trees = parse_param(key, value)?,
                "max_depth" => p.max_depth = Some(parse_param(key, value)?),
                "features_per_split" => p.features_per_split = Some(parse_param(key, value)?),
                "min_samples_leaf" => p.min_samples_leaf = parse_param(key, value)?,
                "seed" => p.seed = parse_param(key, value)?,
                _ => return Err(unknown_param(key, "forest")),
            },
            FitMethod::Ols => return Err(unknown_param(key, "ols")),
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(AnalysisError::InvalidSpec(msg));
        match self {
            FitMethod::Ols => Ok(()),
            FitMethod::Lasso {
                penalty: Penalty::Fixed { alpha },
            }
            | FitMethod::Ridge { alpha } => {
                if !(*alpha >= 0.0) || !alpha.is_finite() {
                    return bad(format!("alpha must be a non-negative number, got {}", alpha));
                }
                Ok(())
            }
            FitMethod::Lasso {
                penalty: Penalty::CrossValidated { folds, .. },
            } => {
                if *folds < 2 {
                    return bad(format!("folds must be at least 2, got {}", folds));
                }
                Ok(())
            }
            FitMethod::Tree(p) => {
                if p.max_depth == 0 || p.min_samples_split < 2 || p.min_samples_leaf == 0 {
                    return bad("tree needs max_depth >= 1, min_samples_split >= 2, min_samples_leaf >= 1".into());
                }
                if matches!(p.cv_folds, Some(k) if k < 2) {
                    return bad("tree cv_folds must be at least 2".into());
                }
                Ok(())
            }
            FitMethod::Forest(p) => {
                if p.n_trees == 0 || p.min_samples_leaf == 0 {
                    return bad("forest needs n_trees >= 1 and min_samples_leaf >= 1".into());
                }
                if p.features_per_split == Some(0) || p.max_depth == Some(0) {
                    return bad("forest features_per_split and max_depth must be positive".into());
                }
                Ok(())
            }
        }
    }
}

fn unknown_param(key: &str, method: &str) -> AnalysisError {
    AnalysisError::InvalidSpec(format!("parameter '{}' does not exist for {}", key, method))
}

// ============= Summaries =============

/// One estimated coefficient; inference columns are present only for OLS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: Option<f64>,
    pub t_value: Option<f64>,
    pub p_value: Option<f64>,
}

impl Coefficient {
    pub fn point(name: impl Into<String>, estimate: f64) -> Self {
        Self {
            name: name.into(),
            estimate,
            std_error: None,
            t_value: None,
            p_value: None,
        }
    }
}

pub const INTERCEPT: &str = "(Intercept)";

#[derive(Debug, Clone, Serialize)]
pub struct LinearSummary {
    /// Intercept first, then one entry per design column.
    pub coefficients: Vec<Coefficient>,
    pub residual_std_error: f64,
    pub df_residual: usize,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
}

/// Mean and standard error of the CV error at one parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CvPoint {
    pub param: f64,
    pub mean_error: f64,
    pub std_error: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PenalizedSummary {
    pub method: &'static str,
    pub alpha: f64,
    pub coefficients: Vec<Coefficient>,
    /// Columns whose coefficient is exactly zero.
    pub dropped: Vec<String>,
    pub cv: Vec<CvPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeSummary {
    pub depth: u16,
    pub cv: Vec<CvPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForestSummary {
    pub n_trees: usize,
    pub features_per_split: usize,
    pub max_depth: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSummary {
    Linear(LinearSummary),
    Penalized(PenalizedSummary),
    Tree(TreeSummary),
    Forest(ForestSummary),
}

impl ModelSummary {
    pub fn coefficients(&self) -> &[Coefficient] {
        match self {
            ModelSummary::Linear(s) => &s.coefficients,
            ModelSummary::Penalized(s) => &s.coefficients,
            ModelSummary::Tree(_) | ModelSummary::Forest(_) => &[],
        }
    }

    /// Estimate of the named coefficient, for linear models.
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.coefficients()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.estimate)
    }
}

// ============= Helpers shared by the wrappers =============

/// Intercept and slopes of a fitted affine map, read off its predictions at
/// the origin and at each unit vector.
pub(crate) fn probe_affine<F>(p: usize, predict: F) -> Result<(f64, Vec<f64>)>
where
    F: FnOnce(&DenseMatrix<f64>) -> Result<Vec<f64>>,
{
    let mut rows = vec![vec![0.0; p]; p + 1];
    for (j, row) in rows.iter_mut().skip(1).enumerate() {
        row[j] = 1.0;
    }
    let probe = DenseMatrix::from_2d_vec(&rows)?;
    let out = predict(&probe)?;
    let intercept = out[0];
    let slopes = out[1..].iter().map(|v| v - intercept).collect();
    Ok((intercept, slopes))
}

pub(crate) fn check_sizes(x: &Design, y: &[f64]) -> Result<()> {
    if x.n_rows() != y.len() {
        return Err(AnalysisError::InvalidSpec(format!(
            "design has {} rows but target has {}",
            x.n_rows(),
            y.len()
        )));
    }
    if x.n_rows() == 0 || x.n_cols() == 0 {
        return Err(AnalysisError::EmptyDataset("nothing to fit".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_param_updates_forest() {
        let mut m = FitMethod::Forest(ForestParams::default());
        m.set_param("n_trees", "50").unwrap();
        m.set_param("features_per_split", "2").unwrap();
        match m {
            FitMethod::Forest(p) => {
                assert_eq!(p.n_trees, 50);
                assert_eq!(p.features_per_split, Some(2));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn lasso_alpha_switches_to_fixed_penalty() {
        let mut m = FitMethod::Lasso {
            penalty: Penalty::CrossValidated {
                folds: 10,
                rule: CvRule::Min,
                seed: 1,
            },
        };
        m.set_param("alpha", "0.5").unwrap();
        assert_eq!(
            m,
            FitMethod::Lasso {
                penalty: Penalty::Fixed { alpha: 0.5 }
            }
        );
        m.set_param("rule", "1se").unwrap();
        assert!(matches!(
            m,
            FitMethod::Lasso {
                penalty: Penalty::CrossValidated {
                    rule: CvRule::OneStandardError,
                    ..
                }
            }
        ));
    }

    #[test]
    fn unknown_and_invalid_params_are_rejected() {
        let mut m = FitMethod::Tree(TreeParams::default());
        assert!(m.set_param("n_trees", "3").is_err());
        assert!(m.set_param("max_depth", "deep").is_err());
        assert!(m.set_param("max_depth", "0").is_err());
        assert!(FitMethod::Ols.clone().set_param("alpha", "1").is_err());
    }

    #[test]
    fn supported_params_are_settable() {
        let methods = [
            FitMethod::Ridge { alpha: 1.0 },
            FitMethod::Tree(TreeParams::default()),
            FitMethod::Forest(ForestParams::default()),
        ];
        for method in methods {
            for key in method.get_supported_params() {
                let mut m = method.clone();
                assert!(m.set_param(key, "3").is_ok(), "{} {}", method.name(), key);
            }
        }
    }
}
