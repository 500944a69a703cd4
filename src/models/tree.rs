use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

use super::cv::{cross_validate, select};
use super::{check_sizes, CvRule, FittedRegressor, ModelSummary, Regressor, TreeParams, TreeSummary};
use crate::error::{AnalysisError, Result};
use crate::processing::Design;

type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// CART regression tree.
///
/// With `cv_folds` set, the depth is chosen by cross-validation over
/// `1..=max_depth` (one-standard-error rule) before the final fit, which
/// stands in for cost-complexity pruning.
pub struct TreeWrapper {
    params: TreeParams,
}

impl TreeWrapper {
    pub fn new(params: TreeParams) -> Self {
        Self { params }
    }

    fn grow(&self, x: &DenseMatrix<f64>, y: &[f64], depth: u16) -> Result<Tree> {
        let mut params = DecisionTreeRegressorParameters::default();
        params.max_depth = Some(depth);
        params.min_samples_split = self.params.min_samples_split;
        params.min_samples_leaf = self.params.min_samples_leaf;
        Ok(DecisionTreeRegressor::fit(x, &y.to_vec(), params)?)
    }
}

impl Regressor for TreeWrapper {
    fn get_name(&self) -> &str {
        "Decision Tree"
    }

    fn fit(&self, x: &Design, y: &[f64]) -> Result<Box<dyn FittedRegressor>> {
        check_sizes(x, y)?;

        let (depth, cv) = match self.params.cv_folds {
            None => (self.params.max_depth, Vec::new()),
            Some(folds) => {
                let depths: Vec<f64> = (1..=self.params.max_depth).map(f64::from).collect();
                let curve = cross_validate(x, y, folds, self.params.seed, &depths, |train, y_train, validate| {
                    let train = train.to_dense()?;
                    let validate = validate.to_dense()?;
                    (1..=self.params.max_depth)
                        .map(|d| Ok(self.grow(&train, y_train, d)?.predict(&validate)?))
                        .collect()
                })?;
                // shallowest depth first, so 1-SE picks the simplest tree
                let chosen = select(&curve, CvRule::OneStandardError).ok_or_else(|| {
                    AnalysisError::Statistics("tree cross-validation produced no finite error".into())
                })?;
                tracing::debug!(depth = chosen.param, cv_error = chosen.mean_error, "tree depth chosen");
                (chosen.param as u16, curve)
            }
        };

        let model = self.grow(&x.to_dense()?, y, depth)?;
        Ok(Box::new(FittedTree {
            model,
            summary: TreeSummary { depth, cv },
        }))
    }
}

#[derive(Debug)]
struct FittedTree {
    model: Tree,
    summary: TreeSummary,
}

impl FittedRegressor for FittedTree {
    fn predict(&self, x: &Design) -> Result<Vec<f64>> {
        Ok(self.model.predict(&x.to_dense()?)?)
    }

    fn summary(&self) -> ModelSummary {
        ModelSummary::Tree(self.summary.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Design, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (0..60).map(|i| vec![i as f64]).collect();
        let y = (0..60).map(|i| if i < 30 { 10.0 } else { 20.0 }).collect();
        (Design::new(vec!["sa".into()], rows), y)
    }

    #[test]
    fn learns_a_step() {
        let (x, y) = step_data();
        let fitted = TreeWrapper::new(TreeParams::default()).fit(&x, &y).unwrap();
        let probe = Design::new(vec!["sa".into()], vec![vec![5.0], vec![50.0]]);
        let pred = fitted.predict(&probe).unwrap();
        assert!((pred[0] - 10.0).abs() < 1e-9);
        assert!((pred[1] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn cross_validated_depth_is_shallow_for_a_step() {
        let (x, y) = step_data();
        let params = TreeParams {
            max_depth: 6,
            cv_folds: Some(5),
            ..TreeParams::default()
        };
        let fitted = TreeWrapper::new(params).fit(&x, &y).unwrap();
        let ModelSummary::Tree(s) = fitted.summary() else {
            panic!("expected a tree summary")
        };
        assert_eq!(s.cv.len(), 6);
        assert!(s.depth <= 2, "depth = {}", s.depth);
    }
}
