use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::{check_sizes, FittedRegressor, ForestParams, ForestSummary, ModelSummary, Regressor};
use crate::error::Result;
use crate::processing::Design;

/// Bagged regression trees with per-split feature sampling, seeded so a run
/// is reproducible.
pub struct ForestWrapper {
    params: ForestParams,
}

impl ForestWrapper {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }

    /// Candidate predictors per split for `p` design columns.
    pub fn features_per_split(&self, p: usize) -> usize {
        self.params
            .features_per_split
            .unwrap_or(p / 3)
            .clamp(1, p.max(1))
    }
}

impl Regressor for ForestWrapper {
    fn get_name(&self) -> &str {
        "Random Forest"
    }

    fn fit(&self, x: &Design, y: &[f64]) -> Result<Box<dyn FittedRegressor>> {
        check_sizes(x, y)?;
        let m = self.features_per_split(x.n_cols());

        let mut params = RandomForestRegressorParameters::default();
        params.n_trees = self.params.n_trees;
        params.max_depth = self.params.max_depth;
        params.min_samples_leaf = self.params.min_samples_leaf;
        params.m = Some(m);
        params.seed = self.params.seed;

        tracing::debug!(n_trees = params.n_trees, m, "growing random forest");
        let model = RandomForestRegressor::fit(&x.to_dense()?, &y.to_vec(), params)?;
        Ok(Box::new(FittedForest {
            model,
            summary: ForestSummary {
                n_trees: self.params.n_trees,
                features_per_split: m,
                max_depth: self.params.max_depth,
            },
        }))
    }
}

#[derive(Debug)]
struct FittedForest {
    model: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    summary: ForestSummary,
}

impl FittedRegressor for FittedForest {
    fn predict(&self, x: &Design) -> Result<Vec<f64>> {
        Ok(self.model.predict(&x.to_dense()?)?)
    }

    fn summary(&self) -> ModelSummary {
        ModelSummary::Forest(self.summary.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (Design, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (0..80)
            .map(|i| vec![(i % 20) as f64, ((i * 7) % 9) as f64, ((i * 5) % 4) as f64])
            .collect();
        let y = rows.iter().map(|r| 2.0 * r[0] + r[1]).collect();
        (Design::new(vec!["a".into(), "b".into(), "c".into()], rows), y)
    }

    #[test]
    fn same_seed_same_predictions() {
        let (x, y) = data();
        let params = ForestParams {
            n_trees: 20,
            seed: 42,
            ..ForestParams::default()
        };
        let first = ForestWrapper::new(params).fit(&x, &y).unwrap().predict(&x).unwrap();
        let second = ForestWrapper::new(params).fit(&x, &y).unwrap().predict(&x).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn default_m_is_a_third_of_the_columns() {
        let wrapper = ForestWrapper::new(ForestParams::default());
        assert_eq!(wrapper.features_per_split(12), 4);
        assert_eq!(wrapper.features_per_split(2), 1);
    }
}
