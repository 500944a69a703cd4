use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::ridge_regression::{
    RidgeRegression, RidgeRegressionParameters, RidgeRegressionSolverName,
};

use super::{
    check_sizes, probe_affine, Coefficient, FittedRegressor, ModelSummary, PenalizedSummary,
    Regressor, INTERCEPT,
};
use crate::error::Result;
use crate::processing::Design;

/// L2-penalized least squares on normalized columns.
pub struct RidgeWrapper {
    alpha: f64,
}

impl RidgeWrapper {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }
}

impl Regressor for RidgeWrapper {
    fn get_name(&self) -> &str {
        "Ridge"
    }

    fn fit(&self, x: &Design, y: &[f64]) -> Result<Box<dyn FittedRegressor>> {
        check_sizes(x, y)?;
        let params = RidgeRegressionParameters {
            alpha: self.alpha,
            normalize: true,
            solver: RidgeRegressionSolverName::SVD,
        };
        let model = RidgeRegression::fit(&x.to_dense()?, &y.to_vec(), params)?;
        let (intercept, slopes) = probe_affine(x.n_cols(), |probe| Ok(model.predict(probe)?))?;

        let coefficients = std::iter::once(Coefficient::point(INTERCEPT, intercept))
            .chain(
                x.names()
                    .iter()
                    .zip(&slopes)
                    .map(|(n, b)| Coefficient::point(n.clone(), *b)),
            )
            .collect();
        Ok(Box::new(FittedRidge {
            model,
            summary: PenalizedSummary {
                method: "ridge",
                alpha: self.alpha,
                coefficients,
                dropped: Vec::new(),
                cv: Vec::new(),
            },
        }))
    }
}

#[derive(Debug)]
struct FittedRidge {
    model: RidgeRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    summary: PenalizedSummary,
}

impl FittedRegressor for FittedRidge {
    fn predict(&self, x: &Design) -> Result<Vec<f64>> {
        Ok(self.model.predict(&x.to_dense()?)?)
    }

    fn summary(&self) -> ModelSummary {
        ModelSummary::Penalized(self.summary.clone())
    }
}
