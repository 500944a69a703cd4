//! L1-penalized least squares by cyclic coordinate descent.
//!
//! Minimizes `(1 / 2n) ‖y - b0 - Xb‖² + α ‖b‖₁` with the columns of `X`
//! standardized to population unit variance, so coefficients that reach zero
//! are exactly zero. The reported coefficients are on the original column
//! scale.

use ndarray::{Array1, Array2, Axis};

use super::cv::{cross_validate, select};
use super::{
    check_sizes, Coefficient, CvPoint, FittedRegressor, ModelSummary, PenalizedSummary, Penalty,
    Regressor, INTERCEPT,
};
use crate::error::{AnalysisError, Result};
use crate::processing::Design;

const N_ALPHAS: usize = 100;
const ALPHA_MIN_RATIO: f64 = 1e-4;
const TOLERANCE: f64 = 1e-7;
const MAX_SWEEPS: usize = 10_000;

pub struct LassoWrapper {
    penalty: Penalty,
}

impl LassoWrapper {
    pub fn new(penalty: Penalty) -> Self {
        Self { penalty }
    }
}

impl Regressor for LassoWrapper {
    fn get_name(&self) -> &str {
        "LASSO"
    }

    fn fit(&self, x: &Design, y: &[f64]) -> Result<Box<dyn FittedRegressor>> {
        check_sizes(x, y)?;
        let problem = Standardized::new(x, y);

        let (alpha, cv) = match self.penalty {
            Penalty::Fixed { alpha } => (alpha, Vec::new()),
            Penalty::CrossValidated { folds, rule, seed } => {
                let grid = alpha_grid(problem.alpha_max());
                let curve = cross_validate(x, y, folds, seed, &grid, |train, y_train, validate| {
                    let fold = Standardized::new(train, y_train);
                    Ok(fold
                        .path(&grid)
                        .iter()
                        .map(|beta| fold.unscale(beta).predict(validate))
                        .collect())
                })?;
                let chosen = select(&curve, rule).ok_or_else(|| {
                    AnalysisError::Statistics("LASSO cross-validation produced no finite error".into())
                })?;
                tracing::debug!(alpha = chosen.param, cv_error = chosen.mean_error, "LASSO penalty chosen");
                (chosen.param, curve)
            }
        };

        let beta = problem.path(&[alpha]).pop().unwrap_or_else(|| Array1::zeros(x.n_cols()));
        let fitted = problem.unscale(&beta);
        Ok(Box::new(FittedLasso {
            names: x.names().to_vec(),
            alpha,
            line: fitted,
            cv,
        }))
    }
}

/// Decreasing log-spaced penalties from `alpha_max` (all coefficients zero)
/// down to `ALPHA_MIN_RATIO * alpha_max`.
fn alpha_grid(alpha_max: f64) -> Vec<f64> {
    if !(alpha_max > 0.0) {
        return vec![0.0];
    }
    let ratio = ALPHA_MIN_RATIO.ln() / (N_ALPHAS - 1) as f64;
    (0..N_ALPHAS)
        .map(|i| alpha_max * (ratio * i as f64).exp())
        .collect()
}

fn soft_threshold(z: f64, alpha: f64) -> f64 {
    if z > alpha {
        z - alpha
    } else if z < -alpha {
        z + alpha
    } else {
        0.0
    }
}

/// Centered target and standardized columns of one fitting problem.
struct Standardized {
    x: Array2<f64>,
    y: Array1<f64>,
    means: Array1<f64>,
    scales: Array1<f64>,
    y_mean: f64,
}

impl Standardized {
    fn new(design: &Design, y: &[f64]) -> Self {
        let mut x = design.to_array();
        let n = x.nrows() as f64;
        let means = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
        let scales = x.std_axis(Axis(0), 0.0);
        for (j, mut column) in x.columns_mut().into_iter().enumerate() {
            if scales[j] > 0.0 {
                column.mapv_inplace(|v| (v - means[j]) / scales[j]);
            } else {
                column.fill(0.0);
            }
        }
        let y_mean = y.iter().sum::<f64>() / n;
        let y = y.iter().map(|v| v - y_mean).collect();
        Self {
            x,
            y,
            means,
            scales,
            y_mean,
        }
    }

    fn n(&self) -> f64 {
        self.x.nrows() as f64
    }

    /// Smallest penalty at which every coefficient is zero.
    fn alpha_max(&self) -> f64 {
        self.x
            .t()
            .dot(&self.y)
            .iter()
            .fold(0.0f64, |m, v| m.max(v.abs()))
            / self.n()
    }

    /// Standardized coefficients along `alphas`, each fit warm-started from
    /// the previous one.
    fn path(&self, alphas: &[f64]) -> Vec<Array1<f64>> {
        let p = self.x.ncols();
        let mut beta = Array1::<f64>::zeros(p);
        let mut residual = self.y.clone();
        let mut out = Vec::with_capacity(alphas.len());

        for &alpha in alphas {
            for _ in 0..MAX_SWEEPS {
                let mut max_step = 0.0f64;
                for j in 0..p {
                    if self.scales[j] <= 0.0 {
                        continue;
                    }
                    let column = self.x.column(j);
                    // columns have (1/n) Σ x² = 1
                    let rho = column.dot(&residual) / self.n() + beta[j];
                    let updated = soft_threshold(rho, alpha);
                    let step = updated - beta[j];
                    if step != 0.0 {
                        residual.scaled_add(-step, &column);
                        beta[j] = updated;
                        max_step = max_step.max(step.abs());
                    }
                }
                if max_step < TOLERANCE {
                    break;
                }
            }
            out.push(beta.clone());
        }
        out
    }

    fn unscale(&self, beta: &Array1<f64>) -> AffineFit {
        let slopes: Vec<f64> = beta
            .iter()
            .zip(self.scales.iter())
            .map(|(b, s)| if *s > 0.0 { b / s } else { 0.0 })
            .collect();
        let intercept = self.y_mean
            - slopes
                .iter()
                .zip(self.means.iter())
                .map(|(b, m)| b * m)
                .sum::<f64>();
        AffineFit { intercept, slopes }
    }
}

#[derive(Debug, Clone)]
struct AffineFit {
    intercept: f64,
    slopes: Vec<f64>,
}

impl AffineFit {
    fn predict(&self, x: &Design) -> Vec<f64> {
        x.rows()
            .iter()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(&self.slopes)
                        .map(|(v, b)| v * b)
                        .sum::<f64>()
            })
            .collect()
    }
}

#[derive(Debug)]
struct FittedLasso {
    names: Vec<String>,
    alpha: f64,
    line: AffineFit,
    cv: Vec<CvPoint>,
}

impl FittedRegressor for FittedLasso {
    fn predict(&self, x: &Design) -> Result<Vec<f64>> {
        if x.n_cols() != self.line.slopes.len() {
            return Err(AnalysisError::InvalidSpec(format!(
                "LASSO fitted on {} columns, got {}",
                self.line.slopes.len(),
                x.n_cols()
            )));
        }
        Ok(self.line.predict(x))
    }

    fn summary(&self) -> ModelSummary {
        let coefficients = std::iter::once(Coefficient::point(INTERCEPT, self.line.intercept))
            .chain(
                self.names
                    .iter()
                    .zip(&self.line.slopes)
                    .map(|(n, b)| Coefficient::point(n.clone(), *b)),
            )
            .collect();
        let dropped = self
            .names
            .iter()
            .zip(&self.line.slopes)
            .filter(|(_, b)| **b == 0.0)
            .map(|(n, _)| n.clone())
            .collect();
        ModelSummary::Penalized(PenalizedSummary {
            method: "lasso",
            alpha: self.alpha,
            coefficients,
            dropped,
            cv: self.cv.clone(),
        })
    }
}
