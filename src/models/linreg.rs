use ndarray::Array1;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use super::{
    check_sizes, probe_affine, Coefficient, FittedRegressor, LinearSummary, ModelSummary,
    Regressor, INTERCEPT,
};
use crate::error::{AnalysisError, Result};
use crate::linalg::{spd_inverse, with_intercept};
use crate::processing::Design;

/// Ordinary least squares with an intercept (QR solver), plus the classical
/// inference table computed from `(XᵀX)⁻¹`.
pub struct LinRegWrapper;

impl LinRegWrapper {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinRegWrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Regressor for LinRegWrapper {
    fn get_name(&self) -> &str {
        "Linear Regression"
    }

    fn requires_full_rank(&self) -> bool {
        true
    }

    fn fit(&self, x: &Design, y: &[f64]) -> Result<Box<dyn FittedRegressor>> {
        check_sizes(x, y)?;
        let aliased = x.aliased_columns();
        if !aliased.is_empty() {
            return Err(AnalysisError::Unidentifiable { terms: aliased });
        }
        let n = x.n_rows();
        let p = x.n_cols();
        if n <= p + 1 {
            return Err(AnalysisError::InvalidSpec(format!(
                "{} observations cannot support {} coefficients",
                n,
                p + 1
            )));
        }

        let mut params = LinearRegressionParameters::default();
        params.solver = LinearRegressionSolverName::QR;
        let dense = x.to_dense()?;
        let model = LinearRegression::fit(&dense, &y.to_vec(), params)?;

        let (intercept, slopes) = probe_affine(p, |probe| Ok(model.predict(probe)?))?;
        let fitted = model.predict(&dense)?;
        let summary = inference(x, y, &fitted, intercept, &slopes)?;

        Ok(Box::new(FittedLinReg { model, summary }))
    }
}

fn inference(
    x: &Design,
    y: &[f64],
    fitted: &[f64],
    intercept: f64,
    slopes: &[f64],
) -> Result<LinearSummary> {
    let n = y.len();
    let p = slopes.len();
    let df = n - p - 1;

    let mean = y.iter().sum::<f64>() / n as f64;
    let rss: f64 = y.iter().zip(fitted).map(|(a, b)| (a - b).powi(2)).sum();
    let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let sigma2 = rss / df as f64;

    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 1.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / df as f64;

    let design = with_intercept(&x.to_array());
    let covariance = spd_inverse(&design.t().dot(&design)).map(|inv| inv * sigma2);

    let t_dist = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| AnalysisError::Statistics(e.to_string()))?;

    let estimates: Array1<f64> = std::iter::once(intercept).chain(slopes.iter().copied()).collect();
    let names = std::iter::once(INTERCEPT.to_string()).chain(x.names().iter().cloned());
    let coefficients = names
        .zip(estimates.iter())
        .enumerate()
        .map(|(j, (name, &estimate))| {
            let se = covariance.as_ref().map(|c| c[[j, j]].max(0.0).sqrt());
            let t = se.filter(|s| *s > 0.0).map(|s| estimate / s);
            Coefficient {
                name,
                estimate,
                std_error: se,
                t_value: t,
                p_value: t.map(|t| 2.0 * t_dist.sf(t.abs())),
            }
        })
        .collect();

    let (f_statistic, f_p_value) = if rss > 0.0 {
        let f = ((tss - rss) / p as f64) / sigma2;
        let dist = FisherSnedecor::new(p as f64, df as f64)
            .map_err(|e| AnalysisError::Statistics(e.to_string()))?;
        (f, dist.sf(f.max(0.0)))
    } else {
        (f64::INFINITY, 0.0)
    };

    Ok(LinearSummary {
        coefficients,
        residual_std_error: sigma2.sqrt(),
        df_residual: df,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value,
    })
}

#[derive(Debug)]
struct FittedLinReg {
    model: LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    summary: LinearSummary,
}

impl FittedRegressor for FittedLinReg {
    fn predict(&self, x: &Design) -> Result<Vec<f64>> {
        Ok(self.model.predict(&x.to_dense()?)?)
    }

    fn summary(&self) -> ModelSummary {
        ModelSummary::Linear(self.summary.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(rows: Vec<Vec<f64>>, names: &[&str]) -> Design {
        Design::new(names.iter().map(|s| s.to_string()).collect(), rows)
    }

    #[test]
    fn recovers_planted_coefficients() {
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![i as f64, ((i * 7) % 11) as f64])
            .collect();
        let noise = [0.03, -0.02, 0.01, -0.04, 0.02];
        let y: Vec<f64> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| 2.0 + 0.5 * r[0] - 1.5 * r[1] + noise[i % 5])
            .collect();
        let x = design(rows, &["a", "b"]);
        let fitted = LinRegWrapper::new().fit(&x, &y).unwrap();
        let summary = fitted.summary();

        assert!((summary.coefficient(INTERCEPT).unwrap() - 2.0).abs() < 0.05);
        assert!((summary.coefficient("a").unwrap() - 0.5).abs() < 0.01);
        assert!((summary.coefficient("b").unwrap() + 1.5).abs() < 0.01);

        let ModelSummary::Linear(s) = summary else {
            panic!("expected a linear summary")
        };
        assert_eq!(s.df_residual, 37);
        assert!(s.r_squared > 0.99);
        assert!(s.adj_r_squared <= s.r_squared);
        assert!(s.coefficients[1].p_value.unwrap() < 1e-6);
        assert!(s.f_p_value < 1e-6);
    }

    #[test]
    fn exact_combination_is_unidentifiable() {
        let rows: Vec<Vec<f64>> = (0..12)
            .map(|i| {
                let wa = 245.0 + 24.5 * (i % 5) as f64;
                let ra = 110.25 + 12.25 * (i % 3) as f64;
                vec![wa + 2.0 * ra, wa, ra]
            })
            .collect();
        let y: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let x = design(rows, &["sa", "wa", "ra"]);
        match LinRegWrapper::new().fit(&x, &y) {
            Err(AnalysisError::Unidentifiable { terms }) => assert_eq!(terms, vec!["ra"]),
            other => panic!("expected Unidentifiable, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn too_few_rows_is_rejected() {
        let x = design(vec![vec![1.0], vec![2.0]], &["a"]);
        assert!(LinRegWrapper::new().fit(&x, &[1.0, 2.0]).is_err());
    }
}
