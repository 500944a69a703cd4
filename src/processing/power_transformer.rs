use ndarray::{Array1, Array2};

use crate::data_loading::Attribute;
use crate::error::{AnalysisError, Result};
use crate::linalg::LeastSquares;

/// Below this |lambda| the Box-Cox transform is taken to be the natural log.
const LAMBDA_EPS: f64 = 1e-8;

/// Box-Cox power transformer.
///
/// The exponent is estimated by maximising the profile log-likelihood
/// `-n/2 ln(RSS(λ)/n) + (λ - 1) Σ ln y` over λ in [-2, 2] in steps of 0.01,
/// either around the mean (a single column) or around a linear fit (a
/// regression target).
pub struct PowerTransformer;

impl PowerTransformer {
    /// Candidate exponents, exactly -2.00, -1.99, ..., 2.00.
    fn lambda_grid() -> impl Iterator<Item = f64> {
        (0..=400).map(|i| (i as f64 - 200.0) / 100.0)
    }

    pub fn box_cox_transform(x: f64, lambda: f64) -> f64 {
        if lambda.abs() < LAMBDA_EPS {
            x.ln()
        } else {
            (x.powf(lambda) - 1.0) / lambda
        }
    }

    /// Inverse transform. Values outside the image of the forward transform
    /// are clamped to the boundary of its domain.
    pub fn box_cox_inverse(y: f64, lambda: f64) -> f64 {
        if lambda.abs() < LAMBDA_EPS {
            y.exp()
        } else {
            (lambda * y + 1.0).max(0.0).powf(1.0 / lambda)
        }
    }

    fn check_positive(attribute: Attribute, values: &[f64]) -> Result<()> {
        match values.iter().find(|v| **v <= 0.0) {
            Some(&value) => Err(AnalysisError::NonPositive {
                transform: "box-cox",
                attribute: attribute.code().to_string(),
                value,
            }),
            None => Ok(()),
        }
    }

    fn profile<F>(values: &[f64], mut rss: F) -> f64
    where
        F: FnMut(&Array1<f64>) -> f64,
    {
        let n = values.len() as f64;
        let sum_log: f64 = values.iter().map(|v| v.ln()).sum();

        let mut best = (f64::NEG_INFINITY, 1.0);
        for lambda in Self::lambda_grid() {
            let z: Array1<f64> = values
                .iter()
                .map(|&v| Self::box_cox_transform(v, lambda))
                .collect();
            let r = rss(&z);
            if !(r > 0.0) || !r.is_finite() {
                continue;
            }
            let ll = -0.5 * n * (r / n).ln() + (lambda - 1.0) * sum_log;
            if ll > best.0 {
                best = (ll, lambda);
            }
        }
        best.1
    }

    /// Exponent for a single column (profile around its mean).
    pub fn estimate_lambda(attribute: Attribute, values: &[f64]) -> Result<f64> {
        if values.len() < 2 {
            return Err(AnalysisError::EmptyDataset(format!(
                "box-cox on '{}' needs at least two values",
                attribute
            )));
        }
        Self::check_positive(attribute, values)?;
        let lambda = Self::profile(values, |z| {
            let mean = z.mean().unwrap_or(0.0);
            z.mapv(|v| (v - mean) * (v - mean)).sum()
        });
        tracing::debug!(attribute = attribute.code(), lambda, "box-cox exponent (marginal)");
        Ok(lambda)
    }

    /// Exponent for a regression target given its design (intercept included).
    ///
    /// Falls back to the marginal estimate when the design is rank-deficient.
    pub fn estimate_lambda_regression(
        attribute: Attribute,
        values: &[f64],
        design: Array2<f64>,
    ) -> Result<f64> {
        Self::check_positive(attribute, values)?;
        match LeastSquares::new(design) {
            Some(ls) if values.len() > ls.n_cols() => {
                let lambda = Self::profile(values, |z| ls.rss(z));
                tracing::debug!(attribute = attribute.code(), lambda, "box-cox exponent (regression)");
                Ok(lambda)
            }
            _ => Self::estimate_lambda(attribute, values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::with_intercept;
    use statrs::distribution::{ContinuousCDF, Normal};

    fn normal_scores(n: usize) -> Vec<f64> {
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n)
            .map(|i| normal.inverse_cdf((i as f64 + 0.5) / n as f64))
            .collect()
    }

    #[test]
    fn lognormal_data_gives_lambda_near_zero() {
        let values: Vec<f64> = normal_scores(200).iter().map(|z| (3.0 + 0.4 * z).exp()).collect();
        let lambda = PowerTransformer::estimate_lambda(Attribute::HeatingLoad, &values).unwrap();
        assert!(lambda.abs() <= 0.1, "lambda = {lambda}");
    }

    #[test]
    fn squared_normal_data_gives_lambda_near_half() {
        let values: Vec<f64> = normal_scores(400).iter().map(|z| (10.0 + 2.0 * z).powi(2)).collect();
        let lambda = PowerTransformer::estimate_lambda(Attribute::HeatingLoad, &values).unwrap();
        assert!((lambda - 0.5).abs() <= 0.15, "lambda = {lambda}");
    }

    #[test]
    fn inverse_round_trips() {
        for &lambda in &[-1.5, -0.3, 0.0, 0.25, 1.0, 2.0] {
            let y = PowerTransformer::box_cox_transform(23.7, lambda);
            let back = PowerTransformer::box_cox_inverse(y, lambda);
            assert!((back - 23.7).abs() < 1e-9, "lambda {lambda}: {back}");
        }
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let err = PowerTransformer::estimate_lambda(Attribute::GlazingArea, &[0.1, 0.0, 0.4])
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NonPositive { transform: "box-cox", .. }));
    }

    #[test]
    fn regression_profile_uses_the_design() {
        // log y is exactly linear in x, so the residual-based profile prefers lambda 0
        let xs: Vec<f64> = (0..60).map(|i| i as f64 / 10.0).collect();
        let wiggle = normal_scores(60);
        let values: Vec<f64> = xs
            .iter()
            .enumerate()
            .map(|(i, x)| (1.0 + 0.5 * x + 0.05 * wiggle[(i * 37) % 60]).exp())
            .collect();
        let design = with_intercept(&Array2::from_shape_vec((60, 1), xs).unwrap());
        let lambda =
            PowerTransformer::estimate_lambda_regression(Attribute::HeatingLoad, &values, design)
                .unwrap();
        assert!(lambda.abs() <= 0.2, "lambda = {lambda}");
    }
}
