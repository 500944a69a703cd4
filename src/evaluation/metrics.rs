use std::collections::BTreeMap;

use serde::Serialize;
use smartcore::metrics::{mean_absolute_error, mean_squared_error, r2};
use statrs::statistics::Statistics;

use crate::models::ModelSummary;
use crate::pipeline::PipelineInfo;

/// Named scalar metrics of one evaluation, in a stable order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    pub metrics: BTreeMap<String, f64>,
}

impl EvaluationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_metric(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_string(), value);
    }

    pub fn get_metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Error metrics of `predicted` against `actual`.
    pub fn regression(actual: &[f64], predicted: &[f64]) -> Self {
        let y_true = actual.to_vec();
        let y_pred = predicted.to_vec();
        let mse = mean_squared_error(&y_true, &y_pred);

        let mut report = Self::new();
        report.add_metric("mse", mse);
        report.add_metric("rmse", mse.sqrt());
        report.add_metric("mae", mean_absolute_error(&y_true, &y_pred));
        report.add_metric("r2", r2(&y_true, &y_pred));
        report.add_metric("median_absolute_error", median_absolute_error(actual, predicted));
        report
    }
}

/// Held-out result of one model spec.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub info: PipelineInfo,
    pub n_train: usize,
    pub n_test: usize,
    /// Mean squared test error on the transformed target scale.
    pub mse: f64,
    /// Pearson correlation of predicted and actual test values on the
    /// transformed target scale.
    pub correlation: f64,
    /// `(predicted, actual)` on the transformed scale.
    pub pairs: Vec<(f64, f64)>,
    /// `(predicted, actual)` back on the original target scale.
    pub original_pairs: Vec<(f64, f64)>,
    pub metrics: EvaluationReport,
    pub original_metrics: EvaluationReport,
    pub summary: ModelSummary,
}

/// Pearson correlation; 0 when either sequence is constant or shorter than two.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let sd_x = x.iter().std_dev();
    let sd_y = y.iter().std_dev();
    if !(sd_x > 0.0 && sd_y > 0.0 && sd_x.is_finite() && sd_y.is_finite()) {
        return 0.0;
    }
    let r = x.iter().covariance(y.iter()) / (sd_x * sd_y);
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn median_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let mut errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .collect();
    if errors.is_empty() {
        return 0.0;
    }
    errors.sort_by(|a, b| a.total_cmp(b));

    let n = errors.len();
    if n % 2 == 0 {
        (errors[n / 2 - 1] + errors[n / 2]) / 2.0
    } else {
        errors[n / 2]
    }
}
