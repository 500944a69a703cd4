use statrs::statistics::Statistics;

use super::{CvPoint, CvRule};
use crate::data_loading::partition;
use crate::error::{AnalysisError, Result};
use crate::processing::Design;

/// K-fold cross-validation of a family of fits over `params`.
///
/// `fit_predict(train, y_train, validate)` returns one prediction vector per
/// parameter, in the order of `params`, so a path algorithm can warm-start
/// through the whole grid in one call. Errors are mean squared errors.
pub fn cross_validate<F>(
    x: &Design,
    y: &[f64],
    folds: usize,
    seed: u64,
    params: &[f64],
    mut fit_predict: F,
) -> Result<Vec<CvPoint>>
where
    F: FnMut(&Design, &[f64], &Design) -> Result<Vec<Vec<f64>>>,
{
    let positions: Vec<usize> = (0..x.n_rows()).collect();
    let folds = partition::k_folds(&positions, folds, seed)?;

    // errors[param][fold]
    let mut errors = vec![Vec::with_capacity(folds.len()); params.len()];
    for fold in &folds {
        let train = x.select_rows(&fold.fit);
        let y_train: Vec<f64> = fold.fit.iter().map(|&i| y[i]).collect();
        let validate = x.select_rows(&fold.validate);
        let predictions = fit_predict(&train, &y_train, &validate)?;
        if predictions.len() != params.len() {
            return Err(AnalysisError::Statistics(format!(
                "cross-validation expected {} prediction sets, got {}",
                params.len(),
                predictions.len()
            )));
        }
        for (k, pred) in predictions.iter().enumerate() {
            let mse = fold
                .validate
                .iter()
                .zip(pred)
                .map(|(&i, p)| (y[i] - p).powi(2))
                .sum::<f64>()
                / fold.validate.len() as f64;
            errors[k].push(mse);
        }
    }

    let k = folds.len() as f64;
    Ok(params
        .iter()
        .zip(errors)
        .map(|(&param, errs)| CvPoint {
            param,
            mean_error: errs.iter().mean(),
            std_error: errs.iter().std_dev() / k.sqrt(),
        })
        .collect())
}

/// Chosen parameter under `rule`.
///
/// `curve` must be ordered from most to least regularized, so the 1-SE rule
/// takes the first point within one standard error of the minimum.
pub fn select(curve: &[CvPoint], rule: CvRule) -> Option<CvPoint> {
    let best = curve
        .iter()
        .filter(|p| p.mean_error.is_finite())
        .min_by(|a, b| a.mean_error.total_cmp(&b.mean_error))?;
    match rule {
        CvRule::Min => Some(*best),
        CvRule::OneStandardError => {
            let threshold = best.mean_error + best.std_error;
            curve.iter().find(|p| p.mean_error <= threshold).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(param: f64, mean_error: f64, std_error: f64) -> CvPoint {
        CvPoint {
            param,
            mean_error,
            std_error,
        }
    }

    #[test]
    fn one_se_rule_prefers_simpler_model() {
        let curve = [
            point(1.0, 5.0, 0.5),
            point(0.5, 2.3, 0.2),
            point(0.1, 2.0, 0.4),
            point(0.01, 2.1, 0.4),
        ];
        assert_eq!(select(&curve, CvRule::Min).unwrap().param, 0.1);
        assert_eq!(select(&curve, CvRule::OneStandardError).unwrap().param, 0.5);
    }

    #[test]
    fn constant_prediction_errors_match_variance() {
        let x = Design::new(vec!["x".into()], (0..20).map(|i| vec![i as f64]).collect());
        let y: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let curve = cross_validate(&x, &y, 4, 3, &[0.0], |_, _, v| {
            Ok(vec![vec![0.0; v.n_rows()]])
        })
        .unwrap();
        assert_eq!(curve.len(), 1);
        assert!((curve[0].mean_error - 1.0).abs() < 1e-12);
        assert!(curve[0].std_error.abs() < 1e-12);
    }
}
