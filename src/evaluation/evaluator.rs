use super::metrics::{pearson_correlation, Evaluation, EvaluationReport};
use crate::data_loading::{Dataset, Partition};
use crate::error::{AnalysisError, Result};
use crate::linalg::with_intercept;
use crate::models::ModelFactory;
use crate::pipeline::{FittedPipeline, ModelSpec};
use crate::processing::{DesignEncoder, PowerTransformer, Transform, TransformKind};

/// Fits a model spec on training rows and scores it on held-out rows.
///
/// Stateless: the dataset and partition are only borrowed, and every call
/// returns fresh values.
pub struct Evaluator;

impl Evaluator {
    /// Fits `spec` using only `rows` of the dataset.
    ///
    /// Predictor and target transforms are estimated on these rows. Methods
    /// that need a full-rank design fail with `Unidentifiable` before any
    /// fitting when a column is an exact linear combination of the others.
    pub fn fit(dataset: &Dataset, rows: &[usize], spec: &ModelSpec) -> Result<FittedPipeline> {
        spec.validate()?;
        if rows.is_empty() {
            return Err(AnalysisError::EmptyDataset(format!(
                "no training rows for '{}'",
                spec.name
            )));
        }

        let encoder = DesignEncoder::fit(dataset, rows, &spec.terms)?;
        let x = encoder.encode_rows(dataset, rows)?;

        let regressor = ModelFactory::create(&spec.method)?;
        if regressor.requires_full_rank() {
            let aliased = x.aliased_columns();
            if !aliased.is_empty() {
                return Err(AnalysisError::Unidentifiable { terms: aliased });
            }
        }

        let raw_target = dataset.column(spec.target, rows);
        let target_transform = match spec.target_transform {
            TransformKind::Identity => Transform::Identity,
            TransformKind::Log => Transform::Log,
            TransformKind::BoxCox => Transform::BoxCox {
                lambda: PowerTransformer::estimate_lambda_regression(
                    spec.target,
                    &raw_target,
                    with_intercept(&x.to_array()),
                )?,
            },
        };
        let y = target_transform.apply_all(spec.target, &raw_target)?;

        let model = regressor.fit(&x, &y)?;
        tracing::debug!(
            spec = %spec.name,
            model = regressor.get_name(),
            rows = rows.len(),
            columns = x.n_cols(),
            "model fitted"
        );

        Ok(FittedPipeline {
            name: spec.name.clone(),
            method: regressor.get_name().to_string(),
            target: spec.target,
            target_transform,
            encoder,
            model,
        })
    }

    /// Fits `spec` on the training subset of `partition` and scores it on the
    /// test subset.
    pub fn evaluate(dataset: &Dataset, partition: &Partition, spec: &ModelSpec) -> Result<Evaluation> {
        let fitted = Self::fit(dataset, partition.train(), spec)?;
        Self::score(dataset, partition, &fitted)
    }

    /// Scores a pipeline fitted on the training subset of `partition` against
    /// its test subset.
    ///
    /// `mse` and `correlation` compare predictions and actual values on the
    /// transformed target scale; the back-transform is applied only to the
    /// reported `original_pairs`.
    pub fn score(dataset: &Dataset, partition: &Partition, fitted: &FittedPipeline) -> Result<Evaluation> {
        let test = partition.test();
        if test.is_empty() {
            return Err(AnalysisError::EmptyDataset("test partition is empty".into()));
        }
        let observations = || test.iter().map(|&r| dataset.observation(r));
        let predicted = fitted.predict(observations())?;
        let original_predicted = fitted.predict_original(observations())?;
        let raw_actual = dataset.column(fitted.target(), test);
        let actual = fitted.target_transform().apply_all(fitted.target(), &raw_actual)?;

        let metrics = EvaluationReport::regression(&actual, &predicted);
        let evaluation = Evaluation {
            info: fitted.info(),
            n_train: partition.train().len(),
            n_test: test.len(),
            mse: metrics.get_metric("mse").unwrap_or(f64::NAN),
            correlation: pearson_correlation(&predicted, &actual),
            pairs: predicted.iter().copied().zip(actual.iter().copied()).collect(),
            original_pairs: original_predicted
                .iter()
                .copied()
                .zip(raw_actual.iter().copied())
                .collect(),
            metrics,
            original_metrics: EvaluationReport::regression(&raw_actual, &original_predicted),
            summary: fitted.summary(),
        };
        tracing::info!(
            spec = fitted.name(),
            mse = evaluation.mse,
            correlation = evaluation.correlation,
            "evaluated"
        );
        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loading::{Attribute, Observation};
    use crate::processing::Term;

    /// Heating load exactly linear in wall area and glazing area.
    fn linear_dataset() -> Dataset {
        let observations = (0..40)
            .map(|i| {
                let wa = 245.0 + 24.5 * (i % 6) as f64;
                let ga = [0.0, 0.1, 0.25, 0.4][i % 4];
                let sa = 514.5 + 24.5 * (i % 12) as f64;
                let hl = 5.0 + 0.05 * wa + 20.0 * ga;
                Observation::new([0.9, sa, wa, 110.25, 7.0, 2.0, ga, 1.0, hl, hl + 2.0])
            })
            .collect();
        Dataset::new(observations, 0).unwrap()
    }

    #[test]
    fn exact_linear_target_is_recovered() {
        let ds = linear_dataset();
        let partition = Partition::split(ds.len(), 0.75, 3).unwrap();
        let spec = ModelSpec::builder()
            .numeric_terms([Attribute::WallArea, Attribute::GlazingArea])
            .build()
            .unwrap();
        let eval = Evaluator::evaluate(&ds, &partition, &spec).unwrap();
        assert_eq!(eval.n_train, 30);
        assert_eq!(eval.n_test, 10);
        assert_eq!(eval.pairs.len(), 10);
        assert!(eval.mse < 1e-12);
        assert!(eval.correlation > 0.999_999);
    }

    #[test]
    fn mse_matches_regression_metrics() {
        let ds = linear_dataset();
        let partition = Partition::split(ds.len(), 0.75, 5).unwrap();
        let spec = ModelSpec::builder()
            .numeric_terms([Attribute::SurfaceArea])
            .build()
            .unwrap();
        let eval = Evaluator::evaluate(&ds, &partition, &spec).unwrap();
        assert!(eval.mse > 0.0);
        assert_eq!(Some(eval.mse), eval.metrics.get_metric("mse"));

        let by_hand = eval.pairs.iter().map(|(p, a)| (p - a).powi(2)).sum::<f64>() / eval.n_test as f64;
        assert!((eval.mse - by_hand).abs() < 1e-9);
    }

    #[test]
    fn log_target_pairs_are_back_transformed() {
        let ds = linear_dataset();
        let partition = Partition::split(ds.len(), 0.75, 3).unwrap();
        let spec = ModelSpec::builder()
            .target_transform(TransformKind::Log)
            .term(Term::log(Attribute::WallArea))
            .build()
            .unwrap();
        let fitted = Evaluator::fit(&ds, partition.train(), &spec).unwrap();
        let eval = Evaluator::score(&ds, &partition, &fitted).unwrap();
        let original = fitted
            .predict_original(partition.test().iter().map(|&r| ds.observation(r)))
            .unwrap();
        assert_eq!(eval.original_pairs.iter().map(|(p, _)| *p).collect::<Vec<_>>(), original);
        for ((p, a), (op, oa)) in eval.pairs.iter().zip(&eval.original_pairs) {
            assert!((p.exp() - op).abs() < 1e-9);
            assert!((a.exp() - oa).abs() < 1e-9);
        }
        assert_eq!(eval.info.target, "log(hl)");
    }

    #[test]
    fn collinear_predictors_fail_before_fitting() {
        let observations = (0..30)
            .map(|i| {
                let wa = 245.0 + 24.5 * (i % 5) as f64;
                let ra = 110.25 + 12.25 * (i % 3) as f64;
                Observation::new([0.9, wa + 2.0 * ra, wa, ra, 7.0, 2.0, 0.1, 1.0, 20.0 + i as f64, 25.0])
            })
            .collect();
        let ds = Dataset::new(observations, 0).unwrap();
        let spec = ModelSpec::builder()
            .numeric_terms([Attribute::SurfaceArea, Attribute::WallArea, Attribute::RoofArea])
            .build()
            .unwrap();
        let err = Evaluator::fit(&ds, &ds.all_rows(), &spec).unwrap_err();
        assert!(err.is_modeling_decision());
        assert!(err.to_string().contains("ra"));
    }
}
