use serde::Serialize;

use super::builder::ModelSpec;
use super::director::ModelDirector;
use super::pipeline::FittedPipeline;
use crate::config::AnalysisConfig;
use crate::data_loading::{Attribute, Dataset, Observation, Partition};
use crate::diagnostics::{self, directional_effect, SignCheck, SubsetResult, Vif};
use crate::error::{AnalysisError, Result};
use crate::evaluation::{Evaluation, Evaluator};
use crate::models::ModelSummary;
use crate::processing::{Term, Transform};

/// Predictors searched by best-subset selection.
const SUBSET_CANDIDATES: [Attribute; 6] = [
    Attribute::RelativeCompactness,
    Attribute::SurfaceArea,
    Attribute::WallArea,
    Attribute::RoofArea,
    Attribute::OverallHeight,
    Attribute::GlazingArea,
];

/// Spec whose coefficients are the reference for sign checks.
const REFERENCE_SPEC: &str = "ols_full";

/// Runs the full heating-load analysis on one dataset.
pub struct Analysis {
    config: AnalysisConfig,
}

/// Outcome of one spec in a report.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    Evaluated {
        formula: String,
        evaluation: Box<Evaluation>,
    },
    /// The spec was rejected as a modeling decision (exact collinearity, a
    /// transform of non-positive values); the run continued without it.
    Rejected {
        name: String,
        formula: String,
        reason: String,
    },
}

impl ModelOutcome {
    pub fn name(&self) -> &str {
        match self {
            ModelOutcome::Evaluated { evaluation, .. } => &evaluation.info.name,
            ModelOutcome::Rejected { name, .. } => name,
        }
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        match self {
            ModelOutcome::Evaluated { evaluation, .. } => Some(evaluation.as_ref()),
            ModelOutcome::Rejected { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    pub observations: usize,
    pub dropped_rows: usize,
    pub partition: Partition,
    pub models: Vec<ModelOutcome>,
    pub vif: Vec<Vif>,
    pub best_subsets: Vec<SubsetResult>,
    pub sign_checks: Vec<SignCheck>,
}

impl AnalysisReport {
    pub fn model(&self, name: &str) -> Option<&ModelOutcome> {
        self.models.iter().find(|m| m.name() == name)
    }
}

impl Analysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Fixes the partition, then evaluates every preset against it and runs
    /// the diagnostics on the training rows.
    pub fn run(&self, dataset: &Dataset) -> Result<AnalysisReport> {
        self.config.validate()?;
        let partition = Partition::split(dataset.len(), self.config.train_fraction, self.config.seed)?;
        let specs = ModelDirector::standard_suite(&self.config)?;
        tracing::info!(specs = specs.len(), "running analysis");

        let mut models = Vec::with_capacity(specs.len());
        let mut fitted = Vec::new();
        for spec in &specs {
            match self.evaluate_spec(dataset, &partition, spec)? {
                (outcome, Some(pipeline)) => {
                    models.push(outcome);
                    fitted.push(pipeline);
                }
                (outcome, None) => models.push(outcome),
            }
        }

        let full_terms: Vec<Term> = ModelDirector::build_ols_full()?.terms;
        let vif = diagnostics::vif(dataset, partition.train(), &full_terms)?;

        let candidates: Vec<Term> = SUBSET_CANDIDATES.iter().map(|a| Term::numeric(*a)).collect();
        let best_subsets = diagnostics::best_subsets(
            dataset,
            partition.train(),
            Attribute::HeatingLoad,
            Transform::Identity,
            &candidates,
            self.config.best_subset_max_size,
        )?;

        let sign_checks = self.sign_checks(dataset, &partition, &fitted)?;

        Ok(AnalysisReport {
            config: self.config.clone(),
            observations: dataset.len(),
            dropped_rows: dataset.dropped_rows(),
            partition,
            models,
            vif,
            best_subsets,
            sign_checks,
        })
    }

    /// Evaluates one spec; modeling-decision failures become a `Rejected`
    /// outcome, anything else is an error of the whole run.
    fn evaluate_spec(
        &self,
        dataset: &Dataset,
        partition: &Partition,
        spec: &ModelSpec,
    ) -> Result<(ModelOutcome, Option<FittedPipeline>)> {
        let attempt = Evaluator::fit(dataset, partition.train(), spec)
            .and_then(|pipeline| Evaluator::score(dataset, partition, &pipeline).map(|e| (e, pipeline)));
        match attempt {
            Ok((evaluation, pipeline)) => Ok((
                ModelOutcome::Evaluated {
                    formula: spec.formula(),
                    evaluation: Box::new(evaluation),
                },
                Some(pipeline),
            )),
            Err(err) if err.is_modeling_decision() => {
                tracing::warn!(spec = %spec.name, error = %err, "spec skipped");
                Ok((
                    ModelOutcome::Rejected {
                        name: spec.name.clone(),
                        formula: spec.formula(),
                        reason: err.to_string(),
                    },
                    None,
                ))
            }
            Err(err) => Err(err),
        }
    }

    /// Surface-area direction of every fitted model against the reference
    /// OLS coefficient, probed on the test rows.
    fn sign_checks(
        &self,
        dataset: &Dataset,
        partition: &Partition,
        fitted: &[FittedPipeline],
    ) -> Result<Vec<SignCheck>> {
        let attribute = Attribute::SurfaceArea;
        let Some(reference) = fitted.iter().find(|f| f.name() == REFERENCE_SPEC) else {
            tracing::warn!("reference model missing, sign checks skipped");
            return Ok(Vec::new());
        };
        let coefficient = match reference.summary() {
            ModelSummary::Linear(s) => s
                .coefficients
                .iter()
                .find(|c| c.name == attribute.code())
                .map(|c| c.estimate),
            _ => None,
        }
        .ok_or_else(|| {
            AnalysisError::InvalidSpec(format!("'{}' has no '{}' coefficient", REFERENCE_SPEC, attribute))
        })?;

        let train_values = dataset.column(attribute, partition.train());
        let delta = spread(&train_values);
        let base: Vec<Observation> = partition
            .test()
            .iter()
            .map(|&r| *dataset.observation(r))
            .collect();

        fitted
            .iter()
            .filter(|f| f.name() != REFERENCE_SPEC)
            .map(|f| {
                let effect = directional_effect(f, &base, attribute, delta)?;
                Ok(SignCheck::compare(f.name(), REFERENCE_SPEC, coefficient, effect))
            })
            .collect()
    }
}

/// Sample standard deviation, or 1 for a constant column.
fn spread(values: &[f64]) -> f64 {
    use statrs::statistics::Statistics;
    let sd = values.iter().std_dev();
    if sd.is_finite() && sd > 0.0 {
        sd
    } else {
        1.0
    }
}
