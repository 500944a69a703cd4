use std::fmt;

use serde::Serialize;

use crate::data_loading::{Attribute, Observation};
use crate::error::Result;
use crate::models::{FittedRegressor, ModelSummary};
use crate::processing::{DesignEncoder, Transform};

/// A model spec fitted on a set of training rows.
///
/// Holds the design encoder (with its fitted predictor transforms), the
/// fitted target transform and the fitted regressor. Never mutated after
/// fitting.
#[derive(Debug)]
pub struct FittedPipeline {
    pub(crate) name: String,
    pub(crate) method: String,
    pub(crate) target: Attribute,
    pub(crate) target_transform: Transform,
    pub(crate) encoder: DesignEncoder,
    pub(crate) model: Box<dyn FittedRegressor>,
}

impl FittedPipeline {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> Attribute {
        self.target
    }

    pub fn target_transform(&self) -> Transform {
        self.target_transform
    }

    /// Predictions on the transformed target scale.
    pub fn predict<'a, I>(&self, observations: I) -> Result<Vec<f64>>
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        let design = self.encoder.encode(observations)?;
        self.model.predict(&design)
    }

    /// Predictions back-transformed to the original target scale.
    pub fn predict_original<'a, I>(&self, observations: I) -> Result<Vec<f64>>
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        Ok(self
            .predict(observations)?
            .into_iter()
            .map(|v| self.target_transform.inverse(v))
            .collect())
    }

    pub fn summary(&self) -> ModelSummary {
        self.model.summary()
    }

    pub fn info(&self) -> PipelineInfo {
        PipelineInfo {
            name: self.name.clone(),
            method: self.method.clone(),
            target: self.target_transform.label(self.target.code()),
            columns: self.encoder.column_names(),
            transforms: self
                .encoder
                .transforms()
                .into_iter()
                .filter(|(_, t)| !t.is_identity())
                .map(|(a, t)| t.label(a.code()))
                .collect(),
        }
    }
}

/// Description of a fitted pipeline for reports.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineInfo {
    pub name: String,
    pub method: String,
    /// Target label on the model scale, e.g. `log(hl)`.
    pub target: String,
    pub columns: Vec<String>,
    /// Non-identity predictor transforms, e.g. `bc[0.50](rc)`.
    pub transforms: Vec<String>,
}

impl fmt::Display for PipelineInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.method)?;
        writeln!(f, "  target:  {}", self.target)?;
        writeln!(f, "  columns: {}", self.columns.join(", "))?;
        if !self.transforms.is_empty() {
            writeln!(f, "  transforms: {}", self.transforms.join(", "))?;
        }
        Ok(())
    }
}
