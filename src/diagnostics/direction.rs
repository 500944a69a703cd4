use serde::Serialize;

use crate::data_loading::{Attribute, Observation};
use crate::error::{AnalysisError, Result};
use crate::pipeline::FittedPipeline;

/// Predicted response to increasing one attribute with the others fixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionalEffect {
    pub attribute: Attribute,
    pub delta: f64,
    /// Mean change of the prediction on the model scale.
    pub mean_change: f64,
    pub increases: usize,
    pub decreases: usize,
    pub unchanged: usize,
}

impl DirectionalEffect {
    pub fn sign(&self) -> f64 {
        sign(self.mean_change)
    }
}

/// Shifts `attribute` by `delta` in every base observation and compares the
/// fitted pipeline's predictions before and after.
///
/// Target transforms are monotone increasing, so the sign on the model scale
/// is the sign on the original scale.
pub fn directional_effect(
    fitted: &FittedPipeline,
    base: &[Observation],
    attribute: Attribute,
    delta: f64,
) -> Result<DirectionalEffect> {
    if base.is_empty() {
        return Err(AnalysisError::EmptyDataset("no base observations".into()));
    }
    if !(delta.is_finite() && delta != 0.0) {
        return Err(AnalysisError::InvalidSpec(format!("delta must be non-zero, got {}", delta)));
    }
    let shifted: Vec<Observation> = base
        .iter()
        .map(|o| o.with(attribute, o.get(attribute) + delta))
        .collect();
    let before = fitted.predict(base)?;
    let after = fitted.predict(&shifted)?;

    let changes: Vec<f64> = after.iter().zip(&before).map(|(a, b)| a - b).collect();
    let tolerance = 1e-12;
    Ok(DirectionalEffect {
        attribute,
        delta,
        mean_change: changes.iter().sum::<f64>() / changes.len() as f64,
        increases: changes.iter().filter(|c| **c > tolerance).count(),
        decreases: changes.iter().filter(|c| **c < -tolerance).count(),
        unchanged: changes.iter().filter(|c| c.abs() <= tolerance).count(),
    })
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Agreement between a model's directional effect and the sign of a
/// reference linear coefficient for the same attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignCheck {
    pub model: String,
    pub reference_model: String,
    pub attribute: Attribute,
    pub reference_coefficient: f64,
    pub effect: DirectionalEffect,
    /// Both directions are non-zero and point opposite ways.
    pub contradiction: bool,
}

impl SignCheck {
    pub fn compare(
        model: &str,
        reference_model: &str,
        reference_coefficient: f64,
        effect: DirectionalEffect,
    ) -> Self {
        let reference = sign(reference_coefficient * effect.delta);
        let observed = effect.sign();
        let contradiction = reference != 0.0 && observed != 0.0 && reference != observed;
        if contradiction {
            tracing::warn!(
                model,
                reference_model,
                attribute = effect.attribute.code(),
                reference_coefficient,
                mean_change = effect.mean_change,
                "predicted direction contradicts the linear coefficient"
            );
        }
        Self {
            model: model.to_string(),
            reference_model: reference_model.to_string(),
            attribute: effect.attribute,
            reference_coefficient,
            effect,
            contradiction,
        }
    }
}
