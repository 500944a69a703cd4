//! Column transforms and design-matrix encoding.

use serde::{Deserialize, Serialize};

use crate::data_loading::Attribute;
use crate::error::Result;

pub mod encoder;
pub mod log_transformer;
pub mod power_transformer;

pub use encoder::{Design, DesignEncoder, Encoding, Term};
pub use log_transformer::LogTransformer;
pub use power_transformer::PowerTransformer;

/// Transform requested by a model spec, before any parameter is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    #[default]
    Identity,
    Log,
    BoxCox,
}

/// A transform with its parameters fixed (Box-Cox exponent estimated on the
/// training rows).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    Identity,
    Log,
    BoxCox { lambda: f64 },
}

impl Transform {
    pub fn apply(&self, attribute: Attribute, value: f64) -> Result<f64> {
        match *self {
            Transform::Identity => Ok(value),
            Transform::Log => LogTransformer::apply(attribute, value),
            Transform::BoxCox { lambda } => {
                if value <= 0.0 {
                    return Err(crate::error::AnalysisError::NonPositive {
                        transform: "box-cox",
                        attribute: attribute.code().to_string(),
                        value,
                    });
                }
                Ok(PowerTransformer::box_cox_transform(value, lambda))
            }
        }
    }

    pub fn apply_all(&self, attribute: Attribute, values: &[f64]) -> Result<Vec<f64>> {
        values.iter().map(|&v| self.apply(attribute, v)).collect()
    }

    /// Maps a value on the transformed scale back to the original scale.
    pub fn inverse(&self, value: f64) -> f64 {
        match *self {
            Transform::Identity => value,
            Transform::Log => LogTransformer::inverse(value),
            Transform::BoxCox { lambda } => PowerTransformer::box_cox_inverse(value, lambda),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Transform::Identity)
    }

    /// Display label such as `log(sa)` or `bc[0.12](hl)`.
    pub fn label(&self, code: &str) -> String {
        match self {
            Transform::Identity => code.to_string(),
            Transform::Log => format!("log({})", code),
            Transform::BoxCox { lambda } => format!("bc[{:.2}]({})", lambda, code),
        }
    }
}
