use crate::data_loading::Attribute;
use crate::error::{AnalysisError, Result};

/// Natural-log transformer.
///
/// No offset is added: heating load and the building dimensions are strictly
/// positive, and a non-positive input is reported instead of silently shifted.
pub struct LogTransformer;

impl LogTransformer {
    pub fn apply(attribute: Attribute, value: f64) -> Result<f64> {
        if value <= 0.0 {
            return Err(AnalysisError::NonPositive {
                transform: "log",
                attribute: attribute.code().to_string(),
                value,
            });
        }
        Ok(value.ln())
    }

    pub fn inverse(value: f64) -> f64 {
        value.exp()
    }
}
