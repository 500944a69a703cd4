//! Rendering of analysis results as text tables or JSON.

use std::str::FromStr;

use serde::Serialize;

use crate::error::{AnalysisError, Result};

pub mod text;

pub use text::{render_evaluation, render_report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(AnalysisError::InvalidSpec(format!(
                "unknown report format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

/// Pretty-printed JSON of any report value.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
