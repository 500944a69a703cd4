//! Regression analysis of the simulated residential building dataset:
//! heating load against eight building properties, fitted on a seeded
//! training partition and compared on the held-out test rows.

pub mod config;
pub mod data_loading;
pub mod diagnostics;
pub mod error;
pub mod evaluation;
mod linalg;
pub mod models;
pub mod pipeline;
pub mod processing;
pub mod report;

pub use config::AnalysisConfig;
pub use data_loading::{Attribute, CsvDataLoader, DataLoader, Dataset, Observation, Partition};
pub use error::{AnalysisError, Result};
pub use evaluation::{Evaluation, Evaluator};
pub use models::{FitMethod, ModelFactory, ModelSummary};
pub use pipeline::{Analysis, AnalysisReport, FittedPipeline, ModelDirector, ModelOutcome, ModelSpec};
pub use processing::{Term, TransformKind};
pub use report::ReportFormat;
