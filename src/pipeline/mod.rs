pub mod analysis;
pub mod builder;
pub mod director;
pub mod pipeline;

pub use analysis::{Analysis, AnalysisReport, ModelOutcome};
pub use builder::{ModelSpec, ModelSpecBuilder};
pub use director::{ModelDirector, PresetInfo};
pub use pipeline::{FittedPipeline, PipelineInfo};
