pub mod evaluator;
pub mod metrics;

pub use evaluator::Evaluator;
pub use metrics::{Evaluation, EvaluationReport};
