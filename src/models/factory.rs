use super::{FitMethod, ForestWrapper, LassoWrapper, LinRegWrapper, Regressor, RidgeWrapper, TreeWrapper};
use crate::error::Result;

/// Builds the regressor for a fit method.
pub struct ModelFactory;

impl ModelFactory {
    pub fn create(method: &FitMethod) -> Result<Box<dyn Regressor>> {
        method.validate()?;
        let model: Box<dyn Regressor> = match method {
            FitMethod::Ols => Box::new(LinRegWrapper::new()),
            FitMethod::Lasso { penalty } => Box::new(LassoWrapper::new(*penalty)),
            FitMethod::Ridge { alpha } => Box::new(RidgeWrapper::new(*alpha)),
            FitMethod::Tree(params) => Box::new(TreeWrapper::new(*params)),
            FitMethod::Forest(params) => Box::new(ForestWrapper::new(*params)),
        };
        Ok(model)
    }

    pub fn available_models() -> Vec<&'static str> {
        vec!["ols", "lasso", "ridge", "tree", "forest"]
    }

    pub fn get_model_description(model_type: &str) -> Option<&'static str> {
        match model_type {
            "ols" => Some("Ordinary least squares with t-tests and F-test"),
            "lasso" => Some("L1-penalized least squares, penalty fixed or chosen by k-fold CV"),
            "ridge" => Some("L2-penalized least squares"),
            "tree" => Some("CART regression tree, optionally depth-tuned by CV"),
            "forest" => Some("Random forest of regression trees"),
            _ => None,
        }
    }
}
