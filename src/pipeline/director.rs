use serde::Serialize;

use super::builder::ModelSpec;
use crate::config::AnalysisConfig;
use crate::data_loading::Attribute;
use crate::error::{AnalysisError, Result};
use crate::models::{CvRule, FitMethod, ForestParams, Penalty, TreeParams};
use crate::processing::{Term, TransformKind};

/// Every predictor except roof area, which equals (surface - wall) / 2.
const FULL_WITHOUT_ROOF: [Attribute; 7] = [
    Attribute::RelativeCompactness,
    Attribute::SurfaceArea,
    Attribute::WallArea,
    Attribute::OverallHeight,
    Attribute::Orientation,
    Attribute::GlazingArea,
    Attribute::GlazingDistribution,
];

/// Ready-made model specs of the heating-load analysis.
pub struct ModelDirector;

impl ModelDirector {
    /// OLS of hl on all eight predictors. Roof area is an exact combination
    /// of surface and wall area, so this spec is unidentifiable; the report
    /// keeps it to show the rejection.
    pub fn build_ols_all() -> Result<ModelSpec> {
        ModelSpec::builder()
            .name("ols_all")
            .numeric_terms(Attribute::PREDICTORS)
            .method(FitMethod::Ols)
            .build()
    }

    /// OLS of hl on the raw codes of every predictor except roof area.
    pub fn build_ols_full() -> Result<ModelSpec> {
        ModelSpec::builder()
            .name("ols_full")
            .numeric_terms(FULL_WITHOUT_ROOF)
            .method(FitMethod::Ols)
            .build()
    }

    /// log hl on log rc, log sa, log wa, height and glazing area as factors.
    pub fn build_ols_log() -> Result<ModelSpec> {
        Self::reduced(ModelSpec::builder().name("ols_log"), TransformKind::Log)
            .method(FitMethod::Ols)
            .build()
    }

    /// Box-Cox hl on Box-Cox rc, sa, wa, height and glazing area as factors.
    pub fn build_ols_boxcox() -> Result<ModelSpec> {
        Self::reduced(ModelSpec::builder().name("ols_boxcox"), TransformKind::BoxCox)
            .method(FitMethod::Ols)
            .build()
    }

    fn reduced(builder: super::ModelSpecBuilder, transform: TransformKind) -> super::ModelSpecBuilder {
        let continuous = [
            Attribute::RelativeCompactness,
            Attribute::SurfaceArea,
            Attribute::WallArea,
        ];
        let builder = continuous.into_iter().fold(builder.target_transform(transform), |b, a| {
            b.term(Term {
                transform,
                ..Term::numeric(a)
            })
        });
        builder.terms([Attribute::OverallHeight, Attribute::GlazingArea])
    }

    pub fn build_lasso_cv(folds: usize, seed: u64) -> Result<ModelSpec> {
        ModelSpec::builder()
            .name("lasso_cv")
            .numeric_terms(Attribute::PREDICTORS)
            .method(FitMethod::Lasso {
                penalty: Penalty::CrossValidated {
                    folds,
                    rule: CvRule::OneStandardError,
                    seed,
                },
            })
            .build()
    }

    pub fn build_ridge(alpha: f64) -> Result<ModelSpec> {
        ModelSpec::builder()
            .name("ridge")
            .numeric_terms(Attribute::PREDICTORS)
            .method(FitMethod::Ridge { alpha })
            .build()
    }

    /// Unpruned regression tree grown to `max_depth`.
    pub fn build_tree(max_depth: u16) -> Result<ModelSpec> {
        ModelSpec::builder()
            .name("tree")
            .numeric_terms(Attribute::PREDICTORS)
            .method(FitMethod::Tree(TreeParams {
                max_depth,
                ..TreeParams::default()
            }))
            .build()
    }

    /// Regression tree with depth chosen by cross-validation.
    pub fn build_tree_pruned(max_depth: u16, folds: usize, seed: u64) -> Result<ModelSpec> {
        ModelSpec::builder()
            .name("tree_pruned")
            .numeric_terms(Attribute::PREDICTORS)
            .method(FitMethod::Tree(TreeParams {
                max_depth,
                cv_folds: Some(folds),
                seed,
                ..TreeParams::default()
            }))
            .build()
    }

    pub fn build_forest(n_trees: usize, seed: u64) -> Result<ModelSpec> {
        ModelSpec::builder()
            .name("forest")
            .numeric_terms(Attribute::PREDICTORS)
            .method(FitMethod::Forest(ForestParams {
                n_trees,
                seed,
                ..ForestParams::default()
            }))
            .build()
    }

    /// The presets of a full report, in report order.
    pub fn standard_suite(config: &AnalysisConfig) -> Result<Vec<ModelSpec>> {
        ["ols_all", "ols_full", "ols_log", "ols_boxcox", "lasso_cv", "tree", "tree_pruned", "forest"]
            .iter()
            .map(|name| Self::preset(name, config))
            .collect()
    }

    /// One preset by name, with hyperparameters taken from `config`.
    pub fn preset(name: &str, config: &AnalysisConfig) -> Result<ModelSpec> {
        match name {
            "ols_all" => Self::build_ols_all(),
            "ols_full" => Self::build_ols_full(),
            "ols_log" => Self::build_ols_log(),
            "ols_boxcox" => Self::build_ols_boxcox(),
            "lasso_cv" => Self::build_lasso_cv(config.cv_folds, config.seed),
            "ridge" => Self::build_ridge(1.0),
            "tree" => Self::build_tree(config.tree_max_depth),
            "tree_pruned" => Self::build_tree_pruned(config.tree_max_depth, config.cv_folds, config.seed),
            "forest" => Self::build_forest(config.forest_trees, config.seed),
            other => Err(AnalysisError::UnknownPreset(other.to_string())),
        }
    }

    pub fn available_presets() -> Vec<PresetInfo> {
        vec![
            PresetInfo {
                name: "ols_all",
                description: "OLS on all eight predictors (roof area is aliased, so rejected)",
                method: "ols",
                in_report: true,
            },
            PresetInfo {
                name: "ols_full",
                description: "OLS of heating load on every predictor except roof area",
                method: "ols",
                in_report: true,
            },
            PresetInfo {
                name: "ols_log",
                description: "OLS of log heating load on log rc, sa, wa plus height and glazing factors",
                method: "ols",
                in_report: true,
            },
            PresetInfo {
                name: "ols_boxcox",
                description: "OLS with Box-Cox transformed heating load, rc, sa and wa",
                method: "ols",
                in_report: true,
            },
            PresetInfo {
                name: "lasso_cv",
                description: "LASSO on all predictors, penalty by k-fold CV (1-SE rule)",
                method: "lasso",
                in_report: true,
            },
            PresetInfo {
                name: "ridge",
                description: "Ridge regression on all predictors, alpha 1",
                method: "ridge",
                in_report: false,
            },
            PresetInfo {
                name: "tree",
                description: "Unpruned regression tree",
                method: "tree",
                in_report: true,
            },
            PresetInfo {
                name: "tree_pruned",
                description: "Regression tree with CV-selected depth",
                method: "tree",
                in_report: true,
            },
            PresetInfo {
                name: "forest",
                description: "Random forest on all predictors",
                method: "forest",
                in_report: true,
            },
        ]
    }
}

/// Listing entry of a preset.
#[derive(Debug, Clone, Serialize)]
pub struct PresetInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub method: &'static str,
    pub in_report: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_preset_builds() {
        let config = AnalysisConfig::default();
        for info in ModelDirector::available_presets() {
            let spec = ModelDirector::preset(info.name, &config).unwrap();
            assert_eq!(spec.name, info.name);
            assert_eq!(spec.method.name(), info.method);
        }
    }

    #[test]
    fn suite_matches_report_presets() {
        let suite = ModelDirector::standard_suite(&AnalysisConfig::default()).unwrap();
        let names: Vec<&str> = suite.iter().map(|s| s.name.as_str()).collect();
        let listed: Vec<&str> = ModelDirector::available_presets()
            .into_iter()
            .filter(|p| p.in_report)
            .map(|p| p.name)
            .collect();
        assert_eq!(names, listed);
    }

    #[test]
    fn log_preset_formula() {
        let spec = ModelDirector::build_ols_log().unwrap();
        assert_eq!(
            spec.formula(),
            "log(hl) ~ log(rc) + log(sa) + log(wa) + factor(oh) + factor(ga)"
        );
        assert!(!spec.terms.iter().any(|t| t.attribute == Attribute::RoofArea));
    }

    #[test]
    fn unknown_preset() {
        let err = ModelDirector::preset("knn", &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownPreset(_)));
    }
}
