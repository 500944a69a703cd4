use serde::{Deserialize, Serialize};

use crate::data_loading::{Attribute, AttributeKind};
use crate::error::{AnalysisError, Result};
use crate::models::FitMethod;
use crate::processing::{Term, TransformKind};

/// Everything the evaluator needs to fit one model: the target and its
/// transform, the predictor terms and the fitting method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub target: Attribute,
    pub target_transform: TransformKind,
    pub terms: Vec<Term>,
    pub method: FitMethod,
}

impl ModelSpec {
    pub fn builder() -> ModelSpecBuilder {
        ModelSpecBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.kind() != AttributeKind::Target {
            return Err(AnalysisError::InvalidSpec(format!(
                "'{}' is not a target attribute",
                self.target
            )));
        }
        if self.terms.is_empty() {
            return Err(AnalysisError::InvalidSpec(format!("'{}' has no predictors", self.name)));
        }
        for (i, term) in self.terms.iter().enumerate() {
            term.validate()?;
            if self.terms[..i].iter().any(|t| t.attribute == term.attribute) {
                return Err(AnalysisError::InvalidSpec(format!(
                    "'{}' lists '{}' twice",
                    self.name, term.attribute
                )));
            }
        }
        self.method.validate()
    }

    /// Formula-style description, e.g. `log(hl) ~ log(rc) + factor(oh)`.
    pub fn formula(&self) -> String {
        let lhs = match self.target_transform {
            TransformKind::Identity => self.target.code().to_string(),
            TransformKind::Log => format!("log({})", self.target),
            TransformKind::BoxCox => format!("bc({})", self.target),
        };
        let rhs: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
        format!("{} ~ {}", lhs, rhs.join(" + "))
    }
}

/// Fluent construction of a [`ModelSpec`].
///
/// Defaults: target heating load, untransformed, fitted by OLS.
pub struct ModelSpecBuilder {
    name: Option<String>,
    target: Attribute,
    target_transform: TransformKind,
    terms: Vec<Term>,
    method: FitMethod,
    method_params: Vec<(String, String)>,
}

impl ModelSpecBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            target: Attribute::HeatingLoad,
            target_transform: TransformKind::Identity,
            terms: Vec::new(),
            method: FitMethod::Ols,
            method_params: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn target(mut self, target: Attribute) -> Self {
        self.target = target;
        self
    }

    pub fn target_transform(mut self, transform: TransformKind) -> Self {
        self.target_transform = transform;
        self
    }

    /// Adds one predictor term.
    pub fn term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    /// Adds every attribute with its default encoding, untransformed.
    pub fn terms<I: IntoIterator<Item = Attribute>>(mut self, attributes: I) -> Self {
        self.terms.extend(attributes.into_iter().map(Term::new));
        self
    }

    /// Adds every attribute as one untransformed numeric column.
    pub fn numeric_terms<I: IntoIterator<Item = Attribute>>(mut self, attributes: I) -> Self {
        self.terms.extend(attributes.into_iter().map(Term::numeric));
        self
    }

    pub fn method(mut self, method: FitMethod) -> Self {
        self.method = method;
        self
    }

    /// Overrides one hyperparameter of the method, applied in `build`.
    pub fn method_param(mut self, key: &str, value: &str) -> Self {
        self.method_params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Result<ModelSpec> {
        let mut method = self.method;
        for (key, value) in &self.method_params {
            method.set_param(key, value)?;
        }
        let name = self.name.unwrap_or_else(|| method.name().to_string());
        let spec = ModelSpec {
            name,
            target: self.target,
            target_transform: self.target_transform,
            terms: self.terms,
            method,
        };
        spec.validate()?;
        Ok(spec)
    }
}

impl Default for ModelSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}
