use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::{PowerTransformer, Transform, TransformKind};
use crate::data_loading::{Attribute, AttributeKind, Dataset, Observation};
use crate::error::{AnalysisError, Result};
use crate::linalg::{dependent_columns, rows_to_array, with_intercept, RANK_TOLERANCE};

/// How a predictor enters the design matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// The (transformed) value is one column.
    Numeric,
    /// Treatment contrasts: one 0/1 column per level except the first.
    Dummy,
}

/// One predictor of a model spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub attribute: Attribute,
    pub transform: TransformKind,
    pub encoding: Encoding,
}

impl Term {
    /// Untransformed, with the default encoding of the attribute's kind:
    /// categorical codes are dummy coded, continuous values are numeric.
    pub fn new(attribute: Attribute) -> Self {
        let encoding = if attribute.kind().is_categorical() {
            Encoding::Dummy
        } else {
            Encoding::Numeric
        };
        Self {
            attribute,
            transform: TransformKind::Identity,
            encoding,
        }
    }

    /// Raw value as a single numeric column, categorical codes included.
    pub fn numeric(attribute: Attribute) -> Self {
        Self {
            attribute,
            transform: TransformKind::Identity,
            encoding: Encoding::Numeric,
        }
    }

    pub fn log(attribute: Attribute) -> Self {
        Self {
            transform: TransformKind::Log,
            ..Self::numeric(attribute)
        }
    }

    pub fn box_cox(attribute: Attribute) -> Self {
        Self {
            transform: TransformKind::BoxCox,
            ..Self::numeric(attribute)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.attribute.kind() == AttributeKind::Target {
            return Err(AnalysisError::InvalidSpec(format!(
                "'{}' is a target and cannot be a predictor",
                self.attribute
            )));
        }
        if self.encoding == Encoding::Dummy && self.transform != TransformKind::Identity {
            return Err(AnalysisError::InvalidSpec(format!(
                "dummy-coded '{}' cannot also be transformed",
                self.attribute
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.attribute.code();
        match (self.encoding, self.transform) {
            (Encoding::Dummy, _) => write!(f, "factor({})", code),
            (Encoding::Numeric, TransformKind::Identity) => f.write_str(code),
            (Encoding::Numeric, TransformKind::Log) => write!(f, "log({})", code),
            (Encoding::Numeric, TransformKind::BoxCox) => write!(f, "bc({})", code),
        }
    }
}

/// Encoded predictor matrix with column names, one row per observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl Design {
    pub fn new(names: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self { names, rows }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn to_dense(&self) -> Result<DenseMatrix<f64>> {
        if self.rows.is_empty() || self.names.is_empty() {
            return Err(AnalysisError::EmptyDataset("design has no rows or columns".into()));
        }
        Ok(DenseMatrix::from_2d_vec(&self.rows)?)
    }

    pub fn to_array(&self) -> Array2<f64> {
        rows_to_array(&self.rows, self.n_cols())
    }

    /// Columns that are exact linear combinations of an intercept and the
    /// columns before them.
    pub fn aliased_columns(&self) -> Vec<String> {
        dependent_columns(&with_intercept(&self.to_array()), RANK_TOLERANCE)
            .into_iter()
            .filter(|&j| j > 0)
            .map(|j| self.names[j - 1].clone())
            .collect()
    }

    /// Sub-design over row positions of this design.
    pub fn select_rows(&self, positions: &[usize]) -> Design {
        Design {
            names: self.names.clone(),
            rows: positions.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct FittedTerm {
    term: Term,
    transform: Transform,
    /// Levels after the reference level; empty for numeric terms.
    contrast_levels: Vec<f64>,
    reference_level: Option<f64>,
}

impl FittedTerm {
    fn column_names(&self) -> Vec<String> {
        match self.term.encoding {
            Encoding::Numeric => vec![self.transform.label(self.term.attribute.code())],
            Encoding::Dummy => self
                .contrast_levels
                .iter()
                .map(|l| format!("{}{}", self.term.attribute.code(), l))
                .collect(),
        }
    }

    fn push_columns(&self, observation: &Observation, out: &mut Vec<f64>) -> Result<()> {
        let value = observation.get(self.term.attribute);
        match self.term.encoding {
            Encoding::Numeric => out.push(self.transform.apply(self.term.attribute, value)?),
            Encoding::Dummy => {
                let known = self.reference_level == Some(value)
                    || self.contrast_levels.contains(&value);
                if !known {
                    return Err(AnalysisError::InvalidSpec(format!(
                        "level {} of '{}' was not seen when the dataset was loaded",
                        value, self.term.attribute
                    )));
                }
                out.extend(
                    self.contrast_levels
                        .iter()
                        .map(|&l| if l == value { 1.0 } else { 0.0 }),
                );
            }
        }
        Ok(())
    }
}

/// Turns observations into design rows.
///
/// Fitted once on the training rows (Box-Cox exponents of predictors are
/// estimated there) and then applied unchanged to any observation.
#[derive(Debug, Clone)]
pub struct DesignEncoder {
    terms: Vec<FittedTerm>,
}

impl DesignEncoder {
    pub fn fit(dataset: &Dataset, rows: &[usize], terms: &[Term]) -> Result<Self> {
        if terms.is_empty() {
            return Err(AnalysisError::InvalidSpec("no predictors".into()));
        }
        let fitted = terms
            .iter()
            .map(|term| {
                term.validate()?;
                let transform = match term.transform {
                    TransformKind::Identity => Transform::Identity,
                    TransformKind::Log => Transform::Log,
                    TransformKind::BoxCox => {
                        let values = dataset.column(term.attribute, rows);
                        Transform::BoxCox {
                            lambda: PowerTransformer::estimate_lambda(term.attribute, &values)?,
                        }
                    }
                };
                let (reference_level, contrast_levels) = match term.encoding {
                    Encoding::Numeric => (None, Vec::new()),
                    Encoding::Dummy => {
                        let levels = dataset.levels(term.attribute);
                        if levels.is_empty() {
                            // continuous column forced to dummy: use its distinct values
                            let mut values = dataset.column(term.attribute, &dataset.all_rows());
                            values.sort_by(|a, b| a.total_cmp(b));
                            values.dedup();
                            (values.first().copied(), values.iter().skip(1).copied().collect())
                        } else {
                            (Some(levels[0]), levels[1..].to_vec())
                        }
                    }
                };
                Ok(FittedTerm {
                    term: *term,
                    transform,
                    contrast_levels,
                    reference_level,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { terms: fitted })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.terms.iter().flat_map(|t| t.column_names()).collect()
    }

    /// For each design column, the index of the term that produced it.
    pub fn term_of_column(&self) -> Vec<usize> {
        self.terms
            .iter()
            .enumerate()
            .flat_map(|(i, t)| std::iter::repeat(i).take(t.column_names().len()))
            .collect()
    }

    /// Fitted transform of each numeric term.
    pub fn transforms(&self) -> Vec<(Attribute, Transform)> {
        self.terms
            .iter()
            .filter(|t| t.term.encoding == Encoding::Numeric)
            .map(|t| (t.term.attribute, t.transform))
            .collect()
    }

    pub fn encode<'a, I>(&self, observations: I) -> Result<Design>
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        let rows = observations
            .into_iter()
            .map(|o| {
                let mut row = Vec::new();
                for term in &self.terms {
                    term.push_columns(o, &mut row)?;
                }
                Ok(row)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Design::new(self.column_names(), rows))
    }

    pub fn encode_rows(&self, dataset: &Dataset, rows: &[usize]) -> Result<Design> {
        self.encode(rows.iter().map(|&r| dataset.observation(r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let rows = [
            [0.98, 514.5, 294.0, 110.25, 7.0, 2.0, 0.0, 0.0, 15.55, 21.33],
            [0.90, 563.5, 318.5, 122.5, 7.0, 3.0, 0.1, 1.0, 20.84, 28.28],
            [0.62, 808.5, 367.5, 220.5, 3.5, 4.0, 0.4, 5.0, 16.64, 16.03],
            [0.74, 686.0, 245.0, 220.5, 3.5, 5.0, 0.25, 2.0, 11.07, 14.42],
        ];
        Dataset::new(rows.iter().map(|r| Observation::new(*r)).collect(), 0).unwrap()
    }

    #[test]
    fn dummy_coding_drops_reference_level() {
        let ds = dataset();
        let enc = DesignEncoder::fit(&ds, &ds.all_rows(), &[Term::new(Attribute::OverallHeight)])
            .unwrap();
        assert_eq!(enc.column_names(), vec!["oh7".to_string()]);
        let design = enc.encode_rows(&ds, &[0, 2]).unwrap();
        assert_eq!(design.rows(), &[vec![1.0], vec![0.0]]);
    }

    #[test]
    fn mixed_terms_expand_in_order() {
        let ds = dataset();
        let terms = [
            Term::log(Attribute::SurfaceArea),
            Term::new(Attribute::GlazingArea),
            Term::new(Attribute::WallArea),
        ];
        let enc = DesignEncoder::fit(&ds, &ds.all_rows(), &terms).unwrap();
        assert_eq!(
            enc.column_names(),
            vec!["log(sa)", "ga0.1", "ga0.25", "ga0.4", "wa"]
        );
        assert_eq!(enc.term_of_column(), vec![0, 1, 1, 1, 2]);

        let design = enc.encode_rows(&ds, &[3]).unwrap();
        let row = &design.rows()[0];
        assert!((row[0] - 686.0f64.ln()).abs() < 1e-12);
        assert_eq!(&row[1..], &[0.0, 1.0, 0.0, 245.0]);
    }

    #[test]
    fn log_of_zero_glazing_fails() {
        let ds = dataset();
        let enc =
            DesignEncoder::fit(&ds, &ds.all_rows(), &[Term::log(Attribute::GlazingArea)]).unwrap();
        assert!(enc.encode_rows(&ds, &[0]).is_err());
    }

    #[test]
    fn unknown_level_is_rejected() {
        let ds = dataset();
        let enc = DesignEncoder::fit(&ds, &ds.all_rows(), &[Term::new(Attribute::Orientation)])
            .unwrap();
        let odd = ds.observation(0).with(Attribute::Orientation, 9.0);
        assert!(enc.encode([&odd]).is_err());
    }

    #[test]
    fn target_cannot_be_a_predictor() {
        let ds = dataset();
        assert!(DesignEncoder::fit(&ds, &ds.all_rows(), &[Term::new(Attribute::HeatingLoad)]).is_err());
    }

    #[test]
    fn select_rows_keeps_names() {
        let d = Design::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        );
        let s = d.select_rows(&[1]);
        assert_eq!(s.names(), d.names());
        assert_eq!(s.rows(), &[vec![4.0, 5.0, 6.0]]);
    }
}
