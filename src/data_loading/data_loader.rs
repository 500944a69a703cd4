use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{AnalysisError, Result};

use super::attribute::Attribute;

/// One simulated building: the ten attribute values in file order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    values: [f64; Attribute::COUNT],
}

impl Observation {
    pub fn new(values: [f64; Attribute::COUNT]) -> Self {
        Self { values }
    }

    pub fn get(&self, attribute: Attribute) -> f64 {
        self.values[attribute.index()]
    }

    /// Copy of this observation with one attribute replaced.
    pub fn with(&self, attribute: Attribute, value: f64) -> Self {
        let mut values = self.values;
        values[attribute.index()] = value;
        Self { values }
    }
}

/// Cleaned, immutable collection of observations.
///
/// Categorical levels are computed once over the whole dataset so that dummy
/// coding is identical for every partition.
#[derive(Debug, Clone)]
pub struct Dataset {
    observations: Vec<Observation>,
    levels: BTreeMap<Attribute, Vec<f64>>,
    dropped_rows: usize,
}

impl Dataset {
    pub fn new(observations: Vec<Observation>, dropped_rows: usize) -> Result<Self> {
        if observations.is_empty() {
            return Err(AnalysisError::EmptyDataset(format!(
                "no complete rows ({} dropped)",
                dropped_rows
            )));
        }

        let levels = Attribute::ALL
            .iter()
            .copied()
            .filter(|a| a.kind().is_categorical())
            .map(|a| {
                let mut values: Vec<f64> = observations.iter().map(|o| o.get(a)).collect();
                values.sort_by(|x, y| x.total_cmp(y));
                values.dedup();
                (a, values)
            })
            .collect();

        Ok(Self {
            observations,
            levels,
            dropped_rows,
        })
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn observation(&self, row: usize) -> &Observation {
        &self.observations[row]
    }

    /// Rows removed at load time because of missing or malformed values.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Values of `attribute` for the given rows, in row order.
    pub fn column(&self, attribute: Attribute, rows: &[usize]) -> Vec<f64> {
        rows.iter()
            .map(|&r| self.observations[r].get(attribute))
            .collect()
    }

    /// Sorted distinct codes of a categorical attribute; empty for continuous ones.
    pub fn levels(&self, attribute: Attribute) -> &[f64] {
        self.levels
            .get(&attribute)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Indices `0..len`.
    pub fn all_rows(&self) -> Vec<usize> {
        (0..self.len()).collect()
    }
}

/// Strategy for turning raw text into a cleaned [`Dataset`].
pub trait DataLoader {
    /// Loader name
    fn get_name(&self) -> &str;

    /// Parses and cleans raw bytes; incomplete or undecodable rows are
    /// dropped, not reported as errors.
    fn load_from_bytes(&self, data: &[u8]) -> Result<Dataset>;

    fn load_from_string(&self, data: &str) -> Result<Dataset> {
        self.load_from_bytes(data.as_bytes())
    }

    /// Cheap structural check before parsing.
    fn validate_format(&self, data: &str) -> Result<()>;

    /// Reads `path` as bytes, so a row with invalid UTF-8 only drops that row.
    fn load_path(&self, path: &Path) -> Result<Dataset> {
        let bytes = std::fs::read(path)?;
        self.load_from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(oh: f64, orient: f64) -> Observation {
        Observation::new([0.9, 600.0, 300.0, 150.0, oh, orient, 0.1, 1.0, 20.0, 25.0])
    }

    #[test]
    fn levels_are_sorted_and_distinct() {
        let ds = Dataset::new(vec![obs(7.0, 4.0), obs(3.5, 2.0), obs(7.0, 3.0)], 0).unwrap();
        assert_eq!(ds.levels(Attribute::OverallHeight), &[3.5, 7.0]);
        assert_eq!(ds.levels(Attribute::Orientation), &[2.0, 3.0, 4.0]);
        assert!(ds.levels(Attribute::SurfaceArea).is_empty());
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let err = Dataset::new(vec![], 3).unwrap_err();
        assert!(err.to_string().contains("3 dropped"));
    }

    #[test]
    fn with_replaces_one_value() {
        let o = obs(7.0, 2.0);
        let changed = o.with(Attribute::SurfaceArea, 700.0);
        assert_eq!(changed.get(Attribute::SurfaceArea), 700.0);
        assert_eq!(changed.get(Attribute::WallArea), o.get(Attribute::WallArea));
        assert_eq!(o.get(Attribute::SurfaceArea), 600.0);
    }

    #[test]
    fn column_follows_row_order() {
        let ds = Dataset::new(vec![obs(7.0, 2.0), obs(3.5, 3.0)], 0).unwrap();
        assert_eq!(ds.column(Attribute::OverallHeight, &[1, 0]), vec![3.5, 7.0]);
    }
}
