use csv::ReaderBuilder;
use tracing::{debug, info};

use super::attribute::Attribute;
use super::data_loader::{DataLoader, Dataset, Observation};
use crate::error::{AnalysisError, Result};

/// Tokens treated as a missing value.
const MISSING_TOKENS: [&str; 5] = ["", "na", "nan", "null", "?"];

/// CSV loader for the building dataset.
///
/// The first `index_columns` columns are row indices and are discarded; the
/// next ten map positionally onto [`Attribute::ALL`] regardless of their
/// header names.
pub struct CsvDataLoader {
    index_columns: usize,
}

impl CsvDataLoader {
    pub fn new(index_columns: usize) -> Self {
        Self { index_columns }
    }

    fn required_columns(&self) -> usize {
        self.index_columns + Attribute::COUNT
    }

    /// Parses one field; `None` means the row is incomplete.
    fn parse_numeric_value(val: &str) -> Option<f64> {
        let trimmed = val.trim();
        if MISSING_TOKENS.contains(&trimmed.to_ascii_lowercase().as_str()) {
            return None;
        }
        trimmed
            .parse::<f64>()
            .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
            .ok()
            .filter(|v| v.is_finite())
    }

    fn parse_record(&self, record: &csv::StringRecord) -> Option<Observation> {
        if record.len() < self.required_columns() {
            return None;
        }
        let mut values = [0.0; Attribute::COUNT];
        for (slot, field) in values
            .iter_mut()
            .zip(record.iter().skip(self.index_columns))
        {
            *slot = Self::parse_numeric_value(field)?;
        }
        Some(Observation::new(values))
    }

    fn check_structure(data: &[u8]) -> Result<()> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(AnalysisError::EmptyDataset("input is empty".into()));
        }
        let lines = data
            .split(|&b| b == b'\n')
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
            .count();
        if lines < 2 {
            return Err(AnalysisError::EmptyDataset(
                "input needs a header and at least one data row".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CsvDataLoader {
    fn default() -> Self {
        Self::new(2)
    }
}

impl DataLoader for CsvDataLoader {
    fn get_name(&self) -> &str {
        "CSV Data Loader"
    }

    fn load_from_bytes(&self, data: &[u8]) -> Result<Dataset> {
        Self::check_structure(data)?;

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        let headers = rdr.headers()?.clone();
        if headers.len() < self.required_columns() {
            return Err(AnalysisError::MissingColumns {
                expected: self.required_columns(),
                found: headers.len(),
            });
        }
        for (attr, name) in Attribute::ALL
            .iter()
            .zip(headers.iter().skip(self.index_columns))
        {
            debug!(header = name, code = attr.code(), "column renamed");
        }

        let mut observations = Vec::new();
        let mut dropped = 0usize;
        for (idx, result) in rdr.records().enumerate() {
            let parsed = match result {
                Ok(record) => self.parse_record(&record),
                Err(e) => {
                    debug!(row = idx + 1, error = %e, "unreadable row");
                    None
                }
            };
            match parsed {
                Some(o) => observations.push(o),
                None => {
                    debug!(row = idx + 1, "dropping incomplete row");
                    dropped += 1;
                }
            }
        }

        info!(
            rows = observations.len(),
            dropped, "loaded building dataset"
        );
        Dataset::new(observations, dropped)
    }

    fn validate_format(&self, data: &str) -> Result<()> {
        Self::check_structure(data.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "idx,id,X1,X2,X3,X4,X5,X6,X7,X8,Y1,Y2\n";

    #[test]
    fn discards_index_columns_and_maps_by_position() {
        let data = format!("{HEADER}1,a,0.98,514.5,294,110.25,7,2,0,0,15.55,21.33\n");
        let ds = CsvDataLoader::default().load_from_string(&data).unwrap();
        assert_eq!(ds.len(), 1);
        let o = ds.observation(0);
        assert_eq!(o.get(Attribute::RelativeCompactness), 0.98);
        assert_eq!(o.get(Attribute::RoofArea), 110.25);
        assert_eq!(o.get(Attribute::HeatingLoad), 15.55);
        assert_eq!(o.get(Attribute::CoolingLoad), 21.33);
    }

    #[test]
    fn drops_rows_with_missing_values() {
        let data = format!(
            "{HEADER}\
             1,1,0.98,514.5,294,110.25,7,2,0,0,15.55,21.33\n\
             2,2,0.98,NA,294,110.25,7,3,0,0,15.55,21.33\n\
             3,3,0.98,514.5,294,110.25,7,4,0,0,,21.33\n\
             4,4,0.90,563.5,318.5,122.5,7,2,0,0,20.84,28.28\n\
             5,5,0.90,563.5\n"
        );
        let ds = CsvDataLoader::default().load_from_string(&data).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped_rows(), 3);
    }

    #[test]
    fn drops_rows_with_invalid_utf8() {
        let mut data = HEADER.as_bytes().to_vec();
        data.extend_from_slice(b"1,1,0.98,514.5,294,110.25,7,2,0,0,15.55,21.33\n");
        data.extend_from_slice(b"2,\xff\xfe,0.98,514.5,294,110.25,7,3,0,0,15.55,21.33\n");
        data.extend_from_slice(b"3,3,0.90,563.5,318.5,122.5,7,2,0,0,20.84,28.28\n");

        let ds = CsvDataLoader::default().load_from_bytes(&data).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped_rows(), 1);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, &data).unwrap();
        let ds = CsvDataLoader::default().load_path(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dropped_rows(), 1);
    }

    #[test]
    fn header_only_input_is_rejected() {
        let err = CsvDataLoader::default().load_from_bytes(HEADER.as_bytes()).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyDataset(_)));
        assert!(CsvDataLoader::default().validate_format("  \n").is_err());
    }

    #[test]
    fn accepts_decimal_comma() {
        let data = format!("{HEADER}1,1,\"0,98\",514.5,294,110.25,7,2,0,0,15.55,21.33\n");
        let ds = CsvDataLoader::default().load_from_string(&data).unwrap();
        assert_eq!(ds.observation(0).get(Attribute::RelativeCompactness), 0.98);
    }

    #[test]
    fn too_few_columns_is_an_error() {
        let data = "a,b,c\n1,2,3\n";
        let err = CsvDataLoader::default().load_from_string(data).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MissingColumns {
                expected: 12,
                found: 3
            }
        ));
    }

    #[test]
    fn all_rows_incomplete_is_empty_dataset() {
        let data = format!("{HEADER}1,1,NA,514.5,294,110.25,7,2,0,0,15.55,21.33\n");
        let err = CsvDataLoader::default().load_from_string(&data).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyDataset(_)));
    }

    #[test]
    fn configurable_index_columns() {
        let data = "X1,X2,X3,X4,X5,X6,X7,X8,Y1,Y2\n0.98,514.5,294,110.25,7,2,0,0,15.55,21.33\n";
        let ds = CsvDataLoader::new(0).load_from_string(data).unwrap();
        assert_eq!(ds.observation(0).get(Attribute::SurfaceArea), 514.5);
    }
}
