//! Candidate cities, loaded once per run from a CSV file.
//!
//! ## Format
//!
//! ```text
//! id,latitude,longitude,name,state,county
//! 1,39.7817,-89.6501,Springfield,Illinois,Sangamon
//! 2,42.1015,-72.5898,Springfield,Massachusetts,Hampden
//! 3,61.2181,-149.9003,Anchorage,Alaska,
//! ```
//!
//! `county` may be empty (independent cities, Alaska boroughs). Extra columns
//! are ignored so the dataset can carry population or FIPS codes alongside.
//! Ids must be unique: the used-id file refers to cities by id alone.

use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Identifier of a candidate city, stable across runs.
pub type CityId = u64;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Cannot read dataset {path}: {source}")]
    Open { path: PathBuf, source: csv::Error },
    #[error("Malformed dataset row: {0}")]
    Row(#[from] csv::Error),
    #[error("Duplicate city id {0} in dataset")]
    DuplicateId(CityId),
}

/// One postable location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CityRecord {
    pub id: CityId,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub county: Option<String>,
}

impl CityRecord {
    /// County name, if present and not blank.
    pub fn county(&self) -> Option<&str> {
        self.county
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Load and validate the dataset at `path`.
pub fn load_dataset(path: &Path) -> Result<Vec<CityRecord>, DatasetError> {
    let reader = csv::Reader::from_path(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    collect_records(reader)
}

/// Parse a dataset from any reader (header row required).
pub fn parse_dataset<R: Read>(input: R) -> Result<Vec<CityRecord>, DatasetError> {
    collect_records(csv::Reader::from_reader(input))
}

fn collect_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<CityRecord>, DatasetError> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for row in reader.deserialize::<CityRecord>() {
        let record = row?;
        if !seen.insert(record.id) {
            return Err(DatasetError::DuplicateId(record.id));
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
id,latitude,longitude,name,state,county
1,39.7817,-89.6501,Springfield,Illinois,Sangamon
2,42.1015,-72.5898,Springfield,Massachusetts,Hampden
3,61.2181,-149.9003,Anchorage,Alaska,
";

    #[test]
    fn parse_sample_rows() {
        let records = parse_dataset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].name, "Springfield");
        assert_eq!(records[0].state, "Illinois");
        assert_eq!(records[0].county(), Some("Sangamon"));
        assert_eq!(records[1].latitude, 42.1015);
        assert_eq!(records[1].longitude, -72.5898);
    }

    #[test]
    fn empty_county_is_none() {
        let records = parse_dataset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records[2].county, None);
        assert_eq!(records[2].county(), None);
    }

    #[test]
    fn blank_county_is_treated_as_absent() {
        let record = CityRecord {
            id: 9,
            latitude: 0.0,
            longitude: 0.0,
            name: "Juneau".into(),
            state: "Alaska".into(),
            county: Some("   ".into()),
        };
        assert_eq!(record.county(), None);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = "\
id,name,state,county,latitude,longitude,population
7,Boise,Idaho,Ada,43.615,-116.2023,235684
";
        let records = parse_dataset(csv.as_bytes()).unwrap();
        assert_eq!(records[0].id, 7);
        assert_eq!(records[0].county(), Some("Ada"));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let csv = "\
id,latitude,longitude,name,state,county
5,1.0,2.0,A,X,
5,3.0,4.0,B,Y,
";
        let result = parse_dataset(csv.as_bytes());
        assert!(matches!(result, Err(DatasetError::DuplicateId(5))));
    }

    #[test]
    fn malformed_row_is_error() {
        let csv = "\
id,latitude,longitude,name,state,county
one,1.0,2.0,A,X,
";
        assert!(matches!(
            parse_dataset(csv.as_bytes()),
            Err(DatasetError::Row(_))
        ));
    }

    #[test]
    fn load_dataset_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cities.csv");
        fs::write(&path, SAMPLE).unwrap();

        let records = load_dataset(&path).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn load_missing_dataset_names_path() {
        let err = load_dataset(Path::new("/nonexistent/cities.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/cities.csv"));
    }
}
