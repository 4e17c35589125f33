//! JSON input files and the match report.

use std::{fs, path::Path};

use blindprint_core::{BigInt, LabeledResult, PlainVector, ProtocolError, vector::FINGERCODE_LEN};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Errors reading CLI input files.
#[derive(Error, Debug)]
pub enum InputError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// Offending file
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid JSON of the expected shape
    #[error("cannot parse {path}: {source}")]
    Json {
        /// Offending file
        path: String,
        /// Underlying error
        source: serde_json::Error,
    },

    /// Feature values could not be quantized
    #[error("record '{label}': {source}")]
    Quantize {
        /// Label of the offending record
        label: String,
        /// Underlying error
        source: ProtocolError,
    },
}

/// One enrollment record: `{"label": "...", "features": [f32, ...]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeatureRecord {
    /// Database label
    pub label: String,
    /// Raw float features
    pub features: Vec<f32>,
}

impl FeatureRecord {
    /// Quantize the features at `scale`.
    pub fn quantize(&self, scale: f64) -> Result<PlainVector, InputError> {
        if self.features.len() != FINGERCODE_LEN {
            tracing::warn!(
                label = %self.label,
                len = self.features.len(),
                expected = FINGERCODE_LEN,
                "feature vector length differs from FingerCode length"
            );
        }

        PlainVector::quantize(&self.features, scale)
            .map_err(|source| InputError::Quantize { label: self.label.clone(), source })
    }
}

/// Query file: `{"features": [f32, ...]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryRecord {
    /// Raw float features
    pub features: Vec<f32>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let display = path.display().to_string();
    let bytes = fs::read(path).map_err(|source| InputError::Io { path: display.clone(), source })?;
    serde_json::from_slice(&bytes).map_err(|source| InputError::Json { path: display, source })
}

/// Read an enrollment file: a JSON array of [`FeatureRecord`].
pub fn read_records(path: &Path) -> Result<Vec<FeatureRecord>, InputError> {
    read_json(path)
}

/// Read a query file and quantize it at `scale`.
pub fn read_query(path: &Path, scale: f64) -> Result<PlainVector, InputError> {
    let query: QueryRecord = read_json(path)?;
    FeatureRecord { label: "query".to_string(), features: query.features }.quantize(scale)
}

/// Outcome for one database entry in the match report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// Database label
    pub label: String,
    /// Recovered value in quantized units as a decimal string, if the entry
    /// succeeded. Sums over wide features exceed JSON's integer range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    /// Failure description, if the entry was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Match report written to stdout, entries nearest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    /// Distance mode the server evaluated
    pub mode: String,
    /// Fingerprint of the session public key
    pub key: String,
    /// Successful entries ranked ascending, then failed entries in database
    /// order
    pub entries: Vec<ReportEntry>,
}

impl MatchReport {
    /// Build a report from recovered results.
    pub fn new(mode: String, key: String, results: &[LabeledResult<BigInt>]) -> Self {
        let ranked = blindprint_core::rank(results).into_iter().map(|(label, distance)| {
            ReportEntry { label, distance: Some(distance.to_string()), error: None }
        });
        let failed = results.iter().filter_map(|r| {
            r.result.as_ref().err().map(|e| ReportEntry {
                label: r.label.clone(),
                distance: None,
                error: Some(e.to_string()),
            })
        });

        Self { mode, key, entries: ranked.chain(failed).collect() }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_enrollment_records() {
        let file = write_temp(r#"[{"label": "fp_001", "features": [0.5, -1.25]}]"#);

        let records = read_records(file.path()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantize(100.0).unwrap(), PlainVector::new(vec![50, -125]));
    }

    #[test]
    fn malformed_json_names_the_file() {
        let file = write_temp("{not json");

        let err = read_records(file.path()).unwrap_err();

        assert!(matches!(err, InputError::Json { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn query_is_quantized() {
        let file = write_temp(r#"{"features": [1.0, 2.0, 3.0]}"#);

        assert_eq!(read_query(file.path(), 1.0).unwrap(), PlainVector::new(vec![1, 2, 3]));
    }

    #[test]
    fn report_ranks_successes_then_lists_failures() {
        let results = vec![
            LabeledResult::ok("b", BigInt::from(40)),
            LabeledResult::err("x", ProtocolError::Decryption("bad".into())),
            LabeledResult::ok("a", BigInt::from(-7)),
        ];

        let report = MatchReport::new("corrected".into(), "00ff".into(), &results);
        let labels: Vec<_> = report.entries.iter().map(|e| e.label.as_str()).collect();

        assert_eq!(labels, ["a", "b", "x"]);
        assert_eq!(report.entries[0].distance.as_deref(), Some("-7"));
        assert_eq!(report.entries[2].distance, None);
        assert!(report.entries[2].error.is_some());
    }

    #[test]
    fn report_keeps_distances_beyond_i128() {
        let huge: BigInt = BigInt::from(i128::MAX) * 16;
        let results = vec![LabeledResult::ok("e", huge.clone())];

        let report = MatchReport::new("legacy".into(), "00ff".into(), &results);

        assert_eq!(report.entries[0].distance, Some(huge.to_string()));
    }
}
