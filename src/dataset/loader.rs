//! Dataset loading from CSV, JSON and JSON Lines files.
//!
//! CSV files need a header row naming the narrative column
//! (`crimeaditionalinfo`, `text` or `narrative`), `category` and
//! `sub_category`. Other columns are ignored:
//!
//! ```csv
//! category,sub_category,crimeaditionalinfo
//! Online Financial Fraud,UPI Related Frauds,I lost money through a fake UPI request
//! ```
//!
//! JSON files hold an array of objects with the same field names; JSON Lines
//! files hold one object per line.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};

use crate::dataset::{Dataset, Record};
use crate::error::{ClassifierError, Result};

/// Header names accepted for the narrative column.
pub const NARRATIVE_COLUMNS: &[&str] = &["crimeaditionalinfo", "text", "narrative"];

/// Supported dataset file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// Comma separated values with a header row.
    Csv,
    /// A JSON array of records.
    Json,
    /// One JSON record per line.
    JsonLines,
}

impl DatasetFormat {
    /// Guess the format from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(DatasetFormat::Csv),
            Some("json") => Ok(DatasetFormat::Json),
            Some("jsonl") | Some("ndjson") => Ok(DatasetFormat::JsonLines),
            _ => Err(ClassifierError::invalid_argument(format!(
                "Cannot infer dataset format of '{}': expected .csv, .json or .jsonl",
                path.display()
            ))),
        }
    }
}

/// Loads labelled records from files or readers.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    /// CSV delimiter character (default: ',')
    delimiter: u8,
    /// Whether to skip records that have an empty label
    skip_unlabelled: bool,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    /// Create a loader with comma delimiter that skips unlabelled rows.
    pub fn new() -> Self {
        DatasetLoader {
            delimiter: b',',
            skip_unlabelled: true,
        }
    }

    /// Set a custom CSV delimiter character.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter as u8;
        self
    }

    /// Set whether records with an empty label are skipped.
    pub fn with_skip_unlabelled(mut self, skip: bool) -> Self {
        self.skip_unlabelled = skip;
        self
    }

    /// Load a dataset, choosing the format by file extension.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        let format = DatasetFormat::from_path(path)?;
        let file = File::open(path).map_err(|e| {
            ClassifierError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open dataset '{}': {}", path.display(), e),
            ))
        })?;

        let dataset = match format {
            DatasetFormat::Csv => self.read_csv(file)?,
            DatasetFormat::Json => self.read_json(file)?,
            DatasetFormat::JsonLines => self.read_json_lines(BufReader::new(file))?,
        };

        info!("Loaded {} records from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Read CSV with a header row.
    pub fn read_csv<R: Read>(&self, reader: R) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let narrative_idx = NARRATIVE_COLUMNS
            .iter()
            .find_map(|name| column_index(&headers, name))
            .ok_or_else(|| {
                ClassifierError::invalid_argument(format!(
                    "CSV header has no narrative column (one of {})",
                    NARRATIVE_COLUMNS.join(", ")
                ))
            })?;
        let category_idx = column_index(&headers, "category")
            .ok_or_else(|| ClassifierError::invalid_argument("CSV header has no 'category' column"))?;
        let sub_category_idx = column_index(&headers, "sub_category").ok_or_else(|| {
            ClassifierError::invalid_argument("CSV header has no 'sub_category' column")
        })?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let field = |idx: usize| row.get(idx).unwrap_or_default().to_string();
            records.push(Record::new(
                field(narrative_idx),
                field(category_idx),
                field(sub_category_idx),
            ));
        }

        Ok(self.finish(records))
    }

    /// Read a JSON array of records.
    pub fn read_json<R: Read>(&self, reader: R) -> Result<Dataset> {
        let records: Vec<Record> = serde_json::from_reader(reader)?;
        Ok(self.finish(records))
    }

    /// Read JSON Lines. Blank lines are skipped.
    pub fn read_json_lines<R: BufRead>(&self, reader: R) -> Result<Dataset> {
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str::<Record>(&line)?);
        }
        Ok(self.finish(records))
    }

    fn finish(&self, records: Vec<Record>) -> Dataset {
        if !self.skip_unlabelled {
            return Dataset::from_records(records);
        }

        let total = records.len();
        let dataset: Dataset = records
            .into_iter()
            .filter(|r| !r.category.trim().is_empty() && !r.sub_category.trim().is_empty())
            .collect();

        let skipped = total - dataset.len();
        if skipped > 0 {
            warn!("Skipped {skipped} records with a missing label");
        }
        dataset
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_csv() {
        let csv = "category,sub_category,crimeaditionalinfo\n\
                   Online Financial Fraud,UPI Related Frauds,Money debited via fake UPI link\n\
                   Hacking,Email Hacking,\"My email was hacked, password changed\"\n";

        let dataset = DatasetLoader::new().read_csv(csv.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].category, "Online Financial Fraud");
        assert_eq!(
            dataset.records()[1].narrative,
            "My email was hacked, password changed"
        );
    }

    #[test]
    fn test_read_csv_keeps_numeric_text() {
        let csv = "text,category,sub_category\n00123,A,B\n";
        let dataset = DatasetLoader::new().read_csv(csv.as_bytes()).unwrap();
        assert_eq!(dataset.records()[0].narrative, "00123");
    }

    #[test]
    fn test_read_csv_missing_column() {
        let csv = "text,category\nhello,A\n";
        let result = DatasetLoader::new().read_csv(csv.as_bytes());
        assert!(matches!(result, Err(ClassifierError::InvalidArgument(_))));
    }

    #[test]
    fn test_skip_unlabelled() {
        let csv = "narrative,category,sub_category\nfirst,A,B\nsecond,,B\n";

        let dataset = DatasetLoader::new().read_csv(csv.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 1);

        let dataset = DatasetLoader::new()
            .with_skip_unlabelled(false)
            .read_csv(csv.as_bytes())
            .unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_read_json_and_json_lines() {
        let json = r#"[{"text": "otp shared", "category": "Fraud", "sub_category": "OTP"}]"#;
        let dataset = DatasetLoader::new().read_json(json.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 1);

        let jsonl = "{\"narrative\": \"a\", \"category\": \"X\", \"sub_category\": \"Y\"}\n\n\
                     {\"narrative\": \"b\", \"category\": \"X\", \"sub_category\": \"Z\"}\n";
        let dataset = DatasetLoader::new()
            .read_json_lines(Cursor::new(jsonl))
            .unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[1].sub_category, "Z");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(DatasetFormat::from_path("train.CSV").unwrap(), DatasetFormat::Csv);
        assert_eq!(
            DatasetFormat::from_path("data/test.jsonl").unwrap(),
            DatasetFormat::JsonLines
        );
        assert!(DatasetFormat::from_path("train.parquet").is_err());
    }
}
