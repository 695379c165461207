//! CSV source loader.
//!
//! Reads a CSV table with a header row into a [`Dataset`]. Empty cells become
//! [`Value::Null`]; a column whose populated cells all hold integers is typed as
//! integers, all floats as floats, anything else stays text.
//!
//! # Example
//!
//! ```
//! use druglink::{CsvLoader, DatasetParser, Value};
//!
//! let input = "atccode,drug\nA04AD,DIPHENHYDRAMINE\n";
//!
//! let loader = CsvLoader::new();
//!
//! let drugs = loader.parse(input).unwrap();
//! assert_eq!(drugs.rows()[0][1], Value::from("DIPHENHYDRAMINE"));
//! ```

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::dataset::{Dataset, Row, Value};
use crate::{DatasetParser, DrugLinkError, Result};

/// Configuration for CSV loading.
///
/// # Examples
///
/// ```
/// use druglink::csv::CsvConfig;
///
/// let mut config = CsvConfig::new();
/// config.set_delimiter(b';').set_trim(true);
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Delimiter to use for parsing the CSV
    delimiter: u8,
    /// Whether to strip whitespace around fields and headers
    trim: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvConfig {
    /// Creates a new CSV configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            trim: false,
        }
    }

    /// Sets the delimiter character
    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether fields are trimmed while reading
    pub fn set_trim(&mut self, trim: bool) -> &mut Self {
        self.trim = trim;
        self
    }
}

/// Loader for CSV tables.
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    config: CsvConfig,
}

impl CsvLoader {
    /// Creates a new CSV loader with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new CSV loader with custom configuration
    #[must_use]
    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    fn read_record(headers: &[String], record: &StringRecord, line: u64) -> Result<Vec<String>> {
        if record.len() != headers.len() {
            return Err(DrugLinkError::InvalidFormat(format!(
                "Record on line {} has {} fields but the header has {}",
                line,
                record.len(),
                headers.len()
            )));
        }
        Ok(record.iter().map(String::from).collect())
    }
}

/// Picks the narrowest type every populated cell of a column fits in.
fn infer_column(cells: &[&str]) -> fn(&str) -> Value {
    let populated = || cells.iter().filter(|c| !c.is_empty());

    if populated().next().is_none() {
        text_value
    } else if populated().all(|c| c.parse::<i64>().is_ok()) {
        integer_value
    } else if populated().all(|c| c.parse::<f64>().is_ok()) {
        float_value
    } else {
        text_value
    }
}

fn text_value(cell: &str) -> Value {
    if cell.is_empty() {
        Value::Null
    } else {
        Value::Text(cell.to_string())
    }
}

fn integer_value(cell: &str) -> Value {
    cell.parse().map_or(Value::Null, Value::Integer)
}

fn float_value(cell: &str) -> Value {
    cell.parse().map_or(Value::Null, Value::Float)
}

impl DatasetParser for CsvLoader {
    fn parse(&self, input: &str) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .has_headers(true)
            .trim(if self.config.trim { Trim::All } else { Trim::None })
            .from_reader(input.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if headers.is_empty() {
            return Err(DrugLinkError::InvalidFormat(
                "CSV input has no header row".to_string(),
            ));
        }

        let mut raw_rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());
            raw_rows.push(Self::read_record(&headers, &record, line)?);
        }

        let converters: Vec<fn(&str) -> Value> = (0..headers.len())
            .map(|i| {
                let cells: Vec<&str> = raw_rows.iter().map(|row| row[i].as_str()).collect();
                infer_column(&cells)
            })
            .collect();

        let rows: Vec<Row> = raw_rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&converters)
                    .map(|(cell, convert)| convert(cell))
                    .collect()
            })
            .collect();

        Dataset::from_rows(headers, rows)
    }
}
