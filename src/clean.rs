//! Dataset cleaning pipeline.
//!
//! A [`CleaningPipeline`] runs, in this fixed order:
//!
//! 1. exact duplicate removal (always)
//! 2. soft duplicate resolution on `unique_subset` (if configured)
//! 3. text normalization outside `exclude_columns` (if configured)
//! 4. date normalization of `date_columns` (if configured)
//!
//! Duplicates are resolved on the raw values, before any normalization, so
//! rows differing only by case or whitespace are still reported as distinct
//! records.
//!
//! # Example
//!
//! ```
//! use druglink::clean::{CleaningConfig, CleaningPipeline};
//! use druglink::{Dataset, Value};
//! use chrono::NaiveDate;
//!
//! let trials = Dataset::from_rows(
//!     ["id", "scientific_title", "date", "journal"],
//!     vec![vec![
//!         "NCT01967433".into(),
//!         " Use of Diphenhydramine as an Adjunctive Sedative ".into(),
//!         "1 January 2020".into(),
//!         "Journal of emergency nursing".into(),
//!     ]],
//! )
//! .unwrap();
//!
//! let mut config = CleaningConfig::new();
//! config
//!     .set_date_columns(["date"])
//!     .set_exclude_columns(["id"])
//!     .set_unique_subset(["scientific_title", "date"]);
//!
//! let cleaned = CleaningPipeline::new(config).clean(trials).unwrap();
//! let row = &cleaned.rows()[0];
//! assert_eq!(row[0], Value::from("NCT01967433"));
//! assert_eq!(row[1], Value::from("use of diphenhydramine as an adjunctive sedative"));
//! assert_eq!(row[2], Value::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()));
//! ```

pub mod dates;
pub mod text;

use crate::Result;
use crate::dataset::{Dataset, Value};
use crate::dedupe::{DuplicateResolver, remove_exact_duplicates};

/// Per-dataset cleaning options.
///
/// Every step except exact duplicate removal is skipped when its option is
/// unset.
///
/// # Examples
///
/// ```
/// use druglink::clean::CleaningConfig;
/// use druglink::Value;
///
/// let mut config = CleaningConfig::new();
/// config
///     .set_date_columns(["date"])
///     .set_date_default(Value::from("1900-01-01"))
///     .set_exclude_columns(["id"])
///     .set_unique_subset(["title", "date"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CleaningConfig {
    /// Columns holding free-form dates
    pub date_columns: Option<Vec<String>>,
    /// Columns kept verbatim by text normalization
    pub exclude_columns: Option<Vec<String>>,
    /// Columns forming the duplicate key
    pub unique_subset: Option<Vec<String>>,
    /// Replacement for dates that fail to parse
    pub date_default: Value,
}

fn owned<I, S>(columns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    columns.into_iter().map(Into::into).collect()
}

impl CleaningConfig {
    /// Creates a configuration with every optional step disabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the columns to parse as dates
    pub fn set_date_columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_columns = Some(owned(columns));
        self
    }

    /// Sets the columns that text normalization leaves alone
    pub fn set_exclude_columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_columns = Some(owned(columns));
        self
    }

    /// Sets the duplicate key columns
    pub fn set_unique_subset<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_subset = Some(owned(columns));
        self
    }

    /// Sets the value written in place of an unparseable date
    pub fn set_date_default(&mut self, default: Value) -> &mut Self {
        self.date_default = default;
        self
    }
}

/// Runs the cleaning steps over one dataset.
#[derive(Debug, Clone, Default)]
pub struct CleaningPipeline {
    config: CleaningConfig,
}

impl CleaningPipeline {
    #[must_use]
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    /// Cleans `dataset` and returns the result.
    ///
    /// # Errors
    ///
    /// Returns `DrugLinkError::MissingColumn` if a `unique_subset` column is
    /// absent. Unparseable dates are replaced by the configured default, never
    /// reported.
    pub fn clean(&self, dataset: Dataset) -> Result<Dataset> {
        let rows_in = dataset.len();
        let mut dataset = remove_exact_duplicates(dataset);

        if let Some(subset) = self.config.unique_subset.as_deref().filter(|s| !s.is_empty()) {
            dataset = DuplicateResolver::new(subset.iter().cloned()).resolve(dataset)?;
        }
        if let Some(exclude) = self.config.exclude_columns.as_deref().filter(|e| !e.is_empty()) {
            dataset = text::normalize_text(dataset, exclude);
        }
        if let Some(columns) = self.config.date_columns.as_deref().filter(|c| !c.is_empty()) {
            dataset = dates::normalize_dates(dataset, columns, &self.config.date_default);
        }

        tracing::debug!(rows_in, rows_out = dataset.len(), "cleaned dataset");
        Ok(dataset)
    }
}
