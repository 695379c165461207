//! Clean drug, publication and clinical trial tables, then link every drug to
//! the journals, publications and trials that mention it.
//!
//! `druglink` works on small in-memory tables. Raw tables are read from CSV or
//! JSON, cleaned (duplicate resolution, text and date normalization) and fed to
//! a mention graph builder that matches drug names inside titles.
//!
//! # Key Features
//!
//! - **Tabular ingestion**: CSV and JSON-array sources into one [`Dataset`] type
//! - **Duplicate resolution**:
//!   - Exact duplicate removal
//!   - Soft duplicates merged by key, filling missing fields across the group
//! - **Normalization**:
//!   - Trimmed, lowercased text columns
//!   - Day-first date parsing into canonical calendar dates
//! - **Mention graph**: per drug, journals with their mention dates plus the
//!   distinct publications and trials that mention it
//! - **Queries**: journal mentioning the most drugs, drugs sharing a journal
//!
//! # Basic Usage
//!
//! ```rust
//! use druglink::{DatasetParser, CsvLoader};
//! use druglink::clean::{CleaningConfig, CleaningPipeline};
//! use druglink::graph::MentionGraphBuilder;
//!
//! let drugs = CsvLoader::new().parse("atccode,drug\nA04AD,ASPIRIN\n").unwrap();
//! let publications = CsvLoader::new()
//!     .parse("id,title,date,journal\n1,Aspirin in adults,01/01/2019,NEJM\n")
//!     .unwrap();
//! let trials = CsvLoader::new()
//!     .parse("id,scientific_title,date,journal\nNCT1,Placebo study,1 January 2020,NEJM\n")
//!     .unwrap();
//!
//! let mut drugs_config = CleaningConfig::new();
//! drugs_config.set_exclude_columns(["atccode"]);
//! let drugs = CleaningPipeline::new(drugs_config).clean(drugs).unwrap();
//!
//! let mut config = CleaningConfig::new();
//! config
//!     .set_date_columns(["date"])
//!     .set_exclude_columns(["id"])
//!     .set_unique_subset(["title", "date"]);
//! let publications = CleaningPipeline::new(config).clean(publications).unwrap();
//!
//! let mut config = CleaningConfig::new();
//! config
//!     .set_date_columns(["date"])
//!     .set_exclude_columns(["id"])
//!     .set_unique_subset(["scientific_title", "date"]);
//! let trials = CleaningPipeline::new(config).clean(trials).unwrap();
//!
//! let graph = MentionGraphBuilder::new()
//!     .build(&drugs, &publications, &trials)
//!     .unwrap();
//! assert_eq!(graph.get("aspirin").unwrap().pubmed.len(), 1);
//! ```
//!
//! # Error Handling
//!
//! The library uses a custom [`Result`] type that wraps [`DrugLinkError`].
//! Unparseable dates are not errors: they are replaced by a configured default.
//!
//! ```rust
//! use druglink::{DatasetParser, CsvLoader, DrugLinkError};
//! use std::path::Path;
//!
//! match CsvLoader::new().load(Path::new("missing/drugs.csv")) {
//!     Err(DrugLinkError::MissingSource { path }) => eprintln!("no file at {}", path.display()),
//!     Err(e) => eprintln!("Other error: {}", e),
//!     Ok(_) => unreachable!(),
//! }
//! ```
//!
//! # Performance Considerations
//!
//! Matching is a substring scan of every title for every drug. With the
//! `parallel` feature the per-drug scans can run on the rayon thread pool,
//! see [`graph::GraphConfig`].

use std::path::{Path, PathBuf};
use thiserror::Error;

extern crate csv as csv_crate;

pub mod clean;
pub mod csv;
pub mod dataset;
pub mod dedupe;
pub mod graph;
pub mod json;
pub mod output;
pub mod pipeline;
pub mod queries;
mod regex;

// Reexports
pub use csv::CsvLoader;
pub use dataset::{Dataset, Record, Value};
pub use graph::{MentionGraph, MentionGraphBuilder};
pub use json::JsonLoader;

/// A specialized Result type for druglink operations.
pub type Result<T> = std::result::Result<T, DrugLinkError>;

/// Represents errors that can occur while loading, cleaning or persisting data.
#[derive(Error, Debug)]
pub enum DrugLinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source not found: {}", path.display())]
    MissingSource { path: PathBuf },

    #[error("Parse error: {0}")]
    InvalidFormat(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<csv_crate::Error> for DrugLinkError {
    fn from(err: csv_crate::Error) -> Self {
        DrugLinkError::InvalidFormat(err.to_string())
    }
}

impl From<serde_json::Error> for DrugLinkError {
    fn from(err: serde_json::Error) -> Self {
        DrugLinkError::InvalidFormat(err.to_string())
    }
}

/// Trait for implementing tabular source parsers.
pub trait DatasetParser {
    /// Parse a string holding one whole table.
    ///
    /// # Errors
    ///
    /// Returns `DrugLinkError::InvalidFormat` if the input is malformed
    fn parse(&self, input: &str) -> Result<Dataset>;

    /// Read and parse a table from disk.
    ///
    /// # Errors
    ///
    /// Returns `DrugLinkError::MissingSource` when `path` does not exist, so that
    /// a missing input is reported before any cleaning happens.
    fn load(&self, path: &Path) -> Result<Dataset> {
        if !path.exists() {
            return Err(DrugLinkError::MissingSource {
                path: path.to_path_buf(),
            });
        }
        let input = std::fs::read_to_string(path)?;
        let dataset = self.parse(&input)?;
        tracing::debug!(path = %path.display(), rows = dataset.len(), "loaded source");
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DrugLinkError::InvalidFormat("Invalid line".to_string());
        assert_eq!(error.to_string(), "Parse error: Invalid line");

        let error = DrugLinkError::MissingSource {
            path: PathBuf::from("data/drugs.csv"),
        };
        assert_eq!(error.to_string(), "Source not found: data/drugs.csv");
    }

    #[test]
    fn test_persistence_error_keeps_cause() {
        use std::error::Error as _;

        let error = DrugLinkError::Persistence {
            path: PathBuf::from("output/result.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(error.to_string().starts_with("Failed to write output/result.json"));
        assert_eq!(error.source().unwrap().to_string(), "denied");
    }
}
