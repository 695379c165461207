//! Drug mention graph.
//!
//! For every drug of the drug table, the graph records which publications and
//! clinical trials mention it in their title, and which journals carried those
//! mentions on which dates.
//!
//! ## Matching
//!
//! A drug is mentioned by a row when the drug name is a substring of the row's
//! title. Matching is case-sensitive; cleaned tables are already lowercased,
//! which makes it case-insensitive with respect to the raw data. Being a plain
//! substring test, a drug name that happens to be part of a longer word also
//! matches (`"ether"` matches `"together"`).
//!
//! ## Serialized shape
//!
//! ```json
//! {
//!   "diphenhydramine": {
//!     "journal": { "journal of emergency nursing": ["2019-01-01", "2020-01-01"] },
//!     "pubmed": [{ "title": "...", "date": "2019-01-01" }],
//!     "clinical_trials": [{ "title": "...", "date": "2020-01-01" }]
//!   }
//! }
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use druglink::graph::{GraphConfig, MentionGraphBuilder};
//! use druglink::{Dataset, Value};
//!
//! let drugs = Dataset::from_rows(["drug"], vec![vec!["aspirin".into()]]).unwrap();
//! let publications = Dataset::from_rows(
//!     ["title", "date", "journal"],
//!     vec![vec!["aspirin trial".into(), Value::Null, "nejm".into()]],
//! )
//! .unwrap();
//! let trials = Dataset::new(["scientific_title", "date", "journal"]);
//!
//! let mut config = GraphConfig::new();
//! config.set_run_in_parallel(true);
//!
//! let graph = MentionGraphBuilder::new()
//!     .with_config(config)
//!     .build(&drugs, &publications, &trials)
//!     .unwrap();
//! assert_eq!(graph.get("aspirin").unwrap().journal.len(), 1);
//! ```

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::Result;
use crate::dataset::Dataset;

/// Column holding drug names in the drug table
pub const DRUG_COLUMN: &str = "drug";
/// Title column of the publication table
pub const PUBLICATION_TITLE_COLUMN: &str = "title";
/// Title column of the clinical trial table
pub const TRIAL_TITLE_COLUMN: &str = "scientific_title";
pub const DATE_COLUMN: &str = "date";
pub const JOURNAL_COLUMN: &str = "journal";

/// A publication or trial attributed to a drug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceEntry {
    pub title: String,
    /// `None` when the source date could not be parsed
    pub date: Option<NaiveDate>,
}

/// Everything known about one drug's mentions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugMentions {
    /// Journal name to the distinct dates it mentioned the drug on
    pub journal: IndexMap<String, BTreeSet<Option<NaiveDate>>>,
    /// Distinct publications mentioning the drug
    pub pubmed: Vec<SourceEntry>,
    /// Distinct clinical trials mentioning the drug
    pub clinical_trials: Vec<SourceEntry>,
}

impl DrugMentions {
    /// Whether no source mentions the drug.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.journal.is_empty() && self.pubmed.is_empty() && self.clinical_trials.is_empty()
    }

    fn record(&mut self, kind: SourceKind, row: &SourceRow<'_>) {
        if let Some(journal) = row.journal {
            self.journal
                .entry(journal.to_string())
                .or_default()
                .insert(row.date);
        }

        let entries = match kind {
            SourceKind::Publication => &mut self.pubmed,
            SourceKind::Trial => &mut self.clinical_trials,
        };
        if !entries
            .iter()
            .any(|e| e.title == row.title && e.date == row.date)
        {
            entries.push(SourceEntry {
                title: row.title.to_string(),
                date: row.date,
            });
        }
    }
}

/// A `(drug, journal, date)` fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mention<'a> {
    pub drug: &'a str,
    pub journal: &'a str,
    pub date: Option<NaiveDate>,
}

/// The mention graph, keyed by drug name in drug table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentionGraph {
    drugs: IndexMap<String, DrugMentions>,
}

impl MentionGraph {
    #[must_use]
    pub fn get(&self, drug: &str) -> Option<&DrugMentions> {
        self.drugs.get(drug)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DrugMentions)> {
        self.drugs.iter().map(|(drug, mentions)| (drug.as_str(), mentions))
    }

    /// Every `(drug, journal, date)` fact in the graph.
    pub fn mentions(&self) -> impl Iterator<Item = Mention<'_>> {
        self.iter().flat_map(|(drug, mentions)| {
            mentions.journal.iter().flat_map(move |(journal, dates)| {
                dates.iter().map(move |&date| Mention {
                    drug,
                    journal: journal.as_str(),
                    date,
                })
            })
        })
    }

    /// Replaces any previous entry for `drug`.
    fn insert(&mut self, drug: String, mentions: DrugMentions) -> Option<DrugMentions> {
        self.drugs.insert(drug, mentions)
    }
}

/// Configuration for graph construction.
#[derive(Debug, Default, Clone)]
pub struct GraphConfig {
    /// Whether to scan drugs on the rayon thread pool.
    /// Only honoured with the `parallel` feature.
    pub run_in_parallel: bool,
}

impl GraphConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_run_in_parallel(&mut self, run_in_parallel: bool) -> &mut Self {
        self.run_in_parallel = run_in_parallel;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum SourceKind {
    Publication,
    Trial,
}

/// A source row reduced to what matching needs.
#[derive(Debug)]
struct SourceRow<'a> {
    title: &'a str,
    journal: Option<&'a str>,
    date: Option<NaiveDate>,
}

/// Builds a [`MentionGraph`] from cleaned drug, publication and trial tables.
#[derive(Debug, Default, Clone)]
pub struct MentionGraphBuilder {
    config: GraphConfig,
}

impl MentionGraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the graph.
    ///
    /// Every drug name of `drugs` becomes a key, mentioned or not. A drug name
    /// listed twice keeps only the entry computed last.
    ///
    /// # Errors
    ///
    /// Returns `DrugLinkError::MissingColumn` when a table lacks one of its
    /// required columns: `drug`; `title`, `date`, `journal`;
    /// `scientific_title`, `date`, `journal`.
    pub fn build(
        &self,
        drugs: &Dataset,
        publications: &Dataset,
        trials: &Dataset,
    ) -> Result<MentionGraph> {
        let drug_index = drugs.require_column(DRUG_COLUMN)?;
        let publications = Self::preprocess(publications, PUBLICATION_TITLE_COLUMN)?;
        let trials = Self::preprocess(trials, TRIAL_TITLE_COLUMN)?;

        let names: Vec<&str> = drugs
            .column_values(drug_index)
            .filter_map(|value| {
                let name = value.as_text();
                if name.is_none() {
                    tracing::warn!(?value, "skipping drug row without a name");
                }
                name
            })
            .collect();

        let entries = self.collect_mentions(&names, &publications, &trials);

        let mut graph = MentionGraph::default();
        for (name, mentions) in names.iter().zip(entries) {
            if graph.insert((*name).to_string(), mentions).is_some() {
                tracing::warn!(drug = *name, "drug listed more than once, keeping last entry");
            }
        }

        tracing::info!(
            drugs = graph.len(),
            mentions = graph.mentions().count(),
            "built mention graph"
        );
        Ok(graph)
    }

    #[cfg(feature = "parallel")]
    fn collect_mentions(
        &self,
        names: &[&str],
        publications: &[SourceRow<'_>],
        trials: &[SourceRow<'_>],
    ) -> Vec<DrugMentions> {
        if self.config.run_in_parallel {
            use rayon::prelude::*;

            names
                .par_iter()
                .map(|name| Self::mentions_of(name, publications, trials))
                .collect()
        } else {
            names
                .iter()
                .map(|name| Self::mentions_of(name, publications, trials))
                .collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn collect_mentions(
        &self,
        names: &[&str],
        publications: &[SourceRow<'_>],
        trials: &[SourceRow<'_>],
    ) -> Vec<DrugMentions> {
        names
            .iter()
            .map(|name| Self::mentions_of(name, publications, trials))
            .collect()
    }

    fn mentions_of(
        drug: &str,
        publications: &[SourceRow<'_>],
        trials: &[SourceRow<'_>],
    ) -> DrugMentions {
        let mut mentions = DrugMentions::default();
        let sources = publications
            .iter()
            .map(|row| (SourceKind::Publication, row))
            .chain(trials.iter().map(|row| (SourceKind::Trial, row)));

        for (kind, row) in sources {
            if row.title.contains(drug) {
                mentions.record(kind, row);
            }
        }
        mentions
    }

    fn preprocess<'a>(dataset: &'a Dataset, title_column: &str) -> Result<Vec<SourceRow<'a>>> {
        let title = dataset.require_column(title_column)?;
        let date = dataset.require_column(DATE_COLUMN)?;
        let journal = dataset.require_column(JOURNAL_COLUMN)?;

        let rows: Vec<SourceRow<'a>> = dataset
            .rows()
            .iter()
            .filter_map(|row| {
                Some(SourceRow {
                    title: row[title].as_text()?,
                    journal: row[journal].as_text(),
                    date: row[date].as_date(),
                })
            })
            .collect();

        if rows.len() < dataset.len() {
            tracing::debug!(
                column = title_column,
                skipped = dataset.len() - rows.len(),
                "rows without a title never match"
            );
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DrugLinkError;
    use crate::dataset::Value;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn drugs(names: &[&str]) -> Dataset {
        Dataset::from_rows(
            ["atccode", "drug"],
            names
                .iter()
                .map(|n| vec![Value::Null, Value::from(*n)])
                .collect(),
        )
        .unwrap()
    }

    fn publications(rows: &[(&str, Option<NaiveDate>, &str)]) -> Dataset {
        Dataset::from_rows(
            ["id", "title", "date", "journal"],
            rows.iter()
                .map(|(title, d, journal)| {
                    vec![Value::Null, Value::from(*title), Value::from(*d), Value::from(*journal)]
                })
                .collect(),
        )
        .unwrap()
    }

    fn trials(rows: &[(&str, Option<NaiveDate>, &str)]) -> Dataset {
        Dataset::from_rows(
            ["id", "scientific_title", "date", "journal"],
            rows.iter()
                .map(|(title, d, journal)| {
                    vec![Value::Null, Value::from(*title), Value::from(*d), Value::from(*journal)]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_rows_give_one_mention() {
        let d = Some(date(2020, 1, 1));
        let graph = MentionGraphBuilder::new()
            .build(
                &drugs(&["aspirin"]),
                &publications(&[("aspirin trial", d, "NEJM"), ("aspirin trial", d, "NEJM")]),
                &trials(&[]),
            )
            .unwrap();

        let aspirin = graph.get("aspirin").unwrap();
        assert_eq!(aspirin.journal["NEJM"], BTreeSet::from([d]));
        assert_eq!(
            aspirin.pubmed,
            vec![SourceEntry {
                title: "aspirin trial".to_string(),
                date: d,
            }]
        );
        assert!(aspirin.clinical_trials.is_empty());
    }

    #[test]
    fn test_every_drug_is_a_key() {
        let graph = MentionGraphBuilder::new()
            .build(
                &drugs(&["atropine", "ethanol", "betamethasone"]),
                &publications(&[("ethanol and liver", None, "hepatology")]),
                &trials(&[]),
            )
            .unwrap();

        assert_eq!(graph.len(), 3);
        assert!(graph.get("atropine").unwrap().is_empty());
        assert!(graph.get("betamethasone").unwrap().is_empty());
        assert!(!graph.get("ethanol").unwrap().is_empty());
        let order: Vec<&str> = graph.iter().map(|(d, _)| d).collect();
        assert_eq!(order, vec!["atropine", "ethanol", "betamethasone"]);
    }

    #[test]
    fn test_journal_shared_between_sources() {
        const NURSING: &str = "journal of emergency nursing";
        const PEDIATRICS: &str = "the journal of pediatrics";

        let graph = MentionGraphBuilder::new()
            .build(
                &drugs(&["diphenhydramine"]),
                &publications(&[
                    ("diphenhydramine for itching", Some(date(2019, 1, 1)), NURSING),
                    ("diphenhydramine and sleep", Some(date(2019, 1, 1)), NURSING),
                ]),
                &trials(&[
                    ("use of diphenhydramine as a sedative", Some(date(2020, 1, 1)), NURSING),
                    ("diphenhydramine in children", Some(date(2020, 1, 1)), PEDIATRICS),
                ]),
            )
            .unwrap();

        let mentions = graph.get("diphenhydramine").unwrap();
        assert_eq!(
            mentions.journal[NURSING],
            BTreeSet::from([Some(date(2019, 1, 1)), Some(date(2020, 1, 1))])
        );
        assert_eq!(mentions.journal.len(), 2);
        assert_eq!(mentions.pubmed.len(), 2);
        assert_eq!(mentions.clinical_trials.len(), 2);
    }

    #[test]
    fn test_substring_matching_is_literal() {
        let graph = MentionGraphBuilder::new()
            .build(
                &drugs(&["ether", "Aspirin"]),
                &publications(&[("together we stand", None, "j"), ("aspirin", None, "j")]),
                &trials(&[]),
            )
            .unwrap();

        // Substring, not word, matching
        assert_eq!(graph.get("ether").unwrap().pubmed.len(), 1);
        // Case-sensitive
        assert!(graph.get("Aspirin").unwrap().is_empty());
    }

    #[test]
    fn test_missing_dates_and_journals() {
        let mut pubs = publications(&[("aspirin a", None, "j")]);
        pubs.push_row(vec![
            Value::Null,
            "aspirin b".into(),
            "1900-01-01".into(),
            Value::Null,
        ])
        .unwrap();
        pubs.push_row(vec![Value::Null, Value::Null, Value::Null, "j".into()])
            .unwrap();

        let graph = MentionGraphBuilder::new()
            .build(&drugs(&["aspirin"]), &pubs, &trials(&[]))
            .unwrap();

        let aspirin = graph.get("aspirin").unwrap();
        assert_eq!(aspirin.journal.len(), 1);
        assert_eq!(aspirin.journal["j"], BTreeSet::from([None]));
        assert_eq!(aspirin.pubmed[1].date, Some(date(1900, 1, 1)));
        assert_eq!(aspirin.pubmed.len(), 2);
    }

    #[test]
    fn test_duplicate_drug_names_keep_one_key() {
        let graph = MentionGraphBuilder::new()
            .build(
                &drugs(&["aspirin", "aspirin"]),
                &publications(&[("aspirin", None, "j")]),
                &trials(&[]),
            )
            .unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("aspirin").unwrap().pubmed.len(), 1);
    }

    #[test]
    fn test_drug_row_without_name_is_skipped() {
        let mut drugs = drugs(&["atropine"]);
        drugs.push_row(vec![Value::from("A04AD"), Value::Null]).unwrap();
        drugs.push_row(vec![Value::Null, Value::Integer(42)]).unwrap();
        drugs.push_row(vec![Value::Null, Value::from("ethanol")]).unwrap();

        let graph = MentionGraphBuilder::new()
            .build(&drugs, &publications(&[("ethanol use", None, "j")]), &trials(&[]))
            .unwrap();

        let order: Vec<&str> = graph.iter().map(|(d, _)| d).collect();
        assert_eq!(order, vec!["atropine", "ethanol"]);
        assert_eq!(graph.get("ethanol").unwrap().pubmed.len(), 1);
    }

    #[test]
    fn test_missing_columns() {
        let no_journal = Dataset::new(["title", "date"]);
        let result = MentionGraphBuilder::new().build(&drugs(&[]), &no_journal, &trials(&[]));
        assert!(matches!(result, Err(DrugLinkError::MissingColumn(c)) if c == "journal"));

        let no_drug = Dataset::new(["name"]);
        let result = MentionGraphBuilder::new().build(&no_drug, &publications(&[]), &trials(&[]));
        assert!(matches!(result, Err(DrugLinkError::MissingColumn(c)) if c == "drug"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let names: Vec<String> = (0..50).map(|i| format!("drug{i:02}")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let titles: Vec<String> = (0..200)
            .map(|i| format!("study of drug{:02} and drug{:02}", i % 50, (i * 7) % 50))
            .collect();
        let pub_rows: Vec<(&str, Option<NaiveDate>, &str)> = titles
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let journal = if i % 2 == 0 { "even" } else { "odd" };
                (t.as_str(), Some(date(2020, 1, 1 + (i % 28) as u32)), journal)
            })
            .collect();

        let drugs = drugs(&name_refs);
        let pubs = publications(&pub_rows);
        let trials = trials(&pub_rows);

        let sequential = MentionGraphBuilder::new()
            .build(&drugs, &pubs, &trials)
            .unwrap();
        let mut config = GraphConfig::new();
        config.set_run_in_parallel(true);
        let parallel = MentionGraphBuilder::new()
            .with_config(config)
            .build(&drugs, &pubs, &trials)
            .unwrap();

        assert_eq!(sequential, parallel);
        let order: Vec<&str> = parallel.iter().map(|(d, _)| d).collect();
        assert_eq!(order, name_refs);
    }

    #[test]
    fn test_serialized_shape() {
        let graph = MentionGraphBuilder::new()
            .build(
                &drugs(&["aspirin"]),
                &publications(&[("aspirin trial", Some(date(2020, 1, 1)), "nejm")]),
                &trials(&[("aspirin in adults", None, "nejm")]),
            )
            .unwrap();

        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "aspirin": {
                    "journal": { "nejm": [null, "2020-01-01"] },
                    "pubmed": [{ "title": "aspirin trial", "date": "2020-01-01" }],
                    "clinical_trials": [{ "title": "aspirin in adults", "date": null }]
                }
            })
        );

        let back: MentionGraph = serde_json::from_value(json).unwrap();
        assert_eq!(back, graph);
    }
}
