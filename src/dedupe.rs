//! Duplicate record resolution.
//!
//! Exports frequently hold the same publication or trial several times: once
//! verbatim, and sometimes as "soft" duplicates that share a logical key (title
//! and date, say) but each carry a different subset of the remaining fields.
//! This module collapses both kinds into one record per key.
//!
//! ## Usage
//!
//! ```rust
//! use druglink::dedupe::DuplicateResolver;
//! use druglink::{Dataset, Value};
//!
//! let dataset = Dataset::from_rows(
//!     ["id", "title", "date", "journal"],
//!     vec![
//!         vec![Value::Null, "aspirin trial".into(), "2020-01-01".into(), "nejm".into()],
//!         vec!["NCT04189588".into(), "aspirin trial".into(), "2020-01-01".into(), Value::Null],
//!     ],
//! )
//! .unwrap();
//!
//! let resolver = DuplicateResolver::new(["title", "date"]);
//! let resolved = resolver.resolve(dataset).unwrap();
//!
//! assert_eq!(resolved.len(), 1);
//! assert_eq!(
//!     resolved.rows()[0],
//!     vec![
//!         Value::from("NCT04189588"),
//!         Value::from("aspirin trial"),
//!         Value::from("2020-01-01"),
//!         Value::from("nejm"),
//!     ]
//! );
//! ```
//!
//! ## Merge rule
//!
//! Within a group, every column is forward-filled then backward-filled across
//! the group's rows (in dataset order) and the first row is kept. The result is
//! that each column takes the first populated value found in the group. When
//! two rows disagree on a populated field, the earlier row wins. A column that
//! is empty in every row of the group stays empty.

use indexmap::IndexMap;
use itertools::Itertools;

use crate::dataset::{Dataset, Row, Value};
use crate::Result;

/// Rows of a dataset that share one duplicate key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// The key values, in key column order
    pub key: Vec<Value>,
    /// Indices of the member rows, in dataset order
    pub rows: Vec<usize>,
}

impl DuplicateGroup {
    /// Whether the group needs merging.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.rows.len() > 1
    }
}

/// Removes rows that are identical across all columns, keeping the first.
#[must_use]
pub fn remove_exact_duplicates(dataset: Dataset) -> Dataset {
    let before = dataset.len();
    let (columns, rows) = dataset.into_parts();
    let rows: Vec<Row> = rows.into_iter().unique().collect();
    tracing::debug!(before, after = rows.len(), "removed exact duplicates");
    Dataset::from_parts(columns, rows)
}

/// Collapses rows sharing a duplicate key into one record per key.
///
/// # Examples
///
/// ```
/// use druglink::dedupe::DuplicateResolver;
///
/// let resolver = DuplicateResolver::new(["scientific_title", "date"]);
/// assert_eq!(resolver.key(), &["scientific_title", "date"]);
/// ```
#[derive(Debug, Clone)]
pub struct DuplicateResolver {
    key: Vec<String>,
}

impl DuplicateResolver {
    /// Creates a resolver keyed on the given columns.
    #[must_use]
    pub fn new<I, S>(key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &[String] {
        &self.key
    }

    /// Groups the rows of `dataset` by key, in order of each key's first row.
    ///
    /// Missing values take part in the key like any other value, so two rows
    /// with the same title and no date form a group.
    ///
    /// # Errors
    ///
    /// Returns `DrugLinkError::MissingColumn` if a key column is not in the
    /// dataset.
    pub fn find_duplicates(&self, dataset: &Dataset) -> Result<Vec<DuplicateGroup>> {
        let key_indices = self
            .key
            .iter()
            .map(|column| dataset.require_column(column))
            .collect::<Result<Vec<_>>>()?;

        let mut groups: IndexMap<Vec<Value>, Vec<usize>> = IndexMap::new();
        for (i, row) in dataset.rows().iter().enumerate() {
            let key = key_indices.iter().map(|&k| row[k].clone()).collect();
            groups.entry(key).or_default().push(i);
        }

        Ok(groups
            .into_iter()
            .map(|(key, rows)| DuplicateGroup { key, rows })
            .collect())
    }

    /// Removes exact duplicates, then merges rows that share a key.
    ///
    /// Rows with a unique key come first in their original order, followed by
    /// one merged row per duplicated key. Column order is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DrugLinkError::MissingColumn` if a key column is not in the
    /// dataset.
    pub fn resolve(&self, dataset: Dataset) -> Result<Dataset> {
        let dataset = remove_exact_duplicates(dataset);
        let groups = self.find_duplicates(&dataset)?;
        let (columns, rows) = dataset.into_parts();

        let (singles, duplicated): (Vec<_>, Vec<_>) =
            groups.into_iter().partition(|g| !g.has_duplicates());

        let mut singles: Vec<usize> = singles.into_iter().flat_map(|g| g.rows).collect();
        singles.sort_unstable();

        let merged: Vec<Row> = duplicated
            .iter()
            .map(|group| {
                let members: Vec<&Row> = group.rows.iter().map(|&i| &rows[i]).collect();
                merge_rows(&members, columns.len())
            })
            .collect();

        tracing::debug!(
            key = ?self.key,
            unique = singles.len(),
            merged_groups = merged.len(),
            "resolved soft duplicates"
        );

        let mut resolved: Vec<Row> = singles.into_iter().map(|i| rows[i].clone()).collect();
        resolved.extend(merged);
        Ok(Dataset::from_parts(columns, resolved))
    }
}

/// Merges a group into one row: forward fill, backward fill, keep the first.
fn merge_rows(rows: &[&Row], width: usize) -> Row {
    (0..width)
        .map(|column| {
            // After a forward then backward fill, the first row of a column
            // holds the column's first populated value in group order.
            rows.iter()
                .map(|row| &row[column])
                .find(|value| !value.is_missing())
                .cloned()
                .unwrap_or(Value::Null)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DrugLinkError;
    use pretty_assertions::assert_eq;

    fn publications(rows: Vec<Row>) -> Dataset {
        Dataset::from_rows(["id", "title", "date", "journal"], rows).unwrap()
    }

    #[test]
    fn test_remove_exact_duplicates() {
        let row: Row = vec![Value::Integer(1), "a".into(), "2020-01-01".into(), "nejm".into()];
        let other: Row = vec![Value::Integer(2), "b".into(), Value::Null, "nejm".into()];
        let dataset = publications(vec![row.clone(), other.clone(), row.clone()]);

        let result = remove_exact_duplicates(dataset);
        assert_eq!(result.rows(), &[row, other]);
    }

    #[test]
    fn test_find_duplicates_groups_in_first_seen_order() {
        let dataset = publications(vec![
            vec![Value::Integer(1), "b".into(), "d1".into(), "j".into()],
            vec![Value::Integer(2), "a".into(), "d1".into(), "j".into()],
            vec![Value::Integer(3), "b".into(), "d1".into(), Value::Null],
        ]);

        let groups = DuplicateResolver::new(["title", "date"])
            .find_duplicates(&dataset)
            .unwrap();
        assert_eq!(
            groups,
            vec![
                DuplicateGroup {
                    key: vec!["b".into(), "d1".into()],
                    rows: vec![0, 2],
                },
                DuplicateGroup {
                    key: vec!["a".into(), "d1".into()],
                    rows: vec![1],
                },
            ]
        );
    }

    #[test]
    fn test_merge_fills_missing_fields() {
        let dataset = publications(vec![
            vec![Value::Null, "t".into(), "d".into(), "journal a".into()],
            vec![Value::Integer(7), "t".into(), "d".into(), Value::Null],
            vec![Value::Integer(1), "other".into(), "d".into(), "journal b".into()],
        ]);

        let result = DuplicateResolver::new(["title", "date"])
            .resolve(dataset)
            .unwrap();
        assert_eq!(
            result.rows(),
            &[
                vec![Value::Integer(1), "other".into(), "d".into(), "journal b".into()],
                vec![Value::Integer(7), "t".into(), "d".into(), "journal a".into()],
            ]
        );
    }

    #[test]
    fn test_conflicting_values_first_wins() {
        let dataset = publications(vec![
            vec![Value::Integer(1), "t".into(), "d".into(), "first".into()],
            vec![Value::Integer(2), "t".into(), "d".into(), "second".into()],
        ]);

        let result = DuplicateResolver::new(["title", "date"])
            .resolve(dataset)
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.rows()[0],
            vec![Value::Integer(1), "t".into(), "d".into(), "first".into()]
        );
    }

    #[test]
    fn test_value_only_in_last_row_is_recovered() {
        let dataset = publications(vec![
            vec![Value::Null, "t".into(), "d".into(), Value::Null],
            vec![Value::Null, "t".into(), "d".into(), Value::Null],
            vec![Value::Integer(3), "t".into(), "d".into(), Value::Null],
        ]);

        let result = DuplicateResolver::new(["title", "date"])
            .resolve(dataset)
            .unwrap();
        // The journal gap stays open: nobody in the group has one
        assert_eq!(
            result.rows(),
            &[vec![Value::Integer(3), "t".into(), "d".into(), Value::Null]]
        );
    }

    #[test]
    fn test_complete_union_gives_complete_record() {
        let dataset = publications(vec![
            vec![Value::Integer(5), "t".into(), Value::Null, Value::Null],
            vec![Value::Null, "t".into(), Value::Null, "j".into()],
        ]);

        let result = DuplicateResolver::new(["title"]).resolve(dataset).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0][0], Value::Integer(5));
        assert_eq!(result.rows()[0][3], Value::from("j"));
    }

    #[test]
    fn test_missing_key_column() {
        let dataset = publications(vec![]);
        let result = DuplicateResolver::new(["scientific_title"]).resolve(dataset);
        assert!(matches!(
            result,
            Err(DrugLinkError::MissingColumn(c)) if c == "scientific_title"
        ));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let dataset = publications(vec![
            vec![Value::Null, "t".into(), "d".into(), "j".into()],
            vec![Value::Integer(1), "t".into(), "d".into(), Value::Null],
            vec![Value::Integer(2), "u".into(), "d".into(), "j".into()],
        ]);
        let resolver = DuplicateResolver::new(["title", "date"]);

        let once = resolver.resolve(dataset).unwrap();
        let twice = resolver.resolve(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
