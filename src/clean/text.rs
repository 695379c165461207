//! Text column normalization.

use crate::dataset::{Dataset, Value};

/// Trims and lowercases a text cell. Other cells pass through.
#[must_use]
pub fn normalize_cell(cell: Value) -> Value {
    match cell {
        Value::Text(s) => Value::Text(s.trim().to_lowercase()),
        other => other,
    }
}

/// Normalizes every text cell outside the `exclude` columns.
///
/// Identifier columns such as ATC codes belong in `exclude`: they are kept
/// verbatim.
#[must_use]
pub fn normalize_text<S: AsRef<str>>(dataset: Dataset, exclude: &[S]) -> Dataset {
    let targets: Vec<usize> = dataset
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| !exclude.iter().any(|e| e.as_ref() == column.as_str()))
        .map(|(i, _)| i)
        .collect();

    tracing::debug!(columns = targets.len(), "normalizing text columns");
    targets
        .into_iter()
        .fold(dataset, |dataset, index| dataset.map_column(index, normalize_cell))
}
