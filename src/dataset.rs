//! In-memory tabular model shared by every stage.
//!
//! A [`Dataset`] is a fixed list of column names plus rows of [`Value`]s, one
//! value per column. Cleaning stages take a dataset by value and hand back a new
//! one, so no two stages ever share a table.

use chrono::NaiveDate;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{DrugLinkError, Result};

/// One row of a [`Dataset`], positioned by the dataset's columns.
pub type Row = Vec<Value>;

/// A single scalar cell.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// A missing value
    #[default]
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    /// A calendar date without time of day
    Date(NaiveDate),
}

impl Value {
    /// Whether the cell holds no value.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Reads the cell as a calendar date.
    ///
    /// Dates come back as is; text is accepted only in the canonical
    /// `YYYY-MM-DD` form (e.g. a textual fallback written by the date
    /// normalizer). Anything else is `None`.
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            // Bitwise so that Eq and Hash agree
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Date(d) => d.hash(state),
        }
    }
}

impl fmt::Display for Value {
    /// Renders the cell the way it is persisted: dates as `YYYY-MM-DD`,
    /// missing values as an empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A borrowed view of one row, addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }
}

/// An ordered table of rows sharing one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Creates an empty dataset with the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Creates a dataset from columns and rows.
    ///
    /// # Errors
    ///
    /// Returns `DrugLinkError::InvalidFormat` if a row does not have exactly
    /// one value per column.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Row>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dataset = Self::new(columns);
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns `DrugLinkError::InvalidFormat` on a width mismatch.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DrugLinkError::InvalidFormat(format!(
                "Row has {} values but the dataset has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Like [`Dataset::column_index`], but a missing column is an error.
    ///
    /// # Errors
    ///
    /// Returns `DrugLinkError::MissingColumn`.
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| DrugLinkError::MissingColumn(column.to_string()))
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|values| Record {
            columns: &self.columns,
            values,
        })
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Rewrites every cell of one column.
    #[must_use]
    pub fn map_column<F>(mut self, index: usize, mut f: F) -> Self
    where
        F: FnMut(Value) -> Value,
    {
        for row in &mut self.rows {
            let cell = std::mem::take(&mut row[index]);
            row[index] = f(cell);
        }
        self
    }

    /// Stacks `other` under `self`.
    ///
    /// Columns are the union of both schemas in first-seen order; cells that a
    /// side does not have are filled with [`Value::Null`].
    #[must_use]
    pub fn concat(self, other: Dataset) -> Dataset {
        let left_width = self.columns.len();
        let mut columns = self.columns;
        for column in &other.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }

        let widen = |source_columns: &[String], rows: Vec<Row>| -> Vec<Row> {
            let positions: Vec<Option<usize>> = columns
                .iter()
                .map(|c| source_columns.iter().position(|s| s == c))
                .collect();
            rows.into_iter()
                .map(|mut row| {
                    positions
                        .iter()
                        .map(|p| p.map_or(Value::Null, |i| std::mem::take(&mut row[i])))
                        .collect()
                })
                .collect()
        };

        // The union starts with our own columns, so they are its prefix
        let mut rows = widen(&columns[..left_width], self.rows);
        rows.extend(widen(&other.columns, other.rows));

        Dataset { columns, rows }
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Row>) {
        (self.columns, self.rows)
    }

    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }
}
