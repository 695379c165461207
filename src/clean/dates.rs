//! Free-form date parsing.
//!
//! Accepts the shapes found in publication and trial exports: ISO
//! (`2020-01-01`, optionally followed by a time), numeric day-first
//! (`25/05/2020`, `02.01.19`), compact (`20200101`) and long form
//! (`1 January 2020`, `January 1st, 2020`, `Wed, 1 Jan 2020`). Ambiguous
//! numeric dates are read day first.

use chrono::NaiveDate;
use std::sync::LazyLock;

use crate::dataset::{Dataset, Value};
use crate::regex::Regex;

static ISO_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})",
        r"(?:[T ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$",
    ))
    .unwrap()
});

static TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?").unwrap());

static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]+|\d+|[^\sa-z\d]").unwrap());

const MONTHS: [(&str, u32); 24] = [
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

const WEEKDAYS: [&str; 14] = [
    "monday", "mon", "tuesday", "tue", "wednesday", "wed", "thursday", "thu", "friday", "fri",
    "saturday", "sat", "sunday", "sun",
];

/// Words that may sit next to a date without changing it.
const FILLERS: [&str; 8] = ["st", "nd", "rd", "th", "of", "am", "pm", "at"];

const SEPARATORS: [&str; 4] = ["/", "-", ".", ","];

/// A numeric token together with how many digits it was written with.
#[derive(Debug, Clone, Copy)]
struct Number {
    value: u32,
    digits: usize,
}

impl Number {
    /// A token that can only be a year.
    fn is_year(self) -> bool {
        self.digits >= 3 || self.value > 31
    }
}

/// Parses a free-form date string, day first on ambiguity.
///
/// Returns `None` for anything that is not a valid calendar date, including
/// out-of-range components such as `2020-01-34`.
///
/// # Examples
///
/// ```
/// use druglink::clean::dates::parse_date;
/// use chrono::NaiveDate;
///
/// assert_eq!(parse_date("02/01/2019"), NaiveDate::from_ymd_opt(2019, 1, 2));
/// assert_eq!(parse_date("1 January 2020"), NaiveDate::from_ymd_opt(2020, 1, 1));
/// assert_eq!(parse_date("invalid_date"), None);
/// ```
#[must_use]
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_REGEX.captures(input) {
        return NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }

    let lowered = input.to_lowercase();
    let without_time = TIME_REGEX.replace_all(&lowered, " ");

    let mut month = None;
    let mut numbers = Vec::new();
    for token in TOKEN_REGEX.find_iter(&without_time).map(|m| m.as_str()) {
        if token.chars().all(|c| c.is_ascii_digit()) {
            numbers.push(Number {
                value: token.parse().ok()?,
                digits: token.len(),
            });
        } else if let Some(&(_, m)) = MONTHS.iter().find(|(name, _)| *name == token) {
            if month.replace(m).is_some() {
                return None;
            }
        } else if !(WEEKDAYS.contains(&token)
            || FILLERS.contains(&token)
            || SEPARATORS.contains(&token))
        {
            return None;
        }
    }

    let (year, month, day) = match (month, numbers.as_slice()) {
        (None, [compact]) if compact.digits == 8 => {
            let v = compact.value;
            (v / 10_000, (v / 100) % 100, v % 100)
        }
        (None, [first, second, third]) => {
            if first.is_year() {
                (first.value, second.value, third.value)
            } else if second.value > 12 && first.value <= 12 {
                // No month can be > 12, so this must be month first
                (expand_year(*third), first.value, second.value)
            } else {
                (expand_year(*third), second.value, first.value)
            }
        }
        (Some(month), [first, second]) => {
            if first.is_year() {
                (first.value, month, second.value)
            } else {
                (expand_year(*second), month, first.value)
            }
        }
        _ => return None,
    };

    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

/// Two-digit years pivot at 69: `19` is 2019, `85` is 1985.
fn expand_year(year: Number) -> u32 {
    match (year.digits, year.value) {
        (1 | 2, v) if v < 69 => 2000 + v,
        (1 | 2, v) => 1900 + v,
        (_, v) => v,
    }
}

/// Parses one cell, falling back to `default` on failure.
///
/// A cell that already holds a date is kept, so normalizing twice is a no-op.
#[must_use]
pub fn normalize_cell(cell: Value, default: &Value) -> Value {
    match cell {
        Value::Date(_) => cell,
        Value::Text(ref s) => parse_date(s).map_or_else(|| default.clone(), Value::Date),
        _ => default.clone(),
    }
}

/// Replaces every cell of the `columns` with a canonical date or `default`.
///
/// Columns that the dataset does not have are skipped.
#[must_use]
pub fn normalize_dates<S: AsRef<str>>(
    dataset: Dataset,
    columns: &[S],
    default: &Value,
) -> Dataset {
    columns.iter().fold(dataset, |dataset, column| {
        let column = column.as_ref();
        match dataset.column_index(column) {
            Some(index) => {
                let mut failures = 0usize;
                let dataset = dataset.map_column(index, |cell| {
                    let normalized = normalize_cell(cell, default);
                    if !matches!(normalized, Value::Date(_)) {
                        failures += 1;
                    }
                    normalized
                });
                tracing::debug!(column, failures, "normalized date column");
                dataset
            }
            None => {
                tracing::debug!(column, "date column not present, skipping");
                dataset
            }
        }
    })
}
