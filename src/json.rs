//! JSON source loader and graph reader.
//!
//! Tables arrive as a JSON array of flat objects. Columns are the union of the
//! objects' keys in first-seen order; a key an object lacks is read as
//! [`Value::Null`].

use indexmap::IndexSet;
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::dataset::{Dataset, Row, Value};
use crate::graph::MentionGraph;
use crate::{DatasetParser, DrugLinkError, Result};

/// Loader for JSON-array tables.
///
/// # Examples
///
/// ```
/// use druglink::{DatasetParser, JsonLoader, Value};
///
/// let input = r#"[
///     {"id": 9, "title": "Gold nanoparticles", "date": "01/01/2020", "journal": "Journal of food protection"}
/// ]"#;
/// let dataset = JsonLoader::new().parse(input).unwrap();
/// assert_eq!(dataset.rows()[0][0], Value::Integer(9));
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonLoader {}

impl JsonLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn convert(value: &JsonValue) -> Value {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            JsonValue::Bool(b) => Value::Text(b.to_string()),
            nested => Value::Text(nested.to_string()),
        }
    }
}

impl DatasetParser for JsonLoader {
    fn parse(&self, input: &str) -> Result<Dataset> {
        let parsed: JsonValue = serde_json::from_str(input)?;
        let JsonValue::Array(items) = parsed else {
            return Err(DrugLinkError::InvalidFormat(
                "Expected a JSON array of objects".to_string(),
            ));
        };

        let objects = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_object().ok_or_else(|| {
                    DrugLinkError::InvalidFormat(format!("Array element {i} is not an object"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let columns: IndexSet<&str> = objects
            .iter()
            .flat_map(|object| object.keys().map(String::as_str))
            .collect();

        let rows: Vec<Row> = objects
            .iter()
            .map(|object| {
                columns
                    .iter()
                    .map(|column| object.get(*column).map_or(Value::Null, Self::convert))
                    .collect()
            })
            .collect();

        Dataset::from_rows(columns, rows)
    }
}

/// Reads a mention graph previously written by [`crate::output::write_graph`].
///
/// # Errors
///
/// Returns `DrugLinkError::MissingSource` when the file does not exist and
/// `DrugLinkError::InvalidFormat` when it does not hold a graph.
pub fn load_graph(path: &Path) -> Result<MentionGraph> {
    if !path.exists() {
        return Err(DrugLinkError::MissingSource {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path)?;
    let graph = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(graph)
}
