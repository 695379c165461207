//! Persistence of cleaned datasets and of the mention graph.
//!
//! Parent directories are created on demand. Every failure is reported as
//! `DrugLinkError::Persistence` carrying the target path and the I/O cause.

use csv::WriterBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::dataset::Dataset;
use crate::graph::MentionGraph;
use crate::{DrugLinkError, Result};

fn persistence(path: &Path) -> impl FnOnce(std::io::Error) -> DrugLinkError + '_ {
    move |source| DrugLinkError::Persistence {
        path: path.to_path_buf(),
        source,
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(persistence(path))?;
    }
    let file = File::create(path).map_err(persistence(path))?;
    Ok(BufWriter::new(file))
}

/// Writes `dataset` as CSV with a header row.
///
/// Dates are written as `YYYY-MM-DD` and missing values as empty fields.
pub fn write_dataset(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(create(path)?);

    writer
        .write_record(dataset.columns())
        .map_err(|e| persistence(path)(e.into()))?;
    for row in dataset.rows() {
        writer
            .write_record(row.iter().map(ToString::to_string))
            .map_err(|e| persistence(path)(e.into()))?;
    }
    writer.flush().map_err(persistence(path))?;

    tracing::info!(path = %path.display(), rows = dataset.len(), "wrote cleaned dataset");
    Ok(())
}

/// Writes `graph` as pretty-printed UTF-8 JSON.
pub fn write_graph(graph: &MentionGraph, path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, graph).map_err(|e| persistence(path)(e.into()))?;
    writer.write_all(b"\n").map_err(persistence(path))?;
    writer.flush().map_err(persistence(path))?;

    tracing::info!(path = %path.display(), drugs = graph.len(), "wrote mention graph");
    Ok(())
}
