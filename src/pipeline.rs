//! End-to-end run over a data directory.
//!
//! Loads the drug, publication (CSV + JSON) and clinical trial sources, cleans
//! each one, writes the cleaned tables, builds the mention graph and writes it
//! as JSON.
//!
//! Default layout:
//!
//! | input                        | output                              |
//! |------------------------------|-------------------------------------|
//! | `data/drugs.csv`             | `output/drugs_cleaned.csv`          |
//! | `data/pubmed.csv`            | `output/pubmed_cleaned.csv`         |
//! | `data/pubmed.json`           |                                     |
//! | `data/clinical_trials.csv`   | `output/clinical_trials_cleaned.csv`|
//! |                              | `output/result.json`                |

use std::path::{Path, PathBuf};

use crate::clean::{CleaningConfig, CleaningPipeline};
use crate::graph::{GraphConfig, MentionGraph, MentionGraphBuilder};
use crate::output::{write_dataset, write_graph};
use crate::{CsvLoader, DatasetParser, JsonLoader, Result};

pub const DRUGS_FILE: &str = "drugs.csv";
pub const PUBMED_CSV_FILE: &str = "pubmed.csv";
pub const PUBMED_JSON_FILE: &str = "pubmed.json";
pub const CLINICAL_TRIALS_FILE: &str = "clinical_trials.csv";
pub const GRAPH_FILE: &str = "result.json";

/// Where to read sources, where to write results, and how to clean each source.
///
/// # Examples
///
/// ```
/// use druglink::pipeline::PipelineConfig;
///
/// let mut config = PipelineConfig::new();
/// config.set_data_dir("fixtures").set_output_dir("/tmp/druglink");
/// assert_eq!(config.graph_path(), std::path::Path::new("/tmp/druglink/result.json"));
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    data_dir: PathBuf,
    output_dir: PathBuf,
    /// Cleaning options for the drug table
    pub drugs: CleaningConfig,
    /// Cleaning options for the merged publication table
    pub publications: CleaningConfig,
    /// Cleaning options for the clinical trial table
    pub trials: CleaningConfig,
    pub graph: GraphConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Creates the default configuration: `data/` in, `output/` out.
    #[must_use]
    pub fn new() -> Self {
        let mut drugs = CleaningConfig::new();
        drugs.set_exclude_columns(["atccode"]);

        let mut publications = CleaningConfig::new();
        publications
            .set_date_columns(["date"])
            .set_exclude_columns(["id"])
            .set_unique_subset(["title", "date"]);

        let mut trials = CleaningConfig::new();
        trials
            .set_date_columns(["date"])
            .set_exclude_columns(["id"])
            .set_unique_subset(["scientific_title", "date"]);

        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            drugs,
            publications,
            trials,
            graph: GraphConfig::default(),
        }
    }

    pub fn set_data_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.data_dir = dir.into();
        self
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.output_dir = dir.into();
        self
    }

    pub fn set_run_in_parallel(&mut self, run_in_parallel: bool) -> &mut Self {
        self.graph.set_run_in_parallel(run_in_parallel);
        self
    }

    #[must_use]
    pub fn graph_path(&self) -> PathBuf {
        self.output_dir.join(GRAPH_FILE)
    }

    fn input(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    fn cleaned(&self, file: &str) -> PathBuf {
        let stem = Path::new(file)
            .file_stem()
            .map_or_else(|| file.into(), |s| s.to_string_lossy());
        self.output_dir.join(format!("{stem}_cleaned.csv"))
    }
}

/// Runs the whole pipeline and returns the graph it wrote.
///
/// # Errors
///
/// Fails fast with `DrugLinkError::MissingSource` if any input file is absent,
/// before anything is written. Write failures abort with
/// `DrugLinkError::Persistence`.
pub fn run(config: &PipelineConfig) -> Result<MentionGraph> {
    let csv = CsvLoader::new();
    let json = JsonLoader::new();

    let drugs = csv.load(&config.input(DRUGS_FILE))?;
    let pubmed_csv = csv.load(&config.input(PUBMED_CSV_FILE))?;
    let pubmed_json = json.load(&config.input(PUBMED_JSON_FILE))?;
    let trials = csv.load(&config.input(CLINICAL_TRIALS_FILE))?;
    tracing::info!(
        drugs = drugs.len(),
        pubmed_csv = pubmed_csv.len(),
        pubmed_json = pubmed_json.len(),
        trials = trials.len(),
        "loaded sources"
    );

    let drugs = CleaningPipeline::new(config.drugs.clone()).clean(drugs)?;
    let publications =
        CleaningPipeline::new(config.publications.clone()).clean(pubmed_csv.concat(pubmed_json))?;
    let trials = CleaningPipeline::new(config.trials.clone()).clean(trials)?;

    write_dataset(&drugs, &config.cleaned(DRUGS_FILE))?;
    write_dataset(&publications, &config.cleaned(PUBMED_CSV_FILE))?;
    write_dataset(&trials, &config.cleaned(CLINICAL_TRIALS_FILE))?;

    let graph = MentionGraphBuilder::new()
        .with_config(config.graph.clone())
        .build(&drugs, &publications, &trials)?;
    write_graph(&graph, &config.graph_path())?;

    Ok(graph)
}
