use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use druglink::json::load_graph;
use druglink::pipeline::{self, PipelineConfig};
use druglink::queries::{find_related_drugs, journal_with_most_drugs};

#[derive(Debug, Parser)]
#[command(
    name = "druglink",
    disable_help_subcommand = true,
    about = "Clean drug, publication and trial tables and build the drug mention graph",
    after_help = "Log verbosity follows RUST_LOG, e.g. RUST_LOG=druglink=debug."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Clean every source and write the cleaned tables and the mention graph
    Run {
        #[arg(
            long,
            value_name = "PATH",
            default_value = "data",
            help = "Directory holding the source files"
        )]
        data_dir: PathBuf,
        #[arg(
            long,
            value_name = "PATH",
            default_value = "output",
            help = "Directory receiving cleaned tables and result.json"
        )]
        output_dir: PathBuf,
        #[arg(long, help = "Scan drugs on all cores")]
        parallel: bool,
    },
    /// Print the journal mentioning the most distinct drugs
    TopJournal {
        #[arg(long, value_name = "PATH", default_value = "output/result.json")]
        graph: PathBuf,
    },
    /// Print the drugs sharing at least one journal with DRUG
    Related {
        drug: String,
        #[arg(long, value_name = "PATH", default_value = "output/result.json")]
        graph: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("druglink=info")),
        )
        .init();

    match Cli::parse().command {
        Command::Run {
            data_dir,
            output_dir,
            parallel,
        } => {
            let mut config = PipelineConfig::new();
            config
                .set_data_dir(data_dir)
                .set_output_dir(output_dir)
                .set_run_in_parallel(parallel);

            let graph = pipeline::run(&config).context("pipeline failed")?;
            println!(
                "Graph of {} drugs written to {}",
                graph.len(),
                config.graph_path().display()
            );
        }
        Command::TopJournal { graph } => {
            let graph = load_graph(&graph)
                .with_context(|| format!("could not read graph {}", graph.display()))?;
            match journal_with_most_drugs(&graph) {
                Some((journal, count)) => println!(
                    "The journal mentioning the most drugs is '{journal}' with {count} drugs."
                ),
                None => println!("No journal mentions any drug."),
            }
        }
        Command::Related { drug, graph } => {
            let graph = load_graph(&graph)
                .with_context(|| format!("could not read graph {}", graph.display()))?;
            let related = find_related_drugs(&graph, &drug);
            if related.is_empty() {
                println!("No other drug is mentioned by the same journals as '{drug}'.");
            } else {
                println!("Drugs sharing a journal with '{drug}': {}", related.join(", "));
            }
        }
    }
    Ok(())
}
