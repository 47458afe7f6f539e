//! KGX Ingest - knowledge graph loader

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kgx_common::logging::{init_logging, LogConfig, LogLevel};
use kgx_ingest::config::{LoaderConfig, NodeDedup};
use kgx_ingest::pipeline::{write_metadata, LoadOutput, LoadPipeline, PharosInputs};
use kgx_ingest::sink::{CollectingSink, GraphSink};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "kgx-ingest")]
#[command(author, version, about = "Knowledge graph loader")]
struct Cli {
    /// Source to load
    #[command(subcommand)]
    source: Source,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Materialize groups in parallel
    #[arg(long, global = true)]
    parallel: bool,

    /// Aggregator knowledge source stamped on every edge
    #[arg(long, global = true, env = "KGX_PROVENANCE_ID")]
    provenance_id: Option<String>,

    /// Keep only the first node per identifier
    #[arg(long, global = true)]
    dedup_nodes: bool,

    /// Write run metadata as JSON to this path
    #[arg(long, global = true)]
    metadata_out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Source {
    /// Load PHAROS target exports
    Pharos {
        /// Gene to disease export (TSV, optionally gzipped)
        #[arg(long)]
        gene_disease: Option<PathBuf>,

        /// Gene to drug activity export
        #[arg(long)]
        drug_activity: Option<PathBuf>,

        /// Gene to compound activity export
        #[arg(long)]
        compound_activity: Option<PathBuf>,
    },

    /// Load pre-keyed flat records from JSON-lines files
    Records {
        /// Input files
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("kgx-ingest")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let mut config = LoaderConfig::from_env()?;
    if cli.parallel {
        config = config.with_parallel(true);
    }
    if let Some(provenance_id) = cli.provenance_id {
        config = config.with_provenance_id(provenance_id);
    }
    if cli.dedup_nodes {
        config = config.with_node_dedup(NodeDedup::ById);
    }

    let pipeline = LoadPipeline::new(config)?;

    let output = match cli.source {
        Source::Pharos {
            gene_disease,
            drug_activity,
            compound_activity,
        } => {
            info!("Loading PHAROS exports");
            pipeline.run_pharos(&PharosInputs {
                gene_to_disease: gene_disease,
                gene_to_drug_activity: drug_activity,
                gene_to_compound_activity: compound_activity,
            })?
        },
        Source::Records { input } => {
            info!("Loading flat records");
            pipeline.run_flat_records(&input)?
        },
    };

    let LoadOutput { graph, metadata } = output;
    let mut sink = CollectingSink::new(pipeline.config().node_dedup);
    sink.write_graph(graph)?;

    info!(
        "Collected {} nodes ({} duplicates dropped) and {} edges",
        sink.nodes().len(),
        sink.duplicate_nodes(),
        sink.edges().len()
    );

    if let Some(path) = cli.metadata_out {
        write_metadata(&metadata, &path)?;
    }

    info!("Load complete");
    Ok(())
}
