// Load pipeline
//
// Orchestrates one loader run:
// 1. Fingerprint the input files
// 2. Read rows and turn them into flat records (PHAROS exports or JSON lines)
// 3. Materialize nodes and edges
// 4. Assemble run metadata

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use kgx_common::checksum::compute_file_checksum;
use kgx_common::types::ChecksumAlgorithm;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::LoaderConfig;
use crate::edge_props::EdgePropertyResolver;
use crate::input::{read_flat_records, read_tsv};
use crate::materializer::{GraphMaterializer, MaterializeStats, MaterializedGraph};
use crate::model::{FlatRecord, RowOutcome};
use crate::pharos::{ActivityRow, GeneDiseaseRow, PharosAdapter, PharosDataset};

/// Export files for a PHAROS run; any subset may be given
#[derive(Debug, Clone, Default)]
pub struct PharosInputs {
    pub gene_to_disease: Option<PathBuf>,
    pub gene_to_drug_activity: Option<PathBuf>,
    pub gene_to_compound_activity: Option<PathBuf>,
}

impl PharosInputs {
    fn datasets(&self) -> Vec<(PharosDataset, &Path)> {
        [
            (PharosDataset::GeneToDisease, &self.gene_to_disease),
            (PharosDataset::GeneToDrugActivity, &self.gene_to_drug_activity),
            (PharosDataset::GeneToCompoundActivity, &self.gene_to_compound_activity),
        ]
        .into_iter()
        .filter_map(|(dataset, path)| path.as_deref().map(|p| (dataset, p)))
        .collect()
    }
}

/// Per-input row counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTally {
    pub rows: usize,
    pub emitted: usize,
    pub skipped_missing_field: usize,
    pub suspicious_same_id: usize,
}

impl RowTally {
    /// Count one row outcome, returning the records it produced
    pub fn record(&mut self, source: &str, line: usize, outcome: RowOutcome) -> Vec<FlatRecord> {
        self.rows += 1;
        match outcome {
            RowOutcome::Emitted(records) => {
                self.emitted += 1;
                records
            },
            RowOutcome::SkippedMissingField { field } => {
                debug!(source, line, field, "Skipping row with missing field");
                self.skipped_missing_field += 1;
                Vec::new()
            },
            RowOutcome::SuspiciousSameId { id } => {
                error!(source, line, id = %id, "Relationship endpoints resolve to the same identifier");
                self.suspicious_same_id += 1;
                Vec::new()
            },
        }
    }

    fn add(&mut self, other: &RowTally) {
        self.rows += other.rows;
        self.emitted += other.emitted;
        self.skipped_missing_field += other.skipped_missing_field;
        self.suspicious_same_id += other.suspicious_same_id;
    }
}

/// Metadata describing one completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadMetadata {
    pub run_id: Uuid,
    pub source_id: String,
    pub provenance_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: f64,

    /// SHA-256 of each input file, keyed by path
    pub input_checksums: BTreeMap<String, String>,

    /// Rows read from all inputs
    pub num_source_lines: usize,

    /// Rows dropped for a missing required field
    pub unusable_source_lines: usize,

    /// Rows dropped because both endpoints were the same entity
    pub suspicious_source_lines: usize,

    /// Row counters per input
    pub inputs: BTreeMap<String, RowTally>,

    pub materialize: MaterializeStats,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Everything a run hands to a sink
#[derive(Debug, Clone)]
pub struct LoadOutput {
    pub graph: MaterializedGraph,
    pub metadata: LoadMetadata,
}

pub struct LoadPipeline {
    config: LoaderConfig,
}

impl LoadPipeline {
    pub fn new(config: LoaderConfig) -> Result<Self> {
        config.validate().context("Invalid loader configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load PHAROS exports
    pub fn run_pharos(&self, inputs: &PharosInputs) -> Result<LoadOutput> {
        let run = RunState::start();
        let datasets = inputs.datasets();

        info!(
            "Starting {} load ({} datasets, run {})",
            self.config.source_id,
            datasets.len(),
            run.run_id
        );

        let mut adapter = PharosAdapter::new(&self.config).context("Failed to build PHAROS adapter")?;
        let mut records = Vec::new();
        let mut tallies = BTreeMap::new();
        let mut checksums = BTreeMap::new();

        for (dataset, path) in datasets {
            checksums.insert(path.display().to_string(), checksum(path)?);

            let tally = match dataset {
                PharosDataset::GeneToDisease => {
                    let rows: Vec<GeneDiseaseRow> = read_tsv(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    convert_rows(dataset.as_str(), rows, &mut records, |row| adapter.gene_to_disease(&row))?
                },
                PharosDataset::GeneToDrugActivity => {
                    let rows: Vec<ActivityRow> = read_tsv(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    convert_rows(dataset.as_str(), rows, &mut records, |row| adapter.gene_to_drug_activity(&row))?
                },
                PharosDataset::GeneToCompoundActivity => {
                    let rows: Vec<ActivityRow> = read_tsv(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    convert_rows(dataset.as_str(), rows, &mut records, |row| {
                        adapter.gene_to_compound_activity(&row)
                    })?
                },
            };

            info!(
                "{}: {} rows, {} emitted, {} skipped, {} suspicious",
                dataset,
                tally.rows,
                tally.emitted,
                tally.skipped_missing_field,
                tally.suspicious_same_id
            );
            tallies.insert(dataset.as_str().to_string(), tally);
        }

        self.finish(run, records, tallies, checksums)
    }

    /// Load JSON-lines files of pre-keyed flat records
    pub fn run_flat_records(&self, paths: &[PathBuf]) -> Result<LoadOutput> {
        let run = RunState::start();

        info!(
            "Starting {} load ({} record files, run {})",
            self.config.source_id,
            paths.len(),
            run.run_id
        );

        let resolver = EdgePropertyResolver::from_config(&self.config)?;
        let mut records = Vec::new();
        let mut tallies = BTreeMap::new();
        let mut checksums = BTreeMap::new();

        for path in paths {
            let name = path.display().to_string();
            checksums.insert(name.clone(), checksum(path)?);

            let rows = read_flat_records(path).with_context(|| format!("Failed to read {}", name))?;
            let tally = convert_rows(&name, rows, &mut records, |row| row.validate(&resolver))?;

            info!(
                "{}: {} rows, {} emitted, {} skipped",
                name, tally.rows, tally.emitted, tally.skipped_missing_field
            );
            tallies.insert(name, tally);
        }

        self.finish(run, records, tallies, checksums)
    }

    /// Materialize already-validated records without reading any input
    pub fn run_records(&self, records: Vec<FlatRecord>) -> Result<LoadOutput> {
        let run = RunState::start();
        self.finish(run, records, BTreeMap::new(), BTreeMap::new())
    }

    fn finish(
        &self,
        run: RunState,
        records: Vec<FlatRecord>,
        inputs: BTreeMap<String, RowTally>,
        input_checksums: BTreeMap<String, String>,
    ) -> Result<LoadOutput> {
        let materializer = GraphMaterializer::new(&self.config).context("Failed to build materializer")?;
        let graph = materializer.materialize(records);

        let mut totals = RowTally::default();
        for tally in inputs.values() {
            totals.add(tally);
        }

        let duration = run.clock.elapsed();
        let metadata = LoadMetadata {
            run_id: run.run_id,
            source_id: self.config.source_id.clone(),
            provenance_id: self.config.provenance_id.clone(),
            started_at: run.started_at,
            finished_at: Utc::now(),
            duration_seconds: duration.as_secs_f64(),
            input_checksums,
            num_source_lines: totals.rows,
            unusable_source_lines: totals.skipped_missing_field,
            suspicious_source_lines: totals.suspicious_same_id,
            inputs,
            materialize: graph.stats.clone(),
            node_count: graph.nodes.len(),
            edge_count: graph.edges.len(),
        };

        info!(
            "Load complete for {}: {} source lines, {} unusable, {} nodes, {} edges in {:.2}s",
            metadata.source_id,
            metadata.num_source_lines,
            metadata.unusable_source_lines,
            metadata.node_count,
            metadata.edge_count,
            metadata.duration_seconds
        );

        Ok(LoadOutput { graph, metadata })
    }
}

struct RunState {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    clock: Instant,
}

impl RunState {
    fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            clock: Instant::now(),
        }
    }
}

fn convert_rows<T, F>(
    source: &str,
    rows: Vec<T>,
    records: &mut Vec<FlatRecord>,
    mut convert: F,
) -> Result<RowTally>
where
    F: FnMut(T) -> kgx_common::Result<RowOutcome>,
{
    let mut tally = RowTally::default();
    for (index, row) in rows.into_iter().enumerate() {
        let line = index + 1;
        let outcome = convert(row).with_context(|| format!("{}: row {} aborted the load", source, line))?;
        records.extend(tally.record(source, line, outcome));
    }
    Ok(tally)
}

fn checksum(path: &Path) -> Result<String> {
    compute_file_checksum(path, ChecksumAlgorithm::Sha256)
        .with_context(|| format!("Failed to checksum {}", path.display()))
}

/// Write run metadata as pretty-printed JSON
pub fn write_metadata(metadata: &LoadMetadata, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata).context("Failed to serialize load metadata")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote load metadata to {}", path.display());
    Ok(())
}
