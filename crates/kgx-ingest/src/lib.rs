//! KGX Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Turns source rows into knowledge-graph nodes and edges.
//!
//! # Flow
//!
//! A source adapter (e.g. [`pharos`]) reads rows and produces keyed
//! [`FlatRecord`](model::FlatRecord)s, applying the [`normalize`],
//! [`edge_props`] and [`group_key`] helpers per row. The
//! [`GraphMaterializer`](materializer::GraphMaterializer) groups those records
//! and builds the final collections, which a [`GraphSink`](sink::GraphSink)
//! consumes. [`pipeline`] wires the steps together and records run metadata.
//!
//! # Example
//!
//! ```no_run
//! use kgx_ingest::config::LoaderConfig;
//! use kgx_ingest::pipeline::{LoadPipeline, PharosInputs};
//!
//! fn main() -> anyhow::Result<()> {
//!     let pipeline = LoadPipeline::new(LoaderConfig::from_env()?)?;
//!     let output = pipeline.run_pharos(&PharosInputs {
//!         gene_to_disease: Some("./data/pharos/gene_to_disease.tsv".into()),
//!         ..Default::default()
//!     })?;
//!     println!("{} edges", output.graph.edges.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod edge_props;
pub mod group_key;
pub mod input;
pub mod materializer;
pub mod model;
pub mod normalize;
pub mod pharos;
pub mod pipeline;
pub mod sink;
