//! Loader configuration

use kgx_common::{KgxError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a sink treats nodes that share an identifier.
///
/// The materializer always preserves multiplicity; only sinks consult this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeDedup {
    /// Keep every node occurrence, one per referencing group
    #[default]
    Preserve,
    /// Keep the first node seen for each identifier
    ById,
}

impl FromStr for NodeDedup {
    type Err = KgxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preserve" | "none" => Ok(NodeDedup::Preserve),
            "by_id" | "by-id" | "id" => Ok(NodeDedup::ById),
            _ => Err(KgxError::config(format!("Invalid node dedup policy: {}", s))),
        }
    }
}

/// Configuration for one loader run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Short source name, e.g. "PHAROS"
    pub source_id: String,

    /// Aggregator knowledge source stamped on every edge
    pub provenance_id: String,

    /// Namespace marker prefixed to derived relations
    pub relation_namespace: String,

    /// Namespace marker prefixed to publication ids
    pub publication_prefix: String,

    /// Rows per relationship group (one subject plus objects)
    pub expected_arity: usize,

    /// Materialize partitions on the rayon thread pool
    pub parallel: bool,

    /// Node deduplication policy applied by sinks
    pub node_dedup: NodeDedup,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source_id: "PHAROS".to_string(),
            provenance_id: "infores:pharos".to_string(),
            relation_namespace: "GAMMA".to_string(),
            publication_prefix: "PMID".to_string(),
            expected_arity: 2,
            parallel: false,
            node_dedup: NodeDedup::Preserve,
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Reads `KGX_SOURCE_ID`, `KGX_PROVENANCE_ID`, `KGX_RELATION_NAMESPACE`,
    /// `KGX_PUBLICATION_PREFIX`, `KGX_EXPECTED_ARITY`, `KGX_PARALLEL` and
    /// `KGX_NODE_DEDUP`; unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(source_id) = std::env::var("KGX_SOURCE_ID") {
            config.source_id = source_id;
        }
        if let Ok(provenance_id) = std::env::var("KGX_PROVENANCE_ID") {
            config.provenance_id = provenance_id;
        }
        if let Ok(namespace) = std::env::var("KGX_RELATION_NAMESPACE") {
            config.relation_namespace = namespace;
        }
        if let Ok(prefix) = std::env::var("KGX_PUBLICATION_PREFIX") {
            config.publication_prefix = prefix;
        }
        if let Ok(arity) = std::env::var("KGX_EXPECTED_ARITY") {
            config.expected_arity = arity
                .parse()
                .map_err(|_| KgxError::config(format!("KGX_EXPECTED_ARITY is not a number: {}", arity)))?;
        }
        if let Ok(parallel) = std::env::var("KGX_PARALLEL") {
            config.parallel = parse_flag("KGX_PARALLEL", &parallel)?;
        }
        if let Ok(dedup) = std::env::var("KGX_NODE_DEDUP") {
            config.node_dedup = dedup.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the materializer cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.expected_arity < 2 {
            return Err(KgxError::config(format!(
                "expected_arity must be at least 2 (one subject and one object), got {}",
                self.expected_arity
            )));
        }
        if self.provenance_id.trim().is_empty() {
            return Err(KgxError::config("provenance_id must not be empty"));
        }
        if self.relation_namespace.contains(':') {
            return Err(KgxError::config(format!(
                "relation_namespace must not contain ':': {}",
                self.relation_namespace
            )));
        }
        Ok(())
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    pub fn with_provenance_id(mut self, provenance_id: impl Into<String>) -> Self {
        self.provenance_id = provenance_id.into();
        self
    }

    pub fn with_expected_arity(mut self, arity: usize) -> Self {
        self.expected_arity = arity;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_node_dedup(mut self, node_dedup: NodeDedup) -> Self {
        self.node_dedup = node_dedup;
        self
    }
}

/// Parse a `true`/`false` environment flag
fn parse_flag(name: &str, value: &str) -> Result<bool> {
    value
        .trim()
        .parse()
        .map_err(|_| KgxError::config(format!("{} is not a boolean: {}", name, value)))
}
