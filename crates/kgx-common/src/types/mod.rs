//! Canonical graph records shared by every loader and sink

use serde::{Deserialize, Serialize};

/// Checksum algorithm type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
            ChecksumAlgorithm::Sha512 => write!(f, "sha512"),
        }
    }
}

// ============================================================================
// Graph Types
// ============================================================================

/// A graph entity in KGX exchange form.
///
/// Identity is the `id`, which is always a normalized CURIE such as
/// `UMLS:C009` or `HGNC:777`. The `name` has already been sanitized to 7-bit
/// ASCII by the time a node is constructed.
///
/// # Examples
///
/// ```rust
/// use kgx_common::types::Node;
///
/// let node = Node::new("HGNC:777", "BRCA1");
/// assert_eq!(node.id, "HGNC:777");
/// assert!(node.category.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Canonical identifier (CURIE)
    pub id: String,

    /// Sanitized display name
    pub name: String,

    /// Category labels, empty when the source does not supply any
    #[serde(default)]
    pub category: Vec<String>,

    /// Alternate identifiers for the same entity
    #[serde(default)]
    pub equivalent_identifiers: Vec<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: Vec::new(),
            equivalent_identifiers: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: Vec<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_equivalent_identifiers(mut self, ids: Vec<String>) -> Self {
        self.equivalent_identifiers = ids;
        self
    }
}

/// Properties carried on every edge
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeProperties {
    /// Publication references, e.g. `PMID:12345`
    #[serde(default)]
    pub publications: Vec<String>,

    /// Binding or activity strength, `0.0` when unknown
    #[serde(default)]
    pub affinity: f64,

    /// Label describing the affinity measure (e.g. `IC50`), empty when unknown
    #[serde(default)]
    pub affinity_parameter: String,
}

/// A directed relationship between two nodes.
///
/// # Examples
///
/// ```rust
/// use kgx_common::types::{Edge, EdgeProperties};
///
/// let edge = Edge {
///     subject_id: "HGNC:777".to_string(),
///     object_id: "UMLS:C009".to_string(),
///     predicate: None,
///     relation: "GAMMA:interacts_with".to_string(),
///     properties: EdgeProperties::default(),
///     primary_knowledge_source: Some("CTD".to_string()),
///     aggregator_knowledge_sources: vec!["infores:pharos".to_string()],
/// };
/// assert_eq!(edge.properties.affinity, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub subject_id: String,
    pub object_id: String,

    /// Biolink predicate when the source supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,

    /// Namespaced relation, e.g. `GAMMA:inhibitor` or `WD:P2293`
    pub relation: String,

    pub properties: EdgeProperties,

    /// Original source attribution; absent when the source row carried none
    #[serde(default)]
    pub primary_knowledge_source: Option<String>,

    /// The loader's own provenance identifier
    #[serde(default)]
    pub aggregator_knowledge_sources: Vec<String>,
}

impl Edge {
    /// Whether the edge starts and ends at the same identifier
    pub fn is_self_loop(&self) -> bool {
        self.subject_id == self.object_id
    }
}
