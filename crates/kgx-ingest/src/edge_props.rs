//! Edge property resolution
//!
//! Turns the loosely-typed relationship attributes of one object-role row into
//! the relation, publications, affinity and provenance carried on an edge.

use kgx_common::{EdgeProperties, KgxError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::LoaderConfig;

/// Relation token used when the source supplies no usable predicate
pub const DEFAULT_RELATION: &str = "interacts_with";

/// Raw relationship attributes as they arrive from a source row
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEdgeAttributes {
    /// Free-text predicate, e.g. `"Part Of, Regulates"` or `"INHIBITOR"`
    #[serde(default)]
    pub predicate: Option<String>,

    /// Source attribution
    #[serde(default)]
    pub provenance: Option<String>,

    /// Pipe-delimited publication ids, e.g. `"123|456"`
    #[serde(default)]
    pub pubmed_ids: Option<String>,

    /// Affinity value as text; must parse as a float when present
    #[serde(default)]
    pub affinity: Option<String>,

    #[serde(default)]
    pub affinity_parameter: Option<String>,
}

/// Resolved values for one edge
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEdgeProps {
    pub relation: String,
    pub properties: EdgeProperties,
    pub provenance: Option<String>,
}

/// Derives relation, publications, affinity and provenance from raw attributes.
///
/// Pure: missing optional attributes fall back to defaults without logging.
#[derive(Debug, Clone)]
pub struct EdgePropertyResolver {
    relation_namespace: String,
    publication_prefix: String,
    separators: Regex,
}

impl EdgePropertyResolver {
    pub fn new(relation_namespace: impl Into<String>, publication_prefix: impl Into<String>) -> Result<Self> {
        let separators = Regex::new(r"[,\-\s]+")
            .map_err(|e| KgxError::config(format!("invalid predicate separator pattern: {}", e)))?;

        Ok(Self {
            relation_namespace: relation_namespace.into(),
            publication_prefix: publication_prefix.into(),
            separators,
        })
    }

    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        Self::new(&config.relation_namespace, &config.publication_prefix)
    }

    /// Resolve all edge values for one row
    pub fn resolve(&self, raw: &RawEdgeAttributes) -> Result<ResolvedEdgeProps> {
        let (affinity, affinity_parameter) = self.affinity(raw)?;

        Ok(ResolvedEdgeProps {
            relation: self.relation(raw.predicate.as_deref()),
            properties: EdgeProperties {
                publications: self.publications(raw.pubmed_ids.as_deref()),
                affinity,
                affinity_parameter,
            },
            provenance: Self::provenance(raw.provenance.as_deref()),
        })
    }

    /// Namespaced relation for a raw predicate
    pub fn relation(&self, predicate: Option<&str>) -> String {
        let token = match predicate.map(str::trim) {
            Some(pred) if pred.chars().count() > 1 => self.snakify(pred).to_lowercase(),
            _ => DEFAULT_RELATION.to_string(),
        };
        format!("{}:{}", self.relation_namespace, token)
    }

    /// Collapse every run of commas, dashes and whitespace into one underscore
    pub fn snakify(&self, text: &str) -> String {
        self.separators.replace_all(text.trim(), "_").into_owned()
    }

    /// Split a pipe-delimited publication list and prefix each entry
    pub fn publications(&self, pubmed_ids: Option<&str>) -> Vec<String> {
        pubmed_ids
            .map(|ids| {
                ids.split('|')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(|id| format!("{}:{}", self.publication_prefix, id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Normalize an already split publication list.
    ///
    /// Entries that carry the configured prefix pass through unchanged; bare
    /// ids get it prepended.
    pub fn prefixed_publications(&self, ids: Vec<String>) -> Vec<String> {
        let prefix = format!("{}:", self.publication_prefix);
        ids.into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .map(|id| if id.starts_with(&prefix) { id } else { format!("{}{}", prefix, id) })
            .collect()
    }

    fn affinity(&self, raw: &RawEdgeAttributes) -> Result<(f64, String)> {
        let value = match raw.affinity.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => return Ok((0.0, String::new())),
        };

        let affinity = value.parse::<f64>().map_err(|e| KgxError::InvalidAffinity {
            value: value.to_string(),
            reason: e.to_string(),
        })?;

        if !affinity.is_finite() {
            return Err(KgxError::InvalidAffinity {
                value: value.to_string(),
                reason: "value is not finite".to_string(),
            });
        }

        Ok((affinity, raw.affinity_parameter.clone().unwrap_or_default()))
    }

    fn provenance(raw: Option<&str>) -> Option<String> {
        raw.map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }
}
