//! Flat contribution records
//!
//! A [`FlatRecord`] is one row of a relationship before graph assembly. It is a
//! tagged union by role, so a subject row can never carry edge attributes and
//! an object row always does. Loosely-typed input ([`RawFlatRecord`]) is
//! validated into this shape at the adapter boundary.

use kgx_common::{EdgeProperties, KgxError, Result};
use serde::{Deserialize, Serialize};

use crate::edge_props::{EdgePropertyResolver, RawEdgeAttributes};
use crate::group_key::GroupKey;

/// Role number of the subject contributor
pub const SUBJECT_ROLE: u32 = 1;

/// Entity columns shared by both roles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFields {
    /// Normalized identifier
    pub id: String,

    /// Raw display name; sanitized by the materializer
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub category: Vec<String>,

    #[serde(default)]
    pub equivalent_identifiers: Vec<String>,
}

impl EntityFields {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
            category: Vec::new(),
            equivalent_identifiers: Vec::new(),
        }
    }
}

/// Relationship columns, present only on object rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeFields {
    /// Biolink predicate, when the source has one
    #[serde(default)]
    pub predicate: Option<String>,

    /// Namespaced relation
    pub relation: String,

    /// Human-readable edge label, informational only
    #[serde(default)]
    pub edge_label: Option<String>,

    #[serde(default)]
    pub properties: EdgeProperties,

    #[serde(default)]
    pub provenance: Option<String>,
}

/// One contribution row of a relationship group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlatRecord {
    /// The role-1 row
    Subject { group_key: GroupKey, entity: EntityFields },

    /// A role-≥2 row carrying the edge towards the subject
    Object {
        group_key: GroupKey,
        role: u32,
        entity: EntityFields,
        edge: EdgeFields,
    },
}

impl FlatRecord {
    pub fn subject(group_key: GroupKey, entity: EntityFields) -> Self {
        FlatRecord::Subject { group_key, entity }
    }

    pub fn object(group_key: GroupKey, role: u32, entity: EntityFields, edge: EdgeFields) -> Self {
        FlatRecord::Object {
            group_key,
            role,
            entity,
            edge,
        }
    }

    pub fn group_key(&self) -> &GroupKey {
        match self {
            FlatRecord::Subject { group_key, .. } | FlatRecord::Object { group_key, .. } => group_key,
        }
    }

    pub fn entity(&self) -> &EntityFields {
        match self {
            FlatRecord::Subject { entity, .. } | FlatRecord::Object { entity, .. } => entity,
        }
    }

    pub fn is_subject(&self) -> bool {
        matches!(self, FlatRecord::Subject { .. })
    }
}

/// Result of turning one source row into flat records
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Rows ready for the materializer
    Emitted(Vec<FlatRecord>),

    /// A required field was absent; the row is dropped
    SkippedMissingField { field: &'static str },

    /// Both endpoints resolved to the same identifier; the row is dropped
    SuspiciousSameId { id: String },
}

/// Affinity as it appears in loosely-typed input: a JSON number or text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAffinity {
    Number(f64),
    Text(String),
}

impl RawAffinity {
    fn into_text(self) -> String {
        match self {
            RawAffinity::Number(n) => n.to_string(),
            RawAffinity::Text(s) => s,
        }
    }
}

/// Publication ids in loosely-typed input: a pipe-delimited string or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPublications {
    Delimited(String),
    List(Vec<String>),
}

impl RawPublications {
    fn resolve(self, resolver: &EdgePropertyResolver) -> Vec<String> {
        match self {
            RawPublications::Delimited(ids) => resolver.publications(Some(&ids)),
            RawPublications::List(ids) => resolver.prefixed_publications(ids),
        }
    }
}

/// A flat record in its loose wire form, one JSON object per line.
///
/// Every column is optional here; [`RawFlatRecord::validate`] decides whether
/// the row is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFlatRecord {
    #[serde(default)]
    pub group_key: Option<String>,
    #[serde(default)]
    pub role: Option<i64>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub equivalent_identifiers: Vec<String>,
    #[serde(default)]
    pub predicate: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub edge_label: Option<String>,
    #[serde(default)]
    pub pmids: Option<RawPublications>,
    #[serde(default)]
    pub affinity: Option<RawAffinity>,
    #[serde(default)]
    pub affinity_parameter: Option<String>,
    #[serde(default)]
    pub provenance: Option<String>,
}

impl RawFlatRecord {
    /// Validate into a typed record.
    ///
    /// Missing group key, id, or role yields `SkippedMissingField`. A role
    /// below 1 is treated as missing. Object rows without an explicit
    /// relation get one derived from `predicate` by the resolver; in that
    /// case the free-text predicate is not carried onto the edge. A `pmids`
    /// list is taken as already split and only bare ids get the publication
    /// prefix. Affinity coercion failures are returned as errors.
    pub fn validate(self, resolver: &EdgePropertyResolver) -> Result<RowOutcome> {
        let group_key = match non_empty(self.group_key) {
            Some(key) => GroupKey::from_raw(key),
            None => return Ok(RowOutcome::SkippedMissingField { field: "group_key" }),
        };

        let role = match self.role {
            Some(role) if role >= 1 => u32::try_from(role)
                .map_err(|_| KgxError::parse(format!("role out of range: {}", role)))?,
            _ => return Ok(RowOutcome::SkippedMissingField { field: "role" }),
        };

        let id = match non_empty(self.id) {
            Some(id) => id,
            None => return Ok(RowOutcome::SkippedMissingField { field: "id" }),
        };

        let entity = EntityFields {
            id,
            name: self.name,
            category: self.category,
            equivalent_identifiers: self.equivalent_identifiers,
        };

        if role == SUBJECT_ROLE {
            return Ok(RowOutcome::Emitted(vec![FlatRecord::subject(group_key, entity)]));
        }

        let raw_edge = RawEdgeAttributes {
            predicate: self.predicate.clone(),
            provenance: self.provenance,
            pubmed_ids: None,
            affinity: self.affinity.map(RawAffinity::into_text),
            affinity_parameter: self.affinity_parameter,
        };
        let mut resolved = resolver.resolve(&raw_edge)?;
        if let Some(pmids) = self.pmids {
            resolved.properties.publications = pmids.resolve(resolver);
        }

        let (predicate, relation) = match non_empty(self.relation) {
            Some(relation) => (non_empty(self.predicate), relation),
            None => (None, resolved.relation),
        };

        let edge = EdgeFields {
            predicate,
            relation,
            edge_label: non_empty(self.edge_label),
            properties: resolved.properties,
            provenance: resolved.provenance,
        };

        Ok(RowOutcome::Emitted(vec![FlatRecord::object(group_key, role, entity, edge)]))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
