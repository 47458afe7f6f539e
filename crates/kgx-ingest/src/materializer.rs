//! Graph materialization
//!
//! Partitions flat records by group key, validates each group's cardinality,
//! and builds canonical [`Node`]s and [`Edge`]s. Groups are independent, so the
//! per-group step may run on the rayon pool; outcomes are always folded back
//! in group-key order, which makes sequential and parallel runs identical.
//!
//! Node multiplicity is preserved: an identifier referenced by several groups
//! appears once per group. Deduplication is a sink decision
//! (see [`NodeDedup`](crate::config::NodeDedup)).

use std::collections::BTreeMap;

use kgx_common::{Edge, Node, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::LoaderConfig;
use crate::group_key::GroupKey;
use crate::model::{EdgeFields, EntityFields, FlatRecord};
use crate::normalize::IdentifierNormalizer;

/// Replace every character at or above U+0080 with `?`.
///
/// Works per `char`, so the character count is unchanged.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if (c as u32) < 128 { c } else { '?' })
        .collect()
}

/// Outcome of materializing one partition
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    Emitted {
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        self_loops: usize,
    },
    SkippedCardinality {
        size: usize,
        subjects: usize,
    },
    SkippedMissingField {
        field: &'static str,
    },
}

/// Counters reported with every materialized graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeStats {
    pub records_processed: usize,
    pub groups_total: usize,
    pub groups_emitted: usize,
    pub groups_skipped_cardinality: usize,
    pub groups_skipped_missing_field: usize,
    pub self_loops: usize,
}

impl MaterializeStats {
    fn record(&mut self, outcome: &GroupOutcome) {
        self.groups_total += 1;
        match outcome {
            GroupOutcome::Emitted { self_loops, .. } => {
                self.groups_emitted += 1;
                self.self_loops += self_loops;
            },
            GroupOutcome::SkippedCardinality { .. } => self.groups_skipped_cardinality += 1,
            GroupOutcome::SkippedMissingField { .. } => self.groups_skipped_missing_field += 1,
        }
    }
}

/// Final collections of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializedGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub stats: MaterializeStats,
}

/// Builds nodes and edges from grouped flat records
#[derive(Debug, Clone)]
pub struct GraphMaterializer {
    normalizer: IdentifierNormalizer,
    provenance_id: String,
    expected_arity: usize,
    parallel: bool,
}

impl GraphMaterializer {
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            normalizer: IdentifierNormalizer::new()?,
            provenance_id: config.provenance_id.clone(),
            expected_arity: config.expected_arity,
            parallel: config.parallel,
        })
    }

    /// Materialize one run's records into nodes and edges
    pub fn materialize(&self, records: Vec<FlatRecord>) -> MaterializedGraph {
        let records_processed = records.len();
        let partitions: Vec<(GroupKey, Vec<FlatRecord>)> = partition(records).into_iter().collect();

        debug!(
            records = records_processed,
            groups = partitions.len(),
            parallel = self.parallel,
            "Partitioned flat records"
        );

        let outcomes: Vec<(GroupKey, GroupOutcome)> = if self.parallel {
            partitions
                .into_par_iter()
                .map(|(key, rows)| {
                    let outcome = self.materialize_group(&key, rows);
                    (key, outcome)
                })
                .collect()
        } else {
            partitions
                .into_iter()
                .map(|(key, rows)| {
                    let outcome = self.materialize_group(&key, rows);
                    (key, outcome)
                })
                .collect()
        };

        let mut graph = MaterializedGraph {
            stats: MaterializeStats {
                records_processed,
                ..Default::default()
            },
            ..Default::default()
        };

        for (key, outcome) in outcomes {
            graph.stats.record(&outcome);
            match outcome {
                GroupOutcome::Emitted { nodes, edges, .. } => {
                    graph.nodes.extend(nodes);
                    graph.edges.extend(edges);
                },
                GroupOutcome::SkippedCardinality { size, subjects } => {
                    debug!(
                        group_key = %key,
                        size,
                        subjects,
                        expected = self.expected_arity,
                        "Skipping group with unexpected cardinality"
                    );
                },
                GroupOutcome::SkippedMissingField { field } => {
                    debug!(group_key = %key, field, "Skipping group with missing field");
                },
            }
        }

        info!(
            records = graph.stats.records_processed,
            groups = graph.stats.groups_total,
            emitted = graph.stats.groups_emitted,
            skipped_cardinality = graph.stats.groups_skipped_cardinality,
            skipped_missing_field = graph.stats.groups_skipped_missing_field,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Materialized graph"
        );

        graph
    }

    /// Materialize a single partition.
    ///
    /// A valid group has exactly one subject row and `expected_arity - 1`
    /// object rows. Objects are emitted in role order.
    pub fn materialize_group(&self, key: &GroupKey, rows: Vec<FlatRecord>) -> GroupOutcome {
        let size = rows.len();
        let subjects = rows.iter().filter(|r| r.is_subject()).count();

        if size != self.expected_arity || subjects != 1 {
            return GroupOutcome::SkippedCardinality { size, subjects };
        }

        let mut subject: Option<EntityFields> = None;
        let mut objects: Vec<(u32, EntityFields, EdgeFields)> = Vec::with_capacity(size - 1);

        for row in rows {
            match row {
                FlatRecord::Subject { entity, .. } => subject = Some(entity),
                FlatRecord::Object { role, entity, edge, .. } => objects.push((role, entity, edge)),
            }
        }

        let subject_node = match subject.and_then(|s| self.subject_node(s)) {
            Some(node) => node,
            None => return GroupOutcome::SkippedMissingField { field: "name" },
        };

        objects.sort_by_key(|(role, _, _)| *role);

        let mut nodes = Vec::with_capacity(size);
        let mut edges = Vec::with_capacity(size - 1);
        let mut self_loops = 0;

        for (_, entity, fields) in objects {
            let object_node = self.object_node(entity);
            let edge = self.edge(&subject_node.id, &object_node.id, fields);

            if edge.is_self_loop() {
                error!(
                    group_key = %key,
                    id = %edge.subject_id,
                    relation = %edge.relation,
                    "Relationship connects an entity to itself"
                );
                self_loops += 1;
            }

            nodes.push(object_node);
            edges.push(edge);
        }

        nodes.insert(0, subject_node);

        GroupOutcome::Emitted {
            nodes,
            edges,
            self_loops,
        }
    }

    fn subject_node(&self, entity: EntityFields) -> Option<Node> {
        let name = entity.name.as_deref().map(sanitize_name)?;
        Some(self.node(entity, name))
    }

    fn object_node(&self, entity: EntityFields) -> Node {
        let name = entity.name.as_deref().map(sanitize_name).unwrap_or_default();
        self.node(entity, name)
    }

    fn node(&self, entity: EntityFields, name: String) -> Node {
        Node::new(self.normalizer.normalize(&entity.id), name)
            .with_category(entity.category)
            .with_equivalent_identifiers(entity.equivalent_identifiers)
    }

    fn edge(&self, subject_id: &str, object_id: &str, fields: EdgeFields) -> Edge {
        Edge {
            subject_id: subject_id.to_string(),
            object_id: object_id.to_string(),
            predicate: fields.predicate,
            relation: fields.relation,
            properties: fields.properties,
            primary_knowledge_source: fields.provenance,
            aggregator_knowledge_sources: vec![self.provenance_id.clone()],
        }
    }
}

/// Group records by key, keeping input order within each group
fn partition(records: Vec<FlatRecord>) -> BTreeMap<GroupKey, Vec<FlatRecord>> {
    let mut groups: BTreeMap<GroupKey, Vec<FlatRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.group_key().clone()).or_default().push(record);
    }
    groups
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use kgx_common::EdgeProperties;

    fn materializer() -> GraphMaterializer {
        GraphMaterializer::new(&LoaderConfig::default()).unwrap()
    }

    fn subject(key: &str, id: &str, name: Option<&str>) -> FlatRecord {
        FlatRecord::subject(GroupKey::from_raw(key), EntityFields::new(id, name.map(str::to_string)))
    }

    fn object(key: &str, id: &str, name: &str) -> FlatRecord {
        FlatRecord::object(
            GroupKey::from_raw(key),
            2,
            EntityFields::new(id, Some(name.to_string())),
            EdgeFields {
                predicate: None,
                relation: "GAMMA:interacts_with".to_string(),
                edge_label: None,
                properties: EdgeProperties::default(),
                provenance: Some("CTD".to_string()),
            },
        )
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("BRCA1"), "BRCA1");
        assert_eq!(sanitize_name("Sjögren syndrome"), "Sj?gren syndrome");
        assert_eq!(sanitize_name("β-blocker"), "?-blocker");
        assert_eq!(sanitize_name(""), "");
    }

    #[test]
    fn test_pair_emits_two_nodes_one_edge() {
        let graph = materializer().materialize(vec![
            subject("g1", "HGNC:777", Some("BRCA1")),
            object("g1", "C009", "Breast Cancer"),
        ]);

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.nodes[0].id, "HGNC:777");
        assert_eq!(graph.nodes[1].id, "UMLS:C009");

        let edge = &graph.edges[0];
        assert_eq!(edge.subject_id, "HGNC:777");
        assert_eq!(edge.object_id, "UMLS:C009");
        assert_eq!(edge.primary_knowledge_source.as_deref(), Some("CTD"));
        assert_eq!(edge.aggregator_knowledge_sources, vec!["infores:pharos"]);
        assert_eq!(graph.stats.groups_emitted, 1);
    }

    #[test]
    fn test_wrong_cardinality_is_skipped() {
        let graph = materializer().materialize(vec![
            subject("g1", "HGNC:1", Some("A")),
            subject("g2", "HGNC:2", Some("B")),
            object("g2", "HGNC:3", "C"),
            object("g2", "HGNC:4", "D"),
        ]);

        assert!(graph.edges.is_empty());
        assert!(graph.nodes.is_empty());
        assert_eq!(graph.stats.groups_skipped_cardinality, 2);
        assert_eq!(graph.stats.records_processed, 4);
    }

    #[test]
    fn test_two_objects_without_subject_is_skipped() {
        let outcome = materializer().materialize_group(
            &GroupKey::from_raw("g"),
            vec![object("g", "A:1", "a"), object("g", "A:2", "b")],
        );
        assert_eq!(outcome, GroupOutcome::SkippedCardinality { size: 2, subjects: 0 });
    }

    #[test]
    fn test_subject_without_name_is_skipped() {
        let graph = materializer().materialize(vec![
            subject("g1", "HGNC:1", None),
            object("g1", "UMLS:C1", "x"),
        ]);
        assert!(graph.edges.is_empty());
        assert_eq!(graph.stats.groups_skipped_missing_field, 1);
    }

    #[test]
    fn test_self_loop_is_emitted_and_counted() {
        let graph = materializer().materialize(vec![
            subject("g1", "HGNC:1", Some("A")),
            object("g1", "HGNC:1", "A"),
        ]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.stats.self_loops, 1);
    }

    #[test]
    fn test_nodes_are_not_deduplicated() {
        let graph = materializer().materialize(vec![
            subject("g1", "HGNC:1", Some("A")),
            object("g1", "UMLS:C1", "x"),
            subject("g2", "HGNC:1", Some("A")),
            object("g2", "UMLS:C2", "y"),
        ]);
        assert_eq!(graph.nodes.iter().filter(|n| n.id == "HGNC:1").count(), 2);
    }

    #[test]
    fn test_higher_arity_groups() {
        let config = LoaderConfig::default().with_expected_arity(3);
        let materializer = GraphMaterializer::new(&config).unwrap();

        let graph = materializer.materialize(vec![
            subject("g", "HGNC:1", Some("A")),
            object("g", "UMLS:C1", "x"),
            object("g", "UMLS:C2", "y"),
        ]);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert!(graph.edges.iter().all(|e| e.subject_id == "HGNC:1"));
    }
}
