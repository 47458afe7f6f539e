//! Graph sinks
//!
//! A [`GraphSink`] receives the final collections of a run. Serialization to a
//! concrete file format is left to downstream tooling; the in-memory
//! [`CollectingSink`] is what the pipeline and tests use.

use std::collections::HashSet;

use kgx_common::{Edge, Node, Result};

use crate::config::NodeDedup;
use crate::materializer::MaterializedGraph;

/// Destination for materialized nodes and edges
pub trait GraphSink {
    fn write_node(&mut self, node: Node) -> Result<()>;

    fn write_edge(&mut self, edge: Edge) -> Result<()>;

    /// Called once after the last node and edge
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Write a whole graph, nodes first so every edge's endpoints precede it
    fn write_graph(&mut self, graph: MaterializedGraph) -> Result<()> {
        for node in graph.nodes {
            self.write_node(node)?;
        }
        for edge in graph.edges {
            self.write_edge(edge)?;
        }
        self.finish()
    }
}

/// Keeps everything in memory, applying a node deduplication policy
#[derive(Debug, Default)]
pub struct CollectingSink {
    dedup: NodeDedup,
    seen: HashSet<String>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    duplicate_nodes: usize,
}

impl CollectingSink {
    pub fn new(dedup: NodeDedup) -> Self {
        Self {
            dedup,
            ..Default::default()
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Nodes dropped by the `ById` policy
    pub fn duplicate_nodes(&self) -> usize {
        self.duplicate_nodes
    }
}

impl GraphSink for CollectingSink {
    fn write_node(&mut self, node: Node) -> Result<()> {
        if self.dedup == NodeDedup::ById && !self.seen.insert(node.id.clone()) {
            self.duplicate_nodes += 1;
            return Ok(());
        }
        self.nodes.push(node);
        Ok(())
    }

    fn write_edge(&mut self, edge: Edge) -> Result<()> {
        self.edges.push(edge);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn graph() -> MaterializedGraph {
        MaterializedGraph {
            nodes: vec![
                Node::new("HGNC:1", "A"),
                Node::new("UMLS:C1", "x"),
                Node::new("HGNC:1", "A"),
                Node::new("UMLS:C2", "y"),
            ],
            edges: Vec::new(),
            stats: Default::default(),
        }
    }

    #[test]
    fn test_preserve_keeps_multiplicity() {
        let mut sink = CollectingSink::new(NodeDedup::Preserve);
        sink.write_graph(graph()).unwrap();
        assert_eq!(sink.nodes().len(), 4);
        assert_eq!(sink.duplicate_nodes(), 0);
    }

    #[test]
    fn test_dedup_by_id_keeps_first() {
        let mut sink = CollectingSink::new(NodeDedup::ById);
        sink.write_graph(graph()).unwrap();
        let ids: Vec<&str> = sink.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["HGNC:1", "UMLS:C1", "UMLS:C2"]);
        assert_eq!(sink.duplicate_nodes(), 1);
    }
}
