//! In-memory property multigraph.
//!
//! A [`PropertyGraph`] owns its nodes (unique by id) and edges (unique by
//! `(subject, object, predicate)`), both kept in insertion order. Once a
//! graph is handed to the synchronizer it should be treated as a
//! snapshot; the synchronizer only reads it.

mod remap;
mod snapshot;

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::error::AppError;
use crate::models::{Edge, EdgeKey, Node};

pub use remap::{fix_doubled_hgnc, plan_remap, IdMapping, DOUBLED_HGNC_PREFIX};
pub use snapshot::{NodeLinkDocument, SNAPSHOT_VERSION};

/// Which side of the graph an attribute query looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeScope {
    Node,
    Edge,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyGraph {
    nodes: IndexMap<String, Node>,
    edges: IndexMap<EdgeKey, Edge>,
}

impl PropertyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Nodes whose category names `filter` or contains it as a label.
    pub fn nodes_in_category<'a>(&'a self, filter: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes
            .values()
            .filter(move |n| n.category.as_ref().is_some_and(|c| c.matches(filter)))
    }

    /// Creates or updates a node. On an existing id, incoming values win per key.
    ///
    /// When the category of an existing node changes, the endpoint labels
    /// of its edges follow.
    pub fn add_node(&mut self, node: Node) {
        let id = node.id.clone();
        if self.upsert_node(node) {
            self.refresh_endpoint_labels(|endpoint| endpoint == id);
        }
    }

    /// Creates or updates an edge keyed by `(subject, object, predicate)`.
    ///
    /// Both endpoints must already be in the graph. Missing endpoint labels
    /// are filled in from the endpoint categories.
    pub fn add_edge(&mut self, mut edge: Edge) -> Result<(), AppError> {
        let (Some(subject), Some(object)) =
            (self.nodes.get(&edge.subject), self.nodes.get(&edge.object))
        else {
            return Err(AppError::DanglingEdge {
                subject: edge.subject,
                object: edge.object,
                predicate: edge.predicate,
            });
        };

        if edge.subject_label.is_none() {
            edge.subject_label = subject.category.clone();
        }
        if edge.object_label.is_none() {
            edge.object_label = object.category.clone();
        }
        self.upsert_edge(edge);
        Ok(())
    }

    /// Composes `self` with each of `others`, left to right.
    ///
    /// On an id or edge-key collision the graph merged last wins for every
    /// conflicting attribute. Conflicts are overwritten silently.
    pub fn merge(mut self, others: impl IntoIterator<Item = PropertyGraph>) -> PropertyGraph {
        for other in others {
            for node in other.nodes.into_values() {
                self.upsert_node(node);
            }
            for edge in other.edges.into_values() {
                self.upsert_edge(edge);
            }
        }
        self.refresh_endpoint_labels(|_| true);
        self
    }

    /// Attribute names of a representative node or edge.
    ///
    /// `None` for an empty side. Only a convenience: entities are not
    /// guaranteed to share a schema.
    pub fn find_attribute_keys(&self, scope: AttributeScope) -> Option<BTreeSet<String>> {
        match scope {
            AttributeScope::Node => self.nodes.values().next().map(Node::attribute_keys),
            AttributeScope::Edge => self.edges.values().next().map(Edge::attribute_keys),
        }
    }

    /// Copies `new_property` into `old_property` on nodes of `category`.
    ///
    /// Nodes lacking `new_property` keep their current value. Returns the
    /// number of nodes updated.
    pub fn remap_node_property(
        &mut self,
        category: &str,
        old_property: &str,
        new_property: &str,
    ) -> usize {
        let mut updated = 0;
        for node in self.nodes.values_mut() {
            if !node.category.as_ref().is_some_and(|c| c.matches(category)) {
                continue;
            }
            if let Some(value) = node.properties.get(new_property).cloned() {
                node.properties.insert(old_property.to_string(), value);
                updated += 1;
            }
        }
        updated
    }

    /// Copies `new_property` into `old_property` on edges of `predicate`.
    pub fn remap_edge_property(
        &mut self,
        predicate: &str,
        old_property: &str,
        new_property: &str,
    ) -> usize {
        let mut updated = 0;
        for edge in self.edges.values_mut() {
            if edge.predicate != predicate {
                continue;
            }
            if let Some(value) = edge.properties.get(new_property).cloned() {
                edge.properties.insert(old_property.to_string(), value);
                updated += 1;
            }
        }
        updated
    }

    /// Inserts or merges a node. True when an existing node changed category.
    fn upsert_node(&mut self, node: Node) -> bool {
        match self.nodes.get_mut(&node.id) {
            Some(existing) => {
                let before = existing.category.clone();
                existing.merge(node);
                existing.category != before
            }
            None => {
                self.nodes.insert(node.id.clone(), node);
                false
            }
        }
    }

    /// Copies endpoint categories onto the labels of edges touching a
    /// selected node. Endpoints without a category keep the edge's label.
    pub(crate) fn refresh_endpoint_labels(&mut self, selected: impl Fn(&str) -> bool) {
        let nodes = &self.nodes;
        let category = |id: &str| {
            selected(id)
                .then(|| nodes.get(id).and_then(|n| n.category.clone()))
                .flatten()
        };
        for edge in self.edges.values_mut() {
            if let Some(label) = category(&edge.subject) {
                edge.subject_label = Some(label);
            }
            if let Some(label) = category(&edge.object) {
                edge.object_label = Some(label);
            }
        }
    }

    fn upsert_edge(&mut self, edge: Edge) {
        match self.edges.get_mut(&edge.key()) {
            Some(existing) => existing.merge(edge),
            None => {
                self.edges.insert(edge.key(), edge);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Property};

    fn gene(id: &str) -> Node {
        Node::new(id).with_category(Category::parse("Gene", ";").unwrap())
    }

    #[test]
    fn test_add_node_upserts() {
        let mut graph = PropertyGraph::new();
        graph.add_node(gene("G1").with_property("p", "1").with_property("q", "x"));
        graph.add_node(Node::new("G1").with_property("p", "2"));

        assert_eq!(graph.node_count(), 1);
        let node = graph.node("G1").unwrap();
        assert_eq!(node.properties["p"], Property::from("2"));
        assert_eq!(node.properties["q"], Property::from("x"));
        assert_eq!(node.category_key().as_deref(), Some("Gene"));
    }

    #[test]
    fn test_add_edge_requires_endpoints() {
        let mut graph = PropertyGraph::new();
        graph.add_node(gene("G1"));
        let err = graph.add_edge(Edge::new("G1", "G2", "interacts_with")).unwrap_err();
        assert!(matches!(err, AppError::DanglingEdge { .. }));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_add_edge_fills_labels_and_dedups() {
        let mut graph = PropertyGraph::new();
        graph.add_node(gene("G1"));
        graph.add_node(gene("G2"));

        graph
            .add_edge(Edge::new("G1", "G2", "interacts_with").with_property("score", "1"))
            .unwrap();
        graph
            .add_edge(Edge::new("G1", "G2", "interacts_with").with_property("score", "2"))
            .unwrap();
        graph.add_edge(Edge::new("G1", "G2", "regulates")).unwrap();

        assert_eq!(graph.edge_count(), 2);
        let edge = graph.edges().next().unwrap();
        assert_eq!(edge.subject_label_key(), "Gene");
        assert_eq!(edge.object_label_key(), "Gene");
        assert_eq!(edge.properties["score"], Property::from("2"));
    }

    #[test]
    fn test_merge_right_wins() {
        let mut g1 = PropertyGraph::new();
        g1.add_node(gene("G1").with_property("p", "left").with_property("only_left", "1"));
        let mut g2 = PropertyGraph::new();
        g2.add_node(gene("G1").with_property("p", "middle"));
        let mut g3 = PropertyGraph::new();
        g3.add_node(gene("G1").with_property("p", "right"));
        g3.add_node(gene("G9"));

        let merged = g1.merge([g2, g3]);

        assert_eq!(merged.node_count(), 2);
        let node = merged.node("G1").unwrap();
        assert_eq!(node.properties["p"], Property::from("right"));
        assert_eq!(node.properties["only_left"], Property::from("1"));
    }

    #[test]
    fn test_merge_edges_by_key() {
        let mut g1 = PropertyGraph::new();
        g1.add_node(gene("A"));
        g1.add_node(gene("B"));
        g1.add_edge(Edge::new("A", "B", "rel").with_property("w", "1")).unwrap();

        let mut g2 = PropertyGraph::new();
        g2.add_node(gene("A"));
        g2.add_node(gene("B"));
        g2.add_edge(Edge::new("A", "B", "rel").with_property("w", "2")).unwrap();
        g2.add_edge(Edge::new("B", "A", "rel")).unwrap();

        let merged = g1.merge([g2]);
        assert_eq!(merged.edge_count(), 2);
        let key = Edge::new("A", "B", "rel").key();
        assert_eq!(merged.edge(&key).unwrap().properties["w"], Property::from("2"));
    }

    fn protein(id: &str) -> Node {
        Node::new(id).with_category(Category::parse("Protein", ";").unwrap())
    }

    #[test]
    fn test_merge_moves_edge_labels_with_category() {
        let mut g1 = PropertyGraph::new();
        g1.add_node(gene("A"));
        g1.add_node(gene("B"));
        g1.add_edge(Edge::new("A", "B", "rel")).unwrap();
        let mut g2 = PropertyGraph::new();
        g2.add_node(protein("A"));

        let merged = g1.merge([g2]);

        let edge = merged.edges().next().unwrap();
        assert_eq!(edge.subject_label_key(), "Protein");
        assert_eq!(edge.object_label_key(), "Gene");
    }

    #[test]
    fn test_merge_keeps_labels_of_uncategorized_endpoints() {
        let mut g1 = PropertyGraph::new();
        g1.add_node(gene("A"));
        g1.add_node(Node::new("B"));
        let mut edge = Edge::new("A", "B", "rel");
        edge.object_label = Category::parse("Phenotype", ";");
        g1.add_edge(edge).unwrap();

        let merged = g1.merge([]);

        let edge = merged.edges().next().unwrap();
        assert_eq!(edge.subject_label_key(), "Gene");
        assert_eq!(edge.object_label_key(), "Phenotype");
    }

    #[test]
    fn test_add_node_category_change_updates_edges() {
        let mut graph = PropertyGraph::new();
        graph.add_node(gene("A"));
        graph.add_node(gene("B"));
        graph.add_edge(Edge::new("A", "B", "rel")).unwrap();
        graph.add_edge(Edge::new("B", "A", "rel")).unwrap();

        graph.add_node(protein("A"));

        for edge in graph.edges() {
            let a_label = if edge.subject == "A" {
                edge.subject_label_key()
            } else {
                edge.object_label_key()
            };
            assert_eq!(a_label, "Protein");
        }
    }

    #[test]
    fn test_find_attribute_keys() {
        let mut graph = PropertyGraph::new();
        assert!(graph.find_attribute_keys(AttributeScope::Node).is_none());
        assert!(graph.find_attribute_keys(AttributeScope::Edge).is_none());

        graph.add_node(gene("G1").with_property("symbol", "A1BG"));
        let keys = graph.find_attribute_keys(AttributeScope::Node).unwrap();
        assert!(keys.contains("symbol"));
        assert!(keys.contains("id"));
    }

    #[test]
    fn test_remap_node_property() {
        let mut graph = PropertyGraph::new();
        graph.add_node(gene("G1").with_property("name_old", "x").with_property("symbol", "A1BG"));
        graph.add_node(gene("G2").with_property("name_old", "y"));
        graph.add_node(Node::new("P1").with_property("symbol", "nope"));

        let updated = graph.remap_node_property("Gene", "name_old", "symbol");

        assert_eq!(updated, 1);
        assert_eq!(graph.node("G1").unwrap().properties["name_old"], Property::from("A1BG"));
        assert_eq!(graph.node("G2").unwrap().properties["name_old"], Property::from("y"));
        assert!(!graph.node("P1").unwrap().properties.contains_key("name_old"));
    }

    #[test]
    fn test_remap_edge_property() {
        let mut graph = PropertyGraph::new();
        graph.add_node(gene("A"));
        graph.add_node(gene("B"));
        graph
            .add_edge(
                Edge::new("A", "B", "rel")
                    .with_property("source", "old")
                    .with_property("provider", "HPO"),
            )
            .unwrap();

        assert_eq!(graph.remap_edge_property("rel", "source", "provider"), 1);
        assert_eq!(graph.remap_edge_property("other", "source", "provider"), 0);
        let edge = graph.edges().next().unwrap();
        assert_eq!(edge.properties["source"], Property::from("HPO"));
    }
}
