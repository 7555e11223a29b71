//! Grouping and chunking of a graph into write batches.
//!
//! Planning reads the graph and produces owned rows; the graph itself is
//! never modified.

use std::collections::BTreeSet;
use std::ops::Range;

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;
use crate::models::{Edge, Node};
use crate::network::PropertyGraph;

pub type BatchRow = Map<String, JsonValue>;

/// Nodes sharing one category, with a uniform key set.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGroup {
    /// Label key, e.g. `"Gene:Protein"`.
    pub label: String,
    pub keys: BTreeSet<String>,
    pub rows: Vec<BatchRow>,
}

/// Edges sharing one predicate and one pair of endpoint labels.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGroup {
    pub predicate: String,
    pub subject_label: String,
    pub object_label: String,
    pub keys: BTreeSet<String>,
    pub rows: Vec<BatchRow>,
}

/// A predicate group that cannot be written with a single template.
#[derive(Debug)]
pub struct RejectedGroup {
    pub predicate: String,
    pub size: usize,
    pub error: AppError,
}

#[derive(Debug)]
pub struct SyncPlan {
    /// Labels needing a uniqueness constraint, sorted.
    pub constraint_labels: BTreeSet<String>,
    pub node_groups: Vec<NodeGroup>,
    pub edge_groups: Vec<EdgeGroup>,
    pub rejected: Vec<RejectedGroup>,
}

impl SyncPlan {
    pub fn build(graph: &PropertyGraph, default_label: &str, base_label: &str) -> Self {
        let node_groups = group_nodes(graph, default_label);
        let (edge_groups, rejected) = group_edges(graph);
        let constraint_labels = constraint_labels(&node_groups, base_label);
        Self {
            constraint_labels,
            node_groups,
            edge_groups,
            rejected,
        }
    }
}

/// Groups nodes by category, in first-seen order.
///
/// A node without a category is placed under `default_label` with a warning.
pub fn group_nodes(graph: &PropertyGraph, default_label: &str) -> Vec<NodeGroup> {
    let mut groups: IndexMap<String, Vec<&Node>> = IndexMap::new();
    let mut defaulted = 0usize;

    for node in graph.nodes() {
        let label = match node.category_key() {
            Some(label) => label,
            None => {
                defaulted += 1;
                tracing::warn!(id = %node.id, label = %default_label, "Node has no category; using default label");
                default_label.to_string()
            }
        };
        groups.entry(label).or_default().push(node);
    }

    if defaulted > 0 {
        tracing::warn!(count = defaulted, label = %default_label, "Nodes synchronized under the default label");
    }

    groups
        .into_iter()
        .map(|(label, nodes)| {
            let keys = key_superset(nodes.iter().map(|n| n.attribute_keys()));
            let rows = backfill(nodes.iter().map(|n| n.to_attributes()), &keys);
            NodeGroup { label, keys, rows }
        })
        .collect()
}

/// Groups edges by predicate, in first-seen order.
///
/// Endpoint labels come from the first edge of a group; a group whose edges
/// disagree is rejected as a whole.
pub fn group_edges(graph: &PropertyGraph) -> (Vec<EdgeGroup>, Vec<RejectedGroup>) {
    let mut groups: IndexMap<&str, Vec<&Edge>> = IndexMap::new();
    for edge in graph.edges() {
        groups.entry(edge.predicate.as_str()).or_default().push(edge);
    }

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for (predicate, edges) in groups {
        let subject_label = edges[0].subject_label_key();
        let object_label = edges[0].object_label_key();

        let mismatch = edges.iter().find(|e| {
            e.subject_label_key() != subject_label || e.object_label_key() != object_label
        });
        if let Some(found) = mismatch {
            let error = AppError::SchemaMismatch {
                predicate: predicate.to_string(),
                expected_subject: subject_label.clone(),
                expected_object: object_label.clone(),
                found_subject: found.subject_label_key(),
                found_object: found.object_label_key(),
            };
            tracing::error!(error = %error, "Rejecting edge group");
            rejected.push(RejectedGroup {
                predicate: predicate.to_string(),
                size: edges.len(),
                error,
            });
            continue;
        }

        let keys = key_superset(edges.iter().map(|e| e.attribute_keys()));
        let rows = backfill(edges.iter().map(|e| e.to_attributes()), &keys);
        accepted.push(EdgeGroup {
            predicate: predicate.to_string(),
            subject_label,
            object_label,
            keys,
            rows,
        });
    }
    (accepted, rejected)
}

/// Every constituent label of every group, plus the base label.
pub fn constraint_labels(groups: &[NodeGroup], base_label: &str) -> BTreeSet<String> {
    groups
        .iter()
        .flat_map(|g| g.label.split(':'))
        .chain(std::iter::once(base_label))
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Splits `0..len` into consecutive ranges of at most `size`.
pub fn chunk_ranges(len: usize, size: usize) -> impl Iterator<Item = Range<usize>> {
    let size = size.max(1);
    (0..len)
        .step_by(size)
        .map(move |start| start..(start + size).min(len))
}

/// First row in `rows` missing one of `fields`, as an identity error.
pub fn check_identity(rows: &[BatchRow], fields: &[&str], entity: &str) -> Result<(), AppError> {
    for row in rows {
        for field in fields {
            let present = row
                .get(*field)
                .and_then(JsonValue::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !present {
                return Err(AppError::identity(entity, *field));
            }
        }
    }
    Ok(())
}

fn key_superset(sets: impl Iterator<Item = BTreeSet<String>>) -> BTreeSet<String> {
    sets.fold(BTreeSet::new(), |mut acc, keys| {
        acc.extend(keys);
        acc
    })
}

/// Fills keys missing from a row with the empty string.
fn backfill(rows: impl Iterator<Item = BatchRow>, keys: &BTreeSet<String>) -> Vec<BatchRow> {
    rows.map(|mut row| {
        for key in keys {
            row.entry(key.clone())
                .or_insert_with(|| JsonValue::String(String::new()));
        }
        row
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn category(name: &str) -> Category {
        Category::parse(name, ";").unwrap()
    }

    #[test]
    fn test_group_nodes_backfills() {
        let mut graph = PropertyGraph::new();
        graph.add_node(Node::new("G1").with_category(category("Gene")).with_property("symbol", "A"));
        graph.add_node(Node::new("G2").with_category(category("Gene")).with_property("chr", "1"));
        graph.add_node(Node::new("X"));

        let groups = group_nodes(&graph, "Node");

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "Gene");
        assert!(groups[0].keys.contains("symbol") && groups[0].keys.contains("chr"));
        assert_eq!(groups[0].rows[0]["chr"], "");
        assert_eq!(groups[0].rows[1]["symbol"], "");
        assert_eq!(groups[1].label, "Node");
    }

    #[test]
    fn test_group_edges_rejects_mixed_labels() {
        let mut graph = PropertyGraph::new();
        graph.add_node(Node::new("G1").with_category(category("Gene")));
        graph.add_node(Node::new("G2").with_category(category("Gene")));
        graph.add_node(Node::new("P1").with_category(category("Patient")));
        graph.add_edge(Edge::new("G1", "G2", "related")).unwrap();
        graph.add_edge(Edge::new("P1", "G2", "related")).unwrap();
        graph.add_edge(Edge::new("G1", "G2", "interacts_with")).unwrap();

        let (accepted, rejected) = group_edges(&graph);

        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].predicate, "interacts_with");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].predicate, "related");
        assert_eq!(rejected[0].size, 2);
        assert!(matches!(
            rejected[0].error,
            AppError::SchemaMismatch { ref predicate, .. } if predicate == "related"
        ));
    }

    #[test]
    fn test_constraint_labels_split_compound() {
        let groups = vec![
            NodeGroup {
                label: "Gene:Protein".into(),
                keys: BTreeSet::new(),
                rows: vec![],
            },
            NodeGroup {
                label: "Gene".into(),
                keys: BTreeSet::new(),
                rows: vec![],
            },
        ];
        let labels: Vec<_> = constraint_labels(&groups, "Node").into_iter().collect();
        assert_eq!(labels, ["Gene", "Node", "Protein"]);
    }

    #[test]
    fn test_chunk_ranges() {
        let ranges: Vec<_> = chunk_ranges(2500, 1000).collect();
        assert_eq!(ranges, vec![0..1000, 1000..2000, 2000..2500]);
        assert_eq!(chunk_ranges(0, 1000).count(), 0);
        assert_eq!(chunk_ranges(3, 0).count(), 3);
    }

    #[test]
    fn test_check_identity() {
        let good: BatchRow = serde_json::from_value(serde_json::json!({"id": "G1"})).unwrap();
        let bad: BatchRow = serde_json::from_value(serde_json::json!({"id": ""})).unwrap();
        assert!(check_identity(&[good.clone()], &["id"], "node").is_ok());
        assert!(check_identity(&[good, bad], &["id"], "node").is_err());
    }
}
