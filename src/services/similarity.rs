//! Jaccard similarity edges between nodes of one category.

use std::collections::BTreeSet;

use crate::models::Edge;
use crate::network::PropertyGraph;
use crate::services::AttributeNormalizer;

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityOptions {
    /// Category whose nodes are compared pairwise.
    pub category: String,
    /// Multi-valued property holding the compared terms.
    pub key: String,
    /// Minimum score for an edge.
    pub threshold: f64,
    pub predicate: String,
    pub method: String,
}

impl SimilarityOptions {
    pub const DEFAULT_THRESHOLD: f64 = 0.2;
    pub const DEFAULT_PREDICATE: &'static str = "Shared_HP_terms";
    pub const DEFAULT_METHOD: &'static str = "HP_Jaccard_Sim";

    pub fn new(category: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            key: key.into(),
            threshold: Self::DEFAULT_THRESHOLD,
            predicate: Self::DEFAULT_PREDICATE.to_string(),
            method: Self::DEFAULT_METHOD.to_string(),
        }
    }
}

/// `|a ∩ b| / |a ∪ b|`, 0 for an empty union.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Compares every unordered pair of nodes in `options.category`.
///
/// Returns a graph holding those nodes plus one edge per pair scoring at
/// least the threshold, directed from the earlier node to the later one
/// and weighted with the score rounded to three decimals.
pub fn similarity_edges(
    graph: &PropertyGraph,
    normalizer: &AttributeNormalizer,
    options: &SimilarityOptions,
) -> PropertyGraph {
    let members: Vec<_> = graph
        .nodes_in_category(&options.category)
        .map(|node| {
            let terms: BTreeSet<String> = node
                .properties
                .get(&options.key)
                .map(|v| normalizer.split_values(v).into_iter().collect())
                .unwrap_or_default();
            (node, terms)
        })
        .collect();

    let mut result = PropertyGraph::new();
    for (node, _) in &members {
        result.add_node((*node).clone());
    }

    for (i, (left, left_terms)) in members.iter().enumerate() {
        for (right, right_terms) in &members[i + 1..] {
            let score = jaccard(left_terms, right_terms);
            if score < options.threshold {
                continue;
            }
            let mut edge = Edge::new(&left.id, &right.id, &options.predicate);
            edge.subject_label = left.category.clone();
            edge.object_label = right.category.clone();
            edge.weight = Some((score * 1000.0).round() / 1000.0);
            edge.method = Some(options.method.clone());
            if let Err(err) = result.add_edge(edge) {
                tracing::warn!(error = %err, "Skipping similarity edge");
            }
        }
    }

    tracing::info!(
        category = %options.category,
        nodes = members.len(),
        edges = result.edge_count(),
        "Computed similarity edges"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Node};

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn patient(id: &str, terms: &str) -> Node {
        Node::new(id)
            .with_category(Category::parse("Patient", ";").unwrap())
            .with_property("HPterms", terms)
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard(&set(&["a", "b"]), &set(&["b", "c"])), 1.0 / 3.0);
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
        assert_eq!(jaccard(&set(&["a"]), &set(&["a"])), 1.0);
    }

    #[test]
    fn test_similarity_edges() {
        let mut graph = PropertyGraph::new();
        graph.add_node(patient("P1", "HP:1;HP:2;HP:3"));
        graph.add_node(patient("P2", "HP:2;HP:3;HP:4"));
        graph.add_node(patient("P3", "HP:9"));
        graph.add_node(Node::new("G1").with_property("HPterms", "HP:1"));

        let result = similarity_edges(
            &graph,
            &AttributeNormalizer::default(),
            &SimilarityOptions::new("Patient", "HPterms"),
        );

        assert_eq!(result.node_count(), 3);
        assert_eq!(result.edge_count(), 1);
        let edge = result.edges().next().unwrap();
        assert_eq!((edge.subject.as_str(), edge.object.as_str()), ("P1", "P2"));
        assert_eq!(edge.predicate, "Shared_HP_terms");
        assert_eq!(edge.weight, Some(0.5));
        assert_eq!(edge.method.as_deref(), Some("HP_Jaccard_Sim"));
    }

    #[test]
    fn test_weight_rounded() {
        let mut graph = PropertyGraph::new();
        graph.add_node(patient("P1", "a;b"));
        graph.add_node(patient("P2", "b;c"));

        let result = similarity_edges(
            &graph,
            &AttributeNormalizer::default(),
            &SimilarityOptions::new("Patient", "HPterms"),
        );
        assert_eq!(result.edges().next().unwrap().weight, Some(0.333));
    }
}
