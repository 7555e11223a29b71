//! Cross-graph linking through a foreign-key property.

use std::collections::{BTreeMap, HashMap};

use crate::config::NormalizeConfig;
use crate::error::AppError;
use crate::models::{Edge, Node, Property};
use crate::network::PropertyGraph;
use crate::services::AttributeNormalizer;

/// Relationship stamped on every link edge.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkTemplate {
    pub predicate: String,
    /// Optional display label, stored as the `label` property.
    pub label: Option<String>,
    pub properties: BTreeMap<String, Property>,
}

impl LinkTemplate {
    pub fn new(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            label: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Derives a relation graph between two graphs.
///
/// Each source node's `internal_key` value is split into its parts and
/// every part is looked up in the target's identity index. A match emits
/// both nodes and one edge built from the [`LinkTemplate`]. Unmatched parts
/// are dropped without error.
#[derive(Debug, Clone, Default)]
pub struct InterGraphLinker {
    normalizer: AttributeNormalizer,
}

impl InterGraphLinker {
    pub fn new(config: &NormalizeConfig) -> Self {
        Self {
            normalizer: AttributeNormalizer::new(config),
        }
    }

    /// Links `source` to `target`.
    ///
    /// Every target node must carry `target_key` (`"id"` for the identity).
    ///
    /// ```ignore
    /// let links = linker.link(&patients, "HGNCIDs", &genes, "id", &LinkTemplate::new("HAS_A"))?;
    /// ```
    pub fn link(
        &self,
        source: &PropertyGraph,
        internal_key: &str,
        target: &PropertyGraph,
        target_key: &str,
        template: &LinkTemplate,
    ) -> Result<PropertyGraph, AppError> {
        let index = build_index(target, target_key)?;
        let mut links = PropertyGraph::new();
        let mut unmatched = 0usize;

        for node in source.nodes() {
            let Some(value) = node.attribute(internal_key) else {
                continue;
            };
            for key in self.normalizer.split_values(&value) {
                let Some(matched) = index.get(key.as_str()) else {
                    unmatched += 1;
                    continue;
                };
                links.add_node(node.clone());
                links.add_node((*matched).clone());
                links.add_edge(link_edge(node, matched, template))?;
            }
        }

        tracing::info!(
            predicate = %template.predicate,
            edges = links.edge_count(),
            unmatched,
            "Linked graphs"
        );
        Ok(links)
    }
}

fn build_index<'a>(
    target: &'a PropertyGraph,
    target_key: &str,
) -> Result<HashMap<String, &'a Node>, AppError> {
    let mut index = HashMap::with_capacity(target.node_count());
    for node in target.nodes() {
        let value = node
            .attribute(target_key)
            .ok_or_else(|| AppError::identity(format!("target node {}", node.id), target_key))?;
        index.entry(value.to_string()).or_insert(node);
    }
    Ok(index)
}

fn link_edge(subject: &Node, object: &Node, template: &LinkTemplate) -> Edge {
    let mut edge = Edge::new(&subject.id, &object.id, &template.predicate);
    edge.subject_label = subject.category.clone();
    edge.object_label = object.category.clone();
    edge.properties = template.properties.clone();
    if let Some(label) = &template.label {
        edge.properties
            .insert("label".to_string(), Property::Str(label.clone()));
    }
    edge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn category(name: &str) -> Category {
        Category::parse(name, ";").unwrap()
    }

    fn patients() -> PropertyGraph {
        let mut graph = PropertyGraph::new();
        graph.add_node(
            Node::new("P1")
                .with_category(category("Patient"))
                .with_property("gene_ids", "G1;G2"),
        );
        graph.add_node(Node::new("P2").with_category(category("Patient")));
        graph
    }

    fn genes() -> PropertyGraph {
        let mut graph = PropertyGraph::new();
        graph.add_node(Node::new("G1").with_category(category("Gene")));
        graph.add_node(Node::new("G3").with_category(category("Gene")));
        graph
    }

    #[test]
    fn test_link_drops_unmatched() {
        let links = InterGraphLinker::default()
            .link(&patients(), "gene_ids", &genes(), "id", &LinkTemplate::new("HAS_A"))
            .unwrap();

        assert_eq!(links.edge_count(), 1);
        let edge = links.edges().next().unwrap();
        assert_eq!((edge.subject.as_str(), edge.object.as_str()), ("P1", "G1"));
        assert_eq!(edge.subject_label_key(), "Patient");
        assert_eq!(edge.object_label_key(), "Gene");
        assert_eq!(links.node_count(), 2);
        assert!(links.node("G2").is_none());
        assert!(links.node("G3").is_none());
    }

    #[test]
    fn test_template_properties_copied() {
        let mut template = LinkTemplate::new("HAS_A").with_label("has gene");
        template
            .properties
            .insert("method".into(), Property::from("xref"));

        let links = InterGraphLinker::default()
            .link(&patients(), "gene_ids", &genes(), "id", &template)
            .unwrap();
        let edge = links.edges().next().unwrap();
        assert_eq!(edge.properties["label"], Property::from("has gene"));
        assert_eq!(edge.properties["method"], Property::from("xref"));
    }

    #[test]
    fn test_link_by_alternate_key() {
        let mut genes = PropertyGraph::new();
        genes.add_node(
            Node::new("ENTREZ:1")
                .with_category(category("Gene"))
                .with_property("symbol", "G2"),
        );

        let links = InterGraphLinker::default()
            .link(&patients(), "gene_ids", &genes, "symbol", &LinkTemplate::new("HAS_A"))
            .unwrap();
        assert_eq!(links.edges().next().unwrap().object, "ENTREZ:1");
    }

    #[test]
    fn test_target_missing_key_is_error() {
        let err = InterGraphLinker::default()
            .link(&patients(), "gene_ids", &genes(), "symbol", &LinkTemplate::new("HAS_A"))
            .unwrap_err();
        assert!(matches!(err, AppError::Identity { .. }));
    }
}
