//! Node-link JSON snapshots.
//!
//! ```json
//! {"directed": true, "multigraph": true, "graph": {},
//!  "nodes": [{"id": "A", ...}],
//!  "links": [{"source": "A", "target": "B", "key": "rel", "predicate": "rel", ...}]}
//! ```
//!
//! `source`, `target` and `key` belong to the link itself. Edge properties
//! with those names are written as `attr:source` and so on, and are read
//! back under their own names.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;
use crate::models::record_from_json;
use crate::network::PropertyGraph;
use crate::services::CanonicalEntityBuilder;

/// Value written to `graph.version`.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Link keys owned by the node-link format.
const LINK_KEYS: [&str; 3] = ["source", "target", "key"];

/// Prefix marking an edge property renamed to stay clear of [`LINK_KEYS`].
const ESCAPE_PREFIX: &str = "attr:";

fn needs_escape(key: &str) -> bool {
    LINK_KEYS.contains(&key) || key.starts_with(ESCAPE_PREFIX)
}

/// Renames every key `select` picks with `rename`.
///
/// Keys are removed before any is reinserted, so a renamed key never
/// clobbers another selected one.
fn rename_keys(
    attrs: &mut Map<String, JsonValue>,
    select: impl Fn(&str) -> bool,
    rename: impl Fn(&str) -> String,
) {
    let selected: Vec<String> = attrs.keys().filter(|k| select(k.as_str())).cloned().collect();
    let moved: Vec<(String, JsonValue)> = selected
        .into_iter()
        .filter_map(|k| attrs.remove(&k).map(|v| (rename(&k), v)))
        .collect();
    attrs.extend(moved);
}

fn yes() -> bool {
    true
}

/// Serialized form of a [`PropertyGraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkDocument {
    #[serde(default = "yes")]
    pub directed: bool,
    #[serde(default = "yes")]
    pub multigraph: bool,
    #[serde(default)]
    pub graph: Map<String, JsonValue>,
    pub nodes: Vec<Map<String, JsonValue>>,
    #[serde(default, alias = "edges")]
    pub links: Vec<Map<String, JsonValue>>,
}

impl PropertyGraph {
    pub fn to_node_link(&self) -> NodeLinkDocument {
        let mut graph = Map::new();
        graph.insert("version".into(), JsonValue::from(SNAPSHOT_VERSION));

        let links = self
            .edges()
            .map(|edge| {
                let mut attrs = edge.to_attributes();
                rename_keys(
                    &mut attrs,
                    |k| edge.properties.contains_key(k) && needs_escape(k),
                    |k| format!("{ESCAPE_PREFIX}{k}"),
                );
                attrs.insert("source".into(), JsonValue::String(edge.subject.clone()));
                attrs.insert("target".into(), JsonValue::String(edge.object.clone()));
                attrs.insert("key".into(), JsonValue::String(edge.predicate.clone()));
                attrs
            })
            .collect();

        NodeLinkDocument {
            directed: true,
            multigraph: true,
            graph,
            nodes: self.nodes().map(|n| n.to_attributes()).collect(),
            links,
        }
    }

    /// Rebuilds a graph from a node-link document.
    ///
    /// Every attribute goes back through `builder`, so foreign documents
    /// with list or nested values are normalized on the way in. A link's
    /// predicate is read from `predicate`, then `key`, then `label`.
    pub fn from_node_link(
        document: NodeLinkDocument,
        builder: &CanonicalEntityBuilder,
    ) -> Result<Self, AppError> {
        let mut graph = PropertyGraph::new();

        for (index, mut attrs) in document.nodes.into_iter().enumerate() {
            let id = attrs
                .remove("id")
                .and_then(|v| json_text(&v))
                .ok_or_else(|| AppError::identity(format!("node #{}", index), "id"))?;
            let record = record_from_json(JsonValue::Object(attrs));
            graph.add_node(builder.build_node(&id, &record, None, None)?);
        }

        for (index, mut attrs) in document.links.into_iter().enumerate() {
            let entity = format!("link #{}", index);
            let subject = take_text(&mut attrs, &["source", "subject"])
                .ok_or_else(|| AppError::identity(entity.clone(), "source"))?;
            let object = take_text(&mut attrs, &["target", "object"])
                .ok_or_else(|| AppError::identity(entity.clone(), "target"))?;
            let predicate = ["predicate", "key", "label"]
                .iter()
                .find_map(|k| attrs.get(*k).and_then(json_text))
                .ok_or_else(|| AppError::identity(entity, "predicate"))?;
            attrs.remove("key");
            rename_keys(
                &mut attrs,
                |k| k.starts_with(ESCAPE_PREFIX),
                |k| k[ESCAPE_PREFIX.len()..].to_string(),
            );

            let record = record_from_json(JsonValue::Object(attrs));
            let edge = builder.build_edge(&subject, &object, &record, &predicate, None, None, None)?;
            graph.add_edge(edge)?;
        }

        Ok(graph)
    }

    /// Writes the graph as a node-link JSON file.
    pub fn dump_to_file(&self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &self.to_node_link())?;
        writer.flush()?;
        tracing::info!(
            path = %path.display(),
            nodes = self.node_count(),
            edges = self.edge_count(),
            "Wrote graph snapshot"
        );
        Ok(())
    }

    /// Reads a graph from a node-link JSON file.
    pub fn restore_from_file(
        path: impl AsRef<Path>,
        builder: &CanonicalEntityBuilder,
    ) -> Result<Self, AppError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let document: NodeLinkDocument = serde_json::from_reader(reader)?;
        let graph = Self::from_node_link(document, builder)?;
        tracing::debug!(
            path = %path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Read graph snapshot"
        );
        Ok(graph)
    }
}

fn json_text(value: &JsonValue) -> Option<String> {
    let text = match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

fn take_text(attrs: &mut Map<String, JsonValue>, keys: &[&str]) -> Option<String> {
    let found = keys.iter().find_map(|k| attrs.get(*k).and_then(json_text));
    for key in keys {
        attrs.remove(*key);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Edge, Node, Property};
    use serde_json::json;

    fn sample() -> PropertyGraph {
        let mut graph = PropertyGraph::new();
        graph.add_node(
            Node::new("A")
                .with_category(Category::parse("Gene:Protein", ";").unwrap())
                .with_property("score", 3i64),
        );
        graph.add_node(Node::new("B"));
        let mut edge = Edge::new("A", "B", "rel")
            .with_property("source_db", "HPO")
            .with_property("source", "string-db")
            .with_property("key", "k1")
            .with_property("attr:target", "t");
        edge.weight = Some(0.5);
        graph.add_edge(edge).unwrap();
        graph
    }

    #[test]
    fn test_round_trip() {
        let graph = sample();
        let restored =
            PropertyGraph::from_node_link(graph.to_node_link(), &CanonicalEntityBuilder::default())
                .unwrap();
        assert_eq!(restored, graph);
    }

    #[test]
    fn test_document_shape() {
        let doc = serde_json::to_value(sample().to_node_link()).unwrap();
        assert_eq!(doc["directed"], true);
        assert_eq!(doc["multigraph"], true);
        assert_eq!(doc["nodes"][0]["category"], json!(["Gene", "Protein"]));
        assert_eq!(doc["links"][0]["source"], "A");
        assert_eq!(doc["links"][0]["target"], "B");
        assert_eq!(doc["links"][0]["key"], "rel");
        assert_eq!(doc["links"][0]["attr:source"], "string-db");
        assert_eq!(doc["links"][0]["attr:key"], "k1");
        assert_eq!(doc["links"][0]["attr:attr:target"], "t");
    }

    #[test]
    fn test_round_trip_keeps_link_named_properties() {
        let graph = sample();
        let restored =
            PropertyGraph::from_node_link(graph.to_node_link(), &CanonicalEntityBuilder::default())
                .unwrap();

        let edge = restored.edges().next().unwrap();
        assert_eq!(edge.subject, "A");
        assert_eq!(edge.predicate, "rel");
        assert_eq!(edge.properties["source"], Property::from("string-db"));
        assert_eq!(edge.properties["key"], Property::from("k1"));
        assert_eq!(edge.properties["attr:target"], Property::from("t"));
    }

    #[test]
    fn test_restore_predicate_from_key() {
        let doc: NodeLinkDocument = serde_json::from_value(json!({
            "nodes": [{"id": "A"}, {"id": "B"}],
            "links": [{"source": "A", "target": "B", "key": "rel", "HPterms": ["HP:1", "HP:2"]}]
        }))
        .unwrap();
        let graph = PropertyGraph::from_node_link(doc, &CanonicalEntityBuilder::default()).unwrap();

        let edge = graph.edges().next().unwrap();
        assert_eq!(edge.predicate, "rel");
        assert_eq!(edge.properties["HPterms"], Property::from("HP:1;HP:2"));
        assert!(!edge.properties.contains_key("key"));
    }

    #[test]
    fn test_restore_without_predicate_fails() {
        let doc: NodeLinkDocument = serde_json::from_value(json!({
            "nodes": [{"id": "A"}, {"id": "B"}],
            "links": [{"source": "A", "target": "B"}]
        }))
        .unwrap();
        let err = PropertyGraph::from_node_link(doc, &CanonicalEntityBuilder::default()).unwrap_err();
        assert!(matches!(err, AppError::Identity { ref field, .. } if field == "predicate"));
    }

    #[test]
    fn test_restore_node_without_id_fails() {
        let doc: NodeLinkDocument =
            serde_json::from_value(json!({"nodes": [{"name": "anonymous"}], "links": []})).unwrap();
        assert!(PropertyGraph::from_node_link(doc, &CanonicalEntityBuilder::default()).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let graph = sample();

        graph.dump_to_file(&path).unwrap();
        let restored =
            PropertyGraph::restore_from_file(&path, &CanonicalEntityBuilder::default()).unwrap();
        assert_eq!(restored, graph);
    }
}
