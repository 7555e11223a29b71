//! Node identity remapping.
//!
//! A remap is computed first as a pure id mapping, then applied to the node
//! table and to every edge endpoint in one step, so edges never point at
//! an id that no longer exists.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::models::Node;
use crate::network::PropertyGraph;
use crate::services::AttributeNormalizer;

/// Old id to new id, for nodes whose id actually changes.
pub type IdMapping = BTreeMap<String, String>;

/// Historical doubled prefix found in HGNC cross-references.
pub const DOUBLED_HGNC_PREFIX: &str = "HGNC:HGNC:";

/// Rewrites a leading `HGNC:HGNC:` to a single `HGNC:`.
pub fn fix_doubled_hgnc(value: &str) -> String {
    match value.strip_prefix(DOUBLED_HGNC_PREFIX) {
        Some(rest) => format!("HGNC:{}", rest),
        None => value.to_string(),
    }
}

/// Computes the id mapping for nodes of `category`.
///
/// The new id is read from `new_property`. With a `prefix`, the first
/// separator-split value containing it is chosen; without one, the whole
/// value is used. Nodes without a usable value keep their id.
pub fn plan_remap(
    graph: &PropertyGraph,
    normalizer: &AttributeNormalizer,
    category: &str,
    new_property: &str,
    prefix: Option<&str>,
) -> IdMapping {
    graph
        .nodes_in_category(category)
        .filter_map(|node| {
            let new_id = choose_id(node, normalizer, new_property, prefix)?;
            (new_id != node.id).then(|| (node.id.clone(), new_id))
        })
        .collect()
}

fn choose_id(
    node: &Node,
    normalizer: &AttributeNormalizer,
    new_property: &str,
    prefix: Option<&str>,
) -> Option<String> {
    let value = node.properties.get(new_property)?;
    let chosen = match prefix {
        Some(prefix) => normalizer
            .split_values(value)
            .into_iter()
            .find(|v| v.contains(prefix))?,
        None => value.to_string().trim().to_string(),
    };
    if chosen.is_empty() {
        return None;
    }
    Some(fix_doubled_hgnc(&chosen))
}

impl PropertyGraph {
    /// Replaces node ids of `category` with the value of `new_property`.
    ///
    /// Edges are rewritten to the new ids. Returns the mapping applied.
    ///
    /// ```ignore
    /// let mapping = graph.remap_identifier(&normalizer, "Gene", "xrefs", Some("HGNC"));
    /// ```
    pub fn remap_identifier(
        &mut self,
        normalizer: &AttributeNormalizer,
        category: &str,
        new_property: &str,
        prefix: Option<&str>,
    ) -> IdMapping {
        let mapping = plan_remap(self, normalizer, category, new_property, prefix);
        self.apply_remap(&mapping);
        mapping
    }

    /// Applies an id mapping to nodes and edge endpoints together.
    ///
    /// Nodes that end up sharing an id are merged in insertion order.
    pub fn apply_remap(&mut self, mapping: &IdMapping) {
        if mapping.is_empty() {
            return;
        }

        let nodes = std::mem::take(&mut self.nodes);
        let mut remapped: IndexMap<String, Node> = IndexMap::with_capacity(nodes.len());
        for (_, mut node) in nodes {
            if let Some(new_id) = mapping.get(&node.id) {
                node.id = new_id.clone();
            }
            match remapped.get_mut(&node.id) {
                Some(existing) => {
                    tracing::warn!(id = %node.id, "Remapped id collides with an existing node; merging");
                    existing.merge(node);
                }
                None => {
                    remapped.insert(node.id.clone(), node);
                }
            }
        }
        self.nodes = remapped;

        let edges = std::mem::take(&mut self.edges);
        for (_, mut edge) in edges {
            if let Some(new_id) = mapping.get(&edge.subject) {
                edge.subject = new_id.clone();
            }
            if let Some(new_id) = mapping.get(&edge.object) {
                edge.object = new_id.clone();
            }
            self.upsert_edge(edge);
        }
        self.refresh_endpoint_labels(|id| mapping.values().any(|new_id| new_id == id));

        tracing::debug!(remapped = mapping.len(), "Applied node id remap");
    }
}
