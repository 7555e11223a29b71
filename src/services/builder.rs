//! Construction of canonical nodes and edges from source records.

use std::collections::HashSet;

use crate::config::NormalizeConfig;
use crate::error::AppError;
use crate::models::{Category, Edge, Node, Property, RawRecord, RawValue};
use crate::services::AttributeNormalizer;

/// Builds [`Node`] and [`Edge`] records from arbitrary source records.
///
/// Both start from their required fields, then every property is passed
/// through the normalizer and merged in, last write wins. Excluded keys
/// are dropped. Identity fields are only ever taken from the explicit
/// arguments.
#[derive(Debug, Clone)]
pub struct CanonicalEntityBuilder {
    normalizer: AttributeNormalizer,
    excluded_keys: HashSet<String>,
}

impl Default for CanonicalEntityBuilder {
    fn default() -> Self {
        Self::new(&NormalizeConfig::default())
    }
}

impl CanonicalEntityBuilder {
    pub fn new(config: &NormalizeConfig) -> Self {
        Self {
            normalizer: AttributeNormalizer::new(config),
            excluded_keys: config.excluded_keys.iter().cloned().collect(),
        }
    }

    pub fn normalizer(&self) -> &AttributeNormalizer {
        &self.normalizer
    }

    /// Builds a node. An empty `id` is an identity error.
    ///
    /// ```ignore
    /// let node = builder.build_node("HP:0001250", record, Some("Seizure"), Some("Phenotype"))?;
    /// ```
    pub fn build_node(
        &self,
        id: &str,
        properties: &RawRecord,
        label: Option<&str>,
        category: Option<&str>,
    ) -> Result<Node, AppError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::identity("node", "id"));
        }

        let mut node = Node::new(id);
        node.label = label.map(String::from);
        node.category = category.and_then(|c| self.parse_category(c));

        for (key, value) in properties {
            if key == "id" || self.excluded_keys.contains(key) {
                continue;
            }
            match key.as_str() {
                "category" => {
                    if let Some(category) = self.category_from_raw(value) {
                        node.category = Some(category);
                    }
                }
                "name" => node.name = self.text(value),
                "label" => node.label = self.text(value),
                _ => {
                    if let Some(property) = self.normalizer.normalize(value) {
                        node.properties.insert(key.clone(), property);
                    }
                }
            }
        }

        Ok(node)
    }

    /// Builds an edge. Empty `subject`, `object` or `predicate` is an identity error.
    #[allow(clippy::too_many_arguments)]
    pub fn build_edge(
        &self,
        subject: &str,
        object: &str,
        properties: &RawRecord,
        predicate: &str,
        subject_label: Option<&str>,
        object_label: Option<&str>,
        weight: Option<f64>,
    ) -> Result<Edge, AppError> {
        let entity = format!("edge {} -> {}", subject, object);
        for (field, value) in [("subject", subject), ("object", object), ("predicate", predicate)] {
            if value.trim().is_empty() {
                return Err(AppError::identity(entity, field));
            }
        }

        let mut edge = Edge::new(subject.trim(), object.trim(), predicate.trim());
        edge.subject_label = subject_label.and_then(|c| self.parse_category(c));
        edge.object_label = object_label.and_then(|c| self.parse_category(c));
        edge.weight = weight;

        for (key, value) in properties {
            if key == "subject" || key == "object" || self.excluded_keys.contains(key) {
                continue;
            }
            match key.as_str() {
                "predicate" => {
                    if let Some(predicate) = self.text(value).filter(|p| !p.trim().is_empty()) {
                        edge.predicate = predicate;
                    }
                }
                "subject_label" => {
                    if let Some(label) = self.category_from_raw(value) {
                        edge.subject_label = Some(label);
                    }
                }
                "object_label" => {
                    if let Some(label) = self.category_from_raw(value) {
                        edge.object_label = Some(label);
                    }
                }
                "weight" => {
                    edge.weight = self.normalizer.normalize(value).and_then(|p| p.as_f64())
                }
                "method" => edge.method = self.text(value),
                _ => {
                    if let Some(property) = self.normalizer.normalize(value) {
                        edge.properties.insert(key.clone(), property);
                    }
                }
            }
        }

        Ok(edge)
    }

    fn parse_category(&self, value: &str) -> Option<Category> {
        Category::parse(value, self.normalizer.separator())
    }

    /// Categories keep their list shape instead of being joined.
    fn category_from_raw(&self, value: &RawValue) -> Option<Category> {
        match value {
            RawValue::List(items) => Category::from_labels(
                items
                    .iter()
                    .filter_map(|item| self.normalizer.normalize(item))
                    .map(|p| p.to_string()),
            ),
            other => self
                .normalizer
                .normalize(other)
                .and_then(|p| self.parse_category(&p.to_string())),
        }
    }

    fn text(&self, value: &RawValue) -> Option<String> {
        self.normalizer.normalize(value).map(|p| match p {
            Property::Str(s) => s,
            other => other.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, RawValue)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_build_node_template_and_properties() {
        let builder = CanonicalEntityBuilder::default();
        let node = builder
            .build_node(
                "HP:0001250",
                &record(&[
                    ("name", "Seizure".into()),
                    ("xrefs", RawValue::list(["UMLS:C0036572", "SNOMED:91175000"])),
                ]),
                Some("Seizure"),
                Some("Phenotype"),
            )
            .unwrap();

        assert_eq!(node.id, "HP:0001250");
        assert_eq!(node.name.as_deref(), Some("Seizure"));
        assert_eq!(node.category_key().as_deref(), Some("Phenotype"));
        assert_eq!(
            node.properties["xrefs"],
            Property::from("UMLS:C0036572;SNOMED:91175000")
        );
    }

    #[test]
    fn test_missing_id_is_identity_error() {
        let builder = CanonicalEntityBuilder::default();
        let err = builder
            .build_node("  ", &RawRecord::new(), None, None)
            .unwrap_err();
        assert!(matches!(err, AppError::Identity { ref field, .. } if field == "id"));
    }

    #[test]
    fn test_properties_override_template_except_identity() {
        let builder = CanonicalEntityBuilder::default();
        let node = builder
            .build_node(
                "P1",
                &record(&[
                    ("id", "P999".into()),
                    ("label", "Patient one".into()),
                    ("category", RawValue::list(["Patient", "Person"])),
                ]),
                Some("patient"),
                Some("Sample"),
            )
            .unwrap();

        assert_eq!(node.id, "P1");
        assert_eq!(node.label.as_deref(), Some("Patient one"));
        assert_eq!(node.category_key().as_deref(), Some("Patient:Person"));
    }

    #[test]
    fn test_excluded_keys_dropped() {
        let builder = CanonicalEntityBuilder::default();
        let node = builder
            .build_node(
                "HP:1",
                &record(&[
                    ("synonyms", RawValue::list(["a", "b"])),
                    ("def", "text".into()),
                ]),
                None,
                None,
            )
            .unwrap();
        assert!(!node.properties.contains_key("synonyms"));
        assert!(node.properties.contains_key("def"));
    }

    #[test]
    fn test_nested_property_dropped() {
        let builder = CanonicalEntityBuilder::default();
        let nested = RawValue::Nested([("x".to_string(), RawValue::from("y"))].into());
        let node = builder
            .build_node("G1", &record(&[("meta", nested)]), None, None)
            .unwrap();
        assert!(node.properties.is_empty());
    }

    #[test]
    fn test_build_edge() {
        let builder = CanonicalEntityBuilder::default();
        let edge = builder
            .build_edge(
                "P1",
                "P2",
                &record(&[
                    ("subject", "P9".into()),
                    ("method", "HP_Jaccard_Sim".into()),
                    ("weight", "0.42".into()),
                ]),
                "Shared_HP_terms",
                Some("Patient"),
                Some("Patient"),
                Some(0.1),
            )
            .unwrap();

        assert_eq!(edge.subject, "P1");
        assert_eq!(edge.weight, Some(0.42));
        assert_eq!(edge.method.as_deref(), Some("HP_Jaccard_Sim"));
        assert_eq!(edge.subject_label_key(), "Patient");
    }

    #[test]
    fn test_build_edge_requires_endpoints() {
        let builder = CanonicalEntityBuilder::default();
        let err = builder
            .build_edge("P1", "", &RawRecord::new(), "rel", None, None, None)
            .unwrap_err();
        assert!(matches!(err, AppError::Identity { ref field, .. } if field == "object"));
    }
}
