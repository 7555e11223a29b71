//! Canonical edge record.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value as JsonValue};

use crate::models::{Category, Property};

/// Attribute names with a dedicated field on [`Edge`].
pub const EDGE_FIELDS: [&str; 7] = [
    "subject",
    "object",
    "predicate",
    "subject_label",
    "object_label",
    "weight",
    "method",
];

/// Attributes that only parameterize the match and are never stored on a relationship.
pub const EDGE_IDENTITY_FIELDS: [&str; 5] =
    ["subject", "object", "predicate", "subject_label", "object_label"];

/// Identity of an edge within a multigraph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub subject: String,
    pub object: String,
    pub predicate: String,
}

/// A directed, typed edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub subject: String,
    pub object: String,
    /// Relationship type in the store.
    pub predicate: String,
    pub subject_label: Option<Category>,
    pub object_label: Option<Category>,
    pub weight: Option<f64>,
    /// Provenance, e.g. the similarity method that produced the edge.
    pub method: Option<String>,
    pub properties: BTreeMap<String, Property>,
}

impl Edge {
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        predicate: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            predicate: predicate.into(),
            subject_label: None,
            object_label: None,
            weight: None,
            method: None,
            properties: BTreeMap::new(),
        }
    }

    /// Sets an attribute. Keys from [`EDGE_FIELDS`] land in their field;
    /// `subject` and `object` are identity and ignored here.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Property>) -> Self {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            "subject" | "object" => {}
            "predicate" => {
                let predicate = value.to_string();
                if !predicate.trim().is_empty() {
                    self.predicate = predicate;
                }
            }
            "subject_label" => self.subject_label = Category::from_labels([value.to_string()]),
            "object_label" => self.object_label = Category::from_labels([value.to_string()]),
            "weight" => self.weight = value.as_f64(),
            "method" => self.method = Some(value.to_string()),
            _ => {
                self.properties.insert(key, value);
            }
        }
        self
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            subject: self.subject.clone(),
            object: self.object.clone(),
            predicate: self.predicate.clone(),
        }
    }

    pub fn subject_label_key(&self) -> String {
        self.subject_label
            .as_ref()
            .map(Category::label_key)
            .unwrap_or_default()
    }

    pub fn object_label_key(&self) -> String {
        self.object_label
            .as_ref()
            .map(Category::label_key)
            .unwrap_or_default()
    }

    pub fn attribute(&self, key: &str) -> Option<Property> {
        match key {
            "subject" => Some(Property::Str(self.subject.clone())),
            "object" => Some(Property::Str(self.object.clone())),
            "predicate" => Some(Property::Str(self.predicate.clone())),
            "subject_label" => self.subject_label.as_ref().map(|c| c.label_key().into()),
            "object_label" => self.object_label.as_ref().map(|c| c.label_key().into()),
            "weight" => self.weight.map(Property::Float),
            "method" => self.method.clone().map(Property::Str),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Folds `other` into `self`; values present on `other` win.
    pub fn merge(&mut self, other: Edge) {
        if other.subject_label.is_some() {
            self.subject_label = other.subject_label;
        }
        if other.object_label.is_some() {
            self.object_label = other.object_label;
        }
        if other.weight.is_some() {
            self.weight = other.weight;
        }
        if other.method.is_some() {
            self.method = other.method;
        }
        self.properties.extend(other.properties);
    }

    pub fn attribute_keys(&self) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self.properties.keys().cloned().collect();
        keys.extend(["subject", "object", "predicate"].map(String::from));
        if self.subject_label.is_some() {
            keys.insert("subject_label".into());
        }
        if self.object_label.is_some() {
            keys.insert("object_label".into());
        }
        if self.weight.is_some() {
            keys.insert("weight".into());
        }
        if self.method.is_some() {
            keys.insert("method".into());
        }
        keys
    }

    pub fn to_attributes(&self) -> Map<String, JsonValue> {
        let mut attrs: Map<String, JsonValue> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        attrs.insert("subject".into(), JsonValue::String(self.subject.clone()));
        attrs.insert("object".into(), JsonValue::String(self.object.clone()));
        attrs.insert("predicate".into(), JsonValue::String(self.predicate.clone()));
        if let Some(label) = &self.subject_label {
            attrs.insert("subject_label".into(), JsonValue::String(label.label_key()));
        }
        if let Some(label) = &self.object_label {
            attrs.insert("object_label".into(), JsonValue::String(label.label_key()));
        }
        if let Some(weight) = self.weight {
            attrs.insert("weight".into(), JsonValue::from(weight));
        }
        if let Some(method) = &self.method {
            attrs.insert("method".into(), JsonValue::String(method.clone()));
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_property_routes_dedicated_fields() {
        let edge = Edge::new("P1", "P2", "rel")
            .with_property("method", "HP_Jaccard_Sim")
            .with_property("weight", "0.25")
            .with_property("object_label", "Gene:Protein")
            .with_property("subject", "X")
            .with_property("source", "HPO");

        assert_eq!(edge.attribute("method"), Some(Property::from("HP_Jaccard_Sim")));
        assert_eq!(edge.weight, Some(0.25));
        assert_eq!(edge.object_label_key(), "Gene:Protein");
        assert_eq!(edge.subject, "P1");
        assert_eq!(edge.properties.len(), 1);
        assert_eq!(edge.properties["source"], Property::from("HPO"));
    }

    #[test]
    fn test_key_ignores_attributes() {
        let a = Edge::new("P1", "P2", "Shared_HP_terms").with_property("x", "1");
        let b = Edge::new("P1", "P2", "Shared_HP_terms");
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), Edge::new("P1", "P2", "other").key());
    }

    #[test]
    fn test_merge_incoming_wins() {
        let mut edge = Edge::new("P1", "P2", "rel");
        edge.weight = Some(0.2);
        edge.method = Some("manual".into());

        let mut update = Edge::new("P1", "P2", "rel");
        update.weight = Some(0.5);
        edge.merge(update);

        assert_eq!(edge.weight, Some(0.5));
        assert_eq!(edge.method.as_deref(), Some("manual"));
    }

    #[test]
    fn test_label_keys_default_empty() {
        let edge = Edge::new("a", "b", "rel");
        assert_eq!(edge.subject_label_key(), "");
        assert!(!edge.attribute_keys().contains("subject_label"));
    }
}
