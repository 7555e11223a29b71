//! Canonical node record.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value as JsonValue};

use crate::models::{Category, Property};

/// Attribute names with a dedicated field on [`Node`].
pub const NODE_FIELDS: [&str; 4] = ["id", "name", "label", "category"];

/// A node in a [`PropertyGraph`](crate::network::PropertyGraph).
///
/// Required fields are typed; everything else lives in `properties`,
/// already normalized to atomic values.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Identity, unique within a graph. Never empty.
    pub id: String,
    pub name: Option<String>,
    /// Display/type name.
    pub label: Option<String>,
    /// Labels used in the store. Defaulted at sync time when missing.
    pub category: Option<Category>,
    pub properties: BTreeMap<String, Property>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            label: None,
            category: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets an attribute. Keys from [`NODE_FIELDS`] land in their field;
    /// `id` is identity and ignored here.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Property>) -> Self {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            "id" => {}
            "name" => self.name = Some(value.to_string()),
            "label" => self.label = Some(value.to_string()),
            "category" => {
                if let Some(category) = Category::from_labels([value.to_string()]) {
                    self.category = Some(category);
                }
            }
            _ => {
                self.properties.insert(key, value);
            }
        }
        self
    }

    /// Grouping key of the category, e.g. `"Gene:Protein"`.
    pub fn category_key(&self) -> Option<String> {
        self.category.as_ref().map(Category::label_key)
    }

    /// Looks up any attribute, dedicated fields included.
    pub fn attribute(&self, key: &str) -> Option<Property> {
        match key {
            "id" => Some(Property::Str(self.id.clone())),
            "name" => self.name.clone().map(Property::Str),
            "label" => self.label.clone().map(Property::Str),
            "category" => self.category_key().map(Property::Str),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Folds `other` into `self`; values present on `other` win.
    ///
    /// The identity is left untouched.
    pub fn merge(&mut self, other: Node) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.label.is_some() {
            self.label = other.label;
        }
        if other.category.is_some() {
            self.category = other.category;
        }
        self.properties.extend(other.properties);
    }

    /// Names of every attribute present on this node.
    pub fn attribute_keys(&self) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self.properties.keys().cloned().collect();
        keys.insert("id".to_string());
        if self.name.is_some() {
            keys.insert("name".to_string());
        }
        if self.label.is_some() {
            keys.insert("label".to_string());
        }
        if self.category.is_some() {
            keys.insert("category".to_string());
        }
        keys
    }

    /// Flat attribute map, as stored in snapshots and sent in batch rows.
    pub fn to_attributes(&self) -> Map<String, JsonValue> {
        let mut attrs: Map<String, JsonValue> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        attrs.insert("id".into(), JsonValue::String(self.id.clone()));
        if let Some(name) = &self.name {
            attrs.insert("name".into(), JsonValue::String(name.clone()));
        }
        if let Some(label) = &self.label {
            attrs.insert("label".into(), JsonValue::String(label.clone()));
        }
        if let Some(category) = &self.category {
            attrs.insert(
                "category".into(),
                serde_json::to_value(category).unwrap_or(JsonValue::Null),
            );
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(id: &str) -> Node {
        Node::new(id).with_category(Category::parse("Gene", ";").unwrap())
    }

    #[test]
    fn test_with_property_routes_dedicated_fields() {
        let node = Node::new("G1")
            .with_property("name", "BRCA1")
            .with_property("category", "Gene:Protein")
            .with_property("id", "other")
            .with_property("chr", "17");

        assert_eq!(node.id, "G1");
        assert_eq!(node.name.as_deref(), Some("BRCA1"));
        assert_eq!(node.category_key().as_deref(), Some("Gene:Protein"));
        assert_eq!(node.properties.len(), 1);
        assert_eq!(node.to_attributes()["name"], "BRCA1");
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut first = gene("HGNC:5").with_property("symbol", "A1BG").with_property("chr", "19");
        let mut second = Node::new("HGNC:5").with_property("symbol", "A1BG-new");
        second.name = Some("alpha-1-B glycoprotein".into());

        first.merge(second);

        assert_eq!(first.properties["symbol"], Property::from("A1BG-new"));
        assert_eq!(first.properties["chr"], Property::from("19"));
        assert_eq!(first.name.as_deref(), Some("alpha-1-B glycoprotein"));
        assert_eq!(first.category_key().as_deref(), Some("Gene"));
    }

    #[test]
    fn test_attribute_lookup() {
        let node = gene("HGNC:5").with_property("symbol", "A1BG");
        assert_eq!(node.attribute("id"), Some(Property::from("HGNC:5")));
        assert_eq!(node.attribute("category"), Some(Property::from("Gene")));
        assert_eq!(node.attribute("symbol"), Some(Property::from("A1BG")));
        assert_eq!(node.attribute("name"), None);
    }

    #[test]
    fn test_to_attributes() {
        let node = gene("HGNC:5").with_property("score", 0.5);
        let attrs = node.to_attributes();
        assert_eq!(attrs["id"], "HGNC:5");
        assert_eq!(attrs["category"], "Gene");
        assert_eq!(attrs["score"], 0.5);
        assert!(!attrs.contains_key("name"));
    }

    #[test]
    fn test_attribute_keys() {
        let node = gene("HGNC:5").with_property("symbol", "A1BG");
        let keys: Vec<_> = node.attribute_keys().into_iter().collect();
        assert_eq!(keys, ["category", "id", "symbol"]);
    }
}
