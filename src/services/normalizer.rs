//! Flattening of raw source values into storable properties.
//!
//! Every component that needs a storable value goes through
//! [`AttributeNormalizer`]; nothing else flattens lists or drops mappings.

use std::collections::BTreeMap;

use crate::config::NormalizeConfig;
use crate::models::{Property, RawRecord, RawValue};

/// Turns raw values into atomic [`Property`] values.
///
/// Rules, per value:
/// - nested mapping: dropped
/// - null or empty list: the placeholder
/// - list of lists: descend through the first element to the innermost list
/// - list starting with a mapping: empty string
/// - single element: unwrapped, keeping its type
/// - several elements: string forms joined with the separator
#[derive(Debug, Clone)]
pub struct AttributeNormalizer {
    separator: String,
    placeholder: String,
}

impl Default for AttributeNormalizer {
    fn default() -> Self {
        Self::new(&NormalizeConfig::default())
    }
}

impl AttributeNormalizer {
    pub fn new(config: &NormalizeConfig) -> Self {
        Self {
            separator: config.separator.clone(),
            placeholder: config.placeholder.clone(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Normalizes one value. `None` means the key must be dropped.
    pub fn normalize(&self, value: &RawValue) -> Option<Property> {
        match value {
            RawValue::Nested(_) => None,
            RawValue::Null => Some(self.placeholder_value()),
            RawValue::Scalar(p) => Some(p.clone()),
            RawValue::List(items) => Some(self.flatten(items)),
        }
    }

    /// Normalizes every key of a record, in key order.
    pub fn normalize_record(&self, record: &RawRecord) -> BTreeMap<String, Property> {
        record
            .iter()
            .filter_map(|(key, value)| self.normalize(value).map(|p| (key.clone(), p)))
            .collect()
    }

    /// Splits a stored value back into its parts.
    ///
    /// Blank parts are discarded; non-string values yield their string form.
    pub fn split_values(&self, value: &Property) -> Vec<String> {
        let text = value.to_string();
        if self.separator.is_empty() {
            return vec![text];
        }
        text.split(self.separator.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Like [`split_values`](Self::split_values) on the normalized form of a raw value.
    pub fn raw_values(&self, value: &RawValue) -> Vec<String> {
        self.normalize(value)
            .map(|p| self.split_values(&p))
            .unwrap_or_default()
    }

    fn flatten(&self, items: &[RawValue]) -> Property {
        let mut items = items;
        while let Some(RawValue::List(inner)) = items.first() {
            items = inner;
        }

        match items {
            [] => self.placeholder_value(),
            [RawValue::Nested(_), ..] => Property::Str(String::new()),
            [RawValue::Scalar(p)] => p.clone(),
            [_] => self.placeholder_value(),
            _ => Property::Str(
                items
                    .iter()
                    .filter_map(|item| self.element_text(item))
                    .collect::<Vec<_>>()
                    .join(&self.separator),
            ),
        }
    }

    fn element_text(&self, item: &RawValue) -> Option<String> {
        match item {
            RawValue::Null => Some(self.placeholder.clone()),
            RawValue::Scalar(p) => Some(p.to_string()),
            RawValue::List(inner) => Some(self.flatten(inner).to_string()),
            RawValue::Nested(_) => None,
        }
    }

    fn placeholder_value(&self) -> Property {
        Property::Str(self.placeholder.clone())
    }
}
