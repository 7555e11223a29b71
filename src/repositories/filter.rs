//! Translation of query descriptors into `MATCH` patterns.

use std::collections::BTreeMap;

use crate::graph::Params;
use crate::models::{DescriptorValue, Location, Property, QueryDescriptor, QueryKind};
use crate::sync::{escape_identifier, label_clause};

/// Descriptors grouped by pattern element.
///
/// Labels and categories are inlined into the pattern (escaped); property
/// values are always passed as parameters.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    labels: BTreeMap<Location, Vec<String>>,
    properties: BTreeMap<Location, Vec<(String, Property)>>,
}

impl FilterSet {
    pub fn new(descriptors: impl IntoIterator<Item = QueryDescriptor>) -> Self {
        let mut set = Self::default();
        for descriptor in descriptors {
            set.push(descriptor);
        }
        set
    }

    pub fn push(&mut self, descriptor: QueryDescriptor) {
        let location = descriptor.location();
        match (descriptor.kind(), descriptor.value().clone()) {
            (QueryKind::Property, DescriptorValue::Property { key, value }) => {
                self.properties.entry(location).or_default().push((key, value));
            }
            (_, DescriptorValue::Name(name)) => {
                self.labels.entry(location).or_default().push(name);
            }
            // Rejected by QueryDescriptor::build.
            (_, DescriptorValue::Property { .. }) => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.properties.is_empty()
    }

    /// `MATCH (n...)` for node reads.
    pub fn node_pattern(&self) -> (String, Params) {
        let mut params = Params::new();
        let node = self.element(Location::Node, &mut params);
        (format!("MATCH (n{})", node), params)
    }

    /// `MATCH (s...)-[e...]->(o...)` for edge reads.
    pub fn edge_pattern(&self) -> (String, Params) {
        let mut params = Params::new();
        let subject = self.element(Location::Subject, &mut params);
        let edge = self.element(Location::Edge, &mut params);
        let object = self.element(Location::Object, &mut params);
        (
            format!("MATCH (s{})-[e{}]->(o{})", subject, edge, object),
            params,
        )
    }

    /// Label and property clause of one element, e.g. `:Gene {symbol: $n_0}`.
    fn element(&self, location: Location, params: &mut Params) -> String {
        let mut fragment = String::new();

        if let Some(labels) = self.labels.get(&location) {
            if location == Location::Edge {
                let types: Vec<_> = labels.iter().map(|l| escape_identifier(l)).collect();
                fragment.push(':');
                fragment.push_str(&types.join("|"));
            } else {
                for label in labels {
                    fragment.push(':');
                    fragment.push_str(&label_clause(label));
                }
            }
        }

        if let Some(properties) = self.properties.get(&location) {
            let var = location.variable();
            let pairs: Vec<String> = properties
                .iter()
                .enumerate()
                .map(|(i, (key, value))| {
                    let name = format!("{}_{}", var, i);
                    params.insert(name.clone(), value.to_json());
                    format!("{}: ${}", escape_identifier(key), name)
                })
                .collect();
            fragment.push_str(&format!(" {{{}}}", pairs.join(", ")));
        }

        fragment
    }
}
