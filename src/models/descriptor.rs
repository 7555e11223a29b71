//! Filter descriptors for reads against the store.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Property;

/// Pattern element a filter applies to.
///
/// Edge reads use `MATCH (s)-[e]->(o)`; node reads use `MATCH (n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Subject,
    Object,
    Edge,
    Node,
}

impl Location {
    /// Cypher variable bound to this element.
    pub fn variable(&self) -> &'static str {
        match self {
            Location::Subject => "s",
            Location::Object => "o",
            Location::Edge => "e",
            Location::Node => "n",
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Location::Subject => "subject",
            Location::Object => "object",
            Location::Edge => "edge",
            Location::Node => "node",
        };
        f.write_str(name)
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subject" | "Subject" => Ok(Location::Subject),
            "object" | "Object" => Ok(Location::Object),
            "edge" | "Edge" => Ok(Location::Edge),
            "node" | "Node" => Ok(Location::Node),
            _ => Err(format!(
                "Invalid location '{}'. Valid values: subject, object, edge, node",
                s
            )),
        }
    }
}

/// What a descriptor constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Relationship type. Edges only.
    Label,
    /// Node label. Never on edges.
    Category,
    Property,
}

/// Value carried by a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorValue {
    Name(String),
    Property { key: String, value: Property },
}

/// A validated `(location, kind, value)` filter.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    location: Location,
    kind: QueryKind,
    value: DescriptorValue,
}

impl QueryDescriptor {
    /// Validates the combination.
    ///
    /// `Label` is only valid on [`Location::Edge`], `Category` never is, and
    /// `Property` requires a key/value pair while the other kinds take a name.
    pub fn build(
        location: Location,
        kind: QueryKind,
        value: DescriptorValue,
    ) -> Result<Self, AppError> {
        match (kind, location) {
            (QueryKind::Label, loc) if loc != Location::Edge => {
                return Err(AppError::InvalidDescriptor(format!(
                    "label filters only apply to edges, not {}",
                    loc
                )))
            }
            (QueryKind::Category, Location::Edge) => {
                return Err(AppError::InvalidDescriptor(
                    "category filters do not apply to edges".into(),
                ))
            }
            _ => {}
        }

        match (&kind, &value) {
            (QueryKind::Property, DescriptorValue::Property { key, .. }) if key.is_empty() => {
                Err(AppError::InvalidDescriptor("property key is empty".into()))
            }
            (QueryKind::Property, DescriptorValue::Property { .. }) => Ok(()),
            (QueryKind::Property, DescriptorValue::Name(_)) => Err(AppError::InvalidDescriptor(
                "property filters need a key and a value".into(),
            )),
            (_, DescriptorValue::Name(name)) if name.trim().is_empty() => {
                Err(AppError::InvalidDescriptor("label name is empty".into()))
            }
            (_, DescriptorValue::Name(_)) => Ok(()),
            (_, DescriptorValue::Property { .. }) => Err(AppError::InvalidDescriptor(format!(
                "{:?} filters take a name, not a property",
                kind
            ))),
        }?;

        Ok(Self {
            location,
            kind,
            value,
        })
    }

    pub fn label(name: impl Into<String>) -> Result<Self, AppError> {
        Self::build(Location::Edge, QueryKind::Label, DescriptorValue::Name(name.into()))
    }

    pub fn category(location: Location, name: impl Into<String>) -> Result<Self, AppError> {
        Self::build(location, QueryKind::Category, DescriptorValue::Name(name.into()))
    }

    pub fn property(
        location: Location,
        key: impl Into<String>,
        value: impl Into<Property>,
    ) -> Result<Self, AppError> {
        Self::build(
            location,
            QueryKind::Property,
            DescriptorValue::Property {
                key: key.into(),
                value: value.into(),
            },
        )
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn value(&self) -> &DescriptorValue {
        &self.value
    }
}
