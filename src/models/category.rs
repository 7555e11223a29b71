//! Node categories, stored as graph-database labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One or more labels, in source order.
///
/// A category is written to the store as `:A:B`. Its string form
/// (`"A:B"`) is the grouping key used by the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "CategoryRepr", into = "CategoryRepr")]
pub struct Category(Vec<String>);

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CategoryRepr {
    One(String),
    Many(Vec<String>),
}

impl Category {
    /// Builds a category from labels, dropping blanks. `None` when nothing is left.
    pub fn from_labels<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .flat_map(|l| {
                l.as_ref()
                    .split(':')
                    .map(|s| s.trim().to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|l| !l.is_empty())
            .collect();
        if labels.is_empty() {
            None
        } else {
            Some(Self(labels))
        }
    }

    /// Parses `"A:B"` or a separator-joined list such as `"A;B"`.
    pub fn parse(value: &str, separator: &str) -> Option<Self> {
        if separator.is_empty() {
            return Self::from_labels([value]);
        }
        Self::from_labels(value.split(separator))
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }

    /// `"A:B"`, the grouping key and the label clause body.
    pub fn label_key(&self) -> String {
        self.0.join(":")
    }

    /// True if `filter` names the whole category or one of its labels.
    pub fn matches(&self, filter: &str) -> bool {
        self.label_key() == filter || self.0.iter().any(|l| l == filter)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label_key())
    }
}

impl TryFrom<CategoryRepr> for Category {
    type Error = String;

    fn try_from(repr: CategoryRepr) -> Result<Self, Self::Error> {
        let parsed = match repr {
            CategoryRepr::One(s) => Category::from_labels([s]),
            CategoryRepr::Many(v) => Category::from_labels(v),
        };
        parsed.ok_or_else(|| "category has no labels".to_string())
    }
}

impl From<Category> for CategoryRepr {
    fn from(category: Category) -> Self {
        match <[String; 1]>::try_from(category.0) {
            Ok([single]) => CategoryRepr::One(single),
            Err(many) => CategoryRepr::Many(many),
        }
    }
}
