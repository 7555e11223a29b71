//! Statement templates for batch upserts.
//!
//! Pure functions of their inputs, so every statement the synchronizer
//! can send is testable without a database.

use std::collections::BTreeSet;

use crate::models::EDGE_IDENTITY_FIELDS;

/// Quotes an identifier with backticks unless it is a plain word.
pub fn escape_identifier(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// `"A:B"` to `` A:`B C` ``, escaping each label.
pub fn label_clause(label: &str) -> String {
    label
        .split(':')
        .filter(|l| !l.is_empty())
        .map(escape_identifier)
        .collect::<Vec<_>>()
        .join(":")
}

/// Idempotent uniqueness constraint on `id` for one label.
pub fn generate_constraint_query(label: &str) -> String {
    format!(
        "CREATE CONSTRAINT IF NOT EXISTS FOR (n:{}) REQUIRE n.id IS UNIQUE",
        escape_identifier(label)
    )
}

/// Bulk node upsert over `$nodes`.
///
/// Nodes are merged on `base_label` by `id`, then `label` is attached and
/// every other key is set from the row. `category` is never set as a
/// property.
pub fn generate_unwind_node_query(
    base_label: &str,
    label: &str,
    property_keys: &BTreeSet<String>,
) -> String {
    let mut assignments = vec![format!("n:{}", label_clause(label))];
    assignments.extend(
        property_keys
            .iter()
            .filter(|k| k.as_str() != "id" && k.as_str() != "category")
            .map(|k| {
                let k = escape_identifier(k);
                format!("n.{k} = node.{k}")
            }),
    );

    format!(
        "UNWIND $nodes AS node MERGE (n:{} {{id: node.id}}) SET {}",
        label_clause(base_label),
        assignments.join(", ")
    )
}

/// Bulk relationship upsert over `$edges`.
///
/// Both endpoints are matched by label and `id`; an empty label falls back
/// to `default_label`. Identity keys only parameterize the match. The `SET`
/// clause is omitted when nothing else is left.
pub fn generate_unwind_edge_query(
    predicate: &str,
    subject_label: &str,
    object_label: &str,
    default_label: &str,
    property_keys: &BTreeSet<String>,
) -> String {
    let or_default = |label: &str| {
        if label.is_empty() {
            label_clause(default_label)
        } else {
            label_clause(label)
        }
    };

    let assignments: Vec<String> = property_keys
        .iter()
        .filter(|k| !EDGE_IDENTITY_FIELDS.contains(&k.as_str()))
        .map(|k| {
            let k = escape_identifier(k);
            format!("r.{k} = edge.{k}")
        })
        .collect();

    let mut query = format!(
        "UNWIND $edges AS edge \
         MATCH (s:{} {{id: edge.subject}}), (o:{} {{id: edge.object}}) \
         MERGE (s)-[r:{}]->(o)",
        or_default(subject_label),
        or_default(object_label),
        escape_identifier(predicate)
    );
    if !assignments.is_empty() {
        query.push_str(" SET ");
        query.push_str(&assignments.join(", "));
    }
    query
}
