//! Reads and maintenance against the synchronized store.

use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;
use crate::graph::{CypherExecutor, QueryExt, Row};
use crate::repositories::FilterSet;
use crate::sync::label_clause;

/// Nodes removed per `DETACH DELETE` round.
pub const DELETE_BATCH_SIZE: i64 = 30000;

/// Node and relationship totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub nodes: i64,
    pub relationships: i64,
}

/// A node as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    pub labels: Vec<String>,
    pub properties: Map<String, JsonValue>,
}

/// A relationship as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEdge {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub properties: Map<String, JsonValue>,
}

/// Repository for whole-store queries.
pub struct StoreRepository<'a, E: CypherExecutor> {
    executor: &'a E,
}

impl<'a, E: CypherExecutor> StoreRepository<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Counts every node and every relationship.
    pub async fn counts(&self) -> Result<StoreCounts, AppError> {
        let nodes = self
            .count("MATCH (n) RETURN count(n) AS total")
            .await?;
        let relationships = self
            .count("MATCH ()-[r]->() RETURN count(r) AS total")
            .await?;

        let counts = StoreCounts {
            nodes,
            relationships,
        };
        tracing::info!(nodes, relationships, "Store totals");
        Ok(counts)
    }

    /// Deletes every node carrying `label`, in rounds of `batch_size`.
    ///
    /// Meant for development databases. Returns the number of nodes deleted.
    pub async fn delete_by_label(&self, label: &str, batch_size: i64) -> Result<i64, AppError> {
        let batch_size = batch_size.max(1);
        let query = format!(
            "MATCH (n:{}) WITH n LIMIT $limit DETACH DELETE n RETURN count(*) AS deleted",
            label_clause(label)
        );

        let mut total = 0;
        loop {
            let deleted: i64 = match crate::cypher!(self.executor, &query, limit = batch_size)
                .fetch_one()
                .await?
            {
                Some(row) => row.get("deleted")?,
                None => 0,
            };
            total += deleted;
            tracing::info!(%label, deleted, total, "Deleted batch");
            if deleted < batch_size {
                break;
            }
        }
        Ok(total)
    }

    /// Nodes matching `filters`, at most `limit`.
    pub async fn fetch_nodes(
        &self,
        filters: &FilterSet,
        limit: i64,
    ) -> Result<Vec<StoredNode>, AppError> {
        let (pattern, params) = filters.node_pattern();
        let query = format!(
            "{} RETURN labels(n) AS labels, properties(n) AS props LIMIT $limit",
            pattern
        );

        self.executor
            .query(&query)
            .params(params)
            .param("limit", limit)?
            .fetch_all()
            .await?
            .iter()
            .map(|row| {
                Ok(StoredNode {
                    labels: row.get("labels")?,
                    properties: props(row)?,
                })
            })
            .collect()
    }

    /// Relationships matching `filters`, at most `limit`.
    pub async fn fetch_edges(
        &self,
        filters: &FilterSet,
        limit: i64,
    ) -> Result<Vec<StoredEdge>, AppError> {
        let (pattern, params) = filters.edge_pattern();
        let query = format!(
            "{} RETURN s.id AS subject, type(e) AS predicate, o.id AS object, \
             properties(e) AS props LIMIT $limit",
            pattern
        );

        self.executor
            .query(&query)
            .params(params)
            .param("limit", limit)?
            .fetch_all()
            .await?
            .iter()
            .map(|row| {
                Ok(StoredEdge {
                    subject: row.get("subject")?,
                    predicate: row.get("predicate")?,
                    object: row.get("object")?,
                    properties: props(row)?,
                })
            })
            .collect()
    }

    async fn count(&self, query: &str) -> Result<i64, AppError> {
        match self.executor.query(query).fetch_one().await? {
            Some(row) => row.get("total"),
            None => Ok(0),
        }
    }
}

fn props(row: &Row) -> Result<Map<String, JsonValue>, AppError> {
    Ok(row.get_opt("props")?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::backends::recording::RecordingClient;
    use crate::models::{Location, QueryDescriptor};
    use serde_json::json;
    use std::collections::HashMap;

    fn row(value: JsonValue) -> Row {
        let data: HashMap<String, JsonValue> = serde_json::from_value(value).unwrap();
        Row::new(data)
    }

    #[tokio::test]
    async fn test_counts() {
        let client = RecordingClient::new()
            .with_rows("count(n)", vec![row(json!({"total": 12}))])
            .with_rows("count(r)", vec![row(json!({"total": 7}))]);

        let counts = StoreRepository::new(&client).counts().await.unwrap();
        assert_eq!(
            counts,
            StoreCounts {
                nodes: 12,
                relationships: 7
            }
        );
    }

    #[tokio::test]
    async fn test_delete_by_label_stops_on_short_batch() {
        let client =
            RecordingClient::new().with_rows("DETACH DELETE", vec![row(json!({"deleted": 5}))]);

        let deleted = StoreRepository::new(&client)
            .delete_by_label("Patient", DELETE_BATCH_SIZE)
            .await
            .unwrap();

        assert_eq!(deleted, 5);
        let statements = client.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].cypher.starts_with("MATCH (n:Patient)"));
        assert_eq!(statements[0].params["limit"], json!(30000));
    }

    #[tokio::test]
    async fn test_fetch_edges() {
        let client = RecordingClient::new().with_rows(
            "type(e)",
            vec![row(json!({
                "subject": "P1",
                "predicate": "Shared_HP_terms",
                "object": "P2",
                "props": {"weight": 0.5}
            }))],
        );
        let filters = FilterSet::new([QueryDescriptor::label("Shared_HP_terms").unwrap()]);

        let edges = StoreRepository::new(&client)
            .fetch_edges(&filters, 10)
            .await
            .unwrap();

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].subject, "P1");
        assert_eq!(edges[0].properties["weight"], json!(0.5));
        assert!(client.statements()[0]
            .cypher
            .starts_with("MATCH (s)-[e:Shared_HP_terms]->(o)"));
    }

    #[tokio::test]
    async fn test_fetch_nodes() {
        let client = RecordingClient::new().with_rows(
            "labels(n)",
            vec![row(json!({"labels": ["Node", "Gene"], "props": {"id": "G1"}}))],
        );
        let filters =
            FilterSet::new([QueryDescriptor::property(Location::Node, "id", "G1").unwrap()]);

        let nodes = StoreRepository::new(&client)
            .fetch_nodes(&filters, 1)
            .await
            .unwrap();

        assert_eq!(nodes[0].labels, ["Node", "Gene"]);
        assert_eq!(client.statements()[0].params["n_0"], json!("G1"));
    }
}
