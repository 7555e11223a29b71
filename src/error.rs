//! Application error types.

use thiserror::Error;

use crate::sync::SyncReport;

/// Application-level errors for the network pipeline.
#[derive(Error, Debug)]
pub enum AppError {
    // Model errors
    #[error("Identity error: {entity} is missing required field '{field}'")]
    Identity { entity: String, field: String },

    #[error(
        "Schema mismatch for predicate '{predicate}': expected ({expected_subject})-->({expected_object}), \
         found ({found_subject})-->({found_object})"
    )]
    SchemaMismatch {
        predicate: String,
        expected_subject: String,
        expected_object: String,
        found_subject: String,
        found_object: String,
    },

    #[error("Edge {subject} -[{predicate}]-> {object} references a node that is not in the graph")]
    DanglingEdge {
        subject: String,
        object: String,
        predicate: String,
    },

    #[error("Invalid query descriptor: {0}")]
    InvalidDescriptor(String),

    // Neo4j errors
    #[error("Neo4j connection error: {0}")]
    Connection(#[from] neo4rs::Error),

    #[error("Neo4j query error: {message}")]
    Query { message: String, query: String },

    // Sync errors
    #[error("Sync incomplete: {} of {} batches failed", .report.failed_count(), .report.len())]
    SyncIncomplete {
        report: Box<SyncReport>,
        #[source]
        source: Box<AppError>,
    },

    // IO errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a missing identity field.
    pub fn identity(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Identity {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Returns true for failures raised by the remote store.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Query { .. })
    }
}
