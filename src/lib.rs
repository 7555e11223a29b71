//! sidb-network - biomedical network ingestion
//!
//! Builds canonical property graphs from heterogeneous biomedical sources,
//! merges and links them in memory, and bulk-loads the result into Neo4j
//! through batched, idempotent upserts.

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod models;
pub mod network;
pub mod repositories;
pub mod services;
pub mod sync;
