//! Sync command handler.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;

use crate::config::Config;
use crate::error::AppError;
use crate::graph::backends::neo4j::Neo4jClient;
use crate::graph::backends::recording::RecordingClient;
use crate::graph::GraphClient;
use crate::repositories::StoreRepository;
use crate::services::CanonicalEntityBuilder;
use crate::sync::{GraphSynchronizer, SyncOptions, SyncReport};

use super::transform::load_merged;

/// Synchronize node-link snapshots into the store.
#[derive(Parser)]
pub struct SyncCommand {
    /// Snapshots to merge, left to right (later files win on conflicts)
    #[arg(required = true)]
    pub snapshots: Vec<PathBuf>,

    /// Skip the node phase
    #[arg(long)]
    pub edges_only: bool,

    /// Record statements instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Rows per batch statement (overrides configuration)
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

impl SyncCommand {
    /// Run the sync command.
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;
        let builder = CanonicalEntityBuilder::new(&config.normalize);
        let graph = load_merged(&self.snapshots, &builder)?;

        let mut options = SyncOptions::from(&config.sync);
        options.edges_only = self.edges_only;
        if let Some(chunk_size) = self.chunk_size {
            options.chunk_size = chunk_size;
        }

        if self.dry_run {
            let client = RecordingClient::new();
            let report = sync_with(&client, options, &graph).await?;
            for statement in client.statements() {
                let rows = statement
                    .batch_len("nodes")
                    .or_else(|| statement.batch_len("edges"))
                    .unwrap_or(0);
                println!("{}  -- {} rows", statement.cypher, rows);
            }
            println!("{} batches planned", report.len());
            return Ok(());
        }

        tracing::info!("Connecting to Neo4j at {}", config.neo4j.uri);
        let client = Neo4jClient::connect(&config.neo4j).await?;
        let report = sync_with(&client, options, &graph).await?;
        tracing::info!("{} batches written", report.len());

        let counts = StoreRepository::new(&client).counts().await?;
        println!(
            "Store now holds {} nodes and {} relationships",
            counts.nodes, counts.relationships
        );
        Ok(())
    }
}

async fn sync_with<C: GraphClient>(
    client: &C,
    options: SyncOptions,
    graph: &crate::network::PropertyGraph,
) -> Result<SyncReport> {
    match GraphSynchronizer::new(client, options).sync(graph).await {
        Ok(report) => Ok(report),
        Err(AppError::SyncIncomplete { report, source }) => {
            eprint!("{}", report);
            Err(color_eyre::eyre::eyre!(
                "{} of {} batches failed; first failure: {}",
                report.failed_count(),
                report.len(),
                source
            ))
        }
        Err(err) => Err(err.into()),
    }
}
