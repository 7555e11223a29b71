//! CLI module for sidb-network.
//!
//! Subcommands:
//! - `sync`: Merge snapshots and synchronize them into Neo4j
//! - `merge`, `link`, `similarity`, `remap`, `rename`: Offline snapshot transforms
//! - `report`: Print store totals
//! - `purge`: Delete every node with a label (development only)

mod store;
mod sync;
mod transform;

use clap::{Parser, Subcommand};

pub use sync::SyncCommand;
pub use transform::{LinkCommand, MergeCommand, RemapCommand, RenameCommand, SimilarityCommand};

/// sidb-network - biomedical network ingestion
#[derive(Parser)]
#[command(name = "sidb-network")]
#[command(about = "Build, merge and bulk-load biomedical property graphs into Neo4j")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge node-link snapshots left to right and synchronize the result
    Sync(SyncCommand),

    /// Merge node-link snapshots left to right into one file
    Merge(MergeCommand),

    /// Link two snapshots through a foreign-key property
    Link(LinkCommand),

    /// Add Jaccard similarity edges between nodes of one category
    Similarity(SimilarityCommand),

    /// Replace node ids of one category with another property's value
    Remap(RemapCommand),

    /// Overwrite a node or edge property with another property's value
    Rename(RenameCommand),

    /// Print node and relationship totals of the store
    Report,

    /// Delete every node carrying a label
    Purge {
        /// Label to delete
        #[arg(long)]
        label: String,

        /// Nodes deleted per round
        #[arg(long, default_value_t = crate::repositories::DELETE_BATCH_SIZE)]
        batch_size: i64,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Sync(cmd) => cmd.run().await,
            Command::Merge(cmd) => cmd.run(),
            Command::Link(cmd) => cmd.run(),
            Command::Similarity(cmd) => cmd.run(),
            Command::Remap(cmd) => cmd.run(),
            Command::Rename(cmd) => cmd.run(),
            Command::Report => store::run_report().await,
            Command::Purge { ref label, batch_size } => store::run_purge(label, batch_size).await,
        }
    }
}
