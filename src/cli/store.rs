//! Report and purge command handlers.

use color_eyre::Result;

use crate::config::Config;
use crate::graph::backends::neo4j::Neo4jClient;
use crate::repositories::StoreRepository;

async fn connect() -> Result<Neo4jClient> {
    let config = Config::load()?;
    tracing::info!("Connecting to Neo4j at {}", config.neo4j.uri);
    Ok(Neo4jClient::connect(&config.neo4j).await?)
}

/// Print node and relationship totals.
pub(super) async fn run_report() -> Result<()> {
    let client = connect().await?;
    let counts = StoreRepository::new(&client).counts().await?;
    println!("Nodes:         {}", counts.nodes);
    println!("Relationships: {}", counts.relationships);
    Ok(())
}

/// Delete every node carrying `label`.
pub(super) async fn run_purge(label: &str, batch_size: i64) -> Result<()> {
    let client = connect().await?;
    let deleted = StoreRepository::new(&client)
        .delete_by_label(label, batch_size)
        .await?;
    println!("Deleted {} nodes labelled {}", deleted, label);
    Ok(())
}
