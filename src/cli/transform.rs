//! Offline snapshot transforms: merge, link, similarity, remap, rename.

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::Config;
use crate::network::PropertyGraph;
use crate::services::{
    similarity_edges, CanonicalEntityBuilder, InterGraphLinker, LinkTemplate, SimilarityOptions,
};

/// Reads snapshots and merges them left to right.
pub(super) fn load_merged(
    paths: &[PathBuf],
    builder: &CanonicalEntityBuilder,
) -> Result<PropertyGraph> {
    let mut graphs = paths
        .iter()
        .map(|p| PropertyGraph::restore_from_file(p, builder))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter();
    let first = graphs.next().unwrap_or_default();
    let merged = first.merge(graphs);
    tracing::info!(
        files = paths.len(),
        nodes = merged.node_count(),
        edges = merged.edge_count(),
        "Merged snapshots"
    );
    Ok(merged)
}

fn load(path: &Path, builder: &CanonicalEntityBuilder) -> Result<PropertyGraph> {
    Ok(PropertyGraph::restore_from_file(path, builder)?)
}

/// Merge snapshots into one file.
#[derive(Parser)]
pub struct MergeCommand {
    /// Snapshots to merge, left to right (later files win on conflicts)
    #[arg(required = true)]
    pub snapshots: Vec<PathBuf>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,
}

impl MergeCommand {
    pub fn run(self) -> Result<()> {
        let config = Config::load()?;
        let builder = CanonicalEntityBuilder::new(&config.normalize);
        load_merged(&self.snapshots, &builder)?.dump_to_file(&self.output)?;
        Ok(())
    }
}

/// Link a source snapshot to a target snapshot.
#[derive(Parser)]
pub struct LinkCommand {
    pub source: PathBuf,
    pub target: PathBuf,

    /// Source node property holding target identities
    #[arg(long)]
    pub key: String,

    /// Target node property matched against (defaults to the id)
    #[arg(long, default_value = "id")]
    pub target_key: String,

    /// Relationship type of the link edges
    #[arg(long)]
    pub predicate: String,

    /// Display label stored on every link edge
    #[arg(long)]
    pub label: Option<String>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,
}

impl LinkCommand {
    pub fn run(self) -> Result<()> {
        let config = Config::load()?;
        let builder = CanonicalEntityBuilder::new(&config.normalize);
        let source = load(&self.source, &builder)?;
        let target = load(&self.target, &builder)?;

        let mut template = LinkTemplate::new(&self.predicate);
        if let Some(label) = self.label {
            template = template.with_label(label);
        }

        let links = InterGraphLinker::new(&config.normalize).link(
            &source,
            &self.key,
            &target,
            &self.target_key,
            &template,
        )?;
        links.dump_to_file(&self.output)?;
        Ok(())
    }
}

/// Add similarity edges to a snapshot.
#[derive(Parser)]
pub struct SimilarityCommand {
    pub snapshot: PathBuf,

    /// Category of the compared nodes
    #[arg(long)]
    pub category: String,

    /// Multi-valued property holding the compared terms
    #[arg(long)]
    pub key: String,

    /// Minimum Jaccard score for an edge
    #[arg(long, default_value_t = SimilarityOptions::DEFAULT_THRESHOLD)]
    pub threshold: f64,

    #[arg(long, default_value = SimilarityOptions::DEFAULT_PREDICATE)]
    pub predicate: String,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,
}

impl SimilarityCommand {
    pub fn run(self) -> Result<()> {
        let config = Config::load()?;
        let builder = CanonicalEntityBuilder::new(&config.normalize);
        let graph = load(&self.snapshot, &builder)?;

        let mut options = SimilarityOptions::new(&self.category, &self.key);
        options.threshold = self.threshold;
        options.predicate = self.predicate;

        let edges = similarity_edges(&graph, builder.normalizer(), &options);
        graph.merge([edges]).dump_to_file(&self.output)?;
        Ok(())
    }
}

/// Replace node ids of one category.
#[derive(Parser)]
pub struct RemapCommand {
    pub snapshot: PathBuf,

    /// Category whose node ids are replaced
    #[arg(long)]
    pub category: String,

    /// Property holding the new id
    #[arg(long)]
    pub property: String,

    /// Pick the first value containing this prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,
}

impl RemapCommand {
    pub fn run(self) -> Result<()> {
        let config = Config::load()?;
        let builder = CanonicalEntityBuilder::new(&config.normalize);
        let mut graph = load(&self.snapshot, &builder)?;

        let mapping = graph.remap_identifier(
            builder.normalizer(),
            &self.category,
            &self.property,
            self.prefix.as_deref(),
        );
        tracing::info!(remapped = mapping.len(), category = %self.category, "Remapped node ids");

        graph.dump_to_file(&self.output)?;
        Ok(())
    }
}

/// Overwrite one property with another's value on matching nodes or edges.
#[derive(Parser)]
pub struct RenameCommand {
    pub snapshot: PathBuf,

    /// Rewrite nodes of this category
    #[arg(long, conflicts_with = "predicate", required_unless_present = "predicate")]
    pub category: Option<String>,

    /// Rewrite edges of this predicate
    #[arg(long)]
    pub predicate: Option<String>,

    /// Property to overwrite
    #[arg(long)]
    pub property: String,

    /// Property whose value is copied in
    #[arg(long)]
    pub from: String,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,
}

impl RenameCommand {
    pub fn run(self) -> Result<()> {
        let config = Config::load()?;
        let builder = CanonicalEntityBuilder::new(&config.normalize);
        let mut graph = load(&self.snapshot, &builder)?;

        let updated = match (&self.category, &self.predicate) {
            (Some(category), _) => graph.remap_node_property(category, &self.property, &self.from),
            (None, Some(predicate)) => {
                graph.remap_edge_property(predicate, &self.property, &self.from)
            }
            (None, None) => return Err(eyre!("either --category or --predicate is required")),
        };
        tracing::info!(updated, property = %self.property, "Rewrote property");

        graph.dump_to_file(&self.output)?;
        Ok(())
    }
}
