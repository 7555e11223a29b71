//! Batched synchronization of a [`PropertyGraph`] into the store.
//!
//! A run has three phases, strictly in order:
//!
//! 1. **Constraints**: one transaction creating a uniqueness constraint on
//!    `id` for every label in use.
//! 2. **Nodes**: per category, chunks of `UNWIND $nodes` upserts.
//! 3. **Edges**: per predicate, chunks of `UNWIND $edges` upserts.
//!
//! Each chunk is its own transaction. A run is batch-atomic, not
//! graph-atomic: a failure leaves earlier chunks applied, and the returned
//! [`SyncReport`] says which ones.

mod plan;
mod report;
mod templates;

use std::time::Instant;

use serde_json::Value as JsonValue;

use crate::config::SyncConfig;
use crate::error::AppError;
use crate::graph::{run_in_transaction, CypherExecutor, GraphClient, Params, Transaction};
use crate::network::PropertyGraph;

pub use plan::{
    chunk_ranges, constraint_labels, group_edges, group_nodes, BatchRow, EdgeGroup, NodeGroup,
    RejectedGroup, SyncPlan,
};
pub use report::{BatchRecord, BatchStatus, Phase, SyncReport};
pub use templates::{
    escape_identifier, generate_constraint_query, generate_unwind_edge_query,
    generate_unwind_node_query, label_clause,
};

/// Options for one synchronization run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub chunk_size: usize,
    pub default_label: String,
    pub base_label: String,
    pub stop_on_error: bool,
    /// Skip the node phase.
    pub edges_only: bool,
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            default_label: config.default_label.clone(),
            base_label: config.base_label.clone(),
            stop_on_error: config.stop_on_error,
            edges_only: false,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

/// Writes a graph to the store in idempotent batches.
///
/// ```ignore
/// let client = Neo4jClient::connect(&config.neo4j).await?;
/// let report = GraphSynchronizer::new(&client, SyncOptions::from(&config.sync))
///     .sync(&graph)
///     .await?;
/// ```
pub struct GraphSynchronizer<'a, C: GraphClient> {
    client: &'a C,
    options: SyncOptions,
}

/// Mutable state threaded through one run.
#[derive(Default)]
struct Run {
    report: SyncReport,
    first_error: Option<AppError>,
    stopped: bool,
}

impl Run {
    fn fail(&mut self, phase: Phase, target: &str, range: std::ops::Range<usize>, err: AppError) {
        tracing::error!(%phase, group = target, start = range.start, end = range.end, error = %err, "Batch failed");
        self.report.record(
            phase,
            target,
            range,
            BatchStatus::Failed {
                reason: err.to_string(),
            },
        );
        if self.first_error.is_none() {
            self.first_error = Some(err);
        }
    }
}

impl<'a, C: GraphClient> GraphSynchronizer<'a, C> {
    pub fn new(client: &'a C, options: SyncOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Synchronizes `graph`.
    ///
    /// Identity and schema faults fail only their own batch or predicate
    /// group and are detected before anything is sent. A store failure
    /// stops the run when `stop_on_error` is set; remaining batches are
    /// reported as skipped. Any failure yields
    /// [`AppError::SyncIncomplete`] carrying the full report.
    pub async fn sync(&self, graph: &PropertyGraph) -> Result<SyncReport, AppError> {
        let started = Instant::now();
        let plan = SyncPlan::build(graph, &self.options.default_label, &self.options.base_label);
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            categories = plan.node_groups.len(),
            predicates = plan.edge_groups.len() + plan.rejected.len(),
            "Starting synchronization"
        );

        let mut run = Run::default();

        self.create_constraints(&plan, &mut run).await;

        if run.stopped {
            let err = run
                .first_error
                .take()
                .unwrap_or_else(|| AppError::Internal("constraint phase failed".into()));
            return Err(AppError::SyncIncomplete {
                report: Box::new(run.report),
                source: Box::new(err),
            });
        }

        if self.options.edges_only {
            tracing::info!("Edges-only run; skipping node phase");
        } else {
            for group in &plan.node_groups {
                self.write_nodes(group, &mut run).await;
            }
        }

        for rejected in plan.rejected {
            run.fail(Phase::Edges, &rejected.predicate, 0..rejected.size, rejected.error);
        }
        for group in &plan.edge_groups {
            self.write_edges(group, &mut run).await;
        }

        tracing::info!(
            batches = run.report.len(),
            failed = run.report.failed_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Synchronization finished"
        );

        match run.first_error {
            None => Ok(run.report),
            Some(err) => Err(AppError::SyncIncomplete {
                report: Box::new(run.report),
                source: Box::new(err),
            }),
        }
    }

    async fn create_constraints(&self, plan: &SyncPlan, run: &mut Run) {
        let labels = &plan.constraint_labels;
        let range = 0..labels.len();
        let started = Instant::now();

        let result = self.run_constraints(labels).await;

        match result {
            Ok(()) => {
                tracing::info!(count = labels.len(), "Constraints in place");
                run.report.record(
                    Phase::Constraints,
                    "*",
                    range,
                    BatchStatus::Succeeded {
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    },
                );
            }
            Err(err) => {
                run.fail(Phase::Constraints, "*", range, err);
                run.stopped = true;
            }
        }
    }

    async fn run_constraints(
        &self,
        labels: &std::collections::BTreeSet<String>,
    ) -> Result<(), AppError> {
        let txn = self.client.begin().await?;
        for label in labels {
            let query = generate_constraint_query(label);
            tracing::debug!(%query, "Creating constraint");
            if let Err(err) = txn.run_cypher(&query, Params::new()).await {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback of constraint phase failed");
                }
                return Err(err);
            }
        }
        txn.commit().await
    }

    async fn write_nodes(&self, group: &NodeGroup, run: &mut Run) {
        let query =
            generate_unwind_node_query(&self.options.base_label, &group.label, &group.keys);
        tracing::debug!(label = %group.label, %query, "Node upsert template");

        for range in chunk_ranges(group.rows.len(), self.options.chunk_size) {
            let rows = &group.rows[range.clone()];
            if let Err(err) = plan::check_identity(rows, &["id"], &format!("node in {}", group.label)) {
                run.fail(Phase::Nodes, &group.label, range, err);
                continue;
            }
            self.write_batch(Phase::Nodes, &group.label, &query, "nodes", rows, range, run)
                .await;
        }
    }

    async fn write_edges(&self, group: &EdgeGroup, run: &mut Run) {
        let query = generate_unwind_edge_query(
            &group.predicate,
            &group.subject_label,
            &group.object_label,
            &self.options.default_label,
            &group.keys,
        );
        tracing::debug!(predicate = %group.predicate, %query, "Edge upsert template");

        for range in chunk_ranges(group.rows.len(), self.options.chunk_size) {
            let rows = &group.rows[range.clone()];
            let entity = format!("edge of {}", group.predicate);
            if let Err(err) = plan::check_identity(rows, &["subject", "object"], &entity) {
                run.fail(Phase::Edges, &group.predicate, range, err);
                continue;
            }
            self.write_batch(Phase::Edges, &group.predicate, &query, "edges", rows, range, run)
                .await;
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_batch(
        &self,
        phase: Phase,
        target: &str,
        query: &str,
        param: &str,
        rows: &[BatchRow],
        range: std::ops::Range<usize>,
        run: &mut Run,
    ) {
        if run.stopped {
            run.report.record(phase, target, range, BatchStatus::Skipped);
            return;
        }

        let mut params = Params::new();
        params.insert(
            param.to_string(),
            JsonValue::Array(rows.iter().cloned().map(JsonValue::Object).collect()),
        );

        let started = Instant::now();
        match run_in_transaction(self.client, query, params).await {
            Ok(()) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                tracing::info!(
                    %phase,
                    group = target,
                    start = range.start,
                    end = range.end,
                    elapsed_ms,
                    "Saved batch"
                );
                run.report
                    .record(phase, target, range, BatchStatus::Succeeded { elapsed_ms });
            }
            Err(err) => {
                let transport = err.is_transport();
                run.fail(phase, target, range, err);
                if transport && self.options.stop_on_error {
                    tracing::warn!("Stopping after store failure; remaining batches are skipped");
                    run.stopped = true;
                }
            }
        }
    }
}
