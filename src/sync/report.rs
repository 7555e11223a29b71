//! Per-batch outcome of a synchronization run.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Constraints,
    Nodes,
    Edges,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Constraints => "constraints",
            Phase::Nodes => "nodes",
            Phase::Edges => "edges",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchStatus {
    Succeeded { elapsed_ms: u64 },
    Failed { reason: String },
    /// Not attempted because the run stopped early.
    Skipped,
}

/// One write batch: a category or predicate and the rows it covered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRecord {
    pub phase: Phase,
    /// Label key for nodes, predicate for edges.
    pub target: String,
    pub range: Range<usize>,
    #[serde(flatten)]
    pub status: BatchStatus,
}

impl BatchRecord {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, BatchStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub batches: Vec<BatchRecord>,
}

impl SyncReport {
    pub fn record(&mut self, phase: Phase, target: &str, range: Range<usize>, status: BatchStatus) {
        self.batches.push(BatchRecord {
            phase,
            target: target.to_string(),
            range,
            status,
        });
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.batches.iter().filter(|b| b.is_failed()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchRecord> {
        self.batches.iter().filter(|b| b.is_failed())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &BatchRecord> {
        self.batches
            .iter()
            .filter(|b| matches!(b.status, BatchStatus::Succeeded { .. }))
    }

    /// Rows written across successful batches of `phase`.
    pub fn rows_written(&self, phase: Phase) -> usize {
        self.succeeded()
            .filter(|b| b.phase == phase)
            .map(|b| b.range.len())
            .sum()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for batch in &self.batches {
            let status = match &batch.status {
                BatchStatus::Succeeded { elapsed_ms } => format!("ok ({} ms)", elapsed_ms),
                BatchStatus::Failed { reason } => format!("FAILED: {}", reason),
                BatchStatus::Skipped => "skipped".to_string(),
            };
            writeln!(
                f,
                "{:<11} {:<30} [{}..{}) {}",
                batch.phase, batch.target, batch.range.start, batch.range.end, status
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut report = SyncReport::default();
        report.record(Phase::Nodes, "Gene", 0..1000, BatchStatus::Succeeded { elapsed_ms: 5 });
        report.record(Phase::Nodes, "Gene", 1000..1500, BatchStatus::Succeeded { elapsed_ms: 3 });
        report.record(
            Phase::Edges,
            "rel",
            0..10,
            BatchStatus::Failed {
                reason: "boom".into(),
            },
        );
        report.record(Phase::Edges, "rel2", 0..3, BatchStatus::Skipped);

        assert_eq!(report.len(), 4);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.succeeded().count(), 2);
        assert_eq!(report.rows_written(Phase::Nodes), 1500);
        assert_eq!(report.rows_written(Phase::Edges), 0);
    }

    #[test]
    fn test_display_lists_batches() {
        let mut report = SyncReport::default();
        report.record(Phase::Nodes, "Gene", 0..2, BatchStatus::Skipped);
        let text = report.to_string();
        assert!(text.contains("nodes"));
        assert!(text.contains("[0..2) skipped"));
    }
}
