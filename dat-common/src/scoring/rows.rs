//! Per-row scoring with failure isolation
//!
//! Every in-scope row is scored independently on a bounded worker pool.
//! Whatever happens inside the engine for one row (an error, a panic, a
//! timeout) ends up as that row's [`ScoreOutcome::Failure`]; the remaining
//! rows are still scored. Results are reassembled in original row order.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{ScoreOutcome, Scorer};
use crate::table::{cell, Row, UploadedTable};

/// Bounds on a single scoring computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringLimits {
    /// Rows scored concurrently
    pub workers: usize,
    /// Maximum time for one row
    pub row_timeout: Duration,
    /// Rows not started before this much time has passed are failed
    pub compute_deadline: Duration,
}

impl Default for ScoringLimits {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            row_timeout: Duration::from_secs(30),
            compute_deadline: Duration::from_secs(300),
        }
    }
}

/// Words of one row: cells at `indices` in selection order
///
/// Positions beyond the row's length and cells that are blank after trimming
/// are left out. Kept cells are passed on untrimmed.
pub fn row_words(row: &[String], indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .filter_map(|&index| cell(row, index))
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Scores table rows through an injected [`Scorer`]
///
/// Clones share one pool of `workers` engine permits. A permit is held by
/// the blocking task itself, so a row that timed out keeps its slot until
/// the engine returns.
#[derive(Clone)]
pub struct RowScorer {
    scorer: Arc<dyn Scorer>,
    limits: ScoringLimits,
    permits: Arc<Semaphore>,
}

impl RowScorer {
    pub fn new(scorer: Arc<dyn Scorer>, limits: ScoringLimits) -> Self {
        Self {
            scorer,
            limits,
            permits: Arc::new(Semaphore::new(limits.workers.max(1))),
        }
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    pub fn limits(&self) -> ScoringLimits {
        self.limits
    }

    /// Score one row on the calling thread
    pub fn score_row(&self, row: &Row, indices: &[usize], minimum: usize) -> ScoreOutcome {
        let words = row_words(row, indices);
        ScoreOutcome::from(self.scorer.score(&words, minimum))
    }

    /// Score `table.rows[first..]`, one outcome per row in row order
    pub async fn score_rows(
        &self,
        table: Arc<UploadedTable>,
        first: usize,
        indices: Arc<[usize]>,
        minimum: usize,
    ) -> Vec<ScoreOutcome> {
        let first = first.min(table.rows.len());
        let deadline = Instant::now() + self.limits.compute_deadline;
        let row_timeout = self.limits.row_timeout;

        let mut results: Vec<(usize, ScoreOutcome)> = stream::iter(first..table.rows.len())
            .map(|index| {
                let table = Arc::clone(&table);
                let indices = Arc::clone(&indices);
                let scorer = self.clone();

                async move {
                    if Instant::now() >= deadline {
                        return (
                            index,
                            ScoreOutcome::Failure("processing deadline exceeded".to_string()),
                        );
                    }

                    let permits = Arc::clone(&scorer.permits);
                    let task = async move {
                        let permit = permits
                            .acquire_owned()
                            .await
                            .map_err(|_| "scoring pool closed".to_string())?;
                        tokio::task::spawn_blocking(move || {
                            let _permit = permit;
                            scorer.score_row(&table.rows[index], &indices, minimum)
                        })
                        .await
                        .map_err(join_failure)
                    };

                    let outcome = match tokio::time::timeout(row_timeout, task).await {
                        Ok(Ok(outcome)) => outcome,
                        Ok(Err(reason)) => ScoreOutcome::Failure(reason),
                        Err(_) => ScoreOutcome::Failure(format!(
                            "scoring timed out after {:?}",
                            row_timeout
                        )),
                    };

                    if let ScoreOutcome::Failure(reason) = &outcome {
                        warn!(row = index, reason = %reason, "Row scoring failed");
                    } else {
                        debug!(row = index, outcome = %outcome, "Row scored");
                    }

                    (index, outcome)
                }
            })
            .buffer_unordered(self.limits.workers.max(1))
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

/// Failure reason for a scoring task that did not return normally
fn join_failure(error: JoinError) -> String {
    if !error.is_panic() {
        return "scoring task was cancelled".to_string();
    }
    let payload = error.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("scoring engine panicked: {}", message)
}
