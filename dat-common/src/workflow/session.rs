//! Workflow session state machine
//!
//! States: `Uploaded → (Previewing ⇄ Uploaded)* → Scored`. The absence of a
//! session for a token is the implicit `Empty` state. Every request-level
//! check runs before any output is produced, so a failed request never leaves
//! a partial artifact behind.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::{SessionStorage, SessionToken};
use crate::artifact::{OutputTable, ScoreReport};
use crate::columns::{resolve_columns, ColumnSelection};
use crate::scoring::RowScorer;
use crate::table::{TablePreview, UploadedTable};
use crate::{Error, Result};

/// Workflow state of a live session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkflowPhase {
    /// Table stored, initial preview shown
    Uploaded,
    /// Skip count adjusted at least once since the last upload or computation
    Previewing,
    /// An artifact is available for download
    Scored,
}

/// Bookkeeping for the stored artifact
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub total_rows: usize,
    pub skipped_rows: usize,
    pub scored_rows: usize,
    pub failed_rows: usize,
    pub computed_at: DateTime<Utc>,
}

/// Server-held state of one client interaction
#[derive(Debug)]
pub struct WorkflowSession {
    token: SessionToken,
    phase: WorkflowPhase,
    header: Vec<String>,
    skip_count: usize,
    storage: SessionStorage,
    artifact: Option<ArtifactSummary>,
    created_at: DateTime<Utc>,
    last_access: Instant,
}

impl WorkflowSession {
    /// BeginUpload: parse, persist, and return the initial preview
    ///
    /// Parsing happens before any storage is created, so an invalid upload
    /// leaves nothing behind.
    pub async fn begin_upload(
        token: SessionToken,
        bytes: &[u8],
        skip_count: usize,
        storage_root: &Path,
    ) -> Result<(Self, TablePreview)> {
        let table = UploadedTable::parse(bytes)?;

        let storage = SessionStorage::create(storage_root, token)?;
        storage.write_input(bytes).await?;

        let preview = TablePreview::new(&table, skip_count);

        info!(
            session = %token,
            columns = table.header.len(),
            rows = table.rows.len(),
            skip_count,
            "Table uploaded"
        );

        let session = Self {
            token,
            phase: WorkflowPhase::Uploaded,
            header: table.header,
            skip_count,
            storage,
            artifact: None,
            created_at: Utc::now(),
            last_access: Instant::now(),
        };

        Ok((session, preview))
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn skip_count(&self) -> usize {
        self.skip_count
    }

    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }

    pub fn artifact(&self) -> Option<&ArtifactSummary> {
        self.artifact.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time since the session was last used
    pub fn idle_for(&self) -> Duration {
        self.last_access.elapsed()
    }

    pub fn touch(&mut self) {
        self.last_access = Instant::now();
    }

    fn transition_to(&mut self, new_phase: WorkflowPhase) {
        if self.phase != new_phase {
            debug!(
                session = %self.token,
                old_phase = ?self.phase,
                new_phase = ?new_phase,
                "Workflow phase transition"
            );
        }
        self.phase = new_phase;
    }

    /// AdjustPreview: store a new skip count and return the matching window
    pub async fn adjust_preview(&mut self, skip_count: usize) -> Result<TablePreview> {
        self.touch();
        let table = self.storage.load_input().await?;

        self.skip_count = skip_count;
        self.transition_to(WorkflowPhase::Previewing);

        debug!(session = %self.token, skip_count, "Preview adjusted");
        Ok(TablePreview::new(&table, skip_count))
    }

    /// Update the skip count used by the next computation
    pub fn set_skip_count(&mut self, skip_count: usize) {
        self.skip_count = skip_count;
    }

    /// ComputeScores: resolve, score, assemble, persist
    pub async fn compute_scores(
        &mut self,
        selection: &ColumnSelection,
        scorer: &RowScorer,
    ) -> Result<ScoreReport> {
        self.touch();

        let table = Arc::new(self.storage.load_input().await?);
        let indices = resolve_columns(&self.header, selection.names())?;

        let (skipped, _) = table.scoring_split(self.skip_count);
        let first = skipped.len();

        info!(
            session = %self.token,
            columns = ?selection.names(),
            min_word_count = selection.min_word_count(),
            skip_count = self.skip_count,
            rows = table.rows.len() - first,
            scorer = scorer.scorer_name(),
            "Scoring started"
        );

        let outcomes = scorer
            .score_rows(
                Arc::clone(&table),
                first,
                Arc::from(indices.as_slice()),
                selection.min_word_count(),
            )
            .await;

        let scored = || table.rows[first..].iter().zip(&outcomes);
        let output = OutputTable::assemble(&table.header, &table.rows[..first], scored());
        let report = ScoreReport::project(selection.names(), &indices, first, scored());

        self.storage.write_output(&output).await?;

        let summary = ArtifactSummary {
            total_rows: output.rows.len(),
            skipped_rows: first,
            scored_rows: outcomes.len(),
            failed_rows: report.failed_rows,
            computed_at: Utc::now(),
        };
        info!(
            session = %self.token,
            scored = summary.scored_rows,
            skipped = summary.skipped_rows,
            failed = summary.failed_rows,
            "Scoring completed"
        );

        self.artifact = Some(summary);
        self.transition_to(WorkflowPhase::Scored);
        Ok(report)
    }

    /// FetchArtifact: bytes of the stored artifact
    pub async fn fetch_artifact(&mut self) -> Result<Vec<u8>> {
        self.touch();
        if self.phase != WorkflowPhase::Scored || self.artifact.is_none() {
            return Err(Error::ArtifactNotFound);
        }
        self.storage.read_output().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{FixedScorer, ScoringLimits};
    use tempfile::TempDir;

    const CSV: &[u8] = b"w1,w2,w3\ncat,dog,bird\nx,y,z\n";

    fn scorer() -> RowScorer {
        RowScorer::new(Arc::new(FixedScorer::new(0.5)), ScoringLimits::default())
    }

    fn selection(names: &[&str]) -> ColumnSelection {
        ColumnSelection::new(names.iter().map(|n| n.to_string()).collect(), 1).unwrap()
    }

    #[tokio::test]
    async fn test_upload_starts_in_uploaded_phase() {
        let root = TempDir::new().unwrap();
        let (session, preview) =
            WorkflowSession::begin_upload(SessionToken::generate(), CSV, 0, root.path())
                .await
                .unwrap();

        assert_eq!(session.phase(), WorkflowPhase::Uploaded);
        assert_eq!(session.header(), &["w1", "w2", "w3"]);
        assert_eq!(preview.rows.len(), 2);
        assert!(session.storage().input_path().exists());
    }

    #[tokio::test]
    async fn test_invalid_upload_creates_no_storage() {
        let root = TempDir::new().unwrap();
        let err = WorkflowSession::begin_upload(SessionToken::generate(), b"", 0, root.path())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InputValidation(_)));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_phase_transitions() {
        let root = TempDir::new().unwrap();
        let (mut session, _) =
            WorkflowSession::begin_upload(SessionToken::generate(), CSV, 0, root.path())
                .await
                .unwrap();

        let preview = session.adjust_preview(1).await.unwrap();
        assert_eq!(session.phase(), WorkflowPhase::Previewing);
        assert_eq!(preview.rows, vec![vec!["x", "y", "z"]]);

        session.compute_scores(&selection(&["w1"]), &scorer()).await.unwrap();
        assert_eq!(session.phase(), WorkflowPhase::Scored);

        session.adjust_preview(0).await.unwrap();
        assert_eq!(session.phase(), WorkflowPhase::Previewing);
    }

    #[tokio::test]
    async fn test_fetch_before_compute_is_not_found() {
        let root = TempDir::new().unwrap();
        let (mut session, _) =
            WorkflowSession::begin_upload(SessionToken::generate(), CSV, 0, root.path())
                .await
                .unwrap();

        assert!(matches!(
            session.fetch_artifact().await.unwrap_err(),
            Error::ArtifactNotFound
        ));
    }

    #[tokio::test]
    async fn test_unknown_column_writes_no_artifact() {
        let root = TempDir::new().unwrap();
        let (mut session, _) =
            WorkflowSession::begin_upload(SessionToken::generate(), CSV, 0, root.path())
                .await
                .unwrap();

        let err = session
            .compute_scores(&selection(&["w1", "missing"]), &scorer())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ColumnResolution(ref name) if name == "missing"));
        assert!(!session.storage().output_path().exists());
        assert_eq!(session.phase(), WorkflowPhase::Uploaded);
    }

    #[tokio::test]
    async fn test_vanished_storage_expires_session() {
        let root = TempDir::new().unwrap();
        let (mut session, _) =
            WorkflowSession::begin_upload(SessionToken::generate(), CSV, 0, root.path())
                .await
                .unwrap();
        std::fs::remove_file(session.storage().input_path()).unwrap();

        assert!(matches!(
            session.adjust_preview(0).await.unwrap_err(),
            Error::SessionExpired(_)
        ));
        assert!(matches!(
            session.compute_scores(&selection(&["w1"]), &scorer()).await.unwrap_err(),
            Error::SessionExpired(_)
        ));
    }

    #[tokio::test]
    async fn test_artifact_summary() {
        let root = TempDir::new().unwrap();
        let (mut session, _) =
            WorkflowSession::begin_upload(SessionToken::generate(), CSV, 2, root.path())
                .await
                .unwrap();

        let report = session.compute_scores(&selection(&["w2"]), &scorer()).await.unwrap();
        let summary = session.artifact().unwrap();

        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.skipped_rows, 1);
        assert_eq!(summary.scored_rows, 1);
        assert_eq!(summary.failed_rows, 0);
        assert_eq!(report.rows[0].cells, vec!["y"]);
    }
}
