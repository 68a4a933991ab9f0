//! Token → session registry
//!
//! Unrelated tokens proceed concurrently (read-locked map); operations on one
//! token are serialized by that session's mutex.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{SessionToken, WorkflowSession};
use crate::artifact::ScoreReport;
use crate::columns::ColumnSelection;
use crate::scoring::RowScorer;
use crate::table::TablePreview;
use crate::{Error, Result};

type SharedSession = Arc<Mutex<WorkflowSession>>;

/// Shared registry of live workflow sessions
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionToken, SharedSession>>>,
    storage_root: PathBuf,
    scorer: RowScorer,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(storage_root: impl Into<PathBuf>, scorer: RowScorer, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            storage_root: storage_root.into(),
            scorer,
            ttl,
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.scorer_name()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn get(&self, token: SessionToken) -> Option<SharedSession> {
        self.sessions.read().await.get(&token).cloned()
    }

    /// Start a session from uploaded bytes
    ///
    /// A known `prior` token is reused and its old session (and storage) is
    /// dropped. Unknown or absent tokens get a fresh one. A parse failure
    /// leaves any prior session untouched.
    pub async fn begin_upload(
        &self,
        prior: Option<SessionToken>,
        bytes: &[u8],
        skip_count: usize,
    ) -> Result<(SessionToken, TablePreview)> {
        let token = match prior {
            Some(token) if self.get(token).await.is_some() => token,
            _ => SessionToken::generate(),
        };

        let (session, preview) =
            WorkflowSession::begin_upload(token, bytes, skip_count, &self.storage_root).await?;

        let replaced = self
            .sessions
            .write()
            .await
            .insert(token, Arc::new(Mutex::new(session)));
        if replaced.is_some() {
            debug!(session = %token, "Previous upload replaced");
        }

        Ok((token, preview))
    }

    /// Re-render the preview; without a skip count the stored one is kept
    pub async fn adjust_preview(
        &self,
        token: SessionToken,
        skip_count: Option<usize>,
    ) -> Result<TablePreview> {
        let session = self.get(token).await.ok_or_else(Error::unknown_session)?;
        let mut session = session.lock().await;
        let skip_count = skip_count.unwrap_or_else(|| session.skip_count());
        session.adjust_preview(skip_count).await
    }

    /// Score the session's table; a supplied skip count is stored first
    pub async fn compute_scores(
        &self,
        token: SessionToken,
        skip_count: Option<usize>,
        selection: &ColumnSelection,
    ) -> Result<ScoreReport> {
        let session = self.get(token).await.ok_or_else(Error::unknown_session)?;
        let mut session = session.lock().await;
        if let Some(skip_count) = skip_count {
            session.set_skip_count(skip_count);
        }
        session.compute_scores(selection, &self.scorer).await
    }

    pub async fn fetch_artifact(&self, token: SessionToken) -> Result<Vec<u8>> {
        let session = self.get(token).await.ok_or(Error::ArtifactNotFound)?;
        let mut session = session.lock().await;
        session.fetch_artifact().await
    }

    /// Drop sessions idle for at least the TTL
    ///
    /// Sessions busy with an operation are never idle and are skipped.
    pub async fn evict_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|token, session| match session.try_lock() {
            Ok(session) if session.idle_for() >= self.ttl => {
                debug!(session = %token, "Session expired");
                false
            }
            _ => true,
        });

        before - sessions.len()
    }

    /// Run [`Self::evict_expired`] every `interval` until the task is aborted
    pub fn spawn_reaper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = store.evict_expired().await;
                if evicted > 0 {
                    let remaining = store.len().await;
                    info!(evicted, remaining, "Expired sessions evicted");
                }
            }
        })
    }

    /// Drop every session, releasing all storage
    pub async fn clear(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        sessions.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{FixedScorer, ScoringLimits};
    use tempfile::TempDir;

    const CSV: &[u8] = b"w1,w2\ncat,dog\n";

    fn store(root: &Path, ttl: Duration) -> SessionStore {
        let scorer = RowScorer::new(Arc::new(FixedScorer::new(0.5)), ScoringLimits::default());
        SessionStore::new(root, scorer, ttl)
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let root = TempDir::new().unwrap();
        let store = store(root.path(), Duration::from_secs(60));
        let token = SessionToken::generate();
        let selection = ColumnSelection::new(vec!["w1".to_string()], 1).unwrap();

        assert!(matches!(
            store.adjust_preview(token, Some(0)).await.unwrap_err(),
            Error::SessionExpired(_)
        ));
        assert!(matches!(
            store.compute_scores(token, None, &selection).await.unwrap_err(),
            Error::SessionExpired(_)
        ));
        assert!(matches!(
            store.fetch_artifact(token).await.unwrap_err(),
            Error::ArtifactNotFound
        ));
    }

    #[tokio::test]
    async fn test_unknown_prior_token_is_not_adopted() {
        let root = TempDir::new().unwrap();
        let store = store(root.path(), Duration::from_secs(60));
        let stranger = SessionToken::generate();

        let (token, _) = store.begin_upload(Some(stranger), CSV, 0).await.unwrap();

        assert_ne!(token, stranger);
    }

    #[tokio::test]
    async fn test_reupload_keeps_token_and_releases_storage() {
        let root = TempDir::new().unwrap();
        let store = store(root.path(), Duration::from_secs(60));

        let (token, _) = store.begin_upload(None, CSV, 0).await.unwrap();
        let (again, _) = store.begin_upload(Some(token), CSV, 0).await.unwrap();

        assert_eq!(again, token);
        assert_eq!(store.len().await, 1);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_reupload_keeps_prior_session() {
        let root = TempDir::new().unwrap();
        let store = store(root.path(), Duration::from_secs(60));

        let (token, _) = store.begin_upload(None, CSV, 0).await.unwrap();
        assert!(store.begin_upload(Some(token), b"", 0).await.is_err());

        assert!(store.adjust_preview(token, Some(0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_preview_without_skip_count_keeps_stored_one() {
        let root = TempDir::new().unwrap();
        let store = store(root.path(), Duration::from_secs(60));
        let csv = b"w\na\nb\nc\n";

        let (token, _) = store.begin_upload(None, csv, 2).await.unwrap();
        let preview = store.adjust_preview(token, None).await.unwrap();
        assert_eq!(preview.skip_count, 2);
        assert_eq!(preview.rows, vec![vec!["c"]]);

        store.adjust_preview(token, Some(1)).await.unwrap();
        let preview = store.adjust_preview(token, None).await.unwrap();
        assert_eq!(preview.skip_count, 1);
    }

    #[tokio::test]
    async fn test_evict_expired_releases_storage() {
        let root = TempDir::new().unwrap();
        let store = store(root.path(), Duration::ZERO);

        let (token, _) = store.begin_upload(None, CSV, 0).await.unwrap();
        assert_eq!(store.evict_expired().await, 1);

        assert!(store.is_empty().await);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
        assert!(matches!(
            store.adjust_preview(token, Some(0)).await.unwrap_err(),
            Error::SessionExpired(_)
        ));
    }

    #[tokio::test]
    async fn test_fresh_sessions_survive_eviction() {
        let root = TempDir::new().unwrap();
        let store = store(root.path(), Duration::from_secs(3600));

        store.begin_upload(None, CSV, 0).await.unwrap();

        assert_eq!(store.evict_expired().await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let root = TempDir::new().unwrap();
        let store = store(root.path(), Duration::from_secs(60));
        store.begin_upload(None, CSV, 0).await.unwrap();
        store.begin_upload(None, CSV, 0).await.unwrap();

        assert_eq!(store.clear().await, 2);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
