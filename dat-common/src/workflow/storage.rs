//! Per-session backing storage
//!
//! Each session gets its own directory under the storage root holding the
//! uploaded table (`input.csv`) and, once computed, the artifact
//! (`output.csv`). The directory is removed when the [`SessionStorage`] is
//! dropped.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use super::SessionToken;
use crate::artifact::OutputTable;
use crate::table::UploadedTable;
use crate::{Error, Result};

const INPUT_FILE: &str = "input.csv";
const OUTPUT_FILE: &str = "output.csv";

/// Input and output stores of one session
#[derive(Debug)]
pub struct SessionStorage {
    dir: TempDir,
}

impl SessionStorage {
    /// Create a fresh, empty session directory under `root`
    pub fn create(root: &Path, token: SessionToken) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", token))
            .tempdir_in(root)?;
        debug!(path = %dir.path().display(), "Session storage created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.path().join(INPUT_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join(OUTPUT_FILE)
    }

    pub async fn write_input(&self, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(self.input_path(), bytes)
            .await
            .map_err(storage_error)
    }

    /// Re-read the uploaded table
    ///
    /// A missing file means the session's storage is gone: [`Error::SessionExpired`].
    pub async fn load_input(&self) -> Result<UploadedTable> {
        let bytes = tokio::fs::read(self.input_path())
            .await
            .map_err(storage_error)?;
        UploadedTable::parse(&bytes)
    }

    /// Write the artifact, replacing any earlier one
    pub async fn write_output(&self, output: &OutputTable) -> Result<()> {
        let bytes = output.to_csv_bytes()?;
        tokio::fs::write(self.output_path(), bytes)
            .await
            .map_err(storage_error)
    }

    pub async fn read_output(&self) -> Result<Vec<u8>> {
        tokio::fs::read(self.output_path())
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::ArtifactNotFound,
                _ => Error::Io(e),
            })
    }
}

fn storage_error(e: std::io::Error) -> Error {
    match e.kind() {
        ErrorKind::NotFound => Error::storage_gone(),
        _ => Error::Io(e),
    }
}

/// Remove session directories left behind by an earlier process
///
/// Returns the number of entries removed.
pub fn purge_orphans(root: &Path) -> Result<usize> {
    if !root.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        let result = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "Could not remove stale session storage"),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreOutcome;

    #[tokio::test]
    async fn test_input_round_trip() {
        let root = TempDir::new().unwrap();
        let storage = SessionStorage::create(root.path(), SessionToken::generate()).unwrap();

        storage.write_input(b"a,b\n1,2\n").await.unwrap();
        let table = storage.load_input().await.unwrap();

        assert_eq!(table.header, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", "2"]]);
    }

    #[tokio::test]
    async fn test_missing_input_means_session_expired() {
        let root = TempDir::new().unwrap();
        let storage = SessionStorage::create(root.path(), SessionToken::generate()).unwrap();

        let err = storage.load_input().await.unwrap_err();
        assert!(matches!(err, Error::SessionExpired(_)));
    }

    #[tokio::test]
    async fn test_missing_output_means_artifact_not_found() {
        let root = TempDir::new().unwrap();
        let storage = SessionStorage::create(root.path(), SessionToken::generate()).unwrap();

        let err = storage.read_output().await.unwrap_err();
        assert!(matches!(err, Error::ArtifactNotFound));
    }

    #[tokio::test]
    async fn test_output_is_replaced() {
        let root = TempDir::new().unwrap();
        let storage = SessionStorage::create(root.path(), SessionToken::generate()).unwrap();
        let header = vec!["w".to_string()];
        let rows = vec![vec!["x".to_string()]];

        let first = [ScoreOutcome::Numeric(1.0)];
        storage
            .write_output(&OutputTable::assemble(&header, &[], rows.iter().zip(&first)))
            .await
            .unwrap();
        let second = [ScoreOutcome::Insufficient];
        storage
            .write_output(&OutputTable::assemble(&header, &[], rows.iter().zip(&second)))
            .await
            .unwrap();

        let bytes = storage.read_output().await.unwrap();
        assert_eq!(bytes, b"w,creativity_score\r\nx,not enough words\r\n");
    }

    #[test]
    fn test_drop_releases_directory() {
        let root = TempDir::new().unwrap();
        let storage = SessionStorage::create(root.path(), SessionToken::generate()).unwrap();
        let path = storage.path().to_path_buf();
        assert!(path.exists());

        drop(storage);

        assert!(!path.exists());
    }

    #[test]
    fn test_purge_orphans() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("stale-session")).unwrap();
        std::fs::write(root.path().join("stale-session").join(INPUT_FILE), b"a\n").unwrap();
        std::fs::write(root.path().join("stray.csv"), b"a\n").unwrap();

        assert_eq!(purge_orphans(root.path()).unwrap(), 2);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
        assert_eq!(purge_orphans(&root.path().join("missing")).unwrap(), 0);
    }
}
