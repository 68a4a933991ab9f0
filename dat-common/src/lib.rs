//! # DAT Score Common Library
//!
//! Core of the DAT score calculator, independent of the HTTP transport:
//! - Uploaded table parsing and preview windows
//! - Column resolution for word selection
//! - The scoring capability (`Scorer`) and its engines
//! - Per-row scoring with failure isolation
//! - Output artifact assembly
//! - Session-scoped workflow state and storage
//! - Configuration loading

pub mod artifact;
pub mod columns;
pub mod config;
pub mod error;
pub mod scoring;
pub mod table;
pub mod workflow;

pub use artifact::{OutputTable, ScoreReport, DOWNLOAD_FILENAME, SCORE_COLUMN};
pub use columns::{resolve_columns, ColumnSelection};
pub use error::{Error, Result};
pub use scoring::{RowScorer, Score, ScoreOutcome, Scorer, ScoringError, ScoringLimits};
pub use table::{TablePreview, UploadedTable, PREVIEW_SIZE};
pub use workflow::{SessionStore, SessionToken, WorkflowPhase, WorkflowSession};
