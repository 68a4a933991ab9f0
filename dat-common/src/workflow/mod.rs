//! Session-scoped scoring workflow
//!
//! A session is created by an upload and moves through
//! `Uploaded → (Previewing ⇄ Uploaded)* → Scored`. Each session owns its
//! backing storage; dropping the session releases it.

pub mod session;
pub mod storage;
pub mod store;
pub mod token;

pub use session::{ArtifactSummary, WorkflowPhase, WorkflowSession};
pub use storage::SessionStorage;
pub use store::SessionStore;
pub use token::SessionToken;
