//! Browse backend collaborator
//!
//! The browser consumes four endpoints of the grabarr API: opening and
//! closing a stateful browse session, and listing a directory either
//! through that session or statelessly per request. `BrowseBackend` is the
//! seam; `HttpBrowseBackend` is the production implementation.

pub mod error;
pub mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod types;

pub use error::BrowseError;
pub use http::HttpBrowseBackend;
pub use types::{DirectoryEntry, RemoteTarget};

use async_trait::async_trait;

/// Session-oriented browse API.
///
/// All calls are independent requests; implementations must tolerate being
/// called concurrently from several spawned tasks.
#[async_trait]
pub trait BrowseBackend: Send + Sync + 'static {
    /// Open a browse session bound to `target`, returning its id.
    ///
    /// Fails if the target is unreachable or does not support sessions.
    async fn open_session(&self, target: &RemoteTarget) -> Result<String, BrowseError>;

    /// Close a browse session. Idempotent.
    async fn close_session(&self, session_id: &str) -> Result<(), BrowseError>;

    /// List `path` through an open session.
    async fn list_via_session(
        &self,
        session_id: &str,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, BrowseError>;

    /// List `path` on `target` without a session.
    async fn list_stateless(
        &self,
        target: &RemoteTarget,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, BrowseError>;
}
