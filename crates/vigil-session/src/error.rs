//! Error types for the session layer.

use vigil_store::StoreError;

/// Errors that can cross the lifecycle's public boundary.
///
/// The list is short on purpose. Missing sessions, corrupt storage,
/// expiry, double logout and updates while signed out are all normal
/// outcomes and are handled inside the lifecycle. What is left is an
/// environment that is actually broken.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The durable store failed underneath us.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The lifecycle task is not running (stopped, or every handle to it
    /// was dropped).
    #[error("session lifecycle is not running")]
    Stopped,
}
