//! Unified error type for Vigil.

use vigil_session::{LoginError, SessionError};
use vigil_store::StoreError;

/// Top-level error that wraps every crate-specific error.
///
/// Using the `vigil` meta-crate, callers match on this one type; `?`
/// converts sub-crate errors through the `#[from]` impls.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    /// The durable store failed (I/O, encoding).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session lifecycle failed or is no longer running.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The login call did not produce a session.
    #[error(transparent)]
    Login(#[from] LoginError),
}

impl VigilError {
    /// Text suitable for the login form, when this is a login failure.
    pub fn login_message(&self) -> Option<String> {
        match self {
            Self::Login(e) => Some(e.user_message()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_store_error() {
        let err: VigilError = StoreError::Backend("disk full".into()).into();
        assert!(matches!(err, VigilError::Store(_)));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_from_session_error() {
        let err: VigilError = SessionError::Stopped.into();
        assert!(matches!(err, VigilError::Session(_)));
        assert_eq!(err.login_message(), None);
    }

    #[test]
    fn test_from_login_error_keeps_message() {
        let err: VigilError = LoginError::Rejected("Invalid email or password".into()).into();
        assert!(matches!(err, VigilError::Login(_)));
        assert_eq!(
            err.login_message().as_deref(),
            Some("Invalid email or password")
        );
    }
}
