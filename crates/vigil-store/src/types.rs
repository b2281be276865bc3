//! Identity types shared by every layer of Vigil.
//!
//! These are the structures that get persisted to the origin-scoped store
//! and that the login API hands back: who the user is, what role they
//! hold, and the opaque bearer credential that proves it.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a console user.
///
/// Newtype over `u64` so a user id can't be confused with any other
/// number flowing through the console (record ids, timestamps).
///
/// `#[serde(transparent)]` keeps the wire shape a plain number: the API
/// sends `"id": 42`, not `"id": { "0": 42 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Authorization level assigned to a user.
///
/// This is a closed set. There is deliberately no ordering between the
/// variants: `Admin` does not satisfy an `Editor`-only check unless the
/// caller lists both. Access decisions are pure set membership.
///
/// Serialized lowercase (`"admin"`, `"editor"`, `"viewer"`), matching the
/// API. Any other string fails to deserialize, which is what makes a
/// tampered role in persisted state unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Editor, Role::Viewer];

    /// The lowercase wire name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`Role::from_str`] for anything outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// The signed-in user's profile, as returned by the login API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// BearerToken
// ---------------------------------------------------------------------------

/// Opaque bearer credential issued by the API.
///
/// The console never inspects the token; it only stores it and attaches
/// it to outgoing requests. An empty token is not a token, so the only
/// constructor refuses one.
///
/// Deserialization goes through the same check (`try_from = "String"`),
/// so an API response carrying `"token": ""` fails to parse.
///
/// `Debug` is hand-written to redact the value. Tokens end up in
/// structs that get logged, and a credential must never reach the logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BearerToken(String);

impl BearerToken {
    /// Wraps a raw token. Returns `None` if it is empty or whitespace.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for an HTTP `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

/// Returned when converting an empty string into a [`BearerToken`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("bearer token must not be empty")]
pub struct EmptyToken;

impl TryFrom<String> for BearerToken {
    type Error = EmptyToken;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(EmptyToken)
    }
}

impl From<BearerToken> for String {
    fn from(token: BearerToken) -> Self {
        token.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// PersistedSession
// ---------------------------------------------------------------------------

/// The durable record of a session: what [`SessionStore`](crate::SessionStore)
/// writes on login and reads back on startup.
///
/// `last_activity_ms` is Unix epoch milliseconds. It is the start of the
/// current idle window, not the login time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    pub token: BearerToken,
    pub user: User,
    pub last_activity_ms: u64,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User {
            id: UserId(7),
            name: "Alice".into(),
            email: "alice@example.org".into(),
            role: Role::Editor,
        }
    }

    #[test]
    fn test_user_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&UserId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId(3).to_string(), "U-3");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
    }

    #[test]
    fn test_role_deserialize_unknown_fails() {
        let result: Result<Role, _> = serde_json::from_str("\"superuser\"");
        assert!(result.is_err(), "roles outside the closed set must not parse");
    }

    #[test]
    fn test_role_from_str_matches_wire_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert_eq!(
            "Admin".parse::<Role>(),
            Err(UnknownRole("Admin".into())),
            "parsing is case-sensitive"
        );
    }

    #[test]
    fn test_user_json_shape_matches_api() {
        let user: User = serde_json::from_str(
            r#"{"id":7,"name":"Alice","email":"alice@example.org","role":"editor"}"#,
        )
        .unwrap();
        assert_eq!(user, alice());
    }

    #[test]
    fn test_bearer_token_rejects_empty() {
        assert!(BearerToken::new("").is_none());
        assert!(BearerToken::new("   ").is_none());
        assert!(BearerToken::new("abc").is_some());
    }

    #[test]
    fn test_bearer_token_deserialize_rejects_empty() {
        let result: Result<BearerToken, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
        let token: BearerToken = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(token.as_str(), "abc");
    }

    #[test]
    fn test_bearer_token_debug_is_redacted() {
        let token = BearerToken::new("super-secret").unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_bearer_token_authorization_header() {
        let token = BearerToken::new("abc123").unwrap();
        assert_eq!(token.authorization_header(), "Bearer abc123");
    }
}
