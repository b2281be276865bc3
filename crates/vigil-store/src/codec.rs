//! Codec trait for the structured entries in the session store.
//!
//! The store keeps plain strings. The user record is structured, so it
//! goes through a [`Codec`] on the way in and out. Decoding is where
//! corruption gets detected: anything that doesn't decode back into a
//! [`User`](crate::User) is treated as missing.

use serde::{de::DeserializeOwned, Serialize};

use crate::StoreError;

/// Converts values to and from the string form kept in storage.
///
/// `Send + Sync + 'static` because the session store lives inside the
/// lifecycle task for the whole life of the console.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value for storage.
    ///
    /// # Errors
    /// Returns [`StoreError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, StoreError>;

    /// Parses a stored string back into a value.
    ///
    /// Returns `None` for anything that doesn't parse. A failed decode is
    /// an expected condition for persisted state (a truncated write, a
    /// value of `"undefined"` left behind by another client), not an error.
    fn decode<T: DeserializeOwned>(&self, raw: &str) -> Option<T>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`, the format the API itself speaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, StoreError> {
        serde_json::to_string(value).map_err(StoreError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, raw: &str) -> Option<T> {
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, "stored value failed to decode");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Role, User, UserId};

    fn user() -> User {
        User {
            id: UserId(1),
            name: "Root".into(),
            email: "root@example.org".into(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_encode_then_decode_preserves_user() {
        let codec = JsonCodec;
        let raw = codec.encode(&user()).unwrap();
        let back: Option<User> = codec.decode(&raw);
        assert_eq!(back, Some(user()));
    }

    #[test]
    fn test_decode_literal_undefined_returns_none() {
        let back: Option<User> = JsonCodec.decode("undefined");
        assert!(back.is_none());
    }

    #[test]
    fn test_decode_wrong_shape_returns_none() {
        // Valid JSON, but not a user.
        let back: Option<User> = JsonCodec.decode(r#"{"id":1}"#);
        assert!(back.is_none());
    }

    #[test]
    fn test_decode_truncated_returns_none() {
        let back: Option<User> = JsonCodec.decode(r#"{"id":1,"name":"Ro"#);
        assert!(back.is_none());
    }
}
