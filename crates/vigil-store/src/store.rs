//! The session store: three independent entries, read and written as one.
//!
//! A session is persisted as three separate keys (token, user record,
//! last-activity timestamp). They are separate because that's what the
//! browser store gives us, but they are only meaningful together:
//!
//! ```text
//! save()  ──→ token + user + timestamp written
//! load()  ──→ all three present and valid?  ── yes ──→ Some(session)
//!                                            └─ no ───→ clear(), None
//! clear() ──→ all three removed (idempotent)
//! ```
//!
//! `load` never leaves a half-written session behind. Whatever partial
//! state it finds is wiped before it returns `None`.

use crate::{
    BearerToken, Codec, JsonCodec, PersistedSession, Storage, StoreError, User,
};

/// Storage key names. The console owns exactly these three keys.
#[derive(Debug, Clone, Copy)]
pub struct StorageKeys;

impl StorageKeys {
    pub const TOKEN: &'static str = "auth_token";
    pub const USER: &'static str = "auth_user";
    pub const LAST_ACTIVITY: &'static str = "auth_last_activity";

    pub const ALL: [&'static str; 3] =
        [Self::TOKEN, Self::USER, Self::LAST_ACTIVITY];
}

/// Reads and writes the persisted session on top of a [`Storage`] backend.
pub struct SessionStore<S: Storage, C: Codec = JsonCodec> {
    storage: S,
    codec: C,
}

impl<S: Storage> SessionStore<S, JsonCodec> {
    /// Creates a store using the JSON codec.
    pub fn new(storage: S) -> Self {
        Self::with_codec(storage, JsonCodec)
    }
}

impl<S: Storage, C: Codec> SessionStore<S, C> {
    pub fn with_codec(storage: S, codec: C) -> Self {
        Self { storage, codec }
    }

    /// The underlying backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Writes all three entries.
    ///
    /// The user record is encoded first so an encode failure writes
    /// nothing at all.
    pub fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        let user = self.codec.encode(&session.user)?;
        self.storage.set(StorageKeys::TOKEN, session.token.as_str())?;
        self.storage.set(StorageKeys::USER, &user)?;
        self.storage.set(
            StorageKeys::LAST_ACTIVITY,
            &session.last_activity_ms.to_string(),
        )?;
        Ok(())
    }

    /// Reads the persisted session.
    ///
    /// Returns `Ok(None)` when there is no complete, valid session. In that
    /// case any entries that *were* present have been removed.
    ///
    /// A session is valid when:
    /// - the token entry is present and non-empty,
    /// - the user entry is present and decodes into a [`User`]
    ///   (so a literal `"undefined"` does not),
    /// - the timestamp entry is present and parses as epoch milliseconds.
    ///
    /// # Errors
    /// Only backend failures. Corruption is handled here, not reported.
    pub fn load(&self) -> Result<Option<PersistedSession>, StoreError> {
        let token = self.storage.get(StorageKeys::TOKEN)?;
        let user = self.storage.get(StorageKeys::USER)?;
        let stamp = self.storage.get(StorageKeys::LAST_ACTIVITY)?;

        if token.is_none() && user.is_none() && stamp.is_none() {
            return Ok(None);
        }

        let token = token.and_then(BearerToken::new);
        let user = user.and_then(|raw| self.codec.decode::<User>(&raw));
        let stamp = stamp.and_then(|raw| raw.trim().parse::<u64>().ok());

        match (token, user, stamp) {
            (Some(token), Some(user), Some(last_activity_ms)) => {
                Ok(Some(PersistedSession {
                    token,
                    user,
                    last_activity_ms,
                }))
            }
            (token, user, stamp) => {
                tracing::debug!(
                    token = token.is_some(),
                    user = user.is_some(),
                    last_activity = stamp.is_some(),
                    "discarding partial or corrupt persisted session"
                );
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// Removes all three entries. Clearing an empty store is fine.
    pub fn clear(&self) -> Result<(), StoreError> {
        for key in StorageKeys::ALL {
            self.storage.remove(key)?;
        }
        Ok(())
    }

    /// Rewrites only the user entry. Token and timestamp are untouched.
    pub fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let raw = self.codec.encode(user)?;
        self.storage.set(StorageKeys::USER, &raw)
    }

    /// Rewrites only the last-activity timestamp.
    pub fn touch(&self, last_activity_ms: u64) -> Result<(), StoreError> {
        self.storage
            .set(StorageKeys::LAST_ACTIVITY, &last_activity_ms.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStorage, Role, UserId};

    fn session() -> PersistedSession {
        PersistedSession {
            token: BearerToken::new("tok-1").unwrap(),
            user: User {
                id: UserId(5),
                name: "Vera".into(),
                email: "vera@example.org".into(),
                role: Role::Viewer,
            },
            last_activity_ms: 1_000,
        }
    }

    #[test]
    fn test_save_writes_three_entries() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());

        store.save(&session()).unwrap();

        assert_eq!(storage.len(), 3);
        assert_eq!(
            storage.get(StorageKeys::TOKEN).unwrap().as_deref(),
            Some("tok-1")
        );
        assert_eq!(
            storage.get(StorageKeys::LAST_ACTIVITY).unwrap().as_deref(),
            Some("1000")
        );
    }

    #[test]
    fn test_load_returns_saved_session() {
        let store = SessionStore::new(MemoryStorage::new());
        store.save(&session()).unwrap();

        assert_eq!(store.load().unwrap(), Some(session()));
    }

    #[test]
    fn test_load_empty_store_returns_none() {
        let store = SessionStore::new(MemoryStorage::new());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_load_token_without_user_clears_token() {
        let storage = MemoryStorage::new();
        storage.set(StorageKeys::TOKEN, "tok").unwrap();
        let store = SessionStore::new(storage.clone());

        assert_eq!(store.load().unwrap(), None);
        assert!(storage.is_empty(), "partial state must be wiped");
    }

    #[test]
    fn test_load_user_undefined_clears_everything() {
        let storage = MemoryStorage::new();
        storage.set(StorageKeys::TOKEN, "tok").unwrap();
        storage.set(StorageKeys::USER, "undefined").unwrap();
        storage.set(StorageKeys::LAST_ACTIVITY, "10").unwrap();
        let store = SessionStore::new(storage.clone());

        assert_eq!(store.load().unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_load_non_numeric_timestamp_is_corrupt() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.save(&session()).unwrap();
        storage.set(StorageKeys::LAST_ACTIVITY, "yesterday").unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_load_empty_token_is_corrupt() {
        let storage = MemoryStorage::new();
        let store = SessionStore::new(storage.clone());
        store.save(&session()).unwrap();
        storage.set(StorageKeys::TOKEN, "").unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = SessionStore::new(MemoryStorage::new());
        store.save(&session()).unwrap();

        store.clear().unwrap();
        store.clear().unwrap();

        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_user_preserves_token_and_timestamp() {
        let store = SessionStore::new(MemoryStorage::new());
        store.save(&session()).unwrap();

        let mut promoted = session().user;
        promoted.role = Role::Editor;
        store.save_user(&promoted).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.user.role, Role::Editor);
        assert_eq!(loaded.token, session().token);
        assert_eq!(loaded.last_activity_ms, 1_000);
    }

    #[test]
    fn test_touch_updates_only_timestamp() {
        let store = SessionStore::new(MemoryStorage::new());
        store.save(&session()).unwrap();

        store.touch(5_000).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.last_activity_ms, 5_000);
        assert_eq!(loaded.user, session().user);
    }
}
