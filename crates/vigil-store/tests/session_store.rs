//! Integration tests for the session store over a durable file backend.
//!
//! Each "reload" is modelled by opening a fresh `FileStorage` on the same
//! path, the way a new page load opens the same origin store.

use vigil_store::{
    BearerToken, FileStorage, PersistedSession, Role, SessionStore, Storage,
    StorageKeys, User, UserId,
};

// =========================================================================
// Helpers
// =========================================================================

fn editor_session(last_activity_ms: u64) -> PersistedSession {
    PersistedSession {
        token: BearerToken::new("a1b2c3").unwrap(),
        user: User {
            id: UserId(11),
            name: "Eddie".into(),
            email: "eddie@example.org".into(),
            role: Role::Editor,
        },
        last_activity_ms,
    }
}

// =========================================================================
// Reload behaviour
// =========================================================================

#[test]
fn test_session_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("origin.json");

    SessionStore::new(FileStorage::new(&path))
        .save(&editor_session(42))
        .unwrap();

    let reloaded = SessionStore::new(FileStorage::new(&path));
    assert_eq!(reloaded.load().unwrap(), Some(editor_session(42)));
}

#[test]
fn test_clear_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("origin.json");
    let store = SessionStore::new(FileStorage::new(&path));
    store.save(&editor_session(42)).unwrap();

    store.clear().unwrap();

    let reloaded = SessionStore::new(FileStorage::new(&path));
    assert_eq!(reloaded.load().unwrap(), None);
}

#[test]
fn test_corrupt_user_on_disk_is_wiped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("origin.json");
    let store = SessionStore::new(FileStorage::new(&path));
    store.save(&editor_session(42)).unwrap();
    store.storage().set(StorageKeys::USER, "undefined").unwrap();

    assert_eq!(store.load().unwrap(), None);

    // Nothing of the old session is left on disk.
    let raw = FileStorage::new(&path);
    for key in StorageKeys::ALL {
        assert_eq!(raw.get(key).unwrap(), None, "{key} should be gone");
    }
}

#[test]
fn test_forged_role_is_treated_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("origin.json");
    let store = SessionStore::new(FileStorage::new(&path));
    store.save(&editor_session(42)).unwrap();
    store
        .storage()
        .set(
            StorageKeys::USER,
            r#"{"id":11,"name":"Eddie","email":"eddie@example.org","role":"root"}"#,
        )
        .unwrap();

    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn test_unrelated_keys_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("origin.json");
    let storage = FileStorage::new(&path);
    storage.set("theme", "dark").unwrap();
    let store = SessionStore::new(storage);
    store.save(&editor_session(1)).unwrap();

    store.clear().unwrap();

    assert_eq!(
        store.storage().get("theme").unwrap().as_deref(),
        Some("dark")
    );
}
