//! End-to-end tests through the `Console` composition root.
//!
//! A fixture login API stands in for the real one. Time runs on a paused
//! Tokio clock anchored at `T0`.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time;
use vigil::prelude::*;
use vigil::store::{SessionStore, StoreError};

// =========================================================================
// Fixtures
// =========================================================================

const T0: u64 = 1_700_000_000_000;
const MINUTE: Duration = Duration::from_secs(60);

/// In-memory stand-in for the login endpoint.
struct FixtureApi {
    accounts: HashMap<String, (String, User)>,
}

impl FixtureApi {
    fn new() -> Self {
        let mut accounts = HashMap::new();
        for (id, name, role) in [
            (1, "ada", Role::Admin),
            (2, "eli", Role::Editor),
            (3, "vic", Role::Viewer),
        ] {
            let email = format!("{name}@example.org");
            let user = User {
                id: UserId(id),
                name: name.to_string(),
                email: email.clone(),
                role,
            };
            accounts.insert(email, ("correct horse".to_string(), user));
        }
        Self { accounts }
    }
}

impl LoginClient for FixtureApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, LoginError> {
        if credentials.email.is_empty() {
            let mut fields = FieldErrors::new();
            fields.insert("email".into(), vec!["is required".into()]);
            return Err(LoginError::Validation(fields));
        }
        match self.accounts.get(&credentials.email) {
            Some((password, user)) if *password == credentials.password => {
                Ok(LoginResponse {
                    token: BearerToken::new(format!("tok-{}", user.id.0))
                        .expect("fixture token is non-empty"),
                    user: user.clone(),
                })
            }
            _ => Err(LoginError::Rejected("Invalid email or password".into())),
        }
    }
}

fn creds(name: &str) -> Credentials {
    Credentials::new(format!("{name}@example.org"), "correct horse")
}

async fn console_at(storage: MemoryStorage, now_ms: u64) -> Console<FixtureApi> {
    Console::builder()
        .storage(storage)
        .clock(Clock::starting_at(now_ms))
        .build(FixtureApi::new())
        .await
        .unwrap()
}

async fn console() -> Console<FixtureApi> {
    console_at(MemoryStorage::new(), T0).await
}

// =========================================================================
// Startup
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_build_finishes_initialization() {
    let mut console = console().await;

    assert_eq!(console.state(), AuthState::Anonymous);
    assert_eq!(
        console.navigate("/dashboard"),
        GateOutcome::Redirect(Redirect::to_login(None))
    );
}

#[tokio::test(start_paused = true)]
async fn test_reload_restores_session_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut first = Console::builder()
        .storage(FileStorage::new(&path))
        .clock(Clock::starting_at(T0))
        .build(FixtureApi::new())
        .await
        .unwrap();
    first.sign_in(&creds("eli")).await.unwrap();
    first.shutdown().await;

    time::sleep(5 * MINUTE).await;
    let mut second = Console::builder()
        .storage(FileStorage::new(&path))
        .clock(Clock::starting_at(T0 + 5 * 60_000))
        .build(FixtureApi::new())
        .await
        .unwrap();

    assert_eq!(second.state().role(), Some(Role::Editor));
    assert!(second.navigate("/recipes").is_render());
}

#[tokio::test(start_paused = true)]
async fn test_stale_session_on_reload_shows_no_notice() {
    let storage = MemoryStorage::new();
    let mut first = console_at(storage.clone(), T0).await;
    first.sign_in(&creds("vic")).await.unwrap();
    first.shutdown().await;

    let mut second = console_at(storage.clone(), T0 + 31 * 60_000).await;

    assert_eq!(second.state(), AuthState::Anonymous);
    assert!(storage.is_empty());
    assert_eq!(
        second.navigate("/dashboard"),
        GateOutcome::Redirect(Redirect::to_login(None))
    );
    assert_eq!(second.take_login_notice(), None);
}

// =========================================================================
// Sign in / sign out
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_sign_in_establishes_session() {
    let mut console = console().await;

    let session = console.sign_in(&creds("ada")).await.unwrap();

    assert_eq!(session.user.role, Role::Admin);
    assert_eq!(session.token.authorization_header(), "Bearer tok-1");
    assert!(console.permissions().is_admin);
    assert!(console.navigate("/users").is_render());
}

#[tokio::test(start_paused = true)]
async fn test_sign_in_rejected_surfaces_message() {
    let storage = MemoryStorage::new();
    let mut console = console_at(storage.clone(), T0).await;

    let err = console
        .sign_in(&Credentials::new("ada@example.org", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(
        err.login_message().as_deref(),
        Some("Invalid email or password")
    );
    assert_eq!(console.state(), AuthState::Anonymous);
    assert!(storage.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sign_in_validation_prefers_field_errors() {
    let mut console = console().await;

    let err = console
        .sign_in(&Credentials::new("", "whatever"))
        .await
        .unwrap_err();

    assert!(matches!(err, VigilError::Login(LoginError::Validation(_))));
    assert_eq!(err.login_message().as_deref(), Some("email: is required"));
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_redirects_without_marker() {
    let mut console = console().await;
    console.sign_in(&creds("vic")).await.unwrap();

    console.sign_out().await.unwrap();
    console.sign_out().await.unwrap();

    assert_eq!(
        console.navigate("/dashboard"),
        GateOutcome::Redirect(Redirect::to_login(None))
    );
    assert_eq!(console.take_login_notice(), None);
}

// =========================================================================
// Idle expiry end to end
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_scroll_renews_then_expiry_redirects_with_marker() {
    let storage = MemoryStorage::new();
    let mut console = console_at(storage.clone(), T0).await;
    console.sign_in(&creds("vic")).await.unwrap();

    // Minute 29: a scroll.
    time::sleep(29 * MINUTE).await;
    let mut state = console.lifecycle().watch();
    state.borrow_and_update();
    console.input().emit(InputEvent::Scroll);
    state.changed().await.unwrap();

    // Minute 30: still signed in, window runs to minute 59.
    time::sleep(MINUTE).await;
    assert!(console.navigate("/dashboard").is_render());

    // Minute 59 + 1s: expired.
    time::sleep(29 * MINUTE + Duration::from_secs(1)).await;
    let outcome = console.navigate("/dashboard");
    let GateOutcome::Redirect(redirect) = outcome else {
        panic!("expected a login redirect, got {outcome:?}");
    };
    assert_eq!(redirect.path(), "/login?reason=expired");
    assert!(storage.is_empty());

    // The login view shows the notice once.
    assert_eq!(console.take_login_notice(), Some(LoginNotice::Expired));
    assert_eq!(console.take_login_notice(), None);
    assert_eq!(
        console.navigate("/dashboard"),
        GateOutcome::Redirect(Redirect::to_login(None))
    );
}

#[tokio::test(start_paused = true)]
async fn test_sign_in_after_expiry_clears_notice() {
    let mut console = console().await;
    console.sign_in(&creds("vic")).await.unwrap();
    time::sleep(31 * MINUTE).await;
    assert!(!console.navigate("/dashboard").is_render());

    console.sign_in(&creds("vic")).await.unwrap();

    assert_eq!(console.take_login_notice(), None);
}

// =========================================================================
// Roles
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_anonymous_on_admin_route_is_redirected_not_forbidden() {
    let mut console = console().await;

    assert!(matches!(
        console.navigate("/settings"),
        GateOutcome::Redirect(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_viewer_on_admin_route_is_forbidden() {
    let mut console = console().await;
    console.sign_in(&creds("vic")).await.unwrap();

    assert!(matches!(
        console.navigate("/users"),
        GateOutcome::Forbidden { role: Role::Viewer, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_update_profile_recomputes_permissions() {
    let storage = MemoryStorage::new();
    let mut console = console_at(storage.clone(), T0).await;
    let session = console.sign_in(&creds("vic")).await.unwrap();
    assert!(!console.permissions().can_edit);

    let promoted = User {
        role: Role::Editor,
        ..session.user
    };
    console.update_profile(promoted).await.unwrap();

    assert!(console.permissions().can_edit);
    assert!(console.navigate("/scriptures").is_render());
    let stored = SessionStore::new(storage).load().unwrap().unwrap();
    assert_eq!(stored.user.role, Role::Editor);
    assert_eq!(stored.token, session.token);
}

// =========================================================================
// Multi-thread runtime
// =========================================================================

/// Memory storage whose `remove` is slow, widening the time an expiry
/// spends between clearing memory and finishing with the store.
#[derive(Clone, Default)]
struct SlowRemoveStorage(MemoryStorage);

impl Storage for SlowRemoveStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.0.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.0.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        std::thread::sleep(Duration::from_millis(100));
        self.0.remove(key)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_expiry_redirect_carries_marker_on_multi_thread_runtime() {
    let mut console = Console::builder()
        .storage(SlowRemoveStorage::default())
        .session_config(SessionConfig {
            idle_timeout: Duration::from_secs(1),
        })
        .build(FixtureApi::new())
        .await
        .unwrap();
    console.sign_in(&creds("vic")).await.unwrap();

    let mut state = console.lifecycle().watch();
    state.wait_for(|s| !s.is_authenticated()).await.unwrap();
    let outcome = console.navigate("/dashboard");

    let GateOutcome::Redirect(redirect) = outcome else {
        panic!("expected a login redirect, got {outcome:?}");
    };
    assert_eq!(redirect.path(), "/login?reason=expired");
}
