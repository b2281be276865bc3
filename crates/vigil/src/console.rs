//! `Console` builder and composition root.
//!
//! The console owns one session lifecycle and wires it to everything
//! else: the login API, the input bus the shell feeds, the route table,
//! and the one-time expiry notice. There is no global; whoever builds a
//! `Console` owns it and calls [`Console::shutdown`] when done.

use tokio::sync::broadcast::{self, error::TryRecvError};
use vigil_activity::InputBus;
use vigil_guard::{GateOutcome, LoginNotice, NoticeSlot, Permissions, RouteTable};
use vigil_session::{
    ActiveSession, AuthState, Clock, Credentials, LifecycleEvent, LoginClient,
    SessionConfig, SessionHandle, SessionManager,
};
use vigil_store::{MemoryStorage, SessionStore, Storage, User};

use crate::VigilError;

/// Builder for configuring and starting a [`Console`].
///
/// # Example
///
/// ```rust,ignore
/// use vigil::prelude::*;
///
/// let console = Console::builder()
///     .storage(FileStorage::new("session.json"))
///     .build(my_login_client)
///     .await?;
/// ```
pub struct ConsoleBuilder<S: Storage = MemoryStorage> {
    storage: S,
    clock: Option<Clock>,
    session_config: SessionConfig,
    routes: RouteTable,
    bus: Option<InputBus>,
}

impl ConsoleBuilder<MemoryStorage> {
    /// Creates a builder with an in-memory store, the system clock, the
    /// default idle timeout and the CMS route table.
    pub fn new() -> Self {
        Self {
            storage: MemoryStorage::new(),
            clock: None,
            session_config: SessionConfig::default(),
            routes: RouteTable::cms(),
            bus: None,
        }
    }
}

impl Default for ConsoleBuilder<MemoryStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Storage> ConsoleBuilder<S> {
    /// Sets the durable storage backend.
    pub fn storage<T: Storage>(self, storage: T) -> ConsoleBuilder<T> {
        ConsoleBuilder {
            storage,
            clock: self.clock,
            session_config: self.session_config,
            routes: self.routes,
            bus: self.bus,
        }
    }

    /// Sets the clock. Defaults to [`Clock::system`].
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the route table.
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Uses an existing input bus instead of creating one.
    pub fn input_bus(mut self, bus: InputBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Starts the session lifecycle and waits for rehydration.
    ///
    /// A stored session that already expired is not an error: the console
    /// simply starts signed out.
    pub async fn build<L: LoginClient>(self, login: L) -> Result<Console<L>, VigilError> {
        let bus = self.bus.unwrap_or_default();
        let lifecycle = SessionManager::start(
            self.session_config,
            SessionStore::new(self.storage),
            self.clock.unwrap_or_else(Clock::system),
            bus.clone(),
        );
        // Subscribe before initialize so a stale-on-load event is seen.
        let events = lifecycle.subscribe();

        let state = match lifecycle.initialize().await {
            Ok(state) => state,
            Err(e) => {
                lifecycle.stop().await;
                return Err(e.into());
            }
        };
        tracing::info!(authenticated = state.is_authenticated(), "console ready");

        Ok(Console {
            login,
            lifecycle,
            bus,
            routes: self.routes,
            events,
            notice: NoticeSlot::new(),
        })
    }
}

/// A running console: one session lifecycle plus its navigation state.
pub struct Console<L> {
    login: L,
    lifecycle: SessionHandle,
    bus: InputBus,
    routes: RouteTable,
    events: broadcast::Receiver<LifecycleEvent>,
    notice: NoticeSlot,
}

impl Console<()> {
    /// Creates a new builder.
    pub fn builder() -> ConsoleBuilder {
        ConsoleBuilder::new()
    }
}

impl<L: LoginClient> Console<L> {
    /// Submits credentials and, on success, establishes the session.
    ///
    /// Login failures come back untouched as [`VigilError::Login`]; no
    /// session is created and no retry is attempted.
    pub async fn sign_in(
        &mut self,
        credentials: &Credentials,
    ) -> Result<ActiveSession, VigilError> {
        let response = match self.login.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(email = %credentials.email, error = %e, "login failed");
                return Err(e.into());
            }
        };
        let session = self.lifecycle.login(response.token, response.user).await?;
        self.drain_events();
        Ok(session)
    }

    /// Ends the session. Safe when already signed out.
    pub async fn sign_out(&mut self) -> Result<(), VigilError> {
        self.lifecycle.logout().await?;
        self.drain_events();
        Ok(())
    }

    /// Replaces the signed-in user's profile. Does nothing when signed out.
    pub async fn update_profile(&self, user: User) -> Result<(), VigilError> {
        self.lifecycle.update_user(user).await?;
        Ok(())
    }

    /// Decides what to show for `path`.
    ///
    /// The state is read before pending events are applied. The lifecycle
    /// sends an event before publishing the state it leads to, so a
    /// redirect after an idle expiry always carries the expired marker.
    pub fn navigate(&mut self, path: &str) -> GateOutcome {
        let state = self.lifecycle.state();
        self.drain_events();
        let outcome = self.routes.check(path, &state, self.notice.peek());
        tracing::debug!(path, %outcome, "navigate");
        outcome
    }

    /// The notice to show on the login surface, at most once.
    pub fn take_login_notice(&mut self) -> Option<LoginNotice> {
        self.drain_events();
        self.notice.take()
    }

    /// Current session state.
    pub fn state(&self) -> AuthState {
        self.lifecycle.state()
    }

    /// Role predicates for the current user.
    pub fn permissions(&self) -> Permissions {
        Permissions::of(&self.lifecycle.state())
    }

    /// The bus the shell forwards UI events to.
    pub fn input(&self) -> &InputBus {
        &self.bus
    }

    pub fn lifecycle(&self) -> &SessionHandle {
        &self.lifecycle
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Stops the lifecycle: no deadline, no listener. The stored session
    /// is kept for the next start.
    pub async fn shutdown(self) {
        self.lifecycle.stop().await;
        tracing::info!("console shut down");
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.notice.observe(&event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "lifecycle events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}
