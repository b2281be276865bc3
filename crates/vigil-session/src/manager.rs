//! The session manager: the single owner of "who is logged in".
//!
//! [`SessionManager::start`] spawns one Tokio task (the actor) that owns:
//! - the in-memory session,
//! - the [`SessionStore`] it mirrors to,
//! - the one idle deadline,
//! - the [`ActivityMonitor`], attached exactly while authenticated.
//!
//! Everyone else holds a [`SessionHandle`]: commands go in over a channel,
//! state comes out over a `watch` (read synchronously by route gates) and
//! events over a `broadcast` (consumed by the navigation layer).
//!
//! # One deadline
//!
//! The deadline is a single `Option<Instant>` field. Scheduling a new one
//! overwrites the old one, so "cancel then reschedule" can't leave two
//! timers running, and an expiry can't fire twice.
//!
//! ```text
//!              login / restore ──→ deadline = now + remaining
//!   activity (while signed in) ──→ deadline = now + idle_timeout
//!            logout / expiry   ──→ deadline = None, monitor detached
//! ```
//!
//! Commands are polled before the deadline (`biased` select), so an
//! activity signal already queued when the deadline comes due still wins.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{self, Instant};
use vigil_activity::{ActivityMonitor, ActivitySignal, ActivitySink, InputBus};
use vigil_store::{
    BearerToken, Codec, JsonCodec, PersistedSession, SessionStore, Storage, User,
};

use crate::{
    ActiveSession, AuthState, Clock, LifecycleEvent, SessionConfig, SessionError,
    SignOutReason,
};

/// Lifecycle events buffered per subscriber.
const EVENT_CHANNEL_SIZE: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Commands sent to the lifecycle actor.
enum Command {
    Initialize { reply: Reply<AuthState> },
    Login {
        token: BearerToken,
        user: User,
        reply: Reply<ActiveSession>,
    },
    Logout { reply: Reply<()> },
    UpdateUser { user: User, reply: Reply<()> },
    /// Fire-and-forget; sent for every activity signal.
    RenewActivity,
    Stop { reply: oneshot::Sender<()> },
}

// ---------------------------------------------------------------------------
// SessionManager
// ---------------------------------------------------------------------------

/// Entry point: starts a session lifecycle.
///
/// There is no global instance. Each call builds an independent lifecycle
/// with its own store, clock and deadline, so an application owns exactly
/// the one it creates and tests can run as many as they like.
pub struct SessionManager;

impl SessionManager {
    /// Spawns the lifecycle actor with the default JSON codec.
    ///
    /// The returned handle reports [`AuthState::Initializing`] until
    /// [`SessionHandle::initialize`] has run. Must be called from within a
    /// Tokio runtime.
    pub fn start<S: Storage>(
        config: SessionConfig,
        store: SessionStore<S, JsonCodec>,
        clock: Clock,
        bus: InputBus,
    ) -> SessionHandle {
        Self::start_with_codec(config, store, clock, bus)
    }

    /// Same as [`start`](Self::start) for a store with a custom codec.
    pub fn start_with_codec<S: Storage, C: Codec>(
        config: SessionConfig,
        store: SessionStore<S, C>,
        clock: Clock,
        bus: InputBus,
    ) -> SessionHandle {
        let config = config.validated();
        let (sender, receiver) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(AuthState::Initializing);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        let actor = LifecycleActor {
            config,
            store,
            clock,
            session: None,
            initialized: false,
            deadline: None,
            monitor: ActivityMonitor::new(bus),
            // Weak, so the monitor alone can't keep the actor alive after
            // every handle is gone.
            sink: RenewSink(sender.downgrade()),
            state_tx,
            events: events.clone(),
            receiver,
        };
        tokio::spawn(actor.run());

        SessionHandle {
            sender,
            state: state_rx,
            events,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Handle to a running session lifecycle.
///
/// Cheap to clone. Every clone talks to the same actor.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<AuthState>,
    events: broadcast::Sender<LifecycleEvent>,
}

impl SessionHandle {
    /// Rehydrates from the store. Runs once; later calls just return the
    /// current state.
    ///
    /// A stored session already past its idle window is cleared and the
    /// result is [`AuthState::Anonymous`]. That is a normal outcome, not
    /// an error.
    pub async fn initialize(&self) -> Result<AuthState, SessionError> {
        self.request(|reply| Command::Initialize { reply }).await
    }

    /// Establishes a session: memory and store, with a full idle window.
    ///
    /// Replaces any session already present.
    pub async fn login(
        &self,
        token: BearerToken,
        user: User,
    ) -> Result<ActiveSession, SessionError> {
        self.request(|reply| Command::Login { token, user, reply })
            .await
    }

    /// Ends the session. Safe to call when already signed out.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Logout { reply }).await
    }

    /// Replaces the user record, keeping token, activity time and deadline.
    ///
    /// Does nothing when signed out.
    pub async fn update_user(&self, user: User) -> Result<(), SessionError> {
        self.request(|reply| Command::UpdateUser { user, reply }).await
    }

    /// Records activity now and restarts the idle window.
    ///
    /// Normally driven by the activity monitor; exposed for shells that
    /// have their own notion of activity. Ignored when signed out.
    pub fn renew_activity(&self) {
        let _ = self.sender.send(Command::RenewActivity);
    }

    /// Current state. Never blocks.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every state change.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.clone()
    }

    /// Subscribes to lifecycle events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// Stops the lifecycle: cancels the deadline and detaches the activity
    /// monitor. The stored session is kept, so the next start rehydrates it.
    ///
    /// Returns once the actor has finished. Safe to call more than once.
    pub async fn stop(&self) {
        let (reply, done) = oneshot::channel();
        if self.sender.send(Command::Stop { reply }).is_ok() {
            let _ = done.await;
        }
    }

    /// Whether the actor is still running.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(make(reply))
            .map_err(|_| SessionError::Stopped)?;
        response.await.map_err(|_| SessionError::Stopped)?
    }
}

/// Feeds activity signals back into the actor that owns the monitor.
#[derive(Clone)]
struct RenewSink(mpsc::WeakUnboundedSender<Command>);

impl ActivitySink for RenewSink {
    fn on_activity(&self, _signal: ActivitySignal) {
        if let Some(sender) = self.0.upgrade() {
            let _ = sender.send(Command::RenewActivity);
        }
    }
}

// ---------------------------------------------------------------------------
// The actor
// ---------------------------------------------------------------------------

struct LifecycleActor<S: Storage, C: Codec> {
    config: SessionConfig,
    store: SessionStore<S, C>,
    clock: Clock,
    session: Option<ActiveSession>,
    /// Set once the first decision has been made (initialize, login or
    /// logout). Until then the published state is `Initializing`.
    initialized: bool,
    deadline: Option<Instant>,
    monitor: ActivityMonitor,
    sink: RenewSink,
    state_tx: watch::Sender<AuthState>,
    events: broadcast::Sender<LifecycleEvent>,
    receiver: mpsc::UnboundedReceiver<Command>,
}

impl<S: Storage, C: Codec> LifecycleActor<S, C> {
    async fn run(mut self) {
        tracing::debug!(
            idle_timeout_ms = self.config.idle_timeout_ms(),
            "session lifecycle started"
        );

        loop {
            tokio::select! {
                biased;

                cmd = self.receiver.recv() => match cmd {
                    Some(Command::Stop { reply }) => {
                        self.teardown().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(cmd) => self.handle(cmd).await,
                    None => {
                        self.teardown().await;
                        break;
                    }
                },
                () = wait_for_deadline(self.deadline) => self.expire().await,
            }
        }

        tracing::debug!("session lifecycle stopped");
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Initialize { reply } => {
                let result = self.initialize();
                let _ = reply.send(result);
            }
            Command::Login { token, user, reply } => {
                let result = self.login(token, user).await;
                let _ = reply.send(result);
            }
            Command::Logout { reply } => {
                let result = self.sign_out(SignOutReason::Logout).await;
                let _ = reply.send(result);
            }
            Command::UpdateUser { user, reply } => {
                let result = self.update_user(user);
                let _ = reply.send(result);
            }
            Command::RenewActivity => self.renew(),
            // Handled in `run`, where the loop can break.
            Command::Stop { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn initialize(&mut self) -> Result<AuthState, SessionError> {
        if self.initialized {
            return Ok(self.snapshot());
        }
        let result = self.rehydrate();
        // The loading state ends even if the store failed: there is no
        // session we could have restored.
        self.initialized = true;
        self.publish();
        result.map(|()| self.snapshot())
    }

    fn rehydrate(&mut self) -> Result<(), SessionError> {
        let Some(persisted) = self.store.load()? else {
            tracing::debug!("no stored session");
            return Ok(());
        };

        let now = self.clock.now_ms();
        let timeout_ms = self.config.idle_timeout_ms();

        if persisted.last_activity_ms > now {
            // A timestamp from the future breaks `last_activity <= now`;
            // trusting it would stretch the idle window.
            tracing::debug!(
                last_activity_ms = persisted.last_activity_ms,
                now_ms = now,
                "stored session has a future timestamp, discarding"
            );
            self.store.clear()?;
            return Ok(());
        }

        let elapsed_ms = now - persisted.last_activity_ms;
        if elapsed_ms >= timeout_ms {
            tracing::info!(
                user_id = %persisted.user.id,
                idle_ms = elapsed_ms,
                "stored session already expired"
            );
            self.store.clear()?;
            self.emit(LifecycleEvent::SignedOut {
                reason: SignOutReason::StaleOnLoad,
            });
            return Ok(());
        }

        let remaining = Duration::from_millis(timeout_ms - elapsed_ms);
        let session = ActiveSession::from_persisted(persisted, timeout_ms);
        let user_id = session.user.id;

        tracing::info!(
            %user_id,
            role = %session.user.role,
            remaining_ms = remaining.as_millis() as u64,
            "session restored"
        );

        self.session = Some(session);
        self.schedule(remaining);
        self.monitor.start(self.sink.clone());
        self.emit(LifecycleEvent::Restored { user_id, remaining });
        Ok(())
    }

    async fn login(
        &mut self,
        token: BearerToken,
        user: User,
    ) -> Result<ActiveSession, SessionError> {
        let persisted = PersistedSession {
            token,
            user,
            last_activity_ms: self.clock.now_ms(),
        };

        // Store first: if it fails, memory is untouched and the store is
        // put back in step with it.
        if let Err(e) = self.store.save(&persisted) {
            tracing::warn!(error = %e, "failed to persist session");
            self.restore_store().await;
            return Err(e.into());
        }

        let session =
            ActiveSession::from_persisted(persisted, self.config.idle_timeout_ms());
        let (user_id, role) = (session.user.id, session.user.role);

        self.session = Some(session.clone());
        self.initialized = true;
        self.schedule(self.config.idle_timeout);
        self.monitor.start(self.sink.clone());

        tracing::info!(%user_id, %role, "session established");
        self.emit(LifecycleEvent::SignedIn { user_id, role });
        self.publish();
        Ok(session)
    }

    /// Rewrites the store to match memory after a failed save.
    ///
    /// With no session in memory the partial write is cleared. With one,
    /// it is saved again; if even that fails, the session is ended so a
    /// reload can't disagree with what is on screen.
    async fn restore_store(&mut self) {
        let Some(current) = &self.session else {
            if let Err(e) = self.store.clear() {
                tracing::warn!(error = %e, "failed to clear partial session write");
            }
            return;
        };

        let previous = PersistedSession {
            token: current.token.clone(),
            user: current.user.clone(),
            last_activity_ms: current.last_activity_ms,
        };
        if let Err(e) = self.store.save(&previous) {
            tracing::warn!(error = %e, "failed to restore stored session, signing out");
            if let Err(e) = self.sign_out(SignOutReason::Logout).await {
                tracing::warn!(error = %e, "failed to clear stored session");
            }
        }
    }

    /// Logout and expiry share this path. A store failure still leaves
    /// the console signed out.
    ///
    /// The event goes out before the new state is published: anyone who
    /// observes `Anonymous` can already read why.
    async fn sign_out(&mut self, reason: SignOutReason) -> Result<(), SessionError> {
        self.deadline = None;
        let previous = self.session.take();
        self.monitor.stop().await;
        self.initialized = true;

        let cleared = self.store.clear();
        if let Err(e) = &cleared {
            tracing::warn!(error = %e, "failed to clear stored session");
        }

        if let Some(session) = previous {
            tracing::info!(user_id = %session.user.id, ?reason, "session ended");
            self.emit(LifecycleEvent::SignedOut { reason });
        }
        self.publish();
        cleared.map_err(Into::into)
    }

    fn update_user(&mut self, user: User) -> Result<(), SessionError> {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("user update ignored: no active session");
            return Ok(());
        };

        self.store.save_user(&user)?;
        let (user_id, role) = (user.id, user.role);
        session.user = user;

        tracing::debug!(%user_id, %role, "session user updated");
        self.emit(LifecycleEvent::UserUpdated { user_id, role });
        self.publish();
        Ok(())
    }

    fn renew(&mut self) {
        let timeout_ms = self.config.idle_timeout_ms();
        let Some(session) = self.session.as_mut() else {
            tracing::trace!("activity ignored: no active session");
            return;
        };

        let now = self.clock.now_ms().max(session.last_activity_ms);
        session.last_activity_ms = now;
        session.expires_at_ms = now.saturating_add(timeout_ms);
        self.schedule(self.config.idle_timeout);

        // Persist so a reload mid-session keeps the renewed window.
        if let Err(e) = self.store.touch(now) {
            tracing::warn!(error = %e, "failed to persist activity timestamp");
        }
        self.publish();
    }

    async fn expire(&mut self) {
        tracing::debug!("idle deadline reached");
        if let Err(e) = self.sign_out(SignOutReason::IdleTimeout).await {
            tracing::warn!(error = %e, "expiry could not clear the store");
        }
    }

    /// Stops timers and listeners. Leaves the session in place.
    async fn teardown(&mut self) {
        self.deadline = None;
        self.monitor.stop().await;
    }

    fn schedule(&mut self, after: Duration) {
        // `validated()` bounds the timeout, so this only fails on a
        // platform clock with almost no range left.
        self.deadline = Instant::now().checked_add(after);
        match self.deadline {
            Some(_) => {
                tracing::debug!(after_ms = after.as_millis() as u64, "idle deadline scheduled")
            }
            None => tracing::warn!(
                after_secs = after.as_secs(),
                "idle deadline out of range, not scheduled"
            ),
        }
    }

    fn snapshot(&self) -> AuthState {
        match (&self.session, self.initialized) {
            (Some(session), _) => AuthState::Authenticated(session.clone()),
            (None, true) => AuthState::Anonymous,
            (None, false) => AuthState::Initializing,
        }
    }

    fn publish(&self) {
        let state = self.snapshot();
        self.state_tx.send_replace(state);
    }

    fn emit(&self, event: LifecycleEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Resolves at the deadline, or never when there isn't one.
async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
