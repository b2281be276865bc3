//! User-interaction activity monitor for Vigil.
//!
//! Answers one question: is a live human using the console right now?
//! The shell forwards raw UI events onto an [`InputBus`]. While a session
//! is authenticated, an attached [`ActivityMonitor`] listens to that bus,
//! keeps only the four interaction kinds that count as activity, and
//! calls [`ActivitySink::on_activity`] once per qualifying event.
//!
//! # Attachment is all-or-nothing
//!
//! A detached monitor holds no subscription and no task. This matters:
//! a listener left running with no session would go on renewing a
//! session that no longer exists.
//!
//! ```ignore
//! let mut monitor = ActivityMonitor::new(bus.clone());
//! monitor.start(sink);   // session became authenticated
//! // ... events flow, sink is called ...
//! monitor.stop().await;  // session ended; nothing left running
//! ```
//!
//! The monitor passes every signal straight through. Rate limiting, if
//! any, is the sink's business.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Events and signals
// ---------------------------------------------------------------------------

/// Every UI event the shell may forward onto the bus.
///
/// Most of these are passive and do NOT count as activity: a mouse drifting
/// over an unattended screen, a window regaining focus, a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    PointerDown,
    KeyDown,
    Scroll,
    TouchStart,
    MouseMove,
    Focus,
    Blur,
    Resize,
    VisibilityChange,
}

/// The fixed set of interactions accepted as evidence of a live user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivitySignal {
    PointerDown,
    KeyDown,
    Scroll,
    TouchStart,
}

impl ActivitySignal {
    pub const ALL: [ActivitySignal; 4] = [
        ActivitySignal::PointerDown,
        ActivitySignal::KeyDown,
        ActivitySignal::Scroll,
        ActivitySignal::TouchStart,
    ];

    /// Maps a raw event to a signal. `None` for passive events.
    pub fn from_event(event: InputEvent) -> Option<Self> {
        match event {
            InputEvent::PointerDown => Some(Self::PointerDown),
            InputEvent::KeyDown => Some(Self::KeyDown),
            InputEvent::Scroll => Some(Self::Scroll),
            InputEvent::TouchStart => Some(Self::TouchStart),
            InputEvent::MouseMove
            | InputEvent::Focus
            | InputEvent::Blur
            | InputEvent::Resize
            | InputEvent::VisibilityChange => None,
        }
    }
}

// ---------------------------------------------------------------------------
// InputBus
// ---------------------------------------------------------------------------

/// The page's event source.
///
/// A broadcast channel: the shell emits, attached monitors receive. Cheap
/// to clone; all clones feed the same listeners.
#[derive(Debug, Clone)]
pub struct InputBus {
    tx: broadcast::Sender<InputEvent>,
}

impl InputBus {
    /// Events buffered per listener before a slow listener starts lagging.
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event. Never blocks; with no listener it is dropped.
    pub fn emit(&self, event: InputEvent) {
        // `send` only fails when nobody is listening, which is the normal
        // state while signed out.
        let _ = self.tx.send(event);
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn subscribe(&self) -> broadcast::Receiver<InputEvent> {
        self.tx.subscribe()
    }
}

impl Default for InputBus {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ActivitySink
// ---------------------------------------------------------------------------

/// Receives activity signals from an attached monitor.
///
/// Called from the monitor's task, so it must not block. Closures work
/// directly:
///
/// ```
/// use vigil_activity::{ActivitySignal, ActivitySink};
///
/// fn takes_sink(_: impl ActivitySink) {}
/// takes_sink(|signal: ActivitySignal| println!("{signal:?}"));
/// ```
pub trait ActivitySink: Send + Sync + 'static {
    fn on_activity(&self, signal: ActivitySignal);
}

impl<F> ActivitySink for F
where
    F: Fn(ActivitySignal) + Send + Sync + 'static,
{
    fn on_activity(&self, signal: ActivitySignal) {
        self(signal)
    }
}

// ---------------------------------------------------------------------------
// ActivityMonitor
// ---------------------------------------------------------------------------

/// Listens to an [`InputBus`] while attached and forwards activity signals.
///
/// Owned by whoever decides when a session is live; that owner calls
/// [`start`](Self::start) and [`stop`](Self::stop). Dropping an attached
/// monitor aborts its task.
#[derive(Debug)]
pub struct ActivityMonitor {
    bus: InputBus,
    task: Option<JoinHandle<()>>,
}

impl ActivityMonitor {
    pub fn new(bus: InputBus) -> Self {
        Self { bus, task: None }
    }

    /// Attaches to the bus and starts forwarding signals to `sink`.
    ///
    /// Starting an already-attached monitor is a no-op: there is never
    /// more than one listener per monitor. Must be called from within a
    /// Tokio runtime.
    pub fn start<K: ActivitySink>(&mut self, sink: K) {
        if self.is_attached() {
            return;
        }

        let mut rx = self.bus.subscribe();
        self.task = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Some(signal) = ActivitySignal::from_event(event) {
                            trace!(?signal, "activity signal");
                            sink.on_activity(signal);
                        }
                    }
                    // Dropped events are gone; the ones still buffered
                    // are delivered next, so keep going.
                    Err(RecvError::Lagged(missed)) => {
                        trace!(missed, "activity listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));

        debug!("activity monitor attached");
    }

    /// Detaches from the bus.
    ///
    /// When this returns, the listener task has finished and its
    /// subscription is gone. Safe to call when already detached.
    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Awaiting the aborted task drops its receiver before we return.
            let _ = task.await;
            debug!("activity monitor detached");
        }
    }

    /// Whether a listener is currently attached.
    pub fn is_attached(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for ActivityMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_event_accepts_only_interaction_kinds() {
        let accepted: Vec<_> = [
            InputEvent::PointerDown,
            InputEvent::KeyDown,
            InputEvent::Scroll,
            InputEvent::TouchStart,
            InputEvent::MouseMove,
            InputEvent::Focus,
            InputEvent::Blur,
            InputEvent::Resize,
            InputEvent::VisibilityChange,
        ]
        .into_iter()
        .filter_map(ActivitySignal::from_event)
        .collect();

        assert_eq!(accepted, ActivitySignal::ALL.to_vec());
    }

    #[test]
    fn test_emit_without_listeners_is_silent() {
        let bus = InputBus::new();
        bus.emit(InputEvent::KeyDown);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_new_monitor_is_detached() {
        let monitor = ActivityMonitor::new(InputBus::new());
        assert!(!monitor.is_attached());
    }
}
