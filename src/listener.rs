//! Non-owning event handles and scoped cancellation guards.

use crate::event::Event;
use std::rc::{Rc, Weak};

/// A non-owning handle to a scheduled [`Event`].
///
/// Listeners observe an event without keeping it alive: once the loop drops
/// the event (fired one-shot, discarded after cancellation, loop destroyed),
/// the listener expires. Cancelling through an expired listener is a no-op.
#[derive(Debug, Clone, Default)]
pub struct EventListener {
    event: Weak<Event>,
}

impl EventListener {
    pub(crate) fn new(event: Weak<Event>) -> Self {
        Self { event }
    }

    /// Sets the event's cancelled flag, if the event still exists.
    pub fn cancel(&self) {
        if let Some(event) = self.event.upgrade() {
            event.cancel();
        }
    }

    /// Returns true once the underlying event has been destroyed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.event.strong_count() == 0
    }

    /// Returns the underlying event if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Rc<Event>> {
        self.event.upgrade()
    }
}

/// A move-only scoped owner of an [`EventListener`] that cancels on drop.
///
/// Overwriting a guard through assignment drops — and therefore cancels —
/// whatever it previously held. A guard built from an expired listener does
/// nothing on drop.
///
/// ```
/// use tickloop::{EventGuard, EventLoop};
///
/// let event_loop = EventLoop::new();
/// {
///     let _guard = EventGuard::from(event_loop.schedule(50, || Ok(())));
///     // guard dropped here, cancelling the event
/// }
/// event_loop.process(50).unwrap(); // fires nothing
/// ```
#[derive(Debug, Default)]
pub struct EventGuard {
    listener: EventListener,
}

impl EventGuard {
    /// Wraps a listener in a cancelling guard.
    #[must_use]
    pub fn new(listener: EventListener) -> Self {
        Self { listener }
    }

    /// Cancels the held event explicitly.
    ///
    /// The guard keeps holding the (now cancelled) listener; cancellation is
    /// idempotent, so the eventual drop is harmless.
    pub fn release(&self) {
        self.listener.cancel();
    }

    /// Returns the held listener.
    #[must_use]
    pub const fn listener(&self) -> &EventListener {
        &self.listener
    }
}

impl From<EventListener> for EventGuard {
    fn from(listener: EventListener) -> Self {
        Self::new(listener)
    }
}

impl Drop for EventGuard {
    fn drop(&mut self) {
        self.listener.cancel();
    }
}
