//! Scheduled events and their handlers.
//!
//! An [`Event`] is one unit of scheduled work: a handler, a due time, and —
//! for recurring events — a re-arm interval. Events are owned by the loop's
//! timer table and observed from outside through
//! [`EventListener`](crate::EventListener) handles.
//!
//! The crate runs single-threaded and cooperative, so the fields a handler
//! may touch mid-flight (`cancelled`, `due_time`) live in [`Cell`]s: writes
//! made by a handler are visible to the loop as soon as the handler returns,
//! which is the memory discipline the scheduler relies on.

use crate::error::Result;
use crate::time::Tick;
use crate::tracing_compat::trace;
use core::fmt;
use std::cell::{Cell, RefCell};

/// A type-erased event handler.
///
/// Handlers come in two arities: a plain callable, or one that receives the
/// event itself so it can self-cancel or self-reschedule. The arity is fixed
/// at construction and dispatched when the event fires.
pub struct EventHandler {
    inner: HandlerFn,
}

enum HandlerFn {
    Plain(Box<dyn FnMut() -> Result<()>>),
    WithEvent(Box<dyn FnMut(&Event) -> Result<()>>),
}

impl EventHandler {
    /// Wraps a handler that takes no arguments.
    pub fn new<F>(handler: F) -> Self
    where
        F: FnMut() -> Result<()> + 'static,
    {
        Self {
            inner: HandlerFn::Plain(Box::new(handler)),
        }
    }

    /// Wraps a handler that receives the firing event, so it can cancel or
    /// reschedule itself.
    pub fn with_event<F>(handler: F) -> Self
    where
        F: FnMut(&Event) -> Result<()> + 'static,
    {
        Self {
            inner: HandlerFn::WithEvent(Box::new(handler)),
        }
    }

    fn invoke(&mut self, event: &Event) -> Result<()> {
        match &mut self.inner {
            HandlerFn::Plain(f) => f(),
            HandlerFn::WithEvent(f) => f(event),
        }
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arity = match &self.inner {
            HandlerFn::Plain(_) => "plain",
            HandlerFn::WithEvent(_) => "with_event",
        };
        f.debug_struct("EventHandler").field("arity", &arity).finish()
    }
}

/// A scheduled unit of work.
///
/// While pending, an event is owned by exactly one timer slot. During a
/// `process` call it is temporarily owned by the drain batch and then either
/// re-inserted (recurring or rescheduled) or dropped (fired one-shot,
/// cancelled).
pub struct Event {
    handler: RefCell<EventHandler>,
    interval: Tick,
    recurring: bool,
    due_time: Cell<Tick>,
    cancelled: Cell<bool>,
}

impl Event {
    pub(crate) fn new(handler: EventHandler, interval: Tick, due_time: Tick, recurring: bool) -> Self {
        Self {
            handler: RefCell::new(handler),
            interval,
            recurring,
            due_time: Cell::new(due_time),
            cancelled: Cell::new(false),
        }
    }

    /// Invokes the handler. Handler errors propagate to the loop driver.
    pub(crate) fn fire(&self) -> Result<()> {
        self.handler.borrow_mut().invoke(self)
    }

    /// Re-arms a recurring event at a new due time after it fired.
    pub(crate) fn rearm(&self, due_time: Tick) {
        self.due_time.set(due_time);
    }

    /// Marks the event as cancelled.
    ///
    /// Cancellation is monotonic and idempotent. The loop discards cancelled
    /// events lazily on its next visit; a cancelled event never fires again,
    /// even when the cancel happens earlier in the same drain batch.
    pub fn cancel(&self) {
        trace!(due_time = self.due_time.get(), "event cancelled");
        self.cancelled.set(true);
    }

    /// Returns true once the event has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Moves the event's due time.
    ///
    /// The timer table is reconciled on the loop's next visit: a due time in
    /// the future re-files the event, a due time at or before the current
    /// tick lets it fire in the ongoing `process` call. Rescheduling a
    /// cancelled event moves it but cancellation stays dominant.
    pub fn reschedule(&self, due_time: Tick) {
        trace!(
            from = self.due_time.get(),
            to = due_time,
            "event rescheduled"
        );
        self.due_time.set(due_time);
    }

    /// The slot at which the loop intends to fire this event.
    #[must_use]
    pub fn due_time(&self) -> Tick {
        self.due_time.get()
    }

    /// The re-arm interval; meaningful only for recurring events.
    #[must_use]
    pub const fn interval(&self) -> Tick {
        self.interval
    }

    /// Returns true if the event re-arms after firing.
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        self.recurring
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("due_time", &self.due_time.get())
            .field("interval", &self.interval)
            .field("recurring", &self.recurring)
            .field("cancelled", &self.cancelled.get())
            .finish_non_exhaustive()
    }
}
