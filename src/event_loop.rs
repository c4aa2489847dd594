//! The externally-driven virtual-time event loop.
//!
//! The loop owns a timer table keyed on virtual-time slots and fires due
//! events when the host calls [`EventLoop::process`] with the current tick.
//! Nothing fires outside of `process`; handlers run synchronously on the
//! caller's thread and may freely schedule, cancel, and reschedule — the
//! table borrow is never held across a handler call.
//!
//! # Lock discipline
//!
//! The timer table sits behind a `RefCell`, the single-threaded rendition of
//! a scheduler mutex. The borrow is taken for insertion, for the harvest
//! pass, and briefly to re-enqueue recurring or rescheduled events between
//! handler calls — exactly the scopes a real mutex would guard, and the
//! `RefCell` enforces at runtime that no handler runs inside one.

use crate::error::{Error, ErrorKind, Result};
use crate::event::{Event, EventHandler};
use crate::listener::{EventGuard, EventListener};
use crate::promise::compose::{race2, RaceResult};
use crate::promise::Promise;
use crate::time::{SchedulePolicy, Tick};
use crate::tracing_compat::{debug, trace};
use core::fmt;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

/// What `process` does when the host hands it a tick behind the counter.
///
/// Virtual time must be monotonically non-decreasing; a backward tick is a
/// host bug, and the loop either reports it or papers over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackwardTime {
    /// Fail the `process` call with [`ErrorKind::TimeRegression`].
    #[default]
    Reject,
    /// Clamp the tick to the current counter and proceed.
    Clamp,
}

/// Event loop configuration.
#[derive(Debug, Clone, Default)]
pub struct LoopConfig {
    /// Policy for backward `process` calls.
    pub backward_time: BackwardTime,
}

impl LoopConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backward-time policy.
    #[must_use]
    pub fn backward_time(mut self, policy: BackwardTime) -> Self {
        self.backward_time = policy;
        self
    }
}

/// The timeout tag: a timed race was won by elapsed time, not by the
/// underlying promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimedOut;

/// The value of a promise returned by [`EventLoop::timeout`]: either the
/// underlying promise's value or the [`TimedOut`] tag.
pub type TimeoutResult<T> = RaceResult<T, TimedOut>;

impl<T> RaceResult<T, TimedOut> {
    /// Returns true if the delay elapsed before the underlying promise
    /// settled.
    #[must_use]
    pub const fn timed_out(&self) -> bool {
        matches!(self, Self::Second(TimedOut))
    }

    /// Returns the underlying promise's value, unless the race timed out.
    pub fn into_completed(self) -> Option<T> {
        self.into_first()
    }
}

type EventQueue = VecDeque<Rc<Event>>;
type TimerTable = BTreeMap<Tick, EventQueue>;

struct LoopInner {
    timers: RefCell<TimerTable>,
    counter: Cell<Tick>,
    config: LoopConfig,
}

/// An externally-clocked cooperative scheduler.
///
/// `EventLoop` is a cheap, cloneable handle; clones share the same timer
/// table and counter, which is how handlers and the `debounce`/`throttle`
/// callables reach the loop they were created on.
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<LoopInner>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("counter", &self.inner.counter.get())
            .field("pending_events", &self.pending_events())
            .finish_non_exhaustive()
    }
}

impl EventLoop {
    /// Creates an event loop with the default configuration, counter at 0.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LoopConfig::default())
    }

    /// Creates an event loop with an explicit configuration.
    #[must_use]
    pub fn with_config(config: LoopConfig) -> Self {
        Self {
            inner: Rc::new(LoopInner {
                timers: RefCell::new(TimerTable::new()),
                counter: Cell::new(0),
                config,
            }),
        }
    }

    // === Diagnostics ===

    /// The loop's current virtual time; updated only by [`process`].
    ///
    /// [`process`]: EventLoop::process
    #[must_use]
    pub fn now(&self) -> Tick {
        self.inner.counter.get()
    }

    /// Number of events currently held in the timer table.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.inner.timers.borrow().values().map(VecDeque::len).sum()
    }

    /// Number of occupied slots in the timer table.
    #[must_use]
    pub fn occupied_slots(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Returns true when no events are pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.inner.timers.borrow().is_empty()
    }

    // === Scheduling ===

    /// Schedules a one-shot event `delay` ticks from now.
    pub fn schedule<F>(&self, delay: Tick, handler: F) -> EventListener
    where
        F: FnMut() -> Result<()> + 'static,
    {
        self.schedule_with(delay, SchedulePolicy::Delayed, EventHandler::new(handler))
    }

    /// Schedules a one-shot event for the next `process` call.
    pub fn schedule_immediate<F>(&self, handler: F) -> EventListener
    where
        F: FnMut() -> Result<()> + 'static,
    {
        self.schedule_with(0, SchedulePolicy::Immediate, EventHandler::new(handler))
    }

    /// Schedules a recurring event firing every `interval` ticks, first
    /// `interval` ticks from now.
    pub fn schedule_recurring<F>(&self, interval: Tick, handler: F) -> EventListener
    where
        F: FnMut() -> Result<()> + 'static,
    {
        self.schedule_with(
            interval,
            SchedulePolicy::RecurringDelayed,
            EventHandler::new(handler),
        )
    }

    /// Schedules an event firing once per `process` call until cancelled.
    pub fn always<F>(&self, handler: F) -> EventListener
    where
        F: FnMut() -> Result<()> + 'static,
    {
        self.schedule_with(0, SchedulePolicy::Always, EventHandler::new(handler))
    }

    /// Schedules an event with an explicit policy and handler.
    ///
    /// The full form: takes a pre-built [`EventHandler`], which is how a
    /// handler that needs to self-cancel or self-reschedule
    /// ([`EventHandler::with_event`]) gets installed.
    pub fn schedule_with(
        &self,
        delay: Tick,
        policy: SchedulePolicy,
        handler: EventHandler,
    ) -> EventListener {
        let (slot, recurring, interval) = policy.arm(self.inner.counter.get(), delay);
        let event = Rc::new(Event::new(handler, interval, slot, recurring));
        let listener = EventListener::new(Rc::downgrade(&event));

        trace!(slot, recurring, interval, "event armed");
        self.inner
            .timers
            .borrow_mut()
            .entry(slot)
            .or_default()
            .push_back(event);
        listener
    }

    // === Driving ===

    /// Advances virtual time to `now` and fires everything due.
    ///
    /// Every non-cancelled event with `due_time <= now` fires exactly once,
    /// in ascending due-time order and FIFO within a slot — unless an
    /// earlier handler in the same call cancels or reschedules it first.
    /// Events scheduled by handlers into slots at or before `now` are
    /// deferred to the next call, which bounds each `process` invocation to
    /// finite work even when a handler re-schedules itself immediately.
    ///
    /// `now` must be monotonically non-decreasing across calls; a backward
    /// tick is handled per [`LoopConfig::backward_time`]. A handler error
    /// aborts the drain and propagates unchanged; events still in the batch
    /// at that point are discarded.
    pub fn process(&self, now: Tick) -> Result<()> {
        let counter = self.inner.counter.get();
        let now = if now < counter {
            match self.inner.config.backward_time {
                BackwardTime::Reject => {
                    return Err(Error::new(ErrorKind::TimeRegression).with_context(format!(
                        "process({now}) called with counter at {counter}"
                    )));
                }
                BackwardTime::Clamp => counter,
            }
        } else {
            now
        };
        self.inner.counter.set(now);

        let mut batch = self.harvest(now);
        debug!(now, due = batch.len(), "processing due events");

        while let Some(event) = batch.pop_front() {
            if event.is_cancelled() {
                continue;
            }

            if event.due_time() <= now {
                event.fire()?;
                if event.is_recurring() {
                    event.rearm(now.saturating_add(event.interval()));
                    self.enqueue(event);
                }
                // Fired one-shots are dropped here; listeners expire.
            } else {
                // Rescheduled into the future while waiting in the batch.
                self.enqueue(event);
            }
        }

        // The harvest leaves the `now` slot in place so that same-slot
        // arrivals defer to the next call; drop it if nothing re-armed.
        let mut timers = self.inner.timers.borrow_mut();
        if timers.get(&now).is_some_and(VecDeque::is_empty) {
            timers.remove(&now);
        }
        Ok(())
    }

    /// Moves every slot due at `now` into a FIFO batch, ascending slot
    /// order. The `now` slot itself is emptied but left in the table.
    fn harvest(&self, now: Tick) -> EventQueue {
        let mut timers = self.inner.timers.borrow_mut();
        let due: Vec<Tick> = timers.range(..=now).map(|(slot, _)| *slot).collect();

        let mut batch = EventQueue::new();
        for slot in due {
            if slot == now {
                if let Some(queue) = timers.get_mut(&slot) {
                    batch.append(queue);
                }
            } else if let Some(mut queue) = timers.remove(&slot) {
                batch.append(&mut queue);
            }
        }
        batch
    }

    fn enqueue(&self, event: Rc<Event>) {
        self.inner
            .timers
            .borrow_mut()
            .entry(event.due_time())
            .or_default()
            .push_back(event);
    }

    // === Promise glue ===

    /// Returns a promise that resolves with [`TimedOut`] once `delay` ticks
    /// have elapsed.
    #[must_use]
    pub fn wait(&self, delay: Tick) -> Promise<TimedOut> {
        let promise = Promise::pending();
        let settle = promise.clone();
        self.schedule(delay, move || settle.resolve(TimedOut));
        promise
    }

    /// Races `promise` against a `delay`-tick timer.
    ///
    /// The returned promise resolves with [`RaceResult::First`] when the
    /// underlying promise settles first, or [`RaceResult::Second`]`(TimedOut)`
    /// when the delay elapses first. Whichever loses is ignored.
    pub fn timeout<T>(&self, delay: Tick, promise: Promise<T>) -> Result<Promise<TimeoutResult<T>>>
    where
        T: 'static,
    {
        race2(promise, self.wait(delay))
    }

    /// [`timeout`](EventLoop::timeout) over a promise built with a launcher,
    /// as in [`Promise::with`].
    pub fn timeout_with<T, F>(&self, delay: Tick, launcher: F) -> Result<Promise<TimeoutResult<T>>>
    where
        T: 'static,
        F: FnOnce(&Promise<T>) -> Result<()>,
    {
        self.timeout(delay, Promise::with(launcher)?)
    }

    // === Rate limiting ===

    /// Wraps `f` so that only the last call in a burst goes through.
    ///
    /// Each invocation postpones the pending fire to `now + delay`; the
    /// argument delivered to `f` is the one captured by the invocation that
    /// *created* the pending event — later invocations within the window
    /// only postpone, they do not replace it. `f` runs inside the `process`
    /// call in which the window finally elapses.
    pub fn debounce<A, F>(&self, delay: Tick, f: F) -> impl FnMut(A)
    where
        A: 'static,
        F: FnMut(A) -> Result<()> + 'static,
    {
        let event_loop = self.clone();
        let guard: Rc<RefCell<EventGuard>> = Rc::new(RefCell::new(EventGuard::default()));
        let f = Rc::new(RefCell::new(f));

        move |argument: A| {
            let live = guard.borrow().listener().upgrade();
            if let Some(event) = live {
                event.reschedule(event_loop.now().saturating_add(delay));
            } else {
                let f = Rc::clone(&f);
                let mut argument = Some(argument);
                let listener = event_loop.schedule(delay, move || match argument.take() {
                    Some(argument) => (f.borrow_mut())(argument),
                    None => Ok(()),
                });
                *guard.borrow_mut() = EventGuard::from(listener);
            }
        }
    }

    /// Wraps `f` so that at most one call per `delay`-tick window goes
    /// through.
    ///
    /// The leading call fires immediately (its `Result` surfaces to the
    /// invoker); calls within the window are dropped silently. The window
    /// re-arms through a scheduled one-shot, so the next call after
    /// `process` passes the window fires again.
    pub fn throttle<A, F>(&self, delay: Tick, mut f: F) -> impl FnMut(A) -> Result<()>
    where
        A: 'static,
        F: FnMut(A) -> Result<()> + 'static,
    {
        let event_loop = self.clone();
        let armed = Rc::new(Cell::new(true));
        let guard: Rc<RefCell<EventGuard>> = Rc::new(RefCell::new(EventGuard::default()));

        move |argument: A| {
            if !armed.get() {
                return Ok(());
            }
            armed.set(false);
            let rearm = Rc::clone(&armed);
            let listener = event_loop.schedule(delay, move || {
                rearm.set(true);
                Ok(())
            });
            *guard.borrow_mut() = EventGuard::from(listener);
            f(argument)
        }
    }
}
