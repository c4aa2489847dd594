//! Tickloop: an externally-clocked event loop with a synchronous promise runtime.
//!
//! # Overview
//!
//! Tickloop coordinates time-based tasks and eventual values without any
//! operating-system notion of "now". The host application advances a logical
//! clock by calling [`EventLoop::process`] with a monotonically non-decreasing
//! tick value; every side effect — timer firing, promise settlement, chained
//! continuations, race/all composition — happens inside that call, on the
//! caller's thread. This makes the crate a natural fit for embedded targets
//! driven by a hardware tick and for simulations that own their clock.
//!
//! # Core Guarantees
//!
//! - **Externally driven**: nothing fires outside of `process`; there are no
//!   background threads, no wall-clock reads, and no I/O
//! - **Deterministic ordering**: events fire in ascending due-time order and
//!   FIFO within a slot; same inputs, same firing sequence
//! - **Re-entrant scheduling**: handlers may schedule, cancel, and reschedule
//!   events — including themselves — while the loop is draining
//! - **Synchronous promises**: settlement runs continuations immediately on
//!   the settling call; there is no await and no suspension point
//! - **Explicit failure**: invalid transitions, unhandled rejections, and
//!   handler errors surface as typed [`Error`] values, never as panics
//!
//! # Module Structure
//!
//! - [`event_loop`]: the timer table, scheduling policies, and the
//!   `process(now)` driver, plus `wait`/`timeout`/`debounce`/`throttle`
//! - [`event`]: a scheduled unit of work and its handler
//! - [`listener`]: non-owning event handles and scoped cancellation guards
//! - [`promise`]: the promise state machine, chaining, and composition
//! - [`time`]: the virtual tick type and schedule policies
//! - [`error`]: error types
//!
//! # Example
//!
//! ```
//! use tickloop::EventLoop;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let event_loop = EventLoop::new();
//! let fired = Rc::new(Cell::new(false));
//!
//! let flag = Rc::clone(&fired);
//! event_loop.schedule(100, move || {
//!     flag.set(true);
//!     Ok(())
//! });
//!
//! event_loop.process(99).unwrap();
//! assert!(!fired.get());
//! event_loop.process(100).unwrap();
//! assert!(fired.get());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod error;
pub mod event;
pub mod event_loop;
pub mod listener;
pub mod promise;
pub mod time;
pub mod tracing_compat;

// Re-exports for convenient access to the core types.
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use event::{Event, EventHandler};
pub use event_loop::{BackwardTime, EventLoop, LoopConfig, TimedOut, TimeoutResult};
pub use listener::{EventGuard, EventListener};
pub use promise::compose::{all, all2, all3, all_unit, race, race2, RaceResult};
pub use promise::{Promise, PromiseState, Settle};
pub use time::{SchedulePolicy, Tick};

#[cfg(test)]
pub(crate) mod test_utils;
