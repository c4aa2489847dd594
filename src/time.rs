//! Virtual time and scheduling policies.
//!
//! Tickloop has no clock of its own. Time is an opaque, monotonically
//! non-decreasing integer supplied by the host on every call to
//! [`crate::EventLoop::process`]; one unit means whatever the host wants it
//! to mean (a millisecond, a frame, a simulation step).
//!
//! The default tick is 32 bits wide. With millisecond ticks that wraps after
//! roughly 49.7 days; comparisons are not wrap-aware, so hosts that outlive
//! the range should enable the `wide-time` feature to widen the tick to
//! 64 bits. Tick arithmetic inside the crate saturates rather than wraps.

/// The virtual time unit used by the event loop.
#[cfg(not(feature = "wide-time"))]
pub type Tick = u32;

/// The virtual time unit used by the event loop.
#[cfg(feature = "wide-time")]
pub type Tick = u64;

/// How a scheduled event is armed relative to the loop's current counter.
///
/// Each policy maps a requested delay to an initial slot, a recurring flag,
/// and a re-arm interval:
///
/// | Policy | initial slot | recurring | interval |
/// |---|---|---|---|
/// | `Immediate` | `counter` | no | — |
/// | `Delayed` | `counter + delay` | no | — |
/// | `RecurringImmediate` | `counter` | yes | `delay` |
/// | `RecurringDelayed` | `counter + delay` | yes | `delay` |
/// | `Always` | `counter` | yes | `0` |
///
/// An `Always` event re-arms into the current slot and therefore fires once
/// per `process` call, whatever tick value the host passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulePolicy {
    /// Fire on the next `process` call.
    Immediate,
    /// Fire once `delay` ticks have elapsed.
    Delayed,
    /// Fire on the next `process` call, then every `delay` ticks.
    RecurringImmediate,
    /// Fire once `delay` ticks have elapsed, then every `delay` ticks.
    RecurringDelayed,
    /// Fire on every `process` call until cancelled.
    Always,
}

impl SchedulePolicy {
    /// Derives `(initial_slot, recurring, interval)` for an event scheduled
    /// with this policy at the given counter value.
    #[must_use]
    pub const fn arm(self, counter: Tick, delay: Tick) -> (Tick, bool, Tick) {
        match self {
            Self::Immediate => (counter, false, 0),
            Self::Delayed => (counter.saturating_add(delay), false, 0),
            Self::RecurringImmediate => (counter, true, delay),
            Self::RecurringDelayed => (counter.saturating_add(delay), true, delay),
            Self::Always => (counter, true, 0),
        }
    }

    /// Returns true if events armed with this policy re-arm after firing.
    #[must_use]
    pub const fn is_recurring(self) -> bool {
        matches!(
            self,
            Self::RecurringImmediate | Self::RecurringDelayed | Self::Always
        )
    }
}
