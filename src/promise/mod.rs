//! Eventual values with synchronous continuations.
//!
//! A [`Promise<T>`] represents a value that is not available yet. It is a
//! cheap, cloneable handle shared between the producer (whoever settles it)
//! and consumers (whoever chains on it). Settlement is synchronous: the
//! continuation runs inside the `resolve`/`reject` call, on the same thread,
//! before that call returns. There is no executor and no await.
//!
//! # States
//!
//! A promise starts `Pending` and moves exactly once to `Resolved` or
//! `Rejected`. Settling an already-settled promise fails with
//! [`ErrorKind::AlreadySettled`]; rejecting a promise that has no
//! continuation attached fails with [`ErrorKind::UnhandledRejection`] (the
//! promise still transitions, and the stored error is delivered to the next
//! continuation that attaches).
//!
//! # Chaining
//!
//! [`then`](Promise::then), [`rescue`](Promise::rescue),
//! [`finally`](Promise::finally) and the [`map`](Promise::map) /
//! [`and_then`](Promise::and_then) conveniences each return a new promise
//! settled from the handler's result. Handlers of the two-handler forms
//! return a [`Settle`] describing how to settle the chained promise: a plain
//! value, another promise (piped through identity-preserving), or a failure.
//! When the two handlers of a `then` need to produce different value types,
//! unify them in the return type — `Option<T>` when one side is void,
//! [`RaceResult`](crate::RaceResult) when both carry distinct values.
//!
//! # Value ownership
//!
//! A resolved value is surrendered to the continuation when one is attached;
//! [`take_value`](Promise::take_value) serves the no-continuation case.
//! Rejection errors are cheap to clone and remain stored either way.

pub mod compose;

use crate::error::{Error, ErrorKind, Result};
use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

/// The state of a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromiseState {
    /// Not settled yet; holds no value.
    Pending,
    /// Settled with a value.
    Resolved,
    /// Settled with an error.
    Rejected,
}

/// What a promise holds: nothing yet, a resolved value, or a rejection error.
enum SettledValue<T> {
    Empty,
    Value(T),
    Error(Error),
}

type Continuation<T> = Box<dyn FnOnce(Result<T>) -> Result<()>>;

struct PromiseCell<T> {
    state: PromiseState,
    value: SettledValue<T>,
    on_settle: Option<Continuation<T>>,
}

/// How a chaining handler settles the next promise in the chain.
///
/// Returned by the handlers given to [`Promise::then`], [`Promise::rescue`]
/// and [`Promise::finally`]:
///
/// - [`Settle::Value`] resolves the chained promise with a plain value.
/// - [`Settle::Chain`] pipes another promise's eventual settlement into the
///   chained promise, state and value preserved.
/// - [`Settle::Fail`] rejects the chained promise — the explicit form of a
///   throwing handler.
pub enum Settle<N> {
    /// Resolve the chained promise with this value.
    Value(N),
    /// Forward the settlement of this promise into the chained promise.
    Chain(Promise<N>),
    /// Reject the chained promise with this error.
    Fail(Error),
}

impl<N: 'static> Settle<N> {
    /// Settles `next` according to this directive.
    fn pipe_into(self, next: &Promise<N>) -> Result<()> {
        match self {
            Self::Value(value) => next.resolve(value),
            Self::Fail(error) => next.reject(error),
            Self::Chain(inner) => {
                let forward = next.clone();
                inner.attach(move |settlement| match settlement {
                    Ok(value) => forward.resolve(value),
                    Err(error) => forward.reject(error),
                })
            }
        }
    }
}

impl<N: fmt::Debug> fmt::Debug for Settle<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Chain(promise) => f.debug_tuple("Chain").field(promise).finish(),
            Self::Fail(error) => f.debug_tuple("Fail").field(error).finish(),
        }
    }
}

/// An eventual value with synchronous settlement.
///
/// See the [module documentation](self) for the full semantics.
pub struct Promise<T> {
    inner: Rc<RefCell<PromiseCell<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self.inner.borrow();
        f.debug_struct("Promise")
            .field("state", &cell.state)
            .field("has_continuation", &cell.on_settle.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> Default for Promise<T> {
    fn default() -> Self {
        Self::pending()
    }
}

impl<T: 'static> Promise<T> {
    // === Factories ===

    /// Creates a pending promise.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            inner: Rc::new(RefCell::new(PromiseCell {
                state: PromiseState::Pending,
                value: SettledValue::Empty,
                on_settle: None,
            })),
        }
    }

    /// Creates a promise already resolved with `value`.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PromiseCell {
                state: PromiseState::Resolved,
                value: SettledValue::Value(value),
                on_settle: None,
            })),
        }
    }

    /// Creates a promise already rejected with `error`.
    ///
    /// This is the sanctioned way to hold a rejection without a continuation:
    /// rejecting a pending promise that nobody observes is a hard error,
    /// constructing one rejected is not. The first continuation to attach
    /// receives the error.
    #[must_use]
    pub fn rejected(error: Error) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PromiseCell {
                state: PromiseState::Rejected,
                value: SettledValue::Error(error),
                on_settle: None,
            })),
        }
    }

    /// Creates a pending promise and hands it to `launcher`, which may settle
    /// it synchronously or stash a clone for later settlement.
    pub fn with<F>(launcher: F) -> Result<Self>
    where
        F: FnOnce(&Self) -> Result<()>,
    {
        let promise = Self::pending();
        launcher(&promise)?;
        Ok(promise)
    }

    // === State queries ===

    /// The current state.
    #[must_use]
    pub fn state(&self) -> PromiseState {
        self.inner.borrow().state
    }

    /// Returns true while the promise is not settled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == PromiseState::Pending
    }

    /// Returns true once the promise has been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state() == PromiseState::Resolved
    }

    /// Returns true once the promise has been rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.state() == PromiseState::Rejected
    }

    /// Returns true once the promise is resolved or rejected.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state() != PromiseState::Pending
    }

    /// Returns true if a settle continuation is currently attached.
    ///
    /// Diagnostic; chains install exactly one continuation per link.
    #[must_use]
    pub fn has_continuation(&self) -> bool {
        self.inner.borrow().on_settle.is_some()
    }

    // === Settlement ===

    /// Resolves the promise with `value`.
    ///
    /// Fires the attached continuation synchronously, moving the value into
    /// it; without a continuation the value is stored for [`take_value`]
    /// (or for a later attach). Fails with [`ErrorKind::AlreadySettled`] on
    /// a settled promise. Errors produced by the continuation (for example a
    /// downstream unhandled rejection) propagate out of this call.
    ///
    /// [`take_value`]: Promise::take_value
    pub fn resolve(&self, value: T) -> Result<()> {
        let mut cell = self.inner.borrow_mut();
        if cell.state != PromiseState::Pending {
            return Err(Error::new(ErrorKind::AlreadySettled)
                .with_context("attempted to resolve an already settled promise"));
        }

        cell.state = PromiseState::Resolved;
        match cell.on_settle.take() {
            Some(continuation) => {
                drop(cell);
                continuation(Ok(value))
            }
            None => {
                cell.value = SettledValue::Value(value);
                Ok(())
            }
        }
    }

    /// Rejects the promise with `error`.
    ///
    /// Fires the attached continuation synchronously with a clone of the
    /// error; the error also stays stored for [`take_error`]. Without a
    /// continuation the rejection is unobserved and this call fails with
    /// [`ErrorKind::UnhandledRejection`] — the promise still transitions to
    /// `Rejected`. Fails with [`ErrorKind::AlreadySettled`] on a settled
    /// promise.
    ///
    /// [`take_error`]: Promise::take_error
    pub fn reject(&self, error: Error) -> Result<()> {
        let mut cell = self.inner.borrow_mut();
        if cell.state != PromiseState::Pending {
            return Err(Error::new(ErrorKind::AlreadySettled)
                .with_context("attempted to reject an already settled promise"));
        }

        cell.state = PromiseState::Rejected;
        cell.value = SettledValue::Error(error.clone());
        match cell.on_settle.take() {
            Some(continuation) => {
                drop(cell);
                continuation(Err(error))
            }
            None => Err(Error::new(ErrorKind::UnhandledRejection)
                .with_context("promise rejected with no continuation attached")
                .with_source(error)),
        }
    }

    // === Value access ===

    /// Moves the resolved value out of the promise.
    ///
    /// Fails with [`ErrorKind::ValueUnavailable`] if the promise is not
    /// resolved, or if the value was already taken or surrendered to a
    /// continuation.
    pub fn take_value(&self) -> Result<T> {
        let mut cell = self.inner.borrow_mut();
        match std::mem::replace(&mut cell.value, SettledValue::Empty) {
            SettledValue::Value(value) => Ok(value),
            other => {
                cell.value = other;
                Err(Error::new(ErrorKind::ValueUnavailable)
                    .with_context(format!("no resolved value to take (state: {:?})", cell.state)))
            }
        }
    }

    /// Returns a clone of the rejection error.
    ///
    /// Fails with [`ErrorKind::ValueUnavailable`] if the promise is not
    /// rejected.
    pub fn take_error(&self) -> Result<Error> {
        let cell = self.inner.borrow();
        match &cell.value {
            SettledValue::Error(error) => Ok(error.clone()),
            _ => Err(Error::new(ErrorKind::ValueUnavailable)
                .with_context(format!("no rejection error to take (state: {:?})", cell.state))),
        }
    }

    // === Continuation primitive ===

    /// Attaches the settle continuation, overwriting any previous one.
    ///
    /// On a settled promise the continuation fires synchronously before this
    /// call returns, receiving the stored value (moved out) or a clone of the
    /// stored error.
    pub(crate) fn attach<F>(&self, continuation: F) -> Result<()>
    where
        F: FnOnce(Result<T>) -> Result<()> + 'static,
    {
        let mut cell = self.inner.borrow_mut();
        match cell.state {
            PromiseState::Pending => {
                cell.on_settle = Some(Box::new(continuation));
                Ok(())
            }
            PromiseState::Resolved => match std::mem::replace(&mut cell.value, SettledValue::Empty) {
                SettledValue::Value(value) => {
                    drop(cell);
                    continuation(Ok(value))
                }
                other => {
                    cell.value = other;
                    Err(Error::new(ErrorKind::ValueUnavailable)
                        .with_context("resolved value already surrendered to a continuation"))
                }
            },
            PromiseState::Rejected => {
                let error = match &cell.value {
                    SettledValue::Error(error) => error.clone(),
                    _ => unreachable!("rejected promise without a stored error"),
                };
                drop(cell);
                continuation(Err(error))
            }
        }
    }

    // === Chaining ===

    /// Attaches a pair of handlers and returns the chained promise.
    ///
    /// On resolution `on_resolve` runs with the value; on rejection
    /// `on_reject` runs with the error. Either handler's [`Settle`] return
    /// settles the chained promise. Attaching to a settled promise runs the
    /// appropriate handler synchronously, so hard errors raised by that run
    /// (such as an unhandled rejection of the chained promise) surface from
    /// this call.
    pub fn then<N, F, G>(&self, on_resolve: F, on_reject: G) -> Result<Promise<N>>
    where
        N: 'static,
        F: FnOnce(T) -> Settle<N> + 'static,
        G: FnOnce(Error) -> Settle<N> + 'static,
    {
        let next = Promise::pending();
        let forward = next.clone();
        self.attach(move |settlement| {
            let directive = match settlement {
                Ok(value) => on_resolve(value),
                Err(error) => on_reject(error),
            };
            directive.pipe_into(&forward)
        })?;
        Ok(next)
    }

    /// Chains a value transformation; rejections pipe through unchanged.
    ///
    /// The single-handler form of [`then`](Promise::then) for handlers that
    /// return a plain value.
    pub fn map<N, F>(&self, on_resolve: F) -> Result<Promise<N>>
    where
        N: 'static,
        F: FnOnce(T) -> N + 'static,
    {
        self.then(move |value| Settle::Value(on_resolve(value)), Settle::Fail)
    }

    /// Chains a promise-returning transformation; rejections pipe through
    /// unchanged.
    ///
    /// The single-handler form of [`then`](Promise::then) for handlers that
    /// return another promise.
    pub fn and_then<N, F>(&self, on_resolve: F) -> Result<Promise<N>>
    where
        N: 'static,
        F: FnOnce(T) -> Promise<N> + 'static,
    {
        self.then(move |value| Settle::Chain(on_resolve(value)), Settle::Fail)
    }

    /// Attaches a rejection handler; resolved values pipe through unchanged.
    pub fn rescue<G>(&self, on_reject: G) -> Result<Promise<T>>
    where
        G: FnOnce(Error) -> Settle<T> + 'static,
    {
        self.then(Settle::Value, on_reject)
    }

    /// Attaches a handler invoked exactly once on settlement, resolved or
    /// rejected, with the outcome as a `Result`.
    pub fn finally<N, F>(&self, on_settle: F) -> Result<Promise<N>>
    where
        N: 'static,
        F: FnOnce(Result<T>) -> Settle<N> + 'static,
    {
        let next = Promise::pending();
        let forward = next.clone();
        self.attach(move |settlement| on_settle(settlement).pipe_into(&forward))?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_promise_holds_nothing() {
        let promise: Promise<u32> = Promise::pending();
        assert!(promise.is_pending());
        assert!(!promise.is_settled());
        assert!(!promise.has_continuation());
        assert_eq!(
            promise.take_value().unwrap_err().kind(),
            ErrorKind::ValueUnavailable
        );
    }

    #[test]
    fn resolve_stores_the_value() {
        let promise = Promise::pending();
        promise.resolve(42).unwrap();
        assert!(promise.is_resolved());
        assert_eq!(promise.take_value().unwrap(), 42);
        // Taking twice fails: the value moved out.
        assert_eq!(
            promise.take_value().unwrap_err().kind(),
            ErrorKind::ValueUnavailable
        );
    }

    #[test]
    fn settlement_is_monotonic() {
        let promise = Promise::pending();
        promise.resolve(1).unwrap();
        assert_eq!(
            promise.resolve(2).unwrap_err().kind(),
            ErrorKind::AlreadySettled
        );
        assert_eq!(
            promise.reject(Error::user("late")).unwrap_err().kind(),
            ErrorKind::AlreadySettled
        );
    }

    #[test]
    fn unobserved_rejection_is_a_hard_error() {
        let promise: Promise<u32> = Promise::pending();
        let err = promise.reject(Error::user("boom")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnhandledRejection);
        // The promise still transitioned and kept the error.
        assert!(promise.is_rejected());
        assert_eq!(promise.take_error().unwrap().kind(), ErrorKind::User);
    }

    #[test]
    fn rejected_factory_is_not_a_hard_error() {
        let promise: Promise<u32> = Promise::rejected(Error::user("expected"));
        assert!(promise.is_rejected());
        assert_eq!(promise.take_error().unwrap().kind(), ErrorKind::User);
    }

    #[test]
    fn attach_to_settled_fires_synchronously() {
        let promise = Promise::resolved(7);
        let chained = promise.map(|v| v + 1).unwrap();
        assert!(chained.is_resolved());
        assert_eq!(chained.take_value().unwrap(), 8);
    }

    #[test]
    fn launcher_receives_the_pending_promise() {
        let promise = Promise::with(|p: &Promise<&str>| p.resolve("early")).unwrap();
        assert_eq!(promise.take_value().unwrap(), "early");
    }
}
