//! Promise composition: `all` and `race`.
//!
//! The composers attach continuations to their inputs and settle a fresh
//! result promise. `all` resolves when every input has resolved and rejects
//! on the first rejection; `race` settles with the first input to settle
//! either way. Later settlements of the remaining inputs are ignored — the
//! inputs themselves still settle normally, the composite just no longer
//! listens.
//!
//! Heterogeneous compositions come in explicit arities ([`all2`], [`all3`],
//! [`race2`]); homogeneous collections go through the iterator forms
//! ([`all`], [`race`]). Void inputs are ordinary `Promise<()>` values, so a
//! mixed `all3(int, string, void)` resolves to `(i32, String, ())` with unit
//! as the void slot's storage.

use super::Promise;
use crate::error::{Error, ErrorKind, Result};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// The outcome of a two-way race: which input settled first, and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceResult<A, B> {
    /// The first input won.
    First(A),
    /// The second input won.
    Second(B),
}

impl<A, B> RaceResult<A, B> {
    /// Returns true if the first input won.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        matches!(self, Self::First(_))
    }

    /// Returns true if the second input won.
    #[must_use]
    pub const fn is_second(&self) -> bool {
        matches!(self, Self::Second(_))
    }

    /// Returns the first input's value, if it won.
    pub fn into_first(self) -> Option<A> {
        match self {
            Self::First(value) => Some(value),
            Self::Second(_) => None,
        }
    }

    /// Returns the second input's value, if it won.
    pub fn into_second(self) -> Option<B> {
        match self {
            Self::First(_) => None,
            Self::Second(value) => Some(value),
        }
    }

    /// Maps the first variant.
    pub fn map_first<C, F: FnOnce(A) -> C>(self, f: F) -> RaceResult<C, B> {
        match self {
            Self::First(value) => RaceResult::First(f(value)),
            Self::Second(value) => RaceResult::Second(value),
        }
    }

    /// Maps the second variant.
    pub fn map_second<C, F: FnOnce(B) -> C>(self, f: F) -> RaceResult<A, C> {
        match self {
            Self::First(value) => RaceResult::First(value),
            Self::Second(value) => RaceResult::Second(f(value)),
        }
    }
}

/// Races a collection of same-typed promises.
///
/// The result settles with the first input settlement, value or error;
/// everything after that is ignored. An empty input never settles.
pub fn race<T, I>(promises: I) -> Result<Promise<T>>
where
    T: 'static,
    I: IntoIterator<Item = Promise<T>>,
{
    let winner = Promise::pending();
    for input in promises {
        let winner = winner.clone();
        input.attach(move |settlement| {
            if !winner.is_pending() {
                return Ok(());
            }
            match settlement {
                Ok(value) => winner.resolve(value),
                Err(error) => winner.reject(error),
            }
        })?;
    }
    Ok(winner)
}

/// Races two promises of possibly different types.
///
/// The result carries the winner tagged as [`RaceResult::First`] or
/// [`RaceResult::Second`].
pub fn race2<A, B>(a: Promise<A>, b: Promise<B>) -> Result<Promise<RaceResult<A, B>>>
where
    A: 'static,
    B: 'static,
{
    let winner = Promise::pending();

    let first = winner.clone();
    a.attach(move |settlement| {
        if !first.is_pending() {
            return Ok(());
        }
        match settlement {
            Ok(value) => first.resolve(RaceResult::First(value)),
            Err(error) => first.reject(error),
        }
    })?;

    let second = winner.clone();
    b.attach(move |settlement| {
        if !second.is_pending() {
            return Ok(());
        }
        match settlement {
            Ok(value) => second.resolve(RaceResult::Second(value)),
            Err(error) => second.reject(error),
        }
    })?;

    Ok(winner)
}

struct AllState<T> {
    slots: Vec<Option<T>>,
    remaining: usize,
}

/// Joins a collection of same-typed promises into a promise of all their
/// values, in input order.
///
/// Resolves only when every input has resolved; rejects with the first
/// rejection. An empty input resolves immediately with an empty vector.
pub fn all<T, I>(promises: I) -> Result<Promise<Vec<T>>>
where
    T: 'static,
    I: IntoIterator<Item = Promise<T>>,
{
    let inputs: Vec<Promise<T>> = promises.into_iter().collect();
    let result = Promise::pending();
    if inputs.is_empty() {
        result.resolve(Vec::new())?;
        return Ok(result);
    }

    let state = Rc::new(RefCell::new(AllState {
        slots: (0..inputs.len()).map(|_| None).collect(),
        remaining: inputs.len(),
    }));

    for (index, input) in inputs.into_iter().enumerate() {
        let state = Rc::clone(&state);
        let result = result.clone();
        input.attach(move |settlement| match settlement {
            Ok(value) => {
                let mut coordinator = state.borrow_mut();
                coordinator.slots[index] = Some(value);
                coordinator.remaining -= 1;
                if coordinator.remaining > 0 || !result.is_pending() {
                    return Ok(());
                }
                let values: Option<Vec<T>> =
                    coordinator.slots.iter_mut().map(Option::take).collect();
                drop(coordinator);
                match values {
                    Some(values) => result.resolve(values),
                    None => Err(Error::new(ErrorKind::Internal)
                        .with_context("all-coordinator completed with an unfilled slot")),
                }
            }
            Err(error) => {
                if result.is_pending() {
                    result.reject(error)
                } else {
                    Ok(())
                }
            }
        })?;
    }

    Ok(result)
}

/// Joins a collection of void promises into a single void promise.
///
/// Counter-based fast path: no value slots, just a pending count. Resolves
/// when every input has resolved; rejects with the first rejection.
pub fn all_unit<I>(promises: I) -> Result<Promise<()>>
where
    I: IntoIterator<Item = Promise<()>>,
{
    let inputs: Vec<Promise<()>> = promises.into_iter().collect();
    let result = Promise::pending();
    if inputs.is_empty() {
        result.resolve(())?;
        return Ok(result);
    }

    let remaining = Rc::new(Cell::new(inputs.len()));
    for input in inputs {
        let remaining = Rc::clone(&remaining);
        let result = result.clone();
        input.attach(move |settlement| match settlement {
            Ok(()) => {
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 && result.is_pending() {
                    result.resolve(())
                } else {
                    Ok(())
                }
            }
            Err(error) => {
                if result.is_pending() {
                    result.reject(error)
                } else {
                    Ok(())
                }
            }
        })?;
    }

    Ok(result)
}

/// Joins two promises of possibly different types into a promise of the
/// pair of their values.
pub fn all2<A, B>(a: Promise<A>, b: Promise<B>) -> Result<Promise<(A, B)>>
where
    A: 'static,
    B: 'static,
{
    let result = Promise::pending();
    let state: Rc<RefCell<(Option<A>, Option<B>)>> = Rc::new(RefCell::new((None, None)));

    {
        let state = Rc::clone(&state);
        let result = result.clone();
        a.attach(move |settlement| match settlement {
            Ok(value) => {
                state.borrow_mut().0 = Some(value);
                settle_pair(&state, &result)
            }
            Err(error) => {
                if result.is_pending() {
                    result.reject(error)
                } else {
                    Ok(())
                }
            }
        })?;
    }

    {
        let result = result.clone();
        b.attach(move |settlement| match settlement {
            Ok(value) => {
                state.borrow_mut().1 = Some(value);
                settle_pair(&state, &result)
            }
            Err(error) => {
                if result.is_pending() {
                    result.reject(error)
                } else {
                    Ok(())
                }
            }
        })?;
    }

    Ok(result)
}

fn settle_pair<A, B>(
    state: &Rc<RefCell<(Option<A>, Option<B>)>>,
    result: &Promise<(A, B)>,
) -> Result<()>
where
    A: 'static,
    B: 'static,
{
    let mut slots = state.borrow_mut();
    if slots.0.is_some() && slots.1.is_some() && result.is_pending() {
        let pair = (slots.0.take(), slots.1.take());
        drop(slots);
        match pair {
            (Some(a), Some(b)) => result.resolve((a, b)),
            _ => unreachable!("pair coordinator lost a filled slot"),
        }
    } else {
        Ok(())
    }
}

/// Joins three promises of possibly different types into a promise of the
/// triple of their values.
pub fn all3<A, B, C>(a: Promise<A>, b: Promise<B>, c: Promise<C>) -> Result<Promise<(A, B, C)>>
where
    A: 'static,
    B: 'static,
    C: 'static,
{
    all2(all2(a, b)?, c)?.map(|((a, b), c)| (a, b, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promise::Settle;

    #[test]
    fn race_takes_the_first_settlement() {
        let a: Promise<u32> = Promise::pending();
        let b: Promise<u32> = Promise::pending();
        let winner = race([a.clone(), b.clone()]).unwrap();

        b.resolve(2).unwrap();
        assert_eq!(winner.take_value().unwrap(), 2);

        // The loser settles normally; the race no longer listens.
        a.resolve(1).unwrap();
        assert!(a.is_resolved());
    }

    #[test]
    fn race2_tags_the_winner() {
        let a: Promise<u32> = Promise::pending();
        let b: Promise<&str> = Promise::pending();
        let winner = race2(a, b.clone()).unwrap();

        b.resolve("fast").unwrap();
        assert_eq!(winner.take_value().unwrap(), RaceResult::Second("fast"));
    }

    #[test]
    fn all_collects_in_input_order() {
        let a: Promise<u32> = Promise::pending();
        let b: Promise<u32> = Promise::pending();
        let joined = all([a.clone(), b.clone()]).unwrap();

        b.resolve(2).unwrap();
        assert!(joined.is_pending());
        a.resolve(1).unwrap();
        assert_eq!(joined.take_value().unwrap(), vec![1, 2]);
    }

    #[test]
    fn all_rejects_on_first_rejection() {
        let a: Promise<u32> = Promise::pending();
        let b: Promise<u32> = Promise::pending();
        let joined = all([a.clone(), b.clone()]).unwrap();
        let recovered = joined.rescue(|_| Settle::Value(Vec::new())).unwrap();

        a.reject(Error::user("first")).unwrap();
        assert!(joined.is_rejected());
        assert_eq!(recovered.take_value().unwrap(), Vec::<u32>::new());

        // The remaining input settles normally and is ignored.
        b.resolve(2).unwrap();
        assert!(joined.is_rejected());
    }

    #[test]
    fn all_of_nothing_resolves_immediately() {
        let joined = all(Vec::<Promise<u32>>::new()).unwrap();
        assert_eq!(joined.take_value().unwrap(), Vec::<u32>::new());

        let voids = all_unit(Vec::<Promise<()>>::new()).unwrap();
        assert!(voids.is_resolved());
    }

    #[test]
    fn all_unit_counts_down() {
        let a: Promise<()> = Promise::pending();
        let b: Promise<()> = Promise::pending();
        let joined = all_unit([a.clone(), b.clone()]).unwrap();

        a.resolve(()).unwrap();
        assert!(joined.is_pending());
        b.resolve(()).unwrap();
        assert!(joined.is_resolved());
    }
}
