//! Error types and error handling strategy for Tickloop.
//!
//! This module defines the error type used throughout the crate.
//! Error handling follows these principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - Contract violations on the promise state machine are errors, not panics
//! - Handler failures propagate unchanged out of [`crate::EventLoop::process`]

use core::fmt;
use std::sync::Arc;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // === Promise state machine ===
    /// Tried to resolve or reject an already-settled promise.
    AlreadySettled,
    /// A promise was rejected with no continuation attached to observe it.
    UnhandledRejection,
    /// Asked a promise for a value or error it does not hold.
    ValueUnavailable,

    // === Event loop ===
    /// `process` was called with a tick behind the loop's counter.
    TimeRegression,

    // === Internal / user ===
    /// Internal invariant violation (bug).
    Internal,
    /// User-provided error, typically a rejection payload.
    User,
}

/// The main error type for Tickloop operations.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    context: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            source: None,
        }
    }

    /// Creates a user error with context text, suitable as a rejection payload.
    #[must_use]
    pub fn user(ctx: impl Into<String>) -> Self {
        Self::new(ErrorKind::User).with_context(ctx)
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if this error reports an unhandled promise rejection.
    #[must_use]
    pub const fn is_unhandled_rejection(&self) -> bool {
        matches!(self.kind, ErrorKind::UnhandledRejection)
    }

    /// Returns true if this error reports an invalid settle transition.
    #[must_use]
    pub const fn is_already_settled(&self) -> bool {
        matches!(self.kind, ErrorKind::AlreadySettled)
    }

    /// Adds deterministic context text to the error.
    #[must_use]
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(ctx) = &self.context {
            write!(f, ": {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Attach a context string on error.
    fn context(self, ctx: impl Into<String>) -> Result<T>;
    /// Attach context computed lazily on error.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for core::result::Result<T, E> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(ctx))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| e.into().with_context(f()))
    }
}

/// A specialized Result type for Tickloop operations.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug)]
    struct Underlying;

    impl fmt::Display for Underlying {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "underlying")
        }
    }

    impl std::error::Error for Underlying {}

    #[test]
    fn display_without_context() {
        let err = Error::new(ErrorKind::Internal);
        assert_eq!(err.to_string(), "Internal");
    }

    #[test]
    fn display_with_context() {
        let err = Error::new(ErrorKind::ValueUnavailable).with_context("promise is pending");
        assert_eq!(err.to_string(), "ValueUnavailable: promise is pending");
    }

    #[test]
    fn source_chain_is_exposed() {
        let err = Error::user("outer").with_source(Underlying);
        let source = err.source().expect("source missing");
        assert_eq!(source.to_string(), "underlying");
    }

    #[test]
    fn result_ext_adds_context() {
        let res: core::result::Result<(), Error> = Err(Error::new(ErrorKind::TimeRegression));
        let err = res.context("process went backwards").expect_err("expected err");
        assert_eq!(err.kind(), ErrorKind::TimeRegression);
        assert_eq!(err.to_string(), "TimeRegression: process went backwards");
    }

    #[test]
    fn predicates_match_kind() {
        assert!(Error::new(ErrorKind::UnhandledRejection).is_unhandled_rejection());
        assert!(Error::new(ErrorKind::AlreadySettled).is_already_settled());
        assert!(!Error::user("nope").is_already_settled());
    }
}
