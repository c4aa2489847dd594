//! Tracing compatibility layer for structured logging.
//!
//! The crate logs scheduling and settlement activity through this module so
//! that the `tracing` dependency stays optional:
//!
//! - **With the `tracing-integration` feature**: re-exports the macros from
//!   the `tracing` crate.
//! - **Without it**: no-op macros that compile to nothing, for zero runtime
//!   cost on embedded targets.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tickloop::tracing_compat::{debug, trace};
//!
//! trace!(slot = 42, "event armed");
//! debug!("batch drained");
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    //! No-op implementations when tracing is disabled.

    /// No-op trace-level logging macro.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op debug-level logging macro.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op info-level logging macro.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// No-op warn-level logging macro.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// No-op error-level logging macro.
    #[macro_export]
    macro_rules! error {
        ($($arg:tt)*) => {};
    }

    // Re-export the macros at module level so call sites can use
    // `crate::tracing_compat::{trace, debug}` on either side of the feature.
    pub use crate::{debug, error, info, trace, warn};
}

#[cfg(not(feature = "tracing-integration"))]
pub use noop::*;
