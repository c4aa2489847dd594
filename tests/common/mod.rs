#![allow(dead_code)]
#![allow(unused_imports)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! #[macro_use]
//! mod common;
//! use common::*;
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Once;
use tickloop::Result;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

/// A shared fire counter plus a handler that bumps it.
pub fn fire_counter() -> (Rc<Cell<u32>>, impl FnMut() -> Result<()>) {
    let count = Rc::new(Cell::new(0u32));
    let inner = Rc::clone(&count);
    (count, move || {
        inner.set(inner.get() + 1);
        Ok(())
    })
}

/// A shared tag log plus a constructor for handlers that append to it.
pub fn tag_log() -> (
    Rc<RefCell<Vec<&'static str>>>,
    impl Fn(&'static str) -> Box<dyn FnMut() -> Result<()>>,
) {
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let source = Rc::clone(&log);
    let make = move |tag: &'static str| {
        let log = Rc::clone(&source);
        Box::new(move || {
            log.borrow_mut().push(tag);
            Ok(())
        }) as Box<dyn FnMut() -> Result<()>>
    };
    (log, make)
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
}
