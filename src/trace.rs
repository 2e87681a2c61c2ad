//! Feature-gated tracing macros.
//!
//! With the `tracing` feature the macros below are the `tracing` crate's own.
//! Without it they expand to nothing, so call sites need no `cfg` guards.
//!
//! ```rust,ignore
//! use crate::trace::{debug_span, trace};
//!
//! let _span = debug_span!("cc_run", pending = 3).entered();
//! trace!(id = 7, "term_interned");
//! ```

use crate::config::DiagnosticsConfig;

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, info, trace, Level, Span};

#[cfg(not(feature = "tracing"))]
mod noop {
    /// Span stand-in.
    pub struct Span;

    impl Span {
        pub fn none() -> Self {
            Span
        }

        pub fn entered(self) -> SpanGuard {
            SpanGuard
        }
    }

    pub struct SpanGuard;

    impl Drop for SpanGuard {
        fn drop(&mut self) {}
    }

    #[derive(Clone, Copy, Debug)]
    pub struct Level;

    impl Level {
        pub const TRACE: Level = Level;
        pub const DEBUG: Level = Level;
        pub const INFO: Level = Level;
    }

    #[macro_export]
    macro_rules! trace {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! info {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug_span {
        ($($tt:tt)*) => {
            $crate::trace::Span::none()
        };
    }

    pub use crate::{debug, debug_span, info, trace};
}

#[cfg(not(feature = "tracing"))]
pub use noop::*;

/// Install a stderr subscriber filtered by `config`.
///
/// `RUST_LOG`, when set, takes precedence over the config's directives.
/// Calling this more than once is harmless.
#[cfg(feature = "tracing")]
pub fn init_subscriber(config: &DiagnosticsConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()
        .ok();
    info!(verbosity = config.verbosity, "diagnostics_initialized");
}

#[cfg(not(feature = "tracing"))]
pub fn init_subscriber(_config: &DiagnosticsConfig) {}

#[cfg(test)]
#[path = "tests/trace.rs"]
mod tests;
