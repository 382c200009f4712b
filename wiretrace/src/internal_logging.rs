#![allow(unused_macros)]
//! Named diagnostic events for `wiretrace` internals.
//!
//! These macros are meant for the instrumentation layer itself (propagators,
//! processors, exporters, interceptors), not for application logging. They
//! forward to `tracing` when the calling crate enables its `internal-logs`
//! feature and compile to nothing otherwise, so instrumentation never pays for
//! diagnostics nobody listens to.
//!
//! ```rust
//! use wiretrace::wt_debug;
//! wt_debug!(name: "Propagator.Extract.Malformed", header = "garbage");
//! ```

/// Emit an informational internal event.
#[macro_export]
macro_rules! wt_info {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::info!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = $name;
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::info!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name, $($value),+);
        }
    };
}

/// Emit a warning internal event.
#[macro_export]
macro_rules! wt_warn {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::warn!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = $name;
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::warn!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name, $($value),+);
        }
    };
}

/// Emit a debug internal event.
#[macro_export]
macro_rules! wt_debug {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::debug!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = $name;
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::debug!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name, $($value),+);
        }
    };
}

/// Emit an error internal event.
#[macro_export]
macro_rules! wt_error {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::error!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = $name;
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::error!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name, $($value),+);
        }
    };
}
