//! Trace context propagation across RPC boundaries.
//!
//! This crate is the API half of `wiretrace`: the identifiers and context types
//! that describe a position in a distributed trace, the per-thread active
//! context scope, and the carrier and propagator traits used to move a
//! [`SpanContext`] through an RPC transport's metadata.
//!
//! Span creation, export and the wire encoding live in `wiretrace-sdk`; the
//! client and server interceptors that tie both halves to a transport live in
//! `wiretrace-rpc`.
//!
//! # Getting started
//!
//! ```
//! use wiretrace::trace::{SpanContext, SpanId, TraceFlags, TraceId};
//! use wiretrace::Context;
//!
//! let sc = SpanContext::new(
//!     TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736),
//!     SpanId::from(0x00f0_67aa_0ba9_02b7),
//!     TraceFlags::SAMPLED,
//!     false,
//! );
//!
//! assert!(Context::current().span_context().is_none());
//! {
//!     let _guard = Context::new().with_span_context(sc).attach();
//!     assert_eq!(Context::current().span_context(), Some(&sc));
//! }
//! assert!(Context::current().span_context().is_none());
//! ```
//!
//! [`SpanContext`]: trace::SpanContext
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(test, deny(warnings))]

mod common;
mod context;
mod internal_logging;

pub mod propagation;
pub mod trace;

pub use common::{Key, KeyValue, Value};
pub use context::{Context, ContextGuard, FutureExt, WithContext};

#[doc(hidden)]
pub mod time {
    use std::time::SystemTime;

    #[doc(hidden)]
    pub fn now() -> SystemTime {
        SystemTime::now()
    }
}

#[doc(hidden)]
#[cfg(feature = "internal-logs")]
pub mod _private {
    pub use tracing::{debug, error, info, warn};
}
