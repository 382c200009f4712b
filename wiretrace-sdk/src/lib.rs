//! Implements the span lifecycle and wire encoding for [`wiretrace`].
//!
//! The SDK turns the identifiers of the `wiretrace` API into recorded spans:
//!
//! * [`propagation::TraceContextPropagator`] encodes a span context into one
//!   `traceparent` carrier entry and decodes it on the other side.
//! * [`trace::TracerProvider`] owns the configuration and the span processors;
//!   [`trace::Tracer`]s created from it start [`trace::Span`]s.
//! * Ended spans flow to a [`trace::SpanProcessor`], which hands them to a
//!   [`trace::SpanExporter`].
//!
//! # Getting started
//!
//! ```
//! use wiretrace::trace::SpanKind;
//! use wiretrace::Context;
//! use wiretrace_sdk::trace::{InMemorySpanExporter, TracerProvider};
//!
//! let exporter = InMemorySpanExporter::default();
//! let provider = TracerProvider::builder()
//!     .with_simple_exporter(exporter.clone())
//!     .build();
//! let tracer = provider.tracer("doc-example");
//!
//! let mut span = tracer.start_with_context("/BookStore/First", SpanKind::Client, &Context::new());
//! span.end();
//!
//! assert_eq!(exporter.get_finished_spans().unwrap().len(), 1);
//! ```
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

pub mod error;
pub mod propagation;
pub mod trace;
