//! Trace exporters
use crate::error::SdkResult;
use futures_util::future::BoxFuture;
use std::borrow::Cow;
use std::fmt::Debug;
use std::time::SystemTime;
use wiretrace::trace::{SpanContext, SpanId, SpanKind, Status};
use wiretrace::KeyValue;

/// `SpanExporter` defines the interface that protocol-specific exporters must
/// implement so that they can be plugged into the SDK and deliver finished
/// spans to a sink.
///
/// Exporters are only ever called from a span processor, which serializes
/// calls to `export`; an exporter therefore does not have to be reentrant.
pub trait SpanExporter: Send + Sync + Debug {
    /// Exports a batch of finished spans.
    ///
    /// Failures are returned to the processor, which logs them. They never
    /// reach the code that ended the span.
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, SdkResult>;

    /// Shuts down the exporter. Called when the provider is shut down.
    fn shutdown(&mut self) -> SdkResult {
        Ok(())
    }

    /// Flushes anything the exporter buffers internally.
    fn force_flush(&mut self) -> SdkResult {
        Ok(())
    }
}

/// `SpanData` contains all the information collected by a `Span` and can be
/// used by exporters as a standard input.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanData {
    /// Exportable `SpanContext`
    pub span_context: SpanContext,
    /// Span parent id, `None` for root spans
    pub parent_span_id: Option<SpanId>,
    /// Span kind
    pub span_kind: SpanKind,
    /// Span name
    pub name: Cow<'static, str>,
    /// Span start time
    pub start_time: SystemTime,
    /// Span end time
    pub end_time: SystemTime,
    /// Span attributes, unique by key
    pub attributes: Vec<KeyValue>,
    /// Span status
    pub status: Status,
    /// Name of the service whose provider recorded the span
    pub service_name: Cow<'static, str>,
    /// Name of the tracer that started the span
    pub instrumentation_scope: Cow<'static, str>,
}

impl SpanData {
    /// Returns the value of the attribute named `key`, if set.
    pub fn attribute(&self, key: &str) -> Option<&wiretrace::Value> {
        self.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| &kv.value)
    }
}
