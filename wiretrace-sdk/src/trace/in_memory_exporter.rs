use crate::error::{SdkError, SdkResult};
use crate::trace::{SpanData, SpanExporter};
use futures_util::future::BoxFuture;
use std::sync::{Arc, Mutex};

/// An in-memory span exporter that stores span data in memory.
///
/// This exporter is useful for testing and debugging purposes. Clones share
/// the same storage, so a test can keep one handle while the provider owns
/// another, and spans exported from several processors or threads all land
/// in one list.
///
/// # Example
///
/// ```
/// use wiretrace::trace::SpanKind;
/// use wiretrace::Context;
/// use wiretrace_sdk::trace::{InMemorySpanExporter, TracerProvider};
///
/// let exporter = InMemorySpanExporter::default();
/// let provider = TracerProvider::builder()
///     .with_simple_exporter(exporter.clone())
///     .build();
///
/// let tracer = provider.tracer("example/in_memory_exporter");
/// tracer
///     .start_with_context("say hello", SpanKind::Server, &Context::new())
///     .end();
///
/// let spans = exporter.get_finished_spans().unwrap();
/// assert_eq!(spans[0].name, "say hello");
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemorySpanExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemorySpanExporter {
    /// Returns the finished spans in export order.
    ///
    /// # Errors
    ///
    /// Returns an `SdkError` if the internal lock cannot be acquired.
    pub fn get_finished_spans(&self) -> Result<Vec<SpanData>, SdkError> {
        self.spans
            .lock()
            .map(|spans_guard| spans_guard.iter().cloned().collect())
            .map_err(|err| SdkError::InternalFailure(format!("Failed to lock spans: {err}")))
    }

    /// Clears the internal storage of finished spans.
    pub fn reset(&self) {
        let _ = self.spans.lock().map(|mut spans_guard| spans_guard.clear());
    }
}

impl SpanExporter for InMemorySpanExporter {
    fn export(&mut self, mut batch: Vec<SpanData>) -> BoxFuture<'static, SdkResult> {
        let result = self
            .spans
            .lock()
            .map(|mut spans_guard| spans_guard.append(&mut batch))
            .map_err(|err| SdkError::InternalFailure(format!("Failed to lock spans: {err}")));
        Box::pin(std::future::ready(result))
    }
}
