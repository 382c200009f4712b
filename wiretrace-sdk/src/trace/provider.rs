//! # Tracer Provider
//!
//! The provider owns the configuration and span processors shared by every
//! [`Tracer`] it hands out. Clones share the same state.
//!
//! Shutdown is explicit: call [`TracerProvider::shutdown`] before the process
//! exits so queued spans are exported. Dropping the last clone shuts the
//! provider down as a fallback.
use crate::error::{SdkError, SdkResult};
use crate::trace::{
    BatchSpanProcessor, Config, IdGenerator, SimpleSpanProcessor, SpanExporter, SpanProcessor,
    Tracer,
};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wiretrace::{wt_debug, wt_info};

#[derive(Debug)]
pub(crate) struct TracerProviderInner {
    processors: Vec<Box<dyn SpanProcessor>>,
    config: Config,
    is_shutdown: AtomicBool,
}

impl TracerProviderInner {
    pub(crate) fn shutdown(&self) -> Vec<SdkResult> {
        let mut results = vec![];
        for processor in &self.processors {
            let result = processor.shutdown();
            if let Err(err) = &result {
                wt_debug!(name: "TracerProvider.ShutdownError",
                        error = format!("{err}"));
            }
            results.push(result);
        }
        results
    }
}

impl Drop for TracerProviderInner {
    fn drop(&mut self) {
        if !self.is_shutdown.load(Ordering::Relaxed) {
            let _ = self.shutdown(); // errors are handled within shutdown
        } else {
            wt_debug!(
                name: "TracerProvider.Drop.AlreadyShutdown",
                message = "TracerProvider was already shut down; drop will not attempt shutdown again."
            );
        }
    }
}

/// Creator and registry of named [`Tracer`] instances.
///
/// # Examples
///
/// ```
/// use wiretrace::trace::SpanKind;
/// use wiretrace::Context;
/// use wiretrace_sdk::trace::{InMemorySpanExporter, TracerProvider};
///
/// let exporter = InMemorySpanExporter::default();
/// let provider = TracerProvider::builder()
///     .with_service_name("bookstore-server")
///     .with_simple_exporter(exporter.clone())
///     .build();
///
/// let tracer = provider.tracer("bookstore");
/// tracer
///     .start_with_context("/BookStore/First", SpanKind::Server, &Context::new())
///     .end();
///
/// provider.shutdown().unwrap();
/// assert!(provider.shutdown().is_err());
///
/// let spans = exporter.get_finished_spans().unwrap();
/// assert_eq!(spans[0].service_name, "bookstore-server");
/// ```
#[derive(Clone, Debug)]
pub struct TracerProvider {
    inner: Arc<TracerProviderInner>,
}

impl Default for TracerProvider {
    fn default() -> Self {
        TracerProvider::builder().build()
    }
}

impl TracerProvider {
    /// Create a new [`TracerProvider`] builder.
    pub fn builder() -> TracerProviderBuilder {
        TracerProviderBuilder::default()
    }

    /// Span processors associated with this provider
    pub(crate) fn span_processors(&self) -> &[Box<dyn SpanProcessor>] {
        &self.inner.processors
    }

    /// Config associated with this tracer
    pub(crate) fn config(&self) -> &Config {
        &self.inner.config
    }

    /// true if the provider has been shutdown
    pub(crate) fn is_shutdown(&self) -> bool {
        self.inner.is_shutdown.load(Ordering::Relaxed)
    }

    /// Name of the service recorded on every span of this provider.
    pub fn service_name(&self) -> &str {
        &self.inner.config.service_name
    }

    /// Returns a new tracer with the given name.
    pub fn tracer(&self, name: impl Into<Cow<'static, str>>) -> Tracer {
        let name = name.into();
        if name.is_empty() {
            wt_info!(name: "TracerNameEmpty", message = "Tracer name is empty; consider providing a meaningful name.");
        }
        Tracer::new(name, self.clone())
    }

    /// Force flush all remaining spans in span processors and return results.
    pub fn force_flush(&self) -> SdkResult {
        let result: Vec<_> = self
            .span_processors()
            .iter()
            .map(|processor| processor.force_flush())
            .collect();
        if result.iter().all(|r| r.is_ok()) {
            Ok(())
        } else {
            Err(SdkError::InternalFailure(format!("errs: {result:?}")))
        }
    }

    /// Shuts down the current `TracerProvider`.
    ///
    /// Every processor exports what it still holds and shuts down its
    /// exporter. Spans started afterwards are non-recording. Only the first
    /// call does any work; later calls return [`SdkError::AlreadyShutdown`].
    pub fn shutdown(&self) -> SdkResult {
        if self
            .inner
            .is_shutdown
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let results = self.inner.shutdown();

            if results.iter().all(|res| res.is_ok()) {
                Ok(())
            } else {
                Err(SdkError::InternalFailure(format!(
                    "Shutdown errors: {:?}",
                    results
                        .into_iter()
                        .filter_map(Result::err)
                        .collect::<Vec<_>>()
                )))
            }
        } else {
            Err(SdkError::AlreadyShutdown)
        }
    }
}

/// Builder for provider attributes.
#[derive(Debug, Default)]
pub struct TracerProviderBuilder {
    processors: Vec<Box<dyn SpanProcessor>>,
    config: Config,
}

impl TracerProviderBuilder {
    /// Adds a [SimpleSpanProcessor] with the configured exporter to the pipeline.
    ///
    /// Spans are exported synchronously as they end, which suits tests and
    /// debugging. Prefer [`with_batch_exporter`](Self::with_batch_exporter)
    /// for anything else.
    pub fn with_simple_exporter<T: SpanExporter + 'static>(self, exporter: T) -> Self {
        let simple = SimpleSpanProcessor::new(Box::new(exporter));
        self.with_span_processor(simple)
    }

    /// Adds a [BatchSpanProcessor] with the configured exporter to the pipeline.
    pub fn with_batch_exporter<T: SpanExporter + 'static>(self, exporter: T) -> Self {
        let batch = BatchSpanProcessor::builder(exporter).build();
        self.with_span_processor(batch)
    }

    /// Adds a custom [SpanProcessor] to the pipeline. Processors run in the
    /// order they were added.
    pub fn with_span_processor<T: SpanProcessor + 'static>(self, processor: T) -> Self {
        let mut processors = self.processors;
        processors.push(Box::new(processor));

        TracerProviderBuilder { processors, ..self }
    }

    /// Replaces the whole [Config].
    pub fn with_config(self, config: Config) -> Self {
        TracerProviderBuilder { config, ..self }
    }

    /// Sets the id generator used for new spans.
    pub fn with_id_generator<T: IdGenerator + 'static>(mut self, id_generator: T) -> Self {
        self.config.id_generator = Box::new(id_generator);
        self
    }

    /// Sets the service name recorded on every span.
    pub fn with_service_name(mut self, service_name: impl Into<Cow<'static, str>>) -> Self {
        self.config.service_name = service_name.into();
        self
    }

    /// Create a new provider from this configuration.
    pub fn build(self) -> TracerProvider {
        TracerProvider {
            inner: Arc::new(TracerProviderInner {
                processors: self.processors,
                config: self.config,
                is_shutdown: AtomicBool::new(false),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{InMemorySpanExporter, SpanData};
    use futures_util::future::BoxFuture;
    use std::sync::atomic::AtomicUsize;
    use wiretrace::trace::SpanKind;
    use wiretrace::Context;

    #[derive(Debug, Default, Clone)]
    struct CountingProcessor {
        ended: Arc<AtomicUsize>,
        shutdowns: Arc<AtomicUsize>,
    }

    impl SpanProcessor for CountingProcessor {
        fn on_end(&self, _span: SpanData) {
            self.ended.fetch_add(1, Ordering::SeqCst);
        }

        fn force_flush(&self) -> SdkResult {
            Ok(())
        }

        fn shutdown(&self) -> SdkResult {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingExporter;

    impl SpanExporter for FailingExporter {
        fn export(&mut self, _batch: Vec<SpanData>) -> BoxFuture<'static, SdkResult> {
            Box::pin(std::future::ready(Err(SdkError::InternalFailure(
                "sink unavailable".into(),
            ))))
        }
    }

    #[test]
    fn shutdown_is_idempotent() {
        let processor = CountingProcessor::default();
        let provider = TracerProvider::builder()
            .with_span_processor(processor.clone())
            .build();

        assert!(provider.shutdown().is_ok());
        assert!(matches!(
            provider.shutdown(),
            Err(SdkError::AlreadyShutdown)
        ));
        drop(provider);

        assert_eq!(processor.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_shuts_down_once() {
        let processor = CountingProcessor::default();
        let provider = TracerProvider::builder()
            .with_span_processor(processor.clone())
            .build();
        let clone = provider.clone();

        drop(provider);
        assert_eq!(processor.shutdowns.load(Ordering::SeqCst), 0);
        drop(clone);
        assert_eq!(processor.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn spans_after_shutdown_are_not_recorded() {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let tracer = provider.tracer("test");
        provider.shutdown().unwrap();

        let mut span = tracer.start_with_context("late", SpanKind::Internal, &Context::new());
        assert!(!span.is_recording());
        assert!(!span.span_context().is_valid());
        span.end();

        assert!(exporter.get_finished_spans().unwrap().is_empty());
    }

    #[test]
    fn every_processor_sees_every_span() {
        let first = CountingProcessor::default();
        let second = CountingProcessor::default();
        let provider = TracerProvider::builder()
            .with_span_processor(first.clone())
            .with_span_processor(second.clone())
            .build();

        provider
            .tracer("test")
            .start_with_context("op", SpanKind::Internal, &Context::new())
            .end();

        assert_eq!(first.ended.load(Ordering::SeqCst), 1);
        assert_eq!(second.ended.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn export_failures_do_not_reach_the_caller() {
        let provider = TracerProvider::builder()
            .with_simple_exporter(FailingExporter)
            .build();

        let mut span = provider
            .tracer("test")
            .start_with_context("op", SpanKind::Internal, &Context::new());
        span.end();

        assert!(!span.is_recording());
    }

    #[test]
    fn service_name_from_builder() {
        let provider = TracerProvider::builder()
            .with_service_name("otel-jaeger-grpc")
            .build();
        assert_eq!(provider.service_name(), "otel-jaeger-grpc");
    }
}
