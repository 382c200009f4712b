//! # Span Processor Interface
//!
//! A span processor receives every span when it ends and decides how it
//! reaches an exporter. Processors are registered on the
//! [`TracerProvider`] and invoked in registration order; every `Tracer` of a
//! provider shares them.
//!
//! ```ascii
//!   +-----+--------------+   +-----------------------+   +-------------------+
//!   |     |              |   |                       |   |                   |
//!   |     |              |   | (Batch)SpanProcessor  |   |    SpanExporter   |
//!   | SDK | Span.end()   +---> (Simple)SpanProcessor +---> (InMemory/Stdout) |
//!   |     |              |   |                       |   |                   |
//!   +-----+--------------+   +-----------------------+   +-------------------+
//! ```
//!
//! [`TracerProvider`]: crate::trace::TracerProvider

use crate::error::{SdkError, SdkResult};
use crate::trace::{SpanData, SpanExporter};
use futures_executor::block_on;
use std::cmp::min;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use std::{env, str::FromStr, thread};
use wiretrace::{wt_debug, wt_warn};

pub(crate) const WIRETRACE_BSP_SCHEDULE_DELAY: &str = "WIRETRACE_BSP_SCHEDULE_DELAY";
pub(crate) const WIRETRACE_BSP_SCHEDULE_DELAY_DEFAULT: u64 = 5_000;
pub(crate) const WIRETRACE_BSP_MAX_QUEUE_SIZE: &str = "WIRETRACE_BSP_MAX_QUEUE_SIZE";
pub(crate) const WIRETRACE_BSP_MAX_QUEUE_SIZE_DEFAULT: usize = 2_048;
pub(crate) const WIRETRACE_BSP_MAX_EXPORT_BATCH_SIZE: &str = "WIRETRACE_BSP_MAX_EXPORT_BATCH_SIZE";
pub(crate) const WIRETRACE_BSP_MAX_EXPORT_BATCH_SIZE_DEFAULT: usize = 512;
pub(crate) const WIRETRACE_BSP_EXPORT_TIMEOUT: &str = "WIRETRACE_BSP_EXPORT_TIMEOUT";
pub(crate) const WIRETRACE_BSP_EXPORT_TIMEOUT_DEFAULT: u64 = 30_000;

/// `SpanProcessor` is an interface which allows hooks for span end method
/// invocations.
pub trait SpanProcessor: Send + Sync + Debug {
    /// `on_end` is called after a span is ended. This method is called
    /// synchronously within [`Span::end`], so it must not block on export.
    ///
    /// [`Span::end`]: crate::trace::Span::end
    fn on_end(&self, span: SpanData);
    /// Force the spans lying in the cache to be exported.
    fn force_flush(&self) -> SdkResult;
    /// Shuts down the processor. Called when the SDK is shut down. This is an
    /// opportunity for the processor to do any cleanup required.
    fn shutdown(&self) -> SdkResult;
}

/// A [SpanProcessor] that passes finished spans to the configured
/// `SpanExporter`, as soon as they are finished, without any batching.
///
/// The export runs on the thread that ended the span. This is typically
/// useful for debugging and testing; use [BatchSpanProcessor] anywhere the
/// exporter may be slow.
#[derive(Debug)]
pub struct SimpleSpanProcessor {
    exporter: Mutex<Box<dyn SpanExporter>>,
}

impl SimpleSpanProcessor {
    /// Create a new [SimpleSpanProcessor] using the provided exporter.
    pub fn new(exporter: Box<dyn SpanExporter>) -> Self {
        Self {
            exporter: Mutex::new(exporter),
        }
    }
}

impl SpanProcessor for SimpleSpanProcessor {
    fn on_end(&self, span: SpanData) {
        let result = self
            .exporter
            .lock()
            .map_err(|_| SdkError::InternalFailure("SimpleSpanProcessor mutex poison".into()))
            .and_then(|mut exporter| block_on(exporter.export(vec![span])));

        if let Err(err) = result {
            wt_debug!(
                name: "SimpleProcessor.OnEnd.Error",
                reason = format!("{err}")
            );
        }
    }

    fn force_flush(&self) -> SdkResult {
        self.exporter
            .lock()
            .map_err(|_| SdkError::InternalFailure("SimpleSpanProcessor mutex poison".into()))
            .and_then(|mut exporter| exporter.force_flush())
    }

    fn shutdown(&self) -> SdkResult {
        self.exporter
            .lock()
            .map_err(|_| {
                SdkError::InternalFailure("SimpleSpanProcessor mutex poison at shutdown".into())
            })
            .and_then(|mut exporter| exporter.shutdown())
    }
}

/// Messages exchanged between the main thread and the background thread.
#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
enum BatchMessage {
    ExportSpan(SpanData),
    ForceFlush(SyncSender<SdkResult>),
    Shutdown(SyncSender<SdkResult>),
}

/// A batch span processor with a dedicated background thread.
///
/// Ended spans are queued in a bounded channel and exported from the
/// background thread, either when a full batch has accumulated or when the
/// scheduled delay elapses. When the queue is full new spans are dropped and
/// a warning is logged once; `Span::end` never waits for the exporter.
#[derive(Debug)]
pub struct BatchSpanProcessor {
    message_sender: SyncSender<BatchMessage>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    timeout: Duration,
    is_shutdown: AtomicBool,
    dropped_span_count: Arc<AtomicUsize>,
}

impl BatchSpanProcessor {
    /// Creates a new instance of `BatchSpanProcessor`.
    pub fn new<E>(mut exporter: E, config: BatchConfig) -> Self
    where
        E: SpanExporter + 'static,
    {
        let (message_sender, message_receiver) = sync_channel(config.max_queue_size);
        let timeout = config.max_export_timeout;

        let handle = thread::Builder::new()
            .name("BatchSpanProcessorDedicatedThread".to_string())
            .spawn(move || {
                let mut spans = Vec::with_capacity(config.max_export_batch_size);
                let mut last_export_time = Instant::now();

                loop {
                    let remaining = config
                        .scheduled_delay
                        .saturating_sub(last_export_time.elapsed());
                    match message_receiver.recv_timeout(remaining) {
                        Ok(BatchMessage::ExportSpan(span)) => {
                            spans.push(span);
                            if spans.len() >= config.max_export_batch_size
                                || last_export_time.elapsed() >= config.scheduled_delay
                            {
                                log_export_error(export_all(
                                    &mut exporter,
                                    &mut spans,
                                    config.max_export_batch_size,
                                ));
                                last_export_time = Instant::now();
                            }
                        }
                        Ok(BatchMessage::ForceFlush(sender)) => {
                            let result = export_all(
                                &mut exporter,
                                &mut spans,
                                config.max_export_batch_size,
                            )
                            .and_then(|_| exporter.force_flush());
                            let _ = sender.send(result);
                            last_export_time = Instant::now();
                        }
                        Ok(BatchMessage::Shutdown(sender)) => {
                            let result = export_all(
                                &mut exporter,
                                &mut spans,
                                config.max_export_batch_size,
                            )
                            .and_then(|_| exporter.shutdown());
                            let _ = sender.send(result);
                            break;
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            log_export_error(export_all(
                                &mut exporter,
                                &mut spans,
                                config.max_export_batch_size,
                            ));
                            last_export_time = Instant::now();
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            wt_debug!(
                                name: "BatchSpanProcessor.ThreadExiting",
                                reason = "channel disconnected"
                            );
                            break;
                        }
                    }
                }
            });

        // Without a worker the receiver is gone, so every later send fails and
        // spans are counted as dropped.
        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                wt_warn!(
                    name: "BatchSpanProcessor.ThreadSpawnFailed",
                    error = format!("{err}")
                );
                None
            }
        };

        Self {
            message_sender,
            handle: Mutex::new(handle),
            timeout,
            is_shutdown: AtomicBool::new(false),
            dropped_span_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// builder
    pub fn builder<E>(exporter: E) -> BatchSpanProcessorBuilder<E>
    where
        E: SpanExporter + 'static,
    {
        BatchSpanProcessorBuilder {
            exporter,
            config: BatchConfig::default(),
        }
    }
}

fn export_all<E: SpanExporter>(
    exporter: &mut E,
    spans: &mut Vec<SpanData>,
    max_export_batch_size: usize,
) -> SdkResult {
    let mut result = Ok(());
    while !spans.is_empty() {
        let count = min(spans.len(), max_export_batch_size.max(1));
        let batch: Vec<SpanData> = spans.drain(..count).collect();
        if let Err(err) = block_on(exporter.export(batch)) {
            result = Err(err);
        }
    }
    result
}

fn log_export_error(result: SdkResult) {
    if let Err(err) = result {
        wt_debug!(
            name: "BatchSpanProcessor.ExportError",
            error = format!("{err}")
        );
    }
}

impl SpanProcessor for BatchSpanProcessor {
    /// Handles span end.
    fn on_end(&self, span: SpanData) {
        if self.is_shutdown.load(Ordering::Relaxed) {
            wt_debug!(name: "BatchSpanProcessor.OnEnd.AfterShutdown");
            return;
        }
        let result = self.message_sender.try_send(BatchMessage::ExportSpan(span));

        if result.is_err() {
            // Only the first drop is reported; the total is logged at shutdown.
            if self.dropped_span_count.fetch_add(1, Ordering::Relaxed) == 0 {
                wt_warn!(name: "BatchSpanProcessor.SpanDroppingStarted",
                    message = "BatchSpanProcessor dropped a Span due to queue full/internal errors. No further drops are reported until shutdown.");
            }
        }
    }

    /// Flushes all pending spans.
    fn force_flush(&self) -> SdkResult {
        if self.is_shutdown.load(Ordering::Relaxed) {
            return Err(SdkError::AlreadyShutdown);
        }
        let (sender, receiver) = sync_channel(1);
        self.message_sender
            .try_send(BatchMessage::ForceFlush(sender))
            .map_err(|_| SdkError::InternalFailure("Failed to send ForceFlush message".into()))?;

        receiver
            .recv_timeout(self.timeout)
            .map_err(|_| SdkError::Timeout(self.timeout))?
    }

    /// Shuts down the processor, exporting everything still queued.
    fn shutdown(&self) -> SdkResult {
        if self.is_shutdown.swap(true, Ordering::Relaxed) {
            return Err(SdkError::AlreadyShutdown);
        }
        let dropped_spans = self.dropped_span_count.load(Ordering::Relaxed);
        if dropped_spans > 0 {
            wt_warn!(
                name: "BatchSpanProcessor.SpansDropped",
                dropped_span_count = dropped_spans as u64
            );
        }

        // `send` rather than `try_send`: a full queue must not lose the
        // shutdown request, the worker drains it.
        let (sender, receiver) = sync_channel(1);
        self.message_sender
            .send(BatchMessage::Shutdown(sender))
            .map_err(|_| SdkError::InternalFailure("Failed to send Shutdown message".into()))?;

        let result = receiver
            .recv_timeout(self.timeout)
            .map_err(|_| SdkError::Timeout(self.timeout))?;
        if let Some(handle) = self.handle.lock().ok().and_then(|mut handle| handle.take()) {
            if handle.join().is_err() {
                wt_warn!(name: "BatchSpanProcessor.ThreadPanicked");
            }
        }
        result
    }
}

/// Builder for `BatchSpanProcessor`.
#[derive(Debug, Default)]
pub struct BatchSpanProcessorBuilder<E>
where
    E: SpanExporter + 'static,
{
    exporter: E,
    config: BatchConfig,
}

impl<E> BatchSpanProcessorBuilder<E>
where
    E: SpanExporter + 'static,
{
    /// Set the BatchConfig for [BatchSpanProcessorBuilder]
    pub fn with_batch_config(self, config: BatchConfig) -> Self {
        BatchSpanProcessorBuilder { config, ..self }
    }

    /// Build a new instance of `BatchSpanProcessor`.
    pub fn build(self) -> BatchSpanProcessor {
        BatchSpanProcessor::new(self.exporter, self.config)
    }
}

/// Limits and timings of a [`BatchSpanProcessor`].
///
/// `BatchConfig::default()` reads the `WIRETRACE_BSP_*` environment variables;
/// use [`BatchConfigBuilder`] to set values in code.
#[derive(Debug)]
pub struct BatchConfig {
    /// Spans waiting for export; further spans are dropped.
    pub(crate) max_queue_size: usize,
    pub(crate) scheduled_delay: Duration,
    /// Never larger than `max_queue_size`.
    pub(crate) max_export_batch_size: usize,
    /// How long `force_flush` and `shutdown` wait for the worker.
    pub(crate) max_export_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfigBuilder::default().build()
    }
}

/// Builds a [`BatchConfig`].
///
/// The starting values come from the environment, falling back to the
/// built-in defaults for variables that are unset or not a plain integer:
///
/// | Variable | Default |
/// |---|---|
/// | `WIRETRACE_BSP_MAX_QUEUE_SIZE` | 2048 spans |
/// | `WIRETRACE_BSP_SCHEDULE_DELAY` | 5000 ms |
/// | `WIRETRACE_BSP_MAX_EXPORT_BATCH_SIZE` | 512 spans |
/// | `WIRETRACE_BSP_EXPORT_TIMEOUT` | 30000 ms |
#[derive(Debug)]
pub struct BatchConfigBuilder {
    max_queue_size: usize,
    scheduled_delay: Duration,
    max_export_batch_size: usize,
    max_export_timeout: Duration,
}

impl Default for BatchConfigBuilder {
    fn default() -> Self {
        BatchConfigBuilder {
            max_queue_size: env_or(
                WIRETRACE_BSP_MAX_QUEUE_SIZE,
                WIRETRACE_BSP_MAX_QUEUE_SIZE_DEFAULT,
            ),
            scheduled_delay: Duration::from_millis(env_or(
                WIRETRACE_BSP_SCHEDULE_DELAY,
                WIRETRACE_BSP_SCHEDULE_DELAY_DEFAULT,
            )),
            max_export_batch_size: env_or(
                WIRETRACE_BSP_MAX_EXPORT_BATCH_SIZE,
                WIRETRACE_BSP_MAX_EXPORT_BATCH_SIZE_DEFAULT,
            ),
            max_export_timeout: Duration::from_millis(env_or(
                WIRETRACE_BSP_EXPORT_TIMEOUT,
                WIRETRACE_BSP_EXPORT_TIMEOUT_DEFAULT,
            )),
        }
    }
}

impl BatchConfigBuilder {
    /// Spans that may wait for export before new ones are dropped.
    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Spans handed to the exporter per call.
    pub fn with_max_export_batch_size(mut self, max_export_batch_size: usize) -> Self {
        self.max_export_batch_size = max_export_batch_size;
        self
    }

    /// Interval at which the worker exports whatever is queued.
    pub fn with_scheduled_delay(mut self, scheduled_delay: Duration) -> Self {
        self.scheduled_delay = scheduled_delay;
        self
    }

    /// How long `force_flush` and `shutdown` wait for the worker.
    pub fn with_max_export_timeout(mut self, max_export_timeout: Duration) -> Self {
        self.max_export_timeout = max_export_timeout;
        self
    }

    /// The batch size is capped at the queue size.
    pub fn build(self) -> BatchConfig {
        BatchConfig {
            max_queue_size: self.max_queue_size,
            scheduled_delay: self.scheduled_delay,
            max_export_timeout: self.max_export_timeout,
            max_export_batch_size: min(self.max_export_batch_size, self.max_queue_size),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => T::from_str(raw.trim()).unwrap_or_else(|_| {
            wt_debug!(name: "BatchConfig.InvalidEnvValue", variable = name, value = raw.as_str());
            default
        }),
        Err(_) => default,
    }
}
