//! # Span
//!
//! `Span`s represent a single operation within a trace. Spans nest through
//! their parent span id to form a trace tree.
//!
//! A span's start time is taken when it is created. Until it ends, its name,
//! attributes and status may change; after that every mutation is ignored.
//! A span ends exactly once, either through [`Span::end`] or when it is
//! dropped, and is handed to the provider's span processors at that moment.
use std::borrow::Cow;
use std::time::SystemTime;
use wiretrace::trace::{SpanContext, SpanId, SpanKind, Status};
use wiretrace::KeyValue;

/// Single operation within a trace.
#[derive(Debug)]
pub struct Span {
    span_context: SpanContext,
    parent_span_id: Option<SpanId>,
    data: Option<SpanRecord>,
    tracer: crate::trace::Tracer,
}

/// The mutable part of a span, dropped into `SpanData` on end.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SpanRecord {
    /// Span kind
    pub(crate) span_kind: SpanKind,
    /// Span name
    pub(crate) name: Cow<'static, str>,
    /// Span start time
    pub(crate) start_time: SystemTime,
    /// Span attributes
    pub(crate) attributes: Vec<KeyValue>,
    /// Span status
    pub(crate) status: Status,
}

impl Span {
    pub(crate) fn new(
        span_context: SpanContext,
        parent_span_id: Option<SpanId>,
        data: Option<SpanRecord>,
        tracer: crate::trace::Tracer,
    ) -> Self {
        Span {
            span_context,
            parent_span_id,
            data,
            tracer,
        }
    }

    /// Operate on a mutable reference to span data
    fn with_data<T, F>(&mut self, f: F) -> Option<T>
    where
        F: FnOnce(&mut SpanRecord) -> T,
    {
        self.data.as_mut().map(f)
    }

    /// Returns the `SpanContext` for the given `Span`.
    ///
    /// The context stays readable after the span ended.
    pub fn span_context(&self) -> &SpanContext {
        &self.span_context
    }

    /// Id of the span this span was started under, `None` for a root span.
    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.parent_span_id
    }

    /// Returns true if this `Span` is recording information.
    ///
    /// Spans stop recording once ended. Spans started after their provider
    /// was shut down never record.
    pub fn is_recording(&self) -> bool {
        self.data.is_some()
    }

    /// Sets a single attribute, replacing any earlier value for the same key.
    pub fn set_attribute(&mut self, attribute: KeyValue) {
        self.with_data(|data| data_set_attribute(data, attribute));
    }

    /// Sets several attributes in order.
    pub fn set_attributes(&mut self, attributes: impl IntoIterator<Item = KeyValue>) {
        self.with_data(|data| {
            for attribute in attributes {
                data_set_attribute(data, attribute);
            }
        });
    }

    /// Sets the status of the span.
    ///
    /// The status only moves up the order `Unset < Error < Ok`: a later
    /// `Error` replaces an earlier one, but nothing replaces `Ok`, and `Unset`
    /// never replaces anything.
    pub fn set_status(&mut self, status: Status) {
        self.with_data(|data| {
            if status_rank(&status) >= status_rank(&data.status) {
                data.status = status;
            }
        });
    }

    /// Updates the span's name.
    pub fn update_name(&mut self, new_name: impl Into<Cow<'static, str>>) {
        self.with_data(|data| {
            data.name = new_name.into();
        });
    }

    /// Ends the span now. Calls after the first are ignored.
    pub fn end(&mut self) {
        self.ensure_ended_and_exported(None);
    }

    /// Ends the span with the given end time.
    ///
    /// A timestamp before the start time is clamped to the start time.
    pub fn end_with_timestamp(&mut self, timestamp: SystemTime) {
        self.ensure_ended_and_exported(Some(timestamp));
    }

    fn ensure_ended_and_exported(&mut self, timestamp: Option<SystemTime>) {
        // Take data, skip if it has already been exported
        let Some(data) = self.data.take() else {
            return;
        };

        let end_time = timestamp
            .unwrap_or_else(wiretrace::time::now)
            .max(data.start_time);
        let exported = build_export_data(
            data,
            self.span_context,
            self.parent_span_id,
            end_time,
            &self.tracer,
        );

        let processors = self.tracer.provider().span_processors();
        match processors {
            [] => {}
            [processor] => processor.on_end(exported),
            _ => {
                for processor in processors {
                    processor.on_end(exported.clone());
                }
            }
        }
    }
}

impl Drop for Span {
    /// Report span on inner drop
    fn drop(&mut self) {
        self.ensure_ended_and_exported(None);
    }
}

fn status_rank(status: &Status) -> u8 {
    match status {
        Status::Unset => 0,
        Status::Error { .. } => 1,
        Status::Ok => 2,
    }
}

fn data_set_attribute(data: &mut SpanRecord, attribute: KeyValue) {
    match data
        .attributes
        .iter_mut()
        .find(|existing| existing.key == attribute.key)
    {
        Some(existing) => existing.value = attribute.value,
        None => data.attributes.push(attribute),
    }
}

fn build_export_data(
    data: SpanRecord,
    span_context: SpanContext,
    parent_span_id: Option<SpanId>,
    end_time: SystemTime,
    tracer: &crate::trace::Tracer,
) -> crate::trace::SpanData {
    crate::trace::SpanData {
        span_context,
        parent_span_id,
        span_kind: data.span_kind,
        name: data.name,
        start_time: data.start_time,
        end_time,
        attributes: data.attributes,
        status: data.status,
        service_name: tracer.provider().config().service_name.clone(),
        instrumentation_scope: tracer.name().clone(),
    }
}

#[cfg(test)]
mod tests {
    use crate::trace::{InMemorySpanExporter, TracerProvider};
    use std::time::Duration;
    use wiretrace::trace::{SpanKind, Status};
    use wiretrace::{Context, KeyValue, Value};

    fn provider() -> (TracerProvider, InMemorySpanExporter) {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        (provider, exporter)
    }

    #[test]
    fn end_is_idempotent() {
        let (provider, exporter) = provider();
        let mut span = provider
            .tracer("test")
            .start_with_context("op", SpanKind::Internal, &Context::new());

        span.end();
        span.end();
        drop(span);

        assert_eq!(exporter.get_finished_spans().unwrap().len(), 1);
    }

    #[test]
    fn drop_ends_span() {
        let (provider, exporter) = provider();
        {
            let _span = provider
                .tracer("test")
                .start_with_context("dropped", SpanKind::Internal, &Context::new());
        }

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "dropped");
    }

    #[test]
    fn mutations_after_end_are_ignored() {
        let (provider, exporter) = provider();
        let mut span = provider
            .tracer("test")
            .start_with_context("op", SpanKind::Internal, &Context::new());
        span.set_attribute(KeyValue::new("before", true));
        span.end();

        assert!(!span.is_recording());
        span.set_attribute(KeyValue::new("after", true));
        span.set_status(Status::error("late"));
        span.update_name("renamed");

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans[0].name, "op");
        assert_eq!(spans[0].attributes, vec![KeyValue::new("before", true)]);
        assert_eq!(spans[0].status, Status::Unset);
    }

    #[test]
    fn set_attribute_overwrites_same_key() {
        let (provider, exporter) = provider();
        let mut span = provider
            .tracer("test")
            .start_with_context("op", SpanKind::Internal, &Context::new());
        span.set_attribute(KeyValue::new("rpc.method", "First"));
        span.set_attribute(KeyValue::new("rpc.method", "Greet"));
        span.end();

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans[0].attributes.len(), 1);
        assert_eq!(
            spans[0].attribute("rpc.method"),
            Some(&Value::from("Greet"))
        );
    }

    #[test]
    fn status_never_moves_down() {
        let (provider, exporter) = provider();
        let tracer = provider.tracer("test");

        let mut span = tracer.start_with_context("ok", SpanKind::Internal, &Context::new());
        span.set_status(Status::Ok);
        span.set_status(Status::error("ignored"));
        span.set_status(Status::Unset);
        span.end();

        let mut span = tracer.start_with_context("err", SpanKind::Internal, &Context::new());
        span.set_status(Status::error("first"));
        span.set_status(Status::error("second"));
        span.set_status(Status::Unset);
        span.end();

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans[0].status, Status::Ok);
        assert_eq!(spans[1].status, Status::error("second"));
    }

    #[test]
    fn end_time_never_precedes_start_time() {
        let (provider, exporter) = provider();
        let mut span = provider
            .tracer("test")
            .start_with_context("op", SpanKind::Internal, &Context::new());
        span.end_with_timestamp(std::time::UNIX_EPOCH + Duration::from_secs(1));

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans[0].end_time, spans[0].start_time);
    }
}
