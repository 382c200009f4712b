//! # Tracer
//!
//! The `Tracer` starts spans. The parent of a new span is the span context
//! of the `Context` it is started with, so a server span started from an
//! extracted remote context joins the caller's trace.
use crate::trace::{
    provider::TracerProvider,
    span::{Span, SpanRecord},
};
use std::borrow::Cow;
use std::fmt;
use std::time::SystemTime;
use wiretrace::{
    trace::{SpanContext, SpanKind, Status, TraceFlags},
    Context, KeyValue,
};

/// `Tracer` implementation to create and manage spans
#[derive(Clone)]
pub struct Tracer {
    name: Cow<'static, str>,
    provider: TracerProvider,
}

impl fmt::Debug for Tracer {
    /// Omitting `provider` here is necessary to avoid cycles.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").field("name", &self.name).finish()
    }
}

impl Tracer {
    pub(crate) fn new(name: Cow<'static, str>, provider: TracerProvider) -> Self {
        Tracer { name, provider }
    }

    pub(crate) fn provider(&self) -> &TracerProvider {
        &self.provider
    }

    /// Name this tracer was created with.
    pub fn name(&self) -> &Cow<'static, str> {
        &self.name
    }

    /// Starts a span named `name` whose parent is the span context of
    /// `parent_cx`.
    ///
    /// Without a valid parent the span is the root of a new trace and is
    /// sampled. With one it joins the parent's trace, inherits its flags and
    /// records its span id as `parent_span_id`. The new span always gets a
    /// fresh span id.
    pub fn start_with_context(
        &self,
        name: impl Into<Cow<'static, str>>,
        kind: SpanKind,
        parent_cx: &Context,
    ) -> Span {
        self.span_builder(name)
            .with_kind(kind)
            .start_with_context(self, parent_cx)
    }

    /// Creates a span builder to set options before starting the span.
    pub fn span_builder(&self, name: impl Into<Cow<'static, str>>) -> SpanBuilder {
        SpanBuilder::from_name(name)
    }

    fn build_span(&self, builder: SpanBuilder, parent_cx: &Context) -> Span {
        let provider = self.provider();
        // Spans started after shutdown are non-recording and get no ids.
        if provider.is_shutdown() {
            return Span::new(SpanContext::empty_context(), None, None, self.clone());
        }

        let config = provider.config();
        let span_id = config.id_generator.new_span_id();
        let parent = parent_cx.span_context().filter(|psc| psc.is_valid());
        let (trace_id, trace_flags, parent_span_id) = match parent {
            Some(psc) => (psc.trace_id(), psc.trace_flags(), Some(psc.span_id())),
            None => (config.id_generator.new_trace_id(), TraceFlags::SAMPLED, None),
        };
        let span_context = SpanContext::new(trace_id, span_id, trace_flags, false);

        let SpanBuilder {
            name,
            span_kind,
            attributes,
            start_time,
        } = builder;

        let mut span = Span::new(
            span_context,
            parent_span_id,
            Some(SpanRecord {
                span_kind: span_kind.unwrap_or(SpanKind::Internal),
                name,
                start_time: start_time.unwrap_or_else(wiretrace::time::now),
                attributes: Vec::new(),
                status: Status::default(),
            }),
            self.clone(),
        );
        if let Some(attributes) = attributes {
            span.set_attributes(attributes);
        }
        span
    }
}

/// `SpanBuilder` allows span attributes to be configured before the span
/// has started.
#[derive(Clone, Debug, Default)]
pub struct SpanBuilder {
    /// Span name
    pub name: Cow<'static, str>,
    /// Span kind, `Internal` when unset
    pub span_kind: Option<SpanKind>,
    /// Span attributes
    pub attributes: Option<Vec<KeyValue>>,
    /// Span start time, now when unset
    pub start_time: Option<SystemTime>,
}

impl SpanBuilder {
    /// Create a new span builder from a span name
    pub fn from_name(name: impl Into<Cow<'static, str>>) -> Self {
        SpanBuilder {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Assign span kind
    pub fn with_kind(self, span_kind: SpanKind) -> Self {
        SpanBuilder {
            span_kind: Some(span_kind),
            ..self
        }
    }

    /// Assign span attributes from an iterable.
    pub fn with_attributes<I>(self, attributes: I) -> Self
    where
        I: IntoIterator<Item = KeyValue>,
    {
        SpanBuilder {
            attributes: Some(attributes.into_iter().collect()),
            ..self
        }
    }

    /// Assign span start time
    pub fn with_start_time<T: Into<SystemTime>>(self, start_time: T) -> Self {
        SpanBuilder {
            start_time: Some(start_time.into()),
            ..self
        }
    }

    /// Builds a span with the given tracer from this configuration.
    pub fn start_with_context(self, tracer: &Tracer, parent_cx: &Context) -> Span {
        tracer.build_span(self, parent_cx)
    }
}
