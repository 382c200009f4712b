use crate::semconv;
use crate::Method;
use wiretrace::trace::{SpanKind, Status};
use wiretrace::{Context, KeyValue};
use wiretrace_sdk::trace::{Span, Tracer};

/// Description recorded when a call is dropped before it completed.
const CANCELLED: &str = "call cancelled";

/// Owns the span of one call leg until the call resolves.
///
/// If the call future is dropped first, the span is ended with an error
/// status instead, so every started span is reported exactly once.
#[derive(Debug)]
pub(crate) struct CallSpan {
    span: Span,
}

impl CallSpan {
    /// Starts the span for one call to `method` under `parent_cx`.
    pub(crate) fn start(
        tracer: &Tracer,
        method: &Method,
        kind: SpanKind,
        parent_cx: &Context,
    ) -> Self {
        let span = tracer
            .span_builder(method.to_string())
            .with_kind(kind)
            .with_attributes([
                KeyValue::new(semconv::RPC_SYSTEM, "grpc"),
                KeyValue::new(semconv::RPC_SERVICE, method.service().to_owned()),
                KeyValue::new(semconv::RPC_METHOD, method.method().to_owned()),
                KeyValue::new(semconv::COMPONENT, "grpc"),
            ])
            .start_with_context(tracer, parent_cx);
        CallSpan { span }
    }

    /// `parent_cx` with this span's context as the active span context.
    pub(crate) fn context(&self, parent_cx: &Context) -> Context {
        parent_cx.with_span_context(*self.span.span_context())
    }

    /// Records the outcome of the call and ends the span.
    ///
    /// A successful call leaves the status unset; a failed one records the
    /// gRPC status as an error.
    pub(crate) fn finish<T>(mut self, result: &Result<T, tonic::Status>) {
        if let Err(status) = result {
            self.span.set_attribute(KeyValue::new(
                semconv::RPC_GRPC_STATUS_CODE,
                i64::from(status.code() as i32),
            ));
            self.span.set_status(Status::error(error_description(status)));
        }
        self.span.end();
    }
}

impl Drop for CallSpan {
    fn drop(&mut self) {
        if self.span.is_recording() {
            self.span.set_status(Status::error(CANCELLED));
            self.span.end();
        }
    }
}

/// The status message, or the code's description when the peer sent none.
fn error_description(status: &tonic::Status) -> String {
    if status.message().is_empty() {
        status.code().description().to_owned()
    } else {
        status.message().to_owned()
    }
}
