use crate::call_span::CallSpan;
use crate::{Handler, MetadataExtractor, Method, RpcFuture};
use std::fmt;
use std::sync::Arc;
use wiretrace::propagation::TextMapPropagator;
use wiretrace::trace::SpanKind;
use wiretrace::{Context, FutureExt};
use wiretrace_sdk::propagation::TraceContextPropagator;
use wiretrace_sdk::trace::Tracer;

/// Decorates a [`Handler`] so every inbound call is traced.
///
/// The caller's context is read from the request metadata, falling back to
/// the current context when the metadata carries none or carries something
/// unreadable. A `SERVER` span is started as its child and its context stays
/// active for the whole handler, including across awaits, so outbound calls
/// made by the handler continue the trace.
///
/// Handler errors are recorded on the span and returned unchanged.
#[derive(Clone)]
pub struct ServerInterceptor<H> {
    inner: H,
    tracer: Tracer,
    propagator: Arc<dyn TextMapPropagator + Send + Sync>,
}

impl<H> fmt::Debug for ServerInterceptor<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerInterceptor")
            .field("tracer", &self.tracer)
            .field("propagator", &self.propagator)
            .finish()
    }
}

impl<H> ServerInterceptor<H> {
    /// Wrap `inner`, recording spans with `tracer` and propagating with
    /// [`TraceContextPropagator`].
    pub fn new(inner: H, tracer: Tracer) -> Self {
        ServerInterceptor {
            inner,
            tracer,
            propagator: Arc::new(TraceContextPropagator::new()),
        }
    }

    /// Replace the propagator used to read request metadata.
    pub fn with_propagator<P>(self, propagator: P) -> Self
    where
        P: TextMapPropagator + Send + Sync + 'static,
    {
        ServerInterceptor {
            propagator: Arc::new(propagator),
            ..self
        }
    }

    /// The wrapped handler.
    pub fn get_ref(&self) -> &H {
        &self.inner
    }
}

impl<H, Req, Resp> Handler<Req, Resp> for ServerInterceptor<H>
where
    H: Handler<Req, Resp>,
    Resp: 'static,
{
    fn handle(
        &self,
        method: Method,
        request: tonic::Request<Req>,
    ) -> RpcFuture<tonic::Response<Resp>> {
        let parent_cx = self.propagator.extract_with_context(
            &Context::current(),
            &MetadataExtractor(request.metadata()),
        );
        let call_span = CallSpan::start(&self.tracer, &method, SpanKind::Server, &parent_cx);
        let cx = call_span.context(&parent_cx);

        let call = {
            let _guard = cx.clone().attach();
            self.inner.handle(method, request)
        };

        Box::pin(async move {
            let result = call.with_context(cx).await;
            call_span.finish(&result);
            result
        })
    }
}
