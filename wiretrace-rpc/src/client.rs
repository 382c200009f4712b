use crate::call_span::CallSpan;
use crate::{Channel, MetadataInjector, Method, RpcFuture};
use std::fmt;
use std::sync::Arc;
use wiretrace::propagation::TextMapPropagator;
use wiretrace::trace::SpanKind;
use wiretrace::{Context, FutureExt};
use wiretrace_sdk::propagation::TraceContextPropagator;
use wiretrace_sdk::trace::Tracer;

/// Decorates a [`Channel`] so every outbound call is traced.
///
/// For each call the interceptor:
///
/// 1. starts a `CLIENT` span whose parent is the caller's current context,
/// 2. writes the span's context into the request metadata,
/// 3. runs the inner channel with the span's context active,
/// 4. records a failed call as an error and ends the span.
///
/// Dropping the returned future before it resolves ends the span with an
/// error status. The response or error of the inner channel is returned
/// unchanged.
#[derive(Clone)]
pub struct ClientInterceptor<C> {
    inner: C,
    tracer: Tracer,
    propagator: Arc<dyn TextMapPropagator + Send + Sync>,
}

impl<C> fmt::Debug for ClientInterceptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientInterceptor")
            .field("tracer", &self.tracer)
            .field("propagator", &self.propagator)
            .finish()
    }
}

impl<C> ClientInterceptor<C> {
    /// Wrap `inner`, recording spans with `tracer` and propagating with
    /// [`TraceContextPropagator`].
    pub fn new(inner: C, tracer: Tracer) -> Self {
        ClientInterceptor {
            inner,
            tracer,
            propagator: Arc::new(TraceContextPropagator::new()),
        }
    }

    /// Replace the propagator used to write request metadata.
    pub fn with_propagator<P>(self, propagator: P) -> Self
    where
        P: TextMapPropagator + Send + Sync + 'static,
    {
        ClientInterceptor {
            propagator: Arc::new(propagator),
            ..self
        }
    }

    /// The wrapped channel.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }
}

impl<C, Req, Resp> Channel<Req, Resp> for ClientInterceptor<C>
where
    C: Channel<Req, Resp>,
    Resp: 'static,
{
    fn unary(
        &self,
        method: Method,
        mut request: tonic::Request<Req>,
    ) -> RpcFuture<tonic::Response<Resp>> {
        let parent_cx = Context::current();
        let call_span = CallSpan::start(&self.tracer, &method, SpanKind::Client, &parent_cx);
        let cx = call_span.context(&parent_cx);

        self.propagator
            .inject_context(&cx, &mut MetadataInjector(request.metadata_mut()));

        let call = {
            let _guard = cx.clone().attach();
            self.inner.unary(method, request)
        };

        Box::pin(async move {
            let result = call.with_context(cx).await;
            call_span.finish(&result);
            result
        })
    }
}
