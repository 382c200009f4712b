use crate::Method;
use futures_util::future::BoxFuture;
use std::sync::Arc;

/// Future returned by every call hook.
pub type RpcFuture<T> = BoxFuture<'static, Result<T, tonic::Status>>;

/// Outbound hook point of a transport: sends one request and resolves to
/// the peer's response.
///
/// Request metadata is the wire carrier. Implementations must deliver every
/// ascii metadata entry to the peer unchanged.
pub trait Channel<Req, Resp>: Send + Sync {
    /// Send `request` to `method`.
    fn unary(&self, method: Method, request: tonic::Request<Req>)
        -> RpcFuture<tonic::Response<Resp>>;
}

/// Inbound hook point of a transport: the business logic answering one
/// request.
pub trait Handler<Req, Resp>: Send + Sync {
    /// Answer `request`, which was sent to `method`.
    fn handle(&self, method: Method, request: tonic::Request<Req>)
        -> RpcFuture<tonic::Response<Resp>>;
}

impl<Req, Resp, T: Channel<Req, Resp> + ?Sized> Channel<Req, Resp> for Arc<T> {
    fn unary(
        &self,
        method: Method,
        request: tonic::Request<Req>,
    ) -> RpcFuture<tonic::Response<Resp>> {
        (**self).unary(method, request)
    }
}

impl<Req, Resp, T: Channel<Req, Resp> + ?Sized> Channel<Req, Resp> for Box<T> {
    fn unary(
        &self,
        method: Method,
        request: tonic::Request<Req>,
    ) -> RpcFuture<tonic::Response<Resp>> {
        (**self).unary(method, request)
    }
}

impl<Req, Resp, T: Handler<Req, Resp> + ?Sized> Handler<Req, Resp> for Arc<T> {
    fn handle(
        &self,
        method: Method,
        request: tonic::Request<Req>,
    ) -> RpcFuture<tonic::Response<Resp>> {
        (**self).handle(method, request)
    }
}
