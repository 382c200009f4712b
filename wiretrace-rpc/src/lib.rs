//! Trace context propagation for request/response RPC calls.
//!
//! This crate wraps the two hook points of an RPC transport:
//!
//! * [`Channel`] is the outbound side. [`ClientInterceptor`] decorates any
//!   channel: it starts a `CLIENT` span, writes the span's context into the
//!   request metadata and ends the span when the call completes, fails or is
//!   dropped.
//! * [`Handler`] is the inbound side. [`ServerInterceptor`] decorates any
//!   handler: it reads the caller's context from the request metadata, starts
//!   a `SERVER` span as its child and keeps that span's context active while
//!   the handler runs, so outbound calls the handler makes continue the same
//!   trace.
//!
//! Requests, responses and errors are plain [`tonic`] types. Interceptors
//! never change them: a failing call fails the same way with or without
//! tracing.
//!
//! [`in_process`] provides a transport that connects a channel to a handler
//! inside one process, without shared memory between the two sides.
//!
//! ```
//! use wiretrace_rpc::{in_process, ClientInterceptor, Channel, Handler, Method, RpcFuture, ServerInterceptor};
//! use wiretrace_sdk::trace::{InMemorySpanExporter, TracerProvider};
//!
//! struct Echo;
//!
//! impl Handler<String, String> for Echo {
//!     fn handle(&self, _method: Method, request: tonic::Request<String>) -> RpcFuture<tonic::Response<String>> {
//!         let message = request.into_inner();
//!         Box::pin(async move { Ok(tonic::Response::new(message)) })
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let exporter = InMemorySpanExporter::default();
//! let provider = TracerProvider::builder()
//!     .with_simple_exporter(exporter.clone())
//!     .build();
//!
//! let (channel, _server) = in_process::serve(ServerInterceptor::new(Echo, provider.tracer("server")));
//! let client = ClientInterceptor::new(channel, provider.tracer("client"));
//!
//! let reply = client
//!     .unary(Method::new("Echo", "Say"), tonic::Request::new("hi".to_string()))
//!     .await
//!     .unwrap();
//! assert_eq!(reply.into_inner(), "hi");
//! assert_eq!(exporter.get_finished_spans().unwrap().len(), 2);
//! # }
//! ```
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(test, deny(warnings))]

mod call_span;
mod client;
mod metadata;
mod method;
mod server;
mod transport;

pub mod in_process;
pub mod semconv;

pub use client::ClientInterceptor;
pub use metadata::{MetadataExtractor, MetadataInjector};
pub use method::Method;
pub use server::ServerInterceptor;
pub use transport::{Channel, Handler, RpcFuture};
