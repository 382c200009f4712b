//! BookStore and Greeter services traced with `wiretrace`.
//!
//! Both services are ordinary [`Handler`]s; tracing is added by wrapping them
//! in a [`ServerInterceptor`] on the server and wrapping the channel in a
//! [`ClientInterceptor`] on the client. The typed clients here work over any
//! [`Channel`], intercepted or not.
//!
//! [`Handler`]: wiretrace_rpc::Handler
//! [`Channel`]: wiretrace_rpc::Channel
//! [`ServerInterceptor`]: wiretrace_rpc::ServerInterceptor
//! [`ClientInterceptor`]: wiretrace_rpc::ClientInterceptor
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(test, deny(warnings))]

pub mod bookstore;
pub mod catalog;
pub mod greeter;
pub mod telemetry;

pub use bookstore::{BookReply, BookSearch, BookStore, BookStoreClient};
pub use catalog::{Book, Catalog};
pub use greeter::{ClientInput, Greeter, GreeterClient, ServerOutput};
