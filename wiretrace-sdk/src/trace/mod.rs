//! # Trace SDK
//!
//! The tracing SDK consist of a few main structs:
//!
//! * The [`Tracer`] struct which performs all tracing operations.
//! * The [`Span`] struct with is a mutable object storing information about the
//!   current operation execution.
//! * The [`TracerProvider`] struct which configures and produces [`Tracer`]s.
mod config;
mod export;
mod id_generator;
mod in_memory_exporter;
mod provider;
mod span;
mod span_processor;
mod stdout_exporter;
mod tracer;

pub use config::Config;
pub use export::{SpanData, SpanExporter};
pub use id_generator::{IdGenerator, IncrementIdGenerator, RandomIdGenerator};
pub use in_memory_exporter::InMemorySpanExporter;
pub use provider::{TracerProvider, TracerProviderBuilder};
pub use span::Span;
pub use span_processor::{
    BatchConfig, BatchConfigBuilder, BatchSpanProcessor, BatchSpanProcessorBuilder,
    SimpleSpanProcessor, SpanProcessor,
};
pub use stdout_exporter::StdoutSpanExporter;
pub use tracer::{SpanBuilder, Tracer};
