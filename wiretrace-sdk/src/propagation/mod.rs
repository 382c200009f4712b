//! Wire encodings for span contexts.
mod trace_context;

pub use trace_context::TraceContextPropagator;
