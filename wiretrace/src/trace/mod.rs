//! API for describing a position in a distributed trace.
//!
//! A trace is a tree of spans that share one [`TraceId`]. Every span is
//! identified by a [`SpanContext`]; the context is what crosses process
//! boundaries, while the rest of a span's record stays with the process that
//! produced it.
//!
//! The currently active span context of an execution unit is read with
//! [`current_span_context`] and changed by attaching a [`Context`].
//!
//! [`Context`]: crate::Context
use std::borrow::Cow;
use thiserror::Error;

mod span_context;

pub use span_context::{SpanContext, SpanId, TraceFlags, TraceId};

/// Returns the span context active on the current execution unit, if any.
///
/// ```
/// use wiretrace::trace::current_span_context;
///
/// assert!(current_span_context().is_none());
/// ```
pub fn current_span_context() -> Option<SpanContext> {
    crate::Context::map_current(|cx| cx.span_context().copied())
}

/// `SpanKind` describes the relationship between the span, its parents, and
/// its children in a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// Indicates that the span describes a request to some remote service. This
    /// span is usually the parent of a remote `SpanKind::Server` span and does
    /// not end until the response is received.
    Client,

    /// Indicates that the span covers server-side handling of a synchronous RPC
    /// or other remote request. This span is often the child of a remote
    /// `SpanKind::Client` span that was expected to wait for a response.
    Server,

    /// Default value.
    ///
    /// Indicates that the span represents an internal operation within an
    /// application, as opposed to an operation with remote parents or
    /// children.
    Internal,
}

impl SpanKind {
    /// Upper-case name of the kind, as used in exported records.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Client => "CLIENT",
            SpanKind::Server => "SERVER",
            SpanKind::Internal => "INTERNAL",
        }
    }
}

/// The status of a span.
///
/// These values form a total order: Ok > Error > Unset. Setting a status that
/// is lower than the current one has no effect, so an instrumentation layer
/// reporting `Error` never overrides an application's explicit `Ok`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd)]
pub enum Status {
    /// The default status.
    #[default]
    Unset,

    /// The operation contains an error.
    Error {
        /// The description of the error
        description: Cow<'static, str>,
    },

    /// The operation has been validated by an application developer or operator to
    /// have completed successfully.
    Ok,
}

impl Status {
    /// Create a new error status with a given description.
    ///
    /// # Examples
    ///
    /// ```
    /// use wiretrace::trace::Status;
    ///
    /// // record error with `str` description
    /// let error_status = Status::error("something went wrong");
    ///
    /// // or with `String` description
    /// let error_status = Status::error(format!("too many foos: {}", 42));
    /// # drop(error_status);
    /// ```
    pub fn error(description: impl Into<Cow<'static, str>>) -> Self {
        Status::Error {
            description: description.into(),
        }
    }
}

/// Describe the result of operations in tracing API.
pub type TraceResult<T> = Result<T, TraceError>;

/// Errors returned by the trace API.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    /// An identifier could not be decoded from its hex representation.
    #[error("invalid {kind} `{value}`: expected {expected_len} lowercase hex characters")]
    InvalidId {
        /// Which identifier was being decoded.
        kind: &'static str,
        /// The rejected input.
        value: String,
        /// The exact number of hex characters required.
        expected_len: usize,
    },

    /// Other errors propagated from trace SDK that weren't covered above
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl From<String> for TraceError {
    fn from(err_msg: String) -> Self {
        TraceError::Other(Box::new(Custom(err_msg)))
    }
}

impl From<&'static str> for TraceError {
    fn from(err_msg: &'static str) -> Self {
        TraceError::Other(Box::new(Custom(err_msg.into())))
    }
}

/// Wrap type for string
#[derive(Error, Debug)]
#[error("{0}")]
struct Custom(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_order() {
        assert!(Status::Ok > Status::error(""));
        assert!(Status::error("") > Status::Unset);
    }

    #[test]
    fn string_errors_display_their_message() {
        let err = TraceError::from("processor already shut down");
        assert_eq!(err.to_string(), "processor already shut down");
    }
}
