//! Errors returned by SDK operations.
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the span processing and export pipeline.
///
/// These never reach an RPC caller: the interceptors only ever see spans, and
/// pipeline failures are reported through internal logging.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SdkError {
    /// Shutdown has already been invoked.
    ///
    /// Shutdown is only performed once; later calls report this error and do
    /// nothing else.
    #[error("Shutdown already invoked")]
    AlreadyShutdown,

    /// The operation did not finish within the configured time.
    #[error("Operation timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The exporter or processor failed for a reason not covered above.
    #[error("Operation failed: {0}")]
    InternalFailure(String),
}

/// A specialized `Result` type for SDK operations.
pub type SdkResult = Result<(), SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            SdkError::AlreadyShutdown.to_string(),
            "Shutdown already invoked"
        );
        assert_eq!(
            SdkError::Timeout(Duration::from_millis(250)).to_string(),
            "Operation timed out after 250 ms"
        );
    }
}
