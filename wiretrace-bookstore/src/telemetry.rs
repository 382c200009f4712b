//! Log and trace pipeline setup shared by the demo binary.
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use wiretrace_sdk::trace::{StdoutSpanExporter, TracerProvider};

/// Installs a `fmt` subscriber as the global default.
///
/// `RUST_LOG` overrides the filter; without it application events are shown
/// at `info` and the wiretrace crates' internal events at `debug`.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info")
            .add_directive("wiretrace=debug".parse()?)
            .add_directive("wiretrace_sdk=debug".parse()?)
            .add_directive("wiretrace_rpc=debug".parse()?),
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_thread_names(true)
        .with_filter(filter);

    tracing_subscriber::registry().with(fmt_layer).try_init()?;
    Ok(())
}

/// A provider reporting as `service_name` that writes finished spans to
/// stdout, one JSON object per line, from a background batch thread.
///
/// Call [`TracerProvider::shutdown`] before exiting so buffered spans are
/// written.
pub fn init_tracer_provider(service_name: &'static str) -> TracerProvider {
    TracerProvider::builder()
        .with_service_name(service_name)
        .with_batch_exporter(StdoutSpanExporter::default())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_carries_service_name() {
        let provider = init_tracer_provider("bookstore-client");
        assert_eq!(provider.service_name(), "bookstore-client");
        assert!(provider.shutdown().is_ok());
    }
}
