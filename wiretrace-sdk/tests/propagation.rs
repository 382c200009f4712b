use rstest::rstest;
use std::collections::HashMap;
use wiretrace::propagation::{Extractor, TextMapPropagator};
use wiretrace::trace::SpanKind;
use wiretrace::Context;
use wiretrace_sdk::propagation::TraceContextPropagator;
use wiretrace_sdk::trace::{InMemorySpanExporter, TracerProvider};

fn provider(service: &'static str, exporter: &InMemorySpanExporter) -> TracerProvider {
    TracerProvider::builder()
        .with_service_name(service)
        .with_simple_exporter(exporter.clone())
        .build()
}

#[test]
fn remote_parent_links_two_providers() {
    let exporter = InMemorySpanExporter::default();
    let client = provider("client", &exporter);
    let server = provider("server", &exporter);
    let propagator = TraceContextPropagator::new();

    let client_span = client
        .tracer("client")
        .start_with_context("/BookStore/First", SpanKind::Client, &Context::new());
    let client_cx = Context::new().with_span_context(*client_span.span_context());

    let mut carrier: HashMap<String, String> = HashMap::new();
    propagator.inject_context(&client_cx, &mut carrier);
    assert_eq!(carrier.len(), 1);

    let server_cx = propagator.extract_with_context(&Context::new(), &carrier);
    assert!(server_cx.span_context().is_some_and(|sc| sc.is_remote()));

    let mut server_span =
        server
            .tracer("server")
            .start_with_context("/BookStore/First", SpanKind::Server, &server_cx);
    server_span.end();
    drop(client_span);

    let spans = exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 2);
    let (server_data, client_data) = (&spans[0], &spans[1]);

    assert_eq!(server_data.service_name, "server");
    assert_eq!(client_data.service_name, "client");
    assert_eq!(
        server_data.span_context.trace_id(),
        client_data.span_context.trace_id()
    );
    assert_eq!(
        server_data.parent_span_id,
        Some(client_data.span_context.span_id())
    );
    assert_eq!(client_data.parent_span_id, None);
}

#[rstest]
#[case::absent(None)]
#[case::empty(Some(""))]
#[case::garbage(Some("not-a-traceparent"))]
#[case::future_version(Some("01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"))]
fn server_starts_new_trace_without_usable_parent(#[case] traceparent: Option<&str>) {
    let exporter = InMemorySpanExporter::default();
    let server = provider("server", &exporter);
    let propagator = TraceContextPropagator::new();

    let mut carrier: HashMap<String, String> = HashMap::new();
    if let Some(value) = traceparent {
        carrier.insert("traceparent".to_string(), value.to_string());
    }

    let cx = propagator.extract_with_context(&Context::new(), &carrier);
    assert_eq!(cx, Context::new());

    server
        .tracer("server")
        .start_with_context("/BookStore/First", SpanKind::Server, &cx)
        .end();

    let spans = exporter.get_finished_spans().unwrap();
    assert_eq!(spans[0].parent_span_id, None);
    assert!(spans[0].span_context.is_valid());
    assert_eq!(Extractor::keys(&carrier).len(), usize::from(traceparent.is_some()));
}
