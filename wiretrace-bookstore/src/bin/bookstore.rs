//! Runs the BookStore and Greeter services in-process with tracing on both
//! sides and prints every finished span as a JSON line.
use std::sync::Arc;
use wiretrace_bookstore::telemetry::{init_logging, init_tracer_provider};
use wiretrace_bookstore::{BookStore, BookStoreClient, Catalog, Greeter, GreeterClient};
use wiretrace_rpc::{in_process, ClientInterceptor, ServerInterceptor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_logging()?;

    let server_provider = init_tracer_provider("bookstore-server");
    let client_provider = init_tracer_provider("bookstore-client");

    let (book_channel, book_server) = in_process::serve(ServerInterceptor::new(
        BookStore::new(Arc::new(Catalog::default())),
        server_provider.tracer("bookstore"),
    ));
    let (greet_channel, greet_server) = in_process::serve(ServerInterceptor::new(
        Greeter::new(),
        server_provider.tracer("greeter"),
    ));

    let books = BookStoreClient::new(ClientInterceptor::new(
        book_channel,
        client_provider.tracer("bookstore-client"),
    ));
    let greeter = GreeterClient::new(ClientInterceptor::new(
        greet_channel,
        client_provider.tracer("greeter-client"),
    ));

    for query in ["Great", "To Kill", "Zzz"] {
        match books.first(query).await {
            Ok(Some(book)) => tracing::info!(
                query,
                name = %book.name,
                author = %book.author,
                price = book.price,
                "Found book"
            ),
            Ok(None) => tracing::info!(query, "No book found"),
            Err(status) => tracing::error!(query, %status, "Lookup failed"),
        }
    }

    match greeter.greet("Hello", "Tonic").await {
        Ok(message) => tracing::info!(%message, "Greeted"),
        Err(status) => tracing::error!(%status, "Greeting failed"),
    }

    book_server.sever();
    greet_server.sever();
    if let Err(status) = books.first("Great").await {
        tracing::info!(%status, "Lookup after severing failed as expected");
    }

    client_provider.shutdown()?;
    server_provider.shutdown()?;
    Ok(())
}
