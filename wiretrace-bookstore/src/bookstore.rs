//! The BookStore service: `/BookStore/First`.
use crate::catalog::{Book, Catalog};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tonic::{Request, Response, Status};
use wiretrace_rpc::{Channel, Handler, Method, RpcFuture};

/// Service name of the BookStore.
pub const SERVICE: &str = "BookStore";
/// The lookup method.
pub const FIRST: &str = "First";

/// Request of `/BookStore/First`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSearch {
    /// Title prefix to look for
    pub name: String,
}

/// Response of `/BookStore/First`; `book` is `None` when nothing matched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookReply {
    /// The first matching book
    pub book: Option<Book>,
}

/// Answers title lookups from a [`Catalog`].
///
/// A query without a match is a successful call with an empty reply, not an
/// error.
#[derive(Clone, Debug)]
pub struct BookStore {
    catalog: Arc<Catalog>,
}

impl BookStore {
    /// Serve lookups from `catalog`.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        BookStore { catalog }
    }
}

impl Handler<BookSearch, BookReply> for BookStore {
    fn handle(
        &self,
        method: Method,
        request: Request<BookSearch>,
    ) -> RpcFuture<Response<BookReply>> {
        if method.service() != SERVICE || method.method() != FIRST {
            return Box::pin(std::future::ready(Err(Status::unimplemented(format!(
                "unknown method {method}"
            )))));
        }

        let query = request.into_inner().name;
        tracing::info!(query = %query, "Searching for book");
        let book = self.catalog.first(&query).cloned();
        if book.is_none() {
            tracing::info!(query = %query, "No book matched");
        }
        Box::pin(std::future::ready(Ok(Response::new(BookReply { book }))))
    }
}

/// Typed client of the BookStore service.
#[derive(Clone, Debug)]
pub struct BookStoreClient<C> {
    channel: C,
}

impl<C> BookStoreClient<C>
where
    C: Channel<BookSearch, BookReply>,
{
    /// Create a client sending over `channel`.
    pub fn new(channel: C) -> Self {
        BookStoreClient { channel }
    }

    /// Looks up the first book whose title starts with `name`.
    pub async fn first(&self, name: impl Into<String>) -> Result<Option<Book>, Status> {
        let request = Request::new(BookSearch { name: name.into() });
        let reply = self
            .channel
            .unary(Method::new(SERVICE, FIRST), request)
            .await?;
        Ok(reply.into_inner().book)
    }
}
