//! A transport connecting a [`Channel`] to a [`Handler`] inside one process.
//!
//! The two sides share no memory: request and response messages are encoded
//! with `serde_json` on one side and decoded on the other, and metadata is
//! copied entry by entry. Each call runs on its own tokio task, so a handler
//! starts with no active context, exactly as it would in a separate server
//! process.
//!
//! [`serve`] must be called from within a tokio runtime.
use crate::{Channel, Handler, Method, RpcFuture};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinSet;
use tonic::metadata::{KeyAndValueRef, MetadataKey, MetadataMap, MetadataValue};
use tonic::Status;
use wiretrace::{wt_debug, wt_info};

/// Calls buffered by the transport before senders wait.
const CALL_QUEUE_SIZE: usize = 64;

/// One encoded request on its way to the server.
struct Call {
    path: String,
    metadata: MetadataMap,
    body: Vec<u8>,
    reply: oneshot::Sender<Result<Reply, Status>>,
}

/// One encoded response on its way back to the client.
struct Reply {
    metadata: MetadataMap,
    body: Vec<u8>,
}

/// Client end of an in-process transport.
///
/// Cheap to clone; clones share the connection.
pub struct InProcessChannel<Req, Resp> {
    sender: mpsc::Sender<Call>,
    _marker: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> Clone for InProcessChannel<Req, Resp> {
    fn clone(&self) -> Self {
        InProcessChannel {
            sender: self.sender.clone(),
            _marker: PhantomData,
        }
    }
}

impl<Req, Resp> fmt::Debug for InProcessChannel<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InProcessChannel")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// Server end of an in-process transport.
///
/// Dropping the handle leaves the server running for as long as channels to
/// it exist.
#[derive(Debug)]
pub struct ServerHandle {
    severed: Arc<Notify>,
}

impl ServerHandle {
    /// Cuts the transport.
    ///
    /// Calls sent afterwards, and calls still being handled, fail with
    /// [`tonic::Code::Unavailable`]. In-flight handlers are aborted.
    pub fn sever(&self) {
        self.severed.notify_one();
    }
}

/// Starts serving `handler` and returns a channel connected to it.
///
/// # Panics
///
/// Panics when called outside of a tokio runtime.
pub fn serve<H, Req, Resp>(handler: H) -> (InProcessChannel<Req, Resp>, ServerHandle)
where
    H: Handler<Req, Resp> + 'static,
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(CALL_QUEUE_SIZE);
    let severed = Arc::new(Notify::new());

    tokio::spawn(accept_loop(Arc::new(handler), receiver, severed.clone()));

    (
        InProcessChannel {
            sender,
            _marker: PhantomData,
        },
        ServerHandle { severed },
    )
}

async fn accept_loop<H, Req, Resp>(
    handler: Arc<H>,
    mut receiver: mpsc::Receiver<Call>,
    severed: Arc<Notify>,
) where
    H: Handler<Req, Resp> + 'static,
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
{
    let mut in_flight = JoinSet::new();
    loop {
        tokio::select! {
            biased;
            _ = severed.notified() => {
                wt_info!(name: "InProcessServer.Severed", in_flight = in_flight.len() as u64);
                break;
            }
            call = receiver.recv() => match call {
                Some(call) => {
                    in_flight.spawn(dispatch(handler.clone(), call));
                }
                None => break,
            },
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }
    // Dropping the receiver fails queued calls, dropping the set aborts
    // running ones; both surface to the client as `Unavailable`.
    drop(receiver);
    in_flight.abort_all();
}

async fn dispatch<H, Req, Resp>(handler: Arc<H>, call: Call)
where
    H: Handler<Req, Resp> + 'static,
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
{
    let Call {
        path,
        metadata,
        body,
        reply,
    } = call;

    let result = async {
        let method = Method::from_path(&path)
            .ok_or_else(|| Status::unimplemented(format!("malformed method path {path:?}")))?;
        let message: Req = serde_json::from_slice(&body)
            .map_err(|err| Status::invalid_argument(format!("cannot decode request: {err}")))?;
        let request = tonic::Request::from_parts(metadata, tonic::Extensions::default(), message);

        let response = handler.handle(method, request).await?;
        let (metadata, message, _) = response.into_parts();
        let body = serde_json::to_vec(&message)
            .map_err(|err| Status::internal(format!("cannot encode response: {err}")))?;
        Ok::<_, Status>(Reply {
            metadata: copy_metadata(&metadata),
            body,
        })
    }
    .await;

    if reply.send(result.map_err(|status| copy_status(&status))).is_err() {
        wt_debug!(name: "InProcessServer.ReplyDropped", path = path);
    }
}

impl<Req, Resp> Channel<Req, Resp> for InProcessChannel<Req, Resp>
where
    Req: Serialize + Send + 'static,
    Resp: DeserializeOwned + Send + 'static,
{
    fn unary(
        &self,
        method: Method,
        request: tonic::Request<Req>,
    ) -> RpcFuture<tonic::Response<Resp>> {
        let sender = self.sender.clone();
        let (metadata, _, message) = request.into_parts();
        let encoded = serde_json::to_vec(&message);

        Box::pin(async move {
            let body = encoded
                .map_err(|err| Status::internal(format!("cannot encode request: {err}")))?;
            let (reply, response) = oneshot::channel();
            let call = Call {
                path: method.to_string(),
                metadata: copy_metadata(&metadata),
                body,
                reply,
            };

            sender
                .send(call)
                .await
                .map_err(|_| Status::unavailable("transport severed before the call was sent"))?;
            let reply = response
                .await
                .map_err(|_| Status::unavailable("transport severed during the call"))??;

            let message: Resp = serde_json::from_slice(&reply.body)
                .map_err(|err| Status::internal(format!("cannot decode response: {err}")))?;
            let mut response = tonic::Response::new(message);
            *response.metadata_mut() = reply.metadata;
            Ok(response)
        })
    }
}

/// Rebuilds every entry from its bytes, so the two sides never share a
/// metadata buffer.
fn copy_metadata(source: &MetadataMap) -> MetadataMap {
    let mut copy = MetadataMap::with_capacity(source.len());
    for entry in source.iter() {
        match entry {
            KeyAndValueRef::Ascii(key, value) => {
                if let (Ok(key), Ok(value)) = (
                    MetadataKey::from_bytes(key.as_str().as_bytes()),
                    MetadataValue::try_from(value.as_encoded_bytes()),
                ) {
                    copy.append(key, value);
                }
            }
            KeyAndValueRef::Binary(key, value) => {
                if let (Ok(key), Ok(value)) = (
                    MetadataKey::from_bytes(key.as_str().as_bytes()),
                    value.to_bytes(),
                ) {
                    copy.append_bin(key, MetadataValue::from_bytes(&value));
                }
            }
        }
    }
    copy
}

fn copy_status(status: &Status) -> Status {
    Status::new(status.code(), status.message().to_owned())
}
