//! The Greeter service: `/Greeter/Greet`.
use serde::{Deserialize, Serialize};
use tonic::{Request, Response, Status};
use wiretrace_rpc::{Channel, Handler, Method, RpcFuture};

/// Service name of the Greeter.
pub const SERVICE: &str = "Greeter";
/// The greeting method.
pub const GREET: &str = "Greet";

/// Request of `/Greeter/Greet`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInput {
    /// Greeting word, such as `Hello`
    pub greeting: String,
    /// Who to greet
    pub name: String,
}

/// Response of `/Greeter/Greet`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOutput {
    /// The composed greeting
    pub message: String,
}

/// Replies `"{greeting}, {name}!"`.
#[derive(Clone, Debug, Default)]
pub struct Greeter {
    _private: (),
}

impl Greeter {
    /// Create a greeter.
    pub fn new() -> Self {
        Greeter::default()
    }
}

impl Handler<ClientInput, ServerOutput> for Greeter {
    fn handle(
        &self,
        method: Method,
        request: Request<ClientInput>,
    ) -> RpcFuture<Response<ServerOutput>> {
        if method.service() != SERVICE || method.method() != GREET {
            return Box::pin(std::future::ready(Err(Status::unimplemented(format!(
                "unknown method {method}"
            )))));
        }

        let ClientInput { greeting, name } = request.into_inner();
        tracing::info!(greeting = %greeting, name = %name, "Greeting");
        let message = format!("{greeting}, {name}!");
        Box::pin(std::future::ready(Ok(Response::new(ServerOutput {
            message,
        }))))
    }
}

/// Typed client of the Greeter service.
#[derive(Clone, Debug)]
pub struct GreeterClient<C> {
    channel: C,
}

impl<C> GreeterClient<C>
where
    C: Channel<ClientInput, ServerOutput>,
{
    /// Create a client sending over `channel`.
    pub fn new(channel: C) -> Self {
        GreeterClient { channel }
    }

    /// Sends `greeting` for `name` and returns the server's message.
    pub async fn greet(
        &self,
        greeting: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<String, Status> {
        let request = Request::new(ClientInput {
            greeting: greeting.into(),
            name: name.into(),
        });
        let response = self
            .channel
            .unary(Method::new(SERVICE, GREET), request)
            .await?;
        Ok(response.into_inner().message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn composes_message() {
        let output = Greeter::new()
            .handle(
                Method::new(SERVICE, GREET),
                Request::new(ClientInput {
                    greeting: "Hello".to_string(),
                    name: "Tonic".to_string(),
                }),
            )
            .await
            .unwrap()
            .into_inner();

        assert_eq!(output.message, "Hello, Tonic!");
    }
}
