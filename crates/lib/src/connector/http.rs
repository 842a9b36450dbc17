//! The HTTP transport: reqwest on the client side, axum on the server side.
//!
//! Verb mapping: get→GET, set→PUT, create→POST, delete→DELETE (with an
//! optional JSON body for delete-by-value), invoke→POST on `<path>/invoke`.
//! The server answers every request with HTTP 200 and a metaprotocol
//! envelope; success and failure live in the envelope, not the status code.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::{Path as UrlPath, State},
    response::Json,
    routing::get,
};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::{
    Node, Result,
    metaprotocol::Envelope,
    path::Address,
    provider::Provider,
    serializer::Serializer,
    wire::Opcode,
};

use super::{
    ConnectorError,
    shared::{ServerState, execute_verb, wait_for_ready},
};

/// Client side of the HTTP mapping, bound to one endpoint.
pub struct HttpConnector {
    /// `scheme://host[:port]`, no trailing slash.
    base_url: String,
    client: reqwest::Client,
    serializer: Serializer,
}

impl HttpConnector {
    pub fn new(address: &Address) -> Result<Self> {
        Ok(Self {
            base_url: address.authority(),
            client: reqwest::Client::new(),
            serializer: Serializer::default(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Sends one request and unwraps the envelope in the response body.
    async fn round_trip(&self, request: reqwest::RequestBuilder) -> Result<Option<Value>> {
        let response = request
            .send()
            .await
            .map_err(|e| ConnectorError::ConnectionFailed {
                address: self.base_url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        debug!(endpoint = %self.base_url, status = %status, "received response");

        let envelope: Envelope = response.json().await.map_err(|e| {
            ConnectorError::Transport(format!(
                "invalid envelope from {} (HTTP {status}): {e}",
                self.base_url
            ))
        })?;
        envelope.into_result()
    }

    fn node_body(&self, node: &Node) -> Value {
        self.serializer.to_json(node)
    }
}

#[async_trait]
impl Provider for HttpConnector {
    async fn get(&self, path: &str) -> Result<Node> {
        let entity = self.round_trip(self.client.get(self.url(path))).await?;
        Ok(self.serializer.from_json(entity.unwrap_or(Value::Null)))
    }

    async fn set(&self, path: &str, value: Node) -> Result<()> {
        let request = self.client.put(self.url(path)).json(&self.node_body(&value));
        self.round_trip(request).await?;
        Ok(())
    }

    async fn create(&self, path: &str, value: Node) -> Result<()> {
        let request = self
            .client
            .post(self.url(path))
            .json(&self.node_body(&value));
        self.round_trip(request).await?;
        Ok(())
    }

    async fn delete(&self, path: &str, value: Option<Node>) -> Result<()> {
        let mut request = self.client.delete(self.url(path));
        if let Some(node) = &value {
            request = request.json(&self.node_body(node));
        }
        self.round_trip(request).await?;
        Ok(())
    }

    async fn invoke(&self, path: &str, args: Vec<Node>) -> Result<Node> {
        let json_args: Vec<Value> = args.iter().map(|a| self.serializer.to_json(a)).collect();
        let url = format!("{}/invoke", self.url(path));
        let request = self.client.post(url).json(&Value::Array(json_args));
        let entity = self.round_trip(request).await?;
        Ok(self.serializer.from_json(entity.unwrap_or(Value::Null)))
    }
}

/// Server side of the HTTP mapping over a shared provider.
pub struct HttpServer {
    provider: Arc<dyn Provider>,
    state: ServerState,
}

impl HttpServer {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            state: ServerState::new(),
        }
    }

    fn router(provider: Arc<dyn Provider>) -> Router {
        Router::new()
            .route(
                "/",
                get(handle_root_get)
                    .put(handle_root_put)
                    .post(handle_root_post)
                    .delete(handle_root_delete),
            )
            .route(
                "/{*path}",
                get(handle_get)
                    .put(handle_put)
                    .post(handle_post)
                    .delete(handle_delete),
            )
            .with_state(provider)
    }

    /// Binds the listener and spawns the axum server. Bind to port 0 for a
    /// dynamic port; [`get_address`](Self::get_address) reports the resolved
    /// one.
    pub async fn start(&mut self, addr: &str) -> Result<()> {
        if self.state.is_running() {
            return Err(ConnectorError::ServerAlreadyRunning {
                address: addr.to_string(),
            }
            .into());
        }

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            ConnectorError::ServerBind {
                address: addr.to_string(),
                reason: e.to_string(),
            }
        })?;
        let actual_addr = listener
            .local_addr()
            .map_err(|e| ConnectorError::ServerBind {
                address: addr.to_string(),
                reason: e.to_string(),
            })?;

        let router = Self::router(self.provider.clone());
        let (ready_tx, ready_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let _ = ready_tx.send(());
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                warn!(error = %e, "server terminated with an error");
            }
        });

        wait_for_ready(ready_rx, addr).await?;
        self.state.server_started(actual_addr.to_string(), shutdown_tx);
        debug!(address = %actual_addr, "server started");
        Ok(())
    }

    /// Signals graceful shutdown. In-flight requests finish first.
    pub fn stop(&mut self) -> Result<()> {
        if !self.state.is_running() {
            return Err(ConnectorError::ServerNotRunning.into());
        }
        self.state.stop_server();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// The bound `ip:port`, resolved after bind.
    pub fn get_address(&self) -> Result<String> {
        Ok(self.state.get_address()?)
    }
}

type AppState = State<Arc<dyn Provider>>;

async fn handle_root_get(State(provider): AppState) -> Json<Envelope> {
    Json(execute_verb(provider.as_ref(), Opcode::Get, "", None).await)
}

async fn handle_root_put(State(provider): AppState, body: Bytes) -> Json<Envelope> {
    Json(execute_verb(provider.as_ref(), Opcode::Set, "", Some(&body)).await)
}

async fn handle_root_post(State(provider): AppState, body: Bytes) -> Json<Envelope> {
    Json(execute_verb(provider.as_ref(), Opcode::Create, "", Some(&body)).await)
}

async fn handle_root_delete(State(provider): AppState, body: Bytes) -> Json<Envelope> {
    Json(execute_verb(provider.as_ref(), Opcode::Delete, "", optional(&body)).await)
}

async fn handle_get(State(provider): AppState, UrlPath(path): UrlPath<String>) -> Json<Envelope> {
    Json(execute_verb(provider.as_ref(), Opcode::Get, &path, None).await)
}

async fn handle_put(
    State(provider): AppState,
    UrlPath(path): UrlPath<String>,
    body: Bytes,
) -> Json<Envelope> {
    Json(execute_verb(provider.as_ref(), Opcode::Set, &path, Some(&body)).await)
}

/// POST doubles as create and invoke; a trailing `/invoke` segment selects
/// the latter, with the arguments array as the body.
async fn handle_post(
    State(provider): AppState,
    UrlPath(path): UrlPath<String>,
    body: Bytes,
) -> Json<Envelope> {
    let envelope = match path.strip_suffix("/invoke").or_else(|| {
        (path == "invoke").then_some("")
    }) {
        Some(target) => {
            execute_verb(provider.as_ref(), Opcode::Invoke, target, optional(&body)).await
        }
        None => execute_verb(provider.as_ref(), Opcode::Create, &path, Some(&body)).await,
    };
    Json(envelope)
}

async fn handle_delete(
    State(provider): AppState,
    UrlPath(path): UrlPath<String>,
    body: Bytes,
) -> Json<Envelope> {
    Json(execute_verb(provider.as_ref(), Opcode::Delete, &path, optional(&body)).await)
}

/// An empty request body means "no payload", not an empty JSON document.
fn optional(body: &Bytes) -> Option<&[u8]> {
    if body.is_empty() { None } else { Some(body) }
}
