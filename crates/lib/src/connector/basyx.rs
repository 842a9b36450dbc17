//! The binary TCP transport: a connector opening one socket per call and a
//! task-per-connection server.
//!
//! Each connection carries exactly one request frame and one response frame
//! (see [`crate::wire`] for the layout). The server folds every error into a
//! metaprotocol envelope before writing the response; the only way a caller
//! sees a raw transport error is when no well-formed response arrived at all.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::{
    Error, Node, Result,
    metaprotocol::Envelope,
    path::Address,
    provider::Provider,
    serializer::Serializer,
    wire::{
        self, Opcode, RequestFrame, ResponseFrame, STATUS_ERROR, STATUS_OK,
    },
};

use super::{
    ConnectorError,
    shared::{ServerState, execute_verb, wait_for_ready},
};

/// Client side of the binary TCP protocol, bound to one endpoint.
pub struct BasyxConnector {
    /// `host:port` of the remote server.
    endpoint: String,
    serializer: Serializer,
}

impl BasyxConnector {
    pub fn new(address: &Address) -> Result<Self> {
        Ok(Self {
            endpoint: address.socket_addr()?,
            serializer: Serializer::default(),
        })
    }

    /// One full request/response round trip on a fresh connection.
    async fn round_trip(
        &self,
        opcode: Opcode,
        path: &str,
        payload: Option<Vec<u8>>,
    ) -> Result<Option<Value>> {
        let frame = RequestFrame {
            opcode,
            path: path.to_string(),
            payload,
        };

        let mut stream = TcpStream::connect(&self.endpoint).await.map_err(|e| {
            ConnectorError::ConnectionFailed {
                address: self.endpoint.clone(),
                reason: e.to_string(),
            }
        })?;

        stream
            .write_all(&wire::encode_request(&frame))
            .await
            .map_err(|e| transport(&self.endpoint, "writing request", e))?;

        let response = read_response(&mut stream)
            .await
            .map_err(|e| transport(&self.endpoint, "reading response", e))?;

        debug!(
            endpoint = %self.endpoint,
            status = response.status,
            "received response frame"
        );

        let envelope: Envelope = serde_json::from_slice(&response.body).map_err(|e| {
            ConnectorError::Transport(format!(
                "invalid envelope from {}: {e}",
                self.endpoint
            ))
        })?;
        envelope.into_result()
    }

    fn encode_node(&self, node: &Node) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.serializer.to_json(node))?)
    }
}

fn transport(endpoint: &str, stage: &str, error: std::io::Error) -> ConnectorError {
    ConnectorError::Transport(format!("{stage} on {endpoint}: {error}"))
}

/// Reads one length-prefixed response frame off the stream.
async fn read_response(stream: &mut TcpStream) -> std::io::Result<ResponseFrame> {
    let body = read_frame(stream).await?;
    wire::decode_response(&body).map_err(std::io::Error::other)
}

/// Reads a length prefix and the frame body it announces.
async fn read_frame(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut len_bytes = [0u8; 4];
    stream.read_exact(&mut len_bytes).await?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    wire::check_frame_len(len).map_err(std::io::Error::other)?;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await?;
    Ok(body)
}

#[async_trait]
impl Provider for BasyxConnector {
    async fn get(&self, path: &str) -> Result<Node> {
        let entity = self.round_trip(Opcode::Get, path, None).await?;
        Ok(self
            .serializer
            .from_json(entity.unwrap_or(Value::Null)))
    }

    async fn set(&self, path: &str, value: Node) -> Result<()> {
        let payload = self.encode_node(&value)?;
        self.round_trip(Opcode::Set, path, Some(payload)).await?;
        Ok(())
    }

    async fn create(&self, path: &str, value: Node) -> Result<()> {
        let payload = self.encode_node(&value)?;
        self.round_trip(Opcode::Create, path, Some(payload)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str, value: Option<Node>) -> Result<()> {
        let payload = match &value {
            Some(node) => Some(self.encode_node(node)?),
            None => None,
        };
        self.round_trip(Opcode::Delete, path, payload).await?;
        Ok(())
    }

    async fn invoke(&self, path: &str, args: Vec<Node>) -> Result<Node> {
        let json_args: Vec<Value> = args.iter().map(|a| self.serializer.to_json(a)).collect();
        let payload = serde_json::to_vec(&Value::Array(json_args))?;
        let entity = self.round_trip(Opcode::Invoke, path, Some(payload)).await?;
        Ok(self
            .serializer
            .from_json(entity.unwrap_or(Value::Null)))
    }
}

/// Server side of the binary TCP protocol over a shared provider.
pub struct BasyxServer {
    provider: Arc<dyn Provider>,
    state: ServerState,
}

impl BasyxServer {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            state: ServerState::new(),
        }
    }

    /// Binds the listener and spawns the accept loop. Bind to port 0 for a
    /// dynamic port; [`get_address`](Self::get_address) reports the resolved
    /// one.
    pub async fn start(&mut self, addr: &str) -> Result<()> {
        if self.state.is_running() {
            return Err(ConnectorError::ServerAlreadyRunning {
                address: addr.to_string(),
            }
            .into());
        }

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ConnectorError::ServerBind {
                address: addr.to_string(),
                reason: e.to_string(),
            })?;
        let actual_addr = listener
            .local_addr()
            .map_err(|e| ConnectorError::ServerBind {
                address: addr.to_string(),
                reason: e.to_string(),
            })?;

        let (ready_tx, ready_rx) = oneshot::channel();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let provider = self.provider.clone();
        tokio::spawn(async move {
            let _ = ready_tx.send(());
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => {
                        match accepted {
                            Ok((stream, peer)) => {
                                debug!(%peer, "accepted connection");
                                let provider = provider.clone();
                                tokio::spawn(async move {
                                    handle_connection(stream, provider).await;
                                });
                            }
                            Err(e) => warn!(error = %e, "accept failed"),
                        }
                    }
                }
            }
        });

        wait_for_ready(ready_rx, addr).await?;
        self.state.server_started(actual_addr.to_string(), shutdown_tx);
        debug!(address = %actual_addr, "server started");
        Ok(())
    }

    /// Signals the accept loop to stop. In-flight connections finish on
    /// their own tasks.
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

/// Serves one connection: one request frame in, one envelope frame out.
async fn handle_connection(mut stream: TcpStream, provider: Arc<dyn Provider>) {
    let envelope = match read_request(&mut stream).await {
        Ok(frame) => {
            debug!(opcode = ?frame.opcode, path = %frame.path, "dispatching request");
            execute_verb(
                provider.as_ref(),
                frame.opcode,
                &frame.path,
                frame.payload.as_deref(),
            )
            .await
        }
        // Reaching a frame but failing to parse it is a client error the
        // client should hear about; a dead socket is not.
        Err(ReadError::Frame(e)) => Envelope::from_error(&Error::Wire(e)),
        Err(ReadError::Io(e)) => {
            warn!(error = %e, "dropping connection before a full frame arrived");
            return;
        }
    };

    let status = if envelope.success { STATUS_OK } else { STATUS_ERROR };
    let body = match serde_json::to_vec(&envelope) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "failed to serialize response envelope");
            return;
        }
    };
    let response = wire::encode_response(&ResponseFrame { status, body });
    if let Err(e) = stream.write_all(&response).await {
        warn!(error = %e, "failed to write response");
    }
}

enum ReadError {
    Io(std::io::Error),
    Frame(wire::WireError),
}

async fn read_request(stream: &mut TcpStream) -> std::result::Result<RequestFrame, ReadError> {
    let mut len_bytes = [0u8; 4];
    stream
        .read_exact(&mut len_bytes)
        .await
        .map_err(ReadError::Io)?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    wire::check_frame_len(len).map_err(ReadError::Frame)?;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await.map_err(ReadError::Io)?;
    wire::decode_request(&body).map_err(ReadError::Frame)
}
