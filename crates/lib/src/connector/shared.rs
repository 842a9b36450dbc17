//! State management and verb dispatch shared by the transport servers.

use serde_json::Value;
use tokio::sync::oneshot;

use crate::{
    Node, Result,
    metaprotocol::Envelope,
    provider::{Provider, ProviderError},
    serializer::Serializer,
    wire::Opcode,
};

use super::ConnectorError;

/// Tracks a running server's lifecycle. Servers are owned exclusively by
/// their creator and all mutations take `&mut self`, so no internal locking
/// is needed.
pub struct ServerState {
    running: bool,
    /// Shutdown signal for the accept loop.
    shutdown: Option<oneshot::Sender<()>>,
    /// The bound address, resolved after bind (relevant for port 0).
    address: Option<String>,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            running: false,
            shutdown: None,
            address: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The address the server is bound to, once running.
    pub fn get_address(&self) -> std::result::Result<String, ConnectorError> {
        self.address
            .clone()
            .ok_or(ConnectorError::ServerNotRunning)
    }

    /// Marks the server running, recording the resolved address and the
    /// shutdown sender for the accept loop.
    pub fn server_started(&mut self, address: String, shutdown_sender: oneshot::Sender<()>) {
        self.running = true;
        self.address = Some(address);
        self.shutdown = Some(shutdown_sender);
    }

    /// Triggers shutdown and clears the state.
    pub fn stop_server(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.running = false;
        self.address = None;
    }
}

/// Runs one verb against a provider and folds the outcome, success or
/// failure, into a metaprotocol envelope. Both transport servers funnel
/// their requests through here so error translation happens in one place.
pub(crate) async fn execute_verb(
    provider: &dyn Provider,
    opcode: Opcode,
    path: &str,
    payload: Option<&[u8]>,
) -> Envelope {
    match try_execute_verb(provider, opcode, path, payload).await {
        Ok(envelope) => envelope,
        Err(error) => Envelope::from_error(&error),
    }
}

async fn try_execute_verb(
    provider: &dyn Provider,
    opcode: Opcode,
    path: &str,
    payload: Option<&[u8]>,
) -> Result<Envelope> {
    let serializer = Serializer::default();

    let parse_payload = |payload: Option<&[u8]>| -> Result<Node> {
        let bytes = payload
            .ok_or_else(|| ProviderError::malformed("request is missing its payload"))?;
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ProviderError::malformed(format!("invalid payload JSON: {e}")))?;
        Ok(serializer.from_json(value))
    };

    match opcode {
        Opcode::Get => {
            let node = provider.get(path).await?;
            Ok(Envelope::ok(serializer.to_json(&node), node.type_name()))
        }
        Opcode::Set => {
            provider.set(path, parse_payload(payload)?).await?;
            Ok(Envelope::ok_empty())
        }
        Opcode::Create => {
            provider.create(path, parse_payload(payload)?).await?;
            Ok(Envelope::ok_empty())
        }
        Opcode::Delete => {
            let value = match payload {
                Some(_) => Some(parse_payload(payload)?),
                None => None,
            };
            provider.delete(path, value).await?;
            Ok(Envelope::ok_empty())
        }
        Opcode::Invoke => {
            let args = match payload {
                None => Vec::new(),
                Some(bytes) => {
                    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
                        ProviderError::malformed(format!("invalid argument JSON: {e}"))
                    })?;
                    match value {
                        Value::Array(items) => items
                            .into_iter()
                            .map(|v| serializer.from_json(v))
                            .collect(),
                        _ => {
                            return Err(ProviderError::malformed(
                                "invoke arguments must be a JSON array",
                            )
                            .into());
                        }
                    }
                }
            };
            let result = provider.invoke(path, args).await?;
            Ok(Envelope::ok(serializer.to_json(&result), result.type_name()))
        }
    }
}

/// Waits for the spawned server task's ready signal.
pub async fn wait_for_ready(
    ready_rx: oneshot::Receiver<()>,
    address: &str,
) -> std::result::Result<(), ConnectorError> {
    ready_rx.await.map_err(|_| ConnectorError::ServerBind {
        address: address.to_string(),
        reason: "Server startup failed".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_state_lifecycle() {
        let mut state = ServerState::new();
        assert!(!state.is_running());
        assert!(matches!(
            state.get_address(),
            Err(ConnectorError::ServerNotRunning)
        ));

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        state.server_started("127.0.0.1:6998".to_string(), shutdown_tx);
        assert!(state.is_running());
        assert_eq!(state.get_address().unwrap(), "127.0.0.1:6998");

        state.stop_server();
        assert!(!state.is_running());
        assert!(state.get_address().is_err());
        // The shutdown signal fired when the server stopped.
        assert!(shutdown_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_wait_for_ready_maps_a_dropped_sender_to_bind_failure() {
        let (ready_tx, ready_rx) = oneshot::channel::<()>();
        drop(ready_tx);
        let err = wait_for_ready(ready_rx, "127.0.0.1:6998").await.unwrap_err();
        assert!(matches!(err, ConnectorError::ServerBind { .. }));
    }
}
