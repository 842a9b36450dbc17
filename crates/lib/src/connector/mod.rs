//! Scheme-based dispatch from addresses to transport connectors.
//!
//! A connector is a [`Provider`] whose verbs travel over a transport to a
//! remote endpoint. The [`ConnectorRegistry`] maps an address's scheme token
//! to a factory producing such a connector; [`Gateway`] is the server-side
//! counterpart that re-dispatches nested addresses arriving as paths.
//!
//! Third-party schemes plug in through [`ConnectorRegistry::register`]; the
//! registry itself knows nothing about individual transports.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::{Result, path::Address, provider::Provider};

pub mod basyx;
pub mod gateway;
pub mod http;
pub mod shared;

pub use basyx::{BasyxConnector, BasyxServer};
pub use gateway::Gateway;
pub use http::{HttpConnector, HttpServer};

/// Errors arising while dispatching to or speaking with a remote endpoint.
///
/// Connection and transport failures mean no well-formed response was
/// received; they surface directly rather than through the envelope.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Unsupported scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("Failed to connect to {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to bind server to {address}: {reason}")]
    ServerBind { address: String, reason: String },

    #[error("Server already running on {address}")]
    ServerAlreadyRunning { address: String },

    #[error("No server is running")]
    ServerNotRunning,
}

impl ConnectorError {
    /// True when no connector factory matched the address's scheme.
    pub fn is_unsupported_scheme(&self) -> bool {
        matches!(self, ConnectorError::UnsupportedScheme { .. })
    }

    /// True when the failure happened below the protocol, before any
    /// response envelope could be read.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ConnectorError::ConnectionFailed { .. } | ConnectorError::Transport(_)
        )
    }
}

/// Factory producing a connector bound to one endpoint.
pub type ConnectorFactory = Arc<dyn Fn(&Address) -> Result<Arc<dyn Provider>> + Send + Sync>;

/// Maps scheme tokens to connector factories.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    factories: HashMap<String, ConnectorFactory>,
}

impl ConnectorRegistry {
    /// An empty registry with no schemes.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in transports: `basyx` for the binary TCP
    /// protocol, `http` and `https` for the REST mapping.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("basyx", |address| {
            Ok(Arc::new(BasyxConnector::new(address)?) as Arc<dyn Provider>)
        });
        registry.register("http", |address| {
            Ok(Arc::new(HttpConnector::new(address)?) as Arc<dyn Provider>)
        });
        registry.register("https", |address| {
            Ok(Arc::new(HttpConnector::new(address)?) as Arc<dyn Provider>)
        });
        registry
    }

    /// Registers a factory for a scheme, replacing any previous one.
    pub fn register<F>(&mut self, scheme: impl Into<String>, factory: F)
    where
        F: Fn(&Address) -> Result<Arc<dyn Provider>> + Send + Sync + 'static,
    {
        self.factories.insert(scheme.into(), Arc::new(factory));
    }

    /// Produces a connector for the address's endpoint. The address's own
    /// path plays no part here; routing below the endpoint is the caller's
    /// concern.
    pub fn connect(&self, address: &Address) -> Result<Arc<dyn Provider>> {
        let factory =
            self.factories
                .get(&address.scheme)
                .ok_or_else(|| ConnectorError::UnsupportedScheme {
                    scheme: address.scheme.clone(),
                })?;
        factory(address)
    }

    /// Parses a full address and produces a provider rooted at its path.
    ///
    /// When the address carries a path (possibly a further nested address),
    /// the connector is wrapped in a [`Proxy`](crate::provider::Proxy) so
    /// that caller paths are resolved relative to it. Each further nested
    /// layer is consumed by the gateway at the corresponding hop.
    pub fn connect_to(&self, address: &str) -> Result<Arc<dyn Provider>> {
        let address: Address = address.parse()?;
        let connector = self.connect(&address)?;
        if address.path.is_empty() {
            Ok(connector)
        } else {
            Ok(Arc::new(crate::provider::Proxy::new(
                address.path.as_str(),
                connector,
            )))
        }
    }
}

impl std::fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemes: Vec<_> = self.factories.keys().collect();
        schemes.sort();
        f.debug_struct("ConnectorRegistry")
            .field("schemes", &schemes)
            .finish()
    }
}
