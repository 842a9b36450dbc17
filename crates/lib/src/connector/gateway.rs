//! A provider that treats incoming paths as nested addresses and forwards
//! each verb to the endpoint they name.
//!
//! A request arriving as `basyx://device:6998/sensors/temp` is routed to
//! `device:6998` with the path `sensors/temp`. The remaining path may itself
//! be a further nested address, so gateways chain: each hop consumes exactly
//! one address layer and passes the rest along untouched.

use async_trait::async_trait;
use tracing::debug;

use crate::{
    Node, Result,
    path::Address,
    provider::Provider,
};

use super::ConnectorRegistry;

/// Forwarding provider backed by a connector registry.
pub struct Gateway {
    registry: ConnectorRegistry,
}

impl Gateway {
    pub fn new(registry: ConnectorRegistry) -> Self {
        Self { registry }
    }

    /// Resolves one address layer: the provider for the endpoint and the
    /// path to forward to it.
    fn route(&self, path: &str) -> Result<(std::sync::Arc<dyn Provider>, String)> {
        let address: Address = path.parse()?;
        debug!(
            endpoint = %address.authority(),
            scheme = %address.scheme,
            remainder = %address.path,
            "forwarding request"
        );
        let provider = self.registry.connect(&address)?;
        Ok((provider, address.path.as_str().to_string()))
    }
}

#[async_trait]
impl Provider for Gateway {
    async fn get(&self, path: &str) -> Result<Node> {
        let (provider, remainder) = self.route(path)?;
        provider.get(&remainder).await
    }

    async fn set(&self, path: &str, value: Node) -> Result<()> {
        let (provider, remainder) = self.route(path)?;
        provider.set(&remainder, value).await
    }

    async fn create(&self, path: &str, value: Node) -> Result<()> {
        let (provider, remainder) = self.route(path)?;
        provider.create(&remainder, value).await
    }

    async fn delete(&self, path: &str, value: Option<Node>) -> Result<()> {
        let (provider, remainder) = self.route(path)?;
        provider.delete(&remainder, value).await
    }

    async fn invoke(&self, path: &str, args: Vec<Node>) -> Result<Node> {
        let (provider, remainder) = self.route(path)?;
        provider.invoke(&remainder, args).await
    }

    async fn try_get(&self, path: &str) -> Result<Option<Node>> {
        let (provider, remainder) = self.route(path)?;
        provider.try_get(&remainder).await
    }
}
