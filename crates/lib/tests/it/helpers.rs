//! Shared fixtures for the transport tests.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use vab::{
    Node, Provider,
    connector::{BasyxServer, ConnectorRegistry, Gateway, HttpServer},
    node::{Computed, NodeMap, Operation},
    provider::LocalProvider,
};

/// A small device model: plain properties, a nested submodel, a list, an
/// invocable operation, and a computed property backed by shared state.
pub fn device_model() -> Node {
    let temperature = Arc::new(AtomicI64::new(21));
    let read_temp = temperature.clone();
    let write_temp = temperature.clone();

    NodeMap::new()
        .with("propertyA", 10i64)
        .with("idShort", "device0")
        .with(
            "submodel",
            Node::from(
                NodeMap::new()
                    .with("propertyA", 10i64)
                    .with("tags", Node::from(vec![Node::from("sensor"), Node::from("demo")])),
            ),
        )
        .with(
            "sum",
            Node::from(Operation::new(|args| {
                let mut total = 0i64;
                for arg in &args {
                    total += arg.as_int().ok_or_else(|| {
                        vab::provider::ProviderError::malformed("sum expects integers")
                    })?;
                }
                Ok(Node::Int(total))
            })),
        )
        .with(
            "temperature",
            Node::from(
                Computed::new()
                    .with_get(move || Ok(Node::Int(read_temp.load(Ordering::SeqCst))))
                    .with_set(move |value| {
                        let degrees = value.as_int().ok_or_else(|| {
                            vab::provider::ProviderError::malformed("temperature must be an integer")
                        })?;
                        write_temp.store(degrees, Ordering::SeqCst);
                        Ok(())
                    }),
            ),
        )
        .into()
}

/// Starts a binary TCP server over the model on a dynamic port. The server
/// must stay alive for the duration of the test; dropping it stops the
/// accept loop.
pub async fn start_basyx(root: Node) -> (BasyxServer, String) {
    let provider: Arc<dyn Provider> = Arc::new(LocalProvider::new(root));
    let mut server = BasyxServer::new(provider);
    server.start("127.0.0.1:0").await.unwrap();
    let address = server.get_address().unwrap();
    (server, address)
}

/// Starts an HTTP server over the model on a dynamic port.
pub async fn start_http(root: Node) -> (HttpServer, String) {
    let provider: Arc<dyn Provider> = Arc::new(LocalProvider::new(root));
    let mut server = HttpServer::new(provider);
    server.start("127.0.0.1:0").await.unwrap();
    let address = server.get_address().unwrap();
    (server, address)
}

/// Starts a gateway over the default registry, served over binary TCP.
pub async fn start_gateway() -> (BasyxServer, String) {
    let provider: Arc<dyn Provider> = Arc::new(Gateway::new(ConnectorRegistry::with_defaults()));
    let mut server = BasyxServer::new(provider);
    server.start("127.0.0.1:0").await.unwrap();
    let address = server.get_address().unwrap();
    (server, address)
}

/// Connects through the default registry.
pub fn connect(address: &str) -> Arc<dyn Provider> {
    ConnectorRegistry::with_defaults().connect_to(address).unwrap()
}
