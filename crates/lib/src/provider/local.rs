//! In-process provider binding a root node to a handler.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::Provider;
use crate::{
    Result,
    handler::{LambdaHandler, NodeHandler},
    node::Node,
    path::PathBuf,
};

/// The protocol's basic unit of exposure: one root node plus one handler.
///
/// The root is handed over at construction time; the provider never creates
/// or destroys node graphs itself, only reads and mutates the one it was
/// given. A mutex guards the root so one verb call at a time resolves
/// against it - the protocol guarantees no atomicity beyond a single call,
/// and this is the external synchronization the node model itself does not
/// carry.
pub struct LocalProvider<H = LambdaHandler> {
    root: Arc<Mutex<Node>>,
    handler: H,
}

impl LocalProvider<LambdaHandler> {
    /// Creates a provider with transparent computed-property resolution.
    pub fn new(root: Node) -> Self {
        Self::with_handler(root, LambdaHandler::new())
    }
}

impl<H: NodeHandler> LocalProvider<H> {
    /// Creates a provider with an explicit handler.
    pub fn with_handler(root: Node, handler: H) -> Self {
        Self {
            root: Arc::new(Mutex::new(root)),
            handler,
        }
    }

    /// Shares the root for external inspection, e.g. in tests.
    pub fn root(&self) -> Arc<Mutex<Node>> {
        self.root.clone()
    }
}

#[async_trait]
impl<H: NodeHandler> Provider for LocalProvider<H> {
    async fn get(&self, path: &str) -> Result<Node> {
        let root = self.root.lock().await;
        self.handler.get(&root, &PathBuf::normalize(path))
    }

    async fn set(&self, path: &str, value: Node) -> Result<()> {
        let mut root = self.root.lock().await;
        self.handler.set(&mut root, &PathBuf::normalize(path), value)
    }

    async fn create(&self, path: &str, value: Node) -> Result<()> {
        let mut root = self.root.lock().await;
        self.handler
            .create(&mut root, &PathBuf::normalize(path), value)
    }

    async fn delete(&self, path: &str, value: Option<Node>) -> Result<()> {
        let mut root = self.root.lock().await;
        self.handler
            .delete(&mut root, &PathBuf::normalize(path), value)
    }

    async fn invoke(&self, path: &str, args: Vec<Node>) -> Result<Node> {
        let root = self.root.lock().await;
        self.handler.invoke(&root, &PathBuf::normalize(path), args)
    }

    async fn try_get(&self, path: &str) -> Result<Option<Node>> {
        let root = self.root.lock().await;
        self.handler.try_get(&root, &PathBuf::normalize(path))
    }
}
