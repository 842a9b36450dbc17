//! Client-side stand-in that prefixes every request with a fixed path.

use std::sync::Arc;

use async_trait::async_trait;

use super::Provider;
use crate::{Result, node::Node, path::concat};

/// A provider wrapper with a fixed path prefix.
///
/// Every verb call concatenates the prefix with the caller's path before
/// forwarding to the wrapped provider. Proxies compose: a proxy over a proxy
/// behaves exactly like a single proxy with the concatenated prefix.
///
/// The prefix is joined verbatim (one separator, no normalization), so it
/// may be the tail of a nested gateway address as well as a plain path.
pub struct Proxy {
    prefix: String,
    inner: Arc<dyn Provider>,
}

impl Proxy {
    /// Wraps `inner` behind `prefix`.
    pub fn new(prefix: impl Into<String>, inner: Arc<dyn Provider>) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }

    /// The effective path for a supplied path.
    fn path(&self, path: &str) -> String {
        concat(&self.prefix, path)
    }
}

#[async_trait]
impl Provider for Proxy {
    async fn get(&self, path: &str) -> Result<Node> {
        self.inner.get(&self.path(path)).await
    }

    async fn set(&self, path: &str, value: Node) -> Result<()> {
        self.inner.set(&self.path(path), value).await
    }

    async fn create(&self, path: &str, value: Node) -> Result<()> {
        self.inner.create(&self.path(path), value).await
    }

    async fn delete(&self, path: &str, value: Option<Node>) -> Result<()> {
        self.inner.delete(&self.path(path), value).await
    }

    async fn invoke(&self, path: &str, args: Vec<Node>) -> Result<Node> {
        self.inner.invoke(&self.path(path), args).await
    }

    async fn try_get(&self, path: &str) -> Result<Option<Node>> {
        self.inner.try_get(&self.path(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{node::NodeMap, provider::LocalProvider};

    fn nested_root() -> Node {
        NodeMap::new()
            .with(
                "b",
                Node::from(NodeMap::new().with(
                    "a",
                    Node::from(NodeMap::new().with("p", 10i64)),
                )),
            )
            .into()
    }

    #[tokio::test]
    async fn test_prefixes_every_verb() {
        let provider = Arc::new(LocalProvider::new(nested_root()));
        let proxy = Proxy::new("b/a", provider.clone());

        assert_eq!(proxy.get("p").await.unwrap(), Node::Int(10));
        proxy.set("p", Node::Int(11)).await.unwrap();
        assert_eq!(provider.get("b/a/p").await.unwrap(), Node::Int(11));
        assert_eq!(proxy.try_get("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_proxies_compose() {
        // A proxy over a proxy resolves like a single proxy with the
        // concatenated prefix. The inner proxy's prefix applies outermost:
        // the outer hop's prefix is itself a supplied path to the inner
        // hop, so `new("a", new("b", p))` addresses `b/a/<path>`.
        let provider = Arc::new(LocalProvider::new(nested_root()));

        let inner = Arc::new(Proxy::new("b", provider.clone() as Arc<dyn Provider>));
        let stacked = Proxy::new("a", inner);
        let flat = Proxy::new("b/a", provider.clone());

        assert_eq!(stacked.get("p").await.unwrap(), Node::Int(10));
        assert_eq!(
            stacked.get("p").await.unwrap(),
            flat.get("p").await.unwrap()
        );

        stacked.set("p", Node::Int(42)).await.unwrap();
        assert_eq!(flat.get("p").await.unwrap(), Node::Int(42));
        assert_eq!(provider.get("b/a/p").await.unwrap(), Node::Int(42));
    }
}
