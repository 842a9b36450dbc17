//! Providers: the server-side binding of the five verbs to path strings.
//!
//! A [`Provider`] is what connectors ultimately talk to. [`LocalProvider`]
//! pairs one root node with one handler; [`Proxy`] wraps any provider behind
//! a fixed path prefix so nested addressing composes.

mod errors;
mod local;
mod proxy;

pub use errors::ProviderError;
pub use local::LocalProvider;
pub use proxy::Proxy;

use async_trait::async_trait;

use crate::{Result, node::Node};

/// The five-verb contract keyed by path strings.
///
/// Every verb call is a blocking round trip from the caller's point of view:
/// the future completes only once a full response (or typed error) is
/// available. There is no cancellation primitive threaded through the verb
/// contract; a call completes, times out at the transport level, or fails
/// with an IO error.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Resolve `path` and return the addressed node.
    async fn get(&self, path: &str) -> Result<Node>;

    /// Replace the value of an existing target.
    async fn set(&self, path: &str, value: Node) -> Result<()>;

    /// Insert under the final segment (map parent) or append (list target).
    async fn create(&self, path: &str, value: Node) -> Result<()>;

    /// Remove by key, or by value when `value` is `Some`.
    async fn delete(&self, path: &str, value: Option<Node>) -> Result<()>;

    /// Invoke the operation node at `path` with the given arguments.
    async fn invoke(&self, path: &str, args: Vec<Node>) -> Result<Node>;

    /// Explicit existence probe: `Ok(None)` when the path does not resolve.
    ///
    /// Callers polling for a value should use this instead of catching
    /// `ResourceNotFound`, which is reserved for genuine failures.
    async fn try_get(&self, path: &str) -> Result<Option<Node>> {
        match self.get(path).await {
            Ok(node) => Ok(Some(node)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
