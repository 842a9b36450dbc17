//! VAB: a transport-agnostic remote object-access protocol.
//!
//! Any node of an arbitrarily nested data structure (maps of named
//! properties, ordered lists, primitives, and invocable operations) is
//! addressable by a slash-separated path and supports five verbs: get, set,
//! create, delete, and invoke. The same verbs work against an in-process
//! structure, an HTTP endpoint, or a framed binary TCP socket.
//!
//! ## Core Concepts
//!
//! * **Nodes ([`node::Node`])**: the universal value unit the protocol
//!   exchanges - primitives, insertion-ordered maps, lists, computed-property
//!   descriptors, and invocable operations.
//! * **Paths ([`path::Path`], [`path::PathBuf`])**: `/`-joined segment
//!   sequences addressing a node within a root node.
//! * **Handlers ([`handler::NodeHandler`])**: verb resolution against a root
//!   node. [`handler::LambdaHandler`] additionally resolves computed-property
//!   descriptors transparently.
//! * **Providers ([`provider::Provider`])**: the five verbs keyed by path
//!   strings. [`provider::LocalProvider`] binds a root node to a handler;
//!   [`provider::Proxy`] prefixes every request with a fixed path.
//! * **Connectors ([`connector`])**: client-side transport bindings, selected
//!   by address scheme through a [`connector::ConnectorRegistry`]. The
//!   [`connector::Gateway`] forwards nested addresses across transports.
//! * **Metaprotocol ([`metaprotocol::Envelope`])**: the success/message
//!   envelope that lets server-side errors be reconstructed as typed
//!   client-side errors.

pub mod connector;
pub mod handler;
pub mod metaprotocol;
pub mod node;
pub mod path;
pub mod provider;
pub mod serializer;
pub mod wire;

/// Re-export the core types for easier access.
pub use node::Node;
pub use provider::Provider;

/// Result type used throughout the VAB library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the VAB library.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured address errors from the path module
    #[error(transparent)]
    Address(#[from] path::AddressError),

    /// Structured verb/resolution errors from the provider module
    #[error(transparent)]
    Provider(#[from] provider::ProviderError),

    /// Structured transport errors from the connector module
    #[error(transparent)]
    Connector(#[from] connector::ConnectorError),

    /// Structured frame errors from the wire module
    #[error(transparent)]
    Wire(#[from] wire::WireError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Address(_) => "path",
            Error::Provider(_) => "provider",
            Error::Connector(_) => "connector",
            Error::Wire(_) => "wire",
        }
    }

    /// Check if this error indicates a path segment had no corresponding
    /// key or index at resolution time.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Provider(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a malformed request: a verb/node kind
    /// mismatch, a malformed address, or a malformed wire frame.
    pub fn is_malformed_request(&self) -> bool {
        match self {
            Error::Provider(e) => e.is_malformed_request(),
            Error::Address(_) | Error::Wire(_) => true,
            _ => false,
        }
    }

    /// Check if this error indicates an address scheme with no registered
    /// connector factory.
    pub fn is_unsupported_scheme(&self) -> bool {
        match self {
            Error::Connector(e) => e.is_unsupported_scheme(),
            _ => false,
        }
    }

    /// Check if this error was raised by the transport layer itself, i.e.
    /// no well-formed response was ever received from a server.
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Connector(e) => e.is_transport(),
            Error::Io(_) => true,
            _ => false,
        }
    }
}
