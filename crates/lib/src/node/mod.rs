//! The node model: the universal value type the protocol operates over.
//!
//! A [`Node`] is either a leaf value (null, bool, integer, float, text), a
//! container (insertion-ordered [`NodeMap`] or ordered list), a
//! computed-property descriptor ([`Computed`]), or an invocable
//! [`Operation`]. Node graphs are constructed by the domain layer and handed
//! to a provider at construction time; the protocol core reads, mutates, and
//! structurally augments them in place but never creates or destroys graphs
//! itself.

mod computed;
mod map;

pub use computed::{Computed, GetFn, Operation, OperationFn, RemoveKeyFn, ValueFn};
pub use map::NodeMap;

/// The universal value type the protocol exchanges.
///
/// # Value Types
///
/// ## Leaf values
/// - [`Node::Null`] - null/empty value
/// - [`Node::Bool`] - boolean
/// - [`Node::Int`] / [`Node::Uint`] / [`Node::Float`] - numbers, widened on
///   deserialization to the narrowest fitting representation
/// - [`Node::Text`] - UTF-8 string
///
/// ## Containers
/// - [`Node::Map`] - insertion-ordered key-to-node mapping, keys unique
/// - [`Node::List`] - ordered list, positional indices
///
/// ## Behavior nodes
/// - [`Node::Computed`] - computed-property descriptor, resolved
///   transparently by the lambda handler before other operations apply
/// - [`Node::Operation`] - invocable operation, the target of the `invoke`
///   verb
///
/// # Direct comparisons
///
/// `Node` implements `PartialEq` against primitives for ergonomic checks:
///
/// ```
/// # use vab::node::Node;
/// assert!(Node::Int(42) == 42);
/// assert!(Node::Text("hi".into()) == "hi");
/// assert!(Node::Bool(true) == true);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    /// Null/empty value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Signed 64-bit integer
    Int(i64),
    /// Unsigned 64-bit integer, used when a value exceeds `i64::MAX`
    Uint(u64),
    /// Double-precision float
    Float(f64),
    /// Text string value
    Text(String),
    /// Ordered map of named properties
    Map(NodeMap),
    /// Ordered list of nodes
    List(Vec<Node>),
    /// Computed-property descriptor
    Computed(Computed),
    /// Invocable operation
    Operation(Operation),
}

impl Node {
    /// Returns true if this is a leaf value (terminal node).
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Node::Null | Node::Bool(_) | Node::Int(_) | Node::Uint(_) | Node::Float(_) | Node::Text(_)
        )
    }

    /// Returns true if this is a container (map or list).
    pub fn is_container(&self) -> bool {
        matches!(self, Node::Map(_) | Node::List(_))
    }

    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    /// Returns true if this is a computed-property descriptor.
    pub fn is_computed(&self) -> bool {
        matches!(self, Node::Computed(_))
    }

    /// Returns the node kind as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "bool",
            Node::Int(_) => "int",
            Node::Uint(_) => "uint",
            Node::Float(_) => "float",
            Node::Text(_) => "text",
            Node::Map(_) => "map",
            Node::List(_) => "list",
            Node::Computed(_) => "computed",
            Node::Operation(_) => "operation",
        }
    }

    /// Attempts to convert to a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to convert to a signed integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Node::Int(n) => Some(*n),
            Node::Uint(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Attempts to convert to a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Node::Float(f) => Some(*f),
            Node::Int(n) => Some(*n as f64),
            Node::Uint(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Attempts to convert to a string slice.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to convert to a map reference.
    pub fn as_map(&self) -> Option<&NodeMap> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Attempts to convert to a mutable map reference.
    pub fn as_map_mut(&mut self) -> Option<&mut NodeMap> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Attempts to convert to a list reference.
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    /// Attempts to convert to a mutable list reference.
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    /// Attempts to convert to a computed-property descriptor.
    pub fn as_computed(&self) -> Option<&Computed> {
        match self {
            Node::Computed(c) => Some(c),
            _ => None,
        }
    }

    /// Attempts to convert to an operation.
    pub fn as_operation(&self) -> Option<&Operation> {
        match self {
            Node::Operation(op) => Some(op),
            _ => None,
        }
    }
}

// From impls for primitives

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Node::Int(n as i64)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Int(n)
    }
}

impl From<u64> for Node {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Node::Int(n),
            Err(_) => Node::Uint(n),
        }
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Float(f)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

impl From<NodeMap> for Node {
    fn from(map: NodeMap) -> Self {
        Node::Map(map)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::List(items)
    }
}

impl From<Computed> for Node {
    fn from(c: Computed) -> Self {
        Node::Computed(c)
    }
}

impl From<Operation> for Node {
    fn from(op: Operation) -> Self {
        Node::Operation(op)
    }
}

// Direct comparisons with primitives

impl PartialEq<bool> for Node {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<i64> for Node {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}

impl PartialEq<&str> for Node {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

impl PartialEq<Node> for bool {
    fn eq(&self, other: &Node) -> bool {
        other == self
    }
}

impl PartialEq<Node> for i64 {
    fn eq(&self, other: &Node) -> bool {
        other == self
    }
}

impl PartialEq<Node> for &str {
    fn eq(&self, other: &Node) -> bool {
        other == self
    }
}
