//! Conversion between the node model and the JSON wire format.
//!
//! Primitives map to their JSON equivalents. Map nodes become objects with
//! insertion order preserved; list nodes become arrays. JSON cannot
//! distinguish set from list semantics, so ordering is always preserved on
//! deserialization and the domain layer re-imposes set semantics where it
//! needs them.
//!
//! Callable nodes (operations and computed-property descriptors) serialize
//! to a stub marker object rather than their data, so native closures never
//! leak onto the wire. Deserializing a stub yields a placeholder operation
//! that fails if it is ever invoked locally.

use serde_json::{Map as JsonMap, Value};

use crate::{
    Result,
    node::{Node, NodeMap, Operation},
    provider::ProviderError,
};

/// Marker key identifying a function stub on the wire.
pub const FUNCTION_KEY: &str = "_function";
/// Stub marker for invocable operations.
pub const OPERATION_STUB: &str = "operation";
/// Stub marker for computed-property descriptors.
pub const LAMBDA_STUB: &str = "lambda";

/// Serializer behavior flags, passed explicitly at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializerConfig {
    /// Omit null-valued map entries entirely instead of writing `null`.
    pub omit_null: bool,
}

/// Converts nodes to and from `serde_json::Value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer {
    config: SerializerConfig,
}

impl Serializer {
    /// Creates a serializer with the given configuration.
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Converts a node to its JSON representation.
    pub fn to_json(&self, node: &Node) -> Value {
        match node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Int(n) => Value::from(*n),
            Node::Uint(n) => Value::from(*n),
            // Non-finite floats have no JSON representation
            Node::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Node::Text(s) => Value::String(s.clone()),
            Node::Map(map) => {
                let mut object = JsonMap::new();
                for (key, value) in map.iter() {
                    if self.config.omit_null && value.is_null() {
                        continue;
                    }
                    object.insert(key.clone(), self.to_json(value));
                }
                Value::Object(object)
            }
            Node::List(items) => Value::Array(items.iter().map(|item| self.to_json(item)).collect()),
            Node::Computed(_) => function_stub(LAMBDA_STUB),
            Node::Operation(_) => function_stub(OPERATION_STUB),
        }
    }

    /// Converts a JSON value to a node.
    ///
    /// Integer literals take the narrowest fitting representation, widening
    /// from `i64` to `u64`; literals with a decimal point or exponent are
    /// floats. Object key order is preserved.
    pub fn from_json(&self, value: Value) -> Node {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Node::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Node::Uint(u)
                } else {
                    Node::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Node::Text(s),
            Value::Array(items) => {
                Node::List(items.into_iter().map(|item| self.from_json(item)).collect())
            }
            Value::Object(object) => {
                if let Some(Value::String(marker)) = object.get(FUNCTION_KEY) {
                    return stub_operation(marker);
                }
                Node::Map(
                    object
                        .into_iter()
                        .map(|(key, value)| (key, self.from_json(value)))
                        .collect::<NodeMap>(),
                )
            }
        }
    }

    /// Renders a node as a JSON string.
    pub fn to_string(&self, node: &Node) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json(node))?)
    }

    /// Parses a JSON string into a node.
    pub fn from_str(&self, text: &str) -> Result<Node> {
        Ok(self.from_json(serde_json::from_str(text)?))
    }
}

fn function_stub(marker: &str) -> Value {
    let mut object = JsonMap::new();
    object.insert(FUNCTION_KEY.to_string(), Value::String(marker.to_string()));
    Value::Object(object)
}

/// A remote function reference has no local callable behind it.
fn stub_operation(marker: &str) -> Node {
    let marker = marker.to_string();
    Node::Operation(Operation::new(move |_| {
        Err(ProviderError::malformed(format!(
            "'{marker}' stub received over the wire cannot be invoked locally"
        ))
        .into())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Computed;

    fn serializer() -> Serializer {
        Serializer::default()
    }

    #[test]
    fn test_primitives_round_trip() {
        let s = serializer();
        for node in [
            Node::Null,
            Node::Bool(true),
            Node::Int(-42),
            Node::Int(i64::MAX),
            Node::Uint(u64::MAX),
            Node::Float(1.5),
            Node::Text("hello".into()),
        ] {
            assert_eq!(s.from_json(s.to_json(&node)), node);
        }
    }

    #[test]
    fn test_integer_widening() {
        let s = serializer();
        // Fits i64
        assert_eq!(s.from_str("42").unwrap(), Node::Int(42));
        // Exceeds i64, fits u64
        assert_eq!(
            s.from_str("18446744073709551615").unwrap(),
            Node::Uint(u64::MAX)
        );
        // Decimal point means float
        assert_eq!(s.from_str("42.0").unwrap(), Node::Float(42.0));
        assert_eq!(s.from_str("1e3").unwrap(), Node::Float(1000.0));
    }

    #[test]
    fn test_map_order_preserved() {
        let s = serializer();
        let node = s.from_str(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<&String> = node.as_map().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);

        let text = s.to_string(&node).unwrap();
        assert_eq!(text, r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn test_omit_null() {
        let node = Node::Map(
            NodeMap::new()
                .with("keep", 1i64)
                .with("drop", Node::Null),
        );

        let keep_nulls = Serializer::default();
        assert_eq!(
            keep_nulls.to_string(&node).unwrap(),
            r#"{"keep":1,"drop":null}"#
        );

        let omit = Serializer::new(SerializerConfig { omit_null: true });
        assert_eq!(omit.to_string(&node).unwrap(), r#"{"keep":1}"#);
    }

    #[test]
    fn test_callables_serialize_to_stubs() {
        let s = serializer();
        let op = Node::Operation(Operation::new(|_| Ok(Node::Null)));
        assert_eq!(s.to_string(&op).unwrap(), r#"{"_function":"operation"}"#);

        let lambda = Node::Computed(Computed::new().with_get(|| Ok(Node::Int(1))));
        assert_eq!(s.to_string(&lambda).unwrap(), r#"{"_function":"lambda"}"#);

        // A stub deserializes to an operation that refuses local invocation
        let stub = s.from_str(r#"{"_function":"operation"}"#).unwrap();
        let err = stub.as_operation().unwrap().invoke(vec![]).unwrap_err();
        assert!(err.is_malformed_request());
    }

    #[test]
    fn test_nested_structure_round_trip() {
        let s = serializer();
        let text = r#"{"a":{"b":[1,2,{"c":true}]},"d":null}"#;
        let node = s.from_str(text).unwrap();
        assert_eq!(s.to_string(&node).unwrap(), text);
    }
}
