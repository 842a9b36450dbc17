//! Computed-property resolution on top of structural verb resolution.
//!
//! The lambda handler lets a domain object present as an ordinary nested map
//! while back-ending reads and writes onto arbitrary logic: `get` accessors
//! are resolved transparently while walking, results are fully unwrapped
//! before they cross a provider boundary, and write verbs are routed to the
//! matching mutator callable instead of the node's data area.

use std::borrow::Cow;

use super::{NodeHandler, create_in, delete_key, delete_value, lookup, lookup_mut, walk_mut};
use crate::{
    Result,
    node::{Node, RemoveKeyFn, ValueFn},
    path::Path,
    provider::ProviderError,
};

/// Verb resolution with transparent computed-property handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct LambdaHandler;

impl LambdaHandler {
    pub fn new() -> Self {
        LambdaHandler
    }

    /// Replaces the node with its accessor's result for as long as one is
    /// present. Descriptors may nest, so this loops; it terminates on the
    /// first value that is not a descriptor with a `get` accessor.
    pub fn resolve_single<'a>(&self, node: &'a Node) -> Result<Cow<'a, Node>> {
        let Some(f) = node.as_computed().and_then(|c| c.get_fn()) else {
            return Ok(Cow::Borrowed(node));
        };
        let mut current = f()?;
        loop {
            let Some(f) = current.as_computed().and_then(|c| c.get_fn()).cloned() else {
                return Ok(Cow::Owned(current));
            };
            current = f()?;
        }
    }

    /// Applies [`Self::resolve_single`], then recurses into map values and
    /// list elements. The result never contains a descriptor, and the
    /// operation is idempotent.
    pub fn resolve_all(&self, node: Node) -> Result<Node> {
        let node = self.resolve_single(&node)?.into_owned();
        match node {
            Node::Map(map) => {
                let resolved = map
                    .into_iter()
                    .map(|(key, value)| Ok((key, self.resolve_all(value)?)))
                    .collect::<Result<_>>()?;
                Ok(Node::Map(resolved))
            }
            Node::List(items) => {
                let resolved = items
                    .into_iter()
                    .map(|item| self.resolve_all(item))
                    .collect::<Result<_>>()?;
                Ok(Node::List(resolved))
            }
            other => Ok(other),
        }
    }

    /// Resolve-then-descend walk: each step resolves the current node before
    /// the next segment is looked up, so descriptors are transparent at any
    /// depth. Recursive so borrowed intermediates stay alive on the stack.
    fn walk_resolved(&self, node: &Node, segments: &[&str], path: &Path) -> Result<Node> {
        let resolved = self.resolve_single(node)?;
        match segments.split_first() {
            None => Ok(resolved.into_owned()),
            Some((segment, rest)) => {
                let child = lookup(resolved.as_ref(), segment, path)?;
                self.walk_resolved(child, rest, path)
            }
        }
    }
}

impl NodeHandler for LambdaHandler {
    fn get(&self, root: &Node, path: &Path) -> Result<Node> {
        let segments: Vec<&str> = path.segments().collect();
        let target = self.walk_resolved(root, &segments, path)?;
        self.resolve_all(target)
    }

    fn set(&self, root: &mut Node, path: &Path, value: Node) -> Result<()> {
        let (parent_path, last) = path
            .split_last()
            .ok_or_else(|| ProviderError::malformed("cannot replace the root node"))?;
        let parent = walk_mut(root, parent_path.segments(), path)?;
        let slot = lookup_mut(parent, last, path)?;
        // The target's current value intercepts the write when it exposes a
        // `set` mutator; otherwise replace in the parent container.
        if let Some(f) = slot.as_computed().and_then(|c| c.set_fn()).cloned() {
            return f(value);
        }
        *slot = value;
        Ok(())
    }

    fn create(&self, root: &mut Node, path: &Path, value: Node) -> Result<()> {
        create_in(root, path, value, insert_mutator)
    }

    fn delete(&self, root: &mut Node, path: &Path, value: Option<Node>) -> Result<()> {
        match value {
            None => delete_key(root, path, remove_key_mutator),
            Some(value) => delete_value(root, path, value, remove_object_mutator),
        }
    }

    fn invoke(&self, root: &Node, path: &Path, args: Vec<Node>) -> Result<Node> {
        let segments: Vec<&str> = path.segments().collect();
        let target = self.walk_resolved(root, &segments, path)?;
        match target.as_operation() {
            Some(op) => op.invoke(args),
            None => Err(ProviderError::malformed(format!(
                "cannot invoke a {} node at '{path}'",
                target.type_name()
            ))
            .into()),
        }
    }
}

fn insert_mutator(node: &Node) -> Option<ValueFn> {
    node.as_computed().and_then(|c| c.insert_fn()).cloned()
}

fn remove_key_mutator(node: &Node) -> Option<RemoveKeyFn> {
    node.as_computed().and_then(|c| c.remove_key_fn()).cloned()
}

fn remove_object_mutator(node: &Node) -> Option<ValueFn> {
    node.as_computed().and_then(|c| c.remove_object_fn()).cloned()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::node::{Computed, NodeMap};
    use crate::path::PathBuf;

    /// A computed property backed by shared storage, the shape the
    /// connected-facade pattern produces.
    fn backed_property(store: Arc<Mutex<Node>>) -> Computed {
        let read = store.clone();
        let write = store.clone();
        Computed::new()
            .with_get(move || Ok(read.lock().unwrap().clone()))
            .with_set(move |value| {
                *write.lock().unwrap() = value;
                Ok(())
            })
    }

    #[test]
    fn test_get_resolves_descriptors_transparently() {
        let handler = LambdaHandler::new();
        let store = Arc::new(Mutex::new(Node::Int(21)));
        let root = Node::Map(NodeMap::new().with("live", Node::Computed(backed_property(store))));

        assert_eq!(
            handler.get(&root, &PathBuf::from("live")).unwrap(),
            Node::Int(21)
        );
    }

    #[test]
    fn test_get_descends_through_descriptors() {
        let handler = LambdaHandler::new();
        let inner = NodeMap::new().with("value", 10i64);
        let root = Node::Map(NodeMap::new().with(
            "hidden",
            Node::Computed(
                Computed::new().with_get(move || Ok(Node::Map(inner.clone()))),
            ),
        ));

        assert_eq!(
            handler.get(&root, &PathBuf::from("hidden/value")).unwrap(),
            Node::Int(10)
        );
    }

    #[test]
    fn test_nested_descriptors_resolve_in_a_loop() {
        let handler = LambdaHandler::new();
        let innermost = Computed::new().with_get(|| Ok(Node::Int(7)));
        let outer = Computed::new().with_get(move || Ok(Node::Computed(innermost.clone())));
        let root = Node::Map(NodeMap::new().with("chained", Node::Computed(outer)));

        assert_eq!(
            handler.get(&root, &PathBuf::from("chained")).unwrap(),
            Node::Int(7)
        );
    }

    #[test]
    fn test_resolve_all_is_idempotent_and_leak_free() {
        fn contains_computed(node: &Node) -> bool {
            match node {
                Node::Computed(_) => true,
                Node::Map(map) => map.values().any(contains_computed),
                Node::List(items) => items.iter().any(contains_computed),
                _ => false,
            }
        }

        let handler = LambdaHandler::new();
        let node = Node::Map(
            NodeMap::new()
                .with("plain", 1i64)
                .with(
                    "computed",
                    Node::Computed(Computed::new().with_get(|| Ok(Node::Int(2)))),
                )
                .with(
                    "deep",
                    Node::List(vec![Node::Computed(
                        Computed::new().with_get(|| {
                            Ok(Node::Map(NodeMap::new().with(
                                "inner",
                                Node::Computed(Computed::new().with_get(|| Ok(Node::Int(3)))),
                            )))
                        }),
                    )]),
                ),
        );

        let once = handler.resolve_all(node).unwrap();
        assert!(!contains_computed(&once));
        let twice = handler.resolve_all(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_set_intercepted_by_mutator() {
        let handler = LambdaHandler::new();
        let store = Arc::new(Mutex::new(Node::Int(0)));
        let mut root =
            Node::Map(NodeMap::new().with("live", Node::Computed(backed_property(store.clone()))));

        handler
            .set(&mut root, &PathBuf::from("live"), Node::Int(55))
            .unwrap();

        // The descriptor is still in place; the backing store changed.
        assert!(root.as_map().unwrap().get("live").unwrap().is_computed());
        assert_eq!(*store.lock().unwrap(), Node::Int(55));
        assert_eq!(
            handler.get(&root, &PathBuf::from("live")).unwrap(),
            Node::Int(55)
        );
    }

    #[test]
    fn test_create_and_delete_intercepted_by_container_mutators() {
        let handler = LambdaHandler::new();
        let items = Arc::new(Mutex::new(vec![Node::Int(1)]));

        let insert_items = items.clone();
        let remove_items = items.clone();
        let read_items = items.clone();
        let container = Computed::new()
            .with_get(move || Ok(Node::List(read_items.lock().unwrap().clone())))
            .with_insert(move |value| {
                insert_items.lock().unwrap().push(value);
                Ok(())
            })
            .with_remove_object(move |value| {
                let mut items = remove_items.lock().unwrap();
                match items.iter().position(|item| *item == value) {
                    Some(index) => {
                        items.remove(index);
                        Ok(())
                    }
                    None => Err(ProviderError::not_found("backing list").into()),
                }
            });

        let mut root = Node::Map(NodeMap::new().with("bag", Node::Computed(container)));

        handler
            .create(&mut root, &PathBuf::from("bag"), Node::Int(2))
            .unwrap();
        handler
            .delete(&mut root, &PathBuf::from("bag"), Some(Node::Int(1)))
            .unwrap();
        assert_eq!(*items.lock().unwrap(), vec![Node::Int(2)]);
    }

    #[test]
    fn test_delete_key_intercepted() {
        let handler = LambdaHandler::new();
        let removed = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = removed.clone();
        let container = Computed::new().with_remove_key(move |key| {
            sink.lock().unwrap().push(key.to_string());
            Ok(())
        });
        let mut root = Node::Map(NodeMap::new().with("box", Node::Computed(container)));

        handler
            .delete(&mut root, &PathBuf::from("box/entry"), None)
            .unwrap();
        assert_eq!(*removed.lock().unwrap(), vec!["entry".to_string()]);
    }

    #[test]
    fn test_write_through_computed_intermediate_rejected() {
        let handler = LambdaHandler::new();
        let hidden = Computed::new().with_get(|| Ok(Node::Map(NodeMap::new().with("x", 1i64))));
        let mut root = Node::Map(NodeMap::new().with("hidden", Node::Computed(hidden)));

        // Reads descend transparently...
        assert_eq!(
            handler.get(&root, &PathBuf::from("hidden/x")).unwrap(),
            Node::Int(1)
        );
        // ...but a write through the descriptor has no live location.
        assert!(
            handler
                .set(&mut root, &PathBuf::from("hidden/x/y"), Node::Null)
                .unwrap_err()
                .is_malformed_request()
        );
    }
}
