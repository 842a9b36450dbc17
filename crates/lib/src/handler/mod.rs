//! Verb resolution against a root node.
//!
//! A [`NodeHandler`] walks a path one segment at a time starting at a root
//! node and applies one of the five verbs to the addressed node. Two
//! implementations exist: [`MapHandler`] performs purely structural
//! resolution, and [`LambdaHandler`] additionally resolves computed-property
//! descriptors transparently and routes write verbs to their mutator
//! callables.
//!
//! Failure policy: any structural mismatch (index on a map, key on a list,
//! missing intermediate node) signals `ResourceNotFound`; a verb applied to
//! an incompatible node kind signals `MalformedRequest`.

mod lambda;

pub use lambda::LambdaHandler;

use crate::{
    Result,
    node::{Node, RemoveKeyFn, ValueFn},
    path::Path,
    provider::ProviderError,
};

/// The five-verb contract over a root node.
///
/// The mutating verbs take the root mutably; a provider is expected to hold
/// its root behind external synchronization (see [`crate::provider::LocalProvider`]).
pub trait NodeHandler: Send + Sync {
    /// Resolve `path` and return the addressed node.
    fn get(&self, root: &Node, path: &Path) -> Result<Node>;

    /// Resolve `path`, requiring the target to exist, and replace its value
    /// in the parent container.
    fn set(&self, root: &mut Node, path: &Path, value: Node) -> Result<()>;

    /// Insert `value` under the final segment (map parent) or append it
    /// (list target; the final segment addresses the list itself).
    fn create(&self, root: &mut Node, path: &Path, value: Node) -> Result<()>;

    /// Remove by key (map parent) when `value` is `None`, or remove a list
    /// element by value when `value` is `Some`.
    fn delete(&self, root: &mut Node, path: &Path, value: Option<Node>) -> Result<()>;

    /// Resolve `path` to an operation node and invoke it with `args`. The
    /// result is returned unresolved; the operation decides its shape.
    fn invoke(&self, root: &Node, path: &Path, args: Vec<Node>) -> Result<Node>;

    /// Explicit existence probe: `Ok(None)` when the path does not resolve,
    /// reserving `ResourceNotFound` for genuine failures.
    fn try_get(&self, root: &Node, path: &Path) -> Result<Option<Node>> {
        match self.get(root, path) {
            Ok(node) => Ok(Some(node)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Parses a path segment as a non-negative list index.
fn parse_index(segment: &str, path: &Path) -> Result<usize> {
    segment
        .parse::<usize>()
        .map_err(|_| ProviderError::not_found(path.as_str()).into())
}

/// Descends one segment into a node. Non-container nodes have no children,
/// so descending into them is a structural mismatch.
pub(crate) fn lookup<'a>(node: &'a Node, segment: &str, path: &Path) -> Result<&'a Node> {
    match node {
        Node::Map(map) => map
            .get(segment)
            .ok_or_else(|| ProviderError::not_found(path.as_str()).into()),
        Node::List(items) => {
            let index = parse_index(segment, path)?;
            items
                .get(index)
                .ok_or_else(|| ProviderError::not_found(path.as_str()).into())
        }
        _ => Err(ProviderError::not_found(path.as_str()).into()),
    }
}

/// Mutable variant of [`lookup`]. A computed descriptor encountered
/// mid-path cannot yield a live mutable location, so write verbs reject it
/// outright instead of mutating a detached copy.
pub(crate) fn lookup_mut<'a>(node: &'a mut Node, segment: &str, path: &Path) -> Result<&'a mut Node> {
    match node {
        Node::Map(map) => map
            .get_mut(segment)
            .ok_or_else(|| ProviderError::not_found(path.as_str()).into()),
        Node::List(items) => {
            let index = parse_index(segment, path)?;
            items
                .get_mut(index)
                .ok_or_else(|| ProviderError::not_found(path.as_str()).into())
        }
        Node::Computed(_) => Err(ProviderError::malformed(format!(
            "cannot write through a computed property at '{path}'"
        ))
        .into()),
        _ => Err(ProviderError::not_found(path.as_str()).into()),
    }
}

/// Walks all segments of `path` immutably.
pub(crate) fn walk<'a>(root: &'a Node, path: &Path) -> Result<&'a Node> {
    let mut current = root;
    for segment in path.segments() {
        current = lookup(current, segment, path)?;
    }
    Ok(current)
}

/// Walks the given segments mutably, reporting failures against `full`.
pub(crate) fn walk_mut<'a, 'p>(
    root: &'a mut Node,
    segments: impl Iterator<Item = &'p str>,
    full: &Path,
) -> Result<&'a mut Node> {
    let mut current = root;
    for segment in segments {
        current = lookup_mut(current, segment, full)?;
    }
    Ok(current)
}

/// Structural verb resolution with no computed-property awareness.
///
/// Descriptor nodes are treated as opaque values: a `get` returns them
/// as-is and write verbs never call their mutators. Use [`LambdaHandler`]
/// for the transparent behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapHandler;

impl MapHandler {
    pub fn new() -> Self {
        MapHandler
    }
}

impl NodeHandler for MapHandler {
    fn get(&self, root: &Node, path: &Path) -> Result<Node> {
        walk(root, path).cloned()
    }

    fn set(&self, root: &mut Node, path: &Path, value: Node) -> Result<()> {
        let (parent_path, last) = path
            .split_last()
            .ok_or_else(|| ProviderError::malformed("cannot replace the root node"))?;
        let parent = walk_mut(root, parent_path.segments(), path)?;
        let slot = lookup_mut(parent, last, path)?;
        *slot = value;
        Ok(())
    }

    fn create(&self, root: &mut Node, path: &Path, value: Node) -> Result<()> {
        create_in(root, path, value, |_| None)
    }

    fn delete(&self, root: &mut Node, path: &Path, value: Option<Node>) -> Result<()> {
        match value {
            None => delete_key(root, path, |_| None),
            Some(value) => delete_value(root, path, value, |_| None),
        }
    }

    fn invoke(&self, root: &Node, path: &Path, args: Vec<Node>) -> Result<Node> {
        let target = walk(root, path)?;
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

/// Shared `create` skeleton. `intercept` probes the addressed container for
/// a mutator callable before generic mutation applies (the lambda handler
/// returns the `insert` callable there; the map handler never intercepts).
pub(crate) fn create_in(
    root: &mut Node,
    path: &Path,
    value: Node,
    intercept: impl Fn(&Node) -> Option<ValueFn>,
) -> Result<()> {
    let Some((parent_path, last)) = path.split_last() else {
        // Empty path: the root itself is the addressed container.
        if let Some(f) = intercept(root) {
            return f(value);
        }
        return match root {
            Node::List(items) => {
                items.push(value);
                Ok(())
            }
            _ => Err(ProviderError::malformed("create on the root requires a list root").into()),
        };
    };

    let parent = walk_mut(root, parent_path.segments(), path)?;
    match parent {
        Node::Map(map) => match map.get_mut(last) {
            // The full path addresses an existing list: append to it, the
            // final segment names the list itself rather than a slot.
            Some(Node::List(items)) => {
                items.push(value);
                Ok(())
            }
            Some(existing) => {
                if let Some(f) = intercept(existing) {
                    return f(value);
                }
                Err(ProviderError::malformed(format!(
                    "cannot create at '{path}': key '{last}' already exists"
                ))
                .into())
            }
            None => {
                map.insert(last, value);
                Ok(())
            }
        },
        Node::List(items) => {
            let index = parse_index(last, path)?;
            match items.get_mut(index) {
                Some(Node::List(inner)) => {
                    inner.push(value);
                    Ok(())
                }
                Some(existing) => {
                    if let Some(f) = intercept(existing) {
                        return f(value);
                    }
                    Err(ProviderError::malformed(format!(
                        "cannot create inside a {} at '{path}'",
                        existing.type_name()
                    ))
                    .into())
                }
                None => Err(ProviderError::not_found(path.as_str()).into()),
            }
        }
        _ => Err(ProviderError::not_found(path.as_str()).into()),
    }
}

/// Shared `delete`-by-key skeleton. `intercept` probes the parent container
/// for a key-removal callable.
pub(crate) fn delete_key(
    root: &mut Node,
    path: &Path,
    intercept: impl Fn(&Node) -> Option<RemoveKeyFn>,
) -> Result<()> {
    let (parent_path, last) = path
        .split_last()
        .ok_or_else(|| ProviderError::malformed("cannot delete the root node"))?;
    let parent = walk_mut(root, parent_path.segments(), path)?;
    if let Some(f) = intercept(parent) {
        return f(last);
    }
    match parent {
        Node::Map(map) => match map.remove(last) {
            Some(_) => Ok(()),
            None => Err(ProviderError::not_found(path.as_str()).into()),
        },
        Node::List(_) => Err(ProviderError::malformed(format!(
            "value-free delete at '{path}' addresses a list; delete by value instead"
        ))
        .into()),
        _ => Err(ProviderError::not_found(path.as_str()).into()),
    }
}

/// Shared `delete`-by-value skeleton. `intercept` probes the node addressed
/// by the full path for an object-removal callable.
pub(crate) fn delete_value(
    root: &mut Node,
    path: &Path,
    value: Node,
    intercept: impl Fn(&Node) -> Option<ValueFn>,
) -> Result<()> {
    let target = walk_mut(root, path.segments(), path)?;
    if let Some(f) = intercept(target) {
        return f(value);
    }
    match target {
        Node::List(items) => {
            let index = items
                .iter()
                .position(|item| *item == value)
                .ok_or_else(|| ProviderError::not_found(path.as_str()))?;
            items.remove(index);
            Ok(())
        }
        other => Err(ProviderError::malformed(format!(
            "delete by value requires a list, found {} at '{path}'",
            other.type_name()
        ))
        .into()),
    }
}
