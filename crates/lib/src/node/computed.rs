//! Computed-property descriptors and invocable operations.
//!
//! A computed-property descriptor stands in for an ordinary data node while
//! back-ending reads and writes onto arbitrary logic (a live sensor value,
//! a facade over another system). The handler resolves `get` accessors
//! transparently and routes the write verbs to the matching mutator instead
//! of touching the node's data area.

use std::{fmt, sync::Arc};

use super::Node;
use crate::Result;

/// Accessor callable: produces the current value of a computed property.
pub type GetFn = Arc<dyn Fn() -> Result<Node> + Send + Sync>;
/// Mutator callable taking the replacement or inserted value.
pub type ValueFn = Arc<dyn Fn(Node) -> Result<()> + Send + Sync>;
/// Mutator callable taking the key to remove.
pub type RemoveKeyFn = Arc<dyn Fn(&str) -> Result<()> + Send + Sync>;

/// A computed-property descriptor node.
///
/// Each slot is optional; a descriptor with a `get` accessor is transparently
/// replaced by the accessor's result before any other operation applies, and
/// a descriptor exposing a mutator intercepts the corresponding write verb.
/// Descriptors may nest: an accessor may itself return a further descriptor,
/// so resolution loops until a plain value appears.
#[derive(Clone, Default)]
pub struct Computed {
    get: Option<GetFn>,
    set: Option<ValueFn>,
    insert: Option<ValueFn>,
    remove_key: Option<RemoveKeyFn>,
    remove_object: Option<ValueFn>,
}

impl Computed {
    /// Creates an empty descriptor with no accessors or mutators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read accessor.
    pub fn with_get(mut self, f: impl Fn() -> Result<Node> + Send + Sync + 'static) -> Self {
        self.get = Some(Arc::new(f));
        self
    }

    /// Sets the replacement mutator, intercepting the `set` verb.
    pub fn with_set(mut self, f: impl Fn(Node) -> Result<()> + Send + Sync + 'static) -> Self {
        self.set = Some(Arc::new(f));
        self
    }

    /// Sets the insertion mutator, intercepting the `create` verb.
    pub fn with_insert(mut self, f: impl Fn(Node) -> Result<()> + Send + Sync + 'static) -> Self {
        self.insert = Some(Arc::new(f));
        self
    }

    /// Sets the key-removal mutator, intercepting `delete` by key.
    pub fn with_remove_key(
        mut self,
        f: impl Fn(&str) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.remove_key = Some(Arc::new(f));
        self
    }

    /// Sets the value-removal mutator, intercepting `delete` by value.
    pub fn with_remove_object(
        mut self,
        f: impl Fn(Node) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.remove_object = Some(Arc::new(f));
        self
    }

    pub fn get_fn(&self) -> Option<&GetFn> {
        self.get.as_ref()
    }

    pub fn set_fn(&self) -> Option<&ValueFn> {
        self.set.as_ref()
    }

    pub fn insert_fn(&self) -> Option<&ValueFn> {
        self.insert.as_ref()
    }

    pub fn remove_key_fn(&self) -> Option<&RemoveKeyFn> {
        self.remove_key.as_ref()
    }

    pub fn remove_object_fn(&self) -> Option<&ValueFn> {
        self.remove_object.as_ref()
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .field("insert", &self.insert.is_some())
            .field("remove_key", &self.remove_key.is_some())
            .field("remove_object", &self.remove_object.is_some())
            .finish()
    }
}

impl PartialEq for Computed {
    /// Callables have no structural identity; descriptors compare by
    /// callable pointer identity per slot.
    fn eq(&self, other: &Self) -> bool {
        fn slot_eq<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
        }
        slot_eq(&self.get, &other.get)
            && slot_eq(&self.set, &other.set)
            && slot_eq(&self.insert, &other.insert)
            && slot_eq(&self.remove_key, &other.remove_key)
            && slot_eq(&self.remove_object, &other.remove_object)
    }
}

/// The callable wrapped by an [`Operation`] node.
pub type OperationFn = Arc<dyn Fn(Vec<Node>) -> Result<Node> + Send + Sync>;

/// An invocable operation node.
///
/// The `invoke` verb calls the wrapped callable with the caller-supplied
/// argument list; the operation itself decides its result shape, so results
/// are returned without further resolution.
#[derive(Clone)]
pub struct Operation {
    f: OperationFn,
}

impl Operation {
    /// Wraps a callable as an operation node.
    pub fn new(f: impl Fn(Vec<Node>) -> Result<Node> + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }

    /// Invokes the operation with the given arguments.
    pub fn invoke(&self, args: Vec<Node>) -> Result<Node> {
        (self.f)(args)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation").finish_non_exhaustive()
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}
