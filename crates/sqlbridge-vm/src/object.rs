//! Script objects and arrays
//!
//! Objects keep their properties in insertion order and carry an optional
//! internal slot for an opaque native handle. The slot is never visible as a
//! property.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::value::{External, Value};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ObjectData {
    id: ObjectId,
    class_name: Arc<str>,
    properties: RwLock<IndexMap<String, Value>>,
    internal: RwLock<Option<External>>,
}

/// Shared reference to a script object
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectData>);

impl ObjectRef {
    /// Create an empty object of the given class.
    pub fn new(class_name: &str) -> Self {
        Self::with_internal(class_name, None)
    }

    /// Create an empty object whose internal slot holds `internal`.
    pub fn with_internal(class_name: &str, internal: Option<External>) -> Self {
        Self(Arc::new(ObjectData {
            id: ObjectId::next(),
            class_name: Arc::from(class_name),
            properties: RwLock::new(IndexMap::new()),
            internal: RwLock::new(internal),
        }))
    }

    /// Object identity
    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Name of the class this object was created from
    pub fn class_name(&self) -> &str {
        &self.0.class_name
    }

    /// Get a property; missing properties read as `undefined`.
    pub fn get(&self, key: &str) -> Value {
        self.0
            .properties
            .read()
            .get(key)
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    /// Set a property. An existing key keeps its position.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.properties.write().insert(key.into(), value.into());
    }

    /// Set a property to `null`.
    pub fn set_null(&self, key: impl Into<String>) {
        self.set(key, Value::Null);
    }

    /// Check for an own property
    pub fn has(&self, key: &str) -> bool {
        self.0.properties.read().contains_key(key)
    }

    /// Property names in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.0.properties.read().keys().cloned().collect()
    }

    /// Snapshot of all properties in insertion order
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .properties
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.0.properties.read().len()
    }

    /// Whether the object has no properties
    pub fn is_empty(&self) -> bool {
        self.0.properties.read().is_empty()
    }

    /// Current internal handle, if any
    pub fn internal(&self) -> Option<External> {
        self.0.internal.read().clone()
    }

    /// Clear the internal handle, returning the previous one
    pub fn take_internal(&self) -> Option<External> {
        self.0.internal.write().take()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("id", &self.0.id)
            .field("class", &self.0.class_name)
            .field("keys", &self.keys())
            .finish()
    }
}

/// Shared reference to a script array
#[derive(Clone, Default)]
pub struct ArrayRef(Arc<RwLock<Vec<Value>>>);

impl ArrayRef {
    /// Create an empty array
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an array from existing values
    pub fn from_vec(values: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(values)))
    }

    /// Append a value
    pub fn push(&self, value: impl Into<Value>) {
        self.0.write().push(value.into());
    }

    /// Element at `index`; out-of-range reads as `undefined`.
    pub fn get(&self, index: usize) -> Value {
        self.0.read().get(index).cloned().unwrap_or(Value::Undefined)
    }

    /// Array length
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Whether the array is empty
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Snapshot of the elements
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayRef").field("len", &self.len()).finish()
    }
}

impl FromIterator<Value> for ArrayRef {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}
