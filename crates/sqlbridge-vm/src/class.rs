//! Script classes registered by native modules.
//!
//! A class is a name plus a set of per-instance methods and default
//! properties. Instances get their own copy of every method as a function
//! property, so `obj.method(...)` dispatches with `obj` as the receiver.
//!
//! ## Usage
//!
//! ```ignore
//! let class = ClassBuilder::new("Counter")
//!     .property("count", 0)
//!     .method("increment", |info| { /* ... */ Ok(Value::Undefined) })
//!     .build();
//! let obj = class.create_instance(None);
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::callback::CallbackInfo;
use crate::error::VmResult;
use crate::object::ObjectRef;
use crate::value::{External, NativeFunction, Value};

/// A deferred member definition applied in `build()` order.
enum DeferredMember {
    Method(NativeFunction),
    Property { name: String, value: Value },
}

/// Builder for a [`ClassDefinition`].
pub struct ClassBuilder {
    name: String,
    members: Vec<DeferredMember>,
}

impl ClassBuilder {
    /// Start a class called `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
        }
    }

    /// Add a per-instance method.
    pub fn method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&CallbackInfo) -> VmResult<Value> + Send + Sync + 'static,
    {
        self.members
            .push(DeferredMember::Method(NativeFunction::new(name, f)));
        self
    }

    /// Add a property with a default value copied into every instance.
    pub fn property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.members.push(DeferredMember::Property {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    /// Finish the class.
    pub fn build(self) -> ClassRef {
        let mut methods = IndexMap::new();
        let mut properties = IndexMap::new();
        for member in self.members {
            match member {
                DeferredMember::Method(f) => {
                    methods.insert(f.name().to_string(), f);
                }
                DeferredMember::Property { name, value } => {
                    properties.insert(name, value);
                }
            }
        }
        Arc::new(ClassDefinition {
            name: self.name,
            methods,
            properties,
        })
    }
}

/// Shared handle to a class definition
pub type ClassRef = Arc<ClassDefinition>;

/// An immutable class definition
#[derive(Debug)]
pub struct ClassDefinition {
    name: String,
    methods: IndexMap<String, NativeFunction>,
    properties: IndexMap<String, Value>,
}

impl ClassDefinition {
    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method names in definition order
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    /// Allocate a new instance, optionally holding a native handle.
    pub fn create_instance(&self, internal: Option<External>) -> ObjectRef {
        let obj = ObjectRef::with_internal(&self.name, internal);
        for (name, value) in &self.properties {
            obj.set(name.clone(), value.clone());
        }
        for (name, f) in &self.methods {
            obj.set(name.clone(), Value::Function(f.clone()));
        }
        obj
    }
}

/// Classes known to a VM, by name.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, ClassRef>,
}

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. A class with the same name is replaced.
    pub fn register(&mut self, class: ClassRef) -> ClassRef {
        debug!(
            class = class.name(),
            methods = class.methods.len(),
            properties = class.properties.len(),
            "Registering class"
        );
        self.classes.insert(class.name().to_string(), class.clone());
        class
    }

    /// Look up a class by name
    pub fn get(&self, name: &str) -> Option<ClassRef> {
        self.classes.get(name).cloned()
    }

    /// Registered class names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no class is registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
