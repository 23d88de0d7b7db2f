//! The VM instance native modules register into.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tracing::trace;

use crate::callback::CallbackInfo;
use crate::class::ClassRegistry;
use crate::error::{VmError, VmResult};
use crate::object::ObjectRef;
use crate::value::{NativeFunction, Value};

static NEXT_VM_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique VM identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VmId(u64);

/// Observes a [`Vm`] without keeping it alive.
#[derive(Debug, Clone)]
pub struct VmWatch(Weak<()>);

impl VmWatch {
    /// Whether the watched VM has not been dropped yet
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

/// A scripting VM: a global object plus the classes known to it.
///
/// Script execution is serialized by the host; callbacks run synchronously
/// on the calling thread and either return a value or a thrown exception.
#[derive(Debug)]
pub struct Vm {
    id: VmId,
    global: ObjectRef,
    classes: ClassRegistry,
    alive: Arc<()>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// Create a VM with an empty global object.
    pub fn new() -> Self {
        Self {
            id: VmId(NEXT_VM_ID.fetch_add(1, Ordering::Relaxed)),
            global: ObjectRef::new("global"),
            classes: ClassRegistry::new(),
            alive: Arc::new(()),
        }
    }

    /// VM identity
    pub fn id(&self) -> VmId {
        self.id
    }

    /// A watch that reports when this VM is dropped.
    pub fn watch(&self) -> VmWatch {
        VmWatch(Arc::downgrade(&self.alive))
    }

    /// Read a global
    pub fn get_global(&self, name: &str) -> Value {
        self.global.get(name)
    }

    /// Set a global
    pub fn set_global(&self, name: &str, value: impl Into<Value>) {
        self.global.set(name, value);
    }

    /// Register a global function
    pub fn register_global_function(&self, function: NativeFunction) {
        self.global
            .set(function.name().to_string(), Value::Function(function));
    }

    /// Class registry
    pub fn class_registry(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Mutable class registry
    pub fn class_registry_mut(&mut self) -> &mut ClassRegistry {
        &mut self.classes
    }

    /// Call a global function the way a script would.
    pub fn call_global(&self, name: &str, args: Vec<Value>) -> VmResult<Value> {
        match self.global.get(name) {
            Value::Function(f) => self.call(&f, Value::Undefined, args),
            Value::Undefined => Err(VmError::ReferenceError(format!("{} is not defined", name))),
            other => Err(VmError::type_error(format!(
                "{} is not a function (got {})",
                name,
                other.type_name()
            ))),
        }
    }

    /// Call `obj.name(...args)` the way a script would.
    pub fn call_method(&self, obj: &ObjectRef, name: &str, args: Vec<Value>) -> VmResult<Value> {
        match obj.get(name) {
            Value::Function(f) => self.call(&f, Value::Object(obj.clone()), args),
            other => Err(VmError::type_error(format!(
                "{}.{} is not a function (got {})",
                obj.class_name(),
                name,
                other.type_name()
            ))),
        }
    }

    /// Invoke a native function with an explicit receiver.
    pub fn call(&self, f: &NativeFunction, this: Value, args: Vec<Value>) -> VmResult<Value> {
        trace!(function = f.name(), argc = args.len(), "native call");
        f.call(&CallbackInfo::new(this, args))
    }
}
