//! Arguments and receiver of a native call

use crate::object::ObjectRef;
use crate::value::Value;

/// Everything a native callback sees about one invocation.
#[derive(Debug, Clone)]
pub struct CallbackInfo {
    this: Value,
    args: Vec<Value>,
}

impl CallbackInfo {
    /// Create call info for `this` and `args`.
    pub fn new(this: Value, args: Vec<Value>) -> Self {
        Self { this, args }
    }

    /// The receiver as an object, if it is one.
    pub fn this_object(&self) -> Option<&ObjectRef> {
        self.this.as_object()
    }

    /// Argument at `index`; missing arguments read as `undefined`.
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::Undefined)
    }

    /// Argument at `index` if it was passed.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}
