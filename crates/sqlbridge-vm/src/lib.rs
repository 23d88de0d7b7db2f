//! # sqlbridge VM
//!
//! The scripting-side object model that native modules are registered into:
//! - Dynamically typed [`Value`]s, including an opaque [`External`] handle variant
//! - Ordered script objects with an internal slot for native handles
//! - Classes with per-instance methods and default properties
//! - A [`Vm`] owning the global object and class registry
//!
//! Hosts drive registered callbacks through [`Vm::call_global`] and
//! [`Vm::call_method`]. A callback that fails returns [`VmError::Exception`],
//! which is what a script would observe as a thrown exception.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod callback;
pub mod class;
pub mod error;
pub mod object;
pub mod value;
pub mod vm;

pub use callback::CallbackInfo;
pub use class::{ClassBuilder, ClassDefinition, ClassRef, ClassRegistry};
pub use error::{ThrownValue, VmError, VmResult};
pub use object::{ArrayRef, ObjectId, ObjectRef};
pub use value::{External, NativeFn, NativeFunction, Value};
pub use vm::{Vm, VmId, VmWatch};
