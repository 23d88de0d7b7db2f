//! Registration context for module installation.
//!
//! `RegistrationContext` provides a scoped API for a module to publish
//! constants, global functions and classes into one VM during `on_register()`.

use sqlbridge_vm::{
    CallbackInfo, ClassBuilder, ClassRef, NativeFunction, Value, Vm, VmId, VmResult,
};
use tracing::trace;

/// Context passed to [`crate::ModuleHandler::on_register`].
pub struct RegistrationContext<'a> {
    vm: &'a mut Vm,
    module: &'a str,
    globals: usize,
}

impl<'a> RegistrationContext<'a> {
    /// Create a registration context for `module` on `vm`.
    pub fn new(vm: &'a mut Vm, module: &'a str) -> Self {
        Self {
            vm,
            module,
            globals: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The VM being registered into.
    pub fn vm(&self) -> &Vm {
        self.vm
    }

    /// Identity of the VM being registered into.
    pub fn vm_id(&self) -> VmId {
        self.vm.id()
    }

    /// Name of the module doing the registration.
    pub fn module(&self) -> &str {
        self.module
    }

    /// Number of globals published through this context so far.
    pub fn globals_published(&self) -> usize {
        self.globals
    }

    // -----------------------------------------------------------------------
    // Builder methods
    // -----------------------------------------------------------------------

    /// Publish a named integer constant on the global object.
    pub fn constant(&mut self, name: &str, value: i64) {
        trace!(module = self.module, name, value, "constant");
        self.global_value(name, Value::Integer(value));
    }

    /// Publish a value on the global object.
    pub fn global_value(&mut self, name: &str, value: impl Into<Value>) {
        self.vm.set_global(name, value);
        self.globals += 1;
    }

    /// Publish a global function.
    pub fn global_fn<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&CallbackInfo) -> VmResult<Value> + Send + Sync + 'static,
    {
        trace!(module = self.module, name, "global function");
        self.vm
            .register_global_function(NativeFunction::new(name, f));
        self.globals += 1;
    }

    /// Register a class with the VM's class registry.
    pub fn class(&mut self, builder: ClassBuilder) -> ClassRef {
        self.vm.class_registry_mut().register(builder.build())
    }
}
