//! Drives one module through load, registration, ticks and unload.

use std::collections::HashMap;
use std::sync::Arc;

use sqlbridge_vm::{Vm, VmId, VmWatch};
use tracing::{debug, info};

use crate::error::{HostError, HostResult};
use crate::module::{ModuleDetails, ModuleHandler};
use crate::registration::RegistrationContext;
use crate::server_api::ServerApi;

/// A loaded module.
///
/// Loading runs `on_load()` and checks the identity strings. Each VM can be
/// registered into exactly once; a second attempt is refused before the
/// module sees it. VMs that have been dropped are forgotten.
#[derive(Debug)]
pub struct ModuleHost {
    handler: Box<dyn ModuleHandler>,
    details: ModuleDetails,
    api: Arc<dyn ServerApi>,
    registered: HashMap<VmId, VmWatch>,
    ticks: u64,
    unloaded: bool,
}

impl ModuleHost {
    /// Load a module, handing it the capability handle.
    pub fn load(mut handler: Box<dyn ModuleHandler>, api: Arc<dyn ServerApi>) -> HostResult<Self> {
        let mut details = ModuleDetails::default();
        handler.on_load(&mut details, api.clone());
        details.validate()?;

        info!(
            module = %details.module_name,
            version = %details.module_version,
            "Module loaded"
        );

        Ok(Self {
            handler,
            details,
            api,
            registered: HashMap::new(),
            ticks: 0,
            unloaded: false,
        })
    }

    /// Identity reported at load
    pub fn details(&self) -> &ModuleDetails {
        &self.details
    }

    /// Capability handle given to the module
    pub fn api(&self) -> &Arc<dyn ServerApi> {
        &self.api
    }

    /// Publish the module's bindings into `vm`.
    pub fn register(&mut self, vm: &mut Vm) -> HostResult<()> {
        if self.unloaded {
            return Err(HostError::Unloaded(self.details.module_name.clone()));
        }
        self.registered.retain(|_, watch| watch.is_alive());
        if self.registered.contains_key(&vm.id()) {
            return Err(HostError::AlreadyRegistered {
                module: self.details.module_name.clone(),
                vm: vm.id(),
            });
        }

        debug!(module = %self.details.module_name, vm = ?vm.id(), "Registering module");
        let mut ctx = RegistrationContext::new(vm, &self.details.module_name);
        self.handler.on_register(&mut ctx)?;
        let published = ctx.globals_published();
        self.registered.insert(vm.id(), vm.watch());

        debug!(
            module = %self.details.module_name,
            globals = published,
            "Module registered successfully"
        );
        Ok(())
    }

    /// Whether `vm` already has this module's bindings.
    pub fn is_registered(&self, vm: &Vm) -> bool {
        self.registered.contains_key(&vm.id())
    }

    /// Number of registered VMs still alive
    pub fn registered_vms(&self) -> usize {
        self.registered.values().filter(|watch| watch.is_alive()).count()
    }

    /// Deliver a host pulse.
    pub fn tick(&mut self) -> HostResult<()> {
        if self.unloaded {
            return Err(HostError::Unloaded(self.details.module_name.clone()));
        }
        self.ticks += 1;
        self.handler.on_tick();
        Ok(())
    }

    /// Number of pulses delivered
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Unload the module. Further registration and ticks fail.
    pub fn unload(&mut self) {
        if self.unloaded {
            return;
        }
        self.unloaded = true;
        self.handler.on_unload();
        info!(module = %self.details.module_name, "Module unloaded");
    }
}

impl Drop for ModuleHost {
    fn drop(&mut self) {
        self.unload();
    }
}
