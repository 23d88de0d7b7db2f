//! Native module handler trait.
//!
//! A module answers three host events, always in this order:
//!
//! ```text
//! ModuleHandler
//!   ├── on_load()     : fill identity strings, keep the capability handle
//!   ├── on_register() : publish constants/functions/classes into one VM
//!   ├── on_tick()     : periodic host pulse
//!   └── on_unload()   : release native resources
//! ```

use std::fmt;
use std::sync::Arc;

use sqlbridge_vm::VmResult;

use crate::error::{HostError, HostResult};
use crate::registration::RegistrationContext;
use crate::server_api::ServerApi;

/// Identity slots a module fills in at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDetails {
    /// Display name
    pub module_name: String,
    /// One-line description
    pub module_description: String,
    /// Author credit
    pub module_author: String,
    /// Version string
    pub module_version: String,
}

impl ModuleDetails {
    /// Check that every identity string was filled in.
    pub fn validate(&self) -> HostResult<()> {
        let slots = [
            ("name", &self.module_name),
            ("description", &self.module_description),
            ("author", &self.module_author),
            ("version", &self.module_version),
        ];
        for (slot, value) in slots {
            if value.trim().is_empty() {
                return Err(HostError::EmptyIdentity(slot));
            }
        }
        Ok(())
    }
}

/// Trait implemented by native modules.
pub trait ModuleHandler: Send {
    /// Fill identity strings and store the capability handle.
    fn on_load(&mut self, details: &mut ModuleDetails, api: Arc<dyn ServerApi>);

    /// Publish the module's bindings into one VM.
    ///
    /// Called at most once per VM, always after `on_load()`.
    fn on_register(&mut self, ctx: &mut RegistrationContext<'_>) -> VmResult<()>;

    /// Periodic host pulse.
    fn on_tick(&mut self) {}

    /// Release native resources before the module is dropped.
    fn on_unload(&mut self) {}
}

impl fmt::Debug for dyn ModuleHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModuleHandler")
    }
}
