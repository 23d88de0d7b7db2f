//! Module lifecycle adapter

use std::sync::{Arc, Weak};

use sqlbridge_runtime::{ModuleDetails, ModuleHandler, RegistrationContext, ServerApi};
use sqlbridge_vm::{VmError, VmResult};
use tracing::{debug, info, trace};

use crate::bindings::{self, BindingContext};
use crate::config::ModuleConfig;
use crate::handle::HandleRegistry;

/// The SQLite module as seen by a host.
///
/// One [`HandleRegistry`] is shared by every VM the module registers into,
/// so unloading the module closes every connection it handed out. Bindings
/// are owned by the VM's callbacks and go away with the VM.
pub struct SqliteModule {
    config: ModuleConfig,
    api: Option<Arc<dyn ServerApi>>,
    handles: Arc<HandleRegistry>,
    bindings: Vec<Weak<BindingContext>>,
}

impl SqliteModule {
    pub fn new(config: ModuleConfig) -> Self {
        Self {
            config,
            api: None,
            handles: Arc::new(HandleRegistry::new()),
            bindings: Vec::new(),
        }
    }

    /// Registry of every connection opened through this module.
    pub fn handles(&self) -> Arc<HandleRegistry> {
        self.handles.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.api.is_some()
    }

    /// Number of live VMs registered into
    pub fn registrations(&self) -> usize {
        self.bindings.iter().filter(|b| b.strong_count() > 0).count()
    }
}

impl Default for SqliteModule {
    fn default() -> Self {
        Self::new(ModuleConfig::default())
    }
}

impl ModuleHandler for SqliteModule {
    fn on_load(&mut self, details: &mut ModuleDetails, api: Arc<dyn ServerApi>) {
        let identity = self.config.identity.resolved();
        details.module_name = identity.name;
        details.module_description = identity.description;
        details.module_author = identity.author;
        details.module_version = identity.version;

        debug!(server = %api.name(), port = api.port(), "SQLite module loaded");
        self.api = Some(api);
    }

    fn on_register(&mut self, ctx: &mut RegistrationContext<'_>) -> VmResult<()> {
        let Some(api) = &self.api else {
            return Err(VmError::InternalError(
                "SQLite module registered before load".to_string(),
            ));
        };
        info!(server = %api.name(), vm = ?ctx.vm_id(), "Registering SQLite bindings");

        let bindings = bindings::register(ctx, self.config.clone(), self.handles.clone());
        self.bindings.retain(|b| b.strong_count() > 0);
        self.bindings.push(Arc::downgrade(&bindings));
        Ok(())
    }

    fn on_tick(&mut self) {
        trace!("SQLite module tick");
    }

    fn on_unload(&mut self) {
        let closed = self.handles.close_all();
        self.bindings.clear();
        info!(closed, "SQLite module unloaded");
    }
}

/// Boxed module ready to hand to a host.
pub fn sqlite_module(config: ModuleConfig) -> Box<dyn ModuleHandler> {
    Box::new(SqliteModule::new(config))
}
