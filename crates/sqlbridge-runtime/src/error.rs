//! Host error types

use sqlbridge_vm::{VmError, VmId};
use thiserror::Error;

/// Errors raised while driving a module through its lifecycle
#[derive(Debug, Error)]
pub enum HostError {
    /// Module reported an empty identity string at load
    #[error("Module left its {0} empty after load")]
    EmptyIdentity(&'static str),

    /// Registration was attempted twice on one VM
    #[error("Module '{module}' is already registered on VM {vm:?}")]
    AlreadyRegistered {
        /// Module name
        module: String,
        /// VM the module is registered on
        vm: VmId,
    },

    /// Module has been unloaded
    #[error("Module '{0}' has been unloaded")]
    Unloaded(String),

    /// Registration failed inside the VM
    #[error(transparent)]
    Vm(#[from] VmError),
}

/// Result type alias for host operations
pub type HostResult<T> = Result<T, HostError>;
