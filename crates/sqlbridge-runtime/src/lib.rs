//! # sqlbridge Runtime
//!
//! The host side of the native module boundary:
//! - [`ModuleHandler`] trait answering the load / register / tick handshake
//! - [`ModuleDetails`] identity slots filled at load time
//! - [`ServerApi`] capability handle handed to modules at load time
//! - [`RegistrationContext`] for publishing constants, functions and classes
//! - [`ModuleHost`] driving a handler and enforcing one registration per VM

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod host;
pub mod module;
pub mod registration;
pub mod server_api;

pub use error::{HostError, HostResult};
pub use host::ModuleHost;
pub use module::{ModuleDetails, ModuleHandler};
pub use registration::RegistrationContext;
pub use server_api::{ServerApi, StaticServerApi};
