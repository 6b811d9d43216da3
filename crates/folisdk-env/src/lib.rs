//! Session environment activation for foliSDK toolchains.
//!
//! An [`ActivationManager`] overlays the variables of one architecture onto an
//! [`Environment`] and records an [`EnvironmentSnapshot`] in the caller-owned
//! [`ActivationState`], so that `deactivate` can put every variable back
//! exactly as it was, including variables that were unset. The snapshot is also
//! carried in `_OLD_FOLISDK_*` variables so another process can recover it.

mod args;
mod environment;
mod error;
mod manager;
mod snapshot;

pub use args::{parse_activate_args, ActivationOptions, ActivationRequest};
pub use environment::{Environment, EnvironmentError, MemoryEnvironment, ProcessEnvironment};
pub use error::ActivationError;
pub use manager::{
    Activation, ActivationManager, ActivationState, Deactivation, EnvironmentChanges,
};
pub use snapshot::{backup_name, carried_names, EnvironmentSnapshot};
