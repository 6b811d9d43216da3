mod arch;
mod config;
mod vars;

pub use arch::ArchitectureId;
pub use config::{LayoutKind, SdkConfig};
pub use vars::{ManagedVar, NavigationGroup, TargetEnvironment, ToolchainGroup, VarValue};
