mod layout;
mod locator;

pub use layout::{default_config_path, default_sdk_prefix, load_config, SdkLayout};
pub use locator::{LocateError, ToolchainDescriptor, ToolchainLocator};
