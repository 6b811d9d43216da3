use std::path::{Path, PathBuf};

use folisdk_core::{ArchitectureId, LayoutKind};
use thiserror::Error;

use crate::SdkLayout;

/// Everything an activation needs to know about one installed architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainDescriptor {
    pub arch: ArchitectureId,
    pub triple: String,
    pub bin_dirs: Vec<PathBuf>,
    pub sysroot: PathBuf,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("foliSDK is improperly installed: missing {path}", path = .expected.display())]
    HostMissing { expected: PathBuf },

    #[error("foliSDK not found at {path}", path = .expected.display())]
    NotFound {
        arch: ArchitectureId,
        expected: PathBuf,
    },
}

impl LocateError {
    pub fn expected_path(&self) -> &Path {
        match self {
            Self::HostMissing { expected } | Self::NotFound { expected, .. } => expected,
        }
    }
}

/// Resolves an architecture to its installed toolchain. Implementations must
/// check the disk on every call; results are never cached.
pub trait ToolchainLocator {
    fn resolve(&self, arch: &ArchitectureId) -> Result<ToolchainDescriptor, LocateError>;
}

impl ToolchainLocator for SdkLayout {
    fn resolve(&self, arch: &ArchitectureId) -> Result<ToolchainDescriptor, LocateError> {
        match self.kind() {
            LayoutKind::Split => {
                let host_bin = self.host_bin_dir();
                if !host_bin.is_dir() {
                    return Err(LocateError::HostMissing { expected: host_bin });
                }
                if !self.arch_bin_dir(arch).is_dir() {
                    return Err(LocateError::NotFound {
                        arch: arch.clone(),
                        expected: self.arch_prefix(arch),
                    });
                }
            }
            LayoutKind::Unified => {
                if !self.host_bin_dir().is_dir() {
                    return Err(LocateError::NotFound {
                        arch: arch.clone(),
                        expected: self.prefix().to_path_buf(),
                    });
                }
                let target_dir = self.target_dir(arch);
                if !target_dir.is_dir() {
                    return Err(LocateError::NotFound {
                        arch: arch.clone(),
                        expected: target_dir,
                    });
                }
            }
        }

        Ok(ToolchainDescriptor {
            arch: arch.clone(),
            triple: self.triple(arch),
            bin_dirs: self.bin_dirs(arch),
            sysroot: self.sysroot_dir(arch),
        })
    }
}
