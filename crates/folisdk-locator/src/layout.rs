use anyhow::{Context, Result};
use folisdk_core::{ArchitectureId, LayoutKind, SdkConfig};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const ARCH_PACKAGE_PREFIX: &str = "folisdk-";

/// On-disk shape of an installed foliSDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkLayout {
    prefix: PathBuf,
    kind: LayoutKind,
    vendor: String,
    os: String,
}

impl SdkLayout {
    pub fn new(prefix: impl Into<PathBuf>, kind: LayoutKind) -> Self {
        let defaults = SdkConfig::default();
        Self {
            prefix: prefix.into(),
            kind,
            vendor: defaults.vendor,
            os: defaults.os,
        }
    }

    pub fn from_config(prefix: impl Into<PathBuf>, config: &SdkConfig) -> Self {
        Self {
            prefix: prefix.into(),
            kind: config.layout,
            vendor: config.vendor.clone(),
            os: config.os.clone(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    pub fn triple(&self, arch: &ArchitectureId) -> String {
        arch.triple(&self.vendor, &self.os)
    }

    /// Host utilities for a split install, the whole SDK for a unified one.
    pub fn host_bin_dir(&self) -> PathBuf {
        self.prefix.join("bin")
    }

    pub fn arch_prefix(&self, arch: &ArchitectureId) -> PathBuf {
        match self.kind {
            LayoutKind::Split => {
                let package = format!("{ARCH_PACKAGE_PREFIX}{arch}");
                match self.prefix.parent() {
                    Some(parent) => parent.join(package),
                    None => self.prefix.join("..").join(package),
                }
            }
            LayoutKind::Unified => self.prefix.clone(),
        }
    }

    pub fn arch_bin_dir(&self, arch: &ArchitectureId) -> PathBuf {
        self.arch_prefix(arch).join("bin")
    }

    pub fn target_dir(&self, arch: &ArchitectureId) -> PathBuf {
        self.arch_prefix(arch).join(self.triple(arch))
    }

    pub fn sysroot_dir(&self, arch: &ArchitectureId) -> PathBuf {
        self.target_dir(arch).join("sysroot")
    }

    /// Bin directories in `PATH` order.
    pub fn bin_dirs(&self, arch: &ArchitectureId) -> Vec<PathBuf> {
        match self.kind {
            LayoutKind::Split => vec![self.host_bin_dir(), self.arch_bin_dir(arch)],
            LayoutKind::Unified => vec![self.host_bin_dir()],
        }
    }

    /// Architectures with an install present on disk, sorted.
    pub fn installed_architectures(&self) -> Result<Vec<ArchitectureId>> {
        let mut found = BTreeSet::new();
        match self.kind {
            LayoutKind::Split => {
                let Some(parent) = self.prefix.parent() else {
                    return Ok(Vec::new());
                };
                for name in read_dir_names(parent)? {
                    if parent.join(&name) == self.prefix {
                        continue;
                    }
                    let Some(candidate) = name.strip_prefix(ARCH_PACKAGE_PREFIX) else {
                        continue;
                    };
                    let Ok(arch) = ArchitectureId::parse(candidate) else {
                        continue;
                    };
                    if self.arch_bin_dir(&arch).is_dir() {
                        found.insert(arch);
                    }
                }
            }
            LayoutKind::Unified => {
                let suffix = format!("-{}-{}", self.vendor, self.os);
                for name in read_dir_names(&self.prefix)? {
                    let Some(candidate) = name.strip_suffix(&suffix) else {
                        continue;
                    };
                    let Ok(arch) = ArchitectureId::parse(candidate) else {
                        continue;
                    };
                    if self.target_dir(&arch).is_dir() {
                        found.insert(arch);
                    }
                }
            }
        }
        Ok(found.into_iter().collect())
    }
}

fn read_dir_names(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read SDK directory: {}", dir.display()));
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read SDK directory: {}", dir.display()))?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

pub fn default_sdk_prefix() -> Result<PathBuf> {
    if let Some(prefix) = std::env::var_os("FOLISDK_PREFIX").filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(prefix));
    }

    if cfg!(windows) {
        let app_data = std::env::var("LOCALAPPDATA")
            .context("LOCALAPPDATA is not set; cannot resolve Windows SDK prefix")?;
        return Ok(PathBuf::from(app_data).join("folisdk"));
    }

    let home = std::env::var("HOME").context("HOME is not set; cannot resolve SDK prefix")?;
    Ok(PathBuf::from(home).join(".folisdk"))
}

pub fn default_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os("FOLISDK_CONFIG").filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let app_data = std::env::var("APPDATA")
            .context("APPDATA is not set; cannot resolve Windows config path")?;
        return Ok(PathBuf::from(app_data).join("folisdk").join("config.toml"));
    }

    let home = std::env::var("HOME").context("HOME is not set; cannot resolve config path")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("folisdk")
        .join("config.toml"))
}

/// Reads the config file, treating a missing file as the default config.
pub fn load_config(path: &Path) -> Result<SdkConfig> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(SdkConfig::default()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config: {}", path.display()));
        }
    };
    SdkConfig::from_toml_str(&raw).with_context(|| format!("invalid config: {}", path.display()))
}
