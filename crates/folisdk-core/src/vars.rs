use std::ffi::{OsStr, OsString};
use std::path::Path;

use crate::ArchitectureId;

/// Every environment variable an activation may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManagedVar {
    Path,
    Prompt,
    ActiveMarker,
    CrossCompile,
    Cc,
    Cxx,
    As,
    Ld,
    Nm,
    Strip,
    Ar,
    Ranlib,
    Sysroot,
    PkgConfigDir,
    PkgConfigLibdir,
    PkgConfigSysrootDir,
}

impl ManagedVar {
    pub const NAVIGATION: [ManagedVar; 3] = [Self::Path, Self::Prompt, Self::ActiveMarker];

    pub const TOOLCHAIN: [ManagedVar; 13] = [
        Self::CrossCompile,
        Self::Cc,
        Self::Cxx,
        Self::As,
        Self::Ld,
        Self::Nm,
        Self::Strip,
        Self::Ar,
        Self::Ranlib,
        Self::Sysroot,
        Self::PkgConfigDir,
        Self::PkgConfigLibdir,
        Self::PkgConfigSysrootDir,
    ];

    pub fn all() -> impl Iterator<Item = ManagedVar> {
        Self::NAVIGATION.into_iter().chain(Self::TOOLCHAIN)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Path => "PATH",
            Self::Prompt => "PS1",
            Self::ActiveMarker => "FOLISDK_ACTIVE",
            Self::CrossCompile => "CROSS_COMPILE",
            Self::Cc => "CC",
            Self::Cxx => "CXX",
            Self::As => "AS",
            Self::Ld => "LD",
            Self::Nm => "NM",
            Self::Strip => "STRIP",
            Self::Ar => "AR",
            Self::Ranlib => "RANLIB",
            Self::Sysroot => "SYSROOT",
            Self::PkgConfigDir => "PKG_CONFIG_DIR",
            Self::PkgConfigLibdir => "PKG_CONFIG_LIBDIR",
            Self::PkgConfigSysrootDir => "PKG_CONFIG_SYSROOT_DIR",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().find(|var| var.name() == name)
    }

    pub fn is_toolchain(self) -> bool {
        Self::TOOLCHAIN.contains(&self)
    }
}

/// Recorded state of one variable. `Unset` and `Empty` are distinct: an unset
/// variable is removed on restore, an empty one is set back to "".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarValue {
    Unset,
    Empty,
    Value(OsString),
}

impl VarValue {
    pub fn from_os(value: Option<OsString>) -> Self {
        match value {
            None => Self::Unset,
            Some(value) if value.is_empty() => Self::Empty,
            Some(value) => Self::Value(value),
        }
    }

    pub fn as_os_str(&self) -> Option<&OsStr> {
        match self {
            Self::Unset => None,
            Self::Empty => Some(OsStr::new("")),
            Self::Value(value) => Some(value.as_os_str()),
        }
    }
}

/// Variables managed by every activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationGroup {
    pub path: OsString,
    pub prompt: OsString,
    pub active_marker: OsString,
}

impl NavigationGroup {
    /// `bin_dirs` must already be joined in search order; the previous
    /// `PATH` is appended after them when it is set and non-empty.
    pub fn new(
        arch: &ArchitectureId,
        joined_bin_dirs: OsString,
        previous_path: &VarValue,
        previous_prompt: &VarValue,
    ) -> Self {
        let mut path = joined_bin_dirs;
        if let VarValue::Value(previous) = previous_path {
            path.push(path_separator());
            path.push(previous);
        }

        let mut prompt = OsString::from(arch.prompt_marker());
        if let Some(previous) = previous_prompt.as_os_str() {
            prompt.push(previous);
        }

        Self {
            path,
            prompt,
            active_marker: OsString::from(arch.as_str()),
        }
    }

    fn entries(&self) -> [(ManagedVar, OsString); 3] {
        [
            (ManagedVar::Path, self.path.clone()),
            (ManagedVar::Prompt, self.prompt.clone()),
            (ManagedVar::ActiveMarker, self.active_marker.clone()),
        ]
    }
}

/// Cross-compiler variables derived from a toolchain triple and sysroot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainGroup {
    pub cross_compile: OsString,
    pub cc: OsString,
    pub cxx: OsString,
    pub assembler: OsString,
    pub linker: OsString,
    pub nm: OsString,
    pub strip: OsString,
    pub ar: OsString,
    pub ranlib: OsString,
    pub sysroot: OsString,
    pub pkg_config_dir: OsString,
    pub pkg_config_libdir: OsString,
    pub pkg_config_sysroot_dir: OsString,
}

impl ToolchainGroup {
    pub fn new(triple: &str, sysroot: &Path) -> Self {
        let tool = |name: &str| OsString::from(format!("{triple}-{name}"));

        let mut pkg_config_libdir = sysroot.join("usr/lib/pkgconfig").into_os_string();
        pkg_config_libdir.push(":");
        pkg_config_libdir.push(sysroot.join("usr/share/pkgconfig"));

        Self {
            cross_compile: OsString::from(format!("{triple}-")),
            cc: tool("gcc"),
            cxx: tool("g++"),
            assembler: tool("as"),
            linker: tool("ld"),
            nm: tool("nm"),
            strip: tool("strip"),
            ar: tool("ld -r -o"),
            ranlib: OsString::from("true"),
            sysroot: sysroot.as_os_str().to_os_string(),
            pkg_config_dir: OsString::new(),
            pkg_config_libdir,
            pkg_config_sysroot_dir: sysroot.as_os_str().to_os_string(),
        }
    }

    fn entries(&self) -> [(ManagedVar, OsString); 13] {
        [
            (ManagedVar::CrossCompile, self.cross_compile.clone()),
            (ManagedVar::Cc, self.cc.clone()),
            (ManagedVar::Cxx, self.cxx.clone()),
            (ManagedVar::As, self.assembler.clone()),
            (ManagedVar::Ld, self.linker.clone()),
            (ManagedVar::Nm, self.nm.clone()),
            (ManagedVar::Strip, self.strip.clone()),
            (ManagedVar::Ar, self.ar.clone()),
            (ManagedVar::Ranlib, self.ranlib.clone()),
            (ManagedVar::Sysroot, self.sysroot.clone()),
            (ManagedVar::PkgConfigDir, self.pkg_config_dir.clone()),
            (ManagedVar::PkgConfigLibdir, self.pkg_config_libdir.clone()),
            (
                ManagedVar::PkgConfigSysrootDir,
                self.pkg_config_sysroot_dir.clone(),
            ),
        ]
    }
}

/// Full set of variables one activation writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEnvironment {
    pub navigation: NavigationGroup,
    pub toolchain: Option<ToolchainGroup>,
}

impl TargetEnvironment {
    pub fn entries(&self) -> Vec<(ManagedVar, OsString)> {
        let mut entries = self.navigation.entries().to_vec();
        if let Some(toolchain) = &self.toolchain {
            entries.extend(toolchain.entries());
        }
        entries
    }

    pub fn vars(&self) -> Vec<ManagedVar> {
        self.entries().into_iter().map(|(var, _)| var).collect()
    }
}

fn path_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}
