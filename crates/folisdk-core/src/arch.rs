use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

const MAX_ARCH_LEN: usize = 64;

/// Target CPU identifier selecting a toolchain triple and sysroot, e.g. `x86_64`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArchitectureId(String);

impl ArchitectureId {
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("architecture must not be empty"));
        }
        if trimmed.len() > MAX_ARCH_LEN {
            return Err(anyhow!(
                "architecture '{trimmed}' is longer than {MAX_ARCH_LEN} characters"
            ));
        }
        if trimmed.starts_with('-') {
            return Err(anyhow!("architecture must not start with '-': {trimmed}"));
        }
        if trimmed
            .chars()
            .any(|ch| !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == '.'))
        {
            return Err(anyhow!(
                "architecture contains invalid character(s): {trimmed}"
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compiler target identifier `<arch>-<vendor>-<os>`.
    pub fn triple(&self, vendor: &str, os: &str) -> String {
        format!("{}-{vendor}-{os}", self.0)
    }

    /// Prompt prefix shown while this architecture is active.
    pub fn prompt_marker(&self) -> String {
        format!("(folisdk-{}) ", self.0)
    }
}

impl fmt::Display for ArchitectureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArchitectureId {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ArchitectureId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ArchitectureId> for String {
    fn from(value: ArchitectureId) -> Self {
        value.0
    }
}
