use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

/// How the SDK was installed on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// A host package next to one `folisdk-<arch>` package per architecture.
    #[default]
    Split,
    /// A single package carrying every architecture.
    Unified,
}

impl LayoutKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Unified => "unified",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "split" => Ok(Self::Split),
            "unified" => Ok(Self::Unified),
            _ => Err(anyhow!(
                "invalid layout '{value}' (expected 'split' or 'unified')"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SdkConfig {
    pub prefix: Option<PathBuf>,
    #[serde(default)]
    pub layout: LayoutKind,
    #[serde(default = "default_vendor")]
    pub vendor: String,
    #[serde(default = "default_os")]
    pub os: String,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            layout: LayoutKind::default(),
            vendor: default_vendor(),
            os: default_os(),
        }
    }
}

impl SdkConfig {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(input).context("failed to parse folisdk config")?;
        validate_triple_component("vendor", &config.vendor)?;
        validate_triple_component("os", &config.os)?;
        if let Some(prefix) = &config.prefix {
            if prefix.as_os_str().is_empty() {
                return Err(anyhow!("config prefix must not be empty"));
            }
        }
        Ok(config)
    }
}

fn default_vendor() -> String {
    "strata".to_string()
}

fn default_os() -> String {
    "folios".to_string()
}

fn validate_triple_component(field: &str, value: &str) -> anyhow::Result<()> {
    if value.is_empty() {
        return Err(anyhow!("config {field} must not be empty"));
    }
    if value.chars().any(|ch| !(ch.is_ascii_alphanumeric() || ch == '_')) {
        return Err(anyhow!(
            "config {field} contains invalid character(s): {value}"
        ));
    }
    Ok(())
}
