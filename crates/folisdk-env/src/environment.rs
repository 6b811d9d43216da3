use std::collections::{BTreeMap, BTreeSet};
use std::ffi::{OsStr, OsString};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("invalid environment variable name '{name}'")]
    InvalidName { name: String },

    #[error("value for {name} contains a NUL byte")]
    InvalidValue { name: String },

    #[error("environment refused to modify {name}")]
    Rejected { name: String },
}

/// Seam over the variables an activation reads and writes.
pub trait Environment {
    fn get(&self, name: &str) -> Option<OsString>;

    /// Reports whether writing `value` (or removing, for `None`) would succeed,
    /// without touching anything.
    fn check_write(&self, name: &str, value: Option<&OsStr>) -> Result<(), EnvironmentError> {
        validate_write(name, value)
    }

    fn set(&mut self, name: &str, value: &OsStr) -> Result<(), EnvironmentError>;

    fn remove(&mut self, name: &str) -> Result<(), EnvironmentError>;
}

/// The environment of the running process, inherited by every child it spawns.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn get(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    fn set(&mut self, name: &str, value: &OsStr) -> Result<(), EnvironmentError> {
        validate_write(name, Some(value))?;
        std::env::set_var(name, value);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), EnvironmentError> {
        validate_write(name, None)?;
        std::env::remove_var(name);
        Ok(())
    }
}

/// Environment held entirely in memory, used to preview activations and in tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryEnvironment {
    vars: BTreeMap<String, OsString>,
    read_only: BTreeSet<String>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the current process environment, skipping non-UTF-8 names.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(name, value)| name.into_string().ok().map(|name| (name, value)))
            .collect();
        Self {
            vars,
            read_only: BTreeSet::new(),
        }
    }

    pub fn with_var(mut self, name: &str, value: impl Into<OsString>) -> Self {
        self.vars.insert(name.to_string(), value.into());
        self
    }

    /// Makes every later write to `name` fail.
    pub fn mark_read_only(&mut self, name: &str) {
        self.read_only.insert(name.to_string());
    }

    pub fn vars(&self) -> &BTreeMap<String, OsString> {
        &self.vars
    }
}

impl Environment for MemoryEnvironment {
    fn get(&self, name: &str) -> Option<OsString> {
        self.vars.get(name).cloned()
    }

    fn check_write(&self, name: &str, value: Option<&OsStr>) -> Result<(), EnvironmentError> {
        validate_write(name, value)?;
        if self.read_only.contains(name) {
            return Err(EnvironmentError::Rejected {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn set(&mut self, name: &str, value: &OsStr) -> Result<(), EnvironmentError> {
        self.check_write(name, Some(value))?;
        self.vars.insert(name.to_string(), value.to_os_string());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), EnvironmentError> {
        self.check_write(name, None)?;
        self.vars.remove(name);
        Ok(())
    }
}

fn validate_write(name: &str, value: Option<&OsStr>) -> Result<(), EnvironmentError> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(EnvironmentError::InvalidName {
            name: name.to_string(),
        });
    }
    if let Some(value) = value {
        if value.as_encoded_bytes().contains(&0) {
            return Err(EnvironmentError::InvalidValue {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
