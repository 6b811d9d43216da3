use std::ffi::{OsStr, OsString};

use folisdk_core::{ManagedVar, VarValue};
use tracing::debug;

use crate::environment::{Environment, EnvironmentError};

const BACKUP_PREFIX: &str = "_OLD_FOLISDK_";
const BACKUP_INDEX: &str = "_OLD_FOLISDK_VARS";

/// Variable holding the pre-activation value of `var` while an activation
/// is live. Present with any value (including "") means the variable was
/// set; absent means it was unset.
pub fn backup_name(var: ManagedVar) -> String {
    format!("{BACKUP_PREFIX}{}", var.name())
}

/// Every variable a carried snapshot may occupy, the index first.
pub fn carried_names() -> impl Iterator<Item = String> {
    std::iter::once(BACKUP_INDEX.to_string()).chain(ManagedVar::all().map(backup_name))
}

/// Pre-activation values of every variable an activation touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    entries: Vec<(ManagedVar, VarValue)>,
}

impl EnvironmentSnapshot {
    /// Reads each variable from `env` as it is right now.
    pub fn capture<E, I>(env: &E, vars: I) -> Self
    where
        E: Environment + ?Sized,
        I: IntoIterator<Item = ManagedVar>,
    {
        let mut entries: Vec<(ManagedVar, VarValue)> = Vec::new();
        for var in vars {
            if entries.iter().any(|(seen, _)| *seen == var) {
                continue;
            }
            let value = VarValue::from_os(env.get(var.name()));
            debug!(var = var.name(), ?value, "captured variable");
            entries.push((var, value));
        }
        Self { entries }
    }

    /// Reads back a snapshot stored by an earlier activation, possibly made
    /// by another process. `None` when nothing is carried or the index names
    /// a variable this build does not manage.
    pub fn recover<E>(env: &E) -> Option<Self>
    where
        E: Environment + ?Sized,
    {
        let index = env.get(BACKUP_INDEX)?;
        let mut entries: Vec<(ManagedVar, VarValue)> = Vec::new();
        for name in index.to_str()?.split_whitespace() {
            let var = ManagedVar::from_name(name)?;
            if entries.iter().any(|(seen, _)| *seen == var) {
                continue;
            }
            entries.push((var, VarValue::from_os(env.get(&backup_name(var)))));
        }
        if entries.is_empty() {
            return None;
        }
        debug!(vars = entries.len(), "recovered carried snapshot");
        Some(Self { entries })
    }

    pub fn get(&self, var: ManagedVar) -> Option<&VarValue> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == var)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ManagedVar, VarValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes that store this snapshot in the environment beside the overlay;
    /// `None` removes the variable.
    pub(crate) fn carried_writes(&self) -> Vec<(String, Option<OsString>)> {
        let index: Vec<&str> = self.entries.iter().map(|(var, _)| var.name()).collect();
        let mut writes = vec![(BACKUP_INDEX.to_string(), Some(OsString::from(index.join(" "))))];
        for (var, value) in &self.entries {
            writes.push((backup_name(*var), value.as_os_str().map(OsStr::to_os_string)));
        }
        writes
    }

    /// Writes every recorded value back and drops any carried snapshot. All
    /// writes are checked before the first one is applied, so a rejected
    /// variable leaves `env` untouched.
    pub fn restore<E>(&self, env: &mut E) -> Result<(), EnvironmentError>
    where
        E: Environment + ?Sized,
    {
        let carried: Vec<String> = carried_names().collect();
        for (var, value) in &self.entries {
            env.check_write(var.name(), value.as_os_str())?;
        }
        for name in &carried {
            env.check_write(name, None)?;
        }

        for (var, value) in &self.entries {
            match value.as_os_str() {
                Some(previous) => env.set(var.name(), previous)?,
                None => env.remove(var.name())?,
            }
            debug!(var = var.name(), ?value, "restored variable");
        }
        for name in &carried {
            env.remove(name)?;
        }
        Ok(())
    }
}
