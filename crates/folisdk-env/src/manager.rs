use std::collections::BTreeSet;
use std::ffi::OsString;

use folisdk_core::{
    ArchitectureId, ManagedVar, NavigationGroup, TargetEnvironment, ToolchainGroup, VarValue,
};
use folisdk_locator::{ToolchainDescriptor, ToolchainLocator};
use tracing::{debug, info, warn};

use crate::args::{ActivationOptions, ActivationRequest};
use crate::environment::{Environment, EnvironmentError, MemoryEnvironment};
use crate::error::ActivationError;
use crate::snapshot::EnvironmentSnapshot;

/// Variables an operation would change, as `(name, new value)`, sorted by name.
pub type EnvironmentChanges = Vec<(String, VarValue)>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveLayer {
    arch: ArchitectureId,
    options: ActivationOptions,
    snapshot: EnvironmentSnapshot,
}

/// Activation state of one session. The active architecture and its snapshot
/// are stored together, so one is never present without the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationState {
    active: Option<ActiveLayer>,
}

impl ActivationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the state an earlier activation left in `env`. A set
    /// `FOLISDK_ACTIVE` without a readable carried snapshot cannot be
    /// unwound and is reported as `StateMissing`.
    pub fn recover<E>(env: &E) -> Result<Self, ActivationError>
    where
        E: Environment + ?Sized,
    {
        let Some(marker) = env
            .get(ManagedVar::ActiveMarker.name())
            .filter(|value| !value.is_empty())
        else {
            return Ok(Self::new());
        };

        let marker = marker.to_string_lossy().into_owned();
        let arch = ArchitectureId::parse(&marker).ok();
        let (Some(arch), Some(snapshot)) = (arch, EnvironmentSnapshot::recover(env)) else {
            warn!(%marker, "active marker without a carried snapshot");
            return Err(ActivationError::StateMissing { marker });
        };

        let options = ActivationOptions {
            path_only: !snapshot.iter().any(|(var, _)| var.is_toolchain()),
            keep_prompt: snapshot.get(ManagedVar::Prompt).is_none(),
        };
        debug!(arch = %arch, path_only = options.path_only, "recovered activation");
        Ok(Self {
            active: Some(ActiveLayer {
                arch,
                options,
                snapshot,
            }),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_arch(&self) -> Option<&ArchitectureId> {
        self.active.as_ref().map(|layer| &layer.arch)
    }

    pub fn active_options(&self) -> Option<ActivationOptions> {
        self.active.as_ref().map(|layer| layer.options)
    }

    pub fn snapshot(&self) -> Option<&EnvironmentSnapshot> {
        self.active.as_ref().map(|layer| &layer.snapshot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub arch: ArchitectureId,
    pub triple: String,
    pub path_only: bool,
    /// Architecture that was unwound before this activation, if any.
    pub replaced: Option<ArchitectureId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deactivation {
    pub arch: ArchitectureId,
}

pub struct ActivationManager<L> {
    locator: L,
}

impl<L: ToolchainLocator> ActivationManager<L> {
    pub fn new(locator: L) -> Self {
        Self { locator }
    }

    /// Overlays `request.arch` onto `env`. The snapshot is kept in `state`
    /// and also carried in `env` itself, so a later process can recover it
    /// with [`ActivationState::recover`].
    pub fn activate<E>(
        &self,
        state: &mut ActivationState,
        env: &mut E,
        request: &ActivationRequest,
    ) -> Result<Activation, ActivationError>
    where
        E: Environment + ?Sized,
    {
        let arch = &request.arch;
        let descriptor = self.locator.resolve(arch)?;
        let joined_bin_dirs = join_bin_dirs(&descriptor)?;

        let replaced = match state.active_arch().cloned() {
            Some(previous) => {
                info!(previous = %previous, next = %arch, "unwinding active activation");
                self.deactivate(state, env)?;
                Some(previous)
            }
            None => None,
        };
        let rejected = |source: EnvironmentError| ActivationError::ApplyRejected {
            arch: arch.clone(),
            replaced: replaced.clone(),
            source,
        };

        let target = compute_target(&*env, &descriptor, joined_bin_dirs, request.options);
        let entries: Vec<(ManagedVar, OsString)> = target
            .entries()
            .into_iter()
            .filter(|(var, _)| !(request.options.keep_prompt && *var == ManagedVar::Prompt))
            .collect();
        let snapshot = EnvironmentSnapshot::capture(&*env, entries.iter().map(|(var, _)| *var));

        let mut writes: Vec<(String, Option<OsString>)> = entries
            .into_iter()
            .map(|(var, value)| (var.name().to_string(), Some(value)))
            .collect();
        writes.extend(snapshot.carried_writes());

        for (name, value) in &writes {
            env.check_write(name, value.as_deref())
                .map_err(&rejected)?;
        }

        for (name, value) in &writes {
            let written = match value {
                Some(value) => env.set(name, value),
                None => env.remove(name),
            };
            if let Err(source) = written {
                warn!(var = %name, %source, "write failed after checks, rolling back");
                return match snapshot.restore(env) {
                    Ok(()) => Err(rejected(source)),
                    Err(source) => Err(ActivationError::RestoreFailure {
                        arch: arch.clone(),
                        source,
                    }),
                };
            }
        }

        debug!(vars = writes.len(), "applied activation");
        state.active = Some(ActiveLayer {
            arch: arch.clone(),
            options: request.options,
            snapshot,
        });
        info!(
            arch = %arch,
            triple = %descriptor.triple,
            path_only = request.options.path_only,
            "activated"
        );

        Ok(Activation {
            arch: arch.clone(),
            triple: descriptor.triple,
            path_only: request.options.path_only,
            replaced,
        })
    }

    /// Computes what `activate` would change in `env` without touching it.
    /// An activation already carried in `env` is unwound first.
    pub fn preview(
        &self,
        env: &MemoryEnvironment,
        request: &ActivationRequest,
    ) -> Result<(Activation, EnvironmentChanges), ActivationError> {
        let mut scratch = env.clone();
        let mut state = ActivationState::recover(&scratch)?;
        let activation = self.activate(&mut state, &mut scratch, request)?;
        Ok((activation, diff(env, &scratch)))
    }

    /// Computes what deactivating the activation carried in `env` would change.
    pub fn preview_deactivate(
        &self,
        env: &MemoryEnvironment,
    ) -> Result<(Deactivation, EnvironmentChanges), ActivationError> {
        let mut scratch = env.clone();
        let mut state = ActivationState::recover(&scratch)?;
        let deactivation = self.deactivate(&mut state, &mut scratch)?;
        Ok((deactivation, diff(env, &scratch)))
    }

    pub fn deactivate<E>(
        &self,
        state: &mut ActivationState,
        env: &mut E,
    ) -> Result<Deactivation, ActivationError>
    where
        E: Environment + ?Sized,
    {
        let Some(layer) = state.active.take() else {
            debug!("deactivate requested while inactive");
            return Err(ActivationError::NotActive);
        };

        layer
            .snapshot
            .restore(env)
            .map_err(|source| ActivationError::RestoreFailure {
                arch: layer.arch.clone(),
                source,
            })?;

        info!(arch = %layer.arch, "deactivated");
        Ok(Deactivation { arch: layer.arch })
    }
}

fn diff(before: &MemoryEnvironment, after: &MemoryEnvironment) -> EnvironmentChanges {
    let names: BTreeSet<&String> = before.vars().keys().chain(after.vars().keys()).collect();
    names
        .into_iter()
        .filter_map(|name| {
            let value = after.get(name);
            (before.get(name) != value).then(|| (name.clone(), VarValue::from_os(value)))
        })
        .collect()
}

fn join_bin_dirs(descriptor: &ToolchainDescriptor) -> Result<OsString, ActivationError> {
    std::env::join_paths(&descriptor.bin_dirs).map_err(|err| {
        ActivationError::invalid_argument(format!(
            "toolchain bin directory for {} cannot be added to PATH: {err}",
            descriptor.arch
        ))
    })
}

fn compute_target<E>(
    env: &E,
    descriptor: &ToolchainDescriptor,
    joined_bin_dirs: OsString,
    options: ActivationOptions,
) -> TargetEnvironment
where
    E: Environment + ?Sized,
{
    let previous_path = VarValue::from_os(env.get(ManagedVar::Path.name()));
    let previous_prompt = VarValue::from_os(env.get(ManagedVar::Prompt.name()));
    let navigation = NavigationGroup::new(
        &descriptor.arch,
        joined_bin_dirs,
        &previous_path,
        &previous_prompt,
    );
    let toolchain = (!options.path_only)
        .then(|| ToolchainGroup::new(&descriptor.triple, &descriptor.sysroot));

    TargetEnvironment {
        navigation,
        toolchain,
    }
}
