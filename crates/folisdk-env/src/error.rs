use folisdk_core::ArchitectureId;
use folisdk_locator::LocateError;
use thiserror::Error;

use crate::environment::EnvironmentError;

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error(transparent)]
    ToolchainNotFound(#[from] LocateError),

    #[error("foliSDK is not currently active")]
    NotActive,

    #[error("environment rejected activation of {arch}: {source}{note}", note = unwound_note(.replaced.as_ref()))]
    ApplyRejected {
        arch: ArchitectureId,
        /// Activation already unwound before the rejected write.
        replaced: Option<ArchitectureId>,
        source: EnvironmentError,
    },

    #[error("foliSDK ({marker}) is marked active but its saved environment is missing; start a new shell to clear it")]
    StateMissing { marker: String },

    #[error("failed to restore environment after {arch}; previous activation is unrecoverable: {source}")]
    RestoreFailure {
        arch: ArchitectureId,
        source: EnvironmentError,
    },
}

impl ActivationError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Only a failed restore leaves the session in an inconsistent state.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RestoreFailure { .. })
    }

    /// Stable short label used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid-argument",
            Self::ToolchainNotFound(_) => "toolchain-not-found",
            Self::NotActive => "not-active",
            Self::ApplyRejected { .. } => "apply-rejected",
            Self::RestoreFailure { .. } => "restore-failure",
            Self::StateMissing { .. } => "state-missing",
        }
    }
}

fn unwound_note(replaced: Option<&ArchitectureId>) -> String {
    match replaced {
        Some(previous) => format!(" ({previous} was already deactivated)"),
        None => String::new(),
    }
}
