//! Error types for the action execution pipeline.

use crate::action::ActionError;
use crate::error::{ErrorSeverity, GameError};

/// Identifies which stage of the transition pipeline produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    /// Checks shared by every action.
    PreValidate,
    /// Variant-specific validation.
    Validate,
    Apply,
}

impl TransitionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::PreValidate => "pre_validate",
            TransitionPhase::Validate => "validate",
            TransitionPhase::Apply => "apply",
        }
    }

    /// True when the action was rejected before any mutation was attempted.
    pub fn is_validation(&self) -> bool {
        !matches!(self, TransitionPhase::Apply)
    }
}

/// Error surfaced while executing an action through the game engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{action} action failed during {}: {error}", .phase.as_str())]
pub struct ExecuteError {
    pub action: &'static str,
    pub phase: TransitionPhase,
    #[source]
    pub error: ActionError,
}

impl ExecuteError {
    pub fn new(action: &'static str, phase: TransitionPhase, error: ActionError) -> Self {
        Self {
            action,
            phase,
            error,
        }
    }
}

impl GameError for ExecuteError {
    fn severity(&self) -> ErrorSeverity {
        // A validated action failing to apply means validation and apply
        // disagree about the registry.
        if self.phase == TransitionPhase::Apply {
            return ErrorSeverity::Internal;
        }
        self.error.severity()
    }

    fn error_code(&self) -> &'static str {
        self.error.error_code()
    }
}
