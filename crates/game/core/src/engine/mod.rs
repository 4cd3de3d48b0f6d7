//! Action execution pipeline.
//!
//! The [`GameEngine`] is the only path by which actions mutate a
//! [`Registry`]. It composes the shared pre-validation with each variant's
//! own checks and refuses to apply anything that fails either.

mod errors;
mod transition;

pub use errors::{ExecuteError, TransitionPhase};

pub(crate) use transition::check_action;

use crate::action::{Action, ActionOutcome};
use crate::state::Registry;

/// Borrowing reducer over a registry.
pub struct GameEngine<'a> {
    registry: &'a mut Registry,
}

impl<'a> GameEngine<'a> {
    pub fn new(registry: &'a mut Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &*self.registry
    }

    /// Validates an action against the current registry without applying it.
    pub fn validate(&self, action: &Action) -> Result<(), ExecuteError> {
        check_action(action, self.registry)
    }

    /// Validates and applies an action.
    ///
    /// On any error the registry is unchanged.
    pub fn execute(&mut self, action: &Action) -> Result<ActionOutcome, ExecuteError> {
        transition::drive_action(action, self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionError, ReceiveIncome};
    use crate::error::{ErrorSeverity, GameError};
    use crate::state::{Player, RegistryError, ResourceAmount};

    #[test]
    fn failures_report_their_phase() {
        let mut registry = Registry::new();
        registry.add_player(Player::new("alice", "Alice")).unwrap();
        let mut engine = GameEngine::new(&mut registry);

        let ghost = Action::new("ghost", ReceiveIncome::new(ResourceAmount::new()));
        let error = engine.execute(&ghost).unwrap_err();
        assert_eq!(error.phase, TransitionPhase::PreValidate);
        assert_eq!(
            error.error,
            ActionError::Unresolved(RegistryError::PlayerNotFound("ghost".into()))
        );

        let broke = Action::new(
            "alice",
            ReceiveIncome::new(ResourceAmount::from_iter([("metal", -1)])),
        );
        let error = engine.validate(&broke).unwrap_err();
        assert_eq!(error.phase, TransitionPhase::Validate);
        assert_eq!(error.severity(), ErrorSeverity::Validation);
        assert_eq!(error.error_code(), "ACTION_INSUFFICIENT_RESOURCES");
        assert_eq!(
            error.to_string(),
            "receive_income action failed during validate: alice has 0 metal, cannot apply -1"
        );
    }
}
