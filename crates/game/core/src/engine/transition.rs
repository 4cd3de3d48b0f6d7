//! Transition dispatch and the validate-then-apply pipeline.

use crate::action::{Action, ActionOutcome, pre_validate};
use crate::state::Registry;

use super::errors::{ExecuteError, TransitionPhase};

/// Runs the shared pre-validation followed by the variant's own validation.
pub(crate) fn check_action(action: &Action, registry: &Registry) -> Result<(), ExecuteError> {
    let ctx = action.context();
    let name = action.name();

    pre_validate(ctx, registry)
        .map_err(|error| ExecuteError::new(name, TransitionPhase::PreValidate, error))?;

    action
        .kind
        .transition()
        .validate(ctx, registry)
        .map_err(|error| ExecuteError::new(name, TransitionPhase::Validate, error))
}

/// Executes an action through the pipeline.
///
/// Phases:
/// 1. `pre_validate` - creator and target resolution
/// 2. `validate` - variant checks against the unmodified registry
/// 3. `apply` - mutation
///
/// `apply` is never reached when either validation phase fails. If `apply`
/// itself fails the registry is restored, so no action is left half-applied.
pub(crate) fn drive_action(
    action: &Action,
    registry: &mut Registry,
) -> Result<ActionOutcome, ExecuteError> {
    check_action(action, registry)?;

    let before = registry.clone();
    action
        .kind
        .transition()
        .apply(action.context(), registry)
        .map_err(|error| {
            *registry = before;
            ExecuteError::new(action.name(), TransitionPhase::Apply, error)
        })
}
