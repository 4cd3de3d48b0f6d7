//! Ordered batches of actions for one simulation step.
//!
//! A [`Turn`] is the unit of network transfer and of replay. Applying it runs
//! every action in order, re-validating each one against the registry as left
//! by the actions before it. Actions that no longer hold are skipped and
//! reported in the [`TurnReport`]; the rest of the turn still applies.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::action::{Action, ActionOutcome};
use crate::engine::{ExecuteError, GameEngine};
use crate::error::GameError;
use crate::json::Serializable;
use crate::state::Registry;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TurnNumber(pub u64);

impl TurnNumber {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TurnNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn {}", self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub number: TurnNumber,
    /// Application order. Serialized as an array so order survives transfer.
    pub actions: Vec<Action>,
}

impl Serializable for Turn {}

impl Turn {
    pub fn new(number: TurnNumber) -> Self {
        Self {
            number,
            actions: Vec::new(),
        }
    }

    pub fn with_actions(number: TurnNumber, actions: Vec<Action>) -> Self {
        Self { number, actions }
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Applies every action in order against the live registry.
    pub fn apply_to(&self, registry: &mut Registry) -> TurnReport {
        let mut report = TurnReport::new(self.number);

        for (index, action) in self.actions.iter().enumerate() {
            let description = action.describe(registry);
            match GameEngine::new(registry).execute(action) {
                Ok(outcome) => {
                    debug!(
                        target: "core::turn",
                        turn = self.number.0,
                        index,
                        action = action.name(),
                        creator = %action.creator,
                        ?outcome,
                        "action applied"
                    );
                    report.applied.push(AppliedAction {
                        index,
                        description,
                        outcome,
                    });
                }
                Err(failure) => {
                    if failure.phase.is_validation() {
                        debug!(
                            target: "core::turn",
                            turn = self.number.0,
                            index,
                            action = action.name(),
                            creator = %action.creator,
                            reason = %failure.error,
                            "action skipped"
                        );
                    } else {
                        error!(
                            target: "core::turn",
                            turn = self.number.0,
                            index,
                            action = action.name(),
                            severity = failure.severity().as_str(),
                            error = %failure,
                            "validated action failed to apply"
                        );
                    }
                    report.skipped.push(SkippedAction::from_failure(index, &failure));
                }
            }
        }

        report
    }

    /// Dry run against a copy of the registry; the argument is untouched.
    pub fn validate_all(&self, registry: &Registry) -> TurnReport {
        let mut scratch = registry.clone();
        self.apply_to(&mut scratch)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAction {
    /// Position within the turn.
    pub index: usize,
    pub description: String,
    pub outcome: ActionOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAction {
    pub index: usize,
    pub action: String,
    pub code: String,
    pub reason: String,
}

impl SkippedAction {
    fn from_failure(index: usize, failure: &ExecuteError) -> Self {
        Self {
            index,
            action: failure.action.to_string(),
            code: failure.error_code().to_string(),
            reason: failure.error.to_string(),
        }
    }
}

/// Applied/skipped breakdown of one turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: TurnNumber,
    pub applied: Vec<AppliedAction>,
    pub skipped: Vec<SkippedAction>,
}

impl Serializable for TurnReport {}

impl TurnReport {
    pub fn new(turn: TurnNumber) -> Self {
        Self {
            turn,
            applied: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn applied_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.applied.iter().map(|applied| applied.index)
    }

    pub fn skipped_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.skipped.iter().map(|skipped| skipped.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ReceiveIncome, TransferResources};
    use crate::state::{Player, ResourceAmount};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .add_player(
                Player::new("alice", "Alice")
                    .with_resources(ResourceAmount::from_iter([("metal", 10)])),
            )
            .unwrap();
        registry.add_player(Player::new("bob", "Bob")).unwrap();
        registry
    }

    fn spend(player: &str, quantity: i64) -> Action {
        Action::new(
            player,
            ReceiveIncome::new(ResourceAmount::from_iter([("metal", -quantity)])),
        )
    }

    #[test]
    fn later_action_invalidated_by_earlier_one_is_skipped() {
        let mut registry = registry();
        let turn = Turn::with_actions(TurnNumber(1), vec![spend("alice", 8), spend("alice", 5)]);

        let mut expected = registry.clone();
        spend("alice", 8).execute(&mut expected).unwrap();

        let report = turn.apply_to(&mut registry);

        assert_eq!(report.applied_indices().collect::<Vec<_>>(), vec![0]);
        assert_eq!(report.skipped_indices().collect::<Vec<_>>(), vec![1]);
        assert_eq!(report.skipped[0].code, "ACTION_INSUFFICIENT_RESOURCES");
        assert_eq!(registry, expected);
    }

    #[test]
    fn validate_all_leaves_registry_untouched() {
        let registry = registry();
        let turn = Turn::with_actions(
            TurnNumber(3),
            vec![
                Action::new(
                    "alice",
                    TransferResources {
                        amount: ResourceAmount::from_iter([("metal", 10)]),
                    },
                )
                .targeting("bob"),
                spend("alice", 1),
            ],
        );

        let report = turn.validate_all(&registry);

        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            registry.player(&"alice".into()).unwrap().resources.get("metal"),
            10
        );
    }

    #[test]
    fn actions_keep_their_order_in_the_canonical_form() {
        let turn = Turn::with_actions(TurnNumber(2), vec![spend("bob", 1), spend("alice", 1)]);
        let parsed = Turn::from_canonical(&turn.to_json().render()).unwrap();
        assert_eq!(parsed, turn);
        assert_eq!(parsed.actions[0].creator, "bob".into());
    }
}
