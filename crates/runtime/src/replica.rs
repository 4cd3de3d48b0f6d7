//! Client-side copy of the authoritative state.
//!
//! A [`ClientReplica`] keeps two registries: `confirmed`, built only from
//! turns and snapshots the server sent, and `predicted`, which is
//! `confirmed` plus the player's own not-yet-sent actions. Proposals are
//! validated against `predicted` so the player sees their own effects
//! immediately; only the server's re-validation binds.

use thiserror::Error;
use tracing::{debug, warn};

use stellar_core::{Action, ActionError, PlayerName, Registry, Turn, TurnNumber, TurnReport};
use stellar_protocol::{Envelope, Message, StateSnapshot};

#[derive(Debug, Error)]
pub enum ReplicaError {
    #[error("{player} cannot propose an action created by {creator}")]
    ForeignCreator {
        player: PlayerName,
        creator: PlayerName,
    },

    #[error("proposed {action} action is invalid: {source}")]
    Rejected {
        action: &'static str,
        #[source]
        source: ActionError,
    },

    #[error("expected {expected}, received {received}")]
    OutOfSequence {
        expected: TurnNumber,
        received: TurnNumber,
    },
}

/// What [`ClientReplica::receive`] did with a server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaUpdate {
    TurnApplied(TurnReport),
    Resynced,
    /// Carried a message kind the replica does not consume.
    Ignored(Message),
    /// Failed its integrity check; treat as not received.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct ClientReplica {
    player: PlayerName,
    confirmed: Registry,
    predicted: Registry,
    next_turn: TurnNumber,
    pending: Vec<Action>,
}

impl ClientReplica {
    pub fn from_snapshot(player: impl Into<PlayerName>, snapshot: StateSnapshot) -> Self {
        Self {
            player: player.into(),
            predicted: snapshot.registry.clone(),
            confirmed: snapshot.registry,
            next_turn: snapshot.next_turn,
            pending: Vec::new(),
        }
    }

    pub fn player(&self) -> &PlayerName {
        &self.player
    }

    /// State as last confirmed by the server.
    pub fn confirmed(&self) -> &Registry {
        &self.confirmed
    }

    /// Confirmed state with this player's pending actions applied.
    pub fn predicted(&self) -> &Registry {
        &self.predicted
    }

    pub fn next_turn(&self) -> TurnNumber {
        self.next_turn
    }

    pub fn pending(&self) -> &[Action] {
        &self.pending
    }

    /// Validates `action` against the predicted state and queues it.
    pub fn propose(&mut self, action: Action) -> Result<(), ReplicaError> {
        if action.creator != self.player {
            return Err(ReplicaError::ForeignCreator {
                player: self.player.clone(),
                creator: action.creator,
            });
        }

        action
            .execute(&mut self.predicted)
            .map_err(|failure| ReplicaError::Rejected {
                action: failure.action,
                source: failure.error,
            })?;

        self.pending.push(action);
        Ok(())
    }

    /// Drains pending actions into a turn proposal for the next step.
    ///
    /// The predicted state keeps the drained actions until the server's turn
    /// arrives.
    pub fn take_turn(&mut self) -> Turn {
        Turn::with_actions(self.next_turn, std::mem::take(&mut self.pending))
    }

    /// Applies a turn broadcast by the server.
    ///
    /// Turns must arrive in order; a gap means the replica missed something
    /// and must [`resync`](Self::resync). Pending actions are replayed on top
    /// of the new confirmed state and dropped if they no longer hold.
    pub fn apply_remote_turn(&mut self, turn: &Turn) -> Result<TurnReport, ReplicaError> {
        if turn.number != self.next_turn {
            return Err(ReplicaError::OutOfSequence {
                expected: self.next_turn,
                received: turn.number,
            });
        }

        let report = turn.apply_to(&mut self.confirmed);
        self.next_turn = turn.number.next();
        self.rebuild_prediction();

        debug!(
            target: "runtime::replica",
            player = %self.player,
            turn = turn.number.0,
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            pending = self.pending.len(),
            "remote turn applied"
        );

        Ok(report)
    }

    /// Replaces all state with a server snapshot and clears pending actions.
    pub fn resync(&mut self, snapshot: StateSnapshot) {
        debug!(
            target: "runtime::replica",
            player = %self.player,
            next_turn = snapshot.next_turn.0,
            dropped = self.pending.len(),
            "resynced from snapshot"
        );
        self.predicted = snapshot.registry.clone();
        self.confirmed = snapshot.registry;
        self.next_turn = snapshot.next_turn;
        self.pending.clear();
    }

    /// Verifies and consumes a server envelope.
    pub fn receive(&mut self, envelope: &Envelope) -> Result<ReplicaUpdate, ReplicaError> {
        let Some(message) = envelope.open() else {
            return Ok(ReplicaUpdate::Discarded);
        };

        match message {
            Message::Turn(turn) => self.apply_remote_turn(&turn).map(ReplicaUpdate::TurnApplied),
            Message::Snapshot(snapshot) => {
                self.resync(snapshot);
                Ok(ReplicaUpdate::Resynced)
            }
            other => Ok(ReplicaUpdate::Ignored(other)),
        }
    }

    fn rebuild_prediction(&mut self) {
        let mut predicted = self.confirmed.clone();
        let player = &self.player;
        self.pending.retain(|action| match action.execute(&mut predicted) {
            Ok(_) => true,
            Err(failure) => {
                warn!(
                    target: "runtime::replica",
                    player = %player,
                    action = failure.action,
                    reason = %failure.error,
                    "pending action invalidated by remote turn"
                );
                false
            }
        });
        self.predicted = predicted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_core::{Player, ReceiveIncome, ResourceAmount, TransferResources};

    fn snapshot() -> StateSnapshot {
        let mut registry = Registry::new();
        registry
            .add_player(
                Player::new("alice", "Alice")
                    .with_resources(ResourceAmount::from_iter([("metal", 10)])),
            )
            .unwrap();
        registry.add_player(Player::new("bob", "Bob")).unwrap();
        StateSnapshot {
            next_turn: TurnNumber(1),
            registry,
        }
    }

    fn income(creator: &str, metal: i64) -> Action {
        Action::new(
            creator,
            ReceiveIncome::new(ResourceAmount::from_iter([("metal", metal)])),
        )
    }

    fn metal(registry: &Registry, player: &str) -> i64 {
        registry
            .player(&player.into())
            .unwrap()
            .resources
            .get("metal")
    }

    #[test]
    fn proposals_apply_to_prediction_only() {
        let mut replica = ClientReplica::from_snapshot("alice", snapshot());
        replica.propose(income("alice", -4)).unwrap();

        assert_eq!(metal(replica.predicted(), "alice"), 6);
        assert_eq!(metal(replica.confirmed(), "alice"), 10);
        assert_eq!(replica.pending().len(), 1);
    }

    #[test]
    fn invalid_proposal_is_rejected_without_queueing() {
        let mut replica = ClientReplica::from_snapshot("alice", snapshot());
        replica.propose(income("alice", -8)).unwrap();

        let second = replica.propose(income("alice", -3));
        assert!(matches!(second, Err(ReplicaError::Rejected { .. })));
        assert_eq!(replica.pending().len(), 1);
        assert_eq!(metal(replica.predicted(), "alice"), 2);
    }

    #[test]
    fn foreign_creator_is_refused() {
        let mut replica = ClientReplica::from_snapshot("alice", snapshot());
        assert!(matches!(
            replica.propose(income("bob", 1)),
            Err(ReplicaError::ForeignCreator { .. })
        ));
    }

    #[test]
    fn remote_turn_confirms_and_replays_pending() {
        let mut replica = ClientReplica::from_snapshot("alice", snapshot());
        replica.propose(income("alice", -4)).unwrap();
        let proposal = replica.take_turn();
        assert!(replica.pending().is_empty());

        replica.propose(income("alice", -5)).unwrap();
        replica.apply_remote_turn(&proposal).unwrap();

        assert_eq!(replica.next_turn(), TurnNumber(2));
        assert_eq!(metal(replica.confirmed(), "alice"), 6);
        assert_eq!(metal(replica.predicted(), "alice"), 1);
        assert_eq!(replica.pending().len(), 1);
    }

    #[test]
    fn pending_action_invalidated_by_remote_turn_is_dropped() {
        let mut replica = ClientReplica::from_snapshot("alice", snapshot());
        replica.propose(income("alice", -9)).unwrap();

        let server_turn = Turn::with_actions(
            TurnNumber(1),
            vec![
                Action::new(
                    "alice",
                    TransferResources::new(ResourceAmount::from_iter([("metal", 5)])),
                )
                .targeting("bob"),
            ],
        );
        replica.apply_remote_turn(&server_turn).unwrap();

        assert!(replica.pending().is_empty());
        assert_eq!(metal(replica.predicted(), "alice"), 5);
    }

    #[test]
    fn out_of_order_turn_requires_resync() {
        let mut replica = ClientReplica::from_snapshot("alice", snapshot());
        let skipped_ahead = Turn::new(TurnNumber(3));

        assert!(matches!(
            replica.apply_remote_turn(&skipped_ahead),
            Err(ReplicaError::OutOfSequence { .. })
        ));

        let mut fresh = snapshot();
        fresh.next_turn = TurnNumber(3);
        replica.resync(fresh);
        assert!(replica.apply_remote_turn(&skipped_ahead).is_ok());
        assert_eq!(replica.next_turn(), TurnNumber(4));
    }

    #[test]
    fn corrupted_envelope_is_discarded() {
        let mut replica = ClientReplica::from_snapshot("alice", snapshot());
        let mut envelope = Message::Turn(Turn::new(TurnNumber(1))).seal();
        envelope.payload.push(' ');

        assert_eq!(replica.receive(&envelope).unwrap(), ReplicaUpdate::Discarded);
        assert_eq!(replica.next_turn(), TurnNumber(1));
    }
}
