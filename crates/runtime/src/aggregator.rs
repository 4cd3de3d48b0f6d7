//! Per-step buffer of player submissions.
//!
//! Players submit actions at their own pace during a step. When the step
//! closes, [`TurnAggregator::flush`] folds everything into one [`Turn`]:
//! players in join order, each player's actions in submission order. The
//! order depends only on the registry and the submissions, never on arrival
//! timing across players.
//!
//! Each player's queue is capped per step; a submission that would exceed
//! the cap is refused whole.

use std::collections::BTreeMap;

use stellar_core::{Action, PlayerName, Registry, Turn, TurnNumber};

use crate::api::{Result, RuntimeError};

const DEFAULT_STEP_LIMIT: usize = 64;

#[derive(Debug)]
pub struct TurnAggregator {
    pending: BTreeMap<PlayerName, Vec<Action>>,
    limit: usize,
}

impl Default for TurnAggregator {
    fn default() -> Self {
        Self::with_limit(DEFAULT_STEP_LIMIT)
    }
}

impl TurnAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator accepting at most `limit` actions per player per step.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: BTreeMap::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Buffers `actions` behind anything `player` already submitted this
    /// step. Returns how many actions the player now has pending.
    pub fn submit(
        &mut self,
        player: &PlayerName,
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<usize> {
        let actions: Vec<Action> = actions.into_iter().collect();
        let pending = self.pending_for(player);
        if pending + actions.len() > self.limit {
            return Err(RuntimeError::StepLimitExceeded {
                player: player.clone(),
                pending,
                limit: self.limit,
            });
        }
        let queue = self.pending.entry(player.clone()).or_default();
        queue.extend(actions);
        Ok(queue.len())
    }

    /// Drops a player's buffered actions, e.g. when their connection closes.
    pub fn discard(&mut self, player: &PlayerName) -> usize {
        self.pending.remove(player).map_or(0, |queue| queue.len())
    }

    /// Drops every buffered submission.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pending_for(&self, player: &PlayerName) -> usize {
        self.pending.get(player).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.values().all(Vec::is_empty)
    }

    /// Drains the buffer into turn `number`.
    ///
    /// Submissions from names the registry does not know go last, by name.
    /// They will fail pre-validation when the turn is applied.
    pub fn flush(&mut self, number: TurnNumber, registry: &Registry) -> Turn {
        let mut turn = Turn::new(number);

        for player in registry.players() {
            if let Some(queue) = self.pending.remove(&player.name) {
                queue.into_iter().for_each(|action| turn.push(action));
            }
        }
        for (_, queue) in std::mem::take(&mut self.pending) {
            queue.into_iter().for_each(|action| turn.push(action));
        }

        turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_core::{Player, ReceiveIncome, ResourceAmount};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        for (name, nick) in [("zed", "Zed"), ("amy", "Amy"), ("bob", "Bob")] {
            registry.add_player(Player::new(name, nick)).unwrap();
        }
        registry
    }

    fn income(creator: &str, metal: i64) -> Action {
        Action::new(
            creator,
            ReceiveIncome::new(ResourceAmount::from_iter([("metal", metal)])),
        )
    }

    fn creators_and_amounts(turn: &Turn) -> Vec<(String, i64)> {
        turn.actions
            .iter()
            .map(|action| {
                let metal = match &action.kind {
                    stellar_core::ActionKind::ReceiveIncome(income) => income.amount.get("metal"),
                    other => panic!("unexpected {other:?}"),
                };
                (action.creator.to_string(), metal)
            })
            .collect()
    }

    #[test]
    fn flush_orders_by_join_then_submission() {
        let registry = registry();
        let mut aggregator = TurnAggregator::new();

        aggregator.submit(&"bob".into(), [income("bob", 1)]).unwrap();
        aggregator.submit(&"amy".into(), [income("amy", 2)]).unwrap();
        aggregator.submit(&"zed".into(), [income("zed", 3)]).unwrap();
        aggregator.submit(&"amy".into(), [income("amy", 4), income("amy", 5)]).unwrap();

        let turn = aggregator.flush(TurnNumber(2), &registry);

        assert_eq!(turn.number, TurnNumber(2));
        assert_eq!(
            creators_and_amounts(&turn),
            vec![
                ("zed".into(), 3),
                ("amy".into(), 2),
                ("amy".into(), 4),
                ("amy".into(), 5),
                ("bob".into(), 1),
            ]
        );
        assert!(aggregator.is_empty());
    }

    #[test]
    fn arrival_order_across_players_does_not_matter() {
        let registry = registry();
        let mut first = TurnAggregator::new();
        first.submit(&"amy".into(), [income("amy", 1)]).unwrap();
        first.submit(&"bob".into(), [income("bob", 2)]).unwrap();

        let mut second = TurnAggregator::new();
        second.submit(&"bob".into(), [income("bob", 2)]).unwrap();
        second.submit(&"amy".into(), [income("amy", 1)]).unwrap();

        assert_eq!(
            first.flush(TurnNumber(1), &registry),
            second.flush(TurnNumber(1), &registry)
        );
    }

    #[test]
    fn discarded_submissions_never_reach_the_turn() {
        let registry = registry();
        let mut aggregator = TurnAggregator::new();
        aggregator.submit(&"amy".into(), [income("amy", 1), income("amy", 2)]).unwrap();
        aggregator.submit(&"bob".into(), [income("bob", 3)]).unwrap();

        assert_eq!(aggregator.discard(&"amy".into()), 2);
        assert_eq!(aggregator.len(), 1);

        let turn = aggregator.flush(TurnNumber(1), &registry);
        assert_eq!(creators_and_amounts(&turn), vec![("bob".into(), 3)]);
    }

    #[test]
    fn unknown_submitters_go_last() {
        let registry = registry();
        let mut aggregator = TurnAggregator::new();
        aggregator.submit(&"stranger".into(), [income("stranger", 9)]).unwrap();
        aggregator.submit(&"bob".into(), [income("bob", 1)]).unwrap();

        let turn = aggregator.flush(TurnNumber(1), &registry);
        assert_eq!(
            creators_and_amounts(&turn),
            vec![("bob".into(), 1), ("stranger".into(), 9)]
        );
    }

    #[test]
    fn submissions_past_the_step_limit_are_refused_whole() {
        let registry = registry();
        let mut aggregator = TurnAggregator::with_limit(3);
        aggregator
            .submit(&"amy".into(), [income("amy", 1), income("amy", 2)])
            .unwrap();

        let refused = aggregator.submit(&"amy".into(), [income("amy", 3), income("amy", 4)]);
        assert!(matches!(
            refused,
            Err(RuntimeError::StepLimitExceeded {
                pending: 2,
                limit: 3,
                ..
            })
        ));
        assert_eq!(aggregator.pending_for(&"amy".into()), 2);
        assert_eq!(aggregator.submit(&"bob".into(), [income("bob", 5)]).unwrap(), 1);

        aggregator.flush(TurnNumber(1), &registry);
        assert_eq!(
            aggregator.submit(&"amy".into(), [income("amy", 6), income("amy", 7)]).unwrap(),
            2
        );
    }
}
