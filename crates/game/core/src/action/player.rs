use serde::{Deserialize, Serialize};

use super::{ActionContext, ActionError, ActionOutcome, ActionTransition, nickname};
use crate::state::{PlayerName, Registry, ResourceAmount};

/// Checks that `change` can be added to the pool of `player` without driving
/// a resource negative or out of range.
fn ensure_applicable(
    registry: &Registry,
    player: &PlayerName,
    change: &ResourceAmount,
) -> Result<(), ActionError> {
    let pool = &registry.player(player)?.resources;
    if let Some(resource) = pool.first_overflow(change) {
        return Err(ActionError::ResourceOverflow {
            player: player.clone(),
            resource: resource.to_string(),
        });
    }
    if let Some((resource, available)) = pool.first_shortfall(change) {
        return Err(ActionError::InsufficientResources {
            player: player.clone(),
            resource: resource.to_string(),
            available,
            change: change.get(resource),
        });
    }
    Ok(())
}

fn credit(
    registry: &mut Registry,
    player: &PlayerName,
    change: &ResourceAmount,
) -> Result<(), ActionError> {
    ensure_applicable(registry, player, change)?;
    let entry = registry.player_mut(player)?;
    entry.resources = entry.resources.checked_plus(change).ok_or_else(|| {
        ActionError::ResourceOverflow {
            player: player.clone(),
            resource: entry
                .resources
                .first_overflow(change)
                .unwrap_or_default()
                .to_string(),
        }
    })?;
    Ok(())
}

/// Adds a (possibly negative) amount to the creator's resource pool.
///
/// Invalid when any tracked resource would end up negative; the pool is never
/// clamped. A target, when named, only has to resolve and is never touched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveIncome {
    pub amount: ResourceAmount,
}

impl ReceiveIncome {
    pub fn new(amount: ResourceAmount) -> Self {
        Self { amount }
    }
}

impl ActionTransition for ReceiveIncome {
    fn validate(&self, ctx: ActionContext<'_>, registry: &Registry) -> Result<(), ActionError> {
        ensure_applicable(registry, ctx.creator, &self.amount)
    }

    fn apply(
        &self,
        ctx: ActionContext<'_>,
        registry: &mut Registry,
    ) -> Result<ActionOutcome, ActionError> {
        credit(registry, ctx.creator, &self.amount)?;
        Ok(ActionOutcome::Updated)
    }

    fn describe(&self, ctx: ActionContext<'_>, registry: &Registry) -> String {
        format!("{} for {}", self.amount, nickname(registry, ctx.creator))
    }
}

/// Moves resources from the creator to the target player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResources {
    pub amount: ResourceAmount,
}

impl TransferResources {
    pub fn new(amount: ResourceAmount) -> Self {
        Self { amount }
    }

    /// Change to the creator's pool. Quantities must be non-negative.
    fn debit(&self, creator: &PlayerName) -> Result<ResourceAmount, ActionError> {
        if let Some((resource, quantity)) = self.amount.iter().find(|(_, quantity)| *quantity < 0) {
            return Err(ActionError::NegativeTransfer {
                resource: resource.to_string(),
                quantity,
            });
        }
        self.amount
            .checked_negated()
            .ok_or_else(|| ActionError::ResourceOverflow {
                player: creator.clone(),
                resource: self.amount.to_string(),
            })
    }
}

impl ActionTransition for TransferResources {
    fn validate(&self, ctx: ActionContext<'_>, registry: &Registry) -> Result<(), ActionError> {
        let target = ctx.require_target()?;
        if target == ctx.creator {
            return Err(ActionError::SelfTransfer {
                player: target.clone(),
            });
        }
        ensure_applicable(registry, ctx.creator, &self.debit(ctx.creator)?)?;
        ensure_applicable(registry, target, &self.amount)
    }

    fn apply(
        &self,
        ctx: ActionContext<'_>,
        registry: &mut Registry,
    ) -> Result<ActionOutcome, ActionError> {
        let target = ctx.require_target()?;
        let debit = self.debit(ctx.creator)?;
        credit(registry, ctx.creator, &debit)?;
        credit(registry, target, &self.amount)?;
        Ok(ActionOutcome::Updated)
    }

    fn describe(&self, ctx: ActionContext<'_>, registry: &Registry) -> String {
        let to = ctx
            .target
            .map(|target| nickname(registry, target))
            .unwrap_or_else(|| "nobody".to_string());
        format!(
            "{} from {} to {}",
            self.amount,
            nickname(registry, ctx.creator),
            to
        )
    }
}
