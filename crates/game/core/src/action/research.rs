use serde::{Deserialize, Serialize};

use super::{ActionContext, ActionError, ActionOutcome, ActionTransition, nickname};
use crate::state::{Registry, ResearchId};

/// Advances the creator's progress on a research node by one unit.
///
/// Only the node's ID travels with the action. Cost and prerequisites come
/// from the registry's tech tree, so gating never depends on client data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementResearch {
    pub research: ResearchId,
}

impl IncrementResearch {
    pub fn new(research: impl Into<ResearchId>) -> Self {
        Self {
            research: research.into(),
        }
    }
}

impl ActionTransition for IncrementResearch {
    fn validate(&self, ctx: ActionContext<'_>, registry: &Registry) -> Result<(), ActionError> {
        let node = registry.research(&self.research)?;
        registry.player(ctx.creator)?.research.check(node)?;
        Ok(())
    }

    fn apply(
        &self,
        ctx: ActionContext<'_>,
        registry: &mut Registry,
    ) -> Result<ActionOutcome, ActionError> {
        let node = registry.research(&self.research)?.clone();
        let player = registry.player_mut(ctx.creator)?;
        if player.research.advance(&node) {
            return Ok(ActionOutcome::Completed);
        }
        Ok(ActionOutcome::Updated)
    }

    fn describe(&self, ctx: ActionContext<'_>, registry: &Registry) -> String {
        format!(
            "research {} for {}",
            self.research,
            nickname(registry, ctx.creator)
        )
    }
}
