//! Player-issued state mutations.
//!
//! An [`Action`] pairs a creator (and optional target player) with an
//! [`ActionKind`], a closed set of variants that each carry their own payload.
//! Every variant implements [`ActionTransition`], supplying only its own
//! validation and mutation. The shared checks in [`pre_validate`] are composed
//! in front of them by the engine driver, so no variant can skip them.
//!
//! - `player`: resource actions (`ReceiveIncome`, `TransferResources`)
//! - `research`: `IncrementResearch`
//! - `building`: placement, construction and ship production
//! - `fleet`: ship and planet control

mod building;
mod error;
mod fleet;
mod player;
mod research;

pub use building::{
    AdvanceShipProduction, IncrementBuildProgress, PlaceBuilding, RazeBuilding,
    StartShipProduction,
};
pub use error::ActionError;
pub use fleet::{CapturePlanet, DestroyShip};
pub use player::{ReceiveIncome, TransferResources};
pub use research::IncrementResearch;

use serde::{Deserialize, Serialize};

use crate::engine::{self, ExecuteError, GameEngine};
use crate::json::{Json, Serializable};
use crate::state::{EntityId, PlayerName, Registry};

/// Resolved identities an action runs on behalf of.
#[derive(Clone, Copy, Debug)]
pub struct ActionContext<'a> {
    pub creator: &'a PlayerName,
    pub target: Option<&'a PlayerName>,
}

impl<'a> ActionContext<'a> {
    pub fn require_target(&self) -> Result<&'a PlayerName, ActionError> {
        self.target.ok_or(ActionError::MissingTarget)
    }
}

/// What a successful execution did to the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "id", rename_all = "snake_case")]
pub enum ActionOutcome {
    Updated,
    /// A research node or building construction finished.
    Completed,
    Spawned(EntityId),
    Removed(EntityId),
}

/// Per-variant hooks of the two-phase contract.
///
/// `validate` runs against the registry **before** mutation and must stay
/// side-effect free. `apply` may assume that both the shared pre-validation
/// and `validate` passed against the same registry.
pub trait ActionTransition {
    fn validate(&self, _ctx: ActionContext<'_>, _registry: &Registry) -> Result<(), ActionError> {
        Ok(())
    }

    fn apply(
        &self,
        ctx: ActionContext<'_>,
        registry: &mut Registry,
    ) -> Result<ActionOutcome, ActionError>;

    /// Human-readable summary rendered against the current registry.
    fn describe(&self, ctx: ActionContext<'_>, registry: &Registry) -> String;
}

/// Checks shared by every action: the creator exists and is still playing,
/// and the target, when named, still resolves.
pub fn pre_validate(ctx: ActionContext<'_>, registry: &Registry) -> Result<(), ActionError> {
    let creator = registry.player(ctx.creator)?;
    if creator.defeated {
        return Err(ActionError::CreatorDefeated(creator.name.clone()));
    }
    if let Some(target) = ctx.target {
        registry.player(target)?;
    }
    Ok(())
}

/// Nickname for descriptions, falling back to the identity key.
pub(crate) fn nickname(registry: &Registry, name: &PlayerName) -> String {
    registry
        .player(name)
        .map(|player| player.nickname.clone())
        .unwrap_or_else(|_| name.to_string())
}

/// Action variants. Serialized with a `"type"` tag next to the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    ReceiveIncome(ReceiveIncome),
    TransferResources(TransferResources),
    IncrementResearch(IncrementResearch),
    IncrementBuildProgress(IncrementBuildProgress),
    PlaceBuilding(PlaceBuilding),
    RazeBuilding(RazeBuilding),
    StartShipProduction(StartShipProduction),
    AdvanceShipProduction(AdvanceShipProduction),
    DestroyShip(DestroyShip),
    CapturePlanet(CapturePlanet),
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn transition(&self) -> &dyn ActionTransition {
        match self {
            ActionKind::ReceiveIncome(action) => action,
            ActionKind::TransferResources(action) => action,
            ActionKind::IncrementResearch(action) => action,
            ActionKind::IncrementBuildProgress(action) => action,
            ActionKind::PlaceBuilding(action) => action,
            ActionKind::RazeBuilding(action) => action,
            ActionKind::StartShipProduction(action) => action,
            ActionKind::AdvanceShipProduction(action) => action,
            ActionKind::DestroyShip(action) => action,
            ActionKind::CapturePlanet(action) => action,
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for ActionKind {
                fn from(action: $variant) -> Self {
                    ActionKind::$variant(action)
                }
            }
        )*
    };
}

impl_from_variant!(
    ReceiveIncome,
    TransferResources,
    IncrementResearch,
    IncrementBuildProgress,
    PlaceBuilding,
    RazeBuilding,
    StartShipProduction,
    AdvanceShipProduction,
    DestroyShip,
    CapturePlanet,
);

/// A single proposed mutation of the registry.
///
/// Targets are kept by name. A name that no longer resolves is not a parse
/// error; it makes the action invalid when validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub creator: PlayerName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<PlayerName>,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Serializable for Action {}

impl Action {
    pub fn new(creator: impl Into<PlayerName>, kind: impl Into<ActionKind>) -> Self {
        Self {
            creator: creator.into(),
            target: None,
            kind: kind.into(),
        }
    }

    #[must_use]
    pub fn targeting(mut self, target: impl Into<PlayerName>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Builds an action from a value tree, failing with
    /// [`ActionError::IllegalAction`] when the tree is malformed.
    pub fn parse(json: &Json) -> Result<Self, ActionError> {
        Self::from_json(json).map_err(ActionError::IllegalAction)
    }

    pub fn context(&self) -> ActionContext<'_> {
        ActionContext {
            creator: &self.creator,
            target: self.target.as_ref(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Runs shared and variant validation without touching the registry.
    pub fn validate(&self, registry: &Registry) -> Result<(), ActionError> {
        engine::check_action(self, registry).map_err(|error| error.error)
    }

    pub fn is_valid(&self, registry: &Registry) -> bool {
        self.validate(registry).is_ok()
    }

    /// Validates and, only if valid, applies the action.
    pub fn execute(&self, registry: &mut Registry) -> Result<ActionOutcome, ExecuteError> {
        GameEngine::new(registry).execute(self)
    }

    pub fn describe(&self, registry: &Registry) -> String {
        self.kind.transition().describe(self.context(), registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Player, ResourceAmount};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .add_player(
                Player::new("alice", "Alice")
                    .with_resources(ResourceAmount::from_iter([("metal", 10)])),
            )
            .unwrap();
        registry
    }

    fn income(quantity: i64) -> Action {
        Action::new(
            "alice",
            ReceiveIncome {
                amount: ResourceAmount::from_iter([("metal", quantity)]),
            },
        )
    }

    #[test]
    fn serializes_with_type_tag_and_flat_payload() {
        let json = income(5).targeting("alice").to_json();
        assert_eq!(
            json.render(),
            r#"{"creator":"alice","target":"alice","type":"receive_income","amount":{"metal":5}}"#
        );
        assert_eq!(Action::parse(&json).unwrap(), income(5).targeting("alice"));
    }

    #[test]
    fn malformed_tree_is_illegal_action() {
        let json = Json::parse(r#"{"creator":"alice","type":"summon_dragon"}"#).unwrap();
        assert!(matches!(
            Action::parse(&json),
            Err(ActionError::IllegalAction(_))
        ));

        let json = Json::parse(r#"{"type":"receive_income","amount":{}}"#).unwrap();
        assert!(matches!(
            Action::parse(&json),
            Err(ActionError::IllegalAction(_))
        ));
    }

    #[test]
    fn dangling_target_parses_but_is_invalid() {
        let json = Json::parse(
            r#"{"creator":"alice","target":"zed","type":"receive_income","amount":{"metal":1}}"#,
        )
        .unwrap();
        let action = Action::parse(&json).unwrap();

        assert_eq!(
            action.validate(&registry()),
            Err(ActionError::Unresolved(
                crate::state::RegistryError::PlayerNotFound("zed".into())
            ))
        );
    }

    #[test]
    fn defeated_creator_cannot_act() {
        let mut registry = registry();
        registry.mark_defeated(&"alice".into()).unwrap();
        assert_eq!(
            income(1).validate(&registry),
            Err(ActionError::CreatorDefeated("alice".into()))
        );
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(income(1).name(), "receive_income");
    }
}
