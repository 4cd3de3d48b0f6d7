//! Action errors.
//!
//! [`ActionError::IllegalAction`] is the only exceptional case: the action
//! could not be constructed from its value tree. Every other variant describes
//! a well-formed action that is not valid against the current registry, which
//! turns report as a skip.

use crate::error::{ErrorSeverity, GameError};
use crate::json::JsonError;
use crate::state::{EntityId, PlayerName, ProductionError, RegistryError, ResearchError};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The value tree does not describe an action.
    #[error("illegal action: {0}")]
    IllegalAction(JsonError),

    /// A player, prop or building reference did not resolve.
    #[error(transparent)]
    Unresolved(#[from] RegistryError),

    #[error("player {0} has been defeated")]
    CreatorDefeated(PlayerName),

    #[error("action requires a target player")]
    MissingTarget,

    #[error("player {player} cannot transfer resources to itself")]
    SelfTransfer { player: PlayerName },

    /// Applying the change would drive a resource negative.
    #[error("{player} has {available} {resource}, cannot apply {change}")]
    InsufficientResources {
        player: PlayerName,
        resource: String,
        available: i64,
        change: i64,
    },

    /// Applying the change would push a resource past the representable range.
    #[error("{resource} of {player} would overflow")]
    ResourceOverflow { player: PlayerName, resource: String },

    #[error("transfer of {resource} must not be negative (got {quantity})")]
    NegativeTransfer { resource: String, quantity: i64 },

    #[error(transparent)]
    Research(#[from] ResearchError),

    #[error(transparent)]
    Production(#[from] ProductionError),

    #[error("{entity} is not controlled by {player}")]
    NotOwner { entity: EntityId, player: PlayerName },

    #[error("prop {0} is not a ship")]
    NotAShip(EntityId),

    #[error("building type {0} has no build time")]
    ZeroBuildTime(String),

    #[error("building {0} is already complete")]
    AlreadyComplete(EntityId),

    #[error("planet {0} is already owned by the creator")]
    AlreadyOwned(EntityId),

    #[error("{player} has no ship in orbit of planet {planet}")]
    NoShipInOrbit { player: PlayerName, planet: EntityId },
}

impl GameError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ActionError::Unresolved(error) => error.severity(),
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ActionError::IllegalAction(_) => "ACTION_ILLEGAL",
            ActionError::Unresolved(error) => error.error_code(),
            ActionError::CreatorDefeated(_) => "ACTION_CREATOR_DEFEATED",
            ActionError::MissingTarget => "ACTION_MISSING_TARGET",
            ActionError::SelfTransfer { .. } => "ACTION_SELF_TRANSFER",
            ActionError::InsufficientResources { .. } => "ACTION_INSUFFICIENT_RESOURCES",
            ActionError::ResourceOverflow { .. } => "ACTION_RESOURCE_OVERFLOW",
            ActionError::NegativeTransfer { .. } => "ACTION_NEGATIVE_TRANSFER",
            ActionError::Research(error) => error.error_code(),
            ActionError::Production(error) => error.error_code(),
            ActionError::NotOwner { .. } => "ACTION_NOT_OWNER",
            ActionError::NotAShip(_) => "ACTION_NOT_A_SHIP",
            ActionError::ZeroBuildTime(_) => "ACTION_ZERO_BUILD_TIME",
            ActionError::AlreadyComplete(_) => "ACTION_ALREADY_COMPLETE",
            ActionError::AlreadyOwned(_) => "ACTION_ALREADY_OWNED",
            ActionError::NoShipInOrbit { .. } => "ACTION_NO_SHIP_IN_ORBIT",
        }
    }
}
