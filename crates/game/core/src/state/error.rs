//! Registry errors.
//!
//! Lookups that miss are ordinary validation failures; action validation turns
//! them into an invalid action. Double registration and deregistering a
//! missing building mean the registry and its callers have diverged and are
//! classified as fatal.

use crate::error::{ErrorSeverity, GameError};
use crate::state::{EntityId, PlayerName, ResearchId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// An entity with this ID is already registered.
    #[error("entity {0} is already registered")]
    DuplicateId(EntityId),

    /// Deregistration named a building that is not registered.
    #[error("cannot deregister building {0}: not registered")]
    DeregisterMissing(EntityId),

    /// The ID was never issued by this registry's allocator.
    #[error("entity {id} was not allocated by this registry (next id {next})")]
    IdNotAllocated { id: EntityId, next: u64 },

    #[error("building {0} not found")]
    BuildingNotFound(EntityId),

    #[error("prop {0} not found")]
    PropNotFound(EntityId),

    #[error("player {0} not found")]
    PlayerNotFound(PlayerName),

    #[error("player {0} already exists")]
    DuplicatePlayer(PlayerName),

    #[error("prop {0} is not a planet")]
    NotAPlanet(EntityId),

    #[error("planet {0} still has buildings")]
    PlanetHasBuildings(EntityId),

    #[error("prop {id} is owned by unknown player {owner}")]
    UnknownOwner { id: EntityId, owner: PlayerName },

    /// The allocator has issued every representable ID.
    #[error("entity ids exhausted")]
    IdsExhausted,

    /// Construction progress at or past the build time must read as complete.
    #[error("building {id} is under construction at {progress}/{build_time}")]
    ProgressExceedsBuildTime {
        id: EntityId,
        progress: u32,
        build_time: u32,
    },

    /// A ship job on an unfinished building, or one with no turns left.
    #[error("building {0} holds a ship job it cannot run")]
    InvalidProduction(EntityId),

    #[error("research {0} not found")]
    ResearchNotFound(ResearchId),

    #[error("research {0} is already in the tech tree")]
    DuplicateResearch(ResearchId),

    /// Prerequisites must be registered before the nodes that need them.
    #[error("research {research} requires unknown research {missing}")]
    UnknownPrerequisite {
        research: ResearchId,
        missing: ResearchId,
    },
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::BuildingNotFound(_)
                | RegistryError::PropNotFound(_)
                | RegistryError::PlayerNotFound(_)
                | RegistryError::ResearchNotFound(_)
        )
    }
}

impl GameError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RegistryError::DuplicateId(_) | RegistryError::DeregisterMissing(_) => {
                ErrorSeverity::Fatal
            }
            RegistryError::IdNotAllocated { .. } | RegistryError::IdsExhausted => {
                ErrorSeverity::Internal
            }
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RegistryError::DuplicateId(_) => "REGISTRY_DUPLICATE_ID",
            RegistryError::DeregisterMissing(_) => "REGISTRY_DEREGISTER_MISSING",
            RegistryError::IdNotAllocated { .. } => "REGISTRY_ID_NOT_ALLOCATED",
            RegistryError::BuildingNotFound(_) => "REGISTRY_BUILDING_NOT_FOUND",
            RegistryError::PropNotFound(_) => "REGISTRY_PROP_NOT_FOUND",
            RegistryError::PlayerNotFound(_) => "REGISTRY_PLAYER_NOT_FOUND",
            RegistryError::DuplicatePlayer(_) => "REGISTRY_DUPLICATE_PLAYER",
            RegistryError::NotAPlanet(_) => "REGISTRY_NOT_A_PLANET",
            RegistryError::PlanetHasBuildings(_) => "REGISTRY_PLANET_HAS_BUILDINGS",
            RegistryError::UnknownOwner { .. } => "REGISTRY_UNKNOWN_OWNER",
            RegistryError::IdsExhausted => "REGISTRY_IDS_EXHAUSTED",
            RegistryError::ProgressExceedsBuildTime { .. } => {
                "REGISTRY_PROGRESS_EXCEEDS_BUILD_TIME"
            }
            RegistryError::InvalidProduction(_) => "REGISTRY_INVALID_PRODUCTION",
            RegistryError::ResearchNotFound(_) => "REGISTRY_RESEARCH_NOT_FOUND",
            RegistryError::DuplicateResearch(_) => "REGISTRY_DUPLICATE_RESEARCH",
            RegistryError::UnknownPrerequisite { .. } => "REGISTRY_UNKNOWN_PREREQUISITE",
        }
    }
}
