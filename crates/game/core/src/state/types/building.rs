//! Planet-bound facilities and their production state machines.
//!
//! A building runs two independent machines. Construction moves from
//! [`Construction::UnderConstruction`] to the terminal [`Construction::Complete`]
//! once progress reaches the build time. Once complete, the building may hold
//! a single ship job in [`ShipProduction`]. Both transitions are pure functions
//! returning the next state; [`Building`] only swaps the value in.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::error::{ErrorSeverity, GameError};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipType(pub String);

impl From<&str> for ShipType {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ShipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static descriptor of a building type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingType {
    pub name: String,
    /// Increments needed to finish construction.
    pub build_time: u32,
}

impl BuildingType {
    pub fn new(name: impl Into<String>, build_time: u32) -> Self {
        Self {
            name: name.into(),
            build_time,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Construction {
    UnderConstruction { progress: u32 },
    Complete,
}

impl Construction {
    pub const STARTED: Self = Self::UnderConstruction { progress: 0 };

    /// State after one more increment. `Complete` is absorbing.
    #[must_use]
    pub fn advanced(self, build_time: u32) -> Self {
        match self {
            Self::UnderConstruction { progress } if progress + 1 >= build_time => Self::Complete,
            Self::UnderConstruction { progress } => Self::UnderConstruction {
                progress: progress + 1,
            },
            Self::Complete => Self::Complete,
        }
    }

    pub fn progress(self, build_time: u32) -> u32 {
        match self {
            Self::UnderConstruction { progress } => progress,
            Self::Complete => build_time,
        }
    }

    pub fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ShipProduction {
    #[default]
    Idle,
    Producing {
        ship_type: ShipType,
        remaining: u32,
    },
}

impl ShipProduction {
    /// State after one production turn, plus the ship finished by it.
    ///
    /// Advancing `Idle` stays `Idle` and yields nothing.
    #[must_use]
    pub fn advanced(self) -> (Self, Option<ShipType>) {
        match self {
            Self::Idle => (Self::Idle, None),
            Self::Producing {
                ship_type,
                remaining,
            } if remaining <= 1 => (Self::Idle, Some(ship_type)),
            Self::Producing {
                ship_type,
                remaining,
            } => (
                Self::Producing {
                    ship_type,
                    remaining: remaining - 1,
                },
                None,
            ),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Why a ship job cannot be started or advanced.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProductionError {
    #[error("building {0} is still under construction")]
    NotComplete(EntityId),

    #[error("building {building} is already producing {ship_type}")]
    AlreadyProducing {
        building: EntityId,
        ship_type: ShipType,
    },

    #[error("ship production needs at least one turn")]
    ZeroTurns,

    #[error("building {0} has no ship in production")]
    Idle(EntityId),
}

impl GameError for ProductionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            ProductionError::NotComplete(_) => "PRODUCTION_NOT_COMPLETE",
            ProductionError::AlreadyProducing { .. } => "PRODUCTION_ALREADY_PRODUCING",
            ProductionError::ZeroTurns => "PRODUCTION_ZERO_TURNS",
            ProductionError::Idle(_) => "PRODUCTION_IDLE",
        }
    }
}

/// A facility placed on a planet.
///
/// `planet` is a lookup key into the registry, not an owning link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub id: EntityId,
    pub planet: EntityId,
    pub kind: BuildingType,
    construction: Construction,
    #[serde(default)]
    production: ShipProduction,
}

impl Building {
    pub fn new(id: EntityId, planet: EntityId, kind: BuildingType) -> Self {
        let construction = if kind.build_time == 0 {
            Construction::Complete
        } else {
            Construction::STARTED
        };
        Self {
            id,
            planet,
            kind,
            construction,
            production: ShipProduction::Idle,
        }
    }

    /// Restores a building with existing construction progress.
    pub fn with_progress(id: EntityId, planet: EntityId, kind: BuildingType, progress: u32) -> Self {
        let construction = if progress >= kind.build_time {
            Construction::Complete
        } else {
            Construction::UnderConstruction { progress }
        };
        Self {
            id,
            planet,
            kind,
            construction,
            production: ShipProduction::Idle,
        }
    }

    pub fn construction(&self) -> Construction {
        self.construction
    }

    pub fn production(&self) -> &ShipProduction {
        &self.production
    }

    pub fn progress(&self) -> u32 {
        self.construction.progress(self.kind.build_time)
    }

    pub fn is_complete(&self) -> bool {
        self.construction.is_complete()
    }

    /// Advances construction by one. Returns true only on the increment that
    /// completes the building; calls afterwards change nothing.
    pub fn advance_construction(&mut self) -> bool {
        let was_complete = self.is_complete();
        self.construction = self.construction.advanced(self.kind.build_time);
        !was_complete && self.is_complete()
    }

    pub fn check_start_production(&self, turns: u32) -> Result<(), ProductionError> {
        if !self.is_complete() {
            return Err(ProductionError::NotComplete(self.id));
        }
        if let ShipProduction::Producing { ship_type, .. } = &self.production {
            return Err(ProductionError::AlreadyProducing {
                building: self.id,
                ship_type: ship_type.clone(),
            });
        }
        if turns == 0 {
            return Err(ProductionError::ZeroTurns);
        }
        Ok(())
    }

    pub fn start_production(&mut self, ship_type: ShipType, turns: u32) -> Result<(), ProductionError> {
        self.check_start_production(turns)?;
        self.production = ShipProduction::Producing {
            ship_type,
            remaining: turns,
        };
        Ok(())
    }

    /// Runs one production turn, returning the ship type when it finishes.
    pub fn advance_production(&mut self) -> Result<Option<ShipType>, ProductionError> {
        if self.production.is_idle() {
            return Err(ProductionError::Idle(self.id));
        }
        let (next, finished) = std::mem::take(&mut self.production).advanced();
        self.production = next;
        Ok(finished)
    }

    /// Remaining turns for an in-flight job producing `ship_type`.
    pub fn ship_progress(&self, ship_type: &ShipType) -> Option<u32> {
        match &self.production {
            ShipProduction::Producing {
                ship_type: current,
                remaining,
            } if current == ship_type => Some(*remaining),
            _ => None,
        }
    }
}
