//! Deterministic simulation rules shared by the server and every client.
//!
//! `stellar-core` defines the value tree used for every persisted or
//! transmitted entity, the authoritative [`Registry`], the [`Action`] set and
//! the [`Turn`] that batches them. All registry mutation by players flows
//! through [`engine::GameEngine`]; the crate performs no I/O.
pub mod action;
pub mod engine;
pub mod error;
pub mod json;
pub mod state;
pub mod turn;

pub use action::{
    Action, ActionContext, ActionError, ActionKind, ActionOutcome, ActionTransition,
    AdvanceShipProduction, CapturePlanet, DestroyShip, IncrementBuildProgress, IncrementResearch,
    PlaceBuilding, RazeBuilding, ReceiveIncome, StartShipProduction, TransferResources,
};
pub use engine::{ExecuteError, GameEngine, TransitionPhase};
pub use error::{ErrorSeverity, GameError};
pub use json::{ContentHash, Json, JsonError, JsonTag, Serializable};
pub use state::{
    Building, BuildingType, Construction, Dimension, EntityId, Player, PlayerName, Position,
    ProductionError, Prop, PropKind, Registry, RegistryError, RegistrySnapshot, Research,
    ResearchError, ResearchId, ResearchProgress, ResourceAmount, ShipProduction, ShipType,
};
pub use turn::{AppliedAction, SkippedAction, Turn, TurnNumber, TurnReport};
