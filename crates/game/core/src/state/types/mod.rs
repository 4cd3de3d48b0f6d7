pub mod building;
pub mod common;
pub mod player;
pub mod prop;
pub mod research;
pub mod resources;

pub use building::{
    Building, BuildingType, Construction, ProductionError, ShipProduction, ShipType,
};
pub use common::{Dimension, EntityId, Position};
pub use player::{Player, PlayerName};
pub use prop::{Prop, PropKind};
pub use research::{Research, ResearchError, ResearchId, ResearchProgress};
pub use resources::ResourceAmount;
