use serde::{Deserialize, Serialize};

use super::{Dimension, EntityId, PlayerName, Position, ShipType};

/// What a prop is, with the payload specific to that kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropKind {
    Ship { ship_type: ShipType },
    Planet { name: String },
}

/// Positioned game object tracked by the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prop {
    pub id: EntityId,
    /// `None` when unowned.
    pub owner: Option<PlayerName>,
    pub position: Position,
    #[serde(default)]
    pub dimension: Dimension,
    #[serde(flatten)]
    pub kind: PropKind,
}

impl Prop {
    pub fn planet(id: EntityId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            owner: None,
            position,
            dimension: Dimension::UNIT,
            kind: PropKind::Planet { name: name.into() },
        }
    }

    pub fn ship(id: EntityId, ship_type: ShipType, owner: PlayerName, position: Position) -> Self {
        Self {
            id,
            owner: Some(owner),
            position,
            dimension: Dimension::UNIT,
            kind: PropKind::Ship { ship_type },
        }
    }

    #[must_use]
    pub fn owned_by(mut self, owner: impl Into<PlayerName>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    #[must_use]
    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn is_planet(&self) -> bool {
        matches!(self.kind, PropKind::Planet { .. })
    }

    pub fn is_ship(&self) -> bool {
        matches!(self.kind, PropKind::Ship { .. })
    }

    pub fn is_owned_by(&self, player: &PlayerName) -> bool {
        self.owner.as_ref() == Some(player)
    }
}
