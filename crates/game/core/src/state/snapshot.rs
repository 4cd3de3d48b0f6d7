//! Flat wire form of the registry.
//!
//! Entities are stored as arrays; buildings reference their planet by ID and
//! research nodes list prerequisites by ID, prerequisites first. Loading
//! replays every entry through the registry's own checks, so a snapshot with
//! dangling references or impossible building states never produces a
//! partially loaded registry.

use serde::{Deserialize, Serialize};

use super::{Building, Player, Prop, Registry, RegistryError, Research};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub next_id: u64,
    pub players: Vec<Player>,
    pub props: Vec<Prop>,
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub research: Vec<Research>,
}

impl From<Registry> for RegistrySnapshot {
    fn from(registry: Registry) -> Self {
        Self {
            next_id: registry.next_id,
            players: registry.players,
            props: registry.props.into_values().collect(),
            buildings: registry.buildings.into_values().collect(),
            research: topological(registry.research.into_values().collect()),
        }
    }
}

impl TryFrom<RegistrySnapshot> for Registry {
    type Error = RegistryError;

    fn try_from(snapshot: RegistrySnapshot) -> Result<Self, Self::Error> {
        let mut registry = Registry {
            next_id: snapshot.next_id.max(1),
            ..Registry::default()
        };
        for research in snapshot.research {
            registry.register_research(research)?;
        }
        for player in snapshot.players {
            registry.add_player(player)?;
        }
        for prop in snapshot.props {
            registry.register_prop(prop)?;
        }
        for building in snapshot.buildings {
            registry.register_building(building)?;
        }
        Ok(registry)
    }
}

/// Orders nodes so every prerequisite precedes the nodes requiring it.
/// Ties keep ID order, so equal trees render identically.
fn topological(mut pending: Vec<Research>) -> Vec<Research> {
    let mut ordered: Vec<Research> = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let before = pending.len();
        let (ready, blocked): (Vec<_>, Vec<_>) = pending.into_iter().partition(|node| {
            node.prerequisites
                .iter()
                .all(|prerequisite| ordered.iter().any(|done| &done.id == prerequisite))
        });
        ordered.extend(ready);
        pending = blocked;
        if pending.len() == before {
            // Unreachable for trees built through `register_research`.
            ordered.append(&mut pending);
        }
    }
    ordered
}
