//! Authoritative game state.
//!
//! [`Registry`] is the single source of truth for what exists: players keyed
//! by name, props and buildings keyed by registry-issued [`EntityId`]s, and
//! the tech tree research actions are checked against. It is
//! passed explicitly to every engine and turn operation; runtime layers own
//! one instance each and never share it mutably.
mod error;
mod snapshot;
pub mod types;

use std::collections::BTreeMap;

pub use error::RegistryError;
pub use snapshot::RegistrySnapshot;
pub use types::{
    Building, BuildingType, Construction, Dimension, EntityId, Player, PlayerName, Position,
    ProductionError, Prop, PropKind, Research, ResearchError, ResearchId, ResearchProgress,
    ResourceAmount, ShipProduction, ShipType,
};

use crate::json::{ContentHash, Serializable};

/// Identity-indexed store of all live entities.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(into = "RegistrySnapshot", try_from = "RegistrySnapshot")]
pub struct Registry {
    /// Next ID the allocator will issue. Never decreases.
    next_id: u64,
    /// Players in join order.
    players: Vec<Player>,
    props: BTreeMap<EntityId, Prop>,
    buildings: BTreeMap<EntityId, Building>,
    /// Tech tree. Every prerequisite is itself a registered node.
    research: BTreeMap<ResearchId, Research>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            next_id: EntityId::FIRST.0,
            players: Vec::new(),
            props: BTreeMap::new(),
            buildings: BTreeMap::new(),
            research: BTreeMap::new(),
        }
    }
}

impl Serializable for Registry {}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Identity allocation
    // ------------------------------------------------------------------

    /// Issues the next ID. Shared by planets, ships and buildings; IDs are
    /// never reused, even after the entity is removed.
    pub fn allocate_id(&mut self) -> Result<EntityId, RegistryError> {
        let id = EntityId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(RegistryError::IdsExhausted)?;
        Ok(id)
    }

    /// ID the next call to [`Registry::allocate_id`] will return.
    pub fn peek_next_id(&self) -> EntityId {
        EntityId(self.next_id)
    }

    fn ensure_allocated(&self, id: EntityId) -> Result<(), RegistryError> {
        if id.0 == 0 || id.0 >= self.next_id {
            return Err(RegistryError::IdNotAllocated {
                id,
                next: self.next_id,
            });
        }
        Ok(())
    }

    fn ensure_unregistered(&self, id: EntityId) -> Result<(), RegistryError> {
        if self.props.contains_key(&id) || self.buildings.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    pub fn add_player(&mut self, player: Player) -> Result<(), RegistryError> {
        if self.has_player(&player.name) {
            return Err(RegistryError::DuplicatePlayer(player.name));
        }
        self.players.push(player);
        Ok(())
    }

    pub fn has_player(&self, name: &PlayerName) -> bool {
        self.players.iter().any(|player| &player.name == name)
    }

    pub fn player(&self, name: &PlayerName) -> Result<&Player, RegistryError> {
        self.players
            .iter()
            .find(|player| &player.name == name)
            .ok_or_else(|| RegistryError::PlayerNotFound(name.clone()))
    }

    pub fn player_mut(&mut self, name: &PlayerName) -> Result<&mut Player, RegistryError> {
        self.players
            .iter_mut()
            .find(|player| &player.name == name)
            .ok_or_else(|| RegistryError::PlayerNotFound(name.clone()))
    }

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn mark_defeated(&mut self, name: &PlayerName) -> Result<(), RegistryError> {
        self.player_mut(name)?.defeated = true;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Props
    // ------------------------------------------------------------------

    pub fn register_prop(&mut self, prop: Prop) -> Result<(), RegistryError> {
        self.ensure_allocated(prop.id)?;
        self.ensure_unregistered(prop.id)?;
        if let Some(owner) = &prop.owner
            && !self.has_player(owner)
        {
            return Err(RegistryError::UnknownOwner {
                id: prop.id,
                owner: owner.clone(),
            });
        }
        self.props.insert(prop.id, prop);
        Ok(())
    }

    /// Removes a prop. A planet that still carries buildings cannot be
    /// removed; raze them first.
    pub fn remove_prop(&mut self, id: EntityId) -> Result<Prop, RegistryError> {
        let prop = self.prop(id)?;
        if prop.is_planet() && self.buildings_on(id).next().is_some() {
            return Err(RegistryError::PlanetHasBuildings(id));
        }
        self.props
            .remove(&id)
            .ok_or(RegistryError::PropNotFound(id))
    }

    pub fn prop(&self, id: EntityId) -> Result<&Prop, RegistryError> {
        self.props.get(&id).ok_or(RegistryError::PropNotFound(id))
    }

    pub fn prop_mut(&mut self, id: EntityId) -> Result<&mut Prop, RegistryError> {
        self.props.get_mut(&id).ok_or(RegistryError::PropNotFound(id))
    }

    /// Resolves `id` to a planet.
    pub fn planet(&self, id: EntityId) -> Result<&Prop, RegistryError> {
        let prop = self.prop(id)?;
        if !prop.is_planet() {
            return Err(RegistryError::NotAPlanet(id));
        }
        Ok(prop)
    }

    pub fn props(&self) -> impl Iterator<Item = &Prop> {
        self.props.values()
    }

    pub fn planets_owned_by<'a>(&'a self, name: &'a PlayerName) -> impl Iterator<Item = &'a Prop> {
        self.props
            .values()
            .filter(move |prop| prop.is_planet() && prop.is_owned_by(name))
    }

    // ------------------------------------------------------------------
    // Buildings
    // ------------------------------------------------------------------

    /// Stores a building under its pre-assigned ID.
    ///
    /// The ID must come from this registry's allocator and must not be in
    /// use; the building's planet must be a registered planet.
    pub fn register_building(&mut self, building: Building) -> Result<(), RegistryError> {
        self.ensure_allocated(building.id)?;
        self.ensure_unregistered(building.id)?;
        self.planet(building.planet)?;
        ensure_consistent(&building)?;
        self.buildings.insert(building.id, building);
        Ok(())
    }

    /// Removes a building. Absence is an error surfaced to the caller.
    pub fn deregister_building(&mut self, id: EntityId) -> Result<Building, RegistryError> {
        self.buildings
            .remove(&id)
            .ok_or(RegistryError::DeregisterMissing(id))
    }

    pub fn building(&self, id: EntityId) -> Result<&Building, RegistryError> {
        self.buildings
            .get(&id)
            .ok_or(RegistryError::BuildingNotFound(id))
    }

    pub fn building_mut(&mut self, id: EntityId) -> Result<&mut Building, RegistryError> {
        self.buildings
            .get_mut(&id)
            .ok_or(RegistryError::BuildingNotFound(id))
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    pub fn buildings_on(&self, planet: EntityId) -> impl Iterator<Item = &Building> {
        self.buildings
            .values()
            .filter(move |building| building.planet == planet)
    }

    /// Player owning the planet a building sits on, if any.
    pub fn building_owner(&self, id: EntityId) -> Result<Option<&PlayerName>, RegistryError> {
        let building = self.building(id)?;
        Ok(self.prop(building.planet)?.owner.as_ref())
    }

    // ------------------------------------------------------------------
    // Tech tree
    // ------------------------------------------------------------------

    /// Adds a research node. Its prerequisites must already be registered,
    /// which keeps the tree acyclic.
    pub fn register_research(&mut self, research: Research) -> Result<(), RegistryError> {
        if self.research.contains_key(&research.id) {
            return Err(RegistryError::DuplicateResearch(research.id));
        }
        if let Some(missing) = research
            .prerequisites
            .iter()
            .find(|prerequisite| !self.research.contains_key(*prerequisite))
        {
            return Err(RegistryError::UnknownPrerequisite {
                research: research.id.clone(),
                missing: missing.clone(),
            });
        }
        self.research.insert(research.id.clone(), research);
        Ok(())
    }

    pub fn research(&self, id: &ResearchId) -> Result<&Research, RegistryError> {
        self.research
            .get(id)
            .ok_or_else(|| RegistryError::ResearchNotFound(id.clone()))
    }

    /// Tech-tree nodes, ordered by ID.
    pub fn research_nodes(&self) -> impl Iterator<Item = &Research> {
        self.research.values()
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot::from(self.clone())
    }

    /// Content hash of the canonical snapshot; equal registries hash equal.
    pub fn state_hash(&self) -> ContentHash {
        self.to_json().content_hash()
    }
}

/// Rejects construction and production states the transitions never produce.
fn ensure_consistent(building: &Building) -> Result<(), RegistryError> {
    if let Construction::UnderConstruction { progress } = building.construction()
        && progress >= building.kind.build_time
    {
        return Err(RegistryError::ProgressExceedsBuildTime {
            id: building.id,
            progress,
            build_time: building.kind.build_time,
        });
    }
    if let ShipProduction::Producing { remaining, .. } = building.production()
        && (!building.is_complete() || *remaining == 0)
    {
        return Err(RegistryError::InvalidProduction(building.id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorSeverity, GameError};

    fn registry_with_planet() -> (Registry, EntityId) {
        let mut registry = Registry::new();
        registry.add_player(Player::new("alice", "Alice")).unwrap();
        let planet = registry.allocate_id().unwrap();
        registry
            .register_prop(Prop::planet(planet, "Kepler", Position::ORIGIN).owned_by("alice"))
            .unwrap();
        (registry, planet)
    }

    #[test]
    fn allocator_never_issues_zero_and_never_repeats() {
        let mut registry = Registry::new();
        let first = registry.allocate_id().unwrap();
        let second = registry.allocate_id().unwrap();
        assert_eq!(first, EntityId(1));
        assert!(second > first);
    }

    #[test]
    fn double_registration_is_fatal() {
        let (mut registry, planet) = registry_with_planet();
        let id = registry.allocate_id().unwrap();
        let building = Building::new(id, planet, BuildingType::new("mine", 2));

        registry.register_building(building.clone()).unwrap();
        let error = registry.register_building(building).unwrap_err();

        assert_eq!(error, RegistryError::DuplicateId(id));
        assert_eq!(error.severity(), ErrorSeverity::Fatal);
    }

    #[test]
    fn deregistering_missing_building_is_an_error() {
        let (mut registry, _) = registry_with_planet();
        let error = registry.deregister_building(EntityId(42)).unwrap_err();
        assert_eq!(error, RegistryError::DeregisterMissing(EntityId(42)));
        assert_eq!(error.severity(), ErrorSeverity::Fatal);
    }

    #[test]
    fn unallocated_ids_are_rejected() {
        let (mut registry, planet) = registry_with_planet();
        let building = Building::new(EntityId(99), planet, BuildingType::new("mine", 2));
        assert!(matches!(
            registry.register_building(building),
            Err(RegistryError::IdNotAllocated { .. })
        ));
    }

    #[test]
    fn buildings_must_sit_on_planets() {
        let (mut registry, _) = registry_with_planet();
        let ship = registry.allocate_id().unwrap();
        registry
            .register_prop(Prop::ship(ship, "scout".into(), "alice".into(), Position::ORIGIN))
            .unwrap();
        let id = registry.allocate_id().unwrap();

        let error = registry
            .register_building(Building::new(id, ship, BuildingType::new("mine", 1)))
            .unwrap_err();
        assert_eq!(error, RegistryError::NotAPlanet(ship));
    }

    #[test]
    fn lookups_report_not_found() {
        let registry = Registry::new();
        assert!(registry.prop(EntityId(1)).unwrap_err().is_not_found());
        assert!(registry.player(&"bob".into()).unwrap_err().is_not_found());
    }

    #[test]
    fn planet_with_buildings_cannot_be_removed() {
        let (mut registry, planet) = registry_with_planet();
        let id = registry.allocate_id().unwrap();
        registry
            .register_building(Building::new(id, planet, BuildingType::new("mine", 1)))
            .unwrap();

        assert_eq!(
            registry.remove_prop(planet),
            Err(RegistryError::PlanetHasBuildings(planet))
        );
        registry.deregister_building(id).unwrap();
        assert!(registry.remove_prop(planet).is_ok());
    }

    #[test]
    fn props_need_known_owners() {
        let mut registry = Registry::new();
        let id = registry.allocate_id().unwrap();
        assert!(matches!(
            registry.register_prop(Prop::planet(id, "Vega", Position::ORIGIN).owned_by("ghost")),
            Err(RegistryError::UnknownOwner { .. })
        ));
    }

    #[test]
    fn snapshot_with_dangling_planet_is_rejected() {
        let (registry, planet) = registry_with_planet();
        let mut snapshot = registry.snapshot();
        let building = EntityId(snapshot.next_id);
        snapshot.next_id += 1;
        snapshot.buildings.push(Building::new(
            building,
            EntityId(planet.0 + 100),
            BuildingType::new("mine", 1),
        ));
        assert_eq!(
            Registry::try_from(snapshot),
            Err(RegistryError::PropNotFound(EntityId(planet.0 + 100)))
        );
    }

    #[test]
    fn exhausted_allocator_fails_instead_of_wrapping() {
        let mut snapshot = Registry::new().snapshot();
        snapshot.next_id = u64::MAX;
        let mut registry = Registry::try_from(snapshot).unwrap();

        assert_eq!(registry.allocate_id(), Err(RegistryError::IdsExhausted));
        assert_eq!(registry.peek_next_id(), EntityId(u64::MAX));
    }

    #[test]
    fn snapshot_with_progress_past_build_time_is_rejected() {
        let (mut registry, planet) = registry_with_planet();
        let id = registry.allocate_id().unwrap();
        let mut building =
            Building::with_progress(id, planet, BuildingType::new("mine", 10), 9);
        building.kind.build_time = 5;

        assert_eq!(
            registry.register_building(building),
            Err(RegistryError::ProgressExceedsBuildTime {
                id,
                progress: 9,
                build_time: 5,
            })
        );
        assert_eq!(registry.buildings().count(), 0);
    }

    #[test]
    fn ship_job_on_unfinished_building_is_rejected() {
        let (mut registry, planet) = registry_with_planet();
        let id = registry.allocate_id().unwrap();
        let building: Building = serde_json::from_value(serde_json::json!({
            "id": id.0,
            "planet": planet.0,
            "kind": { "name": "shipyard", "build_time": 3 },
            "construction": { "state": "under_construction", "progress": 1 },
            "production": { "state": "producing", "ship_type": "scout", "remaining": 2 },
        }))
        .unwrap();

        assert_eq!(
            registry.register_building(building),
            Err(RegistryError::InvalidProduction(id))
        );
    }

    #[test]
    fn tech_tree_needs_prerequisites_first_and_survives_snapshots() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.register_research(Research::new("shields", 2).requires("lasers")),
            Err(RegistryError::UnknownPrerequisite {
                research: "shields".into(),
                missing: "lasers".into(),
            })
        );

        registry.register_research(Research::new("lasers", 1)).unwrap();
        registry
            .register_research(Research::new("shields", 2).requires("lasers"))
            .unwrap();
        registry
            .register_research(Research::new("aegis", 4).requires("shields"))
            .unwrap();
        assert_eq!(
            registry.register_research(Research::new("lasers", 9)),
            Err(RegistryError::DuplicateResearch("lasers".into()))
        );

        let restored = Registry::try_from(registry.snapshot()).unwrap();
        assert_eq!(restored, registry);
        assert_eq!(restored.research(&"aegis".into()).unwrap().cost, 4);
    }
}
