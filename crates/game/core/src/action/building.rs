//! Placement, construction and ship production on planets.
//!
//! Every variant requires the creator to own the planet the building stands
//! on. Ownership is checked at validation time only; capturing a planet hands
//! its buildings over unchanged.

use serde::{Deserialize, Serialize};

use super::{ActionContext, ActionError, ActionOutcome, ActionTransition, nickname};
use crate::state::{
    Building, BuildingType, EntityId, PlayerName, ProductionError, Prop, Registry, ShipType,
};

fn owned_planet<'a>(
    registry: &'a Registry,
    planet: EntityId,
    player: &PlayerName,
) -> Result<&'a Prop, ActionError> {
    let prop = registry.planet(planet)?;
    if !prop.is_owned_by(player) {
        return Err(ActionError::NotOwner {
            entity: planet,
            player: player.clone(),
        });
    }
    Ok(prop)
}

fn owned_building<'a>(
    registry: &'a Registry,
    building: EntityId,
    player: &PlayerName,
) -> Result<&'a Building, ActionError> {
    let found = registry.building(building)?;
    owned_planet(registry, found.planet, player)?;
    Ok(found)
}

/// Places a new building on one of the creator's planets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceBuilding {
    pub planet: EntityId,
    pub building: BuildingType,
}

impl ActionTransition for PlaceBuilding {
    fn validate(&self, ctx: ActionContext<'_>, registry: &Registry) -> Result<(), ActionError> {
        owned_planet(registry, self.planet, ctx.creator)?;
        if self.building.build_time == 0 {
            return Err(ActionError::ZeroBuildTime(self.building.name.clone()));
        }
        Ok(())
    }

    fn apply(
        &self,
        _ctx: ActionContext<'_>,
        registry: &mut Registry,
    ) -> Result<ActionOutcome, ActionError> {
        let id = registry.allocate_id()?;
        registry.register_building(Building::new(id, self.planet, self.building.clone()))?;
        Ok(ActionOutcome::Spawned(id))
    }

    fn describe(&self, ctx: ActionContext<'_>, registry: &Registry) -> String {
        format!(
            "{} places {} on planet {}",
            nickname(registry, ctx.creator),
            self.building.name,
            self.planet
        )
    }
}

/// Removes a building from the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RazeBuilding {
    pub building: EntityId,
}

impl ActionTransition for RazeBuilding {
    fn validate(&self, ctx: ActionContext<'_>, registry: &Registry) -> Result<(), ActionError> {
        owned_building(registry, self.building, ctx.creator)?;
        Ok(())
    }

    fn apply(
        &self,
        _ctx: ActionContext<'_>,
        registry: &mut Registry,
    ) -> Result<ActionOutcome, ActionError> {
        registry.deregister_building(self.building)?;
        Ok(ActionOutcome::Removed(self.building))
    }

    fn describe(&self, ctx: ActionContext<'_>, registry: &Registry) -> String {
        format!(
            "{} razes building {}",
            nickname(registry, ctx.creator),
            self.building
        )
    }
}

/// Advances construction of a building by one increment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementBuildProgress {
    pub building: EntityId,
}

impl ActionTransition for IncrementBuildProgress {
    fn validate(&self, ctx: ActionContext<'_>, registry: &Registry) -> Result<(), ActionError> {
        let building = owned_building(registry, self.building, ctx.creator)?;
        if building.is_complete() {
            return Err(ActionError::AlreadyComplete(self.building));
        }
        Ok(())
    }

    fn apply(
        &self,
        _ctx: ActionContext<'_>,
        registry: &mut Registry,
    ) -> Result<ActionOutcome, ActionError> {
        if registry.building_mut(self.building)?.advance_construction() {
            return Ok(ActionOutcome::Completed);
        }
        Ok(ActionOutcome::Updated)
    }

    fn describe(&self, _ctx: ActionContext<'_>, registry: &Registry) -> String {
        match registry.building(self.building) {
            Ok(building) => format!(
                "build {} {} ({}/{})",
                building.kind.name,
                self.building,
                building.progress(),
                building.kind.build_time
            ),
            Err(_) => format!("build {}", self.building),
        }
    }
}

/// Queues a ship on a completed, idle building.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartShipProduction {
    pub building: EntityId,
    pub ship_type: ShipType,
    pub turns: u32,
}

impl ActionTransition for StartShipProduction {
    fn validate(&self, ctx: ActionContext<'_>, registry: &Registry) -> Result<(), ActionError> {
        owned_building(registry, self.building, ctx.creator)?.check_start_production(self.turns)?;
        Ok(())
    }

    fn apply(
        &self,
        _ctx: ActionContext<'_>,
        registry: &mut Registry,
    ) -> Result<ActionOutcome, ActionError> {
        registry
            .building_mut(self.building)?
            .start_production(self.ship_type.clone(), self.turns)?;
        Ok(ActionOutcome::Updated)
    }

    fn describe(&self, ctx: ActionContext<'_>, registry: &Registry) -> String {
        format!(
            "{} starts a {} at {} ({} turns)",
            nickname(registry, ctx.creator),
            self.ship_type,
            self.building,
            self.turns
        )
    }
}

/// Runs one production turn; the finished ship appears at the planet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceShipProduction {
    pub building: EntityId,
}

impl ActionTransition for AdvanceShipProduction {
    fn validate(&self, ctx: ActionContext<'_>, registry: &Registry) -> Result<(), ActionError> {
        let building = owned_building(registry, self.building, ctx.creator)?;
        if building.production().is_idle() {
            return Err(ProductionError::Idle(self.building).into());
        }
        Ok(())
    }

    fn apply(
        &self,
        ctx: ActionContext<'_>,
        registry: &mut Registry,
    ) -> Result<ActionOutcome, ActionError> {
        let planet = registry.building(self.building)?.planet;
        let position = registry.prop(planet)?.position;

        let Some(ship_type) = registry.building_mut(self.building)?.advance_production()? else {
            return Ok(ActionOutcome::Updated);
        };
        let id = registry.allocate_id()?;
        registry.register_prop(Prop::ship(id, ship_type, ctx.creator.clone(), position))?;
        Ok(ActionOutcome::Spawned(id))
    }

    fn describe(&self, _ctx: ActionContext<'_>, registry: &Registry) -> String {
        match registry.building(self.building).map(Building::production) {
            Ok(crate::state::ShipProduction::Producing {
                ship_type,
                remaining,
            }) => format!(
                "produce {ship_type} at {} ({remaining} turns left)",
                self.building
            ),
            _ => format!("produce at {}", self.building),
        }
    }
}
