use serde::{Deserialize, Serialize};

use super::{ActionContext, ActionError, ActionOutcome, ActionTransition, nickname};
use crate::state::{EntityId, Registry};

/// Scraps one of the creator's ships.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyShip {
    pub ship: EntityId,
}

impl ActionTransition for DestroyShip {
    fn validate(&self, ctx: ActionContext<'_>, registry: &Registry) -> Result<(), ActionError> {
        let prop = registry.prop(self.ship)?;
        if !prop.is_ship() {
            return Err(ActionError::NotAShip(self.ship));
        }
        if !prop.is_owned_by(ctx.creator) {
            return Err(ActionError::NotOwner {
                entity: self.ship,
                player: ctx.creator.clone(),
            });
        }
        Ok(())
    }

    fn apply(
        &self,
        _ctx: ActionContext<'_>,
        registry: &mut Registry,
    ) -> Result<ActionOutcome, ActionError> {
        registry.remove_prop(self.ship)?;
        Ok(ActionOutcome::Removed(self.ship))
    }

    fn describe(&self, ctx: ActionContext<'_>, registry: &Registry) -> String {
        format!("{} destroys ship {}", nickname(registry, ctx.creator), self.ship)
    }
}

/// Takes control of a planet the creator has a ship orbiting.
///
/// Buildings on the planet keep their construction and production state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturePlanet {
    pub planet: EntityId,
}

impl ActionTransition for CapturePlanet {
    fn validate(&self, ctx: ActionContext<'_>, registry: &Registry) -> Result<(), ActionError> {
        let planet = registry.planet(self.planet)?;
        if planet.is_owned_by(ctx.creator) {
            return Err(ActionError::AlreadyOwned(self.planet));
        }
        let in_orbit = registry.props().any(|prop| {
            prop.is_ship() && prop.is_owned_by(ctx.creator) && prop.position == planet.position
        });
        if !in_orbit {
            return Err(ActionError::NoShipInOrbit {
                player: ctx.creator.clone(),
                planet: self.planet,
            });
        }
        Ok(())
    }

    fn apply(
        &self,
        ctx: ActionContext<'_>,
        registry: &mut Registry,
    ) -> Result<ActionOutcome, ActionError> {
        registry.prop_mut(self.planet)?.owner = Some(ctx.creator.clone());
        Ok(ActionOutcome::Updated)
    }

    fn describe(&self, ctx: ActionContext<'_>, registry: &Registry) -> String {
        format!(
            "{} captures planet {}",
            nickname(registry, ctx.creator),
            self.planet
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, IncrementBuildProgress, PlaceBuilding};
    use crate::state::{BuildingType, Player, Position, Prop};

    fn setup() -> (Registry, EntityId) {
        let mut registry = Registry::new();
        registry.add_player(Player::new("alice", "Alice")).unwrap();
        registry.add_player(Player::new("bob", "Bob")).unwrap();
        let planet = registry.allocate_id().unwrap();
        registry
            .register_prop(Prop::planet(planet, "Vega", Position::new(1, 1)).owned_by("alice"))
            .unwrap();
        (registry, planet)
    }

    #[test]
    fn capture_requires_a_ship_in_orbit_and_keeps_buildings() {
        let (mut registry, planet) = setup();
        let outcome = Action::new(
            "alice",
            PlaceBuilding {
                planet,
                building: BuildingType::new("mine", 3),
            },
        )
        .execute(&mut registry)
        .unwrap();
        let ActionOutcome::Spawned(building) = outcome else {
            panic!("expected building, got {outcome:?}");
        };
        Action::new("alice", IncrementBuildProgress { building })
            .execute(&mut registry)
            .unwrap();

        let capture = Action::new("bob", CapturePlanet { planet });
        assert!(matches!(
            capture.validate(&registry),
            Err(ActionError::NoShipInOrbit { .. })
        ));

        let ship = registry.allocate_id().unwrap();
        registry
            .register_prop(Prop::ship(ship, "corvette".into(), "bob".into(), Position::new(1, 1)))
            .unwrap();
        capture.execute(&mut registry).unwrap();

        assert!(registry.prop(planet).unwrap().is_owned_by(&"bob".into()));
        assert_eq!(registry.building(building).unwrap().progress(), 1);
    }

    #[test]
    fn only_own_ships_can_be_destroyed() {
        let (mut registry, planet) = setup();
        let ship = registry.allocate_id().unwrap();
        registry
            .register_prop(Prop::ship(ship, "scout".into(), "alice".into(), Position::ORIGIN))
            .unwrap();

        assert!(matches!(
            Action::new("bob", DestroyShip { ship }).validate(&registry),
            Err(ActionError::NotOwner { .. })
        ));
        assert_eq!(
            Action::new("alice", DestroyShip { ship: planet }).validate(&registry),
            Err(ActionError::NotAShip(planet))
        );

        Action::new("alice", DestroyShip { ship })
            .execute(&mut registry)
            .unwrap();
        assert!(registry.prop(ship).is_err());
    }
}
