//! Long-press resolution.
//!
//! A single `Interact(cell)` can mean a dozen things. `classify_interaction`
//! picks exactly one, in fixed priority order, from a snapshot of what is on
//! the cell; `handle_interactions` then carries it out.

use bevy::prelude::*;

use super::{drop_carried, DrinkItem, PowerBreaker};
use crate::brewing::{create_drink, ingredients_from_stations, DrinkCreator, IngredientStation};
use crate::grid::GridWorld;
use crate::ritual::RitualSite;
use crate::shared::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionTarget {
    DropCarried,
    Breaker,
    Station(Entity),
    Door,
    DrinkCreator,
    Table(Entity),
    Ritual,
    PickUp(Entity),
    Nothing,
}

/// What occupies the interacted cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellContents {
    pub entity: Option<Entity>,
    pub is_breaker: bool,
    pub is_station: bool,
    pub is_creator: bool,
    pub is_table: bool,
    pub is_ritual: bool,
    pub carriable: bool,
}

pub fn classify_interaction(
    cell: GridCoordinate,
    barista: &Barista,
    contents: &CellContents,
) -> InteractionTarget {
    let carrying_drink = barista
        .carrying
        .as_ref()
        .is_some_and(|item| item.drink.is_some());

    if barista.carrying.is_some() && cell == barista.cell {
        return InteractionTarget::DropCarried;
    }
    if cell == BREAKER_CELL || contents.is_breaker {
        return InteractionTarget::Breaker;
    }
    if let (true, Some(entity)) = (contents.is_station, contents.entity) {
        return InteractionTarget::Station(entity);
    }
    if cell == DOOR_CELL {
        return InteractionTarget::Door;
    }
    if contents.is_creator {
        return InteractionTarget::DrinkCreator;
    }
    if let (true, true, Some(entity)) = (contents.is_table, carrying_drink, contents.entity) {
        return InteractionTarget::Table(entity);
    }
    if contents.is_ritual {
        return InteractionTarget::Ritual;
    }
    if let (true, Some(entity)) = (contents.carriable, contents.entity) {
        return InteractionTarget::PickUp(entity);
    }
    InteractionTarget::Nothing
}

pub fn handle_interactions(
    mut commands: Commands,
    mut events: EventReader<PlayerActionEvent>,
    mut grid: ResMut<GridWorld>,
    mut barista: ResMut<Barista>,
    book: Res<RecipeBook>,
    ritual: Res<RitualSite>,
    objects: Query<(&GameObject, Option<&DrinkItem>)>,
    markers: Query<(Has<PowerBreaker>, Has<DrinkCreator>)>,
    mut stations: Query<&mut IngredientStation>,
    mut tables: Query<&mut Table>,
    mut breaker_writer: EventWriter<ResetBreakerEvent>,
    mut forest_writer: EventWriter<EnterForestEvent>,
    mut drink_writer: EventWriter<DrinkCompletedEvent>,
    mut ritual_writer: EventWriter<RitualInteractionEvent>,
) {
    for ev in events.read() {
        let PlayerAction::Interact(cell) = ev.action else {
            continue;
        };

        let entity = grid.object_at(cell);
        let mut contents = CellContents {
            entity,
            is_ritual: ritual.is_ritual_cell(cell),
            ..default()
        };
        if let Some(entity) = entity {
            if let Ok((object, _)) = objects.get(entity) {
                contents.carriable = object.object_type.can_be_carried();
            }
            if let Ok((is_breaker, is_creator)) = markers.get(entity) {
                contents.is_breaker = is_breaker;
                contents.is_creator = is_creator;
            }
            contents.is_station = stations.contains(entity);
            contents.is_table = tables.contains(entity);
        }

        match classify_interaction(cell, &barista, &contents) {
            InteractionTarget::DropCarried => {
                if let Some(at) = drop_carried(&mut commands, &mut grid, &mut barista) {
                    info!("[Player] Put item down at {}", at);
                }
            }
            InteractionTarget::Breaker => {
                breaker_writer.send(ResetBreakerEvent);
            }
            InteractionTarget::Station(entity) => {
                if let Ok(mut station) = stations.get_mut(entity) {
                    station.interact();
                    debug!(
                        "[Player] {} station set to {}",
                        station.kind.display_name(),
                        station.level().display_name()
                    );
                }
            }
            InteractionTarget::Door => {
                forest_writer.send(EnterForestEvent);
            }
            InteractionTarget::DrinkCreator => {
                if barista.carrying.is_some() {
                    info!("[Player] Hands are full");
                    continue;
                }
                let ingredients = ingredients_from_stations(stations.iter());
                let drink = create_drink(ingredients, &book);
                for mut station in stations.iter_mut() {
                    station.reset_to_default();
                }
                info!(
                    "[Player] Took a drink: {} ({})",
                    drink.recipe_id.as_deref().unwrap_or("no recipe"),
                    drink.quality.map(|q| q.display_name()).unwrap_or("-")
                );
                if drink.complete {
                    drink_writer.send(DrinkCompletedEvent {
                        drink: drink.clone(),
                    });
                }
                barista.carrying = Some(CarriedItem {
                    object_type: drink.object_type(),
                    rotation: RotationState::North,
                    drink: Some(drink),
                });
            }
            InteractionTarget::Table(entity) => {
                let Ok(mut table) = tables.get_mut(entity) else {
                    continue;
                };
                if table.drink.is_some() {
                    info!("[Player] Table at {} already has a drink", cell);
                    continue;
                }
                if let Some(item) = barista.carrying.take() {
                    table.drink = item.drink;
                    info!("[Player] Served a drink at table {}", cell);
                }
            }
            InteractionTarget::Ritual => {
                let offering = barista.carrying.as_ref().and_then(|item| item.drink.clone());
                ritual_writer.send(RitualInteractionEvent { cell, offering });
            }
            InteractionTarget::PickUp(entity) => {
                if barista.carrying.is_some() {
                    info!("[Player] Hands are full");
                    continue;
                }
                let Ok((object, drink_item)) = objects.get(entity) else {
                    continue;
                };
                barista.carrying = Some(CarriedItem {
                    object_type: object.object_type,
                    rotation: object.rotation,
                    drink: drink_item.map(|d| d.drink.clone()),
                });
                grid.free_cell(cell);
                commands.entity(entity).despawn();
                info!("[Player] Picked up {:?} from {}", object.object_type, cell);
            }
            InteractionTarget::Nothing => {
                debug!("[Player] Nothing to do at {}", cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrying_drink() -> Barista {
        Barista {
            cell: CHARACTER_START,
            carrying: Some(CarriedItem {
                object_type: ObjectType::CompletedDrink,
                rotation: RotationState::North,
                drink: Some(Drink {
                    ingredients: vec![],
                    recipe_id: None,
                    quality: None,
                    complete: true,
                }),
            }),
        }
    }

    fn with(entity: u32) -> CellContents {
        CellContents {
            entity: Some(Entity::from_raw(entity)),
            ..Default::default()
        }
    }

    #[test]
    fn test_drop_on_own_cell_wins() {
        let barista = carrying_drink();
        let contents = CellContents {
            is_ritual: true,
            ..Default::default()
        };
        assert_eq!(
            classify_interaction(barista.cell, &barista, &contents),
            InteractionTarget::DropCarried
        );
        // Empty hands on own cell do nothing.
        assert_eq!(
            classify_interaction(CHARACTER_START, &Barista::default(), &CellContents::default()),
            InteractionTarget::Nothing
        );
    }

    #[test]
    fn test_fixed_cells() {
        let barista = Barista::default();
        assert_eq!(
            classify_interaction(BREAKER_CELL, &barista, &CellContents::default()),
            InteractionTarget::Breaker
        );
        assert_eq!(
            classify_interaction(DOOR_CELL, &barista, &CellContents::default()),
            InteractionTarget::Door
        );
    }

    #[test]
    fn test_station_beats_everything_but_breaker() {
        let barista = Barista::default();
        let contents = CellContents {
            is_station: true,
            is_ritual: true,
            ..with(7)
        };
        assert_eq!(
            classify_interaction(GridCoordinate::new(12, 15), &barista, &contents),
            InteractionTarget::Station(Entity::from_raw(7))
        );
    }

    #[test]
    fn test_table_needs_a_carried_drink() {
        let table = CellContents {
            is_table: true,
            ..with(3)
        };
        let cell = TABLE_CELLS[0];
        assert_eq!(
            classify_interaction(cell, &carrying_drink(), &table),
            InteractionTarget::Table(Entity::from_raw(3))
        );
        assert_eq!(
            classify_interaction(cell, &Barista::default(), &table),
            InteractionTarget::Nothing
        );

        // Furniture in hand is not served.
        let mut barista = carrying_drink();
        barista.carrying = Some(CarriedItem {
            object_type: ObjectType::Furniture,
            rotation: RotationState::North,
            drink: None,
        });
        assert_eq!(classify_interaction(cell, &barista, &table), InteractionTarget::Nothing);
    }

    #[test]
    fn test_ritual_before_pickup() {
        let barista = Barista::default();
        let contents = CellContents {
            is_ritual: true,
            carriable: true,
            ..with(9)
        };
        assert_eq!(
            classify_interaction(GridCoordinate::new(24, 10), &barista, &contents),
            InteractionTarget::Ritual
        );

        let loose = CellContents {
            carriable: true,
            ..with(9)
        };
        assert_eq!(
            classify_interaction(GridCoordinate::new(18, 10), &barista, &loose),
            InteractionTarget::PickUp(Entity::from_raw(9))
        );
    }

    #[test]
    fn test_creator() {
        let contents = CellContents {
            is_creator: true,
            ..with(2)
        };
        assert_eq!(
            classify_interaction(DRINK_CREATOR_CELL, &Barista::default(), &contents),
            InteractionTarget::DrinkCreator
        );
    }
}
