use bevy::prelude::*;

use super::DrinkItem;
use crate::grid::GridWorld;
use crate::shared::*;

pub const FURNITURE_CELLS: [GridCoordinate; 3] = [
    GridCoordinate::new(25, 15),
    GridCoordinate::new(8, 12),
    GridCoordinate::new(14, 18),
];

pub const LOOSE_DRINK_CELL: GridCoordinate = GridCoordinate::new(18, 10);

/// The wall breaker that trips when dawn runs out.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PowerBreaker;

/// Tables, furniture, the breaker and one stray cup.
/// Runs on every entry to the shop; only the first one builds anything.
pub fn spawn_shop_layout(
    mut commands: Commands,
    mut grid: ResMut<GridWorld>,
    existing: Query<(), With<Table>>,
) {
    if !existing.is_empty() {
        return;
    }

    for cell in TABLE_CELLS {
        let entity = commands
            .spawn((GameObject::new(cell, ObjectType::Table), Table::default()))
            .id();
        grid.occupy_cell(cell, entity);
    }

    for cell in FURNITURE_CELLS {
        let entity = commands
            .spawn(GameObject::new(cell, ObjectType::Furniture))
            .id();
        grid.occupy_cell(cell, entity);
    }

    let cup = Drink {
        ingredients: Vec::new(),
        recipe_id: None,
        quality: None,
        complete: false,
    };
    let entity = commands
        .spawn((
            GameObject::new(LOOSE_DRINK_CELL, ObjectType::Drink),
            DrinkItem { drink: cup },
        ))
        .id();
    grid.occupy_cell(LOOSE_DRINK_CELL, entity);

    let entity = commands
        .spawn((GameObject::new(BREAKER_CELL, ObjectType::Station), PowerBreaker))
        .id();
    grid.occupy_cell(BREAKER_CELL, entity);

    info!(
        "[Player] Shop laid out: {} tables, {} pieces of furniture",
        TABLE_CELLS.len(),
        FURNITURE_CELLS.len()
    );
}
