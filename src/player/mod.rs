//! Player domain: the barista in the shop.
//!
//! Player intent arrives as `PlayerActionEvent`s (the input layer is outside
//! this crate). Moving, rotating and dropping are handled here; the long-press
//! `Interact` action is resolved in `interaction`.

mod interaction;
mod spawn;

use bevy::prelude::*;

use crate::grid::{GridWorld, DEFAULT_SEARCH_RADIUS};
use crate::shared::*;

pub use interaction::{classify_interaction, CellContents, InteractionTarget};
pub use spawn::{PowerBreaker, FURNITURE_CELLS, LOOSE_DRINK_CELL};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Barista>();

        app.add_systems(
            OnEnter(GameState::Shop),
            (spawn::spawn_shop_layout, place_barista).chain(),
        );
        app.add_systems(OnExit(GameState::Shop), lift_barista);

        app.add_systems(
            Update,
            (handle_player_actions, interaction::handle_interactions)
                .run_if(in_state(GameState::Shop)),
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Components
// ═══════════════════════════════════════════════════════════════════════════

/// A drink standing on the floor as a grid object.
#[derive(Component, Debug, Clone)]
pub struct DrinkItem {
    pub drink: Drink,
}

// ═══════════════════════════════════════════════════════════════════════════
// Placement
// ═══════════════════════════════════════════════════════════════════════════

/// The barista holds a reservation on their cell so customers and dropped
/// items keep out of it.
fn place_barista(mut grid: ResMut<GridWorld>, mut barista: ResMut<Barista>) {
    let cell = if grid.is_cell_available(barista.cell) {
        Some(barista.cell)
    } else {
        grid.find_nearest_available_cell(barista.cell, DEFAULT_SEARCH_RADIUS)
    };

    match cell {
        Some(cell) => {
            grid.reserve_cell(cell);
            barista.cell = cell;
            debug!("[Player] Barista at {}", cell);
        }
        None => warn!("[Player] No free cell near {} for the barista", barista.cell),
    }
}

fn lift_barista(mut grid: ResMut<GridWorld>, barista: Res<Barista>) {
    grid.unreserve_cell(barista.cell);
}

/// Moves the barista's reservation. `false` if `to` is not free.
pub fn move_barista(grid: &mut GridWorld, barista: &mut Barista, to: GridCoordinate) -> bool {
    if to == barista.cell {
        return true;
    }
    if !grid.is_cell_available(to) {
        return false;
    }
    grid.unreserve_cell(barista.cell);
    grid.reserve_cell(to);
    barista.cell = to;
    true
}

/// Puts whatever the barista carries on the nearest free cell.
/// Returns the cell it landed on.
pub fn drop_carried(
    commands: &mut Commands,
    grid: &mut GridWorld,
    barista: &mut Barista,
) -> Option<GridCoordinate> {
    let cell = grid.find_nearest_available_cell(barista.cell, DEFAULT_SEARCH_RADIUS)?;
    let item = barista.carrying.take()?;

    let mut object = GameObject::new(cell, item.object_type);
    object.rotation = item.rotation;
    let mut entity = commands.spawn(object);
    if let Some(drink) = item.drink {
        entity.insert(DrinkItem { drink });
    }
    let entity = entity.id();
    grid.occupy_cell(cell, entity);
    Some(cell)
}

// ═══════════════════════════════════════════════════════════════════════════
// Systems
// ═══════════════════════════════════════════════════════════════════════════

fn handle_player_actions(
    mut commands: Commands,
    mut events: EventReader<PlayerActionEvent>,
    mut grid: ResMut<GridWorld>,
    mut barista: ResMut<Barista>,
    mut objects: Query<&mut GameObject>,
) {
    for ev in events.read() {
        match ev.action {
            PlayerAction::MoveTo(cell) => {
                if !move_barista(&mut grid, &mut barista, cell) {
                    debug!("[Player] Cannot move to {}", cell);
                }
            }
            PlayerAction::Rotate(cell) => {
                let Some(entity) = grid.object_at(cell) else {
                    continue;
                };
                let Ok(mut object) = objects.get_mut(entity) else {
                    continue;
                };
                if object.object_type.is_rotatable() {
                    object.rotation = object.rotation.next();
                    debug!(
                        "[Player] Rotated {:?} at {} to {}°",
                        object.object_type,
                        cell,
                        object.rotation.degrees()
                    );
                } else {
                    debug!("[Player] {:?} cannot be rotated", object.object_type);
                }
            }
            PlayerAction::Drop => {
                if barista.carrying.is_none() {
                    continue;
                }
                match drop_carried(&mut commands, &mut grid, &mut barista) {
                    Some(cell) => info!("[Player] Put item down at {}", cell),
                    None => warn!("[Player] Nowhere to put the item down"),
                }
            }
            PlayerAction::Interact(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_barista_keeps_reservation_in_step() {
        let mut grid = GridWorld::default();
        let mut barista = Barista::default();
        grid.reserve_cell(barista.cell);

        let to = GridCoordinate::new(17, 12);
        assert!(move_barista(&mut grid, &mut barista, to));
        assert_eq!(barista.cell, to);
        assert!(grid.is_reserved(to));
        assert!(grid.is_cell_available(CHARACTER_START));
    }

    #[test]
    fn test_move_barista_blocked() {
        let mut grid = GridWorld::default();
        let mut barista = Barista::default();
        let blocked = GridCoordinate::new(17, 12);
        grid.occupy_cell(blocked, Entity::from_raw(1));
        assert!(!move_barista(&mut grid, &mut barista, blocked));
        assert!(!move_barista(&mut grid, &mut barista, GridCoordinate::new(40, 0)));
        assert_eq!(barista.cell, CHARACTER_START);
    }
}
