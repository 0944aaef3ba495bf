//! Grid domain: the shop's cell occupancy map.
//!
//! `GridWorld` answers "can something stand here?" for the barista, customers
//! and placed objects. Occupied cells hold an entity. Reserved cells are held
//! by a walking customer and carry no entity.
//!
//! `GameObject` entities are kept in sync automatically: spawning one claims
//! its cell, despawning one (or removing the component) frees it.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::shared::*;

pub const DEFAULT_SEARCH_RADIUS: i32 = 5;

#[derive(Resource, Debug, Clone, Default)]
pub struct GridWorld {
    occupied: HashMap<GridCoordinate, Entity>,
    reserved: HashSet<GridCoordinate>,
}

impl GridWorld {
    pub fn is_valid(&self, cell: GridCoordinate) -> bool {
        cell.is_valid()
    }

    pub fn is_cell_available(&self, cell: GridCoordinate) -> bool {
        cell.is_valid() && !self.occupied.contains_key(&cell) && !self.reserved.contains(&cell)
    }

    pub fn is_occupied(&self, cell: GridCoordinate) -> bool {
        self.occupied.contains_key(&cell)
    }

    pub fn is_reserved(&self, cell: GridCoordinate) -> bool {
        self.reserved.contains(&cell)
    }

    /// Returns `false` and leaves the grid untouched if the cell is taken.
    pub fn occupy_cell(&mut self, cell: GridCoordinate, entity: Entity) -> bool {
        if !self.is_cell_available(cell) {
            warn!("[Grid] Cannot occupy {}: unavailable", cell);
            return false;
        }
        self.occupied.insert(cell, entity);
        true
    }

    pub fn free_cell(&mut self, cell: GridCoordinate) {
        self.occupied.remove(&cell);
        self.reserved.remove(&cell);
    }

    pub fn reserve_cell(&mut self, cell: GridCoordinate) -> bool {
        if !self.is_cell_available(cell) {
            return false;
        }
        self.reserved.insert(cell);
        true
    }

    pub fn unreserve_cell(&mut self, cell: GridCoordinate) {
        self.reserved.remove(&cell);
    }

    pub fn object_at(&self, cell: GridCoordinate) -> Option<Entity> {
        self.occupied.get(&cell).copied()
    }

    /// Moves whatever occupies `from` to `to`. Fails if `from` is empty or `to` is taken.
    pub fn move_object(&mut self, from: GridCoordinate, to: GridCoordinate) -> bool {
        if !self.is_cell_available(to) {
            return false;
        }
        let Some(entity) = self.occupied.remove(&from) else {
            return false;
        };
        self.occupied.insert(to, entity);
        true
    }

    /// Square-ring spiral search around `center`, nearest rings first.
    pub fn find_nearest_available_cell(
        &self,
        center: GridCoordinate,
        max_radius: i32,
    ) -> Option<GridCoordinate> {
        if self.is_cell_available(center) {
            return Some(center);
        }

        for radius in 1..=max_radius {
            for dx in -radius..=radius {
                for dy in -radius..=radius {
                    // Only the border of this ring; inner cells were checked already.
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let cell = center.offset(dx, dy);
                    if self.is_cell_available(cell) {
                        return Some(cell);
                    }
                }
            }
        }
        None
    }

    /// Right, left, up, down.
    pub fn available_adjacent_cells(&self, cell: GridCoordinate) -> Vec<GridCoordinate> {
        [
            cell.offset(1, 0),
            cell.offset(-1, 0),
            cell.offset(0, 1),
            cell.offset(0, -1),
        ]
        .into_iter()
        .filter(|c| self.is_cell_available(*c))
        .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }

    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    pub fn clear(&mut self) {
        self.occupied.clear();
        self.reserved.clear();
    }
}

/// World-space position of a cell's centre.
pub fn grid_to_world(cell: GridCoordinate) -> Vec2 {
    Vec2::new(
        SHOP_ORIGIN.x + cell.x as f32 * CELL_SIZE + CELL_SIZE / 2.0,
        SHOP_ORIGIN.y + cell.y as f32 * CELL_SIZE + CELL_SIZE / 2.0,
    )
}

/// Cell containing `point`, clamped into the grid.
pub fn world_to_grid(point: Vec2) -> GridCoordinate {
    let x = ((point.x - SHOP_ORIGIN.x) / CELL_SIZE).floor() as i32;
    let y = ((point.y - SHOP_ORIGIN.y) / CELL_SIZE).floor() as i32;
    GridCoordinate::new(x.clamp(0, GRID_WIDTH - 1), y.clamp(0, GRID_HEIGHT - 1))
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct GridPlugin;

impl Plugin for GridPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GridWorld>()
            .init_resource::<TrackedObjects>()
            .add_systems(PostUpdate, (claim_spawned_objects, release_removed_objects));
    }
}

/// Last known cell of every registered `GameObject`, so removals can be undone
/// after the component is gone.
#[derive(Resource, Debug, Default)]
pub struct TrackedObjects {
    cells: HashMap<Entity, GridCoordinate>,
}

fn claim_spawned_objects(
    mut grid: ResMut<GridWorld>,
    mut tracked: ResMut<TrackedObjects>,
    added: Query<(Entity, &GameObject), Added<GameObject>>,
) {
    for (entity, object) in &added {
        if grid.object_at(object.cell) == Some(entity) {
            tracked.cells.insert(entity, object.cell);
            continue;
        }
        if grid.occupy_cell(object.cell, entity) {
            tracked.cells.insert(entity, object.cell);
        } else {
            warn!(
                "[Grid] {:?} spawned on taken cell {}; not registered",
                object.object_type, object.cell
            );
        }
    }
}

fn release_removed_objects(
    mut grid: ResMut<GridWorld>,
    mut tracked: ResMut<TrackedObjects>,
    mut removed: RemovedComponents<GameObject>,
) {
    for entity in removed.read() {
        if let Some(cell) = tracked.cells.remove(&entity) {
            if grid.object_at(cell) == Some(entity) {
                grid.free_cell(cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(n: u32) -> Entity {
        Entity::from_raw(n)
    }

    #[test]
    fn test_bounds() {
        let grid = GridWorld::default();
        assert!(grid.is_valid(GridCoordinate::new(0, 0)));
        assert!(grid.is_valid(GridCoordinate::new(32, 24)));
        assert!(!grid.is_valid(GridCoordinate::new(33, 0)));
        assert!(!grid.is_valid(GridCoordinate::new(0, 25)));
        assert!(!grid.is_valid(GridCoordinate::INVALID));
        assert!(!grid.is_cell_available(GridCoordinate::new(-1, 5)));
    }

    #[test]
    fn test_occupy_and_free() {
        let mut grid = GridWorld::default();
        let cell = GridCoordinate::new(4, 4);
        assert!(grid.occupy_cell(cell, entity(1)));
        assert!(!grid.is_cell_available(cell));
        assert_eq!(grid.object_at(cell), Some(entity(1)));

        // Second occupant is rejected and the first is kept.
        assert!(!grid.occupy_cell(cell, entity(2)));
        assert_eq!(grid.object_at(cell), Some(entity(1)));

        grid.free_cell(cell);
        assert!(grid.is_cell_available(cell));
        assert_eq!(grid.object_at(cell), None);
    }

    #[test]
    fn test_reserved_cells_block_occupancy() {
        let mut grid = GridWorld::default();
        let cell = GridCoordinate::new(10, 10);
        assert!(grid.reserve_cell(cell));
        assert!(!grid.is_cell_available(cell));
        assert!(!grid.occupy_cell(cell, entity(1)));
        assert_eq!(grid.object_at(cell), None, "reservations carry no entity");

        grid.unreserve_cell(cell);
        assert!(grid.occupy_cell(cell, entity(1)));
    }

    #[test]
    fn test_move_object() {
        let mut grid = GridWorld::default();
        let a = GridCoordinate::new(1, 1);
        let b = GridCoordinate::new(2, 1);
        grid.occupy_cell(a, entity(7));
        assert!(grid.move_object(a, b));
        assert_eq!(grid.object_at(b), Some(entity(7)));
        assert!(grid.is_cell_available(a));
        assert!(!grid.move_object(a, b), "nothing left at the source");
    }

    #[test]
    fn test_spiral_returns_center_when_free() {
        let grid = GridWorld::default();
        let center = GridCoordinate::new(16, 12);
        assert_eq!(grid.find_nearest_available_cell(center, 5), Some(center));
    }

    #[test]
    fn test_spiral_visits_first_ring_in_order() {
        let mut grid = GridWorld::default();
        let center = GridCoordinate::new(16, 12);
        grid.occupy_cell(center, entity(1));
        // x outer, y inner: (-1,-1) is the first border cell of ring 1.
        assert_eq!(
            grid.find_nearest_available_cell(center, 5),
            Some(GridCoordinate::new(15, 11))
        );
        grid.occupy_cell(GridCoordinate::new(15, 11), entity(2));
        assert_eq!(
            grid.find_nearest_available_cell(center, 5),
            Some(GridCoordinate::new(15, 12))
        );
    }

    #[test]
    fn test_spiral_prefers_nearer_ring() {
        let mut grid = GridWorld::default();
        let center = GridCoordinate::new(10, 10);
        let mut n = 0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                n += 1;
                grid.occupy_cell(center.offset(dx, dy), entity(n));
            }
        }
        let found = grid.find_nearest_available_cell(center, 5).unwrap();
        let ring = (found.x - center.x).abs().max((found.y - center.y).abs());
        assert_eq!(ring, 2);
    }

    #[test]
    fn test_spiral_respects_radius() {
        let mut grid = GridWorld::default();
        let center = GridCoordinate::new(10, 10);
        let mut n = 0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                n += 1;
                grid.occupy_cell(center.offset(dx, dy), entity(n));
            }
        }
        assert_eq!(grid.find_nearest_available_cell(center, 1), None);
    }

    #[test]
    fn test_spiral_skips_out_of_bounds() {
        let mut grid = GridWorld::default();
        let corner = GridCoordinate::new(0, 0);
        grid.occupy_cell(corner, entity(1));
        let found = grid.find_nearest_available_cell(corner, 2).unwrap();
        assert!(found.is_valid());
        assert_eq!(found, GridCoordinate::new(0, 1));
    }

    #[test]
    fn test_adjacent_cells_filtered_and_ordered() {
        let mut grid = GridWorld::default();
        let cell = GridCoordinate::new(5, 5);
        assert_eq!(
            grid.available_adjacent_cells(cell),
            vec![
                GridCoordinate::new(6, 5),
                GridCoordinate::new(4, 5),
                GridCoordinate::new(5, 6),
                GridCoordinate::new(5, 4),
            ]
        );
        grid.reserve_cell(GridCoordinate::new(6, 5));
        assert_eq!(grid.available_adjacent_cells(cell).len(), 3);
        assert!(grid
            .available_adjacent_cells(GridCoordinate::new(0, 0))
            .iter()
            .all(|c| c.is_valid()));
    }

    #[test]
    fn test_world_grid_conversion() {
        let cell = GridCoordinate::new(16, 12);
        let world = grid_to_world(cell);
        assert_eq!(world, Vec2::new(-1000.0 + 16.0 * 60.0 + 30.0, -750.0 + 12.0 * 60.0 + 30.0));
        assert_eq!(world_to_grid(world), cell);
        assert_eq!(world_to_grid(Vec2::new(-5000.0, 5000.0)), GridCoordinate::new(0, 24));
    }

    #[test]
    fn test_coordinate_helpers() {
        let c = GridCoordinate::new(3, 4);
        assert_eq!(c.manhattan_distance(GridCoordinate::new(0, 0)), 7);
        assert_eq!(c.to_string(), "(3, 4)");
        assert!(c.adjacent_cells().contains(&GridCoordinate::new(3, 5)));
    }

    #[test]
    fn test_plugin_tracks_spawn_and_despawn() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).add_plugins(GridPlugin);
        let cell = GridCoordinate::new(8, 8);
        let e = app
            .world_mut()
            .spawn(GameObject::new(cell, ObjectType::Furniture))
            .id();
        app.update();
        assert_eq!(app.world().resource::<GridWorld>().object_at(cell), Some(e));

        app.world_mut().despawn(e);
        app.update();
        assert!(app.world().resource::<GridWorld>().is_cell_available(cell));
    }
}
