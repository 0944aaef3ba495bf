//! Customer behaviour: a small per-NPC state machine.
//!
//! Entering → Wandering → Sitting → (Satisfied | Neutral) → Leaving → gone.
//! Every state with a duration draws it once on entry. Customers hold a
//! reservation on the cell they stand on; moving frees the old cell and
//! reserves the new one.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::grid::GridWorld;
use crate::shared::*;

#[derive(Component, Debug, Clone)]
pub struct ShopNpc {
    pub animal: AnimalType,
    /// Set when a named forest resident is behind this customer.
    pub resident: Option<NpcId>,
    pub state: NpcState,
    pub cell: GridCoordinate,
    pub state_timer: f32,
    pub state_duration: f32,
    pub lifetime: f32,
    pub move_cooldown: f32,
    pub target_table: Option<Entity>,
    pub satisfied: bool,
    pub carried_drink: Option<Drink>,
}

impl ShopNpc {
    pub fn new(
        animal: AnimalType,
        resident: Option<NpcId>,
        cell: GridCoordinate,
        tuning: &NpcTuning,
        rng: &mut impl Rng,
    ) -> Self {
        let mut npc = Self {
            animal,
            resident,
            state: NpcState::Entering,
            cell,
            state_timer: 0.0,
            state_duration: 0.0,
            lifetime: 0.0,
            move_cooldown: 0.0,
            target_table: None,
            satisfied: false,
            carried_drink: None,
        };
        npc.enter_state(NpcState::Entering, tuning, rng);
        npc
    }

    pub fn enter_state(&mut self, state: NpcState, tuning: &NpcTuning, rng: &mut impl Rng) {
        self.state = state;
        self.state_timer = 0.0;
        self.state_duration = match state {
            NpcState::Entering => tuning.entering.draw(rng),
            NpcState::Wandering => tuning.wandering.draw(rng),
            NpcState::Sitting => tuning.sitting_timeout.draw(rng),
            NpcState::Satisfied => tuning.celebration.draw(rng),
            NpcState::Neutral | NpcState::Leaving => 0.0,
        };
        if matches!(state, NpcState::Neutral | NpcState::Leaving) {
            self.move_cooldown = tuning.exit_step_interval;
        }
    }
}

/// A frame's view of one table. `taken` marks a drink a customer picked up.
#[derive(Debug, Clone)]
pub struct TableSlot {
    pub entity: Entity,
    pub cell: GridCoordinate,
    pub drink: Option<Drink>,
    pub taken: bool,
}

pub fn is_inside_shop(cell: GridCoordinate) -> bool {
    cell.x >= SHOP_MIN.x && cell.x <= SHOP_MAX.x && cell.y >= SHOP_MIN.y && cell.y <= SHOP_MAX.y
}

pub fn is_near_exit(cell: GridCoordinate) -> bool {
    cell.x <= EXIT_X_THRESHOLD && (cell.y - DOOR_CELL.y).abs() <= EXIT_Y_TOLERANCE
}

fn move_npc(npc: &mut ShopNpc, grid: &mut GridWorld, to: GridCoordinate) {
    grid.free_cell(npc.cell);
    grid.reserve_cell(to);
    npc.cell = to;
}

fn try_random_step(
    npc: &mut ShopNpc,
    tuning: &NpcTuning,
    grid: &mut GridWorld,
    rng: &mut impl Rng,
) -> bool {
    let radius = rng.gen_range(1..=tuning.max_wander_radius.max(1));
    for _ in 0..8 {
        let dx = rng.gen_range(-radius..=radius);
        let dy = rng.gen_range(-radius..=radius);
        if dx == 0 && dy == 0 {
            continue;
        }
        let to = npc.cell.offset(dx, dy);
        if is_inside_shop(to) && grid.is_cell_available(to) {
            let distance = npc.cell.manhattan_distance(to);
            move_npc(npc, grid, to);
            npc.move_cooldown = tuning.seconds_per_cell * distance as f32;
            return true;
        }
    }
    npc.move_cooldown = tuning.seconds_per_cell;
    false
}

/// Picks a table (drinks first) with a free seat and walks there.
fn seek_table(
    npc: &mut ShopNpc,
    grid: &mut GridWorld,
    tables: &[TableSlot],
    rng: &mut impl Rng,
) -> bool {
    let seated: Vec<&TableSlot> = tables
        .iter()
        .filter(|t| !grid.available_adjacent_cells(t.cell).is_empty())
        .collect();
    let with_drink: Vec<&TableSlot> = seated
        .iter()
        .copied()
        .filter(|t| t.drink.is_some())
        .collect();
    let pool = if with_drink.is_empty() { seated } else { with_drink };

    let Some(table) = pool.choose(rng) else {
        return false;
    };
    let Some(seat) = grid.available_adjacent_cells(table.cell).choose(rng).copied() else {
        return false;
    };
    npc.target_table = Some(table.entity);
    move_npc(npc, grid, seat);
    true
}

/// One step toward the door: x first while dx ≠ 0, with a sidestep fallback.
pub fn exit_step(cell: GridCoordinate, grid: &GridWorld) -> Option<GridCoordinate> {
    let step_x = (DOOR_CELL.x - cell.x).signum();
    let step_y = (DOOR_CELL.y - cell.y).signum();
    let primary = if step_x != 0 {
        cell.offset(step_x, 0)
    } else {
        cell.offset(0, step_y)
    };
    let alternative = GridCoordinate::new(cell.x + step_y, cell.y + step_x);

    if grid.is_cell_available(primary) {
        Some(primary)
    } else if alternative != cell && grid.is_cell_available(alternative) {
        Some(alternative)
    } else {
        None
    }
}

/// Advances one customer by `delta` seconds. Returns `true` when the customer
/// has walked out; its cell is already freed.
pub fn update_npc(
    npc: &mut ShopNpc,
    delta: f32,
    tuning: &NpcTuning,
    grid: &mut GridWorld,
    tables: &mut [TableSlot],
    rng: &mut impl Rng,
) -> bool {
    npc.lifetime += delta;
    npc.state_timer += delta;
    npc.move_cooldown -= delta;

    if npc.lifetime > tuning.max_lifetime && !npc.state.is_departing() {
        npc.enter_state(NpcState::Neutral, tuning, rng);
    }

    match npc.state {
        NpcState::Entering | NpcState::Wandering => {
            if npc.state_timer >= npc.state_duration {
                if npc.state == NpcState::Entering {
                    npc.enter_state(NpcState::Wandering, tuning, rng);
                } else if seek_table(npc, grid, tables, rng) {
                    npc.enter_state(NpcState::Sitting, tuning, rng);
                } else {
                    npc.state_timer -= tuning.table_retry_penalty;
                }
            } else if npc.move_cooldown <= 0.0 {
                try_random_step(npc, tuning, grid, rng);
            }
        }
        NpcState::Sitting => {
            if npc.state_timer <= tuning.drink_check_window {
                let table = npc
                    .target_table
                    .and_then(|entity| tables.iter_mut().find(|t| t.entity == entity));
                if let Some(table) = table {
                    if let Some(drink) = table.drink.take() {
                        table.taken = true;
                        npc.carried_drink = Some(drink);
                        npc.satisfied = true;
                        npc.enter_state(NpcState::Satisfied, tuning, rng);
                        return false;
                    }
                }
            }
            if npc.state_timer >= npc.state_duration {
                npc.enter_state(NpcState::Neutral, tuning, rng);
            }
        }
        NpcState::Satisfied => {
            if npc.state_timer >= npc.state_duration {
                npc.enter_state(NpcState::Leaving, tuning, rng);
            }
        }
        NpcState::Neutral | NpcState::Leaving => {
            if npc.move_cooldown > 0.0 {
                return false;
            }
            npc.move_cooldown = tuning.exit_step_interval;
            if is_near_exit(npc.cell) {
                grid.free_cell(npc.cell);
                return true;
            }
            if let Some(next) = exit_step(npc.cell, grid) {
                move_npc(npc, grid, next);
            }
        }
    }
    false
}

/// System: drive every customer, then write back drinks taken off tables.
pub fn update_shop_npcs(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    mut grid: ResMut<GridWorld>,
    mut npcs: Query<(Entity, &mut ShopNpc)>,
    mut tables: Query<(Entity, &GameObject, &mut Table)>,
    mut departed_writer: EventWriter<NpcDepartedEvent>,
) {
    let delta = time.delta_secs();
    let mut rng = rand::thread_rng();
    let mut slots: Vec<TableSlot> = tables
        .iter()
        .map(|(entity, object, table)| TableSlot {
            entity,
            cell: object.cell,
            drink: table.drink.clone(),
            taken: false,
        })
        .collect();

    for (entity, mut npc) in &mut npcs {
        let before = npc.state;
        let gone = update_npc(&mut npc, delta, &config.npc, &mut grid, &mut slots, &mut rng);
        if npc.state != before {
            debug!("[Npcs] {} {:?} -> {:?}", npc.animal.emoji(), before, npc.state);
        }
        if gone {
            info!(
                "[Npcs] {} left the shop ({})",
                npc.animal.emoji(),
                if npc.satisfied { "satisfied" } else { "neutral" }
            );
            departed_writer.send(NpcDepartedEvent {
                resident: npc.resident.clone(),
                animal: npc.animal,
                satisfied: npc.satisfied,
            });
            commands.entity(entity).despawn();
        }
    }

    for slot in slots.iter().filter(|s| s.taken) {
        if let Ok((_, _, mut table)) = tables.get_mut(slot.entity) {
            table.drink = None;
        }
    }
}
