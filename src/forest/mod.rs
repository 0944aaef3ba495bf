//! Forest domain: five looping rooms behind the shop door.
//!
//! Residents who are at home wander around their room; whoever the barista is
//! talking to stands still. The snail lives in `snail`.

use bevy::prelude::*;
use rand::Rng;

use crate::grid::grid_to_world;
use crate::npcs::ActiveDialogue;
use crate::shared::*;

pub mod snail;

pub use snail::Snail;

pub const ROOM_EMOJIS: [&str; FOREST_ROOM_COUNT as usize] = ["🍄", "⛰️", "⭐", "💎", "🌳"];
pub const WANDER_RETARGET_SECONDS: f32 = 3.0;
pub const WANDER_MIN_DISTANCE: f32 = 30.0;
pub const WANDER_MAX_DISTANCE: f32 = 100.0;
pub const RESIDENT_WALK_SPEED: f32 = 40.0;

pub struct ForestPlugin;

impl Plugin for ForestPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ForestState>()
            .init_resource::<Snail>()
            .add_systems(Update, handle_enter_forest.run_if(in_state(GameState::Shop)))
            .add_systems(OnEnter(GameState::Forest), spawn_room_residents)
            .add_systems(OnExit(GameState::Forest), despawn_forest_npcs)
            .add_systems(
                Update,
                (
                    handle_forest_actions,
                    handle_room_change,
                    handle_return_to_shop,
                    wander_forest_npcs,
                )
                    .chain()
                    .run_if(in_state(GameState::Forest)),
            )
            .add_systems(
                Update,
                snail::update_snail
                    .run_if(in_state(GameState::Shop).or(in_state(GameState::Forest))),
            );
    }
}

/// A resident walking around their home room.
#[derive(Component, Debug, Clone)]
pub struct ForestNpc {
    pub npc_id: NpcId,
    pub home: Vec2,
    pub position: Vec2,
    pub target: Vec2,
    pub retarget_timer: f32,
    pub frozen: bool,
}

impl ForestNpc {
    pub fn new(npc_id: impl Into<NpcId>, home: Vec2) -> Self {
        Self {
            npc_id: npc_id.into(),
            home,
            position: home,
            target: home,
            retarget_timer: 0.0,
            frozen: false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ROOMS
// ═══════════════════════════════════════════════════════════════════════

pub fn room_emoji(room: u8) -> &'static str {
    ROOM_EMOJIS
        .get(room.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("🌲")
}

/// Moves to the neighbouring room and puts the player at the matching edge.
pub fn apply_room_change(state: &mut ForestState, direction: RoomDirection) -> u8 {
    match direction {
        RoomDirection::Left => {
            state.current_room = previous_room(state.current_room);
            state.player_cell = FOREST_LEFT_ARRIVAL;
        }
        RoomDirection::Right => {
            state.current_room = next_room(state.current_room);
            state.player_cell = FOREST_RIGHT_ARRIVAL;
        }
    }
    state.current_room
}

pub fn is_back_door(state: &ForestState, cell: GridCoordinate) -> bool {
    state.current_room == 1 && cell == FOREST_BACK_DOOR
}

/// Spread residents of one room across it so they don't start stacked.
pub fn home_point(index: usize) -> Vec2 {
    let i = index as i32;
    grid_to_world(GridCoordinate::new(8 + (i * 7) % 18, 6 + (i % 3) * 5))
}

pub fn pick_wander_target(home: Vec2, rng: &mut impl Rng) -> Vec2 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let distance = rng.gen_range(WANDER_MIN_DISTANCE..=WANDER_MAX_DISTANCE);
    home + Vec2::new(angle.cos(), angle.sin()) * distance
}

/// Moves `from` toward `to` by at most `max_step`.
pub fn step_toward(from: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let offset = to - from;
    let distance = offset.length();
    if distance <= max_step || distance == 0.0 {
        to
    } else {
        from + offset / distance * max_step
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

fn handle_enter_forest(
    mut events: EventReader<EnterForestEvent>,
    mut forest: ResMut<ForestState>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if events.read().last().is_none() {
        return;
    }
    *forest = ForestState::default();
    next_state.set(GameState::Forest);
    info!("[Forest] Stepped into room 1 {}", room_emoji(1));
}

fn spawn_room_residents(
    mut commands: Commands,
    forest: Res<ForestState>,
    residents: Res<Residents>,
) {
    for (index, resident) in residents
        .residents_in_room(forest.current_room)
        .into_iter()
        .enumerate()
    {
        commands.spawn(ForestNpc::new(resident.id.clone(), home_point(index)));
    }
}

fn despawn_forest_npcs(mut commands: Commands, npcs: Query<Entity, With<ForestNpc>>) {
    for entity in &npcs {
        commands.entity(entity).despawn();
    }
}

fn handle_forest_actions(
    mut events: EventReader<PlayerActionEvent>,
    mut forest: ResMut<ForestState>,
    mut return_writer: EventWriter<ReturnToShopEvent>,
) {
    for ev in events.read() {
        match ev.action {
            PlayerAction::MoveTo(cell) if cell.is_valid() => {
                forest.player_cell = cell;
            }
            PlayerAction::Interact(cell) if is_back_door(&forest, cell) => {
                return_writer.send(ReturnToShopEvent);
            }
            _ => {}
        }
    }
}

fn handle_room_change(
    mut commands: Commands,
    mut events: EventReader<ChangeRoomEvent>,
    mut forest: ResMut<ForestState>,
    residents: Res<Residents>,
    npcs: Query<Entity, With<ForestNpc>>,
    mut room_writer: EventWriter<RoomChangedEvent>,
) {
    let mut changed = false;
    for ev in events.read() {
        let room = apply_room_change(&mut forest, ev.direction);
        info!("[Forest] Room {} {}", room, room_emoji(room));
        room_writer.send(RoomChangedEvent { room });
        changed = true;
    }
    if !changed {
        return;
    }

    for entity in &npcs {
        commands.entity(entity).despawn();
    }
    for (index, resident) in residents
        .residents_in_room(forest.current_room)
        .into_iter()
        .enumerate()
    {
        commands.spawn(ForestNpc::new(resident.id.clone(), home_point(index)));
    }
}

fn handle_return_to_shop(
    mut events: EventReader<ReturnToShopEvent>,
    mut barista: ResMut<Barista>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if events.read().last().is_none() {
        return;
    }
    barista.cell = DOOR_CELL.offset(2, 0);
    next_state.set(GameState::Shop);
    info!("[Forest] Back to the shop");
}

fn wander_forest_npcs(
    time: Res<Time>,
    dialogue: Res<ActiveDialogue>,
    mut npcs: Query<&mut ForestNpc>,
) {
    let delta = time.delta_secs();
    let mut rng = rand::thread_rng();
    for mut npc in &mut npcs {
        let frozen = dialogue.is_talking_to(&npc.npc_id);
        if npc.frozen != frozen {
            npc.frozen = frozen;
        }
        if npc.frozen {
            continue;
        }

        npc.retarget_timer -= delta;
        if npc.retarget_timer <= 0.0 {
            npc.retarget_timer = WANDER_RETARGET_SECONDS;
            npc.target = pick_wander_target(npc.home, &mut rng);
        }
        let next = step_toward(npc.position, npc.target, RESIDENT_WALK_SPEED * delta);
        npc.position = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rooms_loop_both_ways() {
        let mut state = ForestState::default();
        assert_eq!(apply_room_change(&mut state, RoomDirection::Left), 5);
        assert_eq!(state.player_cell, FOREST_LEFT_ARRIVAL);
        assert_eq!(apply_room_change(&mut state, RoomDirection::Right), 1);
        assert_eq!(state.player_cell, FOREST_RIGHT_ARRIVAL);
        for expected in [2, 3, 4, 5, 1] {
            assert_eq!(apply_room_change(&mut state, RoomDirection::Right), expected);
        }
    }

    #[test]
    fn test_back_door_only_in_room_one() {
        let mut state = ForestState::default();
        assert!(is_back_door(&state, FOREST_BACK_DOOR));
        assert!(!is_back_door(&state, FOREST_START));
        state.current_room = 2;
        assert!(!is_back_door(&state, FOREST_BACK_DOOR));
    }

    #[test]
    fn test_room_emojis() {
        assert_eq!(room_emoji(1), "🍄");
        assert_eq!(room_emoji(5), "🌳");
        assert_eq!(room_emoji(0), "🍄");
        assert_eq!(room_emoji(9), "🌲");
    }

    #[test]
    fn test_wander_targets_stay_in_ring() {
        let mut rng = StdRng::seed_from_u64(11);
        let home = Vec2::new(100.0, -40.0);
        for _ in 0..100 {
            let d = pick_wander_target(home, &mut rng).distance(home);
            assert!(d >= WANDER_MIN_DISTANCE - 1e-3 && d <= WANDER_MAX_DISTANCE + 1e-3);
        }
    }

    #[test]
    fn test_step_toward() {
        let from = Vec2::ZERO;
        let to = Vec2::new(10.0, 0.0);
        assert_eq!(step_toward(from, to, 4.0), Vec2::new(4.0, 0.0));
        assert_eq!(step_toward(from, to, 40.0), to);
        assert_eq!(step_toward(to, to, 1.0), to);
    }
}
