//! The night snail. It only comes out at night, follows the barista slowly
//! when they share a room and drifts toward their room otherwise.

use bevy::prelude::*;
use rand::Rng;

use super::{home_point, step_toward};
use crate::grid::grid_to_world;
use crate::shared::*;

pub const SNAIL_STOP_DISTANCE: f32 = 10.0;
pub const SNAIL_ROOM_HOP_CHANCE: f64 = 0.05;
pub const SNAIL_WANDER_SECONDS: f32 = 3.0;

#[derive(Resource, Debug, Clone, Default)]
pub struct Snail {
    pub active: bool,
    pub room: u8,
    pub position: Vec2,
    pub heading: Vec2,
    pub wander_timer: f32,
    pub hop_timer: f32,
}

/// Where the barista is, as far as the snail cares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnailQuarry {
    Forest { room: u8, position: Vec2 },
    Shop,
}

/// Wakes the snail at night and puts it to sleep otherwise.
/// Returns `true` if the active flag changed.
pub fn update_activation(snail: &mut Snail, phase: TimePhase, rng: &mut impl Rng) -> bool {
    let should_be_active = phase == TimePhase::Night;
    if snail.active == should_be_active {
        return false;
    }
    if should_be_active {
        *snail = Snail {
            active: true,
            room: rng.gen_range(1..=FOREST_ROOM_COUNT),
            position: home_point(rng.gen_range(0..6)),
            ..Default::default()
        };
    } else {
        snail.active = false;
    }
    true
}

/// World-space corners of the shop floor.
pub fn shop_bounds() -> (Vec2, Vec2) {
    (grid_to_world(SHOP_MIN), grid_to_world(SHOP_MAX))
}

pub fn step_snail(
    snail: &mut Snail,
    quarry: SnailQuarry,
    speed: f32,
    delta: f32,
    rng: &mut impl Rng,
) {
    if !snail.active {
        return;
    }

    match quarry {
        SnailQuarry::Forest { room, position } if room == snail.room => {
            let distance = snail.position.distance(position);
            if distance > SNAIL_STOP_DISTANCE {
                let max_step = (speed * delta).min(distance - SNAIL_STOP_DISTANCE);
                snail.position = step_toward(snail.position, position, max_step);
            }
        }
        SnailQuarry::Forest { room, .. } => {
            snail.hop_timer += delta;
            while snail.hop_timer >= 1.0 {
                snail.hop_timer -= 1.0;
                if rng.gen_bool(SNAIL_ROOM_HOP_CHANCE) {
                    snail.room = room;
                    snail.hop_timer = 0.0;
                    break;
                }
            }
        }
        SnailQuarry::Shop => {
            snail.wander_timer -= delta;
            if snail.wander_timer <= 0.0 {
                snail.wander_timer = SNAIL_WANDER_SECONDS;
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                snail.heading = Vec2::new(angle.cos(), angle.sin());
            }
            let (lo, hi) = shop_bounds();
            let next = snail.position + snail.heading * speed * delta;
            let clamped = next.clamp(lo, hi);
            // Turn around at the walls.
            if clamped.x != next.x {
                snail.heading.x = -snail.heading.x;
            }
            if clamped.y != next.y {
                snail.heading.y = -snail.heading.y;
            }
            snail.position = clamped;
        }
    }
}

pub fn update_snail(
    time: Res<Time>,
    config: Res<GameConfig>,
    cycle: Res<DayCycle>,
    state: Res<State<GameState>>,
    forest: Res<ForestState>,
    mut snail: ResMut<Snail>,
) {
    let mut rng = rand::thread_rng();
    if update_activation(&mut snail, cycle.phase, &mut rng) {
        if snail.active {
            info!("[Forest] Something stirs in room {}...", snail.room);
        } else {
            debug!("[Forest] The snail retreats");
        }
    }

    let quarry = match state.get() {
        GameState::Forest => SnailQuarry::Forest {
            room: forest.current_room,
            position: grid_to_world(forest.player_cell),
        },
        _ => SnailQuarry::Shop,
    };
    let room_before = snail.room;
    step_snail(&mut snail, quarry, config.snail_speed, time.delta_secs(), &mut rng);
    if snail.room != room_before {
        debug!("[Forest] The snail crept into room {}", snail.room);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn awake(room: u8, position: Vec2) -> Snail {
        Snail {
            active: true,
            room,
            position,
            ..Default::default()
        }
    }

    #[test]
    fn test_only_active_at_night() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut snail = Snail::default();
        assert!(!update_activation(&mut snail, TimePhase::Day, &mut rng));
        assert!(update_activation(&mut snail, TimePhase::Night, &mut rng));
        assert!(snail.active);
        assert!((1..=FOREST_ROOM_COUNT).contains(&snail.room));
        assert!(!update_activation(&mut snail, TimePhase::Night, &mut rng));
        assert!(update_activation(&mut snail, TimePhase::Dawn, &mut rng));
        assert!(!snail.active);
    }

    #[test]
    fn test_chases_in_same_room_and_stops_short() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut snail = awake(3, Vec2::ZERO);
        let player = Vec2::new(100.0, 0.0);
        let quarry = SnailQuarry::Forest { room: 3, position: player };

        step_snail(&mut snail, quarry, 20.0, 1.0, &mut rng);
        assert!((snail.position.x - 20.0).abs() < 1e-4);

        for _ in 0..20 {
            step_snail(&mut snail, quarry, 20.0, 1.0, &mut rng);
        }
        assert!((snail.position.distance(player) - SNAIL_STOP_DISTANCE).abs() < 1e-3);
    }

    #[test]
    fn test_eventually_hops_to_player_room() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut snail = awake(1, Vec2::ZERO);
        let quarry = SnailQuarry::Forest {
            room: 4,
            position: Vec2::ZERO,
        };
        step_snail(&mut snail, quarry, 20.0, 0.5, &mut rng);
        assert_eq!(snail.room, 1, "no roll before a full second");
        for _ in 0..2000 {
            step_snail(&mut snail, quarry, 20.0, 1.0, &mut rng);
        }
        assert_eq!(snail.room, 4);
    }

    #[test]
    fn test_wanders_while_player_in_shop() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut snail = awake(2, Vec2::ZERO);
        step_snail(&mut snail, SnailQuarry::Shop, 20.0, 1.0, &mut rng);
        assert!((snail.position.length() - 20.0).abs() < 1e-3);
        assert!((snail.wander_timer - SNAIL_WANDER_SECONDS).abs() < 1e-6);
    }

    #[test]
    fn test_shop_wander_stays_on_the_floor() {
        let mut rng = StdRng::seed_from_u64(6);
        let (lo, hi) = shop_bounds();
        let mut snail = awake(2, hi - Vec2::splat(5.0));
        snail.heading = Vec2::X;
        snail.wander_timer = SNAIL_WANDER_SECONDS;
        step_snail(&mut snail, SnailQuarry::Shop, 20.0, 1.0, &mut rng);
        assert_eq!(snail.position.x, hi.x);
        assert_eq!(snail.heading.x, -1.0);

        for _ in 0..5000 {
            step_snail(&mut snail, SnailQuarry::Shop, 200.0, 1.0, &mut rng);
            assert!(snail.position.cmpge(lo).all() && snail.position.cmple(hi).all());
        }
    }

    #[test]
    fn test_sleeping_snail_stays_put() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut snail = Snail::default();
        step_snail(&mut snail, SnailQuarry::Shop, 20.0, 1.0, &mut rng);
        assert_eq!(snail.position, Vec2::ZERO);
    }
}
