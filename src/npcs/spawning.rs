//! Customer spawner: how often someone walks in, and who.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use super::behavior::ShopNpc;
use super::dialogue::ActiveDialogue;
use crate::grid::{GridWorld, DEFAULT_SEARCH_RADIUS};
use crate::save::{session_started, LoadCompleteEvent, NewGameEvent};
use crate::shared::*;

#[derive(Resource, Debug, Clone, Default)]
pub struct ShopSpawner {
    pub timer: f32,
}

/// Seconds until the next customer. Busier shops slow down, a waiting drink
/// speeds things up.
pub fn spawn_interval(
    phase: TimePhase,
    npc_count: usize,
    any_table_has_drink: bool,
    tuning: &SpawnTuning,
) -> f32 {
    let occupancy = npc_count as f32 / tuning.max_npcs.max(1) as f32;
    let mut interval = tuning.base_interval(phase) * (1.0 + occupancy * tuning.occupancy_factor);
    if any_table_has_drink {
        interval *= tuning.drink_bonus;
    }
    interval
}

/// Residents who could walk over from the forest right now.
pub fn available_residents<'a>(
    residents: &'a Residents,
    memories: &NpcMemories,
) -> Vec<&'a Resident> {
    residents
        .residents
        .iter()
        .filter(|r| r.is_available_for_shop())
        .filter(|r| !memories.is_liberated(&r.id))
        .filter(|r| residents.ritual_npc.as_deref() != Some(r.id.as_str()))
        .collect()
}

/// Day brings residents when one is free. Anyone else is an anonymous
/// visitor; at night some of those are night animals.
pub fn choose_visitor(
    phase: TimePhase,
    residents: &Residents,
    registry: &NpcRegistry,
    memories: &NpcMemories,
    tuning: &SpawnTuning,
    rng: &mut impl Rng,
) -> (AnimalType, Option<NpcId>) {
    if phase == TimePhase::Day {
        if let Some(resident) = available_residents(residents, memories).choose(rng) {
            let animal = registry
                .get(&resident.id)
                .map(|def| AnimalType::from_species(&def.animal))
                .unwrap_or(AnimalType::Hedgehog);
            return (animal, Some(resident.id.clone()));
        }
    }

    let night_visitor =
        phase == TimePhase::Night && rng.gen_range(0..10) < tuning.night_visitor_chance;
    let pool: &[AnimalType] = if night_visitor {
        &AnimalType::NIGHT_ANIMALS
    } else {
        &AnimalType::DAY_ANIMALS
    };
    let animal = pool.choose(rng).copied().unwrap_or(AnimalType::Hedgehog);
    (animal, None)
}

pub fn spawn_customers(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GameConfig>,
    cycle: Res<DayCycle>,
    registry: Res<NpcRegistry>,
    memories: Res<NpcMemories>,
    mut spawner: ResMut<ShopSpawner>,
    mut grid: ResMut<GridWorld>,
    mut residents: ResMut<Residents>,
    npcs: Query<(), With<ShopNpc>>,
    tables: Query<&Table>,
) {
    // Nobody walks in while the clock is stopped.
    if !cycle.time_active || cycle.breaker_tripped {
        return;
    }

    let count = npcs.iter().count();
    if count >= config.spawn.max_npcs {
        return;
    }

    spawner.timer += time.delta_secs();
    let any_drink = tables.iter().any(|t| t.drink.is_some());
    let interval = spawn_interval(cycle.phase, count, any_drink, &config.spawn);
    if spawner.timer < interval {
        return;
    }
    spawner.timer = 0.0;

    let Some(cell) = grid.find_nearest_available_cell(DOOR_CELL, DEFAULT_SEARCH_RADIUS) else {
        warn!("[Npcs] Door is blocked; nobody can come in");
        return;
    };

    let mut rng = rand::thread_rng();
    let (animal, resident) = choose_visitor(
        cycle.phase,
        &residents,
        &registry,
        &memories,
        &config.spawn,
        &mut rng,
    );

    if let Some(id) = &resident {
        if let Some(r) = residents.get_mut(id) {
            r.status = ResidentStatus::InShop;
        }
    }

    grid.reserve_cell(cell);
    info!(
        "[Npcs] {} walks in at {}{}",
        animal.emoji(),
        cell,
        resident
            .as_deref()
            .map(|id| format!(" ({})", id))
            .unwrap_or_default()
    );
    commands.spawn(ShopNpc::new(animal, resident, cell, &config.npc, &mut rng));
}

/// A new or loaded session starts with an empty shop and nobody mid-sentence.
pub fn clear_customers_on_new_session(
    mut commands: Commands,
    mut new_games: EventReader<NewGameEvent>,
    mut loads: EventReader<LoadCompleteEvent>,
    mut grid: ResMut<GridWorld>,
    mut spawner: ResMut<ShopSpawner>,
    mut dialogue: ResMut<ActiveDialogue>,
    npcs: Query<(Entity, &ShopNpc)>,
) {
    if !session_started(&mut new_games, &mut loads) {
        return;
    }
    let mut cleared = 0;
    for (entity, npc) in &npcs {
        grid.free_cell(npc.cell);
        commands.entity(entity).despawn();
        cleared += 1;
    }
    *spawner = ShopSpawner::default();
    *dialogue = ActiveDialogue::default();
    if cleared > 0 {
        info!("[Npcs] New session; {} customers sent away", cleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn registry() -> NpcRegistry {
        let def = |id: &str, animal: &str| NpcDef {
            id: id.into(),
            name: id.into(),
            animal: animal.into(),
            cause_of_death: String::new(),
            home_room: 1,
            dialogue: NpcDialogueLines::default(),
        };
        NpcRegistry {
            npcs: vec![def("reynard", "fox"), def("hazel", "rabbit")],
        }
    }

    #[test]
    fn test_interval_scaling() {
        let tuning = SpawnTuning::default();
        assert_eq!(spawn_interval(TimePhase::Day, 0, false, &tuning), 15.0);
        assert!((spawn_interval(TimePhase::Day, 3, false, &tuning) - 22.5).abs() < 1e-4);
        assert!((spawn_interval(TimePhase::Dusk, 0, true, &tuning) - 17.5).abs() < 1e-4);
        assert_eq!(spawn_interval(TimePhase::Night, 0, false, &tuning), 45.0);
        assert!(spawn_interval(TimePhase::Dawn, 0, false, &tuning) >= 999.0);
    }

    #[test]
    fn test_day_brings_available_residents() {
        let registry = registry();
        let mut residents = Residents::default();
        residents.residents.push(Resident::new("reynard", 1));
        let memories = NpcMemories::default();
        let mut rng = StdRng::seed_from_u64(1);

        let (animal, id) = choose_visitor(
            TimePhase::Day,
            &residents,
            &registry,
            &memories,
            &SpawnTuning::default(),
            &mut rng,
        );
        assert_eq!(animal, AnimalType::Fox);
        assert_eq!(id.as_deref(), Some("reynard"));
    }

    #[test]
    fn test_unavailable_residents_are_skipped() {
        let registry = registry();
        let mut residents = Residents::default();
        let mut cooling = Resident::new("reynard", 1);
        cooling.drink_cooldown = 100.0;
        let mut away = Resident::new("hazel", 2);
        away.status = ResidentStatus::InShop;
        residents.residents = vec![cooling, away];
        let memories = NpcMemories::default();
        assert!(available_residents(&residents, &memories).is_empty());

        let mut rng = StdRng::seed_from_u64(2);
        let (animal, id) = choose_visitor(
            TimePhase::Day,
            &residents,
            &registry,
            &memories,
            &SpawnTuning::default(),
            &mut rng,
        );
        assert_eq!(id, None);
        assert!(AnimalType::DAY_ANIMALS.contains(&animal));
    }

    #[test]
    fn test_liberated_and_ritual_residents_stay_home() {
        let mut residents = Residents::default();
        residents.residents = vec![Resident::new("reynard", 1), Resident::new("hazel", 1)];
        residents.ritual_npc = Some("hazel".into());
        let mut memories = NpcMemories::default();
        let mut memory = NpcMemory::new("reynard", "Reynard", "fox");
        memory.is_liberated = true;
        memories.memories.insert("reynard".into(), memory);
        assert!(available_residents(&residents, &memories).is_empty());
    }

    #[test]
    fn test_residents_only_visit_by_day() {
        let registry = registry();
        let mut residents = Residents::default();
        residents.residents.push(Resident::new("reynard", 1));
        let memories = NpcMemories::default();
        let mut rng = StdRng::seed_from_u64(3);
        for phase in [TimePhase::Dusk, TimePhase::Night, TimePhase::Dawn] {
            let (_, id) = choose_visitor(
                phase,
                &residents,
                &registry,
                &memories,
                &SpawnTuning::default(),
                &mut rng,
            );
            assert_eq!(id, None);
        }
    }

    fn spawner_app(cycle: DayCycle) -> App {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<GameConfig>()
            .init_resource::<NpcRegistry>()
            .init_resource::<NpcMemories>()
            .init_resource::<Residents>()
            .init_resource::<ShopSpawner>()
            .init_resource::<GridWorld>()
            .insert_resource(cycle)
            .add_systems(Update, spawn_customers);
        app
    }

    fn tick(app: &mut App, seconds: u64) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(std::time::Duration::from_secs(seconds));
        app.update();
    }

    fn customers(app: &mut App) -> usize {
        app.world_mut()
            .query::<&ShopNpc>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn test_no_customers_while_the_clock_is_stopped() {
        let tripped = DayCycle {
            phase: TimePhase::Night,
            time_active: false,
            breaker_tripped: true,
            ..Default::default()
        };
        let mut app = spawner_app(tripped);
        for _ in 0..3 {
            tick(&mut app, 1000);
        }
        assert_eq!(customers(&mut app), 0);
        assert_eq!(app.world().resource::<ShopSpawner>().timer, 0.0);

        // Paused without a trip is just as still.
        {
            let mut cycle = app.world_mut().resource_mut::<DayCycle>();
            cycle.breaker_tripped = false;
        }
        tick(&mut app, 1000);
        assert_eq!(customers(&mut app), 0);

        app.world_mut().resource_mut::<DayCycle>().time_active = true;
        tick(&mut app, 1000);
        assert_eq!(customers(&mut app), 1);
        assert!(app.world().resource::<GridWorld>().is_reserved(DOOR_CELL));
    }

    #[test]
    fn test_night_visitor_chance() {
        let tuning = SpawnTuning {
            night_visitor_chance: 10,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(4);
        let empty = Residents::default();
        for _ in 0..20 {
            let (animal, _) = choose_visitor(
                TimePhase::Night,
                &empty,
                &NpcRegistry::default(),
                &NpcMemories::default(),
                &tuning,
                &mut rng,
            );
            assert!(animal.is_night_visitor());
        }

        let never = SpawnTuning {
            night_visitor_chance: 0,
            ..Default::default()
        };
        for _ in 0..20 {
            let (animal, _) = choose_visitor(
                TimePhase::Night,
                &empty,
                &NpcRegistry::default(),
                &NpcMemories::default(),
                &never,
                &mut rng,
            );
            assert!(!animal.is_night_visitor());
        }
    }
}
