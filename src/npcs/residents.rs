//! Forest residents: who is home, who is visiting the shop, and what happens
//! when a visit ends.

use bevy::prelude::*;

use super::behavior::ShopNpc;
use crate::grid::GridWorld;
use crate::shared::*;

/// Everyone in the registry starts at home with no cooldown.
pub fn build_residents(registry: &NpcRegistry) -> Residents {
    Residents {
        residents: registry
            .npcs
            .iter()
            .map(|def| Resident::new(def.id.clone(), def.home_room.clamp(1, FOREST_ROOM_COUNT)))
            .collect(),
        ritual_npc: None,
    }
}

/// Dusk, night and dawn close the shop to residents.
pub fn phase_sends_residents_home(phase: TimePhase) -> bool {
    matches!(phase, TimePhase::Dusk | TimePhase::Night | TimePhase::Dawn)
}

pub fn should_dismiss(resident_id: &str, to: TimePhase, residents: &Residents) -> bool {
    if !phase_sends_residents_home(to) {
        return false;
    }
    !(to == TimePhase::Dawn && residents.ritual_npc.as_deref() == Some(resident_id))
}

pub fn return_home(residents: &mut Residents, id: &str, cooldown: f32) {
    if let Some(resident) = residents.get_mut(id) {
        resident.status = ResidentStatus::AtHome(resident.home_room);
        resident.drink_cooldown = cooldown;
    }
}

pub fn tick_cooldowns(residents: &mut Residents, delta: f32) {
    for resident in residents.residents.iter_mut() {
        if resident.drink_cooldown > 0.0 {
            resident.drink_cooldown = (resident.drink_cooldown - delta).max(0.0);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Resident customers walk home, happy, when the shop closes to them.
pub fn dismiss_residents_on_phase_change(
    mut commands: Commands,
    mut events: EventReader<PhaseChangedEvent>,
    residents: Res<Residents>,
    mut grid: ResMut<GridWorld>,
    npcs: Query<(Entity, &ShopNpc)>,
    mut departed_writer: EventWriter<NpcDepartedEvent>,
) {
    for ev in events.read() {
        for (entity, npc) in &npcs {
            let Some(id) = &npc.resident else {
                continue;
            };
            if !should_dismiss(id, ev.to, &residents) {
                continue;
            }
            grid.free_cell(npc.cell);
            commands.entity(entity).despawn();
            info!("[Npcs] {} heads home for {}", id, ev.to.display_name());
            departed_writer.send(NpcDepartedEvent {
                resident: Some(id.clone()),
                animal: npc.animal,
                satisfied: true,
            });
        }
    }
}

pub fn tick_resident_cooldowns(time: Res<Time>, mut residents: ResMut<Residents>) {
    tick_cooldowns(&mut residents, time.delta_secs());
}

pub fn handle_npc_departures(
    mut events: EventReader<NpcDepartedEvent>,
    config: Res<GameConfig>,
    registry: Res<NpcRegistry>,
    mut residents: ResMut<Residents>,
    mut memories: ResMut<NpcMemories>,
    mut shop_memory: ResMut<ShopMemory>,
) {
    for ev in events.read() {
        shop_memory.record_customer(ev.satisfied);

        let Some(id) = &ev.resident else {
            continue;
        };
        return_home(&mut residents, id, config.resident_cooldown);
        if ev.satisfied {
            if let Some(def) = registry.get(id) {
                let memory = memories.get_or_create(def);
                memory.record_drink();
                debug!(
                    "[Npcs] {} is {} ({})",
                    memory.name,
                    memory.level().display_name(),
                    memory.satisfaction
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NpcRegistry {
        let def = |id: &str, room: u8| NpcDef {
            id: id.into(),
            name: id.into(),
            animal: "deer".into(),
            cause_of_death: String::new(),
            home_room: room,
            dialogue: NpcDialogueLines::default(),
        };
        NpcRegistry {
            npcs: vec![def("a", 1), def("b", 3), def("c", 3), def("d", 9)],
        }
    }

    #[test]
    fn test_build_residents_all_home() {
        let residents = build_residents(&registry());
        assert_eq!(residents.residents.len(), 4);
        assert_eq!(residents.forest_count(), 4);
        assert_eq!(residents.shop_count(), 0);
        assert_eq!(residents.residents_in_room(3).len(), 2);
        // Out-of-range rooms are clamped.
        assert_eq!(residents.get("d").unwrap().home_room, 5);
        assert!(residents.residents.iter().all(|r| r.is_available_for_shop()));
    }

    #[test]
    fn test_dismissal_phases() {
        let mut residents = build_residents(&registry());
        assert!(!should_dismiss("a", TimePhase::Day, &residents));
        assert!(should_dismiss("a", TimePhase::Dusk, &residents));
        assert!(should_dismiss("a", TimePhase::Night, &residents));
        assert!(should_dismiss("a", TimePhase::Dawn, &residents));

        residents.ritual_npc = Some("a".into());
        assert!(!should_dismiss("a", TimePhase::Dawn, &residents));
        assert!(should_dismiss("a", TimePhase::Night, &residents));
        assert!(should_dismiss("b", TimePhase::Dawn, &residents));
    }

    #[test]
    fn test_return_home_sets_cooldown_and_ticks_down() {
        let mut residents = build_residents(&registry());
        residents.get_mut("b").unwrap().status = ResidentStatus::InShop;
        assert_eq!(residents.shop_count(), 1);

        return_home(&mut residents, "b", 300.0);
        let b = residents.get("b").unwrap();
        assert_eq!(b.status, ResidentStatus::AtHome(3));
        assert!(!b.is_available_for_shop());

        tick_cooldowns(&mut residents, 299.0);
        assert!(!residents.get("b").unwrap().is_available_for_shop());
        tick_cooldowns(&mut residents, 5.0);
        let b = residents.get("b").unwrap();
        assert_eq!(b.drink_cooldown, 0.0);
        assert!(b.is_available_for_shop());
    }
}
