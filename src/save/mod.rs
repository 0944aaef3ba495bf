use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::npcs::residents::build_residents;
use crate::recipes::journal::RecipeJournal;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// PUBLIC TYPES
// ═══════════════════════════════════════════════════════════════════════

pub const SAVE_VERSION: u32 = 1;
pub const NUM_SAVE_SLOTS: usize = 3;

/// Everything that survives between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    pub slot: u8,
    pub save_timestamp: u64,
    pub day_cycle: DayCycle,
    pub npc_memories: NpcMemories,
    pub shop_memory: ShopMemory,
    pub recipe_journal: RecipeJournal,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Event, Debug, Clone)]
pub struct SaveRequestEvent {
    pub slot: u8,
}

#[derive(Event, Debug, Clone)]
pub struct LoadRequestEvent {
    pub slot: u8,
}

/// Sent by SavePlugin after a save completes (success or failure).
#[derive(Event, Debug, Clone)]
pub struct SaveCompleteEvent {
    pub slot: u8,
    pub success: bool,
    pub error_message: Option<String>,
}

#[derive(Event, Debug, Clone)]
pub struct LoadCompleteEvent {
    pub slot: u8,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Clears all persisted state to defaults.
#[derive(Event, Debug, Clone)]
pub struct NewGameEvent {
    pub active_slot: u8,
}

// ═══════════════════════════════════════════════════════════════════════
// RESOURCES
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Clone, Default)]
pub struct ActiveSaveSlot {
    pub slot: u8,
}

/// Where slot files live. Defaults to `saves/` beside the executable.
#[derive(Resource, Debug, Clone)]
pub struct SaveDirectory {
    pub path: PathBuf,
}

impl Default for SaveDirectory {
    fn default() -> Self {
        Self {
            path: saves_directory(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveSaveSlot>()
            .init_resource::<SaveDirectory>()
            .add_event::<SaveRequestEvent>()
            .add_event::<LoadRequestEvent>()
            .add_event::<SaveCompleteEvent>()
            .add_event::<LoadCompleteEvent>()
            .add_event::<NewGameEvent>()
            // The title screen decides between continuing and starting fresh.
            .add_systems(OnEnter(GameState::Title), start_session)
            .add_systems(
                Update,
                (
                    autosave_on_phase_change,
                    autosave_on_liberation,
                    handle_save_request,
                    handle_load_request,
                    fall_back_to_new_game.run_if(in_state(GameState::Title)),
                    handle_new_game,
                    finish_title.run_if(in_state(GameState::Title)),
                )
                    .chain()
                    .run_if(
                        in_state(GameState::Title)
                            .or(in_state(GameState::Shop))
                            .or(in_state(GameState::Forest)),
                    ),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// FILESYSTEM HELPERS
// ═══════════════════════════════════════════════════════════════════════

fn saves_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    exe_dir.join("saves")
}

pub fn slot_path(dir: &Path, slot: u8) -> PathBuf {
    dir.join(format!("slot_{}.json", slot))
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ═══════════════════════════════════════════════════════════════════════
// SAVE / LOAD LOGIC
// ═══════════════════════════════════════════════════════════════════════

fn check_slot(slot: u8) -> Result<(), String> {
    if (slot as usize) < NUM_SAVE_SLOTS {
        Ok(())
    } else {
        Err(format!(
            "Save slot {} is out of range (0..{})",
            slot, NUM_SAVE_SLOTS
        ))
    }
}

pub fn write_save(dir: &Path, file: &SaveFile) -> Result<(), String> {
    check_slot(file.slot)?;
    fs::create_dir_all(dir).map_err(|e| format!("Could not create saves directory: {}", e))?;

    let json =
        serde_json::to_string_pretty(file).map_err(|e| format!("Serialization failed: {}", e))?;

    let path = slot_path(dir, file.slot);
    // Temp file first, then rename over the slot.
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json)
        .map_err(|e| format!("Write failed for {}: {}", tmp_path.display(), e))?;
    fs::rename(&tmp_path, &path).map_err(|e| format!("Rename failed: {}", e))?;

    Ok(())
}

pub fn read_save(dir: &Path, slot: u8) -> Result<SaveFile, String> {
    check_slot(slot)?;
    let path = slot_path(dir, slot);
    if !path.exists() {
        return Err(format!("Save slot {} does not exist", slot));
    }
    let json = fs::read_to_string(&path)
        .map_err(|e| format!("Read failed for {}: {}", path.display(), e))?;
    let file: SaveFile =
        serde_json::from_str(&json).map_err(|e| format!("Deserialization failed: {}", e))?;

    if file.version != SAVE_VERSION {
        warn!(
            "[Save] Slot {} has version {} but current version is {}. Loading anyway.",
            slot, file.version, SAVE_VERSION
        );
    }

    Ok(file)
}

pub fn slot_exists(dir: &Path, slot: u8) -> bool {
    slot_path(dir, slot).exists()
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Drains both readers. `true` when a new game started or a slot loaded, so
/// other domains can drop whatever the previous session left in the world.
pub fn session_started(
    new_games: &mut EventReader<NewGameEvent>,
    loads: &mut EventReader<LoadCompleteEvent>,
) -> bool {
    let fresh = new_games.read().count() > 0;
    let loaded = loads.read().filter(|ev| ev.success).count() > 0;
    fresh || loaded
}

/// Continue from slot 0 when it exists, otherwise start fresh.
fn start_session(
    dir: Res<SaveDirectory>,
    mut load_writer: EventWriter<LoadRequestEvent>,
    mut new_game_writer: EventWriter<NewGameEvent>,
) {
    if slot_exists(&dir.path, 0) {
        info!("[Save] Continuing from slot 0");
        load_writer.send(LoadRequestEvent { slot: 0 });
    } else {
        info!("[Save] No save found, starting a new game");
        new_game_writer.send(NewGameEvent { active_slot: 0 });
    }
}

/// A slot that fails to load at the title screen falls back to a fresh game.
fn fall_back_to_new_game(
    mut load_done: EventReader<LoadCompleteEvent>,
    mut new_game_writer: EventWriter<NewGameEvent>,
) {
    for ev in load_done.read().filter(|ev| !ev.success) {
        new_game_writer.send(NewGameEvent {
            active_slot: ev.slot,
        });
    }
}

/// Heads into the shop once the session state is settled.
fn finish_title(
    mut load_done: EventReader<LoadCompleteEvent>,
    mut new_game: EventReader<NewGameEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let loaded = load_done.read().any(|ev| ev.success);
    let started = new_game.read().count() > 0;
    if loaded || started {
        next_state.set(GameState::Shop);
    }
}

fn handle_save_request(
    mut save_events: EventReader<SaveRequestEvent>,
    mut complete_events: EventWriter<SaveCompleteEvent>,
    mut active_slot: ResMut<ActiveSaveSlot>,
    dir: Res<SaveDirectory>,
    cycle: Res<DayCycle>,
    memories: Res<NpcMemories>,
    shop_memory: Res<ShopMemory>,
    journal: Res<RecipeJournal>,
) {
    for ev in save_events.read() {
        let slot = ev.slot;
        active_slot.slot = slot;

        let file = SaveFile {
            version: SAVE_VERSION,
            slot,
            save_timestamp: current_timestamp(),
            day_cycle: cycle.clone(),
            npc_memories: memories.clone(),
            shop_memory: shop_memory.clone(),
            recipe_journal: journal.clone(),
        };

        match write_save(&dir.path, &file) {
            Ok(()) => {
                info!("[Save] Saved to slot {}", slot);
                complete_events.send(SaveCompleteEvent {
                    slot,
                    success: true,
                    error_message: None,
                });
            }
            Err(e) => {
                warn!("[Save] Save to slot {} failed: {}", slot, e);
                complete_events.send(SaveCompleteEvent {
                    slot,
                    success: false,
                    error_message: Some(e),
                });
            }
        }
    }
}

fn handle_load_request(
    mut load_events: EventReader<LoadRequestEvent>,
    mut complete_events: EventWriter<LoadCompleteEvent>,
    mut active_slot: ResMut<ActiveSaveSlot>,
    dir: Res<SaveDirectory>,
    registry: Res<NpcRegistry>,
    mut cycle: ResMut<DayCycle>,
    mut memories: ResMut<NpcMemories>,
    mut shop_memory: ResMut<ShopMemory>,
    mut journal: ResMut<RecipeJournal>,
    mut residents: ResMut<Residents>,
    mut barista: ResMut<Barista>,
) {
    for ev in load_events.read() {
        let slot = ev.slot;

        match read_save(&dir.path, slot) {
            Ok(file) => {
                active_slot.slot = slot;
                *cycle = file.day_cycle;
                *memories = file.npc_memories;
                *shop_memory = file.shop_memory;
                *journal = file.recipe_journal;

                // Liberated residents stay gone.
                let mut roster = build_residents(&registry);
                roster.residents.retain(|r| !memories.is_liberated(&r.id));
                *residents = roster;
                barista.carrying = None;

                info!(
                    "[Save] Loaded slot {} ({} {:.0}s, cycle {})",
                    slot,
                    cycle.phase.display_name(),
                    cycle.elapsed,
                    cycle.cycle_count
                );
                complete_events.send(LoadCompleteEvent {
                    slot,
                    success: true,
                    error_message: None,
                });
            }
            Err(e) => {
                warn!("[Save] Load from slot {} failed: {}", slot, e);
                complete_events.send(LoadCompleteEvent {
                    slot,
                    success: false,
                    error_message: Some(e),
                });
            }
        }
    }
}

fn handle_new_game(
    mut new_game_events: EventReader<NewGameEvent>,
    mut active_slot: ResMut<ActiveSaveSlot>,
    registry: Res<NpcRegistry>,
    mut cycle: ResMut<DayCycle>,
    mut memories: ResMut<NpcMemories>,
    mut shop_memory: ResMut<ShopMemory>,
    mut journal: ResMut<RecipeJournal>,
    mut residents: ResMut<Residents>,
    mut barista: ResMut<Barista>,
) {
    for ev in new_game_events.read() {
        active_slot.slot = ev.active_slot;

        *cycle = DayCycle::default();
        *memories = NpcMemories::default();
        *shop_memory = ShopMemory::default();
        *journal = RecipeJournal::default();
        *residents = build_residents(&registry);
        barista.carrying = None;

        info!("[Save] New game in slot {}", ev.active_slot);
    }
}

fn autosave_on_phase_change(
    mut phase_events: EventReader<PhaseChangedEvent>,
    mut save_writer: EventWriter<SaveRequestEvent>,
    active_slot: Res<ActiveSaveSlot>,
) {
    for ev in phase_events.read() {
        debug!("[Save] Autosave at {:?} -> {:?}", ev.from, ev.to);
        save_writer.send(SaveRequestEvent {
            slot: active_slot.slot,
        });
    }
}

fn autosave_on_liberation(
    mut liberated_events: EventReader<NpcLiberatedEvent>,
    mut save_writer: EventWriter<SaveRequestEvent>,
    active_slot: Res<ActiveSaveSlot>,
) {
    for ev in liberated_events.read() {
        debug!("[Save] Autosave after {} moved on", ev.npc_id);
        save_writer.send(SaveRequestEvent {
            slot: active_slot.slot,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "boba_save_test_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample(slot: u8) -> SaveFile {
        let mut memories = NpcMemories::default();
        let mut memory = NpcMemory::new("willow", "Willow", "deer");
        memory.record_drink();
        memories.memories.insert("willow".into(), memory);

        let mut shop_memory = ShopMemory::default();
        shop_memory.record_customer(true);
        shop_memory.world_flags.insert("met_snail".into(), true);

        SaveFile {
            version: SAVE_VERSION,
            slot,
            save_timestamp: 42,
            day_cycle: DayCycle {
                phase: TimePhase::Night,
                elapsed: 12.5,
                time_active: true,
                breaker_tripped: false,
                cycle_count: 3,
            },
            npc_memories: memories,
            shop_memory,
            recipe_journal: RecipeJournal::default(),
        }
    }

    #[test]
    fn test_write_then_read_slot() {
        let dir = temp_dir("roundtrip");
        write_save(&dir, &sample(1)).unwrap();
        assert!(slot_exists(&dir, 1));
        assert!(!slot_exists(&dir, 0));
        assert!(!slot_path(&dir, 1).with_extension("json.tmp").exists());

        let loaded = read_save(&dir, 1).unwrap();
        assert_eq!(loaded.slot, 1);
        assert_eq!(loaded.day_cycle.phase, TimePhase::Night);
        assert_eq!(loaded.day_cycle.cycle_count, 3);
        assert_eq!(loaded.npc_memories.satisfaction_of("willow"), 55);
        assert_eq!(loaded.shop_memory.customers_served, 1);
        assert_eq!(loaded.shop_memory.world_flags.get("met_snail"), Some(&true));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_slot_is_an_error() {
        let dir = temp_dir("missing");
        let err = read_save(&dir, 2).unwrap_err();
        assert!(err.contains("does not exist"));
    }

    #[test]
    fn test_slot_out_of_range() {
        let dir = temp_dir("range");
        assert!(write_save(&dir, &sample(3)).is_err());
        assert!(read_save(&dir, 7).unwrap_err().contains("out of range"));
    }

    #[test]
    fn test_corrupt_slot_reports_deserialization() {
        let dir = temp_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(slot_path(&dir, 0), "{ not json").unwrap();
        assert!(read_save(&dir, 0).unwrap_err().contains("Deserialization failed"));
        let _ = fs::remove_dir_all(&dir);
    }
}
