//! Data layer: populates the registries at startup.
//!
//! Runs in OnEnter(GameState::Loading), fills the RecipeBook from the house
//! recipe table and the NpcRegistry from the bundled dialogue JSON, then
//! moves on to GameState::Title.
//!
//! Other domains read these resources once GameState has advanced past
//! Loading.

pub mod recipes;

use bevy::prelude::*;

use crate::npcs::residents::build_residents;
use crate::shared::*;

const BUNDLED_NPC_DIALOGUE: &str = include_str!("npc_dialogue.json");

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Loading), load_all_data);
    }
}

pub fn parse_npc_database(json: &str) -> Result<NpcDatabase, String> {
    serde_json::from_str(json).map_err(|e| format!("NPC dialogue parse failed: {}", e))
}

/// The database compiled into the binary. An unreadable file yields no NPCs.
pub fn bundled_npc_database() -> NpcDatabase {
    match parse_npc_database(BUNDLED_NPC_DIALOGUE) {
        Ok(db) => db,
        Err(e) => {
            warn!("[Data] {}", e);
            NpcDatabase::default()
        }
    }
}

fn load_all_data(
    mut recipe_book: ResMut<RecipeBook>,
    mut npc_registry: ResMut<NpcRegistry>,
    mut residents: ResMut<Residents>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    info!("[Data] Populating registries");

    recipes::populate_recipes(&mut recipe_book);
    info!("[Data] Recipes loaded: {}", recipe_book.recipes.len());

    let db = bundled_npc_database();
    if db.npcs.is_empty() {
        warn!("[Data] No NPCs loaded; the forest will be empty");
    }
    npc_registry.npcs = db.npcs;
    *residents = build_residents(&npc_registry);
    info!(
        "[Data] NPCs loaded: {} across {} rooms",
        npc_registry.npcs.len(),
        (1..=FOREST_ROOM_COUNT)
            .filter(|room| !residents.residents_in_room(*room).is_empty())
            .count()
    );

    next_state.set(GameState::Title);
}
