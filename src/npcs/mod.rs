//! NPC domain plugin for Boba at Dawn.
//!
//! Covers the customers walking around the shop (behaviour + spawner) and the
//! named forest residents behind some of them: where they are, what they
//! remember about the barista, and what they say.

use bevy::prelude::*;

use crate::shared::*;

pub mod behavior;
pub mod dialogue;
pub mod residents;
pub mod spawning;

pub use behavior::ShopNpc;
pub use dialogue::ActiveDialogue;
pub use spawning::ShopSpawner;

pub struct NpcPlugin;

impl Plugin for NpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NpcRegistry>()
            .init_resource::<Residents>()
            .init_resource::<NpcMemories>()
            .init_resource::<ShopMemory>()
            .init_resource::<ShopSpawner>()
            .init_resource::<ActiveDialogue>();

        app.add_systems(
            Update,
            (
                spawning::clear_customers_on_new_session,
                residents::dismiss_residents_on_phase_change,
                behavior::update_shop_npcs,
                spawning::spawn_customers,
                residents::handle_npc_departures,
                residents::tick_resident_cooldowns,
            )
                .chain()
                .run_if(in_state(GameState::Shop).or(in_state(GameState::Forest))),
        );

        app.add_systems(
            Update,
            (dialogue::start_dialogue, dialogue::handle_dialogue_response)
                .chain()
                .run_if(in_state(GameState::Shop).or(in_state(GameState::Forest))),
        );
    }
}

/// Emoji for a resident's species as written in the NPC database.
pub fn animal_emoji(animal: &str) -> &'static str {
    match animal.to_lowercase().as_str() {
        "deer" => "🦌",
        "rabbit" => "🐰",
        "wolf" => "🐺",
        "mule" => "🐴",
        "pufferfish" => "🐡",
        "owl" => "🦉",
        "fox" => "🦊",
        "songbird" => "🐦",
        "bear" => "🐻",
        "mouse" => "🐭",
        _ => "🦔",
    }
}
