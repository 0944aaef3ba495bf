mod shared;
mod config;
mod grid;
mod time;
mod recipes;
mod brewing;
mod player;
mod npcs;
mod forest;
mod ritual;
mod save;
mod data;

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use shared::*;

const TICKS_PER_SECOND: f64 = 60.0;

fn main() {
    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / TICKS_PER_SECOND,
            ))),
        )
        .add_plugins(LogPlugin::default())
        .add_plugins(StatesPlugin)
        // Game state
        .init_state::<GameState>()
        // Events
        .add_event::<PhaseChangedEvent>()
        .add_event::<PhaseProgressEvent>()
        .add_event::<BreakerTrippedEvent>()
        .add_event::<ResetBreakerEvent>()
        .add_event::<ToggleTimeFlowEvent>()
        .add_event::<PlayerActionEvent>()
        .add_event::<DrinkCompletedEvent>()
        .add_event::<NpcDepartedEvent>()
        .add_event::<TalkToNpcEvent>()
        .add_event::<DialogueResponseEvent>()
        .add_event::<EnterForestEvent>()
        .add_event::<ReturnToShopEvent>()
        .add_event::<ChangeRoomEvent>()
        .add_event::<RoomChangedEvent>()
        .add_event::<RitualInteractionEvent>()
        .add_event::<NpcLiberatedEvent>()
        // Domain plugins
        .add_plugins(config::ConfigPlugin)
        .add_plugins(grid::GridPlugin)
        .add_plugins(time::DayCyclePlugin)
        .add_plugins(recipes::RecipePlugin)
        .add_plugins(brewing::BrewingPlugin)
        .add_plugins(player::PlayerPlugin)
        .add_plugins(npcs::NpcPlugin)
        .add_plugins(forest::ForestPlugin)
        .add_plugins(ritual::RitualPlugin)
        .add_plugins(save::SavePlugin)
        // Data loading
        .add_plugins(data::DataPlugin)
        .run();
}
