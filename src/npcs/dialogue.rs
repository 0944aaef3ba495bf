//! Talking to residents. One conversation at a time.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::shared::*;

pub const SILENT_LINE: &str = "...";

#[derive(Resource, Debug, Clone, Default)]
pub struct ActiveDialogue {
    pub npc_id: Option<NpcId>,
    pub line: String,
}

impl ActiveDialogue {
    pub fn is_talking_to(&self, id: &str) -> bool {
        self.npc_id.as_deref() == Some(id)
    }
}

/// A random line from the pool matching the time of day.
pub fn pick_line(def: &NpcDef, phase: TimePhase, rng: &mut impl Rng) -> String {
    let pool = if phase.is_night_context() {
        &def.dialogue.night
    } else {
        &def.dialogue.day
    };
    pool.choose(rng)
        .cloned()
        .unwrap_or_else(|| SILENT_LINE.to_string())
}

pub fn start_dialogue(
    mut events: EventReader<TalkToNpcEvent>,
    registry: Res<NpcRegistry>,
    cycle: Res<DayCycle>,
    mut memories: ResMut<NpcMemories>,
    mut active: ResMut<ActiveDialogue>,
) {
    let mut rng = rand::thread_rng();
    for ev in events.read() {
        let Some(def) = registry.get(&ev.npc_id) else {
            warn!("[Dialogue] Unknown NPC '{}'", ev.npc_id);
            continue;
        };
        memories.get_or_create(def).has_met_player = true;
        active.npc_id = Some(def.id.clone());
        active.line = pick_line(def, cycle.phase, &mut rng);
        info!("[Dialogue] {}: \"{}\"", def.name, active.line);
    }
}

pub fn handle_dialogue_response(
    mut events: EventReader<DialogueResponseEvent>,
    registry: Res<NpcRegistry>,
    mut memories: ResMut<NpcMemories>,
    mut active: ResMut<ActiveDialogue>,
) {
    for ev in events.read() {
        let Some(id) = active.npc_id.take() else {
            debug!("[Dialogue] {:?} with nobody to answer", ev.response);
            continue;
        };
        active.line.clear();
        let Some(def) = registry.get(&id) else {
            continue;
        };
        let memory = memories.get_or_create(def);
        memory.record_response(ev.response);
        info!(
            "[Dialogue] {:?} to {}: satisfaction {} ({})",
            ev.response,
            memory.name,
            memory.satisfaction,
            memory.level().display_name()
        );
    }
}
