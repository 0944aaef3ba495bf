//! Ritual domain: the dawn liberation ceremony.
//!
//! At the start of dawn, if some resident is "in between" (satisfaction
//! 45..=75 and not yet liberated), seven candles, a harp and a sacred table
//! appear around `RITUAL_CENTER`. Lighting every candle, playing the harp and
//! serving a finished drink on the sacred table lets the summoned resident
//! move on. Resetting the breaker ends dawn and clears an unfinished ritual.

use bevy::prelude::*;
use std::f64::consts::PI;

use crate::save::{session_started, LoadCompleteEvent, NewGameEvent};
use crate::shared::*;

pub const LIBERATION_DELAY: f32 = 3.0;
pub const CLEANUP_DELAY: f32 = 2.0;
pub const ELIGIBLE_SATISFACTION: std::ops::RangeInclusive<u8> = 45..=75;

pub const FAREWELL_LINES: [&str; 4] = [
    "Thank you for helping me find peace...",
    "I can finally let go of this world.",
    "The boba you made was perfect - it gave me strength.",
    "I'm ready to move on now. Farewell, kind soul.",
];

pub struct RitualPlugin;

impl Plugin for RitualPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RitualSite>().add_systems(
            Update,
            (
                clear_ritual_on_new_session,
                react_to_phase_change,
                handle_ritual_interactions,
                advance_liberation,
            )
                .chain()
                .run_if(in_state(GameState::Shop).or(in_state(GameState::Forest))),
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// GEOMETRY
// ═══════════════════════════════════════════════════════════════════════

/// Candle `i` sits at angle `i·2π/7 − π/2` on a circle of radius 2.
pub fn candle_cells() -> [GridCoordinate; RITUAL_CANDLE_COUNT] {
    let mut cells = [RITUAL_CENTER; RITUAL_CANDLE_COUNT];
    for (i, cell) in cells.iter_mut().enumerate() {
        let angle = i as f64 * 2.0 * PI / RITUAL_CANDLE_COUNT as f64 - PI / 2.0;
        *cell = RITUAL_CENTER.offset(
            (RITUAL_CANDLE_RADIUS * angle.cos()).round() as i32,
            (RITUAL_CANDLE_RADIUS * angle.sin()).round() as i32,
        );
    }
    cells
}

pub fn harp_cell() -> GridCoordinate {
    RITUAL_CENTER
}

pub fn sacred_table_cell() -> GridCoordinate {
    RITUAL_CENTER.offset(0, -4)
}

// ═══════════════════════════════════════════════════════════════════════
// ELIGIBILITY
// ═══════════════════════════════════════════════════════════════════════

pub fn is_eligible(resident: &Resident, memories: &NpcMemories) -> bool {
    !memories.is_liberated(&resident.id)
        && ELIGIBLE_SATISFACTION.contains(&memories.satisfaction_of(&resident.id))
}

pub fn any_eligible(residents: &Residents, memories: &NpcMemories) -> bool {
    residents
        .residents
        .iter()
        .any(|r| is_eligible(r, memories))
}

/// Highest satisfaction wins; ties keep roster order.
pub fn choose_ritual_npc(residents: &Residents, memories: &NpcMemories) -> Option<NpcId> {
    let mut best: Option<(&Resident, u8)> = None;
    for resident in residents.residents.iter().filter(|r| is_eligible(r, memories)) {
        let score = memories.satisfaction_of(&resident.id);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((resident, score));
        }
    }
    best.map(|(r, _)| r.id.clone())
}

// ═══════════════════════════════════════════════════════════════════════
// RITUAL STATE
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RitualPhase {
    #[default]
    Dormant,
    Available,
    CandlesLit,
    NpcSummoned,
    Completed,
    Liberating,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RitualObject {
    Candle(usize),
    Harp,
    SacredTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RitualOutcome {
    CandleLit(usize),
    AllCandlesLit,
    SummonRequested,
    DrinkAccepted,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RitualTick {
    Liberate(NpcId),
    Finished,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct RitualSite {
    pub phase: RitualPhase,
    pub candles: [bool; RITUAL_CANDLE_COUNT],
    pub summoned: Option<NpcId>,
    pub timer: f32,
    pub farewell: Vec<String>,
}

impl RitualSite {
    pub fn is_active(&self) -> bool {
        self.phase != RitualPhase::Dormant
    }

    pub fn is_ritual_cell(&self, cell: GridCoordinate) -> bool {
        self.is_active()
            && (cell == harp_cell()
                || cell == sacred_table_cell()
                || candle_cells().contains(&cell))
    }

    pub fn lit_count(&self) -> usize {
        self.candles.iter().filter(|lit| **lit).count()
    }

    pub fn open(&mut self) {
        self.reset();
        self.phase = RitualPhase::Available;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn interact(&mut self, cell: GridCoordinate, offering: Option<&Drink>) -> RitualOutcome {
        if let Some(index) = candle_cells().iter().position(|c| *c == cell) {
            if self.phase != RitualPhase::Available || self.candles[index] {
                return RitualOutcome::Ignored;
            }
            self.candles[index] = true;
            if self.lit_count() == RITUAL_CANDLE_COUNT {
                self.phase = RitualPhase::CandlesLit;
                return RitualOutcome::AllCandlesLit;
            }
            return RitualOutcome::CandleLit(index);
        }

        if cell == harp_cell() {
            return if self.phase == RitualPhase::CandlesLit {
                RitualOutcome::SummonRequested
            } else {
                RitualOutcome::Ignored
            };
        }

        if cell == sacred_table_cell()
            && self.phase == RitualPhase::NpcSummoned
            && offering.is_some_and(|d| d.complete)
        {
            self.phase = RitualPhase::Completed;
            self.timer = 0.0;
            self.farewell = FAREWELL_LINES.iter().map(|l| l.to_string()).collect();
            return RitualOutcome::DrinkAccepted;
        }

        RitualOutcome::Ignored
    }

    /// `None` means nobody could be summoned and the ritual is over.
    pub fn summon(&mut self, npc: Option<NpcId>) {
        match npc {
            Some(id) => {
                self.summoned = Some(id);
                self.phase = RitualPhase::NpcSummoned;
            }
            None => self.reset(),
        }
    }

    pub fn tick(&mut self, delta: f32) -> Option<RitualTick> {
        match self.phase {
            RitualPhase::Completed => {
                self.timer += delta;
                if self.timer < LIBERATION_DELAY {
                    return None;
                }
                self.timer = 0.0;
                self.phase = RitualPhase::Liberating;
                self.summoned.clone().map(RitualTick::Liberate)
            }
            RitualPhase::Liberating => {
                self.timer += delta;
                if self.timer < CLEANUP_DELAY {
                    return None;
                }
                self.reset();
                Some(RitualTick::Finished)
            }
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

fn spawn_ritual_objects(commands: &mut Commands) {
    for (i, cell) in candle_cells().into_iter().enumerate() {
        commands.spawn((GameObject::new(cell, ObjectType::Station), RitualObject::Candle(i)));
    }
    commands.spawn((
        GameObject::new(harp_cell(), ObjectType::Station),
        RitualObject::Harp,
    ));
    commands.spawn((
        GameObject::new(sacred_table_cell(), ObjectType::Station),
        RitualObject::SacredTable,
    ));
}

/// Tears the ritual down. A summoned resident who was not liberated goes home.
fn clear_ritual(
    commands: &mut Commands,
    objects: &Query<Entity, With<RitualObject>>,
    site: &mut RitualSite,
    residents: &mut Residents,
) {
    for entity in objects.iter() {
        commands.entity(entity).despawn();
    }
    if let Some(id) = site.summoned.take() {
        if let Some(resident) = residents.get_mut(&id) {
            resident.status = ResidentStatus::AtHome(resident.home_room);
        }
    }
    residents.ritual_npc = None;
    site.reset();
}

/// Whatever ritual the last session left behind does not carry over.
fn clear_ritual_on_new_session(
    mut commands: Commands,
    mut new_games: EventReader<NewGameEvent>,
    mut loads: EventReader<LoadCompleteEvent>,
    mut site: ResMut<RitualSite>,
    mut residents: ResMut<Residents>,
    objects: Query<Entity, With<RitualObject>>,
) {
    if !session_started(&mut new_games, &mut loads) {
        return;
    }
    if site.is_active() || !objects.is_empty() {
        info!("[Ritual] New session; the circle fades");
    }
    clear_ritual(&mut commands, &objects, &mut site, &mut residents);
}

fn react_to_phase_change(
    mut commands: Commands,
    mut events: EventReader<PhaseChangedEvent>,
    mut site: ResMut<RitualSite>,
    mut residents: ResMut<Residents>,
    memories: Res<NpcMemories>,
    objects: Query<Entity, With<RitualObject>>,
) {
    for ev in events.read() {
        if ev.from == TimePhase::Dawn && site.is_active() {
            info!("[Ritual] Dawn ended before the ritual finished; clearing it");
            clear_ritual(&mut commands, &objects, &mut site, &mut residents);
        }

        if ev.to == TimePhase::Dawn && !site.is_active() {
            if any_eligible(&residents, &memories) {
                site.open();
                spawn_ritual_objects(&mut commands);
                info!("[Ritual] A restless spirit lingers. The ritual circle appears");
            } else {
                debug!("[Ritual] No resident is ready for the ritual");
            }
        }
    }
}

fn handle_ritual_interactions(
    mut commands: Commands,
    mut events: EventReader<RitualInteractionEvent>,
    mut site: ResMut<RitualSite>,
    mut residents: ResMut<Residents>,
    mut barista: ResMut<Barista>,
    memories: Res<NpcMemories>,
    objects: Query<Entity, With<RitualObject>>,
) {
    for ev in events.read() {
        match site.interact(ev.cell, ev.offering.as_ref()) {
            RitualOutcome::CandleLit(i) => {
                info!("[Ritual] Candle {} lit ({}/{})", i + 1, site.lit_count(), RITUAL_CANDLE_COUNT);
            }
            RitualOutcome::AllCandlesLit => {
                info!("[Ritual] All candles burn. Play the harp");
            }
            RitualOutcome::SummonRequested => match choose_ritual_npc(&residents, &memories) {
                Some(id) => {
                    if let Some(resident) = residents.get_mut(&id) {
                        resident.status = ResidentStatus::Traveling;
                    }
                    residents.ritual_npc = Some(id.clone());
                    info!("[Ritual] The harp calls {} to the circle", id);
                    site.summon(Some(id));
                }
                None => {
                    info!("[Ritual] The harp plays, but no one answers");
                    clear_ritual(&mut commands, &objects, &mut site, &mut residents);
                }
            },
            RitualOutcome::DrinkAccepted => {
                barista.carrying = None;
                info!("[Ritual] The final drink is served");
            }
            RitualOutcome::Ignored => {
                debug!("[Ritual] Nothing happens at {} ({:?})", ev.cell, site.phase);
            }
        }
    }
}

fn advance_liberation(
    mut commands: Commands,
    time: Res<Time>,
    registry: Res<NpcRegistry>,
    mut site: ResMut<RitualSite>,
    mut residents: ResMut<Residents>,
    mut memories: ResMut<NpcMemories>,
    mut liberated_writer: EventWriter<NpcLiberatedEvent>,
    objects: Query<Entity, With<RitualObject>>,
) {
    match site.tick(time.delta_secs()) {
        Some(RitualTick::Liberate(id)) => {
            if let Some(def) = registry.get(&id) {
                memories.get_or_create(def).is_liberated = true;
            } else if let Some(memory) = memories.memories.get_mut(&id) {
                memory.is_liberated = true;
            }
            residents.residents.retain(|r| r.id != id);
            residents.ritual_npc = None;
            info!("[Ritual] {} has moved on", id);
            liberated_writer.send(NpcLiberatedEvent { npc_id: id });
        }
        Some(RitualTick::Finished) => {
            clear_ritual(&mut commands, &objects, &mut site, &mut residents);
        }
        None => {}
    }
}
