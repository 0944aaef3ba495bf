//! Shared components, resources, events, and states for Boba at Dawn.
//!
//! This is the type contract. Every domain plugin imports from here.
//! Domains only reach into each other for a handful of resources that
//! belong to a single owner (the grid, the ritual area).

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE: top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    Title,
    Shop,
    Forest,
}

// ═══════════════════════════════════════════════════════════════════════
// GRID
// ═══════════════════════════════════════════════════════════════════════

/// A single cell in the 33×25 shop grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoordinate {
    pub x: i32,
    pub y: i32,
}

impl GridCoordinate {
    pub const INVALID: GridCoordinate = GridCoordinate { x: -1, y: -1 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_valid(self) -> bool {
        self.x >= 0 && self.x < GRID_WIDTH && self.y >= 0 && self.y < GRID_HEIGHT
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Up, down, left, right.
    pub fn adjacent_cells(self) -> [GridCoordinate; 4] {
        [
            self.offset(0, 1),
            self.offset(0, -1),
            self.offset(-1, 0),
            self.offset(1, 0),
        ]
    }

    pub fn manhattan_distance(self, other: GridCoordinate) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    /// Small portable items.
    Drink,
    /// Large arrangeable items.
    Furniture,
    Station,
    /// Finished drinks. Carried, never rotated.
    CompletedDrink,
    Table,
}

impl ObjectType {
    pub fn can_be_carried(self) -> bool {
        matches!(
            self,
            ObjectType::Drink | ObjectType::Furniture | ObjectType::CompletedDrink
        )
    }

    pub fn is_rotatable(self) -> bool {
        !matches!(self, ObjectType::CompletedDrink)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RotationState {
    #[default]
    North,
    East,
    South,
    West,
}

impl RotationState {
    pub fn next(self) -> Self {
        match self {
            RotationState::North => RotationState::East,
            RotationState::East => RotationState::South,
            RotationState::South => RotationState::West,
            RotationState::West => RotationState::North,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            RotationState::North => 0,
            RotationState::East => 90,
            RotationState::South => 180,
            RotationState::West => 270,
        }
    }
}

/// Anything that sits on a grid cell: furniture, stations, tables, loose drinks.
#[derive(Component, Debug, Clone)]
pub struct GameObject {
    pub cell: GridCoordinate,
    pub object_type: ObjectType,
    pub rotation: RotationState,
}

impl GameObject {
    pub fn new(cell: GridCoordinate, object_type: ObjectType) -> Self {
        Self {
            cell,
            object_type,
            rotation: RotationState::North,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// DAY / NIGHT CYCLE
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePhase {
    Dawn,
    Day,
    Dusk,
    Night,
}

impl TimePhase {
    pub const ALL: [TimePhase; 4] = [
        TimePhase::Dawn,
        TimePhase::Day,
        TimePhase::Dusk,
        TimePhase::Night,
    ];

    pub fn next(self) -> Self {
        match self {
            TimePhase::Dawn => TimePhase::Day,
            TimePhase::Day => TimePhase::Dusk,
            TimePhase::Dusk => TimePhase::Night,
            TimePhase::Night => TimePhase::Dawn,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TimePhase::Dawn => "Dawn",
            TimePhase::Day => "Day",
            TimePhase::Dusk => "Dusk",
            TimePhase::Night => "Night",
        }
    }

    /// Dusk and night pull the night dialogue pool.
    pub fn is_night_context(self) -> bool {
        matches!(self, TimePhase::Dusk | TimePhase::Night)
    }
}

/// The single global phase timer. Advanced by frame deltas in the time domain.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct DayCycle {
    pub phase: TimePhase,
    pub elapsed: f32,
    pub time_active: bool,
    pub breaker_tripped: bool,
    pub cycle_count: u32,
}

impl Default for DayCycle {
    fn default() -> Self {
        Self {
            phase: TimePhase::Day,
            elapsed: 0.0,
            time_active: true,
            breaker_tripped: false,
            cycle_count: 0,
        }
    }
}

impl DayCycle {
    /// Fraction of the current phase that has passed, clamped to [0, 1].
    pub fn progress(&self, durations: &PhaseDurations) -> f32 {
        if self.breaker_tripped {
            return 1.0;
        }
        let duration = durations.for_phase(self.phase);
        if duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / duration).clamp(0.0, 1.0)
    }

    pub fn remaining_seconds(&self, durations: &PhaseDurations) -> f32 {
        (durations.for_phase(self.phase) - self.elapsed).max(0.0)
    }

    pub fn phase_info(&self, durations: &PhaseDurations) -> String {
        let status = if self.breaker_tripped {
            "breaker tripped"
        } else if self.time_active {
            "flowing"
        } else {
            "paused"
        };
        format!(
            "{} {:.0}% ({:.0}s left, {})",
            self.phase.display_name(),
            self.progress(durations) * 100.0,
            self.remaining_seconds(durations),
            status
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
// DRINKS & RECIPES
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IngredientType {
    Tea,
    Ice,
    Boba,
    Foam,
    Lid,
}

impl IngredientType {
    pub const ALL: [IngredientType; 5] = [
        IngredientType::Tea,
        IngredientType::Ice,
        IngredientType::Boba,
        IngredientType::Foam,
        IngredientType::Lid,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            IngredientType::Tea => "Tea",
            IngredientType::Ice => "Ice",
            IngredientType::Boba => "Boba Pearls",
            IngredientType::Foam => "Cheese Foam",
            IngredientType::Lid => "Lid & Straw",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            IngredientType::Tea => "tea",
            IngredientType::Ice => "ice",
            IngredientType::Boba => "boba",
            IngredientType::Foam => "foam",
            IngredientType::Lid => "lid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum IngredientLevel {
    #[default]
    None,
    Light,
    Regular,
    Extra,
}

impl IngredientLevel {
    pub fn value(self) -> u8 {
        match self {
            IngredientLevel::None => 0,
            IngredientLevel::Light => 1,
            IngredientLevel::Regular => 2,
            IngredientLevel::Extra => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            IngredientLevel::None => "none",
            IngredientLevel::Light => "light",
            IngredientLevel::Regular => "regular",
            IngredientLevel::Extra => "extra",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrinkIngredient {
    pub kind: IngredientType,
    pub level: IngredientLevel,
}

impl DrinkIngredient {
    pub const fn new(kind: IngredientType, level: IngredientLevel) -> Self {
        Self { kind, level }
    }

    pub const fn regular(kind: IngredientType) -> Self {
        Self::new(kind, IngredientLevel::Regular)
    }

    pub fn is_present(&self) -> bool {
        self.level != IngredientLevel::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DrinkQuality {
    Poor,
    Fair,
    Good,
    Excellent,
    Perfect,
}

impl DrinkQuality {
    pub fn value(self) -> u8 {
        match self {
            DrinkQuality::Poor => 1,
            DrinkQuality::Fair => 2,
            DrinkQuality::Good => 3,
            DrinkQuality::Excellent => 4,
            DrinkQuality::Perfect => 5,
        }
    }

    pub fn from_value(value: u8) -> Self {
        match value {
            0 | 1 => DrinkQuality::Poor,
            2 => DrinkQuality::Fair,
            3 => DrinkQuality::Good,
            4 => DrinkQuality::Excellent,
            _ => DrinkQuality::Perfect,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DrinkQuality::Poor => "Poor",
            DrinkQuality::Fair => "Fair",
            DrinkQuality::Good => "Good",
            DrinkQuality::Excellent => "Excellent",
            DrinkQuality::Perfect => "Perfect",
        }
    }

    pub fn stars(self) -> String {
        "⭐".repeat(self.value() as usize)
    }
}

pub type RecipeId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub required: Vec<DrinkIngredient>,
    pub optional: Vec<DrinkIngredient>,
    pub forbidden: Vec<IngredientType>,
    /// Exact combinations that earn `Perfect`. Empty means required + optional.
    pub perfect_combinations: Vec<Vec<DrinkIngredient>>,
}

/// Static recipe table, populated by the data domain at startup.
#[derive(Resource, Debug, Clone, Default)]
pub struct RecipeBook {
    pub recipes: Vec<Recipe>,
}

impl RecipeBook {
    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }
}

/// A drink in hand or on a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drink {
    pub ingredients: Vec<DrinkIngredient>,
    pub recipe_id: Option<RecipeId>,
    pub quality: Option<DrinkQuality>,
    pub complete: bool,
}

impl Drink {
    pub fn object_type(&self) -> ObjectType {
        if self.complete {
            ObjectType::CompletedDrink
        } else {
            ObjectType::Drink
        }
    }

    pub fn has(&self, kind: IngredientType) -> bool {
        self.ingredients
            .iter()
            .any(|i| i.kind == kind && i.is_present())
    }
}

/// A shop table. Holds at most one drink waiting for a customer.
#[derive(Component, Debug, Clone, Default)]
pub struct Table {
    pub drink: Option<Drink>,
}

// ═══════════════════════════════════════════════════════════════════════
// NPCs & RESIDENTS
// ═══════════════════════════════════════════════════════════════════════

pub type NpcId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimalType {
    Fox,
    Rabbit,
    Hedgehog,
    Frog,
    Duck,
    Bear,
    Raccoon,
    Squirrel,
    // Night visitors
    Owl,
    Bat,
    Wolf,
}

impl AnimalType {
    pub const DAY_ANIMALS: [AnimalType; 8] = [
        AnimalType::Fox,
        AnimalType::Rabbit,
        AnimalType::Hedgehog,
        AnimalType::Frog,
        AnimalType::Duck,
        AnimalType::Bear,
        AnimalType::Raccoon,
        AnimalType::Squirrel,
    ];

    pub const NIGHT_ANIMALS: [AnimalType; 3] = [AnimalType::Owl, AnimalType::Bat, AnimalType::Wolf];

    pub fn emoji(self) -> &'static str {
        match self {
            AnimalType::Fox => "🦊",
            AnimalType::Rabbit => "🐰",
            AnimalType::Hedgehog => "🦔",
            AnimalType::Frog => "🐸",
            AnimalType::Duck => "🦆",
            AnimalType::Bear => "🐻",
            AnimalType::Raccoon => "🦝",
            AnimalType::Squirrel => "🐿️",
            AnimalType::Owl => "🦉",
            AnimalType::Bat => "🦇",
            AnimalType::Wolf => "🐺",
        }
    }

    pub fn is_night_visitor(self) -> bool {
        Self::NIGHT_ANIMALS.contains(&self)
    }

    /// Best-effort mapping from a resident's species name to a shop sprite.
    pub fn from_species(species: &str) -> Self {
        match species.to_lowercase().as_str() {
            "fox" => AnimalType::Fox,
            "rabbit" => AnimalType::Rabbit,
            "frog" => AnimalType::Frog,
            "duck" => AnimalType::Duck,
            "bear" => AnimalType::Bear,
            "raccoon" => AnimalType::Raccoon,
            "squirrel" => AnimalType::Squirrel,
            "owl" => AnimalType::Owl,
            "bat" => AnimalType::Bat,
            "wolf" => AnimalType::Wolf,
            _ => AnimalType::Hedgehog,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NpcState {
    Entering,
    Wandering,
    Sitting,
    Satisfied,
    Neutral,
    Leaving,
}

impl NpcState {
    pub fn is_departing(self) -> bool {
        matches!(self, NpcState::Satisfied | NpcState::Neutral | NpcState::Leaving)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpcDialogueLines {
    pub day: Vec<String>,
    pub night: Vec<String>,
}

/// One entry of the bundled NPC database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcDef {
    pub id: NpcId,
    pub name: String,
    pub animal: String,
    pub cause_of_death: String,
    #[serde(rename = "homeRoom", default = "default_home_room")]
    pub home_room: u8,
    pub dialogue: NpcDialogueLines,
}

fn default_home_room() -> u8 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpcDatabase {
    pub npcs: Vec<NpcDef>,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct NpcRegistry {
    pub npcs: Vec<NpcDef>,
}

impl NpcRegistry {
    pub fn get(&self, id: &str) -> Option<&NpcDef> {
        self.npcs.iter().find(|n| n.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidentStatus {
    AtHome(u8),
    InShop,
    Traveling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resident {
    pub id: NpcId,
    pub home_room: u8,
    pub status: ResidentStatus,
    pub drink_cooldown: f32,
}

impl Resident {
    pub fn new(id: impl Into<NpcId>, home_room: u8) -> Self {
        Self {
            id: id.into(),
            home_room,
            status: ResidentStatus::AtHome(home_room),
            drink_cooldown: 0.0,
        }
    }

    pub fn is_available_for_shop(&self) -> bool {
        self.status == ResidentStatus::AtHome(self.home_room) && self.drink_cooldown <= 0.0
    }

    pub fn is_home_in(&self, room: u8) -> bool {
        self.home_room == room && self.status == ResidentStatus::AtHome(room)
    }
}

/// Every named forest resident and where they currently are.
#[derive(Resource, Debug, Clone, Default)]
pub struct Residents {
    pub residents: Vec<Resident>,
    pub ritual_npc: Option<NpcId>,
}

impl Residents {
    pub fn get(&self, id: &str) -> Option<&Resident> {
        self.residents.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Resident> {
        self.residents.iter_mut().find(|r| r.id == id)
    }

    pub fn shop_count(&self) -> usize {
        self.residents
            .iter()
            .filter(|r| r.status == ResidentStatus::InShop)
            .count()
    }

    pub fn forest_count(&self) -> usize {
        self.residents
            .iter()
            .filter(|r| matches!(r.status, ResidentStatus::AtHome(_)))
            .count()
    }

    pub fn residents_in_room(&self, room: u8) -> Vec<&Resident> {
        self.residents.iter().filter(|r| r.is_home_in(room)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SatisfactionLevel {
    Upset,
    Disappointed,
    Neutral,
    Happy,
    Delighted,
}

impl SatisfactionLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => SatisfactionLevel::Delighted,
            60..=79 => SatisfactionLevel::Happy,
            40..=59 => SatisfactionLevel::Neutral,
            20..=39 => SatisfactionLevel::Disappointed,
            _ => SatisfactionLevel::Upset,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SatisfactionLevel::Upset => "upset",
            SatisfactionLevel::Disappointed => "disappointed",
            SatisfactionLevel::Neutral => "neutral",
            SatisfactionLevel::Happy => "happy",
            SatisfactionLevel::Delighted => "delighted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogueResponse {
    Dismiss,
    Nice,
    Mean,
}

pub const MIN_SATISFACTION: u8 = 1;
pub const MAX_SATISFACTION: u8 = 100;
pub const STARTING_SATISFACTION: u8 = 50;

/// What a resident remembers about the barista.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcMemory {
    pub npc_id: NpcId,
    pub name: String,
    pub animal: String,
    pub satisfaction: u8,
    pub has_met_player: bool,
    pub interactions: u32,
    pub drinks_received: u32,
    pub nice_responses: u32,
    pub mean_responses: u32,
    pub is_liberated: bool,
}

impl NpcMemory {
    pub fn new(npc_id: impl Into<NpcId>, name: impl Into<String>, animal: impl Into<String>) -> Self {
        Self {
            npc_id: npc_id.into(),
            name: name.into(),
            animal: animal.into(),
            satisfaction: STARTING_SATISFACTION,
            has_met_player: false,
            interactions: 0,
            drinks_received: 0,
            nice_responses: 0,
            mean_responses: 0,
            is_liberated: false,
        }
    }

    pub fn level(&self) -> SatisfactionLevel {
        SatisfactionLevel::from_score(self.satisfaction)
    }

    fn adjust(&mut self, delta: i32) {
        let next = (self.satisfaction as i32 + delta)
            .clamp(MIN_SATISFACTION as i32, MAX_SATISFACTION as i32);
        self.satisfaction = next as u8;
    }

    pub fn record_drink(&mut self) {
        self.drinks_received += 1;
        self.has_met_player = true;
        self.adjust(5);
    }

    pub fn record_response(&mut self, response: DialogueResponse) {
        self.interactions += 1;
        self.has_met_player = true;
        match response {
            DialogueResponse::Dismiss => {}
            DialogueResponse::Nice => {
                self.nice_responses += 1;
                self.adjust(1);
            }
            DialogueResponse::Mean => {
                self.mean_responses += 1;
                self.adjust(-1);
            }
        }
    }
}

#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpcMemories {
    pub memories: HashMap<NpcId, NpcMemory>,
}

impl NpcMemories {
    pub fn get(&self, id: &str) -> Option<&NpcMemory> {
        self.memories.get(id)
    }

    pub fn get_or_create(&mut self, def: &NpcDef) -> &mut NpcMemory {
        self.memories
            .entry(def.id.clone())
            .or_insert_with(|| NpcMemory::new(def.id.clone(), def.name.clone(), def.animal.clone()))
    }

    pub fn is_liberated(&self, id: &str) -> bool {
        self.memories.get(id).is_some_and(|m| m.is_liberated)
    }

    /// Unmet residents count as the starting score.
    pub fn satisfaction_of(&self, id: &str) -> u8 {
        self.memories
            .get(id)
            .map(|m| m.satisfaction)
            .unwrap_or(STARTING_SATISFACTION)
    }
}

/// Shop-wide running totals. Persisted.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopMemory {
    pub drinks_made: u32,
    pub customers_served: u32,
    pub satisfied_customers: u32,
    pub average_satisfaction: f32,
    pub discovered_recipes: Vec<RecipeId>,
    pub world_flags: HashMap<String, bool>,
}

impl ShopMemory {
    pub fn record_customer(&mut self, satisfied: bool) {
        let score = if satisfied { 1.0 } else { 0.0 };
        let n = self.customers_served as f32;
        self.average_satisfaction = (self.average_satisfaction * n + score) / (n + 1.0);
        self.customers_served += 1;
        if satisfied {
            self.satisfied_customers += 1;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLAYER
// ═══════════════════════════════════════════════════════════════════════

/// Something the barista is holding.
#[derive(Debug, Clone, PartialEq)]
pub struct CarriedItem {
    pub object_type: ObjectType,
    pub rotation: RotationState,
    pub drink: Option<Drink>,
}

#[derive(Resource, Debug, Clone)]
pub struct Barista {
    pub cell: GridCoordinate,
    pub carrying: Option<CarriedItem>,
}

impl Default for Barista {
    fn default() -> Self {
        Self {
            cell: CHARACTER_START,
            carrying: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    MoveTo(GridCoordinate),
    /// Long-press on a cell.
    Interact(GridCoordinate),
    Rotate(GridCoordinate),
    Drop,
}

// ═══════════════════════════════════════════════════════════════════════
// FOREST
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomDirection {
    Left,
    Right,
}

#[derive(Resource, Debug, Clone)]
pub struct ForestState {
    pub current_room: u8,
    pub player_cell: GridCoordinate,
}

impl Default for ForestState {
    fn default() -> Self {
        Self {
            current_room: 1,
            player_cell: FOREST_START,
        }
    }
}

pub fn next_room(room: u8) -> u8 {
    if room >= FOREST_ROOM_COUNT {
        1
    } else {
        room + 1
    }
}

pub fn previous_room(room: u8) -> u8 {
    if room <= 1 {
        FOREST_ROOM_COUNT
    } else {
        room - 1
    }
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS: cross-domain communication
// ═══════════════════════════════════════════════════════════════════════

#[derive(Event, Debug, Clone)]
pub struct PhaseChangedEvent {
    pub from: TimePhase,
    pub to: TimePhase,
}

#[derive(Event, Debug, Clone)]
pub struct PhaseProgressEvent {
    pub phase: TimePhase,
    pub progress: f32,
}

#[derive(Event, Debug, Clone)]
pub struct BreakerTrippedEvent;

/// Player flips the breaker back on after dawn.
#[derive(Event, Debug, Clone)]
pub struct ResetBreakerEvent;

#[derive(Event, Debug, Clone)]
pub struct ToggleTimeFlowEvent;

#[derive(Event, Debug, Clone)]
pub struct PlayerActionEvent {
    pub action: PlayerAction,
}

#[derive(Event, Debug, Clone)]
pub struct DrinkCompletedEvent {
    pub drink: Drink,
}

#[derive(Event, Debug, Clone)]
pub struct NpcDepartedEvent {
    pub resident: Option<NpcId>,
    pub animal: AnimalType,
    pub satisfied: bool,
}

#[derive(Event, Debug, Clone)]
pub struct TalkToNpcEvent {
    pub npc_id: NpcId,
}

#[derive(Event, Debug, Clone)]
pub struct DialogueResponseEvent {
    pub response: DialogueResponse,
}

#[derive(Event, Debug, Clone)]
pub struct EnterForestEvent;

#[derive(Event, Debug, Clone)]
pub struct ReturnToShopEvent;

#[derive(Event, Debug, Clone)]
pub struct ChangeRoomEvent {
    pub direction: RoomDirection,
}

#[derive(Event, Debug, Clone)]
pub struct RoomChangedEvent {
    pub room: u8,
}

/// Player interacted with a ritual cell. `offering` is a drink handed over.
#[derive(Event, Debug, Clone)]
pub struct RitualInteractionEvent {
    pub cell: GridCoordinate,
    pub offering: Option<Drink>,
}

#[derive(Event, Debug, Clone)]
pub struct NpcLiberatedEvent {
    pub npc_id: NpcId,
}

// ═══════════════════════════════════════════════════════════════════════
// TUNING: defaults may be overridden by boba_config.ron
// ═══════════════════════════════════════════════════════════════════════

/// Inclusive range of seconds a random duration is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondsRange {
    pub min: f32,
    pub max: f32,
}

impl SecondsRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn draw(&self, rng: &mut impl Rng) -> f32 {
        if self.max <= self.min {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseDurations {
    pub dawn: f32,
    pub day: f32,
    pub dusk: f32,
    pub night: f32,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            dawn: 240.0,
            day: 720.0,
            dusk: 240.0,
            night: 720.0,
        }
    }
}

impl PhaseDurations {
    pub fn for_phase(&self, phase: TimePhase) -> f32 {
        match phase {
            TimePhase::Dawn => self.dawn,
            TimePhase::Day => self.day,
            TimePhase::Dusk => self.dusk,
            TimePhase::Night => self.night,
        }
    }

    pub fn total_cycle_duration(&self) -> f32 {
        self.dawn + self.day + self.dusk + self.night
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcTuning {
    pub entering: SecondsRange,
    pub wandering: SecondsRange,
    pub sitting_timeout: SecondsRange,
    pub celebration: SecondsRange,
    pub max_lifetime: f32,
    pub seconds_per_cell: f32,
    pub exit_step_interval: f32,
    pub max_wander_radius: i32,
    pub table_retry_penalty: f32,
    pub drink_check_window: f32,
}

impl Default for NpcTuning {
    fn default() -> Self {
        Self {
            entering: SecondsRange::new(5.0, 10.0),
            wandering: SecondsRange::new(30.0, 60.0),
            sitting_timeout: SecondsRange::new(45.0, 90.0),
            celebration: SecondsRange::new(5.0, 10.0),
            max_lifetime: 300.0,
            seconds_per_cell: 0.4,
            exit_step_interval: 1.5,
            max_wander_radius: 3,
            table_retry_penalty: 10.0,
            drink_check_window: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub max_npcs: usize,
    pub day_interval: f32,
    pub dusk_interval: f32,
    pub night_interval: f32,
    pub dawn_interval: f32,
    pub occupancy_factor: f32,
    pub drink_bonus: f32,
    /// Out of 10.
    pub night_visitor_chance: u32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            max_npcs: 3,
            day_interval: 15.0,
            dusk_interval: 25.0,
            night_interval: 45.0,
            dawn_interval: 999.0,
            occupancy_factor: 0.5,
            drink_bonus: 0.7,
            night_visitor_chance: 3,
        }
    }
}

impl SpawnTuning {
    pub fn base_interval(&self, phase: TimePhase) -> f32 {
        match phase {
            TimePhase::Day => self.day_interval,
            TimePhase::Dusk => self.dusk_interval,
            TimePhase::Night => self.night_interval,
            TimePhase::Dawn => self.dawn_interval,
        }
    }
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub phases: PhaseDurations,
    pub npc: NpcTuning,
    pub spawn: SpawnTuning,
    pub resident_cooldown: f32,
    pub snail_speed: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            phases: PhaseDurations::default(),
            npc: NpcTuning::default(),
            spawn: SpawnTuning::default(),
            resident_cooldown: 300.0,
            snail_speed: 20.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

pub const GRID_WIDTH: i32 = 33;
pub const GRID_HEIGHT: i32 = 25;
pub const CELL_SIZE: f32 = 60.0;
pub const SHOP_ORIGIN: Vec2 = Vec2::new(-1000.0, -750.0);

pub const DOOR_CELL: GridCoordinate = GridCoordinate::new(5, 12);
pub const CHARACTER_START: GridCoordinate = GridCoordinate::new(16, 12);
pub const BREAKER_CELL: GridCoordinate = GridCoordinate::new(3, 20);
pub const DRINK_CREATOR_CELL: GridCoordinate = GridCoordinate::new(16, 13);

/// Customers stay inside x 3..=29, y 3..=21.
pub const SHOP_MIN: GridCoordinate = GridCoordinate::new(3, 3);
pub const SHOP_MAX: GridCoordinate = GridCoordinate::new(29, 21);

pub const EXIT_X_THRESHOLD: i32 = 6;
pub const EXIT_Y_TOLERANCE: i32 = 2;

pub const STATION_ROW: i32 = 15;
pub const STATION_LAYOUT: [(IngredientType, i32); 5] = [
    (IngredientType::Ice, 12),
    (IngredientType::Boba, 14),
    (IngredientType::Foam, 16),
    (IngredientType::Tea, 18),
    (IngredientType::Lid, 20),
];

pub const TABLE_CELLS: [GridCoordinate; 9] = [
    GridCoordinate::new(22, 18),
    GridCoordinate::new(10, 10),
    GridCoordinate::new(26, 8),
    GridCoordinate::new(13, 20),
    GridCoordinate::new(28, 14),
    GridCoordinate::new(6, 12),
    GridCoordinate::new(16, 6),
    GridCoordinate::new(20, 12),
    GridCoordinate::new(14, 10),
];

pub const FOREST_ROOM_COUNT: u8 = 5;
pub const FOREST_START: GridCoordinate = GridCoordinate::new(16, 8);
pub const FOREST_LEFT_ARRIVAL: GridCoordinate = GridCoordinate::new(26, 12);
pub const FOREST_RIGHT_ARRIVAL: GridCoordinate = GridCoordinate::new(6, 12);
pub const FOREST_BACK_DOOR: GridCoordinate = GridCoordinate::new(16, 20);

pub const RITUAL_CENTER: GridCoordinate = GridCoordinate::new(24, 12);
pub const RITUAL_CANDLE_COUNT: usize = 7;
pub const RITUAL_CANDLE_RADIUS: f64 = 2.0;
