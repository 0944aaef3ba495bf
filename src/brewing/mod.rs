//! Brewing domain: the five ingredient stations and the drink creator.
//!
//! Stations are grid objects on the brewing row. The creator below them
//! always shows what the current station settings would make (`DrinkPreview`);
//! taking the drink hands it to the barista and resets every station.

use bevy::prelude::*;

use crate::grid::GridWorld;
use crate::recipes::find_best_recipe;
use crate::recipes::journal::improvement_hint;
use crate::shared::*;

pub struct BrewingPlugin;

impl Plugin for BrewingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DrinkPreview>()
            .add_systems(OnEnter(GameState::Shop), spawn_brewing_bar)
            .add_systems(
                Update,
                refresh_drink_preview.run_if(in_state(GameState::Shop)),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// COMPONENTS & RESOURCES
// ═══════════════════════════════════════════════════════════════════════

/// One ingredient dispenser. Ice has three settings, everything else is on/off.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct IngredientStation {
    pub kind: IngredientType,
    pub setting: u8,
}

impl IngredientStation {
    pub fn new(kind: IngredientType) -> Self {
        Self { kind, setting: 0 }
    }

    /// Ice: regular → light → none → regular. Others: off ↔ on.
    pub fn interact(&mut self) {
        self.setting = match self.kind {
            IngredientType::Ice => (self.setting + 1) % 3,
            _ => {
                if self.setting == 0 {
                    1
                } else {
                    0
                }
            }
        };
    }

    pub fn reset_to_default(&mut self) {
        self.setting = 0;
    }

    pub fn level(&self) -> IngredientLevel {
        match (self.kind, self.setting) {
            (IngredientType::Ice, 0) => IngredientLevel::Regular,
            (IngredientType::Ice, 1) => IngredientLevel::Light,
            (IngredientType::Ice, _) => IngredientLevel::None,
            (_, 0) => IngredientLevel::None,
            _ => IngredientLevel::Regular,
        }
    }

    pub fn ingredient(&self) -> DrinkIngredient {
        DrinkIngredient::new(self.kind, self.level())
    }
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct DrinkCreator;

/// What the creator would hand over right now.
#[derive(Resource, Debug, Clone, Default)]
pub struct DrinkPreview {
    pub ingredients: Vec<DrinkIngredient>,
    pub recipe_name: Option<String>,
    pub quality: Option<DrinkQuality>,
    pub hint: Option<String>,
    pub complete: bool,
    pub summary: String,
}

// ═══════════════════════════════════════════════════════════════════════
// CONVERSION
// ═══════════════════════════════════════════════════════════════════════

/// Station settings as one ingredient per type, in `IngredientType::ALL` order.
/// A type with no station reads as `None`.
pub fn ingredients_from_stations<'a>(
    stations: impl IntoIterator<Item = &'a IngredientStation>,
) -> Vec<DrinkIngredient> {
    let stations: Vec<&IngredientStation> = stations.into_iter().collect();
    IngredientType::ALL
        .iter()
        .map(|kind| {
            stations
                .iter()
                .find(|s| s.kind == *kind)
                .map(|s| s.ingredient())
                .unwrap_or(DrinkIngredient::new(*kind, IngredientLevel::None))
        })
        .collect()
}

/// A drink needs tea and a lid to be served.
pub fn is_complete(ingredients: &[DrinkIngredient]) -> bool {
    let has = |kind| ingredients.iter().any(|i| i.kind == kind && i.is_present());
    has(IngredientType::Tea) && has(IngredientType::Lid)
}

pub fn drink_summary(ingredients: &[DrinkIngredient]) -> String {
    let parts: Vec<String> = ingredients
        .iter()
        .filter(|i| i.is_present())
        .map(|i| match i.level {
            IngredientLevel::Regular => i.kind.display_name().to_string(),
            level => format!("{} {}", level.display_name(), i.kind.display_name()),
        })
        .collect();
    if parts.is_empty() {
        "Empty cup".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn create_drink(ingredients: Vec<DrinkIngredient>, book: &RecipeBook) -> Drink {
    let complete = is_complete(&ingredients);
    let best = find_best_recipe(book, &ingredients);
    Drink {
        recipe_id: best.map(|(r, _)| r.id.clone()),
        quality: best.map(|(_, q)| q),
        complete,
        ingredients,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Lays out the stations and the creator the first time the shop opens.
fn spawn_brewing_bar(
    mut commands: Commands,
    mut grid: ResMut<GridWorld>,
    existing: Query<(), With<IngredientStation>>,
) {
    if !existing.is_empty() {
        return;
    }

    for (kind, column) in STATION_LAYOUT {
        let cell = GridCoordinate::new(column, STATION_ROW);
        let entity = commands
            .spawn((
                GameObject::new(cell, ObjectType::Station),
                IngredientStation::new(kind),
            ))
            .id();
        grid.occupy_cell(cell, entity);
    }

    let entity = commands
        .spawn((
            GameObject::new(DRINK_CREATOR_CELL, ObjectType::Station),
            DrinkCreator,
        ))
        .id();
    grid.occupy_cell(DRINK_CREATOR_CELL, entity);

    info!("[Brewing] Stations and drink creator set up");
}

fn refresh_drink_preview(
    stations: Query<&IngredientStation>,
    changed: Query<(), Changed<IngredientStation>>,
    book: Res<RecipeBook>,
    mut preview: ResMut<DrinkPreview>,
) {
    if changed.is_empty() && !book.is_changed() {
        return;
    }

    let ingredients = ingredients_from_stations(stations.iter());
    let best = find_best_recipe(&book, &ingredients);
    preview.recipe_name = best.map(|(r, _)| r.name.clone());
    preview.quality = best.map(|(_, q)| q);
    preview.hint = improvement_hint(&ingredients, &book);
    preview.complete = is_complete(&ingredients);
    preview.summary = drink_summary(&ingredients);
    preview.ingredients = ingredients;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::recipes::standard_recipe_book;

    fn bar() -> Vec<IngredientStation> {
        STATION_LAYOUT
            .iter()
            .map(|(kind, _)| IngredientStation::new(*kind))
            .collect()
    }

    fn station<'a>(bar: &'a mut [IngredientStation], kind: IngredientType) -> &'a mut IngredientStation {
        bar.iter_mut().find(|s| s.kind == kind).unwrap()
    }

    #[test]
    fn test_ice_cycles_through_three_levels() {
        let mut ice = IngredientStation::new(IngredientType::Ice);
        assert_eq!(ice.level(), IngredientLevel::Regular);
        ice.interact();
        assert_eq!(ice.level(), IngredientLevel::Light);
        ice.interact();
        assert_eq!(ice.level(), IngredientLevel::None);
        ice.interact();
        assert_eq!(ice.level(), IngredientLevel::Regular);
    }

    #[test]
    fn test_toggle_stations() {
        let mut tea = IngredientStation::new(IngredientType::Tea);
        assert_eq!(tea.level(), IngredientLevel::None);
        tea.interact();
        assert_eq!(tea.level(), IngredientLevel::Regular);
        tea.interact();
        assert_eq!(tea.level(), IngredientLevel::None);
        tea.interact();
        tea.reset_to_default();
        assert_eq!(tea.level(), IngredientLevel::None);
    }

    #[test]
    fn test_default_bar_is_just_ice_and_incomplete() {
        let ingredients = ingredients_from_stations(bar().iter());
        assert_eq!(ingredients.len(), 5);
        assert_eq!(drink_summary(&ingredients), "Ice");
        assert!(!is_complete(&ingredients));
    }

    #[test]
    fn test_missing_station_reads_as_none() {
        let only_tea = [IngredientStation {
            kind: IngredientType::Tea,
            setting: 1,
        }];
        let ingredients = ingredients_from_stations(only_tea.iter());
        assert_eq!(ingredients[0], DrinkIngredient::regular(IngredientType::Tea));
        assert!(ingredients[1..].iter().all(|i| !i.is_present()));
    }

    #[test]
    fn test_classic_from_stations() {
        let book = standard_recipe_book();
        let mut bar = bar();
        station(&mut bar, IngredientType::Tea).interact();
        station(&mut bar, IngredientType::Boba).interact();
        station(&mut bar, IngredientType::Lid).interact();

        let ingredients = ingredients_from_stations(bar.iter());
        assert!(is_complete(&ingredients));
        assert_eq!(drink_summary(&ingredients), "Tea, Ice, Boba Pearls, Lid & Straw");

        let drink = create_drink(ingredients, &book);
        assert!(drink.complete);
        assert_eq!(drink.object_type(), ObjectType::CompletedDrink);
        assert_eq!(drink.recipe_id.as_deref(), Some("classic_milk_tea"));
        assert_eq!(drink.quality, Some(DrinkQuality::Perfect));
    }

    #[test]
    fn test_light_ice_summary_and_unfinished_drink() {
        let book = standard_recipe_book();
        let mut bar = bar();
        station(&mut bar, IngredientType::Ice).interact();
        station(&mut bar, IngredientType::Tea).interact();
        let ingredients = ingredients_from_stations(bar.iter());
        assert_eq!(drink_summary(&ingredients), "Tea, light Ice");

        let drink = create_drink(ingredients, &book);
        assert!(!drink.complete);
        assert_eq!(drink.object_type(), ObjectType::Drink);
        assert_eq!(drink.recipe_id, None);
    }
}
