//! Recipe domain: scoring drinks against the recipe book.
//!
//! The matcher itself is a set of pure functions over `RecipeBook` and a
//! slice of `DrinkIngredient`s. The journal (what the barista has made and
//! discovered) lives in `journal`.

pub mod journal;

use bevy::prelude::*;

use crate::shared::*;
use journal::RecipeJournal;

pub struct RecipePlugin;

impl Plugin for RecipePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RecipeBook>()
            .init_resource::<RecipeJournal>()
            .add_systems(Update, journal::record_completed_drinks);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// MATCHING
// ═══════════════════════════════════════════════════════════════════════

fn level_of(ingredients: &[DrinkIngredient], kind: IngredientType) -> IngredientLevel {
    ingredients
        .iter()
        .find(|i| i.kind == kind)
        .map(|i| i.level)
        .unwrap_or(IngredientLevel::None)
}

fn is_present(ingredients: &[DrinkIngredient], kind: IngredientType) -> bool {
    level_of(ingredients, kind) != IngredientLevel::None
}

/// The combinations that earn `Perfect`, defaulting to required + optional.
pub fn perfect_combinations(recipe: &Recipe) -> Vec<Vec<DrinkIngredient>> {
    if !recipe.perfect_combinations.is_empty() {
        return recipe.perfect_combinations.clone();
    }
    let mut combo = recipe.required.clone();
    combo.extend(recipe.optional.iter().copied());
    vec![combo]
}

/// Every required type present, no forbidden type present.
pub fn is_valid_drink(recipe: &Recipe, ingredients: &[DrinkIngredient]) -> bool {
    recipe
        .required
        .iter()
        .all(|req| is_present(ingredients, req.kind))
        && !recipe
            .forbidden
            .iter()
            .any(|kind| is_present(ingredients, *kind))
}

fn matches_exactly(combo: &[DrinkIngredient], ingredients: &[DrinkIngredient]) -> bool {
    let levels_match = combo
        .iter()
        .all(|want| level_of(ingredients, want.kind) == want.level);
    let nothing_extra = ingredients
        .iter()
        .filter(|i| i.is_present())
        .all(|i| combo.iter().any(|c| c.kind == i.kind));
    levels_match && nothing_extra
}

pub fn evaluate_quality(recipe: &Recipe, ingredients: &[DrinkIngredient]) -> DrinkQuality {
    if !is_valid_drink(recipe, ingredients) {
        return DrinkQuality::Poor;
    }

    if perfect_combinations(recipe)
        .iter()
        .any(|combo| matches_exactly(combo, ingredients))
    {
        return DrinkQuality::Perfect;
    }

    let mut score = 0i32;
    let mut max_score = 0i32;

    for req in &recipe.required {
        max_score += 3;
        let level = level_of(ingredients, req.kind);
        if level == req.level {
            score += 3;
        } else if level != IngredientLevel::None {
            score += 1;
        }
    }

    for opt in &recipe.optional {
        max_score += 2;
        let level = level_of(ingredients, opt.kind);
        if level == opt.level {
            score += 2;
        } else if level != IngredientLevel::None {
            score += 1;
        }
    }

    for kind in &recipe.forbidden {
        if is_present(ingredients, *kind) {
            score -= 2;
        }
    }

    if max_score == 0 {
        return DrinkQuality::Poor;
    }

    let pct = score as f32 / max_score as f32;
    if pct >= 0.9 {
        DrinkQuality::Excellent
    } else if pct >= 0.7 {
        DrinkQuality::Good
    } else if pct >= 0.4 {
        DrinkQuality::Fair
    } else {
        DrinkQuality::Poor
    }
}

/// Best valid recipe strictly above `Poor`. Ties keep book order.
pub fn find_best_recipe<'a>(
    book: &'a RecipeBook,
    ingredients: &[DrinkIngredient],
) -> Option<(&'a Recipe, DrinkQuality)> {
    let mut best: Option<(&Recipe, DrinkQuality)> = None;
    let mut best_quality = DrinkQuality::Poor;

    for recipe in &book.recipes {
        if !is_valid_drink(recipe, ingredients) {
            continue;
        }
        let quality = evaluate_quality(recipe, ingredients);
        if quality > best_quality {
            best_quality = quality;
            best = Some((recipe, quality));
        }
    }
    best
}

/// Recipes whose required ingredient types are all in `available`.
pub fn available_recipes<'a>(
    book: &'a RecipeBook,
    available: &[IngredientType],
) -> Vec<&'a Recipe> {
    book.recipes
        .iter()
        .filter(|r| r.required.iter().all(|req| available.contains(&req.kind)))
        .collect()
}
