//! Recipe journal: discovery, recent history, hints and mastery statistics.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

use super::find_best_recipe;
use crate::shared::*;

pub const HISTORY_LIMIT: usize = 20;
const TREND_WINDOW: usize = 3;
const TREND_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub recipe_id: Option<RecipeId>,
    pub quality: DrinkQuality,
}

/// Outcome of recording one drink.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeResult {
    pub recipe_id: Option<RecipeId>,
    pub quality: DrinkQuality,
    pub newly_discovered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityTrend {
    Improving,
    Stable,
    Declining,
}

impl QualityTrend {
    pub fn description(self) -> &'static str {
        match self {
            QualityTrend::Improving => "Improving",
            QualityTrend::Stable => "Stable",
            QualityTrend::Declining => "Needs Work",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeStatistics {
    pub total_attempts: usize,
    pub successful: usize,
    pub unique_recipes: usize,
    pub discovered: usize,
    pub quality_distribution: HashMap<DrinkQuality, usize>,
    pub average_quality: f32,
    pub trend: QualityTrend,
    pub success_rate: f32,
    pub discovery_rate: f32,
}

#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeJournal {
    pub discovered: BTreeSet<RecipeId>,
    pub history: VecDeque<JournalEntry>,
}

impl RecipeJournal {
    pub fn is_discovered(&self, id: &str) -> bool {
        self.discovered.contains(id)
    }

    /// Scores `ingredients`, appends to the bounded history and marks the recipe discovered.
    pub fn record_drink(&mut self, ingredients: &[DrinkIngredient], book: &RecipeBook) -> RecipeResult {
        let (recipe_id, quality) = match find_best_recipe(book, ingredients) {
            Some((recipe, quality)) => (Some(recipe.id.clone()), quality),
            None => (None, DrinkQuality::Poor),
        };

        let newly_discovered = match &recipe_id {
            Some(id) => self.discovered.insert(id.clone()),
            None => false,
        };

        self.history.push_back(JournalEntry {
            recipe_id: recipe_id.clone(),
            quality,
        });
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }

        RecipeResult {
            recipe_id,
            quality,
            newly_discovered,
        }
    }

    pub fn quality_trend(&self) -> QualityTrend {
        if self.history.len() < TREND_WINDOW * 2 {
            return QualityTrend::Stable;
        }
        let values: Vec<f32> = self.history.iter().map(|e| e.quality.value() as f32).collect();
        let n = values.len();
        let recent = values[n - TREND_WINDOW..].iter().sum::<f32>() / TREND_WINDOW as f32;
        let previous =
            values[n - 2 * TREND_WINDOW..n - TREND_WINDOW].iter().sum::<f32>() / TREND_WINDOW as f32;

        if recent > previous + TREND_THRESHOLD {
            QualityTrend::Improving
        } else if recent < previous - TREND_THRESHOLD {
            QualityTrend::Declining
        } else {
            QualityTrend::Stable
        }
    }

    /// Most frequent recipe in the recent history. Ties go to the one made first.
    pub fn favorite_recipe(&self) -> Option<RecipeId> {
        let mut counts: Vec<(RecipeId, usize)> = Vec::new();
        for id in self.history.iter().filter_map(|e| e.recipe_id.as_ref()) {
            match counts.iter_mut().find(|(known, _)| known == id) {
                Some((_, count)) => *count += 1,
                None => counts.push((id.clone(), 1)),
            }
        }
        let mut best: Option<(RecipeId, usize)> = None;
        for (id, count) in counts {
            if best.as_ref().map_or(true, |(_, c)| count > *c) {
                best = Some((id, count));
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn statistics(&self, book: &RecipeBook) -> RecipeStatistics {
        let total_attempts = self.history.len();
        let successful = self.history.iter().filter(|e| e.recipe_id.is_some()).count();
        let unique_recipes = self
            .history
            .iter()
            .filter_map(|e| e.recipe_id.as_ref())
            .collect::<BTreeSet<_>>()
            .len();

        let mut quality_distribution = HashMap::new();
        for entry in &self.history {
            *quality_distribution.entry(entry.quality).or_insert(0) += 1;
        }

        let average_quality = if total_attempts == 0 {
            0.0
        } else {
            self.history.iter().map(|e| e.quality.value() as f32).sum::<f32>()
                / total_attempts as f32
        };

        let success_rate = if total_attempts == 0 {
            0.0
        } else {
            successful as f32 / total_attempts as f32
        };
        let discovery_rate = if book.recipes.is_empty() {
            0.0
        } else {
            self.discovered.len() as f32 / book.recipes.len() as f32
        };

        RecipeStatistics {
            total_attempts,
            successful,
            unique_recipes,
            discovered: self.discovered.len(),
            quality_distribution,
            average_quality,
            trend: self.quality_trend(),
            success_rate,
            discovery_rate,
        }
    }
}

/// Nudge toward the nearest perfect combination. `None` when already perfect.
pub fn improvement_hint(ingredients: &[DrinkIngredient], book: &RecipeBook) -> Option<String> {
    let Some((recipe, quality)) = find_best_recipe(book, ingredients) else {
        return Some("Try adding tea and a lid for a basic drink!".to_string());
    };
    if quality == DrinkQuality::Perfect {
        return None;
    }

    for combo in super::perfect_combinations(recipe) {
        let mut missing = None;
        let mut wrong_level = None;
        for want in &combo {
            let have = ingredients
                .iter()
                .find(|i| i.kind == want.kind && i.is_present());
            match have {
                None if missing.is_none() => missing = Some(*want),
                Some(have) if have.level != want.level && wrong_level.is_none() => {
                    wrong_level = Some(*want)
                }
                _ => {}
            }
        }
        if let Some(m) = missing {
            return Some(format!(
                "Try adding {} {}",
                m.level.display_name(),
                m.kind.display_name()
            ));
        }
        if let Some(w) = wrong_level {
            return Some(format!(
                "Try {} {} instead",
                w.level.display_name(),
                w.kind.display_name()
            ));
        }
    }
    None
}

pub fn satisfaction_bonus(quality: DrinkQuality) -> f32 {
    match quality {
        DrinkQuality::Poor => -0.3,
        DrinkQuality::Fair => -0.1,
        DrinkQuality::Good => 0.0,
        DrinkQuality::Excellent => 0.2,
        DrinkQuality::Perfect => 0.5,
    }
}

/// 0.0 ..= 1.0, centred on 0.5 for a `Good` drink.
pub fn customer_satisfaction(quality: DrinkQuality) -> f32 {
    (0.5 + satisfaction_bonus(quality)).clamp(0.0, 1.0)
}

/// System: every finished drink goes in the journal.
pub fn record_completed_drinks(
    mut events: EventReader<DrinkCompletedEvent>,
    book: Res<RecipeBook>,
    mut journal: ResMut<RecipeJournal>,
    mut shop_memory: ResMut<ShopMemory>,
) {
    for ev in events.read() {
        let result = journal.record_drink(&ev.drink.ingredients, &book);
        shop_memory.drinks_made += 1;
        match (&result.recipe_id, result.newly_discovered) {
            (Some(id), true) => {
                if !shop_memory.discovered_recipes.contains(id) {
                    shop_memory.discovered_recipes.push(id.clone());
                }
                info!(
                    "[Recipes] Discovered {} ({})",
                    id,
                    result.quality.display_name()
                )
            }
            (Some(id), false) => debug!("[Recipes] Made {} ({})", id, result.quality.display_name()),
            (None, _) => debug!("[Recipes] Drink matched no recipe"),
        }
    }
}
