use crate::shared::*;
use IngredientType::*;

fn reg(kind: IngredientType) -> DrinkIngredient {
    DrinkIngredient::regular(kind)
}

/// Populate the RecipeBook with the five house drinks.
///
/// Table order matters: `find_best_recipe` keeps the first recipe on ties.
pub fn populate_recipes(book: &mut RecipeBook) {
    book.recipes = vec![
        // ── Milk teas ────────────────────────────────────────────────

        Recipe {
            id: "classic_milk_tea".into(),
            name: "Classic Milk Tea".into(),
            description: "A traditional boba tea with black tea, tapioca pearls, and ice.".into(),
            required: vec![reg(Tea), reg(Lid)],
            optional: vec![reg(Ice), reg(Boba)],
            forbidden: vec![Foam],
            perfect_combinations: vec![vec![reg(Tea), reg(Ice), reg(Boba), reg(Lid)]],
        },

        Recipe {
            id: "cheese_foam_tea".into(),
            name: "Cheese Foam Tea".into(),
            description: "Smooth tea topped with creamy cheese foam. Best served with light ice."
                .into(),
            required: vec![reg(Tea), reg(Foam), reg(Lid)],
            optional: vec![DrinkIngredient::new(Ice, IngredientLevel::Light)],
            forbidden: vec![Boba],
            perfect_combinations: vec![vec![
                reg(Tea),
                reg(Foam),
                DrinkIngredient::new(Ice, IngredientLevel::Light),
                reg(Lid),
            ]],
        },

        // ── Plain teas ───────────────────────────────────────────────

        Recipe {
            id: "iced_tea".into(),
            name: "Iced Tea".into(),
            description: "Pure tea served ice cold. Simple and refreshing.".into(),
            required: vec![reg(Tea), reg(Ice), reg(Lid)],
            optional: vec![],
            forbidden: vec![Boba, Foam],
            perfect_combinations: vec![vec![reg(Tea), reg(Ice), reg(Lid)]],
        },

        Recipe {
            id: "hot_tea".into(),
            name: "Hot Tea".into(),
            description: "Warming tea served hot. Perfect for cold days.".into(),
            required: vec![reg(Tea), reg(Lid)],
            optional: vec![reg(Foam)],
            forbidden: vec![Ice, Boba],
            perfect_combinations: vec![
                vec![reg(Tea), reg(Lid)],
                vec![reg(Tea), reg(Foam), reg(Lid)],
            ],
        },

        // ── Specials ─────────────────────────────────────────────────

        Recipe {
            id: "double_boba_special".into(),
            name: "Double Boba Special".into(),
            description: "For boba lovers! Extra tapioca pearls in every sip.".into(),
            required: vec![
                reg(Tea),
                DrinkIngredient::new(Boba, IngredientLevel::Extra),
                reg(Lid),
            ],
            optional: vec![reg(Ice)],
            forbidden: vec![Foam],
            perfect_combinations: vec![vec![
                reg(Tea),
                DrinkIngredient::new(Boba, IngredientLevel::Extra),
                reg(Ice),
                reg(Lid),
            ]],
        },
    ];
}

/// A freshly populated book, for code and tests that run outside the app.
pub fn standard_recipe_book() -> RecipeBook {
    let mut book = RecipeBook::default();
    populate_recipes(&mut book);
    book
}
