//! The recipe book and sword scoring.
//!
//! Recipes themselves are pure grid patterns (see [`anvil_grid::crafting`]).
//! The book pairs each with a handler that turns a successful [`Craft`] into
//! rewards. Registration order is the order the crafting sweep tries them in.

use std::fmt;

use anvil_grid::crafting::{Combinator, Craft, Recipe};
use anvil_grid::material::catalog::{BLADE, HANDLE, TIP};
use anvil_grid::material::{Material, MaterialRegistry};
use anvil_journal::{EffectKind, SimEvent};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::simulation::Simulation;

/// Called after a recipe matched and its parts left the grid.
pub type CraftHandler = fn(&mut Simulation, &Craft);

// ---------------------------------------------------------------------------
// RecipeBook
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct RecipeBook {
    entries: Vec<(Recipe, CraftHandler)>,
}

impl fmt::Debug for RecipeBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(recipe, _)| recipe.name()))
            .finish()
    }
}

impl RecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// The forge's recipes: a sword is a handle, any number of blades and a
    /// tip.
    pub fn standard() -> Self {
        let mut book = Self::new();
        book.register(
            Recipe::new(
                "Sword",
                vec![
                    Combinator::ExactlyOne(HANDLE),
                    Combinator::ZeroOrMore(BLADE),
                    Combinator::ExactlyOne(TIP),
                ],
            ),
            forge_sword,
        );
        book
    }

    pub fn register(&mut self, recipe: Recipe, handler: CraftHandler) {
        self.entries.push((recipe, handler));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(&Recipe, CraftHandler)> {
        self.entries.get(index).map(|(r, h)| (r, *h))
    }

    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.entries.iter().map(|(r, _)| r)
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreOp {
    /// Adds to the base value.
    Add,
    /// Adds to the multiplier applied on top of the base.
    Multiply,
}

/// One line of a craft's score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreItem {
    pub label: String,
    pub op: ScoreOp,
    pub value: f64,
}

impl ScoreItem {
    fn add(label: String, value: f64) -> Self {
        Self {
            label,
            op: ScoreOp::Add,
            value,
        }
    }
}

const VALUE_PER_PART: f64 = 5.0;
const LONG_SWORD_SIZE: usize = 5;
const LONG_SWORD_BONUS: f64 = 50.0;

/// Score breakdown for a sword made of `parts`.
pub fn sword_score(
    parts: &[Material],
    registry: &MaterialRegistry,
    set_multiplier: f64,
) -> Vec<ScoreItem> {
    let size = parts.len();
    let mut items = vec![ScoreItem::add(
        format!("Size {size} sword"),
        size as f64 * VALUE_PER_PART,
    )];

    if size >= LONG_SWORD_SIZE {
        items.push(ScoreItem::add("Really bloody long".to_owned(), LONG_SWORD_BONUS));
    }

    let tip_set = parts.iter().find(|p| p.component == TIP).and_then(|p| p.set);
    if let Some(set) = tip_set {
        let blades_match = parts
            .iter()
            .filter(|p| p.component == BLADE)
            .all(|p| p.set == Some(set));
        if size > 2 && blades_match {
            items.push(ScoreItem {
                label: format!("Set: {}", registry.set_bonus(set).name),
                op: ScoreOp::Multiply,
                value: set_multiplier,
            });
        }
    }
    items
}

/// `floor(base + base * multiplier)` over a breakdown.
pub fn calculate_reward(items: &[ScoreItem]) -> u64 {
    let (base, multiplier) = items.iter().fold((0.0, 0.0), |(b, m), item| match item.op {
        ScoreOp::Add => (b + item.value, m),
        ScoreOp::Multiply => (b, m + item.value),
    });
    (base + base * multiplier).floor() as u64
}

fn forge_sword(sim: &mut Simulation, craft: &Craft) {
    let items = sword_score(
        &craft.materials,
        sim.grid.materials(),
        sim.modifiers.set_bonus_multiplier,
    );
    let reward = calculate_reward(&items);
    sim.economy.swords += 1;
    sim.economy.coins += reward;
    info!(size = craft.materials.len(), reward, "sword forged");

    sim.journal.record(SimEvent::Crafted {
        recipe: craft.recipe.clone(),
        cells: craft.cells.clone(),
        reward,
        notes: items.into_iter().map(|i| i.label).collect(),
    });
    if let Some(&(x, y)) = craft.cells.last() {
        sim.effect(EffectKind::Coins, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_grid::material::catalog::{BROAD, IRON, STRAIGHT};
    use anvil_grid::material::{ComponentId, MaterialQuery, SetBonusId};

    fn part(registry: &MaterialRegistry, component: ComponentId, set: Option<SetBonusId>) -> Material {
        let mut query = MaterialQuery::new().element(IRON).component(component);
        if let Some(set) = set {
            query = query.set_bonus(set);
        }
        registry.first_match(&query).unwrap()
    }

    #[test]
    fn two_part_sword_scores_ten() {
        let registry = MaterialRegistry::standard();
        let parts = [
            part(&registry, HANDLE, None),
            part(&registry, TIP, Some(STRAIGHT)),
        ];
        let items = sword_score(&parts, &registry, 1.0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "Size 2 sword");
        assert_eq!(calculate_reward(&items), 10);
    }

    #[test]
    fn long_matching_set_sword() {
        let registry = MaterialRegistry::standard();
        let mut parts = vec![part(&registry, HANDLE, None)];
        for _ in 0..3 {
            parts.push(part(&registry, BLADE, Some(STRAIGHT)));
        }
        parts.push(part(&registry, TIP, Some(STRAIGHT)));

        let items = sword_score(&parts, &registry, 1.0);
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Size 5 sword", "Really bloody long", "Set: Straight"]);
        // (25 + 50) * 2
        assert_eq!(calculate_reward(&items), 150);
        // Renown triples the set bonus: 75 + 75 * 3.
        assert_eq!(calculate_reward(&sword_score(&parts, &registry, 3.0)), 300);
    }

    #[test]
    fn mixed_sets_earn_no_bonus() {
        let registry = MaterialRegistry::standard();
        let parts = [
            part(&registry, HANDLE, None),
            part(&registry, BLADE, Some(BROAD)),
            part(&registry, TIP, Some(STRAIGHT)),
        ];
        let items = sword_score(&parts, &registry, 1.0);
        assert!(items.iter().all(|i| i.op == ScoreOp::Add));
        assert_eq!(calculate_reward(&items), 15);
    }

    #[test]
    fn reward_rounds_down() {
        let items = vec![
            ScoreItem::add("a".to_owned(), 5.0),
            ScoreItem {
                label: "b".to_owned(),
                op: ScoreOp::Multiply,
                value: 0.5,
            },
        ];
        assert_eq!(calculate_reward(&items), 7);
    }

    #[test]
    fn standard_book_holds_the_sword() {
        let book = RecipeBook::standard();
        assert_eq!(book.len(), 1);
        assert_eq!(book.recipes().next().unwrap().name(), "Sword");
        assert_eq!(format!("{book:?}"), "[\"Sword\"]");
    }
}
