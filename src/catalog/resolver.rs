//! Canonical recipe lookup.
//!
//! Several recipes may produce the same item (quality tiers with different batch
//! sizes). The canonical one is picked by a fixed policy:
//!
//! 1. a recipe yielding exactly one unit wins;
//! 2. otherwise the recipe with the smallest batch above one;
//! 3. ties go to the lexicographically smallest recipe id.
//!
//! Recipes with a zero batch size are never canonical. `None` means the item is a
//! base item, bought rather than crafted.

use super::{Catalog, Discipline, Faction, Recipe};

/// Find the canonical recipe in `(faction, discipline)` that produces `item_id`.
pub fn recipe_by_item<'a>(
    catalog: &'a Catalog,
    faction: Faction,
    discipline: Discipline,
    item_id: &str,
) -> Option<&'a Recipe> {
    catalog
        .recipes(faction, discipline)
        .values()
        .filter(|r| r.item_id == item_id && r.count >= 1)
        .min_by(|a, b| a.count.cmp(&b.count).then_with(|| a.id.cmp(&b.id)))
}

/// Every discipline able to craft `item_id`, paired with its canonical recipe.
pub fn recipes_for_item<'a>(
    catalog: &'a Catalog,
    faction: Faction,
    item_id: &str,
) -> Vec<(Discipline, &'a Recipe)> {
    Discipline::ALL
        .into_iter()
        .filter_map(|d| recipe_by_item(catalog, faction, d, item_id).map(|r| (d, r)))
        .collect()
}
