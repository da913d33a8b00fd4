//! # Cost engine
//!
//! Pure functions over a [`Catalog`] reference:
//!
//! - [`unit_cost`] - cost of one unit of a recipe's output, amortized over its batch
//! - [`batch_cost`] - cost of one execution of a recipe (what price queries report)
//! - [`plan::gather_plan`] - the shopping list and craft order for a recipe
//!
//! An ingredient with a canonical recipe in the same (faction, discipline) bucket is
//! priced by recursing into that recipe's unit cost; anything else is a base item
//! and contributes its set price, or a missing-price reason when unset.
//!
//! All arithmetic is integer. Amortizing truncates, so `unit_cost * count` may fall
//! short of `batch_cost` by less than `count`.
//!
//! Recursion depth equals the longest ingredient chain. Catalogs are validated
//! acyclic (see [`crate::catalog::graph::validate`]) before they are served.

pub mod plan;

pub use plan::{gather_plan, Plan};

use std::collections::HashMap;

use crate::catalog::{recipe_by_item, Catalog, CatalogError, Discipline, Faction, Recipe};
use crate::cost::CostValue;

/// Cost of one unit of the recipe's output.
pub fn unit_cost(
    catalog: &Catalog,
    faction: Faction,
    discipline: Discipline,
    recipe_id: &str,
) -> Result<CostValue, CatalogError> {
    let recipe = find_recipe(catalog, faction, discipline, recipe_id)?;
    Ok(Pricer::new(catalog, faction, discipline).amortized(recipe))
}

/// Cost of one full execution of the recipe, yielding `count` units.
pub fn batch_cost(
    catalog: &Catalog,
    faction: Faction,
    discipline: Discipline,
    recipe_id: &str,
) -> Result<CostValue, CatalogError> {
    let recipe = find_recipe(catalog, faction, discipline, recipe_id)?;
    Ok(Pricer::new(catalog, faction, discipline).ingredient_total(recipe))
}

/// Price of one unit of an item: crafted if a recipe exists, else its base price.
pub fn item_unit_price(catalog: &Catalog, faction: Faction, discipline: Discipline, item_id: &str) -> CostValue {
    Pricer::new(catalog, faction, discipline).unit_price(item_id)
}

/// Set price of an item; an item missing from the catalog counts as unpriced.
pub fn base_price(catalog: &Catalog, faction: Faction, item_id: &str) -> CostValue {
    catalog
        .item(faction, item_id)
        .map(|item| item.price.clone())
        .unwrap_or_else(|| CostValue::missing(item_id))
}

fn find_recipe<'a>(
    catalog: &'a Catalog,
    faction: Faction,
    discipline: Discipline,
    recipe_id: &str,
) -> Result<&'a Recipe, CatalogError> {
    catalog
        .recipe(faction, discipline, recipe_id)
        .ok_or_else(|| CatalogError::NotFound(format!("recipe {recipe_id} in {faction}/{discipline}")))
}

/// One pricing query over a bucket. Unit prices are memoized per item, so an
/// intermediate shared by many recipes is priced once.
struct Pricer<'a> {
    catalog: &'a Catalog,
    faction: Faction,
    discipline: Discipline,
    unit_prices: HashMap<&'a str, CostValue>,
}

impl<'a> Pricer<'a> {
    fn new(catalog: &'a Catalog, faction: Faction, discipline: Discipline) -> Self {
        Self {
            catalog,
            faction,
            discipline,
            unit_prices: HashMap::new(),
        }
    }

    fn unit_price(&mut self, item_id: &str) -> CostValue {
        let Some(sub) = recipe_by_item(self.catalog, self.faction, self.discipline, item_id) else {
            return base_price(self.catalog, self.faction, item_id);
        };
        if let Some(price) = self.unit_prices.get(sub.item_id.as_str()) {
            return price.clone();
        }
        // Compacted so a subtree shared by many paths does not multiply its reasons.
        let price = self.amortized(sub).compacted();
        self.unit_prices.insert(sub.item_id.as_str(), price.clone());
        price
    }

    fn amortized(&mut self, recipe: &'a Recipe) -> CostValue {
        self.ingredient_total(recipe).div(i64::from(recipe.count))
    }

    fn ingredient_total(&mut self, recipe: &'a Recipe) -> CostValue {
        let mut total = CostValue::default();
        for (ingredient, qty) in &recipe.items {
            total += self.unit_price(ingredient) * i64::from(*qty);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Item;
    use crate::cost::DIVISION_BY_ZERO_REASON;

    const F: Faction = Faction::Elyos;
    const D: Discipline = Discipline::Alchemy;

    /// A (unset) <- R1: 4 x B (10) + 1 x C (5), yields 2.
    fn scenario() -> Catalog {
        let mut catalog = Catalog::new();
        let items = catalog.items_mut(F);
        items.insert("A".into(), Item::new("A").with_name("Elixir"));
        items.insert("B".into(), Item::new("B").with_name("Herb").with_price(10));
        items.insert("C".into(), Item::new("C").with_name("Water").with_price(5));
        catalog.insert_recipe(F, D, Recipe::new("R1", "A", 2).with_ingredient("B", 4).with_ingredient("C", 1));
        catalog
    }

    #[test]
    fn unit_and_batch_cost_scenario() {
        let catalog = scenario();
        assert_eq!(unit_cost(&catalog, F, D, "R1").unwrap(), CostValue::known(22));
        assert_eq!(batch_cost(&catalog, F, D, "R1").unwrap(), CostValue::known(45));
    }

    #[test]
    fn nested_recipes_use_unit_cost_of_intermediates() {
        let mut catalog = scenario();
        catalog.insert_recipe(F, D, Recipe::new("R2", "X", 1).with_ingredient("A", 3));
        // 3 x unit(A) = 3 x 22
        assert_eq!(batch_cost(&catalog, F, D, "R2").unwrap(), CostValue::known(66));
    }

    #[test]
    fn missing_prices_propagate_as_reasons() {
        let mut catalog = scenario();
        catalog.insert_recipe(F, D, Recipe::new("R3", "Y", 1).with_ingredient("A", 1).with_ingredient("D", 2));
        catalog.items_mut(F).insert("D".into(), Item::new("D").with_name("Dust"));
        let cost = batch_cost(&catalog, F, D, "R3").unwrap();
        assert_eq!(cost.value, 22);
        assert_eq!(cost.reasons, vec!["Dust"]);
    }

    #[test]
    fn unknown_ingredient_counts_as_missing() {
        let mut catalog = Catalog::new();
        catalog
            .bucket_mut(F, D)
            .recipes
            .insert("R".into(), Recipe::new("R", "out", 1).with_ingredient("ghost", 2));
        let cost = batch_cost(&catalog, F, D, "R").unwrap();
        assert_eq!(cost.reasons, vec!["ghost"]);
    }

    #[test]
    fn zero_batch_degrades_instead_of_failing() {
        let mut catalog = scenario();
        catalog.insert_recipe(F, D, Recipe::new("R0", "Z", 0).with_ingredient("B", 1));
        let cost = unit_cost(&catalog, F, D, "R0").unwrap();
        assert_eq!(cost.value, 0);
        assert_eq!(cost.reasons, vec![DIVISION_BY_ZERO_REASON]);
    }

    #[test]
    fn unknown_recipe_is_not_found() {
        let catalog = scenario();
        assert!(matches!(unit_cost(&catalog, F, D, "nope"), Err(CatalogError::NotFound(_))));
        assert!(matches!(batch_cost(&catalog, F, Discipline::Cooking, "R1"), Err(CatalogError::NotFound(_))));
    }
}
