//! Property-based tests for cost arithmetic, recipe resolution, plans and snapshots.

use proptest::prelude::*;

use craftcost::catalog::{recipe_by_item, Catalog, Discipline, Faction, Item, Recipe};
use craftcost::cost::CostValue;
use craftcost::engine::{batch_cost, gather_plan, unit_cost};

const F: Faction = Faction::Elyos;
const D: Discipline = Discipline::Tailoring;

fn cost_value() -> impl Strategy<Value = CostValue> {
    (
        -1_000_000i64..1_000_000,
        prop::collection::vec("[a-z]{1,6}", 0..4),
    )
        .prop_map(|(value, reasons)| CostValue { value, reasons })
}

/// One output item produced by several recipes with assorted batch sizes.
fn competing_recipes() -> impl Strategy<Value = Vec<(String, u32)>> {
    prop::collection::btree_map("r[0-9]{1,3}", 0u32..4, 1..8).prop_map(|m| m.into_iter().collect())
}

fn catalog_with_recipes(recipes: &[(String, u32)]) -> Catalog {
    let mut catalog = Catalog::new();
    for (id, count) in recipes {
        catalog.insert_recipe(F, D, Recipe::new(id.clone(), "cloth", *count).with_ingredient("thread", 1));
    }
    catalog
}

/// A linear chain `c0 <- c1 <- ... <- base`, each link with its own quantity and batch size.
fn chain_catalog(links: &[(u32, u32)], base_price: Option<i64>) -> Catalog {
    let mut catalog = Catalog::new();
    let mut base = Item::new("base").with_name("Base");
    if let Some(p) = base_price {
        base.set_price(p);
    }
    catalog.items_mut(F).insert("base".into(), base);
    for (i, (qty, count)) in links.iter().enumerate() {
        let input = if i + 1 == links.len() {
            "base".to_string()
        } else {
            format!("c{}", i + 1)
        };
        catalog.insert_recipe(
            F,
            D,
            Recipe::new(format!("r{}", i), format!("c{}", i), *count).with_ingredient(input, *qty),
        );
    }
    catalog
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn plus_adds_values_and_keeps_reasons(a in cost_value(), b in cost_value()) {
        let sum = a.plus(&b);
        prop_assert_eq!(sum.value, a.value + b.value);
        for reason in a.reasons.iter().chain(b.reasons.iter()) {
            prop_assert!(sum.reasons.contains(reason));
        }
    }

    #[test]
    fn division_by_zero_never_panics(a in cost_value()) {
        let d = a.div(0);
        prop_assert_eq!(d.value, 0);
        prop_assert!(!d.reasons.is_empty());
    }

    #[test]
    fn resolver_is_deterministic_and_order_independent(recipes in competing_recipes()) {
        let forward = catalog_with_recipes(&recipes);
        let mut reversed_input = recipes.clone();
        reversed_input.reverse();
        let reversed = catalog_with_recipes(&reversed_input);

        let a = recipe_by_item(&forward, F, D, "cloth").map(|r| r.id.clone());
        let b = recipe_by_item(&forward, F, D, "cloth").map(|r| r.id.clone());
        let c = recipe_by_item(&reversed, F, D, "cloth").map(|r| r.id.clone());
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);

        let expected = recipes
            .iter()
            .filter(|(_, count)| *count > 0)
            .min_by(|x, y| x.1.cmp(&y.1).then_with(|| x.0.cmp(&y.0)))
            .map(|(id, _)| id.clone());
        prop_assert_eq!(a, expected);
    }

    #[test]
    fn unit_cost_truncation_is_bounded(
        prices in prop::collection::vec(0i64..10_000, 1..6),
        quantities in prop::collection::vec(1u32..50, 6),
        count in 1u32..20,
    ) {
        let mut catalog = Catalog::new();
        let mut recipe = Recipe::new("r", "out", count);
        for (i, price) in prices.iter().enumerate() {
            let id = format!("in{}", i);
            catalog.items_mut(F).insert(id.clone(), Item::new(id.clone()).with_price(*price));
            recipe = recipe.with_ingredient(id, quantities[i]);
        }
        catalog.insert_recipe(F, D, recipe);

        let unit = unit_cost(&catalog, F, D, "r").unwrap();
        let batch = batch_cost(&catalog, F, D, "r").unwrap();
        let remainder = batch.value - unit.value * i64::from(count);
        prop_assert!(remainder >= 0);
        prop_assert!(remainder < i64::from(count));
    }

    #[test]
    fn gather_plan_is_idempotent(
        links in prop::collection::vec((1u32..5, 1u32..4), 1..6),
        price in prop::option::of(0i64..100),
    ) {
        let catalog = chain_catalog(&links, price);
        let first = gather_plan(&catalog, F, D, "r0").unwrap();
        let second = gather_plan(&catalog, F, D, "r0").unwrap();
        prop_assert_eq!(&first, &second);

        // Base quantity is the product of the quantities along the chain.
        let expected: u64 = links.iter().map(|(qty, _)| u64::from(*qty)).product();
        prop_assert_eq!(first.base_items.len(), 1);
        prop_assert_eq!(first.base_items[0].quantity, expected);
        prop_assert_eq!(first.crafts.len(), links.len());
        prop_assert_eq!(first.crafts.last().map(|s| s.item_id.as_str()), Some("c0"));
    }

    #[test]
    fn snapshot_round_trip(
        prices in prop::collection::btree_map("[a-z]{1,8}", prop::option::of(0i64..1_000_000), 0..12),
        recipes in competing_recipes(),
    ) {
        let mut catalog = catalog_with_recipes(&recipes);
        for (id, price) in &prices {
            let mut item = Item::new(id.clone()).with_name(id.to_uppercase());
            if let Some(p) = price {
                item.set_price(*p);
            }
            catalog.items_mut(Faction::Asmodian).insert(id.clone(), item);
        }

        let bytes = catalog.save().unwrap();
        let restored = Catalog::load(&bytes).unwrap();
        prop_assert_eq!(restored.state(), catalog.state());
        prop_assert_eq!(restored.items(Faction::Asmodian), catalog.items(Faction::Asmodian));
        prop_assert_eq!(restored.recipes(F, D), catalog.recipes(F, D));
        prop_assert_eq!(restored.save().unwrap(), bytes);
    }
}
