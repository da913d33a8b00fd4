//! Crafting plan: what to buy and in which order to craft.
//!
//! A breadth-first walk from the root recipe discovers every craftable
//! intermediate once and records it in an arena of craft steps, together with
//! its ingredient edges. Demand then flows from the root in topological order:
//! each step's quantity is the sum, over every consumer, of the consumer's
//! quantity times the local ingredient quantity, so shared intermediates are
//! counted once per path without walking each path. Leaf ingredients (no
//! canonical recipe) accumulate into the shopping list the same way.
//!
//! A step's layer is its longest distance from the root, so every intermediate
//! sits deeper than the steps that consume it. Steps render deepest layer first
//! and the root item (layer 0) last.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

use crate::catalog::{recipe_by_item, Catalog, CatalogError, Discipline, Faction, ValidationError};
use crate::cost::{distinct_labels, CostValue};

use super::base_price;

/// An intermediate (or the final) item to craft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftStep {
    pub item_id: String,
    pub name: String,
    pub recipe_id: String,
    pub quantity: u64,
    pub layer: u32,
}

/// A base item to buy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseRequirement {
    pub item_id: String,
    pub name: String,
    pub quantity: u64,
    pub price: CostValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub faction: Faction,
    pub discipline: Discipline,
    pub recipe_id: String,
    /// Sorted by display name, then id.
    pub base_items: Vec<BaseRequirement>,
    /// Deepest layer first; the root item is the last step.
    pub crafts: Vec<CraftStep>,
}

/// An ingredient edge of a craft step.
enum Input<'a> {
    Craft(usize),
    Base(&'a str),
}

/// Breadth-first ingredient walk from `recipe_id`.
pub fn gather_plan(
    catalog: &Catalog,
    faction: Faction,
    discipline: Discipline,
    recipe_id: &str,
) -> Result<Plan, CatalogError> {
    let root = catalog
        .recipe(faction, discipline, recipe_id)
        .ok_or_else(|| CatalogError::NotFound(format!("recipe {recipe_id} in {faction}/{discipline}")))?;

    let name_of = |id: &str| {
        catalog
            .item(faction, id)
            .map(|item| item.display_name().to_string())
            .unwrap_or_else(|| id.to_string())
    };

    // Arena of craft steps in discovery order, indexed by item id. Slot i's
    // ingredient edges live in inputs[i].
    let mut crafts: Vec<CraftStep> = vec![CraftStep {
        item_id: root.item_id.clone(),
        name: name_of(&root.item_id),
        recipe_id: root.id.clone(),
        quantity: 0,
        layer: 0,
    }];
    let mut craft_index: HashMap<&str, usize> = HashMap::from([(root.item_id.as_str(), 0)]);
    let mut inputs: Vec<Vec<(Input<'_>, u64)>> = vec![Vec::new()];
    let mut consumers: Vec<usize> = vec![0];

    let mut queue: VecDeque<usize> = VecDeque::from([0]);
    while let Some(idx) = queue.pop_front() {
        let Some(current) = catalog.recipe(faction, discipline, &crafts[idx].recipe_id) else {
            continue;
        };
        for (ingredient, qty) in &current.items {
            let qty = u64::from(*qty);
            let Some(sub) = recipe_by_item(catalog, faction, discipline, ingredient) else {
                inputs[idx].push((Input::Base(ingredient.as_str()), qty));
                continue;
            };
            let child = match craft_index.get(ingredient.as_str()) {
                Some(&child) => child,
                None => {
                    let child = crafts.len();
                    craft_index.insert(ingredient.as_str(), child);
                    crafts.push(CraftStep {
                        item_id: ingredient.clone(),
                        name: name_of(ingredient),
                        recipe_id: sub.id.clone(),
                        quantity: 0,
                        layer: 0,
                    });
                    inputs.push(Vec::new());
                    consumers.push(0);
                    queue.push_back(child);
                    child
                }
            };
            consumers[child] += 1;
            inputs[idx].push((Input::Craft(child), qty));
        }
    }

    // Demand flows from the root in topological order: a step is expanded once
    // every step consuming it has added its share, so each edge is visited once.
    if consumers[0] > 0 {
        return Err(cycle_through(faction, discipline, &crafts, 0..1));
    }
    let mut base: BTreeMap<&str, u64> = BTreeMap::new();
    crafts[0].quantity = 1;
    let mut ready: VecDeque<usize> = VecDeque::from([0]);
    let mut expanded = 0;
    while let Some(idx) = ready.pop_front() {
        expanded += 1;
        let (quantity, layer) = (crafts[idx].quantity, crafts[idx].layer);
        for (input, qty) in &inputs[idx] {
            let amount = qty.saturating_mul(quantity);
            match *input {
                Input::Base(id) => *base.entry(id).or_insert(0) += amount,
                Input::Craft(child) => {
                    let step = &mut crafts[child];
                    step.quantity = step.quantity.saturating_add(amount);
                    step.layer = step.layer.max(layer + 1);
                    consumers[child] -= 1;
                    if consumers[child] == 0 {
                        ready.push_back(child);
                    }
                }
            }
        }
    }
    if expanded < crafts.len() {
        let stuck = (0..crafts.len()).filter(|&i| consumers[i] > 0);
        return Err(cycle_through(faction, discipline, &crafts, stuck));
    }

    // Stable: equal layers keep discovery order.
    crafts.sort_by(|a, b| b.layer.cmp(&a.layer));

    let mut base_items: Vec<BaseRequirement> = base
        .into_iter()
        .map(|(item_id, quantity)| BaseRequirement {
            name: name_of(item_id),
            price: base_price(catalog, faction, item_id),
            item_id: item_id.to_string(),
            quantity,
        })
        .collect();
    base_items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.item_id.cmp(&b.item_id)));

    Ok(Plan {
        faction,
        discipline,
        recipe_id: root.id.clone(),
        base_items,
        crafts,
    })
}

fn cycle_through(
    faction: Faction,
    discipline: Discipline,
    crafts: &[CraftStep],
    slots: impl Iterator<Item = usize>,
) -> CatalogError {
    let path = slots.map(|i| crafts[i].item_id.clone()).collect();
    CatalogError::Validation(ValidationError::Cycle {
        faction,
        discipline,
        path,
    })
}

impl Plan {
    /// Every missing-price reason among the base items, deduplicated.
    pub fn missing_prices(&self) -> Vec<&str> {
        distinct_labels(
            self.base_items
                .iter()
                .flat_map(|b| b.price.reasons.iter().map(String::as_str)),
        )
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("First you buy: ")?;
        if self.base_items.is_empty() {
            f.write_str("nothing")?;
        }
        for (i, item) in self.base_items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if item.price.is_uncertain() {
                write!(f, "{} ({}) @ N/A", item.name, item.quantity)?;
            } else {
                write!(f, "{} ({}) @ {}", item.name, item.quantity, item.price.value)?;
            }
        }
        f.write_str("\nThen you craft:")?;
        for step in &self.crafts {
            write!(f, " --> {} ({})", step.name, step.quantity)?;
        }
        writeln!(f)
    }
}
