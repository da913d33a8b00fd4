//! Load-time validation of the recipe graph.
//!
//! Cost and plan computations recurse through ingredients without a depth guard,
//! so a catalog must pass [`validate`] before it is served. Edges follow the
//! resolver: recipe `r` depends on the canonical recipe of each ingredient in the
//! same (faction, discipline) bucket.

use log::debug;
use std::collections::HashMap;

use super::errors::ValidationError;
use super::resolver::recipe_by_item;
use super::{Catalog, Discipline, Faction};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Check every bucket; returns the first violation found.
pub fn validate(catalog: &Catalog) -> Result<(), ValidationError> {
    for faction in Faction::ALL {
        for discipline in Discipline::ALL {
            check_recipes(catalog, faction, discipline)?;
            check_acyclic(catalog, faction, discipline)?;
        }
    }
    debug!("Catalog validation passed");
    Ok(())
}

fn check_recipes(catalog: &Catalog, faction: Faction, discipline: Discipline) -> Result<(), ValidationError> {
    for recipe in catalog.recipes(faction, discipline).values() {
        if recipe.count == 0 {
            return Err(ValidationError::ZeroCount {
                faction,
                discipline,
                recipe: recipe.id.clone(),
            });
        }
        if catalog.item(faction, &recipe.item_id).is_none() {
            return Err(ValidationError::DanglingOutput {
                faction,
                discipline,
                recipe: recipe.id.clone(),
                item: recipe.item_id.clone(),
            });
        }
        if recipe.items.contains_key(&recipe.item_id) {
            return Err(ValidationError::SelfIngredient {
                faction,
                discipline,
                recipe: recipe.id.clone(),
            });
        }
        if let Some((ingredient, _)) = recipe.items.iter().find(|(_, qty)| **qty == 0) {
            return Err(ValidationError::ZeroQuantity {
                faction,
                discipline,
                recipe: recipe.id.clone(),
                ingredient: ingredient.clone(),
            });
        }
    }
    Ok(())
}

/// Iterative depth-first search; a back edge to a `Visiting` recipe is a cycle.
fn check_acyclic(catalog: &Catalog, faction: Faction, discipline: Discipline) -> Result<(), ValidationError> {
    let recipes = catalog.recipes(faction, discipline);
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(recipes.len());

    for root in recipes.keys() {
        if marks.contains_key(root.as_str()) {
            continue;
        }
        // (recipe id, dependency ids, next dependency index)
        let mut stack: Vec<(&str, Vec<&str>, usize)> = Vec::new();
        let root = root.as_str();
        marks.insert(root, Mark::Visiting);
        stack.push((root, dependencies(catalog, faction, discipline, root), 0));

        while let Some(frame) = stack.last_mut() {
            let (_, deps, next) = frame;
            if *next == deps.len() {
                if let Some((done, _, _)) = stack.pop() {
                    marks.insert(done, Mark::Done);
                }
                continue;
            }
            let dep = deps[*next];
            *next += 1;
            match marks.get(dep) {
                Some(Mark::Done) => {}
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|(id, _, _)| *id == dep).unwrap_or(0);
                    let mut path: Vec<String> = stack[start..].iter().map(|(id, _, _)| id.to_string()).collect();
                    path.push(dep.to_string());
                    return Err(ValidationError::Cycle {
                        faction,
                        discipline,
                        path,
                    });
                }
                None => {
                    marks.insert(dep, Mark::Visiting);
                    let deps = dependencies(catalog, faction, discipline, dep);
                    stack.push((dep, deps, 0));
                }
            }
        }
    }
    Ok(())
}

fn dependencies<'a>(catalog: &'a Catalog, faction: Faction, discipline: Discipline, recipe_id: &str) -> Vec<&'a str> {
    catalog
        .recipe(faction, discipline, recipe_id)
        .map(|recipe| {
            recipe
                .items
                .keys()
                .filter_map(|ingredient| recipe_by_item(catalog, faction, discipline, ingredient))
                .map(|sub| sub.id.as_str())
                .collect()
        })
        .unwrap_or_default()
}
