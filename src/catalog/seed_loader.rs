//! Seed data loader for first start.
//!
//! When no snapshot exists the catalog is bulk loaded from a JSON seed file
//! (`data/seed.json` by default). The file holds already-extracted recipe data;
//! fetching it from third-party sites is a separate tool's job.
//!
//! ```json
//! {
//!   "items":   [{ "faction": "elyos", "id": "152000", "name": "Iron Ore", "price": 10 }],
//!   "recipes": [{ "faction": "elyos", "discipline": "weaponsmith", "id": "r1",
//!                 "item_id": "100001", "name": "Iron Sword", "level": 10, "count": 1,
//!                 "items": { "152000": 4 } }],
//!   "names":   { "elyos": { "100001": "Iron Sword" } }
//! }
//! ```

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{Catalog, CatalogError, Discipline, Faction, Item, ItemMap, ItemNamer, LifecycleState, Recipe};
use crate::logutil::escape_log;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub items: Vec<ItemSeed>,
    #[serde(default)]
    pub recipes: Vec<RecipeSeed>,
    /// Display names applied by the naming pass, per faction.
    #[serde(default)]
    pub names: BTreeMap<Faction, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSeed {
    pub faction: Faction,
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSeed {
    pub faction: Faction,
    pub discipline: Discipline,
    #[serde(flatten)]
    pub recipe: Recipe,
}

/// Counts from one [`populate`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub items: usize,
    pub recipes: usize,
    pub duplicates: usize,
}

/// Load a seed file from disk.
pub fn load_seed_from_json<P: AsRef<Path>>(path: P) -> Result<SeedFile, CatalogError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let seed: SeedFile = serde_json::from_str(&contents).map_err(CatalogError::Deserialization)?;
    info!(
        "Seed file {} parsed: {} items, {} recipes",
        path.display(),
        seed.items.len(),
        seed.recipes.len()
    );
    Ok(seed)
}

/// Bulk load items and recipes into the catalog and mark it `Populated`.
///
/// Recipes whose id is already present in their bucket are skipped. Output and
/// ingredient items referenced by a recipe are created on demand.
pub fn populate(catalog: &mut Catalog, seed: &SeedFile) -> Result<SeedReport, CatalogError> {
    let mut report = SeedReport::default();

    for entry in &seed.items {
        let item = catalog
            .items_mut(entry.faction)
            .entry(entry.id.clone())
            .or_insert_with(|| Item::new(entry.id.clone()));
        if !entry.name.is_empty() {
            item.set_name(entry.name.clone());
        }
        if let Some(price) = entry.price {
            item.set_price(price);
        }
        report.items += 1;
    }

    for entry in &seed.recipes {
        let bucket = catalog.bucket_mut(entry.faction, entry.discipline);
        let recipe = &entry.recipe;
        if bucket.recipes.contains_key(&recipe.id) {
            warn!(
                "Recipe with this ID is already present in {}/{}: {}",
                entry.faction,
                entry.discipline,
                escape_log(&recipe.id)
            );
            report.duplicates += 1;
            continue;
        }
        for id in std::iter::once(&recipe.item_id).chain(recipe.items.keys()) {
            bucket
                .items
                .entry(id.clone())
                .or_insert_with(|| Item::new(id.clone()));
        }
        bucket.recipes.insert(recipe.id.clone(), recipe.clone());
        report.recipes += 1;
    }

    catalog.advance_state(LifecycleState::Populated)?;
    info!(
        "Seed loaded: {} items, {} recipes, {} duplicates skipped",
        report.items, report.recipes, report.duplicates
    );
    Ok(report)
}

/// Naming pass backed by a lookup table of `faction -> item id -> name`.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: BTreeMap<Faction, BTreeMap<String, String>>,
}

impl NameTable {
    pub fn new(names: BTreeMap<Faction, BTreeMap<String, String>>) -> Self {
        Self { names }
    }

    pub fn from_seed(seed: &SeedFile) -> Self {
        Self::new(seed.names.clone())
    }
}

impl ItemNamer for NameTable {
    /// Only fills names that are still empty.
    fn name_items(&mut self, faction: Faction, items: &mut ItemMap) -> usize {
        let Some(table) = self.names.get(&faction) else {
            return 0;
        };
        let mut renamed = 0;
        for item in items.values_mut().filter(|i| i.name.is_empty()) {
            if let Some(name) = table.get(&item.id) {
                item.set_name(name.clone());
                renamed += 1;
            }
        }
        renamed
    }
}
