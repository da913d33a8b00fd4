//! # Catalog - items, recipes and their lifecycle
//!
//! The catalog is the item/recipe graph the cost engine works on. It is partitioned
//! first by [`Faction`] and, for recipes, by crafting [`Discipline`]:
//!
//! ```text
//! items:   faction -> item id -> Item
//! recipes: faction -> discipline -> recipe id -> Recipe
//! ```
//!
//! A catalog is built once (bulk loaded from a seed file or restored from a
//! snapshot), enriched by a naming pass, then served by the dispatcher, which is
//! its only owner while the process runs. Every price mutation marks it dirty;
//! the persistence task clears the flag after it has taken a snapshot.
//!
//! ## Components
//!
//! - [`resolver`] - picks the canonical recipe producing an item
//! - [`graph`] - invariant and acyclicity validation run before serving
//! - [`seed_loader`] - bulk loader and name table for first start
//! - [`errors`] - error taxonomy shared with the engine
//!
//! All maps are `BTreeMap`s so snapshots, replies and tie-breaks never depend
//! on hash iteration order.

pub mod errors;
pub mod graph;
pub mod resolver;
pub mod seed_loader;

pub use errors::{CatalogError, ValidationError};
pub use resolver::recipe_by_item;

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::cost::CostValue;

/// Item id -> item, one map per faction.
pub type ItemMap = BTreeMap<String, Item>;
/// Recipe id -> recipe, one map per (faction, discipline) bucket.
pub type RecipeMap = BTreeMap<String, Recipe>;

static EMPTY_ITEMS: ItemMap = BTreeMap::new();
static EMPTY_RECIPES: RecipeMap = BTreeMap::new();

/// Top-level partition of the catalog: the two playable sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Elyos,
    Asmodian,
}

impl Faction {
    pub const ALL: [Faction; 2] = [Faction::Elyos, Faction::Asmodian];

    pub fn display_name(self) -> &'static str {
        match self {
            Faction::Elyos => "Elyos",
            Faction::Asmodian => "Asmodian",
        }
    }

    /// Parse a faction name (case-insensitive) or its menu number.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "elyos" | "1" => Some(Faction::Elyos),
            "asmodian" | "2" => Some(Faction::Asmodian),
            _ => None,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A crafting profession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    Handicraft,
    Weaponsmith,
    Armorsmith,
    Tailoring,
    Alchemy,
    Cooking,
}

impl Discipline {
    pub const ALL: [Discipline; 6] = [
        Discipline::Handicraft,
        Discipline::Weaponsmith,
        Discipline::Armorsmith,
        Discipline::Tailoring,
        Discipline::Alchemy,
        Discipline::Cooking,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Discipline::Handicraft => "Handicraft",
            Discipline::Weaponsmith => "Weaponsmith",
            Discipline::Armorsmith => "Armorsmith",
            Discipline::Tailoring => "Tailoring",
            Discipline::Alchemy => "Alchemy",
            Discipline::Cooking => "Cooking",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.display_name().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Catalog lifecycle. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum LifecycleState {
    #[default]
    Created,
    Populated,
    Named,
}

/// A purchasable or craftable thing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub price: CostValue,
}

impl Item {
    /// An item known only by id: no name, price unset.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            price: CostValue::missing(id.clone()),
            name: String::new(),
            id,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn with_price(mut self, price: i64) -> Self {
        self.set_price(price);
        self
    }

    /// Name if known, otherwise the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Rename the item. An unset price keeps pointing at the current display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let refresh = self.price.reasons.len() == 1 && self.price.reasons[0] == self.display_name();
        self.name = name.into();
        if refresh {
            self.price = CostValue::missing(self.display_name().to_string());
        }
    }

    pub fn set_price(&mut self, price: i64) {
        self.price = CostValue::known(price);
    }

    pub fn has_price(&self) -> bool {
        !self.price.is_uncertain()
    }
}

/// One way of crafting a batch of `count` units of `item_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub item_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: u32,
    pub count: u32,
    /// Ingredient item id -> required quantity per execution.
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
}

impl Recipe {
    pub fn new(id: impl Into<String>, item_id: impl Into<String>, count: u32) -> Self {
        Self {
            id: id.into(),
            item_id: item_id.into(),
            name: String::new(),
            level: 0,
            count,
            items: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Add (or increase) an ingredient requirement.
    pub fn with_ingredient(mut self, item_id: impl Into<String>, quantity: u32) -> Self {
        *self.items.entry(item_id.into()).or_insert(0) += quantity;
        self
    }
}

/// Mutable view of one (faction, discipline) bucket for bulk loaders.
pub struct BucketMut<'a> {
    pub items: &'a mut ItemMap,
    pub recipes: &'a mut RecipeMap,
}

/// Enrichment pass that fills in display names.
pub trait ItemNamer {
    /// Name the items of one faction; returns how many were renamed.
    fn name_items(&mut self, faction: Faction, items: &mut ItemMap) -> usize;
}

/// The item/recipe graph plus lifecycle state and the dirty flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    items: BTreeMap<Faction, ItemMap>,
    #[serde(default)]
    recipes: BTreeMap<Faction, BTreeMap<Discipline, RecipeMap>>,
    #[serde(default)]
    state: LifecycleState,
    #[serde(skip)]
    dirty: bool,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Empty containers for every faction and discipline; state `Created`.
    pub fn new() -> Self {
        let mut catalog = Self {
            items: BTreeMap::new(),
            recipes: BTreeMap::new(),
            state: LifecycleState::Created,
            dirty: false,
        };
        catalog.ensure_buckets();
        catalog
    }

    /// Restore a catalog from snapshot bytes.
    pub fn load(bytes: &[u8]) -> Result<Self, CatalogError> {
        let mut catalog: Catalog =
            serde_json::from_slice(bytes).map_err(CatalogError::Deserialization)?;
        catalog.ensure_buckets();
        catalog.dirty = false;
        info!(
            "Catalog loaded: state={:?} elyos_items={} asmodian_items={}",
            catalog.state,
            catalog.items(Faction::Elyos).len(),
            catalog.items(Faction::Asmodian).len()
        );
        Ok(catalog)
    }

    /// Serialize the catalog. Leaves the dirty flag alone; clearing it is the owner's call.
    pub fn save(&self) -> Result<Vec<u8>, CatalogError> {
        serde_json::to_vec_pretty(self).map_err(CatalogError::Serialization)
    }

    fn ensure_buckets(&mut self) {
        for faction in Faction::ALL {
            self.items.entry(faction).or_default();
            let by_discipline = self.recipes.entry(faction).or_default();
            for discipline in Discipline::ALL {
                by_discipline.entry(discipline).or_default();
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Move the lifecycle forward. Re-entering the current state is a no-op.
    pub fn advance_state(&mut self, to: LifecycleState) -> Result<(), CatalogError> {
        if to < self.state {
            return Err(CatalogError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        if to != self.state {
            info!("Catalog state {:?} -> {:?}", self.state, to);
            self.state = to;
        }
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn items(&self, faction: Faction) -> &ItemMap {
        self.items.get(&faction).unwrap_or(&EMPTY_ITEMS)
    }

    pub fn items_mut(&mut self, faction: Faction) -> &mut ItemMap {
        self.items.entry(faction).or_default()
    }

    pub fn item(&self, faction: Faction, item_id: &str) -> Option<&Item> {
        self.items(faction).get(item_id)
    }

    pub fn recipes(&self, faction: Faction, discipline: Discipline) -> &RecipeMap {
        self.recipes
            .get(&faction)
            .and_then(|d| d.get(&discipline))
            .unwrap_or(&EMPTY_RECIPES)
    }

    pub fn recipe(&self, faction: Faction, discipline: Discipline, recipe_id: &str) -> Option<&Recipe> {
        self.recipes(faction, discipline).get(recipe_id)
    }

    /// Direct mutable access to one bucket's items and recipes.
    pub fn bucket_mut(&mut self, faction: Faction, discipline: Discipline) -> BucketMut<'_> {
        let items = self.items.entry(faction).or_default();
        let recipes = self
            .recipes
            .entry(faction)
            .or_default()
            .entry(discipline)
            .or_default();
        BucketMut { items, recipes }
    }

    /// Insert a recipe, creating its output item when absent.
    /// Returns false (and changes nothing) when the id is already taken in the bucket.
    pub fn insert_recipe(&mut self, faction: Faction, discipline: Discipline, recipe: Recipe) -> bool {
        let bucket = self.bucket_mut(faction, discipline);
        if bucket.recipes.contains_key(&recipe.id) {
            return false;
        }
        bucket
            .items
            .entry(recipe.item_id.clone())
            .or_insert_with(|| Item::new(recipe.item_id.clone()));
        bucket.recipes.insert(recipe.id.clone(), recipe);
        true
    }

    pub fn recipe_count(&self, faction: Faction) -> usize {
        Discipline::ALL
            .into_iter()
            .map(|d| self.recipes(faction, d).len())
            .sum()
    }

    /// Run a naming pass over every faction and mark the catalog `Named`.
    pub fn apply_naming(&mut self, namer: &mut dyn ItemNamer) -> Result<usize, CatalogError> {
        let mut renamed = 0;
        for faction in Faction::ALL {
            renamed += namer.name_items(faction, self.items_mut(faction));
        }
        self.advance_state(LifecycleState::Named)?;
        info!("Naming pass renamed {} items", renamed);
        Ok(renamed)
    }
}
