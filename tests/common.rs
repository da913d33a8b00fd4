//! Test utilities & fixtures.
//! Provides access to the integration seed under `tests/test-data-int`.

#![allow(dead_code)] // Each test binary uses a different subset.

use std::path::{Path, PathBuf};

use craftcost::catalog::seed_loader::{load_seed_from_json, populate, NameTable};
use craftcost::catalog::{Catalog, Discipline, Faction, Item, Recipe};

pub const ORE: &str = "152000001";
pub const FLUX: &str = "152000002";
pub const INGOT: &str = "100100";
pub const SWORD: &str = "100200";

/// Return the path to the static integration test fixture directory.
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("test-data-int")
}

pub fn seed_path() -> PathBuf {
    fixture_root().join("seed.json")
}

/// The fixture seed loaded and named, as the service would serve it.
pub fn seeded_catalog() -> Catalog {
    let seed = load_seed_from_json(seed_path()).expect("seed");
    let mut catalog = Catalog::new();
    populate(&mut catalog, &seed).expect("populate");
    catalog.apply_naming(&mut NameTable::from_seed(&seed)).expect("naming");
    catalog
}

/// A temp dir holding a copy of the seed, for tests that write snapshots next to it.
pub fn writable_fixture() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::copy(seed_path(), tmp.path().join("seed.json")).expect("copy seed");
    tmp
}

/// A (unset) <- R1: 4 x B (10) + 1 x C (5), batch of 2.
pub fn scenario_catalog(faction: Faction, discipline: Discipline) -> Catalog {
    let mut catalog = Catalog::new();
    let items = catalog.items_mut(faction);
    items.insert("A".into(), Item::new("A").with_name("Elixir"));
    items.insert("B".into(), Item::new("B").with_name("Herb").with_price(10));
    items.insert("C".into(), Item::new("C").with_name("Water").with_price(5));
    catalog.insert_recipe(
        faction,
        discipline,
        Recipe::new("R1", "A", 2).with_level(20).with_ingredient("B", 4).with_ingredient("C", 1),
    );
    catalog
}

/// `n0 <- n1 + m1`, `m1 <- n1`, `n1 <- n2 + m2`, ... down to the base item
/// `n{levels}` priced at 1. Every level doubles the number of root-to-base paths.
pub fn diamond_ladder(faction: Faction, discipline: Discipline, levels: usize) -> Catalog {
    let mut catalog = Catalog::new();
    for i in 0..=levels {
        for id in [format!("n{i}"), format!("m{i}")] {
            catalog.items_mut(faction).insert(id.clone(), Item::new(id.clone()).with_name(id.to_uppercase()));
        }
    }
    catalog.items_mut(faction).insert(format!("n{levels}"), Item::new(format!("n{levels}")).with_price(1));
    for i in 0..levels {
        let next = i + 1;
        catalog.insert_recipe(
            faction,
            discipline,
            Recipe::new(format!("r-n{i}"), format!("n{i}"), 1)
                .with_ingredient(format!("n{next}"), 1)
                .with_ingredient(format!("m{next}"), 1),
        );
        catalog.insert_recipe(
            faction,
            discipline,
            Recipe::new(format!("r-m{next}"), format!("m{next}"), 1).with_ingredient(format!("n{next}"), 1),
        );
    }
    catalog
}
