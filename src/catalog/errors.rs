use thiserror::Error;

use super::{Discipline, Faction, LifecycleState};

/// Errors raised by the catalog, its loaders and the cost engine.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Item, recipe or bucket that is not present.
    #[error("not found: {0}")]
    NotFound(String),

    /// Snapshot or seed bytes that do not match the expected structure.
    #[error("malformed catalog data: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("could not serialize catalog: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Wrapper around IO errors (seed files etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The recipe graph breaks an invariant and must not be served.
    #[error("invalid catalog: {0}")]
    Validation(#[from] ValidationError),

    /// Lifecycle state only moves forward.
    #[error("cannot move catalog state from {from:?} to {to:?}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
}

/// Invariant violations found by [`super::graph::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("recipe cycle in {faction}/{discipline}: {}", path.join(" -> "))]
    Cycle {
        faction: Faction,
        discipline: Discipline,
        path: Vec<String>,
    },

    #[error("recipe {recipe} in {faction}/{discipline} yields 0 units")]
    ZeroCount {
        faction: Faction,
        discipline: Discipline,
        recipe: String,
    },

    #[error("recipe {recipe} in {faction}/{discipline} requires 0 of {ingredient}")]
    ZeroQuantity {
        faction: Faction,
        discipline: Discipline,
        recipe: String,
        ingredient: String,
    },

    #[error("recipe {recipe} in {faction}/{discipline} lists its own output as an ingredient")]
    SelfIngredient {
        faction: Faction,
        discipline: Discipline,
        recipe: String,
    },

    #[error("recipe {recipe} in {faction}/{discipline} produces unknown item {item}")]
    DanglingOutput {
        faction: Faction,
        discipline: Discipline,
        recipe: String,
        item: String,
    },
}
