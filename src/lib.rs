//! # craftcost - crafting cost estimator
//!
//! craftcost keeps a catalog of game items and crafting recipes, split by faction and
//! crafting discipline, and answers three kinds of questions about it:
//!
//! - **Set**: record the market price of a base item.
//! - **Price**: estimate what it costs to craft every item whose name matches an
//!   expression, disclosing which missing prices make the estimate uncertain.
//! - **Plan**: list the base items to buy and the intermediate crafts to perform,
//!   in order, to produce an item.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use craftcost::catalog::Faction;
//! use craftcost::config::Config;
//! use craftcost::dispatch::start_dispatcher;
//! use craftcost::storage::{open_catalog, SnapshotStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = SnapshotStore::new(&config.catalog.snapshot_path);
//!     let (catalog, _) = open_catalog(&store, &config.catalog.seed_path).await?;
//!
//!     let (handle, task) = start_dispatcher(catalog, config.dispatcher.queue_capacity);
//!     println!("{}", handle.set_price(Faction::Elyos, "Iron Ore", 12).await?);
//!     println!("{}", handle.price(Faction::Elyos, "iron").await?);
//!     handle.shutdown().await?;
//!     let catalog = task.await?;
//!     store.save(&catalog.save()?).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`cost`] - integer cost values carrying missing-price reasons
//! - [`catalog`] - items, recipes, lifecycle, seed loading and validation
//! - [`engine`] - unit and batch cost, crafting plans
//! - [`dispatch`] - the single-owner command loop and its handle
//! - [`frontend`] - user-facing front-ends (terminal CLI)
//! - [`storage`] - snapshot persistence and the periodic saver
//! - [`config`] - TOML configuration
//! - [`validation`] - price, name and pattern checks
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐
//! │ CLI session  │  │ CLI session  │   ← front-ends, one task each
//! └──────┬───────┘  └──────┬───────┘
//!        └───── mpsc ──────┘
//!               │
//!        ┌──────────────┐
//!        │  Dispatcher  │ ← sole owner of the Catalog
//!        └──────┬───────┘
//!               │ snapshot
//!        ┌──────────────┐
//!        │    Saver     │ ← periodic persistence
//!        └──────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod cost;
pub mod dispatch;
pub mod engine;
pub mod frontend;
pub mod logutil;
pub mod metrics;
pub mod storage;
pub mod validation;
