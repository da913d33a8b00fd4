//! Command dispatcher
//!
//! The catalog has exactly one owner at runtime: the dispatcher task started by
//! [`start_dispatcher`]. Front-ends never touch it directly. They enqueue a
//! [`Command`] through a cloneable [`DispatcherHandle`] and wait on the private
//! `oneshot` reply channel carried by that command.
//!
//! * One bounded FIFO queue (`tokio::sync::mpsc`) shared by every front-end;
//!   producers suspend when it is full.
//! * Requests are served strictly one at a time, in enqueue order, so no lock
//!   guards the catalog.
//! * Not-found and malformed requests are answered with text and never stop the loop.
//! * `Shutdown` acknowledges, then ends the loop for all front-ends. Requests still
//!   queued behind it are dropped and their callers see [`DispatchError::Closed`].
//!
//! Besides the user-facing [`Action`]s the loop accepts two internal requests used
//! by the persistence task: `Snapshot` (serialize the catalog and clear the dirty
//! flag) and `MarkDirty` (re-arm after a failed write).
//!
//! The loop publishes its [`DispatcherState`] through a `watch` channel and hands
//! the catalog back through its `JoinHandle` when it ends, so the caller can
//! take a final snapshot.

pub mod replies;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::catalog::resolver::recipes_for_item;
use crate::catalog::{Catalog, Faction, Item};
use crate::cost::distinct_labels;
use crate::engine::{batch_cost, gather_plan};
use crate::logutil::{escape_log, reply_summary};
use crate::metrics;
use crate::validation::{check_price, compile_pattern, normalize_item_name, InputError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SetPrice,
    GetPrice,
    GetPlan,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Dispatching,
    Closed,
}

/// A user request. `item` is an exact item name for `SetPrice`/`GetPlan` and a
/// regular expression for `GetPrice`.
#[derive(Debug)]
pub struct Command {
    pub action: Action,
    pub faction: Faction,
    pub item: String,
    pub price: Option<i64>,
    pub reply: oneshot::Sender<String>,
}

#[derive(Debug)]
pub enum DispatchRequest {
    Command(Command),
    /// Serialize the catalog if dirty (or `force`), clearing the dirty flag.
    Snapshot {
        force: bool,
        reply: oneshot::Sender<Option<Vec<u8>>>,
    },
    MarkDirty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatcher is closed")]
    Closed,
}

/// Owner of the catalog. Everything here runs on the dispatcher task; it is
/// public so the command semantics can be exercised without a runtime.
pub struct Dispatcher {
    catalog: Catalog,
}

impl Dispatcher {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    /// Serve one user action and produce its reply.
    pub fn execute(&mut self, action: Action, faction: Faction, item: &str, price: Option<i64>) -> String {
        debug!(
            "dispatch {:?} faction={} item='{}' price={:?}",
            action,
            faction,
            escape_log(item),
            price
        );
        let reply = match action {
            Action::SetPrice => {
                metrics::inc_set_price();
                self.set_price(faction, item, price)
            }
            Action::GetPrice => {
                metrics::inc_get_price();
                self.get_price(faction, item)
            }
            Action::GetPlan => {
                metrics::inc_get_plan();
                self.get_plan(faction, item)
            }
            Action::Shutdown => replies::SHUTDOWN_ACK.to_string(),
        };
        debug!("reply {:?}: {}", action, reply_summary(&reply));
        reply
    }

    /// Serialized catalog when dirty or forced. The dirty flag is cleared only
    /// when serialization succeeds.
    pub fn snapshot(&mut self, force: bool) -> Option<Vec<u8>> {
        if !force && !self.catalog.is_dirty() {
            return None;
        }
        match self.catalog.save() {
            Ok(bytes) => {
                self.catalog.clear_dirty();
                metrics::inc_snapshots();
                debug!("snapshot taken ({} bytes)", bytes.len());
                Some(bytes)
            }
            Err(e) => {
                error!("snapshot serialization failed: {}", e);
                None
            }
        }
    }

    /// Returns false once the loop must stop.
    fn serve(&mut self, request: DispatchRequest) -> bool {
        match request {
            DispatchRequest::Command(cmd) => {
                let reply = self.execute(cmd.action, cmd.faction, &cmd.item, cmd.price);
                if cmd.reply.send(reply).is_err() {
                    debug!("caller went away before the {:?} reply", cmd.action);
                }
                cmd.action != Action::Shutdown
            }
            DispatchRequest::Snapshot { force, reply } => {
                let _ = reply.send(self.snapshot(force));
                true
            }
            DispatchRequest::MarkDirty => {
                self.catalog.mark_dirty();
                true
            }
        }
    }

    /// Items of `faction` whose name equals `name`, ignoring case. Unnamed
    /// items never match.
    fn items_named(&self, faction: Faction, name: &str) -> Vec<&Item> {
        let wanted = name.to_lowercase();
        self.catalog
            .items(faction)
            .values()
            .filter(|item| !item.name.is_empty() && item.name.to_lowercase() == wanted)
            .collect()
    }

    fn set_price(&mut self, faction: Faction, raw_name: &str, price: Option<i64>) -> String {
        let name = match normalize_item_name(raw_name) {
            Ok(name) => name,
            Err(e) => {
                metrics::inc_malformed();
                return replies::invalid_price(raw_name, &e);
            }
        };
        let price = match price.ok_or(InputError::MissingPrice).and_then(check_price) {
            Ok(price) => price,
            Err(e) => {
                metrics::inc_malformed();
                return replies::invalid_price(&name, &e);
            }
        };

        let ids: Vec<String> = self
            .items_named(faction, &name)
            .into_iter()
            .map(|item| item.id.clone())
            .collect();
        match ids.as_slice() {
            [] => {
                metrics::inc_not_found();
                replies::item_not_found(raw_name.trim())
            }
            [id] => match self.catalog.items_mut(faction).get_mut(id) {
                Some(item) => {
                    item.set_price(price);
                    let reply = replies::price_set(item);
                    self.catalog.mark_dirty();
                    info!("{} price of '{}' set to {}", faction, escape_log(&name), price);
                    reply
                }
                None => replies::item_not_found(raw_name.trim()),
            },
            many => {
                warn!(
                    "{} items named '{}' in {}; price not changed",
                    many.len(),
                    escape_log(&name),
                    faction
                );
                replies::ambiguous_item(&name, many.len())
            }
        }
    }

    fn get_price(&self, faction: Faction, pattern: &str) -> String {
        let re = match compile_pattern(pattern) {
            Ok(re) => re,
            Err(e) => {
                metrics::inc_malformed();
                return replies::invalid_expression(pattern, &e);
            }
        };

        let mut lines = Vec::new();
        let mut reasons: Vec<String> = Vec::new();
        for item in self
            .catalog
            .items(faction)
            .values()
            .filter(|item| !item.name.is_empty() && re.is_match(&item.name))
        {
            let producers = recipes_for_item(&self.catalog, faction, &item.id);
            if producers.is_empty() {
                lines.push(replies::base_price_line(item));
                reasons.extend(item.price.reasons.iter().cloned());
                continue;
            }
            for (discipline, recipe) in producers {
                match batch_cost(&self.catalog, faction, discipline, &recipe.id) {
                    Ok(cost) => {
                        lines.push(replies::crafted_price_line(discipline, recipe, item, &cost));
                        reasons.extend(cost.reasons);
                    }
                    Err(e) => warn!("pricing {} failed: {}", recipe.id, e),
                }
            }
        }

        if lines.is_empty() {
            metrics::inc_not_found();
            return replies::no_items_found(pattern);
        }
        let missing = distinct_labels(reasons.iter().map(String::as_str));
        replies::price_report(&lines, &missing)
    }

    /// Plans for the items named exactly `raw_name` (case-sensitive, trimmed).
    fn get_plan(&self, faction: Faction, raw_name: &str) -> String {
        let name = raw_name.trim();
        let mut out = String::new();
        for item in self
            .catalog
            .items(faction)
            .values()
            .filter(|item| !name.is_empty() && item.name == name)
        {
            for (discipline, recipe) in recipes_for_item(&self.catalog, faction, &item.id) {
                match gather_plan(&self.catalog, faction, discipline, &recipe.id) {
                    Ok(plan) => out.push_str(&replies::plan_section(discipline, recipe, item, &plan)),
                    Err(e) => warn!("planning {} failed: {}", recipe.id, e),
                }
            }
        }

        if out.is_empty() {
            metrics::inc_not_found();
            return replies::plan_not_found(name);
        }
        out
    }
}

/// Cloneable entry point for front-ends and the persistence task.
#[derive(Clone, Debug)]
pub struct DispatcherHandle {
    tx: mpsc::Sender<DispatchRequest>,
    state: watch::Receiver<DispatcherState>,
}

impl DispatcherHandle {
    /// Enqueue a command and wait for its reply.
    pub async fn submit(
        &self,
        action: Action,
        faction: Faction,
        item: impl Into<String>,
        price: Option<i64>,
    ) -> Result<String, DispatchError> {
        let (reply, rx) = oneshot::channel();
        let cmd = Command {
            action,
            faction,
            item: item.into(),
            price,
            reply,
        };
        self.tx
            .send(DispatchRequest::Command(cmd))
            .await
            .map_err(|_| DispatchError::Closed)?;
        rx.await.map_err(|_| DispatchError::Closed)
    }

    pub async fn set_price(&self, faction: Faction, name: &str, price: i64) -> Result<String, DispatchError> {
        self.submit(Action::SetPrice, faction, name, Some(price)).await
    }

    pub async fn price(&self, faction: Faction, pattern: &str) -> Result<String, DispatchError> {
        self.submit(Action::GetPrice, faction, pattern, None).await
    }

    pub async fn plan(&self, faction: Faction, name: &str) -> Result<String, DispatchError> {
        self.submit(Action::GetPlan, faction, name, None).await
    }

    /// Stop the dispatcher for every front-end.
    pub async fn shutdown(&self) -> Result<String, DispatchError> {
        self.submit(Action::Shutdown, Faction::Elyos, "", None).await
    }

    /// Serialized catalog, or `None` when it is clean and `force` is false.
    pub async fn snapshot(&self, force: bool) -> Result<Option<Vec<u8>>, DispatchError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(DispatchRequest::Snapshot { force, reply })
            .await
            .map_err(|_| DispatchError::Closed)?;
        rx.await.map_err(|_| DispatchError::Closed)
    }

    pub async fn mark_dirty(&self) -> Result<(), DispatchError> {
        self.tx
            .send(DispatchRequest::MarkDirty)
            .await
            .map_err(|_| DispatchError::Closed)
    }

    pub fn state(&self) -> DispatcherState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<DispatcherState> {
        self.state.clone()
    }
}

/// Spawn the dispatcher loop on the current runtime.
///
/// The loop ends on `Shutdown` or once every handle is dropped; the task then
/// yields the catalog back.
pub fn start_dispatcher(catalog: Catalog, queue_capacity: usize) -> (DispatcherHandle, JoinHandle<Catalog>) {
    let (tx, mut rx) = mpsc::channel::<DispatchRequest>(queue_capacity.max(1));
    let (state_tx, state_rx) = watch::channel(DispatcherState::Idle);
    let handle = DispatcherHandle { tx, state: state_rx };

    let task = tokio::spawn(async move {
        let mut dispatcher = Dispatcher::new(catalog);
        info!("dispatcher started (queue capacity {})", queue_capacity.max(1));
        while let Some(request) = rx.recv().await {
            state_tx.send_replace(DispatcherState::Dispatching);
            if !dispatcher.serve(request) {
                info!("shutdown requested; closing dispatcher");
                break;
            }
            state_tx.send_replace(DispatcherState::Idle);
        }
        rx.close();
        state_tx.send_replace(DispatcherState::Closed);

        let stats = metrics::snapshot();
        info!(
            "dispatcher closed: commands={} set={} price={} plan={} not_found={} malformed={} snapshots={}",
            stats.commands_served(),
            stats.set_price,
            stats.get_price,
            stats.get_plan,
            stats.not_found,
            stats.malformed,
            stats.snapshots
        );
        dispatcher.into_catalog()
    });

    (handle, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Discipline, Recipe};

    const F: Faction = Faction::Elyos;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        let items = catalog.items_mut(F);
        items.insert("A".into(), Item::new("A").with_name("Elixir"));
        items.insert("B".into(), Item::new("B").with_name("Herb").with_price(10));
        items.insert("C".into(), Item::new("C").with_name("Water"));
        items.insert("ore".into(), Item::new("ore").with_name("IronOre"));
        catalog.insert_recipe(
            F,
            Discipline::Alchemy,
            Recipe::new("R1", "A", 2).with_level(20).with_ingredient("B", 4).with_ingredient("C", 1),
        );
        catalog
    }

    #[test]
    fn set_price_matches_case_insensitively_and_marks_dirty() {
        let mut d = Dispatcher::new(catalog());
        let reply = d.execute(Action::SetPrice, F, "ironore", Some(3));
        assert_eq!(reply, "Price (3) successfully set for item IronOre (ore)");
        assert!(d.catalog().is_dirty());
        assert!(d.catalog().item(F, "ore").unwrap().has_price());
    }

    #[test]
    fn set_price_unknown_item_leaves_dirty_flag() {
        let mut d = Dispatcher::new(catalog());
        assert_eq!(
            d.execute(Action::SetPrice, F, "unknownitem", Some(3)),
            "Item (unknownitem) was not found."
        );
        assert!(!d.catalog().is_dirty());
    }

    #[test]
    fn set_price_rejects_missing_and_negative_prices() {
        let mut d = Dispatcher::new(catalog());
        assert!(d.execute(Action::SetPrice, F, "Herb", None).starts_with("Invalid price for \"Herb\""));
        assert!(d.execute(Action::SetPrice, F, "Herb", Some(-1)).contains("negative"));
        assert!(!d.catalog().is_dirty());
    }

    #[test]
    fn ambiguous_names_do_not_mutate() {
        let mut c = catalog();
        c.items_mut(F).insert("B2".into(), Item::new("B2").with_name("herb"));
        let mut d = Dispatcher::new(c);
        let reply = d.execute(Action::SetPrice, F, "HERB", Some(1));
        assert_eq!(reply, "Item name \"HERB\" matches 2 items; price not changed.");
        assert!(!d.catalog().is_dirty());
        assert_eq!(d.catalog().item(F, "B").unwrap().price.value, 10);
    }

    #[test]
    fn price_report_lists_crafted_and_base_items() {
        let mut d = Dispatcher::new(catalog());
        let reply = d.execute(Action::GetPrice, F, "^(elixir|herb)$", None);
        assert!(reply.contains("Type: Alchemy (Level 20), Item: Elixir (A), Price: 40 + <N/A>."));
        assert!(reply.contains("Type: Base, Item: Herb (B), Price: 10\n"));
        assert!(reply.ends_with("prices:\nWater\n"));
    }

    #[test]
    fn price_without_matches_and_bad_pattern() {
        let mut d = Dispatcher::new(catalog());
        assert_eq!(
            d.execute(Action::GetPrice, F, "dragon", None),
            "No items found following expression: \"dragon\""
        );
        assert!(d.execute(Action::GetPrice, F, "(", None).starts_with("Invalid expression \"(\""));
        assert!(!d.catalog().is_dirty());
    }

    #[test]
    fn plan_for_craftable_item_only() {
        let mut d = Dispatcher::new(catalog());
        let reply = d.execute(Action::GetPlan, F, " Elixir ", None);
        assert!(reply.starts_with("Type: Alchemy (Level 20), Item: Elixir, Manual:\nFirst you buy: "));
        assert!(reply.trim_end().ends_with(replies::PLAN_SEPARATOR));
        assert_eq!(d.execute(Action::GetPlan, F, "Herb", None), "Item not found: \"Herb\"");
    }

    #[test]
    fn plan_names_match_case_sensitively() {
        let mut d = Dispatcher::new(catalog());
        assert_eq!(d.execute(Action::GetPlan, F, "elixir", None), "Item not found: \"elixir\"");
        assert_eq!(d.execute(Action::GetPlan, F, "ELIXIR", None), "Item not found: \"ELIXIR\"");
        assert_eq!(d.execute(Action::GetPlan, F, "  ", None), "Item not found: \"\"");
    }

    #[test]
    fn unnamed_items_are_not_matched_by_id() {
        let mut c = catalog();
        c.items_mut(F).insert("152000002".into(), Item::new("152000002"));
        c.insert_recipe(F, Discipline::Alchemy, Recipe::new("R9", "152000002", 1).with_ingredient("B", 1));
        let mut d = Dispatcher::new(c);
        assert_eq!(
            d.execute(Action::SetPrice, F, "152000002", Some(5)),
            "Item (152000002) was not found."
        );
        assert!(!d.catalog().is_dirty());
        assert_eq!(
            d.execute(Action::GetPrice, F, "1520", None),
            "No items found following expression: \"1520\""
        );
        assert_eq!(d.execute(Action::GetPlan, F, "152000002", None), "Item not found: \"152000002\"");
    }

    #[test]
    fn snapshot_only_when_dirty_unless_forced() {
        let mut d = Dispatcher::new(catalog());
        assert!(d.snapshot(false).is_none());
        assert!(d.snapshot(true).is_some());
        d.execute(Action::SetPrice, F, "Water", Some(5));
        let bytes = d.snapshot(false).unwrap();
        assert!(!d.catalog().is_dirty());
        let restored = Catalog::load(&bytes).unwrap();
        assert_eq!(restored.item(F, "C").unwrap().price.value, 5);
    }

    #[tokio::test]
    async fn shutdown_closes_for_every_handle() {
        let (handle, task) = start_dispatcher(catalog(), 4);
        let other = handle.clone();
        assert_eq!(handle.shutdown().await.unwrap(), replies::SHUTDOWN_ACK);
        let catalog = task.await.unwrap();
        assert_eq!(catalog.items(F).len(), 4);
        assert_eq!(other.price(F, "Herb").await, Err(DispatchError::Closed));
        assert_eq!(other.state(), DispatcherState::Closed);
    }
}
