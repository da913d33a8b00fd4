//! Process-wide dispatcher counters.
//! Relaxed atomics, read through [`snapshot`] when the dispatcher closes.
use std::sync::atomic::{AtomicU64, Ordering};

static SET_PRICE_SERVED: AtomicU64 = AtomicU64::new(0);
static GET_PRICE_SERVED: AtomicU64 = AtomicU64::new(0);
static GET_PLAN_SERVED: AtomicU64 = AtomicU64::new(0);
static NOT_FOUND_REPLIES: AtomicU64 = AtomicU64::new(0);
static MALFORMED_REQUESTS: AtomicU64 = AtomicU64::new(0);
static SNAPSHOTS_TAKEN: AtomicU64 = AtomicU64::new(0);

pub fn inc_set_price() {
    SET_PRICE_SERVED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_get_price() {
    GET_PRICE_SERVED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_get_plan() {
    GET_PLAN_SERVED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_not_found() {
    NOT_FOUND_REPLIES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_malformed() {
    MALFORMED_REQUESTS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_snapshots() {
    SNAPSHOTS_TAKEN.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub set_price: u64,
    pub get_price: u64,
    pub get_plan: u64,
    pub not_found: u64,
    pub malformed: u64,
    pub snapshots: u64,
}

impl Snapshot {
    pub fn commands_served(&self) -> u64 {
        self.set_price + self.get_price + self.get_plan
    }
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        set_price: SET_PRICE_SERVED.load(Ordering::Relaxed),
        get_price: GET_PRICE_SERVED.load(Ordering::Relaxed),
        get_plan: GET_PLAN_SERVED.load(Ordering::Relaxed),
        not_found: NOT_FOUND_REPLIES.load(Ordering::Relaxed),
        malformed: MALFORMED_REQUESTS.load(Ordering::Relaxed),
        snapshots: SNAPSHOTS_TAKEN.load(Ordering::Relaxed),
    }
}
