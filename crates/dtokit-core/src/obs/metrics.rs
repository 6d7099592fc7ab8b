use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for hydration and view operations.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub records: BTreeMap<String, RecordCounters>,
    pub views: BTreeMap<String, ViewCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Hydration
    pub hydrate_calls: u64,
    pub hydrate_failures: u64,
    pub fields_populated: u64,
    pub fields_skipped: u64,

    // Memoized views
    pub memo_hits: u64,
    pub memo_misses: u64,
    pub views_invalidated: u64,

    // Collections
    pub attach_rejected: u64,
}

///
/// RecordCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RecordCounters {
    pub hydrated: u64,
    pub failed: u64,
    pub fields_populated: u64,
    pub fields_skipped: u64,
    pub attach_rejected: u64,
}

///
/// ViewCounters
/// Per memoized operation (e.g. `index_by`).
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ViewCounters {
    pub hits: u64,
    pub misses: u64,
}

///
/// EventReport
/// Snapshot handed to callers; detached from the live state.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub counters: EventState,
}

thread_local! {
    static STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    STATE.with(|cell| f(&cell.borrow()))
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    STATE.with(|cell| f(&mut cell.borrow_mut()))
}

pub(crate) fn report() -> EventReport {
    with_state(|state| EventReport {
        counters: state.clone(),
    })
}

pub(crate) fn reset_all() {
    with_state_mut(|state| *state = EventState::default());
}
