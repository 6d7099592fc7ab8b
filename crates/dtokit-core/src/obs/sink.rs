//! Metrics sink boundary.
//!
//! Hydration and collection logic MUST NOT touch obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics;
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    HydrateFinish {
        record: &'static str,
        populated: u64,
        skipped: u64,
    },
    HydrateFailed {
        record: &'static str,
    },
    MemoHit {
        op: &'static str,
    },
    MemoMiss {
        op: &'static str,
    },
    ViewsInvalidated {
        entries: u64,
    },
    AttachRejected {
        expected: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default thread-local sink that writes into the metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::HydrateFinish {
                record,
                populated,
                skipped,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.hydrate_calls = m.ops.hydrate_calls.saturating_add(1);
                    m.ops.fields_populated = m.ops.fields_populated.saturating_add(populated);
                    m.ops.fields_skipped = m.ops.fields_skipped.saturating_add(skipped);

                    let entry = m.records.entry(record.to_string()).or_default();
                    entry.hydrated = entry.hydrated.saturating_add(1);
                    entry.fields_populated = entry.fields_populated.saturating_add(populated);
                    entry.fields_skipped = entry.fields_skipped.saturating_add(skipped);
                });
            }

            MetricsEvent::HydrateFailed { record } => {
                metrics::with_state_mut(|m| {
                    m.ops.hydrate_calls = m.ops.hydrate_calls.saturating_add(1);
                    m.ops.hydrate_failures = m.ops.hydrate_failures.saturating_add(1);

                    let entry = m.records.entry(record.to_string()).or_default();
                    entry.failed = entry.failed.saturating_add(1);
                });
            }

            MetricsEvent::MemoHit { op } => {
                metrics::with_state_mut(|m| {
                    m.ops.memo_hits = m.ops.memo_hits.saturating_add(1);
                    let entry = m.views.entry(op.to_string()).or_default();
                    entry.hits = entry.hits.saturating_add(1);
                });
            }

            MetricsEvent::MemoMiss { op } => {
                metrics::with_state_mut(|m| {
                    m.ops.memo_misses = m.ops.memo_misses.saturating_add(1);
                    let entry = m.views.entry(op.to_string()).or_default();
                    entry.misses = entry.misses.saturating_add(1);
                });
            }

            MetricsEvent::ViewsInvalidated { entries } => {
                metrics::with_state_mut(|m| {
                    m.ops.views_invalidated = m.ops.views_invalidated.saturating_add(entries);
                });
            }

            MetricsEvent::AttachRejected { expected } => {
                metrics::with_state_mut(|m| {
                    m.ops.attach_rejected = m.ops.attach_rejected.saturating_add(1);
                    let entry = m.records.entry(expected.to_string()).or_default();
                    entry.attach_rejected = entry.attach_rejected.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` was produced from a valid `&dyn MetricsSink` in `with_metrics_sink`.
        // - `with_metrics_sink` restores the previous pointer before returning,
        //   including unwind paths via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        // - Only a shared reference is materialized, matching the borrow used
        //   to install the override.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current thread's metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state for the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - `sink_ptr` is installed only for this dynamic scope.
    // - `Guard` restores the previous slot on all exits, including panic.
    // - `record` only dereferences synchronously and never persists `sink_ptr`.
    // Any async or deferred use of `sink_ptr` beyond this scope breaks this.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink_ptr));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
