//! Metrics sink boundary.
//!
//! This module is the only bridge between rewrite/write logic and the
//! thread-local metrics state.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    /// A shadow field was added to a record type's schema.
    IndexCreated { entity: &'a str, field: &'a str },

    /// Shadow values were injected into a write set.
    ShadowWrite {
        entity: &'a str,
        field: &'a str,
        rows: u64,
    },

    /// An update omitted the raw value; the shadow was left untouched.
    MissingValueSkipped { entity: &'a str, field: &'a str },

    /// A filter leaf was retargeted onto a shadow field.
    FilterRewrite { entity: &'a str, field: &'a str },

    /// An in-memory join issued a key-collecting sub-query.
    SubQuery { entity: &'a str, keys: u64 },

    /// Join aliases dropped because no constraint reads through them anymore.
    JoinReleased { entity: &'a str, joins: u64 },

    /// A write touched a record type that denormalized shadows were copied from.
    DenormalizedStale {
        entity: &'a str,
        dependent: &'a str,
        field: &'a str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// GlobalMetricsSink
///
/// Default sink writing into thread-local metrics state.
///

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::IndexCreated { entity, .. } => {
                m.ops.indexes_created = m.ops.indexes_created.saturating_add(1);
                let entry = m.entities.entry(entity.to_string()).or_default();
                entry.indexes_created = entry.indexes_created.saturating_add(1);
            }

            MetricsEvent::ShadowWrite { entity, rows, .. } => {
                m.ops.shadow_writes = m.ops.shadow_writes.saturating_add(rows);
                let entry = m.entities.entry(entity.to_string()).or_default();
                entry.shadow_writes = entry.shadow_writes.saturating_add(rows);
            }

            MetricsEvent::MissingValueSkipped { entity, .. } => {
                m.ops.missing_values = m.ops.missing_values.saturating_add(1);
                let entry = m.entities.entry(entity.to_string()).or_default();
                entry.missing_values = entry.missing_values.saturating_add(1);
            }

            MetricsEvent::FilterRewrite { entity, .. } => {
                m.ops.filter_rewrites = m.ops.filter_rewrites.saturating_add(1);
                let entry = m.entities.entry(entity.to_string()).or_default();
                entry.filter_rewrites = entry.filter_rewrites.saturating_add(1);
            }

            MetricsEvent::SubQuery { entity, keys } => {
                m.ops.sub_queries = m.ops.sub_queries.saturating_add(1);
                m.ops.sub_query_keys = m.ops.sub_query_keys.saturating_add(keys);
                let entry = m.entities.entry(entity.to_string()).or_default();
                entry.sub_queries = entry.sub_queries.saturating_add(1);
            }

            MetricsEvent::JoinReleased { joins, .. } => {
                m.ops.joins_released = m.ops.joins_released.saturating_add(joins);
            }

            MetricsEvent::DenormalizedStale { dependent, .. } => {
                m.ops.stale_denormalized = m.ops.stale_denormalized.saturating_add(1);
                let entry = m.entities.entry(dependent.to_string()).or_default();
                entry.stale_denormalized = entry.stale_denormalized.saturating_add(1);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match override_sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the calling thread's metrics state for report/test plumbing.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on this thread.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = previous;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}
