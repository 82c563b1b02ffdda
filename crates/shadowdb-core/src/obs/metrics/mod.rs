use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for registration, writes, and rewrites.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub entities: BTreeMap<String, EntityCounters>,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            entities: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Registration
    pub indexes_created: u64,

    // Write path
    pub shadow_writes: u64,
    pub missing_values: u64,
    pub stale_denormalized: u64,

    // Read path
    pub filter_rewrites: u64,
    pub sub_queries: u64,
    pub sub_query_keys: u64,
    pub joins_released: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EntityCounters {
    pub indexes_created: u64,
    pub shadow_writes: u64,
    pub missing_values: u64,
    pub stale_denormalized: u64,
    pub filter_rewrites: u64,
    pub sub_queries: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: Option<EventState>,
    /// Per-entity counters, sorted by path.
    pub entity_counters: Vec<(String, EntityCounters)>,
}

/// Build a metrics report from in-memory counters only.
#[must_use]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);
    let entity_counters = snap
        .entities
        .iter()
        .map(|(path, counters)| (path.clone(), counters.clone()))
        .collect();

    EventReport {
        counters: Some(snap),
        entity_counters,
    }
}

#[cfg(test)]
mod tests {
    use crate::obs::{
        EventReport, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all,
        sink::record, with_metrics_sink,
    };
    use std::{cell::RefCell, rc::Rc};

    #[derive(Default)]
    struct CaptureSink {
        seen: RefCell<Vec<String>>,
    }

    impl MetricsSink for CaptureSink {
        fn record(&self, event: MetricsEvent<'_>) {
            self.seen.borrow_mut().push(format!("{event:?}"));
        }
    }

    #[test]
    fn global_sink_accumulates_per_entity_counters() {
        metrics_reset_all();
        record(MetricsEvent::FilterRewrite {
            entity: "blog::Post",
            field: "idxf_title_l_iexact",
        });
        record(MetricsEvent::SubQuery {
            entity: "blog::Author",
            keys: 3,
        });

        let report = metrics_report();
        let counters = report.counters.expect("counters present");
        assert_eq!(counters.ops.filter_rewrites, 1);
        assert_eq!(counters.ops.sub_query_keys, 3);
        assert_eq!(report.entity_counters.len(), 2, "one entry per entity");
    }

    #[test]
    fn override_sink_captures_and_restores() {
        metrics_reset_all();
        let capture = Rc::new(CaptureSink::default());

        with_metrics_sink(capture.clone(), || {
            record(MetricsEvent::IndexCreated {
                entity: "blog::Post",
                field: "idxf_title_l_iexact",
            });
        });
        record(MetricsEvent::IndexCreated {
            entity: "blog::Post",
            field: "idxf_title_l_iexact",
        });

        assert_eq!(capture.seen.borrow().len(), 1, "override saw only the scoped event");
        let counters = metrics_report().counters.expect("counters present");
        assert_eq!(counters.ops.indexes_created, 1, "global sink saw only the unscoped event");
    }

    #[test]
    fn report_serializes_to_json() {
        metrics_reset_all();
        record(MetricsEvent::ShadowWrite {
            entity: "blog::Post",
            field: "idxf_title_l_iexact",
            rows: 2,
        });

        let json = serde_json::to_string(&metrics_report()).expect("serialize report");
        let back: EventReport = serde_json::from_str(&json).expect("deserialize report");
        assert_eq!(back.entity_counters[0].1.shadow_writes, 2);
    }

    #[test]
    fn counters_are_scoped_to_the_recording_thread() {
        metrics_reset_all();

        std::thread::spawn(|| {
            record(MetricsEvent::SubQuery {
                entity: "blog::Author",
                keys: 5,
            });
            let counters = metrics_report().counters.expect("counters present");
            assert_eq!(counters.ops.sub_queries, 1);
        })
        .join()
        .expect("worker thread");

        let counters = metrics_report().counters.expect("counters present");
        assert_eq!(counters.ops.sub_queries, 0, "worker events stay on the worker");
    }
}
