//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Engine code never touches counters directly; every event flows through
//! [`MetricsEvent`] and the active [`MetricsSink`].
//!
//! The default sink and sink overrides are thread-local: counters reflect
//! only the events of the thread that reads them. Multi-threaded hosts
//! report from each worker thread, or install a sink that forwards into
//! shared state.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EntityCounters, EventOps, EventReport, EventState};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
