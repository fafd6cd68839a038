//! Workload status derivation for the Trellis control plane
//!
//! Converts raw pod, job and event observations into one of four canonical
//! phases plus a display string. Derivation is pure and total; fetching the
//! inputs is the job of [`ComponentStatusCollector`].

#![deny(missing_docs)]

mod collector;
mod events;
mod job;
mod metrics_source;
mod pod;
mod workload;

pub use collector::{ComponentStatus, ComponentStatusCollector};
pub use events::{is_ready_or_succeeded, warnings_for_pod, WARNING_EVENT_TYPE};
pub use job::{derive_job_status, JobStatus};
pub use metrics_source::{MetricHistories, MetricPoint, MetricsSource, NoMetrics};
pub use pod::{derive_pod_status, ContainerSummary, DerivedPhase, PodStatus};
pub use workload::WorkloadKind;

#[cfg(test)]
pub(crate) mod test_fixtures;
