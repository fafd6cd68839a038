//! Job status derivation

use k8s_openapi::api::batch::v1::Job;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};

use trellis_common::kube_utils::has_condition;

use crate::pod::DerivedPhase;

const CONDITION_FAILED: &str = "Failed";
const CONDITION_COMPLETE: &str = "Complete";

/// Display-ready status of one job run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// Job name
    pub name: String,
    /// Creation time in epoch milliseconds, 0 if unknown
    pub creation_timestamp: i64,
    /// Same instant as `creation_timestamp`, under the key dashboards read
    #[serde(default)]
    pub create_timestamp: i64,
    /// Requested parallelism
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<i32>,
    /// Requested completions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<i32>,
    /// Pods currently running
    pub active: i32,
    /// Pods that succeeded
    pub succeeded: i32,
    /// Pods that failed
    pub failed: i32,
    /// Start time in epoch milliseconds, 0 if not started
    pub start_timestamp: i64,
    /// Completion time in epoch milliseconds, 0 if not complete
    pub completion_timestamp: i64,
    /// Derived phase
    pub phase: DerivedPhase,
}

/// Derive the display status of a job. Pure and total.
pub fn derive_job_status(job: &Job) -> JobStatus {
    let spec = job.spec.as_ref();
    let status = job.status.as_ref();
    let conditions = status.and_then(|s| s.conditions.as_deref());
    let active = status.and_then(|s| s.active).unwrap_or(0);
    let completion_time = status.and_then(|s| s.completion_time.as_ref());

    let phase = if has_condition(conditions, CONDITION_FAILED) {
        DerivedPhase::Failed
    } else if has_condition(conditions, CONDITION_COMPLETE) || completion_time.is_some() {
        DerivedPhase::Succeeded
    } else if active > 0 {
        DerivedPhase::Running
    } else {
        DerivedPhase::Pending
    };

    let created = job
        .metadata
        .creation_timestamp
        .as_ref()
        .map_or(0, |t| t.0.timestamp_millis());

    JobStatus {
        name: job.name_any(),
        creation_timestamp: created,
        create_timestamp: created,
        parallelism: spec.and_then(|s| s.parallelism),
        completions: spec.and_then(|s| s.completions),
        active,
        succeeded: status.and_then(|s| s.succeeded).unwrap_or(0),
        failed: status.and_then(|s| s.failed).unwrap_or(0),
        start_timestamp: status
            .and_then(|s| s.start_time.as_ref())
            .map_or(0, |t| t.0.timestamp_millis()),
        completion_timestamp: completion_time.map_or(0, |t| t.0.timestamp_millis()),
        phase,
    }
}
