//! Correlation of cluster events with pods

use k8s_openapi::api::core::v1::{Event, Pod};
use kube::ResourceExt;

use trellis_common::kube_utils::has_condition;

/// Event type marking a problem
pub const WARNING_EVENT_TYPE: &str = "Warning";

const POD_PHASE_SUCCEEDED: &str = "Succeeded";
const POD_CONDITION_READY: &str = "Ready";

/// Whether the pod is Ready or has run to completion
pub fn is_ready_or_succeeded(pod: &Pod) -> bool {
    let Some(status) = pod.status.as_ref() else {
        return false;
    };
    status.phase.as_deref() == Some(POD_PHASE_SUCCEEDED)
        || has_condition(status.conditions.as_deref(), POD_CONDITION_READY)
}

/// Warning events whose involved object is this exact pod instance.
///
/// Namespace, name and UID must all match, so events left behind by an
/// earlier pod with the same name are ignored. Input order is preserved.
pub fn warnings_for_pod(pod: &Pod, events: &[Event]) -> Vec<Event> {
    let namespace = pod.namespace();
    let name = pod.name_any();
    let uid = pod.uid();

    events
        .iter()
        .filter(|event| event.type_.as_deref() == Some(WARNING_EVENT_TYPE))
        .filter(|event| {
            let involved = &event.involved_object;
            involved.namespace == namespace
                && involved.name.as_deref() == Some(name.as_str())
                && involved.uid == uid
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{event, pod};
    use serde_json::json;

    #[test]
    fn matches_only_warnings_for_same_instance() {
        let p = pod(json!({}));
        let events = vec![
            event("e1", "Warning", "web-0", "uid-web-0"),
            event("e2", "Normal", "web-0", "uid-web-0"),
            event("e3", "Warning", "web-0", "uid-old"),
            event("e4", "Warning", "web-1", "uid-web-0"),
            event("e5", "Warning", "web-0", "uid-web-0"),
        ];

        let names: Vec<String> = warnings_for_pod(&p, &events)
            .iter()
            .map(|e| e.name_any())
            .collect();
        assert_eq!(names, vec!["e1", "e5"]);
    }

    #[test]
    fn ready_or_succeeded() {
        assert!(!is_ready_or_succeeded(&pod(json!({"phase": "Pending"}))));
        assert!(is_ready_or_succeeded(&pod(json!({"phase": "Succeeded"}))));
        assert!(is_ready_or_succeeded(&pod(json!({
            "phase": "Running",
            "conditions": [{"type": "Ready", "status": "True"}]
        }))));
        assert!(!is_ready_or_succeeded(&pod(json!({
            "phase": "Running",
            "conditions": [{"type": "Ready", "status": "False"}]
        }))));
    }
}
