//! Pod, event and job builders for tests

use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event, Pod};
use serde_json::{json, Value};

/// Pod `default/web-0` (uid `uid-web-0`) with the given status block
pub fn pod(status: Value) -> Pod {
    pod_with_spec(json!({"nodeName": "node-a", "containers": [{"name": "app"}]}), status)
}

/// Pod `default/web-0` with explicit spec and status blocks
pub fn pod_with_spec(spec: Value, status: Value) -> Pod {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": "web-0",
            "namespace": "default",
            "uid": "uid-web-0",
            "creationTimestamp": "2026-01-01T00:00:00Z",
            "labels": {"trellis.dev/component": "web"}
        },
        "spec": spec,
        "status": status
    }))
    .expect("valid pod fixture")
}

/// Event in `default` about pod `object` with `uid`
pub fn event(name: &str, type_: &str, object: &str, uid: &str) -> Event {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Event",
        "metadata": {"name": name, "namespace": "default"},
        "type": type_,
        "reason": "BackOff",
        "message": "Back-off restarting failed container",
        "involvedObject": {
            "kind": "Pod",
            "namespace": "default",
            "name": object,
            "uid": uid
        }
    }))
    .expect("valid event fixture")
}

/// Job `default/report-1` with the given spec and status blocks
pub fn job(mut spec: Value, status: Value) -> Job {
    if spec.get("template").is_none() {
        spec["template"] = json!({});
    }
    serde_json::from_value(json!({
        "apiVersion": "batch/v1",
        "kind": "Job",
        "metadata": {
            "name": "report-1",
            "namespace": "default",
            "creationTimestamp": "2026-01-01T00:00:00Z",
            "labels": {"trellis.dev/component": "report"}
        },
        "spec": spec,
        "status": status
    }))
    .expect("valid job fixture")
}

/// Container status entry
pub fn container(name: &str, restarts: i32, state: Value) -> Value {
    json!({
        "name": name,
        "image": "app:latest",
        "imageID": "",
        "ready": false,
        "restartCount": restarts,
        "state": state
    })
}
