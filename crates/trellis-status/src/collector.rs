//! Concurrent collection of a component's status
//!
//! Pods, events and (for one-shot kinds) jobs are listed concurrently with
//! `tokio::join!`. Pods and jobs are primary: their errors propagate. Events
//! and per-pod metrics are auxiliary: a failure is logged, counted, and served
//! as empty so the rest of the status is still returned.

use std::sync::Arc;

use futures::future::join_all;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Event, Pod};
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use trellis_common::metrics::{record_degraded_fetch, record_pod_status};
use trellis_common::store::{LabelSelector, ObjectStore};
use trellis_common::{Result, COMPONENT_LABEL};

use crate::job::{derive_job_status, JobStatus};
use crate::metrics_source::{MetricHistories, MetricsSource};
use crate::pod::{derive_pod_status, PodStatus};
use crate::workload::WorkloadKind;

/// Status of every pod and job belonging to a component
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    /// Component name
    pub name: String,
    /// Namespace the component runs in
    pub namespace: String,
    /// Workload kind used for derivation
    pub kind: WorkloadKind,
    /// Pod statuses, ordered by pod name
    pub pods: Vec<PodStatus>,
    /// Job statuses, ordered by job name; empty for long-running kinds
    pub jobs: Vec<JobStatus>,
}

/// Fetches a component's inputs and derives their statuses
#[derive(Clone)]
pub struct ComponentStatusCollector {
    pods: Arc<dyn ObjectStore<Pod>>,
    events: Arc<dyn ObjectStore<Event>>,
    jobs: Arc<dyn ObjectStore<Job>>,
    metrics: Arc<dyn MetricsSource>,
}

impl ComponentStatusCollector {
    /// Create a collector over the given stores and metrics source
    pub fn new(
        pods: Arc<dyn ObjectStore<Pod>>,
        events: Arc<dyn ObjectStore<Event>>,
        jobs: Arc<dyn ObjectStore<Job>>,
        metrics: Arc<dyn MetricsSource>,
    ) -> Self {
        Self {
            pods,
            events,
            jobs,
            metrics,
        }
    }

    /// Collect the status of `component` in `namespace`
    #[instrument(skip(self), fields(otel.kind = "internal"))]
    pub async fn collect(
        &self,
        namespace: &str,
        component: &str,
        kind: WorkloadKind,
    ) -> Result<ComponentStatus> {
        let selector = LabelSelector::new().with(COMPONENT_LABEL, component);
        let all = LabelSelector::new();

        let (pods, events, jobs) = tokio::join!(
            self.pods.list(Some(namespace), &selector),
            self.events.list(Some(namespace), &all),
            self.list_jobs(namespace, &selector, kind),
        );
        let pods = pods?;
        let jobs = jobs?;
        let events = events.unwrap_or_else(|e| {
            warn!(namespace, error = %e, "failed to list events, continuing without warnings");
            record_degraded_fetch("events");
            Vec::new()
        });

        let histories = join_all(
            pods.iter()
                .map(|pod| self.pod_metrics(namespace, pod.name_any())),
        )
        .await;

        let pods: Vec<PodStatus> = pods
            .iter()
            .zip(histories)
            .map(|(pod, metrics)| {
                let mut status = derive_pod_status(pod, &events, kind);
                status.metrics = metrics;
                record_pod_status(status.status.as_str());
                status
            })
            .collect();
        let jobs: Vec<JobStatus> = jobs.iter().map(derive_job_status).collect();

        debug!(pods = pods.len(), jobs = jobs.len(), "collected component status");

        Ok(ComponentStatus {
            name: component.to_string(),
            namespace: namespace.to_string(),
            kind,
            pods,
            jobs,
        })
    }

    async fn list_jobs(
        &self,
        namespace: &str,
        selector: &LabelSelector,
        kind: WorkloadKind,
    ) -> Result<Vec<Job>> {
        if !kind.is_one_shot() {
            return Ok(Vec::new());
        }
        self.jobs.list(Some(namespace), selector).await
    }

    async fn pod_metrics(&self, namespace: &str, pod: String) -> MetricHistories {
        match self.metrics.pod_metrics(namespace, &pod).await {
            Ok(histories) => histories,
            Err(e) => {
                warn!(namespace, pod = %pod, error = %e, "failed to fetch pod metrics");
                record_degraded_fetch("metrics");
                MetricHistories::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::predicate::eq;
    use serde_json::json;
    use trellis_common::memory::MemoryStore;
    use trellis_common::Error;

    use crate::metrics_source::{MetricPoint, MockMetricsSource, NoMetrics};
    use crate::pod::DerivedPhase;
    use crate::test_fixtures::{event, job, pod};

    /// Store whose every call fails
    struct Unavailable;

    #[async_trait]
    impl<K: Clone + Send + Sync + 'static> ObjectStore<K> for Unavailable {
        async fn get(&self, _: Option<&str>, name: &str) -> Result<K> {
            Err(Error::not_found("object", name))
        }
        async fn list(&self, _: Option<&str>, _: &LabelSelector) -> Result<Vec<K>> {
            Err(Error::internal("store unavailable"))
        }
        async fn create(&self, _: &K) -> Result<K> {
            Err(Error::internal("store unavailable"))
        }
        async fn update(&self, _: &K) -> Result<K> {
            Err(Error::internal("store unavailable"))
        }
        async fn update_status(&self, _: &K) -> Result<K> {
            Err(Error::internal("store unavailable"))
        }
        async fn delete(&self, _: Option<&str>, _: &str) -> Result<()> {
            Err(Error::internal("store unavailable"))
        }
    }

    fn pending_pod() -> Pod {
        pod(json!({"phase": "Pending"}))
    }

    fn collector(
        pods: Arc<dyn ObjectStore<Pod>>,
        events: Arc<dyn ObjectStore<Event>>,
        jobs: Arc<dyn ObjectStore<Job>>,
        metrics: Arc<dyn MetricsSource>,
    ) -> ComponentStatusCollector {
        ComponentStatusCollector::new(pods, events, jobs, metrics)
    }

    #[tokio::test]
    async fn correlates_events_and_attaches_metrics() {
        let mut metrics = MockMetricsSource::new();
        metrics
            .expect_pod_metrics()
            .with(eq("default"), eq("web-0"))
            .times(1)
            .returning(|_, _| {
                Ok(MetricHistories {
                    cpu: vec![MetricPoint {
                        timestamp: 1,
                        value: 0.25,
                    }],
                    memory: Vec::new(),
                })
            });

        let c = collector(
            Arc::new(MemoryStore::with_objects(vec![pending_pod()])),
            Arc::new(MemoryStore::with_objects(vec![event(
                "e1",
                "Warning",
                "web-0",
                "uid-web-0",
            )])),
            Arc::new(MemoryStore::<Job>::new()),
            Arc::new(metrics),
        );

        let status = c.collect("default", "web", WorkloadKind::Server).await.unwrap();
        assert_eq!(status.pods.len(), 1);
        assert_eq!(status.pods[0].status, DerivedPhase::Failed);
        assert_eq!(status.pods[0].metrics.cpu.len(), 1);
        assert!(status.jobs.is_empty());
    }

    #[tokio::test]
    async fn event_failure_degrades_to_no_warnings() {
        let c = collector(
            Arc::new(MemoryStore::with_objects(vec![pending_pod()])),
            Arc::new(Unavailable),
            Arc::new(MemoryStore::<Job>::new()),
            Arc::new(NoMetrics),
        );

        let status = c.collect("default", "web", WorkloadKind::Server).await.unwrap();
        assert_eq!(status.pods[0].status, DerivedPhase::Pending);
        assert!(status.pods[0].warnings.is_empty());
    }

    #[tokio::test]
    async fn metrics_failure_degrades_to_empty() {
        let mut metrics = MockMetricsSource::new();
        metrics
            .expect_pod_metrics()
            .returning(|_, _| Err(Error::internal("metrics backend down")));

        let c = collector(
            Arc::new(MemoryStore::with_objects(vec![pending_pod()])),
            Arc::new(MemoryStore::<Event>::new()),
            Arc::new(MemoryStore::<Job>::new()),
            Arc::new(metrics),
        );

        let status = c.collect("default", "web", WorkloadKind::Server).await.unwrap();
        assert!(status.pods[0].metrics.is_empty());
    }

    #[tokio::test]
    async fn pod_failure_propagates() {
        let c = collector(
            Arc::new(Unavailable),
            Arc::new(MemoryStore::<Event>::new()),
            Arc::new(MemoryStore::<Job>::new()),
            Arc::new(NoMetrics),
        );

        assert!(c.collect("default", "web", WorkloadKind::Server).await.is_err());
    }

    #[tokio::test]
    async fn jobs_only_fetched_for_one_shot_kinds() {
        let report_job = job(json!({}), json!({"active": 1}));

        // a failing job store is never consulted for servers
        let server = collector(
            Arc::new(MemoryStore::<Pod>::new()),
            Arc::new(MemoryStore::<Event>::new()),
            Arc::new(Unavailable),
            Arc::new(NoMetrics),
        );
        assert!(server
            .collect("default", "report", WorkloadKind::Server)
            .await
            .is_ok());

        let cron = collector(
            Arc::new(MemoryStore::<Pod>::new()),
            Arc::new(MemoryStore::<Event>::new()),
            Arc::new(MemoryStore::with_objects(vec![report_job])),
            Arc::new(NoMetrics),
        );
        let status = cron
            .collect("default", "report", WorkloadKind::Cronjob)
            .await
            .unwrap();
        assert_eq!(status.jobs.len(), 1);
        assert_eq!(status.jobs[0].phase, DerivedPhase::Running);

        let failing = collector(
            Arc::new(MemoryStore::<Pod>::new()),
            Arc::new(MemoryStore::<Event>::new()),
            Arc::new(Unavailable),
            Arc::new(NoMetrics),
        );
        assert!(failing
            .collect("default", "report", WorkloadKind::Cronjob)
            .await
            .is_err());
    }
}
