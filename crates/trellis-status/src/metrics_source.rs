//! Resource usage histories attached to pod statuses

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use trellis_common::Result;

/// One sample of a time series
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Sample time in epoch milliseconds
    pub timestamp: i64,
    /// Sample value (cores for CPU, bytes for memory)
    pub value: f64,
}

/// CPU and memory usage over time
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricHistories {
    /// CPU usage samples, oldest first
    pub cpu: Vec<MetricPoint>,
    /// Memory usage samples, oldest first
    pub memory: Vec<MetricPoint>,
}

impl MetricHistories {
    /// Whether no samples are present
    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty() && self.memory.is_empty()
    }
}

/// Provider of per-pod usage histories.
///
/// Metrics are auxiliary: the collector serves empty histories when this
/// fails.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Usage histories for one pod
    async fn pod_metrics(&self, namespace: &str, pod: &str) -> Result<MetricHistories>;
}

/// Source used when no metrics backend is configured
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMetrics;

#[async_trait]
impl MetricsSource for NoMetrics {
    async fn pod_metrics(&self, _namespace: &str, _pod: &str) -> Result<MetricHistories> {
        Ok(MetricHistories::default())
    }
}
