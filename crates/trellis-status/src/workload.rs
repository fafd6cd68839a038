//! Workload kinds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a component's pods are run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    /// Long-running replicated server
    #[default]
    Server,
    /// Scheduled run-to-completion job
    Cronjob,
    /// One pod per node
    DaemonSet,
    /// Ordered pods with stable identity
    StatefulSet,
}

impl WorkloadKind {
    /// Every kind
    pub const ALL: [WorkloadKind; 4] = [
        WorkloadKind::Server,
        WorkloadKind::Cronjob,
        WorkloadKind::DaemonSet,
        WorkloadKind::StatefulSet,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Server => "server",
            WorkloadKind::Cronjob => "cronjob",
            WorkloadKind::DaemonSet => "daemonset",
            WorkloadKind::StatefulSet => "statefulset",
        }
    }

    /// Pods of one-shot kinds are expected to exit, and own Jobs
    pub fn is_one_shot(&self) -> bool {
        matches!(self, WorkloadKind::Cronjob)
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkloadKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown workload kind '{}', expected one of: server, cronjob, daemonset, statefulset",
                    s
                )
            })
    }
}
