//! Multi-phase timing.
//!
//! Some operations are a chain of dependent steps (build a payload, sign it,
//! submit it). Each step is timed on its own with the round-trip invoker and
//! the phases are reported in the order they ran. A phase hands its output
//! back to the caller, who passes it into the next phase, so phase N+1 can
//! never start before phase N has resolved.

use crate::{error::BenchError, timing::timed_with_timeout};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Latency of one named phase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseTiming {
    pub name: String,
    pub latency_ms: f64,
}

/// Ordered phase latencies of one multi-phase operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseReport {
    pub label: String,
    pub phases: Vec<PhaseTiming>,
    pub total_ms: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl PhaseReport {
    pub fn phase(&self, name: &str) -> Option<&PhaseTiming> {
        self.phases.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Records phases as they complete
pub struct PhaseTimer {
    label: String,
    timeout: Option<Duration>,
    phases: Vec<PhaseTiming>,
}

impl PhaseTimer {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            timeout: None,
            phases: Vec::new(),
        }
    }

    /// Bound every phase by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run and time one phase, returning its output.
    ///
    /// A failed phase is not recorded and its error is returned unchanged.
    pub async fn phase<F, T>(&mut self, name: &str, op: F) -> Result<T, BenchError>
    where
        F: Future<Output = Result<T, BenchError>>,
    {
        let result = timed_with_timeout(op, self.timeout).await?;
        debug!("{} / {}: {:.3} ms", self.label, name, result.latency_ms());

        self.phases.push(PhaseTiming {
            name: name.to_string(),
            latency_ms: result.latency_ms(),
        });
        Ok(result.response)
    }

    /// Phases completed so far
    pub fn completed(&self) -> &[PhaseTiming] {
        &self.phases
    }

    pub fn finish(self) -> PhaseReport {
        let total_ms = self.phases.iter().map(|p| p.latency_ms).sum();
        PhaseReport {
            label: self.label,
            phases: self.phases,
            total_ms,
            timestamp: chrono::Utc::now(),
        }
    }
}
