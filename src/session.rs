//! # Session Aggregation
//!
//! A session runs the same bound operation N times, strictly one after the
//! other, and aggregates the latencies of the trials that completed.
//!
//! ## Failure policy
//!
//! What happens when a trial fails is an explicit choice made by the caller:
//!
//! - [`FailurePolicy::Abort`] (default): the session stops at the first
//!   failed trial. The report keeps the failure in `aborted` and the
//!   statistics of the trials completed before it. Callers must not present
//!   these as a summary; the command-line tool prints the error instead.
//! - [`FailurePolicy::Skip`]: the failure is recorded, the session carries on
//!   and the statistics cover every successful trial.
//!
//! Warmup trials follow the same policy but are never recorded.

use crate::{
    error::BenchError,
    metrics::{LatencyCollector, SessionStats},
    timing::timed_with_timeout,
};
use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// What a session does when a trial fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop the session at the first failure
    #[default]
    #[clap(name = "abort")]
    Abort,

    /// Record the failure and continue with the next trial
    #[clap(name = "skip")]
    Skip,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Skip => write!(f, "skip"),
        }
    }
}

/// Parameters of one session
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub rounds: usize,
    pub warmup: usize,
    pub failure_policy: FailurePolicy,
    pub trial_timeout: Option<Duration>,
    pub percentiles: Vec<f64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rounds: crate::defaults::ROUNDS,
            warmup: 0,
            failure_policy: FailurePolicy::default(),
            trial_timeout: None,
            percentiles: crate::defaults::PERCENTILES.to_vec(),
        }
    }
}

/// Outcome of a single trial
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrialOutcome {
    /// The call resolved; `extracted` is the field the caller pulled out of
    /// the response, `None` when the response did not contain it
    Success { extracted: Option<String> },
    Failure { error: String },
}

/// One finalized trial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRecord {
    pub index: usize,
    /// Only set for successful trials
    pub latency_ms: Option<f64>,
    pub outcome: TrialOutcome,
}

impl TrialRecord {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TrialOutcome::Success { .. })
    }
}

/// Everything a finished session knows about its trials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub label: String,
    pub failure_policy: FailurePolicy,
    pub requested_rounds: usize,
    pub trials: Vec<TrialRecord>,
    pub stats: Option<SessionStats>,
    pub failures: usize,
    pub aborted: Option<TrialRecord>,
    /// `aborted` refers to a warmup trial, indexed within the warmup
    #[serde(default)]
    pub aborted_in_warmup: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl SessionReport {
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Statistics that may be presented as a summary.
    ///
    /// Aborted sessions have none.
    pub fn summary(&self) -> Option<&SessionStats> {
        if self.is_aborted() {
            None
        } else {
            self.stats.as_ref()
        }
    }
}

/// Sequential trial runner
pub struct Session {
    label: String,
    config: SessionConfig,
}

impl Session {
    pub fn new(label: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            label: label.into(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run the session.
    ///
    /// `op` produces a fresh future for every trial. `extract` pulls the
    /// reported field out of a successful response. `on_trial` sees every
    /// recorded trial as soon as it is finalized.
    pub async fn run<F, Fut, T, X, C>(
        &self,
        mut op: F,
        extract: X,
        mut on_trial: C,
    ) -> Result<SessionReport>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BenchError>>,
        X: Fn(&T) -> Option<String>,
        C: FnMut(&TrialRecord) -> Result<()>,
    {
        let mut collector = LatencyCollector::new()?;
        let mut report = SessionReport {
            label: self.label.clone(),
            failure_policy: self.config.failure_policy,
            requested_rounds: self.config.rounds,
            trials: Vec::with_capacity(self.config.rounds),
            stats: None,
            failures: 0,
            aborted: None,
            aborted_in_warmup: false,
            timestamp: chrono::Utc::now(),
        };

        for i in 0..self.config.warmup {
            if let Err(e) = timed_with_timeout(op(), self.config.trial_timeout).await {
                warn!("Warmup trial {} failed: {}", i, e);
                if self.config.failure_policy == FailurePolicy::Abort {
                    report.aborted = Some(TrialRecord {
                        index: i,
                        latency_ms: None,
                        outcome: TrialOutcome::Failure {
                            error: e.to_string(),
                        },
                    });
                    report.aborted_in_warmup = true;
                    return Ok(report);
                }
            }
        }

        for index in 0..self.config.rounds {
            let record = match timed_with_timeout(op(), self.config.trial_timeout).await {
                Ok(result) => {
                    collector.record(result.latency)?;
                    TrialRecord {
                        index,
                        latency_ms: Some(result.latency_ms()),
                        outcome: TrialOutcome::Success {
                            extracted: extract(&result.response),
                        },
                    }
                }
                Err(e) => {
                    warn!("Trial {} of '{}' failed: {}", index, self.label, e);
                    report.failures += 1;
                    TrialRecord {
                        index,
                        latency_ms: None,
                        outcome: TrialOutcome::Failure {
                            error: e.to_string(),
                        },
                    }
                }
            };

            on_trial(&record)?;
            let failed = !record.is_success();
            report.trials.push(record);

            if failed && self.config.failure_policy == FailurePolicy::Abort {
                report.aborted = report.trials.last().cloned();
                break;
            }
        }

        report.stats = collector.stats(&self.config.percentiles);
        debug!(
            "Session '{}' finished: {} trials, {} failures",
            self.label,
            report.trials.len(),
            report.failures
        );
        Ok(report)
    }
}
