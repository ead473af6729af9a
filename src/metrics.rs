use crate::utils::calculate_stats;
use anyhow::Result;
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Aggregate statistics over the completed trials of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub count: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub std_dev_ms: f64,
    pub percentiles: Vec<PercentileValue>,
}

/// Percentile value pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value_ms: f64,
}

impl SessionStats {
    /// Look up a computed percentile, if it was requested
    pub fn percentile(&self, p: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|v| (v.percentile - p).abs() < 0.001)
            .map(|v| v.value_ms)
    }
}

/// Latency collector for one session.
///
/// Samples are kept in the order they were recorded; count, mean, min, max
/// and standard deviation are exact over those samples. Percentiles come from
/// an HDR histogram recorded in nanoseconds.
pub struct LatencyCollector {
    histogram: Histogram<u64>,
    samples_ms: Vec<f64>,
}

impl LatencyCollector {
    /// Create a new latency collector
    pub fn new() -> Result<Self> {
        // 3 significant figures, auto-resizing
        let histogram = Histogram::<u64>::new(3)?;

        Ok(Self {
            histogram,
            samples_ms: Vec::new(),
        })
    }

    /// Record a latency measurement
    pub fn record(&mut self, latency: Duration) -> Result<()> {
        let latency_ns = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.histogram.record(latency_ns)?;
        self.samples_ms.push(latency.as_secs_f64() * 1000.0);
        Ok(())
    }

    /// Recorded samples in recording order
    pub fn samples_ms(&self) -> &[f64] {
        &self.samples_ms
    }

    /// Compute statistics, or `None` when nothing was recorded
    pub fn stats(&self, percentiles: &[f64]) -> Option<SessionStats> {
        if self.samples_ms.is_empty() {
            return None;
        }

        let (mean, min, max, std_dev) = calculate_stats(&self.samples_ms);

        // Histogram values are bucket edges and may overshoot the exact extremes
        let percentiles = percentiles
            .iter()
            .map(|&p| PercentileValue {
                percentile: p,
                value_ms: (self.histogram.value_at_percentile(p) as f64 / 1_000_000.0)
                    .clamp(min, max),
            })
            .collect();

        Some(SessionStats {
            count: self.samples_ms.len(),
            // Summation rounding must not push the mean outside [min, max]
            mean_ms: mean.clamp(min, max),
            min_ms: min,
            max_ms: max,
            std_dev_ms: std_dev,
            percentiles,
        })
    }
}
