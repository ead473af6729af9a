//! # Utility Functions and Helper Module
//!
//! Helpers shared by the benchmark, the report printer and the command-line
//! front end.
//!
//! ## Key Functionality Categories
//!
//! - **Formatting**: Latencies with fixed precision and SUI amounts
//! - **Validation**: Addresses, object ids and session parameters
//! - **Statistics**: Mean, extremes and standard deviation
//! - **System Information**: Host details recorded with results
//!
//! ## Usage Examples
//!
//! ```rust
//! use sui_latency_bench::utils::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! assert_eq!(format_latency_ms(12.34567), "12.346 ms");
//! assert_eq!(format_sui(1_500_000_000), "1.500000000 SUI");
//! validate_rounds(10)?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use uuid::Uuid;

/// Generate a unique identifier for a benchmark run
///
/// Creates a UUID v4 string recorded in the results file so that separate
/// runs against the same node can be told apart.
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Format a latency in milliseconds with three decimals
///
/// This is the precision used everywhere on the latency report.
///
/// ## Examples
///
/// ```rust
/// # use sui_latency_bench::utils::format_latency_ms;
/// assert_eq!(format_latency_ms(0.5), "0.500 ms");
/// assert_eq!(format_latency_ms(152.0), "152.000 ms");
/// ```
pub fn format_latency_ms(ms: f64) -> String {
    format!("{:.3} ms", ms)
}

/// Format a MIST amount as SUI (1 SUI = 10^9 MIST)
pub fn format_sui(mist: u128) -> String {
    format!("{}.{:09} SUI", mist / 1_000_000_000, mist % 1_000_000_000)
}

/// Calculate basic statistics for a set of values
///
/// ## Returns
/// Tuple of (mean, min, max, standard_deviation)
///
/// ## Empty Dataset Handling
///
/// If the input slice is empty, returns (0.0, 0.0, 0.0, 0.0). Callers that
/// must not report anything for an empty set check for it first.
///
/// ## Standard Deviation Calculation
///
/// Uses the population standard deviation formula:
/// σ = √(Σ(x - μ)² / N)
///
/// ## Examples
///
/// ```rust
/// # use sui_latency_bench::utils::calculate_stats;
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let (mean, min, max, std_dev) = calculate_stats(&values);
/// assert_eq!(mean, 3.0);
/// assert_eq!(min, 1.0);
/// assert_eq!(max, 5.0);
/// // std_dev ≈ 1.414
/// ```
pub fn calculate_stats(values: &[f64]) -> (f64, f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }

    let sum: f64 = values.iter().sum();
    let count = values.len() as f64;
    let mean = sum / count;

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count;
    let std_dev = variance.sqrt();

    (mean, min, max, std_dev)
}

/// Validate a Sui address or object id
///
/// Accepts `0x` followed by 1 to 64 hex digits. Short forms such as `0x2`
/// are valid; the node pads them.
///
/// ## Examples
///
/// ```rust
/// # use sui_latency_bench::utils::validate_address;
/// assert!(validate_address("0x2").is_ok());
/// assert!(validate_address("2").is_err());
/// ```
pub fn validate_address(address: &str) -> Result<()> {
    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| anyhow::anyhow!("Address '{}' must start with 0x", address))?;

    if hex.is_empty() || hex.len() > 64 {
        anyhow::bail!(
            "Address '{}' must have between 1 and 64 hex digits, got {}",
            address,
            hex.len()
        );
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("Address '{}' contains non-hex characters", address);
    }
    Ok(())
}

/// Validate the number of measured rounds
pub fn validate_rounds(rounds: usize) -> Result<()> {
    if rounds == 0 {
        anyhow::bail!("Rounds must be greater than 0");
    }
    if rounds > 1_000_000 {
        anyhow::bail!("Rounds {} is too large (max 1000000)", rounds);
    }
    Ok(())
}

/// Validate requested percentile levels
pub fn validate_percentiles(percentiles: &[f64]) -> Result<()> {
    for &p in percentiles {
        if !(0.0..=100.0).contains(&p) {
            anyhow::bail!("Percentile {} is outside 0..=100", p);
        }
    }
    Ok(())
}

/// Get the number of available CPU cores
pub fn get_cpu_cores() -> usize {
    num_cpus::get()
}
