//! # Sui Latency Bench Library
//!
//! Client-side latency measurement for Sui fullnodes. The library issues
//! fixed requests against a node (read an object's state, list gas coins,
//! query balances, build, sign and submit a transaction) and measures the
//! wall-clock round-trip latency of each call.
//!
//! ## Architecture Overview
//!
//! The library is organized into several key modules:
//!
//! - `timing`: The round-trip invoker, one monotonic reading on each side of one awaited call
//! - `session`: Repeated trials under an explicit failure policy, aggregated into statistics
//! - `phases`: Ordered, individually timed phases of one multi-step operation
//! - `rpc`: The `FullnodeClient` abstraction with JSON-RPC and gRPC implementations
//! - `tx`: Transaction payload sources, signing and the submit pipeline
//! - `report`: The human-readable latency report written to stdout
//! - `results`: JSON results files and per-trial streaming
//! - `cli`: Command-line interface parsing and configuration management
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use sui_latency_bench::{
//!     rpc::{FullnodeClient, JsonRpcClient, ReadMask},
//!     session::{Session, SessionConfig},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = JsonRpcClient::new(
//!         sui_latency_bench::defaults::RPC_URL,
//!         None,
//!         sui_latency_bench::defaults::CONNECT_TIMEOUT,
//!     )?;
//!     let mask = ReadMask::new(["json.sqrt_price"]);
//!
//!     let session = Session::new("read", SessionConfig::default());
//!     let report = session
//!         .run(
//!             || client.get_object(sui_latency_bench::defaults::OBJECT_ID, &mask),
//!             |state| state.field("sqrt_price"),
//!             |_| Ok(()),
//!         )
//!         .await?;
//!
//!     if let Some(stats) = report.summary() {
//!         println!("Avg latency: {:.3} ms", stats.mean_ms);
//!     }
//!     Ok(())
//! }
//! ```

/// Command-line interface and configuration
///
/// Argument parsing using clap derive with one subcommand per measured
/// operation. Includes duration parsing with human-readable formats
/// (e.g., "500ms", "2s").
pub mod cli;

/// Error taxonomy shared by every call the benchmark makes
pub mod error;

/// Colorized log formatting and subscriber setup
pub mod logging;

/// Latency aggregation using HDR histograms and exact sample statistics
pub mod metrics;

pub mod phases;

/// Human-readable latency report
pub mod report;

/// Result collection and output file management
///
/// - Structured JSON output with run metadata
/// - Real-time streaming of trials during execution
/// - System information collection for reproducibility
pub mod results;

/// Fullnode client abstraction and JSON-RPC transport
pub mod rpc;

pub mod session;

pub mod timing;

/// Transaction payloads, signing and the submit pipeline
pub mod tx;

pub mod utils;

pub use error::BenchError;
pub use phases::{PhaseReport, PhaseTimer};
pub use results::ResultsManager;
pub use rpc::{FullnodeClient, GrpcClient, JsonRpcClient, ReadMask};
pub use session::{FailurePolicy, Session, SessionConfig, SessionReport};
pub use timing::{timed, Timed};

/// The current version of the benchmark
///
/// Populated from Cargo.toml and recorded in results files.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    /// Public mainnet fullnode, serving both JSON-RPC and gRPC
    pub const RPC_URL: &str = "https://fullnode.mainnet.sui.io:443";

    /// Object read when none is given: a mainnet CLMM pool
    pub const OBJECT_ID: &str =
        "0x6e35c9f02f1cebb018f8c2b9f157dea6cf5d03bcc63f1addf4c2609be8c29212";

    /// Content field reported per read
    pub const FIELD: &str = "sqrt_price";

    /// Default number of measured rounds
    pub const ROUNDS: usize = 10;

    /// Default warmup rounds
    ///
    /// None: the first read includes connection setup, and that cost is part
    /// of what a client sees.
    pub const WARMUP_ROUNDS: usize = 0;

    /// Percentiles reported in the summary
    pub const PERCENTILES: &[f64] = &[50.0, 95.0, 99.0];

    /// Gas budget for node-built transactions, in MIST
    pub const GAS_BUDGET: u64 = 10_000_000;

    /// Connect timeout of the fullnode client
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}
