use crate::{
    phases::PhaseTiming,
    rpc::Balance,
    session::{SessionReport, TrialRecord},
    tx::SubmitOutcome,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One measured command, as stored in the results file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunRecord {
    /// Repeated object reads
    Read {
        rpc_url: String,
        object_id: String,
        field: String,
        session: SessionReport,
    },
    /// One build, sign and submit run
    Submit { rpc_url: String, outcome: SubmitOutcome },
    /// A submit run that failed part way, with the phases that completed
    SubmitFailed {
        rpc_url: String,
        failed_phase: String,
        error: String,
        completed: Vec<PhaseTiming>,
    },
    /// One balances query
    Balances {
        rpc_url: String,
        owner: String,
        latency_ms: f64,
        balances: Vec<Balance>,
    },
}

/// System information for reproducibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub architecture: String,
    pub cpu_cores: usize,
    pub rust_version: String,
    pub benchmark_version: String,
}

/// Results file metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct RunMetadata {
    pub version: String,
    pub run_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub total_records: usize,
    pub system_info: SystemInfo,
}

/// Results file document
#[derive(Debug, Serialize, Deserialize)]
pub struct FinalResults {
    pub metadata: RunMetadata,
    pub records: Vec<RunRecord>,
}

/// A trial as written to the streaming file
#[derive(Debug, Serialize)]
pub struct StreamedTrial<'a> {
    pub run_id: &'a str,
    pub label: &'a str,
    #[serde(flatten)]
    pub trial: &'a TrialRecord,
}

/// Results manager for the output file and per-trial streaming
pub struct ResultsManager {
    run_id: String,
    output_file: Option<PathBuf>,
    streaming_file: Option<PathBuf>,
    streamed: usize,
    records: Vec<RunRecord>,
}

impl ResultsManager {
    /// Create a new results manager. Without an output file the records are
    /// only kept in memory.
    pub fn new(output_file: Option<&Path>) -> Self {
        Self {
            run_id: crate::utils::generate_run_id(),
            output_file: output_file.map(Path::to_path_buf),
            streaming_file: None,
            streamed: 0,
            records: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Enable streaming trials to a file as a JSON array
    pub fn enable_streaming<P: AsRef<Path>>(&mut self, streaming_file: P) -> Result<()> {
        let path = streaming_file.as_ref().to_path_buf();

        // Create/truncate the streaming file
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Failed to create streaming file {}", path.display()))?;

        writeln!(file, "[")?;

        debug!("Enabled streaming to: {:?}", path);
        self.streaming_file = Some(path);
        Ok(())
    }

    /// Append one finalized trial to the streaming file, if enabled
    pub fn stream_trial(&mut self, label: &str, trial: &TrialRecord) -> Result<()> {
        let Some(ref streaming_file) = self.streaming_file else {
            return Ok(());
        };

        let mut file = OpenOptions::new().append(true).open(streaming_file)?;

        // Add comma if not first trial
        if self.streamed > 0 {
            writeln!(file, ",")?;
        }

        let entry = StreamedTrial {
            run_id: &self.run_id,
            label,
            trial,
        };
        write!(file, "{}", serde_json::to_string(&entry)?)?;
        file.flush()?;

        self.streamed += 1;
        Ok(())
    }

    /// Add a finished command's record
    pub fn add_record(&mut self, record: RunRecord) {
        self.records.push(record);
    }

    /// Close the streaming file and write the output file
    pub fn finalize(&mut self) -> Result<()> {
        if let Some(ref streaming_file) = self.streaming_file {
            let mut file = OpenOptions::new().append(true).open(streaming_file)?;
            writeln!(file, "\n]")?;
            file.flush()?;
            debug!("Closed streaming file after {} trials", self.streamed);
        }

        if let Some(ref output_file) = self.output_file {
            self.write_final_results(output_file)
                .with_context(|| format!("Failed to write results to {}", output_file.display()))?;
            info!("Results written to: {:?}", output_file);
        }
        Ok(())
    }

    fn write_final_results(&self, output_file: &Path) -> Result<()> {
        let final_results = FinalResults {
            metadata: RunMetadata {
                version: crate::VERSION.to_string(),
                run_id: self.run_id.clone(),
                timestamp: chrono::Utc::now(),
                total_records: self.records.len(),
                system_info: Self::get_system_info(),
            },
            records: self.records.clone(),
        };

        let json = serde_json::to_string_pretty(&final_results)?;
        std::fs::write(output_file, json)?;
        Ok(())
    }

    /// Get system information
    pub fn get_system_info() -> SystemInfo {
        SystemInfo {
            os: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            cpu_cores: crate::utils::get_cpu_cores(),
            rust_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
            benchmark_version: crate::VERSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{FailurePolicy, TrialOutcome};
    use tempfile::tempdir;

    fn trial(index: usize) -> TrialRecord {
        TrialRecord {
            index,
            latency_ms: Some(1.5),
            outcome: TrialOutcome::Success {
                extracted: Some("42".into()),
            },
        }
    }

    #[test]
    fn test_streaming_file_is_a_json_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trials.json");

        let mut manager = ResultsManager::new(None);
        manager.enable_streaming(&path).unwrap();
        manager.stream_trial("read", &trial(0)).unwrap();
        manager.stream_trial("read", &trial(1)).unwrap();
        manager.finalize().unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entries = parsed.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["index"], 1);
        assert_eq!(entries[1]["outcome"]["status"], "success");
        assert_eq!(entries[0]["run_id"], manager.run_id());
    }

    #[test]
    fn test_empty_streaming_file_is_valid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trials.json");

        let mut manager = ResultsManager::new(None);
        manager.enable_streaming(&path).unwrap();
        manager.finalize().unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed.as_array().unwrap().is_empty());
    }

    #[test]
    fn test_output_file_contains_metadata_and_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");

        let mut manager = ResultsManager::new(Some(&path));
        manager.add_record(RunRecord::Read {
            rpc_url: "http://localhost:9000".into(),
            object_id: "0x6".into(),
            field: "sqrt_price".into(),
            session: SessionReport {
                label: "read".into(),
                failure_policy: FailurePolicy::Skip,
                requested_rounds: 1,
                trials: vec![trial(0)],
                stats: None,
                failures: 0,
                aborted: None,
                aborted_in_warmup: false,
                timestamp: chrono::Utc::now(),
            },
        });
        manager.finalize().unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["metadata"]["version"], crate::VERSION);
        assert_eq!(parsed["metadata"]["total_records"], 1);
        assert_eq!(parsed["metadata"]["run_id"], manager.run_id());
        assert_eq!(parsed["records"][0]["kind"], "read");
        assert_eq!(parsed["records"][0]["session"]["failure_policy"], "Skip");
    }

    #[test]
    fn test_no_output_file_writes_nothing() {
        let mut manager = ResultsManager::new(None);
        manager.add_record(RunRecord::Balances {
            rpc_url: "http://localhost:9000".into(),
            owner: "0x1".into(),
            latency_ms: 1.0,
            balances: vec![],
        });
        manager.finalize().unwrap();
        assert_eq!(manager.records().len(), 1);
    }
}
