use crate::session::{FailurePolicy, SessionConfig};
use clap::{ArgGroup, Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Protocol used to talk to the fullnode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// JSON-RPC over HTTP; supports every command
    #[default]
    #[clap(name = "json-rpc")]
    JsonRpc,

    /// sui.rpc.v2 gRPC; object reads only
    #[clap(name = "grpc")]
    Grpc,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::JsonRpc => write!(f, "json-rpc"),
            Transport::Grpc => write!(f, "grpc"),
        }
    }
}

/// Sui Latency Bench - measures round-trip latency of Sui fullnode calls
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Fullnode endpoint
    #[clap(long, env = "SUI_RPC_URL", default_value = crate::defaults::RPC_URL, global = true)]
    pub rpc_url: String,

    /// Protocol used to reach the fullnode
    #[clap(long, value_enum, default_value_t = Transport::JsonRpc, global = true)]
    pub transport: Transport,

    /// API key sent as the x-api-key header
    #[clap(long, env = "SUI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Per-call timeout (e.g. "500ms", "2s"); no timeout when omitted
    #[clap(long, value_parser = parse_duration, global = true)]
    pub timeout: Option<Duration>,

    /// Connection timeout of the fullnode client
    #[clap(long, value_parser = parse_duration, default_value = "10s", global = true)]
    pub connect_timeout: Duration,

    /// Verbose output
    #[clap(short = 'v', long, default_value_t = false, global = true)]
    pub verbose: bool,

    /// Output file for results (JSON format)
    #[clap(short = 'o', long, global = true)]
    pub output_file: Option<PathBuf>,

    /// JSON output file for streaming trials during execution
    #[clap(long, global = true)]
    pub streaming_output: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read an object repeatedly and report per-read latency
    Read(ReadArgs),

    /// Build, sign and submit one transaction, timing each phase
    Submit(SubmitArgs),

    /// Query all coin balances of an address once
    Balances(BalancesArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Read(_) => "read",
            Command::Submit(_) => "submit",
            Command::Balances(_) => "balances",
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ReadArgs {
    /// Object to read
    #[clap(long, default_value = crate::defaults::OBJECT_ID)]
    pub object_id: String,

    /// Number of measured reads
    #[clap(short = 'n', long, default_value_t = crate::defaults::ROUNDS)]
    pub rounds: usize,

    /// Unrecorded reads before measuring
    #[clap(short = 'w', long, default_value_t = crate::defaults::WARMUP_ROUNDS)]
    pub warmup: usize,

    /// Content field reported on every trial
    #[clap(short = 'f', long, default_value = crate::defaults::FIELD)]
    pub field: String,

    /// Read mask paths (object_id, version, digest, type, owner, json, json.<field>).
    /// Defaults to the reported field only.
    #[clap(long, value_delimiter = ',')]
    pub read_mask: Vec<String>,

    /// What to do when a read fails
    #[clap(long, value_enum, default_value_t = FailurePolicy::Abort)]
    pub on_failure: FailurePolicy,

    /// Percentiles to calculate for latency metrics
    #[clap(long, value_delimiter = ',', default_values_t = crate::defaults::PERCENTILES.to_vec())]
    pub percentiles: Vec<f64>,
}

impl ReadArgs {
    /// Mask paths to request; the reported field when none were given
    pub fn mask_paths(&self) -> Vec<String> {
        if self.read_mask.is_empty() {
            vec![format!("json.{}", self.field)]
        } else {
            self.read_mask.clone()
        }
    }

    pub fn session_config(&self, trial_timeout: Option<Duration>) -> SessionConfig {
        SessionConfig {
            rounds: self.rounds,
            warmup: self.warmup,
            failure_policy: self.on_failure,
            trial_timeout,
            percentiles: self.percentiles.clone(),
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
#[clap(group(
    ArgGroup::new("source")
        .required(true)
        .args(["tx_bytes_file", "move_call", "transfer_to"])
))]
pub struct SubmitArgs {
    /// Signer key: bech32 `suiprivkey1…` or base64 of flag byte 0x00 followed by the 32-byte secret
    #[clap(long, env = "SUI_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// File holding base64 transaction bytes to submit as-is
    #[clap(long)]
    pub tx_bytes_file: Option<PathBuf>,

    /// Move call target as PACKAGE::MODULE::FUNCTION
    #[clap(long)]
    pub move_call: Option<String>,

    /// Type argument of the Move call (repeatable)
    #[clap(long = "type-arg", requires = "move_call")]
    pub type_args: Vec<String>,

    /// Argument of the Move call, JSON or a plain string (repeatable)
    #[clap(long = "arg", requires = "move_call")]
    pub args: Vec<String>,

    /// Recipient of a SUI transfer
    #[clap(long)]
    pub transfer_to: Option<String>,

    /// Amount of MIST to transfer; the whole gas coin when omitted
    #[clap(long, requires = "transfer_to")]
    pub amount: Option<u64>,

    /// Gas budget in MIST
    #[clap(long, default_value_t = crate::defaults::GAS_BUDGET)]
    pub gas_budget: u64,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BalancesArgs {
    /// Address to query; the signer from SUI_PRIVATE_KEY when omitted
    #[clap(long)]
    pub owner: Option<String>,
}

/// Parse duration from string (e.g., "500ms", "10s", "5m", "1h")
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, "s")
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, "m")
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, "h")
    } else {
        (s, "s") // Default to seconds
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number in duration: {}", num_str))?;

    if !num.is_finite() || num < 0.0 {
        return Err(format!("Duration must be a non-negative number: {}", s));
    }

    let duration = match unit {
        "ms" => Duration::from_secs_f64(num / 1000.0),
        "s" => Duration::from_secs_f64(num),
        "m" => Duration::from_secs_f64(num * 60.0),
        "h" => Duration::from_secs_f64(num * 3600.0),
        _ => return Err(format!("Invalid duration unit: {}", unit)),
    };

    Ok(duration)
}
