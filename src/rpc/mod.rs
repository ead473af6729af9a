//! Fullnode client abstraction.
//!
//! `FullnodeClient` is the only way the rest of the crate talks to a node.
//! The benchmark, the submit pipeline and the tests all go through it, so a
//! different transport (or a mock) only needs to implement this trait.

use crate::error::Result;
use crate::tx::{TransactionPayload, UserSignature};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod grpc;
pub mod json_rpc;

pub use grpc::GrpcClient;
pub use json_rpc::JsonRpcClient;

/// Coin type used to pay for gas
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

/// Field-selection mask for object reads.
///
/// Recognized paths are `object_id`, `version`, `digest`, `type`, `owner`,
/// `json` (the whole Move content) and `json.<field>` (one content field).
/// An empty mask selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadMask {
    pub paths: Vec<String>,
}

impl ReadMask {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    /// Whether `path` is selected. `json` selects every `json.<field>`.
    pub fn includes(&self, path: &str) -> bool {
        if self.paths.is_empty() {
            return true;
        }
        self.paths
            .iter()
            .any(|p| p == path || (p == "json" && path.starts_with("json.")))
    }

    /// Whether any part of the Move content is selected
    pub fn wants_content(&self) -> bool {
        self.paths.is_empty() || self.paths.iter().any(|p| p == "json" || p.starts_with("json."))
    }

    /// Individual content fields selected, or `None` for the whole content
    fn content_fields(&self) -> Option<Vec<&str>> {
        if self.paths.is_empty() || self.paths.iter().any(|p| p == "json") {
            return None;
        }
        Some(
            self.paths
                .iter()
                .filter_map(|p| p.strip_prefix("json."))
                .collect(),
        )
    }
}

/// Object state restricted to the fields of a `ReadMask`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    pub object_id: Option<String>,
    pub version: Option<u64>,
    pub digest: Option<String>,
    pub object_type: Option<String>,
    pub owner: Option<Value>,
    pub json: Option<Value>,
}

impl ObjectState {
    /// Drop everything the mask does not select
    pub fn apply_mask(mut self, mask: &ReadMask) -> Self {
        if !mask.includes("object_id") {
            self.object_id = None;
        }
        if !mask.includes("version") {
            self.version = None;
        }
        if !mask.includes("digest") {
            self.digest = None;
        }
        if !mask.includes("type") {
            self.object_type = None;
        }
        if !mask.includes("owner") {
            self.owner = None;
        }

        if !mask.wants_content() {
            self.json = None;
        } else if let Some(fields) = mask.content_fields() {
            self.json = self.json.map(|json| match json {
                Value::Object(map) => Value::Object(
                    map.into_iter()
                        .filter(|(k, _)| fields.contains(&k.as_str()))
                        .collect(),
                ),
                other => other,
            });
        }
        self
    }

    /// A scalar content field rendered as a string.
    ///
    /// Returns `None` when the content is absent, the field is missing, or the
    /// field is not a string or a number.
    pub fn field(&self, name: &str) -> Option<String> {
        match self.json.as_ref()?.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A gas coin owned by an address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRef {
    pub object_id: String,
    pub version: u64,
    pub digest: String,
    pub coin_type: String,
    pub balance: u64,
}

/// Total balance of one coin type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub coin_type: String,
    pub coin_object_count: u64,
    pub total_balance: u128,
}

/// A single Move call to be turned into transaction bytes by the node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveCallRequest {
    pub signer: String,
    pub package: String,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
    pub gas: Option<String>,
    pub gas_budget: u64,
}

/// A SUI transfer to be turned into transaction bytes by the node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSuiRequest {
    pub signer: String,
    pub sui_object_id: String,
    pub gas_budget: u64,
    pub recipient: String,
    pub amount: Option<u64>,
}

/// Result of executing a signed transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    pub digest: String,
    pub status: Option<String>,
    pub error: Option<String>,
    pub raw: Value,
}

impl ExecutionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Calls the benchmark issues against a fullnode
#[async_trait]
pub trait FullnodeClient: Send + Sync {
    /// Read an object's current state restricted to `mask`
    async fn get_object(&self, object_id: &str, mask: &ReadMask) -> Result<ObjectState>;

    /// Reference gas price of the current epoch
    async fn get_reference_gas_price(&self) -> Result<u64>;

    /// SUI coins owned by `owner`
    async fn get_gas_coins(&self, owner: &str) -> Result<Vec<CoinRef>>;

    /// Balances of every coin type owned by `owner`
    async fn get_all_balances(&self, owner: &str) -> Result<Vec<Balance>>;

    /// Build transaction bytes for a single Move call
    async fn build_move_call(&self, request: &MoveCallRequest) -> Result<TransactionPayload>;

    /// Build transaction bytes for a SUI transfer
    async fn build_transfer_sui(&self, request: &TransferSuiRequest)
        -> Result<TransactionPayload>;

    /// Submit signed transaction bytes
    async fn execute_transaction(
        &self,
        payload: &TransactionPayload,
        signatures: &[UserSignature],
    ) -> Result<ExecutionReceipt>;

    /// Name used in logs and reports
    fn name(&self) -> &str {
        "fullnode"
    }
}
