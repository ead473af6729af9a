//! Where the transaction bytes of a submit run come from.

use super::TransactionPayload;
use crate::error::{BenchError, Result};
use crate::rpc::{CoinRef, FullnodeClient, MoveCallRequest, TransferSuiRequest};
use serde_json::Value;

/// Source of the transaction to submit
#[derive(Debug, Clone)]
pub enum PayloadSource {
    /// Bytes built elsewhere and loaded from a file
    Prebuilt(TransactionPayload),
    /// A single Move call built by the node
    MoveCall {
        package: String,
        module: String,
        function: String,
        type_arguments: Vec<String>,
        arguments: Vec<Value>,
    },
    /// A SUI transfer built by the node. `None` sends the whole gas coin.
    TransferSui {
        recipient: String,
        amount: Option<u64>,
    },
}

impl PayloadSource {
    /// Parse a `PACKAGE::MODULE::FUNCTION` target
    pub fn move_call(
        target: &str,
        type_arguments: Vec<String>,
        arguments: Vec<Value>,
    ) -> Result<Self> {
        let parts: Vec<&str> = target.split("::").collect();
        match parts.as_slice() {
            [package, module, function]
                if !package.is_empty() && !module.is_empty() && !function.is_empty() =>
            {
                Ok(Self::MoveCall {
                    package: package.to_string(),
                    module: module.to_string(),
                    function: function.to_string(),
                    type_arguments,
                    arguments,
                })
            }
            _ => Err(BenchError::InvalidInput(format!(
                "move call target must be PACKAGE::MODULE::FUNCTION, got '{target}'"
            ))),
        }
    }

    /// Whether the node has to build the bytes (and so needs a gas coin)
    pub fn needs_build(&self) -> bool {
        !matches!(self, Self::Prebuilt(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Prebuilt(_) => "prebuilt",
            Self::MoveCall { .. } => "move-call",
            Self::TransferSui { .. } => "transfer-sui",
        }
    }

    /// Produce the transaction bytes, asking the node to build them if needed
    pub async fn build<C>(
        &self,
        client: &C,
        signer: &str,
        gas: Option<&CoinRef>,
        gas_budget: u64,
    ) -> Result<TransactionPayload>
    where
        C: FullnodeClient + ?Sized,
    {
        match self {
            Self::Prebuilt(payload) => Ok(payload.clone()),
            Self::MoveCall {
                package,
                module,
                function,
                type_arguments,
                arguments,
            } => {
                let request = MoveCallRequest {
                    signer: signer.to_string(),
                    package: package.clone(),
                    module: module.clone(),
                    function: function.clone(),
                    type_arguments: type_arguments.clone(),
                    arguments: arguments.clone(),
                    gas: gas.map(|c| c.object_id.clone()),
                    gas_budget,
                };
                client.build_move_call(&request).await
            }
            Self::TransferSui { recipient, amount } => {
                let coin = gas.ok_or_else(|| {
                    BenchError::MissingPrecondition(format!(
                        "no SUI gas coins owned by {signer}"
                    ))
                })?;
                let request = TransferSuiRequest {
                    signer: signer.to_string(),
                    sui_object_id: coin.object_id.clone(),
                    gas_budget,
                    recipient: recipient.clone(),
                    amount: *amount,
                };
                client.build_transfer_sui(&request).await
            }
        }
    }
}

/// Parse a Move call argument: JSON when it parses, a plain string otherwise
pub fn parse_argument(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
