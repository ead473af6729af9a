//! JSON-RPC 2.0 fullnode client over HTTP.

use super::{
    Balance, CoinRef, ExecutionReceipt, FullnodeClient, MoveCallRequest, ObjectState, ReadMask,
    TransferSuiRequest, SUI_COIN_TYPE,
};
use crate::error::{BenchError, Result};
use crate::tx::{TransactionPayload, UserSignature};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "x-api-key";

/// Upper bound on coins fetched when looking for gas
const GAS_COIN_PAGE_SIZE: u64 = 50;

#[derive(Debug, Deserialize)]
struct RpcEnvelope<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Integers the node may encode either as JSON numbers or decimal strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BigInt {
    Num(u64),
    Str(String),
}

impl BigInt {
    fn to_u64(&self) -> Result<u64> {
        match self {
            BigInt::Num(n) => Ok(*n),
            BigInt::Str(s) => s
                .parse()
                .map_err(|_| BenchError::MalformedResponse(format!("not an integer: {s}"))),
        }
    }

    fn to_u128(&self) -> Result<u128> {
        match self {
            BigInt::Num(n) => Ok(u128::from(*n)),
            BigInt::Str(s) => s
                .parse()
                .map_err(|_| BenchError::MalformedResponse(format!("not an integer: {s}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    data: Option<ObjectData>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectData {
    object_id: String,
    version: BigInt,
    digest: String,
    #[serde(rename = "type")]
    object_type: Option<String>,
    owner: Option<Value>,
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinPage {
    data: Vec<CoinData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinData {
    coin_type: String,
    coin_object_id: String,
    version: BigInt,
    digest: String,
    balance: BigInt,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceData {
    coin_type: String,
    coin_object_count: u64,
    total_balance: BigInt,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBytes {
    tx_bytes: String,
}

/// Map the `error` of a `sui_getObject` result
fn object_error(object_id: &str, err: &Value) -> BenchError {
    match err.get("code").and_then(Value::as_str) {
        Some("notExists") | Some("deleted") => BenchError::NotFound {
            object_id: object_id.to_string(),
        },
        Some(code) => BenchError::ObjectError {
            object_id: object_id.to_string(),
            code: code.to_string(),
            detail: err.to_string(),
        },
        None => BenchError::MalformedResponse(format!("object error without code: {err}")),
    }
}

/// Fullnode client speaking the Sui JSON-RPC API
pub struct JsonRpcClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Build a client for `url`. The underlying HTTP client is created once
    /// and reused by every call.
    pub fn new(url: &str, api_key: Option<String>, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| BenchError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!("-> {} #{}: {}", method, id, body);

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(BenchError::Transport(format!(
                "{method} returned HTTP {status}: {text}"
            )));
        }

        let envelope: RpcEnvelope<R> = resp.json().await?;
        if let Some(err) = envelope.error {
            return Err(BenchError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        envelope
            .result
            .ok_or_else(|| BenchError::MalformedResponse(format!("{method}: missing result")))
    }
}

#[async_trait]
impl FullnodeClient for JsonRpcClient {
    async fn get_object(&self, object_id: &str, mask: &ReadMask) -> Result<ObjectState> {
        let options = json!({
            "showType": mask.includes("type"),
            "showOwner": mask.includes("owner"),
            "showContent": mask.wants_content(),
        });
        let resp: ObjectResponse = self
            .call("sui_getObject", json!([object_id, options]))
            .await?;

        let data = match (resp.data, resp.error) {
            (Some(data), _) => data,
            (None, Some(err)) => {
                debug!("sui_getObject error for {}: {}", object_id, err);
                return Err(object_error(object_id, &err));
            }
            (None, None) => {
                return Err(BenchError::MalformedResponse(
                    "sui_getObject: neither data nor error".to_string(),
                ))
            }
        };

        let json = data.content.and_then(|content| content.get("fields").cloned());
        let state = ObjectState {
            object_id: Some(data.object_id),
            version: Some(data.version.to_u64()?),
            digest: Some(data.digest),
            object_type: data.object_type,
            owner: data.owner,
            json,
        };
        Ok(state.apply_mask(mask))
    }

    async fn get_reference_gas_price(&self) -> Result<u64> {
        let price: BigInt = self.call("suix_getReferenceGasPrice", json!([])).await?;
        price.to_u64()
    }

    async fn get_gas_coins(&self, owner: &str) -> Result<Vec<CoinRef>> {
        let page: CoinPage = self
            .call(
                "suix_getCoins",
                json!([owner, SUI_COIN_TYPE, null, GAS_COIN_PAGE_SIZE]),
            )
            .await?;

        page.data
            .into_iter()
            .map(|coin| {
                Ok(CoinRef {
                    object_id: coin.coin_object_id,
                    version: coin.version.to_u64()?,
                    digest: coin.digest,
                    coin_type: coin.coin_type,
                    balance: coin.balance.to_u64()?,
                })
            })
            .collect()
    }

    async fn get_all_balances(&self, owner: &str) -> Result<Vec<Balance>> {
        let balances: Vec<BalanceData> = self.call("suix_getAllBalances", json!([owner])).await?;

        balances
            .into_iter()
            .map(|b| {
                Ok(Balance {
                    coin_type: b.coin_type,
                    coin_object_count: b.coin_object_count,
                    total_balance: b.total_balance.to_u128()?,
                })
            })
            .collect()
    }

    async fn build_move_call(&self, request: &MoveCallRequest) -> Result<TransactionPayload> {
        let built: TransactionBytes = self
            .call(
                "unsafe_moveCall",
                json!([
                    request.signer,
                    request.package,
                    request.module,
                    request.function,
                    request.type_arguments,
                    request.arguments,
                    request.gas,
                    request.gas_budget.to_string(),
                    null,
                ]),
            )
            .await?;
        TransactionPayload::from_base64(&built.tx_bytes)
    }

    async fn build_transfer_sui(
        &self,
        request: &TransferSuiRequest,
    ) -> Result<TransactionPayload> {
        let built: TransactionBytes = self
            .call(
                "unsafe_transferSui",
                json!([
                    request.signer,
                    request.sui_object_id,
                    request.gas_budget.to_string(),
                    request.recipient,
                    request.amount.map(|a| a.to_string()),
                ]),
            )
            .await?;
        TransactionPayload::from_base64(&built.tx_bytes)
    }

    async fn execute_transaction(
        &self,
        payload: &TransactionPayload,
        signatures: &[UserSignature],
    ) -> Result<ExecutionReceipt> {
        let sigs: Vec<String> = signatures.iter().map(UserSignature::to_base64).collect();
        let raw: Value = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    payload.to_base64(),
                    sigs,
                    { "showEffects": true },
                    "WaitForLocalExecution",
                ]),
            )
            .await?;

        let digest = raw
            .get("digest")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BenchError::MalformedResponse("sui_executeTransactionBlock: no digest".to_string())
            })?
            .to_string();
        let status = raw.pointer("/effects/status/status").and_then(Value::as_str);
        let error = raw.pointer("/effects/status/error").and_then(Value::as_str);

        Ok(ExecutionReceipt {
            digest,
            status: status.map(str::to_string),
            error: error.map(str::to_string),
            raw,
        })
    }

    fn name(&self) -> &str {
        &self.url
    }
}
