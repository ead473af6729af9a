//! In-memory fullnode used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use sui_latency_bench::{
    error::Result,
    rpc::{
        Balance, CoinRef, ExecutionReceipt, FullnodeClient, MoveCallRequest, ObjectState,
        ReadMask, TransferSuiRequest, SUI_COIN_TYPE,
    },
    tx::{TransactionPayload, UserSignature},
    BenchError,
};

/// Mock node: fixed responses, optional delay, optional failing read
pub struct MockFullnode {
    pub delay: Duration,
    /// 1-based index of the `get_object` call that fails
    pub fail_read_on: Option<usize>,
    pub coins: Vec<CoinRef>,
    pub built_bytes: Vec<u8>,
    pub reads: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
    pub executed: Mutex<Vec<(Vec<u8>, Vec<Vec<u8>>)>>,
}

impl Default for MockFullnode {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            fail_read_on: None,
            coins: vec![coin("0xc1", 100), coin("0xc2", 5_000)],
            built_bytes: vec![0x00, 0x01, 0x02, 0x03, 0xff],
            reads: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
        }
    }
}

pub fn coin(id: &str, balance: u64) -> CoinRef {
    CoinRef {
        object_id: id.to_string(),
        version: 1,
        digest: "coin-digest".to_string(),
        coin_type: SUI_COIN_TYPE.to_string(),
        balance,
    }
}

impl MockFullnode {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl FullnodeClient for MockFullnode {
    async fn get_object(&self, object_id: &str, mask: &ReadMask) -> Result<ObjectState> {
        self.record("get_object");
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        self.wait().await;

        if self.fail_read_on == Some(n) {
            return Err(BenchError::Transport(format!("connection reset on read {n}")));
        }

        let state = ObjectState {
            object_id: Some(object_id.to_string()),
            version: Some(42),
            digest: Some("obj-digest".to_string()),
            object_type: Some("0xdee9::pool::Pool".to_string()),
            owner: Some(json!({"Shared": {"initial_shared_version": 1}})),
            json: Some(json!({"sqrt_price": "5464238785", "liquidity": "1000"})),
        };
        Ok(state.apply_mask(mask))
    }

    async fn get_reference_gas_price(&self) -> Result<u64> {
        self.record("get_reference_gas_price");
        self.wait().await;
        Ok(750)
    }

    async fn get_gas_coins(&self, _owner: &str) -> Result<Vec<CoinRef>> {
        self.record("get_gas_coins");
        self.wait().await;
        Ok(self.coins.clone())
    }

    async fn get_all_balances(&self, _owner: &str) -> Result<Vec<Balance>> {
        self.record("get_all_balances");
        self.wait().await;
        Ok(vec![Balance {
            coin_type: SUI_COIN_TYPE.to_string(),
            coin_object_count: self.coins.len() as u64,
            total_balance: self.coins.iter().map(|c| u128::from(c.balance)).sum(),
        }])
    }

    async fn build_move_call(&self, request: &MoveCallRequest) -> Result<TransactionPayload> {
        self.record(&format!(
            "build_move_call {}::{}::{} gas={}",
            request.package,
            request.module,
            request.function,
            request.gas.as_deref().unwrap_or("-")
        ));
        self.wait().await;
        Ok(TransactionPayload::new(self.built_bytes.clone()))
    }

    async fn build_transfer_sui(&self, request: &TransferSuiRequest) -> Result<TransactionPayload> {
        self.record(&format!("build_transfer_sui gas={}", request.sui_object_id));
        self.wait().await;
        Ok(TransactionPayload::new(self.built_bytes.clone()))
    }

    async fn execute_transaction(
        &self,
        payload: &TransactionPayload,
        signatures: &[UserSignature],
    ) -> Result<ExecutionReceipt> {
        self.record("execute_transaction");
        self.wait().await;
        self.executed.lock().unwrap().push((
            payload.as_bytes().to_vec(),
            signatures.iter().map(|s| s.as_bytes().to_vec()).collect(),
        ));
        Ok(ExecutionReceipt {
            digest: "TxDigest111".to_string(),
            status: Some("success".to_string()),
            error: None,
            raw: Value::Null,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
