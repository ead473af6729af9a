//! Timed build, sign and submit pipeline.
//!
//! Phases run strictly in order, each timed on its own:
//!
//! 1. `gas price`: reference gas price of the epoch (node-built payloads only)
//! 2. `gas coin`: pick the largest SUI coin owned by the signer
//! 3. `build`: turn the payload source into transaction bytes
//! 4. `sign`: sign exactly those bytes
//! 5. `submit`: execute exactly those bytes with the signature
//!
//! Prebuilt payloads skip the first three phases.
//!
//! The gas price is measured and reported but not passed to the build: the
//! node's builder endpoints set the price themselves. The gas coin, the
//! built bytes and the signature each feed the phase after them.

use super::{PayloadSource, TransactionSigner};
use crate::error::BenchError;
use crate::phases::{PhaseReport, PhaseTimer, PhaseTiming};
use crate::rpc::{CoinRef, ExecutionReceipt, FullnodeClient};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

pub const PHASE_GAS_PRICE: &str = "gas price";
pub const PHASE_GAS_COIN: &str = "gas coin";
pub const PHASE_BUILD: &str = "build";
pub const PHASE_SIGN: &str = "sign";
pub const PHASE_SUBMIT: &str = "submit";

/// A completed submit run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub sender: String,
    pub source: String,
    pub reference_gas_price: Option<u64>,
    pub gas_coin: Option<String>,
    pub payload_len: usize,
    pub phases: PhaseReport,
    pub receipt: ExecutionReceipt,
}

/// A phase failed; later phases did not run
#[derive(Debug, thiserror::Error)]
#[error("{phase} phase failed: {source}")]
pub struct PhaseFailure {
    pub phase: String,
    pub completed: Vec<PhaseTiming>,
    #[source]
    pub source: BenchError,
}

/// Runs the submit phases against one client with one signer
pub struct SubmitPipeline<'a, C: ?Sized, S: ?Sized> {
    client: &'a C,
    signer: &'a S,
    gas_budget: u64,
    timeout: Option<Duration>,
}

impl<'a, C, S> SubmitPipeline<'a, C, S>
where
    C: FullnodeClient + ?Sized,
    S: TransactionSigner + ?Sized,
{
    pub fn new(client: &'a C, signer: &'a S, gas_budget: u64) -> Self {
        Self {
            client,
            signer,
            gas_budget,
            timeout: None,
        }
    }

    /// Bound every phase by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn run(&self, source: &PayloadSource) -> Result<SubmitOutcome, PhaseFailure> {
        let sender = self.signer.address();
        let mut timer =
            PhaseTimer::new(format!("submit {}", source.kind())).with_timeout(self.timeout);

        info!("Submitting {} transaction from {}", source.kind(), sender);

        let mut reference_gas_price = None;
        let mut gas_coin: Option<CoinRef> = None;

        let payload = match source {
            PayloadSource::Prebuilt(payload) => payload.clone(),
            _ => {
                let price =
                    step(&mut timer, PHASE_GAS_PRICE, self.client.get_reference_gas_price()).await?;
                debug!("Reference gas price: {}", price);
                reference_gas_price = Some(price);

                let coin = step(&mut timer, PHASE_GAS_COIN, async {
                    let coins = self.client.get_gas_coins(&sender).await?;
                    coins
                        .into_iter()
                        .max_by_key(|c| c.balance)
                        .ok_or_else(|| {
                            BenchError::MissingPrecondition(format!(
                                "no SUI gas coins owned by {sender}"
                            ))
                        })
                })
                .await?;
                debug!("Gas coin {} (balance {})", coin.object_id, coin.balance);
                let coin = gas_coin.insert(coin);

                step(
                    &mut timer,
                    PHASE_BUILD,
                    source.build(self.client, &sender, Some(&*coin), self.gas_budget),
                )
                .await?
            }
        };
        debug!("Transaction bytes: {} bytes", payload.len());

        let signature = step(&mut timer, PHASE_SIGN, async {
            self.signer.sign_transaction(&payload)
        })
        .await?;

        let receipt = step(
            &mut timer,
            PHASE_SUBMIT,
            self.client
                .execute_transaction(&payload, std::slice::from_ref(&signature)),
        )
        .await?;

        Ok(SubmitOutcome {
            sender,
            source: source.kind().to_string(),
            reference_gas_price,
            gas_coin: gas_coin.map(|c| c.object_id),
            payload_len: payload.len(),
            phases: timer.finish(),
            receipt,
        })
    }
}

async fn step<F, T>(timer: &mut PhaseTimer, name: &str, op: F) -> Result<T, PhaseFailure>
where
    F: Future<Output = Result<T, BenchError>>,
{
    match timer.phase(name, op).await {
        Ok(value) => Ok(value),
        Err(source) => Err(PhaseFailure {
            phase: name.to_string(),
            completed: timer.completed().to_vec(),
            source,
        }),
    }
}
