//! # Sui Latency Bench - Main Entry Point
//!
//! Measures the client-side round-trip latency of calls against a Sui
//! fullnode. Three commands are available:
//!
//! - `read`: read one object repeatedly and report per-read latency with a
//!   summary (count, average, minimum, maximum, percentiles)
//! - `submit`: build, sign and submit one transaction, timing every phase
//! - `balances`: query all coin balances of an address once
//!
//! ## Output
//!
//! The latency report goes to stdout. Logs go to stderr and are controlled
//! with `RUST_LOG` or `--verbose`. `--output-file` and `--streaming-output`
//! additionally write JSON results.
//!
//! ## Exit Status
//!
//! Non-zero when a precondition fails, a read session aborts, or a submit
//! phase fails.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use sui_latency_bench::{
    cli::{Args, BalancesArgs, Command, ReadArgs, SubmitArgs, Transport},
    logging,
    report,
    results::{ResultsManager, RunRecord},
    rpc::{FullnodeClient, GrpcClient, JsonRpcClient, ReadMask},
    session::{Session, TrialOutcome},
    timing::timed_with_timeout,
    tx::{
        builder::parse_argument, Ed25519Signer, PayloadSource, SubmitPipeline,
        TransactionPayload, TransactionSigner,
    },
    utils::{validate_address, validate_percentiles, validate_rounds},
    BenchError, VERSION,
};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(args.verbose);

    info!("Starting Sui Latency Bench v{}", VERSION);
    debug!(
        "Endpoint: {} ({}), api key: {}, timeout: {:?}",
        args.rpc_url,
        args.transport,
        if args.api_key.is_some() { "set" } else { "none" },
        args.timeout
    );

    // One client for the whole run, passed by reference
    let client: Box<dyn FullnodeClient> = match args.transport {
        Transport::JsonRpc => Box::new(
            JsonRpcClient::new(&args.rpc_url, args.api_key.clone(), args.connect_timeout)
                .context("Failed to create JSON-RPC client")?,
        ),
        Transport::Grpc => Box::new(
            GrpcClient::new(&args.rpc_url, args.api_key.clone(), args.connect_timeout)
                .context("Failed to create gRPC client")?,
        ),
    };
    let client = client.as_ref();

    let mut results_manager = ResultsManager::new(args.output_file.as_deref());
    if let Some(ref streaming_file) = args.streaming_output {
        info!("Streaming trials to: {:?}", streaming_file);
        results_manager.enable_streaming(streaming_file)?;
    }

    let outcome = match args.command {
        Command::Read(ref read) => run_read(client, &args, read, &mut results_manager).await,
        Command::Submit(ref submit) => {
            run_submit(client, &args, submit, &mut results_manager).await
        }
        Command::Balances(ref balances) => {
            run_balances(client, &args, balances, &mut results_manager).await
        }
    };

    // Results of a failed command are still written
    results_manager.finalize()?;

    match outcome {
        Ok(()) => {
            info!("{} completed successfully", args.command.name());
            Ok(())
        }
        Err(e) => {
            error!("{} failed: {:#}", args.command.name(), e);
            Err(e)
        }
    }
}

/// Read one object `rounds` times and print per-trial latency and a summary
async fn run_read<C: FullnodeClient + ?Sized>(
    client: &C,
    args: &Args,
    read: &ReadArgs,
    results_manager: &mut ResultsManager,
) -> Result<()> {
    validate_address(&read.object_id).context("Invalid --object-id")?;
    validate_rounds(read.rounds)?;
    validate_percentiles(&read.percentiles)?;

    let mask = ReadMask::new(read.mask_paths());
    let session = Session::new("read", read.session_config(args.timeout));
    info!(
        "Reading {} from {} ({} rounds, {} warmup, on failure: {})",
        read.object_id,
        client.name(),
        read.rounds,
        read.warmup,
        read.on_failure
    );

    let mut stdout = io::stdout();
    report::write_read_header(&mut stdout, &args.rpc_url, &read.object_id, read.rounds)?;

    let session_report = session
        .run(
            || client.get_object(&read.object_id, &mask),
            |state| state.field(&read.field),
            |trial| {
                report::write_trial(&mut stdout, &read.field, trial)?;
                results_manager.stream_trial("read", trial)
            },
        )
        .await?;

    results_manager.add_record(RunRecord::Read {
        rpc_url: args.rpc_url.clone(),
        object_id: read.object_id.clone(),
        field: read.field.clone(),
        session: session_report.clone(),
    });

    if let Some(ref aborted) = session_report.aborted {
        let reason = match aborted.outcome {
            TrialOutcome::Failure { ref error } => error.as_str(),
            _ => "unknown",
        };
        let stage = if session_report.aborted_in_warmup {
            "warmup trial"
        } else {
            "trial"
        };
        anyhow::bail!(
            "Session aborted at {} {} after {} completed: {}",
            stage,
            aborted.index,
            session_report.stats.as_ref().map_or(0, |s| s.count),
            reason
        );
    }

    if session_report.summary().is_none() {
        anyhow::bail!(
            "No trial completed ({} failures out of {})",
            session_report.failures,
            session_report.requested_rounds
        );
    }

    report::write_session_summary(&mut stdout, &session_report)?;
    Ok(())
}

/// Build, sign and submit one transaction
async fn run_submit<C: FullnodeClient + ?Sized>(
    client: &C,
    args: &Args,
    submit: &SubmitArgs,
    results_manager: &mut ResultsManager,
) -> Result<()> {
    let signer = Ed25519Signer::from_keystore(&submit.private_key)?;
    let source = payload_source(submit)?;

    let pipeline =
        SubmitPipeline::new(client, &signer, submit.gas_budget).with_timeout(args.timeout);
    let mut stdout = io::stdout();

    match pipeline.run(&source).await {
        Ok(outcome) => {
            report::write_submit_outcome(&mut stdout, &outcome)?;
            if !outcome.receipt.succeeded() {
                warn!(
                    "Transaction {} executed with status {:?}",
                    outcome.receipt.digest, outcome.receipt.status
                );
            }
            results_manager.add_record(RunRecord::Submit {
                rpc_url: args.rpc_url.clone(),
                outcome,
            });
            Ok(())
        }
        Err(failure) => {
            report::write_phases(&mut stdout, &failure.completed)?;
            results_manager.add_record(RunRecord::SubmitFailed {
                rpc_url: args.rpc_url.clone(),
                failed_phase: failure.phase.clone(),
                error: failure.source.to_string(),
                completed: failure.completed.clone(),
            });
            Err(failure.into())
        }
    }
}

fn payload_source(submit: &SubmitArgs) -> Result<PayloadSource> {
    if let Some(ref path) = submit.tx_bytes_file {
        let payload = TransactionPayload::from_file(path)?;
        debug!("Loaded {} transaction bytes from {:?}", payload.len(), path);
        return Ok(PayloadSource::Prebuilt(payload));
    }

    if let Some(ref target) = submit.move_call {
        let arguments = submit.args.iter().map(|a| parse_argument(a)).collect();
        return Ok(PayloadSource::move_call(
            target,
            submit.type_args.clone(),
            arguments,
        )?);
    }

    if let Some(ref recipient) = submit.transfer_to {
        validate_address(recipient).context("Invalid --transfer-to")?;
        return Ok(PayloadSource::TransferSui {
            recipient: recipient.clone(),
            amount: submit.amount,
        });
    }

    Err(BenchError::InvalidInput(
        "one of --tx-bytes-file, --move-call or --transfer-to is required".to_string(),
    )
    .into())
}

/// Query all balances of an address once
async fn run_balances<C: FullnodeClient + ?Sized>(
    client: &C,
    args: &Args,
    balances: &BalancesArgs,
    results_manager: &mut ResultsManager,
) -> Result<()> {
    let owner = match balances.owner {
        Some(ref owner) => owner.clone(),
        None => {
            let key = std::env::var("SUI_PRIVATE_KEY")
                .context("--owner is required when SUI_PRIVATE_KEY is not set")?;
            Ed25519Signer::from_keystore(&key)?.address()
        }
    };
    validate_address(&owner).context("Invalid --owner")?;

    let result = timed_with_timeout(client.get_all_balances(&owner), args.timeout).await?;
    let latency_ms = result.latency_ms();

    let mut stdout = io::stdout();
    report::write_balances(&mut stdout, &owner, &result.response, latency_ms)?;

    results_manager.add_record(RunRecord::Balances {
        rpc_url: args.rpc_url.clone(),
        owner,
        latency_ms,
        balances: result.response,
    });
    Ok(())
}
