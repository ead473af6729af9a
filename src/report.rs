//! Latency report written to stdout.
//!
//! Every writer takes an `io::Write` so the binary passes stdout and
//! tests pass a buffer.

use crate::{
    phases::PhaseTiming,
    rpc::Balance,
    session::{FailurePolicy, SessionReport, TrialOutcome, TrialRecord},
    tx::SubmitOutcome,
    utils::{format_latency_ms, format_sui},
};
use std::io::{self, Write};

const SEPARATOR: &str = "-----------------------------------------";

/// Header printed before the first read trial
pub fn write_read_header<W: Write>(
    out: &mut W,
    rpc_url: &str,
    object_id: &str,
    rounds: usize,
) -> io::Result<()> {
    writeln!(out, "Target: {}", rpc_url)?;
    writeln!(out, "Object: {}", object_id)?;
    writeln!(out, "Rounds: {}", rounds)?;
    writeln!(out, "{}", SEPARATOR)
}

/// One line per finalized trial
pub fn write_trial<W: Write>(out: &mut W, field: &str, trial: &TrialRecord) -> io::Result<()> {
    match (&trial.outcome, trial.latency_ms) {
        (TrialOutcome::Success { extracted }, Some(latency_ms)) => writeln!(
            out,
            "[{}] {} = {}, latency = {}",
            trial.index,
            field,
            extracted.as_deref().unwrap_or("null"),
            format_latency_ms(latency_ms)
        ),
        (TrialOutcome::Success { extracted }, None) => writeln!(
            out,
            "[{}] {} = {}",
            trial.index,
            field,
            extracted.as_deref().unwrap_or("null")
        ),
        (TrialOutcome::Failure { error }, _) => {
            writeln!(out, "[{}] failed: {}", trial.index, error)
        }
    }
}

/// Summary block of a finished session.
///
/// Writes nothing for aborted sessions and sessions without completed
/// trials.
pub fn write_session_summary<W: Write>(out: &mut W, report: &SessionReport) -> io::Result<()> {
    let Some(stats) = report.summary() else {
        return Ok(());
    };

    writeln!(out, "{}", SEPARATOR)?;
    writeln!(out, "Rounds: {}", stats.count)?;
    writeln!(out, "Avg latency: {}", format_latency_ms(stats.mean_ms))?;
    writeln!(out, "Min latency: {}", format_latency_ms(stats.min_ms))?;
    writeln!(out, "Max latency: {}", format_latency_ms(stats.max_ms))?;
    for p in &stats.percentiles {
        writeln!(
            out,
            "{} latency: {}",
            percentile_label(p.percentile),
            format_latency_ms(p.value_ms)
        )?;
    }
    if report.failure_policy == FailurePolicy::Skip {
        writeln!(out, "Failed trials: {}", report.failures)?;
    }
    Ok(())
}

/// Phase latencies and outcome of a submit run
pub fn write_submit_outcome<W: Write>(out: &mut W, outcome: &SubmitOutcome) -> io::Result<()> {
    writeln!(out, "Sender: {}", outcome.sender)?;
    if let Some(price) = outcome.reference_gas_price {
        writeln!(out, "Reference gas price: {}", price)?;
    }
    if let Some(ref coin) = outcome.gas_coin {
        writeln!(out, "Gas coin: {}", coin)?;
    }
    writeln!(out, "{}", SEPARATOR)?;
    write_phases(out, &outcome.phases.phases)?;
    writeln!(out, "Total latency: {}", format_latency_ms(outcome.phases.total_ms))?;
    writeln!(out, "{}", SEPARATOR)?;
    writeln!(out, "Digest: {}", outcome.receipt.digest)?;
    writeln!(
        out,
        "Status: {}",
        outcome.receipt.status.as_deref().unwrap_or("unknown")
    )?;
    if let Some(ref error) = outcome.receipt.error {
        writeln!(out, "Execution error: {}", error)?;
    }
    Ok(())
}

/// One line per completed phase, in the order they ran
pub fn write_phases<W: Write>(out: &mut W, phases: &[PhaseTiming]) -> io::Result<()> {
    for phase in phases {
        writeln!(
            out,
            "{} latency: {}",
            capitalize(&phase.name),
            format_latency_ms(phase.latency_ms)
        )?;
    }
    Ok(())
}

/// One line per coin type, then the call latency
pub fn write_balances<W: Write>(
    out: &mut W,
    owner: &str,
    balances: &[Balance],
    latency_ms: f64,
) -> io::Result<()> {
    writeln!(out, "Owner: {}", owner)?;
    writeln!(out, "{}", SEPARATOR)?;
    if balances.is_empty() {
        writeln!(out, "(no balances)")?;
    }
    for balance in balances {
        if balance.coin_type == crate::rpc::SUI_COIN_TYPE {
            writeln!(
                out,
                "{}: {} ({} coins)",
                balance.coin_type,
                format_sui(balance.total_balance),
                balance.coin_object_count
            )?;
        } else {
            writeln!(
                out,
                "{}: {} ({} coins)",
                balance.coin_type, balance.total_balance, balance.coin_object_count
            )?;
        }
    }
    writeln!(out, "{}", SEPARATOR)?;
    writeln!(out, "Latency: {}", format_latency_ms(latency_ms))
}

fn percentile_label(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("p{}", p as u64)
    } else {
        format!("p{}", p)
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
