use alloy_primitives::Address;
use dotenvy::dotenv;
use permit_relay_client::flow::{FlowReport, SponsoredTransfer, TransferRequest, resume};
use permit_relay_client::{PollConfig, PollOutcome, RelayClient, RetryPolicy};
use permit_relay_eip155::chain::{ProviderTokenReader, TokenReader, read_provider};
use permit_relay_types::timestamp::UnixTimestamp;

use crate::config::{Config, Mode, SubmitConfig};
use crate::telemetry::Telemetry;

/// Runs one submission or one resumed poll.
///
/// - Loads `.env` variables.
/// - Installs logging (and OpenTelemetry export when enabled).
/// - Resolves configuration from flags and environment.
/// - Submits a new sponsored transfer, or polls the task named by `TASK_ID`.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register();

    let config = Config::load()?;
    let relay = RelayClient::try_new(&config.relay_api_url, config.relay_api_key)?;
    let flow_config = (config.retry, config.poll);

    let report = match config.mode {
        Mode::Resume(task_id) => {
            tracing::info!(%task_id, "Resuming status polling");
            resume(&relay, task_id, &config.poll).await
        }
        Mode::Submit(submit) => submit_transfer(&submit, relay, flow_config).await?,
    };

    print_report(&report);
    Ok(())
}

async fn submit_transfer(
    submit: &SubmitConfig,
    relay: RelayClient,
    (retry, poll): (RetryPolicy, PollConfig),
) -> Result<FlowReport, Box<dyn std::error::Error>> {
    let reader = ProviderTokenReader::new(read_provider(&submit.rpc)?);
    let chain_id = reader.chain_id().await?;
    let signer = submit.private_key.signer(Some(chain_id))?;
    let owner: Address = signer.address();
    tracing::info!(%owner, chain_id, token = %submit.token, target = %submit.target, amount = %submit.amount, "Submitting sponsored transfer");

    let now = UnixTimestamp::now();
    let request = TransferRequest {
        token: submit.token,
        spender: submit.target,
        amount: submit.permit_amount(),
        deadline: submit.permit_deadline(now),
        call: submit.spender_call(now),
        gas_limit: submit.gas_limit,
        high_priority: submit.high_priority,
        fee_buffer_bps: submit.fee_buffer_bps,
    };
    let flow = SponsoredTransfer::new(signer, reader, relay)
        .with_retry(retry)
        .with_poll(poll);
    let report = flow.execute(&request).await?;
    Ok(report)
}

fn print_report(report: &FlowReport) {
    println!("Task ID: {}", report.task_id);
    match &report.outcome {
        PollOutcome::Terminal(status) => {
            println!("Final state: {}", status.task_state);
        }
        PollOutcome::Inconclusive(status) => {
            let state = status
                .as_ref()
                .map(|s| s.task_state.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("Still pending (last state: {state}). Re-run with TASK_ID={} to keep polling.", report.task_id);
        }
    }
    if let Some(status) = report.outcome.status() {
        if let Some(message) = status.last_check_message.as_deref() {
            println!("Last check: {message}");
        }
        if let Some(tx_hash) = status.transaction_hash() {
            println!("Transaction: {tx_hash}");
        }
    }
    if let Some(url) = report.explorer_url() {
        println!("Explorer: {url}");
    }
}
