//! One gas-sponsored permit transfer, end to end.
//!
//! ```text
//! validate amount -> read balance -> build permit -> quote fee -> send (with retry) -> poll
//! ```
//!
//! Amount validation happens before anything touches the network, and the
//! balance check before anything is signed or sent to the relay. The permit
//! is signed and the fee quoted once: retries resend the same request.
//!
//! A requested amount equal to the full balance is accepted; only an amount
//! strictly above the balance is rejected.

use alloy_primitives::{Address, U256};
use permit_relay_eip155::chain::{TokenReadError, TokenReader};
use permit_relay_eip155::contract::SpenderCall;
use permit_relay_eip155::permit::{PermitAmount, PermitError, PermitRequest, build_permit};
use permit_relay_eip155::signer::SignerLike;
use permit_relay_types::networks::explorer_tx_url;
use permit_relay_types::timestamp::UnixTimestamp;
use permit_relay_types::util::{DecimalAmountError, format_base_units};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::poll::{PollConfig, PollOutcome, poll_task};
use crate::relay::Relay;
use crate::retry::{RetryPolicy, retry};
use crate::submit::{SponsoredSubmitter, SubmitError, SubmitParams};
use crate::types::TaskId;

/// What to transfer and how to relay it.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub token: Address,
    /// Spender contract: the permit's spender and the relayed call's target.
    pub spender: Address,
    pub amount: PermitAmount,
    pub deadline: UnixTimestamp,
    pub call: SpenderCall,
    pub gas_limit: u64,
    pub high_priority: bool,
    pub fee_buffer_bps: u32,
}

/// Outcome of a submitted or resumed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReport {
    pub task_id: TaskId,
    /// Chain the task runs on, when known.
    pub chain_id: Option<u64>,
    pub outcome: PollOutcome,
}

impl FlowReport {
    /// Block explorer link of the relayed transaction, on known networks.
    pub fn explorer_url(&self) -> Option<String> {
        let status = self.outcome.status()?;
        let tx_hash = status.transaction_hash()?;
        let chain_id = status.chain_id.map(|c| c.inner()).or(self.chain_id)?;
        explorer_tx_url(chain_id, tx_hash)
    }
}

fn units(amount: &U256, decimals: &u8) -> String {
    format_base_units(*amount, *decimals)
}

/// Input rejected before any relay call.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Invalid amount: {0}")]
    Amount(#[from] DecimalAmountError),
    #[error(
        "Insufficient balance: requested {}, available {}",
        units(.amount, .decimals),
        units(.balance, .decimals)
    )]
    InsufficientBalance {
        amount: U256,
        balance: U256,
        decimals: u8,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError<E> {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to read token state: {0}")]
    ChainRead(#[from] TokenReadError),
    #[error("Failed to build permit: {0}")]
    Permit(#[from] PermitError),
    #[error(transparent)]
    Relay(#[from] SubmitError<E>),
}

/// Polls an already submitted task.
pub async fn resume<R>(relay: &R, task_id: TaskId, poll: &PollConfig) -> FlowReport
where
    R: Relay + Sync,
{
    let outcome = poll_task(relay, &task_id, poll).await;
    let chain_id = outcome
        .status()
        .and_then(|status| status.chain_id)
        .map(|chain_id| chain_id.inner());
    FlowReport {
        task_id,
        chain_id,
        outcome,
    }
}

/// Capabilities and tuning of sponsored transfers.
///
/// Built per invocation; nothing is shared between two flows.
#[derive(Debug, Clone)]
pub struct SponsoredTransfer<S, T, R> {
    signer: S,
    reader: T,
    relay: R,
    retry: RetryPolicy,
    poll: PollConfig,
}

impl<S, T, R> SponsoredTransfer<S, T, R> {
    pub fn new(signer: S, reader: T, relay: R) -> Self {
        Self {
            signer,
            reader,
            relay,
            retry: RetryPolicy::default(),
            poll: PollConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }
}

impl<S, T, R> SponsoredTransfer<S, T, R>
where
    S: SignerLike + Sync,
    T: TokenReader + Sync,
    R: Relay + Sync,
{
    /// Validates, signs, submits and polls one transfer.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "relay.transfer", skip_all, fields(token = %request.token, spender = %request.spender), err)
    )]
    pub async fn execute(
        &self,
        request: &TransferRequest,
    ) -> Result<FlowReport, FlowError<R::Error>> {
        if let PermitAmount::BaseUnits(value) = &request.amount {
            if value.is_zero() {
                return Err(ValidationError::NonPositiveAmount.into());
            }
        }

        let owner = self.signer.address();
        let (decimals, balance) = tokio::join!(
            self.reader.decimals(request.token),
            self.reader.balance_of(request.token, owner)
        );
        let decimals = decimals?;
        let balance = balance?;
        let amount = request
            .amount
            .to_base_units(decimals)
            .map_err(ValidationError::Amount)?;
        if amount > balance {
            return Err(ValidationError::InsufficientBalance {
                amount,
                balance,
                decimals,
            }
            .into());
        }

        let permit = build_permit(
            &self.signer,
            &self.reader,
            &PermitRequest {
                owner,
                token: request.token,
                spender: request.spender,
                amount: PermitAmount::BaseUnits(amount),
                deadline: request.deadline,
            },
        )
        .await?;

        let chain_id = permit.domain.chain_id;
        let submitter = SponsoredSubmitter::new(&self.relay);
        let params = SubmitParams {
            chain_id,
            target: request.spender,
            gas_limit: request.gas_limit,
            high_priority: request.high_priority,
            fee_buffer_bps: request.fee_buffer_bps,
        };
        let call = submitter.prepare(&permit, &request.call, &params).await?;
        let task_id = retry(|| submitter.send(&call), &self.retry).await?;

        let outcome = poll_task(&self.relay, &task_id, &self.poll).await;
        Ok(FlowReport {
            task_id,
            chain_id: Some(chain_id),
            outcome,
        })
    }
}
