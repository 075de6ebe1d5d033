//! Fee estimation and sponsored call submission.
//!
//! The relay fee of a sponsored call is paid by the spender contract out of
//! the relayed context. The contract refuses to pay more than the `maxFee` it
//! receives as an argument, so the submitter quotes the fee first, pads it by
//! a buffer and encodes the padded value into the call.
//!
//! Quoting and sending are separate steps: a prepared [`SponsoredCallRequest`]
//! is immutable, and a resend carries exactly the same calldata.

use alloy_primitives::{Address, U256};
use permit_relay_eip155::chain::{ChecksummedAddress, Eip155ChainReference};
use permit_relay_eip155::contract::SpenderCall;
use permit_relay_eip155::permit::PermitSignature;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::relay::Relay;
use crate::types::{FeeEstimateRequest, SponsoredCallRequest, TaskId};

/// Denominator of basis point values.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Fee ceiling for an estimate padded by `buffer_bps` basis points.
///
/// Computed as `estimated * (10000 + buffer_bps) / 10000` with truncating
/// division. Saturates at `U256::MAX`.
pub fn max_fee(estimated: U256, buffer_bps: u32) -> U256 {
    let factor = U256::from(BPS_DENOMINATOR + u64::from(buffer_bps));
    estimated.saturating_mul(factor) / U256::from(BPS_DENOMINATOR)
}

/// Per-submission parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitParams {
    pub chain_id: u64,
    /// Spender contract the relay network calls.
    pub target: Address,
    pub gas_limit: u64,
    pub high_priority: bool,
    pub fee_buffer_bps: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError<E> {
    #[error("Relay fee estimation failed: {0}")]
    Estimate(#[source] E),
    #[error("Relay submission failed: {0}")]
    Submit(#[source] E),
}

/// Quotes, pads, encodes and submits sponsored spender calls.
#[derive(Debug, Clone)]
pub struct SponsoredSubmitter<R> {
    relay: R,
}

impl<R> SponsoredSubmitter<R> {
    pub fn new(relay: R) -> Self {
        Self { relay }
    }
}

impl<R> SponsoredSubmitter<R>
where
    R: Relay + Sync,
{
    /// Quotes the relay fee and builds the sponsored call for `permit`.
    ///
    /// The fee is quoted in the token [`SpenderCall::fee_token`] selects: the
    /// permitted token for [`SpenderCall::TokenFee`], native currency for
    /// [`SpenderCall::NativeFee`].
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "relay.prepare_call",
            skip_all,
            fields(chain_id = params.chain_id, target = %params.target, token = %permit.token),
            err
        )
    )]
    pub async fn prepare(
        &self,
        permit: &PermitSignature,
        call: &SpenderCall,
        params: &SubmitParams,
    ) -> Result<SponsoredCallRequest, SubmitError<R::Error>> {
        let chain_id = Eip155ChainReference::new(params.chain_id);
        let fee_token = call.fee_token(permit.token);
        let estimated = self
            .relay
            .estimate_fee(&FeeEstimateRequest {
                chain_id,
                payment_token: fee_token,
                gas_limit: params.gas_limit,
                high_priority: params.high_priority,
            })
            .await
            .map_err(SubmitError::Estimate)?;
        let max_fee = max_fee(estimated, params.fee_buffer_bps);

        #[cfg(feature = "telemetry")]
        tracing::info!(
            %fee_token,
            estimated_fee = %estimated,
            max_fee = %max_fee,
            buffer_bps = params.fee_buffer_bps,
            "Relay fee estimated"
        );

        Ok(SponsoredCallRequest {
            chain_id,
            target: ChecksummedAddress(params.target),
            data: call.encode(permit, max_fee),
            fee_token,
            is_relay_context: true,
            gas_limit: U256::from(params.gas_limit),
        })
    }

    /// Sends a prepared call and returns the relay task id.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "relay.send_call", skip_all, fields(chain_id = %request.chain_id), err)
    )]
    pub async fn send(&self, request: &SponsoredCallRequest) -> Result<TaskId, SubmitError<R::Error>> {
        let task_id = self
            .relay
            .submit(request)
            .await
            .map_err(SubmitError::Submit)?;

        #[cfg(feature = "telemetry")]
        tracing::info!(%task_id, "Sponsored call submitted");

        Ok(task_id)
    }

    /// [`prepare`](Self::prepare) followed by one [`send`](Self::send).
    pub async fn submit(
        &self,
        permit: &PermitSignature,
        call: &SpenderCall,
        params: &SubmitParams,
    ) -> Result<TaskId, SubmitError<R::Error>> {
        let request = self.prepare(permit, call, params).await?;
        self.send(&request).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::TaskStatus;
    use alloy_primitives::{B256, address};
    use alloy_sol_types::SolCall;
    use permit_relay_eip155::chain::FeeToken;
    use permit_relay_eip155::contract::{INativeFeeSpender, ITokenFeeSpender, SwapConfig};
    use permit_relay_eip155::permit::PermitDomain;
    use permit_relay_eip155::signature::SplitSignature;
    use permit_relay_types::timestamp::UnixTimestamp;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    pub struct FakeRelayError(pub String);

    /// Relay that records requests and replays scripted answers.
    #[derive(Default)]
    pub struct FakeRelay {
        pub estimated_fee: U256,
        /// Added to the quote after every estimate.
        pub fee_step: U256,
        pub estimates: Mutex<Vec<FeeEstimateRequest>>,
        pub submissions: Mutex<Vec<SponsoredCallRequest>>,
        /// Failures returned by `estimate_fee` before it succeeds.
        pub estimate_failures: Mutex<u32>,
        /// Failures returned by `submit` before it succeeds.
        pub submit_failures: Mutex<u32>,
        /// Answers of successive `task_status` calls; the last one repeats.
        pub statuses: Mutex<Vec<Result<TaskStatus, String>>>,
        pub status_calls: Mutex<u32>,
    }

    impl FakeRelay {
        pub fn with_fee(fee: u64) -> Self {
            Self {
                estimated_fee: U256::from(fee),
                ..Default::default()
            }
        }
    }

    impl Relay for FakeRelay {
        type Error = FakeRelayError;

        async fn estimate_fee(&self, request: &FeeEstimateRequest) -> Result<U256, Self::Error> {
            let mut estimates = self.estimates.lock().unwrap();
            let quote = self.estimated_fee + self.fee_step * U256::from(estimates.len());
            estimates.push(*request);
            let mut failures = self.estimate_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(FakeRelayError("oracle unavailable".to_string()));
            }
            Ok(quote)
        }

        async fn submit(&self, request: &SponsoredCallRequest) -> Result<TaskId, Self::Error> {
            self.submissions.lock().unwrap().push(request.clone());
            let mut failures = self.submit_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(FakeRelayError("relay unavailable".to_string()));
            }
            Ok(TaskId::new("0xtask"))
        }

        async fn task_status(&self, _task_id: &TaskId) -> Result<TaskStatus, Self::Error> {
            let call = {
                let mut calls = self.status_calls.lock().unwrap();
                *calls += 1;
                *calls as usize
            };
            let statuses = self.statuses.lock().unwrap();
            let answer = statuses
                .get(call - 1)
                .or_else(|| statuses.last())
                .cloned()
                .unwrap_or_else(|| Err("no status scripted".to_string()));
            answer.map_err(FakeRelayError)
        }
    }

    const TOKEN: Address = address!("0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238");
    const SPENDER: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

    fn permit() -> PermitSignature {
        PermitSignature {
            owner: address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            spender: SPENDER,
            token: TOKEN,
            amount: U256::from(100_000_000u64),
            nonce: U256::ZERO,
            deadline: UnixTimestamp::from_secs(1_900_000_000),
            decimals: 6,
            domain: PermitDomain {
                name: "USD Coin".to_string(),
                version: "2".to_string(),
                chain_id: 11155111,
                verifying_contract: TOKEN,
            },
            signature: SplitSignature {
                r: B256::repeat_byte(1),
                s: B256::repeat_byte(2),
                v: 27,
            },
        }
    }

    fn params(fee_buffer_bps: u32) -> SubmitParams {
        SubmitParams {
            chain_id: 11155111,
            target: SPENDER,
            gas_limit: 300_000,
            high_priority: true,
            fee_buffer_bps,
        }
    }

    #[test]
    fn test_max_fee_zero_buffer_is_identity() {
        for fee in [0u64, 1, 999, 123_456_789] {
            assert_eq!(max_fee(U256::from(fee), 0), U256::from(fee));
        }
    }

    #[test]
    fn test_max_fee_truncates() {
        assert_eq!(max_fee(U256::from(1000u64), 2000), U256::from(1200u64));
        assert_eq!(max_fee(U256::from(3u64), 2000), U256::from(3u64));
        assert_eq!(max_fee(U256::from(7u64), 5000), U256::from(10u64));
    }

    #[test]
    fn test_max_fee_is_monotonic() {
        let fees = [0u64, 1, 9, 10_000, 77_777, 1_000_000_007];
        let buffers = [0u32, 1, 50, 2000, 10_000, 25_000];
        for window in fees.windows(2) {
            for &bps in &buffers {
                assert!(max_fee(U256::from(window[0]), bps) <= max_fee(U256::from(window[1]), bps));
            }
        }
        for window in buffers.windows(2) {
            for &fee in &fees {
                assert!(max_fee(U256::from(fee), window[0]) <= max_fee(U256::from(fee), window[1]));
            }
        }
        assert_eq!(max_fee(U256::MAX, 2000), U256::MAX / U256::from(BPS_DENOMINATOR));
    }

    #[tokio::test]
    async fn test_token_fee_submission() {
        let relay = FakeRelay::with_fee(1000);
        let submitter = SponsoredSubmitter::new(&relay);
        let permit = permit();

        let task_id = submitter
            .submit(&permit, &SpenderCall::TokenFee, &params(2000))
            .await
            .unwrap();
        assert_eq!(task_id, TaskId::new("0xtask"));

        let estimates = relay.estimates.lock().unwrap();
        assert_eq!(estimates.len(), 1);
        assert_eq!(estimates[0].payment_token, FeeToken::Erc20(TOKEN));
        assert_eq!(estimates[0].gas_limit, 300_000);
        assert!(estimates[0].high_priority);

        let submissions = relay.submissions.lock().unwrap();
        let request = &submissions[0];
        assert_eq!(request.chain_id.inner(), 11155111);
        assert_eq!(request.target.0, SPENDER);
        assert_eq!(request.fee_token, FeeToken::Erc20(TOKEN));
        assert!(request.is_relay_context);
        assert_eq!(request.gas_limit, U256::from(300_000u64));
        let call = ITokenFeeSpender::transferWithPermitCall::abi_decode(&request.data).unwrap();
        assert_eq!(call.maxFee, U256::from(1200u64));
        assert_eq!(call.amount, permit.amount);
        assert_eq!(call.user, permit.owner);
    }

    #[tokio::test]
    async fn test_native_fee_submission() {
        let relay = FakeRelay::with_fee(50_000_000_000_000);
        let submitter = SponsoredSubmitter::new(&relay);
        let call = SpenderCall::NativeFee {
            swap: SwapConfig {
                min_out: U256::from(1u64),
                deadline: UnixTimestamp::from_secs(1_900_000_300),
            },
        };

        submitter.submit(&permit(), &call, &params(0)).await.unwrap();

        let estimates = relay.estimates.lock().unwrap();
        assert_eq!(estimates[0].payment_token, FeeToken::Native);
        let submissions = relay.submissions.lock().unwrap();
        assert_eq!(submissions[0].fee_token, FeeToken::Native);
        let decoded = INativeFeeSpender::swapWithPermitCall::abi_decode(&submissions[0].data).unwrap();
        assert_eq!(decoded.maxNativeFee, U256::from(50_000_000_000_000u64));
    }

    #[tokio::test]
    async fn test_prepared_call_is_sent_unchanged() {
        let mut relay = FakeRelay::with_fee(1000);
        relay.fee_step = U256::from(500u64);
        *relay.submit_failures.lock().unwrap() = 1;
        let submitter = SponsoredSubmitter::new(&relay);

        let request = submitter
            .prepare(&permit(), &SpenderCall::TokenFee, &params(2000))
            .await
            .unwrap();
        assert!(submitter.send(&request).await.is_err());
        submitter.send(&request).await.unwrap();

        assert_eq!(relay.estimates.lock().unwrap().len(), 1);
        let submissions = relay.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0], request);
        assert_eq!(submissions[1], request);
    }

    #[tokio::test]
    async fn test_submit_failure_is_surfaced() {
        let relay = FakeRelay::with_fee(1);
        *relay.submit_failures.lock().unwrap() = 1;
        let submitter = SponsoredSubmitter::new(&relay);
        let result = submitter
            .submit(&permit(), &SpenderCall::TokenFee, &params(0))
            .await;
        assert!(matches!(result, Err(SubmitError::Submit(_))));
    }
}
