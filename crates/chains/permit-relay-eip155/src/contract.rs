//! Spender contract calls carried by a sponsored relay request.
//!
//! Two spender variants exist. Both consume the same permit; they differ in
//! the token the relay fee is paid in and therefore in the ABI of the call:
//!
//! - [`SpenderCall::TokenFee`] pays the relay in the permitted ERC-20 token
//!   itself, capped by `maxFee` in that token's base units.
//! - [`SpenderCall::NativeFee`] pays the relay in the chain's native currency.
//!   The spender swaps part of the permitted tokens for native currency, so the
//!   call also carries the swap's slippage bound and deadline.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, sol};
use permit_relay_types::timestamp::UnixTimestamp;
use serde::{Deserialize, Serialize};

use crate::chain::FeeToken;
use crate::permit::PermitSignature;

sol! {
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface ITokenFeeSpender {
        function transferWithPermit(
            address user,
            address token,
            uint256 amount,
            uint256 deadline,
            uint8 v,
            bytes32 r,
            bytes32 s,
            uint256 maxFee
        ) external;
    }

    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    struct PermitData {
        address user;
        address token;
        uint256 amount;
        uint256 deadline;
        uint8 v;
        bytes32 r;
        bytes32 s;
    }

    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    struct SwapParams {
        uint256 minOut;
        uint256 deadline;
    }

    #[allow(missing_docs)]
    #[derive(Debug)]
    interface INativeFeeSpender {
        function swapWithPermit(
            PermitData permit,
            SwapParams swap,
            uint256 maxNativeFee
        ) external;
    }
}

/// Swap bounds of a native-fee spender call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapConfig {
    /// Minimum native currency the swap must yield, in wei.
    pub min_out: U256,
    pub deadline: UnixTimestamp,
}

/// Which spender contract variant a permit is relayed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpenderCall {
    TokenFee,
    NativeFee { swap: SwapConfig },
}

impl SpenderCall {
    /// Token the relay fee is estimated and paid in for a permit of `token`.
    pub fn fee_token(&self, token: Address) -> FeeToken {
        match self {
            SpenderCall::TokenFee => FeeToken::Erc20(token),
            SpenderCall::NativeFee { .. } => FeeToken::Native,
        }
    }

    /// ABI-encodes the spender call for `permit`, capping the relay fee at `max_fee`.
    pub fn encode(&self, permit: &PermitSignature, max_fee: U256) -> Bytes {
        let deadline: U256 = permit.deadline.into();
        let sig = &permit.signature;
        let data = match self {
            SpenderCall::TokenFee => ITokenFeeSpender::transferWithPermitCall {
                user: permit.owner,
                token: permit.token,
                amount: permit.amount,
                deadline,
                v: sig.v,
                r: sig.r,
                s: sig.s,
                maxFee: max_fee,
            }
            .abi_encode(),
            SpenderCall::NativeFee { swap } => INativeFeeSpender::swapWithPermitCall {
                permit: PermitData {
                    user: permit.owner,
                    token: permit.token,
                    amount: permit.amount,
                    deadline,
                    v: sig.v,
                    r: sig.r,
                    s: sig.s,
                },
                swap: SwapParams {
                    minOut: swap.min_out,
                    deadline: swap.deadline.into(),
                },
                maxNativeFee: max_fee,
            }
            .abi_encode(),
        };
        Bytes::from(data)
    }
}
