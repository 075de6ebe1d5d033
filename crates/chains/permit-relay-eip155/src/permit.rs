//! EIP-2612 permit construction.
//!
//! [`build_permit`] reads the token's EIP-712 domain state fresh from chain,
//! signs a `Permit(owner, spender, value, nonce, deadline)` message with the
//! injected signer and returns a [`PermitSignature`] ready to be ABI-encoded
//! into a spender call.
//!
//! # Steps
//!
//! 1. Read `name()`, `version()`, `decimals()`, `nonces(owner)` and the chain id
//!    concurrently. A failing `version()` read falls back to `"1"`: tokens that
//!    predate the method use that version in their domain.
//! 2. Scale the requested amount to base units if it was given in decimal form.
//! 3. Build the domain `{name, version, chainId, verifyingContract: token}` and
//!    sign the permit digest.
//! 4. Split the signature into `(v, r, s)`.
//!
//! No retry happens here; a failed read or signature propagates to the caller.
//!
//! ```ignore
//! use permit_relay_eip155::permit::{build_permit, PermitAmount, PermitRequest};
//!
//! let permit = build_permit(&signer, &reader, &PermitRequest {
//!     owner: signer.address(),
//!     token,
//!     spender,
//!     amount: PermitAmount::Decimal("100.0".parse()?),
//!     deadline: UnixTimestamp::in_secs(3600),
//! }).await?;
//! ```

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain, sol};
use permit_relay_types::timestamp::UnixTimestamp;
use permit_relay_types::util::{DecimalAmount, DecimalAmountError};
use serde::{Deserialize, Serialize};

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::chain::{TokenReadError, TokenReader};
use crate::signature::SplitSignature;
use crate::signer::SignerLike;

/// Domain version assumed for tokens without a `version()` method.
pub const DEFAULT_PERMIT_VERSION: &str = "1";

sol! {
    /// EIP-2612 permit message.
    #[derive(Debug)]
    struct Permit {
        address owner;
        address spender;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }
}

/// Snapshot of a token's permit domain state.
///
/// Always read fresh before signing: a cached nonce would produce a permit the
/// token rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPermitMetadata {
    pub name: String,
    pub version: String,
    pub decimals: u8,
    pub nonce: U256,
}

/// The EIP-712 domain a permit was signed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl PermitDomain {
    pub fn eip712(&self) -> Eip712Domain {
        eip712_domain! {
            name: self.name.clone(),
            version: self.version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self.verifying_contract,
        }
    }
}

/// The amount a permit should authorize.
#[derive(Debug, Clone, PartialEq)]
pub enum PermitAmount {
    /// Already scaled to the token's base units.
    BaseUnits(U256),
    /// Human-readable amount, scaled with the token's `decimals()`.
    Decimal(DecimalAmount),
}

impl PermitAmount {
    pub fn to_base_units(&self, decimals: u8) -> Result<U256, DecimalAmountError> {
        match self {
            PermitAmount::BaseUnits(value) => Ok(*value),
            PermitAmount::Decimal(amount) => amount.to_base_units(decimals),
        }
    }
}

/// Inputs of a permit construction.
#[derive(Debug, Clone)]
pub struct PermitRequest {
    /// Token holder; must be the signer's address.
    pub owner: Address,
    /// ERC-2612 token contract.
    pub token: Address,
    /// Contract allowed to move the tokens.
    pub spender: Address,
    pub amount: PermitAmount,
    pub deadline: UnixTimestamp,
}

/// A signed authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitSignature {
    pub owner: Address,
    pub spender: Address,
    pub token: Address,
    pub amount: U256,
    pub nonce: U256,
    pub deadline: UnixTimestamp,
    pub decimals: u8,
    pub domain: PermitDomain,
    pub signature: SplitSignature,
}

impl PermitSignature {
    /// The permit message this signature covers.
    pub fn message(&self) -> Permit {
        Permit {
            owner: self.owner,
            spender: self.spender,
            value: self.amount,
            nonce: self.nonce,
            deadline: self.deadline.into(),
        }
    }

    /// The EIP-712 digest that was signed.
    pub fn signing_hash(&self) -> B256 {
        self.message().eip712_signing_hash(&self.domain.eip712())
    }
}

/// Errors raised while building a permit.
#[derive(Debug, thiserror::Error)]
pub enum PermitError {
    #[error("Failed to read token state: {0}")]
    ChainRead(#[from] TokenReadError),
    #[error("Invalid permit amount: {0}")]
    Amount(#[from] DecimalAmountError),
    #[error("Permit owner {owner} does not match signer {signer}")]
    OwnerMismatch { owner: Address, signer: Address },
    #[error("Signer failed to sign permit: {0}")]
    Signing(#[source] alloy_signer::Error),
}

/// Reads the permit domain state of `token` for `owner`.
///
/// The four reads are independent and issued concurrently. Only `version()`
/// may fail without failing the whole read.
pub async fn fetch_token_metadata<R>(
    reader: &R,
    token: Address,
    owner: Address,
) -> Result<TokenPermitMetadata, TokenReadError>
where
    R: TokenReader + Sync,
{
    let (name, version, decimals, nonce) = tokio::join!(
        reader.name(token),
        reader.version(token),
        reader.decimals(token),
        reader.nonces(token, owner),
    );
    let version = match version {
        Ok(version) => version,
        Err(_err) => {
            #[cfg(feature = "telemetry")]
            tracing::debug!(%token, error = %_err, "version() unavailable, using default permit version");
            DEFAULT_PERMIT_VERSION.to_string()
        }
    };
    Ok(TokenPermitMetadata {
        name: name?,
        version,
        decimals: decimals?,
        nonce: nonce?,
    })
}

/// Builds and signs an EIP-2612 permit.
#[cfg_attr(
    feature = "telemetry",
    instrument(name = "permit.build", skip_all, fields(token = %request.token, spender = %request.spender), err)
)]
pub async fn build_permit<S, R>(
    signer: &S,
    reader: &R,
    request: &PermitRequest,
) -> Result<PermitSignature, PermitError>
where
    S: SignerLike + Sync,
    R: TokenReader + Sync,
{
    let signer_address = signer.address();
    if signer_address != request.owner {
        return Err(PermitError::OwnerMismatch {
            owner: request.owner,
            signer: signer_address,
        });
    }

    let (chain_id, metadata) = tokio::join!(
        reader.chain_id(),
        fetch_token_metadata(reader, request.token, request.owner)
    );
    let chain_id = chain_id?;
    let metadata = metadata?;

    let amount = request.amount.to_base_units(metadata.decimals)?;

    let domain = PermitDomain {
        name: metadata.name,
        version: metadata.version,
        chain_id,
        verifying_contract: request.token,
    };
    let permit = Permit {
        owner: request.owner,
        spender: request.spender,
        value: amount,
        nonce: metadata.nonce,
        deadline: request.deadline.into(),
    };
    let eip712_hash = permit.eip712_signing_hash(&domain.eip712());
    let signature = signer
        .sign_hash(&eip712_hash)
        .await
        .map_err(PermitError::Signing)?;

    #[cfg(feature = "telemetry")]
    tracing::info!(
        owner = %request.owner,
        nonce = %metadata.nonce,
        amount = %amount,
        deadline = %request.deadline,
        "Permit signed"
    );

    Ok(PermitSignature {
        owner: request.owner,
        spender: request.spender,
        token: request.token,
        amount,
        nonce: metadata.nonce,
        deadline: request.deadline,
        decimals: metadata.decimals,
        domain,
        signature: SplitSignature::from(&signature),
    })
}
