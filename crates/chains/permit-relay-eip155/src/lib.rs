//! EIP-155 (EVM) side of gas-sponsored permit transfers.
//!
//! This crate reads ERC-20 / ERC-2612 token state, signs EIP-2612 permits and
//! encodes the spender contract calls a relay network executes on the user's
//! behalf. It never sends a transaction itself.
//!
//! # Architecture
//!
//! - [`chain`] - Chain reference and address wire types, RPC read provider, token bindings
//! - [`permit`] - Permit construction ([`build_permit`])
//! - [`signature`] - Splitting 65-byte signatures into `(r, s, v)`
//! - [`contract`] - Spender call encodings ([`SpenderCall`])
//! - [`signer`] - The signing capability the permit builder consumes
//!
//! # Feature Flags
//!
//! - `telemetry` - Tracing spans and events
//!
//! # Usage
//!
//! ```ignore
//! use permit_relay_eip155::chain::{read_provider, ProviderTokenReader};
//! use permit_relay_eip155::{build_permit, PermitAmount, PermitRequest, SpenderCall};
//!
//! let reader = ProviderTokenReader::new(read_provider(&rpc)?);
//! let permit = build_permit(&signer, &reader, &request).await?;
//! let calldata = SpenderCall::TokenFee.encode(&permit, max_fee);
//! ```

pub mod chain;
pub mod contract;
pub mod permit;
pub mod signature;
pub mod signer;

pub use contract::{SpenderCall, SwapConfig};
pub use permit::{
    PermitAmount, PermitDomain, PermitError, PermitRequest, PermitSignature, TokenPermitMetadata,
    build_permit, fetch_token_metadata,
};
pub use signature::{SignatureCodecError, SplitSignature};
pub use signer::SignerLike;
