//! EVM chain access for permit relaying.
//!
//! This module provides the read side of the chain: building an RPC provider
//! from configuration and querying the ERC-20 / ERC-2612 state a permit needs
//! (name, version, decimals, nonce, balance).
//!
//! # Key Types
//!
//! - [`Eip155ChainReference`] - A numeric chain ID for EVM networks (e.g., `8453` for Base)
//! - [`TokenReader`] - Chain-reading capability consumed by the permit builder
//! - [`ProviderTokenReader`] - [`TokenReader`] over any alloy provider
//! - [`FeeToken`] - Native-currency sentinel or ERC-20 fee token
//!
//! # Submodules
//!
//! - [`types`] - Wire format types like [`ChecksummedAddress`] and [`FeeToken`]
//! - [`erc20`] - `IERC20Permit` bindings and the [`TokenReader`] seam
//! - [`provider`] - RPC transport construction with throttling and fallback
//! - [`config`] - Private key parsing

pub mod config;
pub mod erc20;
pub mod provider;
pub mod types;

pub use erc20::*;
pub use provider::*;
pub use types::*;
