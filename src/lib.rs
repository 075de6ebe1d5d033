//! Gas-sponsored ERC-20 transfers through a relay network.
//!
//! A token holder signs an EIP-2612 permit off-chain. A relay network then
//! calls a spender contract that consumes the permit, moves the tokens and
//! pays the relay fee out of them (or out of native currency swapped from
//! them). The holder never pays gas.
//!
//! This crate re-exports the workspace members under one name:
//!
//! - [`types`] - Configuration primitives, timestamps, decimal amounts, known networks
//! - [`eip155`] - Token reads, permit construction and signing, spender calldata
//! - [`client`] - Relay HTTP client, fee buffering, retry, polling and the end-to-end flow
//!
//! The `permit-relay` binary in the `relayer` crate wires them to a command line.
//!
//! # Feature Flags
//!
//! - `telemetry` - Tracing spans and events in [`eip155`] and [`client`]

pub use permit_relay_client as client;
pub use permit_relay_eip155 as eip155;
pub use permit_relay_types as types;
