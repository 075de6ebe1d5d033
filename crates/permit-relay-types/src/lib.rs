#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types shared by the permit relay crates.
//!
//! This crate is chain-agnostic in spirit: it holds the pieces that both the
//! EVM side (permit construction, ABI encoding) and the relay side (fee
//! estimation, submission, status polling) need to agree on.
//!
//! # Modules
//!
//! - [`config`] - RPC endpoint configuration and environment variable resolution
//! - [`networks`] - Registry of well-known EVM networks and their block explorers
//! - [`timestamp`] - Unix timestamp utilities for permit deadlines
//! - [`util`] - Helper types (human-readable decimal amounts)

pub mod config;
pub mod networks;
pub mod timestamp;
pub mod util;
