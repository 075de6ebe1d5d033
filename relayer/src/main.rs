//! `permit-relay` command line entrypoint.
//!
//! Signs an EIP-2612 permit for an ERC-20 token and has a relay network
//! execute the spender contract call, paying its own gas out of the
//! transferred tokens (or out of native currency swapped from them). Then
//! polls the relay until the call settles.
//!
//! Modes:
//! - submit (default) - permit, fee estimate, submission, polling
//! - resume (`TASK_ID` set) - polling of an already submitted task
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `RUST_LOG` controls log verbosity
//! - `OTEL_*` variables enable span export (with the `telemetry` feature)
//!
//! Any error is printed and exits with code 1. A task still pending after
//! the last poll is reported and exits with code 0.

mod config;
mod run;
mod telemetry;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        println!("{e}");
        process::exit(1)
    }
}
