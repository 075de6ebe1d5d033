//! Relay side of gas-sponsored permit transfers.
//!
//! A relay network executes a spender contract call on the user's behalf and
//! is paid out of the call itself. This crate talks to such a network and
//! drives one transfer from a signed permit to an executed transaction.
//!
//! # Modules
//!
//! - [`relay`] - [`Relay`] seam and its HTTP implementation [`RelayClient`]
//! - [`submit`] - Fee estimation with a safety buffer, sponsored call submission
//! - [`poll`] - Fixed-interval task status polling
//! - [`retry`] - Bounded retry with a fixed delay
//! - [`flow`] - Validation, balance check, permit, submission and polling in one call
//! - [`types`] - Relay wire types
//!
//! # Feature Flags
//!
//! - `telemetry` - Tracing spans and events
//!
//! # Example
//!
//! ```ignore
//! use permit_relay_client::{RelayClient, SponsoredTransfer, TransferRequest};
//!
//! let relay = RelayClient::try_new(RelayClient::DEFAULT_BASE_URL, api_key)?;
//! let flow = SponsoredTransfer::new(signer, reader, relay);
//! let report = flow.execute(&request).await?;
//! println!("task {} -> {:?}", report.task_id, report.outcome);
//! ```

pub mod flow;
pub mod poll;
pub mod relay;
pub mod retry;
pub mod submit;
pub mod types;

pub use flow::{FlowError, FlowReport, SponsoredTransfer, TransferRequest, ValidationError, resume};
pub use poll::{PollConfig, PollOutcome, poll_task};
pub use relay::{Relay, RelayClient, RelayClientError};
pub use retry::{RetryPolicy, retry};
pub use submit::{SponsoredSubmitter, SubmitError, SubmitParams, max_fee};
pub use types::{SponsoredCallRequest, TaskId, TaskState, TaskStatus};
