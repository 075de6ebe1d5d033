//! Wire types exchanged with the relay network.
//!
//! All JSON bodies use camelCase field names. Large integers (fees, gas
//! limits) travel as decimal strings.

use alloy_primitives::{Bytes, U256};
use permit_relay_eip155::chain::{ChecksummedAddress, Eip155ChainReference, FeeToken, decimal_u256};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque identifier the relay network assigns to a submitted call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Inputs of a relay fee estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimateRequest {
    pub chain_id: Eip155ChainReference,
    /// Token the fee is quoted in.
    pub payment_token: FeeToken,
    pub gas_limit: u64,
    pub high_priority: bool,
}

/// A sponsored call whose execution fee is paid synchronously by the target
/// contract out of the relayed context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredCallRequest {
    pub chain_id: Eip155ChainReference,
    /// Contract the relay network calls.
    pub target: ChecksummedAddress,
    /// ABI-encoded call data.
    pub data: Bytes,
    pub fee_token: FeeToken,
    /// Always `true`: the fee is taken from the relay context appended to the call.
    pub is_relay_context: bool,
    /// Gas limit hint for the relayed execution.
    #[serde(with = "decimal_u256")]
    pub gas_limit: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateFeeResponse {
    #[serde(with = "decimal_u256")]
    pub estimated_fee: U256,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub task_id: TaskId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub task: TaskStatus,
}

/// State of a relay task.
///
/// Unknown values reported by the relay network are kept verbatim in
/// [`TaskState::Other`] and treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskState {
    CheckPending,
    ExecPending,
    WaitingForConfirmation,
    ExecSuccess,
    ExecReverted,
    Cancelled,
    Blacklisted,
    NotFound,
    Reverted,
    CancelledByUser,
    Other(String),
}

impl TaskState {
    /// Whether no further state transition is expected.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::ExecSuccess
                | TaskState::ExecReverted
                | TaskState::Cancelled
                | TaskState::Blacklisted
                | TaskState::NotFound
                | TaskState::Reverted
                | TaskState::CancelledByUser
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskState::CheckPending => "CheckPending",
            TaskState::ExecPending => "ExecPending",
            TaskState::WaitingForConfirmation => "WaitingForConfirmation",
            TaskState::ExecSuccess => "ExecSuccess",
            TaskState::ExecReverted => "ExecReverted",
            TaskState::Cancelled => "Cancelled",
            TaskState::Blacklisted => "Blacklisted",
            TaskState::NotFound => "NotFound",
            TaskState::Reverted => "Reverted",
            TaskState::CancelledByUser => "CancelledByUser",
            TaskState::Other(other) => other.as_str(),
        }
    }
}

impl From<String> for TaskState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CheckPending" => TaskState::CheckPending,
            "ExecPending" => TaskState::ExecPending,
            "WaitingForConfirmation" => TaskState::WaitingForConfirmation,
            "ExecSuccess" => TaskState::ExecSuccess,
            "ExecReverted" => TaskState::ExecReverted,
            "Cancelled" => TaskState::Cancelled,
            "Blacklisted" => TaskState::Blacklisted,
            "NotFound" => TaskState::NotFound,
            "Reverted" => TaskState::Reverted,
            "CancelledByUser" => TaskState::CancelledByUser,
            _ => TaskState::Other(value),
        }
    }
}

impl From<TaskState> for String {
    fn from(value: TaskState) -> Self {
        match value {
            TaskState::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for TaskState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote execution record of a relay task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<Eip155ChainReference>,
    pub task_id: TaskId,
    pub task_state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_message: Option<String>,
}

impl TaskStatus {
    /// Non-empty transaction hash, if the relay has broadcast the call.
    pub fn transaction_hash(&self) -> Option<&str> {
        self.transaction_hash
            .as_deref()
            .filter(|hash| !hash.is_empty())
    }

    /// A transaction hash ends polling regardless of the reported state.
    pub fn is_terminal(&self) -> bool {
        self.transaction_hash().is_some() || self.task_state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use serde_json::json;

    #[test]
    fn test_sponsored_call_request_wire_format() {
        let request = SponsoredCallRequest {
            chain_id: 84532.into(),
            target: address!("0x5FbDB2315678afecb367f032d93F642f64180aa3").into(),
            data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
            fee_token: FeeToken::Native,
            is_relay_context: true,
            gas_limit: U256::from(300_000u64),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "chainId": 84532,
                "target": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "data": "0xdeadbeef",
                "feeToken": "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE",
                "isRelayContext": true,
                "gasLimit": "300000"
            })
        );
    }

    #[test]
    fn test_task_status_parses_relay_response() {
        let body = json!({
            "task": {
                "chainId": 11155111,
                "taskId": "0x93a3defc618ff97c32a37bdd567b15c50748c5c3e8e858bca67f0c967b74a7fe",
                "taskState": "ExecSuccess",
                "creationDate": "2024-05-01T10:00:00.000Z",
                "executionDate": "2024-05-01T10:00:12.000Z",
                "transactionHash": "0xabc",
                "blockNumber": 5829301
            }
        });
        let response: TaskStatusResponse = serde_json::from_value(body).unwrap();
        let task = response.task;
        assert_eq!(task.chain_id, Some(11155111.into()));
        assert_eq!(task.task_state, TaskState::ExecSuccess);
        assert_eq!(task.block_number, Some(5829301));
        assert_eq!(task.transaction_hash(), Some("0xabc"));
        assert!(task.last_check_message.is_none());
    }

    #[test]
    fn test_unknown_state_is_kept_and_not_terminal() {
        let state: TaskState = serde_json::from_value(json!("Queued")).unwrap();
        assert_eq!(state, TaskState::Other("Queued".to_string()));
        assert!(!state.is_terminal());
        assert_eq!(serde_json::to_value(&state).unwrap(), json!("Queued"));
    }

    #[test]
    fn test_terminal_vocabulary() {
        let terminal = [
            "ExecSuccess",
            "ExecReverted",
            "Cancelled",
            "Blacklisted",
            "NotFound",
            "Reverted",
            "CancelledByUser",
        ];
        for state in terminal {
            assert!(TaskState::from(state.to_string()).is_terminal(), "{state}");
        }
        for state in ["CheckPending", "ExecPending", "WaitingForConfirmation"] {
            assert!(!TaskState::from(state.to_string()).is_terminal(), "{state}");
        }
    }

    #[test]
    fn test_transaction_hash_short_circuits_state() {
        let status = TaskStatus {
            chain_id: None,
            task_id: TaskId::new("t-1"),
            task_state: TaskState::CheckPending,
            creation_date: None,
            execution_date: None,
            transaction_hash: Some("0xabc".to_string()),
            block_number: None,
            last_check_message: None,
        };
        assert!(status.is_terminal());

        let empty_hash = TaskStatus {
            transaction_hash: Some(String::new()),
            ..status
        };
        assert!(!empty_hash.is_terminal());
    }
}
