//! HTTP client for a Gelato-compatible relay network.
//!
//! [`RelayClient`] talks to three endpoints relative to a base URL:
//!
//! - `GET  oracles/{chainId}/estimate` - fee estimate in a payment token
//! - `POST relays/v2/call-with-sync-fee` - submit a sponsored call
//! - `GET  tasks/status/{taskId}` - status of a submitted call
//!
//! The [`Relay`] trait is the seam the submitter, the poller and the transfer
//! flow are generic over, so they can be exercised against in-memory relays.
//!
//! ## Example
//!
//! ```rust
//! use permit_relay_client::relay::RelayClient;
//! use permit_relay_types::config::ApiKey;
//!
//! let relay = RelayClient::try_new("https://api.gelato.digital", ApiKey::new("key")).unwrap();
//! assert_eq!(relay.base_url().as_str(), "https://api.gelato.digital/");
//! ```
//!
//! ## Error Handling
//!
//! [`RelayClientError`] captures the failure context:
//! - URL construction
//! - HTTP transport failures
//! - JSON deserialization errors
//! - Unexpected HTTP status responses

use alloy_primitives::U256;
use permit_relay_types::config::ApiKey;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::fmt::Display;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

use crate::types::{
    EstimateFeeResponse, FeeEstimateRequest, SponsoredCallRequest, SubmitResponse, TaskId,
    TaskStatus, TaskStatusResponse,
};

/// Operations of a relay network.
pub trait Relay {
    /// The error type returned by this relay.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Quotes the fee for executing a call of `gas_limit` gas, in the payment token's base units.
    fn estimate_fee(
        &self,
        request: &FeeEstimateRequest,
    ) -> impl Future<Output = Result<U256, Self::Error>> + Send;

    /// Submits a sponsored call and returns the task the relay created for it.
    fn submit(
        &self,
        request: &SponsoredCallRequest,
    ) -> impl Future<Output = Result<TaskId, Self::Error>> + Send;

    /// Reads the current status of a task.
    fn task_status(
        &self,
        task_id: &TaskId,
    ) -> impl Future<Output = Result<TaskStatus, Self::Error>> + Send;
}

impl<T: Relay + Sync> Relay for &T {
    type Error = T::Error;

    fn estimate_fee(
        &self,
        request: &FeeEstimateRequest,
    ) -> impl Future<Output = Result<U256, Self::Error>> + Send {
        (**self).estimate_fee(request)
    }

    fn submit(
        &self,
        request: &SponsoredCallRequest,
    ) -> impl Future<Output = Result<TaskId, Self::Error>> + Send {
        (**self).submit(request)
    }

    fn task_status(
        &self,
        task_id: &TaskId,
    ) -> impl Future<Output = Result<TaskStatus, Self::Error>> + Send {
        (**self).task_status(task_id)
    }
}

/// Errors that can occur while interacting with the relay network.
#[derive(Debug, thiserror::Error)]
pub enum RelayClientError {
    #[error("Relay API key is missing or empty")]
    MissingApiKey,
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        context: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Submission body: the call plus the sponsor credential.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    #[serde(flatten)]
    request: &'a SponsoredCallRequest,
    sponsor_api_key: &'a str,
}

/// A client for a remote relay network.
#[derive(Clone, Debug)]
pub struct RelayClient {
    /// Base URL of the relay API, always with a trailing slash
    base_url: Url,
    /// Full URL to `POST relays/v2/call-with-sync-fee`
    submit_url: Url,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Sponsor credential sent with every submission
    api_key: ApiKey,
}

impl RelayClient {
    /// Default relay API.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.gelato.digital";

    /// Constructs a client from a base URL and a sponsor credential.
    ///
    /// Trailing slashes of `base_url` are normalized so relative endpoint
    /// paths always resolve under it.
    pub fn try_new(base_url: &str, api_key: ApiKey) -> Result<Self, RelayClientError> {
        if api_key.is_empty() {
            return Err(RelayClientError::MissingApiKey);
        }
        let mut normalized = base_url.trim_end_matches('/').to_string();
        normalized.push('/');
        let base_url = Url::parse(&normalized).map_err(|e| RelayClientError::UrlParse {
            context: "Failed to parse base url",
            source: e,
        })?;
        let submit_url = base_url
            .join("relays/v2/call-with-sync-fee")
            .map_err(|e| RelayClientError::UrlParse {
                context: "Failed to construct relays/v2/call-with-sync-fee URL",
                source: e,
            })?;
        Ok(Self {
            base_url,
            submit_url,
            client: Client::new(),
            api_key,
        })
    }

    /// Returns the base URL used by this client.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn estimate_url(&self, request: &FeeEstimateRequest) -> Result<Url, RelayClientError> {
        let mut url = self
            .base_url
            .join(&format!("oracles/{}/estimate", request.chain_id))
            .map_err(|e| RelayClientError::UrlParse {
                context: "Failed to construct oracles/{chainId}/estimate URL",
                source: e,
            })?;
        url.query_pairs_mut()
            .append_pair("paymentToken", &request.payment_token.to_string())
            .append_pair("gasLimit", &request.gas_limit.to_string())
            .append_pair("isHighPriority", &request.high_priority.to_string());
        Ok(url)
    }

    fn status_url(&self, task_id: &TaskId) -> Result<Url, RelayClientError> {
        let mut url = self
            .base_url
            .join("tasks/status/")
            .map_err(|e| RelayClientError::UrlParse {
                context: "Failed to construct tasks/status URL",
                source: e,
            })?;
        // Pushed as a path segment so the id is percent-encoded.
        url.path_segments_mut()
            .map_err(|_| RelayClientError::UrlParse {
                context: "Relay base url cannot carry path segments",
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .push(task_id.as_str());
        Ok(url)
    }

    /// Sends a `GET oracles/{chainId}/estimate` request.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "relay_client.estimate_fee",
            skip_all,
            fields(chain_id = %request.chain_id, payment_token = %request.payment_token, otel.status_code, error.message),
            err
        )
    )]
    pub async fn estimate_fee(
        &self,
        request: &FeeEstimateRequest,
    ) -> Result<U256, RelayClientError> {
        let url = self.estimate_url(request)?;
        let response: EstimateFeeResponse = self.get_json(&url, "GET oracles/estimate").await?;
        Ok(response.estimated_fee)
    }

    /// Sends a `POST relays/v2/call-with-sync-fee` request.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "relay_client.submit",
            skip_all,
            fields(chain_id = %request.chain_id, target = %request.target, otel.status_code, error.message),
            err
        )
    )]
    pub async fn submit(&self, request: &SponsoredCallRequest) -> Result<TaskId, RelayClientError> {
        let body = SubmitBody {
            request,
            sponsor_api_key: self.api_key.expose(),
        };
        let response: SubmitResponse = self
            .post_json(&self.submit_url, "POST relays/v2/call-with-sync-fee", &body)
            .await?;
        Ok(response.task_id)
    }

    /// Sends a `GET tasks/status/{taskId}` request.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "relay_client.task_status",
            skip_all,
            fields(task_id = %task_id, otel.status_code, error.message),
            err
        )
    )]
    pub async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus, RelayClientError> {
        let url = self.status_url(task_id)?;
        let response: TaskStatusResponse = self.get_json(&url, "GET tasks/status").await?;
        Ok(response.task)
    }

    /// Generic POST helper that handles JSON serialization, error mapping
    /// and telemetry integration. Requests use the transport's default timeouts.
    ///
    /// `context` is a human-readable identifier used in tracing and error messages.
    async fn post_json<T, R>(
        &self,
        url: &Url,
        context: &'static str,
        payload: &T,
    ) -> Result<R, RelayClientError>
    where
        T: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let http_response = self
            .client
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| RelayClientError::Http { context, source: e })?;
        let result = Self::read_json(http_response, context).await;
        record_result_on_span(&result);
        result
    }

    /// Generic GET helper, see [`Self::post_json`].
    async fn get_json<R>(&self, url: &Url, context: &'static str) -> Result<R, RelayClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        let http_response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RelayClientError::Http { context, source: e })?;
        let result = Self::read_json(http_response, context).await;
        record_result_on_span(&result);
        result
    }

    async fn read_json<R>(
        http_response: reqwest::Response,
        context: &'static str,
    ) -> Result<R, RelayClientError>
    where
        R: serde::de::DeserializeOwned,
    {
        if http_response.status() == StatusCode::OK {
            http_response
                .json::<R>()
                .await
                .map_err(|e| RelayClientError::JsonDeserialization { context, source: e })
        } else {
            let status = http_response.status();
            let body = http_response
                .text()
                .await
                .map_err(|e| RelayClientError::ResponseBodyRead { context, source: e })?;
            Err(RelayClientError::HttpStatus {
                context,
                status,
                body,
            })
        }
    }
}

impl Relay for RelayClient {
    type Error = RelayClientError;

    async fn estimate_fee(&self, request: &FeeEstimateRequest) -> Result<U256, Self::Error> {
        RelayClient::estimate_fee(self, request).await
    }

    async fn submit(&self, request: &SponsoredCallRequest) -> Result<TaskId, Self::Error> {
        RelayClient::submit(self, request).await
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus, Self::Error> {
        RelayClient::task_status(self, task_id).await
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
        }
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskState;
    use alloy_primitives::{Bytes, U256, address};
    use permit_relay_eip155::chain::FeeToken;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USDC: alloy_primitives::Address = address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e");

    fn client(server: &MockServer) -> RelayClient {
        RelayClient::try_new(&server.uri(), ApiKey::new("sponsor-key")).unwrap()
    }

    fn call_request() -> SponsoredCallRequest {
        SponsoredCallRequest {
            chain_id: 84532.into(),
            target: address!("0x5FbDB2315678afecb367f032d93F642f64180aa3").into(),
            data: Bytes::from_static(&[0x01, 0x02]),
            fee_token: FeeToken::Erc20(USDC),
            is_relay_context: true,
            gas_limit: U256::from(300_000u64),
        }
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let result = RelayClient::try_new(RelayClient::DEFAULT_BASE_URL, ApiKey::new("  "));
        assert!(matches!(result, Err(RelayClientError::MissingApiKey)));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let relay = RelayClient::try_new("https://relay.example/api///", ApiKey::new("k")).unwrap();
        assert_eq!(relay.base_url().as_str(), "https://relay.example/api/");
        assert_eq!(
            relay.submit_url.as_str(),
            "https://relay.example/api/relays/v2/call-with-sync-fee"
        );
    }

    #[test]
    fn test_status_url_encodes_task_id() {
        let relay = RelayClient::try_new("https://relay.example", ApiKey::new("k")).unwrap();
        let url = relay.status_url(&TaskId::new("a/b")).unwrap();
        assert_eq!(url.as_str(), "https://relay.example/tasks/status/a%2Fb");
    }

    #[tokio::test]
    async fn test_estimate_fee() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oracles/84532/estimate"))
            .and(query_param(
                "paymentToken",
                "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            ))
            .and(query_param("gasLimit", "300000"))
            .and(query_param("isHighPriority", "false"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"estimatedFee": "123456"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fee = client(&server)
            .estimate_fee(&FeeEstimateRequest {
                chain_id: 84532.into(),
                payment_token: FeeToken::Erc20(USDC),
                gas_limit: 300_000,
                high_priority: false,
            })
            .await
            .unwrap();
        assert_eq!(fee, U256::from(123_456u64));
    }

    #[tokio::test]
    async fn test_submit_sends_sponsor_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/relays/v2/call-with-sync-fee"))
            .and(body_json(json!({
                "chainId": 84532,
                "target": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
                "data": "0x0102",
                "feeToken": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
                "isRelayContext": true,
                "gasLimit": "300000",
                "sponsorApiKey": "sponsor-key"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"taskId": "0xtask"})))
            .expect(1)
            .mount(&server)
            .await;

        let task_id = client(&server).submit(&call_request()).await.unwrap();
        assert_eq!(task_id, TaskId::new("0xtask"));
    }

    #[tokio::test]
    async fn test_submit_rejection_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/relays/v2/call-with-sync-fee"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"message":"Invalid sponsorApiKey"}"#),
            )
            .mount(&server)
            .await;

        let err = client(&server).submit(&call_request()).await.unwrap_err();
        match err {
            RelayClientError::HttpStatus { status, body, .. } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("Invalid sponsorApiKey"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_task_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/status/0xtask"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task": {
                    "chainId": 84532,
                    "taskId": "0xtask",
                    "taskState": "WaitingForConfirmation",
                    "lastCheckMessage": "waiting"
                }
            })))
            .mount(&server)
            .await;

        let status = client(&server)
            .task_status(&TaskId::new("0xtask"))
            .await
            .unwrap();
        assert_eq!(status.task_state, TaskState::WaitingForConfirmation);
        assert_eq!(status.last_check_message.as_deref(), Some("waiting"));
        assert!(!status.is_terminal());
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_deserialization_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/status/0xtask"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server)
            .task_status(&TaskId::new("0xtask"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayClientError::JsonDeserialization { .. }));
    }
}
