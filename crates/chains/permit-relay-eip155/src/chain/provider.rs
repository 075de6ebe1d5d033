use alloy_provider::RootProvider;
use alloy_rpc_client::RpcClient;
use alloy_transport::layers::{FallbackLayer, ThrottleLayer};
use alloy_transport_http::Http;
use permit_relay_types::config::RpcConfig;
use std::num::NonZeroUsize;
use tower::ServiceBuilder;

/// Read-only provider used for token metadata and balance queries.
///
/// Permit construction never sends a transaction itself: the relay network
/// does that. So no wallet or nonce fillers are stacked on top of the
/// [`RootProvider`].
pub type ReadProvider = RootProvider;

/// Errors raised while wiring RPC transports.
#[derive(Debug, thiserror::Error)]
pub enum ProviderBuildError {
    #[error("No HTTP RPC endpoint configured")]
    NoHttpEndpoint,
}

/// Builds an RPC client over every configured HTTP(S) endpoint.
///
/// Each endpoint is wrapped into a [`ThrottleLayer`] honoring its rate limit,
/// and all of them sit behind a [`FallbackLayer`] that routes around failing
/// endpoints.
pub fn rpc_client(rpc: &[RpcConfig]) -> Result<RpcClient, ProviderBuildError> {
    let transports = rpc
        .iter()
        .filter_map(|provider_config| {
            let scheme = provider_config.http.scheme();
            let is_http = scheme == "http" || scheme == "https";
            if !is_http {
                #[cfg(feature = "telemetry")]
                tracing::warn!(rpc_url=%provider_config.http, "Skipping non-HTTP RPC endpoint");
                return None;
            }
            let rpc_url = provider_config.http.clone();
            #[cfg(feature = "telemetry")]
            tracing::debug!(rpc_url=%rpc_url, rate_limit=?provider_config.rate_limit, "Using HTTP transport");
            let rate_limit = provider_config.rate_limit.unwrap_or(u32::MAX);
            let service = ServiceBuilder::new()
                .layer(ThrottleLayer::new(rate_limit))
                .service(Http::new(rpc_url));
            Some(service)
        })
        .collect::<Vec<_>>();
    let transport_count =
        NonZeroUsize::new(transports.len()).ok_or(ProviderBuildError::NoHttpEndpoint)?;
    let fallback = ServiceBuilder::new()
        .layer(FallbackLayer::default().with_active_transport_count(transport_count))
        .service(transports);
    Ok(RpcClient::new(fallback, false))
}

/// Builds a [`ReadProvider`] over the configured RPC endpoints.
pub fn read_provider(rpc: &[RpcConfig]) -> Result<ReadProvider, ProviderBuildError> {
    let client = rpc_client(rpc)?;
    Ok(RootProvider::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_endpoints() {
        assert!(matches!(
            rpc_client(&[]),
            Err(ProviderBuildError::NoHttpEndpoint)
        ));
    }

    #[test]
    fn test_non_http_endpoints_are_skipped() {
        let ws = RpcConfig::new("ws://localhost:8546".parse().unwrap());
        assert!(matches!(
            rpc_client(&[ws]),
            Err(ProviderBuildError::NoHttpEndpoint)
        ));
    }

    #[tokio::test]
    async fn test_http_endpoint_builds() {
        let http = RpcConfig::new("http://localhost:8545".parse().unwrap()).with_rate_limit(Some(5));
        assert!(read_provider(&[http]).is_ok());
    }
}
