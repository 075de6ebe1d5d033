//! Configuration types shared across the permit relay crates.
//!
//! This module provides RPC provider configuration and a wrapper that resolves
//! environment variable references, so that secrets such as private keys and
//! relay API credentials never have to be written down literally:
//!
//! ```text
//! PRIVATE_KEY=0xcafe...             # literal value
//! PRIVATE_KEY='$HOT_WALLET_KEY'     # simple env var reference
//! RELAY_API_KEY='${SPONSOR_KEY}'    # braced env var reference
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;
use url::Url;

/// RPC provider configuration for a single endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcConfig {
    /// HTTP URL for the RPC endpoint.
    pub http: Url,
    /// Rate limit for requests per second (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
}

impl RpcConfig {
    pub fn new(http: Url) -> Self {
        Self {
            http,
            rate_limit: None,
        }
    }

    pub fn with_rate_limit(mut self, rate_limit: Option<u32>) -> Self {
        self.rate_limit = rate_limit;
        self
    }
}

/// Error returned when a [`LiteralOrEnv`] value cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralOrEnvError {
    /// The referenced environment variable is not set.
    #[error("Environment variable '{var}' not found (referenced as '{reference}')")]
    MissingVar { var: String, reference: String },
    /// The (resolved) value could not be parsed.
    #[error("Failed to parse value: {0}")]
    Parse(String),
}

/// A transparent wrapper that resolves environment variables while parsing.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"0xcafe..."`
/// - Simple env var: `"$PRIVATE_KEY"`
/// - Braced env var: `"${PRIVATE_KEY}"`
///
/// Works both as a [`FromStr`] target (command line flags) and during serde
/// deserialization. The wrapper implements `Deref` to the inner type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    /// Get a reference to the inner value
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Returns the variable name if the string matches `$VAR` or `${VAR}` syntax.
    fn parse_env_var_syntax(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
            Some(braced)
        } else if let Some(var_name) = s.strip_prefix('$') {
            let is_identifier = !var_name.is_empty()
                && var_name.chars().all(|c| c.is_alphanumeric() || c == '_');
            is_identifier.then_some(var_name)
        } else {
            None
        }
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> FromStr for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: Display,
{
    type Err = LiteralOrEnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = match Self::parse_env_var_syntax(s) {
            Some(var_name) => {
                std::env::var(var_name).map_err(|_| LiteralOrEnvError::MissingVar {
                    var: var_name.to_string(),
                    reference: s.to_string(),
                })?
            }
            None => s.to_string(),
        };
        let parsed = value
            .parse::<T>()
            .map_err(|e| LiteralOrEnvError::Parse(e.to_string()))?;
        Ok(LiteralOrEnv(parsed))
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// A secret string that never prints its value.
///
/// Used for relay API credentials: `Debug` and `Display` are redacted so the
/// key does not leak through tracing fields or error messages.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl FromStr for ApiKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl Display for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_value() {
        let value: LiteralOrEnv<u64> = "42".parse().unwrap();
        assert_eq!(*value, 42);
    }

    #[test]
    fn test_simple_env_var() {
        // SAFETY: test-local variable name, not read by other tests.
        unsafe { std::env::set_var("PERMIT_RELAY_TEST_SIMPLE", "7") };
        let value: LiteralOrEnv<u64> = "$PERMIT_RELAY_TEST_SIMPLE".parse().unwrap();
        assert_eq!(value.into_inner(), 7);
    }

    #[test]
    fn test_braced_env_var() {
        // SAFETY: test-local variable name, not read by other tests.
        unsafe { std::env::set_var("PERMIT_RELAY_TEST_BRACED", "hello") };
        let value: LiteralOrEnv<String> = "${PERMIT_RELAY_TEST_BRACED}".parse().unwrap();
        assert_eq!(value.inner(), "hello");
    }

    #[test]
    fn test_missing_env_var() {
        let result = "$PERMIT_RELAY_TEST_DEFINITELY_UNSET".parse::<LiteralOrEnv<String>>();
        assert!(matches!(
            result,
            Err(LiteralOrEnvError::MissingVar { ref var, .. }) if var == "PERMIT_RELAY_TEST_DEFINITELY_UNSET"
        ));
    }

    #[test]
    fn test_dollar_amount_is_literal() {
        // Not an identifier after `$`, so this stays a literal.
        let value: LiteralOrEnv<String> = "$1.50".parse().unwrap();
        assert_eq!(value.inner(), "$1.50");
    }

    #[test]
    fn test_deserialize_resolves_env() {
        // SAFETY: test-local variable name, not read by other tests.
        unsafe { std::env::set_var("PERMIT_RELAY_TEST_SERDE", "99") };
        let value: LiteralOrEnv<u32> =
            serde_json::from_str("\"$PERMIT_RELAY_TEST_SERDE\"").unwrap();
        assert_eq!(*value, 99);
    }

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::new("super-secret");
        assert_eq!(format!("{key}"), "***");
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
        assert_eq!(key.expose(), "super-secret");
    }

    #[test]
    fn test_api_key_empty() {
        assert!(ApiKey::new("  ").is_empty());
        assert!(!ApiKey::new("k").is_empty());
    }
}
