//! Unix timestamps for permit and swap deadlines.
//!
//! EIP-2612 permits carry a `deadline` after which the token contract rejects
//! the signature. The native-fee spender additionally takes a swap deadline.
//! Both travel on-chain as `uint256` seconds and off-chain as decimal strings.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::SystemTime;

/// Seconds since the Unix epoch.
///
/// Serialized as a decimal string, e.g. `"1699999999"`.
///
/// ```
/// use permit_relay_types::timestamp::UnixTimestamp;
///
/// let deadline = UnixTimestamp::from_secs(1_700_000_000) + 3600;
/// assert_eq!(deadline.as_secs(), 1_700_003_600);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct UnixTimestamp(u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("timestamp must be a non-negative integer, got {0:?}")]
pub struct TimestampParseError(String);

impl TryFrom<String> for UnixTimestamp {
    type Error = TimestampParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.parse::<u64>() {
            Ok(secs) => Ok(Self(secs)),
            Err(_) => Err(TimestampParseError(value)),
        }
    }
}

impl From<UnixTimestamp> for String {
    fn from(value: UnixTimestamp) -> Self {
        value.0.to_string()
    }
}

impl From<UnixTimestamp> for U256 {
    fn from(value: UnixTimestamp) -> Self {
        U256::from(value.0)
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        UnixTimestamp(self.0.saturating_add(rhs))
    }
}

impl UnixTimestamp {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Current system time. A clock set before the epoch reads as `0`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Self(secs)
    }

    /// `secs` seconds from now.
    pub fn in_secs(secs: u64) -> Self {
        Self::now() + secs
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}
