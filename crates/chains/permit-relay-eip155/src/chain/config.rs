use alloy_primitives::B256;
use alloy_signer_local::PrivateKeySigner;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;

/// A validated EVM private key (32 bytes).
///
/// Accepts a 0x-prefixed (or bare) hex string. Combine with
/// [`LiteralOrEnv`](permit_relay_types::config::LiteralOrEnv) to read the key
/// from an environment variable reference such as `$HOT_WALLET_KEY`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EvmPrivateKey(B256);

impl EvmPrivateKey {
    /// Builds a local signer from this key, bound to `chain_id` when given.
    pub fn signer(&self, chain_id: Option<u64>) -> Result<PrivateKeySigner, alloy_signer::Error> {
        let signer = PrivateKeySigner::from_bytes(&self.0)?;
        Ok(alloy_signer::Signer::with_chain_id(signer, chain_id))
    }
}

impl Debug for EvmPrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("EvmPrivateKey(***)")
    }
}

impl FromStr for EvmPrivateKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        B256::from_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid evm private key: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_parse_and_derive_address() {
        let key: EvmPrivateKey = KEY.parse().unwrap();
        let signer = key.signer(Some(1)).unwrap();
        assert_eq!(
            signer.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_debug_is_redacted() {
        let key: EvmPrivateKey = KEY.parse().unwrap();
        assert_eq!(format!("{key:?}"), "EvmPrivateKey(***)");
    }

    #[test]
    fn test_invalid_key() {
        assert!("0x1234".parse::<EvmPrivateKey>().is_err());
    }
}
