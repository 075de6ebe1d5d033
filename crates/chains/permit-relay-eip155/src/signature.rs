//! Splitting 65-byte ECDSA signatures into ABI components.
//!
//! Spender contracts take a permit signature as three separate arguments
//! `(uint8 v, bytes32 r, bytes32 s)`. The byte layout of the concatenated form
//! is fixed: bytes `[0, 32)` are `r`, `[32, 64)` are `s`, byte `64` is `v`.
//!
//! `v` is passed through as-is; whether it is `27/28` or `0/1` is left to the
//! consuming contract. Input that is not exactly 65 bytes is rejected.

use alloy_primitives::{B256, Signature, hex};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Length of a concatenated `r ++ s ++ v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Errors raised while splitting a signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureCodecError {
    #[error("Signature must be {SIGNATURE_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
    #[error("Signature is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// A signature split into its ABI components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitSignature {
    pub r: B256,
    pub s: B256,
    pub v: u8,
}

impl SplitSignature {
    /// Splits a concatenated `r ++ s ++ v` signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureCodecError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureCodecError::InvalidLength(bytes.len()));
        }
        Ok(Self {
            r: B256::from_slice(&bytes[0..32]),
            s: B256::from_slice(&bytes[32..64]),
            v: bytes[64],
        })
    }

    /// Splits a hex-encoded signature, with or without a `0x` prefix.
    pub fn from_hex(input: &str) -> Result<Self, SignatureCodecError> {
        let stripped = input.strip_prefix("0x").unwrap_or(input);
        let bytes = hex::decode(stripped)?;
        Self::from_bytes(&bytes)
    }

    /// Reassembles the concatenated `r ++ s ++ v` form.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[0..32].copy_from_slice(self.r.as_slice());
        bytes[32..64].copy_from_slice(self.s.as_slice());
        bytes[64] = self.v;
        bytes
    }
}

impl From<&Signature> for SplitSignature {
    fn from(signature: &Signature) -> Self {
        let bytes = signature.as_bytes();
        Self {
            r: B256::from_slice(&bytes[0..32]),
            s: B256::from_slice(&bytes[32..64]),
            v: bytes[64],
        }
    }
}

impl FromStr for SplitSignature {
    type Err = SignatureCodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Display for SplitSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_bytes()))
    }
}
