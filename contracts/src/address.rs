//! # Addresses
//!
//! Every participant in an escrow (seller, buyer, inspector, lender, the
//! escrow holder itself and the property registry) is identified by a
//! 20-byte [`Address`], rendered as `0x`-prefixed lowercase hex.
//!
//! The escrow holder's address is not chosen by anyone: it is derived from
//! the registry and the three fixed roles, so the same deployment always
//! lands on the same address.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length of an address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Domain separator mixed into escrow holder address derivation.
const ESCROW_ADDRESS_DOMAIN: &[u8] = b"estate-escrow";

/// Errors produced when parsing an address from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The input is not valid hex.
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),

    /// The decoded input is not exactly 20 bytes.
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// A 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The zero address. Unlisted properties report it as their buyer.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Wraps raw bytes as an address.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Returns `true` for the zero address.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Derives an address from an arbitrary label by hashing it.
    ///
    /// Handy for fixtures and devnet accounts: `Address::from_label("seller")`
    /// is stable across runs.
    pub fn from_label(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        Self::from_digest(&digest)
    }

    /// Derives the escrow holder address for a deployment.
    ///
    /// Computed as the last 20 bytes of
    /// `SHA-256("estate-escrow" || registry || seller || inspector || lender)`.
    pub fn escrow_holder(
        registry: &Address,
        seller: &Address,
        inspector: &Address,
        lender: &Address,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(ESCROW_ADDRESS_DOMAIN);
        hasher.update(registry.as_bytes());
        hasher.update(seller.as_bytes());
        hasher.update(inspector.as_bytes());
        hasher.update(lender.as_bytes());
        Self::from_digest(&hasher.finalize())
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest[digest.len() - ADDRESS_LENGTH..]);
        Self(bytes)
    }

    /// Shortened form for log lines and UIs, e.g. `0x7099...79c8`.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let stripped = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let bytes = hex::decode(stripped).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        let mut out = [0u8; ADDRESS_LENGTH];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
