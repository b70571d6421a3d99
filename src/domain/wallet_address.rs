//! Normalized wallet identity.
//!
//! [`WalletAddress`] is the only representation of a wallet the rest of the
//! crate accepts. It is always `0x` followed by 40 lowercase hex digits, so
//! equality, hashing, and storage keys are case-insensitive by construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of bytes in an account address.
pub const ADDRESS_BYTES: usize = 20;

/// Returned when a string is not shaped like a 20-byte hex account address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid wallet address: {0:?}")]
pub struct InvalidWalletAddress(pub String);

/// A lowercase-normalized, `0x`-prefixed 20-byte account address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parses and normalizes an address.
    ///
    /// Accepts either `0x` or `0X`, any mix of hex digit case, and
    /// surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidWalletAddress`] if the input is not `0x` followed by
    /// exactly 40 hex digits.
    pub fn parse(raw: &str) -> Result<Self, InvalidWalletAddress> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| InvalidWalletAddress(raw.to_string()))?;

        if digits.len() != ADDRESS_BYTES * 2 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InvalidWalletAddress(raw.to_string()));
        }

        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// Builds an address from its raw 20 bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Returns the normalized string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = InvalidWalletAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = InvalidWalletAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}
