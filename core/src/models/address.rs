//! Account addresses
//!
//! Addresses are fixed-width so that an address used as an index path segment
//! can never be a prefix of another address.

use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StarnameError};

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 20;

/// Ledger account address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The "no owner" sentinel used by domains without an administrator
    pub const NONE: Address = Address([0; ADDRESS_LEN]);

    /// Create an address from its raw bytes
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Address(bytes)
    }

    /// Create an address from a slice, which must be exactly [`ADDRESS_LEN`] long
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            StarnameError::InvalidOwner(format!(
                "address must be {} bytes, got {}",
                ADDRESS_LEN,
                bytes.len()
            ))
        })?;
        Ok(Address(raw))
    }

    /// Raw bytes of the address
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether this is the "no owner" sentinel
    pub fn is_none(&self) -> bool {
        self.0 == [0; ADDRESS_LEN]
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = StarnameError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|e| StarnameError::InvalidOwner(format!("{}: {}", s, e)))?;
        Address::from_slice(&bytes)
    }
}
