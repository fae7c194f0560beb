//! Account records

use serde::{Deserialize, Serialize};

use super::address::Address;
use super::context::Context;

/// Expiry used by accounts that practically never expire
///
/// 9999-12-31T23:59:59Z.
pub const NEVER_EXPIRES: i64 = 253_402_300_799;

/// A blockchain resolution target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockchainAddress {
    /// Blockchain identifier
    pub id: String,

    /// Address on that blockchain
    pub address: String,
}

impl BlockchainAddress {
    /// Create a target
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        BlockchainAddress {
            id: id.into(),
            address: address.into(),
        }
    }
}

/// A named entry under a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Name of the parent domain
    pub domain: String,

    /// Account name; empty for the root account of the domain
    pub name: String,

    /// Owner address
    pub owner: Address,

    /// Expiry as unix seconds
    pub valid_until: i64,

    /// Resolution targets, unique by blockchain id
    pub targets: Vec<BlockchainAddress>,

    /// Opaque certificates, unique
    pub certificates: Vec<Vec<u8>>,

    /// Facilitator of the registration, informational
    pub broker: Option<Address>,

    /// Metadata URI, empty when unset
    pub metadata_uri: String,
}

impl Account {
    /// Create an account without targets, certificates or metadata
    pub fn new(domain: impl Into<String>, name: impl Into<String>, owner: Address, valid_until: i64) -> Self {
        Account {
            domain: domain.into(),
            name: name.into(),
            owner,
            valid_until,
            targets: Vec::new(),
            certificates: Vec::new(),
            broker: None,
            metadata_uri: String::new(),
        }
    }

    /// Whether this is the root account of its domain
    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// Whether the account is expired at the block time of `ctx`
    pub fn is_expired(&self, ctx: &Context) -> bool {
        ctx.is_after(self.valid_until)
    }

    /// Human readable `name*domain` form
    pub fn starname(&self) -> String {
        format!("{}*{}", self.name, self.domain)
    }
}
