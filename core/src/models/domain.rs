//! Domain records

use std::fmt::{self, Display, Formatter};
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::context::Context;

/// Governance model of a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainType {
    /// Any valid owner may register accounts and administer their own
    Open,

    /// A single admin governs every account of the domain
    Closed,
}

impl Display for DomainType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DomainType::Open => write!(f, "open"),
            DomainType::Closed => write!(f, "closed"),
        }
    }
}

/// A top-level namespace entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Domain name, unique
    pub name: String,

    /// Administrator, or [`Address::NONE`] for ownerless domains
    pub admin: Address,

    /// Expiry as unix seconds
    pub valid_until: i64,

    /// Governance model
    pub domain_type: DomainType,

    /// Seconds added to an account of this domain on renewal
    pub account_renew: i64,

    /// Facilitator of the registration, informational
    pub broker: Option<Address>,
}

impl Domain {
    /// Whether the domain is expired at the block time of `ctx`
    ///
    /// A domain stays valid up to and including the instant `valid_until`.
    pub fn is_expired(&self, ctx: &Context) -> bool {
        ctx.is_after(self.valid_until)
    }
}
