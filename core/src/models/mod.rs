//! Data models for the registry
//!
//! This module provides the records persisted by the keeper, the block
//! context and the state transition messages.

mod account;
mod address;
mod context;
mod domain;
pub mod msg;

pub use account::{Account, BlockchainAddress, NEVER_EXPIRES};
pub use address::{Address, ADDRESS_LEN};
pub use context::Context;
pub use domain::{Domain, DomainType};
pub use msg::{Msg, TransferFlag};
