//! # Starname Core
//!
//! State core of the starname registry: domains, the accounts under them and
//! the secondary indexes that let clients find accounts by owner, blockchain
//! target or certificate.
//!
//! Messages go through [`Keeper::deliver`], which validates them with the
//! [`controllers`], charges fees and applies the mutation atomically. Reads go
//! through the [`query`] module.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod controllers;
pub mod error;
pub mod handlers;
pub mod keeper;
pub mod models;
pub mod query;
pub mod store;

#[cfg(test)]
mod testutil;

/// Re-export common types for ease of use
pub use config::Config;
pub use error::{ErrorKind, Result, StarnameError};
pub use keeper::{ConfigurationKeeper, FeeCollector, Keeper, NoFees, StaticConfiguration};
pub use models::{Account, Address, BlockchainAddress, Context, Domain, DomainType, Msg, TransferFlag};
pub use store::{KvStore, MemoryStore};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
