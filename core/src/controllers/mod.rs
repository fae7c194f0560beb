//! Precondition pipelines
//!
//! A controller wraps one domain or account name, loads its record lazily and
//! runs an ordered list of checks against it, stopping at the first failure.
//! Handlers validate everything through controllers before touching the store.
//!
//! Checks that inspect the record (expiry, ownership, certificates) assume a
//! `MustExist` check has already loaded it and panic otherwise: running them
//! out of order is a bug in the handler, not bad input.

pub mod account;
pub mod domain;

pub use account::{AccountCheck, AccountController};
pub use domain::{DomainCheck, DomainController};
