//! Shared fixtures for unit tests

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::config::Config;
use crate::keeper::{Keeper, NoFees, StaticConfiguration};
use crate::models::{Address, Context};
use crate::store::MemoryStore;

pub fn alice() -> Address {
    Address::new([0xa1; 20])
}

pub fn bob() -> Address {
    Address::new([0xb0; 20])
}

pub fn charlie() -> Address {
    Address::new([0xc4; 20])
}

pub fn ctx(seconds: i64) -> Context {
    Context::at_unix(seconds)
}

/// Context at `seconds` plus a fraction of a second
pub fn ctx_nanos(seconds: i64, nanos: u32) -> Context {
    Context::new(Utc.timestamp_opt(seconds, nanos).unwrap(), 1)
}

/// Keeper over an empty memory store with the testing configuration
pub fn keeper() -> Keeper<MemoryStore> {
    let config = StaticConfiguration::new(Config::testing()).expect("testing config is valid");
    Keeper::new(MemoryStore::new(), Arc::new(config), Arc::new(NoFees))
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
