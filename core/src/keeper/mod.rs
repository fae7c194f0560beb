//! Keeper: the registry's handle on its store
//!
//! The keeper owns the key-value store and the narrow collaborator interfaces
//! the registry depends on: configuration and fee collection. Record
//! operations live in [`domain`] and [`account`]; they are cheap primitives
//! that trust the caller to have run the matching controller checks first.

use std::sync::Arc;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::{Result, StarnameError};
use crate::handlers;
use crate::models::{Address, Context, Msg};
use crate::store::{CacheStore, KvStore};

pub mod account;
pub mod domain;

/// Read access to the configuration module
pub trait ConfigurationKeeper {
    /// Current configuration
    fn get_configuration(&self, ctx: &Context) -> Config;

    /// Whether `address` owns the configuration
    fn is_owner(&self, ctx: &Context, address: &Address) -> bool;
}

/// Configuration injected once at construction
///
/// There is no way to change the configuration through the registry; a new
/// configuration means a new keeper.
#[derive(Debug, Clone)]
pub struct StaticConfiguration {
    config: Config,
}

impl StaticConfiguration {
    /// Wrap a configuration after validating it
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(StaticConfiguration { config })
    }
}

impl ConfigurationKeeper for StaticConfiguration {
    fn get_configuration(&self, _ctx: &Context) -> Config {
        self.config.clone()
    }

    fn is_owner(&self, _ctx: &Context, address: &Address) -> bool {
        !address.is_none() && self.config.configurer == *address
    }
}

/// Fee collection, backed by the supply module of the ledger
#[cfg_attr(test, mockall::automock)]
pub trait FeeCollector {
    /// Charge `payer` the fee for `msg`
    fn collect_fees(&self, ctx: &Context, msg: &Msg, payer: &Address) -> Result<()>;
}

/// Fee collector that charges nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFees;

impl FeeCollector for NoFees {
    fn collect_fees(&self, _ctx: &Context, _msg: &Msg, _payer: &Address) -> Result<()> {
        Ok(())
    }
}

/// Store handle with its collaborators
pub struct Keeper<S: KvStore> {
    store: S,
    config: Arc<dyn ConfigurationKeeper>,
    fees: Arc<dyn FeeCollector>,
}

impl<S: KvStore> Keeper<S> {
    /// Create a keeper over `store`
    pub fn new(store: S, config: Arc<dyn ConfigurationKeeper>, fees: Arc<dyn FeeCollector>) -> Self {
        Keeper { store, config, fees }
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Underlying store, mutably
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Give back the underlying store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Current configuration
    pub fn configuration(&self, ctx: &Context) -> Config {
        self.config.get_configuration(ctx)
    }

    /// Whether `address` owns the configuration
    pub fn is_configuration_owner(&self, ctx: &Context, address: &Address) -> bool {
        self.config.is_owner(ctx, address)
    }

    /// Charge the fee payer of `msg`
    pub fn collect_fees(&self, ctx: &Context, msg: &Msg) -> Result<()> {
        let payer = msg.fee_payer();
        self.fees
            .collect_fees(ctx, msg, &payer)
            .map_err(|e| e.context(format!("collecting {} fee from {}", msg.route(), payer)))
    }

    /// Apply `msg` atomically
    ///
    /// The handler runs on a cache branch of the store; the branch is written
    /// back only if the handler succeeds, so a rejected message leaves the
    /// store unchanged.
    pub fn deliver(&mut self, ctx: &Context, msg: &Msg) -> Result<()> {
        let mut branch = Keeper {
            store: CacheStore::new(&mut self.store),
            config: Arc::clone(&self.config),
            fees: Arc::clone(&self.fees),
        };

        match handlers::dispatch(ctx, &mut branch, msg) {
            Ok(()) => {
                debug!("{}: committing {} store writes", msg.route(), branch.store.pending());
                branch.store.write();
                Ok(())
            }
            Err(err) => {
                warn!("{} rejected: {}", msg.route(), err);
                Err(err)
            }
        }
    }
}

pub(crate) fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(record)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| StarnameError::Serialization(format!("corrupted record: {}", e)))
}
