//! Configuration for the registry
//!
//! The configuration is owned by a separate module of the ledger and only read
//! here through [`crate::keeper::ConfigurationKeeper`]. It carries the name and
//! target validity patterns, the renewal and grace periods, resource limits and
//! the fee schedule.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StarnameError};
use crate::models::Address;
use crate::store::codec::MAX_COMPONENT_LEN;

const DAY: u64 = 24 * 60 * 60;

/// Fees charged per message route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee denomination
    pub denom: String,

    /// Fee per message route, see [`crate::models::Msg::route`]
    pub fees: BTreeMap<String, u64>,

    /// Fee for routes missing from `fees`
    pub default_fee: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        let fees = [
            ("register_domain", 10_000),
            ("renew_domain", 10_000),
            ("register_account", 100),
            ("renew_account", 100),
            ("transfer_domain", 1_000),
            ("transfer_account", 100),
        ]
        .into_iter()
        .map(|(route, fee)| (route.to_string(), fee))
        .collect();

        FeeSchedule {
            denom: "tiov".to_string(),
            fees,
            default_fee: 10,
        }
    }
}

impl FeeSchedule {
    /// Fee for a message route
    pub fn fee_for(&self, route: &str) -> u64 {
        self.fees.get(route).copied().unwrap_or(self.default_fee)
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Owner of the configuration
    pub configurer: Address,

    /// Pattern every domain name must match
    pub valid_domain_name: String,

    /// Pattern every non-root account name must match
    pub valid_account_name: String,

    /// Pattern every target blockchain id must match
    pub valid_blockchain_id: String,

    /// Pattern every target blockchain address must match
    pub valid_blockchain_address: String,

    /// Validity of a newly registered or renewed domain
    pub domain_renewal_period: Duration,

    /// Time after expiry during which only the admin may delete a domain
    pub domain_grace_period: Duration,

    /// Validity of a newly registered or renewed account in an open domain
    pub account_renewal_period: Duration,

    /// Maximum number of targets per account
    pub resources_max: usize,

    /// Maximum number of certificates per account
    pub certificates_max: usize,

    /// Maximum size of one certificate in bytes
    pub certificate_size_max: usize,

    /// Maximum size of an account metadata URI in bytes
    pub metadata_size_max: usize,

    /// Fee schedule
    pub fees: FeeSchedule,

    #[serde(skip)]
    compiled: CompiledPatterns,
}

/// Validity patterns of a [`Config`], compiled
#[derive(Debug, Clone)]
pub struct Patterns {
    domain_name: Regex,
    account_name: Regex,
    blockchain_id: Regex,
    blockchain_address: Regex,
}

impl Patterns {
    fn compile(config: &Config) -> Result<Self> {
        let compile = |field: &str, pattern: &str| {
            Regex::new(pattern).map_err(|e| StarnameError::Config(format!("{}: {}", field, e)))
        };
        Ok(Patterns {
            domain_name: compile("valid_domain_name", &config.valid_domain_name)?,
            account_name: compile("valid_account_name", &config.valid_account_name)?,
            blockchain_id: compile("valid_blockchain_id", &config.valid_blockchain_id)?,
            blockchain_address: compile("valid_blockchain_address", &config.valid_blockchain_address)?,
        })
    }

    fn compiled_from(&self, config: &Config) -> bool {
        self.domain_name.as_str() == config.valid_domain_name
            && self.account_name.as_str() == config.valid_account_name
            && self.blockchain_id.as_str() == config.valid_blockchain_id
            && self.blockchain_address.as_str() == config.valid_blockchain_address
    }
}

/// Patterns compiled on first use, carried along when the config is cloned
#[derive(Debug, Clone, Default)]
struct CompiledPatterns(OnceLock<Patterns>);

// Derived from the pattern strings, so never part of equality
impl PartialEq for CompiledPatterns {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for CompiledPatterns {}

impl Default for Config {
    fn default() -> Self {
        Config {
            configurer: Address::NONE,
            valid_domain_name: "^[-_a-z0-9]{4,16}$".to_string(),
            valid_account_name: "^[-_\\.a-z0-9]{1,64}$".to_string(),
            valid_blockchain_id: "^[-a-zA-Z0-9_:]{1,50}$".to_string(),
            valid_blockchain_address: "^[-a-zA-Z0-9_:]{1,128}$".to_string(),
            domain_renewal_period: Duration::from_secs(365 * DAY),
            domain_grace_period: Duration::from_secs(30 * DAY),
            account_renewal_period: Duration::from_secs(365 * DAY),
            resources_max: 10,
            certificates_max: 5,
            certificate_size_max: 200,
            metadata_size_max: 256,
            fees: FeeSchedule::default(),
            compiled: CompiledPatterns::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| StarnameError::Config(format!("{}: {}", path, e)))?;

        let config: Config = serde_json::from_reader(file)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| StarnameError::Config(format!("{}: {}", path, e)))?;

        serde_json::to_writer_pretty(file, self)?;

        Ok(())
    }

    /// Create a development configuration with short periods
    pub fn development() -> Self {
        let mut config = Self::default();
        config.valid_domain_name = "^[-_a-z0-9]{1,32}$".to_string();
        config.domain_renewal_period = Duration::from_secs(DAY);
        config.domain_grace_period = Duration::from_secs(60 * 60);
        config.account_renewal_period = Duration::from_secs(DAY);
        config
    }

    /// Create a testing configuration
    ///
    /// Periods are round numbers of seconds so tests can reason about exact
    /// expiry boundaries.
    pub fn testing() -> Self {
        let mut config = Self::default();
        config.valid_domain_name = "^[-_a-z0-9]{1,32}$".to_string();
        config.domain_renewal_period = Duration::from_secs(1_000);
        config.domain_grace_period = Duration::from_secs(100);
        config.account_renewal_period = Duration::from_secs(500);
        config.certificates_max = 3;
        config.metadata_size_max = 64;
        config
    }

    /// Check that every pattern compiles and every limit is usable
    ///
    /// The compiled patterns are kept for later name and target checks.
    pub fn validate(&self) -> Result<()> {
        self.patterns()?;

        if self.certificate_size_max == 0 || self.certificate_size_max > MAX_COMPONENT_LEN {
            return Err(StarnameError::Config(format!(
                "certificate_size_max must be within 1..={}, got {}",
                MAX_COMPONENT_LEN, self.certificate_size_max
            )));
        }

        if self.domain_renewal_period.is_zero() {
            return Err(StarnameError::Config("domain_renewal_period must not be zero".to_string()));
        }

        Ok(())
    }

    /// Compiled validity patterns
    ///
    /// Compiles once and reuses the result until a pattern field changes.
    pub fn patterns(&self) -> Result<Cow<'_, Patterns>> {
        if let Some(patterns) = self.compiled.0.get() {
            if patterns.compiled_from(self) {
                return Ok(Cow::Borrowed(patterns));
            }
            return Patterns::compile(self).map(Cow::Owned);
        }
        let patterns = Patterns::compile(self)?;
        Ok(Cow::Borrowed(self.compiled.0.get_or_init(|| patterns)))
    }

    /// Whether `name` is an acceptable domain name
    pub fn is_valid_domain_name(&self, name: &str) -> Result<bool> {
        Ok(self.patterns()?.domain_name.is_match(name))
    }

    /// Whether `name` is an acceptable account name
    pub fn is_valid_account_name(&self, name: &str) -> Result<bool> {
        Ok(self.patterns()?.account_name.is_match(name))
    }

    /// Whether `id` is an acceptable blockchain id
    pub fn is_valid_blockchain_id(&self, id: &str) -> Result<bool> {
        Ok(self.patterns()?.blockchain_id.is_match(id))
    }

    /// Whether `address` is an acceptable blockchain address
    pub fn is_valid_blockchain_address(&self, address: &str) -> Result<bool> {
        Ok(self.patterns()?.blockchain_address.is_match(address))
    }

    /// Domain renewal period in seconds
    pub fn domain_renewal_secs(&self) -> i64 {
        duration_secs(self.domain_renewal_period)
    }

    /// Domain grace period in seconds
    pub fn domain_grace_secs(&self) -> i64 {
        duration_secs(self.domain_grace_period)
    }

    /// Account renewal period in seconds
    pub fn account_renewal_secs(&self) -> i64 {
        duration_secs(self.account_renewal_period)
    }
}

fn duration_secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}
