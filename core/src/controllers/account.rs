//! Account controller

use std::collections::HashSet;

use crate::config::Config;
use crate::error::{Result, StarnameError};
use crate::keeper::Keeper;
use crate::models::{Account, Address, BlockchainAddress, Context, Domain, DomainType};
use crate::store::{keys, KvStore};

/// A precondition on an account
///
/// Checks marked "requires a loaded account" panic unless `MustExist` has
/// succeeded earlier; checks marked "requires the domain" panic unless the
/// controller was built with [`AccountController::with_domain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCheck<'a> {
    /// The account exists; loads it
    MustExist,
    /// The account does not exist
    MustNotExist,
    /// The account has not expired; requires a loaded account
    NotExpired,
    /// The account is owned by the address; requires a loaded account
    Owner(&'a Address),
    /// The account is not the root account of its domain
    NotRoot,
    /// The name matches the configured account name pattern
    ValidName,
    /// Every target is well formed, ids are unique and the count is within limits
    ValidTargets(&'a [BlockchainAddress]),
    /// The certificate is attached; records its index; requires a loaded account
    CertificateExists(&'a [u8]),
    /// The certificate is not attached; requires a loaded account
    CertificateNotExist(&'a [u8]),
    /// The certificate size is within limits
    CertificateSize(&'a [u8]),
    /// Another certificate fits; requires a loaded account
    CertificateLimit,
    /// The metadata URI size is within limits
    MetadataSize(&'a str),
    /// The address may delete the account: its owner or the domain admin;
    /// requires a loaded account and the domain
    DeletableBy(&'a Address),
    /// The address may transfer the account: the domain admin of a closed
    /// domain, the owner in an open domain; requires a loaded account and the domain
    TransferableBy(&'a Address),
}

/// Ordered precondition checks over one account
///
/// The account is read from the store at most once per controller.
pub struct AccountController<'k, S: KvStore> {
    ctx: Context,
    keeper: &'k Keeper<S>,
    domain_name: String,
    name: String,
    domain: Option<Domain>,
    /// `None` until the first lookup
    lookup: Option<Option<Account>>,
    certificate_index: Option<usize>,
    config: Option<Config>,
}

impl<'k, S: KvStore> AccountController<'k, S> {
    /// Controller for account `name` of `domain`
    pub fn new(ctx: &Context, keeper: &'k Keeper<S>, domain: &str, name: &str) -> Self {
        AccountController {
            ctx: *ctx,
            keeper,
            domain_name: domain.to_string(),
            name: name.to_string(),
            domain: None,
            lookup: None,
            certificate_index: None,
            config: None,
        }
    }

    /// Attach the already validated parent domain
    pub fn with_domain(mut self, domain: Domain) -> Self {
        debug_assert_eq!(domain.name, self.domain_name);
        self.domain = Some(domain);
        self
    }

    /// Run `checks` in order, stopping at the first failure
    pub fn validate(&mut self, checks: &[AccountCheck<'_>]) -> Result<()> {
        for check in checks {
            self.check(check)?;
        }
        Ok(())
    }

    fn check(&mut self, check: &AccountCheck<'_>) -> Result<()> {
        match check {
            AccountCheck::MustExist => self.must_exist(),
            AccountCheck::MustNotExist => self.must_not_exist(),
            AccountCheck::NotExpired => self.not_expired(),
            AccountCheck::Owner(address) => self.owner(address),
            AccountCheck::NotRoot => self.not_root(),
            AccountCheck::ValidName => self.valid_name(),
            AccountCheck::ValidTargets(targets) => self.valid_targets(targets),
            AccountCheck::CertificateExists(certificate) => self.certificate_exists(certificate),
            AccountCheck::CertificateNotExist(certificate) => self.certificate_not_exist(certificate),
            AccountCheck::CertificateSize(certificate) => self.certificate_size(certificate),
            AccountCheck::CertificateLimit => self.certificate_limit(),
            AccountCheck::MetadataSize(uri) => self.metadata_size(uri),
            AccountCheck::DeletableBy(address) => self.deletable_by(address),
            AccountCheck::TransferableBy(address) => self.transferable_by(address),
        }
    }

    /// The loaded account
    ///
    /// # Panics
    ///
    /// Panics if no `MustExist` check has succeeded.
    pub fn account(&self) -> &Account {
        self.loaded("account()")
    }

    /// Take the loaded account
    ///
    /// # Panics
    ///
    /// Panics if no `MustExist` check has succeeded.
    pub fn into_account(self) -> Account {
        match self.lookup {
            Some(Some(account)) => account,
            _ => panic!(
                "account controller for {}*{}: into_account() called before MustExist",
                self.name, self.domain_name
            ),
        }
    }

    /// Index found by the last successful `CertificateExists` check
    pub fn certificate_index(&self) -> Option<usize> {
        self.certificate_index
    }

    fn starname(&self) -> String {
        format!("{}*{}", self.name, self.domain_name)
    }

    fn fetch(&mut self) -> Result<Option<&Account>> {
        if self.lookup.is_none() {
            self.lookup = Some(self.keeper.get_account(&self.domain_name, &self.name)?);
        }
        Ok(self.lookup.as_ref().and_then(Option::as_ref))
    }

    fn loaded(&self, caller: &str) -> &Account {
        match &self.lookup {
            Some(Some(account)) => account,
            _ => panic!(
                "account controller for {}: {} requires a prior successful MustExist check",
                self.starname(),
                caller
            ),
        }
    }

    fn parent(&self, caller: &str) -> &Domain {
        match &self.domain {
            Some(domain) => domain,
            None => panic!(
                "account controller for {}: {} requires the parent domain, use with_domain",
                self.starname(),
                caller
            ),
        }
    }

    fn config(&mut self) -> &Config {
        let (ctx, keeper) = (&self.ctx, self.keeper);
        self.config.get_or_insert_with(|| keeper.configuration(ctx))
    }

    fn must_exist(&mut self) -> Result<()> {
        if self.fetch()?.is_none() {
            return Err(StarnameError::AccountDoesNotExist(self.starname()));
        }
        Ok(())
    }

    fn must_not_exist(&mut self) -> Result<()> {
        if self.fetch()?.is_some() {
            return Err(StarnameError::AccountExists(self.starname()));
        }
        Ok(())
    }

    fn not_expired(&self) -> Result<()> {
        let account = self.loaded("NotExpired");
        if account.is_expired(&self.ctx) {
            return Err(StarnameError::AccountExpired(format!(
                "{} expired at {}",
                account.starname(),
                account.valid_until
            )));
        }
        Ok(())
    }

    fn owner(&self, address: &Address) -> Result<()> {
        let account = self.loaded("Owner");
        if account.owner != *address {
            return Err(StarnameError::Unauthorized(format!(
                "{} does not own account {}",
                address,
                account.starname()
            )));
        }
        Ok(())
    }

    fn not_root(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(StarnameError::InvalidRequest(format!(
                "{} is the root account of its domain",
                self.starname()
            )));
        }
        Ok(())
    }

    fn valid_name(&mut self) -> Result<()> {
        let name = self.name.clone();
        if !self.config().is_valid_account_name(&name)? {
            return Err(StarnameError::InvalidAccountName(self.starname()));
        }
        Ok(())
    }

    fn valid_targets(&mut self, targets: &[BlockchainAddress]) -> Result<()> {
        let config = self.config().clone();
        if targets.len() > config.resources_max {
            return Err(StarnameError::InvalidRequest(format!(
                "{} targets exceed the limit of {}",
                targets.len(),
                config.resources_max
            )));
        }

        let mut ids = HashSet::with_capacity(targets.len());
        for target in targets {
            if !config.is_valid_blockchain_id(&target.id)? {
                return Err(StarnameError::InvalidBlockchainTarget(format!(
                    "invalid blockchain id {:?}",
                    target.id
                )));
            }
            if !config.is_valid_blockchain_address(&target.address)? {
                return Err(StarnameError::InvalidBlockchainTarget(format!(
                    "invalid address {:?} for blockchain {}",
                    target.address, target.id
                )));
            }
            // the target must also be indexable
            keys::target_subject(target).map_err(|e| {
                StarnameError::InvalidBlockchainTarget(format!("{}:{}: {}", target.id, target.address, e))
            })?;
            if !ids.insert(target.id.as_str()) {
                return Err(StarnameError::InvalidBlockchainTarget(format!(
                    "duplicate blockchain id {}",
                    target.id
                )));
            }
        }
        Ok(())
    }

    fn certificate_exists(&mut self, certificate: &[u8]) -> Result<()> {
        let position = self
            .loaded("CertificateExists")
            .certificates
            .iter()
            .position(|c| c.as_slice() == certificate);
        match position {
            Some(index) => {
                self.certificate_index = Some(index);
                Ok(())
            }
            None => Err(StarnameError::CertificateDoesNotExist(format!(
                "{} on account {}",
                hex::encode(certificate),
                self.starname()
            ))),
        }
    }

    fn certificate_not_exist(&self, certificate: &[u8]) -> Result<()> {
        let account = self.loaded("CertificateNotExist");
        if account.certificates.iter().any(|c| c.as_slice() == certificate) {
            return Err(StarnameError::CertificateExists(format!(
                "{} on account {}",
                hex::encode(certificate),
                account.starname()
            )));
        }
        Ok(())
    }

    fn certificate_size(&mut self, certificate: &[u8]) -> Result<()> {
        let max = self.config().certificate_size_max;
        if certificate.is_empty() || certificate.len() > max {
            return Err(StarnameError::InvalidRequest(format!(
                "certificate size {} must be within 1..={}",
                certificate.len(),
                max
            )));
        }
        Ok(())
    }

    fn certificate_limit(&mut self) -> Result<()> {
        let max = self.config().certificates_max;
        let account = self.loaded("CertificateLimit");
        if account.certificates.len() >= max {
            return Err(StarnameError::InvalidRequest(format!(
                "account {} already holds the maximum of {} certificates",
                account.starname(),
                max
            )));
        }
        Ok(())
    }

    fn metadata_size(&mut self, uri: &str) -> Result<()> {
        let max = self.config().metadata_size_max;
        if uri.len() > max {
            return Err(StarnameError::InvalidRequest(format!(
                "metadata URI of {} bytes exceeds the limit of {}",
                uri.len(),
                max
            )));
        }
        Ok(())
    }

    fn deletable_by(&self, address: &Address) -> Result<()> {
        let domain = self.parent("DeletableBy");
        let account = self.loaded("DeletableBy");
        if account.owner != *address && domain.admin != *address {
            return Err(StarnameError::Unauthorized(format!(
                "{} may not delete account {}",
                address,
                account.starname()
            )));
        }
        Ok(())
    }

    fn transferable_by(&self, address: &Address) -> Result<()> {
        let domain = self.parent("TransferableBy");
        let account = self.loaded("TransferableBy");
        let allowed = match domain.domain_type {
            DomainType::Closed => domain.admin == *address,
            DomainType::Open => account.owner == *address,
        };
        if !allowed {
            return Err(StarnameError::Unauthorized(format!(
                "{} may not transfer account {} of {} domain {}",
                address,
                account.starname(),
                domain.domain_type,
                domain.name
            )));
        }
        Ok(())
    }
}
