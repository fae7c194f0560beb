//! Domain controller

use crate::config::Config;
use crate::error::{Result, StarnameError};
use crate::keeper::Keeper;
use crate::models::{Address, Context, Domain, DomainType};
use crate::store::keys::ACCOUNT_SEPARATOR;
use crate::store::KvStore;

/// A precondition on a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainCheck<'a> {
    /// The domain exists; loads it
    MustExist,
    /// The domain does not exist
    MustNotExist,
    /// The domain has not expired; requires a loaded domain
    NotExpired,
    /// The domain is administered by the address; requires a loaded domain
    Admin(&'a Address),
    /// The domain has the given type; requires a loaded domain
    Type(DomainType),
    /// The grace period after expiry is over; requires a loaded domain
    GracePeriodFinished,
    /// The name matches the configured domain name pattern
    ValidName,
}

/// Ordered precondition checks over one domain
///
/// The domain is read from the store at most once per controller.
pub struct DomainController<'k, S: KvStore> {
    ctx: Context,
    keeper: &'k Keeper<S>,
    name: String,
    /// `None` until the first lookup
    lookup: Option<Option<Domain>>,
    config: Option<Config>,
}

impl<'k, S: KvStore> DomainController<'k, S> {
    /// Controller for the domain called `name`
    pub fn new(ctx: &Context, keeper: &'k Keeper<S>, name: &str) -> Self {
        DomainController {
            ctx: *ctx,
            keeper,
            name: name.to_string(),
            lookup: None,
            config: None,
        }
    }

    /// Run `checks` in order, stopping at the first failure
    pub fn validate(&mut self, checks: &[DomainCheck<'_>]) -> Result<()> {
        for check in checks {
            self.check(check)?;
        }
        Ok(())
    }

    fn check(&mut self, check: &DomainCheck<'_>) -> Result<()> {
        match check {
            DomainCheck::MustExist => self.must_exist(),
            DomainCheck::MustNotExist => self.must_not_exist(),
            DomainCheck::NotExpired => self.not_expired(),
            DomainCheck::Admin(address) => self.admin(address),
            DomainCheck::Type(expected) => self.domain_type(*expected),
            DomainCheck::GracePeriodFinished => self.grace_period_finished(),
            DomainCheck::ValidName => self.valid_name(),
        }
    }

    /// The loaded domain
    ///
    /// # Panics
    ///
    /// Panics if no `MustExist` check has succeeded.
    pub fn domain(&self) -> &Domain {
        self.loaded("domain()")
    }

    /// Take the loaded domain
    ///
    /// # Panics
    ///
    /// Panics if no `MustExist` check has succeeded.
    pub fn into_domain(self) -> Domain {
        match self.lookup {
            Some(Some(domain)) => domain,
            _ => panic!("domain controller for {}: into_domain() called before MustExist", self.name),
        }
    }

    fn fetch(&mut self) -> Result<Option<&Domain>> {
        if self.lookup.is_none() {
            self.lookup = Some(self.keeper.get_domain(&self.name)?);
        }
        Ok(self.lookup.as_ref().and_then(Option::as_ref))
    }

    fn loaded(&self, caller: &str) -> &Domain {
        match &self.lookup {
            Some(Some(domain)) => domain,
            _ => panic!(
                "domain controller for {}: {} requires a prior successful MustExist check",
                self.name, caller
            ),
        }
    }

    fn config(&mut self) -> &Config {
        let (ctx, keeper) = (&self.ctx, self.keeper);
        self.config.get_or_insert_with(|| keeper.configuration(ctx))
    }

    fn must_exist(&mut self) -> Result<()> {
        if self.fetch()?.is_none() {
            return Err(StarnameError::DomainDoesNotExist(self.name.clone()));
        }
        Ok(())
    }

    fn must_not_exist(&mut self) -> Result<()> {
        if self.fetch()?.is_some() {
            return Err(StarnameError::DomainAlreadyExists(self.name.clone()));
        }
        Ok(())
    }

    fn not_expired(&self) -> Result<()> {
        let domain = self.loaded("NotExpired");
        if domain.is_expired(&self.ctx) {
            return Err(StarnameError::DomainExpired(format!(
                "{} expired at {}",
                domain.name, domain.valid_until
            )));
        }
        Ok(())
    }

    fn admin(&self, address: &Address) -> Result<()> {
        let domain = self.loaded("Admin");
        if domain.admin != *address {
            return Err(StarnameError::Unauthorized(format!(
                "{} is not the admin of domain {}",
                address, domain.name
            )));
        }
        Ok(())
    }

    fn domain_type(&self, expected: DomainType) -> Result<()> {
        let domain = self.loaded("Type");
        if domain.domain_type != expected {
            return Err(StarnameError::InvalidDomainType(format!(
                "domain {} is {}, expected {}",
                domain.name, domain.domain_type, expected
            )));
        }
        Ok(())
    }

    fn grace_period_finished(&mut self) -> Result<()> {
        let grace = self.config().domain_grace_secs();
        let domain = self.loaded("GracePeriodFinished");
        let reclaimable_after = domain.valid_until.saturating_add(grace);
        if !self.ctx.is_after(reclaimable_after) {
            return Err(StarnameError::GracePeriodNotFinished(format!(
                "domain {} is protected until {}",
                domain.name, reclaimable_after
            )));
        }
        Ok(())
    }

    fn valid_name(&mut self) -> Result<()> {
        let name = self.name.clone();
        let valid = !name.as_bytes().contains(&ACCOUNT_SEPARATOR) && self.config().is_valid_domain_name(&name)?;
        if !valid {
            return Err(StarnameError::InvalidDomainName(name));
        }
        Ok(())
    }
}
