//! Domain record operations
//!
//! Only [`Keeper::create_domain`], [`Keeper::delete_domain`] and
//! [`Keeper::transfer_domain_ownership`] maintain the owner -> domain index.
//! [`Keeper::set_domain`] overwrites the record and nothing else.

use log::{debug, info};

use crate::error::Result;
use crate::models::{Address, Domain};
use crate::store::keys::{self, OWNER_TO_DOMAIN_INDEX};
use crate::store::{IndexedStore, KvStore};
use super::{decode, encode, Keeper};

impl<S: KvStore> Keeper<S> {
    /// Domain record by name
    pub fn get_domain(&self, name: &str) -> Result<Option<Domain>> {
        match self.store().get(&keys::domain_key(name)) {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Write a new domain and index it under its admin
    ///
    /// Does not check for an existing domain of the same name.
    pub fn create_domain(&mut self, domain: &Domain) -> Result<()> {
        self.set_domain(domain)?;
        self.index_domain_owner(domain);
        debug!("created domain {} for {}", domain.name, domain.admin);
        Ok(())
    }

    /// Overwrite a domain record without touching any index
    pub fn set_domain(&mut self, domain: &Domain) -> Result<()> {
        let bytes = encode(domain)?;
        self.store_mut().set(&keys::domain_key(&domain.name), &bytes);
        Ok(())
    }

    /// Delete a domain, every account under it and its owner index entry
    ///
    /// Returns false, changing nothing, if the domain does not exist.
    pub fn delete_domain(&mut self, name: &str) -> Result<bool> {
        let Some(domain) = self.get_domain(name)? else {
            return Ok(false);
        };

        let names = self.account_names_in_domain(name);
        for account in &names {
            self.delete_account(name, account)?;
        }

        self.store_mut().delete(&keys::domain_key(name));
        self.unindex_domain_owner(&domain);
        info!("deleted domain {} with {} accounts", name, names.len());
        Ok(true)
    }

    /// Delete every account of a domain except its root account
    ///
    /// Returns false, changing nothing, if the domain does not exist.
    pub fn flush_domain(&mut self, name: &str) -> Result<bool> {
        if self.get_domain(name)?.is_none() {
            return Ok(false);
        }

        let names: Vec<String> = self
            .account_names_in_domain(name)
            .into_iter()
            .filter(|account| !account.is_empty())
            .collect();
        for account in &names {
            self.delete_account(name, account)?;
        }

        info!("flushed {} accounts from domain {}", names.len(), name);
        Ok(true)
    }

    /// Move a domain to a new admin, updating the owner index
    ///
    /// Accounts are not touched; the caller decides what happens to them.
    pub fn transfer_domain_ownership(&mut self, new_owner: &Address, domain: &Domain) -> Result<Domain> {
        self.unindex_domain_owner(domain);

        let mut updated = domain.clone();
        updated.admin = *new_owner;
        self.set_domain(&updated)?;
        self.index_domain_owner(&updated);

        debug!("transferred domain {} from {} to {}", domain.name, domain.admin, new_owner);
        Ok(updated)
    }

    /// Visit every domain in name order until `visit` returns false
    pub fn iterate_all_domains<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(Domain) -> bool,
    {
        let mut failure = None;
        self.store().iterate_prefix(&keys::domain_prefix(), &mut |_, value| {
            match decode::<Domain>(value) {
                Ok(domain) => visit(domain),
                Err(err) => {
                    failure = Some(err);
                    false
                }
            }
        });
        failure.map_or(Ok(()), Err)
    }

    /// Every domain, in name order
    pub fn all_domains(&self) -> Result<Vec<Domain>> {
        let mut domains = Vec::new();
        self.iterate_all_domains(|domain| {
            domains.push(domain);
            true
        })?;
        Ok(domains)
    }

    /// Names of the domains administered by `owner`, in index order
    pub fn domain_keys_owned_by(&self, owner: &Address) -> Vec<Vec<u8>> {
        if owner.is_none() {
            return Vec::new();
        }
        owner_to_domain(owner).keys(self.store())
    }

    fn index_domain_owner(&mut self, domain: &Domain) {
        if domain.admin.is_none() {
            return;
        }
        owner_to_domain(&domain.admin).set(self.store_mut(), domain.name.as_bytes());
    }

    fn unindex_domain_owner(&mut self, domain: &Domain) {
        if domain.admin.is_none() {
            return;
        }
        owner_to_domain(&domain.admin).delete(self.store_mut(), domain.name.as_bytes());
    }
}

fn owner_to_domain(owner: &Address) -> IndexedStore {
    IndexedStore::address_indexer(&keys::index_prefix(OWNER_TO_DOMAIN_INDEX), owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, BlockchainAddress, DomainType};
    use crate::store::keys::INDEX_STORE;
    use crate::testutil::{alice, bob, charlie, keeper};

    fn domain(name: &str, admin: Address) -> Domain {
        Domain {
            name: name.to_string(),
            admin,
            valid_until: 1_000,
            domain_type: DomainType::Closed,
            account_renew: 500,
            broker: None,
        }
    }

    fn index_entries(keeper: &Keeper<crate::store::MemoryStore>) -> usize {
        keeper.store().keys_with_prefix(&[INDEX_STORE]).len()
    }

    #[test]
    fn test_create_and_get_domain() {
        let mut keeper = keeper();
        let iov = domain("iov", alice());

        keeper.create_domain(&iov).unwrap();

        assert_eq!(keeper.get_domain("iov").unwrap(), Some(iov));
        assert_eq!(keeper.get_domain("missing").unwrap(), None);
        assert_eq!(keeper.domain_keys_owned_by(&alice()), vec![b"iov".to_vec()]);
    }

    #[test]
    fn test_set_domain_does_not_reindex() {
        let mut keeper = keeper();
        let mut iov = domain("iov", alice());
        keeper.create_domain(&iov).unwrap();

        iov.admin = bob();
        keeper.set_domain(&iov).unwrap();

        assert_eq!(keeper.domain_keys_owned_by(&alice()), vec![b"iov".to_vec()]);
        assert!(keeper.domain_keys_owned_by(&bob()).is_empty());
    }

    #[test]
    fn test_ownerless_domain_is_not_indexed() {
        let mut keeper = keeper();
        keeper.create_domain(&domain("free", Address::NONE)).unwrap();

        assert_eq!(index_entries(&keeper), 0);
        assert!(keeper.delete_domain("free").unwrap());
        assert!(keeper.store().is_empty());
    }

    #[test]
    fn test_transfer_domain_ownership_moves_index() {
        let mut keeper = keeper();
        let iov = domain("iov", alice());
        keeper.create_domain(&iov).unwrap();

        let updated = keeper.transfer_domain_ownership(&bob(), &iov).unwrap();

        assert_eq!(updated.admin, bob());
        assert_eq!(keeper.get_domain("iov").unwrap().unwrap().admin, bob());
        assert!(keeper.domain_keys_owned_by(&alice()).is_empty());
        assert_eq!(keeper.domain_keys_owned_by(&bob()), vec![b"iov".to_vec()]);
    }

    #[test]
    fn test_delete_domain_cascades() {
        let mut keeper = keeper();
        keeper.create_domain(&domain("iov", alice())).unwrap();
        keeper.create_account(&Account::new("iov", "", alice(), 1_000)).unwrap();
        for (name, owner) in [("a", bob()), ("b", charlie()), ("c", alice())] {
            let mut account = Account::new("iov", name, owner, 1_000);
            account.targets = vec![BlockchainAddress::new("eth", format!("0x{}", name))];
            account.certificates = vec![name.as_bytes().to_vec()];
            keeper.create_account(&account).unwrap();
        }
        // an unrelated domain must survive
        keeper.create_domain(&domain("iova", bob())).unwrap();
        keeper.create_account(&Account::new("iova", "", bob(), 1_000)).unwrap();
        let survivors = keeper.store().len();

        assert!(keeper.delete_domain("iov").unwrap());

        assert_eq!(keeper.get_domain("iov").unwrap(), None);
        assert!(keeper.account_names_in_domain("iov").is_empty());
        assert!(keeper.domain_keys_owned_by(&alice()).is_empty());
        assert!(keeper.account_keys_owned_by(&bob()).iter().all(|k| !k.starts_with(b"iov*")));
        assert!(keeper.account_keys_by_target(&BlockchainAddress::new("eth", "0xa")).unwrap().is_empty());
        assert!(keeper.account_keys_by_certificate(b"a").unwrap().is_empty());
        // iova domain + owner index + root account + owner index
        assert_eq!(keeper.store().len(), 4);
        assert!(survivors > 4);
    }

    #[test]
    fn test_delete_missing_domain() {
        let mut keeper = keeper();
        assert!(!keeper.delete_domain("missing").unwrap());
        assert!(!keeper.flush_domain("missing").unwrap());
        assert!(keeper.store().is_empty());
    }

    #[test]
    fn test_flush_domain_keeps_root() {
        let mut keeper = keeper();
        keeper.create_domain(&domain("iov", alice())).unwrap();
        keeper.create_account(&Account::new("iov", "", alice(), 1_000)).unwrap();
        keeper.create_account(&Account::new("iov", "bob", bob(), 1_000)).unwrap();

        assert!(keeper.flush_domain("iov").unwrap());

        assert_eq!(keeper.account_names_in_domain("iov"), vec![String::new()]);
        assert!(keeper.get_domain("iov").unwrap().is_some());
        assert!(keeper.account_keys_owned_by(&bob()).is_empty());
    }

    #[test]
    fn test_iterate_all_domains() {
        let mut keeper = keeper();
        for name in ["c", "a", "b"] {
            keeper.create_domain(&domain(name, alice())).unwrap();
        }

        let names: Vec<String> = keeper.all_domains().unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let mut visited = 0;
        keeper
            .iterate_all_domains(|_| {
                visited += 1;
                false
            })
            .unwrap();
        assert_eq!(visited, 1);
    }
}
