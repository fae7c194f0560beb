//! Account record operations
//!
//! Accounts are indexed three ways: owner -> account, target -> account and
//! certificate -> account. Every operation that changes one of those fields
//! removes the old index entries before writing and inserts the new ones
//! after; [`Keeper::set_account`] alone leaves the indexes alone.

use log::debug;

use crate::error::{Result, StarnameError};
use crate::models::{Account, Address, BlockchainAddress};
use crate::store::keys::{
    self, CERTIFICATE_TO_ACCOUNT_INDEX, OWNER_TO_ACCOUNT_INDEX, TARGET_TO_ACCOUNT_INDEX,
};
use crate::store::{IndexedStore, KvStore};
use super::{decode, encode, Keeper};

impl<S: KvStore> Keeper<S> {
    /// Account record by domain and name
    pub fn get_account(&self, domain: &str, name: &str) -> Result<Option<Account>> {
        match self.store().get(&keys::account_key(domain, name)) {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Write a new account and index its owner, targets and certificates
    ///
    /// Does not check for an existing account of the same name.
    pub fn create_account(&mut self, account: &Account) -> Result<()> {
        self.set_account(account)?;
        self.index_account_owner(account);
        self.index_targets(account)?;
        self.index_certificates(account)?;
        debug!("created account {} for {}", account.starname(), account.owner);
        Ok(())
    }

    /// Overwrite an account record without touching any index
    pub fn set_account(&mut self, account: &Account) -> Result<()> {
        let bytes = encode(account)?;
        self.store_mut()
            .set(&keys::account_key(&account.domain, &account.name), &bytes);
        Ok(())
    }

    /// Unindex and delete an account
    ///
    /// Returns false, changing nothing, if the account does not exist.
    pub fn delete_account(&mut self, domain: &str, name: &str) -> Result<bool> {
        let Some(account) = self.get_account(domain, name)? else {
            return Ok(false);
        };

        self.unindex_account_owner(&account);
        self.unindex_targets(&account)?;
        self.unindex_certificates(&account)?;
        self.store_mut().delete(&keys::account_key(domain, name));

        debug!("deleted account {}", account.starname());
        Ok(true)
    }

    /// Visit the raw name of every account of `domain` in name order until
    /// `visit` returns false
    pub fn get_accounts_in_domain<F>(&self, domain: &str, mut visit: F)
    where
        F: FnMut(&[u8]) -> bool,
    {
        let prefix = keys::accounts_in_domain_prefix(domain);
        let prefix_len = prefix.len();
        self.store()
            .iterate_prefix(&prefix, &mut |key, _| visit(&key[prefix_len..]));
    }

    /// Names of every account of `domain`, root account included
    pub fn account_names_in_domain(&self, domain: &str) -> Vec<String> {
        let mut names = Vec::new();
        self.get_accounts_in_domain(domain, |name| {
            names.push(String::from_utf8_lossy(name).into_owned());
            true
        });
        names
    }

    /// Visit every account of every domain until `visit` returns false
    pub fn iterate_all_accounts<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(Account) -> bool,
    {
        let mut failure = None;
        self.store().iterate_prefix(&keys::account_prefix(), &mut |_, value| {
            match decode::<Account>(value) {
                Ok(account) => visit(account),
                Err(err) => {
                    failure = Some(err);
                    false
                }
            }
        });
        failure.map_or(Ok(()), Err)
    }

    /// Move an account to `new_owner`
    ///
    /// With `reset`, targets, certificates and metadata are cleared and their
    /// index entries removed.
    pub fn transfer_account(&mut self, account: &Account, new_owner: &Address, reset: bool) -> Result<Account> {
        self.unindex_account_owner(account);

        let mut updated = account.clone();
        updated.owner = *new_owner;
        if reset {
            self.unindex_targets(account)?;
            self.unindex_certificates(account)?;
            updated.targets.clear();
            updated.certificates.clear();
            updated.metadata_uri.clear();
        }
        self.set_account(&updated)?;
        self.index_account_owner(&updated);

        debug!(
            "transferred account {} from {} to {} (reset: {})",
            account.starname(),
            account.owner,
            new_owner,
            reset
        );
        Ok(updated)
    }

    /// Append a certificate and index it
    pub fn add_account_certificate(&mut self, account: &Account, certificate: &[u8]) -> Result<Account> {
        let mut updated = account.clone();
        updated.certificates.push(certificate.to_vec());
        self.set_account(&updated)?;
        certificate_to_account(certificate)?
            .set(self.store_mut(), &account_object_key(&updated));
        Ok(updated)
    }

    /// Remove the certificate at `index` and unindex it
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; callers locate the index with the
    /// `CertificateExists` account check first.
    pub fn delete_account_certificate(&mut self, account: &Account, index: usize) -> Result<Account> {
        assert!(
            index < account.certificates.len(),
            "certificate index {} out of range for account {} with {} certificates",
            index,
            account.starname(),
            account.certificates.len()
        );

        let mut updated = account.clone();
        let removed = updated.certificates.remove(index);
        self.set_account(&updated)?;
        // an identical certificate cannot remain, certificates are unique
        certificate_to_account(&removed)?.delete(self.store_mut(), &account_object_key(&updated));
        Ok(updated)
    }

    /// Replace every target, moving the target index entries
    pub fn replace_account_targets(&mut self, account: &Account, targets: Vec<BlockchainAddress>) -> Result<Account> {
        self.unindex_targets(account)?;

        let mut updated = account.clone();
        updated.targets = targets;
        self.set_account(&updated)?;
        self.index_targets(&updated)?;
        Ok(updated)
    }

    /// Replace the metadata URI
    pub fn replace_account_metadata(&mut self, account: &Account, metadata_uri: &str) -> Result<Account> {
        let mut updated = account.clone();
        updated.metadata_uri = metadata_uri.to_string();
        self.set_account(&updated)?;
        Ok(updated)
    }

    /// Keys (`domain*name`) of the accounts owned by `owner`, in index order
    pub fn account_keys_owned_by(&self, owner: &Address) -> Vec<Vec<u8>> {
        if owner.is_none() {
            return Vec::new();
        }
        owner_to_account(owner).keys(self.store())
    }

    /// Keys of the accounts resolving to `target`, in index order
    pub fn account_keys_by_target(&self, target: &BlockchainAddress) -> Result<Vec<Vec<u8>>> {
        Ok(target_to_account(target)?.keys(self.store()))
    }

    /// Keys of the accounts holding `certificate`, in index order
    pub fn account_keys_by_certificate(&self, certificate: &[u8]) -> Result<Vec<Vec<u8>>> {
        Ok(certificate_to_account(certificate)?.keys(self.store()))
    }

    /// Account referenced by an index object key
    pub fn account_by_object_key(&self, key: &[u8]) -> Result<Account> {
        let (domain, name) = keys::split_account_object_key(key)?;
        self.get_account(&domain, &name)?.ok_or_else(|| {
            StarnameError::AccountDoesNotExist(format!("{}*{} is indexed but has no record", name, domain))
        })
    }

    fn index_account_owner(&mut self, account: &Account) {
        if account.owner.is_none() {
            return;
        }
        owner_to_account(&account.owner).set(self.store_mut(), &account_object_key(account));
    }

    fn unindex_account_owner(&mut self, account: &Account) {
        if account.owner.is_none() {
            return;
        }
        owner_to_account(&account.owner).delete(self.store_mut(), &account_object_key(account));
    }

    fn index_targets(&mut self, account: &Account) -> Result<()> {
        let object = account_object_key(account);
        for target in &account.targets {
            target_to_account(target)?.set(self.store_mut(), &object);
        }
        Ok(())
    }

    fn unindex_targets(&mut self, account: &Account) -> Result<()> {
        let object = account_object_key(account);
        for target in &account.targets {
            target_to_account(target)?.delete(self.store_mut(), &object);
        }
        Ok(())
    }

    fn index_certificates(&mut self, account: &Account) -> Result<()> {
        let object = account_object_key(account);
        for certificate in &account.certificates {
            certificate_to_account(certificate)?.set(self.store_mut(), &object);
        }
        Ok(())
    }

    fn unindex_certificates(&mut self, account: &Account) -> Result<()> {
        let object = account_object_key(account);
        for certificate in &account.certificates {
            certificate_to_account(certificate)?.delete(self.store_mut(), &object);
        }
        Ok(())
    }
}

fn account_object_key(account: &Account) -> Vec<u8> {
    keys::account_object_key(&account.domain, &account.name)
}

fn owner_to_account(owner: &Address) -> IndexedStore {
    IndexedStore::address_indexer(&keys::index_prefix(OWNER_TO_ACCOUNT_INDEX), owner)
}

fn target_to_account(target: &BlockchainAddress) -> Result<IndexedStore> {
    let subject = keys::target_subject(target)?;
    Ok(IndexedStore::new(&keys::index_prefix(TARGET_TO_ACCOUNT_INDEX), &subject))
}

fn certificate_to_account(certificate: &[u8]) -> Result<IndexedStore> {
    let subject = keys::certificate_subject(certificate)?;
    Ok(IndexedStore::new(&keys::index_prefix(CERTIFICATE_TO_ACCOUNT_INDEX), &subject))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testutil::{alice, bob, charlie, keeper};

    fn account(domain: &str, name: &str, owner: Address) -> Account {
        let mut account = Account::new(domain, name, owner, 1_000);
        account.targets = vec![
            BlockchainAddress::new("eth", format!("0x{}", name)),
            BlockchainAddress::new("btc", format!("bc1{}", name)),
        ];
        account.certificates = vec![format!("cert-{}", name).into_bytes()];
        account.metadata_uri = "ipfs://meta".to_string();
        account
    }

    fn owned_accounts(keeper: &Keeper<MemoryStore>, owner: &Address) -> Vec<Account> {
        keeper
            .account_keys_owned_by(owner)
            .iter()
            .map(|key| keeper.account_by_object_key(key).unwrap())
            .collect()
    }

    #[test]
    fn test_create_account_indexes_everything() {
        let mut keeper = keeper();
        let bob_account = account("iov", "bob", bob());

        keeper.create_account(&bob_account).unwrap();

        assert_eq!(keeper.get_account("iov", "bob").unwrap(), Some(bob_account.clone()));
        assert_eq!(owned_accounts(&keeper, &bob()), vec![bob_account.clone()]);
        assert_eq!(
            keeper.account_keys_by_target(&BlockchainAddress::new("eth", "0xbob")).unwrap(),
            vec![b"iov*bob".to_vec()]
        );
        assert_eq!(
            keeper.account_keys_by_certificate(b"cert-bob").unwrap(),
            vec![b"iov*bob".to_vec()]
        );
    }

    #[test]
    fn test_delete_account_removes_every_index_entry() {
        let mut keeper = keeper();
        keeper.create_account(&account("iov", "bob", bob())).unwrap();

        assert!(keeper.delete_account("iov", "bob").unwrap());
        assert!(!keeper.delete_account("iov", "bob").unwrap());

        assert!(keeper.store().is_empty());
    }

    #[test]
    fn test_accounts_in_domain_do_not_leak_across_domains() {
        let mut keeper = keeper();
        keeper.create_account(&Account::new("iov", "", alice(), 1)).unwrap();
        keeper.create_account(&Account::new("iov", "bob", bob(), 1)).unwrap();
        keeper.create_account(&Account::new("iova", "carl", charlie(), 1)).unwrap();

        assert_eq!(keeper.account_names_in_domain("iov"), vec!["", "bob"]);
        assert_eq!(keeper.account_names_in_domain("iova"), vec!["carl"]);

        let mut seen = 0;
        keeper.get_accounts_in_domain("iov", |_| {
            seen += 1;
            false
        });
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_transfer_account_with_reset() {
        let mut keeper = keeper();
        let original = account("iov", "bob", bob());
        keeper.create_account(&original).unwrap();

        let updated = keeper.transfer_account(&original, &charlie(), true).unwrap();

        assert_eq!(updated.owner, charlie());
        assert!(updated.targets.is_empty());
        assert!(updated.certificates.is_empty());
        assert!(updated.metadata_uri.is_empty());
        assert!(keeper.account_keys_owned_by(&bob()).is_empty());
        assert_eq!(owned_accounts(&keeper, &charlie()), vec![updated]);
        assert!(keeper.account_keys_by_target(&original.targets[0]).unwrap().is_empty());
        assert!(keeper.account_keys_by_certificate(b"cert-bob").unwrap().is_empty());
    }

    #[test]
    fn test_transfer_account_without_reset_keeps_resolution_data() {
        let mut keeper = keeper();
        let original = account("iov", "bob", bob());
        keeper.create_account(&original).unwrap();

        let updated = keeper.transfer_account(&original, &charlie(), false).unwrap();

        assert_eq!(updated.targets, original.targets);
        assert_eq!(keeper.account_keys_by_target(&original.targets[1]).unwrap().len(), 1);
        assert_eq!(keeper.account_keys_owned_by(&charlie()), vec![b"iov*bob".to_vec()]);
    }

    #[test]
    fn test_certificates() {
        let mut keeper = keeper();
        let original = account("iov", "bob", bob());
        keeper.create_account(&original).unwrap();

        let with_two = keeper.add_account_certificate(&original, b"cert-2").unwrap();
        assert_eq!(with_two.certificates.len(), 2);
        assert_eq!(keeper.account_keys_by_certificate(b"cert-2").unwrap(), vec![b"iov*bob".to_vec()]);

        let with_one = keeper.delete_account_certificate(&with_two, 0).unwrap();
        assert_eq!(with_one.certificates, vec![b"cert-2".to_vec()]);
        assert!(keeper.account_keys_by_certificate(b"cert-bob").unwrap().is_empty());
        assert_eq!(keeper.get_account("iov", "bob").unwrap(), Some(with_one));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_delete_certificate_out_of_range_panics() {
        let mut keeper = keeper();
        let original = account("iov", "bob", bob());
        keeper.create_account(&original).unwrap();

        let _ = keeper.delete_account_certificate(&original, 5);
    }

    #[test]
    fn test_replace_targets_moves_index() {
        let mut keeper = keeper();
        let original = account("iov", "bob", bob());
        keeper.create_account(&original).unwrap();
        let new_target = BlockchainAddress::new("sol", "abc");

        let updated = keeper.replace_account_targets(&original, vec![new_target.clone()]).unwrap();

        assert_eq!(updated.targets, vec![new_target.clone()]);
        for old in &original.targets {
            assert!(keeper.account_keys_by_target(old).unwrap().is_empty());
        }
        assert_eq!(keeper.account_keys_by_target(&new_target).unwrap(), vec![b"iov*bob".to_vec()]);
    }

    #[test]
    fn test_set_account_does_not_reindex() {
        let mut keeper = keeper();
        let mut original = account("iov", "bob", bob());
        keeper.create_account(&original).unwrap();

        original.owner = charlie();
        keeper.set_account(&original).unwrap();

        assert_eq!(keeper.account_keys_owned_by(&bob()), vec![b"iov*bob".to_vec()]);
        assert!(keeper.account_keys_owned_by(&charlie()).is_empty());
    }

    #[test]
    fn test_iterate_all_accounts() {
        let mut keeper = keeper();
        keeper.create_account(&Account::new("b", "x", bob(), 1)).unwrap();
        keeper.create_account(&Account::new("a", "y", bob(), 1)).unwrap();

        let mut seen = Vec::new();
        keeper
            .iterate_all_accounts(|account| {
                seen.push(account.starname());
                true
            })
            .unwrap();
        assert_eq!(seen, vec!["y*a", "x*b"]);
    }

    #[test]
    fn test_dangling_index_entry_is_reported() {
        let keeper = keeper();
        let err = keeper.account_by_object_key(b"iov*ghost").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::AccountDoesNotExist);
    }
}
