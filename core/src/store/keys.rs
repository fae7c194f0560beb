//! Store key layout
//!
//! ```text
//! DOMAIN_STORE  | domain name                          -> Domain
//! ACCOUNT_STORE | domain name | '*' | account name     -> Account
//! INDEX_STORE   | index | subject | object key         -> (empty marker)
//! ```
//!
//! Account keys differ from the plain `ACCOUNT_STORE | domain | name` layout:
//! a `'*'` byte ([`ACCOUNT_SEPARATOR`]) sits between the domain and the name.
//! Domain names may not contain `'*'`, so the prefix of one domain's accounts
//! never matches the accounts of a longer domain sharing its name prefix
//! (`iov*` vs `iova*`). Index object keys use the same `domain*name` form.
//!
//! Index subjects are either fixed-width addresses or packed keys, so a
//! subject is never a prefix of another subject.

use crate::error::{Result, StarnameError};
use crate::models::BlockchainAddress;
use super::codec;

/// Partition holding domain records
pub const DOMAIN_STORE: u8 = 0x00;

/// Partition holding account records
pub const ACCOUNT_STORE: u8 = 0x01;

/// Partition holding every secondary index
pub const INDEX_STORE: u8 = 0x02;

/// Owner address -> domain names
pub const OWNER_TO_DOMAIN_INDEX: u8 = 0x01;

/// Owner address -> account keys
pub const OWNER_TO_ACCOUNT_INDEX: u8 = 0x02;

/// Packed blockchain target -> account keys
pub const TARGET_TO_ACCOUNT_INDEX: u8 = 0x03;

/// Packed certificate -> account keys
pub const CERTIFICATE_TO_ACCOUNT_INDEX: u8 = 0x04;

/// Separates the domain name from the account name in account keys
///
/// Not part of a bare `domain | name` concatenation; see the module docs.
pub const ACCOUNT_SEPARATOR: u8 = b'*';

/// Prefix of every domain record
pub fn domain_prefix() -> Vec<u8> {
    vec![DOMAIN_STORE]
}

/// Primary key of a domain
pub fn domain_key(name: &str) -> Vec<u8> {
    let mut key = domain_prefix();
    key.extend_from_slice(name.as_bytes());
    key
}

/// Prefix of every account record
pub fn account_prefix() -> Vec<u8> {
    vec![ACCOUNT_STORE]
}

/// Prefix of the accounts of one domain
pub fn accounts_in_domain_prefix(domain: &str) -> Vec<u8> {
    let mut key = account_prefix();
    key.extend_from_slice(domain.as_bytes());
    key.push(ACCOUNT_SEPARATOR);
    key
}

/// Primary key of an account
pub fn account_key(domain: &str, name: &str) -> Vec<u8> {
    let mut key = accounts_in_domain_prefix(domain);
    key.extend_from_slice(name.as_bytes());
    key
}

/// Object key stored in account indexes: `domain*name`
pub fn account_object_key(domain: &str, name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(domain.len() + name.len() + 1);
    key.extend_from_slice(domain.as_bytes());
    key.push(ACCOUNT_SEPARATOR);
    key.extend_from_slice(name.as_bytes());
    key
}

/// Split an account object key into `(domain, name)`
pub fn split_account_object_key(key: &[u8]) -> Result<(String, String)> {
    let position = key
        .iter()
        .position(|b| *b == ACCOUNT_SEPARATOR)
        .ok_or_else(|| StarnameError::Codec(format!("account key {} has no separator", hex::encode(key))))?;
    let domain = String::from_utf8(key[..position].to_vec())
        .map_err(|e| StarnameError::Codec(format!("domain in account key: {}", e)))?;
    let name = String::from_utf8(key[position + 1..].to_vec())
        .map_err(|e| StarnameError::Codec(format!("name in account key: {}", e)))?;
    Ok((domain, name))
}

/// Prefix of one secondary index
pub fn index_prefix(index: u8) -> Vec<u8> {
    vec![INDEX_STORE, index]
}

/// Index subject of a blockchain target
pub fn target_subject(target: &BlockchainAddress) -> Result<Vec<u8>> {
    codec::pack(&[target.id.as_bytes(), target.address.as_bytes()])
        .map_err(|e| e.context(format!("target {}:{}", target.id, target.address)))
}

/// Recover a blockchain target from its index subject
pub fn target_from_subject(subject: &[u8]) -> Result<BlockchainAddress> {
    let parts = codec::unpack(subject)?;
    match parts.as_slice() {
        [id, address] => Ok(BlockchainAddress::new(
            String::from_utf8_lossy(id),
            String::from_utf8_lossy(address),
        )),
        _ => Err(StarnameError::Codec(format!(
            "target subject has {} components, expected 2",
            parts.len()
        ))),
    }
}

/// Index subject of a certificate
pub fn certificate_subject(certificate: &[u8]) -> Result<Vec<u8>> {
    codec::pack(&[certificate])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_keys() {
        assert_eq!(account_key("iov", "bob"), b"\x01iov*bob".to_vec());
        assert_eq!(account_key("iov", ""), b"\x01iov*".to_vec());
        assert!(account_key("iov", "bob").starts_with(&accounts_in_domain_prefix("iov")));
        // a domain is never matched by a longer domain sharing its prefix
        assert!(!account_key("iova", "bob").starts_with(&accounts_in_domain_prefix("iov")));
    }

    #[test]
    fn test_account_object_key_round_trip() {
        let key = account_object_key("iov", "");
        assert_eq!(split_account_object_key(&key).unwrap(), ("iov".to_string(), String::new()));

        let key = account_object_key("iov", "a*b");
        assert_eq!(split_account_object_key(&key).unwrap(), ("iov".to_string(), "a*b".to_string()));

        assert!(split_account_object_key(b"nosep").is_err());
    }

    #[test]
    fn test_target_subject_round_trip() {
        let target = BlockchainAddress::new("eth", "0x1");
        let subject = target_subject(&target).unwrap();
        assert_eq!(subject, b"\x03eth\x030x1".to_vec());
        assert_eq!(target_from_subject(&subject).unwrap(), target);
    }

    #[test]
    fn test_empty_target_fields_cannot_be_indexed() {
        let target = BlockchainAddress::new("eth", "");
        assert!(target_subject(&target).is_err());
    }
}
