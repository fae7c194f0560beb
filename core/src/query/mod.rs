//! Read-only queries
//!
//! List queries walk an index (or a domain's account partition), cut one page
//! out of the ordered key list and hydrate each key into its full record.
//! Pages are 1-based; `results_per_page` and `offset` fall back to their
//! defaults when zero or negative.
//!
//! [`Keeper::query`] exposes every query under a path string with JSON
//! request and response bodies.

use std::ops::RangeInclusive;

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StarnameError};
use crate::keeper::Keeper;
use crate::models::{Account, Address, BlockchainAddress, Context, Domain};
use crate::store::KvStore;

/// Path of [`QueryResolveDomain`]
pub const QUERY_RESOLVE_DOMAIN: &str = "resolve-domain";
/// Path of [`QueryResolveAccount`]
pub const QUERY_RESOLVE_ACCOUNT: &str = "resolve-account";
/// Path of [`QueryAccountsInDomain`]
pub const QUERY_ACCOUNTS_IN_DOMAIN: &str = "accounts-in-domain";
/// Path of [`QueryDomainsOwnedBy`]
pub const QUERY_DOMAINS_OWNED_BY: &str = "domains-owned-by";
/// Path of [`QueryAccountsOwnedBy`]
pub const QUERY_ACCOUNTS_OWNED_BY: &str = "accounts-owned-by";
/// Path of [`QueryAccountsByTarget`]
pub const QUERY_ACCOUNTS_BY_TARGET: &str = "accounts-by-target";
/// Path of [`QueryAccountsByCertificate`]
pub const QUERY_ACCOUNTS_BY_CERTIFICATE: &str = "accounts-by-certificate";

/// Page size used when a request asks for zero or fewer results
pub const DEFAULT_RESULTS_PER_PAGE: i64 = 100;

/// Page selection shared by every list query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number
    #[serde(default)]
    pub offset: i64,

    /// Results per page
    #[serde(default)]
    pub results_per_page: i64,
}

impl Page {
    /// Page `offset` with `results_per_page` entries
    pub fn new(offset: i64, results_per_page: i64) -> Self {
        Page { offset, results_per_page }
    }

    /// Indexes of the first and last item of the page within `total` items
    ///
    /// `None` for an empty list, whatever the page.
    fn bounds(&self, total: usize) -> Result<Option<RangeInclusive<usize>>> {
        if total == 0 {
            return Ok(None);
        }
        let per_page = if self.results_per_page <= 0 { DEFAULT_RESULTS_PER_PAGE } else { self.results_per_page };
        let offset = if self.offset <= 0 { 1 } else { self.offset };

        let first = offset
            .checked_mul(per_page)
            .map(|end| end - per_page)
            .and_then(|first| usize::try_from(first).ok())
            .filter(|first| *first < total)
            .ok_or_else(|| {
                StarnameError::InvalidRequest(format!(
                    "invalid offset {} for {} results at {} per page",
                    offset, total, per_page
                ))
            })?;
        let per_page = usize::try_from(per_page).unwrap_or(usize::MAX);
        let last = first.saturating_add(per_page - 1).min(total - 1);
        Ok(Some(first..=last))
    }

    fn slice<'a, T>(&self, items: &'a [T]) -> Result<&'a [T]> {
        Ok(match self.bounds(items.len())? {
            Some(range) => &items[range],
            None => &items[..0],
        })
    }
}

/// Look up a domain by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResolveDomain {
    /// Domain name
    pub name: String,
}

/// Answer to [`QueryResolveDomain`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResolveDomainResponse {
    /// The domain
    pub domain: Domain,
}

/// Look up an account by domain and name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResolveAccount {
    /// Parent domain
    pub domain: String,
    /// Account name; empty for the root account
    pub name: String,
}

/// Answer to [`QueryResolveAccount`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResolveAccountResponse {
    /// The account
    pub account: Account,
}

/// List the accounts of a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAccountsInDomain {
    /// Domain name
    pub domain: String,
    /// Page to return
    #[serde(flatten)]
    pub page: Page,
}

/// List the domains administered by an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDomainsOwnedBy {
    /// Admin address
    pub owner: Address,
    /// Page to return
    #[serde(flatten)]
    pub page: Page,
}

/// List the accounts owned by an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAccountsOwnedBy {
    /// Owner address
    pub owner: Address,
    /// Page to return
    #[serde(flatten)]
    pub page: Page,
}

/// List the accounts resolving to a blockchain target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAccountsByTarget {
    /// Blockchain id of the target
    pub blockchain_id: String,
    /// Address of the target
    pub address: String,
    /// Page to return
    #[serde(flatten)]
    pub page: Page,
}

/// List the accounts holding a certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAccountsByCertificate {
    /// Certificate bytes
    pub certificate: Vec<u8>,
    /// Page to return
    #[serde(flatten)]
    pub page: Page,
}

/// Response of every account list query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsResponse {
    /// One page of accounts
    pub accounts: Vec<Account>,
}

/// Response of the domain list query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainsResponse {
    /// One page of domains
    pub domains: Vec<Domain>,
}

impl<S: KvStore> Keeper<S> {
    /// Domain by name
    pub fn resolve_domain(&self, name: &str) -> Result<Domain> {
        self.get_domain(name)?
            .ok_or_else(|| StarnameError::DomainDoesNotExist(name.to_string()))
    }

    /// Account by domain and name; the empty name resolves the root account
    pub fn resolve_account(&self, domain: &str, name: &str) -> Result<Account> {
        self.get_account(domain, name)?
            .ok_or_else(|| StarnameError::AccountDoesNotExist(format!("{}*{}", name, domain)))
    }

    /// One page of the accounts of `domain`, in name order
    pub fn accounts_in_domain(&self, domain: &str, page: Page) -> Result<Vec<Account>> {
        let names = self.account_names_in_domain(domain);
        page.slice(&names)?
            .iter()
            .map(|name| self.resolve_account(domain, name))
            .collect()
    }

    /// One page of the domains administered by `owner`
    pub fn domains_owned_by(&self, owner: &Address, page: Page) -> Result<Vec<Domain>> {
        reject_no_owner(owner)?;
        let names = self.domain_keys_owned_by(owner);
        page.slice(&names)?
            .iter()
            .map(|name| self.resolve_domain(&String::from_utf8_lossy(name)))
            .collect()
    }

    /// One page of the accounts owned by `owner`
    pub fn accounts_owned_by(&self, owner: &Address, page: Page) -> Result<Vec<Account>> {
        reject_no_owner(owner)?;
        self.hydrate_accounts(&self.account_keys_owned_by(owner), page)
    }

    /// One page of the accounts resolving to `target`
    pub fn accounts_by_target(&self, target: &BlockchainAddress, page: Page) -> Result<Vec<Account>> {
        let keys = self.account_keys_by_target(target).map_err(|e| {
            StarnameError::InvalidBlockchainTarget(format!("{}:{}: {}", target.id, target.address, e))
        })?;
        self.hydrate_accounts(&keys, page)
    }

    /// One page of the accounts holding `certificate`
    pub fn accounts_by_certificate(&self, certificate: &[u8], page: Page) -> Result<Vec<Account>> {
        let keys = self
            .account_keys_by_certificate(certificate)
            .map_err(|e| StarnameError::InvalidRequest(format!("certificate: {}", e)))?;
        self.hydrate_accounts(&keys, page)
    }

    /// Answer the query registered under `path`
    ///
    /// Requests and responses are JSON documents. Unknown paths and
    /// undecodable requests fail with `InvalidRequest`.
    pub fn query(&self, ctx: &Context, path: &str, request: &[u8]) -> Result<Vec<u8>> {
        debug!("query {} at height {}", path, ctx.block_height);
        match path {
            QUERY_RESOLVE_DOMAIN => {
                let req: QueryResolveDomain = parse(path, request)?;
                respond(&QueryResolveDomainResponse {
                    domain: self.resolve_domain(&req.name)?,
                })
            }
            QUERY_RESOLVE_ACCOUNT => {
                let req: QueryResolveAccount = parse(path, request)?;
                respond(&QueryResolveAccountResponse {
                    account: self.resolve_account(&req.domain, &req.name)?,
                })
            }
            QUERY_ACCOUNTS_IN_DOMAIN => {
                let req: QueryAccountsInDomain = parse(path, request)?;
                respond(&AccountsResponse {
                    accounts: self.accounts_in_domain(&req.domain, req.page)?,
                })
            }
            QUERY_DOMAINS_OWNED_BY => {
                let req: QueryDomainsOwnedBy = parse(path, request)?;
                respond(&DomainsResponse {
                    domains: self.domains_owned_by(&req.owner, req.page)?,
                })
            }
            QUERY_ACCOUNTS_OWNED_BY => {
                let req: QueryAccountsOwnedBy = parse(path, request)?;
                respond(&AccountsResponse {
                    accounts: self.accounts_owned_by(&req.owner, req.page)?,
                })
            }
            QUERY_ACCOUNTS_BY_TARGET => {
                let req: QueryAccountsByTarget = parse(path, request)?;
                let target = BlockchainAddress::new(req.blockchain_id, req.address);
                respond(&AccountsResponse {
                    accounts: self.accounts_by_target(&target, req.page)?,
                })
            }
            QUERY_ACCOUNTS_BY_CERTIFICATE => {
                let req: QueryAccountsByCertificate = parse(path, request)?;
                respond(&AccountsResponse {
                    accounts: self.accounts_by_certificate(&req.certificate, req.page)?,
                })
            }
            unknown => Err(StarnameError::InvalidRequest(format!("unknown query path {:?}", unknown))),
        }
    }

    fn hydrate_accounts(&self, object_keys: &[Vec<u8>], page: Page) -> Result<Vec<Account>> {
        page.slice(object_keys)?
            .iter()
            .map(|key| self.account_by_object_key(key))
            .collect()
    }
}

fn reject_no_owner(owner: &Address) -> Result<()> {
    if owner.is_none() {
        return Err(StarnameError::InvalidOwner("the empty address owns nothing".to_string()));
    }
    Ok(())
}

fn parse<T: DeserializeOwned>(path: &str, request: &[u8]) -> Result<T> {
    serde_json::from_slice(request)
        .map_err(|e| StarnameError::InvalidRequest(format!("malformed {} request: {}", path, e)))
}

fn respond<T: Serialize>(response: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::DomainType;
    use crate::store::MemoryStore;
    use crate::testutil::{alice, bob, charlie, ctx, keeper};
    use rstest::rstest;
    use serde_json::json;

    /// Domain "x" without a root account, plus accounts a, b and c
    fn three_accounts() -> Keeper<MemoryStore> {
        let mut keeper = keeper();
        keeper
            .create_domain(&Domain {
                name: "x".to_string(),
                admin: alice(),
                valid_until: 1_000,
                domain_type: DomainType::Closed,
                account_renew: 500,
                broker: None,
            })
            .unwrap();
        for (name, owner) in [("c", bob()), ("a", bob()), ("b", charlie())] {
            let mut account = Account::new("x", name, owner, 1_000);
            account.targets = vec![BlockchainAddress::new("eth", "0x1")];
            keeper.create_account(&account).unwrap();
        }
        keeper
    }

    fn names(accounts: Vec<Account>) -> Vec<String> {
        accounts.into_iter().map(|a| a.name).collect()
    }

    #[rstest]
    #[case(1, 1, vec!["a"])]
    #[case(2, 1, vec!["b"])]
    #[case(3, 1, vec!["c"])]
    #[case(1, 2, vec!["a", "b"])]
    #[case(2, 2, vec!["c"])]
    #[case(0, 0, vec!["a", "b", "c"])]
    #[case(-1, -5, vec!["a", "b", "c"])]
    fn test_accounts_in_domain_pages(#[case] offset: i64, #[case] per_page: i64, #[case] expected: Vec<&str>) {
        let keeper = three_accounts();
        let accounts = keeper.accounts_in_domain("x", Page::new(offset, per_page)).unwrap();
        assert_eq!(names(accounts), expected);
    }

    #[rstest]
    #[case(4, 1)]
    #[case(3, 2)]
    #[case(2, 100)]
    #[case(i64::MAX, 2)]
    fn test_offset_past_last_page(#[case] offset: i64, #[case] per_page: i64) {
        let keeper = three_accounts();
        let err = keeper.accounts_in_domain("x", Page::new(offset, per_page)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    fn test_empty_list_is_never_an_error(#[case] offset: i64) {
        let keeper = keeper();
        assert!(keeper.accounts_in_domain("none", Page::new(offset, 1)).unwrap().is_empty());
        assert!(keeper.accounts_owned_by(&bob(), Page::new(offset, 1)).unwrap().is_empty());
        assert!(keeper.domains_owned_by(&bob(), Page::new(offset, 1)).unwrap().is_empty());
    }

    #[test]
    fn test_owner_queries() {
        let keeper = three_accounts();

        let owned = keeper.accounts_owned_by(&bob(), Page::default()).unwrap();
        assert_eq!(names(owned), vec!["a", "c"]);
        let domains = keeper.domains_owned_by(&alice(), Page::default()).unwrap();
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].name, "x");

        let err = keeper.accounts_owned_by(&Address::NONE, Page::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOwner);
    }

    #[test]
    fn test_accounts_by_target_and_certificate() {
        let mut keeper = three_accounts();
        let account = keeper.get_account("x", "b").unwrap().unwrap();
        keeper.add_account_certificate(&account, b"cert1").unwrap();

        let by_target = keeper
            .accounts_by_target(&BlockchainAddress::new("eth", "0x1"), Page::new(2, 1))
            .unwrap();
        assert_eq!(names(by_target), vec!["b"]);

        let by_certificate = keeper.accounts_by_certificate(b"cert1", Page::default()).unwrap();
        assert_eq!(names(by_certificate), vec!["b"]);

        let oversized = BlockchainAddress::new("eth", "0".repeat(300));
        let err = keeper.accounts_by_target(&oversized, Page::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidBlockchainTarget);
    }

    #[test]
    fn test_resolve() {
        let keeper = three_accounts();

        assert_eq!(keeper.resolve_domain("x").unwrap().admin, alice());
        assert_eq!(keeper.resolve_account("x", "a").unwrap().owner, bob());
        assert_eq!(keeper.resolve_domain("y").unwrap_err().kind(), ErrorKind::DomainDoesNotExist);
        assert_eq!(keeper.resolve_account("x", "z").unwrap_err().kind(), ErrorKind::AccountDoesNotExist);
    }

    #[test]
    fn test_query_dispatch() {
        let keeper = three_accounts();
        let request = json!({"blockchain_id": "eth", "address": "0x1", "offset": 1, "results_per_page": 2});

        let raw = keeper
            .query(&ctx(0), QUERY_ACCOUNTS_BY_TARGET, request.to_string().as_bytes())
            .unwrap();
        let response: AccountsResponse = serde_json::from_slice(&raw).unwrap();
        assert_eq!(names(response.accounts), vec!["a", "b"]);

        let raw = keeper
            .query(&ctx(0), QUERY_RESOLVE_DOMAIN, json!({"name": "x"}).to_string().as_bytes())
            .unwrap();
        let response: QueryResolveDomainResponse = serde_json::from_slice(&raw).unwrap();
        assert_eq!(response.domain.name, "x");

        // paging fields are optional
        let raw = keeper
            .query(&ctx(0), QUERY_ACCOUNTS_IN_DOMAIN, json!({"domain": "x"}).to_string().as_bytes())
            .unwrap();
        let response: AccountsResponse = serde_json::from_slice(&raw).unwrap();
        assert_eq!(response.accounts.len(), 3);
    }

    #[rstest]
    #[case("no-such-query", "{}")]
    #[case(QUERY_RESOLVE_DOMAIN, "not json")]
    #[case(QUERY_RESOLVE_ACCOUNT, "{\"domain\": \"x\"}")]
    fn test_query_rejects_bad_requests(#[case] path: &str, #[case] body: &str) {
        let keeper = three_accounts();
        let err = keeper.query(&ctx(0), path, body.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }
}
