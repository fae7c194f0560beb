//! Message handlers
//!
//! Every handler runs its controller checks, then collects the message fee,
//! then mutates the store. Nothing is written before the last check passes.
//! Use [`Keeper::deliver`] to get all-or-nothing semantics when a mutation
//! step itself fails.

use crate::error::Result;
use crate::keeper::Keeper;
use crate::models::{Context, Msg};
use crate::store::KvStore;

pub mod account;
pub mod domain;

/// Route `msg` to its handler
pub fn dispatch<S: KvStore>(ctx: &Context, keeper: &mut Keeper<S>, msg: &Msg) -> Result<()> {
    match msg {
        Msg::RegisterDomain(m) => domain::register_domain(ctx, keeper, m),
        Msg::RenewDomain(m) => domain::renew_domain(ctx, keeper, m),
        Msg::DeleteDomain(m) => domain::delete_domain(ctx, keeper, m),
        Msg::TransferDomain(m) => domain::transfer_domain(ctx, keeper, m),
        Msg::FlushDomain(m) => domain::flush_domain(ctx, keeper, m),
        Msg::RegisterAccount(m) => account::register_account(ctx, keeper, m),
        Msg::RenewAccount(m) => account::renew_account(ctx, keeper, m),
        Msg::DeleteAccount(m) => account::delete_account(ctx, keeper, m),
        Msg::TransferAccount(m) => account::transfer_account(ctx, keeper, m),
        Msg::AddAccountCertificate(m) => account::add_account_certificate(ctx, keeper, m),
        Msg::DeleteAccountCertificate(m) => account::delete_account_certificate(ctx, keeper, m),
        Msg::ReplaceAccountTargets(m) => account::replace_account_targets(ctx, keeper, m),
        Msg::ReplaceAccountMetadata(m) => account::replace_account_metadata(ctx, keeper, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::msg::{
        MsgAddAccountCertificate, MsgDeleteAccount, MsgDeleteAccountCertificate, MsgDeleteDomain, MsgFlushDomain,
        MsgRegisterAccount, MsgRegisterDomain, MsgRenewAccount, MsgRenewDomain, MsgReplaceAccountMetadata,
        MsgReplaceAccountTargets, MsgTransferAccount, MsgTransferDomain,
    };
    use crate::models::{Account, Address, BlockchainAddress, DomainType, TransferFlag};
    use crate::store::{keys, MemoryStore};
    use crate::testutil::{alice, bob, charlie, ctx, keeper};
    use proptest::collection::vec;
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;

    const DOMAINS: [&str; 2] = ["x", "y"];
    const NAMES: [&str; 3] = ["", "a", "b"];
    const CERTIFICATES: [&[u8]; 2] = [b"cert-1", b"cert-2"];

    /// kind, domain, name, signer, other address, target mask, certificate, flag, switch, block time
    type Op = (u8, usize, usize, usize, usize, u8, usize, u8, bool, i64);

    fn addresses() -> [Address; 3] {
        [alice(), bob(), charlie()]
    }

    fn target_pool() -> [BlockchainAddress; 3] {
        [
            BlockchainAddress::new("eth", "0x1"),
            BlockchainAddress::new("btc", "bc1"),
            BlockchainAddress::new("eth", "0x2"),
        ]
    }

    fn targets(mask: u8) -> Vec<BlockchainAddress> {
        target_pool()
            .into_iter()
            .enumerate()
            .filter(|(i, _)| mask & (1u8 << *i) != 0)
            .map(|(_, target)| target)
            .collect()
    }

    fn op() -> impl Strategy<Value = Op> {
        (
            0u8..13,
            0usize..DOMAINS.len(),
            0usize..NAMES.len(),
            0usize..3,
            0usize..3,
            0u8..8,
            0usize..CERTIFICATES.len(),
            0u8..3,
            any::<bool>(),
            0i64..1_500,
        )
    }

    fn build(op: &Op) -> Msg {
        let (kind, d, n, s, o, mask, c, flag, switch, _) = *op;
        let domain = DOMAINS[d].to_string();
        let name = NAMES[n].to_string();
        let signer = addresses()[s];
        let other = addresses()[o];
        let certificate = CERTIFICATES[c].to_vec();
        match kind {
            0 => Msg::RegisterDomain(MsgRegisterDomain {
                name: domain,
                admin: signer,
                domain_type: if switch { DomainType::Open } else { DomainType::Closed },
                broker: None,
                fee_payer: None,
            }),
            1 => Msg::RenewDomain(MsgRenewDomain { domain, signer, fee_payer: None }),
            2 => Msg::DeleteDomain(MsgDeleteDomain { domain, owner: signer, fee_payer: None }),
            3 => Msg::TransferDomain(MsgTransferDomain {
                domain,
                owner: signer,
                new_admin: other,
                transfer_flag: match flag {
                    0 => TransferFlag::Flush,
                    1 => TransferFlag::Owned,
                    _ => TransferFlag::None,
                },
                fee_payer: None,
            }),
            4 => Msg::FlushDomain(MsgFlushDomain { domain, owner: signer, fee_payer: None }),
            5 => Msg::RegisterAccount(MsgRegisterAccount {
                domain,
                name,
                owner: other,
                registerer: signer,
                targets: targets(mask),
                broker: None,
                fee_payer: None,
            }),
            6 => Msg::RenewAccount(MsgRenewAccount { domain, name, signer, fee_payer: None }),
            7 => Msg::DeleteAccount(MsgDeleteAccount { domain, name, owner: signer, fee_payer: None }),
            8 => Msg::TransferAccount(MsgTransferAccount {
                domain,
                name,
                owner: signer,
                new_owner: other,
                reset: switch,
                fee_payer: None,
            }),
            9 => Msg::AddAccountCertificate(MsgAddAccountCertificate {
                domain,
                name,
                owner: signer,
                new_certificate: certificate,
                fee_payer: None,
            }),
            10 => Msg::DeleteAccountCertificate(MsgDeleteAccountCertificate {
                domain,
                name,
                owner: signer,
                delete_certificate: certificate,
                fee_payer: None,
            }),
            11 => Msg::ReplaceAccountTargets(MsgReplaceAccountTargets {
                domain,
                name,
                owner: signer,
                new_targets: targets(mask),
                fee_payer: None,
            }),
            _ => Msg::ReplaceAccountMetadata(MsgReplaceAccountMetadata {
                domain,
                name,
                owner: signer,
                new_metadata_uri: if switch { "ipfs://meta".to_string() } else { String::new() },
                fee_payer: None,
            }),
        }
    }

    fn sorted_object_keys<'a>(accounts: impl Iterator<Item = &'a Account>) -> Vec<Vec<u8>> {
        let mut object_keys: Vec<Vec<u8>> = accounts
            .map(|account| keys::account_object_key(&account.domain, &account.name))
            .collect();
        object_keys.sort();
        object_keys
    }

    fn sorted(mut object_keys: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
        object_keys.sort();
        object_keys
    }

    /// Compare every secondary index with a full scan of the records
    fn assert_indexes_match_records(keeper: &Keeper<MemoryStore>) -> std::result::Result<(), TestCaseError> {
        let domains = keeper.all_domains().unwrap();
        let mut accounts = Vec::new();
        keeper
            .iterate_all_accounts(|account| {
                accounts.push(account);
                true
            })
            .unwrap();

        for account in &accounts {
            prop_assert!(domains.iter().any(|domain| domain.name == account.domain));
        }

        for address in addresses() {
            let mut expected: Vec<Vec<u8>> = domains
                .iter()
                .filter(|domain| domain.admin == address)
                .map(|domain| domain.name.as_bytes().to_vec())
                .collect();
            expected.sort();
            prop_assert_eq!(sorted(keeper.domain_keys_owned_by(&address)), expected);

            let expected = sorted_object_keys(accounts.iter().filter(|account| account.owner == address));
            prop_assert_eq!(sorted(keeper.account_keys_owned_by(&address)), expected);
        }

        for target in target_pool() {
            let expected = sorted_object_keys(accounts.iter().filter(|account| account.targets.contains(&target)));
            prop_assert_eq!(sorted(keeper.account_keys_by_target(&target).unwrap()), expected);
        }

        for certificate in CERTIFICATES {
            let expected = sorted_object_keys(
                accounts
                    .iter()
                    .filter(|account| account.certificates.iter().any(|c| c.as_slice() == certificate)),
            );
            prop_assert_eq!(sorted(keeper.account_keys_by_certificate(certificate).unwrap()), expected);
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_indexes_follow_any_message_sequence(ops in vec(op(), 1..60)) {
            let mut keeper = keeper();
            for op in &ops {
                // most random messages are rejected; indexes must hold either way
                let _ = keeper.deliver(&ctx(op.9), &build(op));
                assert_indexes_match_records(&keeper)?;
            }
        }
    }

    #[test]
    fn test_dispatch_routes_to_handler() {
        let mut keeper = keeper();
        let msg = build(&(0, 0, 0, 0, 0, 0, 0, 0, false, 0));

        dispatch(&ctx(0), &mut keeper, &msg).unwrap();

        assert_eq!(keeper.get_domain("x").unwrap().unwrap().admin, alice());
        assert_eq!(keeper.account_keys_owned_by(&alice()), vec![b"x*".to_vec()]);
    }
}
