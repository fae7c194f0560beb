//! State transition messages
//!
//! Messages arrive already decoded and signature-checked. `fee_payer`, when
//! set, pays the fee instead of the signer.

use serde::{Deserialize, Serialize};

use super::account::BlockchainAddress;
use super::address::Address;
use super::domain::DomainType;

/// What happens to the accounts of a domain when the domain changes hands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferFlag {
    /// Delete every account except the root account
    Flush,

    /// Transfer the accounts owned by the previous admin
    Owned,

    /// Transfer only the root account
    None,
}

/// Register a new domain and its root account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRegisterDomain {
    /// Name of the new domain
    pub name: String,
    /// Admin of the domain and owner of its root account; the signer
    pub admin: Address,
    /// Governance model of the domain
    pub domain_type: DomainType,
    /// Facilitator of the registration
    pub broker: Option<Address>,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Extend a domain by the configured renewal period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRenewDomain {
    /// Domain to renew
    pub domain: String,
    /// Anyone may renew a domain
    pub signer: Address,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Delete a closed domain with all of its accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeleteDomain {
    /// Domain to delete
    pub domain: String,
    /// Signer; the admin, or anyone once the grace period is over
    pub owner: Address,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Hand a closed domain to a new admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTransferDomain {
    /// Domain to transfer
    pub domain: String,
    /// Current admin; the signer
    pub owner: Address,
    /// Admin after the transfer
    pub new_admin: Address,
    /// What happens to the non-root accounts
    pub transfer_flag: TransferFlag,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Delete every non-root account of a closed domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgFlushDomain {
    /// Domain to flush
    pub domain: String,
    /// Admin of the domain; the signer
    pub owner: Address,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Register an account under an existing domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRegisterAccount {
    /// Parent domain
    pub domain: String,
    /// Account name
    pub name: String,
    /// Owner of the new account
    pub owner: Address,
    /// Signer of the registration; must be the admin of a closed domain
    pub registerer: Address,
    /// Initial resolution targets
    pub targets: Vec<BlockchainAddress>,
    /// Facilitator of the registration
    pub broker: Option<Address>,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Extend an account by its domain's account renewal period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRenewAccount {
    /// Parent domain
    pub domain: String,
    /// Account name
    pub name: String,
    /// Anyone may renew an account
    pub signer: Address,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Delete a non-root account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeleteAccount {
    /// Parent domain
    pub domain: String,
    /// Account name
    pub name: String,
    /// Signer; the account owner or the domain admin
    pub owner: Address,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Give a non-root account to a new owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTransferAccount {
    /// Parent domain
    pub domain: String,
    /// Account name
    pub name: String,
    /// Signer; the owner in open domains, the admin in closed ones
    pub owner: Address,
    /// Owner after the transfer
    pub new_owner: Address,
    /// Clear targets, certificates and metadata on transfer
    pub reset: bool,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Attach a certificate to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAddAccountCertificate {
    /// Parent domain
    pub domain: String,
    /// Account name
    pub name: String,
    /// Account owner; the signer
    pub owner: Address,
    /// Certificate to attach
    pub new_certificate: Vec<u8>,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Detach a certificate from an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeleteAccountCertificate {
    /// Parent domain
    pub domain: String,
    /// Account name
    pub name: String,
    /// Account owner; the signer
    pub owner: Address,
    /// Certificate to detach
    pub delete_certificate: Vec<u8>,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Replace every target of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgReplaceAccountTargets {
    /// Parent domain
    pub domain: String,
    /// Account name
    pub name: String,
    /// Account owner; the signer
    pub owner: Address,
    /// Targets after the replacement
    pub new_targets: Vec<BlockchainAddress>,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Replace the metadata URI of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgReplaceAccountMetadata {
    /// Parent domain
    pub domain: String,
    /// Account name
    pub name: String,
    /// Account owner; the signer
    pub owner: Address,
    /// Metadata URI after the replacement; empty clears it
    pub new_metadata_uri: String,
    /// Pays the fee instead of the signer
    pub fee_payer: Option<Address>,
}

/// Any state transition message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Msg {
    /// See [`MsgRegisterDomain`]
    RegisterDomain(MsgRegisterDomain),
    /// See [`MsgRenewDomain`]
    RenewDomain(MsgRenewDomain),
    /// See [`MsgDeleteDomain`]
    DeleteDomain(MsgDeleteDomain),
    /// See [`MsgTransferDomain`]
    TransferDomain(MsgTransferDomain),
    /// See [`MsgFlushDomain`]
    FlushDomain(MsgFlushDomain),
    /// See [`MsgRegisterAccount`]
    RegisterAccount(MsgRegisterAccount),
    /// See [`MsgRenewAccount`]
    RenewAccount(MsgRenewAccount),
    /// See [`MsgDeleteAccount`]
    DeleteAccount(MsgDeleteAccount),
    /// See [`MsgTransferAccount`]
    TransferAccount(MsgTransferAccount),
    /// See [`MsgAddAccountCertificate`]
    AddAccountCertificate(MsgAddAccountCertificate),
    /// See [`MsgDeleteAccountCertificate`]
    DeleteAccountCertificate(MsgDeleteAccountCertificate),
    /// See [`MsgReplaceAccountTargets`]
    ReplaceAccountTargets(MsgReplaceAccountTargets),
    /// See [`MsgReplaceAccountMetadata`]
    ReplaceAccountMetadata(MsgReplaceAccountMetadata),
}

impl Msg {
    /// Route name of the message, as used in logs and fee schedules
    pub fn route(&self) -> &'static str {
        match self {
            Msg::RegisterDomain(_) => "register_domain",
            Msg::RenewDomain(_) => "renew_domain",
            Msg::DeleteDomain(_) => "delete_domain",
            Msg::TransferDomain(_) => "transfer_domain",
            Msg::FlushDomain(_) => "flush_domain",
            Msg::RegisterAccount(_) => "register_account",
            Msg::RenewAccount(_) => "renew_account",
            Msg::DeleteAccount(_) => "delete_account",
            Msg::TransferAccount(_) => "transfer_account",
            Msg::AddAccountCertificate(_) => "add_account_certificate",
            Msg::DeleteAccountCertificate(_) => "delete_account_certificate",
            Msg::ReplaceAccountTargets(_) => "replace_account_targets",
            Msg::ReplaceAccountMetadata(_) => "replace_account_metadata",
        }
    }

    /// Address that signed the message
    pub fn signer(&self) -> Address {
        match self {
            Msg::RegisterDomain(m) => m.admin,
            Msg::RenewDomain(m) => m.signer,
            Msg::DeleteDomain(m) => m.owner,
            Msg::TransferDomain(m) => m.owner,
            Msg::FlushDomain(m) => m.owner,
            Msg::RegisterAccount(m) => m.registerer,
            Msg::RenewAccount(m) => m.signer,
            Msg::DeleteAccount(m) => m.owner,
            Msg::TransferAccount(m) => m.owner,
            Msg::AddAccountCertificate(m) => m.owner,
            Msg::DeleteAccountCertificate(m) => m.owner,
            Msg::ReplaceAccountTargets(m) => m.owner,
            Msg::ReplaceAccountMetadata(m) => m.owner,
        }
    }

    /// Address paying the fee: the explicit fee payer, else the signer
    pub fn fee_payer(&self) -> Address {
        let explicit = match self {
            Msg::RegisterDomain(m) => m.fee_payer,
            Msg::RenewDomain(m) => m.fee_payer,
            Msg::DeleteDomain(m) => m.fee_payer,
            Msg::TransferDomain(m) => m.fee_payer,
            Msg::FlushDomain(m) => m.fee_payer,
            Msg::RegisterAccount(m) => m.fee_payer,
            Msg::RenewAccount(m) => m.fee_payer,
            Msg::DeleteAccount(m) => m.fee_payer,
            Msg::TransferAccount(m) => m.fee_payer,
            Msg::AddAccountCertificate(m) => m.fee_payer,
            Msg::DeleteAccountCertificate(m) => m.fee_payer,
            Msg::ReplaceAccountTargets(m) => m.fee_payer,
            Msg::ReplaceAccountMetadata(m) => m.fee_payer,
        };
        explicit.unwrap_or_else(|| self.signer())
    }
}
