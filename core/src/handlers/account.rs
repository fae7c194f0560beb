//! Account message handlers

use log::debug;

use crate::controllers::{AccountCheck, AccountController, DomainCheck, DomainController};
use crate::error::{Result, StarnameError};
use crate::keeper::Keeper;
use crate::models::msg::{
    MsgAddAccountCertificate, MsgDeleteAccount, MsgDeleteAccountCertificate, MsgRegisterAccount,
    MsgRenewAccount, MsgReplaceAccountMetadata, MsgReplaceAccountTargets, MsgTransferAccount,
};
use crate::models::{Account, Context, Domain, DomainType, Msg, NEVER_EXPIRES};
use crate::store::KvStore;

use super::domain::load as load_domain;

/// Register an account
///
/// Closed domains only accept registrations from their admin; their
/// accounts never expire. Open domains accept anyone and grant the
/// configured account renewal period.
pub fn register_account<S: KvStore>(ctx: &Context, keeper: &mut Keeper<S>, msg: &MsgRegisterAccount) -> Result<()> {
    if msg.owner.is_none() {
        return Err(StarnameError::InvalidOwner(format!("account {}*{} needs an owner", msg.name, msg.domain)));
    }
    let domain = {
        let mut controller = DomainController::new(ctx, keeper, &msg.domain);
        controller.validate(&[DomainCheck::MustExist, DomainCheck::NotExpired])?;
        if controller.domain().domain_type == DomainType::Closed {
            controller
                .validate(&[DomainCheck::Admin(&msg.registerer)])
                .map_err(|e| e.context("closed domains only accept registrations from their admin"))?;
        }
        controller.into_domain()
    };
    AccountController::new(ctx, keeper, &msg.domain, &msg.name).validate(&[
        AccountCheck::MustNotExist,
        AccountCheck::ValidName,
        AccountCheck::ValidTargets(&msg.targets),
    ])?;

    keeper.collect_fees(ctx, &Msg::RegisterAccount(msg.clone()))?;

    let valid_until = match domain.domain_type {
        DomainType::Closed => NEVER_EXPIRES,
        DomainType::Open => ctx
            .now()
            .saturating_add(keeper.configuration(ctx).account_renewal_secs())
            .min(NEVER_EXPIRES),
    };
    let mut account = Account::new(&msg.domain, &msg.name, msg.owner, valid_until);
    account.targets = msg.targets.clone();
    account.broker = msg.broker;

    keeper.create_account(&account)?;
    Ok(())
}

/// Extend an account by its domain's account renewal period
pub fn renew_account<S: KvStore>(ctx: &Context, keeper: &mut Keeper<S>, msg: &MsgRenewAccount) -> Result<()> {
    let domain = load_domain(ctx, keeper, &msg.domain, &[DomainCheck::MustExist])?;
    let mut account = load(ctx, keeper, &msg.domain, &msg.name, None, &[AccountCheck::MustExist])?;

    keeper.collect_fees(ctx, &Msg::RenewAccount(msg.clone()))?;

    account.valid_until = account.valid_until.saturating_add(domain.account_renew).min(NEVER_EXPIRES);
    keeper.set_account(&account)?;
    debug!("renewed account {} until {}", account.starname(), account.valid_until);
    Ok(())
}

/// Delete an account; its owner or the domain admin may do so
pub fn delete_account<S: KvStore>(ctx: &Context, keeper: &mut Keeper<S>, msg: &MsgDeleteAccount) -> Result<()> {
    let domain = load_domain(ctx, keeper, &msg.domain, &[DomainCheck::MustExist])?;
    load(
        ctx,
        keeper,
        &msg.domain,
        &msg.name,
        Some(domain),
        &[AccountCheck::NotRoot, AccountCheck::MustExist, AccountCheck::DeletableBy(&msg.owner)],
    )?;

    keeper.collect_fees(ctx, &Msg::DeleteAccount(msg.clone()))?;

    keeper.delete_account(&msg.domain, &msg.name)?;
    Ok(())
}

/// Give an account to a new owner
///
/// Accounts of open domains are always reset on transfer; in closed domains
/// the admin chooses.
pub fn transfer_account<S: KvStore>(ctx: &Context, keeper: &mut Keeper<S>, msg: &MsgTransferAccount) -> Result<()> {
    if msg.new_owner.is_none() {
        return Err(StarnameError::InvalidOwner(format!("account {}*{} needs an owner", msg.name, msg.domain)));
    }
    let domain = load_domain(ctx, keeper, &msg.domain, &[DomainCheck::MustExist])?;
    let reset = msg.reset || domain.domain_type == DomainType::Open;
    let account = load(
        ctx,
        keeper,
        &msg.domain,
        &msg.name,
        Some(domain),
        &[
            AccountCheck::NotRoot,
            AccountCheck::MustExist,
            AccountCheck::NotExpired,
            AccountCheck::TransferableBy(&msg.owner),
        ],
    )?;

    keeper.collect_fees(ctx, &Msg::TransferAccount(msg.clone()))?;

    keeper.transfer_account(&account, &msg.new_owner, reset)?;
    Ok(())
}

/// Attach a certificate to an account
pub fn add_account_certificate<S: KvStore>(
    ctx: &Context,
    keeper: &mut Keeper<S>,
    msg: &MsgAddAccountCertificate,
) -> Result<()> {
    let account = load(
        ctx,
        keeper,
        &msg.domain,
        &msg.name,
        None,
        &[
            AccountCheck::MustExist,
            AccountCheck::Owner(&msg.owner),
            AccountCheck::CertificateSize(&msg.new_certificate),
            AccountCheck::CertificateNotExist(&msg.new_certificate),
            AccountCheck::CertificateLimit,
        ],
    )?;

    keeper.collect_fees(ctx, &Msg::AddAccountCertificate(msg.clone()))?;

    keeper.add_account_certificate(&account, &msg.new_certificate)?;
    Ok(())
}

/// Detach a certificate from an account
pub fn delete_account_certificate<S: KvStore>(
    ctx: &Context,
    keeper: &mut Keeper<S>,
    msg: &MsgDeleteAccountCertificate,
) -> Result<()> {
    let (account, index) = {
        let mut controller = AccountController::new(ctx, keeper, &msg.domain, &msg.name);
        controller.validate(&[
            AccountCheck::MustExist,
            AccountCheck::Owner(&msg.owner),
            AccountCheck::CertificateExists(&msg.delete_certificate),
        ])?;
        let index = controller.certificate_index().ok_or_else(|| {
            StarnameError::CertificateDoesNotExist(hex::encode(&msg.delete_certificate))
        })?;
        (controller.into_account(), index)
    };

    keeper.collect_fees(ctx, &Msg::DeleteAccountCertificate(msg.clone()))?;

    keeper.delete_account_certificate(&account, index)?;
    Ok(())
}

/// Replace the targets of an account
///
/// Expired accounts of open domains may not change their targets.
pub fn replace_account_targets<S: KvStore>(
    ctx: &Context,
    keeper: &mut Keeper<S>,
    msg: &MsgReplaceAccountTargets,
) -> Result<()> {
    let domain = load_domain(ctx, keeper, &msg.domain, &[DomainCheck::MustExist])?;
    let mut checks = vec![
        AccountCheck::MustExist,
        AccountCheck::Owner(&msg.owner),
        AccountCheck::ValidTargets(&msg.new_targets),
    ];
    if domain.domain_type == DomainType::Open {
        checks.push(AccountCheck::NotExpired);
    }
    let account = load(ctx, keeper, &msg.domain, &msg.name, Some(domain), &checks)?;

    keeper.collect_fees(ctx, &Msg::ReplaceAccountTargets(msg.clone()))?;

    keeper.replace_account_targets(&account, msg.new_targets.clone())?;
    Ok(())
}

/// Replace the metadata URI of an account
pub fn replace_account_metadata<S: KvStore>(
    ctx: &Context,
    keeper: &mut Keeper<S>,
    msg: &MsgReplaceAccountMetadata,
) -> Result<()> {
    let account = load(
        ctx,
        keeper,
        &msg.domain,
        &msg.name,
        None,
        &[
            AccountCheck::MustExist,
            AccountCheck::Owner(&msg.owner),
            AccountCheck::MetadataSize(&msg.new_metadata_uri),
        ],
    )?;

    keeper.collect_fees(ctx, &Msg::ReplaceAccountMetadata(msg.clone()))?;

    keeper.replace_account_metadata(&account, &msg.new_metadata_uri)?;
    Ok(())
}

fn load<S: KvStore>(
    ctx: &Context,
    keeper: &Keeper<S>,
    domain: &str,
    name: &str,
    parent: Option<Domain>,
    checks: &[AccountCheck<'_>],
) -> Result<Account> {
    let mut controller = AccountController::new(ctx, keeper, domain, name);
    if let Some(parent) = parent {
        controller = controller.with_domain(parent);
    }
    controller.validate(checks)?;
    Ok(controller.into_account())
}
