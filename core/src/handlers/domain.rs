//! Domain message handlers

use log::info;

use crate::controllers::{DomainCheck, DomainController};
use crate::error::{Result, StarnameError};
use crate::keeper::Keeper;
use crate::models::msg::{MsgDeleteDomain, MsgFlushDomain, MsgRegisterDomain, MsgRenewDomain, MsgTransferDomain};
use crate::models::{Account, Address, Context, Domain, DomainType, Msg, TransferFlag};
use crate::store::KvStore;

/// Register a domain together with its root account
pub fn register_domain<S: KvStore>(ctx: &Context, keeper: &mut Keeper<S>, msg: &MsgRegisterDomain) -> Result<()> {
    if msg.admin.is_none() {
        return Err(StarnameError::InvalidOwner(format!("domain {} needs an admin", msg.name)));
    }
    DomainController::new(ctx, keeper, &msg.name).validate(&[DomainCheck::MustNotExist, DomainCheck::ValidName])?;

    keeper.collect_fees(ctx, &Msg::RegisterDomain(msg.clone()))?;

    let config = keeper.configuration(ctx);
    let domain = Domain {
        name: msg.name.clone(),
        admin: msg.admin,
        valid_until: ctx.now().saturating_add(config.domain_renewal_secs()),
        domain_type: msg.domain_type,
        account_renew: config.account_renewal_secs(),
        broker: msg.broker,
    };
    let mut root = Account::new(&domain.name, "", domain.admin, domain.valid_until);
    root.broker = msg.broker;

    keeper.create_domain(&domain)?;
    keeper.create_account(&root)?;
    info!(
        "registered {} domain {} for {} until {}",
        domain.domain_type, domain.name, domain.admin, domain.valid_until
    );
    Ok(())
}

/// Extend a domain by the configured renewal period
pub fn renew_domain<S: KvStore>(ctx: &Context, keeper: &mut Keeper<S>, msg: &MsgRenewDomain) -> Result<()> {
    let mut domain = load(ctx, keeper, &msg.domain, &[DomainCheck::MustExist])?;

    keeper.collect_fees(ctx, &Msg::RenewDomain(msg.clone()))?;

    let renewal = keeper.configuration(ctx).domain_renewal_secs();
    domain.valid_until = domain.valid_until.saturating_add(renewal);
    keeper.set_domain(&domain)?;
    info!("renewed domain {} until {}", domain.name, domain.valid_until);
    Ok(())
}

/// Delete a closed domain and every account in it
///
/// Only the admin may delete the domain until its grace period is over;
/// after that anyone may reclaim it.
pub fn delete_domain<S: KvStore>(ctx: &Context, keeper: &mut Keeper<S>, msg: &MsgDeleteDomain) -> Result<()> {
    {
        let mut controller = DomainController::new(ctx, keeper, &msg.domain);
        controller.validate(&[DomainCheck::MustExist, DomainCheck::Type(DomainType::Closed)])?;
        if controller.domain().admin != msg.owner {
            controller
                .validate(&[DomainCheck::GracePeriodFinished])
                .map_err(|e| e.context(format!("{} is not the admin", msg.owner)))?;
        }
    }

    keeper.collect_fees(ctx, &Msg::DeleteDomain(msg.clone()))?;

    keeper.delete_domain(&msg.domain)?;
    Ok(())
}

/// Hand a closed domain to a new admin
///
/// The root account always follows the domain and is reset. The transfer
/// flag decides what happens to the other accounts.
pub fn transfer_domain<S: KvStore>(ctx: &Context, keeper: &mut Keeper<S>, msg: &MsgTransferDomain) -> Result<()> {
    if msg.new_admin.is_none() {
        return Err(StarnameError::InvalidOwner(format!("domain {} needs an admin", msg.domain)));
    }
    let domain = load(
        ctx,
        keeper,
        &msg.domain,
        &[
            DomainCheck::MustExist,
            DomainCheck::Type(DomainType::Closed),
            DomainCheck::Admin(&msg.owner),
            DomainCheck::NotExpired,
        ],
    )?;

    keeper.collect_fees(ctx, &Msg::TransferDomain(msg.clone()))?;

    let previous_admin = domain.admin;
    keeper.transfer_domain_ownership(&msg.new_admin, &domain)?;

    match msg.transfer_flag {
        TransferFlag::Flush => {
            keeper.flush_domain(&domain.name)?;
        }
        TransferFlag::Owned => transfer_owned_accounts(keeper, &domain.name, &previous_admin, &msg.new_admin)?,
        TransferFlag::None => {}
    }

    if let Some(root) = keeper.get_account(&domain.name, "")? {
        keeper.transfer_account(&root, &msg.new_admin, true)?;
    }

    info!(
        "transferred domain {} from {} to {} ({:?})",
        domain.name, previous_admin, msg.new_admin, msg.transfer_flag
    );
    Ok(())
}

/// Delete every account of a closed domain except the root account
pub fn flush_domain<S: KvStore>(ctx: &Context, keeper: &mut Keeper<S>, msg: &MsgFlushDomain) -> Result<()> {
    let domain = load(
        ctx,
        keeper,
        &msg.domain,
        &[
            DomainCheck::MustExist,
            DomainCheck::Type(DomainType::Closed),
            DomainCheck::Admin(&msg.owner),
            DomainCheck::NotExpired,
        ],
    )?;

    keeper.collect_fees(ctx, &Msg::FlushDomain(msg.clone()))?;

    keeper.flush_domain(&domain.name)?;
    Ok(())
}

/// Run `checks` and take the loaded domain; `checks` must start with `MustExist`
pub(super) fn load<S: KvStore>(ctx: &Context, keeper: &Keeper<S>, name: &str, checks: &[DomainCheck<'_>]) -> Result<Domain> {
    let mut controller = DomainController::new(ctx, keeper, name);
    controller.validate(checks)?;
    Ok(controller.into_domain())
}

fn transfer_owned_accounts<S: KvStore>(
    keeper: &mut Keeper<S>,
    domain: &str,
    previous_admin: &Address,
    new_admin: &Address,
) -> Result<()> {
    for name in keeper.account_names_in_domain(domain) {
        if name.is_empty() {
            continue;
        }
        let Some(account) = keeper.get_account(domain, &name)? else {
            continue;
        };
        if account.owner == *previous_admin {
            keeper.transfer_account(&account, new_admin, false)?;
        }
    }
    Ok(())
}
