use lazor_assertions::check_writable;
use lazorkit_state::Role;

use super::{
    authenticate_acting, load_wallet, payer, record_counter, require_admin_or_owner,
    resolve_authority, ACTING_INDEX, WALLET_INDEX,
};
use crate::context::InvokeContext;
use crate::error::LazorKitError;
use crate::ledger::StateDelta;

const TARGET_INDEX: usize = 3;
const REFUND_INDEX: usize = 4;

/// Removes a non-owner authority and closes its PDA into the refund destination.
///
/// The signed payload binds the target and refund addresses so a signature
/// cannot be replayed against another authority.
pub fn process_remove_authority(
    ctx: &InvokeContext<'_>,
    auth_payload: &[u8],
    discriminator: &[u8],
) -> Result<StateDelta, LazorKitError> {
    ctx.require_accounts(REFUND_INDEX + 1)?;
    payer(ctx)?;

    let wallet_meta = ctx.account(WALLET_INDEX)?;
    let target_meta = ctx.account(TARGET_INDEX)?;
    let refund_meta = ctx.account(REFUND_INDEX)?;
    check_writable(refund_meta, LazorKitError::Unauthorized)?;

    let mut wallet = load_wallet(ctx, wallet_meta)?;
    let acting = *resolve_authority(ctx, &wallet_meta.key, &wallet, ctx.account(ACTING_INDEX)?)?;

    let mut signed_payload = Vec::with_capacity(64);
    signed_payload.extend_from_slice(&target_meta.key);
    signed_payload.extend_from_slice(&refund_meta.key);
    let outcome = authenticate_acting(
        ctx,
        &acting,
        auth_payload,
        &signed_payload,
        discriminator,
        false,
    )?;

    let target = *resolve_authority(ctx, &wallet_meta.key, &wallet, target_meta)?;
    if target.role == Role::Owner {
        log::debug!("RemoveAuthority: owner {} cannot be removed", target.id);
        return Err(LazorKitError::CannotRemoveOwner);
    }

    require_admin_or_owner(&acting)?;
    if acting.role == Role::Admin && target.role != Role::Spender {
        log::debug!(
            "RemoveAuthority: admin {} cannot remove {:?} {}",
            acting.id,
            target.role,
            target.id
        );
        return Err(LazorKitError::Unauthorized);
    }

    record_counter(&mut wallet, acting.id, &outcome)?;
    wallet.remove(target.id)?;

    let mut delta = StateDelta::new();
    delta.store(wallet_meta.key, wallet.to_bytes());
    delta.close(target_meta.key, refund_meta.key);

    log::info!(
        "RemoveAuthority: authority {} removed id {}",
        acting.id,
        target.id
    );
    Ok(delta)
}
