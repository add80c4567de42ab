use lazor_assertions::{check_key_match, check_zero_data};
use lazorkit_state::{AuthorityAccount, Role};

use super::{
    authenticate_acting, check_system_program, load_wallet, payer, record_counter,
    require_admin_or_owner, resolve_authority, ACTING_INDEX, WALLET_INDEX,
};
use crate::context::InvokeContext;
use crate::error::LazorKitError;
use crate::instruction::AuthorityPayload;
use crate::ledger::StateDelta;

const NEW_AUTHORITY_INDEX: usize = 3;
const SYSTEM_INDEX: usize = 4;

/// Registers a new authority under the smallest free id.
///
/// Owners may add Admins and Spenders; Admins may add Spenders only. Nobody
/// adds an Owner, ownership moves through TransferOwnership.
pub fn process_add_authority(
    ctx: &InvokeContext<'_>,
    new_role: Role,
    authority: &AuthorityPayload,
    auth_payload: &[u8],
    signed_payload: &[u8],
    discriminator: &[u8],
) -> Result<StateDelta, LazorKitError> {
    ctx.require_accounts(SYSTEM_INDEX + 1)?;
    payer(ctx)?;
    check_system_program(ctx, SYSTEM_INDEX)?;

    let wallet_meta = ctx.account(WALLET_INDEX)?;
    let mut wallet = load_wallet(ctx, wallet_meta)?;
    let acting = *resolve_authority(ctx, &wallet_meta.key, &wallet, ctx.account(ACTING_INDEX)?)?;
    let outcome = authenticate_acting(
        ctx,
        &acting,
        auth_payload,
        signed_payload,
        discriminator,
        false,
    )?;

    require_admin_or_owner(&acting)?;
    match (acting.role, new_role) {
        (_, Role::Owner) => {
            log::debug!("AddAuthority: a second owner cannot be added");
            return Err(LazorKitError::Unauthorized);
        },
        (Role::Admin, Role::Admin) => {
            log::debug!("AddAuthority: admin {} cannot add admins", acting.id);
            return Err(LazorKitError::Unauthorized);
        },
        _ => {},
    }

    let (new_key, new_bump) = ctx.deriver().authority(&wallet_meta.key, &authority.seed)?;
    check_key_match(
        ctx.account(NEW_AUTHORITY_INDEX)?,
        &new_key,
        LazorKitError::PdaMismatch,
    )?;
    check_zero_data(
        ctx.data(&new_key).unwrap_or_default(),
        LazorKitError::AlreadyInitialized,
    )?;

    record_counter(&mut wallet, acting.id, &outcome)?;
    let new_id = wallet.insert(new_role, authority.seed, authority.data)?;
    let record = AuthorityAccount {
        bump: new_bump,
        authority_id: new_id,
        wallet: wallet_meta.key,
        seed: authority.seed,
    };

    let mut delta = StateDelta::new();
    delta.store(wallet_meta.key, wallet.to_bytes());
    delta.store(new_key, record.to_bytes());

    log::info!(
        "AddAuthority: authority {} added {:?} {:?} as id {}",
        acting.id,
        new_role,
        authority.authority_type(),
        new_id
    );
    Ok(delta)
}
