use lazor_assertions::{check_key_match, check_zero_data};
use lazorkit_state::AuthorityAccount;

use super::{
    authenticate_acting, check_system_program, load_wallet, payer, record_counter,
    require_owner, resolve_authority, ACTING_INDEX, WALLET_INDEX,
};
use crate::context::InvokeContext;
use crate::error::LazorKitError;
use crate::instruction::AuthorityPayload;
use crate::ledger::StateDelta;

const NEW_OWNER_INDEX: usize = 3;
const SYSTEM_INDEX: usize = 4;

/// Replaces the owner's key material in place. The owner keeps its id, so the
/// wallet never passes through a state without an owner.
pub fn process_transfer_ownership(
    ctx: &InvokeContext<'_>,
    new_owner: &AuthorityPayload,
    auth_payload: &[u8],
    signed_payload: &[u8],
    discriminator: &[u8],
) -> Result<StateDelta, LazorKitError> {
    ctx.require_accounts(SYSTEM_INDEX + 1)?;
    let payer_meta = payer(ctx)?;
    check_system_program(ctx, SYSTEM_INDEX)?;

    let wallet_meta = ctx.account(WALLET_INDEX)?;
    let current_meta = ctx.account(ACTING_INDEX)?;
    let mut wallet = load_wallet(ctx, wallet_meta)?;
    let current = *resolve_authority(ctx, &wallet_meta.key, &wallet, current_meta)?;
    let outcome = authenticate_acting(
        ctx,
        &current,
        auth_payload,
        signed_payload,
        discriminator,
        false,
    )?;
    require_owner(&current)?;

    let (new_key, new_bump) = ctx.deriver().authority(&wallet_meta.key, &new_owner.seed)?;
    check_key_match(
        ctx.account(NEW_OWNER_INDEX)?,
        &new_key,
        LazorKitError::PdaMismatch,
    )?;

    record_counter(&mut wallet, current.id, &outcome)?;
    wallet.replace_owner(new_owner.seed, new_owner.data)?;
    if new_key != current_meta.key {
        check_zero_data(
            ctx.data(&new_key).unwrap_or_default(),
            LazorKitError::AlreadyInitialized,
        )?;
    }

    let record = AuthorityAccount {
        bump: new_bump,
        authority_id: current.id,
        wallet: wallet_meta.key,
        seed: new_owner.seed,
    };

    let mut delta = StateDelta::new();
    delta.store(wallet_meta.key, wallet.to_bytes());
    if new_key != current_meta.key {
        delta.close(current_meta.key, payer_meta.key);
    }
    delta.store(new_key, record.to_bytes());

    log::info!(
        "TransferOwnership: owner {} now {:?}",
        current.id,
        new_owner.authority_type()
    );
    Ok(delta)
}
