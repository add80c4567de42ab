use lazor_assertions::check_key_match;
use lazorkit_state::SessionAccount;

use super::{
    authenticate_acting, check_system_program, load_wallet, payer, record_counter,
    require_admin_or_owner, resolve_authority, ACTING_INDEX, WALLET_INDEX,
};
use crate::context::InvokeContext;
use crate::error::LazorKitError;
use crate::ledger::StateDelta;

const SESSION_INDEX: usize = 3;
const SYSTEM_INDEX: usize = 4;

/// Opens a session for `session_key`, live until `expires_at` (exclusive).
pub fn process_create_session(
    ctx: &InvokeContext<'_>,
    session_key: [u8; 32],
    expires_at: u64,
    auth_payload: &[u8],
    signed_payload: &[u8],
    discriminator: &[u8],
) -> Result<StateDelta, LazorKitError> {
    ctx.require_accounts(SYSTEM_INDEX + 1)?;
    payer(ctx)?;
    check_system_program(ctx, SYSTEM_INDEX)?;

    let wallet_meta = ctx.account(WALLET_INDEX)?;
    let mut wallet = load_wallet(ctx, wallet_meta)?;
    let authorizer = *resolve_authority(ctx, &wallet_meta.key, &wallet, ctx.account(ACTING_INDEX)?)?;
    let outcome = authenticate_acting(
        ctx,
        &authorizer,
        auth_payload,
        signed_payload,
        discriminator,
        false,
    )?;
    require_admin_or_owner(&authorizer)?;

    let (session_pda, session_bump) = ctx.deriver().session(&wallet_meta.key, &session_key)?;
    check_key_match(
        ctx.account(SESSION_INDEX)?,
        &session_pda,
        LazorKitError::PdaMismatch,
    )?;
    if ctx.data(&session_pda).is_some() {
        log::debug!("CreateSession: session account already exists");
        return Err(LazorKitError::SessionAlreadyExists);
    }

    if expires_at <= ctx.current_slot {
        log::debug!(
            "CreateSession: expiry {} is not after slot {}",
            expires_at,
            ctx.current_slot
        );
        return Err(LazorKitError::InvalidExpiry);
    }
    if expires_at - ctx.current_slot > ctx.config.max_session_slots {
        log::debug!(
            "CreateSession: duration {} exceeds {}",
            expires_at - ctx.current_slot,
            ctx.config.max_session_slots
        );
        return Err(LazorKitError::InvalidExpiry);
    }

    let session = SessionAccount {
        bump: session_bump,
        authorizer_id: authorizer.id,
        wallet: wallet_meta.key,
        session_key,
        authorizer_seed: authorizer.seed,
        expires_at,
    };

    let mut delta = StateDelta::new();
    if outcome.new_counter.is_some() {
        record_counter(&mut wallet, authorizer.id, &outcome)?;
        delta.store(wallet_meta.key, wallet.to_bytes());
    }
    delta.store(session_pda, session.to_bytes());

    log::info!(
        "CreateSession: authority {} opened session until slot {}",
        authorizer.id,
        expires_at
    );
    Ok(delta)
}
