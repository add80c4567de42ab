//! Execute instruction handler
//!
//! The caller is either an authority PDA or a session PDA. After the caller
//! is authorized, each packed instruction is resolved against the outer
//! account list and handed to the [`InstructionDispatcher`] with the vault
//! as signer.

use lazor_assertions::{check_key_match, find_signer};
use lazorkit_state::config::VAULT_SEED;
use lazorkit_state::{Discriminator, Role, SessionAccount, WalletAccount};
use pinocchio::program_error::ProgramError;
use pinocchio::pubkey::Pubkey;

use super::{
    authenticate_acting, load_wallet, payer, record_counter, resolve_authority, ACTING_INDEX,
    WALLET_INDEX,
};
use crate::compact::{CompactInstruction, ResolvedInstruction};
use crate::context::InvokeContext;
use crate::error::LazorKitError;
use crate::ledger::{AccountMeta, StateDelta};

const VAULT_INDEX: usize = 3;
/// Payer, wallet, caller and vault precede the packed accounts.
pub const EXECUTE_STATIC_ACCOUNTS: usize = 4;

/// The ledger's signed-invoke primitive.
///
/// Execute hands its inner instructions over one at a time, after resolution
/// and authorization have already passed. When dispatch `n` fails, dispatches
/// `0..n` have already been handed over and Execute returns
/// [`LazorKitError::DispatchFailed`]. Implementations must treat every
/// dispatch of one Execute as a single transaction and roll the earlier ones
/// back when a later one fails.
pub trait InstructionDispatcher {
    fn dispatch(
        &mut self,
        instruction: &ResolvedInstruction,
        signer_seeds: &[&[u8]],
    ) -> Result<(), ProgramError>;
}

/// Who authorized an Execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteCaller {
    Authority { id: u8, role: Role, via_session: bool },
    Session { authorizer_id: u8 },
}

/// Result of a successful Execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub caller: ExecuteCaller,
    /// Spender and session callers must be cleared by the wallet policy.
    pub policy_required: bool,
    pub instructions: Vec<ResolvedInstruction>,
}

pub fn process_execute(
    ctx: &InvokeContext<'_>,
    instructions: &[CompactInstruction],
    auth_payload: &[u8],
    signed_payload: &[u8],
    discriminator: &[u8],
    dispatcher: &mut dyn InstructionDispatcher,
) -> Result<(StateDelta, ExecutionPlan), LazorKitError> {
    ctx.require_accounts(EXECUTE_STATIC_ACCOUNTS)?;
    payer(ctx)?;

    let wallet_meta = ctx.account(WALLET_INDEX)?;
    let caller_meta = ctx.account(ACTING_INDEX)?;
    let vault_meta = ctx.account(VAULT_INDEX)?;
    let mut wallet = load_wallet(ctx, wallet_meta)?;

    let (vault_key, vault_bump) = ctx.deriver().vault(&wallet_meta.key)?;
    check_key_match(vault_meta, &vault_key, LazorKitError::PdaMismatch)?;
    if vault_bump != wallet.vault_bump {
        return Err(LazorKitError::PdaMismatch);
    }

    let mut delta = StateDelta::new();
    let caller = match ctx.data(&caller_meta.key).and_then(|d| d.first().copied()) {
        Some(tag) if tag == Discriminator::Session as u8 => {
            authorize_session(ctx, &wallet_meta.key, &wallet, caller_meta)?
        },
        Some(tag) if tag == Discriminator::Authority as u8 => {
            let authority = *resolve_authority(ctx, &wallet_meta.key, &wallet, caller_meta)?;
            let outcome = authenticate_acting(
                ctx,
                &authority,
                auth_payload,
                signed_payload,
                discriminator,
                true,
            )?;
            if outcome.new_counter.is_some() {
                record_counter(&mut wallet, authority.id, &outcome)?;
                delta.store(wallet_meta.key, wallet.to_bytes());
            }
            ExecuteCaller::Authority {
                id: authority.id,
                role: authority.role,
                via_session: outcome.via_session,
            }
        },
        _ => {
            log::debug!("Execute: caller is neither an authority nor a session");
            return Err(LazorKitError::Unauthorized);
        },
    };

    let resolved = instructions
        .iter()
        .map(|ix| resolve_inner(ctx, ix, &vault_key))
        .collect::<Result<Vec<_>, _>>()?;

    let bump = [vault_bump];
    let seeds: [&[u8]; 3] = [VAULT_SEED, wallet_meta.key.as_ref(), &bump];
    for (index, ix) in resolved.iter().enumerate() {
        dispatcher.dispatch(ix, &seeds).map_err(|e| {
            log::warn!("Execute: inner instruction {} failed: {:?}", index, e);
            LazorKitError::DispatchFailed
        })?;
    }

    let policy_required = match caller {
        ExecuteCaller::Authority {
            role, via_session, ..
        } => via_session || role == Role::Spender,
        ExecuteCaller::Session { .. } => true,
    };
    log::info!(
        "Execute: {:?} ran {} instructions (policy required: {})",
        caller,
        resolved.len(),
        policy_required
    );

    Ok((
        delta,
        ExecutionPlan {
            caller,
            policy_required,
            instructions: resolved,
        },
    ))
}

fn authorize_session(
    ctx: &InvokeContext<'_>,
    wallet_key: &Pubkey,
    wallet: &WalletAccount,
    session_meta: &AccountMeta,
) -> Result<ExecuteCaller, LazorKitError> {
    let data = ctx
        .data(&session_meta.key)
        .ok_or(LazorKitError::Unauthorized)?;
    let session = SessionAccount::from_bytes(data).map_err(|_| LazorKitError::Unauthorized)?;
    if &session.wallet != wallet_key {
        log::debug!("Execute: session belongs to another wallet");
        return Err(LazorKitError::Unauthorized);
    }
    let (expected, _) = ctx.deriver().session(wallet_key, &session.session_key)?;
    check_key_match(session_meta, &expected, LazorKitError::PdaMismatch)?;

    if !session.is_live(ctx.current_slot) {
        log::debug!(
            "Execute: session expired at {} (slot {})",
            session.expires_at,
            ctx.current_slot
        );
        return Err(LazorKitError::SessionExpired);
    }

    let master_live = wallet
        .authority(session.authorizer_id)
        .is_some_and(|a| a.seed == session.authorizer_seed && a.role.is_admin_or_owner());
    if !master_live {
        log::debug!(
            "Execute: session authorizer {} was removed",
            session.authorizer_id
        );
        return Err(LazorKitError::Unauthorized);
    }

    find_signer(ctx.accounts, &session.session_key, LazorKitError::Unauthorized)?;
    Ok(ExecuteCaller::Session {
        authorizer_id: session.authorizer_id,
    })
}

/// Resolves one packed instruction and checks it asks for no privilege the
/// outer instruction lacks. The vault is the only account promoted to signer.
fn resolve_inner(
    ctx: &InvokeContext<'_>,
    ix: &CompactInstruction,
    vault_key: &Pubkey,
) -> Result<ResolvedInstruction, LazorKitError> {
    let mut resolved = ix.resolve(ctx.accounts)?;
    if resolved.program_id == ctx.config.program_id {
        log::debug!("Execute: inner instruction targets the wallet program");
        return Err(LazorKitError::SelfReentrancyNotAllowed);
    }

    for (meta, &index) in resolved.accounts.iter_mut().zip(&ix.accounts) {
        let outer = ctx.account(index as usize)?;
        if &meta.key == vault_key {
            meta.is_signer = true;
            continue;
        }
        if (meta.is_signer && !outer.is_signer) || (meta.is_writable && !outer.is_writable) {
            log::debug!("Execute: inner instruction escalates account {}", index);
            return Err(LazorKitError::Unauthorized);
        }
    }
    Ok(resolved)
}
