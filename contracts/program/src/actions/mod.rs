pub mod add_authority;
pub mod create_session;
pub mod create_wallet;
pub mod execute;
pub mod remove_authority;
pub mod transfer_ownership;

pub use add_authority::*;
pub use create_session::*;
pub use create_wallet::*;
pub use execute::*;
pub use remove_authority::*;
pub use transfer_ownership::*;

use lazor_assertions::{check_key_match, check_signer};
use lazorkit_state::{Authority, AuthorityAccount, Role, WalletAccount};
use pinocchio::pubkey::Pubkey;

use crate::auth::{self, AuthOutcome, AuthRequest};
use crate::context::{InvokeContext, SYSTEM_PROGRAM_ID};
use crate::error::LazorKitError;
use crate::ledger::AccountMeta;

pub(crate) const PAYER_INDEX: usize = 0;
pub(crate) const WALLET_INDEX: usize = 1;
pub(crate) const ACTING_INDEX: usize = 2;

/// Payer must sign every instruction.
pub(crate) fn payer<'a>(ctx: &InvokeContext<'a>) -> Result<&'a AccountMeta, LazorKitError> {
    let payer = ctx.account(PAYER_INDEX)?;
    check_signer(payer, LazorKitError::Unauthorized)?;
    Ok(payer)
}

pub(crate) fn check_system_program(
    ctx: &InvokeContext<'_>,
    index: usize,
) -> Result<(), LazorKitError> {
    check_key_match(ctx.account(index)?, &SYSTEM_PROGRAM_ID, LazorKitError::PdaMismatch)
}

/// Loads the wallet record and checks that it lives at its own derived address.
pub(crate) fn load_wallet(
    ctx: &InvokeContext<'_>,
    wallet_meta: &AccountMeta,
) -> Result<WalletAccount, LazorKitError> {
    let data = ctx
        .data(&wallet_meta.key)
        .ok_or(LazorKitError::InvalidAccountData)?;
    let wallet = WalletAccount::from_bytes(data)?;
    let (expected, bump) = ctx.deriver().wallet(&wallet.wallet_id)?;
    check_key_match(wallet_meta, &expected, LazorKitError::PdaMismatch)?;
    if bump != wallet.bump {
        return Err(LazorKitError::PdaMismatch);
    }
    Ok(wallet)
}

/// Resolves an authority PDA to the wallet entry it points at.
pub(crate) fn resolve_authority<'w>(
    ctx: &InvokeContext<'_>,
    wallet_key: &Pubkey,
    wallet: &'w WalletAccount,
    authority_meta: &AccountMeta,
) -> Result<&'w Authority, LazorKitError> {
    let data = ctx
        .data(&authority_meta.key)
        .ok_or(LazorKitError::Unauthorized)?;
    let record = AuthorityAccount::from_bytes(data).map_err(|_| LazorKitError::Unauthorized)?;
    if &record.wallet != wallet_key {
        log::debug!("authority record belongs to another wallet");
        return Err(LazorKitError::Unauthorized);
    }
    let (expected, _) = ctx.deriver().authority(wallet_key, &record.seed)?;
    check_key_match(authority_meta, &expected, LazorKitError::PdaMismatch)?;

    wallet
        .authority(record.authority_id)
        .filter(|a| a.seed == record.seed)
        .ok_or_else(|| {
            log::debug!("authority {} is no longer registered", record.authority_id);
            LazorKitError::Unauthorized
        })
}

/// Authenticates `authority` for the instruction being processed.
pub(crate) fn authenticate_acting(
    ctx: &InvokeContext<'_>,
    authority: &Authority,
    auth_payload: &[u8],
    signed_payload: &[u8],
    discriminator: &[u8],
    allow_session: bool,
) -> Result<AuthOutcome, LazorKitError> {
    let payer = ctx.account(PAYER_INDEX)?;
    let request = AuthRequest {
        accounts: ctx.accounts,
        auth_payload,
        signed_payload,
        discriminator,
        payer: &payer.key,
        current_slot: ctx.current_slot,
        allow_session,
    };
    auth::authenticate(authority, &request, ctx.secp256r1)
}

/// Persists an advanced Secp256r1 odometer into the wallet snapshot.
pub(crate) fn record_counter(
    wallet: &mut WalletAccount,
    authority_id: u8,
    outcome: &AuthOutcome,
) -> Result<(), LazorKitError> {
    if let Some(counter) = outcome.new_counter {
        wallet.set_counter(authority_id, counter)?;
    }
    Ok(())
}

/// Verifies that the acting authority has administrative privileges.
///
/// # Use Cases
/// - AddAuthority: Only Owner/Admin can add new authorities
/// - RemoveAuthority: Only Owner/Admin can remove authorities
/// - CreateSession: Only Owner/Admin can open sessions
pub(crate) fn require_admin_or_owner(authority: &Authority) -> Result<(), LazorKitError> {
    if authority.role.is_admin_or_owner() {
        Ok(())
    } else {
        log::debug!(
            "Permission denied: authority {} has role {:?}",
            authority.id,
            authority.role
        );
        Err(LazorKitError::Unauthorized)
    }
}

pub(crate) fn require_owner(authority: &Authority) -> Result<(), LazorKitError> {
    if authority.role == Role::Owner {
        Ok(())
    } else {
        log::debug!("Permission denied: authority {} is not the owner", authority.id);
        Err(LazorKitError::Unauthorized)
    }
}
