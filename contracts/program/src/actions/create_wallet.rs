use lazor_assertions::{check_key_match, check_zero_data};
use lazorkit_state::{AuthorityAccount, WalletAccount};

use super::{check_system_program, payer, WALLET_INDEX};
use crate::context::InvokeContext;
use crate::error::LazorKitError;
use crate::instruction::AuthorityPayload;
use crate::ledger::StateDelta;

const VAULT_INDEX: usize = 2;
const OWNER_INDEX: usize = 3;
const SYSTEM_INDEX: usize = 4;

/// Creates the wallet record with `owner` as authority 0.
pub fn process_create_wallet(
    ctx: &InvokeContext<'_>,
    wallet_id: [u8; 32],
    auth_bump: u8,
    owner: &AuthorityPayload,
) -> Result<StateDelta, LazorKitError> {
    ctx.require_accounts(SYSTEM_INDEX + 1)?;
    payer(ctx)?;
    check_system_program(ctx, SYSTEM_INDEX)?;

    let deriver = ctx.deriver();
    let wallet_meta = ctx.account(WALLET_INDEX)?;
    let (wallet_key, wallet_bump) = deriver.wallet(&wallet_id)?;
    check_key_match(wallet_meta, &wallet_key, LazorKitError::PdaMismatch)?;
    check_zero_data(
        ctx.data(&wallet_key).unwrap_or_default(),
        LazorKitError::AlreadyInitialized,
    )?;

    let (vault_key, vault_bump) = deriver.vault(&wallet_key)?;
    check_key_match(ctx.account(VAULT_INDEX)?, &vault_key, LazorKitError::PdaMismatch)?;

    let (owner_key, owner_bump) = deriver.authority(&wallet_key, &owner.seed)?;
    check_key_match(ctx.account(OWNER_INDEX)?, &owner_key, LazorKitError::PdaMismatch)?;
    if owner_bump != auth_bump {
        log::debug!(
            "CreateWallet: authority bump {} does not match derived {}",
            auth_bump,
            owner_bump
        );
        return Err(LazorKitError::PdaMismatch);
    }
    check_zero_data(
        ctx.data(&owner_key).unwrap_or_default(),
        LazorKitError::AlreadyInitialized,
    )?;

    let wallet = WalletAccount::new(wallet_id, wallet_bump, vault_bump, owner.seed, owner.data)?;
    let record = AuthorityAccount {
        bump: owner_bump,
        authority_id: 0,
        wallet: wallet_key,
        seed: owner.seed,
    };

    let mut delta = StateDelta::new();
    delta.store(wallet_key, wallet.to_bytes());
    delta.store(owner_key, record.to_bytes());

    log::info!(
        "CreateWallet: wallet {:?} owner type {:?}",
        wallet_key,
        owner.authority_type()
    );
    Ok(delta)
}
