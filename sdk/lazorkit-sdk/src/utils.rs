use crate::core::connection::SolConnection;
use crate::error::{LazorSdkError, Result};
use crate::types::{AuthorityInfo, SessionInfo, WalletInfo};
use lazorkit_state::{AddressDeriver, ProgramConfig, SessionAccount, WalletAccount};
use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;

//=============================================================================
// PDA Derivation Helpers
//=============================================================================

/// Derive the Wallet PDA from the configured seed scheme and wallet ID
pub fn derive_wallet_pda(config: &ProgramConfig, wallet_id: &[u8; 32]) -> Result<(Pubkey, u8)> {
    let (key, bump) = AddressDeriver::new(config).wallet(wallet_id)?;
    Ok((Pubkey::new_from_array(key), bump))
}

/// Derive the Vault PDA from the wallet PDA
pub fn derive_vault_pda(config: &ProgramConfig, wallet: &Pubkey) -> Result<(Pubkey, u8)> {
    let (key, bump) = AddressDeriver::new(config).vault(&wallet.to_bytes())?;
    Ok((Pubkey::new_from_array(key), bump))
}

/// Derive the Authority PDA from the wallet PDA and the authority seed
pub fn derive_authority_pda(
    config: &ProgramConfig,
    wallet: &Pubkey,
    seed: &[u8; 32],
) -> Result<(Pubkey, u8)> {
    let (key, bump) = AddressDeriver::new(config).authority(&wallet.to_bytes(), seed)?;
    Ok((Pubkey::new_from_array(key), bump))
}

/// Derive the Session PDA from the wallet PDA and the session key
pub fn derive_session_pda(
    config: &ProgramConfig,
    wallet: &Pubkey,
    session_key: &Pubkey,
) -> Result<(Pubkey, u8)> {
    let (key, bump) =
        AddressDeriver::new(config).session(&wallet.to_bytes(), &session_key.to_bytes())?;
    Ok((Pubkey::new_from_array(key), bump))
}

/// Derive the default policy PDA, owned by the policy program
pub fn derive_policy_pda(config: &ProgramConfig, wallet: &Pubkey) -> Result<(Pubkey, u8)> {
    let (key, bump) = AddressDeriver::new(config).policy(&wallet.to_bytes())?;
    Ok((Pubkey::new_from_array(key), bump))
}

//=============================================================================
// Account Fetching & Parsing
//=============================================================================

async fn fetch_program_account(
    connection: &impl SolConnection,
    config: &ProgramConfig,
    address: &Pubkey,
) -> Result<Account> {
    let account = connection
        .get_account(address)
        .await
        .map_err(|e| LazorSdkError::Connection(e.to_string()))?
        .ok_or(LazorSdkError::AccountNotFound(*address))?;

    if account.owner.to_bytes() != config.program_id {
        return Err(LazorSdkError::InvalidAccountData(format!(
            "{} is owned by {}, not the LazorKit program",
            address, account.owner
        )));
    }
    Ok(account)
}

/// Fetch wallet account data from the blockchain
pub async fn fetch_wallet_account(
    connection: &impl SolConnection,
    config: &ProgramConfig,
    wallet: &Pubkey,
) -> Result<WalletAccount> {
    let account = fetch_program_account(connection, config, wallet).await?;
    parse_wallet(&account.data)
}

pub fn parse_wallet(data: &[u8]) -> Result<WalletAccount> {
    WalletAccount::from_bytes(data)
        .map_err(|e| LazorSdkError::InvalidAccountData(format!("wallet record: {}", e)))
}

/// Fetch and parse complete wallet information
pub async fn fetch_wallet_info(
    connection: &impl SolConnection,
    config: &ProgramConfig,
    wallet: &Pubkey,
) -> Result<WalletInfo> {
    let account = fetch_wallet_account(connection, config, wallet).await?;
    Ok(WalletInfo::from_account(*wallet, &account))
}

pub async fn fetch_session_info(
    connection: &impl SolConnection,
    config: &ProgramConfig,
    session: &Pubkey,
) -> Result<SessionInfo> {
    let account = fetch_program_account(connection, config, session).await?;
    let record = SessionAccount::from_bytes(&account.data)
        .map_err(|e| LazorSdkError::InvalidAccountData(format!("session record: {}", e)))?;
    Ok(SessionInfo::from_account(*session, &record))
}

/// Find a specific authority by ID
pub fn find_authority(info: &WalletInfo, id: u8) -> Option<&AuthorityInfo> {
    info.authorities.iter().find(|a| a.id == id)
}

/// Find the authority registered under a PDA seed
pub fn find_authority_by_seed<'a>(info: &'a WalletInfo, seed: &[u8; 32]) -> Option<&'a AuthorityInfo> {
    info.authorities.iter().find(|a| &a.seed == seed)
}
