use crate::basic::actions::{
    AddAuthorityBuilder, CreateSessionBuilder, CreateWalletBuilder, ExecuteBuilder,
    RemoveAuthorityBuilder, TransferOwnershipBuilder,
};
use crate::core::connection::SolConnection;
use crate::core::constants::DEFAULT_PROGRAM_ID;
use crate::error::{LazorSdkError, Result};
use crate::types::{AuthorityInfo, SessionInfo, WalletInfo};
use crate::utils;
use lazorkit_state::ProgramConfig;
use solana_sdk::pubkey::Pubkey;

/// Represents a LazorKit Smart Wallet on-chain.
#[derive(Debug, Clone)]
pub struct LazorWallet {
    /// Wallet PDA - the account that stores the authority registry
    pub address: Pubkey,

    /// Vault PDA - holds funds and signs executed instructions
    pub vault: Pubkey,

    /// Program ID of the LazorKit contract
    pub program_id: Pubkey,

    pub wallet_id: [u8; 32],

    /// Deployment settings used for every derivation and encoding
    pub config: ProgramConfig,
}

impl LazorWallet {
    pub const DEFAULT_PROGRAM_ID: Pubkey = DEFAULT_PROGRAM_ID;

    /// Construct a wallet handle from its id; nothing is fetched.
    pub fn new(config: ProgramConfig, wallet_id: [u8; 32]) -> Result<Self> {
        let (address, _) = utils::derive_wallet_pda(&config, &wallet_id)?;
        let (vault, _) = utils::derive_vault_pda(&config, &address)?;
        Ok(Self {
            address,
            vault,
            program_id: Pubkey::new_from_array(config.program_id),
            wallet_id,
            config,
        })
    }

    /// Fetch an existing wallet from the blockchain by its wallet PDA
    ///
    /// Fails with `InvalidWalletState` when the record does not live at the
    /// address its own wallet id derives.
    pub async fn fetch(
        connection: &impl SolConnection,
        config: ProgramConfig,
        address: &Pubkey,
    ) -> Result<Self> {
        let account = utils::fetch_wallet_account(connection, &config, address).await?;
        let wallet = Self::new(config, account.wallet_id)?;
        if wallet.address != *address {
            return Err(LazorSdkError::InvalidWalletState(format!(
                "{} does not derive from its wallet id",
                address
            )));
        }
        Ok(wallet)
    }

    /// Fetch complete wallet information including all authorities
    pub async fn fetch_info(&self, connection: &impl SolConnection) -> Result<WalletInfo> {
        utils::fetch_wallet_info(connection, &self.config, &self.address).await
    }

    /// List all authorities in the wallet
    pub async fn list_authorities(
        &self,
        connection: &impl SolConnection,
    ) -> Result<Vec<AuthorityInfo>> {
        Ok(self.fetch_info(connection).await?.authorities)
    }

    /// Get a specific authority by ID
    pub async fn get_authority(
        &self,
        id: u8,
        connection: &impl SolConnection,
    ) -> Result<AuthorityInfo> {
        let info = self.fetch_info(connection).await?;
        utils::find_authority(&info, id)
            .cloned()
            .ok_or(LazorSdkError::AuthorityNotFound(id))
    }

    /// Check if an authority exists
    pub async fn has_authority(&self, id: u8, connection: &impl SolConnection) -> Result<bool> {
        let info = self.fetch_info(connection).await?;
        Ok(utils::find_authority(&info, id).is_some())
    }

    pub async fn fetch_session(
        &self,
        session_key: &Pubkey,
        connection: &impl SolConnection,
    ) -> Result<SessionInfo> {
        let session = self.session_pda(session_key)?;
        utils::fetch_session_info(connection, &self.config, &session).await
    }

    pub fn authority_pda(&self, seed: &[u8; 32]) -> Result<Pubkey> {
        Ok(utils::derive_authority_pda(&self.config, &self.address, seed)?.0)
    }

    pub fn session_pda(&self, session_key: &Pubkey) -> Result<Pubkey> {
        Ok(utils::derive_session_pda(&self.config, &self.address, session_key)?.0)
    }

    pub fn policy_pda(&self) -> Result<Pubkey> {
        Ok(utils::derive_policy_pda(&self.config, &self.address)?.0)
    }

    /// Create a new wallet
    pub fn create(config: ProgramConfig) -> CreateWalletBuilder {
        CreateWalletBuilder::new(config)
    }

    /// Start building an AddAuthority transaction
    pub fn add_authority(&self) -> AddAuthorityBuilder<'_> {
        AddAuthorityBuilder::new(self)
    }

    pub fn remove_authority(&self) -> RemoveAuthorityBuilder<'_> {
        RemoveAuthorityBuilder::new(self)
    }

    pub fn transfer_ownership(&self) -> TransferOwnershipBuilder<'_> {
        TransferOwnershipBuilder::new(self)
    }

    pub fn create_session(&self) -> CreateSessionBuilder<'_> {
        CreateSessionBuilder::new(self)
    }

    /// Start building an Execute transaction signed by the vault
    pub fn execute(&self) -> ExecuteBuilder<'_> {
        ExecuteBuilder::new(self)
    }
}
