pub mod advanced;
pub mod basic;
pub mod core;
pub mod error;
pub mod types;
pub mod utils;

pub use crate::advanced::PreparedInstruction;
pub use crate::basic::policy::{PolicyRequest, PolicyResolver};
pub use crate::basic::wallet::LazorWallet;
pub use crate::core::config::ClientConfig;
pub use crate::core::connection::{RpcConnection, SolConnection};
pub use crate::core::retry::{confirm_transaction, RetryPolicy};
pub use crate::core::signer::{sign_transaction, LazorSigner, Secp256r1Signer};
pub use crate::error::{LazorSdkError, Result};
pub use crate::types::{AuthorityInfo, SessionInfo, WalletInfo};
pub use crate::utils::{
    derive_authority_pda, derive_policy_pda, derive_session_pda, derive_vault_pda,
    derive_wallet_pda, fetch_wallet_account, fetch_wallet_info, find_authority,
    find_authority_by_seed,
};

pub mod state {
    pub use lazorkit_program::instruction::AuthorityPayload;
    pub use lazorkit_state::{AuthorityData, AuthorityType, DiscriminatorProfile, ProgramConfig, Role, SeedScheme};
}
