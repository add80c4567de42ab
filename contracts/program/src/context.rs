use lazor_assertions::check_min_accounts;
use lazorkit_state::{AddressDeriver, ProgramConfig};
use pinocchio::pubkey::Pubkey;

use crate::auth::Secp256r1Verifier;
use crate::error::LazorKitError;
use crate::ledger::{AccountMeta, AccountStore};

/// The system program id, all zero bytes.
pub const SYSTEM_PROGRAM_ID: Pubkey = [0u8; 32];

/// Inputs shared by every transition of one instruction.
pub struct InvokeContext<'a> {
    pub config: &'a ProgramConfig,
    pub store: &'a dyn AccountStore,
    pub accounts: &'a [AccountMeta],
    pub current_slot: u64,
    pub secp256r1: &'a dyn Secp256r1Verifier,
}

impl<'a> InvokeContext<'a> {
    pub fn deriver(&self) -> AddressDeriver<'a> {
        AddressDeriver::new(self.config)
    }

    pub fn require_accounts(&self, required: usize) -> Result<(), LazorKitError> {
        check_min_accounts(self.accounts, required, LazorKitError::NotEnoughAccountKeys)
    }

    pub fn account(&self, index: usize) -> Result<&'a AccountMeta, LazorKitError> {
        self.accounts
            .get(index)
            .ok_or(LazorKitError::NotEnoughAccountKeys)
    }

    pub fn data(&self, key: &Pubkey) -> Option<&'a [u8]> {
        self.store.account_data(key)
    }
}
