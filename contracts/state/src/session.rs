use crate::error::LazorStateError;
use crate::{Discriminator, CURRENT_ACCOUNT_VERSION};
use pinocchio::pubkey::Pubkey;

/// Session record stored at `["session", wallet, session_key]`.
///
/// Memory layout (112 bytes):
/// - discriminator: u8 (= 3)
/// - version: u8
/// - bump: u8
/// - authorizer_id: u8
/// - padding: [u8; 4]
/// - wallet: [u8; 32]
/// - session_key: [u8; 32]
/// - authorizer_seed: [u8; 32]
/// - expires_at: u64
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionAccount {
    pub bump: u8,
    pub authorizer_id: u8,
    pub wallet: Pubkey,
    pub session_key: [u8; 32],
    pub authorizer_seed: [u8; 32],
    pub expires_at: u64,
}

impl SessionAccount {
    pub const LEN: usize = 112;

    /// Live while the current slot is strictly below the expiry.
    #[inline]
    pub fn is_live(&self, current_slot: u64) -> bool {
        current_slot < self.expires_at
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.push(Discriminator::Session as u8);
        out.push(CURRENT_ACCOUNT_VERSION);
        out.push(self.bump);
        out.push(self.authorizer_id);
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&self.wallet);
        out.extend_from_slice(&self.session_key);
        out.extend_from_slice(&self.authorizer_seed);
        out.extend_from_slice(&self.expires_at.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LazorStateError> {
        if bytes.len() != Self::LEN
            || bytes[0] != Discriminator::Session as u8
            || bytes[1] != CURRENT_ACCOUNT_VERSION
        {
            return Err(LazorStateError::InvalidAccountData);
        }
        let mut wallet = [0u8; 32];
        let mut session_key = [0u8; 32];
        let mut authorizer_seed = [0u8; 32];
        let mut expiry = [0u8; 8];
        wallet.copy_from_slice(&bytes[8..40]);
        session_key.copy_from_slice(&bytes[40..72]);
        authorizer_seed.copy_from_slice(&bytes[72..104]);
        expiry.copy_from_slice(&bytes[104..112]);

        Ok(Self {
            bump: bytes[2],
            authorizer_id: bytes[3],
            wallet,
            session_key,
            authorizer_seed,
            expires_at: u64::from_le_bytes(expiry),
        })
    }
}
