use lazorkit_state::Authority;
use pinocchio::pubkey::Pubkey;
use sha2::{Digest, Sha256};

use super::{authenticate_embedded_session, AuthOutcome, AuthRequest, Authenticator};
use crate::error::LazorKitError;
use crate::ledger::AccountMeta;

/// Maximum age (in slots) for a Secp256r1 signature to be considered valid
pub const MAX_SIGNATURE_AGE_IN_SLOTS: u64 = 60;

/// `[authority_slot: u64][counter: u32][signature: 64]`
pub const AUTH_PAYLOAD_LEN: usize = 8 + 4 + 64;

/// Signature primitive for compressed P-256 keys.
pub trait Secp256r1Verifier {
    fn verify(&self, public_key: &[u8; 33], message: &[u8; 32], signature: &[u8; 64]) -> bool;
}

/// Verifier for hosts without P-256 support; every signature is rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSecp256r1;

impl Secp256r1Verifier for UnsupportedSecp256r1 {
    fn verify(&self, _public_key: &[u8; 33], _message: &[u8; 32], _signature: &[u8; 64]) -> bool {
        false
    }
}

/// Digest a Secp256r1 authority signs for one instruction.
///
/// Every outer account is hashed as `key || is_writable || is_signer`, so the
/// signature covers the addresses behind packed account indexes and the wallet
/// itself.
pub fn message_digest(
    discriminator: &[u8],
    signed_payload: &[u8],
    payer: &Pubkey,
    accounts: &[AccountMeta],
    authority_slot: u64,
    counter: u32,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(discriminator);
    hasher.update(signed_payload);
    hasher.update(payer);
    for account in accounts {
        hasher.update(account.key);
        hasher.update([account.is_writable as u8, account.is_signer as u8]);
    }
    hasher.update(authority_slot.to_le_bytes());
    hasher.update(counter.to_le_bytes());
    hasher.finalize().into()
}

/// Builds the trailing authorization payload.
pub fn encode_auth_payload(authority_slot: u64, counter: u32, signature: &[u8; 64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(AUTH_PAYLOAD_LEN);
    out.extend_from_slice(&authority_slot.to_le_bytes());
    out.extend_from_slice(&counter.to_le_bytes());
    out.extend_from_slice(signature);
    out
}

/// Authenticates a Secp256r1 authority.
///
/// The counter must be exactly one past the stored odometer and the signature
/// must be at most [`MAX_SIGNATURE_AGE_IN_SLOTS`] old.
pub struct Secp256r1Authenticator<'v> {
    verifier: &'v dyn Secp256r1Verifier,
}

impl<'v> Secp256r1Authenticator<'v> {
    pub fn new(verifier: &'v dyn Secp256r1Verifier) -> Self {
        Self { verifier }
    }
}

impl Authenticator for Secp256r1Authenticator<'_> {
    fn authenticate(
        &self,
        authority: &Authority,
        request: &AuthRequest<'_>,
    ) -> Result<AuthOutcome, LazorKitError> {
        let public_key = authority
            .data
            .secp256r1_master()
            .ok_or(LazorKitError::InvalidAuthorityData)?;

        if request.auth_payload.len() != AUTH_PAYLOAD_LEN {
            if let Some(outcome) = authenticate_embedded_session(authority, request) {
                return outcome;
            }
            log::debug!(
                "authority {} sent a {}-byte secp256r1 payload",
                authority.id,
                request.auth_payload.len()
            );
            return Err(LazorKitError::Unauthorized);
        }

        let (slot_bytes, rest) = request.auth_payload.split_at(8);
        let (counter_bytes, signature_bytes) = rest.split_at(4);
        let authority_slot = u64::from_le_bytes(
            slot_bytes
                .try_into()
                .map_err(|_| LazorKitError::MalformedInstruction)?,
        );
        let counter = u32::from_le_bytes(
            counter_bytes
                .try_into()
                .map_err(|_| LazorKitError::MalformedInstruction)?,
        );
        let signature: &[u8; 64] = signature_bytes
            .try_into()
            .map_err(|_| LazorKitError::MalformedInstruction)?;

        if counter != authority.counter.wrapping_add(1) {
            log::debug!(
                "authority {} counter {} reused (odometer {})",
                authority.id,
                counter,
                authority.counter
            );
            return Err(LazorKitError::Unauthorized);
        }

        if request.current_slot < authority_slot
            || request.current_slot - authority_slot > MAX_SIGNATURE_AGE_IN_SLOTS
        {
            log::debug!(
                "authority {} signature slot {} outside window at {}",
                authority.id,
                authority_slot,
                request.current_slot
            );
            return Err(LazorKitError::Unauthorized);
        }

        let digest = message_digest(
            request.discriminator,
            request.signed_payload,
            request.payer,
            request.accounts,
            authority_slot,
            counter,
        );
        if !self.verifier.verify(public_key, &digest, signature) {
            log::debug!("authority {} signature rejected", authority.id);
            return Err(LazorKitError::Unauthorized);
        }

        Ok(AuthOutcome {
            via_session: false,
            new_counter: Some(counter),
        })
    }
}
