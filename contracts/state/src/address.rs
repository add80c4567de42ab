//! Program-derived address derivation.
//!
//! `SHA-256(seed_0 || ... || seed_n || bump || program_id || "ProgramDerivedAddress")`,
//! trying bumps from 255 down to 0 and keeping the first hash that is not a
//! valid Ed25519 point.

use crate::config::{ProgramConfig, AUTHORITY_SEED, POLICY_SEED, SESSION_SEED, VAULT_SEED};
use crate::error::LazorStateError;
use pinocchio::pubkey::Pubkey;
use sha2::{Digest, Sha256};

pub const MAX_SEED_LEN: usize = 32;
/// Ledger limit, bump included.
pub const MAX_SEEDS: usize = 16;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Curve membership test used to reject on-curve candidates.
pub trait CurveOracle {
    fn is_on_curve(&self, point: &[u8; 32]) -> bool;
}

/// Ed25519 membership by point decompression.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Curve;

impl CurveOracle for Ed25519Curve {
    fn is_on_curve(&self, point: &[u8; 32]) -> bool {
        curve25519_dalek::edwards::CompressedEdwardsY(*point)
            .decompress()
            .is_some()
    }
}

impl<C: CurveOracle + ?Sized> CurveOracle for &C {
    fn is_on_curve(&self, point: &[u8; 32]) -> bool {
        (**self).is_on_curve(point)
    }
}

/// Derives every address the wallet program owns.
#[derive(Debug, Clone, Copy)]
pub struct AddressDeriver<'a, C = Ed25519Curve> {
    config: &'a ProgramConfig,
    curve: C,
}

impl<'a> AddressDeriver<'a, Ed25519Curve> {
    pub fn new(config: &'a ProgramConfig) -> Self {
        Self {
            config,
            curve: Ed25519Curve,
        }
    }
}

impl<'a, C: CurveOracle> AddressDeriver<'a, C> {
    pub fn with_curve(config: &'a ProgramConfig, curve: C) -> Self {
        Self { config, curve }
    }

    pub fn config(&self) -> &'a ProgramConfig {
        self.config
    }

    /// Hashes `seeds` (bump already appended) under `program_id`.
    pub fn create_program_address(
        &self,
        seeds: &[&[u8]],
        program_id: &Pubkey,
    ) -> Result<Pubkey, LazorStateError> {
        check_seeds(seeds, 0)?;
        let candidate = hash_seeds(seeds, None, program_id);
        if self.curve.is_on_curve(&candidate) {
            return Err(LazorStateError::InvalidSeeds);
        }
        Ok(candidate)
    }

    /// Canonical derivation: the highest bump whose hash is off the curve.
    pub fn find_program_address(
        &self,
        seeds: &[&[u8]],
        program_id: &Pubkey,
    ) -> Result<(Pubkey, u8), LazorStateError> {
        check_seeds(seeds, 1)?;
        for bump in (0u8..=255).rev() {
            let candidate = hash_seeds(seeds, Some(bump), program_id);
            if !self.curve.is_on_curve(&candidate) {
                return Ok((candidate, bump));
            }
        }
        Err(LazorStateError::DerivationExhausted)
    }

    pub fn wallet(&self, wallet_id: &[u8]) -> Result<(Pubkey, u8), LazorStateError> {
        self.find_program_address(
            &[self.config.seed_scheme.wallet_tag(), wallet_id],
            &self.config.program_id,
        )
    }

    pub fn vault(&self, wallet: &Pubkey) -> Result<(Pubkey, u8), LazorStateError> {
        self.find_program_address(&[VAULT_SEED, wallet.as_ref()], &self.config.program_id)
    }

    pub fn authority(
        &self,
        wallet: &Pubkey,
        authority_seed: &[u8; 32],
    ) -> Result<(Pubkey, u8), LazorStateError> {
        self.find_program_address(
            &[AUTHORITY_SEED, wallet.as_ref(), authority_seed.as_ref()],
            &self.config.program_id,
        )
    }

    pub fn session(
        &self,
        wallet: &Pubkey,
        session_key: &[u8; 32],
    ) -> Result<(Pubkey, u8), LazorStateError> {
        self.find_program_address(
            &[SESSION_SEED, wallet.as_ref(), session_key.as_ref()],
            &self.config.program_id,
        )
    }

    /// Default policy state, owned by the policy program.
    pub fn policy(&self, wallet: &Pubkey) -> Result<(Pubkey, u8), LazorStateError> {
        self.find_program_address(
            &[POLICY_SEED, wallet.as_ref()],
            &self.config.policy_program_id,
        )
    }
}

fn check_seeds(seeds: &[&[u8]], extra: usize) -> Result<(), LazorStateError> {
    if seeds.iter().any(|seed| seed.len() > MAX_SEED_LEN) {
        return Err(LazorStateError::SeedTooLong);
    }
    if seeds.len() + extra > MAX_SEEDS {
        return Err(LazorStateError::TooManySeeds);
    }
    Ok(())
}

fn hash_seeds(seeds: &[&[u8]], bump: Option<u8>, program_id: &Pubkey) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    if let Some(bump) = bump {
        hasher.update([bump]);
    }
    hasher.update(program_id);
    hasher.update(PDA_MARKER);
    hasher.finalize().into()
}
