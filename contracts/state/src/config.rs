//! Deployment-wide settings.
//!
//! A `ProgramConfig` is built once and handed by reference to every component.
//! It never changes after construction.

use pinocchio::pubkey::Pubkey;
use pinocchio_pubkey::pubkey;

pub const LAZORKIT_PROGRAM_ID: Pubkey = pubkey!("LazorKit11111111111111111111111111111111111");
pub const DEFAULT_POLICY_PROGRAM_ID: Pubkey =
    pubkey!("CNT2aEgxucQjmt5SRsA6hSGrt241Bvc9zsgPvSuMjQTE");

/// Roughly seven days of 400ms slots.
pub const DEFAULT_MAX_SESSION_SLOTS: u64 = 1_512_000;

pub const WALLET_SEED: &[u8] = b"wallet";
pub const SMART_WALLET_SEED: &[u8] = b"smart_wallet";
pub const VAULT_SEED: &[u8] = b"vault";
pub const AUTHORITY_SEED: &[u8] = b"authority";
pub const SESSION_SEED: &[u8] = b"session";
pub const POLICY_SEED: &[u8] = b"policy";

/// Which tag prefixes the wallet address seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedScheme {
    /// `["wallet", wallet_id]`
    #[default]
    Wallet,
    /// `["smart_wallet", base_seed]`
    SmartWallet,
}

impl SeedScheme {
    pub const fn wallet_tag(self) -> &'static [u8] {
        match self {
            SeedScheme::Wallet => WALLET_SEED,
            SeedScheme::SmartWallet => SMART_WALLET_SEED,
        }
    }
}

/// Width of the instruction discriminator on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscriminatorProfile {
    /// One byte, 0..=5.
    #[default]
    Compact,
    /// Eight bytes, `sha256("global:<Name>")[..8]`.
    Hashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramConfig {
    pub program_id: Pubkey,
    pub policy_program_id: Pubkey,
    pub seed_scheme: SeedScheme,
    pub discriminator_profile: DiscriminatorProfile,
    pub max_session_slots: u64,
}

impl ProgramConfig {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            ..Self::default()
        }
    }

    pub fn with_policy_program(mut self, policy_program_id: Pubkey) -> Self {
        self.policy_program_id = policy_program_id;
        self
    }

    pub fn with_seed_scheme(mut self, seed_scheme: SeedScheme) -> Self {
        self.seed_scheme = seed_scheme;
        self
    }

    pub fn with_discriminator_profile(mut self, profile: DiscriminatorProfile) -> Self {
        self.discriminator_profile = profile;
        self
    }

    pub fn with_max_session_slots(mut self, slots: u64) -> Self {
        self.max_session_slots = slots;
        self
    }
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            program_id: LAZORKIT_PROGRAM_ID,
            policy_program_id: DEFAULT_POLICY_PROGRAM_ID,
            seed_scheme: SeedScheme::Wallet,
            discriminator_profile: DiscriminatorProfile::Compact,
            max_session_slots: DEFAULT_MAX_SESSION_SLOTS,
        }
    }
}
