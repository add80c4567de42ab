//! LazorKit Policy Interface
//!
//! Wire types of the default policy program: instruction data, positional
//! account lists and the per-wallet policy record. Wallet clients use these to
//! build the `init_policy` / `check_policy` calls that accompany wallet
//! creation and execution.

use borsh::{BorshDeserialize, BorshSerialize};
use lazorkit_state::{AddressDeriver, LazorStateError, ProgramConfig};
use pinocchio::{program_error::ProgramError, pubkey::Pubkey};
use sha2::{Digest, Sha256};

/// Size of the Anchor-style instruction and account discriminators.
pub const DISCRIMINATOR_LEN: usize = 8;

/// `sha256("global:<name>")[..8]`
pub fn instruction_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    prefixed_hash("global", name)
}

/// `sha256("account:<name>")[..8]`
pub fn account_discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    prefixed_hash("account", name)
}

fn prefixed_hash(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

/// Error codes for policy operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PolicyError {
    /// The policy rejected the caller
    CheckFailed = 1000,
    /// Policy record bytes do not parse
    InvalidPolicyData = 1001,
    /// Instruction data does not parse
    InvalidInstruction = 1002,
}

impl From<PolicyError> for ProgramError {
    fn from(e: PolicyError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CheckPolicyArgs {
    /// Opaque data forwarded from the Execute caller.
    pub policy_data: Vec<u8>,
}

/// Instructions of the default policy program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyInstruction {
    /// Accounts:
    /// 0. `[writable, signer]` Payer
    /// 1. `[]` Wallet
    /// 2. `[signer]` Authority
    /// 3. `[writable]` Policy PDA (["policy", wallet])
    /// 4. `[]` System program
    InitPolicy,

    /// Accounts:
    /// 0. `[signer]` Authority
    /// 1. `[]` Wallet
    /// 2. `[writable]` Policy PDA
    CheckPolicy(CheckPolicyArgs),
}

impl PolicyInstruction {
    pub const INIT_POLICY: &'static str = "init_policy";
    pub const CHECK_POLICY: &'static str = "check_policy";

    pub fn discriminator(&self) -> [u8; DISCRIMINATOR_LEN] {
        match self {
            PolicyInstruction::InitPolicy => instruction_discriminator(Self::INIT_POLICY),
            PolicyInstruction::CheckPolicy(_) => instruction_discriminator(Self::CHECK_POLICY),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.discriminator().to_vec();
        if let PolicyInstruction::CheckPolicy(args) = self {
            // writing into a Vec cannot fail
            let _ = args.serialize(&mut out);
        }
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self, PolicyError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(PolicyError::InvalidInstruction);
        }
        let (tag, mut rest) = data.split_at(DISCRIMINATOR_LEN);
        if tag == instruction_discriminator(Self::INIT_POLICY) {
            return Ok(PolicyInstruction::InitPolicy);
        }
        if tag == instruction_discriminator(Self::CHECK_POLICY) {
            let args = CheckPolicyArgs::deserialize(&mut rest)
                .map_err(|_| PolicyError::InvalidInstruction)?;
            if !rest.is_empty() {
                return Err(PolicyError::InvalidInstruction);
            }
            return Ok(PolicyInstruction::CheckPolicy(args));
        }
        Err(PolicyError::InvalidInstruction)
    }
}

/// An account reference in a policy instruction, independent of any client SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyAccountMeta {
    pub key: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl PolicyAccountMeta {
    const fn new(key: Pubkey, is_signer: bool, is_writable: bool) -> Self {
        Self {
            key,
            is_signer,
            is_writable,
        }
    }
}

pub fn init_policy_accounts(
    payer: Pubkey,
    wallet: Pubkey,
    authority: Pubkey,
    policy: Pubkey,
    system_program: Pubkey,
) -> [PolicyAccountMeta; 5] {
    [
        PolicyAccountMeta::new(payer, true, true),
        PolicyAccountMeta::new(wallet, false, false),
        PolicyAccountMeta::new(authority, true, false),
        PolicyAccountMeta::new(policy, false, true),
        PolicyAccountMeta::new(system_program, false, false),
    ]
}

pub fn check_policy_accounts(
    authority: Pubkey,
    wallet: Pubkey,
    policy: Pubkey,
) -> [PolicyAccountMeta; 3] {
    [
        PolicyAccountMeta::new(authority, true, false),
        PolicyAccountMeta::new(wallet, false, false),
        PolicyAccountMeta::new(policy, false, true),
    ]
}

/// Address of the default policy record of `wallet`.
pub fn policy_address(
    config: &ProgramConfig,
    wallet: &Pubkey,
) -> Result<(Pubkey, u8), LazorStateError> {
    AddressDeriver::new(config).policy(wallet)
}

/// Policy record stored at the policy PDA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct PolicyAccount {
    pub wallet: Pubkey,
    pub authority: Pubkey,
}

impl PolicyAccount {
    pub const NAME: &'static str = "Policy";
    pub const LEN: usize = DISCRIMINATOR_LEN + 32 + 32;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&account_discriminator(Self::NAME));
        let _ = self.serialize(&mut out);
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, PolicyError> {
        if data.len() != Self::LEN || data[..DISCRIMINATOR_LEN] != account_discriminator(Self::NAME) {
            return Err(PolicyError::InvalidPolicyData);
        }
        Self::try_from_slice(&data[DISCRIMINATOR_LEN..]).map_err(|_| PolicyError::InvalidPolicyData)
    }

    /// The default rule: only the authority recorded at init may pass.
    pub fn check(&self, wallet: &Pubkey, authority: &Pubkey) -> Result<(), PolicyError> {
        if &self.wallet == wallet && &self.authority == authority {
            Ok(())
        } else {
            Err(PolicyError::CheckFailed)
        }
    }
}
