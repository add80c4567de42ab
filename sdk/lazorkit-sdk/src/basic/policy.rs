//! Picks the policy instruction that accompanies wallet creation and execution.
//!
//! A caller-provided instruction is used as is. Otherwise the resolver falls
//! back to the default policy program.

use lazorkit_interface::{
    check_policy_accounts, init_policy_accounts, policy_address, CheckPolicyArgs,
    PolicyAccountMeta, PolicyInstruction,
};
use lazorkit_state::ProgramConfig;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct PolicyRequest {
    /// Instruction supplied by the caller; wins over the default policy.
    pub provided: Option<Instruction>,
    pub payer: Pubkey,
    pub wallet: Pubkey,
    /// Key the default policy binds to at init and checks at execution.
    pub authority: Pubkey,
    /// Forwarded to `check_policy`.
    pub policy_data: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct PolicyResolver {
    config: ProgramConfig,
}

impl PolicyResolver {
    pub fn new(config: ProgramConfig) -> Self {
        Self { config }
    }

    pub fn policy_program_id(&self) -> Pubkey {
        Pubkey::new_from_array(self.config.policy_program_id)
    }

    pub fn policy_pda(&self, wallet: &Pubkey) -> Result<Pubkey> {
        let (policy, _) = policy_address(&self.config, &wallet.to_bytes())?;
        Ok(Pubkey::new_from_array(policy))
    }

    pub fn resolve_for_create(&self, request: PolicyRequest) -> Result<Instruction> {
        if let Some(provided) = request.provided {
            log::debug!("using provided policy instruction for {}", provided.program_id);
            return Ok(provided);
        }
        let policy = self.policy_pda(&request.wallet)?;
        let accounts = init_policy_accounts(
            request.payer.to_bytes(),
            request.wallet.to_bytes(),
            request.authority.to_bytes(),
            policy.to_bytes(),
            system_program::id().to_bytes(),
        );
        Ok(self.instruction(&accounts, PolicyInstruction::InitPolicy))
    }

    pub fn resolve_for_execute(&self, request: PolicyRequest) -> Result<Instruction> {
        if let Some(provided) = request.provided {
            log::debug!("using provided policy instruction for {}", provided.program_id);
            return Ok(provided);
        }
        let policy = self.policy_pda(&request.wallet)?;
        let accounts = check_policy_accounts(
            request.authority.to_bytes(),
            request.wallet.to_bytes(),
            policy.to_bytes(),
        );
        Ok(self.instruction(
            &accounts,
            PolicyInstruction::CheckPolicy(CheckPolicyArgs {
                policy_data: request.policy_data,
            }),
        ))
    }

    fn instruction(&self, accounts: &[PolicyAccountMeta], kind: PolicyInstruction) -> Instruction {
        Instruction {
            program_id: self.policy_program_id(),
            accounts: accounts
                .iter()
                .map(|meta| AccountMeta {
                    pubkey: Pubkey::new_from_array(meta.key),
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
                .collect(),
            data: kind.encode(),
        }
    }
}
