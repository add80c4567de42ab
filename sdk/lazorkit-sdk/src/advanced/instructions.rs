//! One builder per LazorKit instruction kind.
//!
//! Each builder derives the PDAs the instruction needs and lays the accounts
//! out in the order the program reads them. The result is a
//! [`PreparedInstruction`], which still accepts a trailing authorization
//! payload before it is encoded into a `solana_sdk` [`Instruction`].

use lazorkit_program::auth::secp256r1::{encode_auth_payload, message_digest};
use lazorkit_program::compact::{self, InnerInstruction};
use lazorkit_program::instruction::{AuthorityPayload, LazorKitInstruction};
use lazorkit_program::ledger::AccountMeta as ProgramAccountMeta;
use lazorkit_state::{ProgramConfig, Role};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use crate::core::signer::Secp256r1Signer;
use crate::error::{LazorSdkError, Result};
use crate::utils::{
    derive_authority_pda, derive_session_pda, derive_vault_pda, derive_wallet_pda,
};

/// A decoded LazorKit instruction with its positional accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedInstruction {
    pub payer: Pubkey,
    pub instruction: LazorKitInstruction,
    pub accounts: Vec<AccountMeta>,
}

impl PreparedInstruction {
    /// Replaces the trailing authorization payload. CreateWallet carries none.
    pub fn with_auth_payload(mut self, payload: Vec<u8>) -> Self {
        match &mut self.instruction {
            LazorKitInstruction::CreateWallet { .. } => {},
            LazorKitInstruction::AddAuthority { auth_payload, .. }
            | LazorKitInstruction::RemoveAuthority { auth_payload }
            | LazorKitInstruction::TransferOwnership { auth_payload, .. }
            | LazorKitInstruction::Execute { auth_payload, .. }
            | LazorKitInstruction::CreateSession { auth_payload, .. } => *auth_payload = payload,
        }
        self
    }

    /// Bytes the acting authority commits to.
    ///
    /// RemoveAuthority commits to its target and refund addresses instead of
    /// instruction data.
    pub fn signed_payload(&self) -> Result<Vec<u8>> {
        match &self.instruction {
            LazorKitInstruction::RemoveAuthority { .. } => Ok(self
                .accounts
                .iter()
                .skip(3)
                .take(2)
                .flat_map(|meta| meta.pubkey.to_bytes())
                .collect()),
            other => Ok(other.signed_body()?),
        }
    }

    /// Account list as the program sees it when hashing a Secp256r1 message.
    fn program_accounts(&self) -> Vec<ProgramAccountMeta> {
        self.accounts
            .iter()
            .map(|meta| ProgramAccountMeta {
                key: meta.pubkey.to_bytes(),
                is_signer: meta.is_signer,
                is_writable: meta.is_writable,
            })
            .collect()
    }

    /// Digest a Secp256r1 authority signs. `counter` must be one past the
    /// authority's stored counter and `authority_slot` a recent slot.
    ///
    /// Covers the final account list, so signer metas must be added before
    /// signing.
    pub fn secp256r1_digest(
        &self,
        config: &ProgramConfig,
        authority_slot: u64,
        counter: u32,
    ) -> Result<[u8; 32]> {
        let discriminator = self
            .instruction
            .discriminator()
            .to_bytes(config.discriminator_profile);
        Ok(message_digest(
            &discriminator,
            &self.signed_payload()?,
            &self.payer.to_bytes(),
            &self.program_accounts(),
            authority_slot,
            counter,
        ))
    }

    /// Signs with `signer` and installs the resulting authorization payload.
    pub async fn sign_secp256r1(
        self,
        config: &ProgramConfig,
        signer: &dyn Secp256r1Signer,
        authority_slot: u64,
        counter: u32,
    ) -> Result<Self> {
        let digest = self.secp256r1_digest(config, authority_slot, counter)?;
        let signature = signer
            .sign_digest(&digest)
            .await
            .map_err(LazorSdkError::Signing)?;
        Ok(self.with_auth_payload(encode_auth_payload(authority_slot, counter, &signature)))
    }

    /// Encodes into a `solana_sdk` instruction. Fails when an Execute batch
    /// no longer fits the packed format.
    pub fn into_instruction(self, config: &ProgramConfig) -> Result<Instruction> {
        let data = self.instruction.encode(config.discriminator_profile)?;
        Ok(Instruction {
            program_id: Pubkey::new_from_array(config.program_id),
            accounts: self.accounts,
            data,
        })
    }
}

fn with_signers(mut accounts: Vec<AccountMeta>, signers: &[Pubkey]) -> Vec<AccountMeta> {
    accounts.extend(signers.iter().map(|s| AccountMeta::new_readonly(*s, true)));
    accounts
}

pub fn create_wallet(
    config: &ProgramConfig,
    payer: &Pubkey,
    wallet_id: [u8; 32],
    owner: AuthorityPayload,
) -> Result<PreparedInstruction> {
    let (wallet, _) = derive_wallet_pda(config, &wallet_id)?;
    let (vault, _) = derive_vault_pda(config, &wallet)?;
    let (owner_pda, auth_bump) = derive_authority_pda(config, &wallet, &owner.seed)?;

    Ok(PreparedInstruction {
        payer: *payer,
        instruction: LazorKitInstruction::CreateWallet {
            wallet_id,
            auth_bump,
            owner,
        },
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(wallet, false),
            AccountMeta::new(vault, false),
            AccountMeta::new(owner_pda, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    })
}

pub fn add_authority(
    config: &ProgramConfig,
    payer: &Pubkey,
    wallet: &Pubkey,
    acting_seed: &[u8; 32],
    new_role: Role,
    authority: AuthorityPayload,
    signers: &[Pubkey],
) -> Result<PreparedInstruction> {
    let (acting, _) = derive_authority_pda(config, wallet, acting_seed)?;
    let (new_pda, _) = derive_authority_pda(config, wallet, &authority.seed)?;

    Ok(PreparedInstruction {
        payer: *payer,
        instruction: LazorKitInstruction::AddAuthority {
            new_role,
            authority,
            auth_payload: Vec::new(),
        },
        accounts: with_signers(
            vec![
                AccountMeta::new(*payer, true),
                AccountMeta::new(*wallet, false),
                AccountMeta::new_readonly(acting, false),
                AccountMeta::new(new_pda, false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            signers,
        ),
    })
}

pub fn remove_authority(
    config: &ProgramConfig,
    payer: &Pubkey,
    wallet: &Pubkey,
    acting_seed: &[u8; 32],
    target_seed: &[u8; 32],
    refund: &Pubkey,
    signers: &[Pubkey],
) -> Result<PreparedInstruction> {
    let (acting, _) = derive_authority_pda(config, wallet, acting_seed)?;
    let (target, _) = derive_authority_pda(config, wallet, target_seed)?;

    Ok(PreparedInstruction {
        payer: *payer,
        instruction: LazorKitInstruction::RemoveAuthority {
            auth_payload: Vec::new(),
        },
        accounts: with_signers(
            vec![
                AccountMeta::new(*payer, true),
                AccountMeta::new(*wallet, false),
                AccountMeta::new_readonly(acting, false),
                AccountMeta::new(target, false),
                AccountMeta::new(*refund, false),
            ],
            signers,
        ),
    })
}

pub fn transfer_ownership(
    config: &ProgramConfig,
    payer: &Pubkey,
    wallet: &Pubkey,
    current_owner_seed: &[u8; 32],
    new_owner: AuthorityPayload,
    signers: &[Pubkey],
) -> Result<PreparedInstruction> {
    let (current, _) = derive_authority_pda(config, wallet, current_owner_seed)?;
    let (next, _) = derive_authority_pda(config, wallet, &new_owner.seed)?;

    Ok(PreparedInstruction {
        payer: *payer,
        instruction: LazorKitInstruction::TransferOwnership {
            new_owner,
            auth_payload: Vec::new(),
        },
        accounts: with_signers(
            vec![
                AccountMeta::new(*payer, true),
                AccountMeta::new(*wallet, false),
                AccountMeta::new(current, false),
                AccountMeta::new(next, false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            signers,
        ),
    })
}

pub fn create_session(
    config: &ProgramConfig,
    payer: &Pubkey,
    wallet: &Pubkey,
    acting_seed: &[u8; 32],
    session_key: &Pubkey,
    expires_at: u64,
    signers: &[Pubkey],
) -> Result<PreparedInstruction> {
    let (acting, _) = derive_authority_pda(config, wallet, acting_seed)?;
    let (session, _) = derive_session_pda(config, wallet, session_key)?;

    Ok(PreparedInstruction {
        payer: *payer,
        instruction: LazorKitInstruction::CreateSession {
            session_key: session_key.to_bytes(),
            expires_at,
            auth_payload: Vec::new(),
        },
        accounts: with_signers(
            vec![
                AccountMeta::new(*payer, true),
                AccountMeta::new_readonly(*wallet, false),
                AccountMeta::new_readonly(acting, false),
                AccountMeta::new(session, false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            signers,
        ),
    })
}

fn to_inner(ix: &Instruction) -> InnerInstruction {
    InnerInstruction {
        program_id: ix.program_id.to_bytes(),
        accounts: ix
            .accounts
            .iter()
            .map(|meta| ProgramAccountMeta {
                key: meta.pubkey.to_bytes(),
                is_signer: meta.is_signer,
                is_writable: meta.is_writable,
            })
            .collect(),
        data: ix.data.clone(),
    }
}

/// Packs `inner` behind the four static accounts
/// `[payer, wallet, identity, vault]`. `identity` is the caller's authority
/// PDA or session PDA.
pub fn execute(
    config: &ProgramConfig,
    payer: &Pubkey,
    wallet: &Pubkey,
    identity: &Pubkey,
    inner: &[Instruction],
    signers: &[Pubkey],
) -> Result<PreparedInstruction> {
    let (vault, _) = derive_vault_pda(config, wallet)?;
    let statics = [
        payer.to_bytes(),
        wallet.to_bytes(),
        identity.to_bytes(),
        vault.to_bytes(),
    ];
    let inner: Vec<InnerInstruction> = inner.iter().map(to_inner).collect();
    let packed = compact::pack(&inner, &statics)?;
    let (instructions, _) = compact::unpack(&packed.bytes)?;

    let mut accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(*wallet, false),
        AccountMeta::new(*identity, false),
        AccountMeta::new(vault, false),
    ];
    accounts.extend(packed.remaining_accounts.iter().map(|meta| AccountMeta {
        pubkey: Pubkey::new_from_array(meta.key),
        is_signer: meta.is_signer,
        is_writable: meta.is_writable,
    }));

    Ok(PreparedInstruction {
        payer: *payer,
        instruction: LazorKitInstruction::Execute {
            instructions,
            auth_payload: Vec::new(),
        },
        accounts: with_signers(accounts, signers),
    })
}
