#![allow(dead_code)]

use lazorkit_program::actions::{InstructionDispatcher, EXECUTE_STATIC_ACCOUNTS};
use lazorkit_program::auth::secp256r1::{encode_auth_payload, message_digest};
use lazorkit_program::auth::Secp256r1Verifier;
use lazorkit_program::compact::{self, InnerInstruction, ResolvedInstruction};
use lazorkit_program::context::SYSTEM_PROGRAM_ID;
use lazorkit_program::instruction::{AuthorityPayload, LazorKitInstruction};
use lazorkit_program::ledger::{AccountMeta, MemoryLedger};
use lazorkit_program::{process_on_ledger, LazorKitError, ProcessOutcome};
use lazorkit_state::{AddressDeriver, ProgramConfig, Role, WalletAccount};
use pinocchio::program_error::ProgramError;
use pinocchio::pubkey::Pubkey;

pub const START_SLOT: u64 = 10_000;
pub const PAYER: Pubkey = [0xAA; 32];
pub const OWNER_KEY: [u8; 32] = [0x01; 32];
pub const RECIPIENT: Pubkey = [0x99; 32];

/// Accepts a signature made of the digest written twice.
pub struct EchoVerifier;

impl Secp256r1Verifier for EchoVerifier {
    fn verify(&self, _public_key: &[u8; 33], message: &[u8; 32], signature: &[u8; 64]) -> bool {
        signature[..32] == message[..] && signature[32..] == message[..]
    }
}

pub fn echo_signature(digest: &[u8; 32]) -> [u8; 64] {
    let mut signature = [0u8; 64];
    signature[..32].copy_from_slice(digest);
    signature[32..].copy_from_slice(digest);
    signature
}

#[derive(Default)]
pub struct RecordingDispatcher {
    pub calls: Vec<(ResolvedInstruction, Vec<Vec<u8>>)>,
    pub fail: bool,
    /// Fail the call at this position, after earlier calls went through.
    pub fail_at: Option<usize>,
}

impl InstructionDispatcher for RecordingDispatcher {
    fn dispatch(
        &mut self,
        instruction: &ResolvedInstruction,
        signer_seeds: &[&[u8]],
    ) -> Result<(), ProgramError> {
        if self.fail || self.fail_at == Some(self.calls.len()) {
            return Err(ProgramError::Custom(1));
        }
        self.calls.push((
            instruction.clone(),
            signer_seeds.iter().map(|s| s.to_vec()).collect(),
        ));
        Ok(())
    }
}

/// A system-program style transfer out of the vault.
pub fn transfer_from(vault: Pubkey, lamports: u64) -> InnerInstruction {
    let mut data = vec![2, 0, 0, 0];
    data.extend_from_slice(&lamports.to_le_bytes());
    InnerInstruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![AccountMeta::new(vault, true), AccountMeta::new(RECIPIENT, false)],
        data,
    }
}

pub struct TestContext {
    pub ledger: MemoryLedger,
    pub config: ProgramConfig,
    pub dispatcher: RecordingDispatcher,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(ProgramConfig::default())
    }

    pub fn with_config(config: ProgramConfig) -> Self {
        let mut ledger = MemoryLedger::new();
        ledger.set_slot(START_SLOT);
        Self {
            ledger,
            config,
            dispatcher: RecordingDispatcher::default(),
        }
    }

    pub fn deriver(&self) -> AddressDeriver<'_> {
        AddressDeriver::new(&self.config)
    }

    pub fn wallet_key(&self, wallet_id: &[u8; 32]) -> Pubkey {
        self.deriver().wallet(wallet_id).unwrap().0
    }

    pub fn vault_key(&self, wallet: &Pubkey) -> Pubkey {
        self.deriver().vault(wallet).unwrap().0
    }

    pub fn authority_key(&self, wallet: &Pubkey, seed: &[u8; 32]) -> Pubkey {
        self.deriver().authority(wallet, seed).unwrap().0
    }

    pub fn session_pda(&self, wallet: &Pubkey, session_key: &[u8; 32]) -> Pubkey {
        self.deriver().session(wallet, session_key).unwrap().0
    }

    pub fn wallet(&self, wallet: &Pubkey) -> WalletAccount {
        let record = self.ledger.account(wallet).expect("wallet exists");
        WalletAccount::from_bytes(&record.data).unwrap()
    }

    pub fn owner_count(&self, wallet: &Pubkey) -> usize {
        self.wallet(wallet)
            .authorities()
            .iter()
            .filter(|a| a.role == Role::Owner)
            .count()
    }

    pub fn run(
        &mut self,
        accounts: &[AccountMeta],
        instruction: &LazorKitInstruction,
    ) -> Result<ProcessOutcome, LazorKitError> {
        let data = instruction.encode(self.config.discriminator_profile)?;
        process_on_ledger(
            &mut self.ledger,
            &self.config,
            accounts,
            &data,
            &EchoVerifier,
            &mut self.dispatcher,
        )
    }

    pub fn create_wallet(
        &mut self,
        wallet_id: [u8; 32],
        owner: AuthorityPayload,
    ) -> Result<Pubkey, LazorKitError> {
        let wallet = self.wallet_key(&wallet_id);
        let (owner_pda, auth_bump) = self.deriver().authority(&wallet, &owner.seed).unwrap();
        let accounts = vec![
            AccountMeta::new(PAYER, true),
            AccountMeta::new(wallet, false),
            AccountMeta::new(self.vault_key(&wallet), false),
            AccountMeta::new(owner_pda, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        ];
        self.run(
            &accounts,
            &LazorKitInstruction::CreateWallet {
                wallet_id,
                auth_bump,
                owner,
            },
        )?;
        Ok(wallet)
    }

    /// Creates a wallet owned by the Ed25519 key [`OWNER_KEY`].
    pub fn default_wallet(&mut self) -> Pubkey {
        self.create_wallet([0; 32], AuthorityPayload::ed25519(OWNER_KEY))
            .unwrap()
    }

    fn with_signers(mut accounts: Vec<AccountMeta>, signers: &[[u8; 32]]) -> Vec<AccountMeta> {
        accounts.extend(signers.iter().map(|s| AccountMeta::new_readonly(*s, true)));
        accounts
    }

    pub fn add_authority(
        &mut self,
        wallet: &Pubkey,
        acting_seed: &[u8; 32],
        signers: &[[u8; 32]],
        new_role: Role,
        authority: AuthorityPayload,
        auth_payload: Vec<u8>,
    ) -> Result<ProcessOutcome, LazorKitError> {
        let accounts = Self::with_signers(
            vec![
                AccountMeta::new(PAYER, true),
                AccountMeta::new(*wallet, false),
                AccountMeta::new_readonly(self.authority_key(wallet, acting_seed), false),
                AccountMeta::new(self.authority_key(wallet, &authority.seed), false),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
            signers,
        );
        self.run(
            &accounts,
            &LazorKitInstruction::AddAuthority {
                new_role,
                authority,
                auth_payload,
            },
        )
    }

    /// Adds an Ed25519 authority on behalf of the default owner.
    pub fn add_ed25519(&mut self, wallet: &Pubkey, role: Role, key: [u8; 32]) -> u8 {
        self.add_authority(
            wallet,
            &OWNER_KEY,
            &[OWNER_KEY],
            role,
            AuthorityPayload::ed25519(key),
            vec![],
        )
        .unwrap();
        self.wallet(wallet).authority_by_seed(&key).unwrap().id
    }

    pub fn remove_accounts(
        &self,
        wallet: &Pubkey,
        acting_seed: &[u8; 32],
        target_seed: &[u8; 32],
        signers: &[[u8; 32]],
    ) -> Vec<AccountMeta> {
        Self::with_signers(
            vec![
                AccountMeta::new(PAYER, true),
                AccountMeta::new(*wallet, false),
                AccountMeta::new_readonly(self.authority_key(wallet, acting_seed), false),
                AccountMeta::new(self.authority_key(wallet, target_seed), false),
                AccountMeta::new(PAYER, false),
            ],
            signers,
        )
    }

    pub fn remove_authority(
        &mut self,
        wallet: &Pubkey,
        acting_seed: &[u8; 32],
        target_seed: &[u8; 32],
        signers: &[[u8; 32]],
    ) -> Result<ProcessOutcome, LazorKitError> {
        let accounts = self.remove_accounts(wallet, acting_seed, target_seed, signers);
        self.run(
            &accounts,
            &LazorKitInstruction::RemoveAuthority {
                auth_payload: vec![],
            },
        )
    }

    pub fn transfer_ownership(
        &mut self,
        wallet: &Pubkey,
        acting_seed: &[u8; 32],
        signers: &[[u8; 32]],
        new_owner: AuthorityPayload,
    ) -> Result<ProcessOutcome, LazorKitError> {
        let accounts = Self::with_signers(
            vec![
                AccountMeta::new(PAYER, true),
                AccountMeta::new(*wallet, false),
                AccountMeta::new(self.authority_key(wallet, acting_seed), false),
                AccountMeta::new(self.authority_key(wallet, &new_owner.seed), false),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
            signers,
        );
        self.run(
            &accounts,
            &LazorKitInstruction::TransferOwnership {
                new_owner,
                auth_payload: vec![],
            },
        )
    }

    pub fn session_accounts(
        &self,
        wallet: &Pubkey,
        acting_seed: &[u8; 32],
        signers: &[[u8; 32]],
        session_key: &[u8; 32],
    ) -> Vec<AccountMeta> {
        Self::with_signers(
            vec![
                AccountMeta::new(PAYER, true),
                AccountMeta::new_readonly(*wallet, false),
                AccountMeta::new_readonly(self.authority_key(wallet, acting_seed), false),
                AccountMeta::new(self.session_pda(wallet, session_key), false),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
            signers,
        )
    }

    pub fn create_session(
        &mut self,
        wallet: &Pubkey,
        acting_seed: &[u8; 32],
        signers: &[[u8; 32]],
        session_key: [u8; 32],
        expires_at: u64,
        auth_payload: Vec<u8>,
    ) -> Result<ProcessOutcome, LazorKitError> {
        let accounts = self.session_accounts(wallet, acting_seed, signers, &session_key);
        self.run(
            &accounts,
            &LazorKitInstruction::CreateSession {
                session_key,
                expires_at,
                auth_payload,
            },
        )
    }

    /// Packs `inner` behind the four static Execute accounts.
    pub fn execute_accounts(
        &self,
        wallet: &Pubkey,
        identity: Pubkey,
        signers: &[[u8; 32]],
        inner: &[InnerInstruction],
    ) -> (Vec<AccountMeta>, LazorKitInstruction) {
        let statics = [PAYER, *wallet, identity, self.vault_key(wallet)];
        let packed = compact::pack(inner, &statics).unwrap();
        let (instructions, rest) = compact::unpack(&packed.bytes).unwrap();
        assert!(rest.is_empty());

        let mut accounts = vec![
            AccountMeta::new(PAYER, true),
            AccountMeta::new(*wallet, false),
            AccountMeta::new(identity, false),
            AccountMeta::new(statics[3], false),
        ];
        assert_eq!(accounts.len(), EXECUTE_STATIC_ACCOUNTS);
        accounts.extend(packed.remaining_accounts);
        let accounts = Self::with_signers(accounts, signers);
        (
            accounts,
            LazorKitInstruction::Execute {
                instructions,
                auth_payload: vec![],
            },
        )
    }

    pub fn execute(
        &mut self,
        wallet: &Pubkey,
        identity: Pubkey,
        signers: &[[u8; 32]],
        inner: &[InnerInstruction],
    ) -> Result<ProcessOutcome, LazorKitError> {
        let (accounts, instruction) = self.execute_accounts(wallet, identity, signers, inner);
        self.run(&accounts, &instruction)
    }

    /// Secp256r1 authorization payload accepted by [`EchoVerifier`].
    pub fn secp256r1_auth(
        &self,
        accounts: &[AccountMeta],
        instruction: &LazorKitInstruction,
        counter: u32,
        authority_slot: u64,
    ) -> Vec<u8> {
        let discriminator = instruction
            .discriminator()
            .to_bytes(self.config.discriminator_profile);
        let digest = message_digest(
            &discriminator,
            &instruction.signed_body().unwrap(),
            &PAYER,
            accounts,
            authority_slot,
            counter,
        );
        encode_auth_payload(authority_slot, counter, &echo_signature(&digest))
    }
}
