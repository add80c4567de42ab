#![allow(dead_code)]

use async_trait::async_trait;
use lazorkit_interface::{policy_address, PolicyAccount, PolicyInstruction};
use lazorkit_program::actions::InstructionDispatcher;
use lazorkit_program::auth::Secp256r1Verifier;
use lazorkit_program::compact::ResolvedInstruction;
use lazorkit_program::ledger::{AccountMeta as ProgramAccountMeta, MemoryLedger, StateDelta};
use lazorkit_program::process_on_ledger;
use lazorkit_sdk::core::connection::{SolConnection, TransactionStatus};
use lazorkit_sdk::core::signer::{sign_transaction, LazorSigner, Secp256r1Signer};
use lazorkit_state::ProgramConfig;
use pinocchio::program_error::ProgramError;
use solana_sdk::{
    account::Account,
    hash::Hash,
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    system_program,
    transaction::Transaction,
};
use std::collections::HashMap;
use std::error::Error;
use tokio::sync::Mutex;

pub const START_SLOT: u64 = 10_000;

/// Accepts a signature made of the digest written twice.
pub struct EchoVerifier;

impl Secp256r1Verifier for EchoVerifier {
    fn verify(&self, _public_key: &[u8; 33], message: &[u8; 32], signature: &[u8; 64]) -> bool {
        signature[..32] == message[..] && signature[32..] == message[..]
    }
}

/// Passkey stand-in whose signatures [`EchoVerifier`] accepts.
pub struct EchoPasskey {
    pub public_key: [u8; 33],
    pub credential_hash: [u8; 32],
}

impl EchoPasskey {
    pub fn new(tag: u8) -> Self {
        let mut public_key = [tag; 33];
        public_key[0] = 0x02;
        Self {
            public_key,
            credential_hash: [tag; 32],
        }
    }
}

#[async_trait]
impl Secp256r1Signer for EchoPasskey {
    fn public_key(&self) -> [u8; 33] {
        self.public_key
    }

    fn credential_hash(&self) -> [u8; 32] {
        self.credential_hash
    }

    async fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; 64], String> {
        let mut signature = [0u8; 64];
        signature[..32].copy_from_slice(digest);
        signature[32..].copy_from_slice(digest);
        Ok(signature)
    }
}

/// Executes system transfers out of the vault after the batch is authorized.
#[derive(Default)]
struct TransferDispatcher {
    transfers: Vec<([u8; 32], [u8; 32], u64)>,
}

impl InstructionDispatcher for TransferDispatcher {
    fn dispatch(
        &mut self,
        instruction: &ResolvedInstruction,
        _signer_seeds: &[&[u8]],
    ) -> Result<(), ProgramError> {
        let data = &instruction.data;
        if instruction.program_id != system_program::id().to_bytes()
            || data.len() != 12
            || data[..4] != [2, 0, 0, 0]
            || instruction.accounts.len() < 2
            || !instruction.accounts[0].is_signer
        {
            return Err(ProgramError::InvalidInstructionData);
        }
        let mut amount = [0u8; 8];
        amount.copy_from_slice(&data[4..]);
        self.transfers.push((
            instruction.accounts[0].key,
            instruction.accounts[1].key,
            u64::from_le_bytes(amount),
        ));
        Ok(())
    }
}

struct MockState {
    ledger: MemoryLedger,
    statuses: HashMap<Signature, TransactionStatus>,
    /// Status polls to answer with "not landed yet".
    pending_polls: u32,
}

/// In-memory cluster running the LazorKit processor and the default policy.
pub struct MockConnection {
    pub config: ProgramConfig,
    blockhash: Hash,
    state: Mutex<MockState>,
}

fn is_writable(message: &Message, index: usize) -> bool {
    let header = &message.header;
    let signed = header.num_required_signatures as usize;
    if index < signed {
        index < signed - header.num_readonly_signed_accounts as usize
    } else {
        let unsigned = message.account_keys.len() - signed;
        index - signed < unsigned - header.num_readonly_unsigned_accounts as usize
    }
}

impl MockConnection {
    pub fn new(config: ProgramConfig) -> Self {
        let mut ledger = MemoryLedger::new();
        ledger.set_slot(START_SLOT);
        Self {
            config,
            blockhash: Hash::new_unique(),
            state: Mutex::new(MockState {
                ledger,
                statuses: HashMap::new(),
                pending_polls: 0,
            }),
        }
    }

    pub async fn airdrop(&self, key: &Pubkey, lamports: u64) {
        let mut state = self.state.lock().await;
        let current = state.ledger.lamports(&key.to_bytes());
        state.ledger.set_lamports(key.to_bytes(), current + lamports);
    }

    pub async fn lamports(&self, key: &Pubkey) -> u64 {
        self.state.lock().await.ledger.lamports(&key.to_bytes())
    }

    pub async fn warp(&self, slots: u64) {
        self.state.lock().await.ledger.warp(slots);
    }

    pub async fn delay_confirmations(&self, polls: u32) {
        self.state.lock().await.pending_polls = polls;
    }

    /// Signs with `signers` and sends, returning the error text on failure.
    pub async fn process(
        &self,
        mut tx: Transaction,
        signers: &[&dyn LazorSigner],
    ) -> Result<Signature, String> {
        sign_transaction(&mut tx, signers)
            .await
            .map_err(|e| e.to_string())?;
        self.send_transaction(&tx).await.map_err(|e| e.to_string())
    }

    fn run(&self, ledger: &mut MemoryLedger, tx: &Transaction) -> Result<(), String> {
        tx.verify().map_err(|e| format!("signature verification failed: {}", e))?;
        let message = &tx.message;
        for compiled in &message.instructions {
            let program_id = message.account_keys[compiled.program_id_index as usize].to_bytes();
            let accounts: Vec<ProgramAccountMeta> = compiled
                .accounts
                .iter()
                .map(|&i| {
                    let i = i as usize;
                    ProgramAccountMeta {
                        key: message.account_keys[i].to_bytes(),
                        is_signer: message.is_signer(i),
                        is_writable: is_writable(message, i),
                    }
                })
                .collect();

            if program_id == self.config.program_id {
                let mut dispatcher = TransferDispatcher::default();
                process_on_ledger(
                    ledger,
                    &self.config,
                    &accounts,
                    &compiled.data,
                    &EchoVerifier,
                    &mut dispatcher,
                )
                .map_err(|e| e.to_string())?;
                for (from, to, amount) in dispatcher.transfers {
                    let balance = ledger.lamports(&from);
                    if balance < amount {
                        return Err("insufficient lamports".to_string());
                    }
                    ledger.set_lamports(from, balance - amount);
                    let credited = ledger.lamports(&to) + amount;
                    ledger.set_lamports(to, credited);
                }
            } else if program_id == self.config.policy_program_id {
                self.run_policy(ledger, &accounts, &compiled.data)?;
            } else {
                return Err(format!("unknown program {:?}", program_id));
            }
        }
        Ok(())
    }

    fn run_policy(
        &self,
        ledger: &mut MemoryLedger,
        accounts: &[ProgramAccountMeta],
        data: &[u8],
    ) -> Result<(), String> {
        let instruction = PolicyInstruction::decode(data).map_err(|e| format!("{:?}", e))?;
        match instruction {
            PolicyInstruction::InitPolicy => {
                let [_, wallet, authority, policy, _] = accounts else {
                    return Err("init_policy needs 5 accounts".to_string());
                };
                let (expected, _) =
                    policy_address(&self.config, &wallet.key).map_err(|e| e.to_string())?;
                if !authority.is_signer || policy.key != expected {
                    return Err("init_policy rejected".to_string());
                }
                if ledger.account(&policy.key).is_some_and(|a| !a.data.is_empty()) {
                    return Err("policy already initialized".to_string());
                }
                let mut delta = StateDelta::new();
                delta.store(
                    policy.key,
                    PolicyAccount {
                        wallet: wallet.key,
                        authority: authority.key,
                    }
                    .to_bytes(),
                );
                ledger.apply(&delta).map_err(|e| e.to_string())
            },
            PolicyInstruction::CheckPolicy(_) => {
                let [authority, wallet, policy] = accounts else {
                    return Err("check_policy needs 3 accounts".to_string());
                };
                let record = ledger
                    .account(&policy.key)
                    .ok_or("policy not initialized")
                    .and_then(|a| {
                        PolicyAccount::from_bytes(&a.data).map_err(|_| "bad policy record")
                    })?;
                if !authority.is_signer {
                    return Err("policy authority must sign".to_string());
                }
                record
                    .check(&wallet.key, &authority.key)
                    .map_err(|e| format!("policy check failed: {:?}", e))
            },
        }
    }
}

#[async_trait]
impl SolConnection for MockConnection {
    async fn send_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<Signature, Box<dyn Error + Send + Sync>> {
        let signature = *tx.signatures.first().ok_or("No signature")?;
        let mut state = self.state.lock().await;
        let mut staged = state.ledger.clone();
        self.run(&mut staged, tx)?;
        state.ledger = staged;
        state.statuses.insert(signature, Ok(()));
        Ok(signature)
    }

    async fn get_account(
        &self,
        pubkey: &Pubkey,
    ) -> Result<Option<Account>, Box<dyn Error + Send + Sync>> {
        let state = self.state.lock().await;
        let Some(stored) = state.ledger.account(&pubkey.to_bytes()) else {
            return Ok(None);
        };
        let owner = if stored.data.is_empty() {
            system_program::id()
        } else if PolicyAccount::from_bytes(&stored.data).is_ok() {
            Pubkey::new_from_array(self.config.policy_program_id)
        } else {
            Pubkey::new_from_array(self.config.program_id)
        };
        Ok(Some(Account {
            lamports: stored.lamports,
            data: stored.data.clone(),
            owner,
            executable: false,
            rent_epoch: 0,
        }))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, Box<dyn Error + Send + Sync>> {
        Ok(self.blockhash)
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, Box<dyn Error + Send + Sync>> {
        Ok((data_len as u64 + 128) * 6_960)
    }

    async fn get_slot(&self) -> Result<u64, Box<dyn Error + Send + Sync>> {
        Ok(self.state.lock().await.ledger.slot())
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionStatus>, Box<dyn Error + Send + Sync>> {
        let mut state = self.state.lock().await;
        if state.pending_polls > 0 {
            state.pending_polls -= 1;
            return Ok(None);
        }
        Ok(state.statuses.get(signature).cloned())
    }
}

pub struct TestContext {
    pub connection: MockConnection,
    pub payer: Keypair,
    pub owner: Keypair,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(ProgramConfig::default())
    }

    pub fn with_config(config: ProgramConfig) -> Self {
        Self {
            connection: MockConnection::new(config),
            payer: Keypair::new(),
            owner: Keypair::new(),
        }
    }

    pub fn config(&self) -> ProgramConfig {
        self.connection.config
    }

    pub fn payer_key(&self) -> Pubkey {
        Signer::pubkey(&self.payer)
    }
}
