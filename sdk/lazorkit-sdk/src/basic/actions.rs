use crate::advanced::instructions::{self, PreparedInstruction};
use crate::basic::policy::{PolicyRequest, PolicyResolver};
use crate::basic::wallet::LazorWallet;
use crate::core::connection::SolConnection;
use crate::error::{LazorSdkError, Result};
use lazorkit_program::instruction::AuthorityPayload;
use lazorkit_state::{ProgramConfig, Role};
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;

/// Wraps `instructions` into an unsigned transaction paid by `payer`, using a
/// fresh blockhash.
pub async fn assemble_transaction(
    connection: &impl SolConnection,
    payer: &Pubkey,
    instructions: &[Instruction],
) -> Result<Transaction> {
    let recent_blockhash = connection
        .get_latest_blockhash()
        .await
        .map_err(|e| LazorSdkError::Connection(e.to_string()))?;
    Ok(Transaction::new_unsigned(Message::new_with_blockhash(
        instructions,
        Some(payer),
        &recent_blockhash,
    )))
}

/// Identity and proof of the authority acting on a wallet.
#[derive(Debug, Clone, Default)]
struct Acting {
    seed: Option<[u8; 32]>,
    signers: Vec<Pubkey>,
    authorization_data: Vec<u8>,
}

impl Acting {
    /// An Ed25519 key is both the PDA seed and a required signer.
    fn key(&mut self, key: Pubkey) {
        self.seed = Some(key.to_bytes());
        self.signers.push(key);
    }

    fn seed(&self) -> Result<[u8; 32]> {
        self.seed.ok_or(LazorSdkError::MissingField("acting authority"))
    }

    fn finish(&self, prepared: PreparedInstruction) -> PreparedInstruction {
        if self.authorization_data.is_empty() {
            prepared
        } else {
            prepared.with_auth_payload(self.authorization_data.clone())
        }
    }
}

pub struct CreateWalletBuilder {
    config: ProgramConfig,
    payer: Option<Pubkey>,
    wallet_id: Option<[u8; 32]>,
    owner: Option<AuthorityPayload>,
    policy_authority: Option<Pubkey>,
    policy_instruction: Option<Instruction>,
}

impl CreateWalletBuilder {
    pub fn new(config: ProgramConfig) -> Self {
        Self {
            config,
            payer: None,
            wallet_id: None,
            owner: None,
            policy_authority: None,
            policy_instruction: None,
        }
    }

    pub fn with_payer(mut self, payer: Pubkey) -> Self {
        self.payer = Some(payer);
        self
    }

    pub fn with_id(mut self, id: [u8; 32]) -> Self {
        self.wallet_id = Some(id);
        self
    }

    /// Ed25519 owner
    pub fn with_owner(mut self, owner: Pubkey) -> Self {
        self.owner = Some(AuthorityPayload::ed25519(owner.to_bytes()));
        self
    }

    pub fn with_owner_authority(mut self, owner: AuthorityPayload) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Initialise the default policy for the wallet, bound to `authority`.
    pub fn with_default_policy(mut self, authority: Pubkey) -> Self {
        self.policy_authority = Some(authority);
        self
    }

    /// Initialise a custom policy with `ix` instead of the default one.
    pub fn with_policy_instruction(mut self, ix: Instruction) -> Self {
        self.policy_instruction = Some(ix);
        self
    }

    /// Handle of the wallet this builder creates.
    pub fn wallet(&self) -> Result<LazorWallet> {
        let wallet_id = self.wallet_id.ok_or(LazorSdkError::MissingField("wallet_id"))?;
        LazorWallet::new(self.config, wallet_id)
    }

    pub fn build_instructions(&self) -> Result<Vec<Instruction>> {
        let payer = self.payer.ok_or(LazorSdkError::MissingField("payer"))?;
        let wallet_id = self.wallet_id.ok_or(LazorSdkError::MissingField("wallet_id"))?;
        let owner = self.owner.ok_or(LazorSdkError::MissingField("owner"))?;

        let create = instructions::create_wallet(&self.config, &payer, wallet_id, owner)?;
        let wallet = create.accounts[1].pubkey;
        let mut ixs = vec![create.into_instruction(&self.config)?];

        if self.policy_authority.is_some() || self.policy_instruction.is_some() {
            let policy = PolicyResolver::new(self.config).resolve_for_create(PolicyRequest {
                provided: self.policy_instruction.clone(),
                payer,
                wallet,
                authority: self.policy_authority.unwrap_or(payer),
                policy_data: Vec::new(),
            })?;
            ixs.push(policy);
        }
        log::debug!("create wallet {} with {} instruction(s)", wallet, ixs.len());
        Ok(ixs)
    }

    pub async fn build_transaction(&self, connection: &impl SolConnection) -> Result<Transaction> {
        let payer = self.payer.ok_or(LazorSdkError::MissingField("payer"))?;
        let ixs = self.build_instructions()?;
        assemble_transaction(connection, &payer, &ixs).await
    }
}

pub struct AddAuthorityBuilder<'a> {
    wallet: &'a LazorWallet,
    acting: Acting,
    new_authority: Option<AuthorityPayload>,
    role: Role,
}

impl<'a> AddAuthorityBuilder<'a> {
    pub fn new(wallet: &'a LazorWallet) -> Self {
        Self {
            wallet,
            acting: Acting::default(),
            new_authority: None,
            role: Role::Spender,
        }
    }

    /// Ed25519 authority to add
    pub fn with_authority(mut self, authority: Pubkey) -> Self {
        self.new_authority = Some(AuthorityPayload::ed25519(authority.to_bytes()));
        self
    }

    pub fn with_authority_payload(mut self, authority: AuthorityPayload) -> Self {
        self.new_authority = Some(authority);
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Ed25519 key of the acting authority; it must sign the transaction.
    pub fn with_authorizer(mut self, authorizer: Pubkey) -> Self {
        self.acting.key(authorizer);
        self
    }

    /// PDA seed of a Secp256r1 acting authority.
    pub fn with_acting_seed(mut self, seed: [u8; 32]) -> Self {
        self.acting.seed = Some(seed);
        self
    }

    pub fn with_authorization_data(mut self, data: Vec<u8>) -> Self {
        self.acting.authorization_data = data;
        self
    }

    pub fn prepare(&self, payer: Pubkey) -> Result<PreparedInstruction> {
        let authority = self
            .new_authority
            .ok_or(LazorSdkError::MissingField("new authority"))?;
        let prepared = instructions::add_authority(
            &self.wallet.config,
            &payer,
            &self.wallet.address,
            &self.acting.seed()?,
            self.role,
            authority,
            &self.acting.signers,
        )?;
        Ok(self.acting.finish(prepared))
    }

    pub async fn build_transaction(
        &self,
        connection: &impl SolConnection,
        payer: Pubkey,
    ) -> Result<Transaction> {
        let ix = self.prepare(payer)?.into_instruction(&self.wallet.config)?;
        assemble_transaction(connection, &payer, &[ix]).await
    }
}

pub struct RemoveAuthorityBuilder<'a> {
    wallet: &'a LazorWallet,
    acting: Acting,
    target_seed: Option<[u8; 32]>,
    refund: Option<Pubkey>,
}

impl<'a> RemoveAuthorityBuilder<'a> {
    pub fn new(wallet: &'a LazorWallet) -> Self {
        Self {
            wallet,
            acting: Acting::default(),
            target_seed: None,
            refund: None,
        }
    }

    /// Ed25519 key of the authority to remove
    pub fn with_target(mut self, target: Pubkey) -> Self {
        self.target_seed = Some(target.to_bytes());
        self
    }

    pub fn with_target_seed(mut self, seed: [u8; 32]) -> Self {
        self.target_seed = Some(seed);
        self
    }

    /// Receives the lamports of the closed authority account. Defaults to the payer.
    pub fn with_refund(mut self, refund: Pubkey) -> Self {
        self.refund = Some(refund);
        self
    }

    pub fn with_authorizer(mut self, authorizer: Pubkey) -> Self {
        self.acting.key(authorizer);
        self
    }

    pub fn with_acting_seed(mut self, seed: [u8; 32]) -> Self {
        self.acting.seed = Some(seed);
        self
    }

    pub fn with_authorization_data(mut self, data: Vec<u8>) -> Self {
        self.acting.authorization_data = data;
        self
    }

    pub fn prepare(&self, payer: Pubkey) -> Result<PreparedInstruction> {
        let target = self
            .target_seed
            .ok_or(LazorSdkError::MissingField("target authority"))?;
        let prepared = instructions::remove_authority(
            &self.wallet.config,
            &payer,
            &self.wallet.address,
            &self.acting.seed()?,
            &target,
            &self.refund.unwrap_or(payer),
            &self.acting.signers,
        )?;
        Ok(self.acting.finish(prepared))
    }

    pub async fn build_transaction(
        &self,
        connection: &impl SolConnection,
        payer: Pubkey,
    ) -> Result<Transaction> {
        let ix = self.prepare(payer)?.into_instruction(&self.wallet.config)?;
        assemble_transaction(connection, &payer, &[ix]).await
    }
}

pub struct TransferOwnershipBuilder<'a> {
    wallet: &'a LazorWallet,
    acting: Acting,
    new_owner: Option<AuthorityPayload>,
}

impl<'a> TransferOwnershipBuilder<'a> {
    pub fn new(wallet: &'a LazorWallet) -> Self {
        Self {
            wallet,
            acting: Acting::default(),
            new_owner: None,
        }
    }

    /// Ed25519 key of the current owner; it must sign the transaction.
    pub fn with_current_owner(mut self, owner: Pubkey) -> Self {
        self.acting.key(owner);
        self
    }

    pub fn with_current_owner_seed(mut self, seed: [u8; 32]) -> Self {
        self.acting.seed = Some(seed);
        self
    }

    pub fn with_new_owner(mut self, owner: Pubkey) -> Self {
        self.new_owner = Some(AuthorityPayload::ed25519(owner.to_bytes()));
        self
    }

    pub fn with_new_owner_authority(mut self, owner: AuthorityPayload) -> Self {
        self.new_owner = Some(owner);
        self
    }

    pub fn with_authorization_data(mut self, data: Vec<u8>) -> Self {
        self.acting.authorization_data = data;
        self
    }

    pub fn prepare(&self, payer: Pubkey) -> Result<PreparedInstruction> {
        let new_owner = self
            .new_owner
            .ok_or(LazorSdkError::MissingField("new owner"))?;
        let prepared = instructions::transfer_ownership(
            &self.wallet.config,
            &payer,
            &self.wallet.address,
            &self.acting.seed()?,
            new_owner,
            &self.acting.signers,
        )?;
        Ok(self.acting.finish(prepared))
    }

    pub async fn build_transaction(
        &self,
        connection: &impl SolConnection,
        payer: Pubkey,
    ) -> Result<Transaction> {
        let ix = self.prepare(payer)?.into_instruction(&self.wallet.config)?;
        assemble_transaction(connection, &payer, &[ix]).await
    }
}

#[derive(Debug, Clone, Copy)]
enum Expiry {
    AtSlot(u64),
    /// Slots after the current slot, read at build time.
    After(u64),
}

pub struct CreateSessionBuilder<'a> {
    wallet: &'a LazorWallet,
    acting: Acting,
    session_key: Option<Pubkey>,
    expiry: Option<Expiry>,
}

impl<'a> CreateSessionBuilder<'a> {
    pub fn new(wallet: &'a LazorWallet) -> Self {
        Self {
            wallet,
            acting: Acting::default(),
            session_key: None,
            expiry: None,
        }
    }

    pub fn with_session_key(mut self, key: Pubkey) -> Self {
        self.session_key = Some(key);
        self
    }

    /// Absolute expiry slot (exclusive).
    pub fn with_expiry(mut self, slot: u64) -> Self {
        self.expiry = Some(Expiry::AtSlot(slot));
        self
    }

    /// Expire `slots` after the current slot.
    pub fn with_duration(mut self, slots: u64) -> Self {
        self.expiry = Some(Expiry::After(slots));
        self
    }

    pub fn with_authorizer(mut self, authorizer: Pubkey) -> Self {
        self.acting.key(authorizer);
        self
    }

    pub fn with_acting_seed(mut self, seed: [u8; 32]) -> Self {
        self.acting.seed = Some(seed);
        self
    }

    pub fn with_authorization_data(mut self, data: Vec<u8>) -> Self {
        self.acting.authorization_data = data;
        self
    }

    async fn expires_at(&self, connection: &impl SolConnection) -> Result<u64> {
        match self.expiry.ok_or(LazorSdkError::MissingField("expiry"))? {
            Expiry::AtSlot(slot) => Ok(slot),
            Expiry::After(slots) => {
                let current = connection
                    .get_slot()
                    .await
                    .map_err(|e| LazorSdkError::Connection(e.to_string()))?;
                Ok(current.saturating_add(slots))
            },
        }
    }

    pub async fn prepare(
        &self,
        connection: &impl SolConnection,
        payer: Pubkey,
    ) -> Result<PreparedInstruction> {
        let session_key = self
            .session_key
            .ok_or(LazorSdkError::MissingField("session key"))?;
        let prepared = instructions::create_session(
            &self.wallet.config,
            &payer,
            &self.wallet.address,
            &self.acting.seed()?,
            &session_key,
            self.expires_at(connection).await?,
            &self.acting.signers,
        )?;
        Ok(self.acting.finish(prepared))
    }

    pub async fn build_transaction(
        &self,
        connection: &impl SolConnection,
        payer: Pubkey,
    ) -> Result<Transaction> {
        let ix = self
            .prepare(connection, payer)
            .await?
            .into_instruction(&self.wallet.config)?;
        assemble_transaction(connection, &payer, &[ix]).await
    }
}

#[derive(Debug, Clone, Copy)]
enum Caller {
    Authority([u8; 32]),
    Session(Pubkey),
}

pub struct ExecuteBuilder<'a> {
    wallet: &'a LazorWallet,
    instructions: Vec<Instruction>,
    caller: Option<Caller>,
    signers: Vec<Pubkey>,
    authorization_data: Vec<u8>,
    policy: Option<PolicyRequest>,
}

impl<'a> ExecuteBuilder<'a> {
    pub fn new(wallet: &'a LazorWallet) -> Self {
        Self {
            wallet,
            instructions: Vec::new(),
            caller: None,
            signers: Vec::new(),
            authorization_data: Vec::new(),
            policy: None,
        }
    }

    /// Instruction to run with the vault as signer
    pub fn add_instruction(mut self, ix: Instruction) -> Self {
        self.instructions.push(ix);
        self
    }

    /// Ed25519 authority key; it must sign the transaction.
    pub fn with_authority(mut self, key: Pubkey) -> Self {
        self.caller = Some(Caller::Authority(key.to_bytes()));
        self.signers.push(key);
        self
    }

    /// PDA seed of a Secp256r1 authority.
    pub fn with_authority_seed(mut self, seed: [u8; 32]) -> Self {
        self.caller = Some(Caller::Authority(seed));
        self
    }

    /// Execute through a session record; the session key must sign.
    pub fn with_session(mut self, session_key: Pubkey) -> Self {
        self.caller = Some(Caller::Session(session_key));
        self.signers.push(session_key);
        self
    }

    /// Extra signer required by an inner instruction.
    pub fn with_signer(mut self, signer: Pubkey) -> Self {
        self.signers.push(signer);
        self
    }

    pub fn with_authorization_data(mut self, data: Vec<u8>) -> Self {
        self.authorization_data = data;
        self
    }

    /// Prepend the default `check_policy` call, bound to `authority`.
    pub fn with_policy_check(mut self, authority: Pubkey, policy_data: Vec<u8>) -> Self {
        self.policy = Some(PolicyRequest {
            authority,
            policy_data,
            ..PolicyRequest::default()
        });
        self
    }

    /// Prepend a custom policy instruction instead of the default one.
    pub fn with_policy_instruction(mut self, ix: Instruction) -> Self {
        self.policy = Some(PolicyRequest {
            provided: Some(ix),
            ..PolicyRequest::default()
        });
        self
    }

    fn identity(&self) -> Result<Pubkey> {
        match self.caller.ok_or(LazorSdkError::MissingField("caller"))? {
            Caller::Authority(seed) => self.wallet.authority_pda(&seed),
            Caller::Session(key) => self.wallet.session_pda(&key),
        }
    }

    pub fn prepare(&self, payer: Pubkey) -> Result<PreparedInstruction> {
        let prepared = instructions::execute(
            &self.wallet.config,
            &payer,
            &self.wallet.address,
            &self.identity()?,
            &self.instructions,
            &self.signers,
        )?;
        if self.authorization_data.is_empty() {
            Ok(prepared)
        } else {
            Ok(prepared.with_auth_payload(self.authorization_data.clone()))
        }
    }

    /// The policy instruction (if any) followed by the Execute instruction.
    pub fn build_instructions(&self, prepared: PreparedInstruction) -> Result<Vec<Instruction>> {
        let mut ixs = Vec::with_capacity(2);
        if let Some(request) = &self.policy {
            let payer = prepared.payer;
            let policy = PolicyResolver::new(self.wallet.config).resolve_for_execute(
                PolicyRequest {
                    payer,
                    wallet: self.wallet.address,
                    ..request.clone()
                },
            )?;
            ixs.push(policy);
        }
        ixs.push(prepared.into_instruction(&self.wallet.config)?);
        Ok(ixs)
    }

    pub async fn build_transaction(
        &self,
        connection: &impl SolConnection,
        payer: Pubkey,
    ) -> Result<Transaction> {
        let ixs = self.build_instructions(self.prepare(payer)?)?;
        log::debug!(
            "execute {} inner instruction(s) from {}",
            self.instructions.len(),
            self.wallet.address
        );
        assemble_transaction(connection, &payer, &ixs).await
    }
}
