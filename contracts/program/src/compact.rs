use std::collections::HashMap;

use pinocchio::pubkey::Pubkey;

use crate::error::LazorKitError;
use crate::ledger::AccountMeta;

/// Combined limit of static and remaining accounts addressable by a u8 index.
pub const MAX_ACCOUNTS: usize = 256;
pub const MAX_INSTRUCTIONS: usize = u8::MAX as usize;
pub const MAX_ACCOUNTS_PER_INSTRUCTION: usize = u8::MAX as usize;

/// Privileges an inner instruction requests for one account.
///
/// On the wire: bit0 = writable, bit1 = signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountRole {
    Readonly,
    Writable,
    ReadonlySigner,
    WritableSigner,
}

impl AccountRole {
    pub const fn new(is_signer: bool, is_writable: bool) -> Self {
        match (is_signer, is_writable) {
            (false, false) => AccountRole::Readonly,
            (false, true) => AccountRole::Writable,
            (true, false) => AccountRole::ReadonlySigner,
            (true, true) => AccountRole::WritableSigner,
        }
    }

    pub const fn is_signer(self) -> bool {
        matches!(self, AccountRole::ReadonlySigner | AccountRole::WritableSigner)
    }

    pub const fn is_writable(self) -> bool {
        matches!(self, AccountRole::Writable | AccountRole::WritableSigner)
    }

    /// Union of both privilege sets.
    pub const fn merge(self, other: AccountRole) -> AccountRole {
        AccountRole::new(
            self.is_signer() || other.is_signer(),
            self.is_writable() || other.is_writable(),
        )
    }

    pub const fn to_byte(self) -> u8 {
        match self {
            AccountRole::Readonly => 0b00,
            AccountRole::Writable => 0b01,
            AccountRole::ReadonlySigner => 0b10,
            AccountRole::WritableSigner => 0b11,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self, LazorKitError> {
        match byte {
            0b00 => Ok(AccountRole::Readonly),
            0b01 => Ok(AccountRole::Writable),
            0b10 => Ok(AccountRole::ReadonlySigner),
            0b11 => Ok(AccountRole::WritableSigner),
            _ => Err(LazorKitError::MalformedInstruction),
        }
    }

    pub fn meta(self, key: Pubkey) -> AccountMeta {
        AccountMeta {
            key,
            is_signer: self.is_signer(),
            is_writable: self.is_writable(),
        }
    }
}

impl From<&AccountMeta> for AccountRole {
    fn from(meta: &AccountMeta) -> Self {
        AccountRole::new(meta.is_signer, meta.is_writable)
    }
}

/// A downstream call before packing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Represents a single instruction in compact format.
///
/// Instead of storing full public keys, this format uses indexes
/// into a shared account list to reduce data size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub roles: Vec<AccountRole>,
    pub data: Vec<u8>,
}

/// A compact instruction mapped back to addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Output of [`pack`]: the batch bytes plus the accounts to append after the
/// static ones, in index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBatch {
    pub bytes: Vec<u8>,
    pub remaining_accounts: Vec<AccountMeta>,
}

impl CompactInstruction {
    /// Deserialize a CompactInstruction from bytes
    /// Format: [program_id_index: u8][num_accounts: u8][accounts...][roles...][data_len: u16][data...]
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), LazorKitError> {
        let (&program_id_index, rest) = bytes
            .split_first()
            .ok_or(LazorKitError::MalformedInstruction)?;
        let (&num_accounts, rest) = rest
            .split_first()
            .ok_or(LazorKitError::MalformedInstruction)?;
        let num_accounts = num_accounts as usize;

        if rest.len() < num_accounts * 2 + 2 {
            return Err(LazorKitError::MalformedInstruction);
        }
        let (accounts, rest) = rest.split_at(num_accounts);
        let (role_bytes, rest) = rest.split_at(num_accounts);
        let roles = role_bytes
            .iter()
            .map(|&b| AccountRole::from_byte(b))
            .collect::<Result<Vec<_>, _>>()?;

        let (len_bytes, rest) = rest.split_at(2);
        let data_len = u16::from_le_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if rest.len() < data_len {
            return Err(LazorKitError::MalformedInstruction);
        }
        let (data, rest) = rest.split_at(data_len);

        Ok((
            CompactInstruction {
                program_id_index,
                accounts: accounts.to_vec(),
                roles,
                data: data.to_vec(),
            },
            rest,
        ))
    }

    /// Serialize this CompactInstruction to bytes.
    ///
    /// Fails instead of truncating when a length does not fit its prefix.
    pub fn write_into(&self, out: &mut Vec<u8>) -> Result<(), LazorKitError> {
        let num_accounts =
            u8::try_from(self.accounts.len()).map_err(|_| LazorKitError::TooManyAccounts)?;
        if self.roles.len() != self.accounts.len() {
            return Err(LazorKitError::MalformedInstruction);
        }
        let data_len =
            u16::try_from(self.data.len()).map_err(|_| LazorKitError::MalformedInstruction)?;
        out.push(self.program_id_index);
        out.push(num_accounts);
        out.extend_from_slice(&self.accounts);
        out.extend(self.roles.iter().map(|r| r.to_byte()));
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend_from_slice(&self.data);
        Ok(())
    }

    /// Maps indexes back onto the outer account list, keeping the requested roles.
    pub fn resolve(&self, account_metas: &[AccountMeta]) -> Result<ResolvedInstruction, LazorKitError> {
        let program = account_metas
            .get(self.program_id_index as usize)
            .ok_or(LazorKitError::MalformedInstruction)?;

        let accounts = self
            .accounts
            .iter()
            .zip(&self.roles)
            .map(|(&index, role)| {
                account_metas
                    .get(index as usize)
                    .map(|meta| role.meta(meta.key))
                    .ok_or(LazorKitError::MalformedInstruction)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResolvedInstruction {
            program_id: program.key,
            accounts,
            data: self.data.clone(),
        })
    }
}

/// Packs `instructions` against the accounts already present in the outer
/// instruction. Static accounts keep indexes `0..static_accounts.len()`; any
/// other address gets the next free index in first-seen order.
pub fn pack(
    instructions: &[InnerInstruction],
    static_accounts: &[Pubkey],
) -> Result<PackedBatch, LazorKitError> {
    if instructions.len() > MAX_INSTRUCTIONS {
        return Err(LazorKitError::TooManyInstructions);
    }
    if static_accounts.len() > MAX_ACCOUNTS {
        return Err(LazorKitError::TooManyAccounts);
    }

    let mut index_of: HashMap<Pubkey, usize> = HashMap::new();
    for (i, key) in static_accounts.iter().enumerate() {
        index_of.entry(*key).or_insert(i);
    }
    let mut remaining: Vec<AccountMeta> = Vec::new();

    let mut register = |key: Pubkey, role: AccountRole| -> Result<u8, LazorKitError> {
        let index = match index_of.get(&key) {
            Some(&index) => {
                if index >= static_accounts.len() {
                    let slot = &mut remaining[index - static_accounts.len()];
                    *slot = AccountRole::from(&*slot).merge(role).meta(key);
                }
                index
            },
            None => {
                let index = static_accounts.len() + remaining.len();
                if index >= MAX_ACCOUNTS {
                    return Err(LazorKitError::TooManyAccounts);
                }
                index_of.insert(key, index);
                remaining.push(role.meta(key));
                index
            },
        };
        u8::try_from(index).map_err(|_| LazorKitError::TooManyAccounts)
    };

    let mut bytes = vec![instructions.len() as u8];
    for ix in instructions {
        if ix.accounts.len() > MAX_ACCOUNTS_PER_INSTRUCTION {
            return Err(LazorKitError::TooManyAccounts);
        }
        if ix.data.len() > u16::MAX as usize {
            return Err(LazorKitError::MalformedInstruction);
        }
        let program_id_index = register(ix.program_id, AccountRole::Readonly)?;
        let mut accounts = Vec::with_capacity(ix.accounts.len());
        let mut roles = Vec::with_capacity(ix.accounts.len());
        for meta in &ix.accounts {
            let role = AccountRole::from(meta);
            accounts.push(register(meta.key, role)?);
            roles.push(role);
        }
        CompactInstruction {
            program_id_index,
            accounts,
            roles,
            data: ix.data.clone(),
        }
        .write_into(&mut bytes)?;
    }

    Ok(PackedBatch {
        bytes,
        remaining_accounts: remaining,
    })
}

/// Parse multiple CompactInstructions from bytes, returning the unread tail.
/// Format: [num_instructions: u8][instruction_0][instruction_1]...
pub fn unpack(bytes: &[u8]) -> Result<(Vec<CompactInstruction>, &[u8]), LazorKitError> {
    let (&count, mut remaining) = bytes
        .split_first()
        .ok_or(LazorKitError::MalformedInstruction)?;

    let mut instructions = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (instruction, rest) = CompactInstruction::from_bytes(remaining)?;
        instructions.push(instruction);
        remaining = rest;
    }
    Ok((instructions, remaining))
}

/// Serialize multiple CompactInstructions to bytes
pub fn serialize(instructions: &[CompactInstruction]) -> Result<Vec<u8>, LazorKitError> {
    let count =
        u8::try_from(instructions.len()).map_err(|_| LazorKitError::TooManyInstructions)?;
    let mut bytes = vec![count];
    for ix in instructions {
        ix.write_into(&mut bytes)?;
    }
    Ok(bytes)
}
