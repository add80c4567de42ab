//! Wallet account record and its authority set.

use crate::authority::{Authority, AuthorityData, Role};
use crate::error::LazorStateError;
use crate::{Discriminator, CURRENT_ACCOUNT_VERSION};

/// Decoded wallet account.
///
/// Memory layout (40-byte header followed by `authority_count` records):
/// - discriminator: u8 (= 1)
/// - version: u8
/// - bump: u8
/// - vault_bump: u8
/// - authority_count: u8
/// - padding: [u8; 3]
/// - wallet_id: [u8; 32]
///
/// Authorities are kept sorted by id and there is always exactly one Owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAccount {
    pub bump: u8,
    pub vault_bump: u8,
    pub wallet_id: [u8; 32],
    authorities: Vec<Authority>,
}

impl WalletAccount {
    pub const HEADER_LEN: usize = 40;
    pub const MAX_AUTHORITIES: usize = 256;

    /// Creates a wallet whose owner takes id 0.
    pub fn new(
        wallet_id: [u8; 32],
        bump: u8,
        vault_bump: u8,
        owner_seed: [u8; 32],
        owner_data: AuthorityData,
    ) -> Result<Self, LazorStateError> {
        let owner = Authority::new(0, Role::Owner, owner_seed, owner_data)?;
        Ok(Self {
            bump,
            vault_bump,
            wallet_id,
            authorities: vec![owner],
        })
    }

    pub fn authorities(&self) -> &[Authority] {
        &self.authorities
    }

    pub fn authority(&self, id: u8) -> Option<&Authority> {
        self.authorities.iter().find(|a| a.id == id)
    }

    pub fn authority_by_seed(&self, seed: &[u8; 32]) -> Option<&Authority> {
        self.authorities.iter().find(|a| &a.seed == seed)
    }

    pub fn owner(&self) -> Option<&Authority> {
        self.authorities.iter().find(|a| a.role == Role::Owner)
    }

    /// Smallest id not currently in use.
    pub fn next_free_id(&self) -> Option<u8> {
        // authorities are sorted, so the first gap is the answer
        let mut candidate: u16 = 0;
        for authority in &self.authorities {
            if u16::from(authority.id) != candidate {
                break;
            }
            candidate += 1;
        }
        u8::try_from(candidate).ok()
    }

    /// Registers a non-owner authority under the smallest free id.
    pub fn insert(
        &mut self,
        role: Role,
        seed: [u8; 32],
        data: AuthorityData,
    ) -> Result<u8, LazorStateError> {
        if role == Role::Owner {
            return Err(LazorStateError::OwnerAlreadyExists);
        }
        if self.authority_by_seed(&seed).is_some() {
            return Err(LazorStateError::DuplicateAuthority);
        }
        let id = self
            .next_free_id()
            .ok_or(LazorStateError::AuthorityLimitReached)?;
        let authority = Authority::new(id, role, seed, data)?;
        let position = self
            .authorities
            .iter()
            .position(|a| a.id > id)
            .unwrap_or(self.authorities.len());
        self.authorities.insert(position, authority);
        Ok(id)
    }

    /// Removes a non-owner authority, freeing its id.
    pub fn remove(&mut self, id: u8) -> Result<Authority, LazorStateError> {
        let position = self
            .authorities
            .iter()
            .position(|a| a.id == id)
            .ok_or(LazorStateError::AuthorityNotFound)?;
        if self.authorities[position].role == Role::Owner {
            return Err(LazorStateError::CannotRemoveOwner);
        }
        Ok(self.authorities.remove(position))
    }

    /// Swaps the owner's key material in place. The id is kept and the counter resets.
    pub fn replace_owner(
        &mut self,
        seed: [u8; 32],
        data: AuthorityData,
    ) -> Result<Authority, LazorStateError> {
        let position = self
            .authorities
            .iter()
            .position(|a| a.role == Role::Owner)
            .ok_or(LazorStateError::InvalidAccountData)?;
        let owner_id = self.authorities[position].id;
        if self
            .authority_by_seed(&seed)
            .is_some_and(|a| a.id != owner_id)
        {
            return Err(LazorStateError::DuplicateAuthority);
        }
        let replacement = Authority::new(owner_id, Role::Owner, seed, data)?;
        Ok(core::mem::replace(
            &mut self.authorities[position],
            replacement,
        ))
    }

    /// Stores a new Secp256r1 odometer value.
    pub fn set_counter(&mut self, id: u8, counter: u32) -> Result<(), LazorStateError> {
        let authority = self
            .authorities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(LazorStateError::AuthorityNotFound)?;
        authority.counter = counter;
        Ok(())
    }

    pub fn len(&self) -> usize {
        Self::HEADER_LEN + self.authorities.iter().map(Authority::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.push(Discriminator::Wallet as u8);
        out.push(CURRENT_ACCOUNT_VERSION);
        out.push(self.bump);
        out.push(self.vault_bump);
        // ids are u8, so a full wallet has 256 entries and the count wraps to 0;
        // the parser reads records until the buffer ends and checks the count mod 256
        out.push(self.authorities.len() as u8);
        out.extend_from_slice(&[0; 3]);
        out.extend_from_slice(&self.wallet_id);
        for authority in &self.authorities {
            authority.write_into(&mut out);
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LazorStateError> {
        if bytes.len() < Self::HEADER_LEN
            || bytes[0] != Discriminator::Wallet as u8
            || bytes[1] != CURRENT_ACCOUNT_VERSION
        {
            return Err(LazorStateError::InvalidAccountData);
        }
        let bump = bytes[2];
        let vault_bump = bytes[3];
        let count = bytes[4];
        let mut wallet_id = [0u8; 32];
        wallet_id.copy_from_slice(&bytes[8..40]);

        let mut authorities: Vec<Authority> = Vec::new();
        let mut remaining = &bytes[Self::HEADER_LEN..];
        while !remaining.is_empty() {
            let (authority, rest) = Authority::read_from(remaining)?;
            if authorities.last().is_some_and(|prev| prev.id >= authority.id) {
                return Err(LazorStateError::InvalidAccountData);
            }
            authorities.push(authority);
            remaining = rest;
        }

        let owners = authorities.iter().filter(|a| a.role == Role::Owner).count();
        if authorities.len() as u8 != count || owners != 1 {
            return Err(LazorStateError::InvalidAccountData);
        }

        Ok(Self {
            bump,
            vault_bump,
            wallet_id,
            authorities,
        })
    }
}
