//! Authority records.
//!
//! An authority is one key (or key plus session) registered on a wallet with a
//! role. Records are stored back to back after the wallet header.
//!
//! Memory layout (40-byte header followed by the type-specific data):
//! - id: u8
//! - authority_type: u8
//! - role: u8
//! - reserved: u8
//! - counter: u32 (Secp256r1 signature odometer)
//! - seed: [u8; 32] (authority PDA seed)
//! - data: [u8; authority_type.data_len()]

use crate::error::LazorStateError;
use crate::{Discriminator, CURRENT_ACCOUNT_VERSION};
use pinocchio::pubkey::Pubkey;

pub const ED25519_KEY_LEN: usize = 32;
pub const SECP256R1_KEY_LEN: usize = 33;
pub const SESSION_KEY_LEN: usize = 32;

/// Kind of key material an authority holds.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorityType {
    Ed25519 = 0,
    Secp256r1 = 1,
    Ed25519Session = 2,
    Secp256r1Session = 3,
}

impl AuthorityType {
    /// Exact byte length of the stored key material.
    pub const fn data_len(self) -> usize {
        match self {
            AuthorityType::Ed25519 => ED25519_KEY_LEN,
            AuthorityType::Secp256r1 => SECP256R1_KEY_LEN,
            AuthorityType::Ed25519Session => ED25519_KEY_LEN + SESSION_KEY_LEN + 8,
            AuthorityType::Secp256r1Session => SECP256R1_KEY_LEN + SESSION_KEY_LEN + 8,
        }
    }

    pub const fn is_session(self) -> bool {
        matches!(
            self,
            AuthorityType::Ed25519Session | AuthorityType::Secp256r1Session
        )
    }

    pub const fn is_secp256r1(self) -> bool {
        matches!(
            self,
            AuthorityType::Secp256r1 | AuthorityType::Secp256r1Session
        )
    }
}

impl TryFrom<u8> for AuthorityType {
    type Error = LazorStateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AuthorityType::Ed25519),
            1 => Ok(AuthorityType::Secp256r1),
            2 => Ok(AuthorityType::Ed25519Session),
            3 => Ok(AuthorityType::Secp256r1Session),
            _ => Err(LazorStateError::InvalidAuthorityData),
        }
    }
}

/// Permission tier of an authority.
///
/// - Owner: full control including ownership transfer
/// - Admin: authority and session management
/// - Spender: execute only
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Owner = 0,
    Admin = 1,
    Spender = 2,
}

impl Role {
    #[inline]
    pub const fn is_admin_or_owner(self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

impl TryFrom<u8> for Role {
    type Error = LazorStateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::Owner),
            1 => Ok(Role::Admin),
            2 => Ok(Role::Spender),
            _ => Err(LazorStateError::InvalidRoleData),
        }
    }
}

/// Key material of an authority, one variant per [`AuthorityType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityData {
    Ed25519 {
        public_key: [u8; 32],
    },
    Secp256r1 {
        public_key: [u8; 33],
    },
    Ed25519Session {
        master_key: [u8; 32],
        session_key: [u8; 32],
        expires_at: u64,
    },
    Secp256r1Session {
        master_key: [u8; 33],
        session_key: [u8; 32],
        expires_at: u64,
    },
}

fn read_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], LazorStateError> {
    bytes
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or(LazorStateError::InvalidAuthorityData)
}

fn check_compressed_key(key: &[u8; 33]) -> Result<(), LazorStateError> {
    match key[0] {
        0x02 | 0x03 => Ok(()),
        _ => Err(LazorStateError::InvalidAuthorityData),
    }
}

impl AuthorityData {
    /// Parses key material, rejecting any length other than the type's exact size.
    pub fn from_bytes(authority_type: AuthorityType, bytes: &[u8]) -> Result<Self, LazorStateError> {
        if bytes.len() != authority_type.data_len() {
            return Err(LazorStateError::InvalidAuthorityData);
        }
        let data = match authority_type {
            AuthorityType::Ed25519 => AuthorityData::Ed25519 {
                public_key: read_array(bytes)?,
            },
            AuthorityType::Secp256r1 => {
                let public_key = read_array(bytes)?;
                check_compressed_key(&public_key)?;
                AuthorityData::Secp256r1 { public_key }
            },
            AuthorityType::Ed25519Session => AuthorityData::Ed25519Session {
                master_key: read_array(bytes)?,
                session_key: read_array(&bytes[32..])?,
                expires_at: u64::from_le_bytes(read_array(&bytes[64..])?),
            },
            AuthorityType::Secp256r1Session => {
                let master_key = read_array(bytes)?;
                check_compressed_key(&master_key)?;
                AuthorityData::Secp256r1Session {
                    master_key,
                    session_key: read_array(&bytes[33..])?,
                    expires_at: u64::from_le_bytes(read_array(&bytes[65..])?),
                }
            },
        };
        Ok(data)
    }

    pub fn authority_type(&self) -> AuthorityType {
        match self {
            AuthorityData::Ed25519 { .. } => AuthorityType::Ed25519,
            AuthorityData::Secp256r1 { .. } => AuthorityType::Secp256r1,
            AuthorityData::Ed25519Session { .. } => AuthorityType::Ed25519Session,
            AuthorityData::Secp256r1Session { .. } => AuthorityType::Secp256r1Session,
        }
    }

    pub fn len(&self) -> usize {
        self.authority_type().data_len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn write_into(&self, out: &mut Vec<u8>) {
        match self {
            AuthorityData::Ed25519 { public_key } => out.extend_from_slice(public_key),
            AuthorityData::Secp256r1 { public_key } => out.extend_from_slice(public_key),
            AuthorityData::Ed25519Session {
                master_key,
                session_key,
                expires_at,
            } => {
                out.extend_from_slice(master_key);
                out.extend_from_slice(session_key);
                out.extend_from_slice(&expires_at.to_le_bytes());
            },
            AuthorityData::Secp256r1Session {
                master_key,
                session_key,
                expires_at,
            } => {
                out.extend_from_slice(master_key);
                out.extend_from_slice(session_key);
                out.extend_from_slice(&expires_at.to_le_bytes());
            },
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        self.write_into(&mut out);
        out
    }

    /// Ed25519 key that controls this authority outright.
    pub fn ed25519_master(&self) -> Option<&[u8; 32]> {
        match self {
            AuthorityData::Ed25519 { public_key } => Some(public_key),
            AuthorityData::Ed25519Session { master_key, .. } => Some(master_key),
            _ => None,
        }
    }

    /// Compressed Secp256r1 key that controls this authority outright.
    pub fn secp256r1_master(&self) -> Option<&[u8; 33]> {
        match self {
            AuthorityData::Secp256r1 { public_key } => Some(public_key),
            AuthorityData::Secp256r1Session { master_key, .. } => Some(master_key),
            _ => None,
        }
    }

    /// Embedded session key and its expiry slot, for session types.
    pub fn session(&self) -> Option<(&[u8; 32], u64)> {
        match self {
            AuthorityData::Ed25519Session {
                session_key,
                expires_at,
                ..
            }
            | AuthorityData::Secp256r1Session {
                session_key,
                expires_at,
                ..
            } => Some((session_key, *expires_at)),
            _ => None,
        }
    }
}

/// One registered authority of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authority {
    pub id: u8,
    pub role: Role,
    pub seed: [u8; 32],
    pub counter: u32,
    pub data: AuthorityData,
}

impl Authority {
    /// Header size: 1 + 1 + 1 + 1 + 4 + 32 = 40 bytes
    pub const HEADER_LEN: usize = 40;

    /// Builds an authority, checking that Ed25519 seeds are the master key.
    pub fn new(id: u8, role: Role, seed: [u8; 32], data: AuthorityData) -> Result<Self, LazorStateError> {
        if let Some(master) = data.ed25519_master() {
            if master != &seed {
                return Err(LazorStateError::InvalidAuthorityData);
            }
        }
        Ok(Self {
            id,
            role,
            seed,
            counter: 0,
            data,
        })
    }

    pub fn authority_type(&self) -> AuthorityType {
        self.data.authority_type()
    }

    pub fn len(&self) -> usize {
        Self::HEADER_LEN + self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn write_into(&self, out: &mut Vec<u8>) {
        out.push(self.id);
        out.push(self.authority_type() as u8);
        out.push(self.role as u8);
        out.push(0);
        out.extend_from_slice(&self.counter.to_le_bytes());
        out.extend_from_slice(&self.seed);
        self.data.write_into(out);
    }

    /// Reads one record, returning it with the unread tail.
    pub fn read_from(bytes: &[u8]) -> Result<(Self, &[u8]), LazorStateError> {
        if bytes.len() < Self::HEADER_LEN {
            return Err(LazorStateError::InvalidAccountData);
        }
        let (header, rest) = bytes.split_at(Self::HEADER_LEN);
        let authority_type =
            AuthorityType::try_from(header[1]).map_err(|_| LazorStateError::InvalidAccountData)?;
        let role = Role::try_from(header[2]).map_err(|_| LazorStateError::InvalidAccountData)?;
        let counter = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&header[8..40]);

        let data_len = authority_type.data_len();
        if rest.len() < data_len {
            return Err(LazorStateError::InvalidAccountData);
        }
        let (data_bytes, rest) = rest.split_at(data_len);
        let data = AuthorityData::from_bytes(authority_type, data_bytes)
            .map_err(|_| LazorStateError::InvalidAccountData)?;

        let mut authority = Authority::new(header[0], role, seed, data)
            .map_err(|_| LazorStateError::InvalidAccountData)?;
        authority.counter = counter;
        Ok((authority, rest))
    }
}

/// Record at an authority PDA, pointing back into the wallet's authority set.
///
/// Memory layout (72 bytes):
/// - discriminator: u8 (= 2)
/// - version: u8
/// - bump: u8
/// - authority_id: u8
/// - padding: [u8; 4]
/// - wallet: [u8; 32]
/// - seed: [u8; 32]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityAccount {
    pub bump: u8,
    pub authority_id: u8,
    pub wallet: Pubkey,
    pub seed: [u8; 32],
}

impl AuthorityAccount {
    pub const LEN: usize = 72;

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.push(Discriminator::Authority as u8);
        out.push(CURRENT_ACCOUNT_VERSION);
        out.push(self.bump);
        out.push(self.authority_id);
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&self.wallet);
        out.extend_from_slice(&self.seed);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LazorStateError> {
        if bytes.len() != Self::LEN
            || bytes[0] != Discriminator::Authority as u8
            || bytes[1] != CURRENT_ACCOUNT_VERSION
        {
            return Err(LazorStateError::InvalidAccountData);
        }
        let mut wallet = [0u8; 32];
        let mut seed = [0u8; 32];
        wallet.copy_from_slice(&bytes[8..40]);
        seed.copy_from_slice(&bytes[40..72]);
        Ok(Self {
            bump: bytes[2],
            authority_id: bytes[3],
            wallet,
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secp_key(tag: u8) -> [u8; 33] {
        let mut key = [0x11; 33];
        key[0] = tag;
        key
    }

    #[test]
    fn test_data_len_per_type() {
        assert_eq!(AuthorityType::Ed25519.data_len(), 32);
        assert_eq!(AuthorityType::Secp256r1.data_len(), 33);
        assert_eq!(AuthorityType::Ed25519Session.data_len(), 72);
        assert_eq!(AuthorityType::Secp256r1Session.data_len(), 73);
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        for ty in [
            AuthorityType::Ed25519,
            AuthorityType::Secp256r1,
            AuthorityType::Ed25519Session,
            AuthorityType::Secp256r1Session,
        ] {
            let mut bytes = vec![0x02; ty.data_len() + 1];
            assert_eq!(
                AuthorityData::from_bytes(ty, &bytes),
                Err(LazorStateError::InvalidAuthorityData)
            );
            bytes.truncate(ty.data_len() - 1);
            assert_eq!(
                AuthorityData::from_bytes(ty, &bytes),
                Err(LazorStateError::InvalidAuthorityData)
            );
        }
    }

    #[test]
    fn test_secp256r1_requires_compressed_prefix() {
        assert!(AuthorityData::from_bytes(AuthorityType::Secp256r1, &secp_key(0x02)).is_ok());
        assert!(AuthorityData::from_bytes(AuthorityType::Secp256r1, &secp_key(0x03)).is_ok());
        assert_eq!(
            AuthorityData::from_bytes(AuthorityType::Secp256r1, &secp_key(0x04)),
            Err(LazorStateError::InvalidAuthorityData)
        );
    }

    #[test]
    fn test_session_fields_parse() {
        let mut bytes = vec![1u8; 32];
        bytes.extend_from_slice(&[2u8; 32]);
        bytes.extend_from_slice(&500u64.to_le_bytes());
        let data = AuthorityData::from_bytes(AuthorityType::Ed25519Session, &bytes).unwrap();
        assert_eq!(data.ed25519_master(), Some(&[1u8; 32]));
        assert_eq!(data.session(), Some((&[2u8; 32], 500)));
        assert_eq!(data.to_bytes(), bytes);
    }

    #[test]
    fn test_ed25519_seed_must_match_key() {
        let data = AuthorityData::Ed25519 { public_key: [5; 32] };
        assert!(Authority::new(0, Role::Owner, [5; 32], data).is_ok());
        assert_eq!(
            Authority::new(0, Role::Owner, [6; 32], data),
            Err(LazorStateError::InvalidAuthorityData)
        );
    }

    #[test]
    fn test_record_layout() {
        let data = AuthorityData::Secp256r1 {
            public_key: secp_key(0x03),
        };
        let mut authority = Authority::new(4, Role::Spender, [9; 32], data).unwrap();
        authority.counter = 7;

        let mut bytes = Vec::new();
        authority.write_into(&mut bytes);
        assert_eq!(bytes.len(), Authority::HEADER_LEN + 33);
        assert_eq!(&bytes[..4], &[4, 1, 2, 0]);
        assert_eq!(&bytes[4..8], &7u32.to_le_bytes());

        bytes.push(0xAA);
        let (parsed, rest) = Authority::read_from(&bytes).unwrap();
        assert_eq!(parsed, authority);
        assert_eq!(rest, &[0xAA]);
    }

    #[test]
    fn test_authority_account_layout() {
        let account = AuthorityAccount {
            bump: 251,
            authority_id: 3,
            wallet: [8; 32],
            seed: [9; 32],
        };
        let bytes = account.to_bytes();
        assert_eq!(bytes.len(), AuthorityAccount::LEN);
        assert_eq!(&bytes[..4], &[2, 1, 251, 3]);
        assert_eq!(AuthorityAccount::from_bytes(&bytes).unwrap(), account);
        assert!(AuthorityAccount::from_bytes(&bytes[..71]).is_err());
    }

    #[test]
    fn test_read_rejects_unknown_tags() {
        let data = AuthorityData::Ed25519 { public_key: [1; 32] };
        let authority = Authority::new(0, Role::Owner, [1; 32], data).unwrap();
        let mut bytes = Vec::new();
        authority.write_into(&mut bytes);

        let mut bad_type = bytes.clone();
        bad_type[1] = 9;
        assert_eq!(
            Authority::read_from(&bad_type).unwrap_err(),
            LazorStateError::InvalidAccountData
        );

        let mut bad_role = bytes;
        bad_role[2] = 3;
        assert_eq!(
            Authority::read_from(&bad_role).unwrap_err(),
            LazorStateError::InvalidAccountData
        );
    }
}
