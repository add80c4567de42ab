//! LazorKit Instruction Definitions
//!
//! Every instruction is `[discriminator][fixed header][variable tail]`. The
//! discriminator is one byte or eight hashed bytes depending on the deployment's
//! [`DiscriminatorProfile`].

use lazorkit_state::{AuthorityData, AuthorityType, DiscriminatorProfile, Role};
use sha2::{Digest, Sha256};

use crate::compact::{self, CompactInstruction};
use crate::error::LazorKitError;

/// Instruction discriminators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InstructionDiscriminator {
    CreateWallet = 0,
    AddAuthority = 1,
    RemoveAuthority = 2,
    TransferOwnership = 3,
    Execute = 4,
    CreateSession = 5,
}

impl InstructionDiscriminator {
    pub const ALL: [InstructionDiscriminator; 6] = [
        InstructionDiscriminator::CreateWallet,
        InstructionDiscriminator::AddAuthority,
        InstructionDiscriminator::RemoveAuthority,
        InstructionDiscriminator::TransferOwnership,
        InstructionDiscriminator::Execute,
        InstructionDiscriminator::CreateSession,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            InstructionDiscriminator::CreateWallet => "CreateWallet",
            InstructionDiscriminator::AddAuthority => "AddAuthority",
            InstructionDiscriminator::RemoveAuthority => "RemoveAuthority",
            InstructionDiscriminator::TransferOwnership => "TransferOwnership",
            InstructionDiscriminator::Execute => "Execute",
            InstructionDiscriminator::CreateSession => "CreateSession",
        }
    }

    /// `sha256("global:<Name>")[..8]`
    pub fn hashed(self) -> [u8; 8] {
        let digest = Sha256::digest(format!("global:{}", self.name()).as_bytes());
        let mut out = [0u8; 8];
        out.copy_from_slice(&digest[..8]);
        out
    }

    pub fn to_bytes(self, profile: DiscriminatorProfile) -> Vec<u8> {
        match profile {
            DiscriminatorProfile::Compact => vec![self as u8],
            DiscriminatorProfile::Hashed => self.hashed().to_vec(),
        }
    }

    /// Splits the discriminator off `input`.
    pub fn split(
        input: &[u8],
        profile: DiscriminatorProfile,
    ) -> Result<(Self, &[u8]), LazorKitError> {
        match profile {
            DiscriminatorProfile::Compact => {
                let (&tag, rest) = input
                    .split_first()
                    .ok_or(LazorKitError::MalformedInstruction)?;
                let kind = Self::ALL
                    .into_iter()
                    .find(|d| *d as u8 == tag)
                    .ok_or(LazorKitError::UnknownInstruction)?;
                Ok((kind, rest))
            },
            DiscriminatorProfile::Hashed => {
                if input.len() < 8 {
                    return Err(LazorKitError::MalformedInstruction);
                }
                let (tag, rest) = input.split_at(8);
                let kind = Self::ALL
                    .into_iter()
                    .find(|d| d.hashed()[..] == tag[..])
                    .ok_or(LazorKitError::UnknownInstruction)?;
                Ok((kind, rest))
            },
        }
    }
}

/// Authority key material as sent on the wire, with the PDA seed it derives from.
///
/// - Ed25519 / Ed25519Session: the key data only; the seed is the (master) key
/// - Secp256r1 / Secp256r1Session: `[credential_hash: 32][key data]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityPayload {
    pub seed: [u8; 32],
    pub data: AuthorityData,
}

impl AuthorityPayload {
    pub fn ed25519(public_key: [u8; 32]) -> Self {
        Self {
            seed: public_key,
            data: AuthorityData::Ed25519 { public_key },
        }
    }

    pub fn secp256r1(credential_hash: [u8; 32], public_key: [u8; 33]) -> Self {
        Self {
            seed: credential_hash,
            data: AuthorityData::Secp256r1 { public_key },
        }
    }

    pub fn authority_type(&self) -> AuthorityType {
        self.data.authority_type()
    }

    pub const fn wire_len(authority_type: AuthorityType) -> usize {
        if authority_type.is_secp256r1() {
            32 + authority_type.data_len()
        } else {
            authority_type.data_len()
        }
    }

    pub fn write_into(&self, out: &mut Vec<u8>) {
        if self.authority_type().is_secp256r1() {
            out.extend_from_slice(&self.seed);
        }
        self.data.write_into(out);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::wire_len(self.authority_type()));
        self.write_into(&mut out);
        out
    }

    /// Reads a payload of `authority_type`, returning the unread tail.
    pub fn read(
        authority_type: AuthorityType,
        input: &[u8],
    ) -> Result<(Self, &[u8]), LazorKitError> {
        let len = Self::wire_len(authority_type);
        if input.len() < len {
            return Err(LazorKitError::MalformedInstruction);
        }
        let (payload, rest) = input.split_at(len);
        let parsed = if authority_type.is_secp256r1() {
            let (hash, key_data) = payload.split_at(32);
            let mut seed = [0u8; 32];
            seed.copy_from_slice(hash);
            Self {
                seed,
                data: AuthorityData::from_bytes(authority_type, key_data)?,
            }
        } else {
            let data = AuthorityData::from_bytes(authority_type, payload)?;
            let seed = *data
                .ed25519_master()
                .ok_or(LazorKitError::InvalidAuthorityData)?;
            Self { seed, data }
        };
        Ok((parsed, rest))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LazorKitInstruction {
    /// Create a new LazorKit wallet
    ///
    /// Accounts:
    /// 0. `[writable, signer]` Payer
    /// 1. `[writable]` Wallet (PDA: ["wallet", wallet_id])
    /// 2. `[writable]` Vault (PDA: ["vault", wallet])
    /// 3. `[writable]` Owner authority (PDA: ["authority", wallet, seed])
    /// 4. `[]` System program
    CreateWallet {
        wallet_id: [u8; 32],
        /// Bump of the owner authority PDA
        auth_bump: u8,
        owner: AuthorityPayload,
    },

    /// Add a new authority to the wallet
    ///
    /// Accounts:
    /// 0. `[writable, signer]` Payer
    /// 1. `[writable]` Wallet
    /// 2. `[]` Acting authority
    /// 3. `[writable]` New authority PDA
    /// 4. `[]` System program
    /// 5+ `[signer]` Optional authorizer signers
    AddAuthority {
        new_role: Role,
        authority: AuthorityPayload,
        auth_payload: Vec<u8>,
    },

    /// Remove an authority from the wallet
    ///
    /// Accounts:
    /// 0. `[writable, signer]` Payer
    /// 1. `[writable]` Wallet
    /// 2. `[]` Acting authority
    /// 3. `[writable]` Target authority PDA
    /// 4. `[writable]` Refund destination
    /// 5+ `[signer]` Optional authorizer signers
    RemoveAuthority { auth_payload: Vec<u8> },

    /// Replace the owner in place
    ///
    /// Accounts:
    /// 0. `[writable, signer]` Payer
    /// 1. `[writable]` Wallet
    /// 2. `[writable]` Current owner authority PDA
    /// 3. `[writable]` New owner authority PDA
    /// 4. `[]` System program
    /// 5+ `[signer]` Optional authorizer signers
    TransferOwnership {
        new_owner: AuthorityPayload,
        auth_payload: Vec<u8>,
    },

    /// Execute a batch of packed instructions signed by the vault
    ///
    /// Accounts:
    /// 0. `[writable, signer]` Payer
    /// 1. `[writable]` Wallet
    /// 2. `[writable]` Authority PDA or session PDA
    /// 3. `[writable]` Vault
    /// 4+ Remaining accounts referenced by the batch
    Execute {
        instructions: Vec<CompactInstruction>,
        auth_payload: Vec<u8>,
    },

    /// Create a time-bound session key
    ///
    /// Accounts:
    /// 0. `[writable, signer]` Payer
    /// 1. `[]` Wallet
    /// 2. `[]` Authorizer authority PDA
    /// 3. `[writable]` Session PDA (["session", wallet, session_key])
    /// 4. `[]` System program
    /// 5+ `[signer]` Optional authorizer signers
    CreateSession {
        session_key: [u8; 32],
        expires_at: u64,
        auth_payload: Vec<u8>,
    },
}

fn read_array<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), LazorKitError> {
    if input.len() < N {
        return Err(LazorKitError::MalformedInstruction);
    }
    let (head, rest) = input.split_at(N);
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    Ok((out, rest))
}

fn read_authority_type(tag: u8) -> Result<AuthorityType, LazorKitError> {
    AuthorityType::try_from(tag).map_err(|_| LazorKitError::InvalidAuthorityData)
}

impl LazorKitInstruction {
    pub fn discriminator(&self) -> InstructionDiscriminator {
        match self {
            LazorKitInstruction::CreateWallet { .. } => InstructionDiscriminator::CreateWallet,
            LazorKitInstruction::AddAuthority { .. } => InstructionDiscriminator::AddAuthority,
            LazorKitInstruction::RemoveAuthority { .. } => {
                InstructionDiscriminator::RemoveAuthority
            },
            LazorKitInstruction::TransferOwnership { .. } => {
                InstructionDiscriminator::TransferOwnership
            },
            LazorKitInstruction::Execute { .. } => InstructionDiscriminator::Execute,
            LazorKitInstruction::CreateSession { .. } => InstructionDiscriminator::CreateSession,
        }
    }

    /// Wire bytes under `profile`. Fails when an Execute batch exceeds the
    /// packed format's limits.
    pub fn encode(&self, profile: DiscriminatorProfile) -> Result<Vec<u8>, LazorKitError> {
        let mut out = self.discriminator().to_bytes(profile);
        match self {
            LazorKitInstruction::CreateWallet {
                wallet_id,
                auth_bump,
                owner,
            } => {
                out.extend_from_slice(wallet_id);
                out.push(owner.authority_type() as u8);
                out.push(*auth_bump);
                out.extend_from_slice(&[0; 6]);
                owner.write_into(&mut out);
            },
            LazorKitInstruction::AddAuthority {
                new_role,
                authority,
                auth_payload,
            } => {
                out.push(authority.authority_type() as u8);
                out.push(*new_role as u8);
                out.extend_from_slice(&[0; 6]);
                authority.write_into(&mut out);
                out.extend_from_slice(auth_payload);
            },
            LazorKitInstruction::RemoveAuthority { auth_payload } => {
                out.extend_from_slice(auth_payload);
            },
            LazorKitInstruction::TransferOwnership {
                new_owner,
                auth_payload,
            } => {
                out.push(new_owner.authority_type() as u8);
                new_owner.write_into(&mut out);
                out.extend_from_slice(auth_payload);
            },
            LazorKitInstruction::Execute {
                instructions,
                auth_payload,
            } => {
                out.extend_from_slice(&compact::serialize(instructions)?);
                out.extend_from_slice(auth_payload);
            },
            LazorKitInstruction::CreateSession {
                session_key,
                expires_at,
                auth_payload,
            } => {
                out.extend_from_slice(session_key);
                out.extend_from_slice(&expires_at.to_le_bytes());
                out.extend_from_slice(auth_payload);
            },
        }
        Ok(out)
    }

    pub fn decode(input: &[u8], profile: DiscriminatorProfile) -> Result<Self, LazorKitError> {
        let (kind, rest) = InstructionDiscriminator::split(input, profile)?;
        let instruction = match kind {
            InstructionDiscriminator::CreateWallet => {
                let (wallet_id, rest) = read_array::<32>(rest)?;
                let (header, rest) = read_array::<8>(rest)?;
                let authority_type = read_authority_type(header[0])?;
                let (owner, tail) = AuthorityPayload::read(authority_type, rest)?;
                if !tail.is_empty() {
                    return Err(LazorKitError::InvalidAuthorityData);
                }
                LazorKitInstruction::CreateWallet {
                    wallet_id,
                    auth_bump: header[1],
                    owner,
                }
            },
            InstructionDiscriminator::AddAuthority => {
                let (header, rest) = read_array::<8>(rest)?;
                let authority_type = read_authority_type(header[0])?;
                let new_role =
                    Role::try_from(header[1]).map_err(|_| LazorKitError::MalformedInstruction)?;
                let (authority, tail) = AuthorityPayload::read(authority_type, rest)?;
                LazorKitInstruction::AddAuthority {
                    new_role,
                    authority,
                    auth_payload: tail.to_vec(),
                }
            },
            InstructionDiscriminator::RemoveAuthority => LazorKitInstruction::RemoveAuthority {
                auth_payload: rest.to_vec(),
            },
            InstructionDiscriminator::TransferOwnership => {
                let (&tag, rest) = rest
                    .split_first()
                    .ok_or(LazorKitError::MalformedInstruction)?;
                let authority_type = read_authority_type(tag)?;
                let (new_owner, tail) = AuthorityPayload::read(authority_type, rest)?;
                LazorKitInstruction::TransferOwnership {
                    new_owner,
                    auth_payload: tail.to_vec(),
                }
            },
            InstructionDiscriminator::Execute => {
                let (instructions, tail) = compact::unpack(rest)?;
                LazorKitInstruction::Execute {
                    instructions,
                    auth_payload: tail.to_vec(),
                }
            },
            InstructionDiscriminator::CreateSession => {
                let (session_key, rest) = read_array::<32>(rest)?;
                let (expiry, tail) = read_array::<8>(rest)?;
                LazorKitInstruction::CreateSession {
                    session_key,
                    expires_at: u64::from_le_bytes(expiry),
                    auth_payload: tail.to_vec(),
                }
            },
        };
        Ok(instruction)
    }

    /// Bytes the acting authority commits to, excluding the discriminator and
    /// the trailing authorization payload.
    pub fn signed_body(&self) -> Result<Vec<u8>, LazorKitError> {
        let mut out = Vec::new();
        match self {
            LazorKitInstruction::CreateWallet { .. } | LazorKitInstruction::RemoveAuthority { .. } => {},
            LazorKitInstruction::AddAuthority {
                new_role,
                authority,
                ..
            } => {
                out.push(authority.authority_type() as u8);
                out.push(*new_role as u8);
                authority.write_into(&mut out);
            },
            LazorKitInstruction::TransferOwnership { new_owner, .. } => {
                out.push(new_owner.authority_type() as u8);
                new_owner.write_into(&mut out);
            },
            LazorKitInstruction::Execute { instructions, .. } => {
                out = compact::serialize(instructions)?;
            },
            LazorKitInstruction::CreateSession {
                session_key,
                expires_at,
                ..
            } => {
                out.extend_from_slice(session_key);
                out.extend_from_slice(&expires_at.to_le_bytes());
            },
        }
        Ok(out)
    }
}
