//! LazorKit Error Types

use lazorkit_state::LazorStateError;
use pinocchio::program_error::ProgramError;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LazorKitError {
    #[error("No valid bump for the given seeds")]
    DerivationExhausted,

    #[error("Seed exceeds 32 bytes")]
    SeedTooLong,

    #[error("Malformed instruction data")]
    MalformedInstruction,

    #[error("Unknown instruction discriminator")]
    UnknownInstruction,

    #[error("Invalid authority data")]
    InvalidAuthorityData,

    #[error("Too many accounts")]
    TooManyAccounts,

    #[error("Too many instructions")]
    TooManyInstructions,

    #[error("Account already initialized")]
    AlreadyInitialized,

    #[error("Not authorized")]
    Unauthorized,

    #[error("Owner cannot be removed")]
    CannotRemoveOwner,

    #[error("Session already exists")]
    SessionAlreadyExists,

    #[error("Invalid session expiry")]
    InvalidExpiry,

    #[error("Derived address does not match the supplied account")]
    PdaMismatch,

    #[error("Session expired")]
    SessionExpired,

    #[error("Too many seeds")]
    TooManySeeds,

    #[error("Seeds produce an on-curve address")]
    InvalidSeeds,

    #[error("Invalid account data")]
    InvalidAccountData,

    #[error("Not enough account keys")]
    NotEnoughAccountKeys,

    #[error("Self-reentrancy is not allowed")]
    SelfReentrancyNotAllowed,

    #[error("Authority limit reached")]
    AuthorityLimitReached,

    #[error("Inner instruction dispatch failed")]
    DispatchFailed,
}

impl From<LazorStateError> for LazorKitError {
    fn from(e: LazorStateError) -> Self {
        match e {
            LazorStateError::SeedTooLong => LazorKitError::SeedTooLong,
            LazorStateError::TooManySeeds => LazorKitError::TooManySeeds,
            LazorStateError::InvalidSeeds => LazorKitError::InvalidSeeds,
            LazorStateError::DerivationExhausted => LazorKitError::DerivationExhausted,
            LazorStateError::InvalidAccountData => LazorKitError::InvalidAccountData,
            LazorStateError::InvalidAuthorityData => LazorKitError::InvalidAuthorityData,
            LazorStateError::InvalidRoleData => LazorKitError::MalformedInstruction,
            LazorStateError::AuthorityNotFound => LazorKitError::Unauthorized,
            LazorStateError::DuplicateAuthority => LazorKitError::AlreadyInitialized,
            LazorStateError::AuthorityLimitReached => LazorKitError::AuthorityLimitReached,
            LazorStateError::CannotRemoveOwner => LazorKitError::CannotRemoveOwner,
            LazorStateError::OwnerAlreadyExists => LazorKitError::Unauthorized,
        }
    }
}

impl From<LazorKitError> for ProgramError {
    fn from(e: LazorKitError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
