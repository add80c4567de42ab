use pinocchio::program_error::ProgramError;
use thiserror::Error;

/// Errors raised while deriving addresses or reading and mutating records.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LazorStateError {
    /// A seed is longer than 32 bytes
    #[error("Seed exceeds 32 bytes")]
    SeedTooLong = 1000,
    /// More than 16 seeds, bump included
    #[error("Too many seeds")]
    TooManySeeds,
    /// The seeds hash to a point on the curve
    #[error("Seeds produce an on-curve address")]
    InvalidSeeds,
    /// No bump in 0..=255 produced an off-curve address
    #[error("No valid bump for the given seeds")]
    DerivationExhausted,
    /// Record discriminator, version, tag or length is wrong
    #[error("Invalid account data")]
    InvalidAccountData,
    /// Authority payload does not match its declared type
    #[error("Invalid authority data")]
    InvalidAuthorityData,
    /// Unknown role tag
    #[error("Invalid role data")]
    InvalidRoleData,
    /// No authority with the requested id
    #[error("Authority not found")]
    AuthorityNotFound,
    /// The authority seed already belongs to the wallet
    #[error("Authority already registered")]
    DuplicateAuthority,
    /// All 256 authority ids are taken
    #[error("Authority limit reached")]
    AuthorityLimitReached,
    /// The owner entry cannot be removed
    #[error("Cannot remove owner")]
    CannotRemoveOwner,
    /// A second owner entry was requested
    #[error("Wallet already has an owner")]
    OwnerAlreadyExists,
}

impl From<LazorStateError> for ProgramError {
    fn from(e: LazorStateError) -> Self {
        ProgramError::Custom(e as u32 + 2000)
    }
}
