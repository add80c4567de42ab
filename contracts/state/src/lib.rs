//! LazorKit State Module
//!
//! Record layouts, address derivation and deployment configuration for the
//! LazorKit smart wallet.

pub mod address;
pub mod authority;
pub mod config;
pub mod error;
pub mod session;
pub mod wallet;

pub use address::{AddressDeriver, CurveOracle, Ed25519Curve};
pub use authority::{Authority, AuthorityAccount, AuthorityData, AuthorityType, Role};
pub use config::{DiscriminatorProfile, ProgramConfig, SeedScheme};
pub use error::LazorStateError;
pub use session::SessionAccount;
pub use wallet::WalletAccount;

/// Layout version written into every record.
pub const CURRENT_ACCOUNT_VERSION: u8 = 1;

/// Represents the type discriminator for different account types in the system.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminator {
    Wallet = 1,
    Authority = 2,
    Session = 3,
}

impl TryFrom<u8> for Discriminator {
    type Error = LazorStateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Discriminator::Wallet),
            2 => Ok(Discriminator::Authority),
            3 => Ok(Discriminator::Session),
            _ => Err(LazorStateError::InvalidAccountData),
        }
    }
}
