use lazorkit_program::LazorKitError;
use lazorkit_state::LazorStateError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use thiserror::Error;

/// SDK-specific error types for LazorKit operations
#[derive(Debug, Error)]
pub enum LazorSdkError {
    /// Connection or RPC error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Account not found on-chain
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    /// Invalid account data or deserialization error
    #[error("Invalid account data: {0}")]
    InvalidAccountData(String),

    /// Authority not found in wallet
    #[error("Authority {0} not found in wallet")]
    AuthorityNotFound(u8),

    /// Wallet not initialized or invalid state
    #[error("Invalid wallet state: {0}")]
    InvalidWalletState(String),

    /// A builder was asked to build without a required input
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Borsh serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] std::io::Error),

    /// Wire or authorization error raised by the program logic
    #[error("Program error: {0}")]
    Program(#[from] LazorKitError),

    /// Client configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signing failed or a required signer was not part of the message
    #[error("Signing error: {0}")]
    Signing(String),

    /// Transaction was not confirmed within the retry limit
    #[error("Transaction {0} was not confirmed")]
    ConfirmationTimeout(Signature),

    /// Transaction landed but failed on-chain
    #[error("Transaction {0} failed: {1}")]
    TransactionFailed(Signature, String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<LazorStateError> for LazorSdkError {
    fn from(e: LazorStateError) -> Self {
        LazorSdkError::Program(e.into())
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, LazorSdkError>;
