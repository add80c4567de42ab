pub mod config;
pub mod connection;
pub mod constants;
pub mod retry;
pub mod signer;
