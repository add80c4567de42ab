use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;

use crate::error::{LazorSdkError, Result};

/// Abstraction for an entity that can sign messages/transactions.
/// This allows the SDK to work with:
/// 1. Local Keypairs (Backend/CLI)
/// 2. Wallet Adapters (Frontend - Unsigned Transaction flows)
#[async_trait]
pub trait LazorSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Sign a message.
    /// Not all signers support this (e.g. some wallet adapters might only sign transactions).
    /// Returns Err if not supported or failed.
    async fn sign_message(&self, message: &[u8]) -> std::result::Result<Signature, String>;
}

#[async_trait]
impl LazorSigner for Keypair {
    fn pubkey(&self) -> Pubkey {
        Signer::pubkey(self)
    }

    async fn sign_message(&self, message: &[u8]) -> std::result::Result<Signature, String> {
        Ok(Signer::sign_message(self, message))
    }
}

/// A passkey-style P-256 credential.
///
/// The signer receives the 32-byte digest the program recomputes and returns
/// the raw `r || s` signature.
#[async_trait]
pub trait Secp256r1Signer: Send + Sync {
    /// Compressed SEC1 public key.
    fn public_key(&self) -> [u8; 33];

    /// Hash of the credential id; seeds the authority PDA.
    fn credential_hash(&self) -> [u8; 32];

    async fn sign_digest(&self, digest: &[u8; 32]) -> std::result::Result<[u8; 64], String>;
}

/// Fills in the signature of every `signer` at its position among the
/// message's required signers. Slots of signers not passed keep their
/// current value.
pub async fn sign_transaction(tx: &mut Transaction, signers: &[&dyn LazorSigner]) -> Result<()> {
    let message = tx.message_data();
    let required = tx.message.header.num_required_signatures as usize;
    if tx.signatures.len() != required {
        tx.signatures.resize(required, Signature::default());
    }

    for signer in signers {
        let key = signer.pubkey();
        let position = tx.message.account_keys[..required]
            .iter()
            .position(|k| *k == key)
            .ok_or_else(|| LazorSdkError::Signing(format!("{} is not a required signer", key)))?;
        tx.signatures[position] = signer
            .sign_message(&message)
            .await
            .map_err(LazorSdkError::Signing)?;
    }
    Ok(())
}
