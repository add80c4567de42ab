// Example: creating a LazorKit wallet against a local validator
//
// Settings come from `lazorkit.toml` when present, then LAZORKIT_* variables.

use lazorkit_sdk::core::retry::confirm_transaction;
use lazorkit_sdk::{sign_transaction, ClientConfig, LazorWallet, RpcConnection, SolConnection};
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let config = match std::path::Path::new("lazorkit.toml").exists() {
        true => ClientConfig::from_file("lazorkit.toml")?,
        false => ClientConfig::default(),
    }
    .with_env_overrides(|name| std::env::var(name).ok())?;
    let connection = RpcConnection::new(config.rpc_url.clone(), config.commitment_config());

    let payer = Keypair::new();
    let owner = Keypair::new();
    let wallet_id = owner.pubkey().to_bytes();

    let builder = LazorWallet::create(config.program_config()?)
        .with_payer(payer.pubkey())
        .with_id(wallet_id)
        .with_owner(owner.pubkey())
        .with_default_policy(owner.pubkey());
    let wallet = builder.wallet()?;

    println!("Creating LazorKit Wallet:");
    println!("  Wallet PDA: {}", wallet.address);
    println!("  Vault PDA: {}", wallet.vault);
    println!("  Owner: {}", owner.pubkey());

    let mut tx = builder.build_transaction(&connection).await?;
    sign_transaction(&mut tx, &[&payer, &owner]).await?;
    let signature = connection.send_transaction(&tx).await?;
    confirm_transaction(&connection, &signature, &config.retry_policy()).await?;

    let info = wallet.fetch_info(&connection).await?;
    println!("  Authorities: {}", info.authorities.len());
    Ok(())
}
