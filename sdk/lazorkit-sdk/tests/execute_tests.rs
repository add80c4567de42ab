mod common;

use common::*;
use lazorkit_sdk::state::Role;
use lazorkit_sdk::LazorWallet;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::system_instruction;

const VAULT_FUNDS: u64 = 1_000_000;

async fn funded_wallet(ctx: &TestContext) -> LazorWallet {
    let builder = LazorWallet::create(ctx.config())
        .with_payer(ctx.payer_key())
        .with_id([0; 32])
        .with_owner(ctx.owner.pubkey())
        .with_default_policy(ctx.owner.pubkey());
    let tx = builder.build_transaction(&ctx.connection).await.unwrap();
    ctx.connection
        .process(tx, &[&ctx.payer, &ctx.owner])
        .await
        .unwrap();
    let wallet = builder.wallet().unwrap();
    ctx.connection.airdrop(&wallet.vault, VAULT_FUNDS).await;
    wallet
}

async fn add_spender(ctx: &TestContext, wallet: &LazorWallet) -> Keypair {
    let spender = Keypair::new();
    let tx = wallet
        .add_authority()
        .with_authority(spender.pubkey())
        .with_role(Role::Spender)
        .with_authorizer(ctx.owner.pubkey())
        .build_transaction(&ctx.connection, ctx.payer_key())
        .await
        .unwrap();
    ctx.connection
        .process(tx, &[&ctx.payer, &ctx.owner])
        .await
        .unwrap();
    spender
}

#[test_log::test(tokio::test)]
async fn test_owner_transfers_from_vault() {
    let ctx = TestContext::new();
    let wallet = funded_wallet(&ctx).await;
    let recipient = Pubkey::new_unique();

    let tx = wallet
        .execute()
        .with_authority(ctx.owner.pubkey())
        .add_instruction(system_instruction::transfer(&wallet.vault, &recipient, 5_000))
        .add_instruction(system_instruction::transfer(&wallet.vault, &recipient, 2_000))
        .build_transaction(&ctx.connection, ctx.payer_key())
        .await
        .unwrap();
    ctx.connection
        .process(tx, &[&ctx.payer, &ctx.owner])
        .await
        .unwrap();

    assert_eq!(ctx.connection.lamports(&recipient).await, 7_000);
    assert_eq!(ctx.connection.lamports(&wallet.vault).await, VAULT_FUNDS - 7_000);
}

#[test_log::test(tokio::test)]
async fn test_unknown_authority_cannot_execute() {
    let ctx = TestContext::new();
    let wallet = funded_wallet(&ctx).await;
    let stranger = Keypair::new();

    let tx = wallet
        .execute()
        .with_authority(stranger.pubkey())
        .add_instruction(system_instruction::transfer(
            &wallet.vault,
            &stranger.pubkey(),
            1,
        ))
        .build_transaction(&ctx.connection, ctx.payer_key())
        .await
        .unwrap();
    let err = ctx
        .connection
        .process(tx, &[&ctx.payer, &stranger])
        .await
        .unwrap_err();
    assert!(err.contains("Not authorized"), "{}", err);
    assert_eq!(ctx.connection.lamports(&wallet.vault).await, VAULT_FUNDS);
}

#[test_log::test(tokio::test)]
async fn test_spender_execution_with_default_policy() {
    let ctx = TestContext::new();
    let wallet = funded_wallet(&ctx).await;
    let spender = add_spender(&ctx, &wallet).await;
    let recipient = Pubkey::new_unique();

    let build = |policy_authority: Pubkey| {
        wallet
            .execute()
            .with_authority(spender.pubkey())
            .with_policy_check(policy_authority, vec![1])
            .add_instruction(system_instruction::transfer(&wallet.vault, &recipient, 10))
    };

    // the default policy only passes the authority bound at init
    let tx = build(spender.pubkey())
        .build_transaction(&ctx.connection, ctx.payer_key())
        .await
        .unwrap();
    assert_eq!(tx.message.instructions.len(), 2);
    let err = ctx
        .connection
        .process(tx, &[&ctx.payer, &spender])
        .await
        .unwrap_err();
    assert!(err.contains("policy check failed"), "{}", err);
    assert_eq!(ctx.connection.lamports(&recipient).await, 0);

    let tx = build(ctx.owner.pubkey())
        .build_transaction(&ctx.connection, ctx.payer_key())
        .await
        .unwrap();
    ctx.connection
        .process(tx, &[&ctx.payer, &spender, &ctx.owner])
        .await
        .unwrap();
    assert_eq!(ctx.connection.lamports(&recipient).await, 10);
}

#[test_log::test(tokio::test)]
async fn test_custom_policy_instruction_is_prepended() {
    let ctx = TestContext::new();
    let wallet = funded_wallet(&ctx).await;
    let custom = Instruction {
        program_id: Pubkey::new_unique(),
        accounts: vec![],
        data: vec![9],
    };

    let tx = wallet
        .execute()
        .with_authority(ctx.owner.pubkey())
        .with_policy_instruction(custom.clone())
        .build_transaction(&ctx.connection, ctx.payer_key())
        .await
        .unwrap();
    let message = &tx.message;
    let first = &message.instructions[0];
    assert_eq!(
        message.account_keys[first.program_id_index as usize],
        custom.program_id
    );
    assert_eq!(first.data, vec![9]);
}

#[test_log::test(tokio::test)]
async fn test_overdraft_rolls_back() {
    let ctx = TestContext::new();
    let wallet = funded_wallet(&ctx).await;
    let recipient = Pubkey::new_unique();

    let tx = wallet
        .execute()
        .with_authority(ctx.owner.pubkey())
        .add_instruction(system_instruction::transfer(
            &wallet.vault,
            &recipient,
            VAULT_FUNDS + 1,
        ))
        .build_transaction(&ctx.connection, ctx.payer_key())
        .await
        .unwrap();
    assert!(ctx
        .connection
        .process(tx, &[&ctx.payer, &ctx.owner])
        .await
        .is_err());
    assert_eq!(ctx.connection.lamports(&wallet.vault).await, VAULT_FUNDS);
}

#[test_log::test(tokio::test)]
async fn test_session_execution_until_expiry() {
    let ctx = TestContext::new();
    let wallet = funded_wallet(&ctx).await;
    let session = Keypair::new();
    let recipient = Pubkey::new_unique();

    let tx = wallet
        .create_session()
        .with_session_key(session.pubkey())
        .with_duration(1_000)
        .with_authorizer(ctx.owner.pubkey())
        .build_transaction(&ctx.connection, ctx.payer_key())
        .await
        .unwrap();
    ctx.connection
        .process(tx, &[&ctx.payer, &ctx.owner])
        .await
        .unwrap();

    let info = wallet
        .fetch_session(&session.pubkey(), &ctx.connection)
        .await
        .unwrap();
    assert_eq!(info.expires_at, START_SLOT + 1_000);
    assert_eq!(info.authorizer_id, 0);
    assert!(info.is_active(START_SLOT + 999));

    let execute = || {
        wallet
            .execute()
            .with_session(session.pubkey())
            .add_instruction(system_instruction::transfer(&wallet.vault, &recipient, 100))
    };
    ctx.connection.warp(999).await;
    let tx = execute()
        .build_transaction(&ctx.connection, ctx.payer_key())
        .await
        .unwrap();
    ctx.connection
        .process(tx, &[&ctx.payer, &session])
        .await
        .unwrap();
    assert_eq!(ctx.connection.lamports(&recipient).await, 100);

    ctx.connection.warp(2).await;
    let tx = execute()
        .build_transaction(&ctx.connection, ctx.payer_key())
        .await
        .unwrap();
    let err = ctx
        .connection
        .process(tx, &[&ctx.payer, &session])
        .await
        .unwrap_err();
    assert!(err.contains("Session expired"), "{}", err);
}

#[test_log::test(tokio::test)]
async fn test_session_expiry_must_be_in_future() {
    let ctx = TestContext::new();
    let wallet = funded_wallet(&ctx).await;
    let tx = wallet
        .create_session()
        .with_session_key(Pubkey::new_unique())
        .with_expiry(START_SLOT - 1)
        .with_authorizer(ctx.owner.pubkey())
        .build_transaction(&ctx.connection, ctx.payer_key())
        .await
        .unwrap();
    let err = ctx
        .connection
        .process(tx, &[&ctx.payer, &ctx.owner])
        .await
        .unwrap_err();
    assert!(err.contains("Invalid session expiry"), "{}", err);
}
