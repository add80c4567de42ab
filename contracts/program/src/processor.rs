//! Instruction Processor
//!
//! Thin dispatcher that routes instructions to individual handlers.

use lazorkit_state::ProgramConfig;

use crate::actions::{self, ExecutionPlan, InstructionDispatcher};
use crate::auth::Secp256r1Verifier;
use crate::context::InvokeContext;
use crate::error::LazorKitError;
use crate::instruction::{InstructionDiscriminator, LazorKitInstruction};
use crate::ledger::{AccountMeta, MemoryLedger, StateDelta};

/// What a successful instruction asks the host to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub instruction: InstructionDiscriminator,
    pub delta: StateDelta,
    /// Present for Execute only.
    pub execution: Option<ExecutionPlan>,
}

impl ProcessOutcome {
    fn state_only(instruction: InstructionDiscriminator, delta: StateDelta) -> Self {
        Self {
            instruction,
            delta,
            execution: None,
        }
    }
}

pub fn process_instruction(
    ctx: &InvokeContext<'_>,
    instruction_data: &[u8],
    dispatcher: &mut dyn InstructionDispatcher,
) -> Result<ProcessOutcome, LazorKitError> {
    let profile = ctx.config.discriminator_profile;
    let instruction = LazorKitInstruction::decode(instruction_data, profile).map_err(|e| {
        log::debug!("Failed to decode instruction: {:?}", e);
        e
    })?;
    let kind = instruction.discriminator();
    let discriminator = kind.to_bytes(profile);
    let signed_body = instruction.signed_body()?;
    log::debug!(
        "Processing {} with {} accounts at slot {}",
        kind.name(),
        ctx.accounts.len(),
        ctx.current_slot
    );

    let outcome = match &instruction {
        LazorKitInstruction::CreateWallet {
            wallet_id,
            auth_bump,
            owner,
        } => ProcessOutcome::state_only(
            kind,
            actions::process_create_wallet(ctx, *wallet_id, *auth_bump, owner)?,
        ),

        LazorKitInstruction::AddAuthority {
            new_role,
            authority,
            auth_payload,
        } => ProcessOutcome::state_only(
            kind,
            actions::process_add_authority(
                ctx,
                *new_role,
                authority,
                auth_payload,
                &signed_body,
                &discriminator,
            )?,
        ),

        LazorKitInstruction::RemoveAuthority { auth_payload } => ProcessOutcome::state_only(
            kind,
            actions::process_remove_authority(ctx, auth_payload, &discriminator)?,
        ),

        LazorKitInstruction::TransferOwnership {
            new_owner,
            auth_payload,
        } => ProcessOutcome::state_only(
            kind,
            actions::process_transfer_ownership(
                ctx,
                new_owner,
                auth_payload,
                &signed_body,
                &discriminator,
            )?,
        ),

        LazorKitInstruction::Execute {
            instructions,
            auth_payload,
        } => {
            let (delta, plan) = actions::process_execute(
                ctx,
                instructions,
                auth_payload,
                &signed_body,
                &discriminator,
                dispatcher,
            )?;
            ProcessOutcome {
                instruction: kind,
                delta,
                execution: Some(plan),
            }
        },

        LazorKitInstruction::CreateSession {
            session_key,
            expires_at,
            auth_payload,
        } => ProcessOutcome::state_only(
            kind,
            actions::process_create_session(
                ctx,
                *session_key,
                *expires_at,
                auth_payload,
                &signed_body,
                &discriminator,
            )?,
        ),
    };
    Ok(outcome)
}

/// Runs one instruction against `ledger` at its current slot and commits the
/// resulting delta. Nothing is written when the instruction fails.
pub fn process_on_ledger(
    ledger: &mut MemoryLedger,
    config: &ProgramConfig,
    accounts: &[AccountMeta],
    instruction_data: &[u8],
    secp256r1: &dyn Secp256r1Verifier,
    dispatcher: &mut dyn InstructionDispatcher,
) -> Result<ProcessOutcome, LazorKitError> {
    let outcome = {
        let ctx = InvokeContext {
            config,
            store: &*ledger,
            accounts,
            current_slot: ledger.slot(),
            secp256r1,
        };
        process_instruction(&ctx, instruction_data, dispatcher)?
    };
    ledger.apply(&outcome.delta)?;
    Ok(outcome)
}
