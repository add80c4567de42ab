//! LazorKit Program
//!
//! Smart wallet authorization core: instruction codec, compact instruction
//! packing, authority authentication and the wallet state transitions.
//! Transitions read through an [`ledger::AccountStore`] and return a
//! [`ledger::StateDelta`] for the host to commit.

pub mod actions;
pub mod auth;
pub mod compact;
pub mod context;
pub mod error;
pub mod instruction;
pub mod ledger;
pub mod processor;

use pinocchio_pubkey::declare_id;

declare_id!("LazorKit11111111111111111111111111111111111");

pub use error::LazorKitError;
pub use processor::{process_instruction, process_on_ledger, ProcessOutcome};
