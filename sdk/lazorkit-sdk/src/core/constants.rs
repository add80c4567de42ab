use lazorkit_state::config::{DEFAULT_POLICY_PROGRAM_ID as POLICY_ID_BYTES, LAZORKIT_PROGRAM_ID};
use solana_sdk::pubkey::Pubkey;

// Default Program ID for Devnet/Testnet
pub const DEFAULT_PROGRAM_ID: Pubkey = Pubkey::new_from_array(LAZORKIT_PROGRAM_ID);

pub const DEFAULT_POLICY_PROGRAM_ID: Pubkey = Pubkey::new_from_array(POLICY_ID_BYTES);

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";

pub const DEFAULT_MAX_RETRIES: u32 = 30;

pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
