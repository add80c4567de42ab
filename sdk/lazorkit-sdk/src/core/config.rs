//! Client settings.
//!
//! Loaded from a TOML file, then overridden by `LAZORKIT_*` environment
//! variables. Every field has a default, so an empty file is valid.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use lazorkit_state::{DiscriminatorProfile, ProgramConfig, SeedScheme};
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

use crate::core::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_POLICY_PROGRAM_ID, DEFAULT_PROGRAM_ID, DEFAULT_RETRY_DELAY_MS,
    DEFAULT_RPC_URL,
};
use crate::core::retry::{BackoffKind, RetryPolicy};
use crate::error::{LazorSdkError, Result};

pub const ENV_RPC_URL: &str = "LAZORKIT_RPC_URL";
pub const ENV_PROGRAM_ID: &str = "LAZORKIT_PROGRAM_ID";
pub const ENV_POLICY_PROGRAM_ID: &str = "LAZORKIT_POLICY_PROGRAM_ID";
pub const ENV_MAX_RETRIES: &str = "LAZORKIT_MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "LAZORKIT_RETRY_DELAY_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSchemeSetting {
    #[default]
    Wallet,
    SmartWallet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSetting {
    #[default]
    Compact,
    Hashed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub delay_ms: u64,
    /// Double the delay after every attempt.
    pub exponential: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
            exponential: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub commitment: Commitment,
    pub program_id: String,
    pub policy_program_id: String,
    pub seed_scheme: SeedSchemeSetting,
    pub discriminator_profile: ProfileSetting,
    pub max_session_slots: u64,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let program = ProgramConfig::default();
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: Commitment::default(),
            program_id: DEFAULT_PROGRAM_ID.to_string(),
            policy_program_id: DEFAULT_POLICY_PROGRAM_ID.to_string(),
            seed_scheme: SeedSchemeSetting::default(),
            discriminator_profile: ProfileSetting::default(),
            max_session_slots: program.max_session_slots,
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| LazorSdkError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LazorSdkError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up through `lookup`, which maps a variable
    /// name to its value.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc_url = url;
        }
        if let Some(id) = lookup(ENV_PROGRAM_ID) {
            self.program_id = id;
        }
        if let Some(id) = lookup(ENV_POLICY_PROGRAM_ID) {
            self.policy_program_id = id;
        }
        if let Some(value) = lookup(ENV_MAX_RETRIES) {
            self.retry.max_retries = parse_env(ENV_MAX_RETRIES, &value)?;
        }
        if let Some(value) = lookup(ENV_RETRY_DELAY_MS) {
            self.retry.delay_ms = parse_env(ENV_RETRY_DELAY_MS, &value)?;
        }
        log::debug!("client config: rpc_url={} program_id={}", self.rpc_url, self.program_id);
        Ok(self)
    }

    pub fn program_id(&self) -> Result<Pubkey> {
        parse_pubkey("program_id", &self.program_id)
    }

    pub fn policy_program_id(&self) -> Result<Pubkey> {
        parse_pubkey("policy_program_id", &self.policy_program_id)
    }

    /// The deployment settings every builder and deriver is handed.
    pub fn program_config(&self) -> Result<ProgramConfig> {
        let seed_scheme = match self.seed_scheme {
            SeedSchemeSetting::Wallet => SeedScheme::Wallet,
            SeedSchemeSetting::SmartWallet => SeedScheme::SmartWallet,
        };
        let profile = match self.discriminator_profile {
            ProfileSetting::Compact => DiscriminatorProfile::Compact,
            ProfileSetting::Hashed => DiscriminatorProfile::Hashed,
        };
        Ok(ProgramConfig::new(self.program_id()?.to_bytes())
            .with_policy_program(self.policy_program_id()?.to_bytes())
            .with_seed_scheme(seed_scheme)
            .with_discriminator_profile(profile)
            .with_max_session_slots(self.max_session_slots))
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        match self.commitment {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::from_millis(self.retry.delay_ms);
        if self.retry.exponential {
            RetryPolicy::exponential(self.retry.max_retries, delay)
        } else {
            RetryPolicy::fixed(self.retry.max_retries, delay)
        }
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LazorSdkError::Config(format!("{} is not a number: {:?}", name, value)))
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value)
        .map_err(|e| LazorSdkError::Config(format!("invalid {} {:?}: {}", field, value, e)))
}
