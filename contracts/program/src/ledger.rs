//! Account views and state deltas.
//!
//! Transitions never write directly. They read through an [`AccountStore`] and
//! return a [`StateDelta`]; the host commits the delta as one unit.

use std::collections::HashMap;

use lazor_assertions::AccountFlags;
use pinocchio::pubkey::Pubkey;

use crate::error::LazorKitError;

/// An account reference as it appears in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountMeta {
    pub key: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(key: Pubkey, is_signer: bool) -> Self {
        Self {
            key,
            is_signer,
            is_writable: true,
        }
    }

    pub fn new_readonly(key: Pubkey, is_signer: bool) -> Self {
        Self {
            key,
            is_signer,
            is_writable: false,
        }
    }
}

impl AccountFlags for AccountMeta {
    fn key(&self) -> &Pubkey {
        &self.key
    }

    fn is_signer(&self) -> bool {
        self.is_signer
    }

    fn is_writable(&self) -> bool {
        self.is_writable
    }
}

/// Read access to account data.
pub trait AccountStore {
    /// Data of an initialized account, `None` if it does not exist.
    fn account_data(&self, key: &Pubkey) -> Option<&[u8]>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountWrite {
    /// Create or overwrite an account owned by the program.
    Store { key: Pubkey, data: Vec<u8> },
    /// Delete an account, sending its lamports to `refund_to`.
    Close { key: Pubkey, refund_to: Pubkey },
}

impl AccountWrite {
    pub fn key(&self) -> &Pubkey {
        match self {
            AccountWrite::Store { key, .. } | AccountWrite::Close { key, .. } => key,
        }
    }
}

/// Ordered set of writes produced by one successful transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDelta {
    pub writes: Vec<AccountWrite>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, key: Pubkey, data: Vec<u8>) {
        self.writes.push(AccountWrite::Store { key, data });
    }

    pub fn close(&mut self, key: Pubkey, refund_to: Pubkey) {
        self.writes.push(AccountWrite::Close { key, refund_to });
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Data this delta stores at `key`, if any.
    pub fn stored(&self, key: &Pubkey) -> Option<&[u8]> {
        self.writes.iter().rev().find_map(|w| match w {
            AccountWrite::Store { key: k, data } if k == key => Some(data.as_slice()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredAccount {
    pub lamports: u64,
    pub data: Vec<u8>,
}

/// In-memory account store used by hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    accounts: HashMap<Pubkey, StoredAccount>,
    slot: u64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn set_slot(&mut self, slot: u64) {
        self.slot = slot;
    }

    pub fn warp(&mut self, slots: u64) {
        self.slot = self.slot.saturating_add(slots);
    }

    pub fn account(&self, key: &Pubkey) -> Option<&StoredAccount> {
        self.accounts.get(key)
    }

    pub fn lamports(&self, key: &Pubkey) -> u64 {
        self.accounts.get(key).map_or(0, |a| a.lamports)
    }

    pub fn set_lamports(&mut self, key: Pubkey, lamports: u64) {
        self.accounts.entry(key).or_default().lamports = lamports;
    }

    /// Commits every write of `delta`, or none of them.
    pub fn apply(&mut self, delta: &StateDelta) -> Result<(), LazorKitError> {
        let mut staged = self.accounts.clone();
        for write in &delta.writes {
            match write {
                AccountWrite::Store { key, data } => {
                    staged.entry(*key).or_default().data = data.clone();
                },
                AccountWrite::Close { key, refund_to } => {
                    let closed = staged
                        .remove(key)
                        .ok_or(LazorKitError::InvalidAccountData)?;
                    let refund = staged.entry(*refund_to).or_default();
                    refund.lamports = refund
                        .lamports
                        .checked_add(closed.lamports)
                        .ok_or(LazorKitError::InvalidAccountData)?;
                },
            }
        }
        self.accounts = staged;
        log::trace!("applied {} account writes", delta.writes.len());
        Ok(())
    }
}

impl AccountStore for MemoryLedger {
    fn account_data(&self, key: &Pubkey) -> Option<&[u8]> {
        self.accounts
            .get(key)
            .filter(|a| !a.data.is_empty())
            .map(|a| a.data.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut ledger = MemoryLedger::new();
        let mut delta = StateDelta::new();
        delta.store([1; 32], vec![1, 2, 3]);
        delta.close([9; 32], [2; 32]);

        assert_eq!(ledger.apply(&delta), Err(LazorKitError::InvalidAccountData));
        assert!(ledger.account_data(&[1; 32]).is_none());
    }

    #[test]
    fn test_close_refunds_lamports() {
        let mut ledger = MemoryLedger::new();
        ledger.set_lamports([1; 32], 500);
        let mut delta = StateDelta::new();
        delta.store([1; 32], vec![7]);
        ledger.apply(&delta).unwrap();
        assert_eq!(ledger.account_data(&[1; 32]), Some(&[7u8][..]));

        let mut delta = StateDelta::new();
        delta.close([1; 32], [2; 32]);
        ledger.apply(&delta).unwrap();
        assert!(ledger.account(&[1; 32]).is_none());
        assert_eq!(ledger.lamports(&[2; 32]), 500);
    }

    #[test]
    fn test_delta_reports_last_store() {
        let mut delta = StateDelta::new();
        delta.store([1; 32], vec![1]);
        delta.store([1; 32], vec![2]);
        assert_eq!(delta.stored(&[1; 32]), Some(&[2u8][..]));
        assert_eq!(delta.stored(&[3; 32]), None);
    }
}
