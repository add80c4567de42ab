//! Byte and account assertions shared by the LazorKit contracts.
//!
//! Every `check_*` helper returns `Ok(())` or the caller-supplied error, so
//! call sites read as a flat list of preconditions.

#[cfg(target_os = "solana")]
use pinocchio::syscalls::sol_memcmp_;
use pinocchio::pubkey::Pubkey;

#[allow(unused_imports)]
use std::mem::MaybeUninit;

/// Minimal view of an account reference inside a transaction.
pub trait AccountFlags {
    fn key(&self) -> &Pubkey;
    fn is_signer(&self) -> bool;
    fn is_writable(&self) -> bool;
}

#[inline(always)]
#[cfg(target_os = "solana")]
pub fn sol_assert_bytes_eq(left: &[u8], right: &[u8], len: usize) -> bool {
    if left.len() != len || right.len() != len {
        return false;
    }
    unsafe {
        let mut result = MaybeUninit::<i32>::uninit();
        sol_memcmp_(
            left.as_ptr(),
            right.as_ptr(),
            len as u64,
            result.as_mut_ptr() as *mut i32,
        );
        result.assume_init() == 0
    }
}

#[cfg(not(target_os = "solana"))]
pub fn sol_assert_bytes_eq(left: &[u8], right: &[u8], len: usize) -> bool {
    left.len() == len && right.len() == len && left == right
}

macro_rules! sol_assert {
  ($func_name:ident, $($param:ident: $type:ty),* $(,)? | $check:expr) => {
      #[inline(always)]
      pub fn $func_name<E>($($param: $type,)* error: E) -> Result<(), E> {
          if $check {
              Ok(())
          } else {
              Err(error)
          }
      }
  };
}

macro_rules! sol_assert_return {
  ($func_name:ident, $return_type:ty, $($param:ident: $type:ty),* $(,)? | $check:expr) => {
      #[inline(always)]
      pub fn $func_name<E>($($param: $type,)* error: E) -> Result<$return_type, E> {
          match $check {
              Some(value) => Ok(value),
              None => Err(error),
          }
      }
  };
}

sol_assert_return!(find_signer, usize, accounts: &[impl AccountFlags], key: &[u8] |
  accounts
      .iter()
      .position(|a| a.is_signer() && sol_assert_bytes_eq(a.key().as_ref(), key, 32))
);

sol_assert!(check_writable, account: &impl AccountFlags |
  account.is_writable()
);

sol_assert!(check_signer, account: &impl AccountFlags |
  account.is_signer()
);

sol_assert!(check_key_match, account: &impl AccountFlags, target_key: &Pubkey |
  sol_assert_bytes_eq(account.key().as_ref(), target_key.as_ref(), 32)
);

sol_assert!(check_zero_data, data: &[u8] |
  data.is_empty()
);

sol_assert!(check_min_accounts, accounts: &[impl AccountFlags], required: usize |
  accounts.len() >= required
);

#[cfg(test)]
mod tests {
    use super::*;

    struct Meta {
        key: Pubkey,
        signer: bool,
        writable: bool,
    }

    impl AccountFlags for Meta {
        fn key(&self) -> &Pubkey {
            &self.key
        }
        fn is_signer(&self) -> bool {
            self.signer
        }
        fn is_writable(&self) -> bool {
            self.writable
        }
    }

    fn meta(byte: u8, signer: bool, writable: bool) -> Meta {
        Meta {
            key: [byte; 32],
            signer,
            writable,
        }
    }

    #[test]
    fn test_bytes_eq_requires_expected_length() {
        assert!(sol_assert_bytes_eq(&[1, 2, 3], &[1, 2, 3], 3));
        assert!(!sol_assert_bytes_eq(&[1, 2, 3], &[1, 2, 3], 2));
        assert!(!sol_assert_bytes_eq(&[1, 2], &[1, 2, 3], 3));
    }

    #[test]
    fn test_find_signer_skips_non_signers() {
        let accounts = [meta(7, false, true), meta(7, true, false)];
        assert_eq!(find_signer(&accounts, &[7; 32], "missing"), Ok(1));
        assert_eq!(find_signer(&accounts, &[8; 32], "missing"), Err("missing"));
    }

    #[test]
    fn test_flag_checks() {
        let payer = meta(1, true, true);
        let wallet = meta(2, false, true);
        assert!(check_signer(&payer, ()).is_ok());
        assert!(check_signer(&wallet, ()).is_err());
        assert!(check_writable(&wallet, ()).is_ok());
        assert!(check_key_match(&wallet, &[2; 32], ()).is_ok());
        assert!(check_key_match(&wallet, &[3; 32], ()).is_err());
        assert!(check_min_accounts(&[payer, wallet], 3, ()).is_err());
    }

    #[test]
    fn test_zero_data() {
        assert!(check_zero_data(&[], ()).is_ok());
        assert!(check_zero_data(&[0], ()).is_err());
    }
}
