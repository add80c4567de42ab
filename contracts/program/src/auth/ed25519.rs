use lazor_assertions::find_signer;
use lazorkit_state::Authority;

use super::{authenticate_embedded_session, AuthOutcome, AuthRequest, Authenticator};
use crate::error::LazorKitError;

/// Authenticates an Ed25519 authority.
///
/// Succeeds if the master key signed the transaction, or, when sessions are
/// allowed, if a live embedded session key did.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Authenticator;

impl Authenticator for Ed25519Authenticator {
    fn authenticate(
        &self,
        authority: &Authority,
        request: &AuthRequest<'_>,
    ) -> Result<AuthOutcome, LazorKitError> {
        let master = authority
            .data
            .ed25519_master()
            .ok_or(LazorKitError::InvalidAuthorityData)?;

        if find_signer(request.accounts, master, ()).is_ok() {
            return Ok(AuthOutcome::MASTER);
        }
        if let Some(outcome) = authenticate_embedded_session(authority, request) {
            return outcome;
        }
        log::debug!("authority {} did not sign", authority.id);
        Err(LazorKitError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AccountMeta;
    use lazorkit_state::{AuthorityData, Role};

    fn request<'a>(accounts: &'a [AccountMeta], slot: u64, allow_session: bool) -> AuthRequest<'a> {
        AuthRequest {
            accounts,
            auth_payload: &[],
            signed_payload: &[],
            discriminator: &[4],
            payer: &[0; 32],
            current_slot: slot,
            allow_session,
        }
    }

    fn session_authority() -> Authority {
        let data = AuthorityData::Ed25519Session {
            master_key: [1; 32],
            session_key: [2; 32],
            expires_at: 100,
        };
        Authority::new(1, Role::Spender, [1; 32], data).unwrap()
    }

    #[test]
    fn test_master_signer() {
        let data = AuthorityData::Ed25519 { public_key: [1; 32] };
        let authority = Authority::new(0, Role::Owner, [1; 32], data).unwrap();
        let signed = [AccountMeta::new([1; 32], true)];
        let unsigned = [AccountMeta::new([1; 32], false)];
        assert_eq!(
            Ed25519Authenticator.authenticate(&authority, &request(&signed, 0, false)),
            Ok(AuthOutcome::MASTER)
        );
        assert_eq!(
            Ed25519Authenticator.authenticate(&authority, &request(&unsigned, 0, false)),
            Err(LazorKitError::Unauthorized)
        );
    }

    #[test]
    fn test_session_key_until_expiry() {
        let authority = session_authority();
        let accounts = [AccountMeta::new_readonly([2; 32], true)];
        assert_eq!(
            Ed25519Authenticator.authenticate(&authority, &request(&accounts, 99, true)),
            Ok(AuthOutcome::SESSION)
        );
        assert_eq!(
            Ed25519Authenticator.authenticate(&authority, &request(&accounts, 100, true)),
            Err(LazorKitError::SessionExpired)
        );
    }

    #[test]
    fn test_session_key_refused_when_not_allowed() {
        let authority = session_authority();
        let accounts = [AccountMeta::new_readonly([2; 32], true)];
        assert_eq!(
            Ed25519Authenticator.authenticate(&authority, &request(&accounts, 1, false)),
            Err(LazorKitError::Unauthorized)
        );
    }

    #[test]
    fn test_master_works_after_session_expiry() {
        let authority = session_authority();
        let accounts = [AccountMeta::new_readonly([1; 32], true)];
        assert_eq!(
            Ed25519Authenticator.authenticate(&authority, &request(&accounts, 500, true)),
            Ok(AuthOutcome::MASTER)
        );
    }
}
