//! Authority authentication.
//!
//! Ed25519 authorities prove control by signing the transaction. Secp256r1
//! authorities carry a signature in the trailing authorization payload, checked
//! through a [`Secp256r1Verifier`].

pub mod ed25519;
pub mod secp256r1;

use lazorkit_state::{Authority, AuthorityType};
use pinocchio::pubkey::Pubkey;

use crate::error::LazorKitError;
use crate::ledger::AccountMeta;

pub use ed25519::Ed25519Authenticator;
pub use secp256r1::{Secp256r1Authenticator, Secp256r1Verifier, UnsupportedSecp256r1};

/// Everything an authenticator may look at for one instruction.
#[derive(Debug, Clone, Copy)]
pub struct AuthRequest<'a> {
    /// Full account list of the outer instruction.
    pub accounts: &'a [AccountMeta],
    /// Trailing authorization payload (signature material).
    pub auth_payload: &'a [u8],
    /// Instruction bytes the authority commits to.
    pub signed_payload: &'a [u8],
    /// Instruction discriminator bytes.
    pub discriminator: &'a [u8],
    pub payer: &'a Pubkey,
    pub current_slot: u64,
    /// Whether an embedded session key may stand in for the master key.
    pub allow_session: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthOutcome {
    /// Authorized through an embedded session key rather than the master key.
    pub via_session: bool,
    /// Odometer value to persist for Secp256r1 authorities.
    pub new_counter: Option<u32>,
}

impl AuthOutcome {
    pub const MASTER: AuthOutcome = AuthOutcome {
        via_session: false,
        new_counter: None,
    };
    pub const SESSION: AuthOutcome = AuthOutcome {
        via_session: true,
        new_counter: None,
    };
}

/// Trait for defining the authentication logic for different authority types.
pub trait Authenticator {
    fn authenticate(
        &self,
        authority: &Authority,
        request: &AuthRequest<'_>,
    ) -> Result<AuthOutcome, LazorKitError>;
}

/// Routes to the authenticator matching the authority's type.
pub fn authenticate(
    authority: &Authority,
    request: &AuthRequest<'_>,
    verifier: &dyn Secp256r1Verifier,
) -> Result<AuthOutcome, LazorKitError> {
    match authority.authority_type() {
        AuthorityType::Ed25519 | AuthorityType::Ed25519Session => {
            Ed25519Authenticator.authenticate(authority, request)
        },
        AuthorityType::Secp256r1 | AuthorityType::Secp256r1Session => {
            Secp256r1Authenticator::new(verifier).authenticate(authority, request)
        },
    }
}

/// Shared embedded-session check: the session key must sign and still be live.
pub(crate) fn authenticate_embedded_session(
    authority: &Authority,
    request: &AuthRequest<'_>,
) -> Option<Result<AuthOutcome, LazorKitError>> {
    if !request.allow_session {
        return None;
    }
    let (session_key, expires_at) = authority.data.session()?;
    lazor_assertions::find_signer(request.accounts, session_key, ()).ok()?;
    if request.current_slot >= expires_at {
        log::debug!(
            "authority {} session key expired at slot {}",
            authority.id,
            expires_at
        );
        return Some(Err(LazorKitError::SessionExpired));
    }
    Some(Ok(AuthOutcome::SESSION))
}
