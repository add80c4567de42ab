use lazorkit_state::{Authority, AuthorityType, Role, SessionAccount, WalletAccount};
use solana_sdk::pubkey::Pubkey;

/// Information about an authority in the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityInfo {
    /// Authority ID, stable for the authority's lifetime (0 = Owner at creation)
    pub id: u8,

    pub role: Role,

    /// Authority type code
    pub authority_type: AuthorityType,

    /// Seed of the authority PDA
    pub seed: [u8; 32],

    /// Secp256r1 replay odometer; zero for Ed25519 types
    pub counter: u32,

    /// For Ed25519/Ed25519Session: the public key
    pub ed25519_pubkey: Option<[u8; 32]>,

    /// For Secp256r1/Secp256r1Session: compressed public key
    pub secp256r1_pubkey: Option<[u8; 33]>,

    /// For session types: the embedded session key
    pub session_key: Option<[u8; 32]>,

    /// For session types: current session expiration slot
    pub current_session_expiration: Option<u64>,
}

impl AuthorityInfo {
    /// Check if this is the Owner role
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    /// Check if this is an Admin role
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Check if this is a Spender role
    pub fn is_spender(&self) -> bool {
        self.role == Role::Spender
    }

    /// Check if session is currently active (not expired)
    pub fn is_session_active(&self, current_slot: u64) -> bool {
        if let Some(expiration) = self.current_session_expiration {
            current_slot < expiration
        } else {
            false
        }
    }
}

impl From<&Authority> for AuthorityInfo {
    fn from(authority: &Authority) -> Self {
        let session = authority.data.session();
        Self {
            id: authority.id,
            role: authority.role,
            authority_type: authority.authority_type(),
            seed: authority.seed,
            counter: authority.counter,
            ed25519_pubkey: authority.data.ed25519_master().copied(),
            secp256r1_pubkey: authority.data.secp256r1_master().copied(),
            session_key: session.map(|(key, _)| *key),
            current_session_expiration: session.map(|(_, expires_at)| expires_at),
        }
    }
}

/// Parsed wallet record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletInfo {
    /// Wallet PDA
    pub address: Pubkey,

    pub wallet_id: [u8; 32],

    /// Wallet PDA bump seed
    pub bump: u8,

    /// Vault PDA bump seed
    pub vault_bump: u8,

    /// All authorities, ascending by id
    pub authorities: Vec<AuthorityInfo>,
}

impl WalletInfo {
    pub fn from_account(address: Pubkey, wallet: &WalletAccount) -> Self {
        Self {
            address,
            wallet_id: wallet.wallet_id,
            bump: wallet.bump,
            vault_bump: wallet.vault_bump,
            authorities: wallet.authorities().iter().map(AuthorityInfo::from).collect(),
        }
    }

    pub fn owner(&self) -> Option<&AuthorityInfo> {
        self.authorities.iter().find(|a| a.is_owner())
    }
}

/// Parsed session record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    pub address: Pubkey,
    pub wallet: Pubkey,
    pub session_key: Pubkey,
    /// Id of the admin/owner authority that opened the session
    pub authorizer_id: u8,
    pub expires_at: u64,
}

impl SessionInfo {
    pub fn from_account(address: Pubkey, session: &SessionAccount) -> Self {
        Self {
            address,
            wallet: Pubkey::new_from_array(session.wallet),
            session_key: Pubkey::new_from_array(session.session_key),
            authorizer_id: session.authorizer_id,
            expires_at: session.expires_at,
        }
    }

    pub fn is_active(&self, current_slot: u64) -> bool {
        current_slot < self.expires_at
    }
}
