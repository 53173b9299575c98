//! Hosted-wallet handles and resolution
//!
//! The hosted service exposes two wallet representations: the current API and
//! a legacy one kept alive for old bitcoin-family wallets. Downstream code
//! works against the tagged [`WalletHandle`] variant rather than sniffing
//! response fields.

mod api;
mod resolver;

pub use api::{HttpWalletApi, WalletApi};
pub use resolver::ChainWalletResolver;

use crate::chain::CoinType;

/// One deposit address owned by a wallet, with the script material and HD
/// path needed to spend from it.
#[derive(Debug, Clone)]
pub struct WalletAddress {
    pub address: String,
    /// Path below the wallet root, e.g. `/0/0`.
    pub chain_path: String,
    pub redeem_script: Option<String>,
    pub witness_script: Option<String>,
}

/// A wallet's user-controlled signing key.
#[derive(Debug, Clone)]
pub struct Keychain {
    pub xpub: String,
    pub encrypted_xprv: Option<String>,
    pub path: String,
}

/// Wallet under the current hosted-API representation.
#[derive(Debug, Clone)]
pub struct CurrentWallet {
    pub id: String,
    pub coin: CoinType,
    pub addresses: Vec<WalletAddress>,
    pub keychain: Keychain,
}

/// Wallet under the legacy representation. No stored keychain: signing
/// requires the operator to supply the private key directly.
#[derive(Debug, Clone)]
pub struct LegacyWallet {
    pub id: String,
    pub addresses: Vec<WalletAddress>,
}

/// Uniform view over both wallet representations.
#[derive(Debug, Clone)]
pub enum WalletHandle {
    Current(CurrentWallet),
    Legacy(LegacyWallet),
}

impl WalletHandle {
    pub fn id(&self) -> &str {
        match self {
            WalletHandle::Current(w) => &w.id,
            WalletHandle::Legacy(w) => &w.id,
        }
    }

    pub fn addresses(&self) -> &[WalletAddress] {
        match self {
            WalletHandle::Current(w) => &w.addresses,
            WalletHandle::Legacy(w) => &w.addresses,
        }
    }

    pub fn keychain(&self) -> Option<&Keychain> {
        match self {
            WalletHandle::Current(w) => Some(&w.keychain),
            WalletHandle::Legacy(_) => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, WalletHandle::Legacy(_))
    }

    pub fn find_address(&self, address: &str) -> Option<&WalletAddress> {
        self.addresses().iter().find(|a| a.address == address)
    }
}
