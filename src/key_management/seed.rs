//! Root seed type and master key pair derivation

use std::fmt;

use bitcoin::bip32::{Xpriv, Xpub};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::Network;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{KeyManagementError, WalletResult};

/// Seed length in bytes (256 bits).
pub const SEED_LEN: usize = 32;

/// Root entropy for one extended key pair.
///
/// Never persisted in clear form; zeroed on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    pub fn new(bytes: [u8; SEED_LEN]) -> Self {
        Seed(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyManagementError> {
        if bytes.len() != SEED_LEN {
            return Err(KeyManagementError::InvalidSeedLength {
                expected: SEED_LEN,
                actual: bytes.len(),
            });
        }
        let mut seed = [0u8; SEED_LEN];
        seed.copy_from_slice(bytes);
        Ok(Seed(seed))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

/// An extended key pair derived from a seed.
pub struct MasterKey {
    pub xprv: Xpriv,
    pub xpub: Xpub,
}

/// Derive the extended key pair a seed commits to.
pub fn derive_master_key(seed: &Seed, network: Network) -> WalletResult<MasterKey> {
    let secp = Secp256k1::new();
    let xprv = Xpriv::new_master(network, seed.as_bytes()).map_err(KeyManagementError::from)?;
    let xpub = Xpub::from_priv(&secp, &xprv);
    Ok(MasterKey { xprv, xpub })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_enforces_length() {
        assert!(Seed::from_bytes(&[0u8; 16]).is_err());
        assert!(Seed::from_bytes(&[0u8; SEED_LEN]).is_ok());
    }

    #[test]
    fn same_seed_derives_same_key_pair() {
        let seed = Seed::new([7u8; SEED_LEN]);
        let a = derive_master_key(&seed, Network::Bitcoin).unwrap();
        let b = derive_master_key(&seed, Network::Bitcoin).unwrap();
        assert_eq!(a.xpub, b.xpub);
        assert_eq!(a.xprv.to_string(), b.xprv.to_string());
    }

    #[test]
    fn debug_never_prints_seed_bytes() {
        let seed = Seed::new([0xabu8; SEED_LEN]);
        assert_eq!(format!("{seed:?}"), "Seed(<redacted>)");
    }
}
