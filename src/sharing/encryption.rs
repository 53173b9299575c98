//! Password-based share encryption
//!
//! Each share is encrypted independently: an Argon2id key derived from the
//! share's password and a random salt, then XChaCha20-Poly1305 over the share
//! bytes. The blob layout is `salt || nonce || ciphertext`, hex-encoded. The
//! AEAD tag doubles as the wrong-password signal during trial decryption.

use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::errors::ShareEncryptionError;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;

fn derive_key(password: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>, ShareEncryptionError> {
    let mut key = Zeroizing::new([0u8; 32]);
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, key.as_mut_slice())
        .map_err(|e| ShareEncryptionError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

/// Encrypt a share under a password, returning an opaque hex blob.
pub fn encrypt_share<R: RngCore + CryptoRng>(
    plaintext: &[u8],
    password: &str,
    rng: &mut R,
) -> Result<String, ShareEncryptionError> {
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| ShareEncryptionError::EncryptionFailed)?;

    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(hex::encode(blob))
}

/// Decrypt an opaque share blob with a password.
///
/// Fails with [`ShareEncryptionError::DecryptionFailed`] when the password is
/// wrong or the blob was tampered with.
pub fn decrypt_share(
    blob: &str,
    password: &str,
) -> Result<Zeroizing<Vec<u8>>, ShareEncryptionError> {
    let raw = hex::decode(blob).map_err(|e| ShareEncryptionError::Encoding(e.to_string()))?;
    if raw.len() <= SALT_LEN + NONCE_LEN {
        return Err(ShareEncryptionError::TruncatedCiphertext);
    }
    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(password, salt)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
    let plaintext = cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| ShareEncryptionError::DecryptionFailed)?;
    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn round_trip() {
        let mut rng = StdRng::seed_from_u64(1);
        let blob = encrypt_share(b"share bytes", "hunter2", &mut rng).unwrap();
        let plain = decrypt_share(&blob, "hunter2").unwrap();
        assert_eq!(plain.as_slice(), b"share bytes");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let mut rng = StdRng::seed_from_u64(2);
        let blob = encrypt_share(b"share bytes", "hunter2", &mut rng).unwrap();
        assert!(matches!(
            decrypt_share(&blob, "hunter3"),
            Err(ShareEncryptionError::DecryptionFailed)
        ));
    }

    #[test]
    fn same_plaintext_yields_distinct_blobs() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = encrypt_share(b"share bytes", "pw", &mut rng).unwrap();
        let b = encrypt_share(b"share bytes", "pw", &mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn truncated_blob_is_rejected() {
        assert!(matches!(
            decrypt_share("00ff00ff", "pw"),
            Err(ShareEncryptionError::TruncatedCiphertext)
        ));
        assert!(matches!(
            decrypt_share("not hex", "pw"),
            Err(ShareEncryptionError::Encoding(_))
        ));
    }
}
