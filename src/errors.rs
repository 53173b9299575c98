//! Error types for key custody and recovery operations
//!
//! Errors are grouped per subsystem and folded into the top-level
//! [`WalletError`]. Validation errors are raised before any side effects;
//! integrity errors always carry the offending index and are never retried.

use thiserror::Error;

/// Result type used throughout the crate
pub type WalletResult<T> = Result<T, WalletError>;

/// Top-level error type for all wallet custody and recovery operations
#[derive(Debug, Error)]
pub enum WalletError {
    /// Operator-supplied input rejected before any work began
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Key generation or derivation failure
    #[error(transparent)]
    KeyManagement(#[from] KeyManagementError),

    /// Share or keychain encryption/decryption failure
    #[error(transparent)]
    ShareEncryption(#[from] ShareEncryptionError),

    /// Cryptographic integrity failure; fatal, names the offending index
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Hosted API or chain explorer failure; fatal for the current operation
    #[error(transparent)]
    ExternalService(#[from] ExternalServiceError),

    /// Fee or amount outside the configured safety rails
    #[error("Economic safety check failed: {0}")]
    EconomicSafety(String),

    /// Wallet missing under both the current and legacy API representations
    #[error("Wallet {0} not found under any supported API version")]
    WalletNotFound(String),

    /// A referenced entity does not exist
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Data could not be converted between representations
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Reading or writing a persisted artifact failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from seed handling and extended-key derivation
#[derive(Debug, Error)]
pub enum KeyManagementError {
    #[error("seed must be exactly {expected} bytes, got {actual}")]
    InvalidSeedLength { expected: usize, actual: usize },

    #[error("extended key derivation failed: {0}")]
    Derivation(String),

    #[error("invalid extended key: {0}")]
    InvalidExtendedKey(String),
}

impl From<bitcoin::bip32::Error> for KeyManagementError {
    fn from(err: bitcoin::bip32::Error) -> Self {
        KeyManagementError::Derivation(err.to_string())
    }
}

impl From<bitcoin::bip32::Error> for WalletError {
    fn from(err: bitcoin::bip32::Error) -> Self {
        KeyManagementError::from(err).into()
    }
}

/// Errors from password-based share and keychain encryption
#[derive(Debug, Error)]
pub enum ShareEncryptionError {
    #[error("ciphertext too short to contain salt and nonce")]
    TruncatedCiphertext,

    #[error("malformed share encoding: {0}")]
    Encoding(String),

    #[error("password key derivation failed: {0}")]
    KeyDerivation(String),

    /// AEAD authentication failed; the trial-decryption "wrong password" signal
    #[error("decryption failed (wrong password or corrupted share)")]
    DecryptionFailed,

    #[error("encryption failed")]
    EncryptionFailed,
}

/// Integrity failures detected during recovery or signing
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("reconstructed key for index {index} does not match the recorded public key")]
    KeyMismatch { index: u32 },

    #[error("share decryption failed for key {index} with the discovered passwords")]
    ShareDecryption { index: u32 },

    #[error("signature verification failed for input {index}")]
    SignatureInvalid { index: usize },
}

/// Failures talking to the hosted wallet API or a public chain explorer
#[derive(Debug, Error)]
pub enum ExternalServiceError {
    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("{service} returned HTTP {status} for {url}")]
    Status {
        service: &'static str,
        status: u16,
        url: String,
    },

    #[error("unexpected {service} response: {detail}")]
    Malformed {
        service: &'static str,
        detail: String,
    },
}

impl From<hex::FromHexError> for WalletError {
    fn from(err: hex::FromHexError) -> Self {
        WalletError::Conversion(err.to_string())
    }
}
