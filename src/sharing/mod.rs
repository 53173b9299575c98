//! Threshold split-key generation and recovery
//!
//! A root seed is split into N shares of which any M reconstruct it, each
//! share encrypted under its own password. Recovery discovers which password
//! unlocks which share by trial decryption, reconstructs the seed, and
//! verifies the regenerated key pair against the recorded public key.

mod encryption;
mod passwords;
mod recoverer;
mod splitter;

pub use encryption::{decrypt_share, encrypt_share};
pub use passwords::{collect_share_passwords, PasswordSource, ScriptedPasswords};
pub use recoverer::{
    write_recovery_output, PasswordBinding, RecoveredKey, ThresholdRecoverer,
};
pub use splitter::{
    read_batch, recombine_shares, split_seed, write_batch, write_index, SplitKeyRecord,
    SplitParams, ThresholdSplitter, MAX_BATCH_KEYS, MAX_SHARES,
};
