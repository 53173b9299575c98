//! Cross-chain recovery transaction assembly and signing

mod builder;
mod pipeline;
mod sighash;
mod signer;

pub use builder::{RecoveryTxBuilder, RecoveryTxInfo, RecoveryTxInput, RecoveryTxOutput};
pub use pipeline::{
    read_recovery_transaction, write_recovery_transaction, CrossChainRecovery, RecoveryRequest,
    RecoveryTransactionFile, RECOVERY_FILE_VERSION,
};
pub use sighash::input_signature_hash;
pub use signer::{KeyMaterial, RecoverySigner};
