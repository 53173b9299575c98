//! Local half-signing of the recovery transaction
//!
//! The signing key comes either from the wallet's stored encrypted keychain
//! (unlocked with the operator's passphrase) or directly as an extended
//! private key; legacy wallets have no stored keychain, so the direct key is
//! mandatory there. Every produced signature is verified against its digest
//! before the next input is touched.

use std::str::FromStr;

use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{All, Message, Secp256k1};
use bitcoin::{ScriptBuf, Transaction};
use tracing::{debug, info};

use crate::chain::CoinType;
use crate::errors::{IntegrityError, KeyManagementError, WalletError, WalletResult};
use crate::sharing::decrypt_share;
use crate::wallet::WalletHandle;

use super::builder::RecoveryTxInfo;
use super::sighash::input_signature_hash;

/// Private key material supplied by the operator.
pub enum KeyMaterial {
    /// Wallet passphrase unlocking the stored encrypted keychain.
    Passphrase(String),
    /// Extended private key supplied directly.
    Xprv(String),
}

pub struct RecoverySigner {
    source_coin: CoinType,
    secp: Secp256k1<All>,
}

impl RecoverySigner {
    pub fn new(source_coin: CoinType) -> Self {
        Self {
            source_coin,
            secp: Secp256k1::new(),
        }
    }

    /// Resolve the root signing key from the wallet handle and key material.
    pub fn resolve_key(&self, wallet: &WalletHandle, material: KeyMaterial) -> WalletResult<Xpriv> {
        match material {
            KeyMaterial::Xprv(raw) => parse_xprv(&raw),
            KeyMaterial::Passphrase(passphrase) => {
                let keychain = wallet.keychain().ok_or_else(|| {
                    WalletError::InvalidInput(
                        "this wallet has no stored keychain; supply the private key directly"
                            .to_string(),
                    )
                })?;
                let encrypted = keychain.encrypted_xprv.as_ref().ok_or_else(|| {
                    WalletError::InvalidInput(
                        "keychain has no encrypted private key; supply the private key directly"
                            .to_string(),
                    )
                })?;
                let plain = decrypt_share(encrypted, &passphrase)?;
                let raw = std::str::from_utf8(&plain).map_err(|_| {
                    KeyManagementError::InvalidExtendedKey(
                        "decrypted keychain is not valid UTF-8".to_string(),
                    )
                })?;
                parse_xprv(raw)
            }
        }
    }

    /// Sign every input in order, verifying each signature before moving on.
    pub fn sign(
        &self,
        tx: &mut Transaction,
        info: &RecoveryTxInfo,
        root: &Xpriv,
    ) -> WalletResult<()> {
        let mode = self.source_coin.sighash_mode();
        for (index, input) in info.inputs.iter().enumerate() {
            let redeem_hex = input.redeem_script.as_ref().ok_or_else(|| {
                WalletError::InvalidInput(format!("input {index} has no redeem script"))
            })?;
            let redeem = ScriptBuf::from_bytes(hex::decode(redeem_hex).map_err(|e| {
                WalletError::Conversion(format!("redeem script for input {index}: {e}"))
            })?);

            let path = normalize_chain_path(&input.chain_path)?;
            let child = root
                .derive_priv(&self.secp, &path)
                .map_err(|e| KeyManagementError::Derivation(e.to_string()))?;

            let digest = input_signature_hash(tx, index, &redeem, input.value, mode)?;
            let message = Message::from_digest(digest);
            let signature = self.secp.sign_ecdsa(&message, &child.private_key);

            let public_key = child.private_key.public_key(&self.secp);
            if self
                .secp
                .verify_ecdsa(&message, &signature, &public_key)
                .is_err()
            {
                return Err(IntegrityError::SignatureInvalid { index }.into());
            }

            let mut sig_bytes = signature.serialize_der().to_vec();
            sig_bytes.push(mode.consensus_flag() as u8);
            let sig_push = PushBytesBuf::try_from(sig_bytes).map_err(|_| {
                WalletError::Conversion(format!("signature push for input {index}"))
            })?;
            let redeem_push = PushBytesBuf::try_from(redeem.to_bytes()).map_err(|_| {
                WalletError::Conversion(format!("redeem script push for input {index}"))
            })?;

            // OP_0 <sig> <redeemScript>; the counterparty inserts the second
            // signature ahead of the redeem script push.
            tx.input[index].script_sig = Builder::new()
                .push_opcode(bitcoin::opcodes::OP_0)
                .push_slice(sig_push)
                .push_slice(redeem_push)
                .into_script();
            debug!(index, "input signed and verified");
        }
        info!(inputs = info.inputs.len(), "all inputs signed");
        Ok(())
    }
}

fn parse_xprv(raw: &str) -> WalletResult<Xpriv> {
    Xpriv::from_str(raw.trim())
        .map_err(|e| KeyManagementError::InvalidExtendedKey(e.to_string()).into())
}

fn normalize_chain_path(path: &str) -> WalletResult<DerivationPath> {
    let trimmed = path.trim();
    let full = if trimmed.starts_with('m') {
        trimmed.to_string()
    } else if trimmed.starts_with('/') {
        format!("m{trimmed}")
    } else {
        format!("m/{trimmed}")
    };
    DerivationPath::from_str(&full)
        .map_err(|e| WalletError::InvalidInput(format!("bad derivation path {path}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_paths_normalize_to_master_relative() {
        let canonical = normalize_chain_path("m/0/0").unwrap();
        for path in ["/0/0", "0/0", " m/0/0 "] {
            assert_eq!(normalize_chain_path(path).unwrap(), canonical);
        }
        assert!(normalize_chain_path("/x/y").is_err());
    }

    #[test]
    fn garbage_xprv_is_rejected() {
        assert!(parse_xprv("xprvnonsense").is_err());
    }
}
