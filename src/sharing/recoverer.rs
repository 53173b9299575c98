//! Split-key recovery with trial-decryption password discovery
//!
//! Shares are handed to different custodians with no record of which password
//! belongs to which share slot, so recovery cannot assume an ordering. Each
//! newly entered password is trial-decrypted against every remaining share of
//! the first selected key; a success binds the password to that share index.
//! Once `m` bindings exist, every selected key is decrypted at the same share
//! indices, recombined, and the regenerated public key is checked against the
//! recorded one.

use std::fs;
use std::path::Path;

use bitcoin::Network;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{IntegrityError, WalletError, WalletResult};
use crate::key_management::derive_master_key;

use super::encryption::decrypt_share;
use super::passwords::PasswordSource;
use super::splitter::{recombine_shares, SplitKeyRecord};

/// One recovered key. `xprv` is absent in verify-only mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveredKey {
    pub index: u32,
    pub xpub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xprv: Option<String>,
}

/// A password bound to the share index it decrypts.
pub struct PasswordBinding {
    pub share_index: usize,
    pub password: String,
}

pub struct ThresholdRecoverer {
    network: Network,
    verify_only: bool,
}

impl ThresholdRecoverer {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            verify_only: false,
        }
    }

    /// Verify share consistency without emitting private keys.
    pub fn verify_only(mut self) -> Self {
        self.verify_only = true;
        self
    }

    /// Select records by index, rejecting unknown or duplicate indices and
    /// selections that disagree on the sharing parameters.
    pub fn select_records<'a>(
        batch: &'a [SplitKeyRecord],
        indices: &[u32],
    ) -> WalletResult<Vec<&'a SplitKeyRecord>> {
        if indices.is_empty() {
            return Err(WalletError::InvalidInput(
                "no key indices selected".to_string(),
            ));
        }
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != indices.len() {
            return Err(WalletError::InvalidInput(
                "duplicate key indices selected".to_string(),
            ));
        }

        let mut selected = Vec::with_capacity(indices.len());
        for &index in indices {
            let record = batch
                .iter()
                .find(|r| r.index == index)
                .ok_or_else(|| {
                    WalletError::InvalidInput(format!("key index {index} not present in batch"))
                })?;
            selected.push(record);
        }

        let first = selected[0];
        for record in &selected {
            if record.m != first.m || record.n != first.n {
                return Err(WalletError::InvalidInput(format!(
                    "selected keys disagree on sharing parameters ({}-of-{} vs {}-of-{}); \
                     recover them in separate invocations",
                    first.m, first.n, record.m, record.n
                )));
            }
        }
        Ok(selected)
    }

    /// Discover which password decrypts which share of the given record.
    ///
    /// A password that decrypts no remaining share re-prompts the same slot.
    pub fn discover_bindings<S: PasswordSource>(
        record: &SplitKeyRecord,
        source: &mut S,
    ) -> WalletResult<Vec<PasswordBinding>> {
        let m = record.m as usize;
        let mut remaining: Vec<usize> = (0..record.seed_shares.len()).collect();
        let mut bindings = Vec::with_capacity(m);

        while bindings.len() < m {
            let password = source.read_password(&format!(
                "Enter password {} of {}",
                bindings.len() + 1,
                m
            ))?;
            let matched = remaining
                .iter()
                .position(|&share_index| {
                    decrypt_share(&record.seed_shares[share_index], &password).is_ok()
                });
            match matched {
                Some(position) => {
                    let share_index = remaining.remove(position);
                    debug!(share_index, "password bound to share");
                    bindings.push(PasswordBinding {
                        share_index,
                        password,
                    });
                }
                None => {
                    warn!("password does not decrypt any remaining share, try again");
                }
            }
        }
        Ok(bindings)
    }

    /// Recover the selected keys from a batch.
    pub fn recover<S: PasswordSource>(
        &self,
        batch: &[SplitKeyRecord],
        indices: &[u32],
        source: &mut S,
    ) -> WalletResult<Vec<RecoveredKey>> {
        let selected = Self::select_records(batch, indices)?;
        let bindings = Self::discover_bindings(selected[0], source)?;

        let mut recovered = Vec::with_capacity(selected.len());
        for record in selected {
            recovered.push(self.recover_one(record, &bindings)?);
        }
        Ok(recovered)
    }

    fn recover_one(
        &self,
        record: &SplitKeyRecord,
        bindings: &[PasswordBinding],
    ) -> WalletResult<RecoveredKey> {
        let mut shares = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let blob = record.seed_shares.get(binding.share_index).ok_or_else(|| {
                WalletError::InvalidInput(format!(
                    "key {} has no share {}",
                    record.index, binding.share_index
                ))
            })?;
            let plain = decrypt_share(blob, &binding.password)
                .map_err(|_| IntegrityError::ShareDecryption { index: record.index })?;
            shares.push(plain);
        }

        let seed = recombine_shares(&shares, record.m)?;
        let master = derive_master_key(&seed, self.network)?;
        if master.xpub.to_string() != record.xpub {
            return Err(IntegrityError::KeyMismatch { index: record.index }.into());
        }

        Ok(RecoveredKey {
            index: record.index,
            xpub: record.xpub.clone(),
            xprv: (!self.verify_only).then(|| master.xprv.to_string()),
        })
    }
}

/// Persist recovered keys as a JSON array.
pub fn write_recovery_output(keys: &[RecoveredKey], path: &Path) -> WalletResult<()> {
    let json = serde_json::to_string_pretty(keys)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: u32, m: u8, n: u8) -> SplitKeyRecord {
        SplitKeyRecord {
            index,
            xpub: format!("xpub{index}"),
            m,
            n,
            seed_shares: vec![String::new(); n as usize],
        }
    }

    #[test]
    fn selection_rejects_unknown_indices() {
        let batch = vec![record(0, 2, 3), record(1, 2, 3)];
        assert!(ThresholdRecoverer::select_records(&batch, &[0, 5]).is_err());
    }

    #[test]
    fn selection_rejects_duplicates_and_empty() {
        let batch = vec![record(0, 2, 3)];
        assert!(ThresholdRecoverer::select_records(&batch, &[]).is_err());
        assert!(ThresholdRecoverer::select_records(&batch, &[0, 0]).is_err());
    }

    #[test]
    fn selection_rejects_mixed_sharing_parameters() {
        let batch = vec![record(0, 2, 3), record(1, 3, 5)];
        let result = ThresholdRecoverer::select_records(&batch, &[0, 1]);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }
}
