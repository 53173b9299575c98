//! Batch split-key generation
//!
//! For each key in a batch: draw a fresh seed, derive its extended key pair,
//! split the seed into N shares of which any M reconstruct it, and encrypt
//! each share under its own password. The batch persists as a JSON file of
//! records plus a plaintext `index,xpub` CSV for inventory without exposing
//! secrets.

use std::fs;
use std::path::Path;

use bitcoin::Network;
use blahaj::{Share, Sharks};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::info;
use zeroize::Zeroizing;

use crate::errors::{WalletError, WalletResult};
use crate::key_management::{derive_master_key, EntropyPool, Seed};

use super::encryption::encrypt_share;

pub const MAX_SHARES: u8 = 10;
pub const MAX_BATCH_KEYS: u32 = 100_000;

/// One generated key: its public key and password-encrypted seed shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitKeyRecord {
    pub index: u32,
    pub xpub: String,
    pub m: u8,
    pub n: u8,
    pub seed_shares: Vec<String>,
}

/// Batch generation parameters.
#[derive(Debug, Clone, Copy)]
pub struct SplitParams {
    /// Shares required to reconstruct each seed.
    pub m: u8,
    /// Shares generated per seed.
    pub n: u8,
    /// Number of keys in the batch.
    pub nkeys: u32,
}

impl SplitParams {
    pub fn validate(&self) -> WalletResult<()> {
        if self.n < 1 || self.n > MAX_SHARES {
            return Err(WalletError::InvalidInput(format!(
                "n must be between 1 and {MAX_SHARES}, got {}",
                self.n
            )));
        }
        if self.n == 1 {
            if self.m != 1 {
                return Err(WalletError::InvalidInput(format!(
                    "m must be 1 when n is 1, got {}",
                    self.m
                )));
            }
        } else if self.m < 2 || self.m > self.n {
            return Err(WalletError::InvalidInput(format!(
                "m must be between 2 and n={} when n > 1, got {}",
                self.n, self.m
            )));
        }
        if self.nkeys < 1 || self.nkeys > MAX_BATCH_KEYS {
            return Err(WalletError::InvalidInput(format!(
                "nkeys must be between 1 and {MAX_BATCH_KEYS}, got {}",
                self.nkeys
            )));
        }
        Ok(())
    }
}

/// Split a seed into `n` shares of which any `m` reconstruct it.
///
/// With `m == 1` there is no sharing transform: every share is the seed
/// itself.
pub fn split_seed(seed: &Seed, m: u8, n: u8) -> Vec<Zeroizing<Vec<u8>>> {
    if m == 1 {
        return (0..n)
            .map(|_| Zeroizing::new(seed.as_bytes().to_vec()))
            .collect();
    }
    let sharks = Sharks(m);
    sharks
        .dealer(seed.as_bytes())
        .take(n as usize)
        .map(|share| Zeroizing::new(Vec::from(&share)))
        .collect()
}

/// Reconstruct a seed from `m` decrypted shares.
pub fn recombine_shares(shares: &[Zeroizing<Vec<u8>>], m: u8) -> WalletResult<Seed> {
    let first = shares
        .first()
        .ok_or_else(|| WalletError::InvalidInput("no shares to recombine".to_string()))?;
    if m == 1 {
        return Ok(Seed::from_bytes(first)?);
    }
    let parsed: Vec<Share> = shares
        .iter()
        .map(|bytes| Share::try_from(bytes.as_slice()))
        .collect::<Result<_, _>>()
        .map_err(|e| WalletError::Conversion(format!("malformed share: {e}")))?;
    let sharks = Sharks(m);
    let secret = Zeroizing::new(
        sharks
            .recover(&parsed)
            .map_err(|e| WalletError::Conversion(format!("share recombination failed: {e}")))?,
    );
    Ok(Seed::from_bytes(&secret)?)
}

/// Generates batches of split keys from an entropy pool.
pub struct ThresholdSplitter<R: RngCore + CryptoRng> {
    pool: EntropyPool<R>,
    network: Network,
}

impl ThresholdSplitter<rand::rngs::OsRng> {
    pub fn new(network: Network) -> Self {
        Self::with_pool(EntropyPool::from_system(), network)
    }
}

impl<R: RngCore + CryptoRng> ThresholdSplitter<R> {
    pub fn with_pool(pool: EntropyPool<R>, network: Network) -> Self {
        Self { pool, network }
    }

    /// Mix operator-supplied text into the entropy pool before generation.
    pub fn absorb_user_entropy(&mut self, extra: &str) {
        self.pool.absorb(extra);
    }

    /// Generate `nkeys` split-key records, one password per share index.
    ///
    /// Parameters are validated before any key is generated.
    pub fn generate_batch(
        &mut self,
        params: SplitParams,
        passwords: &[String],
    ) -> WalletResult<Vec<SplitKeyRecord>> {
        params.validate()?;
        if passwords.len() != params.n as usize {
            return Err(WalletError::InvalidInput(format!(
                "expected {} passwords (one per share), got {}",
                params.n,
                passwords.len()
            )));
        }

        let mut records = Vec::with_capacity(params.nkeys as usize);
        for index in 0..params.nkeys {
            let seed = self.pool.draw_seed();
            let master = derive_master_key(&seed, self.network)?;
            let shares = split_seed(&seed, params.m, params.n);

            let mut seed_shares = Vec::with_capacity(params.n as usize);
            for (share, password) in shares.iter().zip(passwords) {
                seed_shares.push(encrypt_share(share, password, &mut self.pool)?);
            }

            records.push(SplitKeyRecord {
                index,
                xpub: master.xpub.to_string(),
                m: params.m,
                n: params.n,
                seed_shares,
            });
        }
        info!(
            nkeys = records.len(),
            m = params.m,
            n = params.n,
            "generated split-key batch"
        );
        Ok(records)
    }
}

/// Write the full batch, encrypted shares included, as JSON.
pub fn write_batch(records: &[SplitKeyRecord], path: &Path) -> WalletResult<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a previously written batch file.
pub fn read_batch(path: &Path) -> WalletResult<Vec<SplitKeyRecord>> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write the companion `index,xpub` CSV for auditing without secrets.
pub fn write_index(records: &[SplitKeyRecord], path: &Path) -> WalletResult<()> {
    let mut csv = String::new();
    for record in records {
        csv.push_str(&format!("{},{}\n", record.index, record.xpub));
    }
    fs::write(path, csv)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_splitter() -> ThresholdSplitter<StdRng> {
        ThresholdSplitter::with_pool(
            EntropyPool::new(StdRng::seed_from_u64(77)),
            Network::Bitcoin,
        )
    }

    #[test]
    fn params_are_validated_before_generation() {
        for (m, n, nkeys) in [
            (0, 1, 1),
            (1, 0, 1),
            (1, 3, 1),
            (4, 3, 1),
            (2, 11, 1),
            (2, 3, 0),
            (2, 3, MAX_BATCH_KEYS + 1),
        ] {
            assert!(
                SplitParams { m, n, nkeys }.validate().is_err(),
                "m={m} n={n} nkeys={nkeys} should be rejected"
            );
        }
        assert!(SplitParams { m: 1, n: 1, nkeys: 1 }.validate().is_ok());
        assert!(SplitParams { m: 2, n: 3, nkeys: 100 }.validate().is_ok());
    }

    #[test]
    fn password_count_must_match_share_count() {
        let mut splitter = test_splitter();
        let result = splitter.generate_batch(
            SplitParams { m: 2, n: 3, nkeys: 1 },
            &["a".to_string(), "b".to_string()],
        );
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn single_share_is_the_raw_seed() {
        let seed = Seed::new([5u8; 32]);
        let shares = split_seed(&seed, 1, 1);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].as_slice(), seed.as_bytes());
    }

    #[test]
    fn any_m_subset_reconstructs_the_seed() {
        let seed = Seed::new([9u8; 32]);
        let shares = split_seed(&seed, 2, 3);
        // Skip share 0 entirely.
        let subset = vec![shares[1].clone(), shares[2].clone()];
        assert_eq!(recombine_shares(&subset, 2).unwrap(), seed);
    }

    #[test]
    fn fewer_than_m_shares_cannot_reconstruct() {
        let seed = Seed::new([3u8; 32]);
        let shares = split_seed(&seed, 3, 5);
        let subset = vec![shares[0].clone(), shares[1].clone()];
        assert!(recombine_shares(&subset, 3).is_err());
    }

    #[test]
    fn batch_records_carry_distinct_keys() {
        let mut splitter = test_splitter();
        let records = splitter
            .generate_batch(
                SplitParams { m: 2, n: 2, nkeys: 3 },
                &["pw0".to_string(), "pw1".to_string()],
            )
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_ne!(records[0].xpub, records[1].xpub);
        assert_ne!(records[1].xpub, records[2].xpub);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.index, i as u32);
            assert_eq!(record.seed_shares.len(), 2);
        }
    }
}
