//! Chain parameters for the bitcoin-family networks the recovery pipeline
//! understands: network mapping, segwit capability, signature-hash mode, and
//! the fee-rate/size table used when assembling a recovery transaction.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::errors::{WalletError, WalletResult};

/// Coins the recovery pipeline can operate on.
///
/// All variants are bitcoin-family and share legacy address/script encoding,
/// which is what makes cross-chain recovery of misdirected deposits possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinType {
    Btc,
    Tbtc,
    Bch,
    Tbch,
}

impl CoinType {
    /// Network used for address validation and extended-key encoding.
    pub fn network(self) -> Network {
        match self {
            CoinType::Btc | CoinType::Bch => Network::Bitcoin,
            CoinType::Tbtc | CoinType::Tbch => Network::Testnet,
        }
    }

    pub fn is_bitcoin_family(self) -> bool {
        true
    }

    /// Whether the chain's recovery path can spend wrapped-segwit outputs.
    pub fn segwit_capable(self) -> bool {
        matches!(self, CoinType::Btc | CoinType::Tbtc)
    }

    /// Signature-hash algorithm variant the chain requires.
    pub fn sighash_mode(self) -> SighashMode {
        match self {
            CoinType::Btc | CoinType::Tbtc => SighashMode::Legacy,
            CoinType::Bch | CoinType::Tbch => SighashMode::LegacyForkId,
        }
    }

    pub fn ticker(self) -> &'static str {
        match self {
            CoinType::Btc => "btc",
            CoinType::Tbtc => "tbtc",
            CoinType::Bch => "bch",
            CoinType::Tbch => "tbch",
        }
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

impl FromStr for CoinType {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "btc" => Ok(CoinType::Btc),
            "tbtc" => Ok(CoinType::Tbtc),
            "bch" => Ok(CoinType::Bch),
            "tbch" => Ok(CoinType::Tbch),
            other => Err(WalletError::InvalidInput(format!(
                "unsupported coin type: {other}"
            ))),
        }
    }
}

/// Signature-hash mode used when signing recovery inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SighashMode {
    /// SIGHASH_ALL over the original serialization.
    Legacy,
    /// SIGHASH_ALL with the fork id bit, for replay-safe signing on forked
    /// chains.
    LegacyForkId,
}

impl SighashMode {
    pub fn consensus_flag(self) -> u32 {
        match self {
            SighashMode::Legacy => 0x01,
            SighashMode::LegacyForkId => 0x41,
        }
    }
}

/// Fee rates and size estimates used to price a recovery transaction.
///
/// Defaults are conservative figures for a standard P2SH 2-of-3 multisig
/// spend. Network conditions drift, so every field can be overridden instead
/// of being compiled in.
#[derive(Debug, Clone)]
pub struct FeeSchedule {
    rates: HashMap<CoinType, u64>,
    pub per_input_bytes: u64,
    pub per_output_bytes: u64,
    pub overhead_bytes: u64,
    /// Fees outside this band abort the build.
    pub min_fee: u64,
    pub max_fee: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        let mut rates = HashMap::new();
        rates.insert(CoinType::Btc, 100);
        rates.insert(CoinType::Tbtc, 100);
        rates.insert(CoinType::Bch, 20);
        rates.insert(CoinType::Tbch, 20);
        Self {
            rates,
            per_input_bytes: 295,
            per_output_bytes: 34,
            overhead_bytes: 10,
            min_fee: 1_000,
            max_fee: 10_000_000,
        }
    }
}

impl FeeSchedule {
    /// Override the satoshi-per-byte rate for one coin.
    pub fn with_rate(mut self, coin: CoinType, sat_per_byte: u64) -> Self {
        self.rates.insert(coin, sat_per_byte);
        self
    }

    /// Override the acceptable absolute fee band.
    pub fn with_band(mut self, min_fee: u64, max_fee: u64) -> Self {
        self.min_fee = min_fee;
        self.max_fee = max_fee;
        self
    }

    pub fn rate(&self, coin: CoinType) -> WalletResult<u64> {
        self.rates.get(&coin).copied().ok_or_else(|| {
            WalletError::InvalidInput(format!("no fee rate configured for {coin}"))
        })
    }

    pub fn estimate_size(&self, inputs: usize, outputs: usize) -> u64 {
        self.overhead_bytes
            + self.per_input_bytes * inputs as u64
            + self.per_output_bytes * outputs as u64
    }

    pub fn estimate_fee(&self, coin: CoinType, inputs: usize, outputs: usize) -> WalletResult<u64> {
        Ok(self.rate(coin)? * self.estimate_size(inputs, outputs))
    }

    /// Reject fees that are too small to confirm or implausibly large.
    pub fn check_band(&self, fee: u64) -> WalletResult<()> {
        if fee < self.min_fee {
            return Err(WalletError::EconomicSafety(format!(
                "fee of {fee} satoshis is below the minimum of {}; transaction would not confirm",
                self.min_fee
            )));
        }
        if fee > self.max_fee {
            return Err(WalletError::EconomicSafety(format!(
                "fee of {fee} satoshis exceeds the maximum of {}; refusing to burn funds",
                self.max_fee
            )));
        }
        Ok(())
    }
}
