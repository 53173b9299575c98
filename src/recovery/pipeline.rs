//! End-to-end recovery orchestration
//!
//! Wires resolver -> discoverer -> builder -> signer for one invocation and
//! persists the half-signed result for transport to the co-signing
//! counterparty. Each step consumes the completed, validated output of the
//! previous one; nothing partial is ever written.

use std::fs;
use std::path::Path;

use bitcoin::consensus::encode::serialize_hex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::{CoinType, FeeSchedule};
use crate::errors::WalletResult;
use crate::scanning::{ChainExplorer, UnspentDiscoverer};
use crate::wallet::{ChainWalletResolver, WalletApi};

use super::builder::{RecoveryTxBuilder, RecoveryTxInfo};
use super::signer::{KeyMaterial, RecoverySigner};

pub const RECOVERY_FILE_VERSION: u32 = 1;

/// Persisted hand-off artifact for the co-signing counterparty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryTransactionFile {
    pub version: u32,
    pub wallet_id: String,
    pub tx_hex: String,
    pub tx_info: RecoveryTxInfo,
}

pub struct RecoveryRequest {
    pub wallet_id: String,
    pub faulty_txid: String,
    pub recovery_address: String,
    pub key_material: KeyMaterial,
}

/// One-shot cross-chain recovery pipeline.
///
/// `source_coin` is the chain the funds physically live on; `recovery_coin`
/// is the chain the wallet actually belongs to.
pub struct CrossChainRecovery<A: WalletApi, E: ChainExplorer> {
    resolver: ChainWalletResolver<A>,
    explorer: E,
    fees: FeeSchedule,
    source_coin: CoinType,
    recovery_coin: CoinType,
}

impl<A: WalletApi, E: ChainExplorer> CrossChainRecovery<A, E> {
    pub fn new(api: A, explorer: E, source_coin: CoinType, recovery_coin: CoinType) -> Self {
        Self {
            resolver: ChainWalletResolver::new(api),
            explorer,
            fees: FeeSchedule::default(),
            source_coin,
            recovery_coin,
        }
    }

    pub fn with_fee_schedule(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub async fn run(&mut self, request: RecoveryRequest) -> WalletResult<RecoveryTransactionFile> {
        info!(
            wallet_id = %request.wallet_id,
            faulty_txid = %request.faulty_txid,
            source = %self.source_coin,
            recovery = %self.recovery_coin,
            "starting cross-chain recovery"
        );
        let wallet = self
            .resolver
            .resolve(self.recovery_coin, &request.wallet_id)
            .await?;

        let discoverer = UnspentDiscoverer::new(&self.explorer);
        let unspents = discoverer.discover(&request.faulty_txid, &wallet).await?;

        let builder = RecoveryTxBuilder::new(self.source_coin, &self.fees);
        let (mut tx, tx_info) =
            builder.build(&request.wallet_id, &unspents, &request.recovery_address)?;

        let signer = RecoverySigner::new(self.source_coin);
        let root = signer.resolve_key(&wallet, request.key_material)?;
        signer.sign(&mut tx, &tx_info, &root)?;

        Ok(RecoveryTransactionFile {
            version: RECOVERY_FILE_VERSION,
            wallet_id: request.wallet_id,
            tx_hex: serialize_hex(&tx),
            tx_info,
        })
    }
}

/// Persist the hand-off artifact as JSON.
pub fn write_recovery_transaction(
    file: &RecoveryTransactionFile,
    path: &Path,
) -> WalletResult<()> {
    let json = serde_json::to_string_pretty(file)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a previously persisted hand-off artifact.
pub fn read_recovery_transaction(path: &Path) -> WalletResult<RecoveryTransactionFile> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
