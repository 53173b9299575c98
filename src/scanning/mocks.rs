//! In-memory mock collaborators for tests and offline dry runs

use std::collections::HashMap;

use async_trait::async_trait;

use crate::chain::CoinType;
use crate::errors::{ExternalServiceError, WalletError, WalletResult};
use crate::wallet::{CurrentWallet, LegacyWallet, WalletApi};

use super::explorer::{AddressUnspent, ChainExplorer, TxOutputInfo};

/// Chain explorer backed by fixed transaction and unspent tables.
#[derive(Default)]
pub struct MockChainExplorer {
    transactions: HashMap<String, Vec<TxOutputInfo>>,
    unspents: HashMap<String, Vec<AddressUnspent>>,
    fail: bool,
}

impl MockChainExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transaction(mut self, txid: &str, outputs: Vec<TxOutputInfo>) -> Self {
        self.transactions.insert(txid.to_string(), outputs);
        self
    }

    pub fn with_unspents(mut self, address: &str, unspents: Vec<AddressUnspent>) -> Self {
        self.unspents.insert(address.to_string(), unspents);
        self
    }

    /// Make every call fail, for exercising fatal-abort paths.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn check_failure(&self) -> WalletResult<()> {
        if self.fail {
            return Err(ExternalServiceError::Malformed {
                service: "explorer",
                detail: "mock failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl ChainExplorer for MockChainExplorer {
    async fn transaction_outputs(&self, txid: &str) -> WalletResult<Vec<TxOutputInfo>> {
        self.check_failure()?;
        self.transactions
            .get(txid)
            .cloned()
            .ok_or_else(|| WalletError::ResourceNotFound(format!("transaction {txid}")))
    }

    async fn address_unspents(&self, address: &str) -> WalletResult<Vec<AddressUnspent>> {
        self.check_failure()?;
        Ok(self.unspents.get(address).cloned().unwrap_or_default())
    }
}

/// Hosted wallet API backed by fixed wallet tables.
#[derive(Default)]
pub struct MockWalletApi {
    current: HashMap<(CoinType, String), CurrentWallet>,
    legacy: HashMap<String, LegacyWallet>,
}

impl MockWalletApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet(mut self, coin: CoinType, wallet: CurrentWallet) -> Self {
        self.current.insert((coin, wallet.id.clone()), wallet);
        self
    }

    pub fn with_legacy_wallet(mut self, wallet: LegacyWallet) -> Self {
        self.legacy.insert(wallet.id.clone(), wallet);
        self
    }
}

#[async_trait]
impl WalletApi for MockWalletApi {
    async fn get_wallet(
        &self,
        coin: CoinType,
        wallet_id: &str,
    ) -> WalletResult<Option<CurrentWallet>> {
        Ok(self.current.get(&(coin, wallet_id.to_string())).cloned())
    }

    async fn get_legacy_wallet(&self, wallet_id: &str) -> WalletResult<Option<LegacyWallet>> {
        Ok(self.legacy.get(wallet_id).cloned())
    }
}
