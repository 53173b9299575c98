//! Wallet resolution across API versions

use std::collections::HashMap;

use tracing::{debug, info};

use crate::chain::CoinType;
use crate::errors::{WalletError, WalletResult};

use super::api::WalletApi;
use super::WalletHandle;

/// Resolves `(coin, walletId)` to a [`WalletHandle`], trying the current API
/// first and falling back to the legacy representation for bitcoin-family
/// coins. Resolved handles are cached per resolver instance.
pub struct ChainWalletResolver<A: WalletApi> {
    api: A,
    cache: HashMap<(CoinType, String), WalletHandle>,
}

impl<A: WalletApi> ChainWalletResolver<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            cache: HashMap::new(),
        }
    }

    pub async fn resolve(&mut self, coin: CoinType, wallet_id: &str) -> WalletResult<WalletHandle> {
        let key = (coin, wallet_id.to_string());
        if let Some(handle) = self.cache.get(&key) {
            return Ok(handle.clone());
        }

        let handle = match self.api.get_wallet(coin, wallet_id).await? {
            Some(wallet) => WalletHandle::Current(wallet),
            None if coin.is_bitcoin_family() => {
                debug!(%coin, wallet_id, "wallet not found under current API, trying legacy");
                match self.api.get_legacy_wallet(wallet_id).await? {
                    Some(wallet) => WalletHandle::Legacy(wallet),
                    None => return Err(WalletError::WalletNotFound(wallet_id.to_string())),
                }
            }
            None => return Err(WalletError::WalletNotFound(wallet_id.to_string())),
        };
        info!(
            wallet_id,
            legacy = handle.is_legacy(),
            address_count = handle.addresses().len(),
            "resolved wallet"
        );
        self.cache.insert(key, handle.clone());
        Ok(handle)
    }
}
