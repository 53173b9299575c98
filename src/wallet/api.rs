//! HTTP client for the hosted wallet API
//!
//! Response structures mirror the remote API shapes and are mapped into the
//! domain types in [`super`]. A 404 maps to `None` so the resolver can fall
//! back to the legacy representation; any other failure is fatal.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::chain::CoinType;
use crate::errors::{ExternalServiceError, WalletResult};

use super::{CurrentWallet, Keychain, LegacyWallet, WalletAddress};

/// Hosted wallet lookup across both API representations.
#[async_trait]
pub trait WalletApi: Send + Sync {
    async fn get_wallet(
        &self,
        coin: CoinType,
        wallet_id: &str,
    ) -> WalletResult<Option<CurrentWallet>>;

    async fn get_legacy_wallet(&self, wallet_id: &str) -> WalletResult<Option<LegacyWallet>>;
}

/// Current-API wallet response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2WalletResponse {
    id: String,
    keychain: V2KeychainData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2KeychainData {
    xpub: String,
    encrypted_prv: Option<String>,
    path: String,
}

/// One page of the current API's address listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2AddressPage {
    addresses: Vec<V2AddressData>,
    next_batch_prev_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2AddressData {
    address: String,
    chain: u32,
    index: u32,
    coin_specific: Option<V2AddressScripts>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2AddressScripts {
    redeem_script: Option<String>,
    witness_script: Option<String>,
}

/// Legacy-API wallet response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1WalletResponse {
    id: String,
    private: V1PrivateData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1PrivateData {
    addresses: Vec<V1AddressData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1AddressData {
    address: String,
    path: String,
    redeem_script: Option<String>,
}

pub struct HttpWalletApi {
    client: Client,
    base_url: String,
    access_token: String,
}

impl HttpWalletApi {
    pub fn new(base_url: String, access_token: String) -> WalletResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ExternalServiceError::Malformed {
                service: "wallet api",
                detail: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url,
            access_token,
        })
    }

    /// GET a JSON resource; `None` on 404, error on any other failure.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> WalletResult<Option<T>> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| ExternalServiceError::Transport {
                url: url.to_string(),
                source: e,
            })?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ExternalServiceError::Status {
                service: "wallet api",
                status: response.status().as_u16(),
                url: url.to_string(),
            }
            .into());
        }
        let body = response
            .json::<T>()
            .await
            .map_err(|e| ExternalServiceError::Transport {
                url: url.to_string(),
                source: e,
            })?;
        Ok(Some(body))
    }

    /// Page through the current API's address listing.
    async fn get_all_addresses(
        &self,
        coin: CoinType,
        wallet_id: &str,
    ) -> WalletResult<Vec<WalletAddress>> {
        let mut addresses = Vec::new();
        let mut prev_id: Option<String> = None;
        loop {
            let url = match &prev_id {
                Some(prev) => format!(
                    "{}/api/v2/{coin}/wallet/{wallet_id}/addresses?prevId={prev}",
                    self.base_url
                ),
                None => format!(
                    "{}/api/v2/{coin}/wallet/{wallet_id}/addresses",
                    self.base_url
                ),
            };
            let page: V2AddressPage = self.get_json(&url).await?.ok_or_else(|| {
                ExternalServiceError::Malformed {
                    service: "wallet api",
                    detail: format!("address listing missing for wallet {wallet_id}"),
                }
            })?;
            debug!(count = page.addresses.len(), "fetched address page");
            for data in page.addresses {
                let scripts = data.coin_specific.unwrap_or(V2AddressScripts {
                    redeem_script: None,
                    witness_script: None,
                });
                addresses.push(WalletAddress {
                    address: data.address,
                    chain_path: format!("/{}/{}", data.chain, data.index),
                    redeem_script: scripts.redeem_script,
                    witness_script: scripts.witness_script,
                });
            }
            match page.next_batch_prev_id {
                Some(next) => prev_id = Some(next),
                None => break,
            }
        }
        Ok(addresses)
    }
}

#[async_trait]
impl WalletApi for HttpWalletApi {
    async fn get_wallet(
        &self,
        coin: CoinType,
        wallet_id: &str,
    ) -> WalletResult<Option<CurrentWallet>> {
        let url = format!("{}/api/v2/{coin}/wallet/{wallet_id}", self.base_url);
        let wallet: V2WalletResponse = match self.get_json(&url).await? {
            Some(wallet) => wallet,
            None => return Ok(None),
        };
        let addresses = self.get_all_addresses(coin, wallet_id).await?;
        Ok(Some(CurrentWallet {
            id: wallet.id,
            coin,
            addresses,
            keychain: Keychain {
                xpub: wallet.keychain.xpub,
                encrypted_xprv: wallet.keychain.encrypted_prv,
                path: wallet.keychain.path,
            },
        }))
    }

    async fn get_legacy_wallet(&self, wallet_id: &str) -> WalletResult<Option<LegacyWallet>> {
        let url = format!("{}/api/v1/wallet/{wallet_id}", self.base_url);
        let wallet: V1WalletResponse = match self.get_json(&url).await? {
            Some(wallet) => wallet,
            None => return Ok(None),
        };
        let addresses = wallet
            .private
            .addresses
            .into_iter()
            .map(|data| WalletAddress {
                address: data.address,
                chain_path: data.path,
                redeem_script: data.redeem_script,
                witness_script: None,
            })
            .collect();
        Ok(Some(LegacyWallet {
            id: wallet.id,
            addresses,
        }))
    }
}
