//! Public blockchain explorer client
//!
//! Talks to an insight-style explorer API exposing raw transaction lookup
//! (`/tx/{txid}`) and per-address unspent lookup (`/addr/{address}/utxo`).
//! Explorer failures are fatal for the current operation; a recovery built on
//! partial chain data would silently strand funds.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{ExternalServiceError, WalletResult};

/// One output of a transaction as reported by the explorer.
#[derive(Debug, Clone)]
pub struct TxOutputInfo {
    pub output_index: u32,
    pub value: u64,
    pub address: Option<String>,
}

/// A currently unspent output on an address.
#[derive(Debug, Clone)]
pub struct AddressUnspent {
    pub txid: String,
    pub output_index: u32,
    pub value: u64,
    pub address: String,
}

/// Read-only view of a chain's public index.
#[async_trait]
pub trait ChainExplorer: Send + Sync {
    async fn transaction_outputs(&self, txid: &str) -> WalletResult<Vec<TxOutputInfo>>;

    async fn address_unspents(&self, address: &str) -> WalletResult<Vec<AddressUnspent>>;
}

#[derive(Debug, Deserialize)]
struct InsightTx {
    vout: Vec<InsightVout>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsightVout {
    n: u32,
    /// Decimal coin amount, e.g. "1.50000000".
    value: Option<String>,
    value_sat: Option<u64>,
    script_pub_key: InsightScriptPubKey,
}

#[derive(Debug, Deserialize)]
struct InsightScriptPubKey {
    addresses: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct InsightUtxo {
    txid: String,
    vout: u32,
    satoshis: Option<u64>,
    address: String,
}

pub struct HttpChainExplorer {
    client: Client,
    base_url: String,
}

impl HttpChainExplorer {
    pub fn new(base_url: String) -> WalletResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ExternalServiceError::Malformed {
                service: "explorer",
                detail: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client, base_url })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> WalletResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExternalServiceError::Transport {
                url: url.to_string(),
                source: e,
            })?;
        if !response.status().is_success() {
            return Err(ExternalServiceError::Status {
                service: "explorer",
                status: response.status().as_u16(),
                url: url.to_string(),
            }
            .into());
        }
        response
            .json::<T>()
            .await
            .map_err(|e| {
                ExternalServiceError::Transport {
                    url: url.to_string(),
                    source: e,
                }
                .into()
            })
    }
}

#[async_trait]
impl ChainExplorer for HttpChainExplorer {
    async fn transaction_outputs(&self, txid: &str) -> WalletResult<Vec<TxOutputInfo>> {
        let url = format!("{}/tx/{txid}", self.base_url);
        let tx: InsightTx = self.get_json(&url).await?;
        debug!(txid, outputs = tx.vout.len(), "fetched transaction outputs");

        let mut outputs = Vec::with_capacity(tx.vout.len());
        for vout in tx.vout {
            let value = match (vout.value_sat, &vout.value) {
                (Some(sats), _) => sats,
                (None, Some(decimal)) => decimal_to_satoshis(decimal)?,
                (None, None) => {
                    return Err(ExternalServiceError::Malformed {
                        service: "explorer",
                        detail: format!("output {} of {txid} has no value", vout.n),
                    }
                    .into())
                }
            };
            // Multisig/nonstandard outputs may report zero or many addresses;
            // only single-address outputs can belong to a wallet deposit.
            let address = vout
                .script_pub_key
                .addresses
                .as_ref()
                .filter(|a| a.len() == 1)
                .map(|a| a[0].clone());
            outputs.push(TxOutputInfo {
                output_index: vout.n,
                value,
                address,
            });
        }
        Ok(outputs)
    }

    async fn address_unspents(&self, address: &str) -> WalletResult<Vec<AddressUnspent>> {
        let url = format!("{}/addr/{address}/utxo", self.base_url);
        let utxos: Vec<InsightUtxo> = self.get_json(&url).await?;
        debug!(address, count = utxos.len(), "fetched address unspents");

        utxos
            .into_iter()
            .map(|utxo| {
                let value = utxo.satoshis.ok_or_else(|| {
                    ExternalServiceError::Malformed {
                        service: "explorer",
                        detail: format!("unspent {}:{} has no value", utxo.txid, utxo.vout),
                    }
                })?;
                Ok(AddressUnspent {
                    txid: utxo.txid,
                    output_index: utxo.vout,
                    value,
                    address: utxo.address,
                })
            })
            .collect()
    }
}

/// Convert a decimal coin amount string to satoshis without going through
/// floating point.
fn decimal_to_satoshis(decimal: &str) -> WalletResult<u64> {
    let malformed = |detail: String| ExternalServiceError::Malformed {
        service: "explorer",
        detail,
    };

    let mut parts = decimal.splitn(2, '.');
    let whole = parts.next().unwrap_or("0");
    let frac = parts.next().unwrap_or("");
    if frac.len() > 8 {
        return Err(malformed(format!("amount {decimal} has sub-satoshi precision")).into());
    }

    let whole: u64 = whole
        .parse()
        .map_err(|_| malformed(format!("unparseable amount {decimal}")))?;
    let mut frac_padded = frac.to_string();
    while frac_padded.len() < 8 {
        frac_padded.push('0');
    }
    let frac: u64 = frac_padded
        .parse()
        .map_err(|_| malformed(format!("unparseable amount {decimal}")))?;

    whole
        .checked_mul(100_000_000)
        .and_then(|sats| sats.checked_add(frac))
        .ok_or_else(|| malformed(format!("amount {decimal} overflows")).into())
}
