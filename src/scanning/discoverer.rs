//! Lost-funds unspent discovery
//!
//! Funds sent to a wallet's deposit address on the wrong chain exist only as
//! unspent value on the source chain's ledger, recorded against a script the
//! recovery wallet also controls. Discovery therefore reads the faulty
//! transaction from the source chain, keeps outputs landing on addresses the
//! recovery wallet owns, and fetches their current unspents from the same
//! chain.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::WalletResult;
use crate::wallet::WalletHandle;

use super::explorer::ChainExplorer;

/// A spendable output discovered on the source chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
    pub address: String,
    pub value: u64,
    pub txid: String,
    pub output_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeem_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness_script: Option<String>,
}

/// An unspent paired with the HD path of the wallet address it pays.
#[derive(Debug, Clone)]
pub struct DiscoveredUnspent {
    pub output: UnspentOutput,
    pub chain_path: String,
}

pub struct UnspentDiscoverer<'a, E: ChainExplorer> {
    explorer: &'a E,
}

impl<'a, E: ChainExplorer> UnspentDiscoverer<'a, E> {
    pub fn new(explorer: &'a E) -> Self {
        Self { explorer }
    }

    /// Discover the spendable unspents stranded by a faulty transaction.
    ///
    /// Zero discovered unspents is not an error here; a zero-input
    /// transaction is rejected by the builder.
    pub async fn discover(
        &self,
        faulty_txid: &str,
        wallet: &WalletHandle,
    ) -> WalletResult<Vec<DiscoveredUnspent>> {
        let outputs = self.explorer.transaction_outputs(faulty_txid).await?;

        let mut lost_addresses: Vec<String> = Vec::new();
        for output in &outputs {
            if let Some(address) = &output.address {
                if wallet.find_address(address).is_some() && !lost_addresses.contains(address) {
                    lost_addresses.push(address.clone());
                }
            }
        }
        info!(
            faulty_txid,
            outputs = outputs.len(),
            matched = lost_addresses.len(),
            "matched faulty outputs against wallet addresses"
        );

        let mut discovered = Vec::new();
        for address in &lost_addresses {
            let record = match wallet.find_address(address) {
                Some(record) => record,
                None => continue,
            };
            if record.redeem_script.is_none() && record.witness_script.is_none() {
                // Address listings can lag behind script records; an entry
                // without spend material cannot be recovered from.
                warn!(%address, "wallet address record has no script material, skipping");
                continue;
            }
            let unspents = self.explorer.address_unspents(address).await?;
            for unspent in unspents {
                discovered.push(DiscoveredUnspent {
                    output: UnspentOutput {
                        address: address.clone(),
                        value: unspent.value,
                        txid: unspent.txid,
                        output_index: unspent.output_index,
                        redeem_script: record.redeem_script.clone(),
                        witness_script: record.witness_script.clone(),
                    },
                    chain_path: record.chain_path.clone(),
                });
            }
        }
        info!(count = discovered.len(), "discovered spendable unspents");
        Ok(discovered)
    }
}
