//! Recovery transaction assembly
//!
//! One input per discovered unspent, a single output sweeping everything
//! minus the fee to the operator's recovery address. The audit record
//! ([`RecoveryTxInfo`]) carries enough script and path material for the
//! co-signing counterparty to re-derive the construction independently.

use std::str::FromStr;

use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{
    Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chain::{CoinType, FeeSchedule};
use crate::errors::{WalletError, WalletResult};
use crate::scanning::DiscoveredUnspent;

/// One transaction input in the audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryTxInput {
    pub address: String,
    pub value: u64,
    pub txid: String,
    pub output_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeem_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness_script: Option<String>,
    pub chain_path: String,
    pub wallet_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryTxOutput {
    pub address: String,
    pub value: u64,
}

/// Audit record persisted alongside the transaction for the co-signer.
///
/// `input_amount == output_amount + miner_fee` holds by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryTxInfo {
    pub inputs: Vec<RecoveryTxInput>,
    pub outputs: Vec<RecoveryTxOutput>,
    pub miner_fee: u64,
    pub input_amount: u64,
    pub output_amount: u64,
}

pub struct RecoveryTxBuilder<'a> {
    source_coin: CoinType,
    fees: &'a FeeSchedule,
}

impl<'a> RecoveryTxBuilder<'a> {
    pub fn new(source_coin: CoinType, fees: &'a FeeSchedule) -> Self {
        Self { source_coin, fees }
    }

    /// Assemble the unsigned sweep transaction and its audit record.
    pub fn build(
        &self,
        wallet_id: &str,
        unspents: &[DiscoveredUnspent],
        recovery_address: &str,
    ) -> WalletResult<(Transaction, RecoveryTxInfo)> {
        let destination = Address::from_str(recovery_address)
            .map_err(|e| {
                WalletError::InvalidInput(format!(
                    "malformed recovery address {recovery_address}: {e}"
                ))
            })?
            .require_network(self.source_coin.network())
            .map_err(|e| {
                WalletError::InvalidInput(format!(
                    "recovery address {recovery_address} is not valid on {}: {e}",
                    self.source_coin
                ))
            })?;

        let mut inputs = Vec::with_capacity(unspents.len());
        let mut tx_inputs = Vec::with_capacity(unspents.len());
        let mut input_amount: u64 = 0;
        for unspent in unspents {
            let output = &unspent.output;
            if output.witness_script.is_some() && !self.source_coin.segwit_capable() {
                return Err(WalletError::InvalidInput(format!(
                    "unspent {}:{} pays a witness address, which a {} recovery cannot spend",
                    output.txid, output.output_index, self.source_coin
                )));
            }
            let txid = Txid::from_str(&output.txid).map_err(|e| {
                WalletError::Conversion(format!("bad txid {}: {e}", output.txid))
            })?;
            tx_inputs.push(TxIn {
                previous_output: OutPoint::new(txid, output.output_index),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            });
            input_amount = input_amount.checked_add(output.value).ok_or_else(|| {
                WalletError::Conversion("input amount overflows".to_string())
            })?;
            inputs.push(RecoveryTxInput {
                address: output.address.clone(),
                value: output.value,
                txid: output.txid.clone(),
                output_index: output.output_index,
                redeem_script: output.redeem_script.clone(),
                witness_script: output.witness_script.clone(),
                chain_path: unspent.chain_path.clone(),
                wallet_id: wallet_id.to_string(),
            });
        }

        let miner_fee = self.fees.estimate_fee(self.source_coin, unspents.len(), 1)?;
        self.fees.check_band(miner_fee)?;
        debug!(
            estimated_size = self.fees.estimate_size(unspents.len(), 1),
            miner_fee, "computed miner fee"
        );

        let output_amount = input_amount
            .checked_sub(miner_fee)
            .filter(|amount| *amount > 0)
            .ok_or_else(|| {
                WalletError::EconomicSafety(format!(
                    "transaction cannot pay its own fees: inputs {input_amount}, fee {miner_fee}"
                ))
            })?;

        let tx = Transaction {
            version: Version::ONE,
            lock_time: LockTime::ZERO,
            input: tx_inputs,
            output: vec![TxOut {
                value: Amount::from_sat(output_amount),
                script_pubkey: destination.script_pubkey(),
            }],
        };

        let info = RecoveryTxInfo {
            inputs,
            outputs: vec![RecoveryTxOutput {
                address: recovery_address.to_string(),
                value: output_amount,
            }],
            miner_fee,
            input_amount,
            output_amount,
        };
        info!(
            inputs = info.inputs.len(),
            input_amount, output_amount, miner_fee, "assembled recovery transaction"
        );
        Ok((tx, info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanning::UnspentOutput;

    const TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";
    // P2SH address on mainnet; any valid base58 script hash works here.
    const DEST: &str = "3P14159f73E4gFr7JterCCQh9QjiTjiZrG";

    fn unspent(value: u64, witness: bool) -> DiscoveredUnspent {
        DiscoveredUnspent {
            output: UnspentOutput {
                address: "35hK24tcLEWcgNA4JxpvbkNkoAcDGqQPsP".to_string(),
                value,
                txid: TXID.to_string(),
                output_index: 0,
                redeem_script: Some("522102a2".to_string()),
                witness_script: witness.then(|| "0020ab".to_string()),
            },
            chain_path: "/0/0".to_string(),
        }
    }

    #[test]
    fn conservation_holds() {
        let fees = FeeSchedule::default();
        let builder = RecoveryTxBuilder::new(CoinType::Bch, &fees);
        let (tx, info) = builder
            .build("w1", &[unspent(35_000_000, false)], DEST)
            .unwrap();
        assert_eq!(info.input_amount, info.output_amount + info.miner_fee);
        assert_eq!(tx.output.len(), 1);
        assert_eq!(tx.output[0].value.to_sat(), info.output_amount);
    }

    #[test]
    fn witness_unspents_rejected_on_non_segwit_paths() {
        let fees = FeeSchedule::default();
        let builder = RecoveryTxBuilder::new(CoinType::Bch, &fees);
        let result = builder.build("w1", &[unspent(35_000_000, true)], DEST);
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn dust_inputs_cannot_pay_fees() {
        let fees = FeeSchedule::default();
        let builder = RecoveryTxBuilder::new(CoinType::Bch, &fees);
        let result = builder.build("w1", &[unspent(5_000, false)], DEST);
        assert!(matches!(result, Err(WalletError::EconomicSafety(_))));
    }

    #[test]
    fn implausible_fee_rates_are_rejected() {
        let fees = FeeSchedule::default().with_rate(CoinType::Bch, 100_000);
        let builder = RecoveryTxBuilder::new(CoinType::Bch, &fees);
        let result = builder.build("w1", &[unspent(50_000_000, false)], DEST);
        assert!(matches!(result, Err(WalletError::EconomicSafety(_))));
    }

    #[test]
    fn malformed_recovery_address_is_rejected() {
        let fees = FeeSchedule::default();
        let builder = RecoveryTxBuilder::new(CoinType::Bch, &fees);
        let result = builder.build("w1", &[unspent(35_000_000, false)], "not-an-address");
        assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    }
}
