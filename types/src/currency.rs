//! Network parameters for the Murk currency.

use crate::address::AccountAddress;
use crate::amount::COIN;
use serde::{Deserialize, Serialize};

/// Consensus-level constants the wallet needs to build valid transactions.
///
/// Embedders construct (or deserialize) one of these and share it across the
/// wallet; [`Currency::mainnet`] is the live network's configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Currency {
    /// Text prefix of account addresses on this network.
    pub address_prefix: String,

    /// Total emission ceiling in raw units. A single transfer above this is
    /// rejected out of hand.
    pub money_supply: u64,

    /// Amounts at or below this are dust (raw units).
    pub default_dust_threshold: u64,

    /// Block size (bytes) up to which a block is granted its full reward.
    pub full_reward_zone: u64,

    /// Bytes reserved in every block for the miner transaction.
    pub coinbase_blob_reserved: u64,
}

impl Currency {
    /// The live network's configuration.
    pub fn mainnet() -> Self {
        Self {
            address_prefix: "murk_".into(),
            money_supply: 18_000_000 * COIN,
            default_dust_threshold: 1_000_000,
            full_reward_zone: 20_000,
            coinbase_blob_reserved: 600,
        }
    }

    /// Hard ceiling on an assembled transaction's serialized size: twice the
    /// full-reward zone minus the miner-transaction reservation.
    pub fn max_transaction_size(&self) -> u64 {
        self.full_reward_zone * 2 - self.coinbase_blob_reserved
    }

    /// Parse an address in this network's text form.
    pub fn parse_address(&self, text: &str) -> Option<AccountAddress> {
        AccountAddress::from_text(&self.address_prefix, text)
    }
}

/// Default is the mainnet configuration.
impl Default for Currency {
    fn default() -> Self {
        Self::mainnet()
    }
}
