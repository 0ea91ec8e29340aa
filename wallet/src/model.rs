//! Value types moving through the send pipeline.

use murk_types::{AccountAddress, Amount, PublicKey};
use serde::{Deserialize, Serialize};

/// One requested payment: where to and how much.
///
/// The address stays an unparsed string until validation; it resolves
/// against the network's [`murk_types::Currency`] during splitting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub address: String,
    pub amount: Amount,
}

/// A spendable coin owned by this wallet, as reported by the output source.
///
/// Snapshot data: the selector copies these out at selection time and never
/// looks back at the source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedOutput {
    /// Value of the output.
    pub amount: Amount,
    /// Position in the chain-wide index of outputs of this amount.
    pub global_index: u64,
    /// The one-time output key.
    pub key: PublicKey,
    /// Public key of the transaction that created this output.
    pub tx_public_key: PublicKey,
    /// Index of this output within its transaction.
    pub index_in_tx: u32,
    /// False while the output is still time-locked.
    pub unlocked: bool,
}

/// An output reference usable as a ring member: global index plus key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalOutput {
    pub global_index: u64,
    pub key: PublicKey,
}

/// A resolved on-chain destination produced by denomination splitting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationEntry {
    pub amount: Amount,
    pub address: AccountAddress,
}

/// One transaction input with its anonymity set, ready for construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Value being spent.
    pub amount: Amount,
    /// Ring candidates ordered by global index ascending.
    pub ring: Vec<GlobalOutput>,
    /// Position of the real output inside `ring`.
    pub real_output: usize,
    /// Public key of the transaction that created the real output.
    pub real_output_tx_key: PublicKey,
    /// Index of the real output within that transaction.
    pub real_output_in_tx_index: u32,
}

/// What happens to change too small to split into denominations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DustPolicy {
    /// Amounts at or below this are dust.
    pub dust_threshold: Amount,
    /// Fold leftover dust into the fee instead of emitting an output.
    pub add_to_fee: bool,
    /// Destination for leftover dust when it is not folded into the fee.
    pub dust_address: AccountAddress,
}

impl DustPolicy {
    pub fn new(dust_threshold: Amount, add_to_fee: bool, dust_address: AccountAddress) -> Self {
        Self {
            dust_threshold,
            add_to_fee,
            dust_address,
        }
    }
}
