//! Daemon-facing interface of the send pipeline.

use async_trait::async_trait;
use murk_types::Amount;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::model::GlobalOutput;
use crate::transaction::Transaction;

/// Decoy candidates for one requested amount.
///
/// Responses are positionally aligned with the request: the set at index `i`
/// answers the amount at index `i`, even when two requests carry the same
/// amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoySet {
    pub amount: Amount,
    pub candidates: Vec<GlobalOutput>,
}

/// Wallet's view of the node it sends through.
#[async_trait]
pub trait DaemonClient: Send + Sync {
    /// Fetch up to `count` ring candidates for each requested amount.
    async fn random_outputs(
        &self,
        amounts: &[Amount],
        count: u64,
    ) -> Result<Vec<DecoySet>, WalletError>;

    /// Submit a signed transaction to the network.
    async fn relay_transaction(&self, tx: &Transaction) -> Result<(), WalletError>;
}
