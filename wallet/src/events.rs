//! Events emitted by the send pipeline.

use murk_types::Amount;

use crate::cache::TransactionId;
use crate::error::WalletError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    /// Terminal outcome of a send. Emitted exactly once per pipeline run,
    /// except when the run was cancelled after relaying.
    SendCompleted {
        transaction: TransactionId,
        error: Option<WalletError>,
    },
    /// Spendable and pending totals changed.
    BalanceUpdated { actual: Amount, pending: Amount },
}
