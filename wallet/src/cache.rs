//! The send-history cache boundary.
//!
//! The cache owns transaction records and transfer rows and tracks which
//! coins are reserved by in-flight sends. The engine mutates records through
//! this trait; real wallets back it with their history store,
//! [`MemoryTransactionCache`] backs it for tests and light embedders.

use crate::error::WalletError;
use crate::model::{OwnedOutput, Transfer};
use murk_types::{Amount, TxHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a transaction record inside the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a transfer row inside the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(pub u64);

/// Where a send stands from the cache's point of view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendingState {
    /// The pipeline is still running.
    Active,
    /// The relay accepted the transaction.
    Succeeded,
    /// The send was cancelled before completion.
    Cancelled,
    /// The pipeline stopped with an error.
    Failed(WalletError),
}

/// One row of send history. Owned by the cache, mutated by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Net signed amount: negative for an outgoing spend.
    pub total_amount: i64,
    pub fee: Amount,
    pub extra: Vec<u8>,
    pub unlock_time: u64,
    /// First row of this transaction's transfers in the cache.
    pub first_transfer: TransferId,
    pub transfer_count: u64,
    /// Zero until the transaction is assembled.
    pub hash: TxHash,
    pub sending_state: SendingState,
}

/// Storage boundary for send history and coin reservations.
///
/// The engine serializes every access through one mutex, so implementations
/// need no interior locking. Coin selection and `add_pending_transaction`
/// run under a single lock acquisition: record creation must reserve the
/// selected coins atomically, and `mark_send_result` must release them again
/// unless the send succeeded.
pub trait TransactionCache: Send {
    /// Record a new in-flight send and reserve its coins. `amount` is the
    /// net signed amount, negative of the needed money for a spend.
    fn add_pending_transaction(
        &mut self,
        amount: i64,
        fee: Amount,
        extra: &[u8],
        transfers: &[Transfer],
        unlock_time: u64,
        selected: &[OwnedOutput],
    ) -> TransactionId;

    fn transaction(&mut self, id: TransactionId) -> Option<&mut TransactionRecord>;

    /// The transfer rows `[first, first + count)`.
    fn transfer_range(&self, first: TransferId, count: u64) -> &[Transfer];

    /// Finalize a send. `None` marks success and keeps its coins reserved
    /// (they are spent now); any error, cancellation included, releases them.
    fn mark_send_result(&mut self, id: TransactionId, error: Option<WalletError>);

    /// Whether a coin is held by an in-flight or successful send. Coin
    /// identity is the (amount, global index) pair: index spaces are per
    /// amount, so equal indices under different amounts are different coins.
    fn is_coin_reserved(&self, coin: &OwnedOutput) -> bool;

    /// Total value of reserved coins across unconfirmed sends.
    fn unconfirmed_outs_total(&self) -> Amount;

    /// Total needed money (fee included) across unconfirmed sends.
    fn unconfirmed_sent_total(&self) -> Amount;
}

/// In-memory implementation of [`TransactionCache`].
#[derive(Default)]
pub struct MemoryTransactionCache {
    transactions: Vec<TransactionRecord>,
    transfers: Vec<Transfer>,
    /// One row per reserved coin: owning record, global index, value.
    reservations: Vec<(TransactionId, u64, Amount)>,
}

impl MemoryTransactionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records ever created.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}

impl TransactionCache for MemoryTransactionCache {
    fn add_pending_transaction(
        &mut self,
        amount: i64,
        fee: Amount,
        extra: &[u8],
        transfers: &[Transfer],
        unlock_time: u64,
        selected: &[OwnedOutput],
    ) -> TransactionId {
        let id = TransactionId(self.transactions.len() as u64);
        let first_transfer = TransferId(self.transfers.len() as u64);
        self.transfers.extend_from_slice(transfers);
        self.transactions.push(TransactionRecord {
            total_amount: amount,
            fee,
            extra: extra.to_vec(),
            unlock_time,
            first_transfer,
            transfer_count: transfers.len() as u64,
            hash: TxHash::ZERO,
            sending_state: SendingState::Active,
        });
        for coin in selected {
            self.reservations.push((id, coin.global_index, coin.amount));
        }
        id
    }

    fn transaction(&mut self, id: TransactionId) -> Option<&mut TransactionRecord> {
        self.transactions.get_mut(id.0 as usize)
    }

    fn transfer_range(&self, first: TransferId, count: u64) -> &[Transfer] {
        let start = first.0 as usize;
        let end = start.saturating_add(count as usize);
        self.transfers.get(start..end).unwrap_or(&[])
    }

    fn mark_send_result(&mut self, id: TransactionId, error: Option<WalletError>) {
        let Some(record) = self.transactions.get_mut(id.0 as usize) else {
            return;
        };
        record.sending_state = match error {
            None => SendingState::Succeeded,
            Some(WalletError::Cancelled) => SendingState::Cancelled,
            Some(err) => SendingState::Failed(err),
        };
        if record.sending_state != SendingState::Succeeded {
            self.reservations.retain(|(owner, _, _)| *owner != id);
        }
    }

    fn is_coin_reserved(&self, coin: &OwnedOutput) -> bool {
        self.reservations
            .iter()
            .any(|(_, index, amount)| *index == coin.global_index && *amount == coin.amount)
    }

    fn unconfirmed_outs_total(&self) -> Amount {
        Amount::new(self.reservations.iter().map(|(_, _, a)| a.raw()).sum())
    }

    fn unconfirmed_sent_total(&self) -> Amount {
        let total = self
            .transactions
            .iter()
            .filter(|record| {
                matches!(
                    record.sending_state,
                    SendingState::Active | SendingState::Succeeded
                )
            })
            .map(|record| record.total_amount.unsigned_abs())
            .sum();
        Amount::new(total)
    }
}
