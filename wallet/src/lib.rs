//! Murk send engine — builds and relays wallet transactions.
//!
//! Everything between "pay these people" and a transaction on the wire:
//! - Coin selection over the wallet's unlocked outputs
//! - Decimal denomination splitting with dust handling
//! - Decoy ring construction from daemon-supplied candidates
//! - Transaction assembly against the network size ceiling
//! - A detached async pipeline with cooperative cancellation, reporting
//!   through completion and balance events

pub mod cache;
pub mod cancel;
pub mod daemon;
pub mod error;
pub mod events;
pub mod inputs;
pub mod model;
pub mod outputs;
pub mod selector;
pub mod sender;
pub mod split;
pub mod transaction;

pub use cache::{
    MemoryTransactionCache, SendingState, TransactionCache, TransactionId, TransactionRecord,
};
pub use cancel::{CancelSource, CancelToken};
pub use daemon::{DaemonClient, DecoySet};
pub use error::WalletError;
pub use events::WalletEvent;
pub use model::{DustPolicy, OwnedOutput, Transfer};
pub use outputs::{BalanceFilter, MemoryOutputs, OutputSource};
pub use sender::{validate_destination_address, SendRequest, TransactionSender};
pub use transaction::{Transaction, TransactionConstructor};
