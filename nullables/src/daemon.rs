//! Nullable daemon — canned decoys and a recording relay.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use murk_types::{Amount, PublicKey};
use murk_wallet::model::GlobalOutput;
use murk_wallet::{DaemonClient, DecoySet, Transaction, WalletError};

/// A test daemon that answers decoy requests from generated candidates and
/// records relayed transactions instead of broadcasting them.
///
/// Candidates are deterministic: request `i` of a call gets global indices
/// starting at `1000 + i * 100`.
pub struct NullDaemon {
    /// Candidates returned per requested amount. `None` honors the
    /// request's count.
    candidates_per_amount: Mutex<Option<usize>>,
    /// When set, every decoy fetch fails with this error.
    decoy_error: Mutex<Option<WalletError>>,
    /// When set, every relay fails with this error.
    relay_error: Mutex<Option<WalletError>>,
    /// When set, decoy fetches wait here before answering.
    decoy_gate: Mutex<Option<Arc<Notify>>>,
    /// When set, relays wait here before answering.
    relay_gate: Mutex<Option<Arc<Notify>>>,
    /// Every decoy request seen: the amounts and the requested count.
    decoy_requests: Mutex<Vec<(Vec<Amount>, u64)>>,
    /// Every transaction "relayed" (for assertions).
    relayed: Mutex<Vec<Transaction>>,
}

impl NullDaemon {
    pub fn new() -> Self {
        Self {
            candidates_per_amount: Mutex::new(None),
            decoy_error: Mutex::new(None),
            relay_error: Mutex::new(None),
            decoy_gate: Mutex::new(None),
            relay_gate: Mutex::new(None),
            decoy_requests: Mutex::new(Vec::new()),
            relayed: Mutex::new(Vec::new()),
        }
    }

    /// Return exactly `count` candidates per amount, whatever was asked.
    pub fn set_candidates_per_amount(&self, count: usize) {
        *self.candidates_per_amount.lock().unwrap() = Some(count);
    }

    /// Fail every decoy fetch with `error`.
    pub fn fail_decoys_with(&self, error: WalletError) {
        *self.decoy_error.lock().unwrap() = Some(error);
    }

    /// Fail every relay with `error`.
    pub fn fail_relay_with(&self, error: WalletError) {
        *self.relay_error.lock().unwrap() = Some(error);
    }

    /// Hold decoy responses until the returned handle is notified.
    pub fn gate_decoys(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.decoy_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Hold relay responses until the returned handle is notified.
    pub fn gate_relay(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.relay_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// All decoy requests seen (for assertions).
    pub fn decoy_requests(&self) -> Vec<(Vec<Amount>, u64)> {
        self.decoy_requests.lock().unwrap().clone()
    }

    /// All transactions successfully "relayed" (for assertions).
    pub fn relayed(&self) -> Vec<Transaction> {
        self.relayed.lock().unwrap().clone()
    }
}

impl Default for NullDaemon {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DaemonClient for NullDaemon {
    async fn random_outputs(
        &self,
        amounts: &[Amount],
        count: u64,
    ) -> Result<Vec<DecoySet>, WalletError> {
        self.decoy_requests
            .lock()
            .unwrap()
            .push((amounts.to_vec(), count));

        let gate = self.decoy_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = self.decoy_error.lock().unwrap().clone() {
            return Err(error);
        }

        let per_amount = self
            .candidates_per_amount
            .lock()
            .unwrap()
            .unwrap_or(count as usize);
        let sets = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| DecoySet {
                amount,
                candidates: (0..per_amount)
                    .map(|k| {
                        let global_index = 1_000 + (i as u64) * 100 + k as u64;
                        GlobalOutput {
                            global_index,
                            key: PublicKey([global_index as u8; 32]),
                        }
                    })
                    .collect(),
            })
            .collect();
        Ok(sets)
    }

    async fn relay_transaction(&self, tx: &Transaction) -> Result<(), WalletError> {
        let gate = self.relay_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = self.relay_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.relayed.lock().unwrap().push(tx.clone());
        Ok(())
    }
}
