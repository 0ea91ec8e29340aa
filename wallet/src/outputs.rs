//! The owned-outputs boundary: what the wallet can spend and its balances.

use crate::model::OwnedOutput;
use murk_types::Amount;
use std::sync::RwLock;

/// Which outputs a balance query counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceFilter {
    /// Spendable right now.
    Unlocked,
    /// Still time-locked.
    LockedOrPending,
}

/// Read-only view of the outputs this wallet owns.
///
/// Real wallets back this with their transfers container; the balances here
/// are raw chain-side totals, unaware of in-flight reservations (the engine
/// adjusts for those when it emits balance events).
pub trait OutputSource: Send + Sync {
    /// Every output that is currently spendable.
    fn unlocked_outputs(&self) -> Vec<OwnedOutput>;

    /// Total value of outputs matching the filter.
    fn balance(&self, filter: BalanceFilter) -> Amount;
}

/// In-memory output set.
pub struct MemoryOutputs {
    outputs: RwLock<Vec<OwnedOutput>>,
}

impl MemoryOutputs {
    pub fn new(outputs: Vec<OwnedOutput>) -> Self {
        Self {
            outputs: RwLock::new(outputs),
        }
    }

    pub fn push(&self, output: OwnedOutput) {
        self.outputs.write().unwrap().push(output);
    }
}

impl OutputSource for MemoryOutputs {
    fn unlocked_outputs(&self) -> Vec<OwnedOutput> {
        self.outputs
            .read()
            .unwrap()
            .iter()
            .filter(|out| out.unlocked)
            .cloned()
            .collect()
    }

    fn balance(&self, filter: BalanceFilter) -> Amount {
        let want_unlocked = filter == BalanceFilter::Unlocked;
        let total = self
            .outputs
            .read()
            .unwrap()
            .iter()
            .filter(|out| out.unlocked == want_unlocked)
            .map(|out| out.amount.raw())
            .sum();
        Amount::new(total)
    }
}
