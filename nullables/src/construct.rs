//! Nullable transaction construction — structurally faithful, unsigned.

use std::sync::Mutex;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use murk_types::{AccountKeys, KeyImage, PublicKey};
use murk_wallet::model::{DestinationEntry, SourceEntry};
use murk_wallet::transaction::{TxInput, TxOutput};
use murk_wallet::{Transaction, TransactionConstructor, WalletError};

type Blake2b256 = Blake2b<U32>;

/// A test constructor that builds real-shaped transactions without real
/// signatures.
///
/// Inputs mirror the sources (ring offsets, deterministic key image from
/// the real output's key), outputs mirror the destinations. Signature slots
/// are zero-filled at one 64-byte blob per ring member.
pub struct NullConstructor {
    /// When set, every construction fails with this message.
    fail_message: Mutex<Option<String>>,
    /// Extra bytes appended to `extra`, for driving size-limit paths.
    padding: Mutex<usize>,
}

impl NullConstructor {
    pub fn new() -> Self {
        Self {
            fail_message: Mutex::new(None),
            padding: Mutex::new(0),
        }
    }

    /// Fail every construction with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.fail_message.lock().unwrap() = Some(message.to_string());
    }

    /// Pad every built transaction by `bytes`.
    pub fn pad_transactions(&self, bytes: usize) {
        *self.padding.lock().unwrap() = bytes;
    }
}

impl Default for NullConstructor {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionConstructor for NullConstructor {
    fn construct(
        &self,
        _keys: &AccountKeys,
        sources: &[SourceEntry],
        destinations: &[DestinationEntry],
        extra: &[u8],
        unlock_time: u64,
    ) -> Result<Transaction, WalletError> {
        if let Some(message) = self.fail_message.lock().unwrap().clone() {
            return Err(WalletError::ConstructionFailed(message));
        }

        let mut padded_extra = extra.to_vec();
        padded_extra.resize(extra.len() + *self.padding.lock().unwrap(), 0);

        let inputs = sources
            .iter()
            .map(|source| TxInput {
                amount: source.amount,
                key_offsets: source.ring.iter().map(|c| c.global_index).collect(),
                key_image: key_image_for(&source.ring[source.real_output].key),
            })
            .collect();
        let outputs = destinations
            .iter()
            .map(|dest| TxOutput {
                amount: dest.amount,
                key: dest.address.spend.clone(),
            })
            .collect();
        let signatures = sources
            .iter()
            .map(|source| vec![0u8; 64 * source.ring.len()])
            .collect();

        Ok(Transaction {
            unlock_time,
            inputs,
            outputs,
            extra: padded_extra,
            signatures,
        })
    }
}

/// Deterministic stand-in for a key image: Blake2b-256 of the output key.
fn key_image_for(key: &PublicKey) -> KeyImage {
    let mut hasher = Blake2b256::new();
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    KeyImage(bytes)
}
