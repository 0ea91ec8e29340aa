//! The assembled transaction carrier and the construction seam.

use crate::error::WalletError;
use crate::model::{DestinationEntry, SourceEntry};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use murk_types::{AccountKeys, Amount, KeyImage, PublicKey, TxHash};
use serde::{Deserialize, Serialize};

type Blake2b256 = Blake2b<U32>;

/// One signed-ready input: the spent amount, the ring member indices, and
/// the key image of the real output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub amount: Amount,
    /// Global indices of the ring members, ascending.
    pub key_offsets: Vec<u64>,
    pub key_image: KeyImage,
}

/// One output: an amount bound to a one-time destination key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub amount: Amount,
    pub key: PublicKey,
}

/// An assembled transaction.
///
/// This is a carrier, not a wire format. The construction primitive decides
/// what goes into it; the wallet only measures it, hashes it, and hands it
/// to the relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub unlock_time: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub extra: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
}

impl Transaction {
    /// Canonical byte encoding used for sizing and hashing.
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("transaction encoding cannot fail")
    }

    /// Content hash: Blake2b-256 over the canonical encoding.
    pub fn hash(&self) -> TxHash {
        let mut hasher = Blake2b256::new();
        hasher.update(self.to_bytes());
        let result = hasher.finalize();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        TxHash::new(output)
    }

    /// Size of the canonical encoding in bytes.
    pub fn blob_size(&self) -> u64 {
        bincode::serialized_size(self).expect("transaction encoding cannot fail")
    }
}

/// The external construction primitive.
///
/// Implementations derive one-time keys and sign. Failures must surface as
/// [`WalletError::ConstructionFailed`] so the completion event carries the
/// right kind.
pub trait TransactionConstructor: Send + Sync {
    fn construct(
        &self,
        keys: &AccountKeys,
        sources: &[SourceEntry],
        destinations: &[DestinationEntry],
        extra: &[u8],
        unlock_time: u64,
    ) -> Result<Transaction, WalletError>;
}

/// Construct a transaction and enforce the network size ceiling.
///
/// The ceiling is strict: a transaction exactly at the limit is rejected.
pub fn assemble(
    constructor: &dyn TransactionConstructor,
    keys: &AccountKeys,
    sources: &[SourceEntry],
    destinations: &[DestinationEntry],
    extra: &[u8],
    unlock_time: u64,
    size_limit: u64,
) -> Result<Transaction, WalletError> {
    let tx = constructor.construct(keys, sources, destinations, extra, unlock_time)?;
    let size = tx.blob_size();
    if size >= size_limit {
        return Err(WalletError::TransactionTooBig {
            size,
            limit: size_limit,
        });
    }
    Ok(tx)
}
