//! Key material for wallet accounts and outputs.
//!
//! Keys are opaque 32-byte values here. Derivation, signing, and ring
//! signature math live in the embedding application's crypto layer; this
//! crate only moves the bytes around.

use crate::address::AccountAddress;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 32-byte public key (output keys, transaction keys, address keys).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// A 32-byte key image marking an output as spent on chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyImage(pub [u8; 32]);

impl KeyImage {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// A 32-byte secret key.
///
/// This type intentionally does not implement `Debug`, `Serialize`, or `Clone`
/// to prevent accidental exposure. Key bytes are zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(pub [u8; 32]);

/// The spend authority for one account: its public address plus the secret
/// keys the transaction construction primitive signs with.
///
/// Intentionally just data, and intentionally not `Clone`.
pub struct AccountKeys {
    pub address: AccountAddress,
    pub view_secret: SecretKey,
    pub spend_secret: SecretKey,
}
