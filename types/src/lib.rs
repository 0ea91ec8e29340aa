//! Fundamental types for the Murk currency.
//!
//! This crate defines the types shared across the wallet workspace:
//! amounts, transaction hashes, key material, account addresses, and the
//! network parameter set.

pub mod address;
pub mod amount;
pub mod currency;
pub mod hash;
pub mod keys;

pub use address::AccountAddress;
pub use amount::{Amount, COIN};
pub use currency::Currency;
pub use hash::TxHash;
pub use keys::{AccountKeys, KeyImage, PublicKey, SecretKey};
