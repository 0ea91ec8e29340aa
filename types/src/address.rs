//! Account address type.

use crate::keys::PublicKey;
use serde::{Deserialize, Serialize};

/// A Murk account address: a spend key and a view key.
///
/// The text form is the network's address prefix followed by the hex of both
/// keys. Parsing from text goes through [`crate::Currency::parse_address`],
/// which knows the prefix for its network.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountAddress {
    pub spend: PublicKey,
    pub view: PublicKey,
}

impl AccountAddress {
    pub fn new(spend: PublicKey, view: PublicKey) -> Self {
        Self { spend, view }
    }

    /// Render the canonical text form under the given network prefix.
    pub fn to_text(&self, prefix: &str) -> String {
        format!(
            "{}{}{}",
            prefix,
            hex::encode(self.spend.as_bytes()),
            hex::encode(self.view.as_bytes())
        )
    }

    /// Parse the text form: prefix, then 64 hex chars of spend key, then 64
    /// hex chars of view key. Returns `None` for anything else.
    pub fn from_text(prefix: &str, text: &str) -> Option<Self> {
        let rest = text.strip_prefix(prefix)?;
        if rest.len() != 128 || !rest.is_ascii() {
            return None;
        }
        let spend = decode_key(&rest[..64])?;
        let view = decode_key(&rest[64..])?;
        Some(Self { spend, view })
    }
}

fn decode_key(s: &str) -> Option<PublicKey> {
    let bytes = hex::decode(s).ok()?;
    let arr: [u8; 32] = bytes.try_into().ok()?;
    Some(PublicKey(arr))
}
