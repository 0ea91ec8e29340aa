//! Denomination splitting and dust handling.

use crate::error::WalletError;
use crate::model::{DestinationEntry, DustPolicy, Transfer};
use murk_types::{Amount, Currency};

/// Result of decomposing an amount into denomination chunks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Decomposed {
    /// Denomination-aligned pieces, low order to high.
    pub chunks: Vec<Amount>,
    /// Remainder at or under the dust threshold.
    pub dust: Amount,
}

/// Decompose `amount` into decimal-denomination chunks plus a dust remainder.
///
/// Low-order digits accumulate into the remainder while it stays at or under
/// `dust_threshold`; once it would exceed it, every later non-zero digit
/// becomes its own chunk of `digit * 10^position`. For every input,
/// `Σ chunks + dust == amount` and `dust ≤ dust_threshold`.
pub fn decompose_amount(amount: Amount, dust_threshold: Amount) -> Decomposed {
    let mut parts = Decomposed::default();
    let mut remaining = amount.raw();
    let mut order: u64 = 1;
    let mut dust: u64 = 0;
    let mut dust_done = false;

    while remaining != 0 {
        let piece = (remaining % 10) * order;
        remaining /= 10;
        order = order.saturating_mul(10);

        if !dust_done && dust + piece <= dust_threshold.raw() {
            dust += piece;
        } else {
            dust_done = true;
            if piece != 0 {
                parts.chunks.push(Amount::new(piece));
            }
        }
    }

    parts.dust = Amount::new(dust);
    parts
}

/// Split every transfer plus the change entry into on-chain destinations.
///
/// A transfer's dust remainder stays with the transfer as one extra
/// destination to the same address. Change dust is withheld instead and
/// disposed of per `policy`: folded into the fee (emitted nowhere) or sent
/// to the policy's dust address. Returns the destination list and the
/// withheld change dust.
pub fn split_destinations(
    currency: &Currency,
    transfers: &[Transfer],
    change: Option<DestinationEntry>,
    policy: &DustPolicy,
) -> Result<(Vec<DestinationEntry>, Amount), WalletError> {
    let mut destinations = Vec::new();

    for transfer in transfers {
        let address = currency
            .parse_address(&transfer.address)
            .ok_or_else(|| WalletError::BadAddress(transfer.address.clone()))?;
        let parts = decompose_amount(transfer.amount, policy.dust_threshold);
        for piece in parts.chunks {
            destinations.push(DestinationEntry {
                amount: piece,
                address: address.clone(),
            });
        }
        if !parts.dust.is_zero() {
            destinations.push(DestinationEntry {
                amount: parts.dust,
                address,
            });
        }
    }

    let mut leftover = Amount::ZERO;
    if let Some(change) = change {
        let parts = decompose_amount(change.amount, policy.dust_threshold);
        for piece in parts.chunks {
            destinations.push(DestinationEntry {
                amount: piece,
                address: change.address.clone(),
            });
        }
        leftover = parts.dust;
    }

    if leftover > policy.dust_threshold {
        return Err(WalletError::Internal(format!(
            "change dust {} exceeds threshold {}",
            leftover, policy.dust_threshold
        )));
    }
    if !leftover.is_zero() && !policy.add_to_fee {
        destinations.push(DestinationEntry {
            amount: leftover,
            address: policy.dust_address.clone(),
        });
    }

    Ok((destinations, leftover))
}
