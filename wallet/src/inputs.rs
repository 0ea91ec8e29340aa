//! Ring construction for selected coins.

use crate::daemon::DecoySet;
use crate::model::{GlobalOutput, OwnedOutput, SourceEntry};

/// Build one signing source per selected coin.
///
/// `decoy_sets` is positionally aligned with `selected`: set `i` holds the
/// candidates fetched for coin `i`'s amount. With `mixin == 0` the sets may
/// be empty and every ring is just the real output. Candidates are taken in
/// ascending global-index order, the coin's own index is skipped, and the
/// real output is inserted at its index rank so the ring stays sorted.
pub fn prepare_inputs(
    selected: &[OwnedOutput],
    decoy_sets: &[DecoySet],
    mixin: u64,
) -> Vec<SourceEntry> {
    let mut sources = Vec::with_capacity(selected.len());

    for (i, coin) in selected.iter().enumerate() {
        // A ring holds at most min(candidates, mixin) decoys plus the real
        // output.
        let set = decoy_sets.get(i);
        let available = set.map_or(0, |s| s.candidates.len());
        let mut ring: Vec<GlobalOutput> =
            Vec::with_capacity(available.min(mixin as usize) + 1);

        if let Some(set) = set {
            let mut candidates = set.candidates.clone();
            candidates.sort_by_key(|c| c.global_index);
            for candidate in candidates {
                if ring.len() as u64 >= mixin {
                    break;
                }
                if candidate.global_index == coin.global_index {
                    continue;
                }
                ring.push(candidate);
            }
        }

        let position = ring
            .iter()
            .position(|c| c.global_index >= coin.global_index)
            .unwrap_or(ring.len());
        ring.insert(
            position,
            GlobalOutput {
                global_index: coin.global_index,
                key: coin.key.clone(),
            },
        );

        sources.push(SourceEntry {
            amount: coin.amount,
            ring,
            real_output: position,
            real_output_tx_key: coin.tx_public_key.clone(),
            real_output_in_tx_index: coin.index_in_tx,
        });
    }

    sources
}
