//! Coin selection.

use crate::model::OwnedOutput;
use murk_types::Amount;
use rand::Rng;

/// Outcome of coin selection: total value found and the coins in draw order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinSelection {
    pub found_money: Amount,
    pub coins: Vec<OwnedOutput>,
}

/// Pick coins totaling at least `needed` from the given outputs.
///
/// Outputs partition into a spendable pool (amount above the dust threshold)
/// and a dust pool. When `include_dust` is set and dust exists, the first
/// pick is forced from the dust pool; every later pick draws uniformly from
/// the spendable pool while it lasts, then falls back to dust. Selection
/// stops as soon as the total covers `needed` or both pools run dry — an
/// insufficient total is the caller's error to raise.
///
/// Callers pass only coins free of reservations; the selector never
/// re-checks.
pub fn select_coins<R: Rng>(
    rng: &mut R,
    outputs: &[OwnedOutput],
    needed: Amount,
    include_dust: bool,
    dust_threshold: Amount,
) -> CoinSelection {
    let mut spendable: Vec<usize> = Vec::new();
    let mut dust: Vec<usize> = Vec::new();
    for (i, out) in outputs.iter().enumerate() {
        if out.amount > dust_threshold {
            spendable.push(i);
        } else {
            dust.push(i);
        }
    }

    let mut select_one_dust = include_dust && !dust.is_empty();
    let mut found_money = Amount::ZERO;
    let mut coins = Vec::new();

    while found_money < needed && (!spendable.is_empty() || !dust.is_empty()) {
        let idx = if select_one_dust {
            select_one_dust = false;
            pop_random(rng, &mut dust)
        } else if !spendable.is_empty() {
            pop_random(rng, &mut spendable)
        } else {
            pop_random(rng, &mut dust)
        };
        found_money = found_money + outputs[idx].amount;
        coins.push(outputs[idx].clone());
    }

    CoinSelection { found_money, coins }
}

/// Remove and return a uniformly random element, O(1) via swap-with-last.
fn pop_random<T, R: Rng>(rng: &mut R, items: &mut Vec<T>) -> T {
    let idx = rng.gen_range(0..items.len());
    items.swap_remove(idx)
}
