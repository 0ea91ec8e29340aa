use murk_types::Amount;
use thiserror::Error;

/// Everything that can terminate a send.
///
/// Completion events carry one of these, so the enum is `Clone`/`Eq` and the
/// payloads stay plain data. Collaborator traits return the same kind so a
/// daemon failure flows into the completion event unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("transaction has no destinations")]
    ZeroDestination,

    #[error("transfer amount {0} is out of range")]
    WrongAmount(Amount),

    #[error("sum of transfer amounts overflows")]
    SumOverflow,

    #[error("bad destination address: {0}")]
    BadAddress(String),

    #[error("insufficient funds: found {found}, needed {needed}")]
    InsufficientFunds { found: Amount, needed: Amount },

    #[error("not enough decoys for amount {amount}: got {got}, mixin {mixin}")]
    MixinCountTooBig { amount: Amount, got: usize, mixin: u64 },

    #[error("transaction too big: {size} bytes, limit {limit}")]
    TransactionTooBig { size: u64, limit: u64 },

    #[error("transaction construction failed: {0}")]
    ConstructionFailed(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal wallet error: {0}")]
    Internal(String),
}
