//! The send pipeline — validation, coin selection, decoy fetch, assembly,
//! relay.
//!
//! [`TransactionSender::send`] validates the request and reserves coins
//! before it returns, so rejected sends leave no trace. Everything after
//! that runs on a spawned task: failures past the spawn point surface
//! through the event channel as a `SendCompleted` carrying the error, never
//! as a return value.

use std::sync::Arc;

use rand::thread_rng;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use murk_types::{AccountKeys, Amount, Currency};

use crate::cache::{TransactionCache, TransactionId};
use crate::cancel::CancelToken;
use crate::daemon::{DaemonClient, DecoySet};
use crate::error::WalletError;
use crate::events::WalletEvent;
use crate::inputs::prepare_inputs;
use crate::model::{DestinationEntry, DustPolicy, OwnedOutput, Transfer};
use crate::outputs::{BalanceFilter, OutputSource};
use crate::selector::select_coins;
use crate::split::split_destinations;
use crate::transaction::{assemble, Transaction, TransactionConstructor};

/// Parameters of one send.
#[derive(Clone, Debug)]
pub struct SendRequest {
    pub transfers: Vec<Transfer>,
    pub fee: Amount,
    /// Ring size minus one: decoys requested per input. Zero disables
    /// decoys and lets selection sweep dust.
    pub mixin: u64,
    pub unlock_time: u64,
    pub extra: Vec<u8>,
}

/// Pipeline progress markers, traced at each transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SendPhase {
    CoinsSelected,
    DecoysRequested,
    InputsPrepared,
    Assembled,
    Relayed,
}

/// State a send carries from acceptance to completion.
struct SendContext {
    id: TransactionId,
    mixin: u64,
    selected: Vec<OwnedOutput>,
    found_money: Amount,
    dust_policy: DustPolicy,
    decoys: Vec<DecoySet>,
}

/// The wallet's send engine.
///
/// Owns the cache behind one mutex; coin selection and record creation run
/// under a single acquisition so concurrent sends never reserve the same
/// coin. The daemon and the construction primitive are injected, which is
/// what the null collaborators hook in tests.
pub struct TransactionSender<C, O> {
    currency: Currency,
    keys: AccountKeys,
    cache: Mutex<C>,
    outputs: O,
    daemon: Arc<dyn DaemonClient>,
    constructor: Arc<dyn TransactionConstructor>,
    events: mpsc::UnboundedSender<WalletEvent>,
    cancel: CancelToken,
    size_limit: u64,
}

impl<C, O> TransactionSender<C, O>
where
    C: TransactionCache + 'static,
    O: OutputSource + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        currency: Currency,
        keys: AccountKeys,
        cache: C,
        outputs: O,
        daemon: Arc<dyn DaemonClient>,
        constructor: Arc<dyn TransactionConstructor>,
        events: mpsc::UnboundedSender<WalletEvent>,
        cancel: CancelToken,
    ) -> Self {
        let size_limit = currency.max_transaction_size();
        Self {
            currency,
            keys,
            cache: Mutex::new(cache),
            outputs,
            daemon,
            constructor,
            events,
            cancel,
            size_limit,
        }
    }

    /// Direct access to the send history, serialized with the pipeline.
    pub async fn cache(&self) -> tokio::sync::MutexGuard<'_, C> {
        self.cache.lock().await
    }

    /// Start a send.
    ///
    /// Validation, coin selection and record creation happen before this
    /// returns: an `Err` here means nothing was recorded or reserved. On
    /// `Ok` the rest of the pipeline runs detached and finishes with
    /// exactly one `SendCompleted` for the returned id — unless a
    /// cancellation lands after the relay went out, in which case the
    /// outcome is unknowable and nothing is reported.
    pub async fn send(
        self: &Arc<Self>,
        request: SendRequest,
    ) -> Result<TransactionId, WalletError> {
        if self.cancel.is_cancelled() {
            return Err(WalletError::Cancelled);
        }
        let ctx = self.begin_send(&request).await?;
        let id = ctx.id;
        self.trace_phase(id, SendPhase::CoinsSelected);
        debug!(
            transaction = %id,
            coins = ctx.selected.len(),
            found = %ctx.found_money,
            "send accepted"
        );
        tokio::spawn(Arc::clone(self).run_pipeline(ctx));
        Ok(id)
    }

    /// Validate the request, pick coins and create the pending record, all
    /// under one cache acquisition.
    async fn begin_send(&self, request: &SendRequest) -> Result<SendContext, WalletError> {
        if request.transfers.is_empty() {
            return Err(WalletError::ZeroDestination);
        }
        for transfer in &request.transfers {
            validate_destination_address(&self.currency, &transfer.address)?;
        }

        let mut needed = request.fee;
        for transfer in &request.transfers {
            if transfer.amount.is_zero() {
                return Err(WalletError::ZeroDestination);
            }
            if transfer.amount.raw() > self.currency.money_supply {
                return Err(WalletError::WrongAmount(transfer.amount));
            }
            needed = needed
                .checked_add(transfer.amount)
                .ok_or(WalletError::SumOverflow)?;
        }
        // Records store the net amount signed; past i64 it cannot.
        if needed.raw() > i64::MAX as u64 {
            return Err(WalletError::SumOverflow);
        }

        let mut cache = self.cache.lock().await;
        let candidates: Vec<OwnedOutput> = self
            .outputs
            .unlocked_outputs()
            .into_iter()
            .filter(|coin| !cache.is_coin_reserved(coin))
            .collect();

        let dust_threshold = Amount::new(self.currency.default_dust_threshold);
        // ThreadRng is not Send; nothing may await while it lives.
        let mut rng = thread_rng();
        let selection = select_coins(
            &mut rng,
            &candidates,
            needed,
            request.mixin == 0,
            dust_threshold,
        );
        if selection.found_money < needed {
            return Err(WalletError::InsufficientFunds {
                found: selection.found_money,
                needed,
            });
        }

        let id = cache.add_pending_transaction(
            -(needed.raw() as i64),
            request.fee,
            &request.extra,
            &request.transfers,
            request.unlock_time,
            &selection.coins,
        );

        Ok(SendContext {
            id,
            mixin: request.mixin,
            selected: selection.coins,
            found_money: selection.found_money,
            dust_policy: DustPolicy::new(dust_threshold, true, self.keys.address.clone()),
            decoys: Vec::new(),
        })
    }

    async fn run_pipeline(self: Arc<Self>, mut ctx: SendContext) {
        let id = ctx.id;
        if self.cancel.is_cancelled() {
            return self.complete(id, Some(WalletError::Cancelled)).await;
        }

        if ctx.mixin > 0 {
            self.trace_phase(id, SendPhase::DecoysRequested);
            let amounts: Vec<Amount> = ctx.selected.iter().map(|coin| coin.amount).collect();
            let fetched = self
                .daemon
                .random_outputs(&amounts, ctx.mixin.saturating_add(1))
                .await;
            // A cancel that lands while the call is in flight wins over
            // whatever the daemon returned.
            if self.cancel.is_cancelled() {
                return self.complete(id, Some(WalletError::Cancelled)).await;
            }
            let sets = match fetched {
                Ok(sets) => sets,
                Err(error) => return self.complete(id, Some(error)).await,
            };
            if sets.len() != amounts.len() {
                let error = WalletError::Internal(format!(
                    "daemon returned {} decoy sets for {} requests",
                    sets.len(),
                    amounts.len()
                ));
                return self.complete(id, Some(error)).await;
            }
            // Judged on the raw response, before the coin's own index is
            // dropped from the candidates.
            if let Some(scanty) = sets
                .iter()
                .find(|set| (set.candidates.len() as u64) < ctx.mixin)
            {
                let error = WalletError::MixinCountTooBig {
                    amount: scanty.amount,
                    got: scanty.candidates.len(),
                    mixin: ctx.mixin,
                };
                return self.complete(id, Some(error)).await;
            }
            ctx.decoys = sets;
        }

        if self.cancel.is_cancelled() {
            return self.complete(id, Some(WalletError::Cancelled)).await;
        }
        let tx = match self.assemble_and_record(&ctx).await {
            Ok(tx) => tx,
            Err(error) => return self.complete(id, Some(error)).await,
        };

        self.trace_phase(id, SendPhase::Relayed);
        let relayed = self.daemon.relay_transaction(&tx).await;
        if self.cancel.is_cancelled() {
            // The transaction may already be on the network. Leave the
            // record alone and report nothing.
            debug!(transaction = %id, "cancelled after relay, dropping result");
            return;
        }
        self.complete(id, relayed.err()).await;
    }

    /// Build rings, split destinations, construct the transaction and stamp
    /// the record with its hash. One cache acquisition end to end.
    async fn assemble_and_record(&self, ctx: &SendContext) -> Result<Transaction, WalletError> {
        let mut cache = self.cache.lock().await;
        let record = cache
            .transaction(ctx.id)
            .ok_or_else(|| WalletError::Internal(format!("no record for transaction {}", ctx.id)))?;
        let needed = Amount::new(record.total_amount.unsigned_abs());
        let extra = record.extra.clone();
        let unlock_time = record.unlock_time;
        let first_transfer = record.first_transfer;
        let transfer_count = record.transfer_count;
        let transfers = cache.transfer_range(first_transfer, transfer_count).to_vec();

        self.trace_phase(ctx.id, SendPhase::InputsPrepared);
        let sources = prepare_inputs(&ctx.selected, &ctx.decoys, ctx.mixin);

        let change = if ctx.found_money > needed {
            Some(DestinationEntry {
                amount: ctx.found_money - needed,
                address: self.keys.address.clone(),
            })
        } else {
            None
        };
        let (destinations, withheld) =
            split_destinations(&self.currency, &transfers, change, &ctx.dust_policy)?;
        if !withheld.is_zero() {
            debug!(transaction = %ctx.id, dust = %withheld, "change dust folded into fee");
        }

        self.trace_phase(ctx.id, SendPhase::Assembled);
        let tx = assemble(
            self.constructor.as_ref(),
            &self.keys,
            &sources,
            &destinations,
            &extra,
            unlock_time,
            self.size_limit,
        )?;

        let hash = tx.hash();
        let record = cache
            .transaction(ctx.id)
            .ok_or_else(|| WalletError::Internal(format!("no record for transaction {}", ctx.id)))?;
        record.hash = hash;
        debug!(
            transaction = %ctx.id,
            hash = %hash,
            size = tx.blob_size(),
            "transaction assembled"
        );

        self.notify_balance(&mut cache);
        Ok(tx)
    }

    /// Finalize the record and emit the completion event, in that order.
    async fn complete(&self, id: TransactionId, error: Option<WalletError>) {
        match &error {
            Some(error) => warn!(transaction = %id, %error, "send failed"),
            None => info!(transaction = %id, "send succeeded"),
        }
        let mut cache = self.cache.lock().await;
        cache.mark_send_result(id, error.clone());
        drop(cache);
        let _ = self.events.send(WalletEvent::SendCompleted {
            transaction: id,
            error,
        });
    }

    /// Emit spendable and pending totals adjusted for in-flight sends:
    /// reserved coins are not spendable, and their change is pending until
    /// it lands.
    fn notify_balance(&self, cache: &mut C) {
        let outs = cache.unconfirmed_outs_total();
        let sent = cache.unconfirmed_sent_total();
        let actual = self
            .outputs
            .balance(BalanceFilter::Unlocked)
            .saturating_sub(outs);
        let pending =
            self.outputs.balance(BalanceFilter::LockedOrPending) + outs.saturating_sub(sent);
        let _ = self
            .events
            .send(WalletEvent::BalanceUpdated { actual, pending });
    }

    fn trace_phase(&self, id: TransactionId, phase: SendPhase) {
        debug!(transaction = %id, ?phase, "send phase");
    }
}

/// Check a destination string against the network's address format.
pub fn validate_destination_address(
    currency: &Currency,
    address: &str,
) -> Result<(), WalletError> {
    currency
        .parse_address(address)
        .map(|_| ())
        .ok_or_else(|| WalletError::BadAddress(address.to_string()))
}
