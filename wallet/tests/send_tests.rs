//! End-to-end send pipeline tests against the nullable collaborators.

use std::sync::Arc;

use tokio::sync::mpsc;

use murk_nullables::{NullConstructor, NullDaemon};
use murk_types::{AccountAddress, AccountKeys, Amount, Currency, PublicKey, SecretKey};
use murk_wallet::{
    CancelSource, DaemonClient, MemoryOutputs, MemoryTransactionCache, OwnedOutput, SendRequest,
    SendingState, TransactionCache, TransactionConstructor, TransactionSender, Transfer,
    WalletError, WalletEvent,
};

// ── Harness ──────────────────────────────────────────────────────────────

struct Harness {
    sender: Arc<TransactionSender<MemoryTransactionCache, MemoryOutputs>>,
    daemon: Arc<NullDaemon>,
    constructor: Arc<NullConstructor>,
    events: mpsc::UnboundedReceiver<WalletEvent>,
    cancel: CancelSource,
}

fn wallet_keys() -> AccountKeys {
    AccountKeys {
        address: AccountAddress::new(PublicKey([0x0a; 32]), PublicKey([0x0b; 32])),
        view_secret: SecretKey([0x01; 32]),
        spend_secret: SecretKey([0x02; 32]),
    }
}

fn payee() -> AccountAddress {
    AccountAddress::new(PublicKey([0xb0; 32]), PublicKey([0xb1; 32]))
}

fn payee_text(currency: &Currency) -> String {
    payee().to_text(&currency.address_prefix)
}

fn coin(amount: u64, global_index: u64) -> OwnedOutput {
    OwnedOutput {
        amount: Amount::new(amount),
        global_index,
        key: PublicKey([global_index as u8; 32]),
        tx_public_key: PublicKey([0xcc; 32]),
        index_in_tx: 0,
        unlocked: true,
    }
}

/// Mainnet parameters with no dust threshold, so every decimal digit of an
/// amount becomes its own output.
fn zero_dust_currency() -> Currency {
    Currency {
        default_dust_threshold: 0,
        ..Currency::mainnet()
    }
}

fn harness_with(currency: Currency, coins: Vec<OwnedOutput>) -> Harness {
    let daemon = Arc::new(NullDaemon::new());
    let constructor = Arc::new(NullConstructor::new());
    let (events_tx, events) = mpsc::unbounded_channel();
    let cancel = CancelSource::new();
    let sender = Arc::new(TransactionSender::new(
        currency,
        wallet_keys(),
        MemoryTransactionCache::new(),
        MemoryOutputs::new(coins),
        Arc::clone(&daemon) as Arc<dyn DaemonClient>,
        Arc::clone(&constructor) as Arc<dyn TransactionConstructor>,
        events_tx,
        cancel.token(),
    ));
    Harness {
        sender,
        daemon,
        constructor,
        events,
        cancel,
    }
}

fn harness(coins: Vec<OwnedOutput>) -> Harness {
    harness_with(Currency::mainnet(), coins)
}

fn request(amount: u64, fee: u64, mixin: u64) -> SendRequest {
    SendRequest {
        transfers: vec![Transfer {
            address: payee_text(&Currency::mainnet()),
            amount: Amount::new(amount),
        }],
        fee: Amount::new(fee),
        mixin,
        unlock_time: 0,
        extra: Vec::new(),
    }
}

async fn next_event(h: &mut Harness) -> WalletEvent {
    h.events.recv().await.expect("event stream closed")
}

/// Give the detached pipeline room to run on the current-thread scheduler.
async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

// ── Happy path ───────────────────────────────────────────────────────────

#[tokio::test]
async fn send_pays_splits_change_and_reports_completion() {
    let mut h = harness_with(zero_dust_currency(), vec![coin(2_000, 11)]);
    let id = h
        .sender
        .send(request(1_000, 10, 0))
        .await
        .expect("send accepted");

    assert_eq!(
        next_event(&mut h).await,
        WalletEvent::BalanceUpdated {
            actual: Amount::ZERO,
            pending: Amount::new(990),
        }
    );
    assert_eq!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted {
            transaction: id,
            error: None,
        }
    );

    let relayed = h.daemon.relayed();
    assert_eq!(relayed.len(), 1);
    let tx = &relayed[0];

    // One output for the round payment, change 990 split into digits.
    let mut amounts: Vec<u64> = tx.outputs.iter().map(|out| out.amount.raw()).collect();
    amounts.sort_unstable();
    assert_eq!(amounts, vec![90, 900, 1_000]);
    assert!(tx
        .outputs
        .iter()
        .any(|out| out.amount.raw() == 1_000 && out.key == PublicKey([0xb0; 32])));
    assert!(tx
        .outputs
        .iter()
        .filter(|out| out.amount.raw() != 1_000)
        .all(|out| out.key == PublicKey([0x0a; 32])));

    let mut cache = h.sender.cache().await;
    let record = cache.transaction(id).expect("record exists");
    assert_eq!(record.sending_state, SendingState::Succeeded);
    assert_eq!(record.hash, tx.hash());
    assert_eq!(record.total_amount, -1_010);
}

#[tokio::test]
async fn dust_sweep_spends_a_dust_coin_without_decoys() {
    let mut h = harness(vec![coin(500, 1), coin(2_000_000, 2)]);
    h.sender
        .send(request(1_500_000, 10, 0))
        .await
        .expect("send accepted");

    let _balance = next_event(&mut h).await;
    let completed = next_event(&mut h).await;
    assert!(matches!(
        completed,
        WalletEvent::SendCompleted { error: None, .. }
    ));

    assert!(h.daemon.decoy_requests().is_empty());
    let relayed = h.daemon.relayed();
    assert_eq!(relayed.len(), 1);
    assert!(relayed[0]
        .inputs
        .iter()
        .any(|input| input.amount == Amount::new(500)));
}

#[tokio::test]
async fn decoy_requests_are_per_coin_and_rings_are_full() {
    let mut h = harness(vec![coin(600, 5), coin(700, 8)]);
    h.sender
        .send(request(1_200, 0, 2))
        .await
        .expect("send accepted");

    let _balance = next_event(&mut h).await;
    assert!(matches!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted { error: None, .. }
    ));

    let requests = h.daemon.decoy_requests();
    assert_eq!(requests.len(), 1);
    let (amounts, count) = &requests[0];
    assert_eq!(*count, 3);
    let mut raw: Vec<u64> = amounts.iter().map(|a| a.raw()).collect();
    raw.sort_unstable();
    assert_eq!(raw, vec![600, 700]);

    let relayed = h.daemon.relayed();
    assert_eq!(relayed[0].inputs.len(), 2);
    for input in &relayed[0].inputs {
        assert_eq!(input.key_offsets.len(), 3);
        let mut sorted = input.key_offsets.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, input.key_offsets);
    }
}

#[tokio::test]
async fn coins_sharing_an_index_across_amounts_spend_independently() {
    // Global indices are per amount, so index 7 names one coin in the 2000
    // denomination and another in the 5000 denomination.
    let twin = OwnedOutput {
        key: PublicKey([0xd5; 32]),
        ..coin(5_000, 7)
    };
    let mut h = harness(vec![coin(2_000, 7), twin]);

    h.sender
        .send(request(990, 10, 0))
        .await
        .expect("first send accepted");
    let _balance = next_event(&mut h).await;
    assert!(matches!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted { error: None, .. }
    ));

    // One coin is now spent for good; the same index under the other amount
    // must still be spendable.
    h.sender
        .send(request(490, 10, 0))
        .await
        .expect("second send accepted");
    let _balance = next_event(&mut h).await;
    assert!(matches!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted { error: None, .. }
    ));
    assert_eq!(h.daemon.relayed().len(), 2);
}

// ── Up-front rejections ──────────────────────────────────────────────────

#[tokio::test]
async fn zero_amount_is_rejected_before_any_record() {
    let mut h = harness(vec![coin(2_000, 1)]);
    let result = h.sender.send(request(0, 10, 0)).await;
    assert_eq!(result, Err(WalletError::ZeroDestination));

    settle().await;
    assert!(h.events.try_recv().is_err());
    assert_eq!(h.sender.cache().await.transaction_count(), 0);
}

#[tokio::test]
async fn empty_transfer_list_is_rejected() {
    let h = harness(vec![coin(2_000, 1)]);
    let result = h
        .sender
        .send(SendRequest {
            transfers: Vec::new(),
            fee: Amount::new(10),
            mixin: 0,
            unlock_time: 0,
            extra: Vec::new(),
        })
        .await;
    assert_eq!(result, Err(WalletError::ZeroDestination));
}

#[tokio::test]
async fn unparseable_address_is_rejected() {
    let h = harness(vec![coin(2_000, 1)]);
    let mut req = request(1_000, 10, 0);
    req.transfers[0].address = "not_an_address".into();
    let result = h.sender.send(req).await;
    assert_eq!(
        result,
        Err(WalletError::BadAddress("not_an_address".into()))
    );
    assert_eq!(h.sender.cache().await.transaction_count(), 0);
}

#[tokio::test]
async fn amount_above_money_supply_is_rejected() {
    let supply = Currency::mainnet().money_supply;
    let h = harness(vec![coin(2_000, 1)]);
    let result = h.sender.send(request(supply + 1, 0, 0)).await;
    assert_eq!(
        result,
        Err(WalletError::WrongAmount(Amount::new(supply + 1)))
    );
}

#[tokio::test]
async fn transfer_sum_overflow_is_rejected() {
    let supply = Currency::mainnet().money_supply;
    let h = harness(vec![coin(2_000, 1)]);
    let mut req = request(supply, 0, 0);
    req.transfers.push(req.transfers[0].clone());
    let result = h.sender.send(req).await;
    assert_eq!(result, Err(WalletError::SumOverflow));
}

#[tokio::test]
async fn needed_money_past_signed_range_is_rejected() {
    // A single transfer of the whole supply fits u64 but not a signed
    // record amount.
    let supply = Currency::mainnet().money_supply;
    let h = harness(vec![coin(2_000, 1)]);
    let result = h.sender.send(request(supply, 0, 0)).await;
    assert_eq!(result, Err(WalletError::SumOverflow));
}

#[tokio::test]
async fn insufficient_funds_reserves_nothing() {
    let mut h = harness(vec![coin(300, 1), coin(200, 2)]);
    let result = h.sender.send(request(1_000, 10, 0)).await;
    assert_eq!(
        result,
        Err(WalletError::InsufficientFunds {
            found: Amount::new(500),
            needed: Amount::new(1_010),
        })
    );
    assert_eq!(h.sender.cache().await.transaction_count(), 0);

    // The same coins are still free for an affordable send.
    h.sender
        .send(request(400, 10, 0))
        .await
        .expect("affordable send accepted");
    let _balance = next_event(&mut h).await;
    assert!(matches!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted { error: None, .. }
    ));
}

// ── Pipeline failures ────────────────────────────────────────────────────

#[tokio::test]
async fn scanty_decoys_fail_the_send_and_release_coins() {
    let mut h = harness(vec![coin(2_000, 7)]);
    h.daemon.set_candidates_per_amount(3);
    let id = h
        .sender
        .send(request(1_000, 10, 5))
        .await
        .expect("send accepted");

    assert_eq!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted {
            transaction: id,
            error: Some(WalletError::MixinCountTooBig {
                amount: Amount::new(2_000),
                got: 3,
                mixin: 5,
            }),
        }
    );
    assert!(h.daemon.relayed().is_empty());

    let mut cache = h.sender.cache().await;
    assert!(!cache.is_coin_reserved(&coin(2_000, 7)));
    assert!(matches!(
        cache.transaction(id).expect("record exists").sending_state,
        SendingState::Failed(WalletError::MixinCountTooBig { .. })
    ));
}

#[tokio::test]
async fn degenerate_mixin_still_gets_its_completion_event() {
    let mut h = harness(vec![coin(2_000, 7)]);
    h.daemon.set_candidates_per_amount(3);
    let id = h
        .sender
        .send(request(1_000, 10, u64::MAX))
        .await
        .expect("send accepted");

    assert_eq!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted {
            transaction: id,
            error: Some(WalletError::MixinCountTooBig {
                amount: Amount::new(2_000),
                got: 3,
                mixin: u64::MAX,
            }),
        }
    );
    // The ring size saturated instead of wrapping past zero.
    assert_eq!(h.daemon.decoy_requests()[0].1, u64::MAX);
    assert!(h.daemon.relayed().is_empty());
    assert!(!h.sender.cache().await.is_coin_reserved(&coin(2_000, 7)));
}

#[tokio::test]
async fn daemon_decoy_error_fails_the_send() {
    let mut h = harness(vec![coin(2_000, 7)]);
    h.daemon
        .fail_decoys_with(WalletError::Internal("node offline".into()));
    let id = h
        .sender
        .send(request(1_000, 10, 3))
        .await
        .expect("send accepted");

    assert_eq!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted {
            transaction: id,
            error: Some(WalletError::Internal("node offline".into())),
        }
    );
    assert!(h.daemon.relayed().is_empty());
}

#[tokio::test]
async fn construction_failure_fails_the_send() {
    let mut h = harness(vec![coin(2_000, 7)]);
    h.constructor.fail_with("no output keys");
    let id = h
        .sender
        .send(request(1_000, 10, 0))
        .await
        .expect("send accepted");

    // Failed before assembly, so no balance event precedes the completion.
    assert_eq!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted {
            transaction: id,
            error: Some(WalletError::ConstructionFailed("no output keys".into())),
        }
    );
    assert!(h.daemon.relayed().is_empty());
}

#[tokio::test]
async fn oversized_transaction_is_rejected() {
    let mut h = harness(vec![coin(2_000, 7)]);
    h.constructor.pad_transactions(40_000);
    let id = h
        .sender
        .send(request(1_000, 10, 0))
        .await
        .expect("send accepted");

    let completed = next_event(&mut h).await;
    match completed {
        WalletEvent::SendCompleted {
            transaction,
            error: Some(WalletError::TransactionTooBig { size, limit }),
        } => {
            assert_eq!(transaction, id);
            assert_eq!(limit, Currency::mainnet().max_transaction_size());
            assert!(size >= limit);
        }
        other => panic!("expected size rejection, got {other:?}"),
    }
    assert!(h.daemon.relayed().is_empty());
}

#[tokio::test]
async fn relay_failure_surfaces_in_the_completion() {
    let mut h = harness(vec![coin(2_000, 7)]);
    h.daemon
        .fail_relay_with(WalletError::Internal("relay refused".into()));
    let id = h
        .sender
        .send(request(1_000, 10, 0))
        .await
        .expect("send accepted");

    let _balance = next_event(&mut h).await;
    assert_eq!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted {
            transaction: id,
            error: Some(WalletError::Internal("relay refused".into())),
        }
    );

    let mut cache = h.sender.cache().await;
    assert!(!cache.is_coin_reserved(&coin(2_000, 7)));
    assert!(matches!(
        cache.transaction(id).expect("record exists").sending_state,
        SendingState::Failed(WalletError::Internal(_))
    ));
}

// ── Cancellation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn send_after_cancel_is_rejected() {
    let h = harness(vec![coin(2_000, 7)]);
    h.cancel.cancel();
    let result = h.sender.send(request(1_000, 10, 0)).await;
    assert_eq!(result, Err(WalletError::Cancelled));
    assert_eq!(h.sender.cache().await.transaction_count(), 0);
}

#[tokio::test]
async fn cancel_before_the_pipeline_runs_completes_cancelled() {
    let mut h = harness(vec![coin(2_000, 7)]);
    let id = h
        .sender
        .send(request(1_000, 10, 3))
        .await
        .expect("send accepted");
    h.cancel.cancel();

    assert_eq!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted {
            transaction: id,
            error: Some(WalletError::Cancelled),
        }
    );
    assert!(h.daemon.decoy_requests().is_empty());
    assert!(h.daemon.relayed().is_empty());
}

#[tokio::test]
async fn cancel_during_decoy_fetch_wins_over_the_response() {
    let mut h = harness(vec![coin(2_000, 7)]);
    let gate = h.daemon.gate_decoys();
    let id = h
        .sender
        .send(request(1_000, 10, 3))
        .await
        .expect("send accepted");

    settle().await;
    assert_eq!(h.daemon.decoy_requests().len(), 1);

    h.cancel.cancel();
    gate.notify_one();

    assert_eq!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted {
            transaction: id,
            error: Some(WalletError::Cancelled),
        }
    );
    assert!(h.daemon.relayed().is_empty());

    let mut cache = h.sender.cache().await;
    assert!(!cache.is_coin_reserved(&coin(2_000, 7)));
    assert_eq!(
        cache.transaction(id).expect("record exists").sending_state,
        SendingState::Cancelled
    );
}

#[tokio::test]
async fn cancel_during_decoy_fetch_wins_over_a_fetch_error() {
    let mut h = harness(vec![coin(2_000, 7)]);
    h.daemon
        .fail_decoys_with(WalletError::Internal("node offline".into()));
    let gate = h.daemon.gate_decoys();
    let id = h
        .sender
        .send(request(1_000, 10, 3))
        .await
        .expect("send accepted");

    settle().await;
    assert_eq!(h.daemon.decoy_requests().len(), 1);

    h.cancel.cancel();
    gate.notify_one();

    // The fetch came back as an error, but the stop was observed first.
    assert_eq!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted {
            transaction: id,
            error: Some(WalletError::Cancelled),
        }
    );
    assert!(h.daemon.relayed().is_empty());
    assert_eq!(
        h.sender
            .cache()
            .await
            .transaction(id)
            .expect("record exists")
            .sending_state,
        SendingState::Cancelled
    );
}

#[tokio::test]
async fn cancel_after_relay_reports_nothing() {
    let mut h = harness(vec![coin(2_000, 7)]);
    let gate = h.daemon.gate_relay();
    let id = h
        .sender
        .send(request(1_000, 10, 0))
        .await
        .expect("send accepted");

    // Assembly finished and published its balance update; the relay is now
    // parked on the gate.
    assert!(matches!(
        next_event(&mut h).await,
        WalletEvent::BalanceUpdated { .. }
    ));

    h.cancel.cancel();
    gate.notify_one();
    settle().await;

    // The transaction went out, but the outcome is unknowable: no
    // completion, and the record stays active.
    assert_eq!(h.daemon.relayed().len(), 1);
    assert!(h.events.try_recv().is_err());
    assert_eq!(
        h.sender
            .cache()
            .await
            .transaction(id)
            .expect("record exists")
            .sending_state,
        SendingState::Active
    );
}

// ── Concurrency ──────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_sends_cannot_reserve_the_same_coin() {
    let mut h = harness(vec![coin(2_000, 7)]);
    let first = h.sender.send(request(800, 10, 0));
    let second = h.sender.send(request(800, 10, 0));
    let (first, second) = tokio::join!(first, second);

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = outcomes
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one send must lose");
    assert_eq!(
        loser,
        &WalletError::InsufficientFunds {
            found: Amount::ZERO,
            needed: Amount::new(810),
        }
    );

    let _balance = next_event(&mut h).await;
    assert!(matches!(
        next_event(&mut h).await,
        WalletEvent::SendCompleted { error: None, .. }
    ));
    assert_eq!(h.daemon.relayed().len(), 1);
}
