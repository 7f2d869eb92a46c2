//! The polling state machine.

use crate::handle::{WatchControl, WatchHandle, WatchId, WatchState};
use crate::{select_match, WatchConfig, WatchError};
use selfproof_explorer::{ExplorerError, LedgerQueryClient};
use selfproof_types::{Amount, Timestamp, Transaction, WalletAddress};
use selfproof_utils::format_duration;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::Instrument;

/// What to watch for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchRequest {
    /// Both sender and recipient of the expected self-payment.
    pub address: WalletAddress,
    pub expected_amount: Amount,
    /// Payments timestamped before this are never accepted.
    pub not_before: Timestamp,
}

/// Terminal result delivered to the callbacks. Cancellation delivers nothing.
#[derive(Debug)]
pub enum WatchOutcome {
    Confirmed(Transaction),
    TimedOut { attempts: u32 },
    Errored(WatchError),
}

type Deliver = Box<dyn FnOnce(WatchOutcome) + Send + 'static>;

/// The three terminal callbacks of a watch. At most one of them runs, once.
pub struct WatchCallbacks {
    deliver: Deliver,
}

impl WatchCallbacks {
    pub fn new(
        on_match: impl FnOnce(Transaction) + Send + 'static,
        on_timeout: impl FnOnce(u32) + Send + 'static,
        on_error: impl FnOnce(WatchError) + Send + 'static,
    ) -> Self {
        Self::from_outcome(move |outcome| match outcome {
            WatchOutcome::Confirmed(tx) => on_match(tx),
            WatchOutcome::TimedOut { attempts } => on_timeout(attempts),
            WatchOutcome::Errored(err) => on_error(err),
        })
    }

    /// A single callback that receives whichever outcome occurs.
    pub fn from_outcome(deliver: impl FnOnce(WatchOutcome) + Send + 'static) -> Self {
        Self {
            deliver: Box::new(deliver),
        }
    }

    fn deliver(self, outcome: WatchOutcome) {
        (self.deliver)(outcome)
    }
}

/// Starts watches against one ledger client. Each watch runs as its own task.
pub struct VerificationWatcher {
    client: Arc<dyn LedgerQueryClient>,
    config: WatchConfig,
    next_id: AtomicU64,
}

impl VerificationWatcher {
    pub fn new(client: Arc<dyn LedgerQueryClient>, config: WatchConfig) -> Self {
        Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Spawn a watch. Must be called from within a tokio runtime.
    pub fn start(&self, request: WatchRequest, callbacks: WatchCallbacks) -> WatchHandle {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let control = Arc::new(WatchControl::new());
        let span = tracing::info_span!("watch", watch = %id, address = %request.address);
        let task = tokio::spawn(
            run_watch(
                Arc::clone(&self.client),
                self.config.clone(),
                request,
                Arc::clone(&control),
                callbacks,
            )
            .instrument(span),
        );
        WatchHandle::new(id, control, task)
    }

    /// Spawn a watch whose outcome arrives on a channel.
    ///
    /// The receiver errors if the watch was cancelled.
    pub fn start_with_outcome(
        &self,
        request: WatchRequest,
    ) -> (WatchHandle, oneshot::Receiver<WatchOutcome>) {
        let (tx, rx) = oneshot::channel();
        let handle = self.start(
            request,
            WatchCallbacks::from_outcome(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
        (handle, rx)
    }

    /// Cancel a watch started by this watcher. Idempotent.
    pub fn cancel(&self, handle: &WatchHandle) -> bool {
        handle.cancel()
    }
}

async fn run_watch(
    client: Arc<dyn LedgerQueryClient>,
    config: WatchConfig,
    request: WatchRequest,
    control: Arc<WatchControl>,
    callbacks: WatchCallbacks,
) {
    tracing::info!(
        expected = %request.expected_amount,
        not_before = %request.not_before,
        max_attempts = config.max_attempts,
        "watch started"
    );

    let mut last_error: Option<ExplorerError> = None;

    for attempt in 1..=config.max_attempts {
        tokio::select! {
            biased;
            _ = control.wake.notified() => return,
            _ = tokio::time::sleep(config.poll_interval) => {}
        }
        if control.is_cancelled() {
            return;
        }

        control.record_attempt(attempt);
        tracing::debug!(attempt, "polling ledger");

        let fetched = tokio::select! {
            biased;
            _ = control.wake.notified() => return,
            res = client.fetch_recent_transactions(&request.address, config.fetch_limit) => res,
        };

        match fetched {
            Ok(txs) => {
                last_error = None;
                if let Some(tx) = select_match(&txs, &request, config.tolerance) {
                    let tx = tx.clone();
                    if control.try_finish(WatchState::Confirmed) {
                        tracing::info!(attempt, tx = %tx.id, "self-payment confirmed");
                        callbacks.deliver(WatchOutcome::Confirmed(tx));
                    }
                    return;
                }
            }
            Err(err) if err.is_transient() => {
                tracing::warn!(attempt, error = %err, "ledger query failed, retrying");
                last_error = Some(err);
            }
            Err(err) => {
                if control.try_finish(WatchState::Errored) {
                    tracing::warn!(attempt, error = %err, "ledger rejected query");
                    callbacks.deliver(WatchOutcome::Errored(WatchError::Rejected {
                        attempt,
                        source: err,
                    }));
                }
                return;
            }
        }
    }

    let attempts = config.max_attempts;
    match last_error {
        Some(source) => {
            if control.try_finish(WatchState::Errored) {
                tracing::warn!(attempts, error = %source, "ledger unreachable, giving up");
                callbacks.deliver(WatchOutcome::Errored(WatchError::Transport {
                    attempts,
                    source,
                }));
            }
        }
        None => {
            if control.try_finish(WatchState::TimedOut) {
                tracing::info!(
                    attempts,
                    budget = %format_duration(config.budget()),
                    "no matching self-payment, watch timed out"
                );
                callbacks.deliver(WatchOutcome::TimedOut { attempts });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfproof_nullables::NullLedgerClient;
    use selfproof_types::TxId;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;
    use tokio::time::Instant;

    const T0_SECS: u64 = 1_700_000_000;

    fn addr() -> WalletAddress {
        WalletAddress::new("kaspa:abc")
    }

    fn request() -> WatchRequest {
        WatchRequest {
            address: addr(),
            expected_amount: Amount::from_native(1),
            not_before: Timestamp::from_secs(T0_SECS),
        }
    }

    fn self_payment(id: &str, at: Timestamp, amount: Amount) -> Transaction {
        Transaction {
            id: TxId::new(id),
            timestamp: at,
            from: Some(addr()),
            to: addr(),
            amount,
        }
    }

    fn watcher(ledger: &Arc<NullLedgerClient>) -> VerificationWatcher {
        VerificationWatcher::new(ledger.clone(), WatchConfig::default())
    }

    /// Counts every callback invocation, by kind.
    #[derive(Default)]
    struct Fired {
        matched: AtomicU32,
        timed_out: AtomicU32,
        errored: AtomicU32,
    }

    impl Fired {
        fn total(&self) -> u32 {
            self.matched.load(Ordering::SeqCst)
                + self.timed_out.load(Ordering::SeqCst)
                + self.errored.load(Ordering::SeqCst)
        }

        fn callbacks(self: &Arc<Self>) -> WatchCallbacks {
            let (a, b, c) = (self.clone(), self.clone(), self.clone());
            WatchCallbacks::new(
                move |_| {
                    a.matched.fetch_add(1, Ordering::SeqCst);
                },
                move |_| {
                    b.timed_out.fetch_add(1, Ordering::SeqCst);
                },
                move |_| {
                    c.errored.fetch_add(1, Ordering::SeqCst);
                },
            )
        }
    }

    #[tokio::test(start_paused = true)]
    async fn payment_before_window_is_ignored_then_fresh_one_confirms() {
        let ledger = Arc::new(NullLedgerClient::new());
        let t0 = Timestamp::from_secs(T0_SECS);
        ledger.add_transaction(self_payment("old", t0.minus_millis(5_000), Amount::from_native(1)));

        let (handle, outcome) = watcher(&ledger).start_with_outcome(request());

        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(ledger.calls(), 2);
        assert_eq!(handle.state(), WatchState::Running);

        ledger.add_transaction(self_payment("fresh", t0.plus_millis(5_000), Amount::from_native(1)));
        match outcome.await.unwrap() {
            WatchOutcome::Confirmed(tx) => {
                assert_eq!(tx.id, TxId::new("fresh"));
                assert!(tx.timestamp >= t0);
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
        assert_eq!(handle.state(), WatchState::Confirmed);
        assert_eq!(handle.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_exactly_at_attempt_budget() {
        let ledger = Arc::new(NullLedgerClient::new());
        ledger.add_transaction(self_payment(
            "wrong-amount",
            Timestamp::from_secs(T0_SECS + 1),
            Amount::from_native(2),
        ));
        let start = Instant::now();

        let (handle, outcome) = watcher(&ledger).start_with_outcome(request());
        match outcome.await.unwrap() {
            WatchOutcome::TimedOut { attempts } => assert_eq!(attempts, 200),
            other => panic!("expected timeout, got {other:?}"),
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(600), "gave up early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(601), "gave up late: {elapsed:?}");
        assert_eq!(ledger.calls(), 200);
        assert_eq!(handle.attempts(), 200);
        assert_eq!(handle.state(), WatchState::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_first_poll_suppresses_all_callbacks() {
        let ledger = Arc::new(NullLedgerClient::new());
        ledger.add_transaction(self_payment(
            "match",
            Timestamp::from_secs(T0_SECS + 1),
            Amount::from_native(1),
        ));
        let fired = Arc::new(Fired::default());

        let w = watcher(&ledger);
        let handle = w.start(request(), fired.callbacks());
        assert!(w.cancel(&handle));
        assert!(!handle.cancel());

        tokio::time::sleep(Duration::from_secs(700)).await;
        assert_eq!(fired.total(), 0);
        assert_eq!(ledger.calls(), 0);
        assert_eq!(handle.state(), WatchState::Cancelled);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_mid_watch_from_another_task() {
        let ledger = Arc::new(NullLedgerClient::new());
        let fired = Arc::new(Fired::default());
        let handle = watcher(&ledger).start(request(), fired.callbacks());

        tokio::time::sleep(Duration::from_secs(10)).await;
        let canceller = handle.canceller();
        assert!(tokio::spawn(async move { canceller.cancel() }).await.unwrap());

        ledger.add_transaction(self_payment(
            "too-late",
            Timestamp::from_secs(T0_SECS + 20),
            Amount::from_native(1),
        ));
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.total(), 0);
        assert_eq!(ledger.calls(), 3);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_watch_drops_outcome_sender() {
        let ledger = Arc::new(NullLedgerClient::new());
        let (handle, outcome) = watcher(&ledger).start_with_outcome(request());
        handle.cancel();
        assert!(outcome.await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_silently() {
        let ledger = Arc::new(NullLedgerClient::new());
        ledger.fail_next(ExplorerError::Transport("connection reset".into()));
        ledger.fail_next(ExplorerError::Status(503));
        ledger.add_transaction(self_payment(
            "ok",
            Timestamp::from_secs(T0_SECS + 1),
            Amount::from_native(1),
        ));

        let (handle, outcome) = watcher(&ledger).start_with_outcome(request());
        assert!(matches!(outcome.await.unwrap(), WatchOutcome::Confirmed(_)));
        assert_eq!(handle.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_transport_failure_errors_after_budget() {
        let ledger = Arc::new(NullLedgerClient::new());
        ledger.fail_always("dns failure");
        let config = WatchConfig {
            max_attempts: 5,
            ..WatchConfig::default()
        };
        let (_handle, outcome) =
            VerificationWatcher::new(ledger.clone(), config).start_with_outcome(request());

        match outcome.await.unwrap() {
            WatchOutcome::Errored(WatchError::Transport { attempts, .. }) => {
                assert_eq!(attempts, 5)
            }
            other => panic!("expected transport error, got {other:?}"),
        }
        assert_eq!(ledger.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_error_ends_watch_immediately() {
        let ledger = Arc::new(NullLedgerClient::new());
        ledger.fail_next(ExplorerError::Status(400));
        let (_handle, outcome) = watcher(&ledger).start_with_outcome(request());
        match outcome.await.unwrap() {
            WatchOutcome::Errored(WatchError::Rejected { attempt, .. }) => assert_eq!(attempt, 1),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(ledger.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_response_ends_watch_on_first_attempt() {
        let ledger = Arc::new(NullLedgerClient::new());
        ledger.fail_next(ExplorerError::Decode("missing field `outputs`".into()));
        let config = WatchConfig {
            max_attempts: 3,
            ..WatchConfig::default()
        };
        let (handle, outcome) =
            VerificationWatcher::new(ledger.clone(), config).start_with_outcome(request());
        match outcome.await.unwrap() {
            WatchOutcome::Errored(WatchError::Rejected { attempt, source }) => {
                assert_eq!(attempt, 1);
                assert!(matches!(source, ExplorerError::Decode(_)));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(ledger.calls(), 1);
        assert_eq!(handle.state(), WatchState::Errored);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_push_feed_ends_watch_without_burning_budget() {
        let (sender, feed) = selfproof_explorer::push_feed(8);
        drop(sender);
        let started = Instant::now();
        let (_handle, outcome) = VerificationWatcher::new(Arc::new(feed), WatchConfig::default())
            .start_with_outcome(request());
        match outcome.await.unwrap() {
            WatchOutcome::Errored(WatchError::Rejected { attempt, source }) => {
                assert_eq!(attempt, 1);
                assert!(matches!(source, ExplorerError::SubscriptionClosed));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn confirms_at_most_once() {
        let ledger = Arc::new(NullLedgerClient::new());
        for i in 0..3 {
            ledger.add_transaction(self_payment(
                &format!("m{i}"),
                Timestamp::from_secs(T0_SECS + i),
                Amount::from_native(1),
            ));
        }
        let fired = Arc::new(Fired::default());
        let handle = watcher(&ledger).start(request(), fired.callbacks());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fired.matched.load(Ordering::SeqCst), 1);
        assert_eq!(fired.total(), 1);
        assert_eq!(ledger.calls(), 1);
        assert!(!handle.cancel());
    }
}
