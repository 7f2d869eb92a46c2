//! The per-key verification state machine.

use selfproof_explorer::LedgerQueryClient;
use selfproof_signing::{SignatureIssuer, SignedMessage, VerificationMessage};
use selfproof_trust::{AppendMode, RecordDraft, TrustError, TrustLedger, WalletRegistry};
use selfproof_types::{Clock, Transaction, VerificationRecord, WalletBinding};
use selfproof_watcher::{VerificationWatcher, WatchCanceller, WatchOutcome, WatchRequest};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{oneshot, Notify};
use tracing::Instrument;

use crate::{
    ConfigError, CoordinatorConfig, CoordinatorError, CoordinatorMetrics, FlowKey, FlowOutcome, FlowPhase,
    FlowRequest, GatedEffects, VerificationFlow,
};

/// Caller's handle to a started flow.
pub struct FlowHandle {
    key: FlowKey,
    outcome: oneshot::Receiver<FlowOutcome>,
}

impl FlowHandle {
    pub fn key(&self) -> &FlowKey {
        &self.key
    }

    /// Wait for the terminal state. The key is idle again once this resolves.
    pub async fn outcome(self) -> FlowOutcome {
        self.outcome.await.unwrap_or(FlowOutcome::Cancelled)
    }
}

/// Cancellation shared between [`VerificationCoordinator::cancel`] and the flow task.
struct FlowControl {
    cancelled: AtomicBool,
    wake: Notify,
    /// Set once the flow is watching. Guarded so that a cancel either sees the
    /// watch or the flow sees the cancel before starting one.
    watch: Mutex<Option<WatchCanceller>>,
}

impl FlowControl {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            wake: Notify::new(),
            watch: Mutex::new(None),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// False if already cancelled, or if the watch has already reached a
    /// terminal state of its own.
    fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.wake.notify_one();
        let watch = self.watch.lock().unwrap_or_else(PoisonError::into_inner);
        match watch.as_ref() {
            Some(canceller) => canceller.cancel(),
            None => true,
        }
    }

    async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.wake.notified().await;
        }
    }
}

struct ActiveFlow {
    id: u64,
    phase: FlowPhase,
    control: Arc<FlowControl>,
}

struct Inner {
    config: CoordinatorConfig,
    issuer: SignatureIssuer,
    watcher: VerificationWatcher,
    ledger: Arc<TrustLedger>,
    registry: Arc<WalletRegistry>,
    effects: Arc<dyn GatedEffects>,
    clock: Arc<dyn Clock>,
    metrics: CoordinatorMetrics,
    flows: Mutex<HashMap<FlowKey, ActiveFlow>>,
    next_flow: AtomicU64,
}

/// Runs verification flows, at most one per (owner, action).
///
/// Cheap to clone; clones share the same flows.
#[derive(Clone)]
pub struct VerificationCoordinator {
    inner: Arc<Inner>,
}

impl VerificationCoordinator {
    /// Fails if `config` is invalid or `ledger` was built with another
    /// metrics policy; use [`CoordinatorConfig::trust_ledger`] to build it.
    pub fn new(
        config: CoordinatorConfig,
        issuer: SignatureIssuer,
        client: Arc<dyn LedgerQueryClient>,
        ledger: Arc<TrustLedger>,
        registry: Arc<WalletRegistry>,
        effects: Arc<dyn GatedEffects>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoordinatorError> {
        config.validate()?;
        if ledger.policy() != config.metrics_policy {
            return Err(ConfigError::Invalid {
                field: "metrics_policy",
                reason: "trust ledger was built with a different policy",
            }
            .into());
        }
        let watcher = VerificationWatcher::new(client, config.watch_config());
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                issuer,
                watcher,
                ledger,
                registry,
                effects,
                clock,
                metrics: CoordinatorMetrics::new(),
                flows: Mutex::new(HashMap::new()),
                next_flow: AtomicU64::new(1),
            }),
        })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> &CoordinatorMetrics {
        &self.inner.metrics
    }

    pub fn ledger(&self) -> &Arc<TrustLedger> {
        &self.inner.ledger
    }

    /// Start a flow. Must be called from within a tokio runtime.
    ///
    /// Fails without side effects if the key is busy, the wallet is not
    /// connected, the content is already published, or the wallet already has
    /// a genesis and the request does not replace it.
    pub fn start(&self, request: FlowRequest) -> Result<FlowHandle, CoordinatorError> {
        let inner = &self.inner;
        let key = request.key();

        let binding = inner
            .registry
            .active_binding(&request.owner_id, request.wallet_type)?
            .ok_or_else(|| CoordinatorError::NoBinding {
                owner: request.owner_id.clone(),
                wallet_type: request.wallet_type,
            })?;
        match &request.flow {
            VerificationFlow::PublishBySelfPay { content_id } => {
                if inner.effects.is_published(content_id)? {
                    return Err(CoordinatorError::AlreadyPublished(content_id.clone()));
                }
            }
            VerificationFlow::GenesisVerification { replace: false, .. } => {
                if inner
                    .ledger
                    .genesis_for(&request.owner_id, request.wallet_type)?
                    .is_some()
                {
                    return Err(TrustError::DuplicateGenesis {
                        owner: request.owner_id.clone(),
                        wallet_type: request.wallet_type,
                    }
                    .into());
                }
            }
            VerificationFlow::GenesisVerification { replace: true, .. } => {}
        }

        let id = inner.next_flow.fetch_add(1, Ordering::Relaxed);
        let control = Arc::new(FlowControl::new());
        {
            let mut flows = inner.flows.lock().unwrap_or_else(PoisonError::into_inner);
            if flows.contains_key(&key) {
                inner.metrics.flows_rejected_in_progress.inc();
                tracing::warn!(flow = %key, "verification already in progress");
                return Err(CoordinatorError::AlreadyInProgress(key));
            }
            flows.insert(
                key.clone(),
                ActiveFlow {
                    id,
                    phase: FlowPhase::AwaitingSignature,
                    control: Arc::clone(&control),
                },
            );
        }
        inner.metrics.flows_started.inc();
        inner.metrics.active_flows.inc();

        let (done, outcome) = oneshot::channel();
        let span = tracing::info_span!("flow", flow = %key, id);
        tokio::spawn(
            run_flow(Arc::clone(inner), key.clone(), id, binding, request, control, done)
                .instrument(span),
        );
        Ok(FlowHandle { key, outcome })
    }

    /// Current phase of the flow for `key`.
    pub fn status(&self, key: &FlowKey) -> FlowPhase {
        self.inner
            .flows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map_or(FlowPhase::Idle, |flow| flow.phase)
    }

    /// Cancel the flow for `key`. Idempotent.
    ///
    /// Returns `true` if this call stopped the flow, which then resolves as
    /// [`FlowOutcome::Cancelled`]. A flow whose payment was already seen runs
    /// to completion.
    pub fn cancel(&self, key: &FlowKey) -> bool {
        let control = {
            let flows = self
                .inner
                .flows
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match flows.get(key) {
                Some(flow) => Arc::clone(&flow.control),
                None => return false,
            }
        };
        let cancelled = control.cancel();
        if cancelled {
            tracing::info!(flow = %key, "verification cancelled");
        }
        cancelled
    }

    /// Number of flows signing or watching.
    pub fn active_flows(&self) -> usize {
        self.inner
            .flows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

async fn run_flow(
    inner: Arc<Inner>,
    key: FlowKey,
    id: u64,
    binding: WalletBinding,
    request: FlowRequest,
    control: Arc<FlowControl>,
    done: oneshot::Sender<FlowOutcome>,
) {
    tracing::info!(
        wallet_type = %binding.wallet_type,
        address = %binding.address,
        "verification flow started"
    );
    let outcome = inner.drive(&key, id, &binding, request, &control).await;

    inner.release(&key, id);
    inner.metrics.active_flows.dec();
    inner.metrics.record_outcome(&outcome);
    match &outcome {
        FlowOutcome::Confirmed {
            record,
            transaction,
        } => tracing::info!(record = %record.id, tx = %transaction.id, "verification confirmed"),
        FlowOutcome::TimedOut { attempts } => {
            tracing::info!(attempts, "verification timed out")
        }
        FlowOutcome::Cancelled => tracing::info!("verification flow ended by cancel"),
        FlowOutcome::Failed(err) => {
            tracing::warn!(error = %err, retryable = err.is_retryable(), "verification failed")
        }
    }
    let _ = done.send(outcome);
}

impl Inner {
    async fn drive(
        &self,
        key: &FlowKey,
        id: u64,
        binding: &WalletBinding,
        request: FlowRequest,
        control: &FlowControl,
    ) -> FlowOutcome {
        let not_before = self.clock.now();
        let message = VerificationMessage {
            action: key.action.as_str().to_string(),
            owner_id: binding.owner_id.clone(),
            address: binding.address.clone(),
            timestamp: not_before,
        };

        let signed = tokio::select! {
            biased;
            _ = control.cancelled() => return FlowOutcome::Cancelled,
            signed = self.issuer.sign(&message, binding, request.secret.as_ref()) => signed,
        };
        let signed = match signed {
            Ok(signed) => signed,
            Err(err) => return FlowOutcome::Failed(err.into()),
        };

        let expected_amount = match &request.flow {
            VerificationFlow::PublishBySelfPay { .. } => self.config.unlock_fee,
            VerificationFlow::GenesisVerification { amount, .. } => *amount,
        };
        let watch_request = WatchRequest {
            address: binding.address.clone(),
            expected_amount,
            not_before,
        };
        let (_watch, watch_outcome) = {
            let mut slot = control.watch.lock().unwrap_or_else(PoisonError::into_inner);
            if control.is_cancelled() {
                return FlowOutcome::Cancelled;
            }
            let (watch, watch_outcome) = self.watcher.start_with_outcome(watch_request);
            *slot = Some(watch.canceller());
            (watch, watch_outcome)
        };
        self.set_phase(key, id, FlowPhase::Watching);
        tracing::debug!(expected = %expected_amount, "signature issued, watching for self-payment");

        let transaction = match watch_outcome.await {
            Ok(WatchOutcome::Confirmed(tx)) => tx,
            Ok(WatchOutcome::TimedOut { attempts }) => return FlowOutcome::TimedOut { attempts },
            Ok(WatchOutcome::Errored(err)) => return FlowOutcome::Failed(err.into()),
            Err(_) => return FlowOutcome::Cancelled,
        };

        match self.commit(binding, &request.flow, signed, &transaction) {
            Ok(record) => FlowOutcome::Confirmed {
                record: Box::new(record),
                transaction,
            },
            Err(err) => FlowOutcome::Failed(err),
        }
    }

    /// Append the record, then apply the side effect. A failed append leaves
    /// the gated resource untouched.
    fn commit(
        &self,
        binding: &WalletBinding,
        flow: &VerificationFlow,
        signed: SignedMessage,
        transaction: &Transaction,
    ) -> Result<VerificationRecord, CoordinatorError> {
        let draft = RecordDraft {
            owner_id: binding.owner_id.clone(),
            wallet_address: binding.address.clone(),
            wallet_type: binding.wallet_type,
            message: signed.message,
            signature: signed.signature,
            content_hash: signed.content_hash,
            is_genesis: flow.is_genesis(),
            verified_by: Vec::new(),
            created_at: self.clock.now(),
        };
        let record = self.ledger.seal(draft)?;
        let mode = match flow {
            VerificationFlow::GenesisVerification { replace: true, .. } => {
                AppendMode::ReplaceGenesis
            }
            _ => AppendMode::Insert,
        };
        self.ledger.append_with(&record, mode)?;
        tracing::debug!(record = %record.id, tx = %transaction.id, "record appended, applying side effect");

        match flow {
            VerificationFlow::PublishBySelfPay { content_id } => {
                self.effects
                    .publish(&binding.owner_id, content_id, &record)?
            }
            VerificationFlow::GenesisVerification { .. } => {
                self.effects.mark_genesis_verified(binding, &record)?
            }
        }
        Ok(record)
    }

    fn set_phase(&self, key: &FlowKey, id: u64, phase: FlowPhase) {
        let mut flows = self.flows.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(flow) = flows.get_mut(key).filter(|flow| flow.id == id) {
            flow.phase = phase;
        }
    }

    fn release(&self, key: &FlowKey, id: u64) {
        let mut flows = self.flows.lock().unwrap_or_else(PoisonError::into_inner);
        if flows.get(key).is_some_and(|flow| flow.id == id) {
            flows.remove(key);
        }
    }
}
