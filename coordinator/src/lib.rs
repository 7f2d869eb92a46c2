//! Verification coordinator.
//!
//! Runs the per-(owner, action) state machine
//! `Idle → AwaitingSignature → Watching → {Confirmed | TimedOut | Cancelled | Failed} → Idle`:
//!
//! 1. sign a verification message with the owner's wallet;
//! 2. watch the public ledger for the matching self-payment;
//! 3. append a record to the trust ledger;
//! 4. apply the gated side effect exactly once.
//!
//! At most one flow runs per key. A second start for a busy key is refused
//! with [`CoordinatorError::AlreadyInProgress`].

pub mod config;
pub mod coordinator;
pub mod effects;
pub mod error;
pub mod flow;
pub mod metrics;

pub use config::{ConfigError, CoordinatorConfig};
pub use coordinator::{FlowHandle, VerificationCoordinator};
pub use effects::{EffectError, GatedEffects, StoreEffects};
pub use error::CoordinatorError;
pub use flow::{ActionKind, FlowKey, FlowOutcome, FlowPhase, FlowRequest, VerificationFlow};
pub use metrics::CoordinatorMetrics;
