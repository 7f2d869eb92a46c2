//! Trust-DAG ledger.
//!
//! Every successful self-payment verification becomes an immutable
//! [`VerificationRecord`](selfproof_types::VerificationRecord) with links to
//! earlier records. The ledger validates those links on append, allows one
//! genesis per (owner, wallet type), and projects an owner's records into a
//! [`Certificate`] on demand.

pub mod certificate;
pub mod draft;
pub mod error;
pub mod ledger;
pub mod policy;
pub mod registry;

pub use certificate::Certificate;
pub use draft::RecordDraft;
pub use error::TrustError;
pub use ledger::{AppendMode, TrustLedger};
pub use policy::MetricsPolicy;
pub use registry::WalletRegistry;
