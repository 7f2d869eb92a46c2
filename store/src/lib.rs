//! Persistence boundary for selfproof.
//!
//! Every storage backend (a database, a browser storage bridge, in-memory for
//! testing) implements these traits. The rest of the workspace depends only on
//! the traits and on the shape of the records they carry.

pub mod binding;
pub mod content;
pub mod error;
pub mod verification;

pub use binding::BindingStore;
pub use content::{ContentStore, PublishState};
pub use error::StoreError;
pub use verification::{RecordFilter, RecordStore};
