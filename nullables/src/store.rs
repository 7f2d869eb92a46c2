//! Nullable store: thread-safe in-memory storage for testing.

use selfproof_store::{
    BindingStore, ContentStore, PublishState, RecordFilter, RecordStore, StoreError,
};
use selfproof_types::{OwnerId, RecordId, VerificationRecord, WalletBinding, WalletType};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// An in-memory record + binding + content store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStore {
    records: Mutex<Vec<VerificationRecord>>,
    genesis: Mutex<HashMap<(OwnerId, WalletType), RecordId>>,
    bindings: Mutex<HashMap<(OwnerId, WalletType), WalletBinding>>,
    content: Mutex<HashMap<String, PublishState>>,
    fail_pointer_writes: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored records.
    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Make `set_genesis_pointer` fail with a backend error until turned off.
    pub fn fail_pointer_writes(&self, fail: bool) {
        self.fail_pointer_writes.store(fail, Ordering::SeqCst);
    }
}

impl RecordStore for NullStore {
    fn create(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::Duplicate(record.id.to_string()));
        }
        records.push(record.clone());
        Ok(())
    }

    fn get(&self, id: &RecordId) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.id == id)
            .cloned())
    }

    fn filter(&self, filter: &RecordFilter) -> Result<Vec<VerificationRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn genesis_pointer(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
    ) -> Result<Option<RecordId>, StoreError> {
        Ok(self
            .genesis
            .lock()
            .unwrap()
            .get(&(owner_id.clone(), wallet_type))
            .cloned())
    }

    fn set_genesis_pointer(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
        id: &RecordId,
    ) -> Result<(), StoreError> {
        if self.fail_pointer_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("genesis pointer write failed".into()));
        }
        self.genesis
            .lock()
            .unwrap()
            .insert((owner_id.clone(), wallet_type), id.clone());
        Ok(())
    }
}

impl BindingStore for NullStore {
    fn upsert(&self, binding: &WalletBinding) -> Result<(), StoreError> {
        self.bindings.lock().unwrap().insert(
            (binding.owner_id.clone(), binding.wallet_type),
            binding.clone(),
        );
        Ok(())
    }

    fn get(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
    ) -> Result<Option<WalletBinding>, StoreError> {
        Ok(self
            .bindings
            .lock()
            .unwrap()
            .get(&(owner_id.clone(), wallet_type))
            .cloned())
    }

    fn filter(&self, owner_id: &OwnerId) -> Result<Vec<WalletBinding>, StoreError> {
        let mut out: Vec<_> = self
            .bindings
            .lock()
            .unwrap()
            .values()
            .filter(|b| &b.owner_id == owner_id)
            .cloned()
            .collect();
        out.sort_by_key(|b| b.wallet_type);
        Ok(out)
    }
}

impl ContentStore for NullStore {
    fn mark_published(&self, state: &PublishState) -> Result<bool, StoreError> {
        let mut content = self.content.lock().unwrap();
        if content.contains_key(&state.content_id) {
            return Ok(false);
        }
        content.insert(state.content_id.clone(), state.clone());
        Ok(true)
    }

    fn publish_state(&self, content_id: &str) -> Result<Option<PublishState>, StoreError> {
        Ok(self.content.lock().unwrap().get(content_id).cloned())
    }
}
