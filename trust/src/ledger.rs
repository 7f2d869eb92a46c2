//! The append-only trust ledger.

use crate::{Certificate, MetricsPolicy, RecordDraft, TrustError};
use selfproof_crypto::{blake2b_256_multi, verify_content_hash};
use selfproof_store::{RecordFilter, RecordStore, StoreError};
use selfproof_types::{OwnerId, RecordId, Timestamp, VerificationRecord, WalletType};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

/// Whether an append may supersede an existing genesis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppendMode {
    /// A second genesis for the same (owner, wallet type) is refused.
    #[default]
    Insert,
    /// The new genesis becomes the pair's genesis. The old one stays in the log.
    ReplaceGenesis,
}

/// Append-only store of verification records with DAG validation.
///
/// Appends for different owners proceed in parallel. Appends for the same
/// owner are serialized, which makes the one-genesis-per-pair check race-free.
pub struct TrustLedger {
    store: Arc<dyn RecordStore>,
    policy: MetricsPolicy,
    owner_locks: Mutex<HashMap<OwnerId, Arc<Mutex<()>>>>,
}

impl TrustLedger {
    pub fn new(store: Arc<dyn RecordStore>, policy: MetricsPolicy) -> Self {
        Self {
            store,
            policy,
            owner_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> MetricsPolicy {
        self.policy
    }

    /// Append a record, refusing a second genesis for its (owner, wallet type).
    pub fn append(&self, record: &VerificationRecord) -> Result<(), TrustError> {
        self.append_with(record, AppendMode::Insert)
    }

    /// Validate and append a record.
    ///
    /// Nothing is written unless every check passes:
    /// - `content_hash` is `signature[0..64]`;
    /// - a genesis has no parents; every other parent exists and is strictly older;
    /// - every `verified_by` entry is a strictly older record of another owner;
    /// - at most one genesis per (owner, wallet type) unless `mode` replaces it.
    pub fn append_with(
        &self,
        record: &VerificationRecord,
        mode: AppendMode,
    ) -> Result<(), TrustError> {
        if !verify_content_hash(&record.signature, &record.content_hash) {
            tracing::warn!(record = %record.id, "refusing record with mismatched content hash");
            return Err(TrustError::ContentHashMismatch(record.id.clone()));
        }
        self.check_parents(record)?;
        self.check_verifiers(record)?;

        let lock = self.owner_lock(&record.owner_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if record.is_genesis
            && mode == AppendMode::Insert
            && self
                .genesis_for(&record.owner_id, record.wallet_type)?
                .is_some()
        {
            tracing::warn!(
                owner = %record.owner_id,
                wallet_type = %record.wallet_type,
                "refusing duplicate genesis"
            );
            return Err(TrustError::DuplicateGenesis {
                owner: record.owner_id.clone(),
                wallet_type: record.wallet_type,
            });
        }

        self.store.create(record).map_err(|e| match e {
            StoreError::Duplicate(_) => TrustError::DuplicateRecord(record.id.clone()),
            other => TrustError::Store(other),
        })?;
        if record.is_genesis {
            self.store
                .set_genesis_pointer(&record.owner_id, record.wallet_type, &record.id)?;
        }

        tracing::info!(
            record = %record.id,
            owner = %record.owner_id,
            wallet_type = %record.wallet_type,
            genesis = record.is_genesis,
            parents = record.parent_ids.len(),
            "verification record appended"
        );
        Ok(())
    }

    pub fn get(&self, id: &RecordId) -> Result<Option<VerificationRecord>, TrustError> {
        Ok(self.store.get(id)?)
    }

    /// All of an owner's records in append order.
    pub fn records_for(&self, owner_id: &OwnerId) -> Result<Vec<VerificationRecord>, TrustError> {
        Ok(self.store.filter(&RecordFilter::owner(owner_id))?)
    }

    pub fn certificate_for(&self, owner_id: &OwnerId) -> Result<Certificate, TrustError> {
        let records = self.records_for(owner_id)?;
        Ok(Certificate::tally(owner_id, &records))
    }

    /// The current genesis record of an (owner, wallet type) pair.
    pub fn genesis_for(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
    ) -> Result<Option<VerificationRecord>, TrustError> {
        if let Some(id) = self.store.genesis_pointer(owner_id, wallet_type)? {
            return Ok(self.store.get(&id)?);
        }
        // A genesis whose pointer write failed is still in the log.
        let logged = self
            .store
            .filter(&RecordFilter::owner(owner_id).wallet_type(wallet_type).genesis(true))?;
        Ok(logged.into_iter().last())
    }

    /// Link a draft into the DAG: choose parents, compute metrics and the id.
    ///
    /// A non-genesis record's parent is the newest record of the same owner and
    /// wallet type. Its `created_at` is bumped past the parent's if the clock
    /// reads the same millisecond, so the parent stays strictly older.
    pub fn seal(&self, draft: RecordDraft) -> Result<VerificationRecord, TrustError> {
        let parents: Vec<VerificationRecord> = if draft.is_genesis {
            Vec::new()
        } else {
            self.tip(&draft.owner_id, draft.wallet_type)?
                .into_iter()
                .collect()
        };

        let created_at = parents
            .iter()
            .map(|p| p.created_at.plus_millis(1))
            .fold(draft.created_at, Timestamp::max);

        let (blue_score, dag_depth) = match self.policy {
            MetricsPolicy::Inert => (0, 0),
            MetricsPolicy::ParentDepth => (
                self.ancestor_count(&parents)?,
                parents.iter().map(|p| p.dag_depth + 1).max().unwrap_or(0),
            ),
        };

        let id = record_id(&draft, created_at);
        Ok(VerificationRecord {
            id,
            owner_id: draft.owner_id,
            wallet_address: draft.wallet_address,
            wallet_type: draft.wallet_type,
            signature: draft.signature,
            message: draft.message,
            parent_ids: parents.into_iter().map(|p| p.id).collect(),
            blue_score,
            dag_depth,
            is_genesis: draft.is_genesis,
            verified_by: draft.verified_by,
            created_at,
            content_hash: draft.content_hash,
        })
    }

    fn tip(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
    ) -> Result<Option<VerificationRecord>, TrustError> {
        let records = self
            .store
            .filter(&RecordFilter::owner(owner_id).wallet_type(wallet_type))?;
        Ok(records.into_iter().max_by_key(|r| r.created_at))
    }

    /// Distinct records reachable from `parents`, the parents included.
    fn ancestor_count(&self, parents: &[VerificationRecord]) -> Result<u64, TrustError> {
        let mut seen: HashSet<RecordId> = HashSet::new();
        let mut queue: VecDeque<RecordId> = parents.iter().map(|p| p.id.clone()).collect();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(record) = self.store.get(&id)? {
                queue.extend(record.parent_ids);
            }
        }
        Ok(seen.len() as u64)
    }

    fn check_parents(&self, record: &VerificationRecord) -> Result<(), TrustError> {
        let invalid = |parent: &RecordId, reason| TrustError::InvalidParentReference {
            record: record.id.clone(),
            parent: parent.clone(),
            reason,
        };

        if record.is_genesis {
            return match record.parent_ids.first() {
                Some(parent) => Err(invalid(parent, "genesis records have no parents")),
                None => Ok(()),
            };
        }

        let mut seen = HashSet::new();
        for parent_id in &record.parent_ids {
            if parent_id == &record.id {
                return Err(invalid(parent_id, "record references itself"));
            }
            if !seen.insert(parent_id) {
                return Err(invalid(parent_id, "parent listed twice"));
            }
            let parent = self
                .store
                .get(parent_id)?
                .ok_or_else(|| invalid(parent_id, "parent does not exist"))?;
            if parent.created_at >= record.created_at {
                return Err(invalid(parent_id, "parent is not strictly older"));
            }
        }
        Ok(())
    }

    fn check_verifiers(&self, record: &VerificationRecord) -> Result<(), TrustError> {
        let invalid = |verifier: &RecordId, reason| TrustError::InvalidVerifierReference {
            record: record.id.clone(),
            verifier: verifier.clone(),
            reason,
        };

        for verifier_id in &record.verified_by {
            let verifier = self
                .store
                .get(verifier_id)?
                .ok_or_else(|| invalid(verifier_id, "verifier record does not exist"))?;
            if verifier.owner_id == record.owner_id {
                return Err(invalid(verifier_id, "owners cannot verify themselves"));
            }
            if verifier.created_at >= record.created_at {
                return Err(invalid(verifier_id, "verifier record is not strictly older"));
            }
        }
        Ok(())
    }

    fn owner_lock(&self, owner_id: &OwnerId) -> Arc<Mutex<()>> {
        let mut locks = self
            .owner_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(owner_id.clone()).or_default())
    }
}

fn record_id(draft: &RecordDraft, created_at: Timestamp) -> RecordId {
    const SEP: &[u8] = &[0];
    let millis = created_at.as_millis().to_le_bytes();
    let digest = blake2b_256_multi(&[
        draft.owner_id.as_str().as_bytes(),
        SEP,
        draft.wallet_type.as_str().as_bytes(),
        SEP,
        draft.wallet_address.as_str().as_bytes(),
        SEP,
        draft.signature.as_bytes(),
        SEP,
        millis.as_slice(),
    ]);
    RecordId::new(hex::encode(digest))
}
