//! Read-only projection of one owner's records.

use selfproof_types::{OwnerId, Timestamp, VerificationRecord};
use serde::{Deserialize, Serialize};

/// Aggregate trust metrics for one owner. Recomputed on demand, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub owner_id: OwnerId,
    pub record_count: usize,
    /// Σ `blue_score` over the owner's records.
    pub blue_score: u64,
    /// max `dag_depth` over the owner's records (0 if none).
    pub dag_depth: u64,
    /// Records with a non-empty `verified_by`.
    pub cross_verifications: usize,
    pub genesis_count: usize,
    pub first_verified_at: Option<Timestamp>,
    pub last_verified_at: Option<Timestamp>,
}

impl Certificate {
    /// Single pass over `records`. Records of other owners are ignored.
    pub fn tally<'a>(
        owner_id: &OwnerId,
        records: impl IntoIterator<Item = &'a VerificationRecord>,
    ) -> Self {
        let mut cert = Certificate {
            owner_id: owner_id.clone(),
            record_count: 0,
            blue_score: 0,
            dag_depth: 0,
            cross_verifications: 0,
            genesis_count: 0,
            first_verified_at: None,
            last_verified_at: None,
        };
        for record in records.into_iter().filter(|r| &r.owner_id == owner_id) {
            cert.record_count += 1;
            cert.blue_score = cert.blue_score.saturating_add(record.blue_score);
            cert.dag_depth = cert.dag_depth.max(record.dag_depth);
            if record.is_cross_verified() {
                cert.cross_verifications += 1;
            }
            if record.is_genesis {
                cert.genesis_count += 1;
            }
            cert.first_verified_at = Some(
                cert.first_verified_at
                    .map_or(record.created_at, |t| t.min(record.created_at)),
            );
            cert.last_verified_at = Some(
                cert.last_verified_at
                    .map_or(record.created_at, |t| t.max(record.created_at)),
            );
        }
        cert
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}
