//! Gated content storage trait.
//!
//! Content (a message, an AI response, a feature flag) stays unpublished until
//! a self-payment verification unlocks it.

use crate::StoreError;
use selfproof_types::{OwnerId, RecordId, Timestamp};
use serde::{Deserialize, Serialize};

/// Publication state of one content item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishState {
    pub content_id: String,
    pub owner_id: OwnerId,
    pub published_at: Timestamp,
    /// The verification record that unlocked the content.
    pub unlocked_by: RecordId,
}

pub trait ContentStore: Send + Sync {
    /// Flip the content's published flag.
    ///
    /// Returns `false` without modifying anything if it was already published.
    fn mark_published(&self, state: &PublishState) -> Result<bool, StoreError>;

    fn publish_state(&self, content_id: &str) -> Result<Option<PublishState>, StoreError>;
}
