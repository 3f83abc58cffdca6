// SPDX-License-Identifier: MIT

//! Attendance record. Immutable once created; at most one per (user, event).

use serde::{Deserialize, Serialize};

/// Check-in document stored in Firestore.
///
/// The document id is `{event_id}_{user_id}`, so the store itself rejects a
/// second check-in for the same pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    pub user_id: String,
    pub event_id: String,
    /// Denormalized owning club for summary queries
    pub club_id: String,
    pub timestamp: String,
}

impl CheckIn {
    pub fn new(user_id: String, event_id: String, club_id: String, now: &str) -> Self {
        Self {
            user_id,
            event_id,
            club_id,
            timestamp: now.to_string(),
        }
    }

    /// Document id enforcing (user, event) uniqueness.
    pub fn doc_id(&self) -> String {
        Self::doc_id_for(&self.event_id, &self.user_id)
    }

    pub fn doc_id_for(event_id: &str, user_id: &str) -> String {
        format!("{}_{}", event_id, user_id)
    }
}
