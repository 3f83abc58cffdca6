// SPDX-License-Identifier: MIT

//! Event model. Each event belongs to exactly one club.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Event document stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Document id (UUIDv4)
    pub id: String,
    /// Owning club; immutable after creation
    pub club_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Event date, YYYY-MM-DD
    pub date: String,
    /// Free-text venue description
    #[serde(default)]
    pub location: String,
    /// Users who RSVPed (at most once each)
    #[serde(default)]
    pub rsvp_ids: Vec<String>,
    #[serde(default)]
    pub is_archived: bool,
    /// Set only while archived
    #[serde(default)]
    pub archived_at: Option<String>,
    /// Soft-delete marker written just before the hard delete
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: String,
}

impl Event {
    pub fn new(
        club_id: String,
        title: String,
        description: String,
        date: String,
        location: String,
        now: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            club_id,
            title,
            description,
            date,
            location,
            rsvp_ids: Vec::new(),
            is_archived: false,
            archived_at: None,
            is_deleted: false,
            created_at: now.to_string(),
        }
    }

    /// Toggle the archived flag. `archived_at` is set only while archived.
    pub fn set_archived(&mut self, archived: bool, now: &str) {
        self.is_archived = archived;
        self.archived_at = if archived {
            Some(now.to_string())
        } else {
            None
        };
    }

    /// Whether this event may be designated as a club's active event.
    pub fn is_activatable(&self) -> bool {
        !self.is_archived && !self.is_deleted
    }

    /// Record an RSVP. A user may RSVP at most once.
    pub fn rsvp(&mut self, user_id: &str) -> Result<usize, AppError> {
        if self.rsvp_ids.iter().any(|id| id == user_id) {
            return Err(AppError::InvalidOperation(
                "already RSVPed to this event".to_string(),
            ));
        }
        self.rsvp_ids.push(user_id.to_string());
        Ok(self.rsvp_ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event() -> Event {
        Event::new(
            "club-1".to_string(),
            "Weekly Meetup".to_string(),
            String::new(),
            "2024-02-01".to_string(),
            "Room 204".to_string(),
            "2024-01-15T12:00:00Z",
        )
    }

    #[test]
    fn test_archive_toggles_timestamp() {
        let mut event = make_event();
        assert!(event.is_activatable());

        event.set_archived(true, "2024-03-01T00:00:00Z");
        assert!(event.is_archived);
        assert_eq!(event.archived_at.as_deref(), Some("2024-03-01T00:00:00Z"));
        assert!(!event.is_activatable());

        event.set_archived(false, "2024-03-02T00:00:00Z");
        assert!(!event.is_archived);
        assert!(event.archived_at.is_none());
        assert!(event.is_activatable());
    }

    #[test]
    fn test_rsvp_once() {
        let mut event = make_event();
        assert_eq!(event.rsvp("alice").unwrap(), 1);
        assert!(event.rsvp("alice").is_err());
        assert_eq!(event.rsvp("bob").unwrap(), 2);
    }
}
