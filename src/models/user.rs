// SPDX-License-Identifier: MIT

//! User model for storage and API.
//!
//! Account lifecycle (sign-up, credentials) is owned by the auth collaborator;
//! this service only consumes identity and the club back-reference list.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Document id (UUIDv4)
    pub id: String,
    pub username: String,
    pub full_name: String,
    /// Ids of clubs this user belongs to. Kept consistent with each club's
    /// member set by committing both documents in one transaction.
    #[serde(default)]
    pub club_ids: Vec<String>,
    pub created_at: String,
}

impl User {
    /// Append a club back-reference. Idempotent.
    pub fn add_club(&mut self, club_id: &str) {
        if !self.club_ids.iter().any(|id| id == club_id) {
            self.club_ids.push(club_id.to_string());
        }
    }

    /// Remove a club back-reference. No-op if absent.
    pub fn remove_club(&mut self, club_id: &str) {
        self.club_ids.retain(|id| id != club_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_club_backrefs() {
        let mut user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            full_name: "Alice Example".to_string(),
            club_ids: vec![],
            created_at: "2024-01-15T12:00:00Z".to_string(),
        };

        user.add_club("c1");
        user.add_club("c1");
        assert_eq!(user.club_ids, vec!["c1"]);

        user.remove_club("c1");
        user.remove_club("c1");
        assert!(user.club_ids.is_empty());
    }
}
