// SPDX-License-Identifier: MIT

//! Club document and the membership state machine.
//!
//! All role mutations live here as pure transitions so the invariants
//! (owner is a member, admins are members, pending and members are disjoint)
//! can be checked without a database. Services persist the mutated documents.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::geo::Coordinate;

/// Length of generated join codes.
pub const JOIN_CODE_LEN: usize = 6;

const JOIN_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Club document stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    /// Document id (UUIDv4)
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Display color for the club card
    #[serde(default)]
    pub color: Option<String>,
    /// Public clubs admit joiners directly; private clubs queue them as pending
    #[serde(default)]
    pub is_public: bool,
    /// Whether check-ins are gated by proximity to the anchor
    #[serde(default)]
    pub location_tracking_enabled: bool,
    /// Check-in reference point set by an admin
    #[serde(default)]
    pub anchor: Option<Coordinate>,
    /// Geofence radius in feet
    pub check_in_radius_feet: f64,
    /// Short shareable code for joining without browsing listings
    pub join_code: String,
    /// The single event currently open for check-in, if any
    #[serde(default)]
    pub active_event_id: Option<String>,
    pub owner_id: String,
    #[serde(default)]
    pub admin_ids: Vec<String>,
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub pending_ids: Vec<String>,
    pub created_at: String,
}

/// A user's role within a club, derived at call time (never cached).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Admin,
    Member,
    Pending,
    NonMember,
}

/// Result of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Public club: the user became a member directly.
    Joined,
    /// Private club: the user was queued for admin approval.
    Pending,
}

/// Result of a leave operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The user left; the club continues to exist.
    Left,
    /// The leaving user was the owner and sole member; the club must be
    /// deleted (with cascades) by the caller.
    DeleteClub,
}

impl Club {
    /// Create a new club. The creator becomes owner, admin and member.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        description: String,
        color: Option<String>,
        is_public: bool,
        location_tracking_enabled: bool,
        owner_id: String,
        check_in_radius_feet: f64,
        now: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description,
            color,
            is_public,
            location_tracking_enabled,
            anchor: None,
            check_in_radius_feet,
            join_code: Self::generate_join_code(),
            active_event_id: None,
            owner_id: owner_id.clone(),
            admin_ids: vec![owner_id.clone()],
            member_ids: vec![owner_id],
            pending_ids: Vec::new(),
            created_at: now.to_string(),
        }
    }

    /// Generate a random 6-character uppercase alphanumeric join code.
    pub fn generate_join_code() -> String {
        let mut rng = rand::thread_rng();
        (0..JOIN_CODE_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..JOIN_CODE_CHARSET.len());
                JOIN_CODE_CHARSET[idx] as char
            })
            .collect()
    }

    // ─── Role Queries ────────────────────────────────────────────

    pub fn role_of(&self, user_id: &str) -> Role {
        if self.owner_id == user_id {
            Role::Owner
        } else if self.admin_ids.iter().any(|id| id == user_id) {
            Role::Admin
        } else if self.member_ids.iter().any(|id| id == user_id) {
            Role::Member
        } else if self.pending_ids.iter().any(|id| id == user_id) {
            Role::Pending
        } else {
            Role::NonMember
        }
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.member_ids.iter().any(|id| id == user_id)
    }

    pub fn is_pending(&self, user_id: &str) -> bool {
        self.pending_ids.iter().any(|id| id == user_id)
    }

    /// Owner privilege is structural: the owner counts as an admin whether or
    /// not they appear in the admin set.
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.owner_id == user_id || self.admin_ids.iter().any(|id| id == user_id)
    }

    fn require_admin(&self, actor_id: &str) -> Result<(), AppError> {
        if self.is_admin(actor_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "only club admins may perform this action".to_string(),
            ))
        }
    }

    fn remove_id(ids: &mut Vec<String>, user_id: &str) -> bool {
        let before = ids.len();
        ids.retain(|id| id != user_id);
        ids.len() != before
    }

    // ─── Membership Registry ─────────────────────────────────────

    /// Add a user to the member set. Idempotent.
    ///
    /// Also clears any pending entry, since pending and members are disjoint.
    /// Returns `true` if membership actually changed.
    pub fn add_member(&mut self, user_id: &str) -> bool {
        Self::remove_id(&mut self.pending_ids, user_id);
        if self.is_member(user_id) {
            return false;
        }
        self.member_ids.push(user_id.to_string());
        true
    }

    /// Promote a member to admin. Idempotent for existing admins.
    pub fn promote(&mut self, user_id: &str, actor_id: &str) -> Result<(), AppError> {
        self.require_admin(actor_id)?;
        if !self.is_member(user_id) {
            return Err(AppError::InvalidOperation(
                "only members can be promoted to admin".to_string(),
            ));
        }
        if !self.admin_ids.iter().any(|id| id == user_id) {
            self.admin_ids.push(user_id.to_string());
        }
        Ok(())
    }

    /// Remove a user from the admin set. No-op if they are not an admin.
    pub fn demote(&mut self, user_id: &str, actor_id: &str) -> Result<(), AppError> {
        self.require_admin(actor_id)?;
        if self.owner_id == user_id {
            return Err(AppError::InvalidOperation(
                "the owner cannot be demoted".to_string(),
            ));
        }
        Self::remove_id(&mut self.admin_ids, user_id);
        Ok(())
    }

    /// Remove a user from members, admins and pending.
    pub fn kick(&mut self, user_id: &str, actor_id: &str) -> Result<(), AppError> {
        self.require_admin(actor_id)?;
        if self.owner_id == user_id {
            return Err(AppError::InvalidOperation(
                "the owner cannot be kicked".to_string(),
            ));
        }
        self.remove_everywhere(user_id);
        Ok(())
    }

    /// Voluntary leave.
    ///
    /// The owner may only leave as the sole member, in which case the club is
    /// deleted. An owner with other members must delete the club explicitly
    /// (there is no ownership transfer).
    pub fn leave(&mut self, user_id: &str) -> Result<LeaveOutcome, AppError> {
        if self.owner_id == user_id {
            let sole_member = self.member_ids.len() == 1 && self.is_member(user_id);
            return if sole_member {
                Ok(LeaveOutcome::DeleteClub)
            } else {
                Err(AppError::OwnershipRequired(
                    "the owner cannot leave while other members remain".to_string(),
                ))
            };
        }
        if self.role_of(user_id) == Role::NonMember {
            return Err(AppError::NotFound(
                "user has no standing in this club".to_string(),
            ));
        }
        self.remove_everywhere(user_id);
        Ok(LeaveOutcome::Left)
    }

    fn remove_everywhere(&mut self, user_id: &str) {
        Self::remove_id(&mut self.member_ids, user_id);
        Self::remove_id(&mut self.admin_ids, user_id);
        Self::remove_id(&mut self.pending_ids, user_id);
    }

    // ─── Join/Approval Workflow ──────────────────────────────────

    /// Request to join. Public clubs admit directly; private clubs queue the
    /// user as pending.
    pub fn request_join(&mut self, user_id: &str) -> Result<JoinOutcome, AppError> {
        if self.is_member(user_id) {
            return Err(AppError::AlreadyMember);
        }
        if self.is_pending(user_id) {
            return Err(AppError::RequestPending);
        }
        if self.is_public {
            self.member_ids.push(user_id.to_string());
            Ok(JoinOutcome::Joined)
        } else {
            self.pending_ids.push(user_id.to_string());
            Ok(JoinOutcome::Pending)
        }
    }

    /// Approve a pending user, moving them to the member set.
    pub fn approve(&mut self, user_id: &str, actor_id: &str) -> Result<(), AppError> {
        self.require_admin(actor_id)?;
        if !self.is_pending(user_id) {
            return Err(AppError::NotPending);
        }
        Self::remove_id(&mut self.pending_ids, user_id);
        self.member_ids.push(user_id.to_string());
        Ok(())
    }

    /// Reject a pending user without granting membership.
    pub fn reject(&mut self, user_id: &str, actor_id: &str) -> Result<(), AppError> {
        self.require_admin(actor_id)?;
        if !self.is_pending(user_id) {
            return Err(AppError::NotPending);
        }
        Self::remove_id(&mut self.pending_ids, user_id);
        Ok(())
    }

    // ─── Configuration ───────────────────────────────────────────

    /// Set the check-in anchor. Admin only.
    pub fn set_anchor(&mut self, anchor: Coordinate, actor_id: &str) -> Result<(), AppError> {
        self.require_admin(actor_id)?;
        self.anchor = Some(anchor);
        Ok(())
    }

    /// Replace the join code with a fresh one, guaranteed to differ from the
    /// previous code. Admin only.
    pub fn reset_join_code(&mut self, actor_id: &str) -> Result<String, AppError> {
        self.require_admin(actor_id)?;
        let mut code = Self::generate_join_code();
        while code == self.join_code {
            code = Self::generate_join_code();
        }
        self.join_code = code.clone();
        Ok(code)
    }

    /// Designate `event_id` as the club's active event, or clear it.
    ///
    /// Event/club consistency (ownership, archived, deleted) is validated by
    /// the caller, which holds the event document.
    pub fn set_active_event(
        &mut self,
        event_id: Option<String>,
        actor_id: &str,
    ) -> Result<(), AppError> {
        self.require_admin(actor_id)?;
        self.active_event_id = event_id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_club(is_public: bool) -> Club {
        Club::new(
            "Chess Club".to_string(),
            "We play chess".to_string(),
            None,
            is_public,
            false,
            "owner".to_string(),
            25.0,
            "2024-01-15T12:00:00Z",
        )
    }

    fn assert_invariants(club: &Club) {
        assert!(club.is_member(&club.owner_id), "owner must be a member");
        for admin in &club.admin_ids {
            assert!(club.is_member(admin), "admin {} must be a member", admin);
        }
        for pending in &club.pending_ids {
            assert!(
                !club.is_member(pending),
                "pending {} must not be a member",
                pending
            );
        }
    }

    #[test]
    fn test_creator_is_owner_admin_member() {
        let club = make_club(false);
        assert_eq!(club.role_of("owner"), Role::Owner);
        assert!(club.is_admin("owner"));
        assert!(club.is_member("owner"));
        assert_invariants(&club);
    }

    #[test]
    fn test_join_code_format() {
        let code = Club::generate_join_code();
        assert_eq!(code.len(), JOIN_CODE_LEN);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_private_join_goes_pending() {
        let mut club = make_club(false);
        assert_eq!(club.request_join("alice").unwrap(), JoinOutcome::Pending);
        assert_eq!(club.role_of("alice"), Role::Pending);
        assert!(!club.is_member("alice"));
        assert_invariants(&club);
    }

    #[test]
    fn test_public_join_goes_direct() {
        let mut club = make_club(true);
        assert_eq!(club.request_join("alice").unwrap(), JoinOutcome::Joined);
        assert_eq!(club.role_of("alice"), Role::Member);
        assert!(club.pending_ids.is_empty());
    }

    #[test]
    fn test_rejoin_attempts_fail() {
        let mut club = make_club(false);
        club.request_join("alice").unwrap();
        assert!(matches!(
            club.request_join("alice"),
            Err(AppError::RequestPending)
        ));

        club.approve("alice", "owner").unwrap();
        assert!(matches!(
            club.request_join("alice"),
            Err(AppError::AlreadyMember)
        ));
    }

    #[test]
    fn test_approve_is_not_idempotent() {
        let mut club = make_club(false);
        club.request_join("alice").unwrap();
        club.approve("alice", "owner").unwrap();
        assert!(club.is_member("alice"));
        assert!(!club.is_pending("alice"));

        // Second approval fails: alice is no longer pending.
        assert!(matches!(
            club.approve("alice", "owner"),
            Err(AppError::NotPending)
        ));
        assert_invariants(&club);
    }

    #[test]
    fn test_reject_removes_pending_only() {
        let mut club = make_club(false);
        club.request_join("alice").unwrap();
        club.reject("alice", "owner").unwrap();
        assert_eq!(club.role_of("alice"), Role::NonMember);
        assert!(matches!(
            club.reject("alice", "owner"),
            Err(AppError::NotPending)
        ));
    }

    #[test]
    fn test_approve_requires_admin() {
        let mut club = make_club(false);
        club.request_join("alice").unwrap();
        club.request_join("bob").unwrap();
        assert!(matches!(
            club.approve("alice", "bob"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_add_member_idempotent() {
        let mut club = make_club(false);
        assert!(club.add_member("alice"));
        assert!(!club.add_member("alice"));
        assert_eq!(
            club.member_ids.iter().filter(|id| *id == "alice").count(),
            1
        );
    }

    #[test]
    fn test_promote_demote() {
        let mut club = make_club(false);
        club.add_member("alice");

        club.promote("alice", "owner").unwrap();
        assert_eq!(club.role_of("alice"), Role::Admin);
        // Idempotent
        club.promote("alice", "owner").unwrap();
        assert_eq!(
            club.admin_ids.iter().filter(|id| *id == "alice").count(),
            1
        );

        club.demote("alice", "owner").unwrap();
        assert_eq!(club.role_of("alice"), Role::Member);
        // No-op when not an admin
        club.demote("alice", "owner").unwrap();
        assert_invariants(&club);
    }

    #[test]
    fn test_promote_requires_membership() {
        let mut club = make_club(false);
        assert!(matches!(
            club.promote("stranger", "owner"),
            Err(AppError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_owner_cannot_be_demoted_or_kicked() {
        let mut club = make_club(false);
        club.add_member("alice");
        club.promote("alice", "owner").unwrap();

        assert!(matches!(
            club.demote("owner", "alice"),
            Err(AppError::InvalidOperation(_))
        ));
        assert!(matches!(
            club.kick("owner", "alice"),
            Err(AppError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_kick_requires_admin_and_clears_all_sets() {
        let mut club = make_club(false);
        club.add_member("alice");
        club.add_member("bob");

        assert!(matches!(
            club.kick("alice", "bob"),
            Err(AppError::Forbidden(_))
        ));

        club.promote("bob", "owner").unwrap();
        club.kick("alice", "bob").unwrap();
        assert_eq!(club.role_of("alice"), Role::NonMember);
        assert_invariants(&club);
    }

    #[test]
    fn test_sole_owner_leave_deletes_club() {
        let mut club = make_club(false);
        assert_eq!(club.leave("owner").unwrap(), LeaveOutcome::DeleteClub);
    }

    #[test]
    fn test_owner_leave_with_members_rejected() {
        let mut club = make_club(false);
        club.add_member("alice");
        assert!(matches!(
            club.leave("owner"),
            Err(AppError::OwnershipRequired(_))
        ));
        // Club unchanged
        assert!(club.is_member("owner"));
        assert!(club.is_member("alice"));
    }

    #[test]
    fn test_member_leave() {
        let mut club = make_club(false);
        club.add_member("alice");
        club.promote("alice", "owner").unwrap();
        assert_eq!(club.leave("alice").unwrap(), LeaveOutcome::Left);
        assert_eq!(club.role_of("alice"), Role::NonMember);
        assert_invariants(&club);
    }

    #[test]
    fn test_reset_join_code_changes_code() {
        let mut club = make_club(false);
        let old = club.join_code.clone();
        let new = club.reset_join_code("owner").unwrap();
        assert_ne!(old, new);
        assert_eq!(club.join_code, new);

        assert!(matches!(
            club.reset_join_code("stranger"),
            Err(AppError::Forbidden(_))
        ));
    }

    // Invariants hold under arbitrary operation sequences.
    #[test]
    fn test_invariants_under_random_operations() {
        use rand::prelude::*;

        let mut rng = StdRng::seed_from_u64(0x5eed);
        let users = ["alice", "bob", "carol", "dave", "erin"];

        for trial in 0..50 {
            let mut club = make_club(trial % 2 == 0);
            for _ in 0..200 {
                let user = *users.choose(&mut rng).unwrap();
                let actor = *users.choose(&mut rng).unwrap();
                // Outcomes (including errors) are irrelevant here; only the
                // invariants after each step matter.
                let _ = match rng.gen_range(0..7) {
                    0 => club.request_join(user).map(|_| ()),
                    1 => club.approve(user, actor),
                    2 => club.reject(user, actor),
                    3 => club.promote(user, actor),
                    4 => club.demote(user, actor),
                    5 => club.kick(user, actor),
                    _ => match club.leave(user) {
                        Ok(LeaveOutcome::DeleteClub) => break,
                        other => other.map(|_| ()),
                    },
                };
                assert_invariants(&club);
            }
        }
    }
}
