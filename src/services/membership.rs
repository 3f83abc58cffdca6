// SPDX-License-Identifier: MIT

//! Membership lifecycle: club creation, the join/approval workflow, role
//! management and club deletion.
//!
//! Every mutation re-reads current state inside a Firestore transaction and
//! applies the pure model transition to that fresh copy, so two interleaved
//! mutations of the same club serialize instead of overwriting each other.
//! Roles are derived per request and never cached; a demoted admin loses
//! privileges on their next call.

use crate::db::{FirestoreDb, TxnAction};
use crate::error::AppError;
use crate::geo::Coordinate;
use crate::models::{Club, JoinOutcome, LeaveOutcome, User};
use crate::time_utils::now_rfc3339;

/// Attempts to find an unused join code before giving up.
const JOIN_CODE_ATTEMPTS: usize = 10;

#[derive(Clone)]
pub struct MembershipService {
    db: FirestoreDb,
    default_radius_feet: f64,
}

impl MembershipService {
    pub fn new(db: FirestoreDb, default_radius_feet: f64) -> Self {
        Self {
            db,
            default_radius_feet,
        }
    }

    async fn load_club(&self, club_id: &str) -> Result<Club, AppError> {
        self.db
            .get_club(club_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Club {} not found", club_id)))
    }

    async fn load_user(&self, user_id: &str) -> Result<User, AppError> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Pick a join code no other club currently uses.
    async fn allocate_join_code(&self, exclude: Option<&str>) -> Result<String, AppError> {
        for _ in 0..JOIN_CODE_ATTEMPTS {
            let code = Club::generate_join_code();
            if Some(code.as_str()) == exclude {
                continue;
            }
            if self.db.find_club_by_join_code(&code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(AppError::Database(
            "could not allocate a unique join code".to_string(),
        ))
    }

    // ─── Club Lifecycle ──────────────────────────────────────────

    /// Create a club; the creator becomes owner, admin and member.
    pub async fn create_club(
        &self,
        name: String,
        description: String,
        color: Option<String>,
        is_public: bool,
        location_tracking_enabled: bool,
        owner_id: &str,
    ) -> Result<Club, AppError> {
        let owner = self.load_user(owner_id).await?;

        let mut club = Club::new(
            name,
            description,
            color,
            is_public,
            location_tracking_enabled,
            owner.id,
            self.default_radius_feet,
            &now_rfc3339(),
        );
        club.join_code = self.allocate_join_code(None).await?;

        self.db.create_club_with_owner(&club).await?;

        tracing::info!(club_id = %club.id, owner_id, "Club created");
        Ok(club)
    }

    pub async fn get_club(&self, club_id: &str) -> Result<Club, AppError> {
        self.load_club(club_id).await
    }

    /// Clubs a user belongs to, resolved through the back-reference list.
    pub async fn clubs_for_user(&self, user_id: &str) -> Result<Vec<Club>, AppError> {
        let user = self.load_user(user_id).await?;
        self.db.get_clubs_by_ids(&user.club_ids).await
    }

    /// Delete a club outright. Owner only; cascades events, check-ins and
    /// member back-references.
    pub async fn delete_club(&self, club_id: &str, actor_id: &str) -> Result<(), AppError> {
        let club = self.load_club(club_id).await?;
        if club.owner_id != actor_id {
            return Err(AppError::Forbidden(
                "only the owner may delete the club".to_string(),
            ));
        }
        self.db.delete_club_cascade(&club).await?;
        Ok(())
    }

    // ─── Join Workflow ───────────────────────────────────────────

    pub async fn request_join(
        &self,
        club_id: &str,
        user_id: &str,
    ) -> Result<JoinOutcome, AppError> {
        self.join_club(club_id, user_id).await
    }

    /// Join via a shared code. A wrong code is reported as `NotFound` without
    /// revealing whether any club exists.
    pub async fn join_by_code(&self, code: &str, user_id: &str) -> Result<JoinOutcome, AppError> {
        let club = self
            .db
            .find_club_by_join_code(&code.to_uppercase())
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid join code".to_string()))?;
        self.join_club(&club.id, user_id).await
    }

    async fn join_club(&self, club_id: &str, user_id: &str) -> Result<JoinOutcome, AppError> {
        let outcome = self
            .db
            .mutate_club_and_user(club_id, user_id, |club, user| {
                let outcome = club.request_join(&user.id)?;
                if outcome == JoinOutcome::Joined {
                    // Public club: membership and back-reference move together.
                    user.add_club(&club.id);
                }
                Ok(TxnAction::Commit(outcome))
            })
            .await?;

        tracing::info!(club_id, user_id, ?outcome, "Join requested");
        Ok(outcome)
    }

    pub async fn approve(
        &self,
        club_id: &str,
        user_id: &str,
        actor_id: &str,
    ) -> Result<(), AppError> {
        self.db
            .mutate_club_and_user(club_id, user_id, |club, user| {
                club.approve(&user.id, actor_id)?;
                user.add_club(&club.id);
                Ok(TxnAction::Commit(()))
            })
            .await?;

        tracing::info!(club_id, user_id, actor_id, "Pending user approved");
        Ok(())
    }

    pub async fn reject(
        &self,
        club_id: &str,
        user_id: &str,
        actor_id: &str,
    ) -> Result<(), AppError> {
        self.db
            .mutate_club(club_id, |club| club.reject(user_id, actor_id))
            .await?;

        tracing::info!(club_id, user_id, actor_id, "Pending user rejected");
        Ok(())
    }

    // ─── Role Management ─────────────────────────────────────────

    pub async fn promote(
        &self,
        club_id: &str,
        user_id: &str,
        actor_id: &str,
    ) -> Result<(), AppError> {
        self.db
            .mutate_club(club_id, |club| club.promote(user_id, actor_id))
            .await
    }

    pub async fn demote(
        &self,
        club_id: &str,
        user_id: &str,
        actor_id: &str,
    ) -> Result<(), AppError> {
        self.db
            .mutate_club(club_id, |club| club.demote(user_id, actor_id))
            .await
    }

    pub async fn kick(
        &self,
        club_id: &str,
        user_id: &str,
        actor_id: &str,
    ) -> Result<(), AppError> {
        self.db
            .mutate_club_and_user(club_id, user_id, |club, user| {
                club.kick(&user.id, actor_id)?;
                user.remove_club(&club.id);
                Ok(TxnAction::Commit(()))
            })
            .await?;

        tracing::info!(club_id, user_id, actor_id, "User kicked");
        Ok(())
    }

    /// Leave a club. Returns `true` if the club was deleted as a result
    /// (sole-member owner leaving).
    pub async fn leave(&self, club_id: &str, user_id: &str) -> Result<bool, AppError> {
        let deleted = self
            .db
            .mutate_club_and_user(club_id, user_id, |club, user| {
                match club.leave(&user.id)? {
                    LeaveOutcome::Left => {
                        user.remove_club(&club.id);
                        Ok(TxnAction::Commit(false))
                    }
                    // Nothing to write: the whole club goes away instead.
                    LeaveOutcome::DeleteClub => Ok(TxnAction::Rollback(true)),
                }
            })
            .await?;

        if deleted {
            let club = self.load_club(club_id).await?;
            self.db.delete_club_cascade(&club).await?;
            tracing::info!(club_id, user_id, "Sole owner left; club deleted");
        } else {
            tracing::info!(club_id, user_id, "User left club");
        }
        Ok(deleted)
    }

    // ─── Configuration ───────────────────────────────────────────

    /// Set the club's check-in anchor point. Admin only.
    pub async fn set_anchor(
        &self,
        club_id: &str,
        actor_id: &str,
        anchor: Coordinate,
    ) -> Result<Coordinate, AppError> {
        self.db
            .mutate_club(club_id, |club| club.set_anchor(anchor, actor_id))
            .await?;

        tracing::info!(
            club_id,
            actor_id,
            latitude = anchor.latitude,
            longitude = anchor.longitude,
            "Check-in anchor updated"
        );
        Ok(anchor)
    }

    /// Regenerate the join code. Admin only; the new code differs from the
    /// old one and from every other club's current code.
    pub async fn reset_join_code(
        &self,
        club_id: &str,
        actor_id: &str,
    ) -> Result<String, AppError> {
        let club = self.load_club(club_id).await?;
        if !club.is_admin(actor_id) {
            return Err(AppError::Forbidden(
                "only club admins may reset the join code".to_string(),
            ));
        }

        // Allocation queries other clubs, so it happens before the
        // transaction; the admin check is re-applied against fresh state.
        let code = self.allocate_join_code(Some(&club.join_code)).await?;
        self.db
            .mutate_club(club_id, |club| {
                if !club.is_admin(actor_id) {
                    return Err(AppError::Forbidden(
                        "only club admins may reset the join code".to_string(),
                    ));
                }
                club.join_code = code.clone();
                Ok(())
            })
            .await?;

        tracing::info!(club_id, actor_id, "Join code reset");
        Ok(code)
    }
}
