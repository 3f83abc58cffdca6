// SPDX-License-Identifier: MIT

//! The check-in ledger: one attendance record per (user, event), gated by the
//! club's geofence when location tracking is enabled.

use std::collections::HashMap;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::geo::{self, Coordinate};
use crate::models::CheckIn;
use crate::time_utils::now_rfc3339;

#[derive(Clone)]
pub struct CheckInService {
    db: FirestoreDb,
}

impl CheckInService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Record a check-in for `user_id` at `event_id`.
    ///
    /// The event must be its club's active event. When the club tracks
    /// location, `coords` must be present and within the configured radius of
    /// the anchor. The (user, event) pair is checked up front for a clean
    /// error, and enforced again by the store on insert to close the race
    /// between concurrent attempts.
    pub async fn check_in(
        &self,
        event_id: &str,
        user_id: &str,
        coords: Option<Coordinate>,
    ) -> Result<String, AppError> {
        let event = self
            .db
            .get_event(event_id)
            .await?
            .filter(|e| !e.is_deleted)
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

        let club = self
            .db
            .get_club(&event.club_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Club {} not found", event.club_id)))?;

        if self.db.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        if club.active_event_id.as_deref() != Some(event.id.as_str()) {
            return Err(AppError::NoActiveEvent);
        }

        if self.db.get_check_in(event_id, user_id).await?.is_some() {
            return Err(AppError::DuplicateCheckIn);
        }

        if club.location_tracking_enabled {
            let coords = coords.ok_or(AppError::LocationRequired)?;
            let anchor = club.anchor.ok_or(AppError::NoAnchorConfigured)?;

            let distance_feet = geo::distance_feet(anchor, coords);
            if distance_feet > club.check_in_radius_feet {
                tracing::info!(
                    event_id,
                    user_id,
                    distance_feet,
                    radius_feet = club.check_in_radius_feet,
                    "Check-in rejected: outside geofence"
                );
                return Err(AppError::OutOfRange {
                    distance_feet,
                    radius_feet: club.check_in_radius_feet,
                });
            }
        }
        // Tracking disabled: coords (if any) are ignored entirely.

        let check_in = CheckIn::new(
            user_id.to_string(),
            event.id.clone(),
            club.id.clone(),
            &now_rfc3339(),
        );
        self.db.create_check_in(&check_in).await?;

        tracing::info!(event_id, user_id, club_id = %club.id, "Checked in");
        Ok("Checked in successfully!".to_string())
    }

    /// Total check-ins per user across a club's events.
    pub async fn summarize(&self, club_id: &str) -> Result<HashMap<String, u32>, AppError> {
        if self.db.get_club(club_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Club {} not found", club_id)));
        }

        let check_ins = self.db.check_ins_for_club(club_id).await?;
        let mut totals: HashMap<String, u32> = HashMap::new();
        for check_in in check_ins {
            *totals.entry(check_in.user_id).or_insert(0) += 1;
        }
        Ok(totals)
    }

    /// Check-in history for one user within a club.
    pub async fn history(
        &self,
        club_id: &str,
        user_id: &str,
    ) -> Result<Vec<CheckIn>, AppError> {
        self.db.check_ins_for_user_in_club(club_id, user_id).await
    }
}
