// SPDX-License-Identifier: MIT

//! Event lifecycle and the active-event toggle.
//!
//! A club has at most one active event, and an archived or deleted event can
//! never remain active: every path that archives or deletes clears the club's
//! reference before touching the event document.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Club, Event};
use crate::time_utils::now_rfc3339;

#[derive(Clone)]
pub struct EventService {
    db: FirestoreDb,
}

impl EventService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    async fn load_event(&self, event_id: &str) -> Result<Event, AppError> {
        let event = self
            .db
            .get_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;
        if event.is_deleted {
            return Err(AppError::NotFound(format!("Event {} not found", event_id)));
        }
        Ok(event)
    }

    async fn load_club(&self, club_id: &str) -> Result<Club, AppError> {
        self.db
            .get_club(club_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Club {} not found", club_id)))
    }

    pub async fn create_event(
        &self,
        club_id: &str,
        title: String,
        description: String,
        date: String,
        location: String,
    ) -> Result<Event, AppError> {
        // The club must exist; club_id is immutable afterwards.
        let club = self.load_club(club_id).await?;

        let event = Event::new(
            club.id.clone(),
            title,
            description,
            date,
            location,
            &now_rfc3339(),
        );
        self.db.upsert_event(&event).await?;

        tracing::info!(event_id = %event.id, club_id, "Event created");
        Ok(event)
    }

    /// Non-deleted events of a club.
    pub async fn events_for_club(&self, club_id: &str) -> Result<Vec<Event>, AppError> {
        let events = self.db.events_for_club(club_id).await?;
        Ok(events.into_iter().filter(|e| !e.is_deleted).collect())
    }

    /// Archive or unarchive an event.
    ///
    /// Archiving the club's active event clears the active reference first,
    /// so a crash between the two writes can only leave the reference
    /// cleared, never dangling at an archived event.
    pub async fn set_archived(&self, event_id: &str, archived: bool) -> Result<Event, AppError> {
        let mut event = self.load_event(event_id).await?;

        if archived {
            self.clear_active_reference(&event).await?;
        }

        event.set_archived(archived, &now_rfc3339());
        self.db.upsert_event(&event).await?;

        tracing::info!(event_id, archived, "Event archive flag updated");
        Ok(event)
    }

    /// Delete an event, cascading its check-ins and clearing the club's
    /// active-event reference if it pointed here.
    ///
    /// Returns the number of check-ins removed.
    pub async fn delete_event(&self, event_id: &str) -> Result<usize, AppError> {
        let mut event = self.load_event(event_id).await?;

        self.clear_active_reference(&event).await?;

        // Soft-delete marker first: anything that reads the event mid-cascade
        // treats it as gone.
        event.is_deleted = true;
        self.db.upsert_event(&event).await?;

        let removed = self.db.delete_check_ins_for_event(&event.id).await?;
        self.db.delete_event_doc(&event.id).await?;

        tracing::info!(event_id, removed, "Event deleted");
        Ok(removed)
    }

    async fn clear_active_reference(&self, event: &Event) -> Result<(), AppError> {
        let cleared = self
            .db
            .mutate_club(&event.club_id, |club| {
                if club.active_event_id.as_deref() == Some(event.id.as_str()) {
                    club.active_event_id = None;
                    Ok(true)
                } else {
                    Ok(false)
                }
            })
            .await;

        match cleared {
            Ok(true) => {
                tracing::info!(club_id = %event.club_id, event_id = %event.id, "Active event cleared");
                Ok(())
            }
            Ok(false) => Ok(()),
            // The owning club may already be mid-deletion.
            Err(AppError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Designate an event as the club's active event, or clear it with `None`.
    /// Admin only; the event must belong to the club and be activatable.
    pub async fn set_active_event(
        &self,
        club_id: &str,
        event_id: Option<&str>,
        actor_id: &str,
    ) -> Result<(), AppError> {
        let new_active = match event_id {
            Some(event_id) => {
                let event = self.load_event(event_id).await?;
                if event.club_id != club_id {
                    return Err(AppError::InvalidOperation(
                        "event does not belong to this club".to_string(),
                    ));
                }
                if !event.is_activatable() {
                    return Err(AppError::InvalidOperation(
                        "an archived event cannot be activated".to_string(),
                    ));
                }
                Some(event.id)
            }
            None => None,
        };

        self.db
            .mutate_club(club_id, |club| {
                club.set_active_event(new_active.clone(), actor_id)
            })
            .await?;

        tracing::info!(club_id, active_event = ?new_active, actor_id, "Active event updated");
        Ok(())
    }

    // ─── RSVPs ───────────────────────────────────────────────────

    /// RSVP to an event; returns the updated RSVP count.
    pub async fn rsvp(&self, event_id: &str, user_id: &str) -> Result<usize, AppError> {
        let mut event = self.load_event(event_id).await?;
        let count = event.rsvp(user_id)?;
        self.db.upsert_event(&event).await?;
        Ok(count)
    }

    /// Events a user has RSVPed to.
    pub async fn events_rsvped(&self, user_id: &str) -> Result<Vec<Event>, AppError> {
        let events = self.db.events_rsvped_by_user(user_id).await?;
        Ok(events.into_iter().filter(|e| !e.is_deleted).collect())
    }
}
