// SPDX-License-Identifier: MIT

//! Event routes: creation, listing, archiving, deletion and RSVPs.

use crate::error::{AppError, Result};
use crate::models::Event;
use crate::routes::MessageResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", post(create_event))
        .route("/events/club/{club_id}", get(events_for_club))
        .route("/events/{id}/archive", patch(set_archived))
        .route("/events/{id}", axum::routing::delete(delete_event))
        .route("/events/rsvp/{event_id}", post(rsvp))
        .route("/events/rsvped/{user_id}", get(events_rsvped))
}

// ─── Request/Response Bodies ─────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
    /// YYYY-MM-DD
    pub date: String,
    #[serde(default)]
    pub location: String,
    pub club_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRequest {
    pub is_archived: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpRequest {
    pub user_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: String,
    pub club_id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub location: String,
    pub rsvp_ids: Vec<String>,
    pub is_archived: bool,
    pub archived_at: Option<String>,
    pub created_at: String,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            club_id: event.club_id,
            title: event.title,
            description: event.description,
            date: event.date,
            location: event.location,
            rsvp_ids: event.rsvp_ids,
            is_archived: event.is_archived,
            archived_at: event.archived_at,
            created_at: event.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpResponse {
    pub message: String,
    pub rsvp_count: usize,
}

// ─── Handlers ────────────────────────────────────────────────

async fn create_event(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEventRequest>,
) -> Result<Json<EventResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let event = state
        .event_service
        .create_event(
            &req.club_id,
            req.title,
            req.description,
            req.date,
            req.location,
        )
        .await?;

    Ok(Json(event.into()))
}

async fn events_for_club(
    State(state): State<Arc<AppState>>,
    Path(club_id): Path<String>,
) -> Result<Json<Vec<EventResponse>>> {
    let events = state.event_service.events_for_club(&club_id).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

async fn set_archived(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(req): Json<ArchiveRequest>,
) -> Result<Json<EventResponse>> {
    let event = state
        .event_service
        .set_archived(&event_id, req.is_archived)
        .await?;
    Ok(Json(event.into()))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let removed = state.event_service.delete_event(&event_id).await?;
    tracing::debug!(event_id, removed, "Event deletion cascade complete");
    Ok(MessageResponse::new("Event deleted successfully"))
}

async fn rsvp(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(req): Json<RsvpRequest>,
) -> Result<Json<RsvpResponse>> {
    let rsvp_count = state.event_service.rsvp(&event_id, &req.user_id).await?;
    Ok(Json(RsvpResponse {
        message: "RSVP successful".to_string(),
        rsvp_count,
    }))
}

async fn events_rsvped(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<EventResponse>>> {
    let events = state.event_service.events_rsvped(&user_id).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}
