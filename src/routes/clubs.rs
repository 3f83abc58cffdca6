// SPDX-License-Identifier: MIT

//! Club routes: creation, the join/approval workflow, role management and
//! geofence configuration.

use crate::error::{AppError, Result};
use crate::geo::Coordinate;
use crate::models::{Club, JoinOutcome};
use crate::routes::MessageResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clubs", post(create_club))
        .route("/clubs/{id}", get(get_club).delete(delete_club))
        .route("/clubs/user/{user_id}", get(clubs_for_user))
        .route("/clubs/{id}/join", post(request_join))
        .route("/clubs/join-code/{code}", post(join_by_code))
        .route("/clubs/{id}/approve/{user_id}", patch(approve))
        .route("/clubs/{id}/reject/{user_id}", patch(reject))
        .route("/clubs/{id}/promote/{user_id}", patch(promote))
        .route("/clubs/{id}/demote/{user_id}", patch(demote))
        .route("/clubs/{id}/kick/{user_id}", patch(kick))
        .route("/clubs/{id}/leave", patch(leave))
        .route("/clubs/{id}/location", patch(set_location))
        .route("/clubs/{id}/join-code/reset", patch(reset_join_code))
        .route("/clubs/{id}/active-event", patch(set_active_event))
}

// ─── Request/Response Bodies ─────────────────────────────────

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClubRequest {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,
    pub color: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub use_location_tracking: bool,
    pub owner: String,
}

/// The caller's user id, carried in the body for routes whose path names the
/// target rather than the actor.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRequest {
    pub user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLocationRequest {
    pub user_id: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveEventRequest {
    pub user_id: String,
    /// `null` clears the active event.
    pub event_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub color: Option<String>,
    pub is_public: bool,
    pub location_tracking_enabled: bool,
    pub anchor: Option<Coordinate>,
    pub check_in_radius_feet: f64,
    pub join_code: String,
    pub active_event_id: Option<String>,
    pub owner_id: String,
    pub admin_ids: Vec<String>,
    pub member_ids: Vec<String>,
    pub pending_ids: Vec<String>,
    pub created_at: String,
}

impl From<Club> for ClubResponse {
    fn from(club: Club) -> Self {
        Self {
            id: club.id,
            name: club.name,
            description: club.description,
            color: club.color,
            is_public: club.is_public,
            location_tracking_enabled: club.location_tracking_enabled,
            anchor: club.anchor,
            check_in_radius_feet: club.check_in_radius_feet,
            join_code: club.join_code,
            active_event_id: club.active_event_id,
            owner_id: club.owner_id,
            admin_ids: club.admin_ids,
            member_ids: club.member_ids,
            pending_ids: club.pending_ids,
            created_at: club.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct LeaveResponse {
    pub message: String,
    pub deleted: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCodeResponse {
    pub join_code: String,
}

// ─── Handlers ────────────────────────────────────────────────

async fn create_club(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateClubRequest>,
) -> Result<Json<ClubResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let club = state
        .membership_service
        .create_club(
            req.name,
            req.description,
            req.color,
            req.is_public,
            req.use_location_tracking,
            &req.owner,
        )
        .await?;

    Ok(Json(club.into()))
}

async fn get_club(
    State(state): State<Arc<AppState>>,
    Path(club_id): Path<String>,
) -> Result<Json<ClubResponse>> {
    let club = state.membership_service.get_club(&club_id).await?;
    Ok(Json(club.into()))
}

async fn clubs_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ClubResponse>>> {
    let clubs = state.membership_service.clubs_for_user(&user_id).await?;
    Ok(Json(clubs.into_iter().map(ClubResponse::from).collect()))
}

async fn request_join(
    State(state): State<Arc<AppState>>,
    Path(club_id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<MessageResponse>> {
    let outcome = state
        .membership_service
        .request_join(&club_id, &req.user_id)
        .await?;
    Ok(join_message(outcome))
}

async fn join_by_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<MessageResponse>> {
    let outcome = state
        .membership_service
        .join_by_code(&code, &req.user_id)
        .await?;
    Ok(join_message(outcome))
}

fn join_message(outcome: JoinOutcome) -> Json<MessageResponse> {
    match outcome {
        JoinOutcome::Joined => MessageResponse::new("Joined club"),
        JoinOutcome::Pending => MessageResponse::new("Join request sent"),
    }
}

async fn approve(
    State(state): State<Arc<AppState>>,
    Path((club_id, user_id)): Path<(String, String)>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .membership_service
        .approve(&club_id, &user_id, &req.user_id)
        .await?;
    Ok(MessageResponse::new("User approved"))
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Path((club_id, user_id)): Path<(String, String)>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .membership_service
        .reject(&club_id, &user_id, &req.user_id)
        .await?;
    Ok(MessageResponse::new("Join request rejected"))
}

async fn promote(
    State(state): State<Arc<AppState>>,
    Path((club_id, user_id)): Path<(String, String)>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .membership_service
        .promote(&club_id, &user_id, &req.user_id)
        .await?;
    Ok(MessageResponse::new("User promoted to admin"))
}

async fn demote(
    State(state): State<Arc<AppState>>,
    Path((club_id, user_id)): Path<(String, String)>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .membership_service
        .demote(&club_id, &user_id, &req.user_id)
        .await?;
    Ok(MessageResponse::new("User demoted"))
}

async fn kick(
    State(state): State<Arc<AppState>>,
    Path((club_id, user_id)): Path<(String, String)>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .membership_service
        .kick(&club_id, &user_id, &req.user_id)
        .await?;
    Ok(MessageResponse::new("User removed from club"))
}

async fn leave(
    State(state): State<Arc<AppState>>,
    Path(club_id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<LeaveResponse>> {
    let deleted = state
        .membership_service
        .leave(&club_id, &req.user_id)
        .await?;
    let message = if deleted {
        "Left club; the club was deleted".to_string()
    } else {
        "Left club".to_string()
    };
    Ok(Json(LeaveResponse { message, deleted }))
}

async fn delete_club(
    State(state): State<Arc<AppState>>,
    Path(club_id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .membership_service
        .delete_club(&club_id, &req.user_id)
        .await?;
    Ok(MessageResponse::new("Club deleted"))
}

async fn set_location(
    State(state): State<Arc<AppState>>,
    Path(club_id): Path<String>,
    Json(req): Json<SetLocationRequest>,
) -> Result<Json<Coordinate>> {
    let anchor = Coordinate::new(req.lat, req.lon)?;
    let anchor = state
        .membership_service
        .set_anchor(&club_id, &req.user_id, anchor)
        .await?;
    Ok(Json(anchor))
}

async fn reset_join_code(
    State(state): State<Arc<AppState>>,
    Path(club_id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<JoinCodeResponse>> {
    let join_code = state
        .membership_service
        .reset_join_code(&club_id, &req.user_id)
        .await?;
    Ok(Json(JoinCodeResponse { join_code }))
}

async fn set_active_event(
    State(state): State<Arc<AppState>>,
    Path(club_id): Path<String>,
    Json(req): Json<SetActiveEventRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .event_service
        .set_active_event(&club_id, req.event_id.as_deref(), &req.user_id)
        .await?;
    let message = match req.event_id {
        Some(_) => "Active event set",
        None => "Active event cleared",
    };
    Ok(MessageResponse::new(message))
}
