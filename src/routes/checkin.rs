// SPDX-License-Identifier: MIT

//! Check-in routes: the geofenced check-in entry point, per-club summaries
//! and per-user history.

use crate::error::{AppError, Result};
use crate::geo::Coordinate;
use crate::models::CheckIn;
use crate::routes::MessageResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/checkin/{event_id}", post(check_in))
        .route("/checkin/summary/{club_id}", get(summary))
        .route("/checkin/{club_id}/{user_id}", get(history))
}

// ─── Request/Response Bodies ─────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub user_id: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl CheckInRequest {
    /// Parse the optional coordinate pair. Half a pair is an input error;
    /// out-of-range values are rejected before any storage work happens.
    fn coords(&self) -> Result<Option<Coordinate>> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok(Some(Coordinate::new(lat, lon)?)),
            (None, None) => Ok(None),
            _ => Err(AppError::BadRequest(
                "lat and lon must be provided together".to_string(),
            )),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRecord {
    pub user_id: String,
    pub event_id: String,
    pub club_id: String,
    pub timestamp: String,
}

impl From<CheckIn> for CheckInRecord {
    fn from(check_in: CheckIn) -> Self {
        Self {
            user_id: check_in.user_id,
            event_id: check_in.event_id,
            club_id: check_in.club_id,
            timestamp: check_in.timestamp,
        }
    }
}

// ─── Handlers ────────────────────────────────────────────────

async fn check_in(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(req): Json<CheckInRequest>,
) -> Result<Json<MessageResponse>> {
    let coords = req.coords()?;
    let message = state
        .checkin_service
        .check_in(&event_id, &req.user_id, coords)
        .await?;
    Ok(MessageResponse::new(message))
}

/// Total check-ins per user for a club.
async fn summary(
    State(state): State<Arc<AppState>>,
    Path(club_id): Path<String>,
) -> Result<Json<HashMap<String, u32>>> {
    let totals = state.checkin_service.summarize(&club_id).await?;
    Ok(Json(totals))
}

/// Check-in history for a user within a club.
async fn history(
    State(state): State<Arc<AppState>>,
    Path((club_id, user_id)): Path<(String, String)>,
) -> Result<Json<Vec<CheckInRecord>>> {
    let records = state.checkin_service.history(&club_id, &user_id).await?;
    Ok(Json(records.into_iter().map(CheckInRecord::from).collect()))
}
