// SPDX-License-Identifier: MIT

//! Konnekt API: club membership and event check-in backend.
//!
//! Members join clubs (directly for public clubs, via an approval queue for
//! private ones), admins manage roles and designate the active event, and
//! attendance is recorded through a geofenced check-in ledger.

pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{CheckInService, EventService, MembershipService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub membership_service: MembershipService,
    pub event_service: EventService,
    pub checkin_service: CheckInService,
}
