// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod checkin;
pub mod club;
pub mod event;
pub mod user;

pub use checkin::CheckIn;
pub use club::{Club, JoinOutcome, LeaveOutcome, Role};
pub use event::Event;
pub use user::User;
