// SPDX-License-Identifier: MIT

//! Business logic services.

pub mod checkin;
pub mod events;
pub mod membership;

pub use checkin::CheckInService;
pub use events::EventService;
pub use membership::MembershipService;
